// Klarna Payments integration
pub mod klarna;

// Collaborators used by the Klarna integration
pub mod order_numbers;
pub mod payment_processor;
pub mod totals;
