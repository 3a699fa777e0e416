pub mod notification;
pub mod session;

pub use notification::NotificationModel;
pub use session::{
    Address, CreateOrderResponse, CreateSessionResponse, Customer, MerchantUrls, OrderLine,
    Session, WidgetOptions,
};
