//! Names shared with the commerce platform: payment method system name,
//! payment method parameter keys and metadata / property-bag field names.

/// System name of the Klarna Payments payment method
pub const KLARNA_PAYMENT_SYSTEM_KEYWORD: &str = "KlarnaPayments";

pub const ORDER_NAMESPACE: &str = "Mediachase.Commerce.Orders";
pub const PURCHASE_ORDER_CLASS: &str = "PurchaseOrder";

// Cart property bag
pub const KLARNA_SESSION_ID_FIELD: &str = "KlarnaSessionId";
pub const KLARNA_CLIENT_TOKEN_FIELD: &str = "KlarnaClientToken";

// Purchase order metadata
pub const KLARNA_ORDER_ID_FIELD: &str = "KlarnaOrderId";

// Payment method parameters
pub const CONFIRMATION_URL_FIELD: &str = "ConfirmationUrl";
pub const NOTIFICATION_URL_FIELD: &str = "NotificationUrl";
pub const SEND_PRODUCT_AND_IMAGE_URL_FIELD: &str = "SendProductAndImageUrl";
pub const PRE_ASSESSMENT_FIELD: &str = "PreAssesment";
pub const USE_ATTACHMENTS_FIELD: &str = "UseAttachments";

// Widget styling parameters
pub const WIDGET_COLOR_DETAILS_FIELD: &str = "KlarnaWidgetColorDetails";
pub const WIDGET_COLOR_BUTTON_FIELD: &str = "KlarnaWidgetColorButton";
pub const WIDGET_COLOR_BUTTON_TEXT_FIELD: &str = "KlarnaWidgetColorButtonText";
pub const WIDGET_COLOR_CHECKBOX_FIELD: &str = "KlarnaWidgetColorCheckbox";
pub const WIDGET_COLOR_CHECKBOX_CHECKMARK_FIELD: &str = "KlarnaWidgetColorCheckboxCheckmark";
pub const WIDGET_COLOR_HEADER_FIELD: &str = "KlarnaWidgetColorHeader";
pub const WIDGET_COLOR_LINK_FIELD: &str = "KlarnaWidgetColorLink";
pub const WIDGET_COLOR_BORDER_FIELD: &str = "KlarnaWidgetColorBorder";
pub const WIDGET_COLOR_BORDER_SELECTED_FIELD: &str = "KlarnaWidgetColorBorderSelected";
pub const WIDGET_COLOR_TEXT_FIELD: &str = "KlarnaWidgetColorText";
pub const WIDGET_COLOR_TEXT_SECONDARY_FIELD: &str = "KlarnaWidgetColorTextSecondary";
pub const WIDGET_RADIUS_BORDER_FIELD: &str = "KlarnaWidgetRadiusBorder";

pub const DEFAULT_WIDGET_COLOR: &str = "#C0FFEE";
pub const DEFAULT_WIDGET_RADIUS_BORDER: &str = "0px";

/// Name of the synthetic order line carrying the shipping total
pub const SHIPPING_LINE_NAME: &str = "Shipping method";

/// Query parameter appended to the confirmation URL before order creation
pub const TRACKING_NUMBER_PARAMETER: &str = "trackingNumber";

/// Continent code whose countries may not receive customer personal information
pub const PII_RESTRICTED_CONTINENT: &str = "EU";
