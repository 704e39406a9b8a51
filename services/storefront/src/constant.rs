use crate::WebApiHdlrLabel;

pub mod app_meta {
    pub const LABAL: &str = "storefront";
    // TODO, machine code to UUID generator should be configurable
    pub const MACHINE_CODE: u8 = 1;
}

pub mod hard_limit {
    pub const MAX_ITEMS_STORED_PER_MODEL: u32 = 4800u32;
    pub const MAX_SESSION_TTL_SECS: u32 = 30 * 86400;
    pub const MAX_PRODUCTS_PER_BATCH: usize = 64;
    // metadata values in the payment processor are limited to 500 chars
    pub const MAX_NCHARS_PAYMENT_METADATA: usize = 480;
}

pub const HTTP_CONTENT_TYPE_JSON: &str = "application/json";
pub const HTTP_HEADER_CART_VERSION: &str = "x-cart-version";

pub mod checkout {
    // fixed delay before polling the payment processor again, for payments
    // returning from redirect with processing status
    pub const PENDING_REPOLL_SECS: u64 = 10;
    pub const NIP_PATTERN: &str = r"^[0-9]{10}$";
    pub const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
}

pub mod thirdparty {
    pub const CONTENT_API: &str = "content-api";
    pub const PAYMENT_PROCESSOR: &str = "stripe";
    pub const SPREADSHEET: &str = "spreadsheet";
    pub const AUTOMATION_HOOK: &str = "automation-hook";
}

pub(crate) mod api {
    use super::WebApiHdlrLabel;

    #[allow(non_camel_case_types)]
    pub(crate) struct web {}

    impl web {
        pub(crate) const SESSION_ID: WebApiHdlrLabel = "session_id";
        pub(crate) const RETRIEVE_CART: WebApiHdlrLabel = "retrieve_cart";
        pub(crate) const ADD_CART_ITEM: WebApiHdlrLabel = "add_cart_item";
        pub(crate) const UPDATE_CART_ITEM: WebApiHdlrLabel = "update_cart_item";
        pub(crate) const REMOVE_CART_ITEM: WebApiHdlrLabel = "remove_cart_item";
        pub(crate) const CLEAR_CART: WebApiHdlrLabel = "clear_cart";
        pub(crate) const PRODUCT_DETAIL: WebApiHdlrLabel = "product_detail";
        pub(crate) const PRODUCT_BATCH: WebApiHdlrLabel = "product_batch";
        pub(crate) const CATEGORY_TABLE: WebApiHdlrLabel = "category_table";
        pub(crate) const SHIPPING_OPTIONS: WebApiHdlrLabel = "shipping_options";
        pub(crate) const VALIDATE_COUPON: WebApiHdlrLabel = "validate_coupon";
        pub(crate) const CHECKOUT_QUOTE: WebApiHdlrLabel = "checkout_quote";
        pub(crate) const CREATE_PAYMENT_INTENT: WebApiHdlrLabel = "create_payment_intent";
        pub(crate) const PAYMENT_INTENT_STATUS: WebApiHdlrLabel = "payment_intent_status";
        pub(crate) const PAYMENT_INTENT_PENDING: WebApiHdlrLabel = "payment_intent_pending";
        pub(crate) const CONFIRM_CHECKOUT: WebApiHdlrLabel = "confirm_checkout";
        pub(crate) const CONTAINER_LIST: WebApiHdlrLabel = "container_list";
        pub(crate) const MEMBER_CONTAINERS: WebApiHdlrLabel = "member_containers";
    }
}
