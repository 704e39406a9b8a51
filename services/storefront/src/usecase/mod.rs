mod checkout;
mod container;
mod manage_cart;
mod payment_intent;
mod product_lookup;

pub use checkout::{
    CheckoutQuoteUsKsResult, CheckoutQuoteUseCase, ShippingOptionsUseCase, ValidateCouponUseCase,
};
pub use container::{ContainerListUseCase, MemberContainersOutput, MemberContainersUseCase};
pub use manage_cart::{
    CartMutation, ModifyCartUsKsResult, ModifyCartUseCase, RetrieveCartUsKsResult,
    RetrieveCartUseCase,
};
pub use payment_intent::{
    ConfirmCheckoutUsKsResult, ConfirmCheckoutUseCase, CreatePaymentIntentUsKsResult,
    CreatePaymentIntentUseCase, PaymentIntentStatusUsKsResult, PaymentIntentStatusUseCase,
    PaymentPendingUsKsResult, PaymentPendingUseCase,
};
pub use product_lookup::{
    CategoryLookupUseCase, ProductBatchUsKsResult, ProductBatchUseCase, ProductDetailUsKsResult,
    ProductDetailUseCase,
};
