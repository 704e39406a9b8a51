pub(super) mod cart;
pub(super) mod payment;
