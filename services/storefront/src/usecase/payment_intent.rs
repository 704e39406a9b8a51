use std::boxed::Box;
use std::collections::HashMap;
use std::result::Result as DefaultResult;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::{json, Value as JsnVal};

use storefront_common::config::AppCheckoutCfg;
use storefront_common::error::AppErrorCode;
use storefront_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use super::checkout::CheckoutSnapshot;
use crate::adapter::thirdparty::{
    AbstractAutomationHook, AbstractPaymentProcessor, AbstractSpreadsheet,
    PaymentIntentCreateArgs,
};
use crate::constant::{app_meta, checkout as checkout_const, hard_limit};
use crate::error::AppError;
use crate::generate_custom_uid;
use crate::model::{
    local_today, CartItemModel, CheckoutCostModel, CheckoutFormError, CheckoutFormModel, CustomerKind,
    PaymentIntentModel, PaymentIntentStatus, PendingNextStep,
};
use crate::repository::{AbsCartRepo, AbsPaymentRecordRepo};

pub struct CreatePaymentIntentUseCase {
    pub repo: Box<dyn AbsCartRepo>,
    pub processor: Arc<Box<dyn AbstractPaymentProcessor>>,
    pub checkout: Arc<AppCheckoutCfg>,
    pub logctx: Arc<AppLogContext>,
    pub ttl_secs: u32,
}
pub struct PaymentIntentStatusUseCase {
    pub processor: Arc<Box<dyn AbstractPaymentProcessor>>,
    pub logctx: Arc<AppLogContext>,
}
pub struct PaymentPendingUseCase {
    pub processor: Arc<Box<dyn AbstractPaymentProcessor>>,
    pub checkout: Arc<AppCheckoutCfg>,
    pub logctx: Arc<AppLogContext>,
}
pub struct ConfirmCheckoutUseCase {
    pub repo: Box<dyn AbsCartRepo>,
    pub records: Box<dyn AbsPaymentRecordRepo>,
    pub processor: Arc<Box<dyn AbstractPaymentProcessor>>,
    pub spreadsheet: Arc<Box<dyn AbstractSpreadsheet>>,
    pub hook: Arc<Box<dyn AbstractAutomationHook>>,
    pub checkout: Arc<AppCheckoutCfg>,
    pub logctx: Arc<AppLogContext>,
    pub ttl_secs: u32,
}

pub enum CreatePaymentIntentUsKsResult {
    Success {
        intent: PaymentIntentModel,
        cost: CheckoutCostModel,
    },
    Invalid(CheckoutFormError),
    ServerError(AppError),
}
pub enum PaymentIntentStatusUsKsResult {
    Success(PaymentIntentModel),
    NotFound,
    ServerError(AppError),
}
pub enum PaymentPendingUsKsResult {
    Success {
        intent: PaymentIntentModel,
        next: PendingNextStep,
        redirect_url: Option<String>,
    },
    NotFound,
    ServerError(AppError),
}
pub enum ConfirmCheckoutUsKsResult {
    Success {
        order_id: String,
        intent: PaymentIntentModel,
        cost: CheckoutCostModel,
        items: Vec<CartItemModel>,
    },
    NotSucceeded(PaymentIntentStatus),
    // the payment succeeded but does not belong to this checkout
    Rejected {
        status: PaymentIntentStatus,
        reason: &'static str,
    },
    Invalid(CheckoutFormError),
    NotFound,
    ServerError(AppError),
}

fn is_remote_not_found(e: &AppError) -> bool {
    matches!(e.code, AppErrorCode::RemoteResourceNotFound)
}

fn items_summary(items: &[CartItemModel]) -> String {
    let mut out = items
        .iter()
        .map(|i| match i.variant.as_deref() {
            Some(v) => format!("{}({v})x{}", i.id, i.quantity),
            None => format!("{}x{}", i.id, i.quantity),
        })
        .collect::<Vec<_>>()
        .join(",");
    if out.chars().count() > hard_limit::MAX_NCHARS_PAYMENT_METADATA {
        out = out
            .chars()
            .take(hard_limit::MAX_NCHARS_PAYMENT_METADATA)
            .collect();
    }
    out
}

fn intent_metadata(
    session_id: &str,
    form: &CheckoutFormModel,
    snapshot: &CheckoutSnapshot,
) -> HashMap<String, String> {
    let mut out = HashMap::from([
        ("session_id".to_string(), session_id.to_string()),
        ("items".to_string(), items_summary(&snapshot.cart.items)),
        ("customer_name".to_string(), form.full_name()),
        ("phone".to_string(), form.phone.trim().to_string()),
        (
            "address".to_string(),
            format!(
                "{}, {} {}",
                form.street.trim(),
                form.postal_code.trim(),
                form.city.trim()
            ),
        ),
        ("shipping_option".to_string(), snapshot.shipping.code.clone()),
        ("shipping_cost".to_string(), snapshot.cost.shipping.to_string()),
        ("subtotal".to_string(), snapshot.cost.subtotal.to_string()),
        ("tax".to_string(), snapshot.cost.tax.to_string()),
    ]);
    if snapshot.coupon.is_valid() {
        let code = form.coupon_code.as_deref().unwrap_or("").trim().to_string();
        out.insert("coupon_code".to_string(), code);
        out.insert("discount".to_string(), snapshot.cost.discount.to_string());
    }
    if form.customer_kind == CustomerKind::Company {
        let company = form.company_name.clone().unwrap_or_default();
        out.insert("company_name".to_string(), company);
        out.insert("nip".to_string(), form.nip.clone().unwrap_or_default());
    }
    out
} // end of fn intent_metadata

impl CreatePaymentIntentUseCase {
    pub async fn execute(
        self,
        session_id: &str,
        form: CheckoutFormModel,
        now: DateTime<Utc>,
    ) -> CreatePaymentIntentUsKsResult {
        match self._execute(session_id, form, now).await {
            Ok(Ok((intent, cost))) => CreatePaymentIntentUsKsResult::Success { intent, cost },
            Ok(Err(e)) => CreatePaymentIntentUsKsResult::Invalid(e),
            Err(e) => CreatePaymentIntentUsKsResult::ServerError(e),
        }
    }

    async fn _execute(
        &self,
        session_id: &str,
        form: CheckoutFormModel,
        now: DateTime<Utc>,
    ) -> DefaultResult<DefaultResult<(PaymentIntentModel, CheckoutCostModel), CheckoutFormError>, AppError>
    {
        let snapshot = match CheckoutSnapshot::load_with_form(
            self.repo.as_ref(),
            &self.logctx,
            &self.checkout,
            session_id,
            &form,
            self.ttl_secs,
            now,
        )
        .await?
        {
            Ok(s) => s,
            Err(e) => return Ok(Err(e)),
        };
        let amount_minor = snapshot.cost.total_minor_units();
        let mut args = PaymentIntentCreateArgs {
            amount_minor,
            currency: self.checkout.currency.to_lowercase(),
            receipt_email: form.email.trim().to_string(),
            idempotency_key: String::new(),
            metadata: intent_metadata(session_id, &form, &snapshot),
        };
        // the same cart and form submitted again reuses the payment intent
        // created previously, any other change leads to a new key
        args.idempotency_key = format!(
            "{session_id}-{}-{}",
            snapshot.cart.version,
            args.fingerprint()
        );
        let intent = self.processor.create_intent(args).await?;
        let logctx = &self.logctx;
        app_log_event!(
            logctx,
            AppLogLevel::INFO,
            "payment-intent:{}, session:{session_id}, amount:{amount_minor}",
            intent.id
        );
        if intent.client_secret.is_none() {
            return Err(AppError {
                code: AppErrorCode::RemoteServiceFailure,
                detail: Some(format!("missing-client-secret:{}", intent.id)),
            });
        }
        Ok(Ok((intent, snapshot.cost)))
    } // end of fn _execute
} // end of impl CreatePaymentIntentUseCase

impl PaymentIntentStatusUseCase {
    pub async fn execute(self, intent_id: &str) -> PaymentIntentStatusUsKsResult {
        match self.processor.retrieve_intent(intent_id).await {
            Ok(m) => PaymentIntentStatusUsKsResult::Success(m),
            Err(e) => {
                let e = AppError::from(e);
                if is_remote_not_found(&e) {
                    PaymentIntentStatusUsKsResult::NotFound
                } else {
                    let logctx = &self.logctx;
                    app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
                    PaymentIntentStatusUsKsResult::ServerError(e)
                }
            }
        }
    }
}

impl PaymentPendingUseCase {
    /// the payment returned from redirect is still processing, wait for fixed
    /// period then check the status again, only once
    pub async fn execute(self, intent_id: &str) -> PaymentPendingUsKsResult {
        tokio::time::sleep(Duration::from_secs(checkout_const::PENDING_REPOLL_SECS)).await;
        let intent = match self.processor.retrieve_intent(intent_id).await {
            Ok(m) => m,
            Err(e) => {
                let e = AppError::from(e);
                return if is_remote_not_found(&e) {
                    PaymentPendingUsKsResult::NotFound
                } else {
                    let logctx = &self.logctx;
                    app_log_event!(logctx, AppLogLevel::ERROR, "{}", e);
                    PaymentPendingUsKsResult::ServerError(e)
                };
            }
        };
        let next = PendingNextStep::from(&intent.status);
        let redirect_url = if matches!(next, PendingNextStep::Reload) {
            Some(format!(
                "{}?payment_intent={}&redirect_status=succeeded",
                self.checkout.return_url, intent.id
            ))
        } else {
            None
        };
        PaymentPendingUsKsResult::Success {
            intent,
            next,
            redirect_url,
        }
    }
}

impl ConfirmCheckoutUseCase {
    pub async fn execute(
        self,
        session_id: &str,
        intent_id: &str,
        form: CheckoutFormModel,
        now: DateTime<Utc>,
    ) -> ConfirmCheckoutUsKsResult {
        let repo = self.repo.as_ref();
        let loaded = CheckoutSnapshot::load_with_form(
            repo,
            &self.logctx,
            &self.checkout,
            session_id,
            &form,
            self.ttl_secs,
            now,
        )
        .await;
        let mut snapshot = match loaded {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => return ConfirmCheckoutUsKsResult::Invalid(e),
            Err(e) => return ConfirmCheckoutUsKsResult::ServerError(e),
        };
        let intent = match self.processor.retrieve_intent(intent_id).await {
            Ok(m) => m,
            Err(e) => {
                let e = AppError::from(e);
                return if is_remote_not_found(&e) {
                    ConfirmCheckoutUsKsResult::NotFound
                } else {
                    ConfirmCheckoutUsKsResult::ServerError(e)
                };
            }
        };
        if intent.status != PaymentIntentStatus::Succeeded {
            return ConfirmCheckoutUsKsResult::NotSucceeded(intent.status);
        }
        match self.verify_ownership(session_id, &intent, &snapshot, now).await {
            Ok(None) => {}
            Ok(Some(reason)) => {
                return ConfirmCheckoutUsKsResult::Rejected {
                    status: intent.status,
                    reason,
                }
            }
            Err(e) => return ConfirmCheckoutUsKsResult::ServerError(e),
        }
        let logctx = &self.logctx;
        let order_id = generate_custom_uid(app_meta::MACHINE_CODE)
            .simple()
            .to_string();
        self.relay_order(order_id.as_str(), &intent, &form, &snapshot, now)
            .await;
        let items = snapshot.cart.items.clone();
        snapshot.cart.clear();
        if let Err(e) = repo.save(&mut snapshot.cart).await {
            // the payment is done, failure to clear the cart is not fatal
            app_log_event!(logctx, AppLogLevel::ERROR, "clear-cart-fail, {}", e);
        }
        ConfirmCheckoutUsKsResult::Success {
            order_id,
            intent,
            cost: snapshot.cost,
            items,
        }
    } // end of fn execute

    // the intent has to be created by the same session for the same amount,
    // and each intent turns into at most one order
    async fn verify_ownership(
        &self,
        session_id: &str,
        intent: &PaymentIntentModel,
        snapshot: &CheckoutSnapshot,
        now: DateTime<Utc>,
    ) -> DefaultResult<Option<&'static str>, AppError> {
        let logctx = &self.logctx;
        if intent.session_id() != Some(session_id) {
            app_log_event!(
                logctx,
                AppLogLevel::WARNING,
                "session-mismatch, intent:{}, session:{session_id}",
                intent.id
            );
            return Ok(Some("session-mismatch"));
        }
        let expect_amount = snapshot.cost.total_minor_units();
        if intent.amount != expect_amount {
            app_log_event!(
                logctx,
                AppLogLevel::WARNING,
                "amount-mismatch, intent:{}, paid:{}, cart-total:{expect_amount}",
                intent.id,
                intent.amount
            );
            return Ok(Some("amount-mismatch"));
        }
        let records = self.records.as_ref();
        let claimed = match records.claim_intent(intent.id.as_str(), session_id, now).await {
            Err(e) if e.code == AppErrorCode::ExceedingMaxLimit => {
                let num_purged = records.purge_expired(now, self.ttl_secs).await?;
                app_log_event!(logctx, AppLogLevel::INFO, "confirmed-intent purged:{num_purged}");
                records.claim_intent(intent.id.as_str(), session_id, now).await
            }
            others => others,
        };
        if claimed? {
            Ok(None)
        } else {
            app_log_event!(logctx, AppLogLevel::WARNING, "already-confirmed:{}", intent.id);
            Ok(Some("already-confirmed"))
        }
    } // end of fn verify_ownership

    // forward the order to back-office tools, failures are only logged
    async fn relay_order(
        &self,
        order_id: &str,
        intent: &PaymentIntentModel,
        form: &CheckoutFormModel,
        snapshot: &CheckoutSnapshot,
        now: DateTime<Utc>,
    ) {
        let currency = self.checkout.currency.as_str();
        let customer = match (&form.customer_kind, form.company_name.as_deref()) {
            (CustomerKind::Company, Some(c)) if !c.trim().is_empty() => c.trim().to_string(),
            _others => form.full_name(),
        };
        let order_date = local_today(now).format("%Y-%m-%d").to_string();
        let rows = snapshot
            .cart
            .items
            .iter()
            .map(|item| {
                let product_name = item.name.clone().unwrap_or(item.id.clone());
                HashMap::from([
                    ("containerId".to_string(), String::new()),
                    ("orderId".to_string(), order_id.to_string()),
                    ("customer".to_string(), customer.clone()),
                    ("email".to_string(), form.email.trim().to_string()),
                    ("orderDate".to_string(), order_date.clone()),
                    ("departureDate".to_string(), String::new()),
                    ("productName".to_string(), product_name),
                    ("quantity".to_string(), item.quantity.to_string()),
                    ("unitPrice".to_string(), item.price.to_string()),
                    ("total".to_string(), item.line_total().to_string()),
                    ("currency".to_string(), currency.to_uppercase()),
                ])
            })
            .collect::<Vec<_>>();
        let payload = self.hook_payload(order_id, intent, form, snapshot, now);
        let (sheet_result, hook_result) = futures_util::future::join(
            self.spreadsheet.append_rows(rows),
            self.hook.relay(payload),
        )
        .await;
        let logctx = &self.logctx;
        if let Err(e) = sheet_result {
            app_log_event!(logctx, AppLogLevel::ERROR, "order:{order_id}, {:?}", e);
        }
        if let Err(e) = hook_result {
            app_log_event!(logctx, AppLogLevel::ERROR, "order:{order_id}, {:?}", e);
        }
    } // end of fn relay_order

    fn hook_payload(
        &self,
        order_id: &str,
        intent: &PaymentIntentModel,
        form: &CheckoutFormModel,
        snapshot: &CheckoutSnapshot,
        now: DateTime<Utc>,
    ) -> JsnVal {
        let items = snapshot
            .cart
            .items
            .iter()
            .map(|i| {
                json!({
                    "id": i.id, "variant": i.variant, "name": i.name, "sku": i.sku,
                    "quantity": i.quantity, "price": i.price.to_string(),
                })
            })
            .collect::<Vec<_>>();
        let customer_type = match form.customer_kind {
            CustomerKind::Individual => "individual",
            CustomerKind::Company => "company",
        };
        let coupon_code = if snapshot.coupon.is_valid() {
            form.coupon_code.clone()
        } else {
            None
        };
        let cost = &snapshot.cost;
        json!({
            "orderId": order_id,
            "paymentIntentId": intent.id,
            "createdAt": now.to_rfc3339(),
            "customer": {
                "type": customer_type,
                "firstName": form.first_name.trim(),
                "lastName": form.last_name.trim(),
                "email": form.email.trim(),
                "phone": form.phone.trim(),
                "street": form.street.trim(),
                "city": form.city.trim(),
                "postalCode": form.postal_code.trim(),
                "companyName": form.company_name,
                "nip": form.nip,
            },
            "shipping": {
                "code": snapshot.shipping.code,
                "label": snapshot.shipping.label,
                "price": snapshot.shipping.price.to_string(),
            },
            "couponCode": coupon_code,
            "items": items,
            "breakdown": {
                "subtotal": cost.subtotal.to_string(),
                "tax": cost.tax.to_string(),
                "shipping": cost.shipping.to_string(),
                "discount": cost.discount.to_string(),
                "total": cost.total.to_string(),
            },
            "currency": self.checkout.currency,
        })
    } // end of fn hook_payload
} // end of impl ConfirmCheckoutUseCase
