use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentIntentStatus {
    RequiresPaymentMethod,
    RequiresConfirmation,
    RequiresAction,
    Processing,
    RequiresCapture,
    Canceled,
    Succeeded,
    Unknown(String),
}

#[derive(Debug, Clone)]
pub struct PaymentIntentModel {
    pub id: String,
    pub client_secret: Option<String>,
    pub status: PaymentIntentStatus,
    pub amount: i64, // minor currency unit
    pub currency: String,
    // key-value pairs attached at creation, `session_id` identifies the
    // shopper session which created the intent
    pub metadata: HashMap<String, String>,
}

// what the checkout page does next, after a payment returning from redirect
// is reported as still processing
#[derive(Debug, Clone, PartialEq)]
pub enum PendingNextStep {
    Reload,
    BackToCart,
    Stay,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentFlowState {
    FormIncomplete,
    FormComplete,
    IntentRequested,
    WidgetMounted,
    Confirming,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub enum PaymentFlowEvent {
    // result of form validation, `true` means all checks passed
    FormChecked(bool),
    IntentRequested,
    IntentCreated { client_secret: String },
    IntentRejected(String),
    WidgetMounted,
    ConfirmSubmitted,
    ConfirmResolved(PaymentIntentStatus),
    ConfirmFailed(String),
    PageReloaded,
}

#[derive(Debug, PartialEq)]
pub struct PaymentFlowError {
    pub from: PaymentFlowState,
    pub event: &'static str,
}

/// client-side progression of one checkout attempt :
/// form-incomplete -> form-complete -> intent-requested -> widget-mounted
/// -> confirming -> succeeded | failed
///
/// There is no cancellation, reloading the page restarts from form-incomplete.
/// A failed confirmation keeps the form usable, shoppers can submit again.
#[derive(Debug)]
pub struct PaymentFlow {
    state: PaymentFlowState,
    client_secret: Option<String>,
    last_error: Option<String>,
}

impl PaymentIntentStatus {
    pub fn from_processor(raw: &str) -> Self {
        match raw {
            "requires_payment_method" => Self::RequiresPaymentMethod,
            "requires_confirmation" => Self::RequiresConfirmation,
            "requires_action" => Self::RequiresAction,
            "processing" => Self::Processing,
            "requires_capture" => Self::RequiresCapture,
            "canceled" => Self::Canceled,
            "succeeded" => Self::Succeeded,
            _others => Self::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::RequiresAction => "requires_action",
            Self::Processing => "processing",
            Self::RequiresCapture => "requires_capture",
            Self::Canceled => "canceled",
            Self::Succeeded => "succeeded",
            Self::Unknown(s) => s.as_str(),
        }
    }
}

impl PaymentIntentModel {
    pub fn session_id(&self) -> Option<&str> {
        self.metadata.get("session_id").map(String::as_str)
    }
}

impl From<&PaymentIntentStatus> for PendingNextStep {
    fn from(value: &PaymentIntentStatus) -> Self {
        match value {
            PaymentIntentStatus::Succeeded => Self::Reload,
            PaymentIntentStatus::RequiresPaymentMethod => Self::BackToCart,
            _others => Self::Stay,
        }
    }
}

impl PendingNextStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reload => "reload",
            Self::BackToCart => "back-to-cart",
            Self::Stay => "stay",
        }
    }
}

impl Default for PaymentFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentFlow {
    pub fn new() -> Self {
        Self {
            state: PaymentFlowState::FormIncomplete,
            client_secret: None,
            last_error: None,
        }
    }

    pub fn state(&self) -> &PaymentFlowState {
        &self.state
    }
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn apply(&mut self, event: PaymentFlowEvent) -> Result<&PaymentFlowState, PaymentFlowError> {
        use PaymentFlowEvent as Ev;
        use PaymentFlowState as St;
        let next = match (&self.state, event) {
            (_, Ev::PageReloaded) => {
                self.client_secret = None;
                self.last_error = None;
                St::FormIncomplete
            }
            (St::FormIncomplete | St::FormComplete, Ev::FormChecked(passed)) => {
                if passed {
                    St::FormComplete
                } else {
                    St::FormIncomplete
                }
            }
            (St::FormComplete, Ev::IntentRequested) => St::IntentRequested,
            (St::IntentRequested, Ev::IntentCreated { client_secret }) => {
                self.client_secret = Some(client_secret);
                self.last_error = None;
                St::IntentRequested
            }
            (St::IntentRequested, Ev::IntentRejected(reason)) => {
                self.last_error = Some(reason);
                St::FormComplete
            }
            (St::IntentRequested, Ev::WidgetMounted) if self.client_secret.is_some() => {
                St::WidgetMounted
            }
            (St::WidgetMounted | St::Failed, Ev::ConfirmSubmitted) => St::Confirming,
            (St::Confirming, Ev::ConfirmResolved(status)) => match status {
                PaymentIntentStatus::Succeeded
                | PaymentIntentStatus::Processing
                | PaymentIntentStatus::RequiresCapture => {
                    self.last_error = None;
                    St::Succeeded
                }
                other => {
                    self.last_error = Some(other.as_str().to_string());
                    St::Failed
                }
            },
            (St::Confirming, Ev::ConfirmFailed(reason)) => {
                self.last_error = Some(reason);
                St::Failed
            }
            (_, event) => {
                return Err(PaymentFlowError {
                    from: self.state.clone(),
                    event: event.label(),
                })
            }
        };
        self.state = next;
        Ok(&self.state)
    } // end of fn apply
} // end of impl PaymentFlow

impl PaymentFlowEvent {
    fn label(&self) -> &'static str {
        match self {
            Self::FormChecked(_) => "form-checked",
            Self::IntentRequested => "intent-requested",
            Self::IntentCreated { .. } => "intent-created",
            Self::IntentRejected(_) => "intent-rejected",
            Self::WidgetMounted => "widget-mounted",
            Self::ConfirmSubmitted => "confirm-submitted",
            Self::ConfirmResolved(_) => "confirm-resolved",
            Self::ConfirmFailed(_) => "confirm-failed",
            Self::PageReloaded => "page-reloaded",
        }
    }
}
