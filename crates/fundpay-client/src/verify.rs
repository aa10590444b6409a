//! Admin payment verification: the pending list plus per-payment
//! verify/reject actions applied locally on success.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use fundpay_types::models::{Payment, PaymentId, PaymentStatus};
use tracing::{error, info, warn};

use crate::api::FundpayApi;
use crate::error::ClientError;
use crate::format::format_currency;
use crate::list::{ListController, ListState, ListView, PendingPayments};
use crate::lock;
use crate::notify::Notifications;

/// What is currently in flight for one payment. At most one action per
/// payment runs at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActionState {
    #[default]
    Idle,
    Verifying,
    Rejecting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Verify,
    Reject,
}

impl Action {
    fn in_flight(self) -> ActionState {
        match self {
            Self::Verify => ActionState::Verifying,
            Self::Reject => ActionState::Rejecting,
        }
    }

    fn target(self) -> PaymentStatus {
        match self {
            Self::Verify => PaymentStatus::Verified,
            Self::Reject => PaymentStatus::Rejected,
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            Self::Verify => "Payment verified.",
            Self::Reject => "Payment rejected.",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Self::Verify => "Verification failed. Please try again.",
            Self::Reject => "Rejection failed. Please try again.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The backend accepted the transition and the payment left the list.
    Removed,
    /// The payment stays; the message was pushed as a notification.
    Failed(String),
    /// Another action on the same payment is still running.
    Busy,
    /// The payment is not on screen.
    Missing,
    /// The screen unmounted before the response arrived.
    Cancelled,
}

/// One row of the pending list, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentCard {
    pub id: PaymentId,
    pub amount: String,
    pub payer: String,
    pub screenshot_url: Option<String>,
    pub verify_label: &'static str,
    pub reject_label: &'static str,
    /// Both buttons are disabled while either action is in flight.
    pub actions_disabled: bool,
}

pub struct VerifyPaymentsController<A> {
    list: ListController<A, PendingPayments>,
    actions: Mutex<HashMap<PaymentId, ActionState>>,
    preview: Mutex<Option<String>>,
}

impl<A: FundpayApi> VerifyPaymentsController<A> {
    pub fn new(api: Arc<A>, notifications: Arc<Notifications>) -> Self {
        Self {
            list: ListController::new(api, notifications),
            actions: Mutex::new(HashMap::new()),
            preview: Mutex::new(None),
        }
    }

    pub async fn mount(&self) {
        self.list.mount().await;
    }

    pub async fn retry(&self) -> bool {
        self.list.retry().await
    }

    pub fn unmount(&self) {
        self.list.unmount();
    }

    pub fn state(&self) -> ListState<Payment> {
        self.list.state()
    }

    pub fn view(&self) -> ListView<Payment> {
        self.list.view()
    }

    pub fn notifications(&self) -> &Arc<Notifications> {
        self.list.notifications()
    }

    pub fn action_state(&self, id: &PaymentId) -> ActionState {
        lock(&self.actions).get(id).copied().unwrap_or_default()
    }

    pub fn is_disabled(&self, id: &PaymentId) -> bool {
        self.action_state(id) != ActionState::Idle
    }

    pub fn cards(&self) -> Vec<PaymentCard> {
        let actions = lock(&self.actions).clone();
        self.list
            .items()
            .into_iter()
            .map(|payment| {
                let state = actions.get(&payment.id).copied().unwrap_or_default();
                PaymentCard {
                    amount: format_currency(payment.amount),
                    payer: payment.payer_name().to_string(),
                    screenshot_url: self.screenshot_url(&payment),
                    verify_label: if state == ActionState::Verifying {
                        "Verifying..."
                    } else {
                        "Verify"
                    },
                    reject_label: if state == ActionState::Rejecting {
                        "Rejecting..."
                    } else {
                        "Reject"
                    },
                    actions_disabled: state != ActionState::Idle,
                    id: payment.id,
                }
            })
            .collect()
    }

    pub async fn verify(&self, id: &PaymentId) -> ActionOutcome {
        self.run(id, Action::Verify).await
    }

    pub async fn reject(&self, id: &PaymentId) -> ActionOutcome {
        self.run(id, Action::Reject).await
    }

    async fn run(&self, id: &PaymentId, action: Action) -> ActionOutcome {
        if self.list.find(|p| &p.id == id).is_none() {
            warn!(payment = %id, ?action, "action on a payment that is not listed");
            return ActionOutcome::Missing;
        }
        {
            let mut actions = lock(&self.actions);
            if actions.get(id).is_some_and(|s| *s != ActionState::Idle) {
                return ActionOutcome::Busy;
            }
            actions.insert(id.clone(), action.in_flight());
        }
        info!(payment = %id, ?action, "payment action started");

        let api = self.list.api();
        let call = async {
            let confirmed = match action {
                Action::Verify => api.verify_payment(id).await?,
                Action::Reject => api.reject_payment(id).await?,
            };
            match confirmed {
                Some(payment) if payment.status != action.target() => {
                    Err(ClientError::UnconfirmedStatus {
                        expected: action.target(),
                        actual: payment.status,
                    })
                }
                _ => Ok(()),
            }
        };
        let result = self.list.lifetime().guard(call).await;

        // An accepted payment is never listed with an idle marker.
        if let Some(Ok(())) = result {
            self.list.remove_where(|p| &p.id == id);
        }
        lock(&self.actions).remove(id);

        let Some(result) = result else {
            return ActionOutcome::Cancelled;
        };
        match result {
            Ok(()) => {
                info!(payment = %id, status = %action.target(), "payment action confirmed");
                self.notifications().success(action.success_message());
                ActionOutcome::Removed
            }
            Err(err) => {
                error!(payment = %id, ?action, error = %err, "payment action failed");
                let message = action.failure_message().to_string();
                self.notifications().error(message.clone());
                ActionOutcome::Failed(message)
            }
        }
    }

    /// Opens the enlarged screenshot for a payment. Returns the URL shown.
    pub fn open_preview(&self, id: &PaymentId) -> Option<String> {
        let url = self
            .list
            .find(|p| &p.id == id)
            .and_then(|p| self.screenshot_url(&p));
        *lock(&self.preview) = url.clone();
        url
    }

    pub fn close_preview(&self) {
        lock(&self.preview).take();
    }

    pub fn preview(&self) -> Option<String> {
        lock(&self.preview).clone()
    }

    fn screenshot_url(&self, payment: &Payment) -> Option<String> {
        payment
            .screenshot_url
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .map(|path| self.list.api().resolve_asset(path))
    }
}
