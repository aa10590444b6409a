//! In-memory [`FundpayApi`] double for controller tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use fundpay_types::api::{ContactSubmission, NewCampaign, SignupRequest};
use fundpay_types::models::{Campaign, CampaignId, Payment, PaymentId, PaymentStatus};
use reqwest::StatusCode;
use tokio::sync::Notify;

use crate::api::{Attachment, FundpayApi};
use crate::error::{ClientError, Result};
use crate::lock;

/// Holds a request in flight until the test lets it go.
#[derive(Default)]
pub(crate) struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }

    pub(crate) async fn entered(&self) {
        self.entered.notified().await;
    }

    pub(crate) fn open(&self) {
        self.release.notify_one();
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Submitted {
    Campaign(NewCampaign, Option<String>, Option<String>),
    Contact(ContactSubmission, Option<String>),
    Signup(String, String),
}

#[derive(Default)]
pub(crate) struct FakeApi {
    pub campaigns: Mutex<Vec<Campaign>>,
    pub pending: Mutex<Vec<Payment>>,
    pub mine: Mutex<Vec<Payment>>,
    pub list_calls: AtomicUsize,
    /// The next N list fetches fail with a 500.
    pub list_failures: AtomicUsize,
    pub list_gate: Mutex<Option<Arc<Gate>>>,
    pub action_calls: AtomicUsize,
    pub failing_actions: Mutex<HashSet<PaymentId>>,
    pub action_gates: Mutex<HashMap<PaymentId, Arc<Gate>>>,
    /// Status echoed back by verify/reject; `None` echoes nothing.
    pub echo_status: Mutex<Option<PaymentStatus>>,
    pub submissions: Mutex<Vec<Submitted>>,
    pub submit_error: Mutex<Option<(u16, Option<String>)>>,
    pub submit_gate: Mutex<Option<Arc<Gate>>>,
}

impl FakeApi {
    pub(crate) fn with_pending(payments: Vec<Payment>) -> Self {
        let api = Self::default();
        *lock(&api.pending) = payments;
        api
    }

    pub(crate) fn with_campaigns(campaigns: Vec<Campaign>) -> Self {
        let api = Self::default();
        *lock(&api.campaigns) = campaigns;
        api
    }

    pub(crate) fn gate_lists(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *lock(&self.list_gate) = Some(gate.clone());
        gate
    }

    pub(crate) fn gate_action(&self, id: &str) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        lock(&self.action_gates).insert(PaymentId::from(id), gate.clone());
        gate
    }

    pub(crate) fn gate_submit(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *lock(&self.submit_gate) = Some(gate.clone());
        gate
    }

    pub(crate) fn fail_action(&self, id: &str) {
        lock(&self.failing_actions).insert(PaymentId::from(id));
    }

    pub(crate) fn fail_submit(&self, status: u16, message: Option<&str>) {
        *lock(&self.submit_error) = Some((status, message.map(str::to_string)));
    }

    async fn list<T: Clone>(&self, source: &Mutex<Vec<T>>) -> Result<Vec<T>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.list_gate).clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        let failing = self
            .list_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(status_error(500, None));
        }
        Ok(lock(source).clone())
    }

    async fn action(&self, id: &PaymentId) -> Result<Option<Payment>> {
        self.action_calls.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.action_gates).get(id).cloned();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        if lock(&self.failing_actions).contains(id) {
            return Err(status_error(500, Some("Payment service unavailable".into())));
        }
        let echo = *lock(&self.echo_status);
        Ok(echo.map(|status| Payment {
            status,
            ..payment(&id.0, 0.0)
        }))
    }

    async fn submit(&self, record: Submitted) -> Result<()> {
        let gate = lock(&self.submit_gate).clone();
        if let Some(gate) = gate {
            gate.pass().await;
        }
        lock(&self.submissions).push(record);
        match lock(&self.submit_error).clone() {
            Some((status, message)) => Err(status_error(status, message)),
            None => Ok(()),
        }
    }

    pub(crate) fn submission_count(&self) -> usize {
        lock(&self.submissions).len()
    }
}

fn status_error(status: u16, message: Option<String>) -> ClientError {
    ClientError::Status {
        status: StatusCode::from_u16(status).unwrap(),
        message,
    }
}

impl FundpayApi for FakeApi {
    async fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        self.list(&self.campaigns).await
    }

    async fn create_campaign(
        &self,
        campaign: NewCampaign,
        thumbnail: Option<Attachment>,
        qr_code: Option<Attachment>,
    ) -> Result<()> {
        self.submit(Submitted::Campaign(
            campaign,
            thumbnail.map(|f| f.file_name),
            qr_code.map(|f| f.file_name),
        ))
        .await
    }

    async fn submit_contact(
        &self,
        submission: ContactSubmission,
        screenshot: Option<Attachment>,
    ) -> Result<()> {
        self.submit(Submitted::Contact(submission, screenshot.map(|f| f.file_name)))
            .await
    }

    async fn signup(&self, request: SignupRequest) -> Result<()> {
        self.submit(Submitted::Signup(request.email, request.role.as_str().to_string()))
            .await
    }

    async fn pending_payments(&self) -> Result<Vec<Payment>> {
        self.list(&self.pending).await
    }

    async fn verify_payment(&self, id: &PaymentId) -> Result<Option<Payment>> {
        self.action(id).await
    }

    async fn reject_payment(&self, id: &PaymentId) -> Result<Option<Payment>> {
        self.action(id).await
    }

    async fn my_payments(&self) -> Result<Vec<Payment>> {
        self.list(&self.mine).await
    }

    fn resolve_asset(&self, path: &str) -> String {
        format!("http://backend.test{}", path.trim())
    }
}

pub(crate) fn campaign(id: &str, title: &str) -> Campaign {
    Campaign {
        id: CampaignId::from(id),
        title: title.to_string(),
        description: String::new(),
        target_amount: 1000.0,
        thumbnail_url: None,
        qr_code_url: None,
        upi: None,
        bank: None,
        created_at: None,
    }
}

pub(crate) fn payment(id: &str, amount: f64) -> Payment {
    Payment {
        id: PaymentId::from(id),
        amount,
        campaign: None,
        user: None,
        status: PaymentStatus::Pending,
        receipt_url: None,
        screenshot_url: None,
        created_at: None,
    }
}
