//! Form screens: field state, required-field checks, submission and reset.

use std::collections::BTreeMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use fundpay_types::api::{ContactSubmission, NewCampaign, SignupRequest};
use fundpay_types::models::Role;
use tracing::{debug, error, info, warn};

use crate::api::{Attachment, FundpayApi};
use crate::error::Result;
use crate::lifecycle::Mount;
use crate::notify::{Notifications, Severity};
use crate::{Redirect, lock};

pub const REQUIRED_MESSAGE: &str = "Please fill all required fields.";

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub initial: &'static str,
}

const fn field(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        required: false,
        initial: "",
    }
}

const fn required(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        required: true,
        initial: "",
    }
}

pub type FormValues = BTreeMap<&'static str, String>;
pub type FormFiles = BTreeMap<&'static str, Attachment>;

/// Per-form wiring: fields, file slots, messages and the request to send.
pub trait FormKind: Send + Sync + 'static {
    const NAME: &'static str;
    const FIELDS: &'static [FieldSpec];
    /// Optional file slots, at most two.
    const FILES: &'static [&'static str];
    const SUCCESS_MESSAGE: &'static str;
    /// Shown when a submission fails and the server gave no message.
    const FAILURE_MESSAGE: &'static str;

    /// Form-specific checks, run after the required-field check passes.
    fn check(_values: &FormValues) -> Option<&'static str> {
        None
    }

    /// Where to go after a successful submission.
    fn redirect() -> Option<Redirect> {
        None
    }

    fn send<A: FundpayApi>(
        api: &A,
        values: FormValues,
        files: FormFiles,
    ) -> impl Future<Output = Result<()>> + Send;
}

fn take(values: &mut FormValues, name: &str) -> String {
    values.remove(name).unwrap_or_default()
}

pub struct AddCampaign;

impl FormKind for AddCampaign {
    const NAME: &'static str = "add_campaign";
    const FIELDS: &'static [FieldSpec] = &[
        required("title"),
        field("description"),
        required("targetAmount"),
        field("upi"),
        field("bank"),
    ];
    const FILES: &'static [&'static str] = &["thumbnail", "qrCode"];
    const SUCCESS_MESSAGE: &'static str = "Campaign added successfully!";
    const FAILURE_MESSAGE: &'static str = "Failed to add campaign";

    fn check(values: &FormValues) -> Option<&'static str> {
        let amount = values.get("targetAmount").map(|v| v.trim().parse::<f64>());
        match amount {
            Some(Ok(amount)) if amount.is_finite() && amount >= 1.0 => None,
            _ => Some("Target amount must be at least 1."),
        }
    }

    fn send<A: FundpayApi>(
        api: &A,
        mut values: FormValues,
        mut files: FormFiles,
    ) -> impl Future<Output = Result<()>> + Send {
        let campaign = NewCampaign {
            title: take(&mut values, "title"),
            description: take(&mut values, "description"),
            target_amount: take(&mut values, "targetAmount").trim().to_string(),
            upi: take(&mut values, "upi"),
            bank: take(&mut values, "bank"),
        };
        api.create_campaign(campaign, files.remove("thumbnail"), files.remove("qrCode"))
    }
}

pub struct Contact;

impl FormKind for Contact {
    const NAME: &'static str = "contact";
    const FIELDS: &'static [FieldSpec] = &[required("issue"), required("description")];
    const FILES: &'static [&'static str] = &["screenshot"];
    const SUCCESS_MESSAGE: &'static str = "Message sent successfully!";
    const FAILURE_MESSAGE: &'static str = "Error sending message. Try again later.";

    fn send<A: FundpayApi>(
        api: &A,
        mut values: FormValues,
        mut files: FormFiles,
    ) -> impl Future<Output = Result<()>> + Send {
        let submission = ContactSubmission {
            issue: take(&mut values, "issue"),
            description: take(&mut values, "description"),
        };
        api.submit_contact(submission, files.remove("screenshot"))
    }
}

pub struct SignUp;

impl FormKind for SignUp {
    const NAME: &'static str = "signup";
    const FIELDS: &'static [FieldSpec] = &[
        required("name"),
        required("email"),
        required("password"),
        FieldSpec {
            name: "role",
            required: false,
            initial: "user",
        },
    ];
    const FILES: &'static [&'static str] = &[];
    const SUCCESS_MESSAGE: &'static str = "Account created. Please log in.";
    const FAILURE_MESSAGE: &'static str = "Signup failed";

    fn check(values: &FormValues) -> Option<&'static str> {
        let role = values.get("role").map(String::as_str).unwrap_or_default();
        Role::parse(role).is_none().then_some("Please choose a valid role.")
    }

    fn redirect() -> Option<Redirect> {
        Some(Redirect("/login".into()))
    }

    fn send<A: FundpayApi>(
        api: &A,
        mut values: FormValues,
        _files: FormFiles,
    ) -> impl Future<Output = Result<()>> + Send {
        let request = SignupRequest {
            name: take(&mut values, "name"),
            email: take(&mut values, "email"),
            password: take(&mut values, "password"),
            role: Role::parse(&take(&mut values, "role")).unwrap_or_default(),
        };
        api.signup(request)
    }
}

/// Inline message under the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub severity: Severity,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Client-side validation failed; nothing was sent.
    Rejected(String),
    Succeeded(Option<Redirect>),
    Failed(String),
    /// A submission is already in flight.
    Busy,
    /// The form unmounted before the response arrived.
    Cancelled,
}

/// Holds the submitting flag for the lifetime of one submission.
struct Submitting<'a>(&'a AtomicBool);

impl<'a> Submitting<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for Submitting<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct FormController<A, F: FormKind> {
    api: Arc<A>,
    notifications: Arc<Notifications>,
    mount: Mount,
    values: Mutex<FormValues>,
    files: Mutex<FormFiles>,
    feedback: Mutex<Option<Feedback>>,
    submitting: AtomicBool,
    _form: PhantomData<fn() -> F>,
}

impl<A: FundpayApi, F: FormKind> FormController<A, F> {
    pub fn new(api: Arc<A>, notifications: Arc<Notifications>) -> Self {
        Self {
            api,
            notifications,
            mount: Mount::new(),
            values: Mutex::new(initial_values::<F>()),
            files: Mutex::new(FormFiles::new()),
            feedback: Mutex::new(None),
            submitting: AtomicBool::new(false),
            _form: PhantomData,
        }
    }

    /// Keystroke handler. Unknown field names are ignored.
    pub fn set_field(&self, name: &str, value: impl Into<String>) -> bool {
        let Some(spec) = F::FIELDS.iter().find(|f| f.name == name) else {
            warn!(form = F::NAME, field = name, "unknown field");
            return false;
        };
        lock(&self.values).insert(spec.name, value.into());
        true
    }

    pub fn value(&self, name: &str) -> String {
        lock(&self.values).get(name).cloned().unwrap_or_default()
    }

    pub fn values(&self) -> FormValues {
        lock(&self.values).clone()
    }

    pub fn attach(&self, slot: &str, file: Attachment) -> bool {
        let Some(slot) = F::FILES.iter().find(|s| **s == slot) else {
            warn!(form = F::NAME, slot, "unknown file slot");
            return false;
        };
        lock(&self.files).insert(slot, file);
        true
    }

    pub fn detach(&self, slot: &str) -> Option<Attachment> {
        lock(&self.files).remove(slot)
    }

    pub fn attached(&self) -> Vec<&'static str> {
        lock(&self.files).keys().copied().collect()
    }

    pub fn feedback(&self) -> Option<Feedback> {
        lock(&self.feedback).clone()
    }

    /// Whether the submit control is disabled.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        self.mount.unmount();
    }

    pub async fn submit(&self) -> SubmitOutcome {
        let Some(_submitting) = Submitting::acquire(&self.submitting) else {
            debug!(form = F::NAME, "submit ignored while submitting");
            return SubmitOutcome::Busy;
        };

        let values = self.values();
        if let Some(message) = missing_required::<F>(&values).or_else(|| F::check(&values)) {
            debug!(form = F::NAME, reason = message, "validation failed");
            self.set_feedback(Severity::Error, message);
            return SubmitOutcome::Rejected(message.to_string());
        }

        *lock(&self.feedback) = None;
        let files = lock(&self.files).clone();
        info!(form = F::NAME, files = files.len(), "submitting");

        let Some(result) = self.mount.guard(F::send(&*self.api, values, files)).await else {
            debug!(form = F::NAME, "unmounted; response discarded");
            return SubmitOutcome::Cancelled;
        };

        match result {
            Ok(()) => {
                info!(form = F::NAME, "submitted");
                self.reset();
                self.set_feedback(Severity::Success, F::SUCCESS_MESSAGE);
                self.notifications.success(F::SUCCESS_MESSAGE);
                SubmitOutcome::Succeeded(F::redirect())
            }
            Err(err) => {
                error!(form = F::NAME, error = %err, "submission failed");
                let message = err.user_message(F::FAILURE_MESSAGE);
                self.set_feedback(Severity::Error, &message);
                self.notifications.error(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    fn reset(&self) {
        *lock(&self.values) = initial_values::<F>();
        lock(&self.files).clear();
    }

    fn set_feedback(&self, severity: Severity, text: &str) {
        *lock(&self.feedback) = Some(Feedback {
            severity,
            text: text.to_string(),
        });
    }
}

fn initial_values<F: FormKind>() -> FormValues {
    F::FIELDS
        .iter()
        .map(|f| (f.name, f.initial.to_string()))
        .collect()
}

fn missing_required<F: FormKind>(values: &FormValues) -> Option<&'static str> {
    let missing = F::FIELDS
        .iter()
        .filter(|f| f.required)
        .any(|f| values.get(f.name).is_none_or(|v| v.trim().is_empty()));
    missing.then_some(REQUIRED_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeApi, Submitted};

    fn form<F: FormKind>() -> (Arc<FakeApi>, FormController<FakeApi, F>) {
        let api = Arc::new(FakeApi::default());
        let controller = FormController::new(api.clone(), Arc::new(Notifications::default()));
        (api, controller)
    }

    #[tokio::test]
    async fn missing_required_field_never_hits_network() {
        let (api, contact) = form::<Contact>();
        contact.set_field("issue", "Payment stuck");
        contact.set_field("description", "   ");

        let outcome = contact.submit().await;
        assert_eq!(outcome, SubmitOutcome::Rejected(REQUIRED_MESSAGE.into()));
        assert_eq!(api.submission_count(), 0);
        assert_eq!(
            contact.feedback(),
            Some(Feedback {
                severity: Severity::Error,
                text: REQUIRED_MESSAGE.into()
            })
        );
        assert!(contact.notifications.active().is_empty());
        assert!(!contact.is_submitting());
    }

    #[tokio::test]
    async fn contact_success_clears_fields_and_files() {
        let (api, contact) = form::<Contact>();
        contact.set_field("issue", "Receipt missing");
        contact.set_field("description", "Paid yesterday, no receipt yet");
        assert!(contact.attach("screenshot", Attachment::new("shot.png", "image/png", vec![1u8; 8])));

        assert_eq!(contact.submit().await, SubmitOutcome::Succeeded(None));
        assert_eq!(contact.value("issue"), "");
        assert!(contact.attached().is_empty());
        assert_eq!(
            contact.feedback().map(|f| f.text),
            Some("Message sent successfully!".into())
        );

        let sent = lock(&api.submissions).clone();
        assert_eq!(
            sent,
            [Submitted::Contact(
                ContactSubmission {
                    issue: "Receipt missing".into(),
                    description: "Paid yesterday, no receipt yet".into(),
                },
                Some("shot.png".into())
            )]
        );
    }

    #[tokio::test]
    async fn add_campaign_sends_both_files() {
        let (api, add) = form::<AddCampaign>();
        add.set_field("title", "Clean Water");
        add.set_field("targetAmount", " 5000 ");
        add.attach("thumbnail", Attachment::new("thumb.jpg", "image/jpeg", vec![0u8; 4]));
        add.attach("qrCode", Attachment::new("qr.png", "image/png", vec![0u8; 4]));

        assert_eq!(add.submit().await, SubmitOutcome::Succeeded(None));
        let sent = lock(&api.submissions).clone();
        let [Submitted::Campaign(campaign, thumb, qr)] = sent.as_slice() else {
            panic!("unexpected submissions: {sent:?}");
        };
        assert_eq!(campaign.title, "Clean Water");
        assert_eq!(campaign.target_amount, "5000");
        assert_eq!(thumb.as_deref(), Some("thumb.jpg"));
        assert_eq!(qr.as_deref(), Some("qr.png"));

        let toasts = add.notifications.active();
        assert_eq!(toasts[0].message, "Campaign added successfully!");
    }

    #[tokio::test]
    async fn add_campaign_rejects_small_target() {
        let (api, add) = form::<AddCampaign>();
        add.set_field("title", "Clean Water");
        add.set_field("targetAmount", "0");

        assert_eq!(
            add.submit().await,
            SubmitOutcome::Rejected("Target amount must be at least 1.".into())
        );
        assert_eq!(api.submission_count(), 0);
    }

    #[tokio::test]
    async fn add_campaign_failure_uses_generic_message() {
        let (api, add) = form::<AddCampaign>();
        api.fail_submit(500, None);
        add.set_field("title", "Clean Water");
        add.set_field("targetAmount", "100");

        assert_eq!(
            add.submit().await,
            SubmitOutcome::Failed("Failed to add campaign".into())
        );
        assert_eq!(add.value("title"), "Clean Water");
    }

    #[tokio::test]
    async fn signup_shows_server_message_and_keeps_fields() {
        let (api, signup) = form::<SignUp>();
        api.fail_submit(400, Some("Email exists"));
        signup.set_field("name", "Asha Rao");
        signup.set_field("email", "asha@example.com");
        signup.set_field("password", "hunter22");

        let outcome = signup.submit().await;
        assert_eq!(outcome, SubmitOutcome::Failed("Email exists".into()));
        assert_eq!(signup.feedback().map(|f| f.text), Some("Email exists".into()));
        assert!(!signup.is_submitting());
        assert_eq!(signup.value("email"), "asha@example.com");
        assert_eq!(signup.value("password"), "hunter22");
    }

    #[tokio::test]
    async fn signup_success_redirects_to_login() {
        let (api, signup) = form::<SignUp>();
        assert_eq!(signup.value("role"), "user");
        signup.set_field("name", "Ravi");
        signup.set_field("email", "ravi@example.com");
        signup.set_field("password", "s3cret!!");
        signup.set_field("role", "admin");

        let outcome = signup.submit().await;
        assert_eq!(outcome, SubmitOutcome::Succeeded(Some(Redirect("/login".into()))));
        assert_eq!(
            lock(&api.submissions).clone(),
            [Submitted::Signup("ravi@example.com".into(), "admin".into())]
        );
        assert_eq!(signup.value("role"), "user");
    }

    #[tokio::test]
    async fn submitting_flag_blocks_double_submit() {
        let (api, contact) = form::<Contact>();
        let gate = api.gate_submit();
        contact.set_field("issue", "Login");
        contact.set_field("description", "Cannot log in");

        let (first, _) = tokio::join!(contact.submit(), async {
            gate.entered().await;
            assert!(contact.is_submitting());
            assert_eq!(contact.submit().await, SubmitOutcome::Busy);
            gate.open();
        });

        assert_eq!(first, SubmitOutcome::Succeeded(None));
        assert!(!contact.is_submitting());
        assert_eq!(api.submission_count(), 1);
    }

    #[test]
    fn unknown_fields_and_slots_are_ignored() {
        let (_, signup) = form::<SignUp>();
        assert!(!signup.set_field("nickname", "ace"));
        assert!(!signup.attach("avatar", Attachment::new("a.png", "image/png", Vec::<u8>::new())));
        assert!(signup.values().get("nickname").is_none());
    }
}
