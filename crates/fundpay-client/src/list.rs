//! Fetch-and-render lifecycle shared by every list screen.
//!
//! A screen mounts, issues exactly one fetch, and lands in one of four
//! renderable states: loader, error with retry, empty message, or the list
//! itself. Retrying is always a user action; nothing here polls.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use fundpay_types::models::{Campaign, Payment, PaymentId, PaymentStatus};
use tracing::{debug, error, info};

use crate::api::FundpayApi;
use crate::error::Result;
use crate::format::{format_currency, format_timestamp};
use crate::lifecycle::Mount;
use crate::notify::Notifications;
use crate::session::Session;
use crate::{Redirect, lock};

#[derive(Debug, Clone, PartialEq)]
pub enum ListState<T> {
    Idle,
    Loading,
    Populated(Vec<T>),
    Empty,
    Error(String),
}

/// What a renderer draws for a list screen.
#[derive(Debug, Clone, PartialEq)]
pub enum ListView<T> {
    Loader,
    Error { message: String },
    Empty { message: &'static str },
    Items(Vec<T>),
}

/// Per-screen wiring: where the list comes from and what the user reads
/// when it is empty or failed.
pub trait ListScreen: Send + Sync + 'static {
    type Item: Clone + Send + Sync;

    const NAME: &'static str;
    const EMPTY_MESSAGE: &'static str;
    const ERROR_MESSAGE: &'static str;

    fn fetch<A: FundpayApi>(api: &A) -> impl Future<Output = Result<Vec<Self::Item>>> + Send;
}

pub struct Dashboard;

impl ListScreen for Dashboard {
    type Item = Campaign;

    const NAME: &'static str = "dashboard";
    const EMPTY_MESSAGE: &'static str = "No campaigns available yet.";
    const ERROR_MESSAGE: &'static str = "Failed to load campaigns. Please try again later.";

    fn fetch<A: FundpayApi>(api: &A) -> impl Future<Output = Result<Vec<Campaign>>> + Send {
        api.list_campaigns()
    }
}

pub struct AdminDashboard;

impl ListScreen for AdminDashboard {
    type Item = Campaign;

    const NAME: &'static str = "admin_dashboard";
    const EMPTY_MESSAGE: &'static str = "No campaigns found.";
    const ERROR_MESSAGE: &'static str = "Failed to fetch campaigns. Please try again.";

    fn fetch<A: FundpayApi>(api: &A) -> impl Future<Output = Result<Vec<Campaign>>> + Send {
        api.list_campaigns()
    }
}

pub struct PaymentReceipts;

impl ListScreen for PaymentReceipts {
    type Item = Payment;

    const NAME: &'static str = "payment_receipts";
    const EMPTY_MESSAGE: &'static str = "You don't have any receipts yet.";
    const ERROR_MESSAGE: &'static str = "Failed to load receipts";

    fn fetch<A: FundpayApi>(api: &A) -> impl Future<Output = Result<Vec<Payment>>> + Send {
        api.my_payments()
    }
}

pub struct PendingPayments;

impl ListScreen for PendingPayments {
    type Item = Payment;

    const NAME: &'static str = "pending_payments";
    const EMPTY_MESSAGE: &'static str = "No pending payments to verify.";
    const ERROR_MESSAGE: &'static str = "Failed to load pending payments.";

    fn fetch<A: FundpayApi>(api: &A) -> impl Future<Output = Result<Vec<Payment>>> + Send {
        api.pending_payments()
    }
}

pub struct ListController<A, S: ListScreen> {
    api: Arc<A>,
    notifications: Arc<Notifications>,
    mount: Mount,
    mounted: AtomicBool,
    state: Mutex<ListState<S::Item>>,
    _screen: PhantomData<fn() -> S>,
}

impl<A: FundpayApi, S: ListScreen> ListController<A, S> {
    pub fn new(api: Arc<A>, notifications: Arc<Notifications>) -> Self {
        Self {
            api,
            notifications,
            mount: Mount::new(),
            mounted: AtomicBool::new(false),
            state: Mutex::new(ListState::Idle),
            _screen: PhantomData,
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn notifications(&self) -> &Arc<Notifications> {
        &self.notifications
    }

    pub fn lifetime(&self) -> &Mount {
        &self.mount
    }

    pub fn state(&self) -> ListState<S::Item> {
        lock(&self.state).clone()
    }

    pub fn view(&self) -> ListView<S::Item> {
        match self.state() {
            ListState::Idle | ListState::Loading => ListView::Loader,
            ListState::Error(message) => ListView::Error { message },
            ListState::Empty => ListView::Empty {
                message: S::EMPTY_MESSAGE,
            },
            ListState::Populated(items) => ListView::Items(items),
        }
    }

    /// Items currently on screen; empty unless populated.
    pub fn items(&self) -> Vec<S::Item> {
        match &*lock(&self.state) {
            ListState::Populated(items) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Issues the screen's one fetch. Mounting twice does not refetch.
    pub async fn mount(&self) {
        if self.mounted.swap(true, Ordering::SeqCst) {
            debug!(screen = S::NAME, "already mounted");
            return;
        }
        self.load().await;
    }

    /// Mounts only for admins; everyone else is sent home without a request
    /// being made.
    pub async fn mount_for_admin(&self, session: &dyn Session) -> Option<Redirect> {
        if !session.is_admin() {
            info!(screen = S::NAME, "non-admin redirected");
            return Some(Redirect("/".into()));
        }
        self.mount().await;
        None
    }

    /// The error state's retry action. Returns `false` when there is nothing
    /// to retry.
    pub async fn retry(&self) -> bool {
        if !matches!(*lock(&self.state), ListState::Error(_)) {
            return false;
        }
        self.load().await;
        true
    }

    pub fn unmount(&self) {
        self.mount.unmount();
    }

    async fn load(&self) {
        *lock(&self.state) = ListState::Loading;
        info!(screen = S::NAME, "loading");

        let Some(result) = self.mount.guard(S::fetch(&*self.api)).await else {
            debug!(screen = S::NAME, "unmounted; response discarded");
            return;
        };

        let next = match result {
            Ok(items) if items.is_empty() => ListState::Empty,
            Ok(items) => {
                info!(screen = S::NAME, count = items.len(), "loaded");
                ListState::Populated(items)
            }
            Err(err) => {
                error!(screen = S::NAME, error = %err, "fetch failed");
                self.notifications.error(S::ERROR_MESSAGE);
                ListState::Error(S::ERROR_MESSAGE.to_string())
            }
        };
        *lock(&self.state) = next;
    }

    /// Drops matching items in place, keeping the rest in order. An emptied
    /// list becomes [`ListState::Empty`]. Returns how many were removed.
    pub fn remove_where(&self, mut doomed: impl FnMut(&S::Item) -> bool) -> usize {
        let mut state = lock(&self.state);
        let ListState::Populated(items) = &mut *state else {
            return 0;
        };
        let before = items.len();
        items.retain(|item| !doomed(item));
        let removed = before - items.len();
        if items.is_empty() {
            *state = ListState::Empty;
        }
        removed
    }

    pub fn find(&self, mut matches: impl FnMut(&S::Item) -> bool) -> Option<S::Item> {
        match &*lock(&self.state) {
            ListState::Populated(items) => items.iter().find(|item| matches(item)).cloned(),
            _ => None,
        }
    }
}

pub const RECEIPT_LINK_LABEL: &str = "View Receipt PDF";
pub const NO_RECEIPT_MESSAGE: &str = "No receipt available";

/// One entry on the receipts screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptCard {
    pub id: PaymentId,
    pub campaign: String,
    pub amount: String,
    pub status: PaymentStatus,
    pub date: Option<String>,
    /// Resolved against the backend origin; `None` when the backend has not
    /// issued a receipt yet.
    pub receipt_url: Option<String>,
    /// [`RECEIPT_LINK_LABEL`] when there is a link, else [`NO_RECEIPT_MESSAGE`].
    pub receipt_label: &'static str,
}

impl<A: FundpayApi> ListController<A, PaymentReceipts> {
    pub fn receipt_cards(&self) -> Vec<ReceiptCard> {
        self.items()
            .into_iter()
            .map(|payment| {
                let receipt_url = payment
                    .receipt_url
                    .as_deref()
                    .filter(|path| !path.trim().is_empty())
                    .map(|path| self.api.resolve_asset(path));
                ReceiptCard {
                    campaign: payment.campaign_title().to_string(),
                    amount: format_currency(payment.amount),
                    status: payment.status,
                    date: payment.created_at.map(format_timestamp),
                    receipt_label: if receipt_url.is_some() {
                        RECEIPT_LINK_LABEL
                    } else {
                        NO_RECEIPT_MESSAGE
                    },
                    receipt_url,
                    id: payment.id,
                }
            })
            .collect()
    }
}
