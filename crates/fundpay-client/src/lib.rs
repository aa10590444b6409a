//! Headless FundPay client.
//!
//! A typed REST client plus one controller per screen. Controllers own the
//! fetch/mutate lifecycle and expose view-state; whatever renders them (a
//! terminal, a webview, a native toolkit) only reads that state and forwards
//! user events back in.

pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod format;
pub mod lifecycle;
pub mod list;
pub mod navbar;
pub mod notify;
pub mod search;
pub mod session;
pub mod verify;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::{Mutex, MutexGuard, PoisonError};

pub use api::{Attachment, FundpayApi, HttpClient};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use notify::{Notification, Notifications, Severity};
pub use session::{MemorySession, Session};

/// A navigation request produced by a controller (e.g. after signup, or when
/// a search suggestion is picked). Routing itself is the renderer's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect(pub String);

/// Controller state is only touched between awaits, so a poisoned lock just
/// means a renderer panicked mid-read; the data is still consistent.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
