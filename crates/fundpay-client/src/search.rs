//! Navbar search-as-you-type and the document-level listener registry it
//! uses to close on outside clicks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use fundpay_types::models::{Campaign, CampaignId};
use tracing::{debug, error, info};

use crate::api::FundpayApi;
use crate::lifecycle::Mount;
use crate::notify::Notifications;
use crate::{Redirect, lock};

pub const LOAD_ERROR_MESSAGE: &str = "Failed to load campaigns for search.";

/// Case-insensitive title match on the query as typed. A blank query
/// matches nothing.
pub fn filter_campaigns(campaigns: &[Campaign], query: &str) -> Vec<Campaign> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    campaigns
        .iter()
        .filter(|c| c.title.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

/// A document-level event, with the path from the target up to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomEvent {
    PointerDown { path: Vec<NodeId> },
    FocusIn { path: Vec<NodeId> },
}

impl DomEvent {
    pub fn path(&self) -> &[NodeId] {
        match self {
            Self::PointerDown { path } | Self::FocusIn { path } => path,
        }
    }

    pub fn within(&self, node: NodeId) -> bool {
        self.path().contains(&node)
    }
}

type Listener = Arc<dyn Fn(&DomEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<Vec<(u64, Listener)>>,
}

/// Shared capture-phase listener registry. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct Document {
    registry: Arc<Registry>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_node(&self) -> NodeId {
        NodeId(self.registry.next_id.fetch_add(1, Ordering::Relaxed))
    }

    pub fn add_capture_listener(
        &self,
        listener: impl Fn(&DomEvent) + Send + Sync + 'static,
    ) -> ListenerHandle {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.registry.listeners).push((id, Arc::new(listener)));
        ListenerHandle {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.registry.listeners).len()
    }

    /// Delivers `event` to every listener registered at the time of the call.
    pub fn dispatch(&self, event: &DomEvent) {
        let listeners: Vec<Listener> = lock(&self.registry.listeners)
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }
}

/// Unregisters its listener on drop.
#[must_use = "dropping the handle removes the listener"]
pub struct ListenerHandle {
    id: u64,
    registry: Weak<Registry>,
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            lock(&registry.listeners).retain(|(id, _)| *id != self.id);
        }
    }
}

#[derive(Default)]
struct SearchState {
    campaigns: Vec<Campaign>,
    query: String,
    suggestions: Vec<Campaign>,
    open: bool,
    outside: Option<ListenerHandle>,
}

impl SearchState {
    /// Returns the listener handle so the caller can drop it outside the lock.
    fn close(&mut self) -> Option<ListenerHandle> {
        self.open = false;
        self.outside.take()
    }
}

pub struct SearchController<A> {
    api: Arc<A>,
    notifications: Arc<Notifications>,
    document: Document,
    boundary: NodeId,
    mount: Mount,
    mounted: AtomicBool,
    state: Arc<Mutex<SearchState>>,
}

impl<A: FundpayApi> SearchController<A> {
    pub fn new(api: Arc<A>, notifications: Arc<Notifications>, document: Document) -> Self {
        let boundary = document.create_node();
        Self {
            api,
            notifications,
            document,
            boundary,
            mount: Mount::new(),
            mounted: AtomicBool::new(false),
            state: Arc::default(),
        }
    }

    /// The node wrapping the input and its suggestion panel. Events whose
    /// path includes it count as inside.
    pub fn boundary(&self) -> NodeId {
        self.boundary
    }

    /// Loads the campaign list once. A failure is reported and leaves search
    /// empty.
    pub async fn mount(&self) {
        if self.mounted.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(result) = self.mount.guard(self.api.list_campaigns()).await else {
            return;
        };
        match result {
            Ok(campaigns) => {
                info!(count = campaigns.len(), "search index loaded");
                let mut state = lock(&self.state);
                state.suggestions = filter_campaigns(&campaigns, &state.query);
                state.campaigns = campaigns;
            }
            Err(err) => {
                error!(error = %err, "failed to load campaigns for search");
                self.notifications.error(LOAD_ERROR_MESSAGE);
            }
        }
    }

    pub fn set_query(&self, query: impl Into<String>) {
        let mut state = lock(&self.state);
        state.query = query.into();
        state.suggestions = filter_campaigns(&state.campaigns, &state.query);
        self.open(&mut state);
    }

    pub fn focus(&self) {
        self.open(&mut lock(&self.state));
    }

    /// Picks a suggestion: clears the query, closes the panel and navigates.
    pub fn select(&self, id: &CampaignId) -> Redirect {
        let handle = {
            let mut state = lock(&self.state);
            state.query.clear();
            state.suggestions.clear();
            state.close()
        };
        drop(handle);
        debug!(campaign = %id, "search suggestion selected");
        Redirect(format!("/campaign/{id}"))
    }

    /// Enter on a focused suggestion. Ignored unless `id` is on screen.
    pub fn key_enter(&self, id: &CampaignId) -> Option<Redirect> {
        let listed = lock(&self.state).suggestions.iter().any(|c| &c.id == id);
        listed.then(|| self.select(id))
    }

    pub fn close(&self) {
        let handle = lock(&self.state).close();
        drop(handle);
    }

    pub fn query(&self) -> String {
        lock(&self.state).query.clone()
    }

    pub fn suggestions(&self) -> Vec<Campaign> {
        lock(&self.state).suggestions.clone()
    }

    pub fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    /// Open and something to show.
    pub fn panel_visible(&self) -> bool {
        let state = lock(&self.state);
        state.open && !state.suggestions.is_empty()
    }

    pub fn unmount(&self) {
        self.mount.unmount();
        self.close();
    }

    fn open(&self, state: &mut SearchState) {
        if state.open || !self.mount.is_mounted() {
            return;
        }
        state.open = true;

        let weak = Arc::downgrade(&self.state);
        let boundary = self.boundary;
        state.outside = Some(self.document.add_capture_listener(move |event| {
            if event.within(boundary) {
                return;
            }
            let Some(state) = weak.upgrade() else {
                return;
            };
            let handle = lock(&state).close();
            drop(handle);
            debug!("search closed by outside event");
        }));
    }
}
