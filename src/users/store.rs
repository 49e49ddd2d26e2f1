//! The collection store: displayed users, form draft, loading flag.
//!
//! State is published through a `tokio::sync::watch` channel so a view can
//! re-render on every transition. Every list captures a generation number when
//! it is issued; a response is applied only while its generation is still the
//! newest, so overlapping lists settle on the last one the user asked for
//! rather than the last one to come back.

use crate::users::{
    gateway::{ErrorKind, Gateway},
    types::{Draft, DraftError, User},
};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

/// Everything a view needs to render.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreState {
    pub users: Vec<User>,
    pub draft: Draft,
    pub loading: bool,
    /// Most recent failed request, cleared by the next successful one.
    pub last_error: Option<ErrorKind>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded(usize),
    Failed(ErrorKind),
    /// A newer list was issued before this one resolved; nothing was applied.
    Superseded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Invalid(DraftError),
    Failed(ErrorKind),
}

pub struct CollectionStore<G> {
    gateway: G,
    state: watch::Sender<StoreState>,
    issued: AtomicU64,
}

impl<G: Gateway> CollectionStore<G> {
    pub fn new(gateway: G) -> Self {
        let (state, _) = watch::channel(StoreState::default());
        Self {
            gateway,
            state,
            issued: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.state.borrow().users.clone()
    }

    #[must_use]
    pub fn draft(&self) -> Draft {
        self.state.borrow().draft.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn set_draft(&self, draft: Draft) {
        self.state.send_modify(|state| state.draft = draft);
    }

    pub fn edit_draft(&self, edit: impl FnOnce(&mut Draft)) {
        self.state.send_modify(|state| edit(&mut state.draft));
    }

    /// Replace the collection with a fresh server listing.
    ///
    /// Failures are logged and recorded in `last_error`; the previous
    /// collection stays on screen.
    #[instrument(skip(self))]
    pub async fn load_all(&self) -> LoadOutcome {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| state.loading = true);

        let result = self.gateway.list().await;

        let mut outcome = LoadOutcome::Superseded;
        self.state.send_if_modified(|state| {
            if self.issued.load(Ordering::SeqCst) != generation {
                return false;
            }
            state.loading = false;
            match result {
                Ok(users) => {
                    outcome = LoadOutcome::Loaded(users.len());
                    state.users = users;
                    state.last_error = None;
                }
                Err(ref err) => {
                    outcome = LoadOutcome::Failed(err.kind());
                    state.last_error = Some(err.kind());
                }
            }
            true
        });

        match outcome {
            LoadOutcome::Loaded(count) => debug!(generation, "loaded {count} users"),
            LoadOutcome::Failed(kind) => error!(generation, "failed to load users: {kind}"),
            LoadOutcome::Superseded => debug!(generation, "discarding stale user listing"),
        }

        outcome
    }

    /// Send the current draft, trimmed, then re-list on success.
    ///
    /// The collection is never touched here directly; it only changes through
    /// the follow-up [`load_all`](Self::load_all). On failure the draft is kept
    /// as typed.
    #[instrument(skip(self))]
    pub async fn submit_draft(&self) -> SubmitOutcome {
        let draft = self.draft().normalized();

        if let Err(err) = draft.validate() {
            warn!("draft rejected: {err}");
            return SubmitOutcome::Invalid(err);
        }

        match self.gateway.create(&draft).await {
            Ok(()) => {
                info!("created user {}", draft.name);
                self.state.send_modify(|state| {
                    state.draft = Draft::default();
                    state.last_error = None;
                });
                self.load_all().await;
                SubmitOutcome::Created
            }
            Err(err) => {
                error!("failed to create user: {err}");
                let kind = err.kind();
                self.state.send_modify(|state| state.last_error = Some(kind));
                SubmitOutcome::Failed(kind)
            }
        }
    }
}
