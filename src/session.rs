// Search session state: the query being edited, the last result set, filters and the
// signed-in user. Identity changes arrive through an `AuthFeed` subscription.

use crate::filter::FilterCriteria;
use crate::listing::{Listing, SearchQuery};
use crate::orchestrator::{FallbackOrchestrator, SearchError, SearchOutcome};
use chrono::NaiveDate;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

const AVATAR_BASE: &str = "https://api.dicebear.com/8.x/initials/svg";

/// A signed-in identity as the identity provider reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: String,
}

impl User {
    pub fn from_identity(identity: &IdentityUser) -> Self {
        let name = identity
            .full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&identity.email)
            .to_string();

        let avatar_url = identity
            .avatar_url
            .clone()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| initials_avatar(&name));

        Self {
            id: identity.id.clone(),
            name,
            email: identity.email.clone(),
            avatar_url,
        }
    }
}

fn initials_avatar(seed: &str) -> String {
    match Url::parse_with_params(AVATAR_BASE, &[("seed", seed)]) {
        Ok(url) => url.to_string(),
        Err(_) => AVATAR_BASE.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(IdentityUser),
    SignedOut,
}

impl AuthEvent {
    fn from_state(state: &Option<IdentityUser>) -> Self {
        match state {
            Some(identity) => AuthEvent::SignedIn(identity.clone()),
            None => AuthEvent::SignedOut,
        }
    }
}

/// Publisher side of identity changes. Subscribers see the latest state only.
#[derive(Debug)]
pub struct AuthFeed {
    tx: watch::Sender<Option<IdentityUser>>,
}

impl Default for AuthFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthFeed {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    pub fn publish(&self, event: AuthEvent) {
        let state = match event {
            AuthEvent::SignedIn(identity) => Some(identity),
            AuthEvent::SignedOut => None,
        };
        self.tx.send_replace(state);
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.tx.subscribe(),
        }
    }
}

pub struct AuthSubscription {
    rx: watch::Receiver<Option<IdentityUser>>,
}

impl AuthSubscription {
    /// The session as it stands right now, for initialising a fresh `SearchSession`.
    pub fn current(&self) -> AuthEvent {
        AuthEvent::from_state(&self.rx.borrow())
    }

    /// Waits for the next identity change. `None` once the feed is dropped.
    pub async fn next_event(&mut self) -> Option<AuthEvent> {
        self.rx.changed().await.ok()?;
        let event = AuthEvent::from_state(&self.rx.borrow_and_update());
        Some(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthView {
    SignIn,
    SignUp,
}

pub struct SearchSession {
    orchestrator: FallbackOrchestrator,
    pub destination: String,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub filters: FilterCriteria,
    listings: Vec<Listing>,
    served_by: Option<String>,
    error: Option<String>,
    loading: bool,
    user: Option<User>,
    login_prompt: Option<AuthView>,
}

impl SearchSession {
    pub fn new(orchestrator: FallbackOrchestrator) -> Self {
        Self {
            orchestrator,
            destination: String::new(),
            check_in: None,
            check_out: None,
            filters: FilterCriteria::default(),
            listings: Vec::new(),
            served_by: None,
            error: None,
            loading: false,
            user: None,
            login_prompt: None,
        }
    }

    /// Runs one search for the current destination and dates, replacing any previous
    /// results. Failures end up in `error()`.
    pub async fn search(&mut self, cancel: &CancellationToken) {
        let Some(query) = self.begin_search() else {
            return;
        };
        let result = self.orchestrator.run(&query, cancel).await;
        self.finish_search(result);
    }

    /// First half of `search`: validates the query, clears the previous results and
    /// filters, and marks the session loading. `None` when the query is rejected or a
    /// search is already in flight.
    ///
    /// Between this and `finish_search` the session can be read through `&self`, so
    /// the loading state is observable while `orchestrator().run(..)` is pending.
    pub fn begin_search(&mut self) -> Option<SearchQuery> {
        if self.loading {
            warn!("Search already in progress");
            return None;
        }

        let query = match SearchQuery::new(&self.destination, self.check_in, self.check_out) {
            Ok(query) => query,
            Err(err) => {
                warn!(error = %err, "Search rejected");
                self.error = Some(err.to_string());
                return None;
            }
        };

        self.loading = true;
        self.error = None;
        self.listings.clear();
        self.served_by = None;
        self.filters.reset();
        Some(query)
    }

    pub fn finish_search(&mut self, result: Result<SearchOutcome, SearchError>) {
        match result {
            Ok(SearchOutcome {
                envelope,
                served_by,
                ..
            }) => {
                info!(served_by = %served_by, listings = envelope.hotels.len(), "Search complete");
                self.listings = envelope.hotels;
                self.served_by = Some(served_by);
            }
            Err(err) => {
                self.error = Some(err.user_message().to_string());
            }
        }
        self.loading = false;
    }

    pub fn orchestrator(&self) -> &FallbackOrchestrator {
        &self.orchestrator
    }

    /// Back to the landing state: no query, no results, no filters.
    pub fn reset(&mut self) {
        self.destination.clear();
        self.check_in = None;
        self.check_out = None;
        self.listings.clear();
        self.served_by = None;
        self.error = None;
        self.filters.reset();
    }

    pub fn apply_auth_event(&mut self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(identity) => {
                let user = User::from_identity(&identity);
                info!(user_id = %user.id, "Signed in");
                self.user = Some(user);
                self.login_prompt = None;
            }
            AuthEvent::SignedOut => {
                self.user = None;
            }
        }
    }

    pub fn sign_out(&mut self) {
        self.apply_auth_event(AuthEvent::SignedOut);
    }

    pub fn open_login_prompt(&mut self, view: AuthView) {
        self.login_prompt = Some(view);
    }

    pub fn close_login_prompt(&mut self) {
        self.login_prompt = None;
    }

    pub fn login_prompt(&self) -> Option<AuthView> {
        self.login_prompt
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    /// Results after the active filters, AI pick first.
    pub fn visible_listings(&self) -> Vec<&Listing> {
        self.filters.apply(&self.listings)
    }

    pub fn served_by(&self) -> Option<&str> {
        self.served_by.as_deref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}
