//! Token list shared between the explore, dashboard and trade pages.
//!
//! Every refresh takes a ticket. Only the newest ticket may publish, so a slow
//! refresh that finishes after a newer one is dropped instead of overwriting
//! fresher data.

use std::sync::Arc;

use launchpad_chain::{ContractClient, Token, TokenFactoryService};
use parking_lot::Mutex;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenSnapshot {
    pub tokens: Vec<Token>,
    pub user_tokens: Vec<Token>,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Published,
    /// A newer refresh started before this one finished.
    Superseded,
    /// No wallet session to read with.
    Skipped,
}

#[derive(Default)]
struct Inner {
    snapshot: TokenSnapshot,
    issued: u64,
}

pub struct TokenStore {
    client: Arc<ContractClient>,
    service: TokenFactoryService,
    inner: Mutex<Inner>,
}

impl TokenStore {
    pub fn new(client: Arc<ContractClient>) -> Self {
        Self {
            service: TokenFactoryService::new(client.clone()),
            client,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn snapshot(&self) -> TokenSnapshot {
        self.inner.lock().snapshot.clone()
    }

    pub fn tokens(&self) -> Vec<Token> {
        self.inner.lock().snapshot.tokens.clone()
    }

    pub fn user_tokens(&self) -> Vec<Token> {
        self.inner.lock().snapshot.user_tokens.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.lock().snapshot.loading
    }

    /// Re-read every token and the connected account's own tokens.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(owner) = self.client.session().public_key().map(|k| k.to_string()) else {
            let mut inner = self.inner.lock();
            inner.snapshot.error = Some("Wallet not connected".into());
            return RefreshOutcome::Skipped;
        };

        let ticket = self.begin_refresh();
        let tokens = self.service.get_all_tokens().await;
        let user_tokens = self.service.get_creator_tokens(&owner).await;
        self.publish(ticket, tokens, user_tokens)
    }

    /// Issue a ticket and mark the store loading.
    pub(crate) fn begin_refresh(&self) -> u64 {
        let mut inner = self.inner.lock();
        inner.issued += 1;
        inner.snapshot.loading = true;
        inner.snapshot.error = None;
        debug!(ticket = inner.issued, "token refresh started");
        inner.issued
    }

    pub(crate) fn publish(
        &self,
        ticket: u64,
        tokens: Vec<Token>,
        user_tokens: Vec<Token>,
    ) -> RefreshOutcome {
        let mut inner = self.inner.lock();
        if ticket != inner.issued {
            debug!(ticket, latest = inner.issued, "discarding superseded token refresh");
            return RefreshOutcome::Superseded;
        }
        info!(count = tokens.len(), mine = user_tokens.len(), "token list refreshed");
        inner.snapshot.tokens = tokens;
        inner.snapshot.user_tokens = user_tokens;
        inner.snapshot.loading = false;
        RefreshOutcome::Published
    }

    /// Show a just-created token before the next refresh picks it up.
    pub fn add_token(&self, token: Token) {
        let mut inner = self.inner.lock();
        let owner = self.client.session().public_key().map(|k| k.to_string());
        if owner.as_deref() == Some(token.creator.as_str()) {
            inner.snapshot.user_tokens.insert(0, token.clone());
        }
        inner.snapshot.tokens.insert(0, token);
    }
}
