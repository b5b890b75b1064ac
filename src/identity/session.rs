use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use super::claims::{Claims, Identity, Role, TokenDecoder, UnverifiedDecoder};
use super::store::{MemoryTokenStore, TokenStore};

/// Which condition a caller needs the current session to meet.
///
/// `TokenPresent` only asks whether a credential is stored; it lets expired
/// tokens through. `Authenticated` additionally requires a decodable token
/// whose expiry lies in the future.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GuardPolicy {
    #[default]
    TokenPresent,
    Authenticated,
}

/// Receives every identity published by a [`SessionManager`], starting with
/// the value current at subscription time.
#[derive(Debug)]
pub struct IdentitySubscription {
    rx: mpsc::UnboundedReceiver<Option<Identity>>,
}

impl IdentitySubscription {
    /// Wait for the next publication. Returns `None` once the manager is gone.
    pub async fn next(&mut self) -> Option<Option<Identity>> { self.rx.recv().await }

    /// Next already-published value, if any, without waiting.
    pub fn try_next(&mut self) -> Option<Option<Identity>> { self.rx.try_recv().ok() }

    /// Everything published since the last read, oldest first.
    pub fn drain(&mut self) -> Vec<Option<Identity>> {
        let mut out = Vec::new();
        while let Ok(v) = self.rx.try_recv() { out.push(v); }
        out
    }
}

#[derive(Default)]
struct Published {
    claims: Option<Claims>,
    subscribers: Vec<mpsc::UnboundedSender<Option<Identity>>>,
}

impl Published {
    // Runs under the manager's lock, so every subscriber sees the same order.
    fn publish(&mut self, claims: Option<Claims>) {
        let identity = claims.as_ref().map(Claims::identity);
        self.claims = claims;
        self.subscribers.retain(|tx| tx.send(identity.clone()).is_ok());
    }
}

/// Owns the stored credential and the identity derived from it.
///
/// One instance is shared (behind an `Arc`) by the access guard, the data
/// gateways' bearer layer and every view coordinator.
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
    decoder: Arc<dyn TokenDecoder>,
    state: Mutex<Published>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self::with_decoder(store, Arc::new(UnverifiedDecoder))
    }

    pub fn in_memory() -> Self { Self::new(Arc::new(MemoryTokenStore::new())) }

    /// Build a manager with a custom decoder and restore any identity already
    /// held in the store.
    pub fn with_decoder(store: Arc<dyn TokenStore>, decoder: Arc<dyn TokenDecoder>) -> Self {
        let sm = Self { store, decoder, state: Mutex::new(Published::default()) };
        if let Some(token) = sm.store.load() {
            let claims = sm.live_claims(&token);
            if let Some(c) = &claims {
                debug!(target: "trail::session", sub = %c.sub, role = %c.role, "restored session from token slot");
            }
            sm.state.lock().claims = claims;
        }
        sm
    }

    fn now_secs() -> i64 { chrono::Utc::now().timestamp() }

    // Decode failures are an expected steady state (anonymous visitor), so
    // they are logged and turned into absence.
    fn decode_logged(&self, token: &str) -> Option<Claims> {
        match self.decoder.decode(token) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(target: "trail::session", "token decode failed: {}", e);
                None
            }
        }
    }

    // Query-path decode: runs on every check, so failures stay at debug.
    fn decode_quiet(&self, token: &str) -> Option<Claims> {
        match self.decoder.decode(token) {
            Ok(c) => Some(c),
            Err(e) => {
                debug!(target: "trail::session", "stored token does not decode: {}", e);
                None
            }
        }
    }

    fn live_claims(&self, token: &str) -> Option<Claims> {
        let claims = self.decode_logged(token)?;
        if claims.is_expired_at(Self::now_secs()) {
            debug!(target: "trail::session", sub = %claims.sub, exp = claims.exp, "token already expired; no identity published");
            return None;
        }
        Some(claims)
    }

    /// Store `token` (replacing any previous one) and publish its identity.
    /// Surrounding whitespace is stripped before the token is persisted.
    pub fn set_token(&self, token: &str) {
        let token = token.trim();
        let mut st = self.state.lock();
        if let Err(e) = self.store.save(token) {
            error!(target: "trail::session", "failed to persist token: {}", e);
        }
        let claims = self.live_claims(token);
        match &claims {
            Some(c) => info!(target: "trail::session", sub = %c.sub, role = %c.role, "session established"),
            None => info!(target: "trail::session", "token stored without a usable identity"),
        }
        st.publish(claims);
    }

    pub fn token(&self) -> Option<String> { self.store.load() }

    /// Clear the slot and publish an absent identity.
    pub fn logout(&self) {
        let mut st = self.state.lock();
        if let Err(e) = self.store.clear() {
            error!(target: "trail::session", "failed to clear token slot: {}", e);
        }
        info!(target: "trail::session", "session cleared");
        st.publish(None);
    }

    pub fn has_token(&self) -> bool {
        self.token().map(|t| !t.trim().is_empty()).unwrap_or(false)
    }

    /// True iff a token is stored, decodes, and has not expired.
    pub fn is_authenticated(&self) -> bool { self.satisfies(GuardPolicy::Authenticated) }

    /// Single predicate behind both the access guard and `is_authenticated`.
    pub fn satisfies(&self, policy: GuardPolicy) -> bool {
        match policy {
            GuardPolicy::TokenPresent => self.has_token(),
            GuardPolicy::Authenticated => match self.token() {
                Some(t) => self
                    .decode_quiet(&t)
                    .map(|c| !c.is_expired_at(Self::now_secs()))
                    .unwrap_or(false),
                None => false,
            },
        }
    }

    fn has_live_role(&self, role: Role) -> bool {
        let st = self.state.lock();
        match &st.claims {
            Some(c) => c.role == role && !c.is_expired_at(Self::now_secs()),
            None => false,
        }
    }

    pub fn is_admin(&self) -> bool { self.has_live_role(Role::Administrator) }

    pub fn is_applicant(&self) -> bool { self.has_live_role(Role::Applicant) }

    /// Last published identity.
    pub fn current_user(&self) -> Option<Identity> {
        self.state.lock().claims.as_ref().map(Claims::identity)
    }

    /// Subscribe to identity changes. The current identity is delivered first.
    pub fn subscribe(&self) -> IdentitySubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut st = self.state.lock();
        let _ = tx.send(st.claims.as_ref().map(Claims::identity));
        st.subscribers.push(tx);
        IdentitySubscription { rx }
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("identity", &self.current_user())
            .finish_non_exhaustive()
    }
}
