use reqwest::RequestBuilder;

use crate::identity::SessionManager;

/// Supplies the credential attached to every outbound channel request.
pub trait TokenSource: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl TokenSource for SessionManager {
    fn token(&self) -> Option<String> { SessionManager::token(self) }
}

/// Fixed credential, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl TokenSource for StaticToken {
    fn token(&self) -> Option<String> { self.0.clone() }
}

/// Attach `Authorization: Bearer` when the source has a non-empty token.
pub(crate) fn attach_bearer(rb: RequestBuilder, source: &dyn TokenSource) -> RequestBuilder {
    match source.token() {
        Some(t) if !t.trim().is_empty() => rb.bearer_auth(t.trim()),
        _ => rb,
    }
}
