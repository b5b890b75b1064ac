//! Client-side identity: bearer-token claims, the persisted token slot, the
//! session manager that publishes the derived identity, and the access guard.
//! Keep the public surface thin and split implementation across sub-modules.

mod claims;
mod store;
mod session;
mod guard;

pub use claims::{decode_claims, dev_token, Claims, DecodeFailure, Identity, Role, TokenDecoder, UnverifiedDecoder};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_SLOT};
pub use session::{GuardPolicy, IdentitySubscription, SessionManager};
pub use guard::AccessGuard;
