//! Bearer-token authorization: signing keys, claim verification, permission
//! gate and the per-route middleware that ties them together.

mod claims;
mod error;
mod keys;
mod middleware;
mod verifier;

pub use claims::{authorize, Claims};
pub use error::{AuthError, AuthErrorKind};
pub use keys::{KeySnapshot, KeyStore, SigningKey};
pub use middleware::{bearer_token, guard, require_permission, RequirePermission};
pub use verifier::Verifier;
