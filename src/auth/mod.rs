//! Authentication core: password hashing, token codec, transport envelope,
//! and the session service.

pub mod envelope;
pub mod error;
pub mod fingerprint;
pub mod password;
pub mod session;
pub mod state;
pub mod token;

pub use error::AuthError;
pub use fingerprint::Fingerprint;
pub use state::{AuthConfig, AuthState};
