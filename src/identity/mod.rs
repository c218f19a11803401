//! Client-side identity: the persisted session and the flows that populate it.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod provider;
mod session;

pub use principal::{Role, VerificationLevel};
pub use provider::{level_from_documents, AuthProvider, RegisterOutcome, RegistrationProfile};
pub use session::{Session, SessionStore, SharedSession, SESSION_KEYS};
pub use session::{KEY_KYC_LEVEL, KEY_ROLE, KEY_TOKEN, KEY_USER_ID};
