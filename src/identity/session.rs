use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use reqwest::header::HeaderValue;
use tracing::{info, warn};

use super::principal::{Role, VerificationLevel};
use crate::error::{ClientError, ClientResult};
use crate::storage::{KeyValueStorage, StorageError};

pub const KEY_TOKEN: &str = "token";
pub const KEY_USER_ID: &str = "userId";
pub const KEY_ROLE: &str = "role";
pub const KEY_KYC_LEVEL: &str = "kycLevel";

/// Every key the session owns in durable storage.
pub const SESSION_KEYS: [&str; 4] = [KEY_TOKEN, KEY_USER_ID, KEY_ROLE, KEY_KYC_LEVEL];

/// Client-held authentication state.
///
/// `subject_id` is present iff `credential` is present. Fields are private so the
/// only way to change them is through [`SessionStore`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    credential: Option<String>,
    subject_id: Option<String>,
    role: Option<Role>,
    verification: VerificationLevel,
}

impl Session {
    pub fn credential(&self) -> Option<&str> { self.credential.as_deref() }
    pub fn subject_id(&self) -> Option<&str> { self.subject_id.as_deref() }
    pub fn role(&self) -> Option<Role> { self.role }
    pub fn verification_level(&self) -> VerificationLevel { self.verification }

    pub fn is_authenticated(&self) -> bool {
        self.credential.as_deref().map(|c| !c.is_empty()).unwrap_or(false)
    }
    pub fn is_admin(&self) -> bool { self.role == Some(Role::Admin) }
    pub fn is_verified(&self) -> bool { self.verification == VerificationLevel::Verified }
}

// The credential never reaches logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .field("subject_id", &self.subject_id)
            .field("role", &self.role)
            .field("verification", &self.verification)
            .finish()
    }
}

/// The one session per client process, plus the storage it is mirrored to.
pub struct SessionStore {
    session: Session,
    storage: Box<dyn KeyValueStorage>,
}

/// Handle shared by the shell, the router and the gateway client.
pub type SharedSession = Arc<RwLock<SessionStore>>;

impl SessionStore {
    /// Restore the session persisted by a previous run. Never fails: unreadable
    /// storage or a half-written session both come back as an empty session.
    pub fn load(storage: Box<dyn KeyValueStorage>) -> Self {
        let session = match read_persisted(storage.as_ref()) {
            Ok(s) => s,
            Err(e) => {
                warn!(target: "tunfin::session", storage = %storage.describe(), error = %e, "could not read persisted session; starting signed out");
                Session::default()
            }
        };
        info!(
            target: "tunfin::session",
            storage = %storage.describe(),
            authenticated = session.is_authenticated(),
            subject = session.subject_id().unwrap_or("-"),
            "session loaded"
        );
        Self { session, storage }
    }

    pub fn into_shared(self) -> SharedSession { Arc::new(RwLock::new(self)) }

    pub fn session(&self) -> &Session { &self.session }
    /// Owned copy for callers that must not hold the lock across an await.
    pub fn snapshot(&self) -> Session { self.session.clone() }

    pub fn credential(&self) -> Option<&str> { self.session.credential() }
    pub fn subject_id(&self) -> Option<&str> { self.session.subject_id() }
    pub fn role(&self) -> Option<Role> { self.session.role() }
    pub fn verification_level(&self) -> VerificationLevel { self.session.verification_level() }

    pub fn is_authenticated(&self) -> bool { self.session.is_authenticated() }
    pub fn is_admin(&self) -> bool { self.session.is_admin() }
    pub fn is_verified(&self) -> bool { self.session.is_verified() }

    /// Replace the whole session. Storage is written first; memory only changes
    /// once the write succeeded. Values are kept exactly as given; they only
    /// have to be non-blank and sendable as request headers.
    pub fn set_auth(
        &mut self,
        credential: &str,
        subject_id: &str,
        role: Option<Role>,
        level: VerificationLevel,
    ) -> ClientResult<()> {
        if credential.trim().is_empty() {
            return Err(ClientError::validation("credential", "Credential must not be empty"));
        }
        if HeaderValue::from_str(&format!("Bearer {}", credential)).is_err() {
            return Err(ClientError::validation("credential", "Credential contains invalid characters"));
        }
        if subject_id.trim().is_empty() {
            return Err(ClientError::validation("subjectId", "Subject identifier must not be empty"));
        }
        if HeaderValue::from_str(subject_id).is_err() {
            return Err(ClientError::validation("subjectId", "Subject identifier contains invalid characters"));
        }

        let next = Session {
            credential: Some(credential.to_string()),
            subject_id: Some(subject_id.to_string()),
            role,
            verification: level,
        };
        // an unset role persists as an empty string so all four keys go out in one write
        let entries = [
            (KEY_TOKEN, credential.to_string()),
            (KEY_USER_ID, subject_id.to_string()),
            (KEY_ROLE, role.map(|r| r.as_wire().to_string()).unwrap_or_default()),
            (KEY_KYC_LEVEL, level.as_wire().to_string()),
        ];
        self.storage.set_many(&entries).map_err(|e| {
            warn!(target: "tunfin::session", error = %e, "persisting session failed; session unchanged");
            ClientError::from(e)
        })?;
        self.session = next;
        info!(
            target: "tunfin::session",
            subject = subject_id,
            role = role.map(|r| r.as_wire()).unwrap_or("-"),
            level = level.as_wire(),
            "session established"
        );
        Ok(())
    }

    /// Sign out. Memory is cleared unconditionally; a storage failure is still
    /// reported so the caller knows the persisted copy may survive.
    pub fn clear(&mut self) -> ClientResult<()> {
        let was_authenticated = self.session.is_authenticated();
        self.session = Session::default();
        self.storage.remove_many(&SESSION_KEYS).map_err(|e| {
            warn!(target: "tunfin::session", error = %e, "removing persisted session failed");
            ClientError::from(e)
        })?;
        if was_authenticated {
            info!(target: "tunfin::session", "session cleared");
        }
        Ok(())
    }

    /// Update only the verification level. No-op without a session.
    pub fn refresh_verification_level(&mut self, level: VerificationLevel) -> ClientResult<()> {
        if !self.session.is_authenticated() {
            return Ok(());
        }
        if self.session.verification == level {
            return Ok(());
        }
        self.storage.set_many(&[(KEY_KYC_LEVEL, level.as_wire().to_string())])?;
        info!(
            target: "tunfin::session",
            from = self.session.verification.as_wire(),
            to = level.as_wire(),
            "verification level updated"
        );
        self.session.verification = level;
        Ok(())
    }
}

fn read_persisted(storage: &dyn KeyValueStorage) -> Result<Session, StorageError> {
    let token = storage.get(KEY_TOKEN)?.filter(|s| !s.trim().is_empty());
    let subject = storage.get(KEY_USER_ID)?.filter(|s| !s.trim().is_empty());
    match (token, subject) {
        (Some(credential), Some(subject_id)) => {
            let role = storage.get(KEY_ROLE)?.as_deref().and_then(Role::from_wire);
            let verification = storage
                .get(KEY_KYC_LEVEL)?
                .map(|s| VerificationLevel::from_wire(&s))
                .unwrap_or_default();
            Ok(Session { credential: Some(credential), subject_id: Some(subject_id), role, verification })
        }
        (None, None) => Ok(Session::default()),
        (t, s) => {
            warn!(
                target: "tunfin::session",
                has_token = t.is_some(),
                has_subject = s.is_some(),
                "persisted session is incomplete; ignoring it"
            );
            Ok(Session::default())
        }
    }
}
