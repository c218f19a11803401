use chrono::NaiveDate;
use tracing::info;

use super::principal::{Role, VerificationLevel};
use super::session::{Session, SharedSession};
use crate::error::{ClientError, ClientResult};
use crate::gateway::models::{AuthResponse, KycDocument, LoginRequest, RegisterRequest};
use crate::gateway::{validate, TunFinApi};

/// What a user types into the registration form. Dates stay raw until validated.
#[derive(Debug, Clone, Default)]
pub struct RegistrationProfile {
    pub phone_number: String,
    pub password: String,
    pub full_name: String,
    pub national_id: String,
    pub email: String,
    pub address: String,
    pub date_of_birth: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The service issued credentials and the session is now set.
    SignedIn,
    /// Account created; the user still has to log in.
    LoginRequired,
}

/// Drives the session lifecycle from identity-service responses.
#[derive(Clone)]
pub struct AuthProvider {
    api: TunFinApi,
    session: SharedSession,
}

impl AuthProvider {
    pub fn new(api: TunFinApi) -> Self {
        let session = api.client().session().clone();
        Self { api, session }
    }

    pub async fn login(&self, phone_number: &str, password: &str) -> ClientResult<Session> {
        let phone = validate::required("phoneNumber", phone_number)?;
        if password.is_empty() {
            return Err(ClientError::validation("password", "password is required"));
        }
        let req = LoginRequest { phone_number: phone.to_string(), password: password.to_string() };
        let resp = self.api.login(&req).await.inspect_err(|e| {
            info!(target: "tunfin::auth", code = e.code_str(), message = e.message(), "login rejected");
        })?;
        let session = self.establish(&resp)?;
        info!(target: "tunfin::auth", subject = session.subject_id().unwrap_or("-"), "logged in");
        Ok(session)
    }

    pub async fn register(&self, profile: &RegistrationProfile) -> ClientResult<RegisterOutcome> {
        self.register_on(profile, chrono::Local::now().date_naive()).await
    }

    /// `register` with an explicit reference date for the birth-date check.
    pub async fn register_on(&self, profile: &RegistrationProfile, today: NaiveDate) -> ClientResult<RegisterOutcome> {
        let phone = validate::required("phoneNumber", &profile.phone_number)?;
        if profile.password.is_empty() {
            return Err(ClientError::validation("password", "password is required"));
        }
        let req = RegisterRequest {
            phone_number: phone.to_string(),
            password: profile.password.clone(),
            full_name: validate::required("fullName", &profile.full_name)?.to_string(),
            national_id: validate::required("nationalId", &profile.national_id)?.to_string(),
            email: validate::email(&profile.email)?.to_string(),
            address: validate::required("address", &profile.address)?.to_string(),
            date_of_birth: Some(validate::date_of_birth(&profile.date_of_birth, today)?),
        };
        let resp = self.api.register(&req).await.inspect_err(|e| {
            info!(target: "tunfin::auth", code = e.code_str(), message = e.message(), "registration rejected");
        })?;
        if has_credentials(&resp) {
            self.establish(&resp)?;
            info!(target: "tunfin::auth", "registered and signed in");
            Ok(RegisterOutcome::SignedIn)
        } else {
            info!(target: "tunfin::auth", "registered; login required");
            Ok(RegisterOutcome::LoginRequired)
        }
    }

    /// Re-derive the verification level from the user's KYC documents.
    /// On any failure the known level is left as it was.
    pub async fn refresh_verification(&self) -> ClientResult<VerificationLevel> {
        let subject = self.api.subject_id()?;
        let docs = self.api.kyc_documents(&subject).await?;
        let level = level_from_documents(&docs);
        let mut store = self.session.write();
        // the user may have signed out or switched accounts while the call was in flight
        if store.subject_id() != Some(subject.as_str()) {
            return Err(ClientError::session("Session changed during verification refresh"));
        }
        store.refresh_verification_level(level)?;
        Ok(level)
    }

    pub fn logout(&self) -> ClientResult<()> {
        let r = self.session.write().clear();
        info!(target: "tunfin::auth", "logged out");
        r
    }

    fn establish(&self, resp: &AuthResponse) -> ClientResult<Session> {
        let token = non_blank(resp.token.as_deref())
            .ok_or_else(|| ClientError::session("Login response did not include a token"))?;
        let subject = non_blank(resp.user_id.as_deref())
            .ok_or_else(|| ClientError::session("Login response did not include a user id"))?;
        let role = resp.role.as_deref().and_then(Role::from_wire);
        let level = resp.kyc_level.as_deref().map(VerificationLevel::from_wire).unwrap_or_default();
        let mut store = self.session.write();
        store.set_auth(token, subject, role, level)?;
        Ok(store.snapshot())
    }
}

/// Present and not just whitespace. The value itself is passed on untouched.
fn non_blank(s: Option<&str>) -> Option<&str> { s.filter(|s| !s.trim().is_empty()) }

fn has_credentials(resp: &AuthResponse) -> bool {
    non_blank(resp.token.as_deref()).is_some() && non_blank(resp.user_id.as_deref()).is_some()
}

/// Approved or verified anywhere wins, then pending, else unverified.
pub fn level_from_documents(docs: &[KycDocument]) -> VerificationLevel {
    let has = |wanted: &[&str]| docs.iter().any(|d| wanted.iter().any(|w| d.status.trim().eq_ignore_ascii_case(w)));
    if has(&["APPROVED", "VERIFIED"]) {
        VerificationLevel::Verified
    } else if has(&["PENDING", "PENDING_VERIFICATION"]) {
        VerificationLevel::Pending
    } else {
        VerificationLevel::Unverified
    }
}
