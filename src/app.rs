//! Application shell. One explicitly constructed [`App`] owns the shared
//! session, the router and the typed API; every user action is a method here.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::gateway::models::*;
use crate::gateway::{validate, GatewayClient, TunFinApi};
use crate::identity::{AuthProvider, RegisterOutcome, RegistrationProfile, Session, SessionStore, SharedSession, VerificationLevel};
use crate::router::{Navigated, Router, ViewId, HOME_ROUTE, LOGIN_ROUTE};

/// Entries shown in the dashboard's recent-activity list.
const RECENT_ACTIVITY: usize = 5;

/// Resolutions an agent may apply to a dispute.
pub const DISPUTE_RESOLUTIONS: [&str; 3] = ["RESOLVED", "REJECTED", "ESCALATED"];

#[derive(Debug, Clone, Serialize)]
pub struct DashboardModel {
    pub total_balance: f64,
    pub accounts: Vec<Account>,
    pub recent: Vec<LedgerEntry>,
    pub verification: VerificationLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletModel {
    pub accounts: Vec<Account>,
    pub history: Vec<LedgerEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KycModel {
    pub level: VerificationLevel,
    pub documents: Vec<KycDocument>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubsidiesModel {
    pub programs: Vec<SubsidyProgram>,
    pub claims: Vec<SubsidyClaim>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminOverview {
    pub users: usize,
    pub pending_kyc: usize,
    pub open_disputes: usize,
}

/// Data behind one rendered view.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "view", content = "data", rename_all = "snake_case")]
pub enum ViewModel {
    Login,
    Register,
    Dashboard(DashboardModel),
    Wallet(WalletModel),
    Kyc(KycModel),
    Subsidies(SubsidiesModel),
    Transfer { accounts: Vec<Account> },
    Disputes(Vec<Dispute>),
    Admin(AdminOverview),
    AdminUsers(Vec<UserProfile>),
    AdminKyc(Vec<UserProfile>),
    AdminSubsidies(Vec<SubsidyProgram>),
    AdminDisputes(Vec<Dispute>),
}

#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub payment: Payment,
    pub recipient: UserSummary,
    pub sender_account_id: String,
    pub receiver_account_id: String,
    pub amount: f64,
    pub currency: String,
}

pub struct App {
    session: SharedSession,
    router: Router,
    api: TunFinApi,
    auth: AuthProvider,
}

impl App {
    /// Load the persisted session from the configured storage and wire everything to it.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let session = SessionStore::load(config.open_storage()).into_shared();
        Self::with_session(config, session)
    }

    pub fn with_session(config: &ClientConfig, session: SharedSession) -> ClientResult<Self> {
        let api = TunFinApi::new(GatewayClient::new(config, session.clone())?);
        let auth = AuthProvider::new(api.clone());
        let router = Router::with_default_routes(session.clone())?;
        Ok(Self { session, router, api, auth })
    }

    pub fn session(&self) -> Session { self.session.read().snapshot() }
    pub fn shared_session(&self) -> &SharedSession { &self.session }
    pub fn router(&self) -> &Router { &self.router }
    pub fn api(&self) -> &TunFinApi { &self.api }

    // ---- navigation ----

    pub fn go(&mut self, path: &str) -> ClientResult<Navigated> { self.router.navigate(path) }

    /// Navigate and load the resulting view.
    pub async fn open(&mut self, path: &str) -> ClientResult<(Navigated, ViewModel)> {
        let nav = self.go(path)?;
        let model = self.load_view().await?;
        Ok((nav, model))
    }

    /// Fetch the data for the current view inside its scope.
    pub async fn load_view(&self) -> ClientResult<ViewModel> {
        let Some(current) = self.router.current() else {
            return Err(ClientError::navigation("no view is open"));
        };
        let scope = self.router.scope();
        let view = current.view;
        scope.run(self.fetch_view(view)).await
    }

    async fn fetch_view(&self, view: ViewId) -> ClientResult<ViewModel> {
        let api = &self.api;
        Ok(match view {
            ViewId::Login => ViewModel::Login,
            ViewId::Register => ViewModel::Register,
            ViewId::Dashboard => {
                let uid = api.subject_id()?;
                let accounts = api.accounts(&uid).await?;
                let mut recent = api.ledger_history(&uid).await?;
                recent.truncate(RECENT_ACTIVITY);
                ViewModel::Dashboard(DashboardModel {
                    total_balance: accounts.iter().map(|a| a.balance).sum(),
                    accounts,
                    recent,
                    verification: self.session().verification_level(),
                })
            }
            ViewId::Wallet => {
                let uid = api.subject_id()?;
                let accounts = api.accounts(&uid).await?;
                let history = api.ledger_history(&uid).await?;
                ViewModel::Wallet(WalletModel { accounts, history })
            }
            ViewId::Kyc => {
                let uid = api.subject_id()?;
                let documents = api.kyc_documents(&uid).await?;
                ViewModel::Kyc(KycModel { level: self.session().verification_level(), documents })
            }
            ViewId::Subsidies => {
                let uid = api.subject_id()?;
                let programs = api.subsidies().await?.into_iter().filter(|p| p.active).collect();
                let claims = api.subsidy_claims(&uid).await?;
                ViewModel::Subsidies(SubsidiesModel { programs, claims })
            }
            ViewId::Transfer => {
                let uid = api.subject_id()?;
                ViewModel::Transfer { accounts: api.accounts(&uid).await? }
            }
            ViewId::Disputes => ViewModel::Disputes(api.my_disputes().await?),
            ViewId::Admin => {
                let users = api.all_users().await?.len();
                let pending_kyc = api.pending_kyc().await?.len();
                let open_disputes = api.all_disputes().await?.iter().filter(|d| d.is_open()).count();
                ViewModel::Admin(AdminOverview { users, pending_kyc, open_disputes })
            }
            ViewId::AdminUsers => ViewModel::AdminUsers(api.all_users().await?),
            ViewId::AdminKyc => ViewModel::AdminKyc(api.pending_kyc().await?),
            ViewId::AdminSubsidies => ViewModel::AdminSubsidies(api.subsidies().await?),
            ViewId::AdminDisputes => ViewModel::AdminDisputes(api.all_disputes().await?),
        })
    }

    // ---- session ----

    /// Sign in and land on the dashboard.
    pub async fn login(&mut self, phone_number: &str, password: &str) -> ClientResult<Navigated> {
        self.auth.login(phone_number, password).await?;
        self.go(HOME_ROUTE)
    }

    pub async fn register(&mut self, profile: &RegistrationProfile) -> ClientResult<(RegisterOutcome, Navigated)> {
        let outcome = self.auth.register(profile).await?;
        let nav = match outcome {
            RegisterOutcome::SignedIn => self.go(HOME_ROUTE)?,
            RegisterOutcome::LoginRequired => self.go(LOGIN_ROUTE)?,
        };
        Ok((outcome, nav))
    }

    /// Always ends signed out on the login view; a storage failure is still reported.
    pub fn logout(&mut self) -> ClientResult<Navigated> {
        let cleared = self.auth.logout();
        let nav = self.go(LOGIN_ROUTE)?;
        cleared.map(|_| nav)
    }

    pub async fn refresh_verification(&self) -> ClientResult<VerificationLevel> {
        self.router.scope().run(self.auth.refresh_verification()).await
    }

    // ---- wallet & payments ----

    pub async fn create_account(&self, currency: &str) -> ClientResult<Account> {
        let currency = validate::currency(currency)?;
        let user_id = self.api.subject_id()?;
        let req = CreateAccountRequest { user_id, currency };
        let account = self.router.scope().run(self.api.create_account(&req)).await?;
        info!(target: "tunfin::app", account = %account.id, currency = %account.currency, "account opened");
        Ok(account)
    }

    /// Look the recipient up by phone, pick their wallet in the sender's
    /// currency, then submit the transfer.
    pub async fn transfer(&self, from_account_id: &str, recipient_phone: &str, amount: f64) -> ClientResult<TransferReceipt> {
        let from = validate::required("senderAccountId", from_account_id)?.to_string();
        let phone = validate::required("phoneNumber", recipient_phone)?.to_string();
        let amount = validate::amount("amount", amount)?;
        let uid = self.api.subject_id()?;
        self.router.scope().run(self.transfer_inner(uid, from, phone, amount)).await
    }

    async fn transfer_inner(&self, uid: String, from: String, phone: String, amount: f64) -> ClientResult<TransferReceipt> {
        let mine = self.api.accounts(&uid).await?;
        let sender = mine
            .into_iter()
            .find(|a| a.id == from)
            .ok_or_else(|| ClientError::validation("senderAccountId", format!("{} is not one of your accounts", from)))?;

        let recipient = self.api.search_user(&phone).await.map_err(|e| match e.http_status() {
            Some(404) => ClientError::validation("phoneNumber", "User not found. Please check the phone number."),
            _ => e,
        })?;
        if recipient.user_id.is_empty() {
            return Err(ClientError::validation("phoneNumber", "User not found. Please check the phone number."));
        }
        let theirs = self.api.accounts(&recipient.user_id).await?;
        let receiver = theirs
            .into_iter()
            .find(|a| a.currency.eq_ignore_ascii_case(&sender.currency))
            .ok_or_else(|| {
                ClientError::validation("phoneNumber", format!("Recipient does not have a {} wallet.", sender.currency))
            })?;
        validate::distinct_accounts(&sender.id, &receiver.id)?;

        let req = TransferRequest {
            sender_account_id: sender.id.clone(),
            receiver_account_id: receiver.id.clone(),
            amount,
        };
        let payment = self.api.transfer(&req).await?;
        info!(target: "tunfin::app", amount, currency = %sender.currency, "transfer submitted");
        Ok(TransferReceipt {
            payment,
            recipient,
            sender_account_id: sender.id,
            receiver_account_id: receiver.id,
            amount,
            currency: sender.currency,
        })
    }

    // ---- support ----

    pub async fn file_dispute(&self, payment_id: &str, reason: &str) -> ClientResult<Dispute> {
        let req = FileDisputeRequest {
            payment_id: validate::required("paymentId", payment_id)?.to_string(),
            reason: validate::dispute_reason(reason)?.to_string(),
        };
        self.api.subject_id()?;
        self.router.scope().run(self.api.file_dispute(&req)).await
    }

    pub async fn claim_subsidy(&self, program_id: &str) -> ClientResult<SubsidyClaim> {
        let program_id = validate::required("programId", program_id)?.to_string();
        let uid = self.api.subject_id()?;
        self.router.scope().run(self.api.claim_subsidy(&uid, &program_id)).await
    }

    pub async fn check_eligibility(&self, program_id: &str) -> ClientResult<bool> {
        let program_id = validate::required("programId", program_id)?.to_string();
        let uid = self.api.subject_id()?;
        self.router.scope().run(self.api.eligibility(&uid, &program_id)).await
    }

    // ---- kyc ----

    pub async fn upload_kyc(&self, document_type: &str, file: &Path) -> ClientResult<serde_json::Value> {
        let document_type = validate::required("type", document_type)?.to_ascii_uppercase();
        let uid = self.api.subject_id()?;
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| ClientError::validation("file", "a file path is required"))?;
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| ClientError::validation("file", format!("cannot read {}: {}", file.display(), e)))?;
        if bytes.is_empty() {
            return Err(ClientError::validation("file", "file is empty"));
        }
        self.router
            .scope()
            .run(self.api.upload_kyc_document(&uid, &document_type, &file_name, bytes))
            .await
    }

    pub async fn kyc_token(&self) -> ClientResult<KycToken> {
        let uid = self.api.subject_id()?;
        self.router.scope().run(self.api.kyc_token(&uid)).await
    }

    pub async fn register_push_token(&self, token: &str) -> ClientResult<()> {
        let token = validate::required("token", token)?.to_string();
        let uid = self.api.subject_id()?;
        self.router.scope().run(self.api.register_push_token(&uid, &token)).await
    }

    // ---- admin ----

    fn require_admin(&self) -> ClientResult<()> {
        let s = self.session();
        if !s.is_authenticated() {
            return Err(ClientError::session("Please log in first"));
        }
        if !s.is_admin() {
            return Err(ClientError::session("Administrator access required"));
        }
        Ok(())
    }

    pub async fn review_kyc(&self, user_id: &str, approve: bool) -> ClientResult<()> {
        let user_id = validate::required("userId", user_id)?.to_string();
        self.require_admin()?;
        self.router.scope().run(self.api.review_kyc(&user_id, approve)).await
    }

    pub async fn resolve_dispute(&self, dispute_id: &str, status: &str) -> ClientResult<Dispute> {
        let dispute_id = validate::required("disputeId", dispute_id)?.to_string();
        let status = validate::required("status", status)?.to_ascii_uppercase();
        if !DISPUTE_RESOLUTIONS.contains(&status.as_str()) {
            return Err(ClientError::validation(
                "status",
                format!("status must be one of {}", DISPUTE_RESOLUTIONS.join(", ")),
            ));
        }
        self.require_admin()?;
        self.router.scope().run(self.api.resolve_dispute(&dispute_id, &status)).await
    }

    pub async fn create_program(&self, program: NewSubsidyProgram) -> ClientResult<SubsidyProgram> {
        let mut program = program;
        program.name = validate::required("name", &program.name)?.to_string();
        validate::amount("amountPerUser", program.amount_per_user)?;
        if let Some(budget) = program.total_budget {
            validate::amount("totalBudget", budget)?;
        }
        self.require_admin()?;
        self.router.scope().run(self.api.create_program(&program)).await
    }
}
