//! Command-line front end: parse shell lines into commands, run them against
//! the [`App`], and format results as tables or JSON.

pub mod table;

use std::path::PathBuf;

use chrono::NaiveDateTime;
use reqwest::Method;
use serde::Serialize;

use crate::app::{App, ViewModel};
use crate::config::OutputMode;
use crate::error::{ClientError, ClientResult};
use crate::gateway::models::*;
use crate::gateway::validate;
use crate::identity::{RegisterOutcome, RegistrationProfile};
use crate::router::Navigated;
use table::Table;

pub const HELP: &str = "\
commands:
  go <path>                         open a view (e.g. go /wallet)
  login <phone> <password>
  register <phone> <password> <full name> <national id> <email> <YYYY-MM-DD> <address>
  logout
  status                            show the current session
  refresh                           re-derive verification level from KYC documents
  accounts                          list your accounts
  open <currency>                   open an account (e.g. open TND)
  history                           ledger history
  transfer <from-account> <phone> <amount>
  kyc                               KYC documents and level
  upload <type> <file>              upload a KYC document (ID_CARD, PASSPORT, ...)
  kyc-token                         fetch a verification SDK token
  subsidies                         active programs and your claims
  eligible <programId>
  claim <programId>
  disputes                          your disputes
  dispute <paymentId> <reason...>
  push-token <token>
  get <path>                        raw GET against the gateway (e.g. get /api/subsidies)
  admin users | pending | disputes
  admin review <userId> approve|reject
  admin resolve <disputeId> RESOLVED|REJECTED|ESCALATED
  admin program <name> <amountPerUser> [totalBudget] [description...]
  help
  quit
Arguments containing spaces can be wrapped in double quotes.";

#[derive(Debug, Clone, PartialEq)]
pub enum AdminCommand {
    Users,
    PendingKyc,
    Review { user_id: String, approve: bool },
    Disputes,
    Resolve { dispute_id: String, status: String },
    Program { name: String, amount_per_user: f64, total_budget: Option<f64>, description: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Go(String),
    Login { phone: String, password: String },
    Register(Box<RegistrationArgs>),
    Logout,
    Status,
    Refresh,
    Accounts,
    Open(String),
    History,
    Transfer { from: String, phone: String, amount: f64 },
    Kyc,
    Upload { document_type: String, file: PathBuf },
    KycToken,
    Subsidies,
    Eligible(String),
    Claim(String),
    Disputes,
    Dispute { payment_id: String, reason: String },
    PushToken(String),
    Get(String),
    Admin(AdminCommand),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationArgs {
    pub phone_number: String,
    pub password: String,
    pub full_name: String,
    pub national_id: String,
    pub email: String,
    pub date_of_birth: String,
    pub address: String,
}

impl From<&RegistrationArgs> for RegistrationProfile {
    fn from(a: &RegistrationArgs) -> Self {
        RegistrationProfile {
            phone_number: a.phone_number.clone(),
            password: a.password.clone(),
            full_name: a.full_name.clone(),
            national_id: a.national_id.clone(),
            email: a.email.clone(),
            address: a.address.clone(),
            date_of_birth: a.date_of_birth.clone(),
        }
    }
}

/// Split on whitespace, keeping double-quoted runs together.
pub fn split_args(line: &str) -> ClientResult<Vec<String>> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    out.push(std::mem::take(&mut cur));
                    has_token = false;
                }
            }
            c => {
                cur.push(c);
                has_token = true;
            }
        }
    }
    if in_quotes {
        return Err(ClientError::validation("command", "unterminated quote"));
    }
    if has_token {
        out.push(cur);
    }
    Ok(out)
}

fn usage(text: &str) -> ClientError { ClientError::validation("command", format!("usage: {}", text)) }

/// Parse one shell line. Blank lines and `#` comments yield `None`.
pub fn parse_command(line: &str) -> ClientResult<Option<Command>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    let args = split_args(trimmed)?;
    let Some((head, rest)) = args.split_first() else { return Ok(None) };
    let arg = |i: usize| rest.get(i).cloned();
    let tail = |from: usize| rest.get(from..).map(|r| r.join(" ")).unwrap_or_default();

    let cmd = match head.to_ascii_lowercase().as_str() {
        "go" | "cd" => Command::Go(arg(0).ok_or_else(|| usage("go <path>"))?),
        "login" => match rest {
            [phone, password] => Command::Login { phone: phone.clone(), password: password.clone() },
            _ => return Err(usage("login <phone> <password>")),
        },
        "register" => {
            if rest.len() < 7 {
                return Err(usage("register <phone> <password> <full name> <national id> <email> <YYYY-MM-DD> <address>"));
            }
            Command::Register(Box::new(RegistrationArgs {
                phone_number: rest[0].clone(),
                password: rest[1].clone(),
                full_name: rest[2].clone(),
                national_id: rest[3].clone(),
                email: rest[4].clone(),
                date_of_birth: rest[5].clone(),
                address: tail(6),
            }))
        }
        "logout" => Command::Logout,
        "status" | "whoami" => Command::Status,
        "refresh" => Command::Refresh,
        "accounts" => Command::Accounts,
        "open" => Command::Open(arg(0).ok_or_else(|| usage("open <currency>"))?),
        "history" => Command::History,
        "transfer" | "send" => match rest {
            [from, phone, amount] => Command::Transfer {
                from: from.clone(),
                phone: phone.clone(),
                amount: validate::parse_amount("amount", amount)?,
            },
            _ => return Err(usage("transfer <from-account> <phone> <amount>")),
        },
        "kyc" => Command::Kyc,
        "upload" => match rest {
            [t, file] => Command::Upload { document_type: t.clone(), file: PathBuf::from(file) },
            _ => return Err(usage("upload <type> <file>")),
        },
        "kyc-token" => Command::KycToken,
        "subsidies" => Command::Subsidies,
        "eligible" => Command::Eligible(arg(0).ok_or_else(|| usage("eligible <programId>"))?),
        "claim" => Command::Claim(arg(0).ok_or_else(|| usage("claim <programId>"))?),
        "disputes" => Command::Disputes,
        "dispute" => {
            let payment_id = arg(0).ok_or_else(|| usage("dispute <paymentId> <reason...>"))?;
            Command::Dispute { payment_id, reason: tail(1) }
        }
        "push-token" => Command::PushToken(arg(0).ok_or_else(|| usage("push-token <token>"))?),
        "get" => Command::Get(arg(0).ok_or_else(|| usage("get <path>"))?),
        "admin" => Command::Admin(parse_admin(rest)?),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(ClientError::validation("command", format!("unknown command '{}'; try 'help'", other))),
    };
    Ok(Some(cmd))
}

fn parse_admin(rest: &[String]) -> ClientResult<AdminCommand> {
    let Some((sub, args)) = rest.split_first() else {
        return Err(usage("admin users|pending|disputes|review|resolve|program"));
    };
    Ok(match sub.to_ascii_lowercase().as_str() {
        "users" => AdminCommand::Users,
        "pending" | "kyc" => AdminCommand::PendingKyc,
        "disputes" => AdminCommand::Disputes,
        "review" => match args {
            [user_id, verdict] => {
                let approve = match verdict.to_ascii_lowercase().as_str() {
                    "approve" | "yes" | "true" => true,
                    "reject" | "no" | "false" => false,
                    _ => return Err(usage("admin review <userId> approve|reject")),
                };
                AdminCommand::Review { user_id: user_id.clone(), approve }
            }
            _ => return Err(usage("admin review <userId> approve|reject")),
        },
        "resolve" => match args {
            [id, status] => AdminCommand::Resolve { dispute_id: id.clone(), status: status.clone() },
            _ => return Err(usage("admin resolve <disputeId> RESOLVED|REJECTED|ESCALATED")),
        },
        "program" => {
            if args.len() < 2 {
                return Err(usage("admin program <name> <amountPerUser> [totalBudget] [description...]"));
            }
            let total_budget = match args.get(2) {
                Some(b) => Some(validate::parse_amount("totalBudget", b)?),
                None => None,
            };
            let description = args.get(3..).map(|d| d.join(" ")).filter(|d| !d.trim().is_empty());
            AdminCommand::Program {
                name: args[0].clone(),
                amount_per_user: validate::parse_amount("amountPerUser", &args[1])?,
                total_budget,
                description,
            }
        }
        other => return Err(ClientError::validation("command", format!("unknown admin command '{}'", other))),
    })
}

/// Result of running one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Output(String),
    Quit,
}

/// Interactive front end over one [`App`].
pub struct Shell {
    app: App,
    output: OutputMode,
    width: usize,
}

impl Shell {
    pub fn new(app: App, output: OutputMode) -> Self { Self { app, output, width: table::terminal_width() } }

    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    pub fn app(&self) -> &App { &self.app }

    /// Current view's path for the prompt.
    pub fn location(&self) -> String {
        self.app.router().current().map(|v| v.path.clone()).unwrap_or_else(|| "-".to_string())
    }

    pub async fn run_line(&mut self, line: &str) -> ClientResult<Step> {
        match parse_command(line)? {
            None => Ok(Step::Output(String::new())),
            Some(Command::Quit) => Ok(Step::Quit),
            Some(cmd) => self.execute(cmd).await.map(Step::Output),
        }
    }

    pub async fn execute(&mut self, cmd: Command) -> ClientResult<String> {
        match cmd {
            Command::Go(path) => {
                let (nav, model) = self.app.open(&path).await?;
                self.redirected(&nav, &model)
            }
            Command::Login { phone, password } => {
                let nav = self.app.login(&phone, &password).await?;
                let s = self.app.session();
                Ok(format!(
                    "logged in as {} ({})\n{}",
                    s.subject_id().unwrap_or("-"),
                    s.verification_level(),
                    self.describe_nav(&nav)
                ))
            }
            Command::Register(args) => {
                let (outcome, nav) = self.app.register(&RegistrationProfile::from(args.as_ref())).await?;
                let msg = match outcome {
                    RegisterOutcome::SignedIn => "registered and signed in",
                    RegisterOutcome::LoginRequired => "registered; please log in",
                };
                Ok(format!("{}\n{}", msg, self.describe_nav(&nav)))
            }
            Command::Logout => {
                let nav = self.app.logout()?;
                Ok(format!("logged out\n{}", self.describe_nav(&nav)))
            }
            Command::Status => self.status(),
            Command::Refresh => {
                let level = self.app.refresh_verification().await?;
                Ok(format!("verification level: {}", level))
            }
            Command::Accounts => match self.app.open("/wallet").await? {
                (_, ViewModel::Wallet(w)) => self.emit(&w.accounts, || accounts_table(&w.accounts)),
                (nav, other) => self.redirected(&nav, &other),
            },
            Command::Open(currency) => {
                let a = self.app.create_account(&currency).await?;
                self.emit(&a, || accounts_table(std::slice::from_ref(&a)))
            }
            Command::History => match self.app.open("/wallet").await? {
                (_, ViewModel::Wallet(w)) => self.emit(&w.history, || ledger_table(&w.history)),
                (nav, other) => self.redirected(&nav, &other),
            },
            Command::Transfer { from, phone, amount } => {
                let r = self.app.transfer(&from, &phone, amount).await?;
                if self.output == OutputMode::Json {
                    return to_json(&r);
                }
                Ok(format!(
                    "sent {:.2} {} to {} ({} -> {}){}",
                    r.amount,
                    r.currency,
                    r.recipient.full_name.as_deref().unwrap_or(&r.recipient.user_id),
                    r.sender_account_id,
                    r.receiver_account_id,
                    r.payment.status.as_deref().map(|s| format!(", status {}", s)).unwrap_or_default()
                ))
            }
            Command::Kyc => {
                let (_, model) = self.app.open("/kyc").await?;
                self.render_view(&model)
            }
            Command::Upload { document_type, file } => {
                let v = self.app.upload_kyc(&document_type, &file).await?;
                let extra = match v {
                    serde_json::Value::Null => String::new(),
                    serde_json::Value::String(s) => format!(": {}", s),
                    other => format!(": {}", other),
                };
                Ok(format!("uploaded {}{}", file.display(), extra))
            }
            Command::KycToken => {
                let t = self.app.kyc_token().await?;
                self.emit(&t, || {
                    let mut tb = Table::new(["token"]);
                    tb.row([t.token.clone()]);
                    tb
                })
            }
            Command::Subsidies => {
                let (_, model) = self.app.open("/subsidies").await?;
                self.render_view(&model)
            }
            Command::Eligible(program) => {
                let ok = self.app.check_eligibility(&program).await?;
                Ok(if ok { format!("eligible for {}", program) } else { format!("not eligible for {}", program) })
            }
            Command::Claim(program) => {
                let c = self.app.claim_subsidy(&program).await?;
                self.emit(&c, || claims_table(std::slice::from_ref(&c)))
            }
            Command::Disputes => {
                let (_, model) = self.app.open("/disputes").await?;
                self.render_view(&model)
            }
            Command::Dispute { payment_id, reason } => {
                let d = self.app.file_dispute(&payment_id, &reason).await?;
                self.emit(&d, || disputes_table(std::slice::from_ref(&d)))
            }
            Command::PushToken(token) => {
                self.app.register_push_token(&token).await?;
                Ok("push token registered".to_string())
            }
            Command::Get(path) => {
                let v = self.app.router().scope().run(self.app.api().client().call(Method::GET, &path, None)).await?;
                if self.output == OutputMode::Json {
                    return to_json(&v);
                }
                Ok(match Table::from_json(&v) {
                    Some(t) => t.render(self.width).trim_end().to_string(),
                    None if v.is_null() => "(empty)".to_string(),
                    None => to_json(&v)?,
                })
            }
            Command::Admin(a) => self.admin(a).await,
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok(String::new()),
        }
    }

    async fn admin(&mut self, cmd: AdminCommand) -> ClientResult<String> {
        match cmd {
            AdminCommand::Users => {
                let (_, model) = self.app.open("/admin/users").await?;
                self.render_view(&model)
            }
            AdminCommand::PendingKyc => {
                let (_, model) = self.app.open("/admin/kyc").await?;
                self.render_view(&model)
            }
            AdminCommand::Disputes => {
                let (_, model) = self.app.open("/admin/disputes").await?;
                self.render_view(&model)
            }
            AdminCommand::Review { user_id, approve } => {
                self.app.review_kyc(&user_id, approve).await?;
                Ok(format!("{} {}", if approve { "approved" } else { "rejected" }, user_id))
            }
            AdminCommand::Resolve { dispute_id, status } => {
                let d = self.app.resolve_dispute(&dispute_id, &status).await?;
                self.emit(&d, || disputes_table(std::slice::from_ref(&d)))
            }
            AdminCommand::Program { name, amount_per_user, total_budget, description } => {
                let p = self
                    .app
                    .create_program(NewSubsidyProgram { name, description, amount_per_user, total_budget, criteria_json: None })
                    .await?;
                self.emit(&p, || programs_table(std::slice::from_ref(&p)))
            }
        }
    }

    fn status(&self) -> ClientResult<String> {
        let s = self.app.session();
        #[derive(Serialize)]
        struct Status<'a> {
            authenticated: bool,
            subject_id: Option<&'a str>,
            role: Option<String>,
            verification: String,
            view: String,
        }
        let st = Status {
            authenticated: s.is_authenticated(),
            subject_id: s.subject_id(),
            role: s.role().map(|r| r.to_string()),
            verification: s.verification_level().to_string(),
            view: self.location(),
        };
        if self.output == OutputMode::Json {
            return to_json(&st);
        }
        if !st.authenticated {
            return Ok(format!("signed out (view {})", st.view));
        }
        Ok(format!(
            "signed in as {} role={} verification={} (view {})",
            st.subject_id.unwrap_or("-"),
            st.role.as_deref().unwrap_or("-"),
            st.verification,
            st.view
        ))
    }

    /// Navigation line followed by the rendered view.
    fn redirected(&self, nav: &Navigated, model: &ViewModel) -> ClientResult<String> {
        Ok(format!("{}\n{}", self.describe_nav(nav), self.render_view(model)?))
    }

    fn describe_nav(&self, nav: &Navigated) -> String {
        if nav.redirects.is_empty() {
            format!("[{}] {}", nav.view.path, nav.view.view)
        } else {
            format!("[{}] {} (redirected via {})", nav.view.path, nav.view.view, nav.redirects.join(" -> "))
        }
    }

    fn emit<T: Serialize>(&self, value: &T, table: impl FnOnce() -> Table) -> ClientResult<String> {
        match self.output {
            OutputMode::Json => to_json(value),
            OutputMode::Table => {
                let t = table();
                if t.is_empty() {
                    Ok("(none)".to_string())
                } else {
                    Ok(t.render(self.width).trim_end().to_string())
                }
            }
        }
    }

    pub fn render_view(&self, model: &ViewModel) -> ClientResult<String> {
        if self.output == OutputMode::Json {
            return to_json(model);
        }
        let w = self.width;
        let section = |title: &str, t: Table| {
            if t.is_empty() {
                format!("{}: (none)", title)
            } else {
                format!("{}:\n{}", title, t.render(w).trim_end())
            }
        };
        Ok(match model {
            ViewModel::Login => "please log in: login <phone> <password>".to_string(),
            ViewModel::Register => "create an account: register ...  (see help)".to_string(),
            ViewModel::Dashboard(d) => format!(
                "total balance: {:.2}\nverification: {}\n{}\n{}",
                d.total_balance,
                d.verification,
                section("accounts", accounts_table(&d.accounts)),
                section("recent activity", ledger_table(&d.recent))
            ),
            ViewModel::Wallet(m) => format!(
                "{}\n{}",
                section("accounts", accounts_table(&m.accounts)),
                section("history", ledger_table(&m.history))
            ),
            ViewModel::Kyc(k) => format!("verification: {}\n{}", k.level, section("documents", documents_table(&k.documents))),
            ViewModel::Subsidies(s) => format!(
                "{}\n{}",
                section("programs", programs_table(&s.programs)),
                section("your claims", claims_table(&s.claims))
            ),
            ViewModel::Transfer { accounts } => format!(
                "{}\nsend money: transfer <from-account> <phone> <amount>",
                section("your accounts", accounts_table(accounts))
            ),
            ViewModel::Disputes(d) => section("disputes", disputes_table(d)),
            ViewModel::Admin(o) => format!(
                "users: {}\npending KYC reviews: {}\nopen disputes: {}",
                o.users, o.pending_kyc, o.open_disputes
            ),
            ViewModel::AdminUsers(u) => section("users", users_table(u)),
            ViewModel::AdminKyc(u) => section("pending KYC", users_table(u)),
            ViewModel::AdminSubsidies(p) => section("programs", programs_table(p)),
            ViewModel::AdminDisputes(d) => section("disputes", disputes_table(d)),
        })
    }
}

fn to_json<T: Serialize + ?Sized>(v: &T) -> ClientResult<String> {
    serde_json::to_string_pretty(v).map_err(|e| ClientError::decode(e.to_string()))
}

fn when(t: &Option<NaiveDateTime>) -> String { t.map(|t| t.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default() }

fn opt(s: &Option<String>) -> String { s.clone().unwrap_or_default() }

pub fn accounts_table(accounts: &[Account]) -> Table {
    let mut t = Table::new(["id", "currency", "balance", "status"]);
    for a in accounts {
        t.row([a.id.clone(), a.currency.clone(), format!("{:.2}", a.balance), opt(&a.status)]);
    }
    t
}

pub fn ledger_table(entries: &[LedgerEntry]) -> Table {
    let mut t = Table::new(["id", "when", "direction", "amount", "description"]);
    for e in entries {
        let (dir, sign) = if e.is_debit() { ("out", "-") } else { ("in", "+") };
        t.row([e.id.clone(), when(&e.timestamp), dir.to_string(), format!("{}{:.2}", sign, e.amount.abs()), opt(&e.description)]);
    }
    t
}

pub fn documents_table(docs: &[KycDocument]) -> Table {
    let mut t = Table::new(["id", "type", "status", "uploaded"]);
    for d in docs {
        t.row([d.id.clone(), opt(&d.document_type), d.status.clone(), when(&d.uploaded_at)]);
    }
    t
}

pub fn programs_table(programs: &[SubsidyProgram]) -> Table {
    let mut t = Table::new(["id", "name", "amount", "remaining", "active"]);
    for p in programs {
        t.row([
            p.id.clone(),
            p.name.clone(),
            format!("{:.2}", p.amount_per_user),
            p.remaining_budget.map(|b| format!("{:.2}", b)).unwrap_or_default(),
            p.active.to_string(),
        ]);
    }
    t
}

pub fn claims_table(claims: &[SubsidyClaim]) -> Table {
    let mut t = Table::new(["id", "program", "amount", "status", "created"]);
    for c in claims {
        t.row([c.id.clone(), c.program_id.clone(), format!("{:.2}", c.amount), opt(&c.status), when(&c.created_at)]);
    }
    t
}

pub fn disputes_table(disputes: &[Dispute]) -> Table {
    let mut t = Table::new(["id", "payment", "status", "category", "reason", "created"]);
    for d in disputes {
        t.row([
            d.id.clone(),
            opt(&d.payment_id),
            opt(&d.status),
            opt(&d.category),
            d.reason.clone(),
            when(&d.created_at),
        ]);
    }
    t
}

pub fn users_table(users: &[UserProfile]) -> Table {
    let mut t = Table::new(["id", "phone", "name", "role", "kyc"]);
    for u in users {
        t.row([u.id.clone(), opt(&u.phone_number), opt(&u.full_name), opt(&u.role), opt(&u.kyc_level)]);
    }
    t
}
