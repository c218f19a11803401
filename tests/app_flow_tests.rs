mod common;

use common::MockBackend;
use tunfin::app::{App, ViewModel};
use tunfin::gateway::models::NewSubsidyProgram;
use tunfin::identity::{RegisterOutcome, RegistrationProfile, Role, SessionStore, VerificationLevel, KEY_TOKEN};
use tunfin::router::{ViewId, LOGIN_ROUTE};
use tunfin::storage::{KeyValueStorage, MemoryStorage};

fn profile(phone: &str) -> RegistrationProfile {
    RegistrationProfile {
        phone_number: phone.into(),
        password: "s3cret".into(),
        full_name: "Amira Ben Salah".into(),
        national_id: "09876543".into(),
        email: "amira@example.tn".into(),
        address: "12 Rue de Marseille, Tunis".into(),
        date_of_birth: "1994-05-17".into(),
    }
}

async fn signed_in(mock: &MockBackend, phone: &str) -> App {
    let mut app = App::new(&mock.config()).unwrap();
    app.login(phone, "pw").await.unwrap();
    app
}

#[tokio::test]
async fn login_lands_on_dashboard_with_totals() {
    let mock = MockBackend::start().await;
    let mut app = App::new(&mock.config()).unwrap();

    let nav = app.go("/").unwrap();
    assert_eq!(nav.view.view, ViewId::Login);

    let nav = app.login("+21620000001", "pw").await.unwrap();
    assert_eq!(nav.view.view, ViewId::Dashboard);

    match app.load_view().await.unwrap() {
        ViewModel::Dashboard(d) => {
            assert!((d.total_balance - 120.5).abs() < 1e-9);
            assert_eq!(d.accounts.len(), 2);
            assert_eq!(d.recent.len(), 2);
            assert!(d.recent[0].is_debit());
            assert_eq!(d.verification, VerificationLevel::Unverified);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn registration_without_credentials_requires_login() {
    let mock = MockBackend::start().await;
    let mut app = App::new(&mock.config()).unwrap();
    let (outcome, nav) = app.register(&profile("+21620000009")).await.unwrap();
    assert_eq!(outcome, RegisterOutcome::LoginRequired);
    assert_eq!(nav.view.view, ViewId::Login);
    assert!(!app.session().is_authenticated());

    let sent = mock.recorder.last("POST", "/api/auth/register").unwrap().json();
    assert_eq!(sent["dateOfBirth"], "1994-05-17");
    assert_eq!(sent["fullName"], "Amira Ben Salah");
}

#[tokio::test]
async fn registration_with_credentials_signs_in() {
    let mock = MockBackend::start().await;
    let mut app = App::new(&mock.config()).unwrap();
    let (outcome, nav) = app.register(&profile("instant")).await.unwrap();
    assert_eq!(outcome, RegisterOutcome::SignedIn);
    assert_eq!(nav.view.view, ViewId::Dashboard);
    assert_eq!(app.session().subject_id(), Some("u-new"));
}

#[tokio::test]
async fn registration_rejections() {
    let mock = MockBackend::start().await;
    let mut app = App::new(&mock.config()).unwrap();

    let err = app.register(&profile("taken")).await.unwrap_err();
    assert_eq!(err.message(), "Phone number already registered");

    let mut bad = profile("+21620000010");
    bad.date_of_birth = "2999-01-01".into();
    let before = mock.recorder.count("POST", "/api/auth/register");
    let err = app.register(&bad).await.unwrap_err();
    assert_eq!(err.code_str(), "validation");
    assert_eq!(mock.recorder.count("POST", "/api/auth/register"), before);
}

#[tokio::test]
async fn transfer_picks_recipient_wallet_in_sender_currency() {
    let mock = MockBackend::start().await;
    let app = signed_in(&mock, "+21620000001").await;

    let receipt = app.transfer("acc-1", "20000002", 40.0).await.unwrap();
    assert_eq!(receipt.recipient.user_id, "u-2");
    assert_eq!(receipt.receiver_account_id, "acc-2");
    assert_eq!(receipt.currency, "TND");
    assert_eq!(receipt.payment.status.as_deref(), Some("COMPLETED"));

    let sent = mock.recorder.last("POST", "/api/payment/p2p").unwrap().json();
    assert_eq!(sent["senderAccountId"], "acc-1");
    assert_eq!(sent["receiverAccountId"], "acc-2");
    assert_eq!(sent["amount"], 40.0);
}

#[tokio::test]
async fn transfer_failures_are_explained() {
    let mock = MockBackend::start().await;
    let app = signed_in(&mock, "+21620000001").await;
    let before = app.session();

    let err = app.transfer("acc-1", "29999999", 10.0).await.unwrap_err();
    assert_eq!(err.code_str(), "validation");
    assert_eq!(err.message(), "User not found. Please check the phone number.");

    let err = app.transfer("acc-1", "20000003", 10.0).await.unwrap_err();
    assert_eq!(err.message(), "Recipient does not have a TND wallet.");

    let err = app.transfer("acc-1", "20000002", 150.0).await.unwrap_err();
    assert_eq!(err.message(), "Insufficient funds");
    assert_eq!(app.session(), before);

    let err = app.transfer("acc-1", "20000002", 0.0).await.unwrap_err();
    assert_eq!(err.code_str(), "validation");

    let err = app.transfer("acc-unknown", "20000002", 5.0).await.unwrap_err();
    assert_eq!(err.code_str(), "validation");
}

#[tokio::test]
async fn subsidies_view_hides_inactive_programs() {
    let mock = MockBackend::start().await;
    let mut app = signed_in(&mock, "+21620000001").await;
    let (_, model) = app.open("/subsidies").await.unwrap();
    match model {
        ViewModel::Subsidies(s) => {
            assert_eq!(s.programs.len(), 1);
            assert_eq!(s.programs[0].id, "p1");
            assert!(s.claims.is_empty());
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(app.check_eligibility("p1").await.unwrap());
    assert!(!app.check_eligibility("p2").await.unwrap());
    let claim = app.claim_subsidy("p1").await.unwrap();
    assert_eq!(claim.id, "c1");
}

#[tokio::test]
async fn admin_views_follow_role() {
    let mock = MockBackend::start().await;

    let mut user = signed_in(&mock, "+21620000001").await;
    let nav = user.go("/admin").unwrap();
    assert_eq!(nav.view.view, ViewId::Dashboard);
    assert_eq!(nav.redirects, vec!["/".to_string()]);
    let err = user.review_kyc("u-5", true).await.unwrap_err();
    assert_eq!(err.code_str(), "session");
    assert_eq!(mock.recorder.count("POST", "/api/kyc/review/u-5"), 0);

    let mut admin = signed_in(&mock, "admin").await;
    assert_eq!(admin.session().role(), Some(Role::Admin));
    let (nav, model) = admin.open("/admin").await.unwrap();
    assert_eq!(nav.view.view, ViewId::Admin);
    match model {
        ViewModel::Admin(o) => {
            assert_eq!(o.users, 2);
            assert_eq!(o.pending_kyc, 1);
            assert_eq!(o.open_disputes, 1);
        }
        other => panic!("unexpected {other:?}"),
    }

    admin.review_kyc("u-5", true).await.unwrap();
    let seen = mock.recorder.last("POST", "/api/kyc/review/u-5").unwrap();
    assert_eq!(seen.query.get("approve").map(String::as_str), Some("true"));

    let d = admin.resolve_dispute("d0", "resolved").await.unwrap();
    assert_eq!(d.status.as_deref(), Some("RESOLVED"));
    assert!(admin.resolve_dispute("d0", "WHATEVER").await.is_err());

    let p = admin
        .create_program(NewSubsidyProgram { name: "Farmers".into(), amount_per_user: 75.0, ..Default::default() })
        .await
        .unwrap();
    assert_eq!(p.id, "p9");
}

#[tokio::test]
async fn logout_clears_storage_and_returns_to_login() {
    let mock = MockBackend::start().await;
    let storage = MemoryStorage::new();
    let session = SessionStore::load(Box::new(storage.clone())).into_shared();
    let mut app = App::with_session(&mock.config(), session).unwrap();
    app.login("+21620000001", "pw").await.unwrap();
    assert_eq!(storage.get(KEY_TOKEN).unwrap().as_deref(), Some("abc123"));

    let nav = app.logout().unwrap();
    assert_eq!(nav.view.path, LOGIN_ROUTE);
    assert!(!app.session().is_authenticated());
    assert!(storage.snapshot().is_empty());

    // guarded views bounce to login again
    assert_eq!(app.go("/wallet").unwrap().view.view, ViewId::Login);
}

#[tokio::test]
async fn logout_reports_storage_failure_but_signs_out() {
    let mock = MockBackend::start().await;
    let storage = MemoryStorage::new();
    let session = SessionStore::load(Box::new(storage.clone())).into_shared();
    let mut app = App::with_session(&mock.config(), session).unwrap();
    app.login("+21620000001", "pw").await.unwrap();

    storage.fail_writes(true);
    let err = app.logout().unwrap_err();
    assert_eq!(err.code_str(), "storage");
    assert!(!app.session().is_authenticated());
    assert_eq!(app.router().current().map(|v| v.view), Some(ViewId::Login));
}

#[tokio::test]
async fn verification_refresh_reads_documents() {
    let mock = MockBackend::start().await;
    let app = signed_in(&mock, "+21620000001").await;
    assert_eq!(app.session().verification_level(), VerificationLevel::Unverified);
    let level = app.refresh_verification().await.unwrap();
    assert_eq!(level, VerificationLevel::Verified);
    assert!(app.session().is_verified());
}

#[tokio::test]
async fn kyc_upload_reads_file_from_disk() {
    let mock = MockBackend::start().await;
    let app = signed_in(&mock, "+21620000001").await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("id-card.pdf");
    std::fs::write(&path, b"%PDF-1.4 test").unwrap();
    app.upload_kyc("id_card", &path).await.unwrap();

    let seen = mock.recorder.last("POST", "/api/kyc/upload").unwrap();
    let body = String::from_utf8_lossy(&seen.body);
    assert!(body.contains("ID_CARD"));
    assert!(body.contains("filename=\"id-card.pdf\""));
    assert!(body.contains("application/pdf"));

    let missing = dir.path().join("nope.png");
    let err = app.upload_kyc("PASSPORT", &missing).await.unwrap_err();
    assert_eq!(err.code_str(), "validation");
}

#[tokio::test]
async fn commands_need_a_session() {
    let mock = MockBackend::start().await;
    let app = App::new(&mock.config()).unwrap();
    let err = app.transfer("acc-1", "20000002", 5.0).await.unwrap_err();
    assert_eq!(err.code_str(), "session");
    let err = app.claim_subsidy("p1").await.unwrap_err();
    assert_eq!(err.message(), "Please log in first");
    assert!(mock.recorder.all().is_empty());
}

#[tokio::test]
async fn disputes_and_tokens() {
    let mock = MockBackend::start().await;
    let mut app = signed_in(&mock, "+21620000001").await;

    let d = app.file_dispute("pay-1", "Charged twice for the same transfer").await.unwrap();
    assert_eq!(d.id, "d1");
    let (_, model) = app.open("/disputes").await.unwrap();
    match model {
        ViewModel::Disputes(list) => assert!(list[0].is_open()),
        other => panic!("unexpected {other:?}"),
    }
    let seen = mock.recorder.last("GET", "/api/disputes/my-disputes").unwrap();
    assert_eq!(seen.subject.as_deref(), Some("u-1"));

    assert_eq!(app.kyc_token().await.unwrap().token, "sdk-token");
    app.register_push_token("fcm-abc").await.unwrap();
}
