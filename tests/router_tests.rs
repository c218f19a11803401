use tunfin::identity::{Role, SessionStore, SharedSession, VerificationLevel};
use tunfin::router::{default_routes, Requirements, Resolution, RouteDescriptor, Router, ViewId, HOME_ROUTE, LOGIN_ROUTE};
use tunfin::storage::MemoryStorage;

fn session(role: Option<Option<Role>>) -> SharedSession {
    let shared = SessionStore::load(Box::new(MemoryStorage::new())).into_shared();
    if let Some(role) = role {
        shared.write().set_auth("tok", "u-1", role, VerificationLevel::Unverified).unwrap();
    }
    shared
}

fn admin_paths() -> Vec<String> {
    default_routes()
        .iter()
        .filter(|r| r.requirements().admin)
        .map(|r| r.pattern().to_string())
        .collect()
}

#[test]
fn anonymous_is_sent_to_login_before_admin_check() {
    let shared = session(None);
    let router = Router::with_default_routes(shared.clone()).unwrap();
    let s = shared.read().snapshot();
    let paths = admin_paths();
    assert!(!paths.is_empty());
    for p in paths {
        assert_eq!(
            router.resolve(&p, &s),
            Resolution::Redirect { to: LOGIN_ROUTE.to_string(), unknown: false },
            "{p}"
        );
    }
}

#[test]
fn non_admin_is_sent_home_from_admin_routes() {
    let shared = session(Some(Some(Role::User)));
    let mut router = Router::with_default_routes(shared).unwrap();
    for p in admin_paths() {
        let nav = router.navigate(&p).unwrap();
        assert_eq!(nav.view.view, ViewId::Dashboard, "{p}");
        assert_eq!(nav.redirects, vec![HOME_ROUTE.to_string()]);
    }
}

#[test]
fn admin_renders_admin_routes() {
    let shared = session(Some(Some(Role::Admin)));
    let mut router = Router::with_default_routes(shared).unwrap();
    assert_eq!(router.navigate("/admin").unwrap().view.view, ViewId::Admin);
    assert_eq!(router.navigate("/admin/kyc/").unwrap().view.view, ViewId::AdminKyc);
    assert_eq!(router.navigate("/admin/disputes?page=2").unwrap().view.view, ViewId::AdminDisputes);
}

#[test]
fn guest_routes_bounce_signed_in_users() {
    let shared = session(Some(None));
    let mut router = Router::with_default_routes(shared.clone()).unwrap();
    for p in ["/login", "/register"] {
        let nav = router.navigate(p).unwrap();
        assert_eq!(nav.view.view, ViewId::Dashboard);
    }

    shared.write().clear().unwrap();
    assert_eq!(router.navigate("/register").unwrap().view.view, ViewId::Register);
    assert_eq!(router.navigate("/kyc").unwrap().view.view, ViewId::Login);
}

#[test]
fn unknown_paths_go_home() {
    let shared = session(Some(Some(Role::User)));
    let mut router = Router::with_default_routes(shared.clone()).unwrap();
    let s = shared.read().snapshot();
    assert_eq!(
        router.resolve("/nowhere", &s),
        Resolution::Redirect { to: HOME_ROUTE.to_string(), unknown: true }
    );
    let nav = router.navigate("/nowhere/at/all").unwrap();
    assert_eq!(nav.view.view, ViewId::Dashboard);

    // anonymous: unknown -> home -> login
    let mut anon = Router::with_default_routes(session(None)).unwrap();
    let nav = anon.navigate("/nowhere").unwrap();
    assert_eq!(nav.view.view, ViewId::Login);
    assert_eq!(nav.redirects, vec![HOME_ROUTE.to_string(), LOGIN_ROUTE.to_string()]);
}

#[test]
fn revalidate_follows_session_changes() {
    let shared = session(Some(Some(Role::Admin)));
    let mut router = Router::with_default_routes(shared.clone()).unwrap();
    router.navigate("/admin/users").unwrap();

    shared.write().set_auth("tok", "u-1", Some(Role::User), VerificationLevel::Verified).unwrap();
    assert_eq!(router.revalidate().unwrap().view.view, ViewId::Dashboard);

    shared.write().clear().unwrap();
    assert_eq!(router.revalidate().unwrap().view.view, ViewId::Login);
}

#[test]
fn navigation_invalidates_previous_scope() {
    let mut router = Router::with_default_routes(session(Some(None))).unwrap();
    let first = router.navigate("/wallet").unwrap().scope;
    assert!(first.is_current());
    let second = router.navigate("/kyc").unwrap().scope;
    assert!(!first.is_current());
    assert!(second.is_current());
}

#[test]
fn custom_tables_are_checked() {
    let dup = vec![
        RouteDescriptor::new("/", ViewId::Dashboard, Requirements::AUTH),
        RouteDescriptor::new("/", ViewId::Wallet, Requirements::AUTH),
    ];
    assert!(Router::new(dup, session(None)).is_err());

    let contradictory = vec![RouteDescriptor::new(
        "/login",
        ViewId::Login,
        Requirements { auth: true, admin: false, guest: true },
    )];
    assert!(Router::new(contradictory, session(None)).is_err());
}
