use super::route::Requirements;
use crate::identity::Session;

pub const LOGIN_ROUTE: &str = "/login";
/// Where authenticated users land.
pub const HOME_ROUTE: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Render,
    Redirect(&'static str),
}

/// Checks run in a fixed order: auth, then admin, then guest. An anonymous
/// caller on an admin route is therefore sent to login, never home.
pub fn decide(req: Requirements, session: &Session) -> Decision {
    if req.auth && !session.is_authenticated() {
        return Decision::Redirect(LOGIN_ROUTE);
    }
    if req.admin && !session.is_admin() {
        return Decision::Redirect(HOME_ROUTE);
    }
    if req.guest && session.is_authenticated() {
        return Decision::Redirect(HOME_ROUTE);
    }
    Decision::Render
}
