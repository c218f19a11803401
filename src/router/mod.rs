//! Guarded router: maps a requested path to a view, checking the session
//! against the route's requirements before any view data is fetched.

pub mod guard;
pub mod route;
pub mod scope;

use serde::Serialize;
use tracing::{debug, info};

pub use guard::{decide, Decision, HOME_ROUTE, LOGIN_ROUTE};
pub use route::{default_routes, normalize_path, Params, Requirements, RouteDescriptor, RouteTable, ViewId};
pub use scope::{NavigationEpoch, ViewScope};

use crate::error::{ClientError, ClientResult};
use crate::identity::{Session, SharedSession};

/// Upper bound on redirects followed by one `navigate` call.
pub const MAX_REDIRECTS: usize = 8;

/// A view admitted by the guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedView {
    pub view: ViewId,
    pub path: String,
    pub params: Params,
}

/// One step of resolution. Pure with respect to the given session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(RenderedView),
    Redirect { to: String, unknown: bool },
}

/// Result of following redirects to a renderable view.
#[derive(Debug, Clone)]
pub struct Navigated {
    pub view: RenderedView,
    /// Every path redirected to on the way, in order.
    pub redirects: Vec<String>,
    pub scope: ViewScope,
}

pub struct Router {
    table: RouteTable,
    session: SharedSession,
    epoch: NavigationEpoch,
    current: Option<RenderedView>,
}

impl Router {
    pub fn new(routes: Vec<RouteDescriptor>, session: SharedSession) -> ClientResult<Self> {
        let table = RouteTable::new(routes)?;
        Ok(Self { table, session, epoch: NavigationEpoch::new(), current: None })
    }

    pub fn with_default_routes(session: SharedSession) -> ClientResult<Self> { Self::new(default_routes(), session) }

    pub fn routes(&self) -> &[RouteDescriptor] { self.table.routes() }

    pub fn current(&self) -> Option<&RenderedView> { self.current.as_ref() }

    /// Scope of the view currently shown.
    pub fn scope(&self) -> ViewScope { self.epoch.scope() }

    pub fn epoch(&self) -> &NavigationEpoch { &self.epoch }

    /// Single guard decision for `path`. Unknown paths redirect home.
    pub fn resolve(&self, path: &str, session: &Session) -> Resolution {
        let Some((route, params)) = self.table.find(path) else {
            return Resolution::Redirect { to: HOME_ROUTE.to_string(), unknown: true };
        };
        match decide(route.requirements(), session) {
            Decision::Render => Resolution::Render(RenderedView { view: route.view(), path: normalize_path(path), params }),
            Decision::Redirect(to) => Resolution::Redirect { to: to.to_string(), unknown: false },
        }
    }

    /// Follow redirects to a renderable view and make it current. Bumps the
    /// navigation epoch, cancelling work started for the previous view.
    pub fn navigate(&mut self, path: &str) -> ClientResult<Navigated> {
        let session = self.session.read().snapshot();
        let requested = normalize_path(path);
        let mut visited = vec![requested.clone()];
        let mut redirects = Vec::new();
        let mut at = path.to_string();
        for _ in 0..=MAX_REDIRECTS {
            match self.resolve(&at, &session) {
                Resolution::Render(view) => {
                    self.epoch.advance();
                    info!(
                        target: "tunfin::router",
                        requested = %requested,
                        view = ?view.view,
                        redirects = redirects.len(),
                        "navigated"
                    );
                    self.current = Some(view.clone());
                    return Ok(Navigated { view, redirects, scope: self.epoch.scope() });
                }
                Resolution::Redirect { to, unknown } => {
                    debug!(target: "tunfin::router", from = %at, to = %to, unknown, "redirect");
                    if visited.contains(&to) {
                        return Err(ClientError::navigation(format!(
                            "redirect loop: {} -> {}",
                            visited.join(" -> "),
                            to
                        )));
                    }
                    visited.push(to.clone());
                    redirects.push(to.clone());
                    at = to;
                }
            }
        }
        Err(ClientError::navigation(format!("too many redirects resolving {}", requested)))
    }

    /// Re-run the guard for the current view, e.g. after the session changed.
    pub fn revalidate(&mut self) -> ClientResult<Navigated> {
        let path = self.current.as_ref().map(|v| v.path.clone()).unwrap_or_else(|| HOME_ROUTE.to_string());
        self.navigate(&path)
    }
}
