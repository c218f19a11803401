use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};

use serde::Serialize;

use crate::error::{ClientError, ClientResult};

/// Captured `:name` segments of a matched path.
pub type Params = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewId {
    Login,
    Register,
    Dashboard,
    Wallet,
    Kyc,
    Subsidies,
    Transfer,
    Disputes,
    Admin,
    AdminUsers,
    AdminKyc,
    AdminSubsidies,
    AdminDisputes,
}

impl ViewId {
    pub fn title(&self) -> &'static str {
        match self {
            ViewId::Login => "Login",
            ViewId::Register => "Register",
            ViewId::Dashboard => "Dashboard",
            ViewId::Wallet => "Wallet",
            ViewId::Kyc => "Verification",
            ViewId::Subsidies => "Subsidies",
            ViewId::Transfer => "Transfer",
            ViewId::Disputes => "Support",
            ViewId::Admin => "Admin",
            ViewId::AdminUsers => "Admin / Users",
            ViewId::AdminKyc => "Admin / KYC review",
            ViewId::AdminSubsidies => "Admin / Subsidies",
            ViewId::AdminDisputes => "Admin / Disputes",
        }
    }
}

impl Display for ViewId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.title()) }
}

/// Declared access requirements of a route. Checked by [`super::guard::decide`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Requirements {
    pub auth: bool,
    pub admin: bool,
    pub guest: bool,
}

impl Requirements {
    pub const PUBLIC: Requirements = Requirements { auth: false, admin: false, guest: false };
    pub const GUEST: Requirements = Requirements { auth: false, admin: false, guest: true };
    pub const AUTH: Requirements = Requirements { auth: true, admin: false, guest: false };
    pub const ADMIN: Requirements = Requirements { auth: true, admin: true, guest: false };

    fn contradictory(&self) -> bool { self.guest && (self.auth || self.admin) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    pattern: String,
    segments: Vec<Segment>,
    view: ViewId,
    requirements: Requirements,
}

impl RouteDescriptor {
    pub fn new(pattern: &str, view: ViewId, requirements: Requirements) -> Self {
        let segments = path_segments(pattern)
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Segment::Param(name.to_string()),
                None => Segment::Literal(s.to_string()),
            })
            .collect();
        Self { pattern: pattern.to_string(), segments, view, requirements }
    }

    pub fn pattern(&self) -> &str { &self.pattern }
    pub fn view(&self) -> ViewId { self.view }
    pub fn requirements(&self) -> Requirements { self.requirements }

    /// Match a concrete path, ignoring trailing slashes and any query string.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts: Vec<&str> = path_segments(path).collect();
        if parts.len() != self.segments.len() {
            return None;
        }
        let mut params = Params::new();
        for (seg, part) in self.segments.iter().zip(parts) {
            match seg {
                Segment::Literal(l) if l == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => {
                    let value = urlencoding::decode(part).map(|c| c.into_owned()).unwrap_or_else(|_| part.to_string());
                    params.insert(name.clone(), value);
                }
            }
        }
        Some(params)
    }

    /// Parameter names erased, so `/a/:x` and `/a/:y` compare equal.
    fn shape(&self) -> Vec<Option<&str>> {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Literal(l) => Some(l.as_str()),
                Segment::Param(_) => None,
            })
            .collect()
    }
}

/// Non-empty path segments with query and fragment removed.
pub fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty())
}

/// Canonical form of a requested path: leading slash, no trailing slash, no query.
pub fn normalize_path(path: &str) -> String {
    let joined = path_segments(path).collect::<Vec<_>>().join("/");
    format!("/{}", joined)
}

/// Immutable, validated route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteDescriptor>) -> ClientResult<Self> {
        let mut seen = HashSet::new();
        for r in &routes {
            if !r.pattern.starts_with('/') {
                return Err(ClientError::navigation(format!("route pattern '{}' must start with '/'", r.pattern)));
            }
            if r.segments.iter().any(|s| matches!(s, Segment::Param(n) if n.is_empty())) {
                return Err(ClientError::navigation(format!("route pattern '{}' has an unnamed parameter", r.pattern)));
            }
            if r.requirements.contradictory() {
                return Err(ClientError::navigation(format!(
                    "route '{}' cannot be guest-only and require a session",
                    r.pattern
                )));
            }
            if !seen.insert(r.shape()) {
                return Err(ClientError::navigation(format!("route pattern '{}' is declared twice", r.pattern)));
            }
        }
        Ok(Self { routes })
    }

    pub fn routes(&self) -> &[RouteDescriptor] { &self.routes }

    /// First route matching `path`. Literal routes are tried before parameterised ones.
    pub fn find(&self, path: &str) -> Option<(&RouteDescriptor, Params)> {
        let literal_first = self
            .routes
            .iter()
            .filter(|r| r.segments.iter().all(|s| matches!(s, Segment::Literal(_))))
            .chain(self.routes.iter().filter(|r| r.segments.iter().any(|s| matches!(s, Segment::Param(_)))));
        for r in literal_first {
            if let Some(params) = r.matches(path) {
                return Some((r, params));
            }
        }
        None
    }
}

pub fn default_routes() -> Vec<RouteDescriptor> {
    use Requirements as R;
    vec![
        RouteDescriptor::new("/login", ViewId::Login, R::GUEST),
        RouteDescriptor::new("/register", ViewId::Register, R::GUEST),
        RouteDescriptor::new("/", ViewId::Dashboard, R::AUTH),
        RouteDescriptor::new("/wallet", ViewId::Wallet, R::AUTH),
        RouteDescriptor::new("/kyc", ViewId::Kyc, R::AUTH),
        RouteDescriptor::new("/subsidies", ViewId::Subsidies, R::AUTH),
        RouteDescriptor::new("/transfer", ViewId::Transfer, R::AUTH),
        RouteDescriptor::new("/disputes", ViewId::Disputes, R::AUTH),
        RouteDescriptor::new("/admin", ViewId::Admin, R::ADMIN),
        RouteDescriptor::new("/admin/users", ViewId::AdminUsers, R::ADMIN),
        RouteDescriptor::new("/admin/kyc", ViewId::AdminKyc, R::ADMIN),
        RouteDescriptor::new("/admin/subsidies", ViewId::AdminSubsidies, R::ADMIN),
        RouteDescriptor::new("/admin/disputes", ViewId::AdminDisputes, R::ADMIN),
    ]
}
