use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Role issued by the identity service. An absent role is modelled as
/// `Option<Role>::None` and never satisfies an admin check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    Merchant,
    Admin,
}

impl Role {
    /// Accepts both `ROLE_ADMIN` and `ADMIN` spellings, case-insensitively.
    pub fn from_wire(s: &str) -> Option<Role> {
        let up = s.trim().to_ascii_uppercase();
        let bare = up.strip_prefix("ROLE_").unwrap_or(&up);
        match bare {
            "USER" => Some(Role::User),
            "MERCHANT" => Some(Role::Merchant),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Merchant => "ROLE_MERCHANT",
            Role::Admin => "ROLE_ADMIN",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_wire()) }
}

/// KYC progress marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationLevel {
    #[default]
    Unverified,
    Pending,
    Verified,
}

impl VerificationLevel {
    /// Unknown and rejected levels collapse to `Unverified`.
    pub fn from_wire(s: &str) -> VerificationLevel {
        match s.trim().to_ascii_uppercase().as_str() {
            "VERIFIED" => VerificationLevel::Verified,
            "PENDING" | "PENDING_VERIFICATION" => VerificationLevel::Pending,
            _ => VerificationLevel::Unverified,
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            VerificationLevel::Unverified => "UNVERIFIED",
            VerificationLevel::Pending => "PENDING",
            VerificationLevel::Verified => "VERIFIED",
        }
    }
}

impl Display for VerificationLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_wire()) }
}
