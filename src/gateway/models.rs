//! Wire schemas for the TunFin backend. Field names are camelCase on the wire;
//! everything the services may omit is optional so a sparse body still decodes.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Backend timestamps are usually zone-less ISO strings, sometimes RFC 3339.
/// Anything unparseable decodes as `None` rather than failing the whole body.
fn lenient_time<'de, D>(d: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(d)?;
    let Some(serde_json::Value::String(s)) = raw else { return Ok(None) };
    if let Ok(t) = s.parse::<NaiveDateTime>() {
        return Ok(Some(t));
    }
    Ok(DateTime::parse_from_rfc3339(&s).ok().map(|t| t.naive_utc()))
}

fn yes() -> bool { true }

// ---- identity ----

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub phone_number: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub kyc_level: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub phone_number: String,
    pub password: String,
    pub full_name: String,
    pub national_id: String,
    pub email: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
}

/// Full user record as returned by the admin and KYC-queue endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub national_id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub kyc_level: Option<String>,
    #[serde(default, alias = "isActive")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub created_at: Option<NaiveDateTime>,
}

/// Lookup result for search-by-phone and user-by-id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub fcm_token: Option<String>,
}

// ---- wallet ----

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub balance: f64,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub user_id: String,
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub account_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "lenient_time")]
    pub timestamp: Option<NaiveDateTime>,
}

impl LedgerEntry {
    pub fn is_debit(&self) -> bool {
        self.kind.as_deref().map(|k| k.eq_ignore_ascii_case("DEBIT")).unwrap_or(self.amount < 0.0)
    }
}

// ---- payments ----

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub sender_account_id: String,
    pub receiver_account_id: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub sender_account_id: Option<String>,
    #[serde(default)]
    pub receiver_account_id: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDisputeRequest {
    pub payment_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ai_confidence: Option<f64>,
    #[serde(default)]
    pub ai_recommendation: Option<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub resolved_at: Option<NaiveDateTime>,
}

impl Dispute {
    /// Still awaiting a decision from an agent.
    pub fn is_open(&self) -> bool {
        matches!(self.status.as_deref(), None | Some("PENDING") | Some("ESCALATED"))
    }
}

// ---- kyc ----

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default, alias = "type")]
    pub document_type: Option<String>,
    #[serde(default, alias = "fileUrl")]
    pub file_path: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default, deserialize_with = "lenient_time")]
    pub uploaded_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KycToken {
    #[serde(default)]
    pub token: String,
}

// ---- subsidies ----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsidyProgram {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount_per_user: f64,
    #[serde(default)]
    pub total_budget: Option<f64>,
    #[serde(default)]
    pub remaining_budget: Option<f64>,
    #[serde(default)]
    pub criteria_json: Option<String>,
    #[serde(default = "yes", alias = "isActive")]
    pub active: bool,
    #[serde(default, deserialize_with = "lenient_time")]
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubsidyProgram {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub amount_per_user: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_budget: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criteria_json: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsidyClaim {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub program_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub disbursed_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub created_at: Option<NaiveDateTime>,
}
