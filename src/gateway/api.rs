//! Typed TunFin endpoints on top of [`GatewayClient`].

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::client::{decode, GatewayClient};
use super::models::*;
use crate::error::{ClientError, ClientResult};

fn enc(s: &str) -> String { urlencoding::encode(s.trim()).into_owned() }

/// Empty success bodies become the type's default; anything else must match the schema.
fn decode_or_default<T: DeserializeOwned + Default>(path: &str, v: Value) -> ClientResult<T> {
    if v.is_null() {
        return Ok(T::default());
    }
    decode(path, v)
}

/// Best-effort content type from the file extension.
pub fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

#[derive(Clone)]
pub struct TunFinApi {
    client: GatewayClient,
}

impl TunFinApi {
    pub fn new(client: GatewayClient) -> Self { Self { client } }

    pub fn client(&self) -> &GatewayClient { &self.client }

    /// Subject id of the signed-in user, for endpoints that are keyed by it.
    pub fn subject_id(&self) -> ClientResult<String> {
        self.client
            .session()
            .read()
            .subject_id()
            .map(str::to_string)
            .ok_or_else(|| ClientError::session("Please log in first"))
    }

    async fn get<T: DeserializeOwned + Default>(&self, path: &str) -> ClientResult<T> {
        let v = self.client.call(Method::GET, path, None).await?;
        decode_or_default(path, v)
    }

    async fn post<B: serde::Serialize + ?Sized, T: DeserializeOwned + Default>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> ClientResult<T> {
        let body = match body {
            Some(b) => Some(serde_json::to_value(b).map_err(|e| ClientError::validation("body", e.to_string()))?),
            None => None,
        };
        let v = self.client.call(Method::POST, path, body.as_ref()).await?;
        decode_or_default(path, v)
    }

    // ---- auth ----

    pub async fn login(&self, req: &LoginRequest) -> ClientResult<AuthResponse> {
        self.post("/api/auth/login", Some(req)).await
    }

    pub async fn register(&self, req: &RegisterRequest) -> ClientResult<AuthResponse> {
        self.post("/api/auth/register", Some(req)).await
    }

    // ---- wallet ----

    pub async fn accounts(&self, user_id: &str) -> ClientResult<Vec<Account>> {
        self.get(&format!("/api/wallet/accounts/user/{}", enc(user_id))).await
    }

    pub async fn account(&self, account_id: &str) -> ClientResult<Account> {
        let path = format!("/api/wallet/accounts/{}", enc(account_id));
        let v = self.client.call(Method::GET, &path, None).await?;
        if v.is_null() {
            return Err(ClientError::decode(format!("account {} not returned", account_id.trim())));
        }
        decode(&path, v)
    }

    pub async fn create_account(&self, req: &CreateAccountRequest) -> ClientResult<Account> {
        self.post("/api/wallet/accounts", Some(req)).await
    }

    pub async fn ledger_history(&self, user_id: &str) -> ClientResult<Vec<LedgerEntry>> {
        self.get(&format!("/api/wallet/ledger/history/{}", enc(user_id))).await
    }

    pub async fn transfer(&self, req: &TransferRequest) -> ClientResult<Payment> {
        self.post("/api/payment/p2p", Some(req)).await
    }

    // ---- kyc ----

    pub async fn kyc_documents(&self, user_id: &str) -> ClientResult<Vec<KycDocument>> {
        self.get(&format!("/api/kyc/documents?userId={}", enc(user_id))).await
    }

    /// Multipart `{userId, type, file}`.
    pub async fn upload_kyc_document(
        &self,
        user_id: &str,
        document_type: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ClientResult<Value> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_for(file_name))
            .map_err(|e| ClientError::validation("file", e.to_string()))?;
        let form = Form::new()
            .text("userId", user_id.trim().to_string())
            .text("type", document_type.trim().to_string())
            .part("file", part);
        self.client.upload("/api/kyc/upload", form).await
    }

    pub async fn kyc_token(&self, user_id: &str) -> ClientResult<KycToken> {
        self.get(&format!("/api/kyc/token?userId={}", enc(user_id))).await
    }

    pub async fn pending_kyc(&self) -> ClientResult<Vec<UserProfile>> { self.get("/api/kyc/pending").await }

    pub async fn review_kyc(&self, user_id: &str, approve: bool) -> ClientResult<()> {
        let path = format!("/api/kyc/review/{}?approve={}", enc(user_id), approve);
        self.client.call(Method::POST, &path, None).await.map(|_| ())
    }

    // ---- subsidies ----

    pub async fn subsidies(&self) -> ClientResult<Vec<SubsidyProgram>> { self.get("/api/subsidies").await }

    pub async fn eligibility(&self, user_id: &str, program_id: &str) -> ClientResult<bool> {
        self.get(&format!("/api/subsidies/eligibility?userId={}&programId={}", enc(user_id), enc(program_id)))
            .await
    }

    pub async fn claim_subsidy(&self, user_id: &str, program_id: &str) -> ClientResult<SubsidyClaim> {
        let path = format!("/api/subsidies/claim?userId={}&programId={}", enc(user_id), enc(program_id));
        self.post::<Value, _>(&path, None).await
    }

    pub async fn subsidy_claims(&self, user_id: &str) -> ClientResult<Vec<SubsidyClaim>> {
        self.get(&format!("/api/subsidies/claims?userId={}", enc(user_id))).await
    }

    pub async fn create_program(&self, program: &NewSubsidyProgram) -> ClientResult<SubsidyProgram> {
        let path = "/api/subsidies/programs";
        let body = serde_json::to_value(program).map_err(|e| ClientError::validation("body", e.to_string()))?;
        let v = self.client.call(Method::POST, path, Some(&body)).await?;
        decode(path, v)
    }

    // ---- disputes ----

    pub async fn file_dispute(&self, req: &FileDisputeRequest) -> ClientResult<Dispute> {
        self.post("/api/disputes", Some(req)).await
    }

    /// Keyed by the subject header, not a path parameter.
    pub async fn my_disputes(&self) -> ClientResult<Vec<Dispute>> { self.get("/api/disputes/my-disputes").await }

    pub async fn all_disputes(&self) -> ClientResult<Vec<Dispute>> { self.get("/api/disputes/admin/all").await }

    pub async fn resolve_dispute(&self, dispute_id: &str, status: &str) -> ClientResult<Dispute> {
        let path = format!("/api/disputes/admin/resolve/{}?status={}", enc(dispute_id), enc(status));
        self.post::<Value, _>(&path, None).await
    }

    // ---- users ----

    pub async fn search_user(&self, phone_number: &str) -> ClientResult<UserSummary> {
        self.get(&format!("/api/users/search?phoneNumber={}", enc(phone_number))).await
    }

    pub async fn user(&self, user_id: &str) -> ClientResult<UserSummary> {
        self.get(&format!("/api/users/{}", enc(user_id))).await
    }

    pub async fn register_push_token(&self, user_id: &str, token: &str) -> ClientResult<()> {
        let path = format!("/api/users/fcm-token?userId={}&token={}", enc(user_id), enc(token));
        self.client.call(Method::POST, &path, None).await.map(|_| ())
    }

    pub async fn all_users(&self) -> ClientResult<Vec<UserProfile>> { self.get("/api/admin/users").await }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_guess() {
        assert_eq!(mime_for("id.PDF"), "application/pdf");
        assert_eq!(mime_for("selfie.jpeg"), "image/jpeg");
        assert_eq!(mime_for("scan"), "application/octet-stream");
    }

    #[test]
    fn path_segments_are_encoded() {
        assert_eq!(enc(" +216 20 "), "%2B216%2020");
        assert_eq!(enc("a/b"), "a%2Fb");
    }

    #[test]
    fn null_body_defaults() {
        let v: Vec<Account> = decode_or_default("/x", Value::Null).unwrap();
        assert!(v.is_empty());
        assert!(decode_or_default::<Vec<Account>>("/x", Value::String("oops".into())).is_err());
    }
}
