#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use tunfin::config::{ClientConfig, OutputMode};

/// One request as the backend saw it.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub subject: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Captured {
    pub fn json(&self) -> Value { serde_json::from_slice(&self.body).unwrap_or(Value::Null) }
}

#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<Captured>>>);

impl Recorder {
    pub fn all(&self) -> Vec<Captured> { self.0.lock().clone() }

    pub fn last(&self, method: &str, path: &str) -> Option<Captured> {
        self.0.lock().iter().rev().find(|c| c.method == method && c.path == path).cloned()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.0.lock().iter().filter(|c| c.method == method && c.path == path).count()
    }
}

/// In-process TunFin backend on an ephemeral localhost port. Aborted on drop.
pub struct MockBackend {
    pub base: String,
    pub recorder: Recorder,
    handle: JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) { self.handle.abort(); }
}

impl MockBackend {
    pub async fn start() -> MockBackend {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind 127.0.0.1:0");
        let addr = listener.local_addr().expect("local addr");
        let recorder = Recorder::default();
        let app = Router::new().fallback(handle).with_state(recorder.clone());
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("mock backend error: {e:?}");
            }
        });
        MockBackend { base: format!("http://{}", addr), recorder, handle }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig { api_base: self.base.clone(), ephemeral: true, output: OutputMode::Table, ..ClientConfig::default() }
    }
}

/// Base URL with nothing listening behind it.
pub async fn dead_base() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{}", addr)
}

fn query_map(q: Option<&str>) -> HashMap<String, String> {
    q.unwrap_or("")
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| {
            let (k, v) = p.split_once('=').unwrap_or((p, ""));
            let dec = |s: &str| urlencoding::decode(s).map(|c| c.into_owned()).unwrap_or_else(|_| s.to_string());
            (dec(k), dec(v))
        })
        .collect()
}

fn ok(v: Value) -> Response { (StatusCode::OK, Json(v)).into_response() }

fn fail(status: StatusCode, v: Value) -> Response { (status, Json(v)).into_response() }

fn accounts_of(user: &str) -> Value {
    match user {
        "u-1" => json!([
            {"id": "acc-1", "userId": "u-1", "currency": "TND", "balance": 100.0, "status": "ACTIVE"},
            {"id": "acc-eur", "userId": "u-1", "currency": "EUR", "balance": 20.5, "status": "ACTIVE"}
        ]),
        "u-2" => json!([{"id": "acc-2", "userId": "u-2", "currency": "TND", "balance": 5.0}]),
        "u-3" => json!([{"id": "acc-3", "userId": "u-3", "currency": "EUR", "balance": 1.0}]),
        _ => json!([]),
    }
}

async fn handle(State(rec): State<Recorder>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let h = |name: header::HeaderName| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    let query = query_map(uri.query());
    let captured = Captured {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query: query.clone(),
        authorization: h(header::AUTHORIZATION),
        subject: h(header::HeaderName::from_static("x-user-id")),
        content_type: h(header::CONTENT_TYPE),
        body: body.to_vec(),
    };
    rec.0.lock().push(captured);
    let req: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let path = uri.path();

    match (method.as_str(), path) {
        ("POST", "/api/auth/login") => match req["phoneNumber"].as_str().unwrap_or("") {
            "bad" => fail(StatusCode::UNAUTHORIZED, json!({"message": "Invalid phone number or password"})),
            "notoken" => ok(json!({"userId": "u-1"})),
            "admin" => ok(json!({"token": "adm-tok", "userId": "u-admin", "role": "ROLE_ADMIN", "kycLevel": "VERIFIED"})),
            "kycfail" => ok(json!({"token": "t-err", "userId": "u-err", "role": "ROLE_USER", "kycLevel": "PENDING"})),
            "slowdoc" => ok(json!({"token": "t-slow", "userId": "u-slowdoc", "role": "ROLE_USER", "kycLevel": "UNVERIFIED"})),
            _ => ok(json!({"token": "abc123", "userId": "u-1", "role": "ROLE_USER", "kycLevel": "UNVERIFIED"})),
        },
        ("POST", "/api/auth/register") => match req["phoneNumber"].as_str().unwrap_or("") {
            "taken" => fail(StatusCode::BAD_REQUEST, json!({"message": "Phone number already registered"})),
            "instant" => ok(json!({"token": "new-tok", "userId": "u-new"})),
            _ => ok(json!({"userId": "u-new"})),
        },
        ("POST", "/api/wallet/accounts") => ok(json!({
            "id": "acc-new", "userId": req["userId"], "currency": req["currency"], "balance": 0, "status": "ACTIVE"
        })),
        ("GET", p) if p.starts_with("/api/wallet/accounts/user/") => {
            ok(accounts_of(p.trim_start_matches("/api/wallet/accounts/user/")))
        }
        ("GET", p) if p.starts_with("/api/wallet/ledger/history/") => ok(json!([
            {"id": "t1", "type": "DEBIT", "amount": 20.0, "timestamp": "2024-03-01T10:15:30"},
            {"id": "t2", "type": "CREDIT", "amount": 50.0, "timestamp": "2024-03-02T08:00:00"}
        ])),
        ("POST", "/api/payment/p2p") => {
            let amount = req["amount"].as_f64().unwrap_or(0.0);
            if amount > 100.0 {
                fail(StatusCode::BAD_REQUEST, json!({"message": "Insufficient funds", "code": "RUNTIME_ERROR"}))
            } else {
                ok(json!({"id": "pay-1", "status": "COMPLETED", "amount": amount,
                    "senderAccountId": req["senderAccountId"], "receiverAccountId": req["receiverAccountId"]}))
            }
        }
        ("GET", "/api/users/search") => match query.get("phoneNumber").map(String::as_str) {
            Some("20000002") => ok(json!({"userId": "u-2", "fullName": "Sami Trabelsi"})),
            Some("20000003") => ok(json!({"userId": "u-3", "fullName": "Euro Only"})),
            _ => StatusCode::NOT_FOUND.into_response(),
        },
        ("GET", "/api/kyc/documents") => match query.get("userId").map(String::as_str) {
            Some("u-1") => ok(json!([
                {"id": "k1", "documentType": "ID_CARD", "status": "REJECTED"},
                {"id": "k2", "documentType": "PASSPORT", "status": "APPROVED", "uploadedAt": "2024-01-01T00:00:00"}
            ])),
            Some("u-err") => fail(StatusCode::INTERNAL_SERVER_ERROR, json!({"message": "KYC service unavailable"})),
            Some("u-slowdoc") => {
                tokio::time::sleep(Duration::from_millis(300)).await;
                ok(json!([{"id": "k3", "documentType": "ID_CARD", "status": "APPROVED"}]))
            }
            _ => ok(json!([])),
        },
        ("POST", "/api/kyc/upload") => StatusCode::OK.into_response(),
        ("GET", "/api/kyc/token") => ok(json!({"token": "sdk-token"})),
        ("GET", "/api/kyc/pending") => ok(json!([{"id": "u-5", "phoneNumber": "216555", "kycLevel": "PENDING_VERIFICATION"}])),
        ("POST", p) if p.starts_with("/api/kyc/review/") => StatusCode::OK.into_response(),
        ("GET", "/api/subsidies") => ok(json!([
            {"id": "p1", "name": "Student", "amountPerUser": 50, "remainingBudget": 950, "isActive": true},
            {"id": "p2", "name": "Expired", "amountPerUser": 10, "isActive": false}
        ])),
        ("GET", "/api/subsidies/eligibility") => ok(json!(query.get("programId").map(String::as_str) == Some("p1"))),
        ("POST", "/api/subsidies/claim") => ok(json!({
            "id": "c1", "programId": query.get("programId"), "userId": query.get("userId"), "amount": 50, "status": "PENDING"
        })),
        ("GET", "/api/subsidies/claims") => ok(json!([])),
        ("POST", "/api/subsidies/programs") => ok(json!({
            "id": "p9", "name": req["name"], "amountPerUser": req["amountPerUser"], "active": true
        })),
        ("POST", "/api/disputes") => ok(json!({
            "id": "d1", "paymentId": req["paymentId"], "reason": req["reason"], "status": "PENDING"
        })),
        ("GET", "/api/disputes/my-disputes") => ok(json!([{"id": "d0", "reason": "double charge", "status": "ESCALATED"}])),
        ("GET", "/api/disputes/admin/all") => ok(json!([
            {"id": "d0", "reason": "double charge", "status": "ESCALATED"},
            {"id": "d7", "reason": "late", "status": "RESOLVED"}
        ])),
        ("POST", p) if p.starts_with("/api/disputes/admin/resolve/") => ok(json!({
            "id": p.trim_start_matches("/api/disputes/admin/resolve/"), "reason": "double charge", "status": query.get("status")
        })),
        ("POST", "/api/users/fcm-token") => StatusCode::OK.into_response(),
        ("GET", "/api/admin/users") => ok(json!([
            {"id": "u-1", "phoneNumber": "20000001", "role": "USER"},
            {"id": "u-admin", "phoneNumber": "admin", "role": "ADMIN"}
        ])),
        ("GET", "/api/plain") => (StatusCode::OK, "uploaded").into_response(),
        ("GET", "/api/empty") => StatusCode::OK.into_response(),
        ("GET", "/api/broken") => (StatusCode::BAD_GATEWAY, "upstream exploded").into_response(),
        ("GET", "/api/slow") => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            ok(json!({"late": true}))
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}
