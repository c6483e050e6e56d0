//! `Backend` implementation over reqwest
//!
//! Every call is a JSON POST. Non-success statuses are transport failures;
//! bodies are read as text first so a malformed body is reported as
//! `Error::Parse` rather than lumped in with network errors.

use reqwest::header::{ORIGIN, REFERER};
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::constants::{
    APPLY_PROMO_PATH, CLIENT_ORIGIN, CREATE_CODE_PATH, EVENT_ORIGIN, GAME_ORIGIN,
    GET_PROMOS_PATH, LOGIN_CLIENT_PATH, METADATA_BASE_URL, PROMO_BASE_URL, REGISTER_EVENT_PATH,
};
use crate::credentials::{AccountToken, SessionToken};
use crate::error::{Error, Result};
use crate::wire::{
    ApplyPromoRequest, ApplyPromoResponse, CreateCodeRequest, CreateCodeResponse, InterludeUser,
    LoginClientRequest, LoginClientResponse, PromosResponse, RegisterEventRequest,
    RegisterEventResponse,
};
use crate::{Backend, BackendFuture};

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY: usize = 256;

/// Base URLs and origin the backend talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub metadata_url: String,
    pub promo_url: String,
    pub game_origin: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            metadata_url: METADATA_BASE_URL.to_string(),
            promo_url: PROMO_BASE_URL.to_string(),
            game_origin: GAME_ORIGIN.to_string(),
        }
    }
}

/// Production backend. Cheap to clone; holds a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl HttpBackend {
    pub fn new(client: reqwest::Client, endpoints: Endpoints) -> Self {
        Self { client, endpoints }
    }

    fn metadata_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoints.metadata_url.trim_end_matches('/'), path)
    }

    fn promo_url(&self, path: &str) -> String {
        format!("{}{}", self.endpoints.promo_url.trim_end_matches('/'), path)
    }

    /// POST to the metadata service with the account bearer and origin headers.
    fn account_request(&self, path: &str, account: &AccountToken) -> reqwest::RequestBuilder {
        self.client
            .post(self.metadata_url(path))
            .bearer_auth(account.bearer())
            .header(ORIGIN, self.endpoints.game_origin.as_str())
            .header(REFERER, self.endpoints.game_origin.as_str())
    }

    async fn get_promos_inner(&self, account: &AccountToken) -> Result<PromosResponse> {
        let request = self
            .account_request(GET_PROMOS_PATH, account)
            .json(&serde_json::json!({}));
        send_json(GET_PROMOS_PATH, request).await
    }

    async fn apply_promo_inner(&self, account: &AccountToken, code: &str) -> Result<InterludeUser> {
        let request = self
            .account_request(APPLY_PROMO_PATH, account)
            .json(&ApplyPromoRequest { promo_code: code });
        let response: ApplyPromoResponse = send_json(APPLY_PROMO_PATH, request).await?;
        response.interlude_user.ok_or(Error::Empty("interludeUser"))
    }

    async fn login_client_inner(&self, promo_id: &str, client_id: Uuid) -> Result<SessionToken> {
        let request = self
            .client
            .post(self.promo_url(LOGIN_CLIENT_PATH))
            .json(&LoginClientRequest {
                app_token: promo_id,
                client_id,
                client_origin: CLIENT_ORIGIN,
            });
        let response: LoginClientResponse = send_json(LOGIN_CLIENT_PATH, request).await?;
        response
            .client_token
            .and_then(SessionToken::new)
            .ok_or(Error::Empty("clientToken"))
    }

    async fn register_event_inner(
        &self,
        session: &SessionToken,
        promo_id: &str,
        event_id: Uuid,
    ) -> Result<bool> {
        let request = self
            .client
            .post(self.promo_url(REGISTER_EVENT_PATH))
            .bearer_auth(session.bearer())
            .json(&RegisterEventRequest {
                event_id,
                event_origin: EVENT_ORIGIN,
                promo_id,
            });
        let response: RegisterEventResponse = send_json(REGISTER_EVENT_PATH, request).await?;
        Ok(response.has_code)
    }

    async fn create_code_inner(&self, session: &SessionToken, promo_id: &str) -> Result<String> {
        let request = self
            .client
            .post(self.promo_url(CREATE_CODE_PATH))
            .bearer_auth(session.bearer())
            .json(&CreateCodeRequest { promo_id });
        let response: CreateCodeResponse = send_json(CREATE_CODE_PATH, request).await?;
        response
            .promo_code
            .filter(|code| !code.trim().is_empty())
            .ok_or(Error::Empty("promoCode"))
    }
}

impl Backend for HttpBackend {
    fn get_promos<'a>(&'a self, account: &'a AccountToken) -> BackendFuture<'a, PromosResponse> {
        Box::pin(self.get_promos_inner(account))
    }

    fn apply_promo<'a>(
        &'a self,
        account: &'a AccountToken,
        code: &'a str,
    ) -> BackendFuture<'a, InterludeUser> {
        Box::pin(self.apply_promo_inner(account, code))
    }

    fn login_client<'a>(
        &'a self,
        promo_id: &'a str,
        client_id: Uuid,
    ) -> BackendFuture<'a, SessionToken> {
        Box::pin(self.login_client_inner(promo_id, client_id))
    }

    fn register_event<'a>(
        &'a self,
        session: &'a SessionToken,
        promo_id: &'a str,
        event_id: Uuid,
    ) -> BackendFuture<'a, bool> {
        Box::pin(self.register_event_inner(session, promo_id, event_id))
    }

    fn create_code<'a>(
        &'a self,
        session: &'a SessionToken,
        promo_id: &'a str,
    ) -> BackendFuture<'a, String> {
        Box::pin(self.create_code_inner(session, promo_id))
    }
}

/// Send a prepared request and decode its JSON body.
async fn send_json<T: DeserializeOwned>(endpoint: &str, request: reqwest::RequestBuilder) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| Error::Transport(format!("{endpoint}: {e}")))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::Transport(format!("{endpoint}: reading body: {e}")))?;

    if !status.is_success() {
        return Err(Error::Transport(format!(
            "{endpoint} returned {status}: {}",
            truncate(&body)
        )));
    }

    debug!(endpoint, status = status.as_u16(), "backend responded");
    serde_json::from_str(&body).map_err(|e| Error::Parse(format!("{endpoint}: {e}")))
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tokio::net::TcpListener;

    /// One request as seen by the mock server.
    #[derive(Debug, Clone)]
    struct Captured {
        path: String,
        headers: HashMap<String, String>,
        body: serde_json::Value,
    }

    struct MockServer {
        url: String,
        captured: Arc<Mutex<Vec<Captured>>>,
    }

    impl MockServer {
        fn requests(&self) -> Vec<Captured> {
            self.captured.lock().unwrap().clone()
        }
    }

    /// Start a mock serving canned `(status, body)` per path. Unknown paths 404.
    async fn start_mock(routes: &[(&str, StatusCode, &str)]) -> MockServer {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes: Arc<HashMap<String, (StatusCode, String)>> = Arc::new(
            routes
                .iter()
                .map(|(path, status, body)| (path.to_string(), (*status, body.to_string())))
                .collect(),
        );
        let captured = Arc::new(Mutex::new(Vec::new()));

        let sink = captured.clone();
        let app = axum::Router::new().fallback(move |request: Request<Body>| {
            let sink = sink.clone();
            let routes = routes.clone();
            async move {
                let path = request.uri().path().to_string();
                let headers = request
                    .headers()
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                    .collect();
                let bytes = axum::body::to_bytes(request.into_body(), 1024 * 1024)
                    .await
                    .unwrap();
                let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
                sink.lock().unwrap().push(Captured {
                    path: path.clone(),
                    headers,
                    body,
                });
                match routes.get(&path) {
                    Some((status, body)) => (*status, body.clone()),
                    None => (StatusCode::NOT_FOUND, String::from("no route")),
                }
            }
        });

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockServer {
            url: format!("http://{addr}"),
            captured,
        }
    }

    fn backend_for(url: &str) -> HttpBackend {
        HttpBackend::new(
            reqwest::Client::new(),
            Endpoints {
                metadata_url: url.to_string(),
                promo_url: format!("{url}/"),
                game_origin: GAME_ORIGIN.to_string(),
            },
        )
    }

    fn session() -> SessionToken {
        SessionToken::new("session-abc").unwrap()
    }

    #[test]
    fn default_endpoints_point_at_production() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.metadata_url, "https://api.hamsterkombatgame.io");
        assert_eq!(endpoints.promo_url, "https://api.gamepromo.io");
        assert_eq!(endpoints.game_origin, "https://hamsterkombatgame.io");
    }

    #[tokio::test]
    async fn get_promos_sends_account_headers_and_empty_body() {
        let server = start_mock(&[(
            GET_PROMOS_PATH,
            StatusCode::OK,
            r#"{"promos":[{"promoId":"p1","keysPerDay":4}],"states":[{"promoId":"p1","receiveKeysToday":2}]}"#,
        )])
        .await;
        let backend = backend_for(&server.url);

        let response = backend
            .get_promos(&AccountToken::new("account-1"))
            .await
            .unwrap();
        assert_eq!(response.promos.unwrap()[0].promo_id, "p1");
        assert_eq!(response.states.unwrap()[0].receive_keys_today, 2);

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.path, GET_PROMOS_PATH);
        assert_eq!(request.headers["authorization"], "Bearer account-1");
        assert_eq!(request.headers["origin"], GAME_ORIGIN);
        assert_eq!(request.headers["referer"], GAME_ORIGIN);
        assert_eq!(request.body, serde_json::json!({}));
    }

    #[tokio::test]
    async fn apply_promo_returns_interlude_user() {
        let server = start_mock(&[(
            APPLY_PROMO_PATH,
            StatusCode::OK,
            r#"{"interludeUser":{"id":"u1","balanceDiamonds":1250.5}}"#,
        )])
        .await;
        let backend = backend_for(&server.url);

        let user = backend
            .apply_promo(&AccountToken::new("account-1"), "CODE-1")
            .await
            .unwrap();
        assert_eq!(user.balance_diamonds, Some(1250.5));

        let request = &server.requests()[0];
        assert_eq!(request.body["promoCode"], "CODE-1");
        assert_eq!(request.headers["authorization"], "Bearer account-1");
    }

    #[tokio::test]
    async fn apply_promo_without_user_is_empty() {
        let server = start_mock(&[(APPLY_PROMO_PATH, StatusCode::OK, r#"{"status":"ok"}"#)]).await;
        let backend = backend_for(&server.url);

        let result = backend
            .apply_promo(&AccountToken::new("account-1"), "CODE-1")
            .await;
        assert_eq!(result.unwrap_err(), Error::Empty("interludeUser"));
    }

    #[tokio::test]
    async fn login_client_is_unauthenticated_and_identifies_as_ios() {
        let server = start_mock(&[(
            LOGIN_CLIENT_PATH,
            StatusCode::OK,
            r#"{"clientToken":"session-xyz"}"#,
        )])
        .await;
        let backend = backend_for(&server.url);
        let client_id = Uuid::new_v4();

        let session = backend.login_client("promo-1", client_id).await.unwrap();
        assert_eq!(session.bearer(), "session-xyz");

        let request = &server.requests()[0];
        assert_eq!(request.path, LOGIN_CLIENT_PATH);
        assert!(request.headers.get("authorization").is_none());
        assert_eq!(request.body["appToken"], "promo-1");
        assert_eq!(request.body["clientId"], client_id.to_string());
        assert_eq!(request.body["clientOrigin"], "ios");
    }

    #[tokio::test]
    async fn login_client_without_token_is_empty() {
        let server = start_mock(&[(LOGIN_CLIENT_PATH, StatusCode::OK, "{}")]).await;
        let backend = backend_for(&server.url);

        let result = backend.login_client("promo-1", Uuid::new_v4()).await;
        assert_eq!(result.unwrap_err(), Error::Empty("clientToken"));
    }

    #[tokio::test]
    async fn register_event_uses_session_bearer() {
        let server = start_mock(&[(
            REGISTER_EVENT_PATH,
            StatusCode::OK,
            r#"{"hasCode":true}"#,
        )])
        .await;
        let backend = backend_for(&server.url);
        let event_id = Uuid::new_v4();

        let ready = backend
            .register_event(&session(), "promo-1", event_id)
            .await
            .unwrap();
        assert!(ready);

        let request = &server.requests()[0];
        assert_eq!(request.headers["authorization"], "Bearer session-abc");
        assert!(request.headers.get("origin").is_none());
        assert_eq!(request.body["eventId"], event_id.to_string());
        assert_eq!(request.body["eventOrigin"], "undefined");
        assert_eq!(request.body["promoId"], "promo-1");
    }

    #[tokio::test]
    async fn create_code_returns_code() {
        let server = start_mock(&[(
            CREATE_CODE_PATH,
            StatusCode::OK,
            r#"{"promoCode":"BIKE-ABC-123"}"#,
        )])
        .await;
        let backend = backend_for(&server.url);

        let code = backend.create_code(&session(), "promo-1").await.unwrap();
        assert_eq!(code, "BIKE-ABC-123");
        assert_eq!(server.requests()[0].body["promoId"], "promo-1");
    }

    #[tokio::test]
    async fn blank_promo_code_is_empty() {
        let server = start_mock(&[(CREATE_CODE_PATH, StatusCode::OK, r#"{"promoCode":""}"#)]).await;
        let backend = backend_for(&server.url);

        let result = backend.create_code(&session(), "promo-1").await;
        assert_eq!(result.unwrap_err(), Error::Empty("promoCode"));
    }

    #[tokio::test]
    async fn error_status_is_transport_failure() {
        let server = start_mock(&[(
            REGISTER_EVENT_PATH,
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error_code":"TooManyRegister"}"#,
        )])
        .await;
        let backend = backend_for(&server.url);

        let err = backend
            .register_event(&session(), "promo-1", Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
        assert!(err.to_string().contains("429"), "got: {err}");
    }

    #[tokio::test]
    async fn malformed_body_is_parse_failure() {
        let server = start_mock(&[(GET_PROMOS_PATH, StatusCode::OK, "<html>maintenance</html>")]).await;
        let backend = backend_for(&server.url);

        let err = backend
            .get_promos(&AccountToken::new("account-1"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "parse");
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_failure() {
        let backend = backend_for("http://127.0.0.1:1");
        let err = backend
            .login_client("promo-1", Uuid::new_v4())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "transport");
    }

    #[test]
    fn truncate_limits_error_bodies() {
        let long = "x".repeat(MAX_ERROR_BODY * 2);
        assert_eq!(truncate(&long).len(), MAX_ERROR_BODY);
        assert_eq!(truncate("short"), "short");
    }
}
