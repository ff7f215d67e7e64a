//! Client for the rental backend's REST API.
//!
//! Every call asks for JSON and, unless it is anonymous, carries the admin's
//! bearer token. The token is looked up in the [`TokenSource`] when the call is
//! made so a login or logout earlier in the same request is always honoured.

use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    multipart, Method,
};
use rocket::{
    http::{CookieJar, Status},
    request::{FromRequest, Outcome},
    Request,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::pagination::Page;

pub use self::error::ApiError;
pub use self::fairing::BackendFairing;
use crate::{authentication::TOKEN_COOKIE, error::Error};

pub mod error;
pub mod fairing;
#[cfg(test)]
pub mod stub;

/// Shared HTTP state, managed by Rocket.
pub struct Backend {
    http: reqwest::Client,
    base_url: String,
    per_page: u64,
}

impl Backend {
    pub fn new(http: reqwest::Client, base_url: &str, per_page: u64) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            per_page,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

pub trait TokenSource: Sync {
    fn token(&self) -> Option<String>;
}

impl TokenSource for CookieJar<'_> {
    fn token(&self) -> Option<String> {
        self.get(TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    }
}

/// No token at all, for calls made before logging in.
pub struct Anonymous;

impl TokenSource for Anonymous {
    fn token(&self) -> Option<String> {
        None
    }
}

pub enum Body {
    Empty,
    Json(Value),
    Multipart(multipart::Form),
}

pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Body,
    authorize: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Body::Empty,
            authorize: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Body::Json(body);
        self
    }

    #[must_use]
    pub fn multipart(mut self, form: multipart::Form) -> Self {
        self.body = Body::Multipart(form);
        self
    }

    /// Sends the call without an `Authorization` header.
    #[must_use]
    pub fn anonymous(mut self) -> Self {
        self.authorize = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    Text(String),
}

impl ApiResponse {
    pub fn decode(content_type: &str, body: String) -> Self {
        if !content_type.to_ascii_lowercase().contains("json") {
            return ApiResponse::Text(body);
        }
        if body.trim().is_empty() {
            return ApiResponse::Json(Value::Null);
        }
        match serde_json::from_str(&body) {
            Ok(value) => ApiResponse::Json(value),
            Err(_) => ApiResponse::Text(body),
        }
    }

    pub fn into_value(self) -> Result<Value, ApiError> {
        match self {
            ApiResponse::Json(value) => Ok(value),
            ApiResponse::Text(text) => Ok(serde_json::from_str(&text)?),
        }
    }

    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        Ok(serde_json::from_value(self.into_value()?)?)
    }

    /// The backend's confirmation message, if it sent one.
    pub fn message(&self) -> Option<String> {
        match self {
            ApiResponse::Json(value) => value
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            ApiResponse::Text(text) if !text.trim().is_empty() && text.len() < 200 => {
                Some(text.trim().to_string())
            }
            ApiResponse::Text(_) => None,
        }
    }
}

/// Strips a `{ "data": ... }` envelope around a single record.
fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut object) if object.get("data").map_or(false, Value::is_object) => {
            object.remove("data").unwrap_or(Value::Null)
        }
        value => value,
    }
}

pub struct ApiClient<'a> {
    backend: &'a Backend,
    tokens: &'a dyn TokenSource,
}

impl<'a> ApiClient<'a> {
    pub fn new(backend: &'a Backend, tokens: &'a dyn TokenSource) -> Self {
        Self { backend, tokens }
    }

    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let url = self.backend.url(&request.path);
        let mut builder = self
            .backend
            .http
            .request(request.method.clone(), &url)
            .header(ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }

        if request.authorize {
            let Some(token) = self.tokens.token() else {
                return Err(ApiError::Unauthorized);
            };
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            Body::Empty => builder,
            Body::Json(body) => builder.json(&body),
            Body::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().await.map_err(|e| {
            warn!("Backend call to {url} failed: {e}");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await?;

        if status.is_success() {
            Ok(ApiResponse::decode(&content_type, body))
        } else {
            let error = ApiError::from_response(status.as_u16(), &body);
            warn!("{} {url} answered {status}: {error}", request.method);
            Err(error)
        }
    }

    /// Fetches one page of a listing.
    pub async fn page<T: DeserializeOwned>(&self, path: &str, page: u64) -> Result<Page<T>, ApiError> {
        let request = ApiRequest::get(path)
            .query("page", page.max(1))
            .query("per_page", self.backend.per_page);
        let value = self.send(request).await?.into_value()?;
        Ok(Page::from_value(value)?)
    }

    /// Fetches a single record, with or without a `data` envelope.
    pub async fn record<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let value = self.send(ApiRequest::get(path)).await?.into_value()?;
        Ok(serde_json::from_value(unwrap_data(value))?)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for ApiClient<'r> {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let cookies = req.cookies();
        if cookies.token().is_none() {
            return Outcome::Failure((Status::Unauthorized, Error::UserNotLoggedIn));
        }
        let Some(backend) = req.rocket().state::<Backend>() else {
            return Outcome::Failure((Status::InternalServerError, Error::BackendNotFound));
        };

        Outcome::Success(ApiClient::new(backend, cookies))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::api::stub::Stub;

    struct Fixed(&'static str);

    impl TokenSource for Fixed {
        fn token(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    fn backend() -> Backend {
        // Port 9 (discard) is never contacted by these tests.
        Backend::new(reqwest::Client::new(), "http://127.0.0.1:9/", 10)
    }

    #[test]
    fn test_url_joining() {
        let backend = backend();
        assert_eq!(backend.url("/api/get_all_mycars"), "http://127.0.0.1:9/api/get_all_mycars");
        assert_eq!(backend.url("api/login"), "http://127.0.0.1:9/api/login");
    }

    #[test]
    fn test_decode_by_content_type() {
        assert_eq!(
            ApiResponse::decode("application/json; charset=utf-8", r#"{"ok":true}"#.into()),
            ApiResponse::Json(json!({"ok": true}))
        );
        assert_eq!(
            ApiResponse::decode("application/json", String::new()),
            ApiResponse::Json(Value::Null)
        );
        assert_eq!(
            ApiResponse::decode("text/html", "<p>done</p>".into()),
            ApiResponse::Text("<p>done</p>".into())
        );
    }

    #[test]
    fn test_response_messages() {
        let response = ApiResponse::Json(json!({"message": "Discount updated"}));
        assert_eq!(response.message().as_deref(), Some("Discount updated"));
        assert_eq!(ApiResponse::Json(json!({})).message(), None);
        assert_eq!(ApiResponse::Text("Saved".into()).message().as_deref(), Some("Saved"));
    }

    #[test]
    fn test_single_record_envelope() {
        assert_eq!(unwrap_data(json!({"data": {"id": 1}})), json!({"id": 1}));
        assert_eq!(unwrap_data(json!({"id": 1, "data": [1]})), json!({"id": 1, "data": [1]}));
    }

    #[rocket::async_test]
    async fn test_missing_token_never_reaches_backend() {
        let backend = backend();
        let client = ApiClient::new(&backend, &Anonymous);

        let result = client.send(ApiRequest::get("/api/admin/bookings")).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }

    /// A token that can change between calls, like the session cookie.
    struct Rotating(Mutex<Option<String>>);

    impl TokenSource for Rotating {
        fn token(&self) -> Option<String> {
            self.0.lock().unwrap().clone()
        }
    }

    #[rocket::async_test]
    async fn test_token_is_read_on_each_call() {
        let stub = Stub::serve(vec![
            (200, "application/json", "{}".into()),
            (200, "application/json", "{}".into()),
        ]);
        let backend = Backend::new(reqwest::Client::new(), &stub.url, 10);
        let tokens = Rotating(Mutex::new(Some("first".into())));
        let client = ApiClient::new(&backend, &tokens);

        client.send(ApiRequest::get("/api/admin/tickets")).await.unwrap();
        *tokens.0.lock().unwrap() = Some("second".into());
        client.send(ApiRequest::get("/api/admin/tickets")).await.unwrap();

        assert_eq!(stub.next().header("authorization"), Some("Bearer first"));
        assert_eq!(stub.next().header("authorization"), Some("Bearer second"));
    }

    #[rocket::async_test]
    async fn test_json_call_headers_and_body() {
        let stub = Stub::json(200, r#"{"message":"Discount updated"}"#);
        let backend = Backend::new(reqwest::Client::new(), &stub.url, 10);
        let tokens = Fixed("abc");
        let client = ApiClient::new(&backend, &tokens);

        let response = client
            .send(ApiRequest::post("/api/admin/discount/update/5").json(json!({"status": "active"})))
            .await
            .unwrap();
        assert_eq!(response.message().as_deref(), Some("Discount updated"));

        let request = stub.next();
        assert_eq!(request.request_line, "POST /api/admin/discount/update/5 HTTP/1.1");
        assert_eq!(request.header("accept"), Some("application/json"));
        assert_eq!(request.header("authorization"), Some("Bearer abc"));
        assert_eq!(request.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(body, json!({"status": "active"}));
    }

    #[rocket::async_test]
    async fn test_multipart_call_uses_generated_boundary() {
        let stub = Stub::json(200, "{}");
        let backend = Backend::new(reqwest::Client::new(), &stub.url, 10);
        let tokens = Fixed("abc");
        let client = ApiClient::new(&backend, &tokens);

        let form = multipart::Form::new().text("name", "Peugeot");
        client
            .send(ApiRequest::post("/api/admin/brands/store").multipart(form))
            .await
            .unwrap();

        let request = stub.next();
        assert_eq!(request.headers("content-type"), 1);
        let content_type = request.header("content-type").unwrap();
        let boundary = content_type
            .strip_prefix("multipart/form-data; boundary=")
            .expect("a multipart content type");
        let body = request.text();
        assert!(body.starts_with(&format!("--{boundary}")));
        assert!(body.contains("name=\"name\""));
        assert!(body.contains("Peugeot"));
        assert_eq!(request.header("accept"), Some("application/json"));
    }

    #[rocket::async_test]
    async fn test_plain_text_success_is_text() {
        let stub = Stub::serve(vec![(200, "text/plain", "Saved".into())]);
        let backend = Backend::new(reqwest::Client::new(), &stub.url, 10);
        let tokens = Fixed("abc");
        let client = ApiClient::new(&backend, &tokens);

        let response = client.send(ApiRequest::post("/api/admin/tickets/reply/2")).await.unwrap();
        assert_eq!(response, ApiResponse::Text("Saved".into()));
    }

    #[rocket::async_test]
    async fn test_expired_token_is_unauthorized() {
        let stub = Stub::json(401, r#"{"message":"Unauthenticated."}"#);
        let backend = Backend::new(reqwest::Client::new(), &stub.url, 10);
        let tokens = Fixed("stale");
        let client = ApiClient::new(&backend, &tokens);

        let result = client.page::<Value>("/api/get_all_mycars", 2).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert_eq!(
            stub.next().request_line,
            "GET /api/get_all_mycars?page=2&per_page=10 HTTP/1.1"
        );
    }
}
