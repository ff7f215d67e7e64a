use rocket::{
    fairing::{self, Fairing, Info, Kind},
    form::Form,
    http::{Cookie, CookieJar, SameSite},
    response::Redirect,
    Build, Rocket, State,
};
use serde_json::{json, Value};

use crate::{
    api::{Anonymous, ApiClient, ApiError, ApiRequest, Backend},
    error::Error,
    templates::{PageRenderer, Webpage},
};

pub const TOKEN_COOKIE: &str = "AdminToken";
pub const NAME_COOKIE: &str = "AdminName";

pub struct Authentication {}

impl Authentication {
    pub(crate) fn fairing() -> Self {
        Self {}
    }
}

#[rocket::async_trait]
impl Fairing for Authentication {
    fn info(&self) -> Info {
        Info {
            name: "Authentication",
            kind: Kind::Ignite | Kind::Singleton,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> fairing::Result {
        Ok(rocket.mount("/account", routes![login_get, login_post, logout]))
    }
}

#[derive(FromForm)]
struct LoginForm<'r> {
    email: &'r str,
    password: &'r str,
}

/// Removes every trace of the admin's session.
pub fn forget(cookies: &CookieJar<'_>) {
    cookies.remove(Cookie::named(TOKEN_COOKIE));
    cookies.remove(Cookie::named(NAME_COOKIE));
}

/// The first non-empty string found at one of `pointers`.
fn first_text(answer: &Value, pointers: &[&str]) -> Option<String> {
    pointers
        .iter()
        .filter_map(|pointer| answer.pointer(pointer).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// Looks for the bearer token in the login answer.
fn find_token(answer: &Value) -> Option<String> {
    first_text(answer, &["/token", "/access_token", "/data/token", "/data/access_token"])
}

fn find_name(answer: &Value) -> Option<String> {
    first_text(answer, &["/user/name", "/data/user/name", "/name"])
}

#[get("/login")]
async fn login_get(mut renderer: PageRenderer<'_>) -> Result<Webpage, Error> {
    renderer.login(None).await
}

#[post("/login", data = "<form>")]
async fn login_post(
    form: Form<LoginForm<'_>>,
    backend: &State<Backend>,
    cookies: &CookieJar<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Result<Redirect, Webpage>, Error> {
    let client = ApiClient::new(backend, &Anonymous);
    let request = ApiRequest::post("/api/login")
        .anonymous()
        .json(json!({ "email": form.email, "password": form.password }));

    let answer = match client.send(request).await.and_then(|answer| answer.into_value()) {
        Ok(answer) => answer,
        Err(ApiError::Unauthorized) => {
            let errors = vec!["These credentials do not match our records.".to_string()];
            return Ok(Err(renderer.login(Some(errors)).await?));
        }
        Err(e) => return Ok(Err(renderer.login(Some(vec![e.to_string()])).await?)),
    };

    let Some(token) = find_token(&answer) else {
        warn!("Login answer did not contain a token");
        let errors = vec!["The backend did not return a session token.".to_string()];
        return Ok(Err(renderer.login(Some(errors)).await?));
    };

    cookies.add(
        Cookie::build(TOKEN_COOKIE, token)
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish(),
    );
    if let Some(name) = find_name(&answer) {
        cookies.add(Cookie::build(NAME_COOKIE, name).same_site(SameSite::Lax).finish());
    }

    Ok(Ok(Redirect::to(uri!("/"))))
}

#[post("/logout")]
async fn logout(client: ApiClient<'_>, cookies: &CookieJar<'_>) -> Redirect {
    if let Err(e) = client.send(ApiRequest::post("/api/logout")).await {
        warn!("Backend logout failed: {e}");
    }
    forget(cookies);
    Redirect::to(uri!("/account/login"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_token_locations() {
        assert_eq!(find_token(&json!({"token": "a"})).as_deref(), Some("a"));
        assert_eq!(find_token(&json!({"access_token": "b"})).as_deref(), Some("b"));
        assert_eq!(find_token(&json!({"data": {"token": "c"}})).as_deref(), Some("c"));
        assert_eq!(find_token(&json!({"data": {"token": ""}})), None);
        assert_eq!(find_token(&json!({"message": "ok"})), None);
        assert_eq!(
            find_token(&json!({"token": "", "data": {"token": "x"}})).as_deref(),
            Some("x")
        );
    }

    #[test]
    fn test_admin_name() {
        assert_eq!(
            find_name(&json!({"data": {"user": {"name": "Grace"}}})).as_deref(),
            Some("Grace")
        );
        assert_eq!(find_name(&json!({"token": "x"})), None);
    }
}
