#![allow(clippy::no_effect_underscore_binding)]
use api::{ApiClient, BackendFairing};
use authentication::Authentication;
use rocket::{
    futures::future::try_join4,
    response::{
        content::{RawCss, RawJavaScript},
        Redirect,
    },
};
use serde_json::Value;
use templates::{TemplateFairing, Webpage};
use views::StatCard;

use error::Error;
use resources::{BOOKINGS, CARS, TICKETS, WITHDRAWALS};

use crate::templates::PageRenderer;

mod api;
mod authentication;
mod config;
mod error;
mod fragments;
mod resources;
mod templates;
mod views;

#[macro_use]
extern crate rocket;

#[get("/style.css")]
async fn get_style(renderer: PageRenderer<'_>) -> RawCss<String> {
    renderer.style().await
}

#[get("/admin.js")]
async fn get_script(renderer: PageRenderer<'_>) -> RawJavaScript<String> {
    renderer.script().await
}

/// Totals of the lists that need an operator's attention.
#[get("/")]
async fn index(client: ApiClient<'_>, mut renderer: PageRenderer<'_>) -> Result<Webpage, Error> {
    let (cars, bookings, tickets, withdrawals) = try_join4(
        client.page::<Value>(CARS, 1),
        client.page::<Value>(BOOKINGS, 1),
        client.page::<Value>(TICKETS, 1),
        client.page::<Value>(WITHDRAWALS, 1),
    )
    .await?;

    let cards = [
        StatCard {
            label: "Cars",
            total: cars.total(),
            link: "/cars",
        },
        StatCard {
            label: "Bookings",
            total: bookings.total(),
            link: "/bookings",
        },
        StatCard {
            label: "Tickets",
            total: tickets.total(),
            link: "/tickets",
        },
        StatCard {
            label: "Withdrawals",
            total: withdrawals.total(),
            link: "/withdrawals",
        },
    ];
    renderer.index(&cards).await
}

#[catch(401)]
fn unauthorized() -> Redirect {
    Redirect::to(uri!("/account/login"))
}

#[launch]
fn rocket() -> _ {
    rocket::build()
        .attach(BackendFairing::fairing())
        .attach(TemplateFairing::fairing())
        .attach(Authentication::fairing())
        .register("/", catchers![unauthorized])
        .mount("/", routes![get_style, get_script, index])
        .mount("/", resources::routes())
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Cookie, Status},
        local::blocking::Client,
    };

    use super::rocket;
    use crate::{api::stub::Stub, authentication::TOKEN_COOKIE};

    fn client() -> Client {
        Client::tracked(rocket()).expect("valid rocket instance")
    }

    #[test]
    fn test_lists_require_a_session() {
        let client = client();
        for path in ["/", "/cars", "/discounts?page=2", "/tickets/4", "/chat"] {
            let response = client.get(path).dispatch();
            assert_eq!(response.status(), Status::SeeOther, "{path}");
            assert_eq!(response.headers().get_one("Location"), Some("/account/login"));
        }
    }

    #[test]
    fn test_actions_require_a_session() {
        let client = client();
        let response = client
            .post("/discounts/5/activate")
            .header(ContentType::Form)
            .body("status=inactive&page=1")
            .dispatch();

        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/account/login"));
    }

    #[test]
    fn test_login_page_renders() {
        let client = client();
        let response = client.get("/account/login").dispatch();

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().unwrap_or_default();
        assert!(body.contains("name=\"password\""));
        assert!(body.contains("/admin.js"));
    }

    #[test]
    fn test_assets_are_served() {
        let client = client();

        let response = client.get("/style.css").dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::CSS));

        let response = client.get("/admin.js").dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::JavaScript));
    }

    #[test]
    fn test_refused_transition_never_reaches_the_backend() {
        let client = client();
        let response = client
            .post("/discounts/5/activate")
            .cookie(Cookie::new(TOKEN_COOKIE, "token"))
            .header(ContentType::Form)
            .body("status=pending&page=3")
            .dispatch();

        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/discounts?page=3"));
    }

    #[test]
    fn test_expired_backend_session_logs_out() {
        let stub = Stub::json(401, r#"{"message":"Unauthenticated."}"#);
        let client = stub.console();
        let response = client
            .get("/cars")
            .cookie(Cookie::new(TOKEN_COOKIE, "stale"))
            .dispatch();

        assert_eq!(response.status(), Status::SeeOther);
        assert_eq!(response.headers().get_one("Location"), Some("/account/login"));
        assert_eq!(response.cookies().get(TOKEN_COOKIE).map(|cookie| cookie.value()), Some(""));
        assert_eq!(stub.next().header("authorization"), Some("Bearer stale"));
    }

    #[test]
    fn test_dashboard_counts_lists() {
        let page = r#"{"data":[],"current_page":1,"per_page":15,"total":7,"last_page":1}"#;
        let stub = Stub::serve(vec![(200, "application/json", page.to_string()); 4]);
        let client = stub.console();
        let response = client.get("/").cookie(Cookie::new(TOKEN_COOKIE, "token")).dispatch();

        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().unwrap_or_default();
        assert_eq!(body.matches(">7<").count(), 4);
    }
}
