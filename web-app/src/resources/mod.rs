//! One module per backend resource. Each lists a page of records in the
//! shared table and forwards the operator's actions to the backend, reporting
//! the outcome as a flash message on the page the action came from.

use rocket::{
    response::{Flash, Redirect},
    Route,
};
use shared::status::{StatusName, Transition};

use crate::{
    api::{ApiError, ApiResponse},
    error::Error,
};

mod bookings;
mod brands;
mod cars;
mod chat;
mod contracts;
mod discounts;
mod stations;
mod tickets;
mod withdrawals;

pub use self::bookings::BOOKINGS;
pub use self::cars::CARS;
pub use self::tickets::TICKETS;
pub use self::withdrawals::WITHDRAWALS;

pub fn routes() -> Vec<Route> {
    [
        cars::routes(),
        brands::routes(),
        bookings::routes(),
        discounts::routes(),
        contracts::routes(),
        stations::routes(),
        tickets::routes(),
        withdrawals::routes(),
        chat::routes(),
    ]
    .concat()
}

/// Posted by every status button along with the status the row was rendered
/// with.
#[derive(Debug, FromForm)]
pub struct TransitionForm<'r> {
    pub status: &'r str,
    pub page: Option<u64>,
    pub reason: Option<&'r str>,
    /// Set by buttons on a detail page, which return there instead of the list.
    pub detail: bool,
}

/// Posted by row buttons that only need to know where to return to.
#[derive(Debug, FromForm)]
pub struct ReturnForm {
    pub page: Option<u64>,
}

pub fn list_url(base: &str, page: Option<u64>) -> String {
    format!("{base}?page={}", page.unwrap_or(1).max(1))
}

/// Checks a requested action against the lifecycle. A refused action comes
/// back as the flash to show instead of calling the backend.
pub fn gate<A: Transition>(
    resource: &'static str,
    slug: &str,
    status: &str,
    back: &str,
) -> Result<Result<A, Flash<Redirect>>, Error> {
    let action = A::from_slug(slug).ok_or_else(|| Error::UnknownAction(slug.to_string()))?;
    let current = <A::Status as From<&str>>::from(status);

    if action.permitted_from(current) {
        Ok(Ok(action))
    } else {
        let refusal = Error::TransitionNotAllowed {
            resource,
            action: action.slug(),
            status: current.name(),
        };
        warn!("{refusal}");
        Ok(Err(Flash::error(Redirect::to(back.to_string()), refusal.to_string())))
    }
}

/// Turns the result of a backend call into a flash on `back`. An expired
/// session is not reported here; it propagates so the whole request is sent
/// to the login page.
pub fn report(
    result: Result<ApiResponse, ApiError>,
    back: String,
    done: &str,
) -> Result<Flash<Redirect>, Error> {
    settle(result, back.clone(), back, done)
}

/// Like [`report`], but a failure returns to `retry` (usually the form that
/// was submitted) instead of `next`.
pub fn settle(
    result: Result<ApiResponse, ApiError>,
    next: String,
    retry: String,
    done: &str,
) -> Result<Flash<Redirect>, Error> {
    match result {
        Ok(response) => {
            let message = response.message().unwrap_or_else(|| done.to_string());
            Ok(Flash::success(Redirect::to(next), message))
        }
        Err(ApiError::Unauthorized) => Err(ApiError::Unauthorized.into()),
        Err(e) => Ok(Flash::error(Redirect::to(retry), e.to_string())),
    }
}

/// A free-text form value, or `None` when left blank.
pub fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use shared::status::{DiscountAction, WithdrawalAction};

    use super::*;

    #[test]
    fn test_list_url_clamps_page() {
        assert_eq!(list_url("/cars", None), "/cars?page=1");
        assert_eq!(list_url("/cars", Some(0)), "/cars?page=1");
        assert_eq!(list_url("/cars", Some(4)), "/cars?page=4");
    }

    #[test]
    fn test_pending_discount_activation_is_refused() {
        let outcome = gate::<DiscountAction>("discount", "activate", "pending", "/discounts?page=1").unwrap();
        assert!(outcome.is_err());

        let outcome = gate::<DiscountAction>("discount", "activate", "inactive", "/discounts?page=1").unwrap();
        assert_eq!(outcome.ok(), Some(DiscountAction::Activate));
    }

    #[test]
    fn test_unknown_action_is_an_error() {
        let outcome = gate::<WithdrawalAction>("withdrawal", "pay", "pending", "/withdrawals");
        assert!(matches!(outcome, Err(Error::UnknownAction(ref slug)) if slug == "pay"));
    }

    #[test]
    fn test_expired_session_is_not_flashed() {
        match report(Err(ApiError::Unauthorized), "/cars".into(), "Done") {
            Err(error) => assert!(error.is_session_expired()),
            Ok(_) => panic!("an expired session must not become a flash"),
        }
    }

    #[test]
    fn test_rejections_are_flashed() {
        let rejected = ApiError::Rejected {
            status: 422,
            message: "code: taken".into(),
        };
        assert!(report(Err(rejected), "/discounts".into(), "Done").is_ok());
        assert!(report(Ok(ApiResponse::Json(json!({}))), "/discounts".into(), "Done").is_ok());
    }

    #[test]
    fn test_blank_values() {
        assert_eq!(non_empty(Some("  ")), None);
        assert_eq!(non_empty(Some(" why ")), Some("why"));
        assert_eq!(non_empty(None), None);
    }
}
