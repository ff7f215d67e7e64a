use rocket::{
    form::Form,
    response::{Flash, Redirect},
    Route,
};
use serde_json::{json, Value};
use shared::{
    data::{CarRef, Discount},
    display::{date, or_na, NOT_AVAILABLE},
    status::{DiscountAction, Transition},
};
use time::Date;

use super::{gate, list_url, report, settle, ReturnForm, TransitionForm};
use crate::{
    api::{ApiClient, ApiRequest},
    error::Error,
    templates::{PageRenderer, Webpage},
    views::{Field, FormView, RowAction, Table},
};

const DISCOUNTS: &str = "/api/admin/discount";

const COLUMNS: &[&str] = &["#", "Code", "Percent", "Car", "Starts", "Ends", "Status", "Actions"];

pub fn routes() -> Vec<Route> {
    routes![list, new, create, edit, update, delete, transition]
}

#[derive(FromForm)]
struct DiscountForm<'r> {
    #[field(validate = len(1..))]
    code: &'r str,
    percentage: f64,
    start_date: Date,
    end_date: Date,
    car_id: Option<i64>,
}

impl DiscountForm<'_> {
    /// Rejects what the backend would reject anyway, without a round trip.
    fn problem(&self) -> Option<&'static str> {
        if !(0.0..=100.0).contains(&self.percentage) {
            Some("The percentage must be between 0 and 100.")
        } else if self.end_date < self.start_date {
            Some("The discount can not end before it starts.")
        } else {
            None
        }
    }

    fn body(&self) -> Value {
        json!({
            "code": self.code.trim(),
            "percentage": self.percentage,
            "start_date": self.start_date.to_string(),
            "end_date": self.end_date.to_string(),
            "car_id": self.car_id,
        })
    }
}

fn row(discount: &Discount, page: u64) -> (Vec<String>, Vec<RowAction>) {
    let percent = discount
        .percentage
        .map_or_else(|| NOT_AVAILABLE.to_string(), |percentage| format!("{percentage}%"));

    let mut actions = vec![
        RowAction::link("Edit", format!("/discounts/{}/edit", discount.id)),
        RowAction::post("Delete", format!("/discounts/{}/delete", discount.id))
            .field("page", page)
            .confirm("Delete this discount?"),
    ];
    actions.extend(RowAction::transitions::<DiscountAction>(
        "/discounts",
        discount.id,
        discount.status,
        page,
    ));

    (
        vec![
            or_na(discount.code.as_deref()),
            percent,
            CarRef::display(discount.car.as_ref()),
            date(discount.start_date.as_deref()),
            date(discount.end_date.as_deref()),
            discount.status.as_str().to_string(),
        ],
        actions,
    )
}

fn form(title: &str, action: String, discount: Option<&Discount>) -> FormView {
    FormView {
        title: title.to_string(),
        action,
        back: "/discounts".into(),
        multipart: false,
        fields: vec![
            Field::text("code", "Code", discount.and_then(|d| d.code.as_deref())).required(),
            Field::number("percentage", "Percentage", discount.and_then(|d| d.percentage)).required(),
            Field::date("start_date", "Starts", discount.and_then(|d| d.start_date.as_deref())).required(),
            Field::date("end_date", "Ends", discount.and_then(|d| d.end_date.as_deref())).required(),
            Field::number(
                "car_id",
                "Car id (empty for every car)",
                discount.and_then(|d| d.car.as_ref()?.id).map(|id| id as f64),
            ),
        ],
    }
}

#[get("/discounts?<page>")]
async fn list(
    page: Option<u64>,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let discounts = client.page::<Discount>(DISCOUNTS, page.unwrap_or(1)).await?;
    let current = discounts.current_page;
    let table = Table::build("Discounts", "/discounts", COLUMNS, &discounts, |discount| {
        row(discount, current)
    })
    .with_create("/discounts/new");
    renderer.table(&table).await
}

#[get("/discounts/new")]
async fn new(_client: ApiClient<'_>, mut renderer: PageRenderer<'_>) -> Result<Webpage, Error> {
    renderer.form(&form("New discount", "/discounts".into(), None)).await
}

#[post("/discounts", data = "<form>")]
async fn create(form: Form<DiscountForm<'_>>, client: ApiClient<'_>) -> Result<Flash<Redirect>, Error> {
    if let Some(problem) = form.problem() {
        return Ok(Flash::error(Redirect::to("/discounts/new"), problem));
    }
    let request = ApiRequest::post(format!("{DISCOUNTS}/store")).json(form.body());
    settle(
        client.send(request).await,
        "/discounts".into(),
        "/discounts/new".into(),
        "Discount created.",
    )
}

#[get("/discounts/<id>/edit")]
async fn edit(
    id: i64,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let discount = client.record::<Discount>(&format!("{DISCOUNTS}/{id}")).await?;
    renderer
        .form(&form("Edit discount", format!("/discounts/{id}"), Some(&discount)))
        .await
}

#[post("/discounts/<id>", data = "<form>")]
async fn update(
    id: i64,
    form: Form<DiscountForm<'_>>,
    client: ApiClient<'_>,
) -> Result<Flash<Redirect>, Error> {
    let retry = format!("/discounts/{id}/edit");
    if let Some(problem) = form.problem() {
        return Ok(Flash::error(Redirect::to(retry), problem));
    }
    let request = ApiRequest::post(format!("{DISCOUNTS}/update/{id}")).json(form.body());
    settle(client.send(request).await, "/discounts".into(), retry, "Discount updated.")
}

#[post("/discounts/<id>/delete", data = "<form>", rank = 1)]
async fn delete(
    id: i64,
    form: Form<ReturnForm>,
    client: ApiClient<'_>,
) -> Result<Flash<Redirect>, Error> {
    let request = ApiRequest::delete(format!("{DISCOUNTS}/delete/{id}"));
    report(client.send(request).await, list_url("/discounts", form.page), "Discount deleted.")
}

/// Status changes go through the regular update endpoint.
#[post("/discounts/<id>/<action>", data = "<form>", rank = 2)]
async fn transition(
    id: i64,
    action: &str,
    form: Form<TransitionForm<'_>>,
    client: ApiClient<'_>,
) -> Result<Flash<Redirect>, Error> {
    let back = list_url("/discounts", form.page);
    let action = match gate::<DiscountAction>("discount", action, form.status, &back)? {
        Ok(action) => action,
        Err(refusal) => return Ok(refusal),
    };

    let request = ApiRequest::post(format!("{DISCOUNTS}/update/{id}"))
        .json(json!({ "status": action.target() }));
    report(client.send(request).await, back, &format!("Discount {}.", action.target()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::Month;

    use super::*;

    fn june(day: u8) -> Date {
        Date::from_calendar_date(2024, Month::June, day).unwrap()
    }

    fn discount_form(percentage: f64, start_date: Date, end_date: Date) -> DiscountForm<'static> {
        DiscountForm {
            code: " SUMMER ",
            percentage,
            start_date,
            end_date,
            car_id: None,
        }
    }

    #[test]
    fn test_discount_form_checks() {
        assert_eq!(discount_form(15.0, june(1), june(30)).problem(), None);
        assert!(discount_form(120.0, june(1), june(30)).problem().is_some());
        assert!(discount_form(15.0, Date::from_calendar_date(2024, Month::July, 1).unwrap(), june(30)).problem().is_some());
    }

    #[test]
    fn test_discount_body() {
        let body = discount_form(15.0, june(1), june(30)).body();
        assert_eq!(
            body,
            json!({
                "code": "SUMMER",
                "percentage": 15.0,
                "start_date": "2024-06-01",
                "end_date": "2024-06-30",
                "car_id": null
            })
        );
    }

    #[test]
    fn test_pending_discount_row() {
        let discount: Discount = serde_json::from_value(json!({
            "id": 5,
            "code": "WELCOME",
            "percent": "10",
            "status": "pending"
        }))
        .unwrap();

        let (cells, actions) = row(&discount, 1);
        assert_eq!(cells[..3], ["WELCOME", "10%", "N/A"]);
        assert_eq!(actions.len(), 4);
        assert!(actions[..2].iter().all(|action| action.enabled));
        assert!(actions[2..].iter().all(|action| !action.enabled));
    }
}
