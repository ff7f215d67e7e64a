use rocket::{
    form::Form,
    response::{Flash, Redirect},
    Route,
};
use serde_json::json;
use shared::{
    data::{Booking, CarRef, UserRef},
    display::{amount, date, describe_fees},
    status::{BookingAction, Transition},
};

use super::{gate, list_url, report, TransitionForm};
use crate::{
    api::{ApiClient, ApiRequest},
    error::Error,
    templates::{PageRenderer, Webpage},
    views::{RowAction, Table},
};

pub const BOOKINGS: &str = "/api/admin/bookings";

const COLUMNS: &[&str] = &["#", "Car", "Customer", "From", "To", "Fees", "Total", "Status", "Actions"];

pub fn routes() -> Vec<Route> {
    routes![list, transition]
}

fn row(booking: &Booking, page: u64) -> (Vec<String>, Vec<RowAction>) {
    (
        vec![
            CarRef::display(booking.car.as_ref()),
            UserRef::display(booking.user.as_ref()),
            date(booking.start_date.as_deref()),
            date(booking.end_date.as_deref()),
            describe_fees(&booking.fees()),
            amount(booking.total_price),
            booking.status.as_str().to_string(),
        ],
        RowAction::transitions::<BookingAction>("/bookings", booking.id, booking.status, page),
    )
}

#[get("/bookings?<page>")]
async fn list(
    page: Option<u64>,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let bookings = client.page::<Booking>(BOOKINGS, page.unwrap_or(1)).await?;
    let current = bookings.current_page;
    let table = Table::build("Bookings", "/bookings", COLUMNS, &bookings, |booking| row(booking, current));
    renderer.table(&table).await
}

#[post("/bookings/<id>/<action>", data = "<form>")]
async fn transition(
    id: i64,
    action: &str,
    form: Form<TransitionForm<'_>>,
    client: ApiClient<'_>,
) -> Result<Flash<Redirect>, Error> {
    let back = list_url("/bookings", form.page);
    let action = match gate::<BookingAction>("booking", action, form.status, &back)? {
        Ok(action) => action,
        Err(refusal) => return Ok(refusal),
    };

    let request = ApiRequest::post(format!("{BOOKINGS}/update_status/{id}"))
        .json(json!({ "status": action.target() }));
    report(client.send(request).await, back, &format!("Booking {}.", action.target()))
}
