use rocket::{
    form::Form,
    response::{Flash, Redirect},
    Route,
};
use serde_json::json;
use shared::{
    data::{Car, UserRef},
    display::{amount, or_na},
    status::{CarAction, Transition},
};

use super::{gate, list_url, report, TransitionForm};
use crate::{
    api::{ApiClient, ApiRequest},
    error::Error,
    templates::{PageRenderer, Webpage},
    views::{RowAction, Table},
};

pub const CARS: &str = "/api/get_all_mycars";

const COLUMNS: &[&str] = &["#", "Name", "Brand", "Owner", "Plate", "Price/day", "Status", "Actions"];

pub fn routes() -> Vec<Route> {
    routes![list, transition]
}

fn row(car: &Car, page: u64) -> (Vec<String>, Vec<RowAction>) {
    let name = match (car.name.as_deref(), car.model.as_deref()) {
        (Some(name), Some(model)) if !model.is_empty() => format!("{name} {model}"),
        (name, model) => or_na(name.or(model)),
    };

    (
        vec![
            name,
            or_na(car.brand.as_ref().and_then(|brand| brand.name.as_deref())),
            UserRef::display(car.owner.as_ref()),
            or_na(car.plate_number.as_deref()),
            amount(car.price_per_day),
            car.status.as_str().to_string(),
        ],
        RowAction::transitions::<CarAction>("/cars", car.id, car.status, page),
    )
}

#[get("/cars?<page>")]
async fn list(
    page: Option<u64>,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let cars = client.page::<Car>(CARS, page.unwrap_or(1)).await?;
    let current = cars.current_page;
    let table = Table::build("Cars", "/cars", COLUMNS, &cars, |car| row(car, current));
    renderer.table(&table).await
}

#[post("/cars/<id>/<action>", data = "<form>")]
async fn transition(
    id: i64,
    action: &str,
    form: Form<TransitionForm<'_>>,
    client: ApiClient<'_>,
) -> Result<Flash<Redirect>, Error> {
    let back = list_url("/cars", form.page);
    let action = match gate::<CarAction>("car", action, form.status, &back)? {
        Ok(action) => action,
        Err(refusal) => return Ok(refusal),
    };

    let request = ApiRequest::post(format!("/api/admin/cars/update_car_status/{id}"))
        .json(json!({ "status": action.target() }));
    report(client.send(request).await, back, &format!("Car {}.", action.target()))
}
