use rocket::{
    form::Form,
    response::{Flash, Redirect},
    Route,
};
use serde_json::{json, Value};
use shared::{
    data::Station,
    display::{or_na, NOT_AVAILABLE},
};

use super::{list_url, non_empty, report, settle, ReturnForm};
use crate::{
    api::{ApiClient, ApiRequest},
    error::Error,
    templates::{PageRenderer, Webpage},
    views::{Field, FormView, RowAction, Table},
};

const STATIONS: &str = "/api/admin/stations";

const COLUMNS: &[&str] = &["#", "Name", "Address", "Coordinates", "Active", "Actions"];

pub fn routes() -> Vec<Route> {
    routes![list, new, create, edit, update, delete]
}

#[derive(FromForm)]
struct StationForm<'r> {
    #[field(validate = len(1..))]
    name: &'r str,
    address: Option<&'r str>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    is_active: bool,
}

impl StationForm<'_> {
    fn body(&self) -> Value {
        json!({
            "name": self.name.trim(),
            "address": non_empty(self.address),
            "latitude": self.latitude,
            "longitude": self.longitude,
            "is_active": self.is_active,
        })
    }
}

fn coordinates(station: &Station) -> String {
    match (station.latitude, station.longitude) {
        (Some(lat), Some(lng)) => format!("{lat:.5}, {lng:.5}"),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn row(station: &Station, page: u64) -> (Vec<String>, Vec<RowAction>) {
    let active = match station.is_active {
        Some(true) => "Yes",
        Some(false) => "No",
        None => NOT_AVAILABLE,
    };

    let mut actions = Vec::new();
    if let Some(map) = station.map_url() {
        actions.push(RowAction::link("Map", map));
    }
    actions.push(RowAction::link("Edit", format!("/stations/{}/edit", station.id)));
    actions.push(
        RowAction::post("Delete", format!("/stations/{}/delete", station.id))
            .field("page", page)
            .confirm("Delete this station?"),
    );

    (
        vec![
            or_na(station.name.as_deref()),
            or_na(station.address.as_deref()),
            coordinates(station),
            active.to_string(),
        ],
        actions,
    )
}

fn form(title: &str, action: String, station: Option<&Station>) -> FormView {
    FormView {
        title: title.to_string(),
        action,
        back: "/stations".into(),
        multipart: false,
        fields: vec![
            Field::text("name", "Name", station.and_then(|s| s.name.as_deref())).required(),
            Field::textarea("address", "Address", station.and_then(|s| s.address.as_deref())),
            Field::number("latitude", "Latitude", station.and_then(|s| s.latitude)),
            Field::number("longitude", "Longitude", station.and_then(|s| s.longitude)),
            Field::checkbox(
                "is_active",
                "Active",
                station.map_or(true, |s| s.is_active.unwrap_or(false)),
            ),
        ],
    }
}

#[get("/stations?<page>")]
async fn list(
    page: Option<u64>,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let stations = client.page::<Station>(STATIONS, page.unwrap_or(1)).await?;
    let current = stations.current_page;
    let table = Table::build("Stations", "/stations", COLUMNS, &stations, |station| row(station, current))
        .with_create("/stations/new");
    renderer.table(&table).await
}

#[get("/stations/new")]
async fn new(_client: ApiClient<'_>, mut renderer: PageRenderer<'_>) -> Result<Webpage, Error> {
    renderer.form(&form("New station", "/stations".into(), None)).await
}

#[post("/stations", data = "<form>")]
async fn create(form: Form<StationForm<'_>>, client: ApiClient<'_>) -> Result<Flash<Redirect>, Error> {
    let request = ApiRequest::post(format!("{STATIONS}/store")).json(form.body());
    settle(client.send(request).await, "/stations".into(), "/stations/new".into(), "Station created.")
}

#[get("/stations/<id>/edit")]
async fn edit(
    id: i64,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let station = client.record::<Station>(&format!("{STATIONS}/{id}")).await?;
    renderer
        .form(&form("Edit station", format!("/stations/{id}"), Some(&station)))
        .await
}

#[post("/stations/<id>", data = "<form>")]
async fn update(
    id: i64,
    form: Form<StationForm<'_>>,
    client: ApiClient<'_>,
) -> Result<Flash<Redirect>, Error> {
    let request = ApiRequest::post(format!("{STATIONS}/update/{id}")).json(form.body());
    settle(
        client.send(request).await,
        "/stations".into(),
        format!("/stations/{id}/edit"),
        "Station updated.",
    )
}

#[post("/stations/<id>/delete", data = "<form>")]
async fn delete(
    id: i64,
    form: Form<ReturnForm>,
    client: ApiClient<'_>,
) -> Result<Flash<Redirect>, Error> {
    let request = ApiRequest::delete(format!("{STATIONS}/delete/{id}"));
    report(client.send(request).await, list_url("/stations", form.page), "Station deleted.")
}
