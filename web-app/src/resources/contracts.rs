use rocket::Route;
use shared::{
    data::{CarRef, Contract, UserRef},
    display::{amount, date, describe_fees, or_na, NOT_AVAILABLE},
};

use crate::{
    api::ApiClient,
    error::Error,
    templates::{PageRenderer, Webpage},
    views::{DetailField, DetailView, FeeSummary, RowAction, Table},
};

const CONTRACTS: &str = "/api/admin/contracts";

const COLUMNS: &[&str] = &["#", "Booking", "Customer", "Car", "From", "To", "Fees", "Total", "Actions"];

pub fn routes() -> Vec<Route> {
    routes![list, show]
}

fn booking(contract: &Contract) -> String {
    contract
        .booking_id
        .map_or_else(|| NOT_AVAILABLE.to_string(), |id| format!("#{id}"))
}

fn row(contract: &Contract) -> (Vec<String>, Vec<RowAction>) {
    (
        vec![
            booking(contract),
            UserRef::display(contract.user.as_ref()),
            CarRef::display(contract.car.as_ref()),
            date(contract.start_date.as_deref()),
            date(contract.end_date.as_deref()),
            describe_fees(&contract.fees()),
            amount(contract.total_amount),
        ],
        vec![RowAction::link("View", format!("/contracts/{}", contract.id))],
    )
}

fn detail(contract: &Contract) -> DetailView {
    let mut view = DetailView::new(
        format!("Contract #{}", contract.id),
        "/contracts",
        vec![
            DetailField::new("Booking", booking(contract)),
            DetailField::new("Customer", UserRef::display(contract.user.as_ref())),
            DetailField::new(
                "Email",
                or_na(contract.user.as_ref().and_then(|user| user.email.as_deref())),
            ),
            DetailField::new("Car", CarRef::display(contract.car.as_ref())),
            DetailField::new(
                "Plate",
                or_na(contract.car.as_ref().and_then(|car| car.plate_number.as_deref())),
            ),
            DetailField::new("From", date(contract.start_date.as_deref())),
            DetailField::new("To", date(contract.end_date.as_deref())),
            DetailField::new("Signed", date(contract.signed_at.as_deref())),
            DetailField::new("Total", amount(contract.total_amount)),
            DetailField::link("Document", or_na(contract.file_url.as_deref()), contract.file_url.clone()),
        ],
    );

    let fees = contract.fees();
    if !fees.is_empty() {
        view.fees = Some(FeeSummary::new(&fees));
    }
    view
}

#[get("/contracts?<page>")]
async fn list(
    page: Option<u64>,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let contracts = client.page::<Contract>(CONTRACTS, page.unwrap_or(1)).await?;
    let table = Table::build("Contracts", "/contracts", COLUMNS, &contracts, row);
    renderer.table(&table).await
}

#[get("/contracts/<id>")]
async fn show(
    id: i64,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let contract = client.record::<Contract>(&format!("{CONTRACTS}/{id}")).await?;
    renderer.detail(&detail(&contract)).await
}
