use rocket::{
    form::Form,
    response::{Flash, Redirect},
    Route,
};
use serde_json::json;
use shared::{
    data::{UserRef, Withdrawal},
    display::{amount, date, or_na},
    status::{Transition, WithdrawalAction},
};

use super::{gate, list_url, non_empty, report, TransitionForm};
use crate::{
    api::{ApiClient, ApiRequest},
    error::Error,
    templates::{PageRenderer, Webpage},
    views::{RowAction, Table},
};

pub const WITHDRAWALS: &str = "/api/admin/wallet/withdrawals";

const COLUMNS: &[&str] = &["#", "User", "Amount", "Account", "Requested", "Status", "Note", "Actions"];

pub fn routes() -> Vec<Route> {
    routes![list, transition]
}

fn row(withdrawal: &Withdrawal, page: u64) -> (Vec<String>, Vec<RowAction>) {
    let actions: Vec<RowAction> = RowAction::transitions::<WithdrawalAction>("/withdrawals", withdrawal.id, withdrawal.status, page)
        .into_iter()
        .map(|action| {
            if action.url.ends_with("/reject") {
                action.prompt("reason")
            } else {
                action.confirm("Approve this withdrawal?")
            }
        })
        .collect();

    (
        vec![
            UserRef::display(withdrawal.user.as_ref()),
            amount(withdrawal.amount),
            or_na(withdrawal.bank_account.as_deref()),
            date(withdrawal.created_at.as_deref()),
            withdrawal.status.as_str().to_string(),
            or_na(withdrawal.reason.as_deref()),
        ],
        actions,
    )
}

#[get("/withdrawals?<page>")]
async fn list(
    page: Option<u64>,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let withdrawals = client.page::<Withdrawal>(WITHDRAWALS, page.unwrap_or(1)).await?;
    let current = withdrawals.current_page;
    let table = Table::build("Withdrawals", "/withdrawals", COLUMNS, &withdrawals, |withdrawal| {
        row(withdrawal, current)
    });
    renderer.table(&table).await
}

#[post("/withdrawals/<id>/<action>", data = "<form>")]
async fn transition(
    id: i64,
    action: &str,
    form: Form<TransitionForm<'_>>,
    client: ApiClient<'_>,
) -> Result<Flash<Redirect>, Error> {
    let back = list_url("/withdrawals", form.page);
    let action = match gate::<WithdrawalAction>("withdrawal", action, form.status, &back)? {
        Ok(action) => action,
        Err(refusal) => return Ok(refusal),
    };

    let request = match action {
        WithdrawalAction::Approve => ApiRequest::post(format!("{WITHDRAWALS}/approve/{id}")),
        WithdrawalAction::Reject => {
            let request = ApiRequest::post(format!("{WITHDRAWALS}/reject/{id}"));
            match non_empty(form.reason) {
                Some(reason) => request.json(json!({ "reason": reason })),
                None => request,
            }
        }
    };
    report(client.send(request).await, back, &format!("Withdrawal {}.", action.target()))
}
