use rocket::{
    form::Form,
    response::{Flash, Redirect},
    Route,
};
use serde_json::json;
use shared::{
    data::{Ticket, UserRef},
    display::{date, or_na},
    status::{TicketAction, Transition},
};

use super::{gate, list_url, report, TransitionForm};
use crate::{
    api::{ApiClient, ApiRequest},
    error::Error,
    templates::{PageRenderer, Webpage},
    views::{DetailField, DetailView, RowAction, Table, ThreadEntry},
};

pub const TICKETS: &str = "/api/admin/tickets";

const COLUMNS: &[&str] = &["#", "Subject", "User", "Opened", "Replies", "Status", "Actions"];

pub fn routes() -> Vec<Route> {
    routes![list, show, reply, transition]
}

#[derive(FromForm)]
struct ReplyForm<'r> {
    #[field(validate = len(1..))]
    message: &'r str,
}

fn row(ticket: &Ticket, page: u64) -> (Vec<String>, Vec<RowAction>) {
    let mut actions = vec![RowAction::link("View", format!("/tickets/{}", ticket.id))];
    actions.extend(RowAction::transitions::<TicketAction>("/tickets", ticket.id, ticket.status, page));

    (
        vec![
            or_na(ticket.subject.as_deref()),
            UserRef::display(ticket.user.as_ref()),
            date(ticket.created_at.as_deref()),
            ticket.replies.len().to_string(),
            ticket.status.as_str().to_string(),
        ],
        actions,
    )
}

/// The opening message followed by every reply, oldest first.
fn thread(ticket: &Ticket) -> Vec<ThreadEntry> {
    let opening = ThreadEntry {
        id: 0,
        author: UserRef::display(ticket.user.as_ref()),
        body: or_na(ticket.message.as_deref()),
        at: or_na(ticket.created_at.as_deref()),
        from_admin: false,
    };

    let replies = ticket.replies.iter().enumerate().map(|(index, reply)| {
        let from_admin = reply.is_admin.unwrap_or(false);
        ThreadEntry {
            id: reply.id.unwrap_or(index as i64 + 1),
            author: if from_admin && reply.user.is_none() {
                "Support".to_string()
            } else {
                UserRef::display(reply.user.as_ref())
            },
            body: or_na(reply.message.as_deref()),
            at: or_na(reply.created_at.as_deref()),
            from_admin,
        }
    });

    std::iter::once(opening).chain(replies).collect()
}

fn detail(ticket: &Ticket) -> DetailView {
    let mut view = DetailView::new(
        format!("Ticket #{}: {}", ticket.id, or_na(ticket.subject.as_deref())),
        "/tickets",
        vec![
            DetailField::new("User", UserRef::display(ticket.user.as_ref())),
            DetailField::new(
                "Email",
                or_na(ticket.user.as_ref().and_then(|user| user.email.as_deref())),
            ),
            DetailField::new("Status", ticket.status.as_str().to_string()),
            DetailField::new("Opened", date(ticket.created_at.as_deref())),
        ],
    );
    view.thread = thread(ticket);
    view.actions = RowAction::transitions::<TicketAction>("/tickets", ticket.id, ticket.status, 1)
        .into_iter()
        .map(|action| action.field("detail", "true"))
        .collect();
    if TicketAction::Close.permitted_from(ticket.status) {
        view.reply = Some(format!("/tickets/{}/reply", ticket.id));
    }
    view
}

#[get("/tickets?<page>")]
async fn list(
    page: Option<u64>,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let tickets = client.page::<Ticket>(TICKETS, page.unwrap_or(1)).await?;
    let current = tickets.current_page;
    let table = Table::build("Tickets", "/tickets", COLUMNS, &tickets, |ticket| row(ticket, current));
    renderer.table(&table).await
}

#[get("/tickets/<id>")]
async fn show(
    id: i64,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let ticket = client.record::<Ticket>(&format!("{TICKETS}/{id}")).await?;
    renderer.detail(&detail(&ticket)).await
}

#[post("/tickets/<id>/reply", data = "<form>", rank = 1)]
async fn reply(
    id: i64,
    form: Form<ReplyForm<'_>>,
    client: ApiClient<'_>,
) -> Result<Flash<Redirect>, Error> {
    let request = ApiRequest::post(format!("{TICKETS}/reply/{id}"))
        .json(json!({ "message": form.message.trim() }));
    report(client.send(request).await, format!("/tickets/{id}"), "Reply sent.")
}

#[post("/tickets/<id>/<action>", data = "<form>", rank = 2)]
async fn transition(
    id: i64,
    action: &str,
    form: Form<TransitionForm<'_>>,
    client: ApiClient<'_>,
) -> Result<Flash<Redirect>, Error> {
    let back = if form.detail {
        format!("/tickets/{id}")
    } else {
        list_url("/tickets", form.page)
    };
    let action = match gate::<TicketAction>("ticket", action, form.status, &back)? {
        Ok(action) => action,
        Err(refusal) => return Ok(refusal),
    };

    let request = ApiRequest::post(format!("{TICKETS}/update_status/{id}"))
        .json(json!({ "status": action.target() }));
    report(client.send(request).await, back, &format!("Ticket {}.", action.target()))
}
