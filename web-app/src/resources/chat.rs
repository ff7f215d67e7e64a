//! Conversations between customers and the support team.
//!
//! The page lists the conversations and the messages of the selected one. The
//! browser then polls `/chat/<id>/messages?after=<last id>` for newer messages.

use rocket::{
    form::Form,
    response::{Flash, Redirect},
    serde::json::Json,
    Route,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use shared::{
    data::{ChatMessage, Conversation, UserRef},
    display::or_na,
    pagination::Page,
};

use super::report;
use crate::{
    api::{ApiClient, ApiError, ApiRequest},
    error::Error,
    templates::{PageRenderer, Webpage},
    views::{ChatView, ConversationItem, ThreadEntry},
};

const CONVERSATIONS: &str = "/api/admin/chat/conversations";
const MESSAGES: &str = "/api/admin/chat/messages";
const SEND: &str = "/api/admin/chat/send";

pub fn routes() -> Vec<Route> {
    routes![index, send, poll]
}

#[derive(FromForm)]
struct MessageForm<'r> {
    #[field(validate = len(1..))]
    message: &'r str,
}

/// Every record of an unpaginated listing.
async fn all<T: DeserializeOwned>(client: &ApiClient<'_>, path: &str) -> Result<Vec<T>, ApiError> {
    let value = client.send(ApiRequest::get(path)).await?.into_value()?;
    Ok(Page::from_value(value)?.data)
}

fn entry(message: &ChatMessage) -> ThreadEntry {
    let from_admin = message.is_admin.unwrap_or(false);
    ThreadEntry {
        id: message.id,
        author: match (&message.sender, from_admin) {
            (None, true) => "Support".to_string(),
            (sender, _) => UserRef::display(sender.as_ref()),
        },
        body: or_na(message.body.as_deref()),
        at: or_na(message.created_at.as_deref()),
        from_admin,
    }
}

/// Messages newer than `after`, in the order they were sent.
fn newer(messages: &[ChatMessage], after: i64) -> Vec<ThreadEntry> {
    let mut entries: Vec<ThreadEntry> = messages
        .iter()
        .filter(|message| message.id > after)
        .map(entry)
        .collect();
    entries.sort_by_key(|entry| entry.id);
    entries
}

fn conversation_item(conversation: &Conversation, active: Option<i64>) -> ConversationItem {
    ConversationItem {
        id: conversation.id,
        name: UserRef::display(conversation.user.as_ref()),
        last_message: conversation.last_message.clone().unwrap_or_default(),
        unread: conversation.unread_count.unwrap_or(0),
        active: Some(conversation.id) == active,
    }
}

#[get("/chat?<conversation>")]
async fn index(
    conversation: Option<i64>,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let conversations = all::<Conversation>(&client, CONVERSATIONS).await?;
    let messages = match conversation {
        Some(id) => newer(&all::<ChatMessage>(&client, &format!("{MESSAGES}/{id}")).await?, 0),
        None => Vec::new(),
    };

    let chat = ChatView {
        conversations: conversations
            .iter()
            .map(|item| conversation_item(item, conversation))
            .collect(),
        active: conversation,
        last_id: messages.last().map_or(0, |message| message.id),
        messages,
    };
    renderer.chat(&chat).await
}

#[post("/chat/<id>", data = "<form>")]
async fn send(
    id: i64,
    form: Form<MessageForm<'_>>,
    client: ApiClient<'_>,
) -> Result<Flash<Redirect>, Error> {
    let request = ApiRequest::post(SEND).json(json!({
        "conversation_id": id,
        "message": form.message.trim(),
    }));
    report(client.send(request).await, format!("/chat?conversation={id}"), "Message sent.")
}

#[get("/chat/<id>/messages?<after>")]
async fn poll(id: i64, after: Option<i64>, client: ApiClient<'_>) -> Result<Json<Vec<ThreadEntry>>, Error> {
    let messages = all::<ChatMessage>(&client, &format!("{MESSAGES}/{id}")).await?;
    Ok(Json(newer(&messages, after.unwrap_or(0))))
}
