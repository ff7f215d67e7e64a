//! What the templates are fed: tables, forms and detail pages built from
//! backend records.

use serde::Serialize;
use shared::{
    display::{amount, fees_total, or_na, Fee},
    pagination::Page,
    status::{StatusName, Transition},
};

#[derive(Debug, Serialize)]
pub struct Table {
    pub title: String,
    pub base: String,
    pub columns: &'static [&'static str],
    pub rows: Vec<Row>,
    pub pager: Pager,
    pub create: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Row {
    pub number: u64,
    pub cells: Vec<String>,
    pub actions: Vec<RowAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Link,
    Post,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowAction {
    pub label: String,
    pub url: String,
    pub kind: ActionKind,
    pub enabled: bool,
    pub fields: Vec<(String, String)>,
    /// Name of a free-text input the operator fills in before posting.
    pub prompt: Option<String>,
    pub confirm: Option<String>,
}

impl RowAction {
    pub fn link(label: &str, url: String) -> Self {
        Self {
            label: label.to_string(),
            url,
            kind: ActionKind::Link,
            enabled: true,
            fields: Vec::new(),
            prompt: None,
            confirm: None,
        }
    }

    pub fn post(label: &str, url: String) -> Self {
        Self {
            kind: ActionKind::Post,
            ..Self::link(label, url)
        }
    }

    #[must_use]
    pub fn confirm(mut self, question: &str) -> Self {
        self.confirm = Some(question.to_string());
        self
    }

    #[must_use]
    pub fn field(mut self, name: &str, value: impl ToString) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    #[must_use]
    pub fn prompt(mut self, field: &str) -> Self {
        self.prompt = Some(field.to_string());
        self
    }

    /// One button per action of the lifecycle, disabled where the current
    /// status does not allow it.
    pub fn transitions<A: Transition>(base: &str, id: i64, status: A::Status, page: u64) -> Vec<Self> {
        A::all()
            .iter()
            .map(|action| {
                let mut button = Self::post(action.label(), format!("{base}/{id}/{}", action.slug()));
                button.enabled = action.permitted_from(status);
                button.fields = vec![
                    ("status".into(), status.name().into()),
                    ("page".into(), page.to_string()),
                ];
                button
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct Pager {
    pub current: u64,
    pub last: u64,
    pub total: u64,
    pub previous: Option<String>,
    pub next: Option<String>,
}

impl Table {
    pub fn build<T>(
        title: &str,
        base: &str,
        columns: &'static [&'static str],
        page: &Page<T>,
        mut row: impl FnMut(&T) -> (Vec<String>, Vec<RowAction>),
    ) -> Self {
        let rows = page
            .data
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let (cells, actions) = row(record);
                Row {
                    number: page.row_number(index),
                    cells,
                    actions,
                }
            })
            .collect();

        Self {
            title: title.to_string(),
            base: base.to_string(),
            columns,
            rows,
            pager: Pager {
                current: page.current_page,
                last: page.last_page.max(page.current_page),
                total: page.total(),
                previous: page.previous().map(|p| format!("{base}?page={p}")),
                next: page.next().map(|p| format!("{base}?page={p}")),
            },
            create: None,
        }
    }

    #[must_use]
    pub fn with_create(mut self, url: &str) -> Self {
        self.create = Some(url.to_string());
        self
    }
}

#[derive(Debug, Serialize)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: &'static str,
    pub value: String,
    pub required: bool,
    pub step: Option<&'static str>,
}

impl Field {
    fn new(kind: &'static str, name: &'static str, label: &'static str, value: String) -> Self {
        Self {
            name,
            label,
            kind,
            value,
            required: false,
            step: None,
        }
    }

    pub fn text(name: &'static str, label: &'static str, value: Option<&str>) -> Self {
        Self::new("text", name, label, value.unwrap_or_default().to_string())
    }

    pub fn number(name: &'static str, label: &'static str, value: Option<f64>) -> Self {
        let mut field = Self::new("number", name, label, value.map(|v| v.to_string()).unwrap_or_default());
        field.step = Some("any");
        field
    }

    pub fn date(name: &'static str, label: &'static str, value: Option<&str>) -> Self {
        let value = value
            .and_then(|value| value.split(['T', ' ']).next())
            .unwrap_or_default()
            .to_string();
        Self::new("date", name, label, value)
    }

    pub fn file(name: &'static str, label: &'static str) -> Self {
        Self::new("file", name, label, String::new())
    }

    pub fn checkbox(name: &'static str, label: &'static str, checked: bool) -> Self {
        Self::new("checkbox", name, label, if checked { "on".into() } else { String::new() })
    }

    pub fn textarea(name: &'static str, label: &'static str, value: Option<&str>) -> Self {
        Self::new("textarea", name, label, value.unwrap_or_default().to_string())
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Serialize)]
pub struct FormView {
    pub title: String,
    pub action: String,
    pub back: String,
    pub multipart: bool,
    pub fields: Vec<Field>,
}

#[derive(Debug, Serialize)]
pub struct DetailField {
    pub label: &'static str,
    pub value: String,
    pub link: Option<String>,
}

impl DetailField {
    pub fn new(label: &'static str, value: String) -> Self {
        Self { label, value, link: None }
    }

    /// A field linking to `link`. Only absolute `http` and `https` URLs
    /// become links.
    pub fn link(label: &'static str, value: String, link: Option<String>) -> Self {
        let link = link.filter(|url| {
            let url = url.trim_start().to_ascii_lowercase();
            url.starts_with("http://") || url.starts_with("https://")
        });
        Self { label, value, link }
    }
}

#[derive(Debug, Serialize)]
pub struct FeeSummary {
    pub lines: Vec<(String, String)>,
    pub total: String,
}

impl FeeSummary {
    pub fn new(fees: &[Fee]) -> Self {
        Self {
            lines: fees
                .iter()
                .map(|fee| (or_na(fee.name.as_deref()), amount(fee.amount)))
                .collect(),
            total: amount(Some(fees_total(fees))),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ThreadEntry {
    pub id: i64,
    pub author: String,
    pub body: String,
    pub at: String,
    pub from_admin: bool,
}

#[derive(Debug, Serialize)]
pub struct DetailView {
    pub title: String,
    pub back: String,
    pub fields: Vec<DetailField>,
    pub fees: Option<FeeSummary>,
    pub thread: Vec<ThreadEntry>,
    pub reply: Option<String>,
    pub actions: Vec<RowAction>,
}

impl DetailView {
    pub fn new(title: String, back: &str, fields: Vec<DetailField>) -> Self {
        Self {
            title,
            back: back.to_string(),
            fields,
            fees: None,
            thread: Vec::new(),
            reply: None,
            actions: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationItem {
    pub id: i64,
    pub name: String,
    pub last_message: String,
    pub unread: u64,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatView {
    pub conversations: Vec<ConversationItem>,
    pub active: Option<i64>,
    pub messages: Vec<ThreadEntry>,
    pub last_id: i64,
}

#[derive(Debug, Serialize)]
pub struct StatCard {
    pub label: &'static str,
    pub total: u64,
    pub link: &'static str,
}
