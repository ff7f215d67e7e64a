//! Page rendering.
//!
//! Templates, layout fragments and the static assets are embedded in the
//! binary. Setting `TEMPLATE_DIR` to a checkout of this crate loads them from
//! disk instead and mounts `/template/refresh` to reload them while the
//! console is running.

use std::{env, io, path::PathBuf};

use include_dir::{include_dir, Dir};
use rocket::{
    fairing::{self, Fairing, Info, Kind},
    http::Status,
    request::{FlashMessage, FromRequest, Outcome},
    response::{
        content::{RawCss, RawHtml, RawJavaScript},
        Responder,
    },
    tokio::{fs, sync::RwLock},
    Build, Request, Rocket, State,
};
use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use crate::{
    authentication::NAME_COOKIE,
    error::Error,
    fragments::{self, Fragments},
    views::{ChatView, DetailView, FormView, StatCard, Table},
};

pub(crate) static TEMPLATE_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");
static STYLE: &str = include_str!("../webroot/style.css");
static SCRIPT: &str = include_str!("../webroot/admin.js");

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Could not list the templates in '{0}'. {1}")]
    UnreadableDirectory(PathBuf, io::Error),
    #[error("Could not read '{0}'. {1}")]
    UnreadableFile(PathBuf, io::Error),
    #[error("A template is invalid. {0}")]
    Tera(#[from] tera::Error),
    #[error("Could not load the '{0}' fragment. {1}")]
    MissingFragment(String, String),
}

/// Where templates, fragments and assets are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Source {
    Embedded,
    Disk(PathBuf),
}

impl Source {
    fn from_env() -> Self {
        match env::var_os("TEMPLATE_DIR") {
            Some(path) if !path.is_empty() => Source::Disk(PathBuf::from(path)),
            _ => Source::Embedded,
        }
    }

    async fn tera(&self) -> Result<Tera, TemplateError> {
        let mut sources = Vec::new();
        match self {
            Source::Embedded => {
                for file in TEMPLATE_DIR.files() {
                    if let Some(stem) = file.path().file_stem() {
                        let text = String::from_utf8_lossy(file.contents()).into_owned();
                        sources.push((stem.to_string_lossy().into_owned(), text));
                    }
                }
            }
            Source::Disk(root) => {
                let dir = root.join("templates");
                let mut entries = fs::read_dir(&dir)
                    .await
                    .map_err(|e| TemplateError::UnreadableDirectory(dir.clone(), e))?;
                while let Some(entry) = entries
                    .next_entry()
                    .await
                    .map_err(|e| TemplateError::UnreadableDirectory(dir.clone(), e))?
                {
                    let path = entry.path();
                    if !path.is_file() {
                        continue;
                    }
                    if let Some(stem) = path.file_stem().map(|stem| stem.to_string_lossy().into_owned()) {
                        let text = fs::read_to_string(&path)
                            .await
                            .map_err(|e| TemplateError::UnreadableFile(path.clone(), e))?;
                        sources.push((stem, text));
                    }
                }
            }
        }

        let mut tera = Tera::default();
        // Templates are registered without an extension, so escape all of them.
        tera.autoescape_on(vec![""]);
        tera.add_raw_templates(sources)?;
        Ok(tera)
    }

    async fn fragments(&self) -> Result<Fragments, TemplateError> {
        match self {
            Source::Embedded => fragments::load_embedded(&TEMPLATE_DIR),
            Source::Disk(root) => fragments::load_from_disk(&root.join("templates")).await,
        }
    }

    async fn asset(&self, name: &str, embedded: &str) -> Result<String, TemplateError> {
        match self {
            Source::Embedded => Ok(embedded.to_string()),
            Source::Disk(root) => {
                let path = root.join("webroot").join(name);
                fs::read_to_string(&path)
                    .await
                    .map_err(|e| TemplateError::UnreadableFile(path, e))
            }
        }
    }
}

/// Everything a page is rendered from, replaced as a whole on refresh.
struct Bundle {
    tera: Tera,
    fragments: Fragments,
    style: String,
    script: String,
}

impl Bundle {
    async fn load(source: &Source) -> Result<Self, TemplateError> {
        Ok(Self {
            tera: source.tera().await?,
            fragments: source.fragments().await?,
            style: source.asset("style.css", STYLE).await?,
            script: source.asset("admin.js", SCRIPT).await?,
        })
    }
}

pub struct TemplateFairing;

impl TemplateFairing {
    pub fn fairing() -> Self {
        Self
    }
}

#[rocket::async_trait]
impl Fairing for TemplateFairing {
    fn info(&self) -> Info {
        Info {
            name: "Templates",
            kind: Kind::Ignite | Kind::Singleton,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> fairing::Result {
        let source = Source::from_env();
        let templates = match Templates::load(source.clone()).await {
            Ok(templates) => templates,
            Err(e) => {
                error!("Could not load the templates. {e}");
                return Err(rocket);
            }
        };

        let rocket = match source {
            Source::Disk(path) => {
                info!("Serving templates from {}", path.display());
                rocket.mount("/template", routes![refresh])
            }
            Source::Embedded => rocket,
        };
        Ok(rocket.manage(templates))
    }
}

#[get("/refresh")]
async fn refresh(templates: &State<Templates>) -> Result<(), Error> {
    templates.reload().await?;
    info!("Templates reloaded");
    Ok(())
}

/// A rendered HTML page.
pub struct Webpage(RawHtml<String>);

impl From<String> for Webpage {
    fn from(html: String) -> Self {
        Self(RawHtml(html))
    }
}

impl<'r> Responder<'r, 'static> for Webpage {
    fn respond_to(self, request: &'r Request<'_>) -> rocket::response::Result<'static> {
        self.0.respond_to(request)
    }
}

pub struct Templates {
    source: Source,
    bundle: RwLock<Bundle>,
}

impl Templates {
    async fn load(source: Source) -> Result<Self, TemplateError> {
        let bundle = RwLock::new(Bundle::load(&source).await?);
        Ok(Self { source, bundle })
    }

    async fn reload(&self) -> Result<(), TemplateError> {
        let fresh = Bundle::load(&self.source).await?;
        *self.bundle.write().await = fresh;
        Ok(())
    }
}

#[derive(Serialize)]
struct Toast<'a> {
    kind: &'a str,
    message: &'a str,
}

/// Request guard rendering the console's pages. It carries the signed in
/// admin's name and the pending flash message, if any.
pub struct PageRenderer<'r> {
    templates: &'r Templates,
    context: Context,
}

impl<'r> PageRenderer<'r> {
    pub async fn style(&self) -> RawCss<String> {
        RawCss(self.templates.bundle.read().await.style.clone())
    }

    pub async fn script(&self) -> RawJavaScript<String> {
        RawJavaScript(self.templates.bundle.read().await.script.clone())
    }

    async fn render(&mut self, template: &str) -> Result<Webpage, Error> {
        let bundle = self.templates.bundle.read().await;
        self.context.insert("fragments", &bundle.fragments);
        Ok(bundle.tera.render(template, &self.context)?.into())
    }

    pub async fn index(&mut self, cards: &[StatCard]) -> Result<Webpage, Error> {
        self.context.insert("cards", cards);
        self.render("index").await
    }

    pub async fn table(&mut self, table: &Table) -> Result<Webpage, Error> {
        self.context.insert("table", table);
        self.render("table").await
    }

    pub async fn form(&mut self, form: &FormView) -> Result<Webpage, Error> {
        self.context.insert("form", form);
        self.render("form").await
    }

    pub async fn detail(&mut self, detail: &DetailView) -> Result<Webpage, Error> {
        self.context.insert("detail", detail);
        self.render("detail").await
    }

    pub async fn chat(&mut self, chat: &ChatView) -> Result<Webpage, Error> {
        self.context.insert("chat", chat);
        self.render("chat").await
    }

    pub async fn login(&mut self, errors: Option<Vec<String>>) -> Result<Webpage, Error> {
        self.context.insert("errors", &errors.unwrap_or_default());
        self.render("login").await
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for PageRenderer<'r> {
    type Error = Error;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let templates = match req.guard::<&State<Templates>>().await {
            Outcome::Success(templates) => templates.inner(),
            Outcome::Failure(_) => {
                return Outcome::Failure((Status::InternalServerError, Error::TemplateNotFound))
            }
            Outcome::Forward(forward) => return Outcome::Forward(forward),
        };

        let mut context = Context::new();
        if let Some(name) = req.cookies().get(NAME_COOKIE) {
            context.insert("admin", name.value());
        }
        if let Outcome::Success(Some(flash)) = req.guard::<Option<FlashMessage<'_>>>().await {
            let toast = Toast {
                kind: flash.kind(),
                message: flash.message(),
            };
            context.insert("toast", &toast);
        }

        Outcome::Success(PageRenderer { templates, context })
    }
}
