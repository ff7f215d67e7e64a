use reqwest::multipart;
use rocket::{
    form::{self, error::ErrorKind, Form},
    fs::TempFile,
    response::{Flash, Redirect},
    tokio::fs,
    Route,
};
use shared::{
    data::Brand,
    display::{date, or_na, NOT_AVAILABLE},
};

use super::{list_url, report, settle, ReturnForm};
use crate::{
    api::{ApiClient, ApiRequest},
    error::Error,
    templates::{PageRenderer, Webpage},
    views::{Field, FormView, RowAction, Table},
};

const BRANDS: &str = "/api/admin/brands";

const COLUMNS: &[&str] = &["#", "Name", "Logo", "Cars", "Created", "Actions"];

pub fn routes() -> Vec<Route> {
    routes![list, new, create, edit, update, delete]
}

/// Brands are sent as multipart so a logo can travel with them.
#[derive(FromForm)]
struct BrandForm<'r> {
    #[field(validate = len(1..))]
    name: &'r str,
    logo: form::Result<'r, TempFile<'r>>,
}

impl BrandForm<'_> {
    /// The uploaded logo. An absent or empty file field means no new logo; a
    /// file that could not be received, such as one over the `file` limit, is
    /// an error.
    fn logo(&self) -> Result<Option<&TempFile<'_>>, String> {
        match &self.logo {
            Ok(file) if file.len() > 0 => Ok(Some(file)),
            Ok(_) => Ok(None),
            Err(errors) if errors.iter().all(|e| matches!(e.kind, ErrorKind::Missing)) => Ok(None),
            Err(errors) => Err(format!("The logo could not be uploaded. {errors}")),
        }
    }

    async fn multipart(&self) -> Result<multipart::Form, String> {
        let form = multipart::Form::new().text("name", self.name.trim().to_string());
        let Some(file) = self.logo()? else {
            return Ok(form);
        };

        let path = file
            .path()
            .ok_or_else(|| "The logo must be uploaded as a file.".to_string())?;
        let bytes = fs::read(path)
            .await
            .map_err(|e| format!("The logo could not be read. {e}"))?;

        let extension = file
            .content_type()
            .and_then(|content_type| content_type.extension())
            .map(|extension| format!(".{extension}"))
            .unwrap_or_default();
        let mut part = multipart::Part::bytes(bytes)
            .file_name(format!("{}{extension}", file.name().unwrap_or("logo")));
        if let Some(content_type) = file.content_type() {
            part = part
                .mime_str(&content_type.to_string())
                .map_err(|e| format!("The logo has an invalid type. {e}"))?;
        }
        Ok(form.part("logo", part))
    }
}

/// Forwards a brand form, or returns to `retry` when the upload itself failed.
async fn save(
    client: &ApiClient<'_>,
    path: String,
    form: &BrandForm<'_>,
    retry: String,
    done: &str,
) -> Result<Flash<Redirect>, Error> {
    let multipart = match form.multipart().await {
        Ok(multipart) => multipart,
        Err(problem) => {
            warn!("{problem}");
            return Ok(Flash::error(Redirect::to(retry), problem));
        }
    };
    let request = ApiRequest::post(path).multipart(multipart);
    settle(client.send(request).await, "/brands".into(), retry, done)
}

fn row(brand: &Brand, page: u64) -> (Vec<String>, Vec<RowAction>) {
    (
        vec![
            or_na(brand.name.as_deref()),
            or_na(brand.logo.as_deref()),
            brand.cars_count.map_or_else(|| NOT_AVAILABLE.to_string(), |count| count.to_string()),
            date(brand.created_at.as_deref()),
        ],
        vec![
            RowAction::link("Edit", format!("/brands/{}/edit", brand.id)),
            RowAction::post("Delete", format!("/brands/{}/delete", brand.id))
                .field("page", page)
                .confirm("Delete this brand?"),
        ],
    )
}

fn form(title: &str, action: String, brand: Option<&Brand>) -> FormView {
    FormView {
        title: title.to_string(),
        action,
        back: "/brands".into(),
        multipart: true,
        fields: vec![
            Field::text("name", "Name", brand.and_then(|brand| brand.name.as_deref())).required(),
            Field::file("logo", "Logo"),
        ],
    }
}

#[get("/brands?<page>")]
async fn list(
    page: Option<u64>,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let brands = client.page::<Brand>(BRANDS, page.unwrap_or(1)).await?;
    let current = brands.current_page;
    let table = Table::build("Brands", "/brands", COLUMNS, &brands, |brand| row(brand, current))
        .with_create("/brands/new");
    renderer.table(&table).await
}

#[get("/brands/new")]
async fn new(_client: ApiClient<'_>, mut renderer: PageRenderer<'_>) -> Result<Webpage, Error> {
    renderer.form(&form("New brand", "/brands".into(), None)).await
}

#[post("/brands", data = "<form>")]
async fn create(form: Form<BrandForm<'_>>, client: ApiClient<'_>) -> Result<Flash<Redirect>, Error> {
    save(
        &client,
        format!("{BRANDS}/store"),
        &form,
        "/brands/new".into(),
        "Brand created.",
    )
    .await
}

#[get("/brands/<id>/edit")]
async fn edit(
    id: i64,
    client: ApiClient<'_>,
    mut renderer: PageRenderer<'_>,
) -> Result<Webpage, Error> {
    let brand = client.record::<Brand>(&format!("{BRANDS}/{id}")).await?;
    renderer
        .form(&form("Edit brand", format!("/brands/{id}"), Some(&brand)))
        .await
}

#[post("/brands/<id>", data = "<form>")]
async fn update(
    id: i64,
    form: Form<BrandForm<'_>>,
    client: ApiClient<'_>,
) -> Result<Flash<Redirect>, Error> {
    save(
        &client,
        format!("{BRANDS}/update/{id}"),
        &form,
        format!("/brands/{id}/edit"),
        "Brand updated.",
    )
    .await
}

#[post("/brands/<id>/delete", data = "<form>")]
async fn delete(
    id: i64,
    form: Form<ReturnForm>,
    client: ApiClient<'_>,
) -> Result<Flash<Redirect>, Error> {
    let request = ApiRequest::delete(format!("{BRANDS}/delete/{id}"));
    report(client.send(request).await, list_url("/brands", form.page), "Brand deleted.")
}
