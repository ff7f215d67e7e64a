//! Layout fragments: the header, sidebar and theme snippets every page is
//! assembled from.
//!
//! A fragment may be authored as a complete HTML document so it can be
//! previewed on its own. Only the inside of its `<body>` is placed in the
//! page, and any `<script src>` it references is moved to the end of the page.

use std::{collections::BTreeMap, path::Path};

use include_dir::Dir;
use lazy_static::lazy_static;
use regex::Regex;
use rocket::{futures::future::try_join_all, tokio::fs};
use serde::Serialize;

use crate::templates::TemplateError;

/// Names of the fragments, which are also the layout containers they fill.
pub const CONTAINERS: &[&str] = &["header", "sidebar", "theme"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub html: String,
    pub scripts: Vec<String>,
}

impl Fragment {
    pub fn parse(source: &str) -> Self {
        let body = strip_scaffolding(source);
        let (html, scripts) = companion_scripts(&body);
        Self { html, scripts }
    }
}

pub type Fragments = BTreeMap<String, Fragment>;

/// Reads the fragments from disk, all at once.
pub async fn load_from_disk(templates: &Path) -> Result<Fragments, TemplateError> {
    let reads = CONTAINERS.iter().map(|name| async move {
        let path = templates.join("fragments").join(format!("{name}.html"));
        let source = fs::read_to_string(&path)
            .await
            .map_err(|e| TemplateError::MissingFragment(name.to_string(), e.to_string()))?;
        Ok::<_, TemplateError>((name.to_string(), Fragment::parse(&source)))
    });

    Ok(try_join_all(reads).await?.into_iter().collect())
}

pub fn load_embedded(templates: &Dir<'_>) -> Result<Fragments, TemplateError> {
    CONTAINERS
        .iter()
        .map(|name| {
            let file = templates
                .get_file(format!("fragments/{name}.html"))
                .ok_or_else(|| TemplateError::MissingFragment(name.to_string(), "not embedded".into()))?;
            let source = String::from_utf8_lossy(file.contents());
            Ok((name.to_string(), Fragment::parse(&source)))
        })
        .collect()
}

lazy_static! {
    static ref BODY: Regex = Regex::new(r"(?is)<body\b[^>]*>(.*)</body>").expect("Invalid BODY pattern");
    static ref HEAD: Regex = Regex::new(r"(?is)<head\b.*?</head>").expect("Invalid HEAD pattern");
    static ref SCAFFOLDING: Regex =
        Regex::new(r"(?i)<!doctype[^>]*>|</?html\b[^>]*>").expect("Invalid SCAFFOLDING pattern");
    static ref SCRIPT_SRC: Regex =
        Regex::new(r#"(?is)<script\b[^>]*\bsrc\s*=\s*["']?([^"'\s>]+)[^>]*>\s*</script>"#)
            .expect("Invalid SCRIPT_SRC pattern");
}

/// Returns what is inside `<body>`, or the document without its `<!DOCTYPE>`,
/// `<html>` and `<head>` parts when there is no body element.
pub fn strip_scaffolding(document: &str) -> String {
    if let Some(body) = BODY.captures(document).and_then(|captures| captures.get(1)) {
        return body.as_str().trim().to_string();
    }

    let without_head = HEAD.replace_all(document, "");
    SCAFFOLDING.replace_all(&without_head, "").trim().to_string()
}

/// Removes external `<script src="...">` tags, returning their sources in
/// document order. Inline scripts stay where they are.
pub fn companion_scripts(html: &str) -> (String, Vec<String>) {
    let scripts = SCRIPT_SRC
        .captures_iter(html)
        .filter_map(|captures| captures.get(1))
        .map(|src| src.as_str().to_string())
        .collect();
    let remaining = SCRIPT_SRC.replace_all(html, "");

    (remaining.trim().to_string(), scripts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_is_extracted() {
        let document = "<!DOCTYPE html>\n<HTML lang=\"en\"><head><title>Sidebar</title></head>\n<BODY class=\"x\"><nav>Menu</nav></BODY></HTML>";
        assert_eq!(strip_scaffolding(document), "<nav>Menu</nav>");
    }

    #[test]
    fn test_scaffolding_without_body() {
        let document = "<!doctype html><html><head><meta charset=\"utf-8\"></head><header>Top</header></html>";
        assert_eq!(strip_scaffolding(document), "<header>Top</header>");
    }

    #[test]
    fn test_plain_snippet_is_untouched() {
        assert_eq!(strip_scaffolding("  <div>Hi</div>\n"), "<div>Hi</div>");
        assert_eq!(strip_scaffolding("<header>x</header>"), "<header>x</header>");
    }

    #[test]
    fn test_companion_scripts_are_moved() {
        let (html, scripts) = companion_scripts(
            "<div id=\"theme\"></div><script src=\"/admin.js\" defer></script><script>window.x = 1;</script><SCRIPT SRC='/extra.js'></SCRIPT>",
        );

        assert_eq!(scripts, vec!["/admin.js".to_string(), "/extra.js".to_string()]);
        assert_eq!(html, "<div id=\"theme\"></div><script>window.x = 1;</script>");
    }

    #[test]
    fn test_fragment_parse() {
        let fragment = Fragment::parse(
            "<html><body><button data-theme-toggle>Theme</button><script src=\"/admin.js\"></script></body></html>",
        );
        assert_eq!(fragment.html, "<button data-theme-toggle>Theme</button>");
        assert_eq!(fragment.scripts, vec!["/admin.js".to_string()]);
    }

    #[test]
    fn test_header_element_is_not_a_head() {
        let document = "<html><head><title>Top</title></head><header><h1>Rentals</h1></header></html>";
        assert_eq!(strip_scaffolding(document), "<header><h1>Rentals</h1></header>");
    }

    #[test]
    fn test_unquoted_script_source() {
        let (html, scripts) = companion_scripts("<nav></nav>\n<script defer src=/admin.js></script>");
        assert_eq!(scripts, vec!["/admin.js".to_string()]);
        assert_eq!(html, "<nav></nav>");
    }

    #[test]
    fn test_embedded_fragments_exist() {
        let fragments = load_embedded(&crate::templates::TEMPLATE_DIR).unwrap();
        for name in CONTAINERS {
            assert!(fragments.contains_key(*name), "{name} fragment missing");
        }
    }
}
