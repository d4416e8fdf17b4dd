use std::fmt::Write;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use content::resolve::ReadyPage;
use content::{DocumentMeta, PageView, resolve_page};
use html_escape::{encode_double_quoted_attribute, encode_text};
use tracing::instrument;

use crate::config::SiteConfig;
use crate::state::AppState;
use crate::store::DbPageSource;

/// Serve a page as a complete HTML document.
#[instrument(skip(state), fields(slug))]
pub async fn render_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> (StatusCode, Html<String>) {
    let site = &state.config.site;
    let view = resolve_page(&DbPageSource::new(&state), &slug).await;

    match view {
        PageView::Ready(ready) => {
            let mut meta = DocumentMeta::new(
                format!("{} | {}", ready.page.title, site.name),
                site.description.clone(),
            );
            meta.apply_seo(&ready.page);
            (StatusCode::OK, Html(document(&meta, &page_body(&ready))))
        }
        PageView::NotFound => {
            let meta = DocumentMeta::new(format!("Page not found | {}", site.name), None);
            (
                StatusCode::NOT_FOUND,
                Html(document(
                    &meta,
                    &message_body(
                        site,
                        "Page not found",
                        "The page you are looking for does not exist.",
                    ),
                )),
            )
        }
        PageView::Error(_) | PageView::Loading => {
            let meta =
                DocumentMeta::new(format!("Something went wrong | {}", site.name), None);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(document(
                    &meta,
                    &message_body(
                        site,
                        "Something went wrong",
                        "This page could not be loaded. Please try again later.",
                    ),
                )),
            )
        }
    }
}

fn document(meta: &DocumentMeta, body: &str) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n",
    );
    html.push_str(&format!("<title>{}</title>\n", encode_text(&meta.title)));
    if let Some(description) = &meta.description {
        html.push_str(&format!(
            "<meta name=\"description\" content=\"{}\">\n",
            encode_double_quoted_attribute(description)
        ));
    }
    html.push_str("</head>\n<body>\n");
    html.push_str(body);
    html.push_str("\n</body>\n</html>\n");
    html
}

fn page_body(ready: &ReadyPage) -> String {
    let page = &ready.page;
    let title = page.header_title.as_deref().unwrap_or(&page.title);

    let mut body = String::new();
    match page.header_image_url.as_deref().filter(|u| !u.trim().is_empty()) {
        Some(url) => body.push_str(&format!(
            "<header class=\"page-header\" style=\"background-image:url('{}')\">",
            encode_double_quoted_attribute(&css_url(url))
        )),
        None => body.push_str("<header class=\"page-header\">"),
    }
    body.push_str(&format!("<h1>{}</h1>", encode_text(title)));
    if let Some(subtitle) = page.header_subtitle.as_deref() {
        body.push_str(&format!("<p>{}</p>", encode_text(subtitle)));
    }
    body.push_str("</header>\n<main class=\"page-blocks\">\n");
    for markup in ready.render() {
        body.push_str(markup.as_str());
        body.push('\n');
    }
    body.push_str("</main>");
    body
}

/// Percent-encode the characters that could close a CSS `url('...')` token.
fn css_url(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.trim().chars() {
        if matches!(c, '\'' | '"' | '(' | ')' | '\\') || c.is_whitespace() || c.is_control() {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(out, "%{byte:02X}");
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn message_body(site: &SiteConfig, heading: &str, text: &str) -> String {
    format!(
        "<main class=\"page-message\"><h1>{}</h1><p>{}</p><a href=\"/\">{}</a></main>",
        encode_text(heading),
        encode_text(text),
        encode_text(&site.name)
    )
}
