//! HTTP access to a running Pagesmith server.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use content::{ContentError, HeaderStore, Page, PageBlock, PageHeader, PageKey, PageSource};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Published page as returned by the public by-slug endpoint.
#[derive(Deserialize)]
struct PublicPage {
    id: i32,
    slug: String,
    title: String,
    seo_title: Option<String>,
    seo_description: Option<String>,
    header_image_url: Option<String>,
    header_title: Option<String>,
    header_subtitle: Option<String>,
}

impl From<PublicPage> for Page {
    fn from(p: PublicPage) -> Self {
        Self {
            id: p.id,
            slug: p.slug,
            title: p.title,
            seo_title: p.seo_title,
            seo_description: p.seo_description,
            header_image_url: p.header_image_url,
            header_title: p.header_title,
            header_subtitle: p.header_subtitle,
            published: true,
        }
    }
}

/// Stored header together with its page key.
#[derive(Clone, Debug, Deserialize)]
pub struct HeaderEntry {
    pub page: String,
    #[serde(flatten)]
    pub header: PageHeader,
}

pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(server: &str, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: server.trim_end_matches('/').to_string(),
            token,
        }
    }

    fn url(&self, path: &str) -> String {
        let url = format!("{}{}", self.base, path);
        debug!(%url, authed = self.token.is_some(), "request");
        url
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Admin page listing.
    pub async fn list_pages(&self, search: Option<&str>, page: u64) -> Result<Value> {
        let mut query = vec![("page", page.to_string())];
        if let Some(search) = search {
            query.push(("search", search.to_string()));
        }
        let res = self
            .authed(self.http.get(self.url("/api/v1/pages")))
            .query(&query)
            .send()
            .await
            .context("Failed to reach server")?;
        expect_success(res).await?.json().await.context("Invalid page list")
    }

    pub async fn list_headers(&self) -> Result<Vec<HeaderEntry>> {
        let res = self
            .http
            .get(self.url("/api/v1/page-headers"))
            .send()
            .await
            .context("Failed to reach server")?;
        expect_success(res)
            .await?
            .json()
            .await
            .context("Invalid header list")
    }

    pub async fn delete_header(&self, page: PageKey) -> Result<()> {
        let res = self
            .authed(self.http.delete(self.url(&format!("/api/v1/page-headers/{page}"))))
            .send()
            .await
            .context("Failed to reach server")?;
        expect_success(res).await?;
        Ok(())
    }

    pub async fn preview(&self, block: &PageBlock) -> Result<Option<String>> {
        #[derive(Deserialize)]
        struct Preview {
            html: Option<String>,
        }
        let res = self
            .http
            .post(self.url("/api/v1/blocks/preview"))
            .json(block)
            .send()
            .await
            .context("Failed to reach server")?;
        let preview: Preview = expect_success(res).await?.json().await?;
        Ok(preview.html)
    }
}

#[async_trait]
impl PageSource for ApiClient {
    async fn page_by_slug(&self, slug: &str) -> Result<Option<Page>, ContentError> {
        let res = self
            .http
            .get(self.url(&format!("/api/v1/pages/by-slug/{slug}")))
            .send()
            .await
            .map_err(transport)?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let page: PublicPage = checked(res).await?.json().await.map_err(transport)?;
        Ok(Some(page.into()))
    }

    async fn blocks_for_page(&self, page_id: i32) -> Result<Vec<PageBlock>, ContentError> {
        let res = self
            .http
            .get(self.url(&format!("/api/v1/pages/{page_id}/blocks")))
            .send()
            .await
            .map_err(transport)?;
        checked(res).await?.json().await.map_err(transport)
    }
}

#[async_trait]
impl HeaderStore for ApiClient {
    async fn fetch_header(&self, page: PageKey) -> Result<Option<PageHeader>, ContentError> {
        let res = self
            .http
            .get(self.url(&format!("/api/v1/page-headers/{page}")))
            .send()
            .await
            .map_err(transport)?;
        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        checked(res).await?.json().await.map_err(transport)
    }

    async fn upsert_header(&self, page: PageKey, header: &PageHeader) -> Result<(), ContentError> {
        let res = self
            .authed(self.http.put(self.url(&format!("/api/v1/page-headers/{page}"))))
            .json(header)
            .send()
            .await
            .map_err(transport)?;
        checked(res).await?;
        Ok(())
    }
}

fn transport(err: reqwest::Error) -> ContentError {
    ContentError::Transport(err.to_string())
}

/// Map a non-success response onto the content error taxonomy.
async fn checked(res: Response) -> Result<Response, ContentError> {
    let status = res.status();
    debug!(%status, url = %res.url(), "response");
    if status.is_success() {
        return Ok(res);
    }
    let text = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or(text);
    Err(match status {
        StatusCode::NOT_FOUND => ContentError::NotFound(message),
        StatusCode::BAD_REQUEST => ContentError::validation("request", message),
        _ => ContentError::Transport(format!("{status}: {message}")),
    })
}

async fn expect_success(res: Response) -> Result<Response> {
    let status = res.status();
    debug!(%status, url = %res.url(), "response");
    if status.is_success() {
        return Ok(res);
    }
    let text = res.text().await.unwrap_or_default();
    match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => bail!("{} ({}): {}", status, body.code, body.message),
        Err(_) => bail!("{status}: {text}"),
    }
}
