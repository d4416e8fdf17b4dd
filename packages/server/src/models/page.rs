use chrono::{DateTime, Utc};
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entity::page;
use crate::error::AppError;

pub use super::shared::{Pagination, escape_like};
use super::shared::{double_option, validate_optional_text, validate_slug, validate_title};

const SEO_TITLE_MAX: usize = 256;
const SEO_DESCRIPTION_MAX: usize = 1024;
const HEADER_TEXT_MAX: usize = 512;
const URL_MAX: usize = 2048;

#[derive(Deserialize, ToSchema)]
pub struct CreatePageRequest {
    /// URL path segment the page is served under.
    #[schema(example = "about-us")]
    pub slug: String,
    #[schema(example = "About us")]
    pub title: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub header_image_url: Option<String>,
    pub header_title: Option<String>,
    pub header_subtitle: Option<String>,
    /// Unpublished pages are invisible to public reads.
    #[serde(default)]
    pub published: bool,
}

#[derive(Deserialize, Default, PartialEq, ToSchema)]
pub struct UpdatePageRequest {
    pub slug: Option<String>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub seo_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub seo_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub header_image_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub header_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub header_subtitle: Option<Option<String>>,
    pub published: Option<bool>,
}

/// Full page record as seen by editors.
#[derive(Serialize, ToSchema)]
pub struct PageResponse {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub header_image_url: Option<String>,
    pub header_title: Option<String>,
    pub header_subtitle: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Published page as seen by visitors.
#[derive(Serialize, ToSchema)]
pub struct PublicPageResponse {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub header_image_url: Option<String>,
    pub header_title: Option<String>,
    pub header_subtitle: Option<String>,
}

#[derive(Serialize, FromQueryResult, ToSchema)]
pub struct PageListItem {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, ToSchema)]
pub struct PageListResponse {
    pub data: Vec<PageListItem>,
    pub pagination: Pagination,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageListQuery {
    /// Page number (1-based, default 1).
    pub page: Option<u64>,
    /// Items per page (1-100, default 20).
    pub per_page: Option<u64>,
    /// Case-insensitive search over title and slug.
    pub search: Option<String>,
    /// One of `created_at` (default), `updated_at`, `title`, `slug`.
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default).
    pub sort_order: Option<String>,
}

impl From<page::Model> for PageResponse {
    fn from(m: page::Model) -> Self {
        Self {
            id: m.id,
            slug: m.slug,
            title: m.title,
            seo_title: m.seo_title,
            seo_description: m.seo_description,
            header_image_url: m.header_image_url,
            header_title: m.header_title,
            header_subtitle: m.header_subtitle,
            published: m.published,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl From<page::Model> for content::Page {
    fn from(m: page::Model) -> Self {
        Self {
            id: m.id,
            slug: m.slug,
            title: m.title,
            seo_title: m.seo_title,
            seo_description: m.seo_description,
            header_image_url: m.header_image_url,
            header_title: m.header_title,
            header_subtitle: m.header_subtitle,
            published: m.published,
        }
    }
}

impl From<content::Page> for PublicPageResponse {
    fn from(p: content::Page) -> Self {
        Self {
            id: p.id,
            slug: p.slug,
            title: p.title,
            seo_title: p.seo_title,
            seo_description: p.seo_description,
            header_image_url: p.header_image_url,
            header_title: p.header_title,
            header_subtitle: p.header_subtitle,
        }
    }
}

fn validate_optional_fields(
    seo_title: Option<&str>,
    seo_description: Option<&str>,
    header_image_url: Option<&str>,
    header_title: Option<&str>,
    header_subtitle: Option<&str>,
) -> Result<(), AppError> {
    validate_optional_text(seo_title, "seo_title", SEO_TITLE_MAX)?;
    validate_optional_text(seo_description, "seo_description", SEO_DESCRIPTION_MAX)?;
    validate_optional_text(header_image_url, "header_image_url", URL_MAX)?;
    validate_optional_text(header_title, "header_title", HEADER_TEXT_MAX)?;
    validate_optional_text(header_subtitle, "header_subtitle", HEADER_TEXT_MAX)?;
    Ok(())
}

pub fn validate_create_page(req: &CreatePageRequest) -> Result<(), AppError> {
    validate_slug(&req.slug)?;
    validate_title(&req.title)?;
    validate_optional_fields(
        req.seo_title.as_deref(),
        req.seo_description.as_deref(),
        req.header_image_url.as_deref(),
        req.header_title.as_deref(),
        req.header_subtitle.as_deref(),
    )
}

pub fn validate_update_page(req: &UpdatePageRequest) -> Result<(), AppError> {
    if let Some(ref slug) = req.slug {
        validate_slug(slug)?;
    }
    if let Some(ref title) = req.title {
        validate_title(title)?;
    }
    validate_optional_fields(
        req.seo_title.as_ref().and_then(|v| v.as_deref()),
        req.seo_description.as_ref().and_then(|v| v.as_deref()),
        req.header_image_url.as_ref().and_then(|v| v.as_deref()),
        req.header_title.as_ref().and_then(|v| v.as_deref()),
        req.header_subtitle.as_ref().and_then(|v| v.as_deref()),
    )
}
