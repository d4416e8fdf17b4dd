use chrono::{DateTime, Utc};
use content::{ContentError, PageHeader};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::page_header;
use crate::error::AppError;

use super::shared::validate_optional_text;

const CSS_LENGTH_MAX: usize = 32;

#[derive(Deserialize, ToSchema)]
pub struct UpsertHeaderRequest {
    #[serde(alias = "imageUrl")]
    #[schema(example = "https://cdn.example.com/hero.jpg")]
    pub image_url: String,
    #[schema(example = "Our courses")]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(alias = "paddingTop")]
    pub padding_top: Option<String>,
    #[serde(alias = "paddingBottom")]
    pub padding_bottom: Option<String>,
    #[serde(alias = "minHeight")]
    pub min_height: Option<String>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PageHeaderResponse {
    /// Page key, one of `home`, `courses`, `clinics`, `community`, `about`, `contact`.
    #[schema(example = "courses")]
    pub page: String,
    pub image_url: String,
    pub title: String,
    pub subtitle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_top: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding_bottom: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_height: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<page_header::Model> for PageHeaderResponse {
    fn from(m: page_header::Model) -> Self {
        Self {
            page: m.page,
            image_url: m.image_url,
            title: m.title,
            subtitle: m.subtitle,
            padding_top: m.padding_top,
            padding_bottom: m.padding_bottom,
            min_height: m.min_height,
            updated_at: m.updated_at,
        }
    }
}

impl From<UpsertHeaderRequest> for PageHeader {
    fn from(req: UpsertHeaderRequest) -> Self {
        Self {
            image_url: req.image_url.trim().to_string(),
            title: req.title.trim().to_string(),
            subtitle: req.subtitle,
            padding_top: req.padding_top,
            padding_bottom: req.padding_bottom,
            min_height: req.min_height,
        }
    }
}

/// Title and image are required; the optional sizes must be short CSS lengths.
pub fn validate_header(header: &PageHeader) -> Result<(), AppError> {
    let errors = header.validate();
    if !errors.is_empty() {
        return Err(ContentError::Validation(errors).into());
    }
    validate_optional_text(header.padding_top.as_deref(), "padding_top", CSS_LENGTH_MAX)?;
    validate_optional_text(
        header.padding_bottom.as_deref(),
        "padding_bottom",
        CSS_LENGTH_MAX,
    )?;
    validate_optional_text(header.min_height.as_deref(), "min_height", CSS_LENGTH_MAX)?;
    Ok(())
}
