//! Per-page hero header records and the admin form that edits them.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::QueryCache;
use crate::error::{ContentError, FieldError};
use crate::resolve::{Latest, Ticket};

/// Cache key of the header collection. Per-page reads use `page-headers:{page}`.
pub const HEADERS_CACHE_KEY: &str = "page-headers";

pub fn header_cache_key(page: PageKey) -> String {
    format!("{HEADERS_CACHE_KEY}:{page}")
}

/// Pages that carry a configurable header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PageKey {
    Home,
    Courses,
    Clinics,
    Community,
    About,
    Contact,
}

impl PageKey {
    pub const ALL: &'static [PageKey] = &[
        Self::Home,
        Self::Courses,
        Self::Clinics,
        Self::Community,
        Self::About,
        Self::Contact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Courses => "courses",
            Self::Clinics => "clinics",
            Self::Community => "community",
            Self::About => "about",
            Self::Contact => "contact",
        }
    }
}

impl fmt::Display for PageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an unknown page key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePageKeyError {
    invalid: String,
}

impl fmt::Display for ParsePageKeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid page '{}'. Valid values: {}",
            self.invalid,
            PageKey::ALL
                .iter()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParsePageKeyError {}

impl FromStr for PageKey {
    type Err = ParsePageKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ParsePageKeyError {
                invalid: s.to_string(),
            })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHeader {
    pub image_url: String,
    pub title: String,
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_top: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_bottom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<String>,
}

impl PageHeader {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.title.trim().is_empty() {
            errors.push(FieldError::new("title", "title is required"));
        }
        if self.image_url.trim().is_empty() {
            errors.push(FieldError::new("image_url", "image_url is required"));
        }
        errors
    }
}

#[async_trait]
pub trait HeaderStore: Send + Sync {
    /// `Ok(None)` (or `Err(NotFound)`) when the page has no header configured.
    async fn fetch_header(&self, page: PageKey) -> Result<Option<PageHeader>, ContentError>;

    async fn upsert_header(&self, page: PageKey, header: &PageHeader) -> Result<(), ContentError>;
}

/// Admin form state for one page header at a time.
#[derive(Debug, Default)]
pub struct HeaderForm {
    selected: Option<PageKey>,
    draft: PageHeader,
    saving: bool,
    errors: Vec<FieldError>,
    loads: Latest,
}

impl HeaderForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<PageKey> {
        self.selected
    }

    pub fn draft(&self) -> &PageHeader {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut PageHeader {
        &mut self.draft
    }

    /// Field errors from the last submit attempt.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Submission is disabled while nothing is selected or a save is running.
    pub fn can_submit(&self) -> bool {
        self.selected.is_some() && !self.saving
    }

    /// Select a page key. The returned ticket must accompany the load result.
    pub fn begin_select(&mut self, page: PageKey) -> Ticket {
        self.selected = Some(page);
        self.errors.clear();
        self.loads.begin()
    }

    /// Apply a header load. Results for a key that is no longer selected are
    /// ignored. A missing header loads defaults.
    pub fn finish_select(
        &mut self,
        ticket: Ticket,
        result: Result<Option<PageHeader>, ContentError>,
    ) -> Result<(), ContentError> {
        if !self.loads.is_current(ticket) {
            debug!("ignoring header load for a superseded selection");
            return Ok(());
        }
        match result {
            Ok(Some(header)) => self.draft = header,
            Ok(None) => self.draft = PageHeader::default(),
            Err(e) if e.is_not_found() => self.draft = PageHeader::default(),
            Err(e) => return Err(e),
        }
        Ok(())
    }

    pub async fn select<S>(&mut self, store: &S, page: PageKey) -> Result<(), ContentError>
    where
        S: HeaderStore + ?Sized,
    {
        let ticket = self.begin_select(page);
        let result = store.fetch_header(page).await;
        self.finish_select(ticket, result)
    }

    /// Validate and lock the form for saving. Returns what to upsert.
    pub fn begin_submit(&mut self) -> Result<(PageKey, PageHeader), ContentError> {
        if self.saving {
            return Err(ContentError::validation("form", "a save is already in progress"));
        }
        let mut errors = Vec::new();
        if self.selected.is_none() {
            errors.push(FieldError::new("page", "select a page first"));
        }
        errors.extend(self.draft.validate());
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(ContentError::Validation(errors));
        }

        let Some(page) = self.selected else {
            return Err(ContentError::validation("page", "select a page first"));
        };
        self.errors.clear();
        self.saving = true;
        Ok((page, self.draft.clone()))
    }

    /// Unlock the form. On success the header cache entries are dropped so the
    /// next read observes the saved value.
    pub fn finish_submit<V: Clone>(
        &mut self,
        result: Result<(), ContentError>,
        cache: &QueryCache<V>,
    ) -> Result<(), ContentError> {
        self.saving = false;
        match result {
            Ok(()) => {
                cache.invalidate_prefix(HEADERS_CACHE_KEY);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to save page header");
                Err(e)
            }
        }
    }

    pub async fn submit<S, V>(&mut self, store: &S, cache: &QueryCache<V>) -> Result<(), ContentError>
    where
        S: HeaderStore + ?Sized,
        V: Clone,
    {
        let (page, header) = self.begin_submit()?;
        let result = store.upsert_header(page, &header).await;
        self.finish_submit(result, cache)
    }
}
