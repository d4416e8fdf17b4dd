//! Resolution of a public page: slug, then page record, then its blocks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::block::PageBlock;
use crate::error::ContentError;
use crate::render::{Markup, render_tree};
use crate::tree::BlockTree;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: i32,
    pub slug: String,
    pub title: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub header_image_url: Option<String>,
    pub header_title: Option<String>,
    pub header_subtitle: Option<String>,
    pub published: bool,
}

/// Where pages and their blocks come from.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// `Ok(None)` when no page has this slug.
    async fn page_by_slug(&self, slug: &str) -> Result<Option<Page>, ContentError>;

    /// Blocks in render order. An empty list is a valid page.
    async fn blocks_for_page(&self, page_id: i32) -> Result<Vec<PageBlock>, ContentError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReadyPage {
    pub page: Page,
    pub blocks: BlockTree,
}

impl ReadyPage {
    /// Rendered top-level blocks in order; unrecognized blocks are skipped.
    pub fn render(&self) -> Vec<Markup> {
        render_tree(&self.blocks)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum PageView {
    #[default]
    Loading,
    NotFound,
    /// Blocks could not be loaded.
    Error(String),
    Ready(ReadyPage),
}

impl PageView {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

/// Resolve a slug. Blocks are only fetched once the page itself resolved to a
/// published record.
pub async fn resolve_page<S>(source: &S, slug: &str) -> PageView
where
    S: PageSource + ?Sized,
{
    let page = match source.page_by_slug(slug).await {
        Ok(Some(page)) if page.published => page,
        Ok(Some(_)) => {
            debug!(slug, "page is not published");
            return PageView::NotFound;
        }
        Ok(None) => {
            debug!(slug, "no page for slug");
            return PageView::NotFound;
        }
        Err(e) => {
            debug!(slug, error = %e, "page lookup failed, showing not found");
            return PageView::NotFound;
        }
    };

    match source.blocks_for_page(page.id).await {
        Ok(blocks) => PageView::Ready(ReadyPage {
            page,
            blocks: BlockTree::from_blocks(blocks),
        }),
        Err(e) => {
            warn!(slug, page_id = page.id, error = %e, "failed to load page blocks");
            PageView::Error(e.to_string())
        }
    }
}

/// Title and description of the surrounding HTML document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DocumentMeta {
    pub title: String,
    pub description: Option<String>,
}

impl DocumentMeta {
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            title: title.into(),
            description,
        }
    }

    /// Take title and description from the page's SEO fields where present.
    /// Applying the same page twice leaves the same result.
    pub fn apply_seo(&mut self, page: &Page) {
        if let Some(title) = page.seo_title.as_deref().filter(|t| !t.trim().is_empty()) {
            self.title = title.to_string();
        }
        if let Some(description) = page
            .seo_description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
        {
            self.description = Some(description.to_string());
        }
    }
}

/// Issued when a request starts; only the most recent one may settle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket(u64);

/// Last-write-wins guard for overlapping requests.
#[derive(Debug, Default)]
pub struct Latest {
    generation: AtomicU64,
}

impl Latest {
    pub fn begin(&self) -> Ticket {
        Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }
}

struct SessionState {
    view: PageView,
    meta: DocumentMeta,
}

/// A viewer that navigates between slugs. Results of superseded navigations
/// are dropped.
pub struct PageSession {
    latest: Latest,
    state: Mutex<SessionState>,
}

impl PageSession {
    pub fn new(meta: DocumentMeta) -> Self {
        Self {
            latest: Latest::default(),
            state: Mutex::new(SessionState {
                view: PageView::Loading,
                meta,
            }),
        }
    }

    /// Resolve `slug` and show it unless a later navigation started meanwhile.
    /// Returns whether this navigation's result was applied.
    pub async fn navigate<S>(&self, source: &S, slug: &str) -> bool
    where
        S: PageSource + ?Sized,
    {
        let ticket = {
            let mut state = self.lock();
            state.view = PageView::Loading;
            self.latest.begin()
        };
        let view = resolve_page(source, slug).await;
        self.settle(ticket, view)
    }

    fn settle(&self, ticket: Ticket, view: PageView) -> bool {
        let mut state = self.lock();
        if !self.latest.is_current(ticket) {
            debug!("discarding superseded page resolution");
            return false;
        }
        if let PageView::Ready(ready) = &view {
            state.meta.apply_seo(&ready.page);
        }
        state.view = view;
        true
    }

    pub fn view(&self) -> PageView {
        self.lock().view.clone()
    }

    pub fn meta(&self) -> DocumentMeta {
        self.lock().meta.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
