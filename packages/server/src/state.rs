use std::sync::Arc;

use content::header::HEADERS_CACHE_KEY;
use content::{Page, PageBlock, QueryCache};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::models::header::PageHeaderResponse;

const PAGE_KEY_PREFIX: &str = "page:";
const BLOCKS_KEY_PREFIX: &str = "blocks:";

pub fn page_cache_key(slug: &str) -> String {
    format!("{PAGE_KEY_PREFIX}{slug}")
}

pub fn blocks_cache_key(page_id: i32) -> String {
    format!("{BLOCKS_KEY_PREFIX}{page_id}")
}

/// Read caches for the public endpoints.
#[derive(Default)]
pub struct SiteCache {
    pub pages: QueryCache<Page>,
    pub blocks: QueryCache<Vec<PageBlock>>,
    pub headers: QueryCache<Vec<PageHeaderResponse>>,
}

impl SiteCache {
    /// Drop everything a page mutation can make stale. Slugs can change, so
    /// every `page:` entry goes.
    pub fn invalidate_page(&self, page_id: i32) {
        self.pages.invalidate_prefix(PAGE_KEY_PREFIX);
        self.blocks.invalidate(&blocks_cache_key(page_id));
    }

    pub fn invalidate_headers(&self) {
        self.headers.invalidate_prefix(HEADERS_CACHE_KEY);
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub cache: Arc<SiteCache>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            db,
            config: Arc::new(config),
            cache: Arc::new(SiteCache::default()),
        }
    }
}
