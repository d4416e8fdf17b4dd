use std::sync::Arc;

use async_trait::async_trait;
use content::{ContentError, Page, PageBlock, PageSource};
use sea_orm::*;

use crate::entity::{page, page_block};
use crate::state::{AppState, SiteCache, blocks_cache_key, page_cache_key};

/// Page source backed by the database with the public read caches in front.
pub struct DbPageSource {
    db: DatabaseConnection,
    cache: Arc<SiteCache>,
}

impl DbPageSource {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            cache: state.cache.clone(),
        }
    }
}

#[async_trait]
impl PageSource for DbPageSource {
    async fn page_by_slug(&self, slug: &str) -> Result<Option<Page>, ContentError> {
        // Missing slugs come back as `NotFound` so they are never cached.
        let found = self
            .cache
            .pages
            .get_or_fetch(&page_cache_key(slug), || async {
                page::Entity::find()
                    .filter(page::Column::Slug.eq(slug))
                    .one(&self.db)
                    .await
                    .map_err(transport)?
                    .map(Page::from)
                    .ok_or_else(|| ContentError::NotFound(slug.to_string()))
            })
            .await;
        match found {
            Ok(page) => Ok(Some(page)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn blocks_for_page(&self, page_id: i32) -> Result<Vec<PageBlock>, ContentError> {
        self.cache
            .blocks
            .get_or_fetch(&blocks_cache_key(page_id), || async {
                let models = load_blocks(&self.db, page_id).await.map_err(transport)?;
                Ok(models.into_iter().map(PageBlock::from).collect())
            })
            .await
    }
}

/// Blocks of a page in render order.
pub async fn load_blocks<C: ConnectionTrait>(
    db: &C,
    page_id: i32,
) -> Result<Vec<page_block::Model>, DbErr> {
    page_block::Entity::find()
        .filter(page_block::Column::PageId.eq(page_id))
        .order_by_asc(page_block::Column::Position)
        .order_by_asc(page_block::Column::Id)
        .all(db)
        .await
}

fn transport(err: DbErr) -> ContentError {
    ContentError::Transport(err.to_string())
}
