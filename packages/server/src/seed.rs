use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::page_block;

/// Ensure required database indexes exist.
///
/// Schema-sync doesn't create composite non-unique indexes, so they are
/// created here on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Block listing for a page:
    // SELECT ... FROM page_block WHERE page_id = ? ORDER BY position
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_page_block_page_position")
        .table(page_block::Entity)
        .col(page_block::Column::PageId)
        .col(page_block::Column::Position)
        .to_owned();

    let backend = db.get_database_backend();
    match db.execute_raw(backend.build(&stmt)).await {
        Ok(_) => {
            info!("Ensured index idx_page_block_page_position exists");
        }
        Err(e) => {
            warn!("Failed to create index idx_page_block_page_position: {}", e);
        }
    }

    Ok(())
}
