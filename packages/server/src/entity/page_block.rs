use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "page_block")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub page_id: i32,
    #[sea_orm(belongs_to, from = "page_id", to = "id")]
    pub page: HasOne<super::page::Entity>,

    pub block_type: String,
    /// Block payload, including inline `children` for containers.
    #[sea_orm(column_type = "JsonBinary")]
    pub content: Json,
    pub position: i32, // 0-based order within the page

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
