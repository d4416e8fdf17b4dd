use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Hero header for one of the fixed site pages, keyed by page key.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "page_header")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub page: String,

    pub image_url: String,
    pub title: String,
    pub subtitle: String,

    pub padding_top: Option<String>,
    pub padding_bottom: Option<String>,
    pub min_height: Option<String>,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
