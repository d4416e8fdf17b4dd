use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use content::block::{CONTAINER_COLUMNS, Layout, SpacingField, validate_blocks};
use content::{BlockKind, PageBlock};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::entity::page_block;
use crate::error::AppError;

/// Upper bound on top-level blocks per page.
pub const MAX_BLOCKS_PER_PAGE: usize = 200;

/// A block as submitted by the editor.
#[derive(Deserialize, ToSchema)]
pub struct BlockInput {
    /// One of `text`, `image`, `cta`, `gallery`, `video`, `container`.
    #[serde(rename = "type")]
    #[schema(example = "text")]
    pub block_type: String,
    /// Type-specific payload with camelCase keys. Containers nest their
    /// children under `children`.
    #[serde(default, alias = "contentJson")]
    #[schema(value_type = Object)]
    pub content_json: Value,
}

#[derive(Deserialize, ToSchema)]
pub struct ReplaceBlocksRequest {
    /// The page's complete block list in render order.
    pub blocks: Vec<BlockInput>,
}

/// Stored block as seen by editors.
#[derive(Serialize, ToSchema)]
pub struct BlockResponse {
    pub id: i32,
    pub page_id: i32,
    #[serde(rename = "type")]
    pub block_type: String,
    #[schema(value_type = Object)]
    pub content_json: Value,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Block as served to visitors.
#[derive(Clone, Serialize, ToSchema)]
pub struct PublicBlockResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub block_type: String,
    #[schema(value_type = Object)]
    pub content_json: Value,
}

/// Partial edit of a container's layout and spacing. Absent fields are
/// left untouched; `children` can't be edited here.
#[derive(Deserialize, Default, ToSchema)]
pub struct ContainerEditRequest {
    /// `rows` or `columns`.
    #[schema(value_type = Option<String>, example = "columns")]
    pub layout: Option<Layout>,
    #[schema(example = 3)]
    pub columns: Option<i64>,
    #[schema(example = "1rem")]
    pub gap: Option<String>,
    /// Spacing keys such as `paddingTop` or `marginLeft` mapped to CSS lengths.
    pub spacing: Option<BTreeMap<String, String>>,
}

#[derive(Serialize, ToSchema)]
pub struct PreviewResponse {
    /// Rendered markup, or `null` when the block type is not recognized.
    pub html: Option<String>,
}

impl From<page_block::Model> for BlockResponse {
    fn from(m: page_block::Model) -> Self {
        Self {
            id: m.id,
            page_id: m.page_id,
            block_type: m.block_type,
            content_json: m.content,
            position: m.position,
            created_at: m.created_at,
        }
    }
}

impl From<page_block::Model> for PageBlock {
    fn from(m: page_block::Model) -> Self {
        Self {
            id: m.id.to_string(),
            block_type: m.block_type,
            content_json: m.content,
        }
    }
}

impl From<PageBlock> for PublicBlockResponse {
    fn from(b: PageBlock) -> Self {
        Self {
            id: b.id,
            block_type: b.block_type,
            content_json: b.content_json,
        }
    }
}

impl From<BlockInput> for PageBlock {
    fn from(input: BlockInput) -> Self {
        Self {
            id: String::new(),
            block_type: input.block_type,
            content_json: input.content_json,
        }
    }
}

/// Turn a submitted block list into storable blocks.
///
/// Nested children without an id get a fresh one so the tree can address
/// them. Top-level ids are assigned by the database.
pub fn prepare_blocks(inputs: Vec<BlockInput>) -> Result<Vec<PageBlock>, AppError> {
    if inputs.len() > MAX_BLOCKS_PER_PAGE {
        return Err(AppError::Validation(format!(
            "Too many blocks: max {MAX_BLOCKS_PER_PAGE}"
        )));
    }
    let mut blocks: Vec<PageBlock> = inputs.into_iter().map(PageBlock::from).collect();
    for block in &mut blocks {
        if block.block_type == BlockKind::Container.as_str() {
            assign_child_ids(&mut block.content_json);
        }
    }
    validate_blocks(&blocks)?;
    Ok(blocks)
}

fn assign_child_ids(content: &mut Value) {
    let Some(children) = content.get_mut("children").and_then(Value::as_array_mut) else {
        return;
    };
    for child in children {
        let Some(child) = child.as_object_mut() else {
            continue;
        };
        let missing = match child.get("id") {
            None | Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };
        if missing {
            child.insert(
                "id".into(),
                Value::String(uuid::Uuid::new_v4().simple().to_string()),
            );
        }
        let is_container =
            child.get("type").and_then(Value::as_str) == Some(BlockKind::Container.as_str());
        if is_container {
            for key in ["content_json", "contentJson"] {
                if let Some(nested) = child.get_mut(key) {
                    assign_child_ids(nested);
                }
            }
        }
    }
}

pub fn validate_container_edit(req: &ContainerEditRequest) -> Result<(), AppError> {
    if let Some(columns) = req.columns
        && !CONTAINER_COLUMNS.contains(&columns)
    {
        return Err(AppError::Validation(format!(
            "columns must be {}-{}",
            CONTAINER_COLUMNS.start(),
            CONTAINER_COLUMNS.end()
        )));
    }
    if let Some(ref gap) = req.gap
        && gap.trim().is_empty()
    {
        return Err(AppError::Validation("gap must not be empty".into()));
    }
    if let Some(ref spacing) = req.spacing {
        for key in spacing.keys() {
            if SpacingField::from_key(key).is_none() {
                let valid: Vec<&str> = SpacingField::ALL.iter().map(|f| f.key()).collect();
                return Err(AppError::Validation(format!(
                    "Unknown spacing field '{key}'. Valid: {}",
                    valid.join(", ")
                )));
            }
        }
    }
    Ok(())
}
