use axum::Json;
use axum::extract::{Path, State};
use content::block::SpacingField;
use content::editor::{BlockEditor, ContentMap};
use content::{BlockKind, PageBlock, PageSource};
use sea_orm::*;
use tracing::{debug, info, instrument};

use crate::entity::page_block;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::page::{find_page, find_page_for_update};
use crate::models::block::*;
use crate::state::AppState;
use crate::store::DbPageSource;
use crate::utils::jwt::PAGE_EDIT;

#[utoipa::path(
    get,
    path = "/pages/{id}/blocks",
    tag = "Blocks",
    operation_id = "listPageBlocks",
    summary = "List the blocks of a published page",
    description = "Public. Returns the page's top-level blocks in render order; container children are nested inside `content_json.children`.",
    params(("id" = i32, Path, description = "Page ID")),
    responses(
        (status = 200, description = "Ordered blocks", body = Vec<PublicBlockResponse>),
        (status = 404, description = "No published page with this ID (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(id))]
pub async fn list_page_blocks(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<PublicBlockResponse>>, AppError> {
    let page = find_page(&state.db, id).await?;
    if !page.published {
        return Err(AppError::NotFound("Page not found".into()));
    }

    let blocks = DbPageSource::new(&state).blocks_for_page(id).await?;
    Ok(Json(blocks.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    put,
    path = "/pages/{id}/blocks",
    tag = "Blocks",
    operation_id = "replacePageBlocks",
    summary = "Replace the block list of a page",
    description = "Replaces every block of the page with the submitted list, in order. Positions are assigned 0, 1, 2, ... by array index. Nested children without an `id` get one. Requires `page:edit` permission.",
    params(("id" = i32, Path, description = "Page ID")),
    request_body = ReplaceBlocksRequest,
    responses(
        (status = 200, description = "Stored blocks", body = Vec<BlockResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Page not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, count = payload.blocks.len()))]
pub async fn replace_page_blocks(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ReplaceBlocksRequest>,
) -> Result<Json<Vec<BlockResponse>>, AppError> {
    auth_user.require_permission(PAGE_EDIT)?;
    let blocks = prepare_blocks(payload.blocks)?;

    let txn = state.db.begin().await?;
    let _page = find_page_for_update(&txn, id).await?;

    page_block::Entity::delete_many()
        .filter(page_block::Column::PageId.eq(id))
        .exec(&txn)
        .await?;

    let now = chrono::Utc::now();
    let mut stored = Vec::with_capacity(blocks.len());
    for (i, block) in blocks.into_iter().enumerate() {
        let position = i32::try_from(i)
            .map_err(|_| AppError::Validation("Too many blocks".into()))?;
        let model = page_block::ActiveModel {
            page_id: Set(id),
            block_type: Set(block.block_type),
            content: Set(block.content_json),
            position: Set(position),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        stored.push(BlockResponse::from(model));
    }

    txn.commit().await?;

    state.cache.invalidate_page(id);
    info!(id, count = stored.len(), editor = %auth_user.subject, "page blocks replaced");

    Ok(Json(stored))
}

#[utoipa::path(
    patch,
    path = "/pages/{id}/blocks/{block_id}/container",
    tag = "Blocks",
    operation_id = "editContainerBlock",
    summary = "Edit a container's layout and spacing",
    description = "Applies layout, column count, gap and spacing edits to a container block. Other content keys, including `children`, are preserved. Requires `page:edit` permission.",
    params(
        ("id" = i32, Path, description = "Page ID"),
        ("block_id" = i32, Path, description = "Block ID"),
    ),
    request_body = ContainerEditRequest,
    responses(
        (status = 200, description = "Updated block", body = BlockResponse),
        (status = 400, description = "Validation error or not a container (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Page or block not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id, block_id))]
pub async fn edit_container_block(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, block_id)): Path<(i32, i32)>,
    AppJson(payload): AppJson<ContainerEditRequest>,
) -> Result<Json<BlockResponse>, AppError> {
    auth_user.require_permission(PAGE_EDIT)?;
    validate_container_edit(&payload)?;

    let txn = state.db.begin().await?;
    let existing = find_block_for_page(&txn, id, block_id).await?;
    if existing.block_type != BlockKind::Container.as_str() {
        return Err(AppError::Validation(format!(
            "Block {block_id} is a {} block, not a container",
            existing.block_type
        )));
    }

    let mut edits = 0usize;
    let mut editor = BlockEditor::new(&existing.content, |content: &ContentMap| {
        edits += 1;
        debug!(keys = content.len(), "container content changed");
    });

    if let Some(layout) = payload.layout {
        editor.set_layout(layout);
    }
    if let Some(columns) = payload.columns {
        let columns = u8::try_from(columns)
            .map_err(|_| AppError::Validation("columns must be 1-6".into()))?;
        editor.set_columns(columns);
    }
    if let Some(gap) = payload.gap {
        editor.set_gap(gap);
    }
    for (key, value) in payload.spacing.unwrap_or_default() {
        if let Some(field) = SpacingField::from_key(&key) {
            editor.update_spacing(field, value);
        }
    }
    let content = editor.into_content();

    if edits == 0 {
        txn.commit().await?;
        return Ok(Json(existing.into()));
    }

    let mut active: page_block::ActiveModel = existing.into();
    active.content = Set(content);
    let model = active.update(&txn).await?;

    txn.commit().await?;

    state.cache.invalidate_page(id);

    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/blocks/preview",
    tag = "Blocks",
    operation_id = "previewBlock",
    summary = "Render one block to HTML",
    description = "Public. Renders a single block payload the way it appears on a page. Unknown block types render to `null` rather than failing.",
    request_body = BlockInput,
    responses(
        (status = 200, description = "Rendered markup", body = PreviewResponse),
        (status = 400, description = "Malformed request body (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(payload), fields(block_type = %payload.block_type))]
pub async fn preview_block(
    AppJson(payload): AppJson<BlockInput>,
) -> Result<Json<PreviewResponse>, AppError> {
    let block = PageBlock::from(payload);
    let html = content::render(&block).map(|markup| markup.into_string());
    Ok(Json(PreviewResponse { html }))
}

async fn find_block_for_page<C: ConnectionTrait>(
    db: &C,
    page_id: i32,
    block_id: i32,
) -> Result<page_block::Model, AppError> {
    let block = page_block::Entity::find_by_id(block_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Block not found".into()))?;

    if block.page_id != page_id {
        return Err(AppError::NotFound("Block not found".into()));
    }

    Ok(block)
}
