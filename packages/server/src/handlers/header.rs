use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use content::PageKey;
use content::header::HEADERS_CACHE_KEY;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::page_header;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::header::*;
use crate::state::AppState;
use crate::utils::jwt::HEADER_EDIT;

#[utoipa::path(
    get,
    path = "/page-headers",
    tag = "Page Headers",
    operation_id = "listPageHeaders",
    summary = "List all configured page headers",
    description = "Public. Returns every stored header ordered by page key. Pages without a header are simply absent.",
    responses(
        (status = 200, description = "Configured headers", body = Vec<PageHeaderResponse>),
    ),
)]
#[instrument(skip(state))]
pub async fn list_page_headers(
    State(state): State<AppState>,
) -> Result<Json<Vec<PageHeaderResponse>>, AppError> {
    Ok(Json(cached_headers(&state).await?))
}

#[utoipa::path(
    get,
    path = "/page-headers/{page}",
    tag = "Page Headers",
    operation_id = "getPageHeader",
    summary = "Get the header of one page",
    description = "Public. A 404 means no header is configured for the page yet; clients fall back to defaults.",
    params(("page" = PageKey, Path, description = "Page key")),
    responses(
        (status = 200, description = "Header", body = PageHeaderResponse),
        (status = 400, description = "Unknown page key (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "No header configured (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(page))]
pub async fn get_page_header(
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> Result<Json<PageHeaderResponse>, AppError> {
    let key = parse_page_key(&page)?;

    cached_headers(&state)
        .await?
        .into_iter()
        .find(|h| h.page == key.as_str())
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("No header configured for '{key}'")))
}

#[utoipa::path(
    put,
    path = "/page-headers/{page}",
    tag = "Page Headers",
    operation_id = "upsertPageHeader",
    summary = "Create or replace the header of one page",
    description = "Stores the header for the page, replacing any previous one. `title` and `image_url` are required. Requires `header:edit` permission.",
    params(("page" = PageKey, Path, description = "Page key")),
    request_body = UpsertHeaderRequest,
    responses(
        (status = 200, description = "Stored header", body = PageHeaderResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(page))]
pub async fn upsert_page_header(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(page): Path<String>,
    AppJson(payload): AppJson<UpsertHeaderRequest>,
) -> Result<Json<PageHeaderResponse>, AppError> {
    auth_user.require_permission(HEADER_EDIT)?;
    let key = parse_page_key(&page)?;
    let header = content::PageHeader::from(payload);
    validate_header(&header)?;

    let model = page_header::Model {
        page: key.as_str().to_string(),
        image_url: header.image_url,
        title: header.title,
        subtitle: header.subtitle,
        padding_top: header.padding_top,
        padding_bottom: header.padding_bottom,
        min_height: header.min_height,
        updated_at: chrono::Utc::now(),
    };
    let active: page_header::ActiveModel = model.clone().into();

    page_header::Entity::insert(active)
        .on_conflict(
            OnConflict::column(page_header::Column::Page)
                .update_columns([
                    page_header::Column::ImageUrl,
                    page_header::Column::Title,
                    page_header::Column::Subtitle,
                    page_header::Column::PaddingTop,
                    page_header::Column::PaddingBottom,
                    page_header::Column::MinHeight,
                    page_header::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    state.cache.invalidate_headers();
    info!(page = %key, editor = %auth_user.subject, "page header saved");

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/page-headers/{page}",
    tag = "Page Headers",
    operation_id = "deletePageHeader",
    summary = "Remove the header of one page",
    description = "Deletes the stored header so the page falls back to defaults. Requires `header:edit` permission.",
    params(("page" = PageKey, Path, description = "Page key")),
    responses(
        (status = 204, description = "Header removed"),
        (status = 400, description = "Unknown page key (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "No header configured (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(page))]
pub async fn delete_page_header(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(page): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(HEADER_EDIT)?;
    let key = parse_page_key(&page)?;

    let result = page_header::Entity::delete_by_id(key.as_str().to_string())
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!(
            "No header configured for '{key}'"
        )));
    }

    state.cache.invalidate_headers();

    Ok(StatusCode::NO_CONTENT)
}

fn parse_page_key(page: &str) -> Result<PageKey, AppError> {
    page.parse()
        .map_err(|e: content::header::ParsePageKeyError| AppError::Validation(e.to_string()))
}

async fn cached_headers(state: &AppState) -> Result<Vec<PageHeaderResponse>, AppError> {
    state
        .cache
        .headers
        .get_or_fetch(HEADERS_CACHE_KEY, || async {
            let models = page_header::Entity::find()
                .order_by_asc(page_header::Column::Page)
                .all(&state.db)
                .await?;
            Ok::<_, AppError>(models.into_iter().map(Into::into).collect())
        })
        .await
}
