use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use content::PageSource;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::{Condition, Func, LikeExpr};
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{page, page_block};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::page::*;
use crate::state::AppState;
use crate::store::DbPageSource;
use crate::utils::jwt::{PAGE_DELETE, PAGE_EDIT};

#[utoipa::path(
    post,
    path = "/pages",
    tag = "Pages",
    operation_id = "createPage",
    summary = "Create a new page",
    description = "Creates an empty page. Blocks are added with the replace-blocks endpoint. Requires `page:edit` permission.",
    request_body = CreatePageRequest,
    responses(
        (status = 201, description = "Page created", body = PageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(slug = %payload.slug))]
pub async fn create_page(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePageRequest>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PAGE_EDIT)?;
    validate_create_page(&payload)?;

    let txn = state.db.begin().await?;
    ensure_slug_free(&txn, &payload.slug, None).await?;

    let now = chrono::Utc::now();
    let new_page = page::ActiveModel {
        slug: Set(payload.slug),
        title: Set(payload.title.trim().to_string()),
        seo_title: Set(payload.seo_title),
        seo_description: Set(payload.seo_description),
        header_image_url: Set(payload.header_image_url),
        header_title: Set(payload.header_title),
        header_subtitle: Set(payload.header_subtitle),
        published: Set(payload.published),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_page.insert(&txn).await?;
    txn.commit().await?;

    state.cache.invalidate_page(model.id);
    info!(id = model.id, editor = %auth_user.subject, "page created");

    Ok((StatusCode::CREATED, Json(PageResponse::from(model))))
}

#[utoipa::path(
    get,
    path = "/pages",
    tag = "Pages",
    operation_id = "listPages",
    summary = "List pages with pagination and search",
    description = "Returns a paginated list of pages, published or not. Requires `page:edit` or `page:delete` permission. Supports case-insensitive search over title and slug and sorting by `created_at` (default, desc), `updated_at`, `title` or `slug`.",
    params(PageListQuery),
    responses(
        (status = 200, description = "List of pages", body = PageListResponse),
        (status = 400, description = "Invalid sort field (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query))]
pub async fn list_pages(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<PageListQuery>,
) -> Result<Json<PageListResponse>, AppError> {
    auth_user.require_any_permission(&[PAGE_EDIT, PAGE_DELETE])?;

    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);

    let mut select = page::Entity::find();

    if let Some(ref search) = query.search {
        let term = escape_like(search.trim());
        if !term.is_empty() {
            let pattern = format!("%{}%", term.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col(page::Column::Title)))
                            .like(LikeExpr::new(pattern.clone()).escape('\\')),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col(page::Column::Slug)))
                            .like(LikeExpr::new(pattern).escape('\\')),
                    ),
            );
        }
    }

    let sort_by = query.sort_by.as_deref().unwrap_or("created_at");
    let sort_order = if query.sort_order.as_deref() == Some("asc") {
        Order::Asc
    } else {
        Order::Desc
    };
    let sort_column = match sort_by {
        "created_at" => page::Column::CreatedAt,
        "updated_at" => page::Column::UpdatedAt,
        "title" => page::Column::Title,
        "slug" => page::Column::Slug,
        _ => {
            return Err(AppError::Validation(
                "sort_by must be one of: created_at, updated_at, title, slug".into(),
            ));
        }
    };

    let total = select
        .clone()
        .paginate(&state.db, per_page)
        .num_items()
        .await?;

    select = select
        .order_by(sort_column, sort_order)
        .order_by_asc(page::Column::Id);
    let total_pages = total.div_ceil(per_page);

    let data = select
        .select_only()
        .column(page::Column::Id)
        .column(page::Column::Slug)
        .column(page::Column::Title)
        .column(page::Column::Published)
        .column(page::Column::CreatedAt)
        .column(page::Column::UpdatedAt)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .into_model::<PageListItem>()
        .all(&state.db)
        .await?;

    Ok(Json(PageListResponse {
        data,
        pagination: Pagination {
            page,
            per_page,
            total,
            total_pages,
        },
    }))
}

#[utoipa::path(
    get,
    path = "/pages/{id}",
    tag = "Pages",
    operation_id = "getPage",
    summary = "Get a page by ID",
    description = "Returns the full page record, published or not. Requires `page:edit` or `page:delete` permission.",
    params(("id" = i32, Path, description = "Page ID")),
    responses(
        (status = 200, description = "Page details", body = PageResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Page not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn get_page(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PageResponse>, AppError> {
    auth_user.require_any_permission(&[PAGE_EDIT, PAGE_DELETE])?;

    let model = find_page(&state.db, id).await?;
    Ok(Json(model.into()))
}

#[utoipa::path(
    patch,
    path = "/pages/{id}",
    tag = "Pages",
    operation_id = "updatePage",
    summary = "Update an existing page",
    description = "Partially updates a page using PATCH semantics. Nullable fields are cleared by sending `null`. Requires `page:edit` permission. An empty payload returns the current resource unchanged.",
    params(("id" = i32, Path, description = "Page ID")),
    request_body = UpdatePageRequest,
    responses(
        (status = 200, description = "Page updated", body = PageResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Page not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Slug already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(id))]
pub async fn update_page(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdatePageRequest>,
) -> Result<Json<PageResponse>, AppError> {
    auth_user.require_permission(PAGE_EDIT)?;
    validate_update_page(&payload)?;

    if payload == UpdatePageRequest::default() {
        let existing = find_page(&state.db, id).await?;
        return Ok(Json(existing.into()));
    }

    let txn = state.db.begin().await?;

    let existing = find_page_for_update(&txn, id).await?;
    if let Some(ref slug) = payload.slug
        && *slug != existing.slug
    {
        ensure_slug_free(&txn, slug, Some(id)).await?;
    }

    let mut active: page::ActiveModel = existing.into();

    if let Some(slug) = payload.slug {
        active.slug = Set(slug);
    }
    if let Some(ref title) = payload.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(seo_title) = payload.seo_title {
        active.seo_title = Set(seo_title);
    }
    if let Some(seo_description) = payload.seo_description {
        active.seo_description = Set(seo_description);
    }
    if let Some(url) = payload.header_image_url {
        active.header_image_url = Set(url);
    }
    if let Some(title) = payload.header_title {
        active.header_title = Set(title);
    }
    if let Some(subtitle) = payload.header_subtitle {
        active.header_subtitle = Set(subtitle);
    }
    if let Some(published) = payload.published {
        active.published = Set(published);
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&txn).await?;
    txn.commit().await?;

    state.cache.invalidate_page(id);

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/pages/{id}",
    tag = "Pages",
    operation_id = "deletePage",
    summary = "Delete a page by ID",
    description = "Permanently deletes a page together with all of its blocks. Requires `page:delete` permission.",
    params(("id" = i32, Path, description = "Page ID")),
    responses(
        (status = 204, description = "Page deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Page not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(id))]
pub async fn delete_page(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, AppError> {
    auth_user.require_permission(PAGE_DELETE)?;

    let txn = state.db.begin().await?;

    let _page = find_page_for_update(&txn, id).await?;

    page_block::Entity::delete_many()
        .filter(page_block::Column::PageId.eq(id))
        .exec(&txn)
        .await?;
    page::Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;

    state.cache.invalidate_page(id);
    info!(id, editor = %auth_user.subject, "page deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/pages/by-slug/{slug}",
    tag = "Pages",
    operation_id = "getPageBySlug",
    summary = "Get a published page by slug",
    description = "Public. Returns the page record for a slug. Unknown and unpublished slugs both answer 404.",
    params(("slug" = String, Path, description = "Page slug")),
    responses(
        (status = 200, description = "Published page", body = PublicPageResponse),
        (status = 404, description = "No published page with this slug (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(slug))]
pub async fn get_page_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PublicPageResponse>, AppError> {
    let page = DbPageSource::new(&state)
        .page_by_slug(&slug)
        .await?
        .filter(|page| page.published)
        .ok_or_else(|| AppError::NotFound("Page not found".into()))?;

    Ok(Json(page.into()))
}

pub(crate) async fn find_page<C: ConnectionTrait>(db: &C, id: i32) -> Result<page::Model, AppError> {
    page::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Page not found".into()))
}

pub(crate) async fn find_page_for_update(
    txn: &DatabaseTransaction,
    id: i32,
) -> Result<page::Model, AppError> {
    use sea_orm::sea_query::LockType;
    page::Entity::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Page not found".into()))
}

async fn ensure_slug_free<C: ConnectionTrait>(
    db: &C,
    slug: &str,
    except: Option<i32>,
) -> Result<(), AppError> {
    let mut select = page::Entity::find().filter(page::Column::Slug.eq(slug));
    if let Some(id) = except {
        select = select.filter(page::Column::Id.ne(id));
    }
    if select.count(db).await? > 0 {
        return Err(AppError::Conflict(format!("Slug '{slug}' is already in use")));
    }
    Ok(())
}
