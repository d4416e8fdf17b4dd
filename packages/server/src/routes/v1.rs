use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(page_routes())
        .merge(block_routes())
        .merge(header_routes())
}

fn page_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::page::list_pages,
            handlers::page::create_page
        ))
        .routes(routes!(
            handlers::page::get_page,
            handlers::page::update_page,
            handlers::page::delete_page
        ))
        .routes(routes!(handlers::page::get_page_by_slug))
}

fn block_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::block::list_page_blocks,
            handlers::block::replace_page_blocks
        ))
        .routes(routes!(handlers::block::edit_container_block))
        .routes(routes!(handlers::block::preview_block))
}

fn header_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::header::list_page_headers))
        .routes(routes!(
            handlers::header::get_page_header,
            handlers::header::upsert_page_header,
            handlers::header::delete_page_header
        ))
}
