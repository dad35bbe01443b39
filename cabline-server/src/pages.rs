use axum::{
    extract::{Path, State},
    routing::get,
    Json,
};
use cabline_core::Database;

use crate::{
    context::ServerContext,
    errors::ServerResult,
    serialized::{Page, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/api/pages/{slug}",
    tag = "pages",
    params(
        ("slug" = String, Path, description = "Page slug")
    ),
    responses(
        (status = 200, body = Page),
        (status = 404, description = "No page with this slug")
    )
)]
async fn page(
    State(context): State<ServerContext>,
    Path(slug): Path<String>,
) -> ServerResult<Json<Page>> {
    let page = context.site.database.page_by_slug(&slug).await?;

    Ok(Json(page.to_serialized()))
}

pub fn router() -> Router {
    Router::new().route("/pages/:slug", get(page))
}
