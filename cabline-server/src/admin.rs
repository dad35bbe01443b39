//! Admin CRUD over pages, reviews and vendors.
//!
//! Creates and updates accept any fields, which are shallow merged
//! over the stored record. Deletes succeed whether or not the record exists.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json,
};
use cabline_core::{Database, Fields, PrimaryKey};
use log::info;

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::{PageInput, Payload, ReviewSchema, VendorInput},
    serialized::{message, Message, Page, Review, ToSerialized, Vendor},
    Router,
};

#[utoipa::path(
    get,
    path = "/api/admin/pages",
    tag = "admin",
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Vec<Page>)
    )
)]
async fn list_pages(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Page>>> {
    let pages = context.site.database.list_pages().await?;

    Ok(Json(pages.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/admin/pages/{id}",
    tag = "admin",
    params(
        ("id" = u64, Path, description = "Page id")
    ),
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Page),
        (status = 404, description = "No such page")
    )
)]
async fn page(
    State(context): State<ServerContext>,
    Path(page_id): Path<PrimaryKey>,
) -> ServerResult<Json<Page>> {
    let page = context.site.database.page_by_id(page_id).await?;

    Ok(Json(page.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/admin/pages",
    tag = "admin",
    request_body = PageInput,
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 201, body = Page),
        (status = 409, description = "Slug is taken")
    )
)]
async fn create_page(
    State(context): State<ServerContext>,
    Payload(fields): Payload<Fields>,
) -> ServerResult<(StatusCode, Json<Page>)> {
    let page = context.site.database.create_page(fields).await?;
    info!("Created page {} ({})", page.id, page.slug);

    Ok((StatusCode::CREATED, Json(page.to_serialized())))
}

#[utoipa::path(
    put,
    path = "/api/admin/pages/{id}",
    tag = "admin",
    request_body = PageInput,
    params(
        ("id" = u64, Path, description = "Page id")
    ),
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Page),
        (status = 404, description = "No such page")
    )
)]
async fn update_page(
    State(context): State<ServerContext>,
    Path(page_id): Path<PrimaryKey>,
    Payload(fields): Payload<Fields>,
) -> ServerResult<Json<Page>> {
    let page = context.site.database.update_page(page_id, fields).await?;

    Ok(Json(page.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/pages/{id}",
    tag = "admin",
    params(
        ("id" = u64, Path, description = "Page id")
    ),
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Message)
    )
)]
async fn delete_page(
    State(context): State<ServerContext>,
    Path(page_id): Path<PrimaryKey>,
) -> ServerResult<Json<Message>> {
    context.site.database.delete_page(page_id).await?;

    Ok(message("Deleted"))
}

#[utoipa::path(
    get,
    path = "/api/admin/reviews",
    tag = "admin",
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Vec<Review>, description = "All reviews, whatever their status")
    )
)]
async fn list_reviews(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Review>>> {
    let reviews = context.site.database.list_reviews().await?;

    Ok(Json(reviews.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/admin/reviews/{id}",
    tag = "admin",
    params(
        ("id" = u64, Path, description = "Review id")
    ),
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Review),
        (status = 404, description = "No such review")
    )
)]
async fn review(
    State(context): State<ServerContext>,
    Path(review_id): Path<PrimaryKey>,
) -> ServerResult<Json<Review>> {
    let review = context.site.database.review_by_id(review_id).await?;

    Ok(Json(review.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/admin/reviews",
    tag = "admin",
    request_body = ReviewSchema,
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 201, body = Review)
    )
)]
async fn create_review(
    State(context): State<ServerContext>,
    Payload(fields): Payload<Fields>,
) -> ServerResult<(StatusCode, Json<Review>)> {
    let review = context.site.database.create_review(fields).await?;

    Ok((StatusCode::CREATED, Json(review.to_serialized())))
}

#[utoipa::path(
    put,
    path = "/api/admin/reviews/{id}",
    tag = "admin",
    request_body = ReviewSchema,
    params(
        ("id" = u64, Path, description = "Review id")
    ),
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Review),
        (status = 404, description = "No such review")
    )
)]
async fn update_review(
    State(context): State<ServerContext>,
    Path(review_id): Path<PrimaryKey>,
    Payload(fields): Payload<Fields>,
) -> ServerResult<Json<Review>> {
    let review = context
        .site
        .database
        .update_review(review_id, fields)
        .await?;

    info!("Review {} is now {:?}", review.id, review.status);
    Ok(Json(review.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/reviews/{id}",
    tag = "admin",
    params(
        ("id" = u64, Path, description = "Review id")
    ),
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Message)
    )
)]
async fn delete_review(
    State(context): State<ServerContext>,
    Path(review_id): Path<PrimaryKey>,
) -> ServerResult<Json<Message>> {
    context.site.database.delete_review(review_id).await?;

    Ok(message("Deleted"))
}

#[utoipa::path(
    get,
    path = "/api/admin/vendors",
    tag = "admin",
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Vec<Vendor>)
    )
)]
async fn list_vendors(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Vendor>>> {
    let vendors = context.site.database.list_vendors().await?;

    Ok(Json(vendors.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/admin/vendors/{id}",
    tag = "admin",
    params(
        ("id" = u64, Path, description = "Vendor id")
    ),
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Vendor),
        (status = 404, description = "No such vendor")
    )
)]
async fn vendor(
    State(context): State<ServerContext>,
    Path(vendor_id): Path<PrimaryKey>,
) -> ServerResult<Json<Vendor>> {
    let vendor = context.site.database.vendor_by_id(vendor_id).await?;

    Ok(Json(vendor.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/admin/vendors",
    tag = "admin",
    request_body = VendorInput,
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 201, body = Vendor),
        (status = 409, description = "Email is taken")
    )
)]
async fn create_vendor(
    State(context): State<ServerContext>,
    Payload(fields): Payload<Fields>,
) -> ServerResult<(StatusCode, Json<Vendor>)> {
    let vendor = context.site.auth.create_vendor(fields).await?;
    info!("Created vendor {}", vendor.id);

    Ok((StatusCode::CREATED, Json(vendor.to_serialized())))
}

#[utoipa::path(
    put,
    path = "/api/admin/vendors/{id}",
    tag = "admin",
    request_body = VendorInput,
    params(
        ("id" = u64, Path, description = "Vendor id")
    ),
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Vendor),
        (status = 404, description = "No such vendor")
    )
)]
async fn update_vendor(
    State(context): State<ServerContext>,
    Path(vendor_id): Path<PrimaryKey>,
    Payload(fields): Payload<Fields>,
) -> ServerResult<Json<Vendor>> {
    let vendor = context.site.auth.update_vendor(vendor_id, fields).await?;

    Ok(Json(vendor.to_serialized()))
}

#[utoipa::path(
    delete,
    path = "/api/admin/vendors/{id}",
    tag = "admin",
    params(
        ("id" = u64, Path, description = "Vendor id")
    ),
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Message, description = "The vendor and its sessions are gone")
    )
)]
async fn delete_vendor(
    State(context): State<ServerContext>,
    Path(vendor_id): Path<PrimaryKey>,
) -> ServerResult<Json<Message>> {
    context.site.database.delete_vendor(vendor_id).await?;
    info!("Deleted vendor {}", vendor_id);

    Ok(message("Deleted"))
}

pub fn router() -> Router {
    Router::new()
        .route("/pages", get(list_pages).post(create_page))
        .route(
            "/pages/:id",
            get(page).put(update_page).delete(delete_page),
        )
        .route("/reviews", get(list_reviews).post(create_review))
        .route(
            "/reviews/:id",
            get(review).put(update_review).delete(delete_review),
        )
        .route("/vendors", get(list_vendors).post(create_vendor))
        .route(
            "/vendors/:id",
            get(vendor).put(update_vendor).delete(delete_vendor),
        )
}
