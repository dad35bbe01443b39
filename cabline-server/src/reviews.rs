use axum::{extract::State, routing::get, Json};
use cabline_core::{Database, Fields, ReviewStatus};
use log::info;
use serde_json::json;

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::{ReviewSchema, ValidatedPayload},
    serialized::{Review, ToSerialized},
    Router,
};

#[utoipa::path(
    get,
    path = "/api/reviews",
    tag = "reviews",
    responses(
        (status = 200, body = Vec<Review>, description = "Approved reviews only")
    )
)]
async fn list_reviews(State(context): State<ServerContext>) -> ServerResult<Json<Vec<Review>>> {
    let reviews: Vec<_> = context
        .site
        .database
        .list_reviews()
        .await?
        .into_iter()
        .filter(|r| r.status == ReviewStatus::Approved)
        .collect();

    Ok(Json(reviews.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    tag = "reviews",
    request_body = ReviewSchema,
    responses(
        (status = 200, body = Review, description = "The review awaits moderation")
    )
)]
async fn create_review(
    State(context): State<ServerContext>,
    ValidatedPayload(body): ValidatedPayload<ReviewSchema>,
) -> ServerResult<Json<Review>> {
    let mut fields = Fields::new();
    fields.insert("name".to_string(), body.name.into());
    fields.insert("rating".to_string(), body.rating.into());
    fields.insert("review".to_string(), body.review.into());
    fields.insert("status".to_string(), json!(ReviewStatus::Pending));

    let review = context.site.database.create_review(fields).await?;
    info!("Review {} submitted", review.id);

    Ok(Json(review.to_serialized()))
}

pub fn router() -> Router {
    Router::new().route("/reviews", get(list_reviews).post(create_review))
}
