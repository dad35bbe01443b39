use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json,
};
use cabline_core::{Database, Fields, PrimaryKey, Role};
use log::info;

use crate::{
    auth::Session,
    context::ServerContext,
    errors::ServerResult,
    schemas::{BookingStatusSchema, Payload, VendorInput},
    serialized::{Booking, ToSerialized, Vendor},
    Router,
};

#[utoipa::path(
    get,
    path = "/api/vendor/bookings",
    tag = "vendor",
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Vec<Booking>)
    )
)]
async fn bookings(
    State(context): State<ServerContext>,
    session: Session,
) -> ServerResult<Json<Vec<Booking>>> {
    session.user_id_for(Role::Vendor)?;
    let bookings = context.site.database.list_bookings().await?;

    Ok(Json(bookings.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/api/vendor/bookings/{id}",
    tag = "vendor",
    request_body = BookingStatusSchema,
    params(
        ("id" = u64, Path, description = "Booking id")
    ),
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Booking),
        (status = 404, description = "No such booking")
    )
)]
async fn update_booking(
    State(context): State<ServerContext>,
    session: Session,
    Path(booking_id): Path<PrimaryKey>,
    Payload(body): Payload<BookingStatusSchema>,
) -> ServerResult<Json<Booking>> {
    let vendor_id = session.user_id_for(Role::Vendor)?;
    let booking = context
        .site
        .database
        .update_booking_status(booking_id, body.status)
        .await?;

    info!(
        "Vendor {} set booking {} to {:?}",
        vendor_id, booking.id, booking.status
    );

    Ok(Json(booking.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/api/vendor/profile",
    tag = "vendor",
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Vendor)
    )
)]
async fn profile(
    State(context): State<ServerContext>,
    session: Session,
) -> ServerResult<Json<Vendor>> {
    let vendor_id = session.user_id_for(Role::Vendor)?;
    let vendor = context.site.database.vendor_by_id(vendor_id).await?;

    Ok(Json(vendor.to_serialized()))
}

#[utoipa::path(
    put,
    path = "/api/vendor/profile",
    tag = "vendor",
    request_body = VendorInput,
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Vendor)
    )
)]
async fn update_profile(
    State(context): State<ServerContext>,
    session: Session,
    Payload(mut fields): Payload<Fields>,
) -> ServerResult<Json<Vendor>> {
    let vendor_id = session.user_id_for(Role::Vendor)?;

    // Vendors can not change their own role
    fields.remove("role");

    let vendor = context.site.auth.update_vendor(vendor_id, fields).await?;

    Ok(Json(vendor.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/bookings", get(bookings))
        .route("/bookings/:id", put(update_booking))
        .route("/profile", get(profile).put(update_profile))
}
