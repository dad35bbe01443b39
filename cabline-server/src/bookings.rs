use axum::{
    extract::State,
    routing::{get, post},
    Json,
};
use cabline_core::{Database, Fields, NewBooking, PrimaryKey, Role};
use log::info;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::{Session, Visitor},
    context::ServerContext,
    errors::ServerResult,
    schemas::{BookingForm, Payload},
    serialized::{Booking, ToSerialized},
    Router,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingCreated {
    message: String,
    /// Id of the new booking
    id: PrimaryKey,
}

#[utoipa::path(
    post,
    path = "/api/booking",
    tag = "bookings",
    request_body = BookingForm,
    responses(
        (status = 200, body = BookingCreated)
    )
)]
async fn create_booking(
    State(context): State<ServerContext>,
    Visitor(identity): Visitor,
    Payload(details): Payload<Fields>,
) -> ServerResult<Json<BookingCreated>> {
    let customer_id = identity.map(|x| x.user_id);

    let booking = context
        .site
        .database
        .create_booking(NewBooking {
            customer_id,
            details,
        })
        .await?;

    info!("Booking {} created", booking.id);

    Ok(Json(BookingCreated {
        message: "Booking successful!".to_string(),
        id: booking.id,
    }))
}

#[utoipa::path(
    get,
    path = "/api/my-bookings",
    tag = "bookings",
    security(
        ("SessionCookie" = [])
    ),
    responses(
        (status = 200, body = Vec<Booking>),
        (status = 401, description = "Not logged in as a customer")
    )
)]
async fn my_bookings(
    State(context): State<ServerContext>,
    session: Session,
) -> ServerResult<Json<Vec<Booking>>> {
    let customer_id = session.user_id_for(Role::Customer)?;
    let bookings = context
        .site
        .database
        .bookings_by_customer(customer_id)
        .await?;

    Ok(Json(bookings.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/booking", post(create_booking))
        .route("/my-bookings", get(my_bookings))
}
