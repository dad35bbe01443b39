use std::borrow::BorrowMut;

use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::{admin, auth, bookings, pages, reviews, schemas, serialized, sitemap, vendor};

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::customer_login,
        auth::vendor_login,
        auth::admin_login,
        auth::register,
        auth::logout,
        bookings::create_booking,
        bookings::my_bookings,
        reviews::list_reviews,
        reviews::create_review,
        pages::page,
        vendor::bookings,
        vendor::update_booking,
        vendor::profile,
        vendor::update_profile,
        admin::list_pages,
        admin::page,
        admin::create_page,
        admin::update_page,
        admin::delete_page,
        admin::list_reviews,
        admin::review,
        admin::create_review,
        admin::update_review,
        admin::delete_review,
        admin::list_vendors,
        admin::vendor,
        admin::create_vendor,
        admin::update_vendor,
        admin::delete_vendor,
        sitemap::sitemap,
    ),
    components(schemas(
        schemas::LoginSchema,
        schemas::RegisterSchema,
        schemas::ReviewSchema,
        schemas::BookingStatusSchema,
        schemas::BookingForm,
        schemas::PageInput,
        schemas::VendorInput,
        serialized::Message,
        serialized::LoginResult,
        serialized::Review,
        serialized::Page,
        serialized::Booking,
        serialized::Vendor,
        bookings::BookingCreated,
    )),
    modifiers(&Security),
    info(
        description = "cabline-server exposes the booking, review and account endpoints of the cab site"
    )
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.borrow_mut() {
            let scheme = ApiKey::Cookie(ApiKeyValue::with_description(
                crate::auth::SESSION_COOKIE,
                "Session token set by the login endpoints",
            ));

            components.add_security_scheme("SessionCookie", SecurityScheme::ApiKey(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
