use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header,
    Form, Json,
};
use cabline_core::{deserialize_rating, BookingStatus, Role};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::{
    openapi::{RefOr, Schema},
    ToSchema,
};
use validator::Validate;

use crate::{errors::ServerError, serialized::free_form_object};

#[derive(Debug, ToSchema, Validate, Deserialize)]
pub struct LoginSchema {
    /// Used by customers and vendors
    #[validate(length(max = 128))]
    pub email: Option<String>,
    /// Used by admins
    #[validate(length(max = 128))]
    pub username: Option<String>,
    #[validate(length(max = 128))]
    pub password: String,
}

impl LoginSchema {
    /// Returns the identifier the given role logs in with
    pub fn identifier(&self, role: Role) -> Option<&str> {
        match role {
            Role::Admin => self.username.as_deref(),
            _ => self.email.as_deref(),
        }
    }
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
pub struct RegisterSchema {
    #[validate(length(max = 128))]
    pub name: String,
    #[validate(length(max = 128))]
    pub email: String,
    #[validate(length(max = 128))]
    pub password: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
pub struct ReviewSchema {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    /// Between 1 and 5, as a number or a numeric string
    #[serde(deserialize_with = "deserialize_rating")]
    pub rating: u8,
    #[validate(length(min = 1, max = 2000))]
    pub review: String,
}

#[derive(Debug, ToSchema, Deserialize)]
pub struct BookingStatusSchema {
    /// One of Pending, Confirmed, Assigned, Completed, Cancelled
    #[schema(value_type = String, example = "Confirmed")]
    pub status: BookingStatus,
}

/// Fields accepted when creating or updating a page
#[allow(dead_code)]
#[derive(Debug, ToSchema, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInput {
    slug: Option<String>,
    title: Option<String>,
    meta_description: Option<String>,
    content: Option<String>,
}

/// Fields accepted when creating or updating a vendor, any other field is stored as-is
#[allow(dead_code)]
#[derive(Debug, ToSchema, Deserialize)]
pub struct VendorInput {
    name: Option<String>,
    email: Option<String>,
    /// Left unchanged if empty
    password: Option<String>,
}

/// Booking form fields, all of which are stored as submitted
pub struct BookingForm;

impl<'s> ToSchema<'s> for BookingForm {
    fn schema() -> (&'s str, RefOr<Schema>) {
        ("BookingForm", free_form_object(&[]))
    }
}

/// A request body that is either urlencoded form data or JSON
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|x| x.to_str().ok())
            .map(|x| x.starts_with("application/json"))
            .unwrap_or(false);

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| ServerError::BadRequest(e.body_text()))?;

            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| ServerError::BadRequest(e.body_text()))?;

            Ok(Self(value))
        }
    }
}

/// A [Payload] that is validated after parsing
pub struct ValidatedPayload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedPayload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Payload(value) = Payload::<T>::from_request(req, state).await?;

        value
            .validate()
            .map_err(|e| ServerError::BadRequest(format!("Request body is invalid: {e}")))?;

        Ok(Self(value))
    }
}
