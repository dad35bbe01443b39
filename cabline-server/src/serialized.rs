//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use axum::Json;
use cabline_core::{BookingData, Fields, PageData, PrimaryKey, ReviewData, VendorData};
use serde::Serialize;
use utoipa::{
    openapi::{schema::AdditionalProperties, ObjectBuilder, RefOr, Schema, SchemaType},
    ToSchema,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct Message {
    message: String,
}

/// Shorthand for a JSON body with a single message
pub fn message(text: &str) -> Json<Message> {
    Json(Message {
        message: text.to_string(),
    })
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub success: bool,
    /// Where the client should go next
    pub redirect_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Review {
    id: PrimaryKey,
    name: String,
    rating: u8,
    review: String,
    #[schema(example = "approved")]
    status: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    id: PrimaryKey,
    slug: String,
    title: String,
    meta_description: String,
    content: String,
}

/// A booking along with every field the booking form submitted
#[derive(Debug, Serialize)]
pub struct Booking {
    id: PrimaryKey,
    status: String,
    #[serde(rename = "customerId", skip_serializing_if = "Option::is_none")]
    customer_id: Option<PrimaryKey>,
    #[serde(flatten)]
    details: Fields,
}

/// A vendor, without its password
#[derive(Debug, Serialize)]
pub struct Vendor {
    id: PrimaryKey,
    name: String,
    email: String,
    role: String,
    #[serde(flatten)]
    extra: Fields,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl ToSerialized<Review> for ReviewData {
    fn to_serialized(&self) -> Review {
        Review {
            id: self.id,
            name: self.name.clone(),
            rating: self.rating,
            review: self.review.clone(),
            status: wire_name(&self.status),
        }
    }
}

impl ToSerialized<Page> for PageData {
    fn to_serialized(&self) -> Page {
        Page {
            id: self.id,
            slug: self.slug.clone(),
            title: self.title.clone(),
            meta_description: self.meta_description.clone(),
            content: self.content.clone(),
        }
    }
}

impl ToSerialized<Booking> for BookingData {
    fn to_serialized(&self) -> Booking {
        Booking {
            id: self.id,
            status: wire_name(&self.status),
            customer_id: self.customer_id,
            details: self.details.clone(),
        }
    }
}

impl ToSerialized<Vendor> for VendorData {
    fn to_serialized(&self) -> Vendor {
        Vendor {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role.clone(),
            extra: self.extra.clone(),
        }
    }
}

/// The name a unit enum variant is stored under
fn wire_name<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => name,
        _ => String::new(),
    }
}

/// An object schema with the given typed properties that also allows any other field
pub(crate) fn free_form_object(properties: &[(&str, SchemaType, bool)]) -> RefOr<Schema> {
    let mut builder = ObjectBuilder::new();

    for (name, schema_type, required) in properties {
        builder = builder.property(*name, ObjectBuilder::new().schema_type(schema_type.clone()));

        if *required {
            builder = builder.required(*name);
        }
    }

    builder
        .additional_properties(Some(AdditionalProperties::FreeForm(true)))
        .into()
}

impl<'s> ToSchema<'s> for Booking {
    fn schema() -> (&'s str, RefOr<Schema>) {
        (
            "Booking",
            free_form_object(&[
                ("id", SchemaType::Integer, true),
                ("status", SchemaType::String, true),
                ("customerId", SchemaType::Integer, false),
            ]),
        )
    }
}

impl<'s> ToSchema<'s> for Vendor {
    fn schema() -> (&'s str, RefOr<Schema>) {
        (
            "Vendor",
            free_form_object(&[
                ("id", SchemaType::Integer, true),
                ("name", SchemaType::String, true),
                ("email", SchemaType::String, true),
                ("role", SchemaType::String, true),
            ]),
        )
    }
}

#[cfg(test)]
mod test {
    use cabline_core::{BookingStatus, ReviewStatus};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_vendor_hides_password() {
        let vendor: VendorData = serde_json::from_value(json!({
            "id": 1,
            "name": "Fleet",
            "email": "v@x.com",
            "password": "$argon2id$...",
            "phone": "12345"
        }))
        .unwrap();

        let serialized = serde_json::to_value(vendor.to_serialized()).unwrap();

        assert!(serialized.get("password").is_none());
        assert_eq!(serialized["phone"], "12345");
        assert_eq!(serialized["role"], "vendor");
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(wire_name(&BookingStatus::Pending), "Pending");
        assert_eq!(wire_name(&ReviewStatus::Approved), "approved");
    }
}
