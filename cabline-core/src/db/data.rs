use std::fmt::Display;

use serde::{de, de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The type used for primary keys in the database.
pub type PrimaryKey = u64;

/// Free-form fields of a record, as submitted by a form or stored in the document.
pub type Fields = Map<String, Value>;

/// The kind of account a session belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Vendor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Vendor => "vendor",
            Role::Admin => "admin",
        }
    }

    /// The page a visitor is sent to when they need to log in as this role
    pub fn login_page(&self) -> &'static str {
        match self {
            Role::Customer => "/login.html",
            Role::Vendor => "/vendor/login.html",
            Role::Admin => "/admin/login.html",
        }
    }

    /// The page a user of this role lands on after logging in
    pub fn landing_page(&self) -> &'static str {
        match self {
            Role::Customer => "/profile.html",
            Role::Vendor => "/vendor/dashboard.html",
            Role::Admin => "/admin/dashboard.html",
        }
    }

    /// The field accounts of this role log in with
    pub fn identifier_field(&self) -> &'static str {
        match self {
            Role::Admin => "username",
            _ => "email",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer account, created through registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerData {
    pub id: PrimaryKey,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(flatten)]
    pub extra: Fields,
}

/// A vendor account, managed by admins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorData {
    pub id: PrimaryKey,
    #[serde(default)]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_vendor_role")]
    pub role: String,
    #[serde(flatten)]
    pub extra: Fields,
}

fn default_vendor_role() -> String {
    Role::Vendor.to_string()
}

/// An admin account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminData {
    pub id: PrimaryKey,
    pub username: String,
    pub password: String,
    #[serde(flatten)]
    pub extra: Fields,
}

/// The credentials of any account, regardless of role
#[derive(Debug, Clone)]
pub struct AccountData {
    pub id: PrimaryKey,
    pub role: Role,
    /// Either an argon2 PHC string, or a legacy plaintext password
    pub password: String,
}

/// Login session data for authentication
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    /// The session token, or key if you will
    #[serde(rename = "sessionId")]
    pub token: String,
    #[serde(rename = "userId")]
    pub user_id: PrimaryKey,
    /// The role the user logged in as, fixed for the lifetime of the session
    pub role: Role,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    #[default]
    Pending,
    Confirmed,
    Assigned,
    Completed,
    Cancelled,
}

/// A cab booking submitted through one of the booking forms
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingData {
    pub id: PrimaryKey,
    #[serde(default)]
    pub status: BookingStatus,
    /// Id of whoever was logged in when booking, whatever their role
    #[serde(
        rename = "customerId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_id: Option<PrimaryKey>,
    /// Whatever the booking form submitted (pickup, drop, date, phone, etc)
    #[serde(flatten)]
    pub details: Fields,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// A customer review, only shown publicly once approved
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewData {
    pub id: PrimaryKey,
    pub name: String,
    #[serde(deserialize_with = "deserialize_rating")]
    pub rating: u8,
    pub review: String,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(flatten)]
    pub extra: Fields,
}

/// A content page of the site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageData {
    pub id: PrimaryKey,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(rename = "metaDescription", default)]
    pub meta_description: String,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub extra: Fields,
}

/// Older documents and form submissions store ratings as strings
pub fn deserialize_rating<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    let rating = match Raw::deserialize(deserializer)? {
        Raw::Number(number) => number,
        Raw::Text(text) => text.trim().parse().map_err(de::Error::custom)?,
    };

    match u8::try_from(rating) {
        Ok(rating) if (1..=5).contains(&rating) => Ok(rating),
        _ => Err(de::Error::custom(format!(
            "rating must be between 1 and 5, got {rating}"
        ))),
    }
}

/// A record in one of the id-keyed collections of the document
pub trait Record: Clone + Serialize + DeserializeOwned + Send {
    /// Name of the resource, used in errors
    const RESOURCE: &'static str;

    fn id(&self) -> PrimaryKey;
}

impl Record for VendorData {
    const RESOURCE: &'static str = "vendor";

    fn id(&self) -> PrimaryKey {
        self.id
    }
}

impl Record for BookingData {
    const RESOURCE: &'static str = "booking";

    fn id(&self) -> PrimaryKey {
        self.id
    }
}

impl Record for ReviewData {
    const RESOURCE: &'static str = "review";

    fn id(&self) -> PrimaryKey {
        self.id
    }
}

impl Record for PageData {
    const RESOURCE: &'static str = "page";

    fn id(&self) -> PrimaryKey {
        self.id
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_booking_keeps_form_fields() {
        let booking: BookingData = serde_json::from_value(json!({
            "id": 1700000000000u64,
            "status": "Pending",
            "pickup": "Airport",
            "phone": "9999999999"
        }))
        .unwrap();

        assert_eq!(booking.customer_id, None);
        assert_eq!(booking.details["pickup"], "Airport");

        let value = serde_json::to_value(&booking).unwrap();
        assert!(
            value.get("customerId").is_none(),
            "anonymous bookings should not serialize a customerId"
        );
        assert_eq!(value["phone"], "9999999999");
    }

    #[test]
    fn test_rating_accepts_strings() {
        let review: ReviewData = serde_json::from_value(json!({
            "id": 1,
            "name": "A",
            "rating": "4",
            "review": "Smooth ride"
        }))
        .unwrap();

        assert_eq!(review.rating, 4);
        assert_eq!(review.status, ReviewStatus::Pending);

        let out_of_range = serde_json::from_value::<ReviewData>(json!({
            "id": 1,
            "name": "A",
            "rating": 9,
            "review": "?"
        }));
        assert!(out_of_range.is_err(), "ratings above 5 should be rejected");
    }

    #[test]
    fn test_session_wire_names() {
        let session = SessionData {
            token: "abc".to_string(),
            user_id: 7,
            role: Role::Vendor,
        };

        assert_eq!(
            serde_json::to_value(&session).unwrap(),
            json!({ "sessionId": "abc", "userId": 7, "role": "vendor" })
        );
    }

    #[test]
    fn test_vendor_role_defaults() {
        let vendor: VendorData =
            serde_json::from_value(json!({ "id": 2, "email": "v@x.com" })).unwrap();

        assert_eq!(vendor.role, "vendor");
        assert!(vendor.password.is_empty());
    }
}
