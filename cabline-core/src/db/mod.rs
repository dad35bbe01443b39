use async_trait::async_trait;
use thiserror::Error;

mod data;
pub use data::*;

mod json;
pub use json::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource already exists
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        /// The resource in question
        resource: &'static str,
        /// The field that is conflicting
        field: &'static str,
        /// The conflicting value
        value: String,
    },
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    /// The submitted fields don't make up a valid record
    #[error("{resource} is invalid: {reason}")]
    Invalid {
        resource: &'static str,
        reason: String,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn any(self) -> DatabaseError;
}

/// Helper trait to reduce boilerplate
pub trait DatabaseResult {
    /// Turns the Result into a conflict error if it's Ok()
    fn conflict_or_ok(self, resource: &'static str, field: &'static str, value: &str)
        -> Result<()>;
}

impl<T> DatabaseResult for Result<T> {
    fn conflict_or_ok(
        self,
        resource: &'static str,
        field: &'static str,
        value: &str,
    ) -> Result<()> {
        match self {
            Ok(_) => Err(DatabaseError::Conflict {
                resource,
                field,
                value: value.to_string(),
            }),
            Err(e) => match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => Ok(()),
                e => Err(e),
            },
        }
    }
}

impl IntoDatabaseError for std::io::Error {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }
}

impl IntoDatabaseError for serde_json::Error {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }
}

/// Represents a type that can fetch and persist cabline data
#[async_trait]
pub trait Database: Send + Sync {
    /// Finds the credentials of an account by its role-specific identifier
    async fn account(&self, role: Role, identifier: &str) -> Result<AccountData>;
    async fn set_password(&self, role: Role, id: PrimaryKey, password: String) -> Result<()>;

    async fn create_customer(&self, new_customer: NewCustomer) -> Result<CustomerData>;

    async fn vendor_by_id(&self, vendor_id: PrimaryKey) -> Result<VendorData>;
    async fn list_vendors(&self) -> Result<Vec<VendorData>>;
    async fn create_vendor(&self, fields: Fields) -> Result<VendorData>;
    async fn update_vendor(&self, vendor_id: PrimaryKey, fields: Fields) -> Result<VendorData>;
    /// Deletes a vendor along with its sessions. Deleting a missing vendor is not an error.
    async fn delete_vendor(&self, vendor_id: PrimaryKey) -> Result<()>;

    async fn session_by_token(&self, token: &str) -> Result<SessionData>;
    async fn create_session(&self, new_session: NewSession) -> Result<SessionData>;
    async fn delete_sessions_by_token(&self, token: &str) -> Result<()>;

    async fn list_bookings(&self) -> Result<Vec<BookingData>>;
    async fn bookings_by_customer(&self, customer_id: PrimaryKey) -> Result<Vec<BookingData>>;
    async fn create_booking(&self, new_booking: NewBooking) -> Result<BookingData>;
    async fn update_booking_status(
        &self,
        booking_id: PrimaryKey,
        status: BookingStatus,
    ) -> Result<BookingData>;

    async fn list_reviews(&self) -> Result<Vec<ReviewData>>;
    async fn review_by_id(&self, review_id: PrimaryKey) -> Result<ReviewData>;
    async fn create_review(&self, fields: Fields) -> Result<ReviewData>;
    async fn update_review(&self, review_id: PrimaryKey, fields: Fields) -> Result<ReviewData>;
    async fn delete_review(&self, review_id: PrimaryKey) -> Result<()>;

    async fn list_pages(&self) -> Result<Vec<PageData>>;
    async fn page_by_id(&self, page_id: PrimaryKey) -> Result<PageData>;
    async fn page_by_slug(&self, slug: &str) -> Result<PageData>;
    async fn create_page(&self, fields: Fields) -> Result<PageData>;
    async fn update_page(&self, page_id: PrimaryKey, fields: Fields) -> Result<PageData>;
    async fn delete_page(&self, page_id: PrimaryKey) -> Result<()>;
}

#[derive(Debug)]
pub struct NewCustomer {
    pub name: String,
    pub email: String,
    /// Already hashed
    pub password: String,
}

#[derive(Debug)]
pub struct NewSession {
    pub token: String,
    pub user_id: PrimaryKey,
    pub role: Role,
}

#[derive(Debug)]
pub struct NewBooking {
    pub customer_id: Option<PrimaryKey>,
    pub details: Fields,
}
