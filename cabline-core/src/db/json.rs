use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{fs, sync::Mutex};

use crate::{
    shallow_merge, time_based_id, AccountData, AdminData, BookingData, BookingStatus,
    CustomerData, Database, DatabaseError, DatabaseResult, Fields, IntoDatabaseError, NewBooking,
    NewCustomer, NewSession, PageData, PrimaryKey, Record, Result, ReviewData, Role, SessionData,
    VendorData,
};

/// The whole state of the site, as stored on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, alias = "users")]
    pub customers: Vec<CustomerData>,
    #[serde(default)]
    pub vendors: Vec<VendorData>,
    #[serde(default)]
    pub admins: Vec<AdminData>,
    #[serde(default)]
    pub sessions: Vec<SessionData>,
    #[serde(default)]
    pub bookings: Vec<BookingData>,
    #[serde(default)]
    pub reviews: Vec<ReviewData>,
    #[serde(default)]
    pub pages: Vec<PageData>,
    /// Top-level keys this version doesn't know about, kept as-is
    #[serde(flatten)]
    pub other: Fields,
}

/// A database backed by a single JSON document.
///
/// Every operation loads the whole document, applies its change and writes the
/// whole document back while holding the lock, so concurrent requests never
/// lose each other's updates. Writes go through a temporary file that is
/// renamed over the data file.
pub struct JsonDatabase {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonDatabase {
    /// Opens the document at `path`, creating an empty one if it doesn't exist
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let database = Self {
            path: path.into(),
            lock: Mutex::new(()),
        };

        match fs::metadata(&database.path).await {
            Ok(_) => {
                // Fail early if the document is unreadable
                database.load().await?;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if let Some(parent) = database.path.parent() {
                    if !parent.as_os_str().is_empty() {
                        fs::create_dir_all(parent).await.map_err(|e| e.any())?;
                    }
                }

                database.save(&Document::default()).await?;
                info!("Created empty data file at {}", database.path.display());
            }
            Err(e) => return Err(e.any()),
        }

        Ok(database)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a copy of the current document
    pub async fn snapshot(&self) -> Result<Document> {
        self.read(|doc| Ok(doc.clone())).await
    }

    async fn read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Document) -> Result<T> + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;
        let document = self.load().await?;

        f(&document)
    }

    /// Applies `f` to the document and saves it, unless `f` fails
    async fn write<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Document) -> Result<T> + Send,
        T: Send,
    {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;

        let result = f(&mut document)?;
        self.save(&document).await?;

        Ok(result)
    }

    async fn load(&self) -> Result<Document> {
        let bytes = fs::read(&self.path).await.map_err(|e| e.any())?;

        serde_json::from_slice(&bytes).map_err(|e| e.any())
    }

    async fn save(&self, document: &Document) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(document).map_err(|e| e.any())?;

        let mut temporary = self.path.clone().into_os_string();
        temporary.push(".tmp");
        let temporary = PathBuf::from(temporary);

        fs::write(&temporary, bytes).await.map_err(|e| e.any())?;
        fs::rename(&temporary, &self.path)
            .await
            .map_err(|e| e.any())
    }
}

fn not_found<T: Record>() -> DatabaseError {
    DatabaseError::NotFound {
        resource: T::RESOURCE,
        identifier: "id",
    }
}

fn by_id<T: Record>(records: &[T], id: PrimaryKey) -> Result<&T> {
    records
        .iter()
        .find(|r| r.id() == id)
        .ok_or_else(not_found::<T>)
}

fn by_id_mut<T: Record>(records: &mut [T], id: PrimaryKey) -> Result<&mut T> {
    records
        .iter_mut()
        .find(|r| r.id() == id)
        .ok_or_else(not_found::<T>)
}

fn from_fields<T: Record>(fields: Fields) -> Result<T> {
    serde_json::from_value(Value::Object(fields)).map_err(|e| DatabaseError::Invalid {
        resource: T::RESOURCE,
        reason: e.to_string(),
    })
}

/// Creates a record with a fresh id from submitted fields
fn build<T: Record>(fields: Fields) -> Result<T> {
    let mut record = Fields::new();
    record.insert("id".to_string(), time_based_id().into());
    shallow_merge(&mut record, fields);

    from_fields(record)
}

/// Returns `record` with `patch` shallowly merged over it
fn merged<T: Record>(record: &T, patch: Fields) -> Result<T> {
    let mut fields = match serde_json::to_value(record).map_err(|e| e.any())? {
        Value::Object(fields) => fields,
        other => {
            return Err(DatabaseError::Invalid {
                resource: T::RESOURCE,
                reason: format!("expected an object, got {other}"),
            })
        }
    };

    shallow_merge(&mut fields, patch);
    from_fields(fields)
}

fn update<T: Record>(records: &mut [T], id: PrimaryKey, patch: Fields) -> Result<T> {
    let record = by_id_mut(records, id)?;
    let updated = merged(record, patch)?;

    *record = updated.clone();
    Ok(updated)
}

fn ensure_unique<T>(
    records: &[T],
    resource: &'static str,
    field: &'static str,
    value: &str,
    is_taken: impl Fn(&T) -> bool,
) -> Result<()> {
    records
        .iter()
        .find(|r| is_taken(r))
        .ok_or(DatabaseError::NotFound {
            resource,
            identifier: field,
        })
        .conflict_or_ok(resource, field, value)
}

#[async_trait]
impl Database for JsonDatabase {
    async fn account(&self, role: Role, identifier: &str) -> Result<AccountData> {
        self.read(|doc| {
            let found = match role {
                Role::Customer => doc
                    .customers
                    .iter()
                    .find(|c| c.email == identifier)
                    .map(|c| (c.id, c.password.clone())),
                Role::Vendor => doc
                    .vendors
                    .iter()
                    .find(|v| v.email == identifier)
                    .map(|v| (v.id, v.password.clone())),
                Role::Admin => doc
                    .admins
                    .iter()
                    .find(|a| a.username == identifier)
                    .map(|a| (a.id, a.password.clone())),
            };

            found
                .map(|(id, password)| AccountData { id, role, password })
                .ok_or(DatabaseError::NotFound {
                    resource: role.as_str(),
                    identifier: role.identifier_field(),
                })
        })
        .await
    }

    async fn set_password(&self, role: Role, id: PrimaryKey, password: String) -> Result<()> {
        self.write(move |doc| {
            let stored = match role {
                Role::Customer => doc
                    .customers
                    .iter_mut()
                    .find(|c| c.id == id)
                    .map(|c| &mut c.password),
                Role::Vendor => doc
                    .vendors
                    .iter_mut()
                    .find(|v| v.id == id)
                    .map(|v| &mut v.password),
                Role::Admin => doc
                    .admins
                    .iter_mut()
                    .find(|a| a.id == id)
                    .map(|a| &mut a.password),
            };

            let stored = stored.ok_or(DatabaseError::NotFound {
                resource: role.as_str(),
                identifier: "id",
            })?;

            *stored = password;
            Ok(())
        })
        .await
    }

    async fn create_customer(&self, new_customer: NewCustomer) -> Result<CustomerData> {
        self.write(move |doc| {
            ensure_unique(
                &doc.customers,
                "customer",
                "email",
                &new_customer.email,
                |c| c.email == new_customer.email,
            )?;

            let customer = CustomerData {
                id: time_based_id(),
                name: new_customer.name,
                email: new_customer.email,
                password: new_customer.password,
                extra: Fields::new(),
            };

            doc.customers.push(customer.clone());
            Ok(customer)
        })
        .await
    }

    async fn vendor_by_id(&self, vendor_id: PrimaryKey) -> Result<VendorData> {
        self.read(|doc| by_id(&doc.vendors, vendor_id).cloned())
            .await
    }

    async fn list_vendors(&self) -> Result<Vec<VendorData>> {
        self.read(|doc| Ok(doc.vendors.clone())).await
    }

    async fn create_vendor(&self, fields: Fields) -> Result<VendorData> {
        self.write(move |doc| {
            let vendor: VendorData = build(fields)?;

            ensure_unique(&doc.vendors, "vendor", "email", &vendor.email, |v| {
                v.email == vendor.email
            })?;

            doc.vendors.push(vendor.clone());
            Ok(vendor)
        })
        .await
    }

    async fn update_vendor(&self, vendor_id: PrimaryKey, fields: Fields) -> Result<VendorData> {
        self.write(move |doc| {
            let updated = merged(by_id(&doc.vendors, vendor_id)?, fields)?;

            ensure_unique(&doc.vendors, "vendor", "email", &updated.email, |v| {
                v.id != vendor_id && v.email == updated.email
            })?;

            *by_id_mut(&mut doc.vendors, vendor_id)? = updated.clone();
            Ok(updated)
        })
        .await
    }

    async fn delete_vendor(&self, vendor_id: PrimaryKey) -> Result<()> {
        self.write(move |doc| {
            doc.vendors.retain(|v| v.id != vendor_id);
            doc.sessions
                .retain(|s| !(s.role == Role::Vendor && s.user_id == vendor_id));

            Ok(())
        })
        .await
    }

    async fn session_by_token(&self, token: &str) -> Result<SessionData> {
        self.read(|doc| {
            doc.sessions
                .iter()
                .find(|s| s.token == token)
                .cloned()
                .ok_or(DatabaseError::NotFound {
                    resource: "session",
                    identifier: "token",
                })
        })
        .await
    }

    async fn create_session(&self, new_session: NewSession) -> Result<SessionData> {
        self.write(move |doc| {
            ensure_unique(
                &doc.sessions,
                "session",
                "token",
                &new_session.token,
                |s| s.token == new_session.token,
            )?;

            let session = SessionData {
                token: new_session.token,
                user_id: new_session.user_id,
                role: new_session.role,
            };

            doc.sessions.push(session.clone());
            Ok(session)
        })
        .await
    }

    async fn delete_sessions_by_token(&self, token: &str) -> Result<()> {
        self.write(|doc| {
            doc.sessions.retain(|s| s.token != token);
            Ok(())
        })
        .await
    }

    async fn list_bookings(&self) -> Result<Vec<BookingData>> {
        self.read(|doc| Ok(doc.bookings.clone())).await
    }

    async fn bookings_by_customer(&self, customer_id: PrimaryKey) -> Result<Vec<BookingData>> {
        self.read(|doc| {
            Ok(doc
                .bookings
                .iter()
                .filter(|b| b.customer_id == Some(customer_id))
                .cloned()
                .collect())
        })
        .await
    }

    async fn create_booking(&self, new_booking: NewBooking) -> Result<BookingData> {
        let mut details = new_booking.details;

        // These are stamped by the server, never taken from the form
        for key in ["id", "status", "customerId"] {
            details.remove(key);
        }

        let booking = BookingData {
            id: time_based_id(),
            status: BookingStatus::Pending,
            customer_id: new_booking.customer_id,
            details,
        };

        self.write(move |doc| {
            doc.bookings.push(booking.clone());
            Ok(booking)
        })
        .await
    }

    async fn update_booking_status(
        &self,
        booking_id: PrimaryKey,
        status: BookingStatus,
    ) -> Result<BookingData> {
        self.write(move |doc| {
            let booking = by_id_mut(&mut doc.bookings, booking_id)?;
            booking.status = status;

            Ok(booking.clone())
        })
        .await
    }

    async fn list_reviews(&self) -> Result<Vec<ReviewData>> {
        self.read(|doc| Ok(doc.reviews.clone())).await
    }

    async fn review_by_id(&self, review_id: PrimaryKey) -> Result<ReviewData> {
        self.read(|doc| by_id(&doc.reviews, review_id).cloned())
            .await
    }

    async fn create_review(&self, fields: Fields) -> Result<ReviewData> {
        self.write(move |doc| {
            let review: ReviewData = build(fields)?;

            doc.reviews.push(review.clone());
            Ok(review)
        })
        .await
    }

    async fn update_review(&self, review_id: PrimaryKey, fields: Fields) -> Result<ReviewData> {
        self.write(move |doc| update(&mut doc.reviews, review_id, fields))
            .await
    }

    async fn delete_review(&self, review_id: PrimaryKey) -> Result<()> {
        self.write(move |doc| {
            doc.reviews.retain(|r| r.id != review_id);
            Ok(())
        })
        .await
    }

    async fn list_pages(&self) -> Result<Vec<PageData>> {
        self.read(|doc| Ok(doc.pages.clone())).await
    }

    async fn page_by_id(&self, page_id: PrimaryKey) -> Result<PageData> {
        self.read(|doc| by_id(&doc.pages, page_id).cloned()).await
    }

    async fn page_by_slug(&self, slug: &str) -> Result<PageData> {
        self.read(|doc| {
            doc.pages
                .iter()
                .find(|p| p.slug == slug)
                .cloned()
                .ok_or(DatabaseError::NotFound {
                    resource: "page",
                    identifier: "slug",
                })
        })
        .await
    }

    async fn create_page(&self, fields: Fields) -> Result<PageData> {
        self.write(move |doc| {
            let page: PageData = build(fields)?;

            ensure_unique(&doc.pages, "page", "slug", &page.slug, |p| {
                p.slug == page.slug
            })?;

            doc.pages.push(page.clone());
            Ok(page)
        })
        .await
    }

    async fn update_page(&self, page_id: PrimaryKey, fields: Fields) -> Result<PageData> {
        self.write(move |doc| {
            let updated = merged(by_id(&doc.pages, page_id)?, fields)?;

            ensure_unique(&doc.pages, "page", "slug", &updated.slug, |p| {
                p.id != page_id && p.slug == updated.slug
            })?;

            *by_id_mut(&mut doc.pages, page_id)? = updated.clone();
            Ok(updated)
        })
        .await
    }

    async fn delete_page(&self, page_id: PrimaryKey) -> Result<()> {
        self.write(move |doc| {
            doc.pages.retain(|p| p.id != page_id);
            Ok(())
        })
        .await
    }
}
