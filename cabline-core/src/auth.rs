use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use log::{info, warn};
use rand::rngs::OsRng;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::{
    util::session_token, CustomerData, Database, DatabaseError, Fields, NewCustomer, NewSession,
    PrimaryKey, Role, SessionData, VendorData,
};

pub struct Auth<Db> {
    db: Arc<Db>,
    argon: Argon2<'static>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    /// Identifier or password is incorrect
    #[error("Invalid credentials")]
    InvalidCredentials,
    /// Something else went wrong with the database
    #[error(transparent)]
    Db(DatabaseError),
    #[error("HashError: {0}")]
    HashError(String),
}

/// Who a request is made by, resolved from its session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: PrimaryKey,
    pub role: Role,
}

impl From<&SessionData> for Identity {
    fn from(session: &SessionData) -> Self {
        Self {
            user_id: session.user_id,
            role: session.role,
        }
    }
}

/// How a stored password matched
enum Verified {
    Hashed,
    /// The stored password was plaintext and should be rehashed
    Legacy,
}

impl<Db> Auth<Db>
where
    Db: Database,
{
    pub fn new(db: &Arc<Db>) -> Self {
        Self {
            db: db.clone(),
            argon: Argon2::default(),
        }
    }

    /// Logs in an account of the given role, returning a new session.
    /// Existing sessions of the account stay valid.
    pub async fn login(&self, role: Role, credentials: Credentials) -> Result<SessionData, AuthError> {
        let account = self
            .db
            .account(role, &credentials.identifier)
            .await
            .map_err(|e| match e {
                DatabaseError::NotFound {
                    resource: _,
                    identifier: _,
                } => AuthError::InvalidCredentials,
                err => AuthError::Db(err),
            })?;

        if let Verified::Legacy = self.verify(&account.password, &credentials.password)? {
            let hashed_password = self.hash_password(&credentials.password)?;

            self.db
                .set_password(role, account.id, hashed_password)
                .await
                .map_err(AuthError::Db)?;

            warn!("Rehashed plaintext password of {} {}", role, account.id);
        }

        let new_session = NewSession {
            token: session_token(),
            user_id: account.id,
            role,
        };

        let session = self
            .db
            .create_session(new_session)
            .await
            .map_err(AuthError::Db)?;

        info!("{} {} logged in", role, account.id);
        Ok(session)
    }

    /// Deletes every session with this token, if any
    pub async fn logout(&self, token: &str) -> Result<(), DatabaseError> {
        self.db.delete_sessions_by_token(token).await
    }

    /// Resolves a session token into an identity. Unknown tokens resolve to [None].
    pub async fn identify(&self, token: &str) -> Result<Option<Identity>, DatabaseError> {
        match self.db.session_by_token(token).await {
            Ok(session) => Ok(Some(Identity::from(&session))),
            Err(DatabaseError::NotFound {
                resource: _,
                identifier: _,
            }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Creates a customer account
    pub async fn register_customer(
        &self,
        new_customer: NewPlainCustomer,
    ) -> Result<CustomerData, AuthError> {
        let password = self.hash_password(&new_customer.password)?;

        let customer = self
            .db
            .create_customer(NewCustomer {
                name: new_customer.name,
                email: new_customer.email,
                password,
            })
            .await
            .map_err(AuthError::Db)?;

        info!("Registered customer {}", customer.id);
        Ok(customer)
    }

    /// Creates a vendor from submitted fields, hashing its password
    pub async fn create_vendor(&self, mut fields: Fields) -> Result<VendorData, AuthError> {
        self.hash_password_field(&mut fields)?;
        self.db.create_vendor(fields).await.map_err(AuthError::Db)
    }

    /// Updates a vendor from submitted fields.
    /// An empty or missing password leaves the stored one unchanged.
    pub async fn update_vendor(
        &self,
        vendor_id: PrimaryKey,
        mut fields: Fields,
    ) -> Result<VendorData, AuthError> {
        self.hash_password_field(&mut fields)?;
        self.db
            .update_vendor(vendor_id, fields)
            .await
            .map_err(AuthError::Db)
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::HashError(e.to_string()))
    }

    /// Replaces a non-empty `password` field with its hash, and drops an empty one
    fn hash_password_field(&self, fields: &mut Fields) -> Result<(), AuthError> {
        let password = match fields.remove("password") {
            Some(Value::String(password)) if !password.is_empty() => password,
            _ => return Ok(()),
        };

        let hashed = self.hash_password(&password)?;
        fields.insert("password".to_string(), hashed.into());

        Ok(())
    }

    fn verify(&self, stored: &str, incoming: &str) -> Result<Verified, AuthError> {
        if stored.is_empty() || incoming.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        match PasswordHash::parse(stored, Encoding::default()) {
            Ok(stored_password) => self
                .argon
                .verify_password(incoming.as_bytes(), &stored_password)
                .map(|_| Verified::Hashed)
                .map_err(|_| AuthError::InvalidCredentials),
            // Not a PHC string, so this account predates hashing
            Err(_) if stored == incoming => Ok(Verified::Legacy),
            Err(_) => Err(AuthError::InvalidCredentials),
        }
    }
}

#[derive(Debug)]
pub struct Credentials {
    /// Email for customers and vendors, username for admins
    pub identifier: String,
    pub password: String,
}

#[derive(Debug)]
pub struct NewPlainCustomer {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::JsonDatabase;

    async fn auth() -> (TempDir, Arc<JsonDatabase>, Auth<JsonDatabase>) {
        let dir = tempfile::tempdir().expect("tempdir");
        let database = JsonDatabase::open(dir.path().join("db.json"))
            .await
            .expect("database opens");
        let database = Arc::new(database);
        let auth = Auth::new(&database);

        (dir, database, auth)
    }

    fn credentials(identifier: &str, password: &str) -> Credentials {
        Credentials {
            identifier: identifier.to_string(),
            password: password.to_string(),
        }
    }

    async fn register(auth: &Auth<JsonDatabase>) -> CustomerData {
        auth.register_customer(NewPlainCustomer {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "p".to_string(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_creates_one_session_per_login() {
        let (_dir, database, auth) = auth().await;
        let customer = register(&auth).await;

        assert_ne!(customer.password, "p", "passwords should be stored hashed");

        let first = auth
            .login(Role::Customer, credentials("a@x.com", "p"))
            .await
            .unwrap();
        let second = auth
            .login(Role::Customer, credentials("a@x.com", "p"))
            .await
            .unwrap();

        assert_ne!(first.token, second.token);
        assert_eq!(first.token.len(), 32);

        let sessions = database.snapshot().await.unwrap().sessions;
        assert_eq!(sessions.len(), 2, "older sessions should stay valid");

        let identity = auth.identify(&first.token).await.unwrap();
        assert_eq!(
            identity,
            Some(Identity {
                user_id: customer.id,
                role: Role::Customer
            })
        );
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let (_dir, database, auth) = auth().await;
        register(&auth).await;

        let wrong_password = auth
            .login(Role::Customer, credentials("a@x.com", "nope"))
            .await;
        let unknown = auth
            .login(Role::Customer, credentials("b@x.com", "p"))
            .await;
        // Customers can't log in through the vendor login
        let wrong_role = auth.login(Role::Vendor, credentials("a@x.com", "p")).await;

        for result in [wrong_password, unknown, wrong_role] {
            assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        }

        assert!(database.snapshot().await.unwrap().sessions.is_empty());
    }

    #[tokio::test]
    async fn test_legacy_passwords_are_rehashed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");

        std::fs::write(
            &path,
            serde_json::to_vec(&json!({
                "admins": [{ "id": 1, "username": "root", "password": "secret" }]
            }))
            .unwrap(),
        )
        .unwrap();

        let database = Arc::new(JsonDatabase::open(&path).await.unwrap());
        let auth = Auth::new(&database);

        auth.login(Role::Admin, credentials("root", "secret"))
            .await
            .unwrap();

        let stored = database.snapshot().await.unwrap().admins[0].password.clone();
        assert!(stored.starts_with("$argon2"), "password should be rehashed");

        // Still works after rehashing
        auth.login(Role::Admin, credentials("root", "secret"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_token_has_no_identity() {
        let (_dir, _database, auth) = auth().await;

        assert_eq!(auth.identify("does-not-exist").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_removes_session() {
        let (_dir, _database, auth) = auth().await;
        register(&auth).await;

        let session = auth
            .login(Role::Customer, credentials("a@x.com", "p"))
            .await
            .unwrap();

        auth.logout(&session.token).await.unwrap();
        assert_eq!(auth.identify(&session.token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_vendor_password_updates() {
        let (_dir, _database, auth) = auth().await;

        let fields = |value: serde_json::Value| value.as_object().cloned().unwrap();

        let vendor = auth
            .create_vendor(fields(json!({ "email": "v@x.com", "password": "first" })))
            .await
            .unwrap();

        let unchanged = auth
            .update_vendor(vendor.id, fields(json!({ "name": "Fleet", "password": "" })))
            .await
            .unwrap();
        assert_eq!(unchanged.password, vendor.password);
        assert_eq!(unchanged.name, "Fleet");

        let changed = auth
            .update_vendor(vendor.id, fields(json!({ "password": "second" })))
            .await
            .unwrap();
        assert_ne!(changed.password, vendor.password);

        auth.login(Role::Vendor, credentials("v@x.com", "second"))
            .await
            .unwrap();
        assert!(auth
            .login(Role::Vendor, credentials("v@x.com", "first"))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_empty_passwords_never_match() {
        let (_dir, _database, auth) = auth().await;

        let fields = json!({ "email": "v@x.com" }).as_object().cloned().unwrap();
        auth.create_vendor(fields).await.unwrap();

        let result = auth.login(Role::Vendor, credentials("v@x.com", "")).await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }
}
