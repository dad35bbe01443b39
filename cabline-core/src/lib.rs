mod auth;
mod db;
mod util;

use std::sync::Arc;

pub use auth::*;
pub use db::*;
pub use util::*;

/// The cabline site backend, bundling storage and authentication.
pub struct Site<Db> {
    pub database: Arc<Db>,
    pub auth: Auth<Db>,
}

impl<Db> Site<Db>
where
    Db: Database,
{
    pub fn new(database: Db) -> Self {
        let database = Arc::new(database);
        let auth = Auth::new(&database);

        Self { database, auth }
    }
}
