use crate::error::Error;
use crate::error::Result;

/// Opens a turso database
pub struct Builder {
    path: String,
}

impl Builder {
    /// A local database file, or an in-memory database for `":memory:"`
    pub fn new_local(path: &str) -> Self {
        Self { path: path.to_string() }
    }

    #[tracing::instrument(skip(self), fields(path = %self.path))]
    pub async fn build(self) -> Result<super::database::Database> {
        let db = turso::Builder::new_local(&self.path).build().await.map_err(Error::Connection)?;
        tracing::trace!("database opened");

        Ok(super::database::Database::new(db))
    }
}
