use crate::error::Error;
use crate::error::Result;

#[derive(Clone)]
pub struct Database {
    db: turso::Database,
}

impl Database {
    pub(super) fn new(db: turso::Database) -> Self {
        Self { db }
    }

    pub fn connect(&self) -> Result<super::Connection> {
        let conn = self.db.connect().map_err(Error::Connection)?;
        Ok(super::Connection::new(conn))
    }
}
