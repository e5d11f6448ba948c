//! Turso connection and its [`Driver`] implementation

pub(crate) mod builder;
pub(crate) mod cursor;
pub(crate) mod database;

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::batch;
use crate::driver::Cursor;
use crate::driver::Driver;
use crate::driver::DriverFamily;
use crate::error::Error;
use crate::error::Result;
use crate::params::Params;
use crate::session::Session;

pub use builder::Builder;
pub use database::Database;

#[derive(Debug, Clone)]
pub struct Connection {
    inner: turso::Connection,
}

impl Connection {
    fn new(inner: turso::Connection) -> Self {
        Self { inner }
    }

    /// A mapping session over this connection
    pub fn session(&self) -> Session<'_, Self> {
        Session::new(self)
    }

    /// Run several statements without reading any rows
    pub async fn execute_batch(&self, sql: &str) -> Result<()> {
        self.inner.execute_batch(sql).await.map_err(Error::Command)
    }
}

#[async_trait]
impl Driver for Connection {
    fn family(&self) -> DriverFamily {
        DriverFamily::Sqlite
    }

    async fn execute(&self, sql: &str, params: Params) -> Result<u64> {
        let statements = batch::split(sql);
        if statements.len() <= 1 {
            let params = match params {
                Params::Named(pairs) => batch::bind_named(&pairs, &batch::census(sql), true),
                other => other,
            };
            return self.inner.execute(sql, turso::params::Params::from(params)).await.map_err(Error::Command);
        }

        // turso's execute stops after the first statement of the text
        let params = batch::distribute(&statements, params);
        tracing::trace!(statements = statements.len(), "executing batch");

        let mut affected = 0;
        for (statement, params) in statements.iter().zip(params) {
            affected += self
                .inner
                .execute(statement.sql, turso::params::Params::from(params))
                .await
                .map_err(Error::Command)?;
        }
        Ok(affected)
    }

    async fn query<'a>(&'a self, sql: &str, params: Params) -> Result<Box<dyn Cursor + 'a>> {
        let params = match params {
            Params::Named(pairs) => batch::bind_named(&pairs, &batch::census(sql), true),
            other => other,
        };
        let pending = VecDeque::from([(sql.to_string(), params)]);
        let cursor = cursor::TursoCursor::open(&self.inner, pending).await?;
        Ok(Box::new(cursor))
    }

    async fn query_batch<'a>(&'a self, sql: &str, params: Params) -> Result<Box<dyn Cursor + 'a>> {
        let statements = batch::split(sql);
        let params = batch::distribute(&statements, params);
        tracing::trace!(statements = statements.len(), "opening batch");

        let pending: VecDeque<_> = statements.iter().map(|s| s.sql.to_string()).zip(params).collect();
        let cursor = cursor::TursoCursor::open(&self.inner, pending).await?;
        Ok(Box::new(cursor))
    }
}
