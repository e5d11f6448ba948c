//! Driver contract
//!
//! The mapper never talks to a database directly. It issues commands through
//! a [`Driver`] and reads rows from the [`Cursor`]s it hands back. The turso
//! [`Connection`](crate::Connection) is the bundled implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::params::Params;
use crate::settings::NullConversion;
use crate::value::Value;

/// Database family a driver belongs to
///
/// Families disagree about what a null should turn into; see
/// [`DriverFamily::null_conversion`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverFamily {
    Sqlite,
    Other,
}

impl DriverFamily {
    /// Null handling used when the session's settings don't choose one
    pub fn null_conversion(self) -> NullConversion {
        match self {
            DriverFamily::Sqlite => NullConversion::AllTypes,
            DriverFamily::Other => NullConversion::TextOnly,
        }
    }
}

#[async_trait]
pub trait Driver: Send + Sync {
    fn family(&self) -> DriverFamily;

    /// Run a command that produces no rows, returning the affected row count
    async fn execute(&self, sql: &str, params: Params) -> Result<u64>;

    /// Run a query producing exactly one result set
    async fn query<'a>(&'a self, sql: &str, params: Params) -> Result<Box<dyn Cursor + 'a>>;

    /// Run a batch of statements, one result set per row-producing statement
    ///
    /// The returned cursor is positioned on the first result set.
    async fn query_batch<'a>(&'a self, sql: &str, params: Params) -> Result<Box<dyn Cursor + 'a>>;
}

/// Forward-only cursor over one or more result sets
#[async_trait]
pub trait Cursor: Send {
    /// Column names of the current result set, in driver order
    ///
    /// Empty when there is no current result set.
    fn columns(&self) -> &[String];

    /// Next row of the current result set, `None` once it is exhausted
    async fn next_row(&mut self) -> Result<Option<Vec<Value>>>;

    /// Discard what is left of the current result set and move to the next
    ///
    /// Returns `false` when there are no more result sets.
    async fn next_result(&mut self) -> Result<bool>;

    /// Number of statements of the batch that have not run yet
    fn pending(&self) -> usize {
        0
    }

    /// Run the rest of the batch, discarding every row it produces
    async fn finish(&mut self) -> Result<()> {
        loop {
            while self.next_row().await?.is_some() {}
            if !self.next_result().await? {
                return Ok(());
            }
        }
    }
}
