//! Blocking mapping surface
//!
//! The same operations as [`crate::Session`], driven to completion on a
//! current-thread tokio runtime owned by the [`Connection`]. Streams become
//! plain iterators of `Result<T>`.
//!
//! These types block the calling thread and must not be used from inside an
//! async runtime.
//!
//! ```ignore
//! use tursomap::blocking::Connection;
//!
//! let conn = Connection::open(":memory:")?;
//! let session = conn.session();
//! session.execute("CREATE TABLE t (n INTEGER)", ())?;
//! let total: i64 = session.single("SELECT sum(n) FROM t", ())?;
//! ```

use std::time::Duration;

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use crate::bind::FromRow;
use crate::connection::Builder;
use crate::driver::Driver;
use crate::error::Error;
use crate::error::Result;
use crate::multi::ReaderState;
use crate::params::IntoParams;
use crate::settings::Settings;
use crate::stream::RowStream;

/// A turso connection paired with the runtime that drives it
pub struct Connection {
    inner:   crate::Connection,
    runtime: Runtime,
}

impl Connection {
    /// Open a local database at `path` (`":memory:"` for an in-memory one)
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with(Builder::new_local(path))
    }

    pub fn open_with(builder: Builder) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_time().build().map_err(Error::Runtime)?;
        let db = runtime.block_on(builder.build())?;
        let inner = db.connect()?;
        Ok(Self { inner, runtime })
    }

    pub fn session(&self) -> Session<'_> {
        Session::new(self.inner.session(), &self.runtime)
    }

    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        self.runtime.block_on(self.inner.execute_batch(sql))
    }

    /// The async connection underneath
    pub fn as_async(&self) -> &crate::Connection {
        &self.inner
    }
}

/// Blocking counterpart of [`crate::Session`]
pub struct Session<'a, D: Driver + ?Sized = crate::Connection> {
    inner:   crate::Session<'a, D>,
    runtime: &'a Runtime,
}

impl<'a, D: Driver + ?Sized> Session<'a, D> {
    /// Drive `session` on `runtime`
    pub fn new(session: crate::Session<'a, D>, runtime: &'a Runtime) -> Self {
        Self { inner: session, runtime }
    }

    pub fn with_settings(self, settings: Settings) -> Self {
        Self { inner: self.inner.with_settings(settings), ..self }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { inner: self.inner.with_timeout(timeout), ..self }
    }

    pub fn with_cancellation(self, token: CancellationToken) -> Self {
        Self { inner: self.inner.with_cancellation(token), ..self }
    }

    pub fn read<T: FromRow>(&self, sql: &str, params: impl IntoParams) -> Result<Rows<'a, T>> {
        let stream = self.runtime.block_on(self.inner.read(sql, params))?;
        Ok(Rows { stream, runtime: self.runtime })
    }

    pub fn single<T: FromRow + Default>(&self, sql: &str, params: impl IntoParams) -> Result<T> {
        self.runtime.block_on(self.inner.single(sql, params))
    }

    pub fn first<T: FromRow>(&self, sql: &str, params: impl IntoParams) -> Result<Option<T>> {
        self.runtime.block_on(self.inner.first(sql, params))
    }

    pub fn execute(&self, sql: &str, params: impl IntoParams) -> Result<&Self> {
        self.execute_affected(sql, params)?;
        Ok(self)
    }

    pub fn execute_affected(&self, sql: &str, params: impl IntoParams) -> Result<u64> {
        self.runtime.block_on(self.inner.execute_affected(sql, params))
    }

    pub fn multiple(&self, sql: &str, params: impl IntoParams) -> Result<MultiReader<'a>> {
        let inner = self.runtime.block_on(self.inner.multiple(sql, params))?;
        Ok(MultiReader { inner, runtime: self.runtime })
    }

    #[cfg(feature = "with-json")]
    pub fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        sql: &str,
        params: impl IntoParams,
    ) -> Result<JsonRows<'a, T>> {
        let stream = self.runtime.block_on(self.inner.read_json(sql, params))?;
        Ok(JsonRows { stream, runtime: self.runtime })
    }

    pub fn begin(&self) -> Result<&Self> {
        self.execute("BEGIN", ())
    }

    pub fn commit(&self) -> Result<&Self> {
        self.execute("COMMIT", ())
    }

    pub fn rollback(&self) -> Result<&Self> {
        self.execute("ROLLBACK", ())
    }
}

/// Iterator over the rows of one result set
///
/// Yields `None` after the first error.
pub struct Rows<'s, T> {
    stream:  RowStream<'s, T>,
    runtime: &'s Runtime,
}

impl<T: FromRow> Rows<'_, T> {
    pub fn columns(&self) -> &[String] {
        self.stream.columns()
    }
}

impl<T: FromRow> Iterator for Rows<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next()).transpose()
    }
}

/// Iterator over JSON documents
#[cfg(feature = "with-json")]
pub struct JsonRows<'s, T> {
    stream:  crate::json::JsonStream<'s, T>,
    runtime: &'s Runtime,
}

#[cfg(feature = "with-json")]
impl<T: serde::de::DeserializeOwned> Iterator for JsonRows<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.runtime.block_on(self.stream.next()).transpose()
    }
}

/// Blocking counterpart of [`crate::MultiReader`]
pub struct MultiReader<'a> {
    inner:   crate::MultiReader<'a>,
    runtime: &'a Runtime,
}

impl MultiReader<'_> {
    pub fn state(&self) -> ReaderState {
        self.inner.state()
    }

    pub fn position(&self) -> usize {
        self.inner.position()
    }

    pub fn columns(&self) -> &[String] {
        self.inner.columns()
    }

    pub fn read_as<T: FromRow>(&mut self) -> Result<Rows<'_, T>> {
        let runtime = self.runtime;
        let stream = runtime.block_on(self.inner.read_as::<T>())?;
        Ok(Rows { stream, runtime })
    }

    pub fn advance(&mut self) -> Result<bool> {
        self.runtime.block_on(self.inner.advance())
    }

    /// Run the rest of the batch and release the cursor
    pub fn dispose(&mut self) -> Result<()> {
        self.runtime.block_on(self.inner.dispose())
    }
}

impl Drop for MultiReader<'_> {
    fn drop(&mut self) {
        if self.inner.state() != ReaderState::Active {
            return;
        }
        if let Err(e) = self.dispose() {
            tracing::warn!(error = %e, "failed to finish batch on drop");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn films() -> Connection {
        let conn = Connection::open(":memory:").unwrap();
        conn.execute_batch(
            "CREATE TABLE films (film_id INTEGER PRIMARY KEY, title TEXT NOT NULL);
             INSERT INTO films (film_id, title) VALUES (1, 'Alpha'), (2, 'Beta');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_blocking_read_iterates_rows() {
        let conn = films();
        let session = conn.session();

        let rows: Vec<(i64, String)> = session
            .read("SELECT film_id, title FROM films ORDER BY film_id", ())
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(rows, vec![(1, "Alpha".to_string()), (2, "Beta".to_string())]);

        let count: i64 = session.single("SELECT count(*) FROM films", ()).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_blocking_multiple() {
        let conn = films();
        let session = conn.session();

        let mut reader =
            session.multiple("SELECT title FROM films WHERE film_id = ?; SELECT count(*) FROM films", [1]).unwrap();
        let titles: Vec<String> = reader.read_as().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(titles, vec!["Alpha".to_string()]);

        assert!(reader.advance().unwrap());
        let counts: Vec<i64> = reader.read_as().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(counts, vec![2]);
        assert!(!reader.advance().unwrap());
    }

    #[test]
    fn test_blocking_execute_chain() {
        let conn = films();
        let session = conn.session();

        session
            .execute("INSERT INTO films (film_id, title) VALUES (?, ?)", (3, "Gamma"))
            .unwrap()
            .execute("DELETE FROM films WHERE film_id = ?", [1])
            .unwrap();

        let titles: Vec<String> =
            session.read("SELECT title FROM films ORDER BY film_id", ()).unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(titles, vec!["Beta".to_string(), "Gamma".to_string()]);
    }

    #[test]
    fn test_blocking_reader_dropped_early_runs_the_rest() {
        let conn = films();
        let session = conn.session();

        let mut reader = session.multiple("SELECT title FROM films; DELETE FROM films WHERE film_id = 1", ()).unwrap();
        let mut titles = reader.read_as::<String>().unwrap();
        assert_eq!(titles.next().unwrap().unwrap(), "Alpha");
        drop(titles);
        drop(reader);

        let count: i64 = session.single("SELECT count(*) FROM films", ()).unwrap();
        assert_eq!(count, 1);
    }
}
