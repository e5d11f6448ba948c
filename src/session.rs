//! The mapping surface
//!
//! A [`Session`] borrows a [`Driver`] and runs SQL through it, binding the
//! rows it gets back. Sessions are cheap to build and hold no database
//! resources of their own; streams and readers they return borrow the
//! driver for as long as they live.
//!
//! ```ignore
//! use tursomap::prelude::*;
//!
//! let db = Builder::new_local(":memory:").build().await?;
//! let conn = db.connect()?;
//! let session = conn.session();
//!
//! let count: i64 = session.single("SELECT count(*) FROM films", ()).await?;
//! let films: Vec<Film> = session.read("SELECT * FROM films", ()).await?.all().await?;
//! ```

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::bind::BindPlan;
use crate::bind::FromRow;
use crate::connection::Connection;
use crate::driver::Driver;
use crate::error::Result;
use crate::multi::MultiReader;
use crate::params::IntoParams;
use crate::settings::NullConversion;
use crate::settings::Settings;
use crate::stream::Guard;
use crate::stream::RowStream;

pub struct Session<'a, D: Driver + ?Sized = Connection> {
    driver:   &'a D,
    settings: Option<Settings>,
    timeout:  Option<Duration>,
    cancel:   Option<CancellationToken>,
}

impl<'a, D: Driver + ?Sized> Session<'a, D> {
    /// A session using the process-wide default [`Settings`]
    pub fn new(driver: &'a D) -> Self {
        Self { driver, settings: None, timeout: None, cancel: None }
    }

    /// Use `settings` instead of the process-wide default
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Command timeout for this session, overriding the settings' default
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Observe `token` at every suspension point
    ///
    /// Once the token is cancelled, pending and future operations of this
    /// session and of the streams it returned fail with
    /// [`Error::Cancelled`](crate::Error::Cancelled).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn driver(&self) -> &'a D {
        self.driver
    }

    /// Settings the next operation will run under
    pub fn settings(&self) -> Settings {
        self.settings.clone().unwrap_or_else(Settings::global)
    }

    fn guard(&self, settings: &Settings) -> Guard {
        Guard { timeout: self.timeout.or(settings.command_timeout()), cancel: self.cancel.clone() }
    }

    fn conversion(&self, settings: &Settings) -> NullConversion {
        settings.null_conversion().unwrap_or_else(|| self.driver.family().null_conversion())
    }

    /// Run a query and stream its rows as `T`
    ///
    /// Rows are fetched lazily as the stream is polled. A statement that
    /// returns no columns yields an empty stream.
    ///
    /// # Errors
    ///
    /// Driver errors from issuing the command, [`Error::MappingMismatch`]
    /// when the result set cannot feed `T`, [`Error::Cancelled`] and
    /// [`Error::Timeout`].
    ///
    /// [`Error::MappingMismatch`]: crate::Error::MappingMismatch
    /// [`Error::Cancelled`]: crate::Error::Cancelled
    /// [`Error::Timeout`]: crate::Error::Timeout
    #[tracing::instrument(level = "debug", skip(self, params))]
    pub async fn read<T: FromRow>(&self, sql: &str, params: impl IntoParams) -> Result<RowStream<'a, T>> {
        let settings = self.settings();
        let guard = self.guard(&settings);
        let params = params.into_params();
        tracing::trace!(params = params.len(), "read");

        let cursor = guard.run(self.driver.query(sql, params)).await?;
        if cursor.columns().is_empty() {
            return Ok(RowStream::empty());
        }

        let plan = BindPlan::new::<T>(cursor.columns().to_vec(), &settings, self.conversion(&settings))?;
        Ok(RowStream::owned(cursor, plan, settings.column_hook().cloned(), guard))
    }

    /// First row as `T`, or `T::default()` when there are no rows
    #[tracing::instrument(level = "debug", skip(self, params))]
    pub async fn single<T: FromRow + Default>(&self, sql: &str, params: impl IntoParams) -> Result<T> {
        Ok(self.first(sql, params).await?.unwrap_or_default())
    }

    /// First row as `T`, or `None` when there are no rows
    ///
    /// The remaining rows are discarded without being read.
    #[tracing::instrument(level = "debug", skip(self, params))]
    pub async fn first<T: FromRow>(&self, sql: &str, params: impl IntoParams) -> Result<Option<T>> {
        self.read::<T>(sql, params).await?.next().await
    }

    /// Run a command that returns no rows
    ///
    /// Returns the session so commands can be chained.
    #[tracing::instrument(level = "debug", skip(self, params))]
    pub async fn execute(&self, sql: &str, params: impl IntoParams) -> Result<&Self> {
        self.execute_affected(sql, params).await?;
        Ok(self)
    }

    /// Run a command that returns no rows, returning the affected row count
    #[tracing::instrument(level = "debug", skip(self, params))]
    pub async fn execute_affected(&self, sql: &str, params: impl IntoParams) -> Result<u64> {
        let guard = self.guard(&self.settings());
        let params = params.into_params();
        tracing::trace!(params = params.len(), "execute");

        guard.run(self.driver.execute(sql, params)).await
    }

    /// Run a batch of statements and read its result sets one after another
    ///
    /// The reader starts on the first result set. Parameters are handed out
    /// to the statements in order: positional values by the number of
    /// placeholders each statement has, named values by the names each
    /// statement mentions.
    #[tracing::instrument(level = "debug", skip(self, params))]
    pub async fn multiple(&self, sql: &str, params: impl IntoParams) -> Result<MultiReader<'a>> {
        let settings = self.settings();
        let guard = self.guard(&settings);
        let params = params.into_params();
        tracing::trace!(params = params.len(), "multiple");

        let cursor = guard.run(self.driver.query_batch(sql, params)).await?;
        let conversion = self.conversion(&settings);
        Ok(MultiReader::new(cursor, settings, conversion, guard))
    }

    /// Run a query whose first column holds a JSON document per row
    ///
    /// Each document is deserialized into `T`. BLOB columns are accepted and
    /// null documents skipped according to the settings' [`JsonOptions`].
    ///
    /// [`JsonOptions`]: crate::JsonOptions
    #[cfg(feature = "with-json")]
    #[tracing::instrument(level = "debug", skip(self, params))]
    pub async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        sql: &str,
        params: impl IntoParams,
    ) -> Result<crate::json::JsonStream<'a, T>> {
        let settings = self.settings();
        let guard = self.guard(&settings);
        let params = params.into_params();
        tracing::trace!(params = params.len(), "read_json");

        let cursor = guard.run(self.driver.query(sql, params)).await?;
        Ok(crate::json::JsonStream::new(cursor, &settings, guard))
    }

    pub async fn begin(&self) -> Result<&Self> {
        self.execute("BEGIN", ()).await
    }

    pub async fn commit(&self) -> Result<&Self> {
        self.execute("COMMIT", ()).await
    }

    pub async fn rollback(&self) -> Result<&Self> {
        self.execute("ROLLBACK", ()).await
    }
}

impl<D: Driver + ?Sized> Clone for Session<'_, D> {
    fn clone(&self) -> Self {
        Self {
            driver:   self.driver,
            settings: self.settings.clone(),
            timeout:  self.timeout,
            cancel:   self.cancel.clone(),
        }
    }
}

impl<D: Driver + ?Sized> std::fmt::Debug for Session<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("settings", &self.settings)
            .field("timeout", &self.timeout)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}
