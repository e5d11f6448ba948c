//! Sequential reading of several result sets

use crate::bind::BindPlan;
use crate::bind::FromRow;
use crate::driver::Cursor;
use crate::error::Error;
use crate::error::Result;
use crate::settings::NullConversion;
use crate::settings::Settings;
use crate::stream::Guard;
use crate::stream::RowStream;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReaderState {
    /// Positioned on a result set
    Active,
    /// Every result set has been passed
    Exhausted,
    /// Released by [`MultiReader::dispose`]
    Disposed,
}

/// Reader over the result sets of a statement batch
///
/// Result sets are read strictly in order and cannot be revisited. Each one
/// is read with [`read_as`](MultiReader::read_as); [`advance`](MultiReader::advance)
/// moves to the next.
///
/// Statements of the batch run as the reader reaches them. Awaiting
/// [`dispose`](MultiReader::dispose) runs whatever is left; a reader dropped
/// before that leaves the rest of the batch unrun.
///
/// ```ignore
/// let mut reader = session.multiple("SELECT * FROM films; SELECT * FROM actors", ()).await?;
/// let films: Vec<Film> = reader.read_as().await?.all().await?;
/// reader.advance().await?;
/// let actors: Vec<Actor> = reader.read_as().await?.all().await?;
/// assert!(!reader.advance().await?);
/// ```
pub struct MultiReader<'a> {
    cursor:     Option<Box<dyn Cursor + 'a>>,
    settings:   Settings,
    conversion: NullConversion,
    guard:      Guard,
    state:      ReaderState,
    position:   usize,
}

impl<'a> MultiReader<'a> {
    pub(crate) fn new(
        cursor: Box<dyn Cursor + 'a>,
        settings: Settings,
        conversion: NullConversion,
        guard: Guard,
    ) -> Self {
        let state = if cursor.columns().is_empty() { ReaderState::Exhausted } else { ReaderState::Active };
        let cursor = (state == ReaderState::Active).then_some(cursor);
        Self { cursor, settings, conversion, guard, state, position: 0 }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Zero-based index of the current result set
    pub fn position(&self) -> usize {
        self.position
    }

    /// Column names of the current result set, empty when there is none
    pub fn columns(&self) -> &[String] {
        self.cursor.as_ref().map(|c| c.columns()).unwrap_or_default()
    }

    /// Rows of the current result set as `T`
    ///
    /// Rows already read through an earlier stream are not seen again, so a
    /// second call on a fully read set yields nothing. Once the reader is
    /// exhausted or disposed the stream is empty.
    ///
    /// # Errors
    ///
    /// [`Error::MappingMismatch`] when the current result set cannot feed
    /// `T`, [`Error::Cancelled`] once the session's token is cancelled.
    pub async fn read_as<T: FromRow>(&mut self) -> Result<RowStream<'_, T>> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(RowStream::empty());
        };
        if self.guard.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let plan = BindPlan::new::<T>(cursor.columns().to_vec(), &self.settings, self.conversion)?;
        let hook = self.settings.column_hook().cloned();
        Ok(RowStream::borrowed(&mut **cursor, plan, hook, self.guard.clone()))
    }

    /// Move to the next result set
    ///
    /// Returns `false`, and leaves the reader exhausted, when there is none.
    /// A failed advance also exhausts the reader.
    pub async fn advance(&mut self) -> Result<bool> {
        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(false);
        };

        match self.guard.run(cursor.next_result()).await {
            Ok(true) => {
                self.position += 1;
                tracing::trace!(position = self.position, "next result set");
                Ok(true)
            }
            Ok(false) => {
                tracing::trace!(position = self.position, "result sets exhausted");
                self.cursor = None;
                self.state = ReaderState::Exhausted;
                Ok(false)
            }
            Err(e) => {
                self.cursor = None;
                self.state = ReaderState::Exhausted;
                Err(e)
            }
        }
    }

    /// Run the statements the reader has not reached and release the cursor
    ///
    /// Rows of the remaining result sets are discarded. Calling it again does
    /// nothing.
    ///
    /// # Errors
    ///
    /// Errors of the remaining statements, [`Error::Cancelled`] and
    /// [`Error::Timeout`]. The reader is disposed either way.
    pub async fn dispose(&mut self) -> Result<()> {
        self.state = ReaderState::Disposed;
        let Some(mut cursor) = self.cursor.take() else {
            return Ok(());
        };

        tracing::trace!(position = self.position, pending = cursor.pending(), "finishing batch");
        self.guard.run(cursor.finish()).await
    }
}

impl Drop for MultiReader<'_> {
    fn drop(&mut self) {
        let pending = self.cursor.as_ref().map_or(0, |cursor| cursor.pending());
        if pending > 0 {
            tracing::warn!(pending, "multi reader dropped without dispose, statements not run");
        }
    }
}

impl std::fmt::Debug for MultiReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiReader").field("state", &self.state).field("position", &self.position).finish()
    }
}
