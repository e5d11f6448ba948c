//! JSON document columns

use std::marker::PhantomData;

use serde::de::DeserializeOwned;

use crate::decode::decode_row;
use crate::driver::Cursor;
use crate::error::ConversionError;
use crate::error::Error;
use crate::error::Result;
use crate::settings::ColumnHook;
use crate::settings::JsonOptions;
use crate::settings::Settings;
use crate::stream::Guard;
use crate::value::Value;
use crate::value::value_kind;

/// Stream of documents deserialized from the first column of each row
///
/// Returned by [`Session::read_json`](crate::Session::read_json). Like
/// [`RowStream`](crate::RowStream) it is single-pass and finished by the
/// first error.
pub struct JsonStream<'s, T> {
    cursor:  Option<Box<dyn Cursor + 's>>,
    columns: Vec<String>,
    options: JsonOptions,
    hook:    Option<ColumnHook>,
    guard:   Guard,
    _doc:    PhantomData<fn() -> T>,
}

impl<'s, T: DeserializeOwned> JsonStream<'s, T> {
    pub(crate) fn new(cursor: Box<dyn Cursor + 's>, settings: &Settings, guard: Guard) -> Self {
        let columns = cursor.columns().to_vec();
        let cursor = (!columns.is_empty()).then_some(cursor);
        Self {
            cursor,
            columns,
            options: settings.json_options(),
            hook: settings.column_hook().cloned(),
            guard,
            _doc: PhantomData,
        }
    }

    /// Name of the column documents are read from
    pub fn column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }

    /// Next document
    ///
    /// # Errors
    ///
    /// [`Error::JsonColumn`] when a document does not deserialize into `T`,
    /// [`Error::TypeConversion`] when the column holds neither text nor an
    /// accepted BLOB, plus driver errors, cancellation and timeouts.
    pub async fn next(&mut self) -> Result<Option<T>> {
        loop {
            let Some(cursor) = self.cursor.as_mut() else {
                return Ok(None);
            };

            let raw = match self.guard.run(cursor.next_row()).await {
                Ok(Some(_)) if self.guard.is_cancelled() => Err(Error::Cancelled),
                Ok(Some(raw)) => Ok(raw),
                Ok(None) => {
                    self.cursor = None;
                    return Ok(None);
                }
                Err(e) => Err(e),
            };

            let parsed = raw.and_then(|raw| self.parse(raw));
            match parsed {
                Ok(Some(doc)) => return Ok(Some(doc)),
                Ok(None) => continue,
                Err(e) => {
                    self.cursor = None;
                    return Err(e);
                }
            }
        }
    }

    /// `Ok(None)` for a null document that is to be skipped
    fn parse(&self, raw: Vec<Value>) -> Result<Option<T>> {
        let Some(column) = decode_row(&self.columns, raw, self.hook.as_ref()).into_iter().next() else {
            return Ok(None);
        };

        let json_error = |source| Error::JsonColumn { column: column.name.to_string(), source };
        let parsed = match column.value {
            Some(Value::Text(text)) => serde_json::from_str(&text).map_err(json_error)?,
            Some(Value::Blob(bytes)) if self.options.accept_blob => {
                serde_json::from_slice(&bytes).map_err(json_error)?
            }
            None if self.options.skip_null => return Ok(None),
            None => serde_json::from_str("null").map_err(json_error)?,
            Some(other) => {
                return Err(Error::TypeConversion {
                    column: column.name.to_string(),
                    target: std::any::type_name::<T>(),
                    source: ConversionError::Mismatch {
                        expected: "Text (JSON)",
                        actual:   value_kind(&other).to_string(),
                    },
                });
            }
        };
        Ok(Some(parsed))
    }

    /// Collect the remaining documents
    pub async fn all(mut self) -> Result<Vec<T>> {
        let mut docs = Vec::new();
        while let Some(doc) = self.next().await? {
            docs.push(doc);
        }
        Ok(docs)
    }
}
