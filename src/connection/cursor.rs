use std::collections::VecDeque;

use async_trait::async_trait;

use crate::driver::Cursor;
use crate::error::Error;
use crate::error::Result;
use crate::params::Params;
use crate::value::Value;

struct ResultSet {
    columns: Vec<String>,
    /// `None` once the set has been read to the end
    rows:    Option<turso::Rows>,
}

/// Cursor over the statements of a batch, one result set per statement
///
/// Statements run lazily: the next one is prepared only when the caller moves
/// past the current result set. Statements that return no columns are
/// executed on the way and produce no result set.
pub(crate) struct TursoCursor<'a> {
    conn:    &'a turso::Connection,
    pending: VecDeque<(String, Params)>,
    current: Option<ResultSet>,
}

impl<'a> TursoCursor<'a> {
    pub(crate) async fn open(conn: &'a turso::Connection, pending: VecDeque<(String, Params)>) -> Result<Self> {
        let mut cursor = Self { conn, pending, current: None };
        cursor.open_next().await?;
        Ok(cursor)
    }

    async fn open_next(&mut self) -> Result<bool> {
        self.current = None;

        while let Some((sql, params)) = self.pending.pop_front() {
            tracing::trace!(sql = %sql, params = params.len(), "running statement");
            let mut stmt = self.conn.prepare(&sql).await.map_err(Error::Command)?;
            let columns: Vec<String> = stmt.columns().iter().map(|c| c.name().to_string()).collect();

            if columns.is_empty() {
                stmt.execute(turso::params::Params::from(params)).await.map_err(Error::Command)?;
                continue;
            }

            let rows = stmt.query(turso::params::Params::from(params)).await.map_err(Error::Command)?;
            self.current = Some(ResultSet { columns, rows: Some(rows) });
            return Ok(true);
        }

        Ok(false)
    }
}

#[async_trait]
impl<'a> Cursor for TursoCursor<'a> {
    fn columns(&self) -> &[String] {
        self.current.as_ref().map(|set| set.columns.as_slice()).unwrap_or_default()
    }

    async fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        let Some(rows) = self.current.as_mut().and_then(|set| set.rows.as_mut()) else {
            return Ok(None);
        };

        match rows.next().await.map_err(Error::Command)? {
            Some(row) => {
                let values =
                    (0..row.column_count()).map(|i| row.get_value(i)).collect::<turso::Result<Vec<Value>>>();
                values.map(Some).map_err(Error::Command)
            }
            None => {
                if let Some(set) = self.current.as_mut() {
                    set.rows = None;
                }
                Ok(None)
            }
        }
    }

    async fn next_result(&mut self) -> Result<bool> {
        self.open_next().await
    }

    fn pending(&self) -> usize {
        self.pending.len()
    }
}
