//! Lazy row sequences

use std::future::Future;
use std::marker::PhantomData;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::bind::BindPlan;
use crate::bind::FromRow;
use crate::bind::bind_row;
use crate::decode::decode_row;
use crate::driver::Cursor;
use crate::error::Error;
use crate::error::Result;
use crate::settings::ColumnHook;

/// Suspension-point policy: command timeout and cancellation
#[derive(Clone, Debug, Default)]
pub(crate) struct Guard {
    pub timeout: Option<Duration>,
    pub cancel:  Option<CancellationToken>,
}

impl Guard {
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled)
    }

    /// Await `fut`, failing on timeout or cancellation
    pub(crate) async fn run<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let timed = async {
            match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout(limit)),
                },
                None => fut.await,
            }
        };

        match &self.cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::Cancelled),
                result = timed => result,
            },
            None => timed.await,
        }
    }
}

enum Source<'s> {
    Owned(Box<dyn Cursor + 's>),
    Borrowed(&'s mut (dyn Cursor + 's)),
    Done,
}

impl<'s> Source<'s> {
    fn cursor(&mut self) -> Option<&mut (dyn Cursor + 's)> {
        match self {
            Source::Owned(cursor) => Some(cursor.as_mut()),
            Source::Borrowed(cursor) => Some(&mut **cursor),
            Source::Done => None,
        }
    }
}

/// Forward-only, single-pass sequence of `T` over one result set
///
/// Rows are fetched and bound one at a time by [`RowStream::next`]. Once the
/// result set ends or any error is returned the stream is finished and keeps
/// returning `Ok(None)`.
pub struct RowStream<'s, T> {
    source: Source<'s>,
    plan:   Option<BindPlan>,
    hook:   Option<ColumnHook>,
    guard:  Guard,
    _row:   PhantomData<fn() -> T>,
}

impl<'s, T: FromRow> RowStream<'s, T> {
    pub(crate) fn owned(cursor: Box<dyn Cursor + 's>, plan: BindPlan, hook: Option<ColumnHook>, guard: Guard) -> Self {
        Self { source: Source::Owned(cursor), plan: Some(plan), hook, guard, _row: PhantomData }
    }

    pub(crate) fn borrowed(
        cursor: &'s mut (dyn Cursor + 's),
        plan: BindPlan,
        hook: Option<ColumnHook>,
        guard: Guard,
    ) -> Self {
        Self { source: Source::Borrowed(cursor), plan: Some(plan), hook, guard, _row: PhantomData }
    }

    /// A stream that yields nothing
    pub fn empty() -> Self {
        Self { source: Source::Done, plan: None, hook: None, guard: Guard::default(), _row: PhantomData }
    }

    /// Column names of the underlying result set
    pub fn columns(&self) -> &[String] {
        self.plan.as_ref().map(BindPlan::columns).unwrap_or_default()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.source, Source::Done)
    }

    fn finish(&mut self) {
        self.source = Source::Done;
    }

    /// Fetch and bind the next row
    ///
    /// # Errors
    ///
    /// Driver errors, [`Error::TypeConversion`] from binding,
    /// [`Error::Cancelled`] and [`Error::Timeout`]. The stream is finished
    /// after any error.
    pub async fn next(&mut self) -> Result<Option<T>> {
        let guard = self.guard.clone();
        let Some(cursor) = self.source.cursor() else {
            return Ok(None);
        };

        let fetched = guard.run(cursor.next_row()).await;
        let raw = match fetched {
            Ok(Some(raw)) if !guard.is_cancelled() => raw,
            Ok(Some(_)) => {
                self.finish();
                return Err(Error::Cancelled);
            }
            Ok(None) => {
                self.finish();
                return Ok(None);
            }
            Err(e) => {
                self.finish();
                return Err(e);
            }
        };

        let Some(plan) = self.plan.as_ref() else {
            self.finish();
            return Ok(None);
        };

        let bound = bind_row::<T>(plan, decode_row(plan.columns(), raw, self.hook.as_ref()));
        if bound.is_err() {
            self.finish();
        }
        bound.map(Some)
    }

    /// Collect the remaining rows
    pub async fn all(mut self) -> Result<Vec<T>> {
        let mut rows = Vec::new();
        while let Some(row) = self.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;

    use async_trait::async_trait;

    use super::*;
    use crate::settings::NullConversion;
    use crate::settings::Settings;
    use crate::value::Value;

    /// In-memory cursor over prepared result sets
    pub(crate) struct VecCursor {
        sets:    VecDeque<(Vec<String>, VecDeque<Vec<Value>>)>,
        current: Option<(Vec<String>, VecDeque<Vec<Value>>)>,
    }

    impl VecCursor {
        pub(crate) fn new(sets: Vec<(Vec<&str>, Vec<Vec<Value>>)>) -> Self {
            let mut sets: VecDeque<_> = sets
                .into_iter()
                .map(|(cols, rows)| (cols.into_iter().map(String::from).collect(), rows.into()))
                .collect();
            let current = sets.pop_front();
            Self { sets, current }
        }
    }

    #[async_trait]
    impl Cursor for VecCursor {
        fn columns(&self) -> &[String] {
            self.current.as_ref().map(|(c, _)| c.as_slice()).unwrap_or_default()
        }

        async fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
            Ok(self.current.as_mut().and_then(|(_, rows)| rows.pop_front()))
        }

        async fn next_result(&mut self) -> Result<bool> {
            self.current = self.sets.pop_front();
            Ok(self.current.is_some())
        }
    }

    fn stream_of<T: FromRow>(cursor: VecCursor, guard: Guard) -> Result<RowStream<'static, T>> {
        let plan = BindPlan::new::<T>(cursor.columns().to_vec(), &Settings::new(), NullConversion::AllTypes)?;
        Ok(RowStream::owned(Box::new(cursor), plan, None, guard))
    }

    #[tokio::test]
    async fn test_stream_yields_rows_in_order() {
        let cursor = VecCursor::new(vec![(
            vec!["id", "name"],
            vec![vec![Value::Integer(1), Value::Text("a".into())], vec![Value::Integer(2), Value::Text("b".into())]],
        )]);
        let stream = stream_of::<(i64, String)>(cursor, Guard::default()).unwrap();
        assert_eq!(stream.columns(), &["id".to_string(), "name".to_string()]);

        let rows = stream.all().await.unwrap();
        assert_eq!(rows, vec![(1, "a".to_string()), (2, "b".to_string())]);
    }

    #[tokio::test]
    async fn test_stream_faults_after_error() {
        let cursor = VecCursor::new(vec![(
            vec!["n"],
            vec![vec![Value::Integer(1)], vec![Value::Text("x".into())], vec![Value::Integer(3)]],
        )]);
        let mut stream = stream_of::<i64>(cursor, Guard::default()).unwrap();

        assert_eq!(stream.next().await.unwrap(), Some(1));
        assert!(matches!(stream.next().await, Err(Error::TypeConversion { .. })));
        assert!(stream.is_finished());
        assert_eq!(stream.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_stream_observes_cancellation() {
        let cursor = VecCursor::new(vec![(vec!["n"], vec![vec![Value::Integer(1)], vec![Value::Integer(2)]])]);
        let token = CancellationToken::new();
        let guard = Guard { timeout: None, cancel: Some(token.clone()) };
        let mut stream = stream_of::<i64>(cursor, guard).unwrap();

        assert_eq!(stream.next().await.unwrap(), Some(1));
        token.cancel();
        assert!(matches!(stream.next().await, Err(Error::Cancelled)));
        assert_eq!(stream.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_empty_stream() {
        let mut stream = RowStream::<i64>::empty();
        assert!(stream.columns().is_empty());
        assert_eq!(stream.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_guard_timeout() {
        let guard = Guard { timeout: Some(Duration::from_millis(10)), cancel: None };
        let result = guard
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }
}
