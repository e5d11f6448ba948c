//! Mapping configuration
//!
//! A [`Settings`] value controls how rows are matched to members and how
//! nulls are treated. A session can carry its own settings; sessions that
//! don't take a snapshot of the process-wide default at the start of each
//! read, so changing the default only affects reads that start afterwards.

use std::fmt;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::time::Duration;

use crate::value::Value;

static GLOBAL: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

/// How column names are translated before they are compared with member names
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NameTransform {
    /// Exact and case-insensitive matches only
    #[default]
    None,
    /// Additionally compare the snake_case forms of column and member names
    SnakeCase,
}

/// What a database null turns into when the target is not an `Option`
///
/// Driver families disagree here, so the behaviour is selectable. When a
/// [`Settings`] leaves it unset the driver's [`DriverFamily`](crate::DriverFamily)
/// decides.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NullConversion {
    /// Null becomes the target's default value for every type
    AllTypes,
    /// Null becomes the default only for text targets; anything else fails
    TextOnly,
}

/// Options for the JSON column helpers
#[cfg(feature = "with-json")]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct JsonOptions {
    /// Decode BLOB columns as UTF-8 JSON documents
    pub accept_blob: bool,
    /// Skip rows whose JSON column is null instead of failing
    pub skip_null: bool,
}

/// Per-column override consulted before default decoding
///
/// Called with the column name, its ordinal and the raw value. Returning
/// `Some` replaces the value; `None` keeps default decoding.
#[derive(Clone)]
pub struct ColumnHook(Arc<dyn Fn(&str, usize, &Value) -> Option<Value> + Send + Sync>);

impl ColumnHook {
    pub fn new<F>(hook: F) -> Self
    where F: Fn(&str, usize, &Value) -> Option<Value> + Send + Sync + 'static {
        Self(Arc::new(hook))
    }

    pub(crate) fn apply(&self, name: &str, ordinal: usize, value: &Value) -> Option<Value> {
        (self.0)(name, ordinal, value)
    }
}

impl fmt::Debug for ColumnHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ColumnHook(..)")
    }
}

#[derive(Clone, Debug, Default)]
pub struct Settings {
    pub(crate) command_timeout: Option<Duration>,
    pub(crate) name_transform:  NameTransform,
    pub(crate) include_private: bool,
    pub(crate) null_conversion: Option<NullConversion>,
    #[cfg(feature = "with-json")]
    pub(crate) json:            JsonOptions,
    pub(crate) column_hook:     Option<ColumnHook>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the process-wide default
    pub fn global() -> Self {
        GLOBAL.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Replace the process-wide default
    pub fn set_global(settings: Settings) {
        *GLOBAL.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// Modify the process-wide default in place
    pub fn update_global(f: impl FnOnce(&mut Settings)) {
        f(&mut GLOBAL.write().unwrap_or_else(PoisonError::into_inner));
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    pub fn with_name_transform(mut self, transform: NameTransform) -> Self {
        self.name_transform = transform;
        self
    }

    pub fn with_private_members(mut self, include: bool) -> Self {
        self.include_private = include;
        self
    }

    pub fn with_null_conversion(mut self, conversion: NullConversion) -> Self {
        self.null_conversion = Some(conversion);
        self
    }

    #[cfg(feature = "with-json")]
    pub fn with_json_options(mut self, json: JsonOptions) -> Self {
        self.json = json;
        self
    }

    pub fn with_column_hook(mut self, hook: ColumnHook) -> Self {
        self.column_hook = Some(hook);
        self
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout
    }

    pub fn name_transform(&self) -> NameTransform {
        self.name_transform
    }

    pub fn include_private(&self) -> bool {
        self.include_private
    }

    pub fn null_conversion(&self) -> Option<NullConversion> {
        self.null_conversion
    }

    #[cfg(feature = "with-json")]
    pub fn json_options(&self) -> JsonOptions {
        self.json
    }

    pub(crate) fn column_hook(&self) -> Option<&ColumnHook> {
        self.column_hook.as_ref()
    }
}
