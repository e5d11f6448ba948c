//! Prelude module for tursomap
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```ignore
//! use tursomap::prelude::*;
//! ```

pub use tursomap_macros::FromRow;
pub use tursomap_macros::FromValue;

pub use crate::bind::FromRow;
pub use crate::bind::RowBinding;
pub use crate::connection::Builder;
pub use crate::connection::Connection;
pub use crate::connection::Database;
pub use crate::error::Error;
pub use crate::error::Result;
pub use crate::metadata::Member;
pub use crate::metadata::Shape;
pub use crate::multi::MultiReader;
pub use crate::params::IntoParams;
pub use crate::params::Params;
pub use crate::session::Session;
pub use crate::settings::NameTransform;
pub use crate::settings::NullConversion;
pub use crate::settings::Settings;
pub use crate::stream::RowStream;
pub use crate::value::FromValue;
pub use crate::value::IntoValue;
// Re-export optional types
#[cfg(feature = "with-json")]
pub use crate::value::Json;
pub use crate::value::Value;
