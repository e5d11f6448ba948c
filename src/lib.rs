//! # tursomap
//!
//! A micro-ORM for [Turso](https://turso.tech): run plain SQL and map the
//! rows it returns into scalars, tuples and records.
//!
//! ## Features
//!
//! - `#[derive(FromRow)]` for records, binding columns to fields by name
//! - Positional binding into tuples of two to eight values
//! - `#[derive(FromValue)]` for unit enums stored by name or discriminant
//! - Lazy row streams, multi-statement batches read one result set at a time
//! - Configurable name matching, null handling, timeouts and cancellation
//! - A blocking surface for code that is not async
//! - Optional support for chrono, uuid, decimal and JSON types
//!
//! ## Quick Start
//!
//! ```ignore
//! use tursomap::prelude::*;
//!
//! #[derive(Debug, Default, FromRow)]
//! pub struct Film {
//!     pub film_id:      i64,
//!     pub title:        String,
//!     pub release_year: Option<i64>,
//!     pub rating:       Rating,
//! }
//!
//! #[derive(Debug, Default, FromValue)]
//! pub enum Rating {
//!     #[default]
//!     G,
//!     Pg,
//!     R,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let db = Builder::new_local(":memory:").build().await?;
//!     let conn = db.connect()?;
//!     let session = conn.session();
//!
//!     session
//!         .execute(
//!             "CREATE TABLE films (film_id INTEGER PRIMARY KEY, title TEXT, release_year INTEGER, rating TEXT)",
//!             (),
//!         )
//!         .await?
//!         .execute("INSERT INTO films VALUES (?, ?, ?, ?)", (1, "Alpha", 1999, Rating::Pg))
//!         .await?;
//!
//!     let films: Vec<Film> = session.read("SELECT * FROM films", ()).await?.all().await?;
//!     let (id, title): (i64, String) = session.single("SELECT film_id, title FROM films", ()).await?;
//!
//!     let mut reader = session.multiple("SELECT * FROM films; SELECT count(*) FROM films", ()).await?;
//!     let films: Vec<Film> = reader.read_as().await?.all().await?;
//!     reader.advance().await?;
//!     let count: Vec<i64> = reader.read_as().await?.all().await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Field Attributes
//!
//! The `#[tursomap(...)]` attribute supports:
//!
//! - `rename = "..."` - Bind the field (or enum variant) under another name
//! - `skip` - Never bind the field; it keeps its default value

pub mod blocking;
pub mod connection;
pub mod prelude;

mod batch;
mod bind;
mod decode;
mod driver;
mod error;
#[cfg(feature = "with-json")]
mod json;
mod metadata;
mod multi;
mod params;
mod session;
mod settings;
mod stream;
mod value;

pub use bind::BindPlan;
pub use bind::FromRow;
pub use bind::RowBinding;
pub use bind::bind_row;
pub use connection::Builder;
pub use connection::Connection;
pub use connection::Database;
pub use decode::ColumnValue;
pub use decode::decode_row;
pub use driver::Cursor;
pub use driver::Driver;
pub use driver::DriverFamily;
pub use error::ConversionError;
pub use error::Error;
pub use error::Result;
#[cfg(feature = "with-json")]
pub use json::JsonStream;
pub use metadata::Member;
pub use metadata::MemberBinding;
pub use metadata::Shape;
pub use metadata::TypeDescriptor;
pub use multi::MultiReader;
pub use multi::ReaderState;
pub use params::IntoParams;
pub use params::Params;
pub use session::Session;
#[cfg(feature = "with-json")]
pub use settings::JsonOptions;
pub use settings::ColumnHook;
pub use settings::NameTransform;
pub use settings::NullConversion;
pub use settings::Settings;
pub use stream::RowStream;
pub use tokio_util::sync::CancellationToken;
pub use tursomap_macros::FromRow;
pub use tursomap_macros::FromValue;
pub use value::FromValue;
pub use value::IntoValue;
#[cfg(feature = "with-json")]
pub use value::Json;
pub use value::Value;
pub use value::value_kind;
