//! Field/column binding
//!
//! [`FromRow`] is the contract between a result type and the mapper. A
//! [`BindPlan`] is built once per result set: it checks that the result set
//! can feed the requested shape and resolves every column to a member slot.
//! Each row is then bound through a [`RowBinding`].

use std::sync::Arc;

use crate::decode::ColumnValue;
use crate::error::Error;
use crate::error::Result;
use crate::metadata::Member;
use crate::metadata::Shape;
use crate::metadata::TypeDescriptor;
use crate::settings::NullConversion;
use crate::settings::Settings;
use crate::value::FromValue;
use crate::value::Value;

/// Trait for types that can be built from one result row
///
/// Scalars, `Option`s of scalars and tuples of two to eight scalars
/// implement it out of the box. Records implement it with
/// `#[derive(FromRow)]`; unit enums get it from `#[derive(FromValue)]`.
///
/// # Manual implementation
///
/// ```ignore
/// use tursomap::{FromRow, Member, Result, RowBinding, Shape};
///
/// #[derive(Default)]
/// pub struct Actor {
///     pub id:   i64,
///     pub name: String,
/// }
///
/// impl FromRow for Actor {
///     fn shape() -> Shape {
///         Shape::Record
///     }
///
///     fn members() -> &'static [Member] {
///         const MEMBERS: &[Member] = &[Member::new("id", true), Member::new("name", true)];
///         MEMBERS
///     }
///
///     fn from_row(row: &mut RowBinding<'_>) -> Result<Self> {
///         let mut actor = Actor::default();
///         let plan = row.plan();
///         for (ordinal, slot) in plan.matches() {
///             match slot {
///                 0 => actor.id = row.take(ordinal)?,
///                 1 => actor.name = row.take(ordinal)?,
///                 _ => {}
///             }
///         }
///         Ok(actor)
///     }
/// }
/// ```
pub trait FromRow: Sized + 'static {
    fn shape() -> Shape;

    /// Named members of a [`Shape::Record`] type, in declaration order
    fn members() -> &'static [Member] {
        &[]
    }

    /// Build an instance from one row
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeConversion`] when a column cannot be converted to
    /// the member it is bound to.
    fn from_row(row: &mut RowBinding<'_>) -> Result<Self>;
}

/// Column-to-member resolution for one result set
#[derive(Clone, Debug)]
pub struct BindPlan {
    descriptor: Arc<TypeDescriptor>,
    columns:    Vec<String>,
    /// `(ordinal, slot)` for every column bound to a record member
    matches:    Vec<(usize, usize)>,
    conversion: NullConversion,
}

impl BindPlan {
    /// Plan the binding of `T` against a result set with the given columns
    ///
    /// # Errors
    ///
    /// Returns [`Error::MappingMismatch`] when a simple or tuple type needs
    /// more columns than the result set has.
    pub fn new<T: FromRow>(columns: Vec<String>, settings: &Settings, conversion: NullConversion) -> Result<Self> {
        let descriptor = TypeDescriptor::of::<T>(settings);

        let matches = match descriptor.shape() {
            Shape::Simple | Shape::Tuple(_) => {
                let arity = descriptor.arity();
                if columns.len() < arity {
                    return Err(Error::mismatch(
                        descriptor.type_name(),
                        format!("expected at least {} column(s), result set has {}", arity, columns.len()),
                    ));
                }
                Vec::new()
            }
            Shape::Record => columns
                .iter()
                .enumerate()
                .filter_map(|(ordinal, name)| descriptor.resolve(name).map(|slot| (ordinal, slot)))
                .collect(),
        };

        Ok(Self { descriptor, columns, matches, conversion })
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// `(ordinal, slot)` pairs in column order; unmatched columns are absent
    pub fn matches(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.matches.iter().copied()
    }

    pub fn conversion(&self) -> NullConversion {
        self.conversion
    }
}

/// Mapping state for a single row
#[derive(Debug)]
pub struct RowBinding<'a> {
    plan:    &'a BindPlan,
    columns: Vec<ColumnValue<'a>>,
}

impl<'a> RowBinding<'a> {
    pub fn new(plan: &'a BindPlan, columns: Vec<ColumnValue<'a>>) -> Self {
        Self { plan, columns }
    }

    /// The plan this row is bound under
    ///
    /// The returned reference is not tied to the borrow of `self`, so a
    /// binder can iterate [`BindPlan::matches`] while taking values.
    pub fn plan(&self) -> &'a BindPlan {
        self.plan
    }

    /// Convert the value at `ordinal` into `T`, consuming it
    ///
    /// # Errors
    ///
    /// [`Error::TypeConversion`] naming the column and `T` when conversion
    /// fails; [`Error::MappingMismatch`] when the row has no such column.
    pub fn take<T: FromValue>(&mut self, ordinal: usize) -> Result<T> {
        let target = std::any::type_name::<T>();
        let conversion = self.plan.conversion;
        let Some(column) = self.columns.get_mut(ordinal) else {
            return Err(Error::mismatch(target, format!("row has no column at ordinal {}", ordinal)));
        };

        T::from_column(column.value.take(), conversion).map_err(|source| Error::TypeConversion {
            column: column.name.to_string(),
            target,
            source,
        })
    }
}

macro_rules! impl_simple_from_row {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::FromRow for $ty {
                fn shape() -> $crate::Shape {
                    $crate::Shape::Simple
                }

                fn from_row(row: &mut $crate::RowBinding<'_>) -> $crate::Result<Self> {
                    row.take(0)
                }
            }
        )*
    };
}

impl_simple_from_row!(i64, i32, i16, i8, u64, u32, u16, u8, f64, f32, bool, String, Vec<u8>, Value);

impl<T: FromValue + 'static> FromRow for Option<T> {
    fn shape() -> Shape {
        Shape::Simple
    }

    fn from_row(row: &mut RowBinding<'_>) -> Result<Self> {
        row.take(0)
    }
}

#[cfg(feature = "with-chrono")]
impl_simple_from_row!(
    chrono::NaiveDateTime,
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::DateTime<chrono::Utc>
);

#[cfg(feature = "with-uuid")]
impl_simple_from_row!(uuid::Uuid);

#[cfg(feature = "with-decimal")]
impl_simple_from_row!(rust_decimal::Decimal);

#[cfg(feature = "with-json")]
impl_simple_from_row!(serde_json::Value);

#[cfg(feature = "with-json")]
impl<T: serde::de::DeserializeOwned + 'static> FromRow for crate::value::Json<T> {
    fn shape() -> Shape {
        Shape::Simple
    }

    fn from_row(row: &mut RowBinding<'_>) -> Result<Self> {
        row.take(0)
    }
}

macro_rules! impl_tuple_from_row {
    ($arity:literal; $($name:ident : $idx:tt),+) => {
        impl<$($name: FromValue + 'static),+> FromRow for ($($name,)+) {
            fn shape() -> Shape {
                Shape::Tuple($arity)
            }

            fn from_row(row: &mut RowBinding<'_>) -> Result<Self> {
                Ok(($(row.take::<$name>($idx)?,)+))
            }
        }
    };
}

impl_tuple_from_row!(2; A: 0, B: 1);
impl_tuple_from_row!(3; A: 0, B: 1, C: 2);
impl_tuple_from_row!(4; A: 0, B: 1, C: 2, D: 3);
impl_tuple_from_row!(5; A: 0, B: 1, C: 2, D: 3, E: 4);
impl_tuple_from_row!(6; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_tuple_from_row!(7; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_tuple_from_row!(8; A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

/// Bind one raw row as `T` under `plan`
pub fn bind_row<T: FromRow>(plan: &BindPlan, columns: Vec<ColumnValue<'_>>) -> Result<T> {
    let mut binding = RowBinding::new(plan, columns);
    T::from_row(&mut binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_row;
    use crate::error::ConversionError;
    use crate::settings::NameTransform;

    #[derive(Debug, Default, PartialEq)]
    struct Film {
        film_id:      i64,
        title:        String,
        release_year: Option<i64>,
        rating:       Rating,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    enum Rating {
        #[default]
        G,
        Pg,
    }

    impl FromValue for Rating {
        fn from_value(value: Value) -> std::result::Result<Self, ConversionError> {
            match value {
                Value::Text(s) if s.eq_ignore_ascii_case("G") => Ok(Rating::G),
                Value::Text(s) if s.eq_ignore_ascii_case("PG") => Ok(Rating::Pg),
                Value::Integer(0) => Ok(Rating::G),
                Value::Integer(1) => Ok(Rating::Pg),
                Value::Integer(n) => Err(ConversionError::OutOfRange { target: "Rating", value: n.to_string() }),
                other => Err(ConversionError::UnknownVariant { target: "Rating", value: format!("{:?}", other) }),
            }
        }
    }

    impl FromRow for Film {
        fn shape() -> Shape {
            Shape::Record
        }

        fn members() -> &'static [Member] {
            const MEMBERS: &[Member] = &[
                Member::new("film_id", true),
                Member::new("title", true),
                Member::new("ReleaseYear", true),
                Member::new("rating", true),
            ];
            MEMBERS
        }

        fn from_row(row: &mut RowBinding<'_>) -> Result<Self> {
            let mut film = Film::default();
            let plan = row.plan();
            for (ordinal, slot) in plan.matches() {
                match slot {
                    0 => film.film_id = row.take(ordinal)?,
                    1 => film.title = row.take(ordinal)?,
                    2 => film.release_year = row.take(ordinal)?,
                    3 => film.rating = row.take(ordinal)?,
                    _ => {}
                }
            }
            Ok(film)
        }
    }

    fn bind<T: FromRow>(settings: &Settings, columns: &[(&str, Value)]) -> Result<T> {
        let names: Vec<String> = columns.iter().map(|(n, _)| n.to_string()).collect();
        let plan = BindPlan::new::<T>(names, settings, NullConversion::AllTypes)?;
        let raw = columns.iter().map(|(_, v)| v.clone()).collect();
        let decoded = decode_row(plan.columns(), raw, None);
        bind_row(&plan, decoded)
    }

    #[test]
    fn test_simple_takes_first_column() {
        let value: i64 = bind(&Settings::new(), &[("n", Value::Integer(7)), ("m", Value::Integer(8))]).unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_simple_null_is_default() {
        let value: i64 = bind(&Settings::new(), &[("n", Value::Null)]).unwrap();
        assert_eq!(value, 0);
        let value: Option<String> = bind(&Settings::new(), &[("n", Value::Null)]).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn test_tuple_binds_positionally() {
        let row: (i64, String, bool) = bind(
            &Settings::new(),
            &[("x", Value::Integer(1)), ("y", Value::Text("a".into())), ("z", Value::Integer(1))],
        )
        .unwrap();
        assert_eq!(row, (1, "a".to_string(), true));
    }

    #[test]
    fn test_tuple_ignores_names() {
        let row: (i64, String) =
            bind(&Settings::new(), &[("film_id", Value::Integer(111)), ("title", Value::Text("Alpha".into()))])
                .unwrap();
        assert_eq!(row, (111, "Alpha".to_string()));
    }

    #[test]
    fn test_tuple_arity_mismatch() {
        let err = bind::<(i64, String, bool)>(&Settings::new(), &[("a", Value::Integer(1)), ("b", Value::Null)])
            .unwrap_err();
        assert!(matches!(err, Error::MappingMismatch { .. }));
    }

    #[test]
    fn test_simple_needs_a_column() {
        let err = bind::<i64>(&Settings::new(), &[]).unwrap_err();
        assert!(matches!(err, Error::MappingMismatch { .. }));
    }

    #[test]
    fn test_record_binds_by_name_and_skips_unknown() {
        let film: Film = bind(
            &Settings::new(),
            &[
                ("title", Value::Text("Alpha".into())),
                ("unused", Value::Integer(5)),
                ("FILM_ID", Value::Integer(111)),
                ("rating", Value::Text("pg".into())),
            ],
        )
        .unwrap();

        assert_eq!(film, Film { film_id: 111, title: "Alpha".into(), release_year: None, rating: Rating::Pg });
    }

    #[test]
    fn test_record_binding_is_order_independent() {
        let columns = [
            ("film_id", Value::Integer(1)),
            ("title", Value::Text("Beta".into())),
            ("rating", Value::Integer(1)),
            ("ReleaseYear", Value::Integer(1999)),
        ];
        let forward: Film = bind(&Settings::new(), &columns).unwrap();

        let mut reversed = columns.to_vec();
        reversed.reverse();
        let backward: Film = bind(&Settings::new(), &reversed).unwrap();

        assert_eq!(forward, backward);
        assert_eq!(forward.release_year, Some(1999));
    }

    #[test]
    fn test_snake_case_transform_toggle() {
        let columns = [("film_id", Value::Integer(1)), ("release_year", Value::Integer(2020))];

        let plain: Film = bind(&Settings::new(), &columns).unwrap();
        assert_eq!(plain.release_year, None);

        let snake: Film =
            bind(&Settings::new().with_name_transform(NameTransform::SnakeCase), &columns).unwrap();
        assert_eq!(snake.release_year, Some(2020));
    }

    #[test]
    fn test_enum_out_of_range_is_conversion_error() {
        let err =
            bind::<Film>(&Settings::new(), &[("film_id", Value::Integer(1)), ("rating", Value::Integer(2020))])
                .unwrap_err();

        match err {
            Error::TypeConversion { column, source, .. } => {
                assert_eq!(column, "rating");
                assert_eq!(source, ConversionError::OutOfRange { target: "Rating", value: "2020".into() });
            }
            other => panic!("expected TypeConversion, got {:?}", other),
        }
    }

    #[test]
    fn test_text_only_null_conversion() {
        let names = vec!["film_id".to_string(), "title".to_string()];
        let plan = BindPlan::new::<Film>(names, &Settings::new(), NullConversion::TextOnly).unwrap();

        let row = decode_row(plan.columns(), vec![Value::Integer(1), Value::Null], None);
        let ok: Film = bind_row(&plan, row).unwrap();
        assert_eq!(ok.title, "");

        let err =
            bind_row::<Film>(&plan, decode_row(plan.columns(), vec![Value::Null, Value::Null], None)).unwrap_err();
        assert!(matches!(err, Error::TypeConversion { source: ConversionError::UnexpectedNull, .. }));
    }

    #[test]
    fn test_take_beyond_row() {
        let plan = BindPlan::new::<i64>(vec!["a".into()], &Settings::new(), NullConversion::AllTypes).unwrap();
        let mut row = RowBinding::new(&plan, Vec::new());
        assert!(matches!(row.take::<i64>(0), Err(Error::MappingMismatch { .. })));
    }
}
