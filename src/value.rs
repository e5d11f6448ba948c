//! Value types and conversions for tursomap

pub use turso::Value;

use crate::error::ConversionError;
use crate::settings::NullConversion;

type ConversionResult<T> = std::result::Result<T, ConversionError>;

/// Short name of the storage class a value carries, used in error messages
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "Null",
        Value::Integer(_) => "Integer",
        Value::Real(_) => "Real",
        Value::Text(_) => "Text",
        Value::Blob(_) => "Blob",
    }
}

fn mismatch(expected: &'static str, actual: &Value) -> ConversionError {
    let actual = match actual {
        Value::Blob(b) => format!("Blob({} bytes)", b.len()),
        other => format!("{:?}", other),
    };
    ConversionError::Mismatch { expected, actual }
}

/// Trait for converting Rust types into database values
///
/// Implemented for the common scalar types so they can be bound as command
/// parameters. `#[derive(FromValue)]` on a unit-only enum also implements
/// this trait, storing the variant name as text.
pub trait IntoValue {
    /// Convert this value into a database [`Value`]
    fn into_value(self) -> Value;
}

/// Trait for converting database values into Rust types
///
/// Every type implementing `FromValue` is a "simple" type for the mapper: it
/// occupies exactly one column. Nulls never reach [`FromValue::from_value`]
/// through the mapper; they are routed to [`FromValue::from_null`] together
/// with the active [`NullConversion`].
pub trait FromValue: Sized {
    /// Convert a non-null database [`Value`] into this type
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] if the value cannot represent `Self`.
    fn from_value(value: Value) -> ConversionResult<Self>;

    /// Produce the value used when the column is null
    fn from_null(conversion: NullConversion) -> ConversionResult<Self> {
        let _ = conversion;
        Err(ConversionError::UnexpectedNull)
    }

    /// Convert a decoded column, where `None` stands for database null
    fn from_column(value: Option<Value>, conversion: NullConversion) -> ConversionResult<Self> {
        match value {
            None | Some(Value::Null) => Self::from_null(conversion),
            Some(value) => Self::from_value(value),
        }
    }
}

/// Null handling shared by the plain scalar types
fn default_on_null<T: Default>(conversion: NullConversion) -> ConversionResult<T> {
    match conversion {
        NullConversion::AllTypes => Ok(T::default()),
        NullConversion::TextOnly => Err(ConversionError::UnexpectedNull),
    }
}

macro_rules! impl_into_value_int {
    ($($ty:ty),*) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Integer(self as i64)
                }
            }
        )*
    };
}

impl_into_value_int!(i64, i32, i16, i8, u32, u16, u8);

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Real(self)
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::Real(self as f64)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(self.to_string())
    }
}

impl IntoValue for Vec<u8> {
    fn into_value(self) -> Value {
        Value::Blob(self)
    }
}

impl IntoValue for &[u8] {
    fn into_value(self) -> Value {
        Value::Blob(self.to_vec())
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Integer(if self { 1 } else { 0 })
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> ConversionResult<Self> {
        match value {
            Value::Integer(v) => Ok(v),
            Value::Real(v) if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 => Ok(v as i64),
            Value::Real(v) => Err(ConversionError::OutOfRange { target: "i64", value: v.to_string() }),
            Value::Text(s) => {
                s.trim().parse().map_err(|_| ConversionError::Parse { target: "i64", value: s })
            }
            other => Err(mismatch("Integer", &other)),
        }
    }

    fn from_null(conversion: NullConversion) -> ConversionResult<Self> {
        default_on_null(conversion)
    }
}

macro_rules! impl_from_value_narrow_int {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> ConversionResult<Self> {
                    let wide = i64::from_value(value)?;
                    <$ty>::try_from(wide).map_err(|_| ConversionError::OutOfRange {
                        target: stringify!($ty),
                        value:  wide.to_string(),
                    })
                }

                fn from_null(conversion: NullConversion) -> ConversionResult<Self> {
                    default_on_null(conversion)
                }
            }
        )*
    };
}

impl_from_value_narrow_int!(i32, i16, i8, u64, u32, u16, u8);

impl FromValue for f64 {
    fn from_value(value: Value) -> ConversionResult<Self> {
        match value {
            Value::Real(v) => Ok(v),
            Value::Integer(v) => Ok(v as f64),
            Value::Text(s) => {
                s.trim().parse().map_err(|_| ConversionError::Parse { target: "f64", value: s })
            }
            other => Err(mismatch("Real", &other)),
        }
    }

    fn from_null(conversion: NullConversion) -> ConversionResult<Self> {
        default_on_null(conversion)
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> ConversionResult<Self> {
        f64::from_value(value).map(|v| v as f32)
    }

    fn from_null(conversion: NullConversion) -> ConversionResult<Self> {
        default_on_null(conversion)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> ConversionResult<Self> {
        match value {
            Value::Text(v) => Ok(v),
            Value::Integer(v) => Ok(v.to_string()),
            Value::Real(v) => Ok(v.to_string()),
            other => Err(mismatch("Text", &other)),
        }
    }

    // Text accepts null as empty under every driver family.
    fn from_null(_: NullConversion) -> ConversionResult<Self> {
        Ok(String::new())
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> ConversionResult<Self> {
        match value {
            Value::Blob(v) => Ok(v),
            Value::Text(s) => Ok(s.into_bytes()),
            other => Err(mismatch("Blob", &other)),
        }
    }

    fn from_null(conversion: NullConversion) -> ConversionResult<Self> {
        default_on_null(conversion)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> ConversionResult<Self> {
        match value {
            Value::Integer(v) => Ok(v != 0),
            Value::Text(s) => {
                let t = s.trim();
                if t.eq_ignore_ascii_case("true") || t == "1" {
                    Ok(true)
                } else if t.eq_ignore_ascii_case("false") || t == "0" {
                    Ok(false)
                } else {
                    Err(ConversionError::Parse { target: "bool", value: s.clone() })
                }
            }
            other => Err(mismatch("Integer (boolean)", &other)),
        }
    }

    fn from_null(conversion: NullConversion) -> ConversionResult<Self> {
        default_on_null(conversion)
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> ConversionResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn from_null(_: NullConversion) -> ConversionResult<Self> {
        Ok(None)
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> ConversionResult<Self> {
        Ok(value)
    }

    fn from_null(_: NullConversion) -> ConversionResult<Self> {
        Ok(Value::Null)
    }
}

#[cfg(feature = "with-chrono")]
mod chrono_impl {
    use chrono::DateTime;
    use chrono::NaiveDate;
    use chrono::NaiveDateTime;
    use chrono::NaiveTime;
    use chrono::Utc;

    use super::*;

    impl IntoValue for NaiveDateTime {
        fn into_value(self) -> Value {
            Value::Text(self.format("%Y-%m-%d %H:%M:%S").to_string())
        }
    }

    impl FromValue for NaiveDateTime {
        fn from_value(value: Value) -> ConversionResult<Self> {
            match value {
                Value::Text(s) => NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                    .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S"))
                    .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f"))
                    .map_err(|_| ConversionError::Parse { target: "NaiveDateTime", value: s }),
                Value::Integer(secs) => DateTime::from_timestamp(secs, 0)
                    .map(|dt| dt.naive_utc())
                    .ok_or(ConversionError::OutOfRange { target: "NaiveDateTime", value: secs.to_string() }),
                other => Err(mismatch("Text (datetime)", &other)),
            }
        }

        fn from_null(conversion: NullConversion) -> ConversionResult<Self> {
            default_on_null(conversion)
        }
    }

    impl IntoValue for DateTime<Utc> {
        fn into_value(self) -> Value {
            Value::Text(self.format("%Y-%m-%d %H:%M:%S").to_string())
        }
    }

    impl FromValue for DateTime<Utc> {
        fn from_value(value: Value) -> ConversionResult<Self> {
            let ndt = NaiveDateTime::from_value(value)?;
            Ok(DateTime::from_naive_utc_and_offset(ndt, Utc))
        }

        fn from_null(conversion: NullConversion) -> ConversionResult<Self> {
            default_on_null(conversion)
        }
    }

    impl IntoValue for NaiveDate {
        fn into_value(self) -> Value {
            Value::Text(self.format("%Y-%m-%d").to_string())
        }
    }

    impl FromValue for NaiveDate {
        fn from_value(value: Value) -> ConversionResult<Self> {
            match value {
                Value::Text(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                    .map_err(|_| ConversionError::Parse { target: "NaiveDate", value: s }),
                other => Err(mismatch("Text (date)", &other)),
            }
        }

        fn from_null(conversion: NullConversion) -> ConversionResult<Self> {
            default_on_null(conversion)
        }
    }

    impl IntoValue for NaiveTime {
        fn into_value(self) -> Value {
            Value::Text(self.format("%H:%M:%S").to_string())
        }
    }

    impl FromValue for NaiveTime {
        fn from_value(value: Value) -> ConversionResult<Self> {
            match value {
                Value::Text(s) => NaiveTime::parse_from_str(&s, "%H:%M:%S")
                    .map_err(|_| ConversionError::Parse { target: "NaiveTime", value: s }),
                other => Err(mismatch("Text (time)", &other)),
            }
        }

        fn from_null(conversion: NullConversion) -> ConversionResult<Self> {
            default_on_null(conversion)
        }
    }
}

#[cfg(feature = "with-uuid")]
mod uuid_impl {
    use uuid::Uuid;

    use super::*;

    impl IntoValue for Uuid {
        fn into_value(self) -> Value {
            Value::Text(self.to_string())
        }
    }

    impl FromValue for Uuid {
        fn from_value(value: Value) -> ConversionResult<Self> {
            match value {
                Value::Text(s) => Uuid::parse_str(&s).map_err(|_| ConversionError::Parse { target: "Uuid", value: s }),
                Value::Blob(b) => Uuid::from_slice(&b)
                    .map_err(|_| ConversionError::Parse { target: "Uuid", value: format!("{:?}", b) }),
                other => Err(mismatch("Text or Blob (UUID)", &other)),
            }
        }

        fn from_null(conversion: NullConversion) -> ConversionResult<Self> {
            default_on_null(conversion)
        }
    }
}

#[cfg(feature = "with-decimal")]
mod decimal_impl {
    use std::str::FromStr;

    use rust_decimal::Decimal;
    use rust_decimal::prelude::FromPrimitive;

    use super::*;

    // Stored as text so no digits are lost to REAL
    impl IntoValue for Decimal {
        fn into_value(self) -> Value {
            Value::Text(self.to_string())
        }
    }

    impl FromValue for Decimal {
        fn from_value(value: Value) -> ConversionResult<Self> {
            match value {
                Value::Integer(v) => Ok(Decimal::from(v)),
                Value::Real(v) => {
                    Decimal::from_f64(v).ok_or(ConversionError::OutOfRange { target: "Decimal", value: v.to_string() })
                }
                Value::Text(s) => {
                    let parsed = Decimal::from_str(s.trim()).or_else(|_| Decimal::from_scientific(s.trim()));
                    parsed.map_err(|_| ConversionError::Parse { target: "Decimal", value: s })
                }
                other => Err(mismatch("Text, Integer or Real (decimal)", &other)),
            }
        }

        fn from_null(conversion: NullConversion) -> ConversionResult<Self> {
            default_on_null(conversion)
        }
    }
}

#[cfg(feature = "with-json")]
pub use json_impl::Json;

#[cfg(feature = "with-json")]
mod json_impl {
    use serde::Serialize;
    use serde::de::DeserializeOwned;
    use serde_json::Value as JsonValue;

    use super::*;

    /// Wrapper for members stored as JSON text
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct Json<T>(pub T);

    impl<T: Serialize> IntoValue for Json<T> {
        fn into_value(self) -> Value {
            match serde_json::to_string(&self.0) {
                Ok(s) => Value::Text(s),
                Err(_) => Value::Null,
            }
        }
    }

    impl<T: DeserializeOwned> FromValue for Json<T> {
        fn from_value(value: Value) -> ConversionResult<Self> {
            let parsed = match value {
                Value::Text(s) => serde_json::from_str(&s).map_err(|e| ConversionError::Parse {
                    target: std::any::type_name::<T>(),
                    value:  e.to_string(),
                })?,
                Value::Blob(b) => serde_json::from_slice(&b).map_err(|e| ConversionError::Parse {
                    target: std::any::type_name::<T>(),
                    value:  e.to_string(),
                })?,
                other => return Err(mismatch("Text (JSON)", &other)),
            };
            Ok(Json(parsed))
        }
    }

    impl IntoValue for JsonValue {
        fn into_value(self) -> Value {
            Value::Text(self.to_string())
        }
    }

    impl FromValue for JsonValue {
        fn from_value(value: Value) -> ConversionResult<Self> {
            match value {
                Value::Text(s) => serde_json::from_str(&s)
                    .map_err(|e| ConversionError::Parse { target: "serde_json::Value", value: e.to_string() }),
                other => Err(mismatch("Text (JSON)", &other)),
            }
        }

        fn from_null(_: NullConversion) -> ConversionResult<Self> {
            Ok(JsonValue::Null)
        }
    }
}
