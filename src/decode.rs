//! Row decoding
//!
//! Turns the raw values of one driver row into [`ColumnValue`]s in driver
//! order. Database nulls become `None`; every other value passes through
//! unchanged unless a [`ColumnHook`] supplies a non-null replacement.

use crate::settings::ColumnHook;
use crate::value::Value;

/// One column of one row, ready for binding
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnValue<'a> {
    pub name:    &'a str,
    /// `None` when the database value was null
    pub value:   Option<Value>,
    pub ordinal: usize,
}

/// Decode a raw row against the column names of its result set
///
/// `names` is indexed by ordinal; a row wider than `names` gets empty names
/// for the extra columns.
pub fn decode_row<'a>(names: &'a [String], raw: Vec<Value>, hook: Option<&ColumnHook>) -> Vec<ColumnValue<'a>> {
    raw.into_iter()
        .enumerate()
        .map(|(ordinal, value)| {
            let name = names.get(ordinal).map(String::as_str).unwrap_or_default();
            let value = match hook.and_then(|h| h.apply(name, ordinal, &value)) {
                Some(replacement) if !matches!(replacement, Value::Null) => replacement,
                _ => value,
            };
            let value = match value {
                Value::Null => None,
                other => Some(other),
            };
            ColumnValue { name, value, ordinal }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_decode_keeps_driver_order() {
        let names = names(&["film_id", "title"]);
        let row = decode_row(&names, vec![Value::Integer(111), Value::Text("Alpha".into())], None);

        assert_eq!(row.len(), 2);
        assert_eq!(row[0], ColumnValue { name: "film_id", value: Some(Value::Integer(111)), ordinal: 0 });
        assert_eq!(row[1], ColumnValue { name: "title", value: Some(Value::Text("Alpha".into())), ordinal: 1 });
    }

    #[test]
    fn test_decode_substitutes_null() {
        let names = names(&["a", "b"]);
        let row = decode_row(&names, vec![Value::Null, Value::Real(1.5)], None);
        assert_eq!(row[0].value, None);
        assert_eq!(row[1].value, Some(Value::Real(1.5)));
    }

    #[test]
    fn test_decode_unnamed_extra_columns() {
        let names = names(&["a"]);
        let row = decode_row(&names, vec![Value::Integer(1), Value::Integer(2)], None);
        assert_eq!(row[1].name, "");
        assert_eq!(row[1].ordinal, 1);
    }

    #[test]
    fn test_hook_replacement_takes_precedence() {
        let hook = ColumnHook::new(|name, _, value| match (name, value) {
            ("rating", Value::Text(s)) => Some(Value::Text(s.to_uppercase())),
            ("kept", _) => Some(Value::Null),
            _ => None,
        });
        let names = names(&["rating", "title", "kept"]);
        let row = decode_row(
            &names,
            vec![Value::Text("pg".into()), Value::Text("pg".into()), Value::Integer(3)],
            Some(&hook),
        );

        assert_eq!(row[0].value, Some(Value::Text("PG".into())));
        assert_eq!(row[1].value, Some(Value::Text("pg".into())));
        assert_eq!(row[2].value, Some(Value::Integer(3)));
    }
}
