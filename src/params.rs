//! Command parameters
//!
//! Parameters are passed through to the driver untouched. Positional
//! parameters bind to `?` placeholders in order; named parameters bind to
//! `:name`, `@name` or `$name` placeholders.

use crate::value::IntoValue;
use crate::value::Value;

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Params {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(Vec<(String, Value)>),
}

impl Params {
    pub fn len(&self) -> usize {
        match self {
            Params::None => 0,
            Params::Positional(values) => values.len(),
            Params::Named(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build named parameters; names may be given with or without a prefix
    pub fn named<N, V, I>(pairs: I) -> Self
    where
        N: Into<String>,
        V: IntoValue,
        I: IntoIterator<Item = (N, V)>, {
        Params::Named(pairs.into_iter().map(|(n, v)| (normalize_name(n.into()), v.into_value())).collect())
    }
}

/// Names are stored with a `:` prefix unless they already carry one
fn normalize_name(name: String) -> String {
    if name.starts_with([':', '@', '$']) { name } else { format!(":{}", name) }
}

impl From<Params> for turso::params::Params {
    fn from(params: Params) -> Self {
        match params {
            Params::None => turso::params::Params::None,
            Params::Positional(values) => turso::params::Params::Positional(values),
            Params::Named(values) => turso::params::Params::Named(values),
        }
    }
}

/// Conversion of caller-supplied arguments into [`Params`]
pub trait IntoParams {
    fn into_params(self) -> Params;
}

impl IntoParams for Params {
    fn into_params(self) -> Params {
        self
    }
}

impl IntoParams for () {
    fn into_params(self) -> Params {
        Params::None
    }
}

impl<V: IntoValue> IntoParams for Vec<V> {
    fn into_params(self) -> Params {
        Params::Positional(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<V: IntoValue, const N: usize> IntoParams for [V; N] {
    fn into_params(self) -> Params {
        Params::Positional(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<V: IntoValue + Clone> IntoParams for &[(&str, V)] {
    fn into_params(self) -> Params {
        Params::named(self.iter().map(|(n, v)| (*n, v.clone())))
    }
}

macro_rules! impl_into_params_tuple {
    ($($name:ident),+) => {
        impl<$($name: IntoValue),+> IntoParams for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_params(self) -> Params {
                let ($($name,)+) = self;
                Params::Positional(vec![$($name.into_value()),+])
            }
        }
    };
}

impl_into_params_tuple!(A);
impl_into_params_tuple!(A, B);
impl_into_params_tuple!(A, B, C);
impl_into_params_tuple!(A, B, C, D);
impl_into_params_tuple!(A, B, C, D, E);
impl_into_params_tuple!(A, B, C, D, E, F);
impl_into_params_tuple!(A, B, C, D, E, F, G);
impl_into_params_tuple!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_is_none() {
        assert_eq!(().into_params(), Params::None);
        assert!(Params::None.is_empty());
    }

    #[test]
    fn test_tuple_params() {
        let params = (1i64, "a", true).into_params();
        assert_eq!(
            params,
            Params::Positional(vec![Value::Integer(1), Value::Text("a".into()), Value::Integer(1)])
        );
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_vec_and_array_params() {
        assert_eq!(vec![1i64, 2].into_params(), Params::Positional(vec![Value::Integer(1), Value::Integer(2)]));
        assert_eq!(["x"].into_params(), Params::Positional(vec![Value::Text("x".into())]));
    }

    #[test]
    fn test_named_params_are_prefixed() {
        let params = (&[("id", 7i64), ("@other", 8)][..]).into_params();
        assert_eq!(
            params,
            Params::Named(vec![(":id".to_string(), Value::Integer(7)), ("@other".to_string(), Value::Integer(8))])
        );
    }
}
