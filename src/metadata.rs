//! Type metadata cache
//!
//! A [`TypeDescriptor`] records how a [`FromRow`] type is shaped and which of
//! its members can receive columns. Descriptors are computed from the static
//! tables emitted by `#[derive(FromRow)]`, never from a live row, and are
//! cached for the life of the process.

use std::any::TypeId;
use std::sync::Arc;
use std::sync::LazyLock;

use convert_case::Case;
use convert_case::Casing;
use dashmap::DashMap;

use crate::bind::FromRow;
use crate::settings::NameTransform;
use crate::settings::Settings;

static CACHE: LazyLock<DashMap<CacheKey, Arc<TypeDescriptor>>> = LazyLock::new(DashMap::new);

/// How a type consumes the columns of a row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// One scalar taken from the first column
    Simple,
    /// A fixed number of scalars taken positionally from the leading columns
    Tuple(usize),
    /// Named members matched against column names
    Record,
}

/// A named member of a record type, as declared on the Rust side
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Member {
    pub name:   &'static str,
    pub public: bool,
}

impl Member {
    pub const fn new(name: &'static str, public: bool) -> Self {
        Self { name, public }
    }
}

/// A member that may receive a column, with its accepted names
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberBinding {
    /// Index of the member in [`FromRow::members`]
    pub slot:       usize,
    pub name:       &'static str,
    /// The member's own name, followed by its snake_case form when names are transformed
    pub candidates: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct CacheKey {
    type_id:         TypeId,
    name_transform:  NameTransform,
    include_private: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDescriptor {
    type_name:      &'static str,
    shape:          Shape,
    name_transform: NameTransform,
    members:        Vec<MemberBinding>,
}

impl TypeDescriptor {
    /// Cached descriptor of `T` under the matching rules in `settings`
    pub fn of<T: FromRow>(settings: &Settings) -> Arc<TypeDescriptor> {
        let key = CacheKey {
            type_id:         TypeId::of::<T>(),
            name_transform:  settings.name_transform(),
            include_private: settings.include_private(),
        };

        if let Some(found) = CACHE.get(&key) {
            return Arc::clone(&found);
        }

        let descriptor = Arc::new(Self::describe::<T>(key.name_transform, key.include_private));
        tracing::debug!(type_name = descriptor.type_name, shape = ?descriptor.shape, "computed type descriptor");
        Arc::clone(&CACHE.entry(key).or_insert(descriptor))
    }

    /// Build a descriptor without touching the cache
    pub fn describe<T: FromRow>(name_transform: NameTransform, include_private: bool) -> Self {
        let shape = T::shape();
        let members = match shape {
            Shape::Record => T::members()
                .iter()
                .enumerate()
                .filter(|(_, m)| m.public || include_private)
                .map(|(slot, m)| {
                    let mut candidates = vec![m.name.to_string()];
                    if name_transform == NameTransform::SnakeCase {
                        let snake = m.name.to_case(Case::Snake);
                        if snake != m.name {
                            candidates.push(snake);
                        }
                    }
                    MemberBinding { slot, name: m.name, candidates }
                })
                .collect(),
            Shape::Simple | Shape::Tuple(_) => Vec::new(),
        };

        Self { type_name: std::any::type_name::<T>(), shape, name_transform, members }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn is_simple(&self) -> bool {
        self.shape == Shape::Simple
    }

    pub fn is_tuple_like(&self) -> bool {
        matches!(self.shape, Shape::Tuple(_))
    }

    /// Number of leading columns a simple or tuple type consumes
    pub fn arity(&self) -> usize {
        match self.shape {
            Shape::Simple => 1,
            Shape::Tuple(n) => n,
            Shape::Record => 0,
        }
    }

    /// Writable members, in declaration order
    pub fn members(&self) -> &[MemberBinding] {
        &self.members
    }

    /// Slot of the member a column named `column` binds to, if any
    ///
    /// Tries an exact match, then a case-insensitive match, then (under
    /// [`NameTransform::SnakeCase`]) the snake_case form of the column against
    /// every candidate.
    pub fn resolve(&self, column: &str) -> Option<usize> {
        if let Some(m) = self.members.iter().find(|m| m.name == column) {
            return Some(m.slot);
        }
        if let Some(m) = self.members.iter().find(|m| m.name.eq_ignore_ascii_case(column)) {
            return Some(m.slot);
        }
        if self.name_transform != NameTransform::SnakeCase {
            return None;
        }

        let snake = column.to_case(Case::Snake);
        self.members.iter().find(|m| m.candidates.iter().any(|c| c.eq_ignore_ascii_case(&snake))).map(|m| m.slot)
    }
}
