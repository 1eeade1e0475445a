//! Entity field tables
//!
//! Every stored type declares a static table of its fields. The table is the
//! only place a field name is mapped to a value, so filtering, ordering and
//! the SQL backend all work from the same allow-list instead of reflection.
//!
//! # Example
//!
//! ```rust
//! use todo_service::models::Category;
//! use todo_service::repository::{Entity, FieldValue};
//!
//! let category = Category { id: 3, name: "Work".to_string() };
//! let name = Category::field("name").map(|def| (def.accessor)(&category));
//! assert_eq!(name, Some(FieldValue::Text("Work".to_string())));
//! assert!(Category::sortable_field("name").is_some());
//! ```

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, Utc};

/// Storage type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// 64-bit (or narrower) integer column
    Integer,
    /// Text column
    Text,
    /// Boolean column
    Boolean,
    /// UTC timestamp column
    Timestamp,
}

/// A typed field value read from an entity
///
/// Values order with `Null` first, then by content. Comparing values of
/// different kinds falls back to declaration order, which only happens when a
/// table mixes kinds under one name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldValue {
    /// Absent value
    Null,
    /// Integer value
    Integer(i64),
    /// Text value
    Text(String),
    /// Boolean value
    Boolean(bool),
    /// Timestamp value
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value is `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// One entry of an entity's field table
pub struct FieldDef<E> {
    /// Field (and column) name
    pub name: &'static str,
    /// Storage type, used when a null has to be bound with a concrete type
    pub kind: FieldKind,
    /// Reads the field from an entity
    pub accessor: fn(&E) -> FieldValue,
    /// Whether clients may order listings by this field
    pub sortable: bool,
}

impl<E> fmt::Debug for FieldDef<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("sortable", &self.sortable)
            .finish()
    }
}

/// A stored type with an integer primary key and a static field table
pub trait Entity: Clone + Send + Sync + 'static {
    /// Human-readable type name used in errors and logs
    const NAME: &'static str;

    /// Backing table name
    const TABLE: &'static str;

    /// All fields, primary key included
    const FIELDS: &'static [FieldDef<Self>];

    /// Fields whose non-null values must be unique across the table
    const UNIQUE: &'static [&'static str] = &[];

    /// Primary key; zero until the store assigns one
    fn id(&self) -> i64;

    /// Copy of the entity carrying the given primary key
    #[must_use]
    fn with_id(self, id: i64) -> Self;

    /// Look up a field definition by exact name
    fn field(name: &str) -> Option<&'static FieldDef<Self>> {
        Self::FIELDS.iter().find(|def| def.name == name)
    }

    /// Look up a field that clients are allowed to sort on
    fn sortable_field(name: &str) -> Option<&'static FieldDef<Self>> {
        Self::field(name).filter(|def| def.sortable)
    }

    /// Read a field by name; `None` when the name is not in the table
    fn value_of(&self, name: &str) -> Option<FieldValue> {
        Self::field(name).map(|def| (def.accessor)(self))
    }
}

/// Compare two entities on one field, breaking ties by ascending id
pub fn compare_by<E: Entity>(a: &E, b: &E, def: &FieldDef<E>, descending: bool) -> Ordering {
    let primary = (def.accessor)(a).cmp(&(def.accessor)(b));
    let primary = if descending { primary.reverse() } else { primary };
    primary.then_with(|| a.id().cmp(&b.id()))
}
