//! Structural validation of book request bodies.
//!
//! A body is checked field by field against a fixed schema before it is
//! turned into a typed value. Every failing field is reported, not just the
//! first one.

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::models::{Book, BookFields};

/// Primitive JSON type a field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    /// Integer greater than zero
    PositiveInteger,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn text(name: &'static str) -> FieldRule {
    FieldRule {
        name,
        kind: FieldKind::Text,
    }
}

static KEY_FIELDS: [FieldRule; 1] = [text("isbn")];

static BOOK_FIELDS: [FieldRule; 7] = [
    text("amazon_url"),
    text("author"),
    text("language"),
    FieldRule {
        name: "pages",
        kind: FieldKind::PositiveInteger,
    },
    text("publisher"),
    text("title"),
    FieldRule {
        name: "year",
        kind: FieldKind::Integer,
    },
];

/// Request schema, one per write operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// `isbn` plus every descriptive field
    Create,
    /// Every descriptive field; the key comes from the path
    Update,
}

impl Schema {
    pub fn rules(self) -> impl Iterator<Item = &'static FieldRule> {
        let key: &'static [FieldRule] = match self {
            Schema::Create => &KEY_FIELDS,
            Schema::Update => &[],
        };
        key.iter().chain(BOOK_FIELDS.iter())
    }

    /// Check `body` against this schema. An empty result means valid.
    pub fn check(self, body: &Value) -> Vec<Violation> {
        let Some(object) = body.as_object() else {
            return vec![Violation::new("body", "must be a JSON object")];
        };

        self.rules()
            .filter_map(|rule| match object.get(rule.name) {
                None | Some(Value::Null) => Some(Violation::new(rule.name, "is required")),
                Some(value) => rule.kind.check(value).map(|e| Violation::new(rule.name, e)),
            })
            .collect()
    }
}

impl FieldKind {
    fn check(self, value: &Value) -> Option<&'static str> {
        match self {
            FieldKind::Text if value.is_string() => None,
            FieldKind::Text => Some("must be a string"),
            FieldKind::Integer | FieldKind::PositiveInteger => match value.as_i64() {
                None => Some("must be an integer"),
                Some(n) if n <= 0 && self == FieldKind::PositiveInteger => {
                    Some("must be greater than 0")
                }
                Some(_) => None,
            },
        }
    }
}

/// A single field-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub error: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            error: error.into(),
        }
    }
}

/// A typed payload produced by validating against a [`Schema`].
pub trait Validated: DeserializeOwned {
    const SCHEMA: Schema;
}

impl Validated for Book {
    const SCHEMA: Schema = Schema::Create;
}

impl Validated for BookFields {
    const SCHEMA: Schema = Schema::Update;
}

/// Validate `body` and build the typed payload.
pub fn validate<T: Validated>(body: Value) -> Result<T, Vec<Violation>> {
    let violations = T::SCHEMA.check(&body);
    if !violations.is_empty() {
        return Err(violations);
    }
    serde_json::from_value(body).map_err(|e| vec![Violation::new("body", e.to_string())])
}
