//! Mapping from declared parameter types to JSON-Schema type fragments.
//!
//! Only four declared types reach the schema: strings, integers, and
//! enumerations backed by either. [`map_type`] is the single mapping table;
//! everything else is reported as [`ToolError::UnsupportedType`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// The type a parameter was declared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredType {
    String,
    Integer,
    /// String-backed enumeration; values in declaration order.
    StringEnum(Vec<String>),
    /// Integer-backed enumeration; values in declaration order.
    IntegerEnum(Vec<i64>),
    /// A type the schema cannot express, by name.
    Other(String),
}

impl DeclaredType {
    pub fn other(name: impl Into<String>) -> Self {
        DeclaredType::Other(name.into())
    }
}

/// JSON-Schema primitive type names used in tool descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    String,
    Integer,
}

/// A single literal of an enumerated type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnumValue {
    String(String),
    Integer(i64),
}

impl From<&str> for EnumValue {
    fn from(value: &str) -> Self {
        EnumValue::String(value.to_owned())
    }
}

impl From<i64> for EnumValue {
    fn from(value: i64) -> Self {
        EnumValue::Integer(value)
    }
}

/// `{ "type": ..., "enum": [...] }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeFragment {
    #[serde(rename = "type")]
    pub kind: JsonType,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<EnumValue>>,
}

impl TypeFragment {
    fn plain(kind: JsonType) -> Self {
        Self { kind, values: None }
    }

    fn enumerated(kind: JsonType, values: Vec<EnumValue>) -> Self {
        Self {
            kind,
            values: Some(values),
        }
    }
}

/// Maps the declared type of `parameter` (belonging to `function`) to its
/// schema fragment.
///
/// A missing declaration, an [`DeclaredType::Other`] type, or an enumeration
/// without values fails with [`ToolError::UnsupportedType`].
pub fn map_type(
    function: &str,
    parameter: &str,
    declared: Option<&DeclaredType>,
) -> Result<TypeFragment, ToolError> {
    let unsupported = |found: Option<String>| ToolError::UnsupportedType {
        function: function.to_owned(),
        parameter: parameter.to_owned(),
        found,
    };

    match declared {
        None => Err(unsupported(None)),
        Some(DeclaredType::String) => Ok(TypeFragment::plain(JsonType::String)),
        Some(DeclaredType::Integer) => Ok(TypeFragment::plain(JsonType::Integer)),
        Some(DeclaredType::StringEnum(values)) if values.is_empty() => {
            Err(unsupported(Some("empty string enumeration".into())))
        }
        Some(DeclaredType::StringEnum(values)) => Ok(TypeFragment::enumerated(
            JsonType::String,
            values.iter().map(|v| EnumValue::String(v.clone())).collect(),
        )),
        Some(DeclaredType::IntegerEnum(values)) if values.is_empty() => {
            Err(unsupported(Some("empty integer enumeration".into())))
        }
        Some(DeclaredType::IntegerEnum(values)) => Ok(TypeFragment::enumerated(
            JsonType::Integer,
            values.iter().copied().map(EnumValue::Integer).collect(),
        )),
        Some(DeclaredType::Other(name)) => Err(unsupported(Some(name.clone()))),
    }
}

// ============================================================================
// RUST TYPES AS TOOL PARAMETERS
// ============================================================================

/// Rust types that can appear as parameters of a `#[tool]` function.
///
/// Implemented for `String`, the primitive integers, `Option<T>` and any
/// enum deriving `ToolEnum`.
pub trait ToolParam: Sized {
    /// Optional parameters are never listed as required.
    const OPTIONAL: bool = false;

    fn declared_type() -> DeclaredType;

    /// Decodes one argument value supplied by the model.
    fn from_value(value: Value) -> Result<Self, String>;

    /// Value used when the model leaves the argument out.
    fn absent() -> Option<Self> {
        None
    }
}

impl ToolParam for String {
    fn declared_type() -> DeclaredType {
        DeclaredType::String
    }

    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(format!("expected a string, got {other}")),
        }
    }
}

macro_rules! integer {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToolParam for $ty {
                fn declared_type() -> DeclaredType {
                    DeclaredType::Integer
                }

                fn from_value(value: Value) -> Result<Self, String> {
                    serde_json::from_value(value).map_err(|e| e.to_string())
                }
            }
        )+
    };
}

integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl<T: ToolParam> ToolParam for Option<T> {
    const OPTIONAL: bool = true;

    fn declared_type() -> DeclaredType {
        T::declared_type()
    }

    fn from_value(value: Value) -> Result<Self, String> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }

    fn absent() -> Option<Self> {
        Some(None)
    }
}
