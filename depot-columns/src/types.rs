//! Core column and sheet descriptor types.
//!
//! Descriptors serialize with the camelCase attribute names the sheet editor
//! stores (`typeStr`, `defaultValue`, `iconName`, ...), so a descriptor can be
//! written to JSON or YAML and read back without translation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};

use crate::defaults::DEFAULT_COLUMN_WIDTH;
use crate::editor::Configurable;
use crate::error::DepotError;

/// The kind of data a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColumnType {
    Int,
    Float,
    Date,
    Bool,
    Text,
    #[serde(rename = "longtext")]
    LongText,
    Image,
    File,
    Enum,
    /// Several choices out of `options`; authored as `", "`-separated text.
    Multiple,
    SheetReference,
    LineReference,
    List,
    Props,
    Grid,
}

impl ColumnType {
    /// Every column type, in registry order.
    pub const ALL: [ColumnType; 15] = [
        ColumnType::Int,
        ColumnType::Float,
        ColumnType::Date,
        ColumnType::Bool,
        ColumnType::Text,
        ColumnType::LongText,
        ColumnType::Image,
        ColumnType::File,
        ColumnType::Enum,
        ColumnType::Multiple,
        ColumnType::SheetReference,
        ColumnType::LineReference,
        ColumnType::List,
        ColumnType::Props,
        ColumnType::Grid,
    ];

    /// The `typeStr` tag for this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Float => "float",
            ColumnType::Date => "date",
            ColumnType::Bool => "bool",
            ColumnType::Text => "text",
            ColumnType::LongText => "longtext",
            ColumnType::Image => "image",
            ColumnType::File => "file",
            ColumnType::Enum => "enum",
            ColumnType::Multiple => "multiple",
            ColumnType::SheetReference => "sheetReference",
            ColumnType::LineReference => "lineReference",
            ColumnType::List => "list",
            ColumnType::Props => "props",
            ColumnType::Grid => "grid",
        }
    }

    /// Shape of the `defaultValue` stored on a descriptor of this type.
    pub fn stored_shape(&self) -> ValueShape {
        match self {
            ColumnType::Multiple => ValueShape::String,
            other => other.resolved_shape(),
        }
    }

    /// Shape of the value the resolver seeds a new column of this type with.
    pub fn resolved_shape(&self) -> ValueShape {
        match self {
            ColumnType::Int | ColumnType::Float => ValueShape::Number,
            ColumnType::Date => ValueShape::Timestamp,
            ColumnType::Bool => ValueShape::Bool,
            ColumnType::Text
            | ColumnType::LongText
            | ColumnType::Image
            | ColumnType::File
            | ColumnType::Enum
            | ColumnType::SheetReference
            | ColumnType::LineReference => ValueShape::String,
            ColumnType::Multiple => ValueShape::StringList,
            ColumnType::List | ColumnType::Grid => ValueShape::Array,
            ColumnType::Props => ValueShape::Object,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = DepotError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        ColumnType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == tag)
            .ok_or_else(|| DepotError::UnknownType {
                tag: tag.to_string(),
            })
    }
}

/// A `typeStr` as found on a column instance.
///
/// Instances come from the surrounding application and may carry a tag this
/// crate does not know; those are kept verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeTag {
    Known(ColumnType),
    Unknown(String),
}

impl TypeTag {
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            TypeTag::Known(ty) => Some(*ty),
            TypeTag::Unknown(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TypeTag::Known(ty) => ty.as_str(),
            TypeTag::Unknown(tag) => tag,
        }
    }

    /// True for a missing tag.
    pub fn is_unset(&self) -> bool {
        matches!(self, TypeTag::Unknown(tag) if tag.is_empty())
    }
}

impl Default for TypeTag {
    fn default() -> Self {
        TypeTag::Unknown(String::new())
    }
}

impl From<ColumnType> for TypeTag {
    fn from(ty: ColumnType) -> Self {
        TypeTag::Known(ty)
    }
}

impl From<&str> for TypeTag {
    fn from(tag: &str) -> Self {
        tag.parse::<ColumnType>()
            .map(TypeTag::Known)
            .unwrap_or_else(|_| TypeTag::Unknown(tag.to_string()))
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The documented shape of a default value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Number,
    /// Milliseconds since the Unix epoch.
    Timestamp,
    Bool,
    String,
    StringList,
    Array,
    Object,
}

impl ValueShape {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ValueShape::Number | ValueShape::Timestamp => value.is_number(),
            ValueShape::Bool => value.is_boolean(),
            ValueShape::String => value.is_string(),
            ValueShape::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            ValueShape::Array => value.is_array(),
            ValueShape::Object => value.is_object(),
        }
    }
}

/// How a `multiple` column lays out its choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    Vertical,
    Horizontal,
}

fn default_width() -> u32 {
    DEFAULT_COLUMN_WIDTH
}

/// A column descriptor: the template for one column type, and the shape of
/// every column instance cloned from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    #[serde(default, skip_serializing_if = "TypeTag::is_unset")]
    pub type_str: TypeTag,
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// `None` when the attribute is absent; an explicit `null` is `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_to_current_date: Option<bool>,
    /// Choices for `enum` and `multiple`, authored as `", "`-separated text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_type: Option<DisplayType>,
    /// Name of the sheet a reference, list or props column points at.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    /// Columns of each grid cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<ColumnDef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_height: Option<u32>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default)]
    pub icon_name: String,
    #[serde(default, skip_serializing_if = "Configurable::is_empty")]
    pub configurable: Configurable,
}

impl ColumnDef {
    /// A blank descriptor for `type_str`.
    pub fn new(type_str: impl Into<TypeTag>) -> Self {
        Self {
            type_str: type_str.into(),
            ..Self::default()
        }
    }

    pub fn column_type(&self) -> Option<ColumnType> {
        self.type_str.column_type()
    }

    /// Whether a new date cell takes today's date instead of `defaultValue`.
    pub fn defaults_to_current_date(&self) -> bool {
        self.default_to_current_date.unwrap_or(false)
    }
}

/// Keeps an explicit `null` apart from a missing attribute.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl Default for ColumnDef {
    fn default() -> Self {
        Self {
            type_str: TypeTag::default(),
            guid: String::new(),
            name: String::new(),
            description: String::new(),
            default_value: None,
            min: None,
            max: None,
            default_to_current_date: None,
            options: None,
            display_type: None,
            sheet: None,
            schema: None,
            length: None,
            display_width: None,
            column_width: None,
            column_height: None,
            width: DEFAULT_COLUMN_WIDTH,
            icon_name: String::new(),
            configurable: Configurable::new(),
        }
    }
}

/// The sheet container descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Column whose value labels a line when it is referenced elsewhere.
    #[serde(default)]
    pub display_column: String,
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub columns: Vec<ColumnDef>,
    #[serde(default)]
    pub lines: Vec<serde_json::Map<String, Value>>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub is_props: bool,
    #[serde(default, skip_serializing_if = "Configurable::is_empty")]
    pub configurable: Configurable,
}
