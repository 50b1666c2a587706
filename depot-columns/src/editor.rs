//! Editor widgets and the configurable map.
//!
//! A descriptor's `configurable` map says which of its attributes an end user
//! may edit, and with which widget. Widget tags are strings such as `"text"`,
//! `"sheetSelect"` or `"lineSelect@sheet"`; the part after `@` names the
//! descriptor field holding the sheet to pick from.
//!
//! Auxiliary widget settings live next to the editors under a compound key
//! `<widget tag>@<attribute>`, for example `"enum@displayType"` or
//! `"columnSelect@name@displayColumn"`.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DepotError;
use crate::types::ColumnType;

/// The widget family used to edit an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorKind {
    Text,
    LongText,
    Int,
    Float,
    Bool,
    Date,
    Enum,
    Grid,
    SheetSelect,
    ColumnSelect,
    LineSelect,
}

impl EditorKind {
    /// Tag as written in a configurable map.
    pub fn as_str(&self) -> &'static str {
        match self {
            EditorKind::Text => "text",
            EditorKind::LongText => "longtext",
            EditorKind::Int => "int",
            EditorKind::Float => "float",
            EditorKind::Bool => "bool",
            EditorKind::Date => "date",
            EditorKind::Enum => "enum",
            EditorKind::Grid => "grid",
            EditorKind::SheetSelect => "sheetSelect",
            EditorKind::ColumnSelect => "columnSelect",
            EditorKind::LineSelect => "lineSelect",
        }
    }

    /// Whether the widget needs a `@<field>` target naming the source sheet.
    pub fn requires_target(&self) -> bool {
        matches!(self, EditorKind::ColumnSelect | EditorKind::LineSelect)
    }

    fn from_tag(tag: &str) -> Option<Self> {
        let kind = match tag {
            "text" => EditorKind::Text,
            "longtext" => EditorKind::LongText,
            "int" => EditorKind::Int,
            "float" => EditorKind::Float,
            "bool" => EditorKind::Bool,
            "date" => EditorKind::Date,
            "enum" => EditorKind::Enum,
            "grid" => EditorKind::Grid,
            "sheetSelect" => EditorKind::SheetSelect,
            "columnSelect" => EditorKind::ColumnSelect,
            "lineSelect" => EditorKind::LineSelect,
            _ => return None,
        };
        Some(kind)
    }
}

/// An editor widget, optionally bound to the field that names its source sheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Editor {
    pub kind: EditorKind,
    pub target: Option<String>,
}

impl Editor {
    pub const TEXT: Editor = Editor::plain(EditorKind::Text);
    pub const LONG_TEXT: Editor = Editor::plain(EditorKind::LongText);
    pub const INT: Editor = Editor::plain(EditorKind::Int);
    pub const FLOAT: Editor = Editor::plain(EditorKind::Float);
    pub const BOOL: Editor = Editor::plain(EditorKind::Bool);
    pub const DATE: Editor = Editor::plain(EditorKind::Date);
    pub const ENUM: Editor = Editor::plain(EditorKind::Enum);
    pub const GRID: Editor = Editor::plain(EditorKind::Grid);
    pub const SHEET_SELECT: Editor = Editor::plain(EditorKind::SheetSelect);

    const fn plain(kind: EditorKind) -> Self {
        Self { kind, target: None }
    }

    /// Pick a column of the sheet named by `field`.
    pub fn column_select(field: impl Into<String>) -> Self {
        Self {
            kind: EditorKind::ColumnSelect,
            target: Some(field.into()),
        }
    }

    /// Pick a line of the sheet named by `field`.
    pub fn line_select(field: impl Into<String>) -> Self {
        Self {
            kind: EditorKind::LineSelect,
            target: Some(field.into()),
        }
    }

    /// Key under which this editor's auxiliary settings for `attr` are stored.
    pub fn settings_key(&self, attr: &str) -> String {
        format!("{self}@{attr}")
    }
}

impl fmt::Display for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{}@{}", self.kind.as_str(), target),
            None => f.write_str(self.kind.as_str()),
        }
    }
}

impl FromStr for Editor {
    type Err = DepotError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| DepotError::InvalidEditor {
            tag: tag.to_string(),
            message: message.to_string(),
        };

        let (head, target) = match tag.split_once('@') {
            Some((head, target)) => (head, Some(target)),
            None => (tag, None),
        };
        let kind = EditorKind::from_tag(head).ok_or_else(|| invalid("unknown widget"))?;

        match (kind.requires_target(), target) {
            (true, None) => Err(invalid("missing target field")),
            (true, Some("")) => Err(invalid("missing target field")),
            (true, Some(target)) => Ok(Editor {
                kind,
                target: Some(target.to_string()),
            }),
            (false, None) => Ok(Editor::plain(kind)),
            (false, Some(_)) => Err(invalid("widget does not take a target field")),
        }
    }
}

impl TryFrom<String> for Editor {
    type Error = DepotError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

impl From<Editor> for String {
    fn from(editor: Editor) -> Self {
        editor.to_string()
    }
}

/// Auxiliary configuration for an editor widget.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSettings {
    /// Column types a column or grid picker may offer.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_types: Vec<ColumnType>,
    /// Fixed choices for an enum picker.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_empty: Option<bool>,
}

impl EditorSettings {
    pub fn allowed_types(types: impl IntoIterator<Item = ColumnType>) -> Self {
        Self {
            allowed_types: types.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn options<S: Into<String>>(options: impl IntoIterator<Item = S>) -> Self {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn allow_empty(allow: bool) -> Self {
        Self {
            allow_empty: Some(allow),
            ..Self::default()
        }
    }
}

/// One value of a configurable map: an editor tag, or the settings for one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigEntry {
    Editor(Editor),
    Settings(EditorSettings),
}

/// Ordered map of editable attributes to their editors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Configurable(IndexMap<String, ConfigEntry>);

impl Configurable {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Expose `attr` through `editor`.
    pub fn with_editor(mut self, attr: impl Into<String>, editor: Editor) -> Self {
        self.0.insert(attr.into(), ConfigEntry::Editor(editor));
        self
    }

    /// Expose `attr` through `editor` and store its auxiliary settings.
    pub fn with_editor_settings(
        mut self,
        attr: impl Into<String>,
        editor: Editor,
        settings: EditorSettings,
    ) -> Self {
        let attr = attr.into();
        let key = editor.settings_key(&attr);
        self.0.insert(attr, ConfigEntry::Editor(editor));
        self.0.insert(key, ConfigEntry::Settings(settings));
        self
    }

    /// The editor used for `attr`, if the attribute is editable.
    pub fn editor_for(&self, attr: &str) -> Option<&Editor> {
        match self.0.get(attr)? {
            ConfigEntry::Editor(editor) => Some(editor),
            ConfigEntry::Settings(_) => None,
        }
    }

    /// Auxiliary settings of the editor used for `attr`.
    pub fn settings_for(&self, attr: &str) -> Option<&EditorSettings> {
        let key = self.editor_for(attr)?.settings_key(attr);
        match self.0.get(&key)? {
            ConfigEntry::Settings(settings) => Some(settings),
            ConfigEntry::Editor(_) => None,
        }
    }

    /// Editable attributes with their editors, in authored order.
    pub fn editors(&self) -> impl Iterator<Item = (&str, &Editor)> + '_ {
        self.0.iter().filter_map(|(key, entry)| match entry {
            ConfigEntry::Editor(editor) => Some((key.as_str(), editor)),
            ConfigEntry::Settings(_) => None,
        })
    }

    /// Auxiliary settings entries with their compound keys.
    pub fn settings(&self) -> impl Iterator<Item = (&str, &EditorSettings)> + '_ {
        self.0.iter().filter_map(|(key, entry)| match entry {
            ConfigEntry::Settings(settings) => Some((key.as_str(), settings)),
            ConfigEntry::Editor(_) => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigEntry)> + '_ {
        self.0.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Split a compound settings key into its widget tag and attribute name.
///
/// `"columnSelect@name@displayColumn"` splits into `("columnSelect@name", "displayColumn")`.
pub fn split_settings_key(key: &str) -> Option<(&str, &str)> {
    key.rsplit_once('@')
}
