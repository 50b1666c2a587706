//! Built-in column descriptors.
//!
//! `builtin_defaults()` provides one descriptor per column type plus the
//! descriptor of a new sheet. These are passed to
//! `ColumnRegistry::builder().with_defaults()`; hosts may layer their own
//! `ColumnDefaults` on top with `with_overrides()`.

use std::path::Path;

use serde_json::{json, Number};
use tracing::{debug, warn};

use crate::editor::{Configurable, Editor, EditorSettings};
use crate::error::{DepotError, Result};
use crate::resolve::start_of_today;
use crate::types::{ColumnDef, ColumnType, DisplayType, SheetDef};

/// Display width, in pixels, of a freshly created column.
pub const DEFAULT_COLUMN_WIDTH: u32 = 150;

/// A collection of column descriptors and, optionally, a sheet descriptor.
#[derive(Debug, Clone, Default)]
pub struct ColumnDefaults {
    sheet: Option<SheetDef>,
    columns: Vec<ColumnDef>,
}

impl ColumnDefaults {
    pub fn new() -> Self {
        Self {
            sheet: None,
            columns: Vec::new(),
        }
    }

    /// Set the sheet descriptor.
    pub fn sheet(mut self, def: SheetDef) -> Self {
        self.sheet = Some(def);
        self
    }

    /// Add a column descriptor.
    pub fn column(mut self, def: ColumnDef) -> Self {
        self.columns.push(def);
        self
    }

    pub fn sheet_def(&self) -> Option<&SheetDef> {
        self.sheet.as_ref()
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub(crate) fn into_parts(self) -> (Option<SheetDef>, Vec<ColumnDef>) {
        (self.sheet, self.columns)
    }

    /// Load descriptors from a directory holding one `.yaml` file each.
    ///
    /// A file named `sheet.yaml` (or `sheet.yml`) holds the sheet descriptor;
    /// every other file is a column descriptor and must carry a `typeStr`.
    /// Invalid files are skipped with a warning. Read errors abort the load.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(DepotError::OverridesNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            ) {
                paths.push(path);
            }
        }
        // read_dir order is platform dependent
        paths.sort();

        let mut defaults = Self::new();
        for path in paths {
            let content = std::fs::read_to_string(&path)?;
            let is_sheet = path.file_stem().and_then(|s| s.to_str()) == Some(SHEET_FILE_STEM);
            match parse_descriptor(&content, is_sheet) {
                Ok(DescriptorFile::Column(def)) => {
                    debug!(?path, type_str = %def.type_str, "loaded column descriptor");
                    defaults = defaults.column(def);
                }
                Ok(DescriptorFile::Sheet(def)) => {
                    debug!(?path, "loaded sheet descriptor");
                    defaults = defaults.sheet(def);
                }
                Err(e) => {
                    warn!(?path, %e, "skipping invalid column descriptor");
                }
            }
        }
        Ok(defaults)
    }
}

/// File stem of the sheet descriptor in a descriptor directory.
const SHEET_FILE_STEM: &str = "sheet";

/// Parse one descriptor file. Column files without a `typeStr` are rejected.
fn parse_descriptor(content: &str, is_sheet: bool) -> Result<DescriptorFile> {
    let value: serde_yaml_ng::Value = serde_yaml_ng::from_str(content)?;
    let Some(mapping) = value.as_mapping() else {
        return Err(invalid_descriptor("descriptor must be a mapping"));
    };
    if is_sheet {
        return Ok(DescriptorFile::Sheet(serde_yaml_ng::from_value(value)?));
    }
    match mapping.get("typeStr").and_then(|tag| tag.as_str()) {
        Some(tag) if !tag.trim().is_empty() => {
            Ok(DescriptorFile::Column(serde_yaml_ng::from_value(value)?))
        }
        _ => Err(invalid_descriptor("column descriptor has no typeStr")),
    }
}

fn invalid_descriptor(message: &str) -> DepotError {
    DepotError::Yaml(serde::de::Error::custom(message))
}

enum DescriptorFile {
    Column(ColumnDef),
    Sheet(SheetDef),
}

/// The new-sheet descriptor.
pub fn builtin_sheet() -> SheetDef {
    SheetDef {
        name: "newSheet".into(),
        description: "description of what the sheet is".into(),
        display_column: "id".into(),
        guid: String::new(),
        columns: Vec::new(),
        lines: Vec::new(),
        hidden: false,
        is_props: false,
        configurable: Configurable::new()
            .with_editor("name", Editor::TEXT)
            .with_editor("description", Editor::TEXT)
            .with_editor_settings(
                "displayColumn",
                Editor::column_select("name"),
                EditorSettings::allowed_types([
                    ColumnType::Int,
                    ColumnType::Float,
                    ColumnType::Text,
                    ColumnType::LongText,
                    ColumnType::Date,
                ]),
            ),
    }
}

/// All built-in descriptors, with the date default taken at the start of today.
pub fn builtin_defaults() -> ColumnDefaults {
    builtin_defaults_at(start_of_today())
}

/// All built-in descriptors, with the date default pinned to `today_start_ms`.
pub fn builtin_defaults_at(today_start_ms: i64) -> ColumnDefaults {
    ColumnDefaults::new()
        .sheet(builtin_sheet())
        .column(ColumnDef {
            name: "newInt".into(),
            description: "int field".into(),
            min: Some(Number::from(-10000)),
            max: Some(Number::from(100000)),
            default_value: Some(json!(0)),
            icon_name: "newInt".into(),
            configurable: base_configurable()
                .with_editor("min", Editor::INT)
                .with_editor("max", Editor::INT)
                .with_editor("defaultValue", Editor::INT)
                .with_editor("width", Editor::INT),
            ..ColumnDef::new(ColumnType::Int)
        })
        .column(ColumnDef {
            name: "newFloat".into(),
            description: "float field".into(),
            min: Some(Number::from(-10000)),
            max: Some(Number::from(100000)),
            default_value: Some(json!(0)),
            icon_name: "newFloat".into(),
            configurable: base_configurable()
                .with_editor("min", Editor::FLOAT)
                .with_editor("max", Editor::FLOAT)
                .with_editor("defaultValue", Editor::FLOAT)
                .with_editor("width", Editor::INT),
            ..ColumnDef::new(ColumnType::Float)
        })
        .column(ColumnDef {
            name: "newDate".into(),
            description: "date field".into(),
            default_value: Some(json!(today_start_ms)),
            default_to_current_date: Some(true),
            icon_name: "newDate".into(),
            configurable: base_configurable()
                .with_editor("defaultValue", Editor::DATE)
                .with_editor("defaultToCurrentDate", Editor::BOOL)
                .with_editor("width", Editor::INT),
            ..ColumnDef::new(ColumnType::Date)
        })
        .column(ColumnDef {
            name: "newBool".into(),
            description: "bool field".into(),
            default_value: Some(json!(true)),
            icon_name: "newBool".into(),
            configurable: base_configurable()
                .with_editor("defaultValue", Editor::BOOL)
                .with_editor("width", Editor::INT),
            ..ColumnDef::new(ColumnType::Bool)
        })
        .column(text_like(
            ColumnType::Text,
            "newText",
            "text field",
            "newText",
            Editor::TEXT,
        ))
        .column(text_like(
            ColumnType::LongText,
            "newLongText",
            "long text field",
            "newLongText",
            Editor::LONG_TEXT,
        ))
        .column(text_like(
            ColumnType::Image,
            "newImage",
            "new image field",
            "newImage",
            Editor::TEXT,
        ))
        .column(text_like(
            ColumnType::File,
            "newFile",
            "new file field",
            "newFile",
            Editor::TEXT,
        ))
        .column(ColumnDef {
            name: "newEnum".into(),
            description: "new enum field".into(),
            options: Some(String::new()),
            default_value: Some(json!("")),
            icon_name: "newEnum".into(),
            configurable: base_configurable()
                .with_editor("defaultValue", Editor::TEXT)
                .with_editor("options", Editor::TEXT)
                .with_editor("width", Editor::INT),
            ..ColumnDef::new(ColumnType::Enum)
        })
        .column(ColumnDef {
            name: "newMultiple".into(),
            description: "new multiple field".into(),
            options: Some(String::new()),
            default_value: Some(json!("")),
            icon_name: "newMulti".into(),
            display_type: Some(DisplayType::Vertical),
            configurable: base_configurable()
                .with_editor("defaultValue", Editor::TEXT)
                .with_editor("options", Editor::TEXT)
                .with_editor_settings(
                    "displayType",
                    Editor::ENUM,
                    EditorSettings::options(["vertical", "horizontal"]),
                )
                .with_editor("width", Editor::INT),
            ..ColumnDef::new(ColumnType::Multiple)
        })
        .column(ColumnDef {
            name: "newSheetReference".into(),
            description: "new sheet reference field".into(),
            default_value: Some(json!("")),
            icon_name: "newSheetLink".into(),
            configurable: base_configurable()
                .with_editor_settings(
                    "defaultValue",
                    Editor::SHEET_SELECT,
                    EditorSettings::allow_empty(true),
                )
                .with_editor("width", Editor::INT),
            ..ColumnDef::new(ColumnType::SheetReference)
        })
        .column(ColumnDef {
            name: "newLineReference".into(),
            description: "new line reference field".into(),
            sheet: Some(String::new()),
            default_value: Some(json!("")),
            icon_name: "newLineLink".into(),
            configurable: base_configurable()
                .with_editor("sheet", Editor::SHEET_SELECT)
                .with_editor("defaultValue", Editor::line_select("sheet"))
                .with_editor("width", Editor::INT),
            ..ColumnDef::new(ColumnType::LineReference)
        })
        .column(ColumnDef {
            name: "new list".into(),
            description: "new list field".into(),
            sheet: Some(String::new()),
            default_value: Some(json!([])),
            icon_name: "newList".into(),
            configurable: base_configurable().with_editor("width", Editor::INT),
            ..ColumnDef::new(ColumnType::List)
        })
        .column(ColumnDef {
            name: "new properties".into(),
            description: "new properties field".into(),
            sheet: Some(String::new()),
            default_value: Some(json!({})),
            icon_name: "newProps".into(),
            configurable: base_configurable().with_editor("width", Editor::INT),
            ..ColumnDef::new(ColumnType::Props)
        })
        .column(ColumnDef {
            name: "new grid".into(),
            description: "new grid field".into(),
            default_value: Some(json!([true, true, true, true])),
            schema: Some(Vec::new()),
            icon_name: "newGrid".into(),
            length: Some(4),
            display_width: Some(2),
            column_width: Some(50),
            column_height: Some(50),
            configurable: base_configurable()
                .with_editor_settings(
                    "schema",
                    Editor::GRID,
                    EditorSettings::allowed_types([
                        ColumnType::Int,
                        ColumnType::Bool,
                        ColumnType::Float,
                        ColumnType::Text,
                        ColumnType::LongText,
                        ColumnType::Date,
                        ColumnType::LineReference,
                        ColumnType::SheetReference,
                        ColumnType::Multiple,
                        ColumnType::Enum,
                    ]),
                )
                .with_editor("width", Editor::INT),
            ..ColumnDef::new(ColumnType::Grid)
        })
}

/// Every descriptor lets the user rename and describe the column.
fn base_configurable() -> Configurable {
    Configurable::new()
        .with_editor("name", Editor::TEXT)
        .with_editor("description", Editor::TEXT)
}

fn text_like(
    ty: ColumnType,
    name: &str,
    description: &str,
    icon_name: &str,
    value_editor: Editor,
) -> ColumnDef {
    ColumnDef {
        name: name.into(),
        description: description.into(),
        default_value: Some(json!("")),
        icon_name: icon_name.into(),
        configurable: base_configurable()
            .with_editor("defaultValue", value_editor)
            .with_editor("width", Editor::INT),
        ..ColumnDef::new(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn builtins_cover_every_type_once() {
        let defaults = builtin_defaults_at(0);
        let types: Vec<_> = defaults
            .columns()
            .iter()
            .map(|c| c.column_type().unwrap())
            .collect();
        assert_eq!(types, ColumnType::ALL.to_vec());
    }

    #[test]
    fn date_default_is_pinned() {
        let defaults = builtin_defaults_at(1_600_000_000_000);
        let date = defaults
            .columns()
            .iter()
            .find(|c| c.column_type() == Some(ColumnType::Date))
            .unwrap();
        assert_eq!(date.default_value, Some(json!(1_600_000_000_000_i64)));
        assert!(date.defaults_to_current_date());
    }

    #[test]
    fn builtin_widths_use_default_column_width() {
        for column in builtin_defaults_at(0).columns() {
            assert_eq!(column.width, DEFAULT_COLUMN_WIDTH, "{}", column.type_str);
        }
    }

    #[test]
    fn builtin_sheet_matches_new_sheet_template() {
        let sheet = builtin_sheet();
        assert_eq!(sheet.name, "newSheet");
        assert_eq!(sheet.display_column, "id");
        assert_eq!(
            sheet.configurable.editor_for("displayColumn"),
            Some(&Editor::column_select("name"))
        );
        assert_eq!(
            sheet
                .configurable
                .settings_for("displayColumn")
                .unwrap()
                .allowed_types
                .len(),
            5
        );
    }

    #[test]
    fn load_dir_reads_columns_and_sheet() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("int.yaml"),
            "typeStr: int\nname: quantity\ndefaultValue: 1\n",
        )
        .unwrap();
        std::fs::write(
            tmp.path().join("sheet.yaml"),
            "name: items\ndisplayColumn: label\n",
        )
        .unwrap();
        std::fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let defaults = ColumnDefaults::load_dir(tmp.path()).unwrap();
        assert_eq!(defaults.columns().len(), 1);
        assert_eq!(defaults.columns()[0].name, "quantity");
        assert_eq!(defaults.sheet_def().unwrap().display_column, "label");
    }

    #[test]
    fn load_dir_skips_invalid_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("broken.yaml"), "- just\n- a list\n").unwrap();
        std::fs::write(
            tmp.path().join("text.yaml"),
            "typeStr: text\nname: label\n",
        )
        .unwrap();

        let defaults = ColumnDefaults::load_dir(tmp.path()).unwrap();
        assert_eq!(defaults.columns().len(), 1);
        assert!(defaults.sheet_def().is_none());
    }

    #[test]
    fn load_dir_skips_column_without_type_tag() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("quantity.yaml"),
            "name: quantity\ndefaultValue: 3\nwidth: 80\n",
        )
        .unwrap();
        std::fs::write(tmp.path().join("blank.yaml"), "typeStr: ''\nname: blank\n").unwrap();

        let defaults = ColumnDefaults::load_dir(tmp.path()).unwrap();
        assert!(defaults.columns().is_empty());
        assert!(defaults.sheet_def().is_none());
    }

    #[test]
    fn load_dir_reads_sheet_only_from_sheet_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("sheet.yml"),
            "typeStr: sheet\nname: items\n",
        )
        .unwrap();

        let defaults = ColumnDefaults::load_dir(tmp.path()).unwrap();
        assert!(defaults.columns().is_empty());
        assert_eq!(defaults.sheet_def().unwrap().name, "items");
    }

    #[test]
    fn load_dir_missing_directory_errors() {
        let tmp = TempDir::new().unwrap();
        let result = ColumnDefaults::load_dir(tmp.path().join("nope"));
        assert!(matches!(result, Err(DepotError::OverridesNotFound { .. })));
    }
}
