//! The column type registry: lookup, customization and column creation.
//!
//! A registry is built once from `ColumnDefaults` and never mutated. The
//! process-wide instance returned by `ColumnRegistry::global()` holds the
//! built-in descriptors; hosts that customize types build their own through
//! `ColumnRegistry::builder()`.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;
use ulid::Ulid;

use crate::defaults::{builtin_defaults, builtin_sheet, ColumnDefaults};
use crate::error::{DepotError, Result};
use crate::resolve::{resolve_default, resolve_default_at};
use crate::types::{ColumnDef, ColumnType, SheetDef};

/// Builder for `ColumnRegistry`. Created by `ColumnRegistry::builder()`.
pub struct RegistryBuilder {
    defaults: Option<ColumnDefaults>,
    overrides: Vec<ColumnDefaults>,
    column_width: Option<u32>,
}

impl RegistryBuilder {
    /// Base descriptors. Each type may appear at most once.
    pub fn with_defaults(mut self, defaults: ColumnDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Descriptors replacing base descriptors of the same type. Applied in call order.
    pub fn with_overrides(mut self, overrides: ColumnDefaults) -> Self {
        self.overrides.push(overrides);
        self
    }

    /// Width given to every registered column descriptor.
    pub fn with_column_width(mut self, width: u32) -> Self {
        self.column_width = Some(width);
        self
    }

    /// Build the registry, checking each descriptor's tag.
    pub fn build(self) -> Result<ColumnRegistry> {
        let mut sheet = builtin_sheet();
        let mut columns = IndexMap::new();

        if let Some(defaults) = self.defaults {
            let (base_sheet, base_columns) = defaults.into_parts();
            if let Some(base_sheet) = base_sheet {
                sheet = base_sheet;
            }
            for def in base_columns {
                let ty = known_type(&def)?;
                if columns.insert(ty, def).is_some() {
                    return Err(DepotError::DuplicateType {
                        tag: ty.to_string(),
                    });
                }
            }
        }

        for overrides in self.overrides {
            let (override_sheet, override_columns) = overrides.into_parts();
            if let Some(override_sheet) = override_sheet {
                sheet = override_sheet;
            }
            let mut seen = Vec::new();
            for def in override_columns {
                let ty = known_type(&def)?;
                if seen.contains(&ty) {
                    return Err(DepotError::DuplicateType {
                        tag: ty.to_string(),
                    });
                }
                seen.push(ty);
                debug!(type_str = %ty, "overriding column descriptor");
                columns.insert(ty, def);
            }
        }

        if let Some(width) = self.column_width {
            for def in columns.values_mut() {
                def.width = width;
            }
        }

        debug!(columns = columns.len(), "column registry built");

        Ok(ColumnRegistry { sheet, columns })
    }
}

fn known_type(def: &ColumnDef) -> Result<ColumnType> {
    def.column_type().ok_or_else(|| DepotError::UnknownType {
        tag: def.type_str.to_string(),
    })
}

/// Immutable mapping from column type to its descriptor, plus the sheet descriptor.
#[derive(Debug, Clone)]
pub struct ColumnRegistry {
    sheet: SheetDef,
    columns: IndexMap<ColumnType, ColumnDef>,
}

impl ColumnRegistry {
    /// Start building a registry. Without `with_defaults()` it is empty.
    ///
    /// ```rust,ignore
    /// let registry = ColumnRegistry::builder()
    ///     .with_defaults(builtin_defaults())
    ///     .with_overrides(ColumnDefaults::load_dir("depot/columns")?)
    ///     .build()?;
    /// ```
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            defaults: None,
            overrides: Vec::new(),
            column_width: None,
        }
    }

    /// The built-in registry, built on first use.
    ///
    /// The date descriptor's `defaultValue` is the start of the day the
    /// registry was first touched.
    pub fn global() -> &'static Self {
        static INSTANCE: Lazy<ColumnRegistry> = Lazy::new(ColumnRegistry::builtin);
        &INSTANCE
    }

    fn builtin() -> Self {
        let (sheet, columns) = builtin_defaults().into_parts();
        Self {
            sheet: sheet.unwrap_or_else(builtin_sheet),
            columns: columns
                .into_iter()
                .filter_map(|def| def.column_type().map(|ty| (ty, def)))
                .collect(),
        }
    }

    /// Descriptor of a column type.
    pub fn get(&self, ty: ColumnType) -> Option<&ColumnDef> {
        self.columns.get(&ty)
    }

    /// Descriptor by `typeStr` tag. Unknown tags give `None`.
    pub fn get_by_tag(&self, tag: &str) -> Option<&ColumnDef> {
        self.get(tag.parse().ok()?)
    }

    /// Descriptor of a new sheet.
    pub fn sheet(&self) -> &SheetDef {
        &self.sheet
    }

    /// Registered types, in registration order.
    pub fn types(&self) -> impl Iterator<Item = ColumnType> + '_ {
        self.columns.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ColumnType, &ColumnDef)> + '_ {
        self.columns.iter().map(|(ty, def)| (*ty, def))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// A new column of type `ty`: a copy of its descriptor with a fresh guid
    /// and a resolved working default.
    pub fn new_column(&self, ty: ColumnType) -> Result<ColumnDef> {
        self.new_column_with(ty, resolve_default)
    }

    /// Like `new_column`, with "today" pinned to `today_start_ms`.
    pub fn new_column_at(&self, ty: ColumnType, today_start_ms: i64) -> Result<ColumnDef> {
        self.new_column_with(ty, |def| resolve_default_at(def, today_start_ms))
    }

    fn new_column_with(
        &self,
        ty: ColumnType,
        resolve: impl Fn(Option<&ColumnDef>) -> serde_json::Value,
    ) -> Result<ColumnDef> {
        let descriptor = self.get(ty).ok_or_else(|| DepotError::NotRegistered {
            tag: ty.to_string(),
        })?;
        let mut column = descriptor.clone();
        column.guid = Ulid::new().to_string();
        column.default_value = Some(resolve(Some(descriptor)));
        debug!(type_str = %ty, guid = %column.guid, "created column");
        Ok(column)
    }

    /// A new, empty sheet with a fresh guid.
    pub fn new_sheet(&self) -> SheetDef {
        let mut sheet = self.sheet.clone();
        sheet.guid = Ulid::new().to_string();
        debug!(guid = %sheet.guid, "created sheet");
        sheet
    }
}

/// Serializes as one map keyed by tag, with the sheet under `"sheet"`.
impl Serialize for ColumnRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len() + 1))?;
        map.serialize_entry("sheet", &self.sheet)?;
        for (ty, def) in &self.columns {
            map.serialize_entry(ty.as_str(), def)?;
        }
        map.end()
    }
}
