//! Consistency checks for configurable maps.
//!
//! Nothing stops a descriptor from exposing an attribute it does not have;
//! these checks report such mismatches so that edits to the descriptor table
//! can be caught in tests or at startup.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::editor::{split_settings_key, Configurable};
use crate::registry::ColumnRegistry;
use crate::types::{ColumnDef, SheetDef};

/// What is wrong with one configurable entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// The key names an attribute the descriptor does not carry
    UnknownAttribute,
    /// A `columnSelect@x` or `lineSelect@x` editor whose `x` is not an attribute
    UnknownTarget { target: String },
    /// Settings stored under a key that matches no editor
    OrphanSettings,
    /// `allowedTypes` names a type the registry does not hold
    UnregisteredType { tag: String },
}

/// A configurable entry that does not match its descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyIssue {
    /// `typeStr` of the descriptor, or `"sheet"`
    pub owner: String,
    pub key: String,
    pub kind: IssueKind,
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::UnknownAttribute => {
                write!(f, "{}: '{}' is not an attribute", self.owner, self.key)
            }
            IssueKind::UnknownTarget { target } => write!(
                f,
                "{}: editor of '{}' targets missing attribute '{}'",
                self.owner, self.key, target
            ),
            IssueKind::OrphanSettings => {
                write!(f, "{}: settings '{}' match no editor", self.owner, self.key)
            }
            IssueKind::UnregisteredType { tag } => write!(
                f,
                "{}: settings '{}' allow unregistered type '{}'",
                self.owner, self.key, tag
            ),
        }
    }
}

/// Check one column descriptor's configurable map against its attributes.
pub fn check_column(def: &ColumnDef) -> Vec<ConsistencyIssue> {
    check_configurable(def.type_str.as_str(), def, &def.configurable)
}

/// Check the sheet descriptor's configurable map against its attributes.
pub fn check_sheet(def: &SheetDef) -> Vec<ConsistencyIssue> {
    check_configurable("sheet", def, &def.configurable)
}

/// Check every descriptor of a registry, including that allowed types are registered.
pub fn check_registry(registry: &ColumnRegistry) -> Vec<ConsistencyIssue> {
    let mut issues = check_sheet(registry.sheet());
    issues.extend(allowed_type_issues("sheet", &registry.sheet().configurable, registry));
    for (ty, def) in registry.iter() {
        issues.extend(check_column(def));
        issues.extend(allowed_type_issues(ty.as_str(), &def.configurable, registry));
    }
    issues
}

fn check_configurable(
    owner: &str,
    descriptor: &impl Serialize,
    configurable: &Configurable,
) -> Vec<ConsistencyIssue> {
    let attributes = attribute_names(descriptor);
    let issue = |key: &str, kind| ConsistencyIssue {
        owner: owner.to_string(),
        key: key.to_string(),
        kind,
    };
    let mut issues = Vec::new();

    for (attr, editor) in configurable.editors() {
        if !attributes.contains(attr) {
            issues.push(issue(attr, IssueKind::UnknownAttribute));
        }
        if let Some(target) = &editor.target {
            if !attributes.contains(target.as_str()) {
                issues.push(issue(
                    attr,
                    IssueKind::UnknownTarget {
                        target: target.clone(),
                    },
                ));
            }
        }
    }

    for (key, _) in configurable.settings() {
        let matched = split_settings_key(key).is_some_and(|(editor_tag, attr)| {
            configurable
                .editor_for(attr)
                .is_some_and(|editor| editor.to_string() == editor_tag)
        });
        if !matched {
            issues.push(issue(key, IssueKind::OrphanSettings));
        }
    }

    issues
}

fn allowed_type_issues(
    owner: &str,
    configurable: &Configurable,
    registry: &ColumnRegistry,
) -> Vec<ConsistencyIssue> {
    configurable
        .settings()
        .flat_map(|(key, settings)| {
            settings
                .allowed_types
                .iter()
                .filter(|ty| registry.get(**ty).is_none())
                .map(move |ty| ConsistencyIssue {
                    owner: owner.to_string(),
                    key: key.to_string(),
                    kind: IssueKind::UnregisteredType {
                        tag: ty.to_string(),
                    },
                })
        })
        .collect()
}

/// Top-level attribute names as they appear when serialized.
fn attribute_names(descriptor: &impl Serialize) -> BTreeSet<String> {
    match serde_json::to_value(descriptor) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .map(|(key, _)| key)
            .filter(|key| key != "configurable")
            .collect(),
        _ => BTreeSet::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{builtin_defaults_at, builtin_sheet, ColumnDefaults};
    use crate::editor::{Editor, EditorSettings};
    use crate::types::ColumnType;

    #[test]
    fn builtin_descriptors_are_consistent() {
        let registry = ColumnRegistry::builder()
            .with_defaults(builtin_defaults_at(0))
            .build()
            .unwrap();
        let issues = check_registry(&registry);
        assert!(issues.is_empty(), "{issues:?}");
    }

    #[test]
    fn builtin_sheet_is_consistent() {
        assert!(check_sheet(&builtin_sheet()).is_empty());
    }

    #[test]
    fn missing_attribute_is_reported() {
        let def = ColumnDef {
            configurable: Configurable::new().with_editor("min", Editor::INT),
            ..ColumnDef::new(ColumnType::Int)
        };
        let issues = check_column(&def);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::UnknownAttribute);
        assert_eq!(issues[0].to_string(), "int: 'min' is not an attribute");
    }

    #[test]
    fn missing_target_is_reported() {
        let def = ColumnDef {
            configurable: Configurable::new()
                .with_editor("defaultValue", Editor::line_select("sheet")),
            ..ColumnDef::new(ColumnType::LineReference)
        };
        let issues = check_column(&def);
        assert_eq!(
            issues,
            vec![ConsistencyIssue {
                owner: "lineReference".into(),
                key: "defaultValue".into(),
                kind: IssueKind::UnknownTarget {
                    target: "sheet".into()
                },
            }]
        );
    }

    #[test]
    fn settings_for_another_editor_are_orphaned() {
        let configurable: Configurable = serde_json::from_value(serde_json::json!({
            "displayType": "text",
            "enum@displayType": { "options": ["vertical"] }
        }))
        .unwrap();
        let def = ColumnDef {
            display_type: Some(crate::types::DisplayType::Vertical),
            configurable,
            ..ColumnDef::new(ColumnType::Multiple)
        };
        let issues = check_column(&def);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].key, "enum@displayType");
        assert_eq!(issues[0].kind, IssueKind::OrphanSettings);
    }

    #[test]
    fn unregistered_allowed_type_is_reported() {
        let grid = ColumnDef {
            schema: Some(Vec::new()),
            configurable: Configurable::new().with_editor_settings(
                "schema",
                Editor::GRID,
                EditorSettings::allowed_types([ColumnType::Int, ColumnType::Date]),
            ),
            ..ColumnDef::new(ColumnType::Grid)
        };
        let registry = ColumnRegistry::builder()
            .with_defaults(
                ColumnDefaults::new()
                    .column(ColumnDef::new(ColumnType::Int))
                    .column(grid),
            )
            .build()
            .unwrap();

        let issues: Vec<_> = check_registry(&registry)
            .into_iter()
            .filter(|i| i.owner == "grid")
            .collect();
        assert_eq!(
            issues,
            vec![ConsistencyIssue {
                owner: "grid".into(),
                key: "grid@schema".into(),
                kind: IssueKind::UnregisteredType { tag: "date".into() },
            }]
        );
    }
}
