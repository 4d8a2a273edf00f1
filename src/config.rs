//! Construction-time configuration of a dynamic field.
//!
//! Every option has a default, so configs are built with struct-update
//! syntax or loaded from JSON:
//!
//! ```ignore
//! let config = DynamicFieldConfig {
//!     columns: vec![Descriptor::new("textfield").named("username")],
//!     max_row_count: 5,
//!     ..Default::default()
//! };
//!
//! let config = DynamicFieldConfig::from_json(r#"{
//!     "name": "users",
//!     "idProperty": "user_id",
//!     "columns": [{"xtype": "textfield", "name": "username", "flex": 1}]
//! }"#)?;
//! ```

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::descriptor::{Descriptor, Layout, Role};
use crate::error::FieldResult;
use crate::types::Record;

/// Options of a [`DynamicField`](crate::DynamicField).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicFieldConfig {
    /// Name under which the value is submitted. Generated when absent.
    pub name: Option<String>,

    /// Identifier used by [`model_data`](crate::DynamicField::model_data)
    /// when the field is a table-cell editor.
    #[serde(alias = "dataIndex")]
    pub data_index: Option<String>,

    /// Initial value.
    pub value: Option<Vec<Record>>,

    /// Per-row column descriptors.
    pub columns: Vec<Descriptor>,

    /// Margin around every field and button of a row.
    #[serde(alias = "fieldMargin")]
    pub field_margin: f32,

    /// Below this width rows switch to vertical.
    #[serde(alias = "responsiveWidth")]
    pub responsive_width: f32,

    /// Initial orientation of rows.
    #[serde(alias = "rowHboxVertical")]
    pub row_vertical: bool,

    /// Adding stops once this many rows are visible.
    #[serde(alias = "maxRowCount")]
    pub max_row_count: usize,

    /// Record field holding the identifier.
    #[serde(alias = "idProperty")]
    pub id_property: String,

    /// Record field holding the soft-delete flag.
    #[serde(alias = "isDelProperty")]
    pub is_del_property: String,

    /// Row container descriptor.
    #[serde(alias = "rowConfig")]
    pub row: Descriptor,

    #[serde(alias = "delBtnConfig")]
    pub remove_button: Descriptor,

    #[serde(alias = "addBtnConfig")]
    pub add_button: Descriptor,
}

impl Default for DynamicFieldConfig {
    fn default() -> Self {
        Self {
            name: None,
            data_index: None,
            value: None,
            columns: Vec::new(),
            field_margin: 3.0,
            responsive_width: 400.0,
            row_vertical: false,
            max_row_count: 10,
            id_property: "id".to_string(),
            is_del_property: "is_del".to_string(),
            row: default_row(),
            remove_button: Descriptor::new("button")
                .with_role(Role::RemoveButton)
                .with_prop("tooltip", json!("Remove current row"))
                .with_prop("iconCls", json!("fa fa-minus")),
            add_button: Descriptor::new("button")
                .with_role(Role::AddButton)
                .with_prop("tooltip", json!("Add new row"))
                .with_prop("iconCls", json!("fa fa-plus")),
        }
    }
}

fn default_row() -> Descriptor {
    Descriptor::new("container")
        .with_role(Role::Row)
        .with_layout(Layout::Hbox)
        .with_prop("align", json!("stretch"))
        .with_prop("pack", json!("start"))
}

impl DynamicFieldConfig {
    /// Parse a JSON configuration. Missing options take their defaults.
    pub fn from_json(json: &str) -> FieldResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DynamicFieldConfig::default();
        assert_eq!(config.field_margin, 3.0);
        assert_eq!(config.responsive_width, 400.0);
        assert_eq!(config.max_row_count, 10);
        assert_eq!(config.id_property, "id");
        assert_eq!(config.is_del_property, "is_del");
        assert!(config.columns.is_empty());
        assert!(config.value.is_none());
    }

    #[test]
    fn test_from_json_with_legacy_names() {
        let config = DynamicFieldConfig::from_json(
            r#"{
                "name": "users",
                "idProperty": "user_id",
                "isDelProperty": "user_is_del",
                "maxRowCount": 4,
                "columns": [{"xtype": "textfield", "name": "username", "flex": 1}],
                "value": [{"user_id": 34, "username": "Pete"}]
            }"#,
        )
        .unwrap();

        assert_eq!(config.name.as_deref(), Some("users"));
        assert_eq!(config.id_property, "user_id");
        assert_eq!(config.is_del_property, "user_is_del");
        assert_eq!(config.max_row_count, 4);
        assert_eq!(config.columns[0].kind, "textfield");
        assert_eq!(config.value.unwrap().len(), 1);
        // Untouched options keep their defaults
        assert_eq!(config.field_margin, 3.0);
        assert_eq!(config.row.role, Some(Role::Row));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(DynamicFieldConfig::from_json("{ not json").is_err());
    }
}
