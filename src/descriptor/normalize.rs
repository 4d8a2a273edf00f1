//! Descriptor Normalizer - Rewrites column descriptors for per-row use.
//!
//! Runs once, before any row exists:
//! - Containers get an `hbox` layout and zero margin, then recurse
//! - Fields and segmented controls leave the form's field set, get the field
//!   margin, and bind `value` to `{row.<name>}`
//! - Buttons get the field margin; toggle buttons bind `pressed`
//! - A trailing control column (remove + add buttons) is appended
//!
//! Normalizing an already normalized column list returns it unchanged.

use serde_json::Value;

use super::{Binding, Classification, Descriptor, Layout, Role};
use crate::types::Record;

/// Inputs of [`normalize_columns`].
#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Margin applied to every field and button.
    pub field_margin: f32,
    /// Descriptor of the remove-row button.
    pub remove_button: Descriptor,
    /// Descriptor of the add-row button.
    pub add_button: Descriptor,
}

/// Normalize the configured columns and append the control column.
pub fn normalize_columns(columns: &[Descriptor], options: &NormalizeOptions) -> Vec<Descriptor> {
    let mut out: Vec<Descriptor> = columns.to_vec();

    let has_controls = out
        .last()
        .is_some_and(|last| last.role == Some(Role::ControlColumn));
    let body = if has_controls { out.len() - 1 } else { out.len() };

    for descriptor in &mut out[..body] {
        normalize_descriptor(descriptor, options.field_margin);
    }

    if !has_controls {
        out.push(control_column(
            options.remove_button.clone(),
            options.add_button.clone(),
        ));
    }
    out
}

/// The trailing container with the remove and add buttons.
///
/// The role markers are forced so the field can find the buttons in every
/// instantiated row regardless of how they were configured.
pub fn control_column(remove_button: Descriptor, add_button: Descriptor) -> Descriptor {
    Descriptor::new("container")
        .with_role(Role::ControlColumn)
        .with_layout(Layout::Hbox)
        .with_prop("flex", Value::Null)
        .with_items(vec![
            remove_button.with_role(Role::RemoveButton),
            add_button.with_role(Role::AddButton),
        ])
}

fn normalize_descriptor(descriptor: &mut Descriptor, field_margin: f32) {
    match descriptor.classify() {
        Classification::Container => {
            descriptor.layout = Some(Layout::Hbox);
            descriptor.margin = Some(0.0);
            for child in &mut descriptor.items {
                normalize_descriptor(child, field_margin);
            }
        }
        Classification::Field | Classification::ToggleControl => {
            descriptor.form_field = Some(false);
            descriptor.margin = Some(field_margin);
            if let Some(name) = &descriptor.name {
                descriptor
                    .bind
                    .insert("value".to_string(), Binding::row(name.clone()));
            }
        }
        Classification::Button => {
            if descriptor.enable_toggle {
                if let Some(name) = &descriptor.name {
                    descriptor
                        .bind
                        .insert("pressed".to_string(), Binding::row(name.clone()));
                }
            }
            descriptor.margin = Some(field_margin);
        }
        Classification::Other => {}
    }
}

/// Collect `name -> default` for every named descriptor that declares one.
///
/// Used to fill fields a new row's record omits.
pub fn declared_defaults(columns: &[Descriptor]) -> Record {
    let mut defaults = Record::new();
    collect_defaults(columns, &mut defaults);
    defaults
}

fn collect_defaults(descriptors: &[Descriptor], out: &mut Record) {
    for descriptor in descriptors {
        if let (Some(name), Some(value)) = (&descriptor.name, &descriptor.default) {
            out.entry(name.clone()).or_insert_with(|| value.clone());
        }
        collect_defaults(&descriptor.items, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn options() -> NormalizeOptions {
        NormalizeOptions {
            field_margin: 3.0,
            remove_button: Descriptor::new("button"),
            add_button: Descriptor::new("button"),
        }
    }

    #[test]
    fn test_field_gets_binding_and_margin() {
        let columns = vec![Descriptor::new("textfield").named("username")];
        let out = normalize_columns(&columns, &options());

        let field = &out[0];
        assert_eq!(field.form_field, Some(false));
        assert_eq!(field.margin, Some(3.0));
        assert_eq!(field.bind["value"], Binding::row("username"));
    }

    #[test]
    fn test_unnamed_field_is_not_bound() {
        let out = normalize_columns(&[Descriptor::new("displayfield")], &options());
        assert!(out[0].bind.is_empty());
        assert_eq!(out[0].margin, Some(3.0));
    }

    #[test]
    fn test_container_recurses() {
        let columns = vec![Descriptor::new("container").with_items(vec![
            Descriptor::new("datefield").named("born"),
            Descriptor::new("numberfield").named("age"),
        ])];
        let out = normalize_columns(&columns, &options());

        let container = &out[0];
        assert_eq!(container.layout, Some(Layout::Hbox));
        assert_eq!(container.margin, Some(0.0));
        assert_eq!(container.items[0].bind["value"], Binding::row("born"));
        assert_eq!(container.items[1].bind["value"], Binding::row("age"));
    }

    #[test]
    fn test_segmented_control_is_a_field_not_a_container() {
        let segmented = Descriptor::new("segmentedbutton")
            .named("mode")
            .with_items(vec![Descriptor::new("button").named("inner")]);
        let out = normalize_columns(&[segmented], &options());

        assert_eq!(out[0].bind["value"], Binding::row("mode"));
        assert_eq!(out[0].layout, None);
        // Children of the segmented control are left alone
        assert_eq!(out[0].items[0].margin, None);
    }

    #[test]
    fn test_buttons_bind_pressed_only_when_toggleable() {
        let columns = vec![
            Descriptor::new("button").named("plain"),
            Descriptor::new("button").named("active").toggleable(),
        ];
        let out = normalize_columns(&columns, &options());

        assert!(out[0].bind.is_empty());
        assert_eq!(out[0].margin, Some(3.0));
        assert_eq!(out[1].bind["pressed"], Binding::row("active"));
    }

    #[test]
    fn test_control_column_appended_once() {
        let once = normalize_columns(&[Descriptor::new("textfield").named("a")], &options());
        let twice = normalize_columns(&once, &options());

        assert_eq!(once.len(), 2);
        assert_eq!(once, twice);

        let controls = once.last().unwrap();
        assert_eq!(controls.role, Some(Role::ControlColumn));
        assert_eq!(controls.items[0].role, Some(Role::RemoveButton));
        assert_eq!(controls.items[1].role, Some(Role::AddButton));
        // Control buttons are not normalized as ordinary buttons
        assert_eq!(controls.items[0].margin, None);
    }

    #[test]
    fn test_normalization_does_not_touch_input() {
        let columns = vec![Descriptor::new("textfield").named("a")];
        let _ = normalize_columns(&columns, &options());
        assert!(columns[0].bind.is_empty());
    }

    #[test]
    fn test_declared_defaults_nested() {
        let columns = vec![
            Descriptor::new("textfield").named("a").with_default(json!("x")),
            Descriptor::new("container").with_items(vec![
                Descriptor::new("checkbox").named("b").with_default(json!(false)),
                Descriptor::new("textfield").named("c"),
            ]),
        ];
        let defaults = declared_defaults(&columns);

        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults["a"], json!("x"));
        assert_eq!(defaults["b"], json!(false));
    }
}
