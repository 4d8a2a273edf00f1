//! Row - One rendered unit bound to one record.
//!
//! A row owns its record outright. Two writers touch it:
//! - the reconciler, from above, via [`Row::update`]
//! - field-edit handlers, from below, via [`Row::set_field`]
//!
//! Nothing else holds a reference into it.

use serde_json::Value;

use super::host::Host;
use crate::descriptor::{Descriptor, Role};
use crate::error::HostError;
use crate::types::{ElementId, Record};

/// What a row needs to instantiate itself.
#[derive(Debug, Clone)]
pub struct RowTemplate {
    /// The row container.
    pub row: Descriptor,
    /// Normalized columns, control column last.
    pub columns: Vec<Descriptor>,
    /// Field defaults filled into new rows' records.
    pub defaults: Record,
}

/// An element property bound to a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundElement {
    pub element: ElementId,
    pub property: String,
    pub field: String,
}

/// A rendered row.
#[derive(Debug)]
pub struct Row {
    element: ElementId,
    remove_button: Option<ElementId>,
    add_button: Option<ElementId>,
    bindings: Vec<BoundElement>,
    record: Record,
    hidden: bool,
}

impl Row {
    /// Instantiate the row template under `parent` and bind it to `record`.
    ///
    /// If any element fails to build, whatever was built is destroyed before
    /// the error is returned.
    pub fn instantiate<H: Host + ?Sized>(
        host: &mut H,
        template: &RowTemplate,
        parent: ElementId,
        record: Record,
        hidden: bool,
        vertical: bool,
    ) -> Result<Self, HostError> {
        let element = host.create(&template.row, Some(parent))?;

        let mut row = Self {
            element,
            remove_button: None,
            add_button: None,
            bindings: Vec::new(),
            record,
            hidden: false,
        };

        for column in &template.columns {
            if let Err(err) = row.build(host, column, element) {
                host.destroy(element);
                return Err(err);
            }
        }

        host.set_vertical(element, vertical);
        row.set_hidden(host, hidden);
        row.push_bindings(host);
        Ok(row)
    }

    fn build<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        descriptor: &Descriptor,
        parent: ElementId,
    ) -> Result<(), HostError> {
        let element = host.create(descriptor, Some(parent))?;

        match descriptor.role {
            Some(Role::RemoveButton) => self.remove_button = Some(element),
            Some(Role::AddButton) => self.add_button = Some(element),
            _ => {}
        }

        for (property, binding) in &descriptor.bind {
            self.bindings.push(BoundElement {
                element,
                property: property.clone(),
                field: binding.field().to_string(),
            });
        }

        for child in &descriptor.items {
            self.build(host, child, element)?;
        }
        Ok(())
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The row container element.
    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn remove_button(&self) -> Option<ElementId> {
        self.remove_button
    }

    pub fn add_button(&self) -> Option<ElementId> {
        self.add_button
    }

    /// The row's own copy of its record.
    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn bindings(&self) -> &[BoundElement] {
        &self.bindings
    }

    /// The binding driven by `element`, if any.
    pub fn binding_for(&self, element: ElementId) -> Option<&BoundElement> {
        self.bindings.iter().find(|b| b.element == element)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Replace the record from above and push it into the bound elements.
    pub fn update<H: Host + ?Sized>(&mut self, host: &mut H, record: Record, hidden: bool) {
        self.record = record;
        self.push_bindings(host);
        self.set_hidden(host, hidden);
    }

    /// Write one field from below (a user edit). The host already shows it.
    pub fn set_field(&mut self, field: &str, value: Value) {
        self.record.insert(field.to_string(), value);
    }

    pub fn set_hidden<H: Host + ?Sized>(&mut self, host: &mut H, hidden: bool) {
        if self.hidden != hidden {
            self.hidden = hidden;
            host.set_hidden(self.element, hidden);
        }
    }

    /// Destroy the row's elements.
    pub fn destroy<H: Host + ?Sized>(self, host: &mut H) {
        host.destroy(self.element);
    }

    fn push_bindings<H: Host + ?Sized>(&self, host: &mut H) {
        for bound in &self.bindings {
            let value = self.record.get(&bound.field).unwrap_or(&Value::Null);
            host.set_bound_value(bound.element, &bound.property, value);
        }
    }
}
