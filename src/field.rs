//! DynamicField - The array-valued form field.
//!
//! Owns the value, the rendered rows and the host. All traffic between them
//! goes through the value bridge:
//!
//! ```text
//! set_value(v) ──(deep-equal? stop)──► store ──► reconcile rows ──► controls
//!      ▲
//!      └── apply_local_changes ◄── row record ◄── on_field_change / on_toggle
//! ```
//!
//! Writing an edit back is a no-op pass for the reconciler: the rows already
//! hold what the aggregated value contains.
//!
//! # Published state
//!
//! The current value, the visible row count and the orientation are mirrored
//! into spark-signals [`Signal`]s so surrounding UI can bind to them.

use std::cell::Cell;

use serde_json::{Map, Value};
use spark_signals::{signal, Signal};
use tracing::debug;

use crate::config::DynamicFieldConfig;
use crate::descriptor::{declared_defaults, normalize_columns, Descriptor, Layout, NormalizeOptions, Role};
use crate::engine::{
    apply_controls, deletion_for, Deletion, Host, LayoutBatch, PhantomAllocator, ReconcileContext,
    RecordKeys, ResponsiveOrientation, Row, RowSet, RowTemplate,
};
use crate::error::FieldResult;
use crate::types::{ElementId, Record};

thread_local! {
    /// Counter for generated field names.
    static NAME_COUNTER: Cell<usize> = const { Cell::new(0) };
}

fn generate_name() -> String {
    NAME_COUNTER.with(|counter| {
        let n = counter.get();
        counter.set(n + 1);
        format!("dynamic-field-{n}")
    })
}

/// A row to remove: by position or by any element inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowTarget {
    Index(usize),
    Element(ElementId),
}

impl From<usize> for RowTarget {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<ElementId> for RowTarget {
    fn from(element: ElementId) -> Self {
        Self::Element(element)
    }
}

/// Repeating-row form field.
pub struct DynamicField<H: Host> {
    host: H,
    name: String,
    data_index: Option<String>,
    max_row_count: usize,
    keys: RecordKeys,
    template: RowTemplate,
    root: ElementId,
    rows: RowSet,
    value: Vec<Record>,
    phantoms: PhantomAllocator,
    orientation: ResponsiveOrientation,
    rendered: bool,

    value_signal: Signal<Vec<Record>>,
    visible_count_signal: Signal<usize>,
    vertical_signal: Signal<bool>,
}

impl<H: Host> DynamicField<H> {
    /// Normalize the columns, build the field container in `host` and render
    /// one row per record of the initial value.
    pub fn new(config: DynamicFieldConfig, mut host: H) -> FieldResult<Self> {
        let DynamicFieldConfig {
            name,
            data_index,
            value,
            columns,
            field_margin,
            responsive_width,
            row_vertical,
            max_row_count,
            id_property,
            is_del_property,
            row,
            remove_button,
            add_button,
        } = config;

        let options = NormalizeOptions {
            field_margin,
            remove_button,
            add_button,
        };
        let template = RowTemplate {
            row: row.with_role(Role::Row),
            defaults: declared_defaults(&columns),
            columns: normalize_columns(&columns, &options),
        };

        let root = host.create(
            &Descriptor::new("fieldcontainer")
                .with_role(Role::Field)
                .with_layout(Layout::Vbox),
            None,
        )?;

        let value = value.unwrap_or_default();
        let mut field = Self {
            host,
            name: name.unwrap_or_else(generate_name),
            data_index,
            max_row_count,
            keys: RecordKeys::new(id_property, is_del_property),
            template,
            root,
            rows: RowSet::new(),
            value_signal: signal(value.clone()),
            value,
            phantoms: PhantomAllocator::new(),
            orientation: ResponsiveOrientation::new(responsive_width, row_vertical),
            rendered: false,
            visible_count_signal: signal(0),
            vertical_signal: signal(row_vertical),
        };

        field.reconcile()?;
        field.rendered = true;
        Ok(field)
    }

    // =========================================================================
    // Value bridge
    // =========================================================================

    /// The current value.
    pub fn value(&self) -> &[Record] {
        &self.value
    }

    /// Assign a new value. Structurally equal values are ignored; otherwise
    /// the value is stored and rows are reconciled before returning.
    ///
    /// Returns whether the value changed.
    pub fn set_value(&mut self, value: Vec<Record>) -> FieldResult<bool> {
        if value == self.value {
            return Ok(false);
        }
        self.value = value;
        self.value_signal.set(self.value.clone());

        if self.rendered {
            self.reconcile()?;
        }
        Ok(true)
    }

    /// Pull every row's record back into the value, in row order.
    pub fn apply_local_changes(&mut self) -> FieldResult<bool> {
        let records = self.rows.records();
        self.set_value(records)
    }

    /// A bound field inside a row reported a new value.
    ///
    /// Returns whether the field's value changed. Elements that are not
    /// bound to a record field are ignored.
    pub fn on_field_change(&mut self, element: ElementId, value: Value) -> FieldResult<bool> {
        let Some(index) = self.rows.position_of(element) else {
            debug!(%element, "change from an element outside the rows, ignored");
            return Ok(false);
        };
        let Some(row) = self.rows.get_mut(index) else {
            return Ok(false);
        };
        let Some(field) = row.binding_for(element).map(|b| b.field.clone()) else {
            debug!(%element, "change from an unbound element, ignored");
            return Ok(false);
        };
        row.set_field(&field, value);

        if self.value.is_empty() {
            // Nothing to aggregate into yet: start the value from this row.
            let mut record = row.record().clone();
            if !self.keys.is_phantom(&record) {
                let defaults = self.keys.phantom_record(self.phantoms.next_phantom_id());
                for (key, default) in defaults {
                    record.entry(key).or_insert(default);
                }
            }
            self.set_value(vec![record])
        } else {
            self.apply_local_changes()
        }
    }

    /// A toggle button inside a row changed its pressed state.
    pub fn on_toggle(&mut self, element: ElementId, pressed: bool) -> FieldResult<bool> {
        self.on_field_change(element, Value::Bool(pressed))
    }

    // =========================================================================
    // Row operations
    // =========================================================================

    /// Append a new phantom row. No-op once the visible row count reached the
    /// maximum.
    pub fn add_row(&mut self) -> FieldResult<bool> {
        if self.visible_row_count() >= self.max_row_count {
            debug!(max = self.max_row_count, "row limit reached, add ignored");
            return Ok(false);
        }
        // A default row not yet in the value keeps its place ahead of the new one
        let mut value = if self.rows.len() > self.value.len() {
            self.rows.records()
        } else {
            self.value.clone()
        };
        value.push(self.keys.phantom_record(self.phantoms.next_phantom_id()));
        self.set_value(value)
    }

    /// Append a copy of `record` to the value.
    pub fn insert_row(&mut self, record: Record) -> FieldResult<bool> {
        let mut value = self.value.clone();
        value.push(record);
        self.set_value(value)
    }

    /// Remove a row: phantom rows are spliced out of the value, persisted rows
    /// are flagged deleted and hidden. Targets that are not rows, and rows
    /// already flagged deleted, are ignored.
    pub fn remove_row(&mut self, target: impl Into<RowTarget>) -> FieldResult<()> {
        let index = match target.into() {
            RowTarget::Index(index) => Some(index).filter(|&i| i < self.rows.len()),
            RowTarget::Element(element) => self.rows.position_of(element),
        };
        let Some(index) = index else {
            debug!("remove target is not a row, ignored");
            return Ok(());
        };
        let Some(row) = self.rows.get_mut(index) else {
            return Ok(());
        };
        if self.keys.is_deleted(row.record()) {
            debug!(index, "row already deleted, ignored");
            return Ok(());
        }

        match deletion_for(&self.keys, row.record(), index) {
            Deletion::Hard { index } => {
                if index < self.value.len() {
                    let mut value = self.value.clone();
                    value.remove(index);
                    self.set_value(value)?;
                }
            }
            Deletion::Soft { index } => {
                row.set_field(&self.keys.is_del, Value::Bool(true));
                self.apply_local_changes()?;

                let still_visible = self.rows.get(index).is_some_and(|row| !row.is_hidden());
                if still_visible {
                    self.hide_row(index)?;
                }
            }
        }
        Ok(())
    }

    /// A button inside a row was pressed.
    ///
    /// Remove and add buttons run their row operation; other elements are
    /// ignored.
    pub fn on_button_press(&mut self, element: ElementId) -> FieldResult<()> {
        let Some(index) = self.rows.position_of(element) else {
            return Ok(());
        };
        let Some(row) = self.rows.get(index) else {
            return Ok(());
        };
        let is_remove = row.remove_button() == Some(element);
        let is_add = row.add_button() == Some(element);

        if is_remove {
            self.remove_row(RowTarget::Index(index))
        } else if is_add {
            self.add_row().map(|_| ())
        } else {
            Ok(())
        }
    }

    // =========================================================================
    // Orientation
    // =========================================================================

    /// The field's width changed from `old_width` (`None` on first layout) to
    /// `new_width`.
    pub fn on_resize(&mut self, new_width: f32, old_width: Option<f32>) {
        let Some(vertical) = self.orientation.observe(new_width, old_width) else {
            return;
        };
        debug!(vertical, new_width, "row orientation flipped");
        self.vertical_signal.set(vertical);
        let mut batch = LayoutBatch::new(&mut self.host);
        for row in self.rows.rows() {
            batch.set_vertical(row.element(), vertical);
        }
        // Runs once, when the batch resumes
        batch.update_layout();
    }

    pub fn is_vertical(&self) -> bool {
        self.orientation.is_vertical()
    }

    // =========================================================================
    // Form field contract
    // =========================================================================

    /// Name under which the value is submitted.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `data_index` when the field is used as an editor, else `name`.
    pub fn field_identifier(&self) -> &str {
        self.data_index.as_deref().unwrap_or(&self.name)
    }

    /// `{name: value}`
    pub fn submit_data(&self) -> Map<String, Value> {
        self.keyed_value(self.name())
    }

    /// `{field_identifier: value}`
    pub fn model_data(&self) -> Map<String, Value> {
        self.keyed_value(self.field_identifier())
    }

    /// Field contents are not validated.
    pub fn is_valid(&self) -> bool {
        true
    }

    /// Dirtiness is not tracked: always `false`.
    pub fn is_dirty(&self) -> bool {
        false
    }

    fn keyed_value(&self, key: &str) -> Map<String, Value> {
        let records = self.value.iter().cloned().map(Value::Object).collect();
        let mut data = Map::new();
        data.insert(key.to_string(), Value::Array(records));
        data
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn rows(&self) -> &[Row] {
        self.rows.rows()
    }

    pub fn visible_row_count(&self) -> usize {
        self.rows.visible_count()
    }

    pub fn max_row_count(&self) -> usize {
        self.max_row_count
    }

    /// The field's outer container element.
    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn value_signal(&self) -> Signal<Vec<Record>> {
        self.value_signal.clone()
    }

    pub fn visible_count_signal(&self) -> Signal<usize> {
        self.visible_count_signal.clone()
    }

    pub fn vertical_signal(&self) -> Signal<bool> {
        self.vertical_signal.clone()
    }

    /// Tear the field's elements down and hand the host back.
    pub fn destroy(mut self) -> H {
        {
            let mut batch = LayoutBatch::new(&mut self.host);
            self.rows.clear(&mut *batch);
            batch.destroy(self.root);
        }
        self.host
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn reconcile(&mut self) -> FieldResult<()> {
        let ctx = ReconcileContext {
            template: &self.template,
            keys: &self.keys,
            parent: self.root,
            vertical: self.orientation.is_vertical(),
        };
        let mut batch = LayoutBatch::new(&mut self.host);
        let outcome = self
            .rows
            .reconcile(&mut *batch, &self.value, &ctx, &mut self.phantoms)?;
        apply_controls(&mut *batch, self.rows.rows(), self.max_row_count);
        drop(batch);

        debug!(
            field = %self.name,
            updated = outcome.updated,
            created = outcome.created,
            destroyed = outcome.destroyed,
            guard_row = outcome.guard_row,
            "reconciled rows"
        );
        self.visible_count_signal.set(self.rows.visible_count());
        Ok(())
    }

    fn hide_row(&mut self, index: usize) -> FieldResult<()> {
        {
            let mut batch = LayoutBatch::new(&mut self.host);
            if let Some(row) = self.rows.get_mut(index) {
                row.set_hidden(&mut *batch, true);
            }
        }
        // Hiding may leave nothing visible; the guard only runs in reconcile.
        self.reconcile()
    }
}
