//! Row Reconciler - Brings the rendered rows into agreement with the value.
//!
//! Rows bind to records by position. A pass has two phases:
//!
//! 1. [`plan`] compares the row count with the record count and yields three
//!    position ranges: rows to update, records to create rows for, and rows to
//!    destroy. At most one of `create`/`destroy` is non-empty.
//! 2. [`RowSet::reconcile`] applies it: destroys first (highest index first),
//!    then creates, then updates.
//!
//! Updated rows keep their elements (and whatever transient UI state lives
//! there, such as focus); only the bound record changes.
//!
//! # Terminal guard
//!
//! If no row is visible after the pass, one row bound to a fresh phantom
//! record is created. It is not written into the value; the next aggregation
//! picks it up.

use std::ops::Range;

use tracing::{debug, trace};

use super::host::Host;
use super::identity::{PhantomAllocator, RecordKeys};
use super::row::{Row, RowTemplate};
use crate::error::HostError;
use crate::types::{ElementId, Record};

// =============================================================================
// Plan
// =============================================================================

/// Positions touched by one reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub update: Range<usize>,
    pub create: Range<usize>,
    pub destroy: Range<usize>,
}

/// Diff `row_count` rendered rows against `record_count` records.
pub fn plan(row_count: usize, record_count: usize) -> ReconcilePlan {
    let shared = row_count.min(record_count);
    ReconcilePlan {
        update: 0..shared,
        create: shared..record_count,
        destroy: shared..row_count,
    }
}

// =============================================================================
// Context and outcome
// =============================================================================

/// Read-only inputs of a pass.
pub struct ReconcileContext<'a> {
    pub template: &'a RowTemplate,
    pub keys: &'a RecordKeys,
    /// Container the rows live in.
    pub parent: ElementId,
    /// Orientation for newly created rows.
    pub vertical: bool,
}

/// What a pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub updated: usize,
    pub created: usize,
    pub destroyed: usize,
    /// The terminal guard added a default row.
    pub guard_row: bool,
}

// =============================================================================
// RowSet
// =============================================================================

/// The ordered rendered rows of one field.
#[derive(Debug, Default)]
pub struct RowSet {
    rows: Vec<Row>,
}

impl RowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    pub fn visible_count(&self) -> usize {
        self.rows.iter().filter(|row| !row.is_hidden()).count()
    }

    /// Index of the row containing `element` (the row container itself or any
    /// element built inside it that the row tracks).
    pub fn position_of(&self, element: ElementId) -> Option<usize> {
        self.rows.iter().position(|row| {
            row.element() == element
                || row.remove_button() == Some(element)
                || row.add_button() == Some(element)
                || row.binding_for(element).is_some()
        })
    }

    /// Deep copies of every row's record, in row order.
    pub fn records(&self) -> Vec<Record> {
        self.rows.iter().map(|row| row.record().clone()).collect()
    }

    /// Reconcile rows against `value`.
    ///
    /// The caller brackets this in a layout batch.
    pub fn reconcile<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        value: &[Record],
        ctx: &ReconcileContext<'_>,
        phantoms: &mut PhantomAllocator,
    ) -> Result<ReconcileOutcome, HostError> {
        let plan = plan(self.rows.len(), value.len());
        trace!(?plan, "reconcile plan");

        let mut outcome = ReconcileOutcome::default();

        // 1. DESTROY - highest index first so lower indices stay valid
        for index in plan.destroy.clone().rev() {
            let row = self.rows.remove(index);
            row.destroy(host);
            outcome.destroyed += 1;
        }

        // 2. CREATE - appended in value order
        for index in plan.create.clone() {
            let record = with_defaults(value[index].clone(), &ctx.template.defaults);
            let hidden = ctx.keys.is_deleted(&record);
            let row = Row::instantiate(host, ctx.template, ctx.parent, record, hidden, ctx.vertical)?;
            self.rows.push(row);
            outcome.created += 1;
        }

        // 3. UPDATE - in place, no recreation
        for index in plan.update.clone() {
            let record = value[index].clone();
            let hidden = ctx.keys.is_deleted(&record);
            self.rows[index].update(host, record, hidden);
            outcome.updated += 1;
        }

        // 4. TERMINAL GUARD - never show zero rows
        if self.visible_count() == 0 {
            let record = with_defaults(
                ctx.keys.phantom_record(phantoms.next_phantom_id()),
                &ctx.template.defaults,
            );
            let row = Row::instantiate(host, ctx.template, ctx.parent, record, false, ctx.vertical)?;
            self.rows.push(row);
            outcome.guard_row = true;
            debug!("no visible rows left, added default row");
        }
        Ok(outcome)
    }

    /// Destroy every row.
    pub fn clear<H: Host + ?Sized>(&mut self, host: &mut H) {
        for row in self.rows.drain(..).rev() {
            row.destroy(host);
        }
    }
}

fn with_defaults(mut record: Record, defaults: &Record) -> Record {
    for (field, value) in defaults {
        record.entry(field.clone()).or_insert_with(|| value.clone());
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{normalize_columns, Descriptor, NormalizeOptions};
    use crate::layout::TaffyHost;
    use serde_json::{json, Value};

    fn records(value: Value) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    struct Fixture {
        host: TaffyHost,
        root: ElementId,
        template: RowTemplate,
        keys: RecordKeys,
        phantoms: PhantomAllocator,
        rows: RowSet,
    }

    impl Fixture {
        fn new() -> Self {
            let mut host = TaffyHost::new(800.0);
            let root = host.create(&Descriptor::new("fieldcontainer"), None).unwrap();
            let columns = vec![
                Descriptor::new("textfield")
                    .named("username")
                    .with_default(json!("")),
            ];
            let template = RowTemplate {
                row: Descriptor::new("container"),
                columns: normalize_columns(
                    &columns,
                    &NormalizeOptions {
                        field_margin: 3.0,
                        remove_button: Descriptor::new("button"),
                        add_button: Descriptor::new("button"),
                    },
                ),
                defaults: crate::descriptor::declared_defaults(&columns),
            };
            Self {
                host,
                root,
                template,
                keys: RecordKeys::default(),
                phantoms: PhantomAllocator::new(),
                rows: RowSet::new(),
            }
        }

        fn reconcile(&mut self, value: &[Record]) -> ReconcileOutcome {
            let ctx = ReconcileContext {
                template: &self.template,
                keys: &self.keys,
                parent: self.root,
                vertical: false,
            };
            self.rows
                .reconcile(&mut self.host, value, &ctx, &mut self.phantoms)
                .unwrap()
        }
    }

    #[test]
    fn test_plan_grow_and_shrink() {
        assert_eq!(
            plan(1, 3),
            ReconcilePlan { update: 0..1, create: 1..3, destroy: 1..1 }
        );
        assert_eq!(
            plan(4, 2),
            ReconcilePlan { update: 0..2, create: 2..2, destroy: 2..4 }
        );
        assert_eq!(
            plan(2, 2),
            ReconcilePlan { update: 0..2, create: 2..2, destroy: 2..2 }
        );
    }

    #[test]
    fn test_empty_value_gets_guard_row() {
        let mut fx = Fixture::new();
        let outcome = fx.reconcile(&[]);

        assert!(outcome.guard_row);
        assert_eq!(fx.rows.len(), 1);
        let record = fx.rows.get(0).unwrap().record();
        assert_eq!(record["phantom"], json!(true));
        assert_eq!(record["id"], json!(0));
        assert_eq!(record["is_del"], json!(false));
    }

    #[test]
    fn test_creates_rows_with_defaults_filled() {
        let mut fx = Fixture::new();
        fx.reconcile(&records(json!([{"id": 1}, {"id": 2, "username": "b"}])));

        assert_eq!(fx.rows.len(), 2);
        assert_eq!(fx.rows.get(0).unwrap().record()["username"], json!(""));
        assert_eq!(fx.rows.get(1).unwrap().record()["username"], json!("b"));
    }

    #[test]
    fn test_update_keeps_row_elements() {
        let mut fx = Fixture::new();
        fx.reconcile(&records(json!([{"id": 1, "username": "a"}])));
        let element = fx.rows.get(0).unwrap().element();

        let outcome = fx.reconcile(&records(json!([{"id": 1, "username": "z"}])));

        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.updated, 1);
        assert_eq!(fx.rows.get(0).unwrap().element(), element);
        assert_eq!(fx.rows.get(0).unwrap().record()["username"], json!("z"));
    }

    #[test]
    fn test_shrink_destroys_trailing_rows() {
        let mut fx = Fixture::new();
        fx.reconcile(&records(json!([{"id": 1}, {"id": 2}, {"id": 3}])));
        let first = fx.rows.get(0).unwrap().element();
        let third = fx.rows.get(2).unwrap().element();

        let outcome = fx.reconcile(&records(json!([{"id": 1}])));

        assert_eq!(outcome.destroyed, 2);
        assert_eq!(fx.rows.len(), 1);
        assert_eq!(fx.rows.get(0).unwrap().element(), first);
        assert!(!fx.host.contains(third));
    }

    #[test]
    fn test_deleted_records_hide_rows() {
        let mut fx = Fixture::new();
        fx.reconcile(&records(json!([{"id": 1}, {"id": 2, "is_del": true}])));

        assert!(!fx.rows.get(0).unwrap().is_hidden());
        assert!(fx.rows.get(1).unwrap().is_hidden());
        assert!(fx.host.is_hidden(fx.rows.get(1).unwrap().element()));

        // Flag cleared again: row shown
        fx.reconcile(&records(json!([{"id": 1}, {"id": 2, "is_del": false}])));
        assert!(!fx.rows.get(1).unwrap().is_hidden());
    }

    #[test]
    fn test_all_deleted_adds_guard_row() {
        let mut fx = Fixture::new();
        let outcome = fx.reconcile(&records(json!([{"id": 5, "is_del": true}])));

        assert!(outcome.guard_row);
        assert_eq!(fx.rows.len(), 2);
        assert_eq!(fx.rows.visible_count(), 1);
    }

    #[test]
    fn test_reconcile_runs_in_caller_batch_only() {
        let mut fx = Fixture::new();
        let before = fx.host.layout_passes();
        {
            let ctx = ReconcileContext {
                template: &fx.template,
                keys: &fx.keys,
                parent: fx.root,
                vertical: false,
            };
            let mut batch = super::super::host::LayoutBatch::new(&mut fx.host);
            fx.rows
                .reconcile(
                    &mut *batch,
                    &records(json!([{"id": 1}, {"id": 2}, {"id": 3}])),
                    &ctx,
                    &mut fx.phantoms,
                )
                .unwrap();
        }
        assert_eq!(fx.host.layout_passes(), before + 1);
    }

    #[test]
    fn test_bound_values_pushed_to_host() {
        let mut fx = Fixture::new();
        fx.reconcile(&records(json!([{"id": 1, "username": "a"}])));

        let row = fx.rows.get(0).unwrap();
        let bound = &row.bindings()[0];
        assert_eq!(bound.field, "username");
        assert_eq!(fx.host.bound_value(bound.element, "value"), Some(&json!("a")));
        assert_eq!(fx.rows.position_of(bound.element), Some(0));
    }
}
