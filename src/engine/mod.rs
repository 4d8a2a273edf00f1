//! Row engine - Reconciliation and the policies around it.
//!
//! - [`host`] - The host trait and scoped layout batches
//! - [`row`] - One rendered row owning its record
//! - [`reconcile`] - Rows vs. value, plan then apply
//! - [`identity`] - Phantom ids and hard/soft deletion
//! - [`controls`] - Add/remove button state
//! - [`orientation`] - Horizontal/vertical rows by width

pub mod controls;
pub mod host;
pub mod identity;
pub mod orientation;
pub mod reconcile;
pub mod row;

pub use controls::{apply_controls, control_states, ControlState};
pub use host::{Host, LayoutBatch};
pub use identity::{deletion_for, Deletion, PhantomAllocator, RecordKeys};
pub use orientation::ResponsiveOrientation;
pub use reconcile::{plan, ReconcileContext, ReconcileOutcome, ReconcilePlan, RowSet};
pub use row::{BoundElement, Row, RowTemplate};
