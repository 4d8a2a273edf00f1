//! # spark-dynamic-field
//!
//! Repeating-row form field for spark-tui.
//!
//! Given an ordered list of records, the field renders one editable row per
//! record, keeps records and rows in sync while the user adds, removes and
//! edits rows, and exposes the whole list as a single array value.
//!
//! ## Architecture
//!
//! ```text
//! set_value ──► RowSet::reconcile ──► Host (create / update / hide / destroy)
//!    ▲                                      │
//!    └──── apply_local_changes ◄── row edits ┘
//! ```
//!
//! Rows bind to records by position. Phantom (never persisted) records are
//! removed outright; persisted records are flagged deleted and their rows
//! hidden, so the flag still reaches the backend.
//!
//! ## Modules
//!
//! - [`types`] - Records, element handles, button visibility, capabilities
//! - [`descriptor`] - Declarative row contents and their normalization
//! - [`engine`] - Host boundary, rows, reconciliation, policies
//! - [`field`] - [`DynamicField`], the value bridge and form-field contract
//! - [`layout`] - [`TaffyHost`], a headless host with flexbox layout
//! - [`config`] - [`DynamicFieldConfig`]
//!
//! ## Example
//!
//! ```ignore
//! use spark_dynamic_field::{Descriptor, DynamicField, DynamicFieldConfig, TaffyHost};
//!
//! let config = DynamicFieldConfig {
//!     name: Some("users".into()),
//!     columns: vec![Descriptor::new("textfield").named("username")],
//!     ..Default::default()
//! };
//! let mut field = DynamicField::new(config, TaffyHost::new(800.0))?;
//!
//! // One default row is always rendered
//! assert_eq!(field.rows().len(), 1);
//!
//! field.add_row()?;
//! assert_eq!(field.value().len(), 2);
//! ```

pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod field;
pub mod layout;
pub mod types;

pub use types::*;

pub use config::DynamicFieldConfig;
pub use descriptor::{Binding, Classification, Descriptor, Layout, Role};
pub use engine::{Host, LayoutBatch, Row};
pub use error::{FieldError, FieldResult, HostError};
pub use field::{DynamicField, RowTarget};
pub use layout::TaffyHost;
