//! Core types for spark-dynamic-field.
//!
//! These are the values that flow between the value bridge, the row
//! reconciler and the host. Everything else builds on them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// Records
// =============================================================================

/// One row's data: field name to JSON value.
///
/// `serde_json::Map` compares structurally, which is exactly the deep
/// equality the value bridge needs to suppress redundant reconcile passes.
pub type Record = Map<String, Value>;

/// Core-internal flag set on records created client-side and never persisted.
pub const PHANTOM_KEY: &str = "phantom";

// =============================================================================
// Element handles
// =============================================================================

/// Handle to an element instantiated by a [`Host`](crate::engine::Host).
///
/// Hosts hand these out from `create` and the field only ever passes them
/// back. The inner index is host-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}", self.0)
    }
}

// =============================================================================
// Button visibility
// =============================================================================

/// Presentation state of a control button.
///
/// `SuppressedKeepSpace` keeps the button in the layout (so columns of
/// consecutive rows stay aligned) but renders it invisible and inert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonVisibility {
    #[default]
    Shown,
    SuppressedKeepSpace,
    HiddenCollapsed,
}

impl ButtonVisibility {
    /// Whether the button occupies space in its row.
    #[inline]
    pub const fn takes_space(self) -> bool {
        !matches!(self, Self::HiddenCollapsed)
    }

    /// Whether the button can be seen (and pressed).
    #[inline]
    pub const fn is_visible(self) -> bool {
        matches!(self, Self::Shown)
    }
}

// =============================================================================
// Capabilities (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// What a widget kind can do.
    ///
    /// Looked up from the descriptor's `kind` so classification never needs a
    /// live instance.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Capabilities: u8 {
        const NONE = 0;
        /// Holds child elements.
        const CONTAINER = 1 << 0;
        /// Holds a value and fires change notifications.
        const FIELD = 1 << 1;
        /// A container of toggle buttons that acts as one value field.
        const SEGMENTED = 1 << 2;
        /// Fires press notifications.
        const BUTTON = 1 << 3;
        /// A button with a pressed/released state.
        const TOGGLEABLE = 1 << 4;
    }
}

impl Capabilities {
    /// Capability set of a known widget kind, `None` when the kind is unknown.
    pub fn for_kind(kind: &str) -> Option<Self> {
        let caps = match kind {
            "container" | "fieldcontainer" | "fieldset" | "panel" => Self::CONTAINER,
            "segmentedbutton" => Self::CONTAINER | Self::SEGMENTED,
            "field" | "textfield" | "textareafield" | "textarea" | "numberfield"
            | "datefield" | "timefield" | "combobox" | "combo" | "tagfield"
            | "checkbox" | "checkboxfield" | "radio" | "radiofield" | "displayfield"
            | "hiddenfield" | "hidden" => Self::FIELD,
            "button" | "splitbutton" => Self::BUTTON,
            "component" | "label" | "image" | "tbspacer" => Self::NONE,
            _ => return None,
        };
        Some(caps)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// True only when `record[key]` is the JSON boolean `true`.
#[inline]
pub fn flag_is_set(record: &Record, key: &str) -> bool {
    matches!(record.get(key), Some(Value::Bool(true)))
}
