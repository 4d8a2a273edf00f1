//! Descriptors - Declarative configuration of row contents.
//!
//! A descriptor describes one UI element before it exists: its widget
//! `kind`, its field `name`, child `items`, and presentational props. The
//! column descriptors of a dynamic field are normalized once (see
//! [`normalize`]) and then instantiated for every row.
//!
//! # Classification
//!
//! Every descriptor classifies as one of [`Classification`]. The class comes
//! from a static capability table keyed by `kind`, or from an explicit
//! `class` on the descriptor. Nothing is instantiated to find out.
//!
//! ```ignore
//! let name = Descriptor::new("textfield").named("username");
//! assert_eq!(name.classify(), Classification::Field);
//! ```

mod normalize;

pub use normalize::{control_column, declared_defaults, normalize_columns, NormalizeOptions};

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::Capabilities;

// =============================================================================
// Classification
// =============================================================================

/// How the normalizer treats a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Lays out children.
    Container,
    /// Holds a value bound to a record field.
    Field,
    /// A segmented control: a container that acts as one value field.
    ToggleControl,
    /// A push button, possibly toggleable.
    Button,
    /// Anything else. Left untouched.
    Other,
}

impl Classification {
    /// Derive the class from a capability set.
    pub fn from_capabilities(caps: Capabilities) -> Self {
        if caps.contains(Capabilities::SEGMENTED) {
            Self::ToggleControl
        } else if caps.contains(Capabilities::CONTAINER) {
            Self::Container
        } else if caps.contains(Capabilities::FIELD) {
            Self::Field
        } else if caps.contains(Capabilities::BUTTON) {
            Self::Button
        } else {
            Self::Other
        }
    }
}

// =============================================================================
// Layout, Role, Binding
// =============================================================================

/// Container layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Children side by side (or stacked when the row is vertical).
    Hbox,
    /// Children stacked.
    Vbox,
}

/// Structural role markers the field looks for in instantiated rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The field's own outer container.
    Field,
    /// A row container.
    Row,
    /// The trailing column holding the control buttons.
    ControlColumn,
    /// The remove-row button.
    RemoveButton,
    /// The add-row button.
    AddButton,
}

/// A data binding from an element property to a field of the row's record.
///
/// Serialized in template form: `{row.<field>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Binding {
    field: String,
}

impl Binding {
    /// Bind to `field` of the current row.
    pub fn row(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }

    /// The bound record field.
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{row.{}}}", self.field)
    }
}

impl TryFrom<String> for Binding {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.strip_prefix("{row.")
            .and_then(|rest| rest.strip_suffix('}'))
            .filter(|field| !field.is_empty())
            .map(Binding::row)
            .ok_or_else(|| format!("expected a `{{row.<field>}}` binding, got `{s}`"))
    }
}

impl From<Binding> for String {
    fn from(binding: Binding) -> Self {
        binding.to_string()
    }
}

// =============================================================================
// Descriptor
// =============================================================================

/// Declarative description of one element and its children.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Descriptor {
    /// Widget kind, e.g. `textfield`, `container`, `button`.
    #[serde(alias = "xtype")]
    pub kind: String,

    /// Explicit classification; overrides the capability lookup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<Classification>,

    /// Record field this element edits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Child descriptors.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Descriptor>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,

    /// Outer margin on all sides.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<f32>,

    /// Whether the surrounding form counts this element as a field of its own.
    #[serde(alias = "isFormField", skip_serializing_if = "Option::is_none")]
    pub form_field: Option<bool>,

    /// Buttons only: the button keeps a pressed state.
    #[serde(alias = "enableToggle", skip_serializing_if = "std::ops::Not::not")]
    pub enable_toggle: bool,

    /// Property name to binding, e.g. `value -> {row.username}`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub bind: BTreeMap<String, Binding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Value to fill into a new row's record when it omits `name`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Everything else (flex, width, tooltip, icon, ...), passed to the host.
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

impl Descriptor {
    /// Descriptor of the given widget kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    /// Set the record field name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set child descriptors.
    pub fn with_items(mut self, items: Vec<Descriptor>) -> Self {
        self.items = items;
        self
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Make a button toggleable.
    pub fn toggleable(mut self) -> Self {
        self.enable_toggle = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Set a passthrough prop.
    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    /// Capability set of this descriptor's kind, plus `TOGGLEABLE` for
    /// toggle-enabled buttons.
    pub fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::for_kind(&self.kind).unwrap_or_default();
        if self.enable_toggle && caps.contains(Capabilities::BUTTON) {
            caps |= Capabilities::TOGGLEABLE;
        }
        caps
    }

    /// Classify this descriptor. Pure; never instantiates anything.
    pub fn classify(&self) -> Classification {
        self.class
            .unwrap_or_else(|| Classification::from_capabilities(self.capabilities()))
    }

    /// Numeric prop, if present.
    pub fn number_prop(&self, key: &str) -> Option<f32> {
        self.props.get(key).and_then(Value::as_f64).map(|n| n as f32)
    }
}
