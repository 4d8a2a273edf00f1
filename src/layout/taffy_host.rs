//! TaffyHost - Headless [`Host`] backed by the Taffy layout engine.
//!
//! Keeps an element tree mirrored into a `TaffyTree`, tracks per-element UI
//! state (hidden, disabled, button visibility, orientation, bound values) and
//! recomputes flexbox layout whenever it is not suspended.
//!
//! Element handles are slots with a free list, so destroyed slots are reused.
//!
//! # Style mapping
//!
//! - `hbox` containers are `row` flex containers, `column` when vertical
//! - everything else stacks as `column`
//! - hidden elements and collapsed buttons are `display: none`
//! - suppressed buttons keep their box
//! - `margin`, `flex`, `width` and `height` come from the descriptor

use std::collections::BTreeMap;

use serde_json::Value;
use taffy::{
    AvailableSpace, Dimension as TaffyDimension, Display, FlexDirection, LengthPercentageAuto,
    NodeId, Rect, Size, Style, TaffyTree,
};
use tracing::trace;

use crate::descriptor::{Descriptor, Layout, Role};
use crate::engine::Host;
use crate::error::HostError;
use crate::types::{ButtonVisibility, Capabilities, ElementId};

/// Default box of a field without an explicit width.
const FIELD_WIDTH: f32 = 120.0;
/// Default box of a button without an explicit width.
const BUTTON_WIDTH: f32 = 24.0;
/// Default height of leaf elements.
const LEAF_HEIGHT: f32 = 24.0;

// =============================================================================
// Element
// =============================================================================

#[derive(Debug)]
struct Element {
    node: NodeId,
    kind: String,
    role: Option<Role>,
    capabilities: Capabilities,
    layout: Option<Layout>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    margin: f32,
    flex: Option<f32>,
    width: Option<f32>,
    height: Option<f32>,
    hidden: bool,
    disabled: bool,
    button: ButtonVisibility,
    vertical: bool,
    bound: BTreeMap<String, Value>,
}

impl Element {
    fn is_container(&self) -> bool {
        self.capabilities.contains(Capabilities::CONTAINER)
    }

    fn style(&self) -> Style {
        let display = if self.hidden || !self.button.takes_space() {
            Display::None
        } else {
            Display::Flex
        };

        let flex_direction = match self.layout {
            Some(Layout::Hbox) if !self.vertical => FlexDirection::Row,
            _ => FlexDirection::Column,
        };

        let size = if self.is_container() {
            // Roots fill the host's available width
            let auto_width = if self.parent.is_none() {
                TaffyDimension::Percent(1.0)
            } else {
                TaffyDimension::Auto
            };
            Size {
                width: self.width.map_or(auto_width, TaffyDimension::Length),
                height: self.height.map_or(TaffyDimension::Auto, TaffyDimension::Length),
            }
        } else {
            let default_width = if self.capabilities.contains(Capabilities::BUTTON) {
                BUTTON_WIDTH
            } else {
                FIELD_WIDTH
            };
            Size {
                width: TaffyDimension::Length(self.width.unwrap_or(default_width)),
                height: TaffyDimension::Length(self.height.unwrap_or(LEAF_HEIGHT)),
            }
        };

        Style {
            display,
            flex_direction,
            flex_grow: self.flex.unwrap_or(0.0),
            size,
            margin: Rect {
                top: LengthPercentageAuto::Length(self.margin),
                right: LengthPercentageAuto::Length(self.margin),
                bottom: LengthPercentageAuto::Length(self.margin),
                left: LengthPercentageAuto::Length(self.margin),
            },
            ..Default::default()
        }
    }
}

// =============================================================================
// TaffyHost
// =============================================================================

/// In-memory host with real flexbox layout.
pub struct TaffyHost {
    tree: TaffyTree<()>,
    elements: Vec<Option<Element>>,
    free: Vec<usize>,
    available_width: f32,
    suspended: usize,
    dirty: bool,
    layout_passes: usize,
}

impl TaffyHost {
    /// Host whose root elements are laid out in `available_width`.
    pub fn new(available_width: f32) -> Self {
        Self {
            tree: TaffyTree::new(),
            elements: Vec::new(),
            free: Vec::new(),
            available_width,
            suspended: 0,
            dirty: false,
            layout_passes: 0,
        }
    }

    /// Change the width available to root elements and lay out again.
    ///
    /// Returns `(new_width, old_width)` of `element` for forwarding to
    /// [`DynamicField::on_resize`](crate::DynamicField::on_resize).
    pub fn resize(&mut self, available_width: f32, element: ElementId) -> (Option<f32>, Option<f32>) {
        let old = self.width_of(element);
        self.available_width = available_width;
        self.update_layout();
        (self.width_of(element), old)
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn contains(&self, element: ElementId) -> bool {
        self.get(element).is_some()
    }

    /// Number of live elements.
    pub fn element_count(&self) -> usize {
        self.elements.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn kind(&self, element: ElementId) -> Option<&str> {
        self.get(element).map(|e| e.kind.as_str())
    }

    pub fn role(&self, element: ElementId) -> Option<Role> {
        self.get(element).and_then(|e| e.role)
    }

    pub fn children(&self, element: ElementId) -> &[ElementId] {
        self.get(element)
            .map(|e| e.children.as_slice())
            .unwrap_or_default()
    }

    pub fn is_hidden(&self, element: ElementId) -> bool {
        self.get(element).is_some_and(|e| e.hidden)
    }

    pub fn is_disabled(&self, element: ElementId) -> bool {
        self.get(element).is_some_and(|e| e.disabled)
    }

    pub fn button_visibility(&self, element: ElementId) -> Option<ButtonVisibility> {
        self.get(element).map(|e| e.button)
    }

    pub fn is_vertical(&self, element: ElementId) -> bool {
        self.get(element).is_some_and(|e| e.vertical)
    }

    pub fn bound_value(&self, element: ElementId, property: &str) -> Option<&Value> {
        self.get(element).and_then(|e| e.bound.get(property))
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended > 0
    }

    /// How many times layout was computed.
    pub fn layout_passes(&self) -> usize {
        self.layout_passes
    }

    /// Computed width of `element` from the last layout pass.
    pub fn width_of(&self, element: ElementId) -> Option<f32> {
        let e = self.get(element)?;
        self.tree.layout(e.node).ok().map(|layout| layout.size.width)
    }

    /// Computed `(x, y)` of `element` relative to its parent.
    pub fn position_of(&self, element: ElementId) -> Option<(f32, f32)> {
        let e = self.get(element)?;
        self.tree
            .layout(e.node)
            .ok()
            .map(|layout| (layout.location.x, layout.location.y))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn get(&self, element: ElementId) -> Option<&Element> {
        self.elements.get(element.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, element: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(element.0).and_then(Option::as_mut)
    }

    fn allocate(&mut self, element: Element) -> ElementId {
        if let Some(slot) = self.free.pop() {
            self.elements[slot] = Some(element);
            ElementId(slot)
        } else {
            self.elements.push(Some(element));
            ElementId(self.elements.len() - 1)
        }
    }

    /// Mutate an element, then refresh its taffy style.
    fn restyle(&mut self, element: ElementId, change: impl FnOnce(&mut Element)) {
        let Some(e) = self.get_mut(element) else { return };
        change(e);
        let (node, style) = (e.node, e.style());
        let _ = self.tree.set_style(node, style);
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.dirty = true;
        if self.suspended == 0 {
            self.run_layout();
        }
    }

    fn run_layout(&mut self) {
        let available = Size {
            width: AvailableSpace::Definite(self.available_width),
            height: AvailableSpace::MaxContent,
        };
        let roots: Vec<NodeId> = self
            .elements
            .iter()
            .flatten()
            .filter(|e| e.parent.is_none())
            .map(|e| e.node)
            .collect();

        for root in roots {
            let _ = self.tree.compute_layout(root, available);
        }
        self.dirty = false;
        self.layout_passes += 1;
        trace!(passes = self.layout_passes, "layout computed");
    }

    fn release(&mut self, element: ElementId) {
        let Some(e) = self.elements.get_mut(element.0).and_then(Option::take) else {
            return;
        };
        for child in e.children {
            self.release(child);
        }
        let _ = self.tree.remove(e.node);
        self.free.push(element.0);
    }
}

impl Host for TaffyHost {
    fn create(
        &mut self,
        descriptor: &Descriptor,
        parent: Option<ElementId>,
    ) -> Result<ElementId, HostError> {
        let capabilities = Capabilities::for_kind(&descriptor.kind)
            .ok_or_else(|| HostError::UnknownKind(descriptor.kind.clone()))?;

        let parent_node = match parent {
            Some(p) => Some(self.get(p).ok_or(HostError::UnknownElement(p))?.node),
            None => None,
        };

        let mut element = Element {
            node: NodeId::from(0u64),
            kind: descriptor.kind.clone(),
            role: descriptor.role,
            capabilities,
            layout: descriptor.layout,
            parent,
            children: Vec::new(),
            margin: descriptor.margin.unwrap_or(0.0),
            flex: descriptor.number_prop("flex"),
            width: descriptor.number_prop("width"),
            height: descriptor.number_prop("height"),
            hidden: descriptor.props.get("hidden").and_then(Value::as_bool).unwrap_or(false),
            disabled: descriptor.props.get("disabled").and_then(Value::as_bool).unwrap_or(false),
            button: ButtonVisibility::Shown,
            vertical: false,
            bound: BTreeMap::new(),
        };

        element.node = self.tree.new_leaf(element.style())?;
        if let Some(parent_node) = parent_node {
            self.tree.add_child(parent_node, element.node)?;
        }

        let id = self.allocate(element);
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.push(id);
        }
        self.invalidate();
        Ok(id)
    }

    fn destroy(&mut self, element: ElementId) {
        let Some(parent) = self.get(element).map(|e| e.parent) else {
            return;
        };
        if let Some(p) = parent.and_then(|p| self.get_mut(p)) {
            p.children.retain(|&child| child != element);
        }
        self.release(element);
        self.invalidate();
    }

    fn set_hidden(&mut self, element: ElementId, hidden: bool) {
        self.restyle(element, |e| e.hidden = hidden);
    }

    fn set_disabled(&mut self, element: ElementId, disabled: bool) {
        if let Some(e) = self.get_mut(element) {
            e.disabled = disabled;
        }
    }

    fn set_button_visibility(&mut self, element: ElementId, visibility: ButtonVisibility) {
        self.restyle(element, |e| e.button = visibility);
    }

    fn set_vertical(&mut self, element: ElementId, vertical: bool) {
        self.restyle(element, |e| e.vertical = vertical);
    }

    fn set_bound_value(&mut self, element: ElementId, property: &str, value: &Value) {
        if let Some(e) = self.get_mut(element) {
            e.bound.insert(property.to_string(), value.clone());
        }
    }

    fn suspend_layouts(&mut self) {
        self.suspended += 1;
    }

    fn resume_layouts(&mut self) {
        self.suspended = self.suspended.saturating_sub(1);
        if self.suspended == 0 && self.dirty {
            self.run_layout();
        }
    }

    fn update_layout(&mut self) {
        if self.suspended == 0 {
            self.run_layout();
        } else {
            self.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn hbox() -> Descriptor {
        Descriptor::new("container").with_layout(Layout::Hbox)
    }

    #[test]
    fn test_create_and_destroy_tree() {
        let mut host = TaffyHost::new(800.0);
        let root = host.create(&hbox(), None).unwrap();
        let a = host.create(&Descriptor::new("textfield"), Some(root)).unwrap();
        let b = host.create(&Descriptor::new("button"), Some(root)).unwrap();

        assert_eq!(host.children(root), &[a, b]);
        assert_eq!(host.element_count(), 3);

        host.destroy(root);
        assert_eq!(host.element_count(), 0);
        assert!(!host.contains(a));
    }

    #[test]
    fn test_slots_are_reused() {
        let mut host = TaffyHost::new(800.0);
        let root = host.create(&hbox(), None).unwrap();
        let a = host.create(&Descriptor::new("textfield"), Some(root)).unwrap();
        host.destroy(a);
        let b = host.create(&Descriptor::new("textfield"), Some(root)).unwrap();
        assert_eq!(a, b);
        assert_eq!(host.children(root), &[b]);
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let mut host = TaffyHost::new(800.0);
        let err = host.create(&Descriptor::new("nope"), None).unwrap_err();
        assert!(matches!(err, HostError::UnknownKind(kind) if kind == "nope"));
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut host = TaffyHost::new(800.0);
        let err = host
            .create(&Descriptor::new("textfield"), Some(ElementId(42)))
            .unwrap_err();
        assert!(matches!(err, HostError::UnknownElement(ElementId(42))));
    }

    #[test]
    fn test_hbox_lays_out_side_by_side_and_vertical_stacks() {
        let mut host = TaffyHost::new(800.0);
        let root = host.create(&hbox(), None).unwrap();
        let a = host
            .create(&Descriptor::new("textfield").with_prop("width", json!(100)), Some(root))
            .unwrap();
        let b = host
            .create(&Descriptor::new("textfield").with_prop("width", json!(100)), Some(root))
            .unwrap();

        assert_eq!(host.position_of(a), Some((0.0, 0.0)));
        assert_eq!(host.position_of(b), Some((100.0, 0.0)));

        host.set_vertical(root, true);
        assert_eq!(host.position_of(b), Some((0.0, LEAF_HEIGHT)));
    }

    #[test]
    fn test_suppressed_button_keeps_space_collapsed_does_not() {
        let mut host = TaffyHost::new(800.0);
        let root = host.create(&hbox(), None).unwrap();
        let button = host.create(&Descriptor::new("button"), Some(root)).unwrap();
        let field = host.create(&Descriptor::new("textfield"), Some(root)).unwrap();

        host.set_button_visibility(button, ButtonVisibility::SuppressedKeepSpace);
        assert_eq!(host.position_of(field), Some((BUTTON_WIDTH, 0.0)));

        host.set_button_visibility(button, ButtonVisibility::HiddenCollapsed);
        assert_eq!(host.position_of(field), Some((0.0, 0.0)));
    }

    #[test]
    fn test_suspended_layout_runs_once_on_resume() {
        let mut host = TaffyHost::new(800.0);
        let root = host.create(&hbox(), None).unwrap();
        let before = host.layout_passes();

        host.suspend_layouts();
        for _ in 0..5 {
            host.create(&Descriptor::new("textfield"), Some(root)).unwrap();
        }
        assert_eq!(host.layout_passes(), before);
        host.resume_layouts();

        assert_eq!(host.layout_passes(), before + 1);
    }

    #[test]
    fn test_resize_reports_widths() {
        let mut host = TaffyHost::new(800.0);
        let root = host.create(&hbox().with_prop("flex", json!(1)), None).unwrap();
        assert_eq!(host.width_of(root), Some(800.0));

        let (new, old) = host.resize(300.0, root);
        assert_eq!(old, Some(800.0));
        assert_eq!(new, Some(300.0));
    }
}
