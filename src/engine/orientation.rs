//! Responsive Orientation Toggle.
//!
//! Rows are horizontal while the field is at least `breakpoint` wide and
//! vertical below it. Width notifications come from the host; only a crossing
//! of the breakpoint flips the mode.

/// Vertical-mode state of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponsiveOrientation {
    breakpoint: f32,
    vertical: bool,
}

impl ResponsiveOrientation {
    pub fn new(breakpoint: f32, vertical: bool) -> Self {
        Self { breakpoint, vertical }
    }

    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    pub fn breakpoint(&self) -> f32 {
        self.breakpoint
    }

    /// Feed a width change. Returns the new mode when it flipped.
    ///
    /// `old_width` is `None` on the first layout.
    pub fn observe(&mut self, new_width: f32, old_width: Option<f32>) -> Option<bool> {
        let width_changed = old_width.is_none_or(|old| old != new_width);
        let wants_vertical = self.breakpoint > new_width;

        if width_changed && wants_vertical != self.vertical {
            self.vertical = wants_vertical;
            Some(wants_vertical)
        } else {
            None
        }
    }
}
