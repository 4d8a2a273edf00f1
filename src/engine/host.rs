//! Host boundary - What the field needs from the container framework.
//!
//! The host owns actual widgets. The field addresses them only through
//! [`ElementId`] handles it got back from [`Host::create`].
//!
//! # Layout batching
//!
//! Multi-step structural changes run inside a [`LayoutBatch`]: layout is
//! suspended when the batch opens and resumed when it drops, so resume runs
//! even when a step inside the batch returns early with an error.
//!
//! ```ignore
//! {
//!     let mut batch = LayoutBatch::new(&mut host);
//!     batch.set_hidden(row, true);
//!     let extra = batch.create(&descriptor, Some(root))?; // resume still runs on `?`
//! }
//! ```

use std::ops::{Deref, DerefMut};

use serde_json::Value;

use crate::descriptor::Descriptor;
use crate::error::HostError;
use crate::types::{ButtonVisibility, ElementId};

/// Capabilities consumed from the host container/layout system.
pub trait Host {
    /// Instantiate one element (not its `items`) under `parent`.
    fn create(
        &mut self,
        descriptor: &Descriptor,
        parent: Option<ElementId>,
    ) -> Result<ElementId, HostError>;

    /// Destroy an element and everything below it. Unknown handles are ignored.
    fn destroy(&mut self, element: ElementId);

    fn set_hidden(&mut self, element: ElementId, hidden: bool);

    fn set_disabled(&mut self, element: ElementId, disabled: bool);

    fn set_button_visibility(&mut self, element: ElementId, visibility: ButtonVisibility);

    /// Switch a row container between horizontal and vertical arrangement.
    fn set_vertical(&mut self, element: ElementId, vertical: bool);

    /// Push a bound record value into an element property (`value`, `pressed`).
    fn set_bound_value(&mut self, element: ElementId, property: &str, value: &Value);

    /// Stop recomputing layout until the matching [`Host::resume_layouts`].
    /// Calls nest.
    fn suspend_layouts(&mut self);

    fn resume_layouts(&mut self);

    /// Request one layout recomputation.
    fn update_layout(&mut self);
}

/// Scoped layout suspension. Suspends on creation, resumes on drop.
pub struct LayoutBatch<'a, H: Host + ?Sized> {
    host: &'a mut H,
}

impl<'a, H: Host + ?Sized> LayoutBatch<'a, H> {
    pub fn new(host: &'a mut H) -> Self {
        host.suspend_layouts();
        Self { host }
    }
}

impl<H: Host + ?Sized> Deref for LayoutBatch<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: Host + ?Sized> DerefMut for LayoutBatch<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: Host + ?Sized> Drop for LayoutBatch<'_, H> {
    fn drop(&mut self) {
        self.host.resume_layouts();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::TaffyHost;

    fn failing_step(host: &mut TaffyHost) -> Result<ElementId, HostError> {
        let mut batch = LayoutBatch::new(host);
        batch.create(&Descriptor::new("not-a-widget"), None)
    }

    #[test]
    fn test_batch_suspends_and_resumes() {
        let mut host = TaffyHost::new(800.0);
        {
            let batch = LayoutBatch::new(&mut host);
            assert!(batch.is_suspended());
        }
        assert!(!host.is_suspended());
    }

    #[test]
    fn test_batch_resumes_after_error() {
        let mut host = TaffyHost::new(800.0);
        assert!(failing_step(&mut host).is_err());
        assert!(!host.is_suspended());
    }

    #[test]
    fn test_batches_nest() {
        let mut host = TaffyHost::new(800.0);
        {
            let mut outer = LayoutBatch::new(&mut host);
            {
                let inner = LayoutBatch::new(&mut *outer);
                assert!(inner.is_suspended());
            }
            assert!(outer.is_suspended());
        }
        assert!(!host.is_suspended());
    }
}
