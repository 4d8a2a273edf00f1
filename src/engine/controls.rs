//! Control-Button Visibility Policy.
//!
//! Recomputed from scratch after every row creation, destruction, show or
//! hide:
//! - remove buttons are disabled when exactly one row is visible
//! - only the last visible row shows its add button; earlier rows keep the
//!   space but suppress it
//! - the last add button is disabled once the visible count reaches the
//!   maximum
//! - buttons of hidden rows collapse

use super::host::Host;
use super::row::Row;
use crate::types::ButtonVisibility;

/// Button state for one visible row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub remove_disabled: bool,
    pub add: ButtonVisibility,
    pub add_disabled: bool,
}

/// States for `visible` visible rows, in display order.
pub fn control_states(visible: usize, max_rows: usize) -> Vec<ControlState> {
    (0..visible)
        .map(|ordinal| {
            let is_last = ordinal + 1 == visible;
            ControlState {
                remove_disabled: visible == 1,
                add: if is_last {
                    ButtonVisibility::Shown
                } else {
                    ButtonVisibility::SuppressedKeepSpace
                },
                add_disabled: !is_last || visible >= max_rows,
            }
        })
        .collect()
}

/// Push the policy for `rows` into the host.
pub fn apply_controls<H: Host + ?Sized>(host: &mut H, rows: &[Row], max_rows: usize) {
    let visible = rows.iter().filter(|row| !row.is_hidden()).count();
    let mut states = control_states(visible, max_rows).into_iter();

    for row in rows {
        if row.is_hidden() {
            if let Some(add) = row.add_button() {
                host.set_button_visibility(add, ButtonVisibility::HiddenCollapsed);
            }
            continue;
        }
        let Some(state) = states.next() else { break };

        if let Some(remove) = row.remove_button() {
            host.set_disabled(remove, state.remove_disabled);
        }
        if let Some(add) = row.add_button() {
            host.set_button_visibility(add, state.add);
            host.set_disabled(add, state.add_disabled);
        }
    }
}
