//! Layout - Host implementations.
//!
//! - [`TaffyHost`] - Headless host with Taffy flexbox layout

mod taffy_host;

pub use taffy_host::TaffyHost;
