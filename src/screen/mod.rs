//! Concrete [`ScreenModel`](crate::traits::ScreenModel) backends.
//!
//! Rendering and the live connection to a window-management service live
//! outside this crate; [`memory`] is a self-contained model that behaves
//! like one, including the delayed confirmation of workspace-count changes.

pub mod memory;
