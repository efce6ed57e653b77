//! **wsswitch**: the input-to-action core of a keyboard-driven window and
//! workspace switcher.
//!
//! Raw key and scroll events are translated into [`action::Action`]s and
//! dispatched against a model of the screen: cyclic window and workspace
//! navigation, workspace creation that completes once the window-management
//! service confirms it, compaction of empty workspaces, per-window state
//! toggles, and incremental title search.  Rendering is somebody else's
//! job; the core only signals when the overlay needs redrawing.
//!
//! # Architecture
//!
//! The crate is organised around two traits:
//!
//! * [`traits::ScreenModel`] abstracts the live model of workspaces and
//!   windows so the switcher logic is not coupled to any specific window
//!   manager.
//! * [`traits::InputSource`] abstracts the transport that delivers raw
//!   input (a Unix socket, a keyboard grab, …).
//!
//! [`dispatcher::Dispatcher`] owns one session's state and drives the
//! single-purpose modules.  Concrete implementations live in [`screen`]
//! (an in-memory model) and [`ipc`] (Unix-socket input listener).

pub mod action;
pub mod compactor;
pub mod config;
pub mod dispatcher;
pub mod input;
pub mod ipc;
pub mod navigator;
pub mod pending;
pub mod screen;
pub mod search;
pub mod traits;
