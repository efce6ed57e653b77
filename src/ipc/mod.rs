//! Input delivered over IPC.
//!
//! Key-grab helpers, scripts and tests connect to a Unix socket and send
//! newline-delimited JSON [`InputEvent`](crate::input::InputEvent)s.

pub mod listener;
