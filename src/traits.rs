//! Core traits that decouple wsswitch from any specific window-management
//! service or input transport.
//!
//! Every concrete backend (a libwnck-style screen model, the in-memory
//! [`MemoryScreen`](crate::screen::memory::MemoryScreen), a Unix-socket
//! listener, a test harness, …) implements one of these traits.  The
//! [`Dispatcher`](crate::dispatcher::Dispatcher) only depends on these
//! abstractions.

use crate::action::Carry;
use crate::input::InputEvent;
use std::fmt;
use std::sync::mpsc;

/// Opaque handle to a window owned by the screen model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Opaque handle to a workspace owned by the screen model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkspaceId(pub u64);

impl fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "workspace#{}", self.0)
    }
}

/// Input and notification timestamps, in the server's clock.
pub type Timestamp = u32;

/// Abstraction over the live model of workspaces and windows maintained by
/// the external window-management service.
///
/// Queries are reads of the model's cached state and cannot fail.
/// Mutators forward requests to the service and may fail.
///
/// Ordering is significant: [`workspaces`](ScreenModel::workspaces) and
/// [`windows`](ScreenModel::windows) return their items in navigation
/// order, and every next/previous computation is based on it.
pub trait ScreenModel {
    /// The error type produced by this model's mutators.
    type Error: std::error::Error + Send + 'static;

    //  Queries

    /// All workspaces in navigation order.
    fn workspaces(&self) -> Vec<WorkspaceId>;

    /// Windows of `workspace` in navigation order.  Unknown workspaces have
    /// no windows.
    fn windows(&self, workspace: WorkspaceId) -> Vec<WindowId>;

    /// The active workspace, if any.
    fn active_workspace(&self) -> Option<WorkspaceId>;

    /// The active window, if any.  When both are set it belongs to
    /// [`active_workspace`](ScreenModel::active_workspace).
    fn active_window(&self) -> Option<WindowId>;

    /// The workspace count as last confirmed by the service.
    ///
    /// After [`change_workspace_count`](ScreenModel::change_workspace_count)
    /// this still reports the old value until the service confirms the
    /// change with [`ScreenEvent::WorkspaceCreated`] /
    /// [`ScreenEvent::WorkspaceDestroyed`] notifications.
    fn workspace_count(&self) -> usize;

    fn is_maximized(&self, window: WindowId) -> bool;

    fn is_minimized(&self, window: WindowId) -> bool;

    //  Mutators

    /// Activate `window`.  `warp_pointer` hints that the pointer should
    /// follow the newly active window.
    fn activate_window(
        &mut self,
        window: WindowId,
        time: Timestamp,
        warp_pointer: bool,
    ) -> Result<(), Self::Error>;

    fn activate_workspace(&mut self, workspace: WorkspaceId, time: Timestamp)
        -> Result<(), Self::Error>;

    /// Move `window` to position `index` within `workspace` without
    /// changing which window is active.
    fn reorder_window(
        &mut self,
        workspace: WorkspaceId,
        window: WindowId,
        index: usize,
    ) -> Result<(), Self::Error>;

    fn move_window_to_workspace(
        &mut self,
        window: WindowId,
        workspace: WorkspaceId,
    ) -> Result<(), Self::Error>;

    fn close_window(&mut self, window: WindowId, time: Timestamp) -> Result<(), Self::Error>;

    fn set_maximized(&mut self, window: WindowId, maximized: bool) -> Result<(), Self::Error>;

    fn set_minimized(
        &mut self,
        window: WindowId,
        minimized: bool,
        time: Timestamp,
    ) -> Result<(), Self::Error>;

    /// Ask the service for `count` workspaces.  The service always adds or
    /// removes workspaces at the end of the list.
    fn change_workspace_count(&mut self, count: usize) -> Result<(), Self::Error>;

    /// Switch to the workspace at `index`, carrying windows of the current
    /// workspace along as requested by `carry`.
    fn switch_workspace(
        &mut self,
        index: usize,
        carry: Carry,
        time: Timestamp,
    ) -> Result<(), Self::Error>;

    /// Activate the next (or previous) window in most-recently-used order.
    fn activate_next_in_stacking_order(
        &mut self,
        backwards: bool,
        time: Timestamp,
    ) -> Result<(), Self::Error>;

    /// Activate the next (or previous) window across all workspaces.
    fn activate_next_window(&mut self, backwards: bool, time: Timestamp)
        -> Result<(), Self::Error>;

    /// Move `window` to the next display head.
    fn move_window_to_next_display(&mut self, window: WindowId) -> Result<(), Self::Error>;

    /// Recompute which windows match `query` and return how many do.
    ///
    /// Matching semantics (case folding, substring vs. prefix) belong to
    /// the model.
    fn update_search(&mut self, query: &str) -> usize;

    /// Persist the most-recently-used order observed while the switcher
    /// was open.
    fn commit_stacking_order(&mut self);

    /// Register for change notifications.
    ///
    /// The returned [`Subscription`] is the only handle to the
    /// registration; dropping it disconnects the channel and the model
    /// stops delivering to it.
    fn subscribe(&mut self) -> Subscription;
}

//  Notifications

/// Change notifications delivered by a [`ScreenModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenEvent {
    ActiveWindowChanged,
    ActiveWorkspaceChanged,
    WindowOpened(WindowId),
    WindowClosed(WindowId),
    /// A workspace requested through
    /// [`change_workspace_count`](ScreenModel::change_workspace_count) now
    /// exists.
    WorkspaceCreated(WorkspaceId),
    WorkspaceDestroyed(WorkspaceId),
}

/// Receiving end of a [`ScreenModel`] registration.
///
/// Notifications queue up in the channel until the owner drains them on
/// its own turn of the event loop.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<ScreenEvent>,
}

impl Subscription {
    /// Create a connected `(sender, subscription)` pair.  The model keeps
    /// the sender.
    pub fn channel() -> (mpsc::Sender<ScreenEvent>, Subscription) {
        let (tx, rx) = mpsc::channel();
        (tx, Subscription { rx })
    }

    /// Take every notification queued so far without blocking.
    pub fn drain(&self) -> impl Iterator<Item = ScreenEvent> + '_ {
        self.rx.try_iter()
    }
}

//  Overlay

/// Signals sent from the [`Dispatcher`](crate::dispatcher::Dispatcher) to
/// whatever renders the overlay, over an [`mpsc`](std::sync::mpsc) channel.
///
/// The core never draws anything itself; it only says *when* something
/// needs to be drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayEvent {
    /// The overlay's contents are stale and should be repainted.
    Redraw,

    /// The first search character was typed; the renderer should create
    /// its query display.
    SearchOpened,

    /// The search query or its match count changed.
    SearchChanged {
        query: String,
        matches: usize,
        /// Human-readable count, e.g. `"(1 match)"` or `"(3 matches)"`.
        summary: String,
    },
}

//  Input Source

/// A source of [`InputEvent`]s.
///
/// Implementations listen on some transport (a Unix socket, a keyboard
/// grab, a test harness, …) and forward parsed events into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](InputSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received event must be sent through `sink` exactly once.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait InputSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`InputEvent`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<InputEvent>) -> Result<(), Self::Error>;
}
