//! In-memory [`ScreenModel`].
//!
//! [`MemoryScreen`] keeps ordered workspaces and windows, tracks the active
//! pair, and emits [`ScreenEvent`]s to its subscribers.  Two details mimic
//! a real window-management service:
//!
//! * [`change_workspace_count`](ScreenModel::change_workspace_count) only
//!   records the request.  The workspaces appear (or disappear) when
//!   [`settle`](MemoryScreen::settle) runs, which is what a later
//!   event-loop turn looks like to the caller.
//! * Every mutator call is appended to a [`journal`](MemoryScreen::journal)
//!   so the exact sequence of requests can be inspected.
//!
//! Search matches window titles case-insensitively by substring.

use crate::action::Carry;
use crate::navigator::wrap_index;
use crate::traits::{ScreenEvent, ScreenModel, Subscription, Timestamp, WindowId, WorkspaceId};
use log::debug;
use std::collections::HashMap;
use std::sync::mpsc;

/// Errors from [`MemoryScreen`] mutators.
#[derive(Debug, thiserror::Error)]
pub enum MemoryScreenError {
    #[error("unknown {0}")]
    UnknownWindow(WindowId),
    #[error("unknown {0}")]
    UnknownWorkspace(WorkspaceId),
    #[error("no workspace at index {0}")]
    NoWorkspaceAt(usize),
    #[error("workspace count must be at least 1")]
    ZeroWorkspaces,
}

/// A mutator call, as recorded in the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    ActivateWindow { window: WindowId, warp_pointer: bool },
    ActivateWorkspace { workspace: WorkspaceId },
    ReorderWindow { window: WindowId, index: usize },
    MoveWindow { window: WindowId, workspace: WorkspaceId },
    CloseWindow { window: WindowId },
    SetMaximized { window: WindowId, maximized: bool },
    SetMinimized { window: WindowId, minimized: bool },
    ChangeWorkspaceCount { count: usize },
    SwitchWorkspace { index: usize, carry: Carry },
    CycleStackingOrder { backwards: bool },
    ActivateNextWindow { backwards: bool },
    MoveToNextDisplay { window: WindowId },
}

#[derive(Debug, Clone)]
struct WindowState {
    title: String,
    workspace: WorkspaceId,
    maximized: bool,
    minimized: bool,
    display: usize,
}

#[derive(Debug, Clone)]
struct WorkspaceState {
    id: WorkspaceId,
    windows: Vec<WindowId>,
}

/// See the [module docs](self).
#[derive(Debug)]
pub struct MemoryScreen {
    workspaces: Vec<WorkspaceState>,
    windows: HashMap<WindowId, WindowState>,
    active_workspace: Option<WorkspaceId>,
    active_window: Option<WindowId>,
    /// Most recently activated first.
    recency: Vec<WindowId>,
    /// Snapshot of `recency` taken by `commit_stacking_order`; stacking
    /// cycling walks this one so repeated presses do not just toggle.
    stacking: Vec<WindowId>,
    requested_count: Option<usize>,
    displays: usize,
    next_id: u64,
    subscribers: Vec<mpsc::Sender<ScreenEvent>>,
    journal: Vec<Mutation>,
}

impl MemoryScreen {
    /// A screen with `count` empty workspaces (at least one), the first of
    /// them active, and a single display head.
    pub fn new(count: usize) -> Self {
        let mut screen = Self {
            workspaces: Vec::new(),
            windows: HashMap::new(),
            active_workspace: None,
            active_window: None,
            recency: Vec::new(),
            stacking: Vec::new(),
            requested_count: None,
            displays: 1,
            next_id: 1,
            subscribers: Vec::new(),
            journal: Vec::new(),
        };
        for _ in 0..count.max(1) {
            screen.push_workspace();
        }
        screen.active_workspace = screen.workspaces.first().map(|ws| ws.id);
        screen
    }

    /// Pretend `displays` display heads are attached.
    pub fn with_displays(mut self, displays: usize) -> Self {
        self.displays = displays.max(1);
        self
    }

    /// Open a window titled `title` at the end of the workspace at
    /// `workspace_index`.  The window is not activated.
    ///
    /// # Panics
    ///
    /// Panics if there is no workspace at `workspace_index`.
    pub fn open_window(&mut self, workspace_index: usize, title: &str) -> WindowId {
        let id = WindowId(self.alloc_id());
        let ws = &mut self.workspaces[workspace_index];
        ws.windows.push(id);
        let workspace = ws.id;
        self.windows.insert(
            id,
            WindowState {
                title: title.to_string(),
                workspace,
                maximized: false,
                minimized: false,
                display: 0,
            },
        );
        self.recency.push(id);
        self.stacking.push(id);
        self.emit(ScreenEvent::WindowOpened(id));
        id
    }

    /// Forget which workspace and window are active.
    pub fn deactivate_all(&mut self) {
        self.active_workspace = None;
        self.active_window = None;
    }

    pub fn title(&self, window: WindowId) -> Option<&str> {
        self.windows.get(&window).map(|w| w.title.as_str())
    }

    pub fn display_of(&self, window: WindowId) -> Option<usize> {
        self.windows.get(&window).map(|w| w.display)
    }

    /// Every mutator call since construction or the last
    /// [`clear_journal`](MemoryScreen::clear_journal).
    pub fn journal(&self) -> &[Mutation] {
        &self.journal
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    /// Apply a requested workspace-count change and announce it.
    ///
    /// Workspaces are added or removed at the end.  Windows still on a
    /// removed workspace fall back to the last remaining one.  Returns how
    /// many workspaces were created or destroyed.
    pub fn settle(&mut self) -> usize {
        let Some(target) = self.requested_count.take() else {
            return 0;
        };
        let mut changed = 0;
        while self.workspaces.len() < target {
            let id = self.push_workspace();
            debug!("created {}", id);
            self.emit(ScreenEvent::WorkspaceCreated(id));
            changed += 1;
        }
        while self.workspaces.len() > target.max(1) {
            let Some(removed) = self.workspaces.pop() else {
                break;
            };
            let Some(last) = self.workspaces.last_mut() else {
                break;
            };
            let fallback = last.id;
            for w in &removed.windows {
                if let Some(state) = self.windows.get_mut(w) {
                    state.workspace = fallback;
                }
            }
            last.windows.extend(removed.windows);
            if self.active_workspace == Some(removed.id) {
                self.active_workspace = Some(fallback);
                self.emit(ScreenEvent::ActiveWorkspaceChanged);
            }
            debug!("destroyed {}", removed.id);
            self.emit(ScreenEvent::WorkspaceDestroyed(removed.id));
            changed += 1;
        }
        changed
    }

    //  Internal

    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn push_workspace(&mut self) -> WorkspaceId {
        let id = WorkspaceId(self.alloc_id());
        self.workspaces.push(WorkspaceState {
            id,
            windows: Vec::new(),
        });
        id
    }

    fn emit(&mut self, event: ScreenEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn workspace_mut(&mut self, id: WorkspaceId) -> Result<&mut WorkspaceState, MemoryScreenError> {
        self.workspaces
            .iter_mut()
            .find(|ws| ws.id == id)
            .ok_or(MemoryScreenError::UnknownWorkspace(id))
    }

    fn check_window(&self, window: WindowId) -> Result<(), MemoryScreenError> {
        if self.windows.contains_key(&window) {
            Ok(())
        } else {
            Err(MemoryScreenError::UnknownWindow(window))
        }
    }

    /// Move `window` to the end of `workspace`.
    fn place(&mut self, window: WindowId, workspace: WorkspaceId) -> Result<(), MemoryScreenError> {
        self.workspace_mut(workspace)?;
        let state = self
            .windows
            .get_mut(&window)
            .ok_or(MemoryScreenError::UnknownWindow(window))?;
        let from = std::mem::replace(&mut state.workspace, workspace);
        if let Ok(ws) = self.workspace_mut(from) {
            ws.windows.retain(|&w| w != window);
        }
        self.workspace_mut(workspace)?.windows.push(window);

        if self.active_window == Some(window) && self.active_workspace != Some(workspace) {
            self.active_window = None;
            self.emit(ScreenEvent::ActiveWindowChanged);
        }
        Ok(())
    }

    fn focus_window(&mut self, window: WindowId) {
        let Some(state) = self.windows.get_mut(&window) else {
            return;
        };
        state.minimized = false;
        let workspace = state.workspace;
        if self.active_workspace != Some(workspace) {
            self.active_workspace = Some(workspace);
            self.emit(ScreenEvent::ActiveWorkspaceChanged);
        }
        self.recency.retain(|&w| w != window);
        self.recency.insert(0, window);
        self.active_window = Some(window);
        self.emit(ScreenEvent::ActiveWindowChanged);
    }

    fn focus_workspace(&mut self, workspace: WorkspaceId) {
        self.active_workspace = Some(workspace);
        self.active_window = self
            .recency
            .iter()
            .copied()
            .find(|w| self.windows.get(w).is_some_and(|s| s.workspace == workspace));
        self.emit(ScreenEvent::ActiveWorkspaceChanged);
        self.emit(ScreenEvent::ActiveWindowChanged);
    }

    /// The entry after (or before) the active window in `order`, wrapping.
    fn neighbour_in(&self, order: &[WindowId], backwards: bool) -> Option<WindowId> {
        if order.is_empty() {
            return None;
        }
        let delta = if backwards { -1 } else { 1 };
        let index = match self.active_window.and_then(|a| order.iter().position(|&w| w == a)) {
            Some(i) => wrap_index(i, delta, order.len()),
            None if backwards => order.len() - 1,
            None => 0,
        };
        Some(order[index])
    }
}

impl ScreenModel for MemoryScreen {
    type Error = MemoryScreenError;

    fn workspaces(&self) -> Vec<WorkspaceId> {
        self.workspaces.iter().map(|ws| ws.id).collect()
    }

    fn windows(&self, workspace: WorkspaceId) -> Vec<WindowId> {
        self.workspaces
            .iter()
            .find(|ws| ws.id == workspace)
            .map(|ws| ws.windows.clone())
            .unwrap_or_default()
    }

    fn active_workspace(&self) -> Option<WorkspaceId> {
        self.active_workspace
    }

    fn active_window(&self) -> Option<WindowId> {
        self.active_window
    }

    fn workspace_count(&self) -> usize {
        self.workspaces.len()
    }

    fn is_maximized(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.maximized)
    }

    fn is_minimized(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.minimized)
    }

    fn activate_window(
        &mut self,
        window: WindowId,
        _time: Timestamp,
        warp_pointer: bool,
    ) -> Result<(), MemoryScreenError> {
        self.check_window(window)?;
        self.journal.push(Mutation::ActivateWindow {
            window,
            warp_pointer,
        });
        self.focus_window(window);
        Ok(())
    }

    fn activate_workspace(
        &mut self,
        workspace: WorkspaceId,
        _time: Timestamp,
    ) -> Result<(), MemoryScreenError> {
        self.workspace_mut(workspace)?;
        self.journal.push(Mutation::ActivateWorkspace { workspace });
        self.focus_workspace(workspace);
        Ok(())
    }

    fn reorder_window(
        &mut self,
        workspace: WorkspaceId,
        window: WindowId,
        index: usize,
    ) -> Result<(), MemoryScreenError> {
        let ws = self.workspace_mut(workspace)?;
        let pos = ws
            .windows
            .iter()
            .position(|&w| w == window)
            .ok_or(MemoryScreenError::UnknownWindow(window))?;
        ws.windows.remove(pos);
        let index = index.min(ws.windows.len());
        ws.windows.insert(index, window);
        self.journal.push(Mutation::ReorderWindow { window, index });
        Ok(())
    }

    fn move_window_to_workspace(
        &mut self,
        window: WindowId,
        workspace: WorkspaceId,
    ) -> Result<(), MemoryScreenError> {
        self.check_window(window)?;
        self.workspace_mut(workspace)?;
        self.journal.push(Mutation::MoveWindow { window, workspace });
        self.place(window, workspace)
    }

    fn close_window(&mut self, window: WindowId, _time: Timestamp) -> Result<(), MemoryScreenError> {
        let state = self
            .windows
            .remove(&window)
            .ok_or(MemoryScreenError::UnknownWindow(window))?;
        self.journal.push(Mutation::CloseWindow { window });
        if let Ok(ws) = self.workspace_mut(state.workspace) {
            ws.windows.retain(|&w| w != window);
        }
        self.recency.retain(|&w| w != window);
        self.stacking.retain(|&w| w != window);
        if self.active_window == Some(window) {
            self.active_window = None;
            self.emit(ScreenEvent::ActiveWindowChanged);
        }
        self.emit(ScreenEvent::WindowClosed(window));
        Ok(())
    }

    fn set_maximized(&mut self, window: WindowId, maximized: bool) -> Result<(), MemoryScreenError> {
        let state = self
            .windows
            .get_mut(&window)
            .ok_or(MemoryScreenError::UnknownWindow(window))?;
        state.maximized = maximized;
        self.journal.push(Mutation::SetMaximized { window, maximized });
        Ok(())
    }

    fn set_minimized(
        &mut self,
        window: WindowId,
        minimized: bool,
        _time: Timestamp,
    ) -> Result<(), MemoryScreenError> {
        let state = self
            .windows
            .get_mut(&window)
            .ok_or(MemoryScreenError::UnknownWindow(window))?;
        state.minimized = minimized;
        self.journal.push(Mutation::SetMinimized { window, minimized });
        Ok(())
    }

    fn change_workspace_count(&mut self, count: usize) -> Result<(), MemoryScreenError> {
        if count == 0 {
            return Err(MemoryScreenError::ZeroWorkspaces);
        }
        self.journal.push(Mutation::ChangeWorkspaceCount { count });
        self.requested_count = Some(count);
        Ok(())
    }

    fn switch_workspace(
        &mut self,
        index: usize,
        carry: Carry,
        _time: Timestamp,
    ) -> Result<(), MemoryScreenError> {
        let target = self
            .workspaces
            .get(index)
            .map(|ws| ws.id)
            .ok_or(MemoryScreenError::NoWorkspaceAt(index))?;
        self.journal.push(Mutation::SwitchWorkspace { index, carry });

        let carried = match carry {
            Carry::Nothing => None,
            Carry::ActiveWindow => self.active_window,
            Carry::AllWindows => {
                if let Some(source) = self.active_workspace {
                    for w in self.windows(source) {
                        self.place(w, target)?;
                    }
                }
                None
            }
        };
        match carried {
            Some(window) => {
                self.place(window, target)?;
                self.focus_window(window);
            }
            None => self.focus_workspace(target),
        }
        Ok(())
    }

    fn activate_next_in_stacking_order(
        &mut self,
        backwards: bool,
        _time: Timestamp,
    ) -> Result<(), MemoryScreenError> {
        self.journal.push(Mutation::CycleStackingOrder { backwards });
        if let Some(next) = self.neighbour_in(&self.stacking, backwards) {
            self.focus_window(next);
        }
        Ok(())
    }

    fn activate_next_window(&mut self, backwards: bool, _time: Timestamp) -> Result<(), MemoryScreenError> {
        self.journal.push(Mutation::ActivateNextWindow { backwards });
        let order: Vec<WindowId> = self
            .workspaces
            .iter()
            .flat_map(|ws| ws.windows.iter().copied())
            .collect();
        if let Some(next) = self.neighbour_in(&order, backwards) {
            self.focus_window(next);
        }
        Ok(())
    }

    fn move_window_to_next_display(&mut self, window: WindowId) -> Result<(), MemoryScreenError> {
        let displays = self.displays;
        let state = self
            .windows
            .get_mut(&window)
            .ok_or(MemoryScreenError::UnknownWindow(window))?;
        state.display = (state.display + 1) % displays;
        self.journal.push(Mutation::MoveToNextDisplay { window });
        Ok(())
    }

    fn update_search(&mut self, query: &str) -> usize {
        let query = query.to_lowercase();
        self.windows
            .values()
            .filter(|w| w.title.to_lowercase().contains(&query))
            .count()
    }

    fn commit_stacking_order(&mut self) {
        self.stacking = self.recency.clone();
    }

    fn subscribe(&mut self) -> Subscription {
        let (tx, sub) = Subscription::channel();
        self.subscribers.push(tx);
        sub
    }
}

//  Tests
