//! The action vocabulary shared by every component.
//!
//! [`Action`] describes every semantic command the dispatcher can perform.
//! [`Step`], [`WorkspaceTarget`] and [`Carry`] are its supporting types.
//! Actions are produced by the [`Keymap`](crate::input::Keymap) from raw
//! input, but they are plain serde values so a caller may also build or
//! receive them directly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One step through a cyclic list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Previous,
    Next,
}

impl Step {
    /// `-1` for [`Previous`](Step::Previous), `+1` for [`Next`](Step::Next).
    pub fn delta(self) -> i32 {
        match self {
            Step::Previous => -1,
            Step::Next => 1,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Previous => write!(f, "previous"),
            Step::Next => write!(f, "next"),
        }
    }
}

/// Which workspace a workspace switch lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceTarget {
    /// Move by a signed number of workspaces, wrapping around the ends.
    Relative(i32),
    /// Jump straight to the workspace at this 0-based index.
    Index(usize),
}

impl fmt::Display for WorkspaceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspaceTarget::Relative(d) => write!(f, "{:+}", d),
            WorkspaceTarget::Index(i) => write!(f, "#{}", i),
        }
    }
}

/// What travels along with a workspace switch or creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Carry {
    /// Only the view changes.
    #[default]
    Nothing,
    /// The active window comes along.
    ActiveWindow,
    /// Every window of the current workspace comes along.
    AllWindows,
}

impl Carry {
    /// Build from the "bring window" / "bring all" modifier pair.  Bringing
    /// all windows wins when both are set.
    pub fn from_flags(bring_window: bool, bring_all: bool) -> Self {
        if bring_all {
            Carry::AllWindows
        } else if bring_window {
            Carry::ActiveWindow
        } else {
            Carry::Nothing
        }
    }
}

impl fmt::Display for Carry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Carry::Nothing => write!(f, "nothing"),
            Carry::ActiveWindow => write!(f, "active window"),
            Carry::AllWindows => write!(f, "all windows"),
        }
    }
}

/// Every action the dispatcher can perform.
///
/// The timestamp of the originating input travels next to the action
/// (see [`Dispatcher::dispatch`](crate::dispatcher::Dispatcher::dispatch))
/// rather than inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Activate the neighbouring window in the active workspace, or with
    /// `reorder` move the active window one slot instead.
    MoveWindow {
        step: Step,
        reorder: bool,
        /// Let the pointer follow the activated window.
        #[serde(default)]
        warp_pointer: bool,
    },

    /// Cycle through windows in most-recently-used order.
    CycleStackingOrder { backwards: bool },

    /// Switch workspace by delta or absolute index.
    MoveWorkspace {
        target: WorkspaceTarget,
        #[serde(default)]
        carry: Carry,
    },

    /// Append a workspace and switch to it once it exists.
    NewWorkspace {
        #[serde(default)]
        carry: Carry,
    },

    /// Remove the active workspace if it is empty, or with `all_empty`
    /// every empty workspace.
    DeleteWorkspaceIfEmpty { all_empty: bool },

    CloseWindow { all_in_workspace: bool },

    ToggleMaximize { all_in_workspace: bool },

    ToggleMinimize { all_in_workspace: bool },

    /// Activate the next window across all workspaces.
    ActivateNextGlobal { backwards: bool },

    /// Send the active window to the next display head.
    SwitchDisplayHead,

    SearchAppend(char),

    SearchBackspace,
}
