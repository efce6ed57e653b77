//! Cyclic traversal over windows and workspaces.
//!
//! Window navigation walks the active workspace's window list and wraps
//! past both ends.  Workspace navigation wraps over the ordered workspace
//! list.  Stacking-order and global cycling are owned by the
//! [`ScreenModel`] and only delegated to.

use crate::action::Carry;
use crate::traits::{ScreenModel, Timestamp, WindowId, WorkspaceId};
use log::{debug, warn};

/// What [`activate_window_by_delta`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    /// A precondition was not met; nothing changed.
    Unchanged,
    /// `WindowId` was activated.
    Activated(WindowId),
    /// The active window moved to `index` within `workspace`.  Activation
    /// did not change, so nothing will announce the change; the overlay
    /// must be redrawn explicitly.
    Reordered {
        workspace: WorkspaceId,
        window: WindowId,
        index: usize,
    },
}

/// `index + delta`, wrapped into `0..len`.
///
/// # Panics
///
/// Panics if `len` is zero.
pub fn wrap_index(index: usize, delta: i32, len: usize) -> usize {
    assert!(len > 0, "cannot wrap over an empty list");
    (index as i64 + i64::from(delta)).rem_euclid(len as i64) as usize
}

/// Activate the next (`delta = +1`) or previous (`delta = -1`) window of
/// the active workspace, or with `reorder` move the active window one slot
/// in that direction instead.
///
/// Without an active window the first (`+1`) or last (`-1`) window is
/// activated.  Workspaces with fewer than two windows are left alone.
///
/// # Panics
///
/// Panics if `delta` is neither `+1` nor `-1`.
pub fn activate_window_by_delta<S: ScreenModel>(
    screen: &mut S,
    delta: i32,
    reorder: bool,
    warp_pointer: bool,
    time: Timestamp,
) -> Result<Navigation, S::Error> {
    assert!(
        delta == 1 || delta == -1,
        "window delta must be +1 or -1, got {}",
        delta
    );

    let Some(workspace) = screen.active_workspace() else {
        debug!("no active workspace, nothing to navigate");
        return Ok(Navigation::Unchanged);
    };
    let windows = screen.windows(workspace);

    let Some(active) = screen.active_window() else {
        let target = if delta == 1 { windows.first() } else { windows.last() };
        return match target.copied() {
            Some(window) => {
                screen.activate_window(window, time, warp_pointer)?;
                Ok(Navigation::Activated(window))
            }
            None => {
                debug!("{} has no windows", workspace);
                Ok(Navigation::Unchanged)
            }
        };
    };

    if windows.len() <= 1 {
        return Ok(Navigation::Unchanged);
    }

    let Some(index) = windows.iter().position(|&w| w == active) else {
        warn!("active {} is not listed in {}", active, workspace);
        return Ok(Navigation::Unchanged);
    };
    let next = wrap_index(index, delta, windows.len());

    if reorder {
        screen.reorder_window(workspace, active, next)?;
        return Ok(Navigation::Reordered {
            workspace,
            window: active,
            index: next,
        });
    }

    let target = windows[next];
    screen.activate_window(target, time, warp_pointer)?;
    Ok(Navigation::Activated(target))
}

/// Activate the next window in most-recently-used order.
pub fn activate_window_by_stacking_order<S: ScreenModel>(
    screen: &mut S,
    backwards: bool,
    time: Timestamp,
) -> Result<(), S::Error> {
    screen.activate_next_in_stacking_order(backwards, time)
}

/// Switch to the workspace `delta` steps away from the active one,
/// wrapping around the ends of the workspace list.
///
/// Returns the index switched to, or `None` when nothing happened.
pub fn change_active_workspace_by_delta<S: ScreenModel>(
    screen: &mut S,
    delta: i32,
    carry: Carry,
    time: Timestamp,
) -> Result<Option<usize>, S::Error> {
    let workspaces = screen.workspaces();
    let Some(active) = screen.active_workspace() else {
        debug!("no active workspace, nothing to switch from");
        return Ok(None);
    };
    let Some(index) = workspaces.iter().position(|&ws| ws == active) else {
        warn!("active {} is not listed", active);
        return Ok(None);
    };
    let target = wrap_index(index, delta, workspaces.len());
    if target == index {
        return Ok(None);
    }
    screen.switch_workspace(target, carry, time)?;
    Ok(Some(target))
}

/// Switch directly to the workspace at `index`.  Out-of-range indices are
/// ignored.
pub fn change_active_workspace<S: ScreenModel>(
    screen: &mut S,
    index: usize,
    carry: Carry,
    time: Timestamp,
) -> Result<bool, S::Error> {
    let count = screen.workspaces().len();
    if index >= count {
        debug!("workspace index {} out of range (have {})", index, count);
        return Ok(false);
    }
    screen.switch_workspace(index, carry, time)?;
    Ok(true)
}

/// Activate the next window across all workspaces.
pub fn activate_next_window<S: ScreenModel>(
    screen: &mut S,
    backwards: bool,
    time: Timestamp,
) -> Result<(), S::Error> {
    screen.activate_next_window(backwards, time)
}

//  Tests
