//! Workspace compaction.
//!
//! The window-management service can only change the *number* of
//! workspaces, always adding or removing at the end.  To make it look as
//! if a particular workspace was deleted, windows behind the gap are moved
//! forward first and the count is shrunk afterwards.
//!
//! Compaction runs in two strictly separated phases:
//!
//! 1. [`plan`] scans an immutable [`Layout`] snapshot and returns a
//!    [`CompactionPlan`]: an ordered list of [`WindowMove`]s, an optional
//!    workspace to re-activate, and the number of workspaces to drop.
//! 2. [`execute`] applies the plan: all moves, then the re-activation,
//!    then the count change.
//!
//! The live workspace and window lists are never mutated while they are
//! being scanned.

use crate::traits::{ScreenModel, Timestamp, WindowId, WorkspaceId};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Which workspaces qualify for deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompactionMode {
    /// Only the active workspace, and only when it has no windows.
    ActiveIfEmpty,
    /// Every workspace without windows.
    AllEmpty,
}

/// One workspace and its windows at capture time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSnapshot {
    pub id: WorkspaceId,
    pub windows: Vec<WindowId>,
}

/// A frozen copy of the screen's workspace structure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Layout {
    pub workspaces: Vec<WorkspaceSnapshot>,
    pub active: Option<WorkspaceId>,
}

impl Layout {
    /// Copy the current workspace/window structure out of `screen`.
    pub fn capture<S: ScreenModel>(screen: &S) -> Self {
        let workspaces = screen
            .workspaces()
            .into_iter()
            .map(|id| WorkspaceSnapshot {
                id,
                windows: screen.windows(id),
            })
            .collect();
        Self {
            workspaces,
            active: screen.active_workspace(),
        }
    }

    fn position(&self, workspace: WorkspaceId) -> Option<usize> {
        self.workspaces.iter().position(|ws| ws.id == workspace)
    }
}

/// Move `window` into `destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowMove {
    pub window: WindowId,
    pub destination: WorkspaceId,
}

/// The outcome of [`plan`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompactionPlan {
    moves: Vec<WindowMove>,
    activate: Option<WorkspaceId>,
    deletions: usize,
}

impl CompactionPlan {
    /// Moves, in the order they must be applied.
    pub fn moves(&self) -> &[WindowMove] {
        &self.moves
    }

    /// Workspace to activate after the moves so the view stays put.
    pub fn activate(&self) -> Option<WorkspaceId> {
        self.activate
    }

    /// How many workspaces to drop from the end.
    pub fn deletions(&self) -> usize {
        self.deletions
    }

    /// A plan without deletions does nothing at all.
    pub fn is_noop(&self) -> bool {
        self.deletions == 0
    }
}

/// Compute what has to happen to delete the workspaces selected by `mode`.
pub fn plan(layout: &Layout, mode: CompactionMode) -> CompactionPlan {
    match mode {
        CompactionMode::AllEmpty => plan_all_empty(layout),
        CompactionMode::ActiveIfEmpty => plan_active_if_empty(layout),
    }
}

/// Slide every non-empty workspace forward into the earliest slot not yet
/// taken.  The k-th non-empty workspace ends up at index k.
fn plan_all_empty(layout: &Layout) -> CompactionPlan {
    let mut moves = Vec::new();
    let mut deletions = 0;
    let mut slot = 0;
    let mut active_slot = None;

    for (index, ws) in layout.workspaces.iter().enumerate() {
        if Some(ws.id) == layout.active {
            active_slot = Some(slot);
        }
        if ws.windows.is_empty() {
            deletions += 1;
            continue;
        }
        if slot != index {
            let destination = layout.workspaces[slot].id;
            moves.extend(ws.windows.iter().map(|&window| WindowMove {
                window,
                destination,
            }));
        }
        slot += 1;
    }

    // Survivors are the first `slot` workspaces (at least one).  The
    // active workspace's content now lives at `active_slot`, or, if it was
    // empty, at the survivor that took its place.
    let kept = slot.max(1);
    let activate = active_slot
        .map(|s| s.min(kept - 1))
        .filter(|&s| Some(s) != layout.active.and_then(|a| layout.position(a)))
        .map(|s| layout.workspaces[s].id);

    CompactionPlan {
        moves,
        activate,
        deletions,
    }
}

/// Delete the active workspace if it is empty by shifting every later
/// workspace's windows one workspace back.
fn plan_active_if_empty(layout: &Layout) -> CompactionPlan {
    let Some(active) = layout.active else {
        return CompactionPlan::default();
    };
    let Some(start) = layout.position(active) else {
        return CompactionPlan::default();
    };
    if !layout.workspaces[start].windows.is_empty() {
        return CompactionPlan::default();
    }

    let moves = layout
        .workspaces
        .windows(2)
        .skip(start)
        .flat_map(|pair| {
            let destination = pair[0].id;
            pair[1].windows.iter().map(move |&window| WindowMove {
                window,
                destination,
            })
        })
        .collect();

    CompactionPlan {
        moves,
        activate: None,
        deletions: 1,
    }
}

/// Apply `plan` to `screen`.
///
/// Order: every move, then the re-activation, then one count change.  The
/// count never drops below one, and a plan without deletions touches
/// nothing.
pub fn execute<S: ScreenModel>(
    screen: &mut S,
    plan: &CompactionPlan,
    time: Timestamp,
) -> Result<(), S::Error> {
    if plan.is_noop() {
        debug!("no workspace qualifies for deletion");
        return Ok(());
    }

    for mv in plan.moves() {
        screen.move_window_to_workspace(mv.window, mv.destination)?;
    }

    if let Some(workspace) = plan.activate() {
        screen.activate_workspace(workspace, time)?;
    }

    let current = screen.workspace_count();
    let target = current.saturating_sub(plan.deletions()).max(1);
    if target != current {
        info!("shrinking workspaces {} -> {}", current, target);
        screen.change_workspace_count(target)?;
    }
    Ok(())
}

/// Snapshot `screen`, plan, and execute in one go.  Returns the plan that
/// was applied.
pub fn compact<S: ScreenModel>(
    screen: &mut S,
    mode: CompactionMode,
    time: Timestamp,
) -> Result<CompactionPlan, S::Error> {
    let plan = plan(&Layout::capture(screen), mode);
    debug!(
        "compaction {:?}: {} move(s), activate {:?}, {} deletion(s)",
        mode,
        plan.moves().len(),
        plan.activate(),
        plan.deletions()
    );
    execute(screen, &plan, time)?;
    Ok(plan)
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::memory::{MemoryScreen, Mutation};

    fn ws(id: u64, windows: &[u64]) -> WorkspaceSnapshot {
        WorkspaceSnapshot {
            id: WorkspaceId(id),
            windows: windows.iter().map(|&w| WindowId(w)).collect(),
        }
    }

    fn layout(workspaces: Vec<WorkspaceSnapshot>, active: Option<u64>) -> Layout {
        Layout {
            workspaces,
            active: active.map(WorkspaceId),
        }
    }

    fn mv(window: u64, destination: u64) -> WindowMove {
        WindowMove {
            window: WindowId(window),
            destination: WorkspaceId(destination),
        }
    }

    //  Planner (pure)

    #[test]
    fn all_empty_trailing_gap_needs_no_moves() {
        // [A], [B, C], []
        let l = layout(vec![ws(1, &[10]), ws(2, &[20, 21]), ws(3, &[])], Some(1));
        let p = plan(&l, CompactionMode::AllEmpty);
        assert!(p.moves().is_empty());
        assert_eq!(p.deletions(), 1);
        assert_eq!(p.activate(), None);
    }

    #[test]
    fn all_empty_slides_windows_into_earliest_gap() {
        // [], [A], [], [B, C]
        let l = layout(
            vec![ws(1, &[]), ws(2, &[10]), ws(3, &[]), ws(4, &[20, 21])],
            Some(2),
        );
        let p = plan(&l, CompactionMode::AllEmpty);
        assert_eq!(p.moves(), &[mv(10, 1), mv(20, 2), mv(21, 2)]);
        assert_eq!(p.deletions(), 2);
        // The active workspace's windows now live in workspace 1.
        assert_eq!(p.activate(), Some(WorkspaceId(1)));
    }

    #[test]
    fn all_empty_never_moves_into_deleted_workspace() {
        let l = layout(
            vec![
                ws(1, &[]),
                ws(2, &[]),
                ws(3, &[30]),
                ws(4, &[]),
                ws(5, &[50, 51]),
                ws(6, &[]),
            ],
            Some(4),
        );
        let p = plan(&l, CompactionMode::AllEmpty);
        let kept = l.workspaces.len() - p.deletions();
        let survivors: Vec<WorkspaceId> = l.workspaces[..kept].iter().map(|w| w.id).collect();
        for m in p.moves() {
            assert!(survivors.contains(&m.destination), "{:?} targets a deleted workspace", m);
        }
        assert_eq!(p.moves(), &[mv(30, 1), mv(50, 2), mv(51, 2)]);
    }

    #[test]
    fn all_empty_active_empty_workspace_maps_to_following_survivor() {
        // [A], [] (active), [B]  →  [A], [B]; stay on the slot B slid into.
        let l = layout(vec![ws(1, &[10]), ws(2, &[]), ws(3, &[30])], Some(2));
        let p = plan(&l, CompactionMode::AllEmpty);
        assert_eq!(p.moves(), &[mv(30, 2)]);
        assert_eq!(p.activate(), None);
    }

    #[test]
    fn all_empty_active_trailing_gap_clamps_to_last_survivor() {
        // [A], [B], [] (active)  →  the active slot disappears.
        let l = layout(vec![ws(1, &[10]), ws(2, &[20]), ws(3, &[])], Some(3));
        let p = plan(&l, CompactionMode::AllEmpty);
        assert!(p.moves().is_empty());
        assert_eq!(p.activate(), Some(WorkspaceId(2)));
    }

    #[test]
    fn all_empty_everything_empty_keeps_first() {
        let l = layout(vec![ws(1, &[]), ws(2, &[]), ws(3, &[])], Some(3));
        let p = plan(&l, CompactionMode::AllEmpty);
        assert!(p.moves().is_empty());
        assert_eq!(p.deletions(), 3);
        assert_eq!(p.activate(), Some(WorkspaceId(1)));
    }

    #[test]
    fn all_empty_with_nothing_empty_is_noop() {
        let l = layout(vec![ws(1, &[10]), ws(2, &[20])], Some(1));
        let p = plan(&l, CompactionMode::AllEmpty);
        assert!(p.is_noop());
        assert!(p.moves().is_empty());
    }

    #[test]
    fn active_if_empty_requires_active_workspace() {
        let l = layout(vec![ws(1, &[]), ws(2, &[])], None);
        assert!(plan(&l, CompactionMode::ActiveIfEmpty).is_noop());
    }

    #[test]
    fn active_if_empty_ignores_empty_siblings() {
        // Active workspace has a window; its empty neighbours do not count.
        let l = layout(vec![ws(1, &[]), ws(2, &[20]), ws(3, &[])], Some(2));
        assert!(plan(&l, CompactionMode::ActiveIfEmpty).is_noop());
    }

    #[test]
    fn active_if_empty_shifts_later_workspaces_back() {
        // [A], [] (active), [B], [C, D]
        let l = layout(
            vec![ws(1, &[10]), ws(2, &[]), ws(3, &[30]), ws(4, &[40, 41])],
            Some(2),
        );
        let p = plan(&l, CompactionMode::ActiveIfEmpty);
        assert_eq!(p.moves(), &[mv(30, 2), mv(40, 3), mv(41, 3)]);
        assert_eq!(p.deletions(), 1);
        assert_eq!(p.activate(), None);
    }

    #[test]
    fn active_if_empty_last_workspace_just_deletes() {
        let l = layout(vec![ws(1, &[10]), ws(2, &[])], Some(2));
        let p = plan(&l, CompactionMode::ActiveIfEmpty);
        assert!(p.moves().is_empty());
        assert_eq!(p.deletions(), 1);
    }

    //  Execution

    #[test]
    fn execute_orders_moves_activation_then_count() {
        let mut s = MemoryScreen::new(4);
        let a = s.open_window(1, "a");
        let b = s.open_window(3, "b");
        let ids = s.workspaces();
        s.activate_workspace(ids[1], 0).unwrap();
        s.clear_journal();

        let p = compact(&mut s, CompactionMode::AllEmpty, 77).unwrap();
        assert_eq!(p.deletions(), 2);
        assert_eq!(
            s.journal(),
            &[
                Mutation::MoveWindow {
                    window: a,
                    workspace: ids[0],
                },
                Mutation::MoveWindow {
                    window: b,
                    workspace: ids[1],
                },
                Mutation::ActivateWorkspace { workspace: ids[0] },
                Mutation::ChangeWorkspaceCount { count: 2 },
            ]
        );

        s.settle();
        assert_eq!(s.workspace_count(), 2);
        assert_eq!(s.windows(ids[0]), vec![a]);
        assert_eq!(s.windows(ids[1]), vec![b]);
        assert_eq!(s.active_workspace(), Some(ids[0]));
    }

    #[test]
    fn scenario_trailing_empty_workspace_is_dropped() {
        let mut s = MemoryScreen::new(3);
        let a = s.open_window(0, "A");
        let b = s.open_window(1, "B");
        let c = s.open_window(1, "C");
        let ids = s.workspaces();
        s.clear_journal();

        compact(&mut s, CompactionMode::AllEmpty, 1).unwrap();
        assert_eq!(s.journal(), &[Mutation::ChangeWorkspaceCount { count: 2 }]);
        s.settle();
        assert_eq!(s.workspace_count(), 2);
        assert_eq!(s.windows(ids[0]), vec![a]);
        assert_eq!(s.windows(ids[1]), vec![b, c]);
    }

    #[test]
    fn execute_noop_plan_touches_nothing() {
        let mut s = MemoryScreen::new(2);
        s.open_window(0, "a");
        s.open_window(1, "b");
        s.clear_journal();
        compact(&mut s, CompactionMode::AllEmpty, 1).unwrap();
        compact(&mut s, CompactionMode::ActiveIfEmpty, 1).unwrap();
        assert!(s.journal().is_empty());
    }

    #[test]
    fn execute_never_shrinks_below_one() {
        let mut s = MemoryScreen::new(3);
        compact(&mut s, CompactionMode::AllEmpty, 1).unwrap();
        assert!(s
            .journal()
            .contains(&Mutation::ChangeWorkspaceCount { count: 1 }));

        let mut s = MemoryScreen::new(1);
        compact(&mut s, CompactionMode::ActiveIfEmpty, 1).unwrap();
        assert!(s.journal().is_empty());
    }

    #[test]
    fn active_if_empty_end_to_end() {
        let mut s = MemoryScreen::new(3);
        let ids = s.workspaces();
        let w = s.open_window(2, "late");
        s.activate_workspace(ids[1], 0).unwrap();

        compact(&mut s, CompactionMode::ActiveIfEmpty, 1).unwrap();
        s.settle();
        assert_eq!(s.workspace_count(), 2);
        assert_eq!(s.windows(ids[1]), vec![w]);
        assert_eq!(s.active_workspace(), Some(ids[1]));
    }
}
