//! Deferred completion of "new workspace".
//!
//! Asking the service for one more workspace does not hand back the new
//! workspace: it only shows up later, through a
//! [`ScreenEvent::WorkspaceCreated`](crate::traits::ScreenEvent::WorkspaceCreated)
//! notification on a later turn of the event loop.  [`PendingWorkspace`]
//! remembers what the user asked for (which windows to bring, and the
//! input timestamp) and finishes the job when that notification arrives.
//!
//! The controller is either idle (`pending() == None`) or holds exactly one
//! [`PendingCreation`].

use crate::action::Carry;
use crate::config::WorkspaceConfig;
use crate::traits::{ScreenModel, Timestamp, WorkspaceId};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// What to do with a "new workspace" request that arrives while another is
/// still waiting for its workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConcurrentRequestPolicy {
    /// Drop the new request; the first one completes as asked.
    #[default]
    Reject,
    /// Keep waiting for the workspace already requested, but complete it
    /// with the new request's carry and timestamp.
    Replace,
}

/// A workspace has been requested and not yet confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCreation {
    pub carry: Carry,
    pub time: Timestamp,
    requested_at: Instant,
}

impl PendingCreation {
    pub fn requested_at(&self) -> Instant {
        self.requested_at
    }
}

/// Result of [`PendingWorkspace::request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// The count increase went out; completion is now pending.
    Issued,
    /// An earlier request is still pending and now carries these
    /// parameters instead.
    Replaced,
    /// Nothing happened.
    Rejected(Rejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    AtCapacity,
    AlreadyPending,
}

/// Result of [`PendingWorkspace::on_workspace_created`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// No request was pending; the notification was not ours.
    Ignored,
    /// The pending request finished and the new workspace is active.
    Completed { workspace: WorkspaceId, carry: Carry },
}

/// The deferred-completion state machine.
#[derive(Debug, Clone)]
pub struct PendingWorkspace {
    pending: Option<PendingCreation>,
    max_workspaces: usize,
    timeout: Option<Duration>,
    policy: ConcurrentRequestPolicy,
}

impl PendingWorkspace {
    pub fn new(config: &WorkspaceConfig) -> Self {
        Self {
            pending: None,
            max_workspaces: config.max_workspaces,
            timeout: config.pending_timeout(),
            policy: config.on_concurrent_request,
        }
    }

    pub fn pending(&self) -> Option<&PendingCreation> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Ask `screen` for one more workspace and remember `carry` / `time`
    /// for when it arrives.
    pub fn request<S: ScreenModel>(
        &mut self,
        screen: &mut S,
        carry: Carry,
        time: Timestamp,
        now: Instant,
    ) -> Result<Request, S::Error> {
        self.expire(now);

        if let Some(pending) = &mut self.pending {
            return Ok(match self.policy {
                ConcurrentRequestPolicy::Reject => {
                    warn!("new workspace already pending, ignoring request");
                    Request::Rejected(Rejection::AlreadyPending)
                }
                ConcurrentRequestPolicy::Replace => {
                    debug!("replacing pending new-workspace request");
                    pending.carry = carry;
                    pending.time = time;
                    Request::Replaced
                }
            });
        }

        let count = screen.workspace_count();
        if count >= self.max_workspaces {
            debug!("already at {} workspaces, not adding another", count);
            return Ok(Request::Rejected(Rejection::AtCapacity));
        }

        info!("requesting workspace {} (bring {})", count + 1, carry);
        screen.change_workspace_count(count + 1)?;
        self.pending = Some(PendingCreation {
            carry,
            time,
            requested_at: now,
        });
        Ok(Request::Issued)
    }

    /// Finish a pending request now that `created` exists.
    ///
    /// Windows are taken from the workspace that is active at this point,
    /// which is still the one the request was made from.  The controller is
    /// idle afterwards even if a mutation fails.
    pub fn on_workspace_created<S: ScreenModel>(
        &mut self,
        screen: &mut S,
        created: WorkspaceId,
        now: Instant,
    ) -> Result<Completion, S::Error> {
        self.expire(now);

        let Some(pending) = self.pending.take() else {
            return Ok(Completion::Ignored);
        };

        match pending.carry {
            Carry::AllWindows => {
                if let Some(active) = screen.active_workspace() {
                    for window in screen.windows(active) {
                        screen.move_window_to_workspace(window, created)?;
                    }
                }
            }
            Carry::ActiveWindow => {
                if let Some(window) = screen.active_window() {
                    screen.move_window_to_workspace(window, created)?;
                }
            }
            Carry::Nothing => {}
        }
        screen.activate_workspace(created, pending.time)?;

        info!("completed new workspace {}", created);
        Ok(Completion::Completed {
            workspace: created,
            carry: pending.carry,
        })
    }

    /// Drop a request that has waited longer than the configured timeout.
    fn expire(&mut self, now: Instant) {
        let (Some(timeout), Some(pending)) = (self.timeout, &self.pending) else {
            return;
        };
        if now.saturating_duration_since(pending.requested_at) >= timeout {
            warn!(
                "new-workspace request timed out after {:?}, dropping it",
                timeout
            );
            self.pending = None;
        }
    }
}

//  Tests
