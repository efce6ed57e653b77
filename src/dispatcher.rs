//! The action dispatcher: the one context object that owns everything a
//! switcher session needs.
//!
//! [`Dispatcher`] owns the [`ScreenModel`], its notification
//! [`Subscription`], the [`Keymap`], the deferred-completion controller and
//! the search session.  Nothing is process-global; dropping the dispatcher
//! (or calling [`close`](Dispatcher::close)) releases the subscription.
//!
//! Work happens on the caller's turn of the event loop:
//!
//! * [`handle_input`](Dispatcher::handle_input) /
//!   [`dispatch`](Dispatcher::dispatch) for user intent,
//! * [`pump_events`](Dispatcher::pump_events) for queued screen
//!   notifications, which is where a pending workspace creation completes.

use crate::action::{Action, WorkspaceTarget};
use crate::compactor::{self, CompactionMode};
use crate::config::Config;
use crate::input::{InputEvent, Keymap};
use crate::navigator::{self, Navigation};
use crate::pending::{Completion, PendingCreation, PendingWorkspace, Request};
use crate::search::{Append, SearchMatcher, SearchState};
use crate::traits::{OverlayEvent, ScreenEvent, ScreenModel, Subscription, Timestamp, WindowId};
use log::{debug, info};
use std::sync::mpsc;
use std::time::Instant;

/// Possible errors from the dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The screen model rejected a request.
    #[error("screen model error: {0}")]
    Screen(String),
}

fn screen_error<E: std::error::Error>(e: E) -> DispatchError {
    DispatchError::Screen(e.to_string())
}

/// See the [module docs](self).
pub struct Dispatcher<S: ScreenModel> {
    screen: S,
    subscription: Subscription,
    keymap: Keymap,
    pending: PendingWorkspace,
    search: SearchMatcher,
    overlay_tx: Option<mpsc::Sender<OverlayEvent>>,
}

impl<S: ScreenModel> Dispatcher<S> {
    /// Start a session on `screen`.
    ///
    /// The model's search is reset to the empty query and the dispatcher
    /// subscribes to its notifications.
    pub fn new(mut screen: S, config: &Config) -> Self {
        screen.update_search("");
        let subscription = screen.subscribe();
        Self {
            screen,
            subscription,
            keymap: Keymap::default().with_overrides(&config.bindings),
            pending: PendingWorkspace::new(&config.workspaces),
            search: SearchMatcher::new(),
            overlay_tx: None,
        }
    }

    /// Attach an overlay channel.
    ///
    /// The dispatcher will send [`OverlayEvent::Redraw`] whenever the
    /// overlay is stale, and the search events when the query changes.
    /// The receiver may be a renderer, a logger, a test, …
    pub fn set_overlay(&mut self, tx: mpsc::Sender<OverlayEvent>) {
        self.overlay_tx = Some(tx);
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut S {
        &mut self.screen
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// The search session, if a character has been typed.
    pub fn search(&self) -> Option<&SearchState> {
        self.search.state()
    }

    /// The workspace creation waiting for confirmation, if any.
    pub fn pending(&self) -> Option<&PendingCreation> {
        self.pending.pending()
    }

    /// Translate a raw input event and dispatch the resulting action.
    /// Events without a binding are ignored.
    pub fn handle_input(&mut self, event: &InputEvent) -> Result<(), DispatchError> {
        match self.keymap.translate(event) {
            Some(action) => self.dispatch(action, event.time()),
            None => {
                debug!("no action for {:?}", event);
                Ok(())
            }
        }
    }

    /// Perform `action`.  `time` is the timestamp of the input that
    /// caused it.
    pub fn dispatch(&mut self, action: Action, time: Timestamp) -> Result<(), DispatchError> {
        debug!("dispatch {:?} @{}", action, time);
        match action {
            Action::MoveWindow {
                step,
                reorder,
                warp_pointer,
            } => {
                let nav = navigator::activate_window_by_delta(
                    &mut self.screen,
                    step.delta(),
                    reorder,
                    warp_pointer,
                    time,
                )
                .map_err(screen_error)?;
                // Activation changes are announced by the model; a reorder
                // is not.
                if let Navigation::Reordered { .. } = nav {
                    self.send_overlay(OverlayEvent::Redraw);
                }
            }

            Action::CycleStackingOrder { backwards } => {
                navigator::activate_window_by_stacking_order(&mut self.screen, backwards, time)
                    .map_err(screen_error)?;
            }

            Action::MoveWorkspace { target, carry } => match target {
                WorkspaceTarget::Relative(delta) => {
                    navigator::change_active_workspace_by_delta(&mut self.screen, delta, carry, time)
                        .map_err(screen_error)?;
                }
                WorkspaceTarget::Index(index) => {
                    navigator::change_active_workspace(&mut self.screen, index, carry, time)
                        .map_err(screen_error)?;
                }
            },

            Action::NewWorkspace { carry } => {
                let request = self
                    .pending
                    .request(&mut self.screen, carry, time, Instant::now())
                    .map_err(screen_error)?;
                if let Request::Rejected(reason) = request {
                    debug!("new workspace not requested: {:?}", reason);
                }
            }

            Action::DeleteWorkspaceIfEmpty { all_empty } => {
                let mode = if all_empty {
                    CompactionMode::AllEmpty
                } else {
                    CompactionMode::ActiveIfEmpty
                };
                let plan =
                    compactor::compact(&mut self.screen, mode, time).map_err(screen_error)?;
                if !plan.is_noop() {
                    self.send_overlay(OverlayEvent::Redraw);
                }
            }

            Action::CloseWindow { all_in_workspace } => {
                for window in self.targets(all_in_workspace) {
                    info!("closing {}", window);
                    self.screen
                        .close_window(window, time)
                        .map_err(screen_error)?;
                }
            }

            Action::ToggleMaximize { all_in_workspace } => {
                let targets = self.targets(all_in_workspace);
                let maximize = !targets.iter().all(|&w| self.screen.is_maximized(w));
                for window in targets {
                    self.screen
                        .set_maximized(window, maximize)
                        .map_err(screen_error)?;
                }
            }

            Action::ToggleMinimize { all_in_workspace } => {
                let targets = self.targets(all_in_workspace);
                let minimize = !targets.iter().all(|&w| self.screen.is_minimized(w));
                for window in targets {
                    self.screen
                        .set_minimized(window, minimize, time)
                        .map_err(screen_error)?;
                }
            }

            Action::ActivateNextGlobal { backwards } => {
                navigator::activate_next_window(&mut self.screen, backwards, time)
                    .map_err(screen_error)?;
            }

            Action::SwitchDisplayHead => match self.screen.active_window() {
                Some(window) => {
                    self.screen
                        .move_window_to_next_display(window)
                        .map_err(screen_error)?;
                }
                None => debug!("no active window to move to the next display"),
            },

            Action::SearchAppend(c) => {
                if self.search.append_character(&mut self.screen, c) == Append::Opened {
                    self.send_overlay(OverlayEvent::SearchOpened);
                    self.send_overlay(OverlayEvent::Redraw);
                }
                self.search_changed();
            }

            Action::SearchBackspace => {
                if self.search.backspace(&mut self.screen) {
                    self.search_changed();
                }
            }
        }
        Ok(())
    }

    /// Handle every notification queued since the last call.
    ///
    /// All queued notifications are handled even if one fails; the first
    /// error is returned.
    pub fn pump_events(&mut self) -> Result<(), DispatchError> {
        let events: Vec<ScreenEvent> = self.subscription.drain().collect();
        let mut result = Ok(());
        for event in events {
            if let Err(e) = self.handle_screen_event(event) {
                if result.is_ok() {
                    result = Err(e);
                }
            }
        }
        result
    }

    /// React to one screen notification.
    pub fn handle_screen_event(&mut self, event: ScreenEvent) -> Result<(), DispatchError> {
        match event {
            ScreenEvent::ActiveWindowChanged
            | ScreenEvent::ActiveWorkspaceChanged
            | ScreenEvent::WindowOpened(_) => self.send_overlay(OverlayEvent::Redraw),
            ScreenEvent::WorkspaceCreated(workspace) => {
                let completion = self
                    .pending
                    .on_workspace_created(&mut self.screen, workspace, Instant::now())
                    .map_err(screen_error)?;
                match completion {
                    Completion::Completed { .. } => self.send_overlay(OverlayEvent::Redraw),
                    Completion::Ignored => debug!("{} created, nothing pending", workspace),
                }
            }
            ScreenEvent::WindowClosed(_) | ScreenEvent::WorkspaceDestroyed(_) => {}
        }
        Ok(())
    }

    /// End the session: persist the stacking order observed during it and
    /// hand the model back.  The subscription is released.
    pub fn close(self) -> S {
        let Self {
            mut screen,
            subscription,
            ..
        } = self;
        drop(subscription);
        screen.commit_stacking_order();
        screen
    }

    //  Helpers

    /// The active window, or with `all` every window of the active
    /// workspace.  Collected up front so mutations never run mid-scan.
    fn targets(&self, all: bool) -> Vec<WindowId> {
        let targets: Vec<WindowId> = if all {
            self.screen
                .active_workspace()
                .map(|ws| self.screen.windows(ws))
                .unwrap_or_default()
        } else {
            self.screen.active_window().into_iter().collect()
        };
        if targets.is_empty() {
            debug!("no target windows");
        }
        targets
    }

    fn search_changed(&mut self) {
        if let Some(state) = self.search.state() {
            let event = OverlayEvent::SearchChanged {
                query: state.query().to_string(),
                matches: state.match_count(),
                summary: state.summary(),
            };
            self.send_overlay(event);
        }
    }

    fn send_overlay(&self, event: OverlayEvent) {
        if let Some(tx) = &self.overlay_tx {
            let _ = tx.send(event);
        }
    }
}

//  Tests
