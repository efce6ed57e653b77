//! Incremental search over window titles.
//!
//! The query grows one character at a time and shrinks with backspace.
//! After each change the [`ScreenModel`] recomputes its matches and
//! reports how many there are; matching semantics are the model's.

use crate::traits::ScreenModel;
use log::debug;

/// The query typed so far and how many windows it matches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchState {
    query: String,
    match_count: usize,
}

impl SearchState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn match_count(&self) -> usize {
        self.match_count
    }

    /// `"(1 match)"` or `"(N matches)"`.
    pub fn summary(&self) -> String {
        match_summary(self.match_count)
    }

    fn refresh<S: ScreenModel>(&mut self, screen: &mut S) {
        self.match_count = screen.update_search(&self.query);
        debug!("search {:?}: {} match(es)", self.query, self.match_count);
    }
}

pub fn match_summary(n: usize) -> String {
    if n == 1 {
        "(1 match)".to_string()
    } else {
        format!("({} matches)", n)
    }
}

/// Whether a character opened the search session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Append {
    /// First character: the session was created.
    Opened,
    Extended,
}

/// Owns the optional search session.  No session exists until the first
/// character is typed.
#[derive(Debug, Default)]
pub struct SearchMatcher {
    session: Option<SearchState>,
}

impl SearchMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Option<&SearchState> {
        self.session.as_ref()
    }

    /// Append `c`, creating the session if needed, and recount matches.
    pub fn append_character<S: ScreenModel>(&mut self, screen: &mut S, c: char) -> Append {
        let opened = self.session.is_none();
        let state = self.session.get_or_insert_with(SearchState::default);
        state.query.push(c);
        state.refresh(screen);
        if opened {
            Append::Opened
        } else {
            Append::Extended
        }
    }

    /// Drop the last character and recount.  Returns `false` when there is
    /// no session to edit.
    pub fn backspace<S: ScreenModel>(&mut self, screen: &mut S) -> bool {
        let Some(state) = &mut self.session else {
            return false;
        };
        state.query.pop();
        state.refresh(screen);
        true
    }
}
