//! Raw input and its translation into [`Action`]s.
//!
//! A [`Keymap`] maps a [`Key`] to a [`Binding`]; the binding plus the
//! event's [`Modifiers`] yields exactly one [`Action`].  Keys without a
//! binding that carry a printable character become
//! [`Action::SearchAppend`].  Scroll events have a fixed translation.
//!
//! Key names on the wire and in the config are case-insensitive and accept
//! `-`/`_` separators (`"page-up"`, `"PageUp"`, `"kp_enter"`).  A single
//! character names the printable key itself.

use crate::action::{Action, Carry, Step, WorkspaceTarget};
use crate::traits::Timestamp;
use bitflags::bitflags;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

bitflags! {
    /// Modifier keys held while the input happened.
    ///
    /// Serialized as text, e.g. `"SHIFT | CONTROL"`.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Modifiers: u8 {
        const SHIFT   = 0b01;
        const CONTROL = 0b10;
    }
}

impl Modifiers {
    pub fn shift(self) -> bool {
        self.contains(Modifiers::SHIFT)
    }

    pub fn control(self) -> bool {
        self.contains(Modifiers::CONTROL)
    }
}

/// A key symbol, as far as the switcher distinguishes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    KpLeft,
    KpRight,
    KpUp,
    KpDown,
    PageUp,
    PageDown,
    KpPageUp,
    KpPageDown,
    Insert,
    KpInsert,
    Delete,
    KpDelete,
    Tab,
    Escape,
    /// Function key `F1` … `F35`.
    F(u8),
    SuperL,
    SuperR,
    Return,
    IsoEnter,
    KpEnter,
    BackSpace,
    /// A key that produces this printable character.
    Char(char),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Left => write!(f, "left"),
            Key::Right => write!(f, "right"),
            Key::Up => write!(f, "up"),
            Key::Down => write!(f, "down"),
            Key::KpLeft => write!(f, "kp-left"),
            Key::KpRight => write!(f, "kp-right"),
            Key::KpUp => write!(f, "kp-up"),
            Key::KpDown => write!(f, "kp-down"),
            Key::PageUp => write!(f, "page-up"),
            Key::PageDown => write!(f, "page-down"),
            Key::KpPageUp => write!(f, "kp-page-up"),
            Key::KpPageDown => write!(f, "kp-page-down"),
            Key::Insert => write!(f, "insert"),
            Key::KpInsert => write!(f, "kp-insert"),
            Key::Delete => write!(f, "delete"),
            Key::KpDelete => write!(f, "kp-delete"),
            Key::Tab => write!(f, "tab"),
            Key::Escape => write!(f, "escape"),
            Key::F(n) => write!(f, "f{}", n),
            Key::SuperL => write!(f, "super-l"),
            Key::SuperR => write!(f, "super-r"),
            Key::Return => write!(f, "return"),
            Key::IsoEnter => write!(f, "iso-enter"),
            Key::KpEnter => write!(f, "kp-enter"),
            Key::BackSpace => write!(f, "backspace"),
            Key::Char(' ') => write!(f, "space"),
            Key::Char(c) => write!(f, "{}", c),
        }
    }
}

/// Parse a key name.  See the module docs for the accepted forms.
pub fn parse_key(s: &str) -> Option<Key> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return (!c.is_control()).then_some(Key::Char(c));
    }

    let normalized: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(|c| c.to_lowercase())
        .collect();
    let key = match normalized.as_str() {
        "left" => Key::Left,
        "right" => Key::Right,
        "up" => Key::Up,
        "down" => Key::Down,
        "kpleft" => Key::KpLeft,
        "kpright" => Key::KpRight,
        "kpup" => Key::KpUp,
        "kpdown" => Key::KpDown,
        "pageup" | "prior" => Key::PageUp,
        "pagedown" | "next" => Key::PageDown,
        "kppageup" | "kpprior" => Key::KpPageUp,
        "kppagedown" | "kpnext" => Key::KpPageDown,
        "insert" => Key::Insert,
        "kpinsert" => Key::KpInsert,
        "delete" => Key::Delete,
        "kpdelete" => Key::KpDelete,
        "tab" => Key::Tab,
        "escape" | "esc" => Key::Escape,
        "superl" => Key::SuperL,
        "superr" => Key::SuperR,
        "return" | "enter" => Key::Return,
        "isoenter" => Key::IsoEnter,
        "kpenter" => Key::KpEnter,
        "backspace" => Key::BackSpace,
        "space" => Key::Char(' '),
        other => {
            let n: u8 = other.strip_prefix('f')?.parse().ok()?;
            if !(1..=35).contains(&n) {
                return None;
            }
            Key::F(n)
        }
    };
    Some(key)
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_key(&s).ok_or_else(|| DeError::custom(format!("invalid key: {:?}", s)))
    }
}

/// Scroll wheel / touchpad scroll direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyEvent {
    pub key: Key,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollEvent {
    pub direction: ScrollDirection,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub time: Timestamp,
}

/// A raw input event delivered by an
/// [`InputSource`](crate::traits::InputSource).
///
/// On the wire:
///
/// ```json
/// {"Key":{"key":"left","modifiers":"SHIFT","time":1200}}
/// {"Scroll":{"direction":"down","time":1201}}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    Key(KeyEvent),
    Scroll(ScrollEvent),
}

impl InputEvent {
    pub fn time(&self) -> Timestamp {
        match self {
            InputEvent::Key(k) => k.time,
            InputEvent::Scroll(s) => s.time,
        }
    }
}

/// What a bound key does.  The event's modifiers fill in the details when
/// the binding is turned into an [`Action`].
///
/// In the config file bindings are kebab-case strings, except
/// `{"workspace": N}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Binding {
    /// Shift brings the active window, control brings all windows.
    WorkspacePrevious,
    WorkspaceNext,
    /// Jump to the workspace at this 0-based index.
    Workspace(usize),
    /// Shift reorders instead of activating.
    WindowPrevious,
    WindowNext,
    /// Control applies to every window in the workspace.
    ToggleMaximize,
    ToggleMinimize,
    NewWorkspace,
    /// Shift or control deletes every empty workspace.
    DeleteWorkspace,
    /// Shift cycles backwards.
    CycleStackingOrder,
    CloseWindow,
    SwitchDisplayHead,
    ActivateNext,
    SearchBackspace,
    /// Removes a default binding.
    Unbound,
}

impl Binding {
    /// Turn the binding into an action under `mods`.
    pub fn action(self, mods: Modifiers) -> Option<Action> {
        let (shift, ctrl) = (mods.shift(), mods.control());
        let action = match self {
            Binding::WorkspacePrevious => Action::MoveWorkspace {
                target: WorkspaceTarget::Relative(-1),
                carry: Carry::from_flags(shift, ctrl),
            },
            Binding::WorkspaceNext => Action::MoveWorkspace {
                target: WorkspaceTarget::Relative(1),
                carry: Carry::from_flags(shift, ctrl),
            },
            Binding::Workspace(index) => Action::MoveWorkspace {
                target: WorkspaceTarget::Index(index),
                carry: Carry::from_flags(shift, ctrl),
            },
            Binding::WindowPrevious => Action::MoveWindow {
                step: Step::Previous,
                reorder: shift,
                warp_pointer: true,
            },
            Binding::WindowNext => Action::MoveWindow {
                step: Step::Next,
                reorder: shift,
                warp_pointer: true,
            },
            Binding::ToggleMaximize => Action::ToggleMaximize {
                all_in_workspace: ctrl,
            },
            Binding::ToggleMinimize => Action::ToggleMinimize {
                all_in_workspace: ctrl,
            },
            Binding::NewWorkspace => Action::NewWorkspace {
                carry: Carry::from_flags(shift, ctrl),
            },
            Binding::DeleteWorkspace => Action::DeleteWorkspaceIfEmpty {
                all_empty: shift || ctrl,
            },
            Binding::CycleStackingOrder => Action::CycleStackingOrder { backwards: shift },
            Binding::CloseWindow => Action::CloseWindow {
                all_in_workspace: ctrl,
            },
            Binding::SwitchDisplayHead => Action::SwitchDisplayHead,
            Binding::ActivateNext => Action::ActivateNextGlobal { backwards: shift },
            Binding::SearchBackspace => Action::SearchBackspace,
            Binding::Unbound => return None,
        };
        Some(action)
    }
}

/// Key → [`Binding`] table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: HashMap<Key, Binding>,
}

impl Default for Keymap {
    fn default() -> Self {
        use Binding as B;
        let mut bindings = HashMap::from([
            (Key::Left, B::WorkspacePrevious),
            (Key::KpLeft, B::WorkspacePrevious),
            (Key::Right, B::WorkspaceNext),
            (Key::KpRight, B::WorkspaceNext),
            (Key::Up, B::WindowPrevious),
            (Key::KpUp, B::WindowPrevious),
            (Key::Down, B::WindowNext),
            (Key::KpDown, B::WindowNext),
            (Key::PageUp, B::ToggleMaximize),
            (Key::KpPageUp, B::ToggleMaximize),
            (Key::PageDown, B::ToggleMinimize),
            (Key::KpPageDown, B::ToggleMinimize),
            (Key::Insert, B::NewWorkspace),
            (Key::KpInsert, B::NewWorkspace),
            (Key::Delete, B::DeleteWorkspace),
            (Key::KpDelete, B::DeleteWorkspace),
            (Key::Tab, B::CycleStackingOrder),
            (Key::Escape, B::CloseWindow),
            (Key::SuperL, B::SwitchDisplayHead),
            (Key::SuperR, B::SwitchDisplayHead),
            (Key::Return, B::ActivateNext),
            (Key::IsoEnter, B::ActivateNext),
            (Key::KpEnter, B::ActivateNext),
            (Key::BackSpace, B::SearchBackspace),
        ]);
        for n in 1..=12u8 {
            bindings.insert(Key::F(n), B::Workspace(usize::from(n) - 1));
        }
        Self { bindings }
    }
}

impl Keymap {
    /// Apply user overrides on top of this keymap.
    pub fn with_overrides(mut self, overrides: &HashMap<Key, Binding>) -> Self {
        for (key, binding) in overrides {
            self.bindings.insert(*key, *binding);
        }
        self
    }

    pub fn binding(&self, key: Key) -> Option<Binding> {
        self.bindings.get(&key).copied()
    }

    /// Translate any raw input event.
    pub fn translate(&self, event: &InputEvent) -> Option<Action> {
        match event {
            InputEvent::Key(k) => self.translate_key(k),
            InputEvent::Scroll(s) => Some(translate_scroll(s)),
        }
    }

    /// Translate a key press.  Unbound printable keys feed the search.
    pub fn translate_key(&self, event: &KeyEvent) -> Option<Action> {
        match self.binding(event.key) {
            Some(Binding::Unbound) | None => match event.key {
                Key::Char(c) if !c.is_control() => Some(Action::SearchAppend(c)),
                _ => None,
            },
            Some(binding) => binding.action(event.modifiers),
        }
    }
}

/// Scrolling walks the windows of the active workspace; shift reorders.
pub fn translate_scroll(event: &ScrollEvent) -> Action {
    let step = match event.direction {
        ScrollDirection::Up | ScrollDirection::Left => Step::Previous,
        ScrollDirection::Down | ScrollDirection::Right => Step::Next,
    };
    Action::MoveWindow {
        step,
        reorder: event.modifiers.shift(),
        warp_pointer: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, modifiers: Modifiers) -> KeyEvent {
        KeyEvent {
            key,
            modifiers,
            time: 100,
        }
    }

    #[test]
    fn parse_key_names() {
        assert_eq!(parse_key("left"), Some(Key::Left));
        assert_eq!(parse_key("KP_Left"), Some(Key::KpLeft));
        assert_eq!(parse_key("page-up"), Some(Key::PageUp));
        assert_eq!(parse_key("PageDown"), Some(Key::PageDown));
        assert_eq!(parse_key("F12"), Some(Key::F(12)));
        assert_eq!(parse_key("f1"), Some(Key::F(1)));
        assert_eq!(parse_key("BackSpace"), Some(Key::BackSpace));
        assert_eq!(parse_key("a"), Some(Key::Char('a')));
        assert_eq!(parse_key("F"), Some(Key::Char('F')));
        assert_eq!(parse_key("space"), Some(Key::Char(' ')));
        assert_eq!(parse_key("f0"), None);
        assert_eq!(parse_key("f36"), None);
        assert_eq!(parse_key("hyper"), None);
        assert_eq!(parse_key("\u{7}"), None);
    }

    #[test]
    fn key_display_round_trips_through_parse() {
        for k in [Key::KpPageDown, Key::F(7), Key::SuperR, Key::Char(' '), Key::Char('q')] {
            assert_eq!(parse_key(&k.to_string()), Some(k));
        }
    }

    #[test]
    fn arrows_navigate_workspaces_with_carry() {
        let km = Keymap::default();
        assert_eq!(
            km.translate_key(&key(Key::Left, Modifiers::empty())),
            Some(Action::MoveWorkspace {
                target: WorkspaceTarget::Relative(-1),
                carry: Carry::Nothing,
            })
        );
        assert_eq!(
            km.translate_key(&key(Key::KpRight, Modifiers::SHIFT)),
            Some(Action::MoveWorkspace {
                target: WorkspaceTarget::Relative(1),
                carry: Carry::ActiveWindow,
            })
        );
        assert_eq!(
            km.translate_key(&key(Key::Right, Modifiers::SHIFT | Modifiers::CONTROL)),
            Some(Action::MoveWorkspace {
                target: WorkspaceTarget::Relative(1),
                carry: Carry::AllWindows,
            })
        );
    }

    #[test]
    fn up_down_walk_windows_and_warp() {
        let km = Keymap::default();
        assert_eq!(
            km.translate_key(&key(Key::Down, Modifiers::empty())),
            Some(Action::MoveWindow {
                step: Step::Next,
                reorder: false,
                warp_pointer: true,
            })
        );
        assert_eq!(
            km.translate_key(&key(Key::Up, Modifiers::SHIFT)),
            Some(Action::MoveWindow {
                step: Step::Previous,
                reorder: true,
                warp_pointer: true,
            })
        );
    }

    #[test]
    fn function_keys_jump_to_workspace_index() {
        let km = Keymap::default();
        assert_eq!(
            km.translate_key(&key(Key::F(1), Modifiers::empty())),
            Some(Action::MoveWorkspace {
                target: WorkspaceTarget::Index(0),
                carry: Carry::Nothing,
            })
        );
        assert_eq!(
            km.translate_key(&key(Key::F(12), Modifiers::empty())),
            Some(Action::MoveWorkspace {
                target: WorkspaceTarget::Index(11),
                carry: Carry::Nothing,
            })
        );
        assert_eq!(km.translate_key(&key(Key::F(13), Modifiers::empty())), None);
    }

    #[test]
    fn delete_uses_all_empty_mode_with_either_modifier() {
        let km = Keymap::default();
        let plain = km.translate_key(&key(Key::Delete, Modifiers::empty()));
        assert_eq!(plain, Some(Action::DeleteWorkspaceIfEmpty { all_empty: false }));
        for mods in [Modifiers::SHIFT, Modifiers::CONTROL] {
            assert_eq!(
                km.translate_key(&key(Key::KpDelete, mods)),
                Some(Action::DeleteWorkspaceIfEmpty { all_empty: true })
            );
        }
    }

    #[test]
    fn window_state_keys() {
        let km = Keymap::default();
        assert_eq!(
            km.translate_key(&key(Key::PageUp, Modifiers::CONTROL)),
            Some(Action::ToggleMaximize {
                all_in_workspace: true
            })
        );
        assert_eq!(
            km.translate_key(&key(Key::PageDown, Modifiers::SHIFT)),
            Some(Action::ToggleMinimize {
                all_in_workspace: false
            })
        );
        assert_eq!(
            km.translate_key(&key(Key::Escape, Modifiers::empty())),
            Some(Action::CloseWindow {
                all_in_workspace: false
            })
        );
        assert_eq!(
            km.translate_key(&key(Key::Tab, Modifiers::SHIFT)),
            Some(Action::CycleStackingOrder { backwards: true })
        );
        assert_eq!(
            km.translate_key(&key(Key::KpEnter, Modifiers::empty())),
            Some(Action::ActivateNextGlobal { backwards: false })
        );
        assert_eq!(
            km.translate_key(&key(Key::SuperL, Modifiers::empty())),
            Some(Action::SwitchDisplayHead)
        );
    }

    #[test]
    fn printable_keys_feed_search() {
        let km = Keymap::default();
        assert_eq!(
            km.translate_key(&key(Key::Char('x'), Modifiers::empty())),
            Some(Action::SearchAppend('x'))
        );
        assert_eq!(
            km.translate_key(&key(Key::BackSpace, Modifiers::empty())),
            Some(Action::SearchBackspace)
        );
    }

    #[test]
    fn overrides_rebind_and_unbind() {
        let overrides = HashMap::from([
            (Key::Char(' '), Binding::ActivateNext),
            (Key::Tab, Binding::Unbound),
            (Key::F(5), Binding::Workspace(20)),
        ]);
        let km = Keymap::default().with_overrides(&overrides);
        assert_eq!(
            km.translate_key(&key(Key::Char(' '), Modifiers::empty())),
            Some(Action::ActivateNextGlobal { backwards: false })
        );
        assert_eq!(km.translate_key(&key(Key::Tab, Modifiers::empty())), None);
        assert_eq!(
            km.translate_key(&key(Key::F(5), Modifiers::empty())),
            Some(Action::MoveWorkspace {
                target: WorkspaceTarget::Index(20),
                carry: Carry::Nothing,
            })
        );
        // Untouched defaults survive.
        assert_eq!(km.binding(Key::Insert), Some(Binding::NewWorkspace));
    }

    #[test]
    fn scroll_walks_windows_without_warp() {
        let up = ScrollEvent {
            direction: ScrollDirection::Up,
            modifiers: Modifiers::empty(),
            time: 1,
        };
        assert_eq!(
            translate_scroll(&up),
            Action::MoveWindow {
                step: Step::Previous,
                reorder: false,
                warp_pointer: false,
            }
        );
        let right = ScrollEvent {
            direction: ScrollDirection::Right,
            modifiers: Modifiers::SHIFT,
            time: 2,
        };
        assert_eq!(
            translate_scroll(&right),
            Action::MoveWindow {
                step: Step::Next,
                reorder: true,
                warp_pointer: false,
            }
        );
    }

    #[test]
    fn deserialize_input_events() {
        let ev: InputEvent =
            serde_json::from_str(r#"{"Key":{"key":"Left","modifiers":"SHIFT","time":42}}"#)
                .unwrap();
        assert_eq!(
            ev,
            InputEvent::Key(KeyEvent {
                key: Key::Left,
                modifiers: Modifiers::SHIFT,
                time: 42,
            })
        );
        assert_eq!(ev.time(), 42);

        let ev: InputEvent =
            serde_json::from_str(r#"{"Scroll":{"direction":"down"}}"#).unwrap();
        assert_eq!(
            ev,
            InputEvent::Scroll(ScrollEvent {
                direction: ScrollDirection::Down,
                modifiers: Modifiers::empty(),
                time: 0,
            })
        );
    }

    #[test]
    fn deserialize_bindings() {
        let b: Binding = serde_json::from_str(r#""toggle-maximize""#).unwrap();
        assert_eq!(b, Binding::ToggleMaximize);
        let b: Binding = serde_json::from_str(r#"{"workspace":3}"#).unwrap();
        assert_eq!(b, Binding::Workspace(3));
    }
}
