/// Keyboard input.
///
/// Drains every pending terminal event once per frame and decodes the
/// presses into `Action`s, in arrival order. Release events are ignored;
/// auto-repeat is treated as a press (steering the same way twice is a
/// no-op).
///
///   Arrows / WASD   steer
///   Space           start / pause / resume / restart
///   M               toggle mystery mode (between sessions)
///   T               toggle color theme
///   Q / Esc / ^C    quit

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::warn;

use crate::domain::grid::Direction;
use crate::sim::session::Command;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Action {
    Game(Command),
    ToggleTheme,
    Quit,
}

pub struct InputState {
    /// Actions decoded during the most recent `drain_events()` call.
    actions: Vec<Action>,
}

impl InputState {
    pub fn new() -> Self {
        InputState { actions: Vec::with_capacity(8) }
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per frame, before advancing the simulation.
    pub fn drain_events(&mut self) {
        self.actions.clear();

        loop {
            match poll(Duration::ZERO) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    warn!("terminal poll failed: {e}");
                    break;
                }
            }
            match event::read() {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    if let Some(action) = decode(&key) {
                        self.actions.push(action);
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("terminal read failed: {e}");
                    break;
                }
            }
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }
}

/// Map one key event to an action.
pub fn decode(key: &KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::Quit),
            _ => None,
        };
    }

    let action = match key.code {
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => Action::Game(Command::Steer(Direction::Up)),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Action::Game(Command::Steer(Direction::Down)),
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Action::Game(Command::Steer(Direction::Left)),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Action::Game(Command::Steer(Direction::Right)),
        KeyCode::Char(' ') => Action::Game(Command::TogglePause),
        KeyCode::Char('m') | KeyCode::Char('M') => Action::Game(Command::ToggleMystery),
        KeyCode::Char('t') | KeyCode::Char('T') => Action::ToggleTheme,
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Action::Quit,
        _ => return None,
    };
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn arrows_and_wasd_steer() {
        assert_eq!(decode(&key(KeyCode::Up)), Some(Action::Game(Command::Steer(Direction::Up))));
        assert_eq!(decode(&key(KeyCode::Char('a'))), Some(Action::Game(Command::Steer(Direction::Left))));
        assert_eq!(decode(&key(KeyCode::Char('D'))), Some(Action::Game(Command::Steer(Direction::Right))));
    }

    #[test]
    fn meta_keys() {
        assert_eq!(decode(&key(KeyCode::Char(' '))), Some(Action::Game(Command::TogglePause)));
        assert_eq!(decode(&key(KeyCode::Char('m'))), Some(Action::Game(Command::ToggleMystery)));
        assert_eq!(decode(&key(KeyCode::Char('t'))), Some(Action::ToggleTheme));
        assert_eq!(decode(&key(KeyCode::Esc)), Some(Action::Quit));
        assert_eq!(decode(&key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn ctrl_c_quits_but_ctrl_s_does_not_steer() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let ctrl_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        assert_eq!(decode(&ctrl_c), Some(Action::Quit));
        assert_eq!(decode(&ctrl_s), None);
    }
}
