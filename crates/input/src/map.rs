//! Key mapping from terminal events to input actions.

use crate::types::Mode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// What a key press asks for. Cursor movement stays local to the terminal;
/// everything else becomes an engine command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    MoveCursor(Direction),
    ToggleCell,
    StartGame(Mode),
    Pause,
    Restart,
    ExitToMenu,
}

/// Map keyboard input to an action. The menu only understands mode choices.
pub fn handle_key_event(key: KeyEvent, in_menu: bool) -> Option<InputAction> {
    if in_menu {
        return match key.code {
            KeyCode::Char('1') | KeyCode::Char('c') | KeyCode::Char('C') => {
                Some(InputAction::StartGame(Mode::Classic))
            }
            KeyCode::Char('2') | KeyCode::Char('t') | KeyCode::Char('T') => {
                Some(InputAction::StartGame(Mode::Timed))
            }
            _ => None,
        };
    }

    match key.code {
        // Cursor
        KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('a') | KeyCode::Char('A') => {
            Some(InputAction::MoveCursor(Direction::Left))
        }
        KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('L') | KeyCode::Char('d') | KeyCode::Char('D') => {
            Some(InputAction::MoveCursor(Direction::Right))
        }
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Char('J') | KeyCode::Char('s') | KeyCode::Char('S') => {
            Some(InputAction::MoveCursor(Direction::Down))
        }
        KeyCode::Up | KeyCode::Char('k') | KeyCode::Char('K') | KeyCode::Char('w') | KeyCode::Char('W') => {
            Some(InputAction::MoveCursor(Direction::Up))
        }

        // Actions
        KeyCode::Char(' ') | KeyCode::Enter => Some(InputAction::ToggleCell),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(InputAction::Pause),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(InputAction::Restart),
        KeyCode::Char('m') | KeyCode::Char('M') | KeyCode::Esc => Some(InputAction::ExitToMenu),

        _ => None,
    }
}

/// Check if key should quit the program.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q'))
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}
