//! Key bindings: arrows, Z/X rotation, and vim-style keys.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    RotateCw,
    RotateCcw,
    SoftDrop,
    HardDrop,
    Restart,
    Pause,
    Quit,
    None,
}

impl Action {
    /// Actions that keep firing while the key is held.
    pub fn repeats(self) -> bool {
        matches!(self, Self::MoveLeft | Self::MoveRight | Self::SoftDrop)
    }
}

/// Map key event to game action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('r' | 'R') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        KeyCode::Char('x' | 'X') | KeyCode::Up | KeyCode::Char('k') => Action::RotateCw,
        KeyCode::Char('z' | 'Z') | KeyCode::Char('u') => Action::RotateCcw,
        KeyCode::Enter | KeyCode::Char(' ') => Action::HardDrop,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> Action {
        key_to_action(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn arrows_and_rotation_keys() {
        assert_eq!(press(KeyCode::Left), Action::MoveLeft);
        assert_eq!(press(KeyCode::Right), Action::MoveRight);
        assert_eq!(press(KeyCode::Down), Action::SoftDrop);
        assert_eq!(press(KeyCode::Char('z')), Action::RotateCcw);
        assert_eq!(press(KeyCode::Char('x')), Action::RotateCw);
        assert_eq!(press(KeyCode::Char(' ')), Action::HardDrop);
        assert_eq!(press(KeyCode::Char('r')), Action::Restart);
        assert_eq!(press(KeyCode::Esc), Action::Quit);
    }

    #[test]
    fn shifted_letters_still_map() {
        let key = KeyEvent::new(KeyCode::Char('Z'), KeyModifiers::SHIFT);
        assert_eq!(key_to_action(key), Action::RotateCcw);
    }

    #[test]
    fn control_chords_are_ignored() {
        let key = KeyEvent::new(KeyCode::Char('r'), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(key), Action::None);
    }

    #[test]
    fn only_lateral_and_soft_drop_repeat() {
        assert!(Action::MoveLeft.repeats());
        assert!(Action::SoftDrop.repeats());
        assert!(!Action::HardDrop.repeats());
        assert!(!Action::RotateCw.repeats());
    }
}
