//! Per-view key bindings.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    code: KeyCode,
    modifiers: KeyModifiers,
}

impl KeyBinding {
    pub const fn key(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: KeyModifiers::NONE,
        }
    }

    pub const fn char(c: char) -> Self {
        Self::key(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self {
            code: KeyCode::Char(c),
            modifiers: KeyModifiers::CONTROL,
        }
    }

    /// SHIFT is ignored for characters; the terminal already folds it into
    /// the reported char.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        let mut modifiers = key.modifiers;
        if matches!(key.code, KeyCode::Char(_)) {
            modifiers.remove(KeyModifiers::SHIFT);
        }
        self.code == key.code && self.modifiers == modifiers
    }
}

/// Ordered binding table; the first match wins.
#[derive(Debug, Clone)]
pub struct Keymap<C> {
    bindings: Vec<(KeyBinding, C)>,
}

impl<C> Default for Keymap<C> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<C: Copy> Keymap<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, keys: &[KeyBinding], command: C) -> &mut Self {
        self.bindings
            .extend(keys.iter().map(|binding| (*binding, command)));
        self
    }

    pub fn lookup(&self, key: &KeyEvent) -> Option<C> {
        if key.kind == KeyEventKind::Release {
            return None;
        }
        self.bindings
            .iter()
            .find(|(binding, _)| binding.matches(key))
            .map(|(_, command)| *command)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Cmd {
        Quit,
        Up,
    }

    #[test]
    fn test_lookup_respects_modifiers() {
        let mut keymap = Keymap::new();
        keymap
            .bind(&[KeyBinding::char('q'), KeyBinding::ctrl('c')], Cmd::Quit)
            .bind(&[KeyBinding::key(KeyCode::Up), KeyBinding::char('k')], Cmd::Up);

        let key = |code, modifiers| KeyEvent::new(code, modifiers);
        assert_eq!(
            keymap.lookup(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Cmd::Quit)
        );
        assert_eq!(keymap.lookup(&key(KeyCode::Char('c'), KeyModifiers::NONE)), None);
        assert_eq!(
            keymap.lookup(&key(KeyCode::Char('K'), KeyModifiers::SHIFT)),
            None
        );
        assert_eq!(
            keymap.lookup(&key(KeyCode::Char('k'), KeyModifiers::NONE)),
            Some(Cmd::Up)
        );
        assert_eq!(keymap.len(), 4);
    }

    #[test]
    fn test_release_events_are_ignored() {
        let mut keymap = Keymap::new();
        keymap.bind(&[KeyBinding::char('q')], Cmd::Quit);
        let mut release = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert_eq!(keymap.lookup(&release), None);
    }
}
