use std::collections::HashMap;

use winit::keyboard::KeyCode;

/// Modifier flags for a key combination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierFlags {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl ModifierFlags {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };
}

/// A key combination: modifier flags + a physical key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub modifiers: ModifierFlags,
    pub key: KeyCode,
}

impl KeyCombo {
    /// Plain key, no modifiers.
    pub const fn plain(key: KeyCode) -> Self {
        Self {
            modifiers: ModifierFlags::NONE,
            key,
        }
    }

    pub const fn shifted(key: KeyCode) -> Self {
        Self {
            modifiers: ModifierFlags::SHIFT,
            key,
        }
    }
}

/// Actions that can be triggered by keyboard shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ZoomIn,
    ZoomOut,
    /// Recenter on the agent at the default zoom.
    Locate,
    /// Switch the side panel to the other tab.
    NextTab,
    /// Close the dialog, or exit when nothing is open.
    CloseTopmost,
}

/// Keyboard shortcut map.
pub struct KeyBindings {
    map: HashMap<KeyCombo, Action>,
}

impl KeyBindings {
    pub fn defaults() -> Self {
        let mut map = HashMap::new();

        // "+" is Shift+= on most layouts; accept both.
        map.insert(KeyCombo::plain(KeyCode::Equal), Action::ZoomIn);
        map.insert(KeyCombo::shifted(KeyCode::Equal), Action::ZoomIn);
        map.insert(KeyCombo::plain(KeyCode::NumpadAdd), Action::ZoomIn);
        map.insert(KeyCombo::plain(KeyCode::Minus), Action::ZoomOut);
        map.insert(KeyCombo::plain(KeyCode::NumpadSubtract), Action::ZoomOut);
        map.insert(KeyCombo::plain(KeyCode::KeyL), Action::Locate);
        map.insert(KeyCombo::plain(KeyCode::Tab), Action::NextTab);
        map.insert(KeyCombo::plain(KeyCode::Escape), Action::CloseTopmost);

        Self { map }
    }

    /// Look up the action for a key combination.
    pub fn lookup(&self, combo: KeyCombo) -> Option<Action> {
        self.map.get(&combo).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bindings_exist() {
        let kb = KeyBindings::defaults();
        assert_eq!(kb.lookup(KeyCombo::plain(KeyCode::Equal)), Some(Action::ZoomIn));
        assert_eq!(kb.lookup(KeyCombo::shifted(KeyCode::Equal)), Some(Action::ZoomIn));
        assert_eq!(kb.lookup(KeyCombo::plain(KeyCode::Minus)), Some(Action::ZoomOut));
        assert_eq!(kb.lookup(KeyCombo::plain(KeyCode::KeyL)), Some(Action::Locate));
        assert_eq!(kb.lookup(KeyCombo::plain(KeyCode::Tab)), Some(Action::NextTab));
        assert_eq!(
            kb.lookup(KeyCombo::plain(KeyCode::Escape)),
            Some(Action::CloseTopmost)
        );
    }

    #[test]
    fn unbound_key_returns_none() {
        let kb = KeyBindings::defaults();
        assert_eq!(kb.lookup(KeyCombo::plain(KeyCode::KeyZ)), None);
        assert_eq!(kb.lookup(KeyCombo::shifted(KeyCode::KeyL)), None);
    }
}
