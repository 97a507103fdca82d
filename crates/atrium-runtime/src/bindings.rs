//! Raw key to semantic action mapping

use std::collections::HashMap;
use winit::keyboard::KeyCode;

/// Semantic movement actions. Components consume these, never raw keys, so
/// remapping controls cannot touch movement math.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Forward,
    Backward,
    Left,
    Right,
    Sprint,
    Jump,
}

/// Many-to-one key binding table, fixed after setup.
///
/// Both WASD and the arrow keys drive movement by default.
pub struct KeyBindings {
    map: HashMap<KeyCode, Action>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let mut bindings = Self {
            map: HashMap::new(),
        };
        bindings.bind(Action::Forward, &[KeyCode::KeyW, KeyCode::ArrowUp]);
        bindings.bind(Action::Backward, &[KeyCode::KeyS, KeyCode::ArrowDown]);
        bindings.bind(Action::Left, &[KeyCode::KeyA, KeyCode::ArrowLeft]);
        bindings.bind(Action::Right, &[KeyCode::KeyD, KeyCode::ArrowRight]);
        bindings.bind(Action::Sprint, &[KeyCode::ShiftLeft, KeyCode::ShiftRight]);
        bindings.bind(Action::Jump, &[KeyCode::Space]);
        bindings
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an action to one or more keys, replacing its previous keys
    pub fn bind(&mut self, action: Action, keys: &[KeyCode]) {
        self.map.retain(|_, a| *a != action);
        for key in keys {
            self.map.insert(*key, action);
        }
    }

    /// The action a raw key maps to, if any
    pub fn action_for(&self, key: KeyCode) -> Option<Action> {
        self.map.get(&key).copied()
    }

    /// Every bound key (the subscription set for a movement listener)
    pub fn keys(&self) -> Vec<KeyCode> {
        self.map.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_many_to_one() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.action_for(KeyCode::KeyW), Some(Action::Forward));
        assert_eq!(bindings.action_for(KeyCode::ArrowUp), Some(Action::Forward));
        assert_eq!(bindings.action_for(KeyCode::Space), Some(Action::Jump));
        assert_eq!(bindings.action_for(KeyCode::KeyQ), None);
    }

    #[test]
    fn test_rebind_replaces_previous_keys() {
        let mut bindings = KeyBindings::default();
        bindings.bind(Action::Jump, &[KeyCode::KeyJ]);
        assert_eq!(bindings.action_for(KeyCode::KeyJ), Some(Action::Jump));
        assert_eq!(bindings.action_for(KeyCode::Space), None);
    }

    #[test]
    fn test_keys_covers_all_bindings() {
        let bindings = KeyBindings::default();
        let keys = bindings.keys();
        assert!(keys.contains(&KeyCode::KeyW));
        assert!(keys.contains(&KeyCode::ArrowRight));
        assert!(keys.contains(&KeyCode::ShiftLeft));
        assert_eq!(keys.len(), 11);
    }
}
