//! Edge-triggered keyboard routing
//!
//! Normalizes raw press/release events into per-listener callbacks. OS key
//! repeat produces a stream of press events for a held key; only the first
//! is delivered.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};
use winit::keyboard::KeyCode;

/// A component interested in key transitions.
///
/// Listeners registered press-only never have `on_key_up` invoked, so the
/// default body suits one-shot "confirm" style actions.
pub trait KeyboardListener {
    fn on_key_down(&mut self, key: KeyCode);
    fn on_key_up(&mut self, _key: KeyCode) {}
}

/// Shared handle to a keyboard listener
pub type ListenerHandle = Rc<RefCell<dyn KeyboardListener>>;

/// Shared handle to the keyboard router
pub type KeyboardHandle = Rc<RefCell<Keyboard>>;

struct Registration {
    listener: Weak<RefCell<dyn KeyboardListener>>,
    down_keys: HashSet<KeyCode>,
    up_keys: HashSet<KeyCode>,
}

fn handle_key(handle: &ListenerHandle) -> usize {
    Rc::as_ptr(handle) as *const () as usize
}

/// The process-wide key event distributor.
///
/// One registration per listener (keyed on handle identity); re-subscribing
/// replaces the previous interest sets wholesale. Listeners are weakly
/// held and pruned once dropped.
pub struct Keyboard {
    listeners: HashMap<usize, Registration>,
    pressed: HashSet<KeyCode>,
}

impl Default for Keyboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyboard {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
            pressed: HashSet::new(),
        }
    }

    /// Convenience: a new router already wrapped in its shared handle
    pub fn handle() -> KeyboardHandle {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Register interest in a set of keys.
    ///
    /// With `notify_release` the listener also receives `on_key_up` for the
    /// same keys (continuous, held-style actions); without it only presses
    /// are delivered (tapped, one-shot actions).
    pub fn subscribe(&mut self, listener: &ListenerHandle, keys: &[KeyCode], notify_release: bool) {
        let down_keys: HashSet<KeyCode> = keys.iter().copied().collect();
        let up_keys = if notify_release {
            down_keys.clone()
        } else {
            HashSet::new()
        };
        self.listeners.insert(
            handle_key(listener),
            Registration {
                listener: Rc::downgrade(listener),
                down_keys,
                up_keys,
            },
        );
    }

    /// Drop a listener's registration
    pub fn unsubscribe(&mut self, listener: &ListenerHandle) {
        self.listeners.remove(&handle_key(listener));
    }

    /// Is a raw key currently held?
    pub fn is_pressed(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    /// Feed a raw press event. Repeats of an already-held key are dropped.
    ///
    /// Dispatch happens outside the router borrow, so callbacks are free to
    /// subscribe/unsubscribe from inside `on_key_down`.
    pub fn press(this: &KeyboardHandle, key: KeyCode) {
        let targets = {
            let mut keyboard = this.borrow_mut();
            if !keyboard.pressed.insert(key) {
                return;
            }
            keyboard.interested(key, Edge::Down)
        };
        for target in targets {
            if let Some(listener) = target.upgrade() {
                listener.borrow_mut().on_key_down(key);
            }
        }
        this.borrow_mut().prune();
    }

    /// Feed a raw release event. Held state clears unconditionally.
    pub fn release(this: &KeyboardHandle, key: KeyCode) {
        let targets = {
            let mut keyboard = this.borrow_mut();
            keyboard.pressed.remove(&key);
            keyboard.interested(key, Edge::Up)
        };
        for target in targets {
            if let Some(listener) = target.upgrade() {
                listener.borrow_mut().on_key_up(key);
            }
        }
        this.borrow_mut().prune();
    }

    fn interested(&self, key: KeyCode, edge: Edge) -> Vec<Weak<RefCell<dyn KeyboardListener>>> {
        self.listeners
            .values()
            .filter(|reg| match edge {
                Edge::Down => reg.down_keys.contains(&key),
                Edge::Up => reg.up_keys.contains(&key),
            })
            .map(|reg| reg.listener.clone())
            .collect()
    }

    fn prune(&mut self) {
        self.listeners
            .retain(|_, reg| reg.listener.strong_count() > 0);
    }
}

#[derive(Clone, Copy)]
enum Edge {
    Down,
    Up,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        downs: Vec<KeyCode>,
        ups: Vec<KeyCode>,
    }

    impl KeyboardListener for Recorder {
        fn on_key_down(&mut self, key: KeyCode) {
            self.downs.push(key);
        }
        fn on_key_up(&mut self, key: KeyCode) {
            self.ups.push(key);
        }
    }

    #[test]
    fn test_key_repeat_suppressed() {
        let keyboard = Keyboard::handle();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let handle: ListenerHandle = recorder.clone();
        keyboard
            .borrow_mut()
            .subscribe(&handle, &[KeyCode::KeyE], false);

        // Physical press-and-hold: the OS repeats the press event
        Keyboard::press(&keyboard, KeyCode::KeyE);
        Keyboard::press(&keyboard, KeyCode::KeyE);
        Keyboard::press(&keyboard, KeyCode::KeyE);
        Keyboard::release(&keyboard, KeyCode::KeyE);

        assert_eq!(recorder.borrow().downs, vec![KeyCode::KeyE]);
        assert!(recorder.borrow().ups.is_empty());
    }

    #[test]
    fn test_release_interest_opt_in() {
        let keyboard = Keyboard::handle();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let handle: ListenerHandle = recorder.clone();
        keyboard
            .borrow_mut()
            .subscribe(&handle, &[KeyCode::KeyW], true);

        Keyboard::press(&keyboard, KeyCode::KeyW);
        Keyboard::release(&keyboard, KeyCode::KeyW);

        assert_eq!(recorder.borrow().downs, vec![KeyCode::KeyW]);
        assert_eq!(recorder.borrow().ups, vec![KeyCode::KeyW]);
    }

    #[test]
    fn test_uninterested_keys_not_delivered() {
        let keyboard = Keyboard::handle();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let handle: ListenerHandle = recorder.clone();
        keyboard
            .borrow_mut()
            .subscribe(&handle, &[KeyCode::KeyW], true);

        Keyboard::press(&keyboard, KeyCode::KeyQ);
        Keyboard::release(&keyboard, KeyCode::KeyQ);

        assert!(recorder.borrow().downs.is_empty());
        assert!(recorder.borrow().ups.is_empty());
    }

    #[test]
    fn test_resubscribe_replaces_interest() {
        let keyboard = Keyboard::handle();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let handle: ListenerHandle = recorder.clone();
        keyboard
            .borrow_mut()
            .subscribe(&handle, &[KeyCode::KeyW], true);
        keyboard
            .borrow_mut()
            .subscribe(&handle, &[KeyCode::KeyS], false);

        Keyboard::press(&keyboard, KeyCode::KeyW);
        Keyboard::press(&keyboard, KeyCode::KeyS);
        Keyboard::release(&keyboard, KeyCode::KeyS);

        assert_eq!(recorder.borrow().downs, vec![KeyCode::KeyS]);
        assert!(recorder.borrow().ups.is_empty());
    }

    #[test]
    fn test_unsubscribe() {
        let keyboard = Keyboard::handle();
        let recorder = Rc::new(RefCell::new(Recorder::default()));
        let handle: ListenerHandle = recorder.clone();
        keyboard
            .borrow_mut()
            .subscribe(&handle, &[KeyCode::KeyE], false);
        keyboard.borrow_mut().unsubscribe(&handle);

        Keyboard::press(&keyboard, KeyCode::KeyE);
        assert!(recorder.borrow().downs.is_empty());
    }

    #[test]
    fn test_release_clears_held_state() {
        let keyboard = Keyboard::handle();
        Keyboard::press(&keyboard, KeyCode::Space);
        assert!(keyboard.borrow().is_pressed(KeyCode::Space));
        Keyboard::release(&keyboard, KeyCode::Space);
        assert!(!keyboard.borrow().is_pressed(KeyCode::Space));
    }

    /// A listener that re-subscribes itself from inside its own callback
    struct SelfSubscriber {
        keyboard: KeyboardHandle,
        this: Weak<RefCell<SelfSubscriber>>,
        fired: u32,
    }

    impl KeyboardListener for SelfSubscriber {
        fn on_key_down(&mut self, _key: KeyCode) {
            self.fired += 1;
            if let Some(this) = self.this.upgrade() {
                let handle: ListenerHandle = this;
                self.keyboard
                    .borrow_mut()
                    .subscribe(&handle, &[KeyCode::KeyX], false);
            }
        }
    }

    #[test]
    fn test_callback_may_mutate_router() {
        let keyboard = Keyboard::handle();
        let listener = Rc::new_cyclic(|this| {
            RefCell::new(SelfSubscriber {
                keyboard: keyboard.clone(),
                this: this.clone(),
                fired: 0,
            })
        });
        let handle: ListenerHandle = listener.clone();
        keyboard
            .borrow_mut()
            .subscribe(&handle, &[KeyCode::KeyE], false);

        Keyboard::press(&keyboard, KeyCode::KeyE);
        Keyboard::press(&keyboard, KeyCode::KeyX);
        assert_eq!(listener.borrow().fired, 2);
    }
}
