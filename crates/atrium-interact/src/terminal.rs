//! The in-world computer terminal interactable

use crate::interactable::Interactable;
use atrium_core::NodeId;
use atrium_runtime::{KeyCode, KeyboardHandle, KeyboardListener, ListenerHandle, LoopHandle};
use std::cell::RefCell;
use std::rc::Rc;

/// The key that leaves the terminal and resumes the world
pub const EXIT_KEY: KeyCode = KeyCode::KeyX;

/// The terminal's UI collaborator. The terminal mounts it on activation
/// and unmounts it on exit; windowing behavior behind it is opaque here.
pub trait TerminalUi {
    fn mount(&mut self);
    fn unmount(&mut self);
}

/// A computer terminal the player can use.
///
/// Activation mounts the UI and stops the frame loop, freezing the world
/// behind the terminal; the exit key reverses both. The exit key is
/// subscribed for the terminal's whole life, so the mounted flag gates it.
pub struct Terminal {
    nodes: Vec<NodeId>,
    ui: Box<dyn TerminalUi>,
    frame_loop: LoopHandle,
    mounted: bool,
}

impl Terminal {
    pub fn new(
        frame_loop: &LoopHandle,
        keyboard: &KeyboardHandle,
        nodes: Vec<NodeId>,
        ui: Box<dyn TerminalUi>,
    ) -> Rc<RefCell<Self>> {
        let terminal = Rc::new(RefCell::new(Self {
            nodes,
            ui,
            frame_loop: frame_loop.clone(),
            mounted: false,
        }));

        let handle: ListenerHandle = terminal.clone();
        keyboard.borrow_mut().subscribe(&handle, &[EXIT_KEY], false);
        terminal
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    fn exit(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;
        self.ui.unmount();
        self.frame_loop.borrow_mut().start();
    }
}

impl Interactable for Terminal {
    fn objects(&self) -> &[NodeId] {
        &self.nodes
    }

    fn activate(&mut self) {
        if self.mounted {
            return;
        }
        self.mounted = true;
        self.ui.mount();
        self.frame_loop.borrow_mut().stop();
    }

    fn prompt_text(&self) -> &str {
        "Use Computer"
    }
}

impl KeyboardListener for Terminal {
    fn on_key_down(&mut self, key: KeyCode) {
        if key != EXIT_KEY {
            log::warn!("terminal received unsubscribed key {key:?}");
            return;
        }
        self.exit();
    }
}
