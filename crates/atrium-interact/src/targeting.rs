//! Per-frame raycast targeting of interactable objects
//!
//! Every tick, a ray is cast from the origin node's world position along
//! its forward vector against the registered interactables' sensor
//! colliders. The nearest hit becomes the selection; the confirm key is
//! only subscribed while something is selected, so a stray press outside
//! the targeting window can never activate anything.

use crate::interactable::InteractableHandle;
use crate::prompt::PromptSink;
use atrium_core::{NodeId, Result};
use atrium_physics::PhysicsWorld;
use atrium_runtime::{KeyCode, KeyboardHandle, KeyboardListener, ListenerHandle, Updatable};
use atrium_scene::Scene;
use nalgebra::Point3;
use rapier3d::prelude::ColliderHandle;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

/// Ray segment: skip geometry hugging the origin, stop at arm's length
pub const RAY_NEAR: f32 = 0.1;
pub const RAY_FAR: f32 = 10.0;

/// The key that activates the selected interactable
pub const CONFIRM_KEY: KeyCode = KeyCode::KeyE;

/// Raycast-driven selection of interactables.
///
/// Holds its interactables for the life of the component; the set is fixed
/// at construction. Selection, prompt visibility, and the confirm-key
/// subscription are all edge-triggered off the per-tick raycast result.
pub struct InteractionTargeting {
    physics: Rc<RefCell<PhysicsWorld>>,
    scene: Rc<RefCell<Scene>>,
    keyboard: KeyboardHandle,
    origin: NodeId,
    interactables: Vec<InteractableHandle>,
    /// Sensor collider -> index into `interactables`
    collider_owner: HashMap<ColliderHandle, usize>,
    targets: HashSet<ColliderHandle>,
    selected: Option<usize>,
    listening: bool,
    prompt: Box<dyn PromptSink>,
    this: Weak<RefCell<InteractionTargeting>>,
}

impl InteractionTargeting {
    /// Build the targeting component, registering a sensor collider for
    /// every object of every interactable. Fails if any target object has
    /// no geometry to bound.
    pub fn new(
        physics: &Rc<RefCell<PhysicsWorld>>,
        scene: &Rc<RefCell<Scene>>,
        keyboard: &KeyboardHandle,
        origin: NodeId,
        interactables: Vec<InteractableHandle>,
        prompt: Box<dyn PromptSink>,
    ) -> Result<Rc<RefCell<Self>>> {
        let mut collider_owner = HashMap::new();
        let mut targets = HashSet::new();
        {
            let scene_ref = scene.borrow();
            let mut world = physics.borrow_mut();
            for (index, interactable) in interactables.iter().enumerate() {
                let interactable = interactable.borrow();
                for &node in interactable.objects() {
                    let handle = world.register_sensor(&scene_ref, node)?;
                    collider_owner.insert(handle, index);
                    targets.insert(handle);
                }
            }
        }

        Ok(Rc::new_cyclic(|this| {
            RefCell::new(Self {
                physics: physics.clone(),
                scene: scene.clone(),
                keyboard: keyboard.clone(),
                origin,
                interactables,
                collider_owner,
                targets,
                selected: None,
                listening: false,
                prompt,
                this: this.clone(),
            })
        }))
    }

    /// Is the confirm key currently subscribed?
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// The interactable currently under the crosshair, if any
    pub fn selected(&self) -> Option<&InteractableHandle> {
        self.selected.map(|index| &self.interactables[index])
    }

    fn listener_handle(&self) -> Option<ListenerHandle> {
        self.this.upgrade().map(|rc| rc as ListenerHandle)
    }

    fn select(&mut self, index: usize) {
        if !self.listening {
            if let Some(handle) = self.listener_handle() {
                self.keyboard
                    .borrow_mut()
                    .subscribe(&handle, &[CONFIRM_KEY], false);
                self.listening = true;
            }
        }

        // Prompt updates once per selection change, never per tick, and a
        // direct A -> B switch never flickers through hidden
        if self.selected != Some(index) {
            self.selected = Some(index);
            let text = format!(
                "Press [E] To {}",
                self.interactables[index].borrow().prompt_text()
            );
            self.prompt.show(&text);
        }
    }

    fn deselect(&mut self) {
        if self.listening {
            if let Some(handle) = self.listener_handle() {
                self.keyboard.borrow_mut().unsubscribe(&handle);
            }
            self.listening = false;
        }

        if self.selected.take().is_some() {
            self.prompt.hide();
        }
    }
}

impl Updatable for InteractionTargeting {
    fn update(&mut self, _delta: f32) {
        let ray = {
            let scene = self.scene.borrow();
            match (
                scene.world_translation(self.origin),
                scene.forward(self.origin),
            ) {
                (Ok(origin), Ok(dir)) => Some((Point3::from(origin), dir)),
                _ => None,
            }
        };
        let Some((origin, dir)) = ray else {
            log::warn!("targeting origin node is gone");
            return;
        };

        let hit =
            self.physics
                .borrow()
                .cast_ray_among(origin, dir, RAY_NEAR, RAY_FAR, &self.targets);
        let owner = hit.and_then(|(handle, _)| self.collider_owner.get(&handle).copied());

        match owner {
            Some(index) => self.select(index),
            None => self.deselect(),
        }
    }
}

impl KeyboardListener for InteractionTargeting {
    fn on_key_down(&mut self, key: KeyCode) {
        if key != CONFIRM_KEY {
            log::warn!("targeting received unsubscribed key {key:?}");
            return;
        }
        if let Some(index) = self.selected {
            self.interactables[index].borrow_mut().activate();
        }
    }
}
