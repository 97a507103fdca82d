//! Kinematic character controller
//!
//! Converts semantic key state into grounded/airborne motion: raw flags
//! feed an input direction, velocity integrates jump/gravity/friction, the
//! physics world collision-resolves the resulting displacement, and facing
//! slerps toward the direction of travel. The controller is the sole
//! writer of its own node's transform.

use crate::config::CharacterTuning;
use crate::world::PhysicsWorld;
use atrium_core::{NodeId, Result};
use atrium_runtime::{Action, KeyBindings, KeyCode, KeyboardListener, Updatable};
use atrium_scene::{AnimationPlayer, Scene};
use nalgebra::{UnitQuaternion, Vector3};
use rapier3d::control::KinematicCharacterController;
use rapier3d::prelude::ColliderHandle;
use std::cell::RefCell;
use std::f32::consts::FRAC_PI_2;
use std::rc::Rc;

/// Corrected displacements below this are treated as standing still
const MOVE_EPSILON: f32 = 1e-4;

/// Downward displacement requested while grounded. Vertical velocity is
/// clamped to zero on the ground, so without this probe the shape cast has
/// no downward component and the grounded query drops contact between
/// ticks.
const GROUND_PROBE: f32 = 0.02;

/// Mutable per-character movement record.
///
/// Velocity carries component magnitudes only (x/z never negative); the
/// direction sign lives in `input_direction`. `input_direction.y` is pinned
/// to 1 so the vertical velocity passes through unchanged.
#[derive(Debug, Clone)]
pub struct CharacterState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub sprint: bool,
    pub jump: bool,
    pub input_direction: Vector3<f32>,
    pub velocity: Vector3<f32>,
    pub frame_movement: Vector3<f32>,
    pub target_facing: UnitQuaternion<f32>,
}

impl Default for CharacterState {
    fn default() -> Self {
        Self {
            forward: false,
            backward: false,
            left: false,
            right: false,
            sprint: false,
            jump: false,
            input_direction: Vector3::new(0.0, 1.0, 0.0),
            velocity: Vector3::zeros(),
            frame_movement: Vector3::zeros(),
            target_facing: UnitQuaternion::identity(),
        }
    }
}

/// Drives one character node from key state through the physics world
pub struct CharacterController {
    physics: Rc<RefCell<PhysicsWorld>>,
    scene: Rc<RefCell<Scene>>,
    node: NodeId,
    collider: ColliderHandle,
    controller: KinematicCharacterController,
    bindings: KeyBindings,
    tuning: CharacterTuning,
    state: CharacterState,
    /// Result of the previous collision-resolved move; re-derived every
    /// tick rather than tracked as an independent state machine
    grounded: bool,
    animation: AnimationPlayer,
}

impl CharacterController {
    /// Create a controller for `node`, carving its collider out of the
    /// node's bounding geometry. Fails if the node has no geometry.
    pub fn new(
        physics: &Rc<RefCell<PhysicsWorld>>,
        scene: &Rc<RefCell<Scene>>,
        node: NodeId,
        tuning: CharacterTuning,
        bindings: KeyBindings,
        mut animation: AnimationPlayer,
    ) -> Result<Rc<RefCell<Self>>> {
        let collider = physics
            .borrow_mut()
            .create_character_collider(&scene.borrow(), node)?;
        let controller = physics.borrow().character_controller(tuning.controller_offset);

        animation.play("idle");

        Ok(Rc::new(RefCell::new(Self {
            physics: physics.clone(),
            scene: scene.clone(),
            node,
            collider,
            controller,
            bindings,
            tuning,
            state: CharacterState::default(),
            grounded: false,
            animation,
        })))
    }

    /// Keys this controller wants from the keyboard router (press+release)
    pub fn subscription_keys(&self) -> Vec<KeyCode> {
        self.bindings.keys()
    }

    /// Grounded query: was the character supported by ground at the end of
    /// the last resolved move?
    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn state(&self) -> &CharacterState {
        &self.state
    }

    pub fn animation_mut(&mut self) -> &mut AnimationPlayer {
        &mut self.animation
    }

    fn set_action(&mut self, action: Action, pressed: bool) {
        match action {
            Action::Forward => self.state.forward = pressed,
            Action::Backward => self.state.backward = pressed,
            Action::Left => self.state.left = pressed,
            Action::Right => self.state.right = pressed,
            Action::Sprint => self.state.sprint = pressed,
            Action::Jump => self.state.jump = pressed,
        }
    }

    fn refresh_input_direction(&mut self) {
        let state = &mut self.state;
        state.input_direction.x = (state.right as i8 - state.left as i8) as f32;
        state.input_direction.z = (state.backward as i8 - state.forward as i8) as f32;
        state.input_direction.y = 1.0;
    }

    fn integrate_velocity(&mut self, delta: f32, grounded: bool) {
        let tuning = &self.tuning;
        let state = &mut self.state;

        // The jump flag is consumed even while airborne so a press during
        // airtime does not queue an impulse for the next landing. Residual
        // fall velocity from the landing tick is wiped first, otherwise it
        // would swallow the impulse.
        if state.jump {
            if grounded {
                state.velocity.y = state.velocity.y.max(0.0) + tuning.jump_speed;
            }
            state.jump = false;
        }

        // Friction and gravity integrate every tick. The grounded branch
        // below overwrites the horizontal components, so friction only
        // shows through as airborne decay.
        state.velocity.x += tuning.friction * delta;
        state.velocity.z += tuning.friction * delta;
        state.velocity.y += tuning.gravity * 2.0 * delta;

        if grounded {
            let speed = if state.sprint {
                tuning.run_speed
            } else {
                tuning.walk_speed
            };

            // Snap horizontal speed to the target, split across the active
            // axes; zero-length input means exactly zero, immediately
            let dir_x = state.input_direction.x.abs();
            let dir_z = state.input_direction.z.abs();
            let len = (dir_x * dir_x + dir_z * dir_z).sqrt();
            if len > 0.0 {
                state.velocity.x = dir_x / len * speed;
                state.velocity.z = dir_z / len * speed;
            } else {
                state.velocity.x = 0.0;
                state.velocity.z = 0.0;
            }

            // No residual sink on landing
            state.velocity.y = state.velocity.y.max(0.0);
        }

        state.velocity.x = state.velocity.x.max(0.0);
        state.velocity.z = state.velocity.z.max(0.0);
    }

    /// Scale the displacement down while the avatar is still turning toward
    /// its direction of travel, and slerp facing toward the target yaw.
    /// Prevents full-speed sideways sliding before the turn completes.
    fn apply_rotation_influence(&mut self, delta: f32) {
        let movement = self.state.frame_movement;
        let target_yaw = movement.x.atan2(movement.z);
        let target = UnitQuaternion::from_euler_angles(0.0, target_yaw, 0.0);
        self.state.target_facing = target;

        let mut scene = self.scene.borrow_mut();
        let current = match scene.world_rotation(self.node) {
            Ok(rotation) => rotation,
            Err(err) => {
                log::warn!("character node missing during rotation: {err}");
                return;
            }
        };

        let angle = current.angle_to(&target);
        let factor = (1.0 - angle / FRAC_PI_2).max(0.0);
        self.state.frame_movement *= factor;

        let t = (self.tuning.rotation_speed * delta).min(1.0);
        let next = current.try_slerp(&target, t, 1e-6).unwrap_or(target);
        if let Err(err) = scene.set_world_rotation(self.node, next) {
            log::warn!("character node missing during rotation: {err}");
        }
    }

    fn apply_movement(&mut self) {
        let next = {
            let mut physics = self.physics.borrow_mut();
            let Some(current) = physics.collider_translation(self.collider) else {
                return;
            };
            let next = current + self.state.frame_movement;
            physics.set_collider_translation(self.collider, next);
            next
        };

        if let Err(err) = self.scene.borrow_mut().set_world_translation(self.node, next) {
            log::warn!("character node missing during move: {err}");
        }
    }

    fn select_animation(&mut self, grounded: bool, moving: bool) {
        if !grounded {
            return;
        }
        if moving {
            let clip = if self.state.sprint { "run" } else { "walk" };
            self.animation.play(clip);
        } else {
            self.animation.play("idle");
        }
    }
}

impl KeyboardListener for CharacterController {
    fn on_key_down(&mut self, key: KeyCode) {
        match self.bindings.action_for(key) {
            Some(action) => self.set_action(action, true),
            None => log::debug!("ignoring unbound key {key:?}"),
        }
    }

    fn on_key_up(&mut self, key: KeyCode) {
        match self.bindings.action_for(key) {
            Some(action) => self.set_action(action, false),
            None => log::debug!("ignoring unbound key {key:?}"),
        }
    }
}

impl Updatable for CharacterController {
    fn update(&mut self, delta: f32) {
        let grounded = self.grounded;

        // Airborne ticks keep the previous direction: momentum and aim
        // carry through the jump
        if grounded {
            self.refresh_input_direction();
        }

        self.integrate_velocity(delta, grounded);

        let mut desired = self
            .state
            .input_direction
            .component_mul(&self.state.velocity)
            * delta;

        // Standing or walking on the ground the vertical component is zero;
        // keep a small downward probe so floor contact carries tick to tick.
        // A jump tick has a positive component and skips it.
        if grounded && desired.y <= 0.0 {
            desired.y = -GROUND_PROBE;
        }

        let resolved = self
            .physics
            .borrow()
            .move_character(&self.controller, self.collider, desired, delta);
        let (corrected, now_grounded) = match resolved {
            Ok(result) => result,
            Err(err) => {
                log::warn!("character move failed: {err}");
                return;
            }
        };
        self.state.frame_movement = corrected;
        self.grounded = now_grounded;

        let horizontal =
            (corrected.x * corrected.x + corrected.z * corrected.z).sqrt();
        let moving = horizontal > MOVE_EPSILON;
        if moving && grounded {
            self.apply_rotation_influence(delta);
        }

        self.apply_movement();
        self.select_animation(grounded, moving);
        self.animation.update(delta);
    }
}
