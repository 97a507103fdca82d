//! Physics world wrapping Rapier 3D
//!
//! Colliders and rigid bodies are created from scene nodes; after each step
//! the simulated poses of dynamic bodies are written back into the nodes'
//! local transforms. This module is the sole writer of dynamics-driven node
//! transforms.

use atrium_core::{AtriumError, NodeId, Result};
use atrium_scene::Scene;
use nalgebra::{Point3, UnitQuaternion, Vector3};
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;
use std::collections::{HashMap, HashSet};

/// World gravity along -Y, meters per second squared
pub const GRAVITY: f32 = -9.81;

/// Wraps Rapier's physics pipeline and body/collider sets
pub struct PhysicsWorld {
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub gravity: Vector<Real>,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    /// Node -> dynamic rigid body. Iterated every step to mirror simulated
    /// poses back into the scene.
    bindings: HashMap<NodeId, RigidBodyHandle>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    /// Create a new physics world with standard gravity
    pub fn new() -> Self {
        Self {
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            gravity: vector![0.0, GRAVITY, 0.0],
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            bindings: HashMap::new(),
        }
    }

    /// Cuboid half-extents for a node: local bounding half-size scaled by
    /// the node's world scale. Nodes without geometry cannot back a body.
    fn scaled_half_extents(&self, scene: &Scene, node: NodeId) -> Result<Vector3<f32>> {
        let half = scene
            .get(node)
            .ok_or_else(|| AtriumError::NodeNotFound(node.to_string()))?
            .half_extents
            .ok_or_else(|| {
                AtriumError::NoGeometry(
                    scene.get(node).map(|n| n.name.clone()).unwrap_or_default(),
                )
            })?;
        Ok(half.component_mul(&scene.world_scale(node)?))
    }

    /// Register a node as an immovable obstacle: a box collider attached to
    /// a fixed rigid body at the node's current world pose.
    pub fn register_static(&mut self, scene: &Scene, node: NodeId) -> Result<ColliderHandle> {
        let half = self.scaled_half_extents(scene, node)?;
        let pose = scene.world_iso(node)?;

        let body = RigidBodyBuilder::fixed().position(pose).build();
        let body_handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::cuboid(half.x, half.y, half.z).build();
        let handle =
            self.collider_set
                .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);
        self.refresh_queries();
        Ok(handle)
    }

    /// Register a node as a gravity-driven body. Its simulated pose is
    /// written back into the node on every [`PhysicsWorld::step`].
    pub fn register_dynamic(&mut self, scene: &Scene, node: NodeId) -> Result<RigidBodyHandle> {
        let half = self.scaled_half_extents(scene, node)?;
        let pose = scene.world_iso(node)?;

        let body = RigidBodyBuilder::dynamic().position(pose).build();
        let body_handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::cuboid(half.x, half.y, half.z).build();
        self.collider_set
            .insert_with_parent(collider, body_handle, &mut self.rigid_body_set);

        self.bindings.insert(node, body_handle);
        self.refresh_queries();
        Ok(body_handle)
    }

    /// Register a node as a ray target only: a parentless sensor cuboid at
    /// the node's world pose. Sensors never block movement.
    pub fn register_sensor(&mut self, scene: &Scene, node: NodeId) -> Result<ColliderHandle> {
        let half = self.scaled_half_extents(scene, node)?;
        let pose = scene.world_iso(node)?;

        let collider = ColliderBuilder::cuboid(half.x, half.y, half.z)
            .sensor(true)
            .position(pose)
            .build();
        let handle = self.collider_set.insert(collider);
        self.refresh_queries();
        Ok(handle)
    }

    /// Create the character's collider: parentless, translation driven by
    /// the character controller rather than by dynamics.
    pub fn create_character_collider(
        &mut self,
        scene: &Scene,
        node: NodeId,
    ) -> Result<ColliderHandle> {
        let half = self.scaled_half_extents(scene, node)?;
        let pose = scene.world_iso(node)?;

        let collider = ColliderBuilder::cuboid(half.x, half.y, half.z)
            .position(pose)
            .build();
        let handle = self.collider_set.insert(collider);
        self.refresh_queries();
        Ok(handle)
    }

    /// A kinematic character controller with the fixed autostep policy:
    /// climbs steps up to 0.5 units tall when at least 0.2 units of ledge
    /// remain, never onto dynamic bodies.
    pub fn character_controller(&self, offset: f32) -> KinematicCharacterController {
        KinematicCharacterController {
            offset: CharacterLength::Absolute(offset),
            autostep: Some(CharacterAutostep {
                max_height: CharacterLength::Absolute(0.5),
                min_width: CharacterLength::Absolute(0.2),
                include_dynamic_bodies: false,
            }),
            ..KinematicCharacterController::default()
        }
    }

    /// Collision-resolve a desired character displacement.
    ///
    /// Returns the corrected displacement and whether the character ends the
    /// move supported by ground. The character's own collider and all
    /// sensors are excluded from the query.
    pub fn move_character(
        &self,
        controller: &KinematicCharacterController,
        collider: ColliderHandle,
        desired: Vector3<f32>,
        dt: f32,
    ) -> Result<(Vector3<f32>, bool)> {
        let collider_ref = self
            .collider_set
            .get(collider)
            .ok_or_else(|| AtriumError::PhysicsError("unknown character collider".into()))?;

        let movement = controller.move_shape(
            dt,
            &self.rigid_body_set,
            &self.collider_set,
            &self.query_pipeline,
            collider_ref.shape(),
            collider_ref.position(),
            desired,
            QueryFilter::default()
                .exclude_sensors()
                .exclude_collider(collider),
            |_| {},
        );

        Ok((movement.translation, movement.grounded))
    }

    /// Current world translation of a parentless collider
    pub fn collider_translation(&self, handle: ColliderHandle) -> Option<Vector3<f32>> {
        self.collider_set.get(handle).map(|c| *c.translation())
    }

    /// Move a parentless collider to a new world translation
    pub fn set_collider_translation(&mut self, handle: ColliderHandle, translation: Vector3<f32>) {
        if let Some(collider) = self.collider_set.get_mut(handle) {
            collider.set_translation(translation);
        }
    }

    /// Nearest ray hit restricted to the given collider handles.
    ///
    /// The `near` distance offsets the ray origin so geometry hugging the
    /// origin (the caster's own mesh) is skipped.
    pub fn cast_ray_among(
        &self,
        origin: Point3<f32>,
        dir: Vector3<f32>,
        near: f32,
        far: f32,
        targets: &HashSet<ColliderHandle>,
    ) -> Option<(ColliderHandle, f32)> {
        if targets.is_empty() || far <= near {
            return None;
        }

        let ray = Ray::new(origin + dir * near, dir);
        let predicate = |handle: ColliderHandle, _: &Collider| targets.contains(&handle);
        let filter = QueryFilter::new().predicate(&predicate);

        self.query_pipeline
            .cast_ray(
                &self.rigid_body_set,
                &self.collider_set,
                &ray,
                far - near,
                true,
                filter,
            )
            .map(|(handle, toi)| (handle, near + toi))
    }

    /// Step the simulation by `dt` seconds, then mirror every dynamic
    /// body's world pose back into its node's local transform (converting
    /// through the inverse parent pose, so nested nodes stay correct).
    pub fn step(&mut self, scene: &mut Scene, dt: f32) {
        self.integration_parameters.dt = dt;

        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );

        for (node, body_handle) in &self.bindings {
            let Some(body) = self.rigid_body_set.get(*body_handle) else {
                continue;
            };
            let translation: Vector3<f32> = *body.translation();
            let rotation: UnitQuaternion<f32> = *body.rotation();

            if let Err(err) = scene
                .set_world_translation(*node, translation)
                .and_then(|_| scene.set_world_rotation(*node, rotation))
            {
                log::warn!("failed to sync body pose to node {node}: {err}");
            }
        }
    }

    /// Refresh the query pipeline so ray casts and character moves see the
    /// collider poses as of now (stepping also refreshes it).
    pub fn refresh_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn scene_with_floor() -> (Scene, NodeId) {
        let mut scene = Scene::new();
        let floor = scene.spawn("floor_static").unwrap();
        {
            let node = scene.get_mut(floor).unwrap();
            node.half_extents = Some(Vector3::new(10.0, 0.5, 10.0));
        }
        (scene, floor)
    }

    #[test]
    fn test_register_without_geometry_fails() {
        let mut scene = Scene::new();
        let empty = scene.spawn("group").unwrap();
        let mut world = PhysicsWorld::new();

        assert!(matches!(
            world.register_static(&scene, empty),
            Err(AtriumError::NoGeometry(_))
        ));
        assert!(matches!(
            world.register_dynamic(&scene, empty),
            Err(AtriumError::NoGeometry(_))
        ));
    }

    #[test]
    fn test_collider_sized_by_world_scale() {
        let mut scene = Scene::new();
        let root = scene.spawn("root").unwrap();
        let child = scene.spawn_child(root, "crate_static").unwrap();
        scene.get_mut(root).unwrap().scale = Vector3::new(2.0, 2.0, 2.0);
        {
            let node = scene.get_mut(child).unwrap();
            node.half_extents = Some(Vector3::new(0.5, 0.5, 0.5));
        }

        let mut world = PhysicsWorld::new();
        let handle = world.register_static(&scene, child).unwrap();
        let shape = world.collider_set.get(handle).unwrap().shape();
        let cuboid = shape.as_cuboid().unwrap();
        assert!((cuboid.half_extents - Vector3::new(1.0, 1.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn test_dynamic_body_falls_then_rests() {
        let (mut scene, floor) = scene_with_floor();
        let ball = scene.spawn("crate").unwrap();
        {
            let node = scene.get_mut(ball).unwrap();
            node.half_extents = Some(Vector3::new(0.5, 0.5, 0.5));
            node.translation = Vector3::new(0.0, 2.0, 0.0);
        }

        let mut world = PhysicsWorld::new();
        world.register_static(&scene, floor).unwrap();
        world.register_dynamic(&scene, ball).unwrap();

        // Y never increases while in free fall; contact resolution below
        // the rest height may nudge it back up within solver tolerance
        let mut last_y = 2.0_f32;
        for _ in 0..240 {
            world.step(&mut scene, DT);
            let y = scene.world_translation(ball).unwrap().y;
            if last_y > 1.05 {
                assert!(y <= last_y + 1e-4);
            }
            last_y = y;
        }

        // Floor top at 0.5, box half-height 0.5: rest near y = 1.0
        assert!((last_y - 1.0).abs() < 0.1);

        // Stable after settling
        world.step(&mut scene, DT);
        let settled = scene.world_translation(ball).unwrap().y;
        assert!((settled - last_y).abs() < 1e-3);
    }

    #[test]
    fn test_dynamic_sync_respects_parent_frame() {
        let (mut scene, floor) = scene_with_floor();
        let rig = scene.spawn("rig").unwrap();
        scene.get_mut(rig).unwrap().translation = Vector3::new(3.0, 0.0, 0.0);
        scene.get_mut(rig).unwrap().rotation =
            UnitQuaternion::from_euler_angles(0.0, std::f32::consts::FRAC_PI_2, 0.0);

        let crate_node = scene.spawn_child(rig, "crate").unwrap();
        {
            let node = scene.get_mut(crate_node).unwrap();
            node.half_extents = Some(Vector3::new(0.5, 0.5, 0.5));
            node.translation = Vector3::new(0.0, 4.0, 0.0);
        }

        let mut world = PhysicsWorld::new();
        world.register_static(&scene, floor).unwrap();
        let body = world.register_dynamic(&scene, crate_node).unwrap();

        for _ in 0..120 {
            world.step(&mut scene, DT);
        }

        // Node world pose (through the rotated parent) matches the body pose
        let body_pos: Vector3<f32> = *world.rigid_body_set.get(body).unwrap().translation();
        let node_pos = scene.world_translation(crate_node).unwrap();
        assert!((body_pos - node_pos).norm() < 1e-3);
    }

    #[test]
    fn test_sensors_do_not_block_character_movement() {
        let (mut scene, floor) = scene_with_floor();

        // Sensor cuboid directly on the walk path
        let screen = scene.spawn("computer_screen").unwrap();
        {
            let node = scene.get_mut(screen).unwrap();
            node.half_extents = Some(Vector3::new(0.5, 0.5, 0.5));
            node.translation = Vector3::new(0.0, 1.0, -2.0);
        }

        let walker = scene.spawn("walker").unwrap();
        {
            let node = scene.get_mut(walker).unwrap();
            node.half_extents = Some(Vector3::new(0.25, 0.95, 0.25));
            node.translation = Vector3::new(0.0, 1.46, 0.0);
        }

        let mut world = PhysicsWorld::new();
        world.register_static(&scene, floor).unwrap();
        world.register_sensor(&scene, screen).unwrap();
        let collider = world.create_character_collider(&scene, walker).unwrap();
        let controller = world.character_controller(0.01);

        // March straight through the sensor's position
        for _ in 0..60 {
            let (corrected, _) = world
                .move_character(
                    &controller,
                    collider,
                    Vector3::new(0.0, -0.02, -0.1),
                    DT,
                )
                .unwrap();
            let current = world.collider_translation(collider).unwrap();
            world.set_collider_translation(collider, current + corrected);
        }

        let z = world.collider_translation(collider).unwrap().z;
        assert!(z < -4.0, "character stopped at z = {z}");
    }

    #[test]
    fn test_cast_ray_among_picks_nearest_target() {
        let mut scene = Scene::new();
        let near_node = scene.spawn("computer_screen").unwrap();
        {
            let node = scene.get_mut(near_node).unwrap();
            node.half_extents = Some(Vector3::new(0.5, 0.5, 0.5));
            node.translation = Vector3::new(0.0, 0.0, -3.0);
        }
        let far_node = scene.spawn("computer_tower").unwrap();
        {
            let node = scene.get_mut(far_node).unwrap();
            node.half_extents = Some(Vector3::new(0.5, 0.5, 0.5));
            node.translation = Vector3::new(0.0, 0.0, -6.0);
        }

        let mut world = PhysicsWorld::new();
        let near_handle = world.register_sensor(&scene, near_node).unwrap();
        let far_handle = world.register_sensor(&scene, far_node).unwrap();

        let targets: HashSet<ColliderHandle> = [near_handle, far_handle].into_iter().collect();
        let hit = world.cast_ray_among(
            Point3::origin(),
            -Vector3::z(),
            0.1,
            10.0,
            &targets,
        );
        assert_eq!(hit.map(|(h, _)| h), Some(near_handle));

        // Restricting the target set skips the nearer collider
        let only_far: HashSet<ColliderHandle> = [far_handle].into_iter().collect();
        let hit = world.cast_ray_among(Point3::origin(), -Vector3::z(), 0.1, 10.0, &only_far);
        assert_eq!(hit.map(|(h, _)| h), Some(far_handle));

        // Out of range
        let hit = world.cast_ray_among(Point3::origin(), -Vector3::z(), 0.1, 2.0, &targets);
        assert!(hit.is_none());
    }
}
