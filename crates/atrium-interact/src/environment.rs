//! Environment scene registration by naming convention
//!
//! Loaded scenes flag their sub-objects through node names: a name
//! containing `"static"` marks an immovable obstacle, a `"computer"`
//! prefix marks an interaction target. This walks a loaded subtree and
//! registers accordingly.

use atrium_core::{NodeId, Result};
use atrium_physics::PhysicsWorld;
use atrium_scene::Scene;

/// What a subtree walk found and registered
pub struct Environment {
    /// Nodes registered as fixed obstacles
    pub statics: Vec<NodeId>,
    /// Nodes flagged as interaction targets, for the caller to wrap in
    /// interactables
    pub interactive: Vec<NodeId>,
}

/// Walk the subtree under `root` and register flagged nodes.
///
/// A node flagged static without geometry is a hard error: its collider
/// would be undefined, so registration aborts rather than skipping it.
pub fn register_environment(
    scene: &Scene,
    physics: &mut PhysicsWorld,
    root: NodeId,
) -> Result<Environment> {
    let mut environment = Environment {
        statics: Vec::new(),
        interactive: Vec::new(),
    };

    for node in scene.descendants(root) {
        let Some(name) = scene.get(node).map(|n| n.name.clone()) else {
            continue;
        };

        if name.contains("static") {
            physics.register_static(scene, node)?;
            environment.statics.push(node);
            log::debug!("registered static obstacle: {name}");
        } else if name.starts_with("computer") {
            environment.interactive.push(node);
            log::debug!("flagged interaction target: {name}");
        }
    }

    Ok(environment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_core::AtriumError;
    use nalgebra::Vector3;

    fn boxed(scene: &mut Scene, parent: NodeId, name: &str) -> NodeId {
        let node = scene.spawn_child(parent, name).unwrap();
        scene.get_mut(node).unwrap().half_extents = Some(Vector3::new(1.0, 1.0, 1.0));
        node
    }

    #[test]
    fn test_registers_by_naming_convention() {
        let mut scene = Scene::new();
        let root = scene.spawn("environment").unwrap();
        let wall = boxed(&mut scene, root, "wall_static");
        let floor = boxed(&mut scene, root, "static_floor");
        let screen = boxed(&mut scene, root, "computer_screen");
        boxed(&mut scene, root, "plant_decor");

        let mut physics = PhysicsWorld::new();
        let environment = register_environment(&scene, &mut physics, root).unwrap();

        assert!(environment.statics.contains(&wall));
        assert!(environment.statics.contains(&floor));
        assert_eq!(environment.statics.len(), 2);
        assert_eq!(environment.interactive, vec![screen]);
        assert_eq!(physics.collider_set.len(), 2);
    }

    #[test]
    fn test_static_without_geometry_is_hard_error() {
        let mut scene = Scene::new();
        let root = scene.spawn("environment").unwrap();
        scene.spawn_child(root, "group_static").unwrap();

        let mut physics = PhysicsWorld::new();
        assert!(matches!(
            register_environment(&scene, &mut physics, root),
            Err(AtriumError::NoGeometry(_))
        ));
    }

    #[test]
    fn test_nested_nodes_are_walked() {
        let mut scene = Scene::new();
        let root = scene.spawn("environment").unwrap();
        let desk = scene.spawn_child(root, "desk").unwrap();
        let screen = boxed(&mut scene, desk, "computer_monitor");

        let mut physics = PhysicsWorld::new();
        let environment = register_environment(&scene, &mut physics, root).unwrap();
        assert_eq!(environment.interactive, vec![screen]);
    }
}
