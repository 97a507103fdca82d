//! Scene arena with stable IDs and parent/child transforms

use atrium_core::{AtriumError, NodeId, Result};
use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use std::collections::HashMap;

/// A single scene node: a named transform, optionally with bounding geometry.
///
/// `half_extents` is the node's local axis-aligned bounding box half-size.
/// Nodes without it (group/empty nodes) cannot back a physics collider.
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
    pub scale: Vector3<f32>,
    pub half_extents: Option<Vector3<f32>>,
}

impl Node {
    fn new(name: String, parent: Option<NodeId>) -> Self {
        Self {
            name,
            parent,
            translation: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            scale: Vector3::new(1.0, 1.0, 1.0),
            half_extents: None,
        }
    }
}

/// The scene arena.
///
/// Node names are unique so loaders can address nodes by the conventions
/// baked into the source assets (e.g. `"floor_static"`, `"computer_screen"`).
pub struct Scene {
    nodes: HashMap<NodeId, Node>,
    name_map: HashMap<String, NodeId>,
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a new empty scene
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            name_map: HashMap::new(),
            children: HashMap::new(),
        }
    }

    /// Spawn a root-level node with a name
    pub fn spawn(&mut self, name: impl Into<String>) -> Result<NodeId> {
        self.spawn_inner(name.into(), None)
    }

    /// Spawn a node under a parent
    pub fn spawn_child(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return Err(AtriumError::NodeNotFound(parent.to_string()));
        }
        self.spawn_inner(name.into(), Some(parent))
    }

    fn spawn_inner(&mut self, name: String, parent: Option<NodeId>) -> Result<NodeId> {
        if self.name_map.contains_key(&name) {
            return Err(AtriumError::DuplicateNodeName(name));
        }

        let id = NodeId::new();
        self.name_map.insert(name.clone(), id);
        self.nodes.insert(id, Node::new(name, parent));

        if let Some(parent) = parent {
            self.children.entry(parent).or_default().push(id);
        }

        Ok(id)
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Look up a node by name
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.name_map.get(name).copied()
    }

    /// Direct children of a node
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All nodes of the subtree rooted at `id`, excluding `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend_from_slice(self.children(next));
        }
        out
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(&id)
            .ok_or_else(|| AtriumError::NodeNotFound(id.to_string()))
    }

    /// World pose (translation + rotation) of a node, composed through parents
    pub fn world_iso(&self, id: NodeId) -> Result<Isometry3<f32>> {
        let node = self.node(id)?;
        let local = Isometry3::from_parts(Translation3::from(node.translation), node.rotation);
        match node.parent {
            Some(parent) => Ok(self.world_iso(parent)? * local),
            None => Ok(local),
        }
    }

    /// World pose of a node's parent (identity for root nodes)
    pub fn parent_iso(&self, id: NodeId) -> Result<Isometry3<f32>> {
        match self.node(id)?.parent {
            Some(parent) => self.world_iso(parent),
            None => Ok(Isometry3::identity()),
        }
    }

    /// World-space translation of a node
    pub fn world_translation(&self, id: NodeId) -> Result<Vector3<f32>> {
        Ok(self.world_iso(id)?.translation.vector)
    }

    /// World-space rotation of a node
    pub fn world_rotation(&self, id: NodeId) -> Result<UnitQuaternion<f32>> {
        Ok(self.world_iso(id)?.rotation)
    }

    /// Component-wise world scale of a node (product along the parent chain)
    pub fn world_scale(&self, id: NodeId) -> Result<Vector3<f32>> {
        let node = self.node(id)?;
        match node.parent {
            Some(parent) => Ok(self.world_scale(parent)?.component_mul(&node.scale)),
            None => Ok(node.scale),
        }
    }

    /// World-space forward vector of a node (engine convention: -Z)
    pub fn forward(&self, id: NodeId) -> Result<Vector3<f32>> {
        Ok(self.world_rotation(id)? * -Vector3::z())
    }

    /// Set a node's translation from a world-space position, converting
    /// through the inverse parent pose so nested nodes stay correct
    pub fn set_world_translation(&mut self, id: NodeId, world: Vector3<f32>) -> Result<()> {
        let inv_parent = self.parent_iso(id)?.inverse();
        let local = inv_parent.transform_point(&world.into());
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| AtriumError::NodeNotFound(id.to_string()))?;
        node.translation = local.coords;
        Ok(())
    }

    /// Set a node's rotation from a world-space orientation, converting
    /// out of the parent's world-rotation frame
    pub fn set_world_rotation(&mut self, id: NodeId, world: UnitQuaternion<f32>) -> Result<()> {
        let inv_parent = self.parent_iso(id)?.rotation.inverse();
        let local = inv_parent * world;
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| AtriumError::NodeNotFound(id.to_string()))?;
        node.rotation = local;
        Ok(())
    }
}
