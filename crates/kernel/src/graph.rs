use crate::light::Light;
use glam::{Mat3, Mat4, Quat, Vec3};
use haunt_assets::{MaterialHandle, MeshHandle};
use haunt_common::{NodeId, Transform};
use std::collections::BTreeMap;

/// Errors from scene graph operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("node {0:?} not found")]
    NodeNotFound(NodeId),
}

/// Drawable payload: a mesh rendered with a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshNode {
    pub mesh: MeshHandle,
    pub material: MaterialHandle,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl MeshNode {
    pub fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self {
            mesh,
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    pub fn with_shadows(mut self, cast: bool, receive: bool) -> Self {
        self.cast_shadow = cast;
        self.receive_shadow = receive;
        self
    }
}

/// What a node carries besides its transform.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh(MeshNode),
    Light(Light),
}

/// A node in the scene graph.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub kind: NodeKind,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Hierarchy of transform nodes.
///
/// Nodes are stored flat in a BTreeMap keyed by id; the tree shape lives in
/// each node's parent link and ordered child list. Root order is insertion
/// order, which is also draw-list order.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, Node>,
    roots: Vec<NodeId>,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Add a node under `parent`, or as a root when `parent` is `None`.
    pub fn add(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        transform: Transform,
        kind: NodeKind,
    ) -> Result<NodeId, SceneError> {
        let id = NodeId::new();
        match parent {
            Some(parent_id) => self
                .nodes
                .get_mut(&parent_id)
                .ok_or(SceneError::NodeNotFound(parent_id))?
                .children
                .push(id),
            None => self.roots.push(id),
        }
        self.nodes.insert(
            id,
            Node {
                name: name.into(),
                transform,
                kind,
                visible: true,
                parent,
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    /// Convenience for an empty group.
    pub fn add_group(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        transform: Transform,
    ) -> Result<NodeId, SceneError> {
        self.add(parent, name, transform, NodeKind::Group)
    }

    /// Remove a node and its subtree. Returns the number of nodes removed.
    pub fn remove(&mut self, id: NodeId) -> Result<usize, SceneError> {
        let parent = self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))?.parent;
        match parent {
            Some(parent_id) => {
                if let Some(p) = self.nodes.get_mut(&parent_id) {
                    p.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
        let doomed = self.descendants(id);
        for node in &doomed {
            self.nodes.remove(node);
        }
        Ok(doomed.len())
    }

    /// `id` followed by all nodes below it, depth-first pre-order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.nodes.get(&current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Mesh payloads in the subtree rooted at `id`.
    pub fn meshes_under(&self, id: NodeId) -> Vec<(NodeId, MeshNode)> {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match self.nodes.get(&n)?.kind {
                NodeKind::Mesh(mesh) => Some((n, mesh)),
                _ => None,
            })
            .collect()
    }

    /// Local-to-world matrix of a node.
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let node = self.nodes.get(&id)?;
        let local = node.transform.matrix();
        match node.parent {
            Some(parent) => Some(self.world_matrix(parent)? * local),
            None => Some(local),
        }
    }

    pub fn world_position(&self, id: NodeId) -> Option<Vec3> {
        self.world_matrix(id).map(|m| m.w_axis.truncate())
    }

    /// Rotate `id` so its local +Z axis points at a world-space target.
    pub fn look_at(&mut self, id: NodeId, target: Vec3) -> Result<(), SceneError> {
        let node = self.nodes.get(&id).ok_or(SceneError::NodeNotFound(id))?;
        let parent = node.parent;
        let position = self
            .world_position(id)
            .ok_or(SceneError::NodeNotFound(id))?;

        let world_rotation = look_rotation(position, target);
        let parent_rotation = parent
            .and_then(|p| self.world_matrix(p))
            .map(|m| m.to_scale_rotation_translation().1)
            .unwrap_or(Quat::IDENTITY);

        if let Some(node) = self.nodes.get_mut(&id) {
            node.transform.rotation = parent_rotation.inverse() * world_rotation;
        }
        Ok(())
    }

    /// Visit every visible node depth-first with its world matrix.
    ///
    /// Hidden nodes prune their subtree.
    pub fn traverse_visible(&self, mut visit: impl FnMut(NodeId, &Node, Mat4)) {
        let mut stack: Vec<(NodeId, Mat4)> =
            self.roots.iter().rev().map(|r| (*r, Mat4::IDENTITY)).collect();
        while let Some((id, parent_world)) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if !node.visible {
                continue;
            }
            let world = parent_world * node.transform.matrix();
            visit(id, node, world);
            stack.extend(node.children.iter().rev().map(|c| (*c, world)));
        }
    }

}

/// Rotation whose +Z axis points from `eye` toward `target`, keeping +Y up.
fn look_rotation(eye: Vec3, target: Vec3) -> Quat {
    let mut z = target - eye;
    if z.length_squared() < f32::EPSILON {
        z = Vec3::Z;
    }
    z = z.normalize();
    let mut x = Vec3::Y.cross(z);
    if x.length_squared() < f32::EPSILON {
        // Looking straight up or down: nudge off the pole.
        z.x += 1e-4;
        z = z.normalize();
        x = Vec3::Y.cross(z);
    }
    x = x.normalize();
    let y = z.cross(x);
    Quat::from_mat3(&Mat3::from_cols(x, y, z))
}
