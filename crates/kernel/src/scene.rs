use crate::environment::Environment;
use crate::graph::{MeshNode, NodeKind, SceneError, SceneGraph};
use crate::light::Light;
use glam::{Mat4, Vec3};
use haunt_assets::{AssetStore, Geometry, MaterialHandle, ModelData, ModelNode, StandardMaterial};
use haunt_common::{NodeId, Transform};

/// A light resolved to world space for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedLight {
    pub node: NodeId,
    pub light: Light,
    pub position: Vec3,
}

/// The complete scene: object graph, the assets it references, and the
/// shared environment.
#[derive(Debug, Default)]
pub struct Scene {
    pub graph: SceneGraph,
    pub assets: AssetStore,
    pub environment: Environment,
}

impl Scene {
    pub fn new(environment: Environment) -> Self {
        Self {
            graph: SceneGraph::new(),
            assets: AssetStore::new(),
            environment,
        }
    }

    /// Register geometry and material, then add a mesh node for them.
    pub fn add_mesh(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        transform: Transform,
        geometry: Geometry,
        material: StandardMaterial,
    ) -> Result<(NodeId, MeshNode), SceneError> {
        let mesh = MeshNode::new(
            self.assets.add_mesh(geometry),
            self.assets.add_material(material),
        );
        let id = self.graph.add(parent, name, transform, NodeKind::Mesh(mesh))?;
        Ok((id, mesh))
    }

    pub fn add_light(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        position: Vec3,
        light: Light,
    ) -> Result<NodeId, SceneError> {
        self.graph
            .add(parent, name, Transform::from_position(position), NodeKind::Light(light))
    }

    /// Copy an imported model into the graph under a new group node.
    ///
    /// Geometry, materials and embedded textures move into the asset store.
    pub fn instantiate_model(
        &mut self,
        parent: Option<NodeId>,
        transform: Transform,
        model: ModelData,
    ) -> Result<NodeId, SceneError> {
        let ModelData {
            name,
            roots,
            textures,
        } = model;
        for (id, data) in textures {
            self.assets.insert_texture(id, data);
        }
        let root = self.graph.add_group(parent, name, transform)?;
        for node in roots {
            self.instantiate_node(root, node)?;
        }
        tracing::debug!(
            "instantiated model with {} nodes",
            self.graph.descendants(root).len()
        );
        Ok(root)
    }

    fn instantiate_node(&mut self, parent: NodeId, node: ModelNode) -> Result<(), SceneError> {
        let ModelNode {
            name,
            transform,
            primitives,
            children,
        } = node;
        let name = name.unwrap_or_else(|| "node".to_string());
        let id = self.graph.add_group(Some(parent), name.clone(), transform)?;
        for (i, primitive) in primitives.into_iter().enumerate() {
            self.add_mesh(
                Some(id),
                format!("{name}#{i}"),
                Transform::default(),
                primitive.geometry,
                primitive.material,
            )?;
        }
        for child in children {
            self.instantiate_node(id, child)?;
        }
        Ok(())
    }

    /// Distinct materials used by meshes in the subtree rooted at `root`.
    pub fn materials_under(&self, root: NodeId) -> Vec<MaterialHandle> {
        let mut handles: Vec<MaterialHandle> = self
            .graph
            .meshes_under(root)
            .into_iter()
            .map(|(_, mesh)| mesh.material)
            .collect();
        handles.sort();
        handles.dedup();
        handles
    }

    /// Apply `f` to every material under `root`.
    pub fn update_materials_under(&mut self, root: NodeId, mut f: impl FnMut(&mut StandardMaterial)) {
        for handle in self.materials_under(root) {
            if let Some(material) = self.assets.material_mut(handle) {
                f(material);
            }
        }
    }

    /// Visible lights with their world positions, in graph order.
    pub fn lights(&self) -> Vec<PlacedLight> {
        let mut out = Vec::new();
        self.graph.traverse_visible(|node, n, world: Mat4| {
            if let NodeKind::Light(light) = n.kind {
                out.push(PlacedLight {
                    node,
                    light,
                    position: world.w_axis.truncate(),
                });
            }
        });
        out
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.graph.traverse_visible(|_, n, _| {
            if matches!(n.kind, NodeKind::Mesh(_)) {
                count += 1;
            }
        });
        count
    }
}
