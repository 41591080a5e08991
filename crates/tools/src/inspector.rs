use glam::Vec3;
use haunt_common::NodeId;
use haunt_kernel::{NodeKind, Scene};
use haunt_stream::{LoadCounts, LoadState, LoadTracker};

/// Scene inspector for developer tooling.
///
/// Read-only queries against the scene for the debug panel and the CLI.
pub struct SceneInspector;

impl SceneInspector {
    /// Produce a summary of the scene and its loads.
    pub fn summary(scene: &Scene, tracker: &LoadTracker, ghost: Option<NodeId>) -> SceneSummary {
        SceneSummary {
            nodes: scene.graph.len(),
            mesh_nodes: scene.mesh_count(),
            materials: scene.assets.material_count(),
            textures: scene.assets.texture_count(),
            lights: scene.lights().len(),
            load_state: tracker.state(),
            loads: tracker.counts(),
            ghost_position: ghost.and_then(|id| scene.graph.world_position(id)),
        }
    }

    pub fn inspect_node(scene: &Scene, id: NodeId) -> Option<NodeInfo> {
        let node = scene.graph.get(id)?;
        let kind = match &node.kind {
            NodeKind::Group => "group",
            NodeKind::Mesh(_) => "mesh",
            NodeKind::Light(_) => "light",
        };
        Some(NodeInfo {
            id,
            name: node.name.clone(),
            kind,
            position: node.transform.position,
            world_position: scene.graph.world_position(id).unwrap_or(node.transform.position),
            scale: node.transform.scale,
            children: node.children().len(),
        })
    }

    /// Top-level nodes with their names, in insertion order.
    pub fn list_roots(scene: &Scene) -> Vec<(NodeId, String)> {
        scene
            .graph
            .roots()
            .iter()
            .filter_map(|id| scene.graph.get(*id).map(|n| (*id, n.name.clone())))
            .collect()
    }
}

/// Summary of scene state for the inspector.
#[derive(Debug, Clone)]
pub struct SceneSummary {
    pub nodes: usize,
    pub mesh_nodes: usize,
    pub materials: usize,
    pub textures: usize,
    pub lights: usize,
    pub load_state: LoadState,
    pub loads: LoadCounts,
    pub ghost_position: Option<Vec3>,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: nodes={} meshes={} materials={} textures={} lights={} state={:?} models loaded={} failed={}",
            self.nodes,
            self.mesh_nodes,
            self.materials,
            self.textures,
            self.lights,
            self.load_state,
            self.loads.models_loaded,
            self.loads.models_failed,
        )?;
        if let Some(p) = self.ghost_position {
            write!(f, " ghost=({:.2}, {:.2}, {:.2})", p.x, p.y, p.z)?;
        }
        Ok(())
    }
}

/// Detailed info about a single node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub name: String,
    pub kind: &'static str,
    pub position: Vec3,
    pub world_position: Vec3,
    pub scale: Vec3,
    pub children: usize,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} [{}] {} world=({:.2}, {:.2}, {:.2}) scale=({:.2}, {:.2}, {:.2}) children={}",
            self.name,
            self.id.short(),
            self.kind,
            self.world_position.x,
            self.world_position.y,
            self.world_position.z,
            self.scale.x,
            self.scale.y,
            self.scale.z,
            self.children,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haunt_common::{Color, Transform};
    use haunt_kernel::{AmbientLight, Light};

    #[test]
    fn summary_empty_scene() {
        let summary = SceneInspector::summary(
            &Scene::default(),
            &LoadTracker::new(["tree", "ghost"]),
            None,
        );
        assert_eq!(summary.nodes, 0);
        assert_eq!(summary.load_state, LoadState::Loading);
        assert!(summary.ghost_position.is_none());
    }

    #[test]
    fn summary_reports_ghost_world_position() {
        let mut scene = Scene::default();
        let ghost = scene
            .graph
            .add_group(None, "ghost", Transform::from_position(Vec3::new(0.0, 0.25, 7.0)))
            .unwrap();
        scene
            .add_light(
                None,
                "ambient",
                Vec3::ZERO,
                Light::Ambient(AmbientLight {
                    color: Color::WHITE,
                    intensity: 0.3,
                }),
            )
            .unwrap();
        let mut tracker = LoadTracker::new(["ghost"]);
        tracker.model_loaded("ghost");

        let summary = SceneInspector::summary(&scene, &tracker, Some(ghost));
        assert_eq!(summary.nodes, 2);
        assert_eq!(summary.lights, 1);
        assert_eq!(summary.load_state, LoadState::ReadyFull);
        assert_eq!(summary.ghost_position, Some(Vec3::new(0.0, 0.25, 7.0)));
        assert!(summary.to_string().contains("ghost=(0.00, 0.25, 7.00)"));
    }

    #[test]
    fn inspect_node_found_and_missing() {
        let mut scene = Scene::default();
        let house = scene
            .graph
            .add_group(None, "house", Transform::from_position(Vec3::X))
            .unwrap();
        let door = scene
            .graph
            .add_group(Some(house), "door", Transform::from_position(Vec3::Z))
            .unwrap();

        let info = SceneInspector::inspect_node(&scene, door).unwrap();
        assert_eq!(info.name, "door");
        assert_eq!(info.world_position, Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(SceneInspector::inspect_node(&scene, house).unwrap().children, 1);
        assert!(SceneInspector::inspect_node(&scene, NodeId::new()).is_none());
    }

    #[test]
    fn list_roots_in_order() {
        let mut scene = Scene::default();
        scene.graph.add_group(None, "house", Transform::default()).unwrap();
        scene.graph.add_group(None, "graves", Transform::default()).unwrap();
        let names: Vec<String> = SceneInspector::list_roots(&scene)
            .into_iter()
            .map(|(_, n)| n)
            .collect();
        assert_eq!(names, ["house", "graves"]);
    }
}
