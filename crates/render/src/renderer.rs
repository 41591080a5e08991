use crate::camera::PerspectiveCamera;
use haunt_common::NodeId;
use haunt_kernel::{Node, NodeKind, Scene};
use std::fmt::Write;

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// A renderer reads the scene and a camera and produces output. It never
/// mutates the scene.
pub trait Renderer {
    type Output;

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> Self::Output;
}

/// Renders the scene graph as an indented text tree.
///
/// Used by the CLI and in tests.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Collapse runs of same-named siblings (e.g. `grave0..grave29`).
    pub collapse_siblings: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collapsed() -> Self {
        Self {
            collapse_siblings: true,
        }
    }

    fn write_node(&self, out: &mut String, scene: &Scene, id: NodeId, depth: usize) {
        let Some(node) = scene.graph.get(id) else {
            return;
        };
        let p = node.transform.position;
        let _ = writeln!(
            out,
            "{:indent$}- {} [{}] {} pos=({:.2}, {:.2}, {:.2}){}",
            "",
            node.name,
            id.short(),
            describe(node),
            p.x,
            p.y,
            p.z,
            if node.visible { "" } else { " hidden" },
            indent = depth * 2
        );

        let children = node.children();
        if self.collapse_siblings && children.len() > 8 {
            for child in &children[..3] {
                self.write_node(out, scene, *child, depth + 1);
            }
            let _ = writeln!(
                out,
                "{:indent$}  ... {} more",
                "",
                children.len() - 3,
                indent = depth * 2
            );
        } else {
            for child in children {
                self.write_node(out, scene, *child, depth + 1);
            }
        }
    }
}

fn describe(node: &Node) -> String {
    match &node.kind {
        NodeKind::Group => "group".to_string(),
        NodeKind::Mesh(mesh) => format!(
            "mesh#{} mat#{}{}{}",
            mesh.mesh.0,
            mesh.material.0,
            if mesh.cast_shadow { " cast" } else { "" },
            if mesh.receive_shadow { " recv" } else { "" }
        ),
        NodeKind::Light(light) => format!(
            "light {} {:.2}",
            light.color().to_hex(),
            light.intensity()
        ),
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&mut self, scene: &Scene, camera: &PerspectiveCamera) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "=== Scene (nodes={}, meshes={}, materials={}, textures={}) ===",
            scene.graph.len(),
            scene.assets.mesh_count(),
            scene.assets.material_count(),
            scene.assets.texture_count()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            camera.position.x,
            camera.position.y,
            camera.position.z,
            camera.target.x,
            camera.target.y,
            camera.target.z,
            camera.fov
        );
        let fog = scene.environment.fog;
        let _ = writeln!(out, "Fog: exp2 {} density={}", fog.color.to_hex(), fog.density);
        for root in scene.graph.roots() {
            self.write_node(&mut out, scene, *root, 0);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haunt_common::Transform;

    #[test]
    fn empty_scene() {
        let output = DebugTextRenderer::new().render(&Scene::default(), &PerspectiveCamera::default());
        assert!(output.contains("nodes=0"));
        assert!(output.contains("fov=75"));
        assert!(output.contains("#06343f"));
    }

    #[test]
    fn nested_nodes_are_indented() {
        let mut scene = Scene::default();
        let house = scene.graph.add_group(None, "house", Transform::default()).unwrap();
        scene
            .graph
            .add_group(Some(house), "walls", Transform::default())
            .unwrap();
        let output = DebugTextRenderer::new().render(&scene, &PerspectiveCamera::default());
        assert!(output.contains("\n- house"));
        assert!(output.contains("\n  - walls"));
    }

    #[test]
    fn collapse_long_child_lists() {
        let mut scene = Scene::default();
        let graves = scene.graph.add_group(None, "graves", Transform::default()).unwrap();
        for i in 0..30 {
            scene
                .graph
                .add_group(Some(graves), format!("grave{i}"), Transform::default())
                .unwrap();
        }
        let output = DebugTextRenderer::collapsed().render(&scene, &PerspectiveCamera::default());
        assert!(output.contains("grave2"));
        assert!(!output.contains("grave3 "));
        assert!(output.contains("... 27 more"));
    }
}
