use crate::assemble::SceneHandles;
use crate::config::{ModelPlacement, SceneConfig};
use haunt_assets::ModelData;
use haunt_common::{NodeId, Transform};
use haunt_kernel::{Scene, SceneError};
use serde::{Deserialize, Serialize};

/// The models loaded after startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSlot {
    Tree,
    Ghost,
}

impl ModelSlot {
    pub const ALL: [ModelSlot; 2] = [ModelSlot::Tree, ModelSlot::Ghost];

    pub fn key(&self) -> &'static str {
        match self {
            ModelSlot::Tree => "tree",
            ModelSlot::Ghost => "ghost",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    pub fn placement<'a>(&self, config: &'a SceneConfig) -> &'a ModelPlacement {
        match self {
            ModelSlot::Tree => &config.models.tree,
            ModelSlot::Ghost => &config.models.ghost,
        }
    }
}

/// Add a loaded model to the scene at its configured placement.
///
/// The ghost's materials become translucent and glow. Attaching a slot
/// that is already filled replaces the old subtree.
pub fn attach_model(
    scene: &mut Scene,
    handles: &mut SceneHandles,
    config: &SceneConfig,
    slot: ModelSlot,
    model: ModelData,
) -> Result<NodeId, SceneError> {
    let placement = slot.placement(config);
    let transform = Transform::from_position(placement.position)
        .with_scale(placement.scale)
        .with_euler(0.0, placement.rotation_y, 0.0);

    let existing = match slot {
        ModelSlot::Tree => handles.tree.take(),
        ModelSlot::Ghost => handles.ghost.take(),
    };
    if let Some(old) = existing {
        scene.graph.remove(old)?;
    }

    let primitives = model.primitive_count();
    let root = scene.instantiate_model(None, transform, model)?;
    if let Some(node) = scene.graph.get_mut(root) {
        node.name = slot.key().to_string();
    }

    match slot {
        ModelSlot::Tree => handles.tree = Some(root),
        ModelSlot::Ghost => {
            let models = &config.models;
            scene.update_materials_under(root, |m| {
                m.transparent = true;
                m.opacity = models.ghost_opacity;
                m.emissive = models.ghost_emissive;
                m.emissive_intensity = models.ghost_emissive_intensity;
            });
            handles.ghost = Some(root);
        }
    }
    tracing::info!("attached {} ({} primitives)", slot.key(), primitives);
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble;
    use glam::Vec3;
    use haunt_assets::{Geometry, ModelNode, ModelPrimitive, StandardMaterial};
    use haunt_common::Color;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn model(name: &str) -> ModelData {
        ModelData {
            name: name.into(),
            roots: vec![ModelNode {
                name: Some("mesh".into()),
                transform: Transform::default(),
                primitives: vec![ModelPrimitive {
                    geometry: Geometry::sphere(1.0, 8, 8),
                    material: StandardMaterial::named("body"),
                }],
                children: vec![],
            }],
            textures: vec![],
        }
    }

    #[test]
    fn slot_keys_round_trip() {
        for slot in ModelSlot::ALL {
            assert_eq!(ModelSlot::from_key(slot.key()), Some(slot));
        }
        assert_eq!(ModelSlot::from_key("house"), None);
    }

    #[test]
    fn ghost_is_placed_and_glows() {
        let config = SceneConfig::default();
        let mut a = assemble(&config, &mut StdRng::seed_from_u64(1)).unwrap();
        let ghost = attach_model(
            &mut a.scene,
            &mut a.handles,
            &config,
            ModelSlot::Ghost,
            model("ghost.glb"),
        )
        .unwrap();

        assert_eq!(a.handles.ghost, Some(ghost));
        let node = a.scene.graph.get(ghost).unwrap();
        assert_eq!(node.name, "ghost");
        assert_eq!(node.transform.position, Vec3::new(0.0, 0.25, 3.0));
        assert_eq!(node.transform.scale, Vec3::splat(0.4));

        for handle in a.scene.materials_under(ghost) {
            let m = a.scene.assets.material(handle).unwrap();
            assert!(m.transparent);
            assert_eq!(m.opacity, 0.1);
            assert_eq!(m.emissive, Color::rgb(0.0, 1.0, 1.0));
            assert_eq!(m.emissive_intensity, 2.0);
        }
    }

    #[test]
    fn tree_is_scaled_and_turned() {
        let config = SceneConfig::default();
        let mut a = assemble(&config, &mut StdRng::seed_from_u64(1)).unwrap();
        let tree = attach_model(
            &mut a.scene,
            &mut a.handles,
            &config,
            ModelSlot::Tree,
            model("tree.glb"),
        )
        .unwrap();

        let node = a.scene.graph.get(tree).unwrap();
        assert_eq!(node.transform.position, Vec3::new(-7.0, 0.0, 0.0));
        assert_eq!(node.transform.scale, Vec3::splat(15.0));
        let facing = node.transform.rotation * Vec3::Z;
        assert!((facing - Vec3::NEG_Z).length() < 1e-5);

        let m = a.scene.materials_under(tree)[0];
        assert!(!a.scene.assets.material(m).unwrap().transparent);
    }

    #[test]
    fn reattaching_replaces_subtree() {
        let config = SceneConfig::default();
        let mut a = assemble(&config, &mut StdRng::seed_from_u64(1)).unwrap();
        let before = a.scene.graph.len();
        let first = attach_model(&mut a.scene, &mut a.handles, &config, ModelSlot::Tree, model("t"))
            .unwrap();
        let second =
            attach_model(&mut a.scene, &mut a.handles, &config, ModelSlot::Tree, model("t"))
                .unwrap();
        assert!(!a.scene.graph.contains(first));
        assert_eq!(a.handles.tree, Some(second));
        // group, node, mesh
        assert_eq!(a.scene.graph.len(), before + 3);
    }
}
