use crate::config::{ConfigError, SceneConfig};
use crate::graves::{GravePlacement, place_graves};
use glam::Vec3;
use haunt_assets::{
    Geometry, MaterialHandle, MaterialMaps, StandardMaterial, Texture, TextureId, WrapMode,
};
use haunt_common::{NodeId, Transform};
use haunt_kernel::{
    AmbientLight, DirectionalLight, Light, MeshNode, NodeKind, PointLight, Scene, SceneError,
};
use rand::Rng;
use std::f32::consts::PI;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("invalid scene config: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}

/// A texture file the scene references, relative to the asset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureRequest {
    pub id: TextureId,
    pub path: PathBuf,
}

/// Texture files referenced by the assembled scene, in first-use order.
#[derive(Debug, Clone, Default)]
pub struct TextureManifest {
    extension: String,
    entries: Vec<TextureRequest>,
}

impl TextureManifest {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            entries: Vec::new(),
        }
    }

    /// Texture for `stem` (a path without extension), recording the file.
    pub fn texture(&mut self, stem: &str) -> Texture {
        let path = format!("{stem}.{}", self.extension);
        let id = TextureId::from_path(&path);
        if !self.entries.iter().any(|e| e.id == id) {
            self.entries.push(TextureRequest {
                id,
                path: PathBuf::from(path),
            });
        }
        Texture::new(id)
    }

    pub fn entries(&self) -> &[TextureRequest] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Nodes and materials the rest of the program needs to reach.
#[derive(Debug, Clone)]
pub struct SceneHandles {
    pub house: NodeId,
    pub walls: NodeId,
    pub roof: NodeId,
    pub door: NodeId,
    pub bushes: Vec<NodeId>,
    pub graves: NodeId,
    pub floor: NodeId,
    pub floor_material: MaterialHandle,
    pub ambient_light: NodeId,
    pub directional_light: NodeId,
    pub door_light: NodeId,
    pub tree: Option<NodeId>,
    pub ghost: Option<NodeId>,
}

/// The assembled static scene and what it still needs loaded.
#[derive(Debug)]
pub struct Assembly {
    pub scene: Scene,
    pub handles: SceneHandles,
    pub textures: TextureManifest,
    pub graves: Vec<GravePlacement>,
}

/// A colour/ARM/normal texture set sharing one tiling.
fn arm_maps(
    textures: &mut TextureManifest,
    dir: &str,
    tile: impl Fn(Texture) -> Texture,
) -> MaterialMaps {
    MaterialMaps {
        color: Some(tile(textures.texture(&format!("{dir}/diff")).srgb())),
        normal: Some(tile(textures.texture(&format!("{dir}/nor")))),
        ..MaterialMaps::default()
    }
    .with_arm(tile(textures.texture(&format!("{dir}/arm"))))
}

/// Build the static scene: house, graves, floor, lights and environment.
///
/// Models are attached later with [`crate::attach_model`]. The config is
/// validated first, so a hand-built config fails here instead of panicking
/// inside the samplers.
pub fn assemble<R: Rng>(config: &SceneConfig, rng: &mut R) -> Result<Assembly, AssembleError> {
    config.validate()?;
    let mut scene = Scene::new(config.environment);
    let mut textures = TextureManifest::new(config.assets.texture_extension.clone());
    let house_cfg = &config.house;

    let house = scene.graph.add_group(
        None,
        "house",
        Transform::default().with_euler(0.0, house_cfg.rotation_y, 0.0),
    )?;

    let walls_material = StandardMaterial::named("walls").with_maps(arm_maps(
        &mut textures,
        "wall/castle_walls_slate",
        |t| t.tiled(2.0, 2.0),
    ));
    let (walls, _) = scene.add_mesh(
        Some(house),
        "walls",
        Transform::from_position(Vec3::new(0.0, house_cfg.height * 0.5, 0.0)),
        Geometry::cuboid(house_cfg.width, house_cfg.height, house_cfg.depth),
        walls_material,
    )?;

    let roof_material = StandardMaterial::named("roof").with_maps(arm_maps(
        &mut textures,
        "roof",
        |t| t.tiled(1.0, 3.0).rotated(PI / 2.0),
    ));
    let (roof, _) = scene.add_mesh(
        Some(house),
        "roof",
        Transform::from_position(Vec3::new(0.0, house_cfg.height * 1.25, 0.0))
            .with_euler(0.0, PI * 0.25, 0.0),
        Geometry::cone(house_cfg.width * 0.8, house_cfg.height * 0.5, 4),
        roof_material,
    )?;

    let door_material = StandardMaterial {
        transparent: true,
        displacement_scale: house_cfg.door_displacement_scale,
        displacement_bias: house_cfg.door_displacement_bias,
        maps: MaterialMaps {
            color: Some(textures.texture("door/color").srgb()),
            alpha: Some(textures.texture("door/alpha")),
            ambient_occlusion: Some(textures.texture("door/ambientOcclusion")),
            displacement: Some(textures.texture("door/height")),
            normal: Some(textures.texture("door/normal")),
            metalness: Some(textures.texture("door/metalness")),
            roughness: Some(textures.texture("door/roughness")),
        },
        ..StandardMaterial::named("door")
    };
    let (door, _) = scene.add_mesh(
        Some(house),
        "door",
        Transform::from_position(Vec3::new(
            0.0,
            house_cfg.door_height,
            house_cfg.depth * 0.5 + 0.01,
        )),
        Geometry::plane(
            house_cfg.door_size,
            house_cfg.door_size,
            house_cfg.door_segments,
            house_cfg.door_segments,
        ),
        door_material,
    )?;

    // Bushes share one mesh and material; only the colour wraps horizontally.
    let bush_maps = arm_maps(&mut textures, "bush", |mut t| {
        t.repeat = glam::Vec2::new(2.0, 1.0);
        t.wrap_s = WrapMode::Repeat;
        t
    });
    let bush = MeshNode::new(
        scene.assets.add_mesh(Geometry::sphere(1.0, 16, 16)),
        scene.assets.add_material(StandardMaterial {
            color: house_cfg.bush_color,
            ..StandardMaterial::named("bush").with_maps(bush_maps)
        }),
    )
    .with_shadows(false, true);
    let bushes = house_cfg
        .bushes
        .iter()
        .enumerate()
        .map(|(i, b)| {
            scene.graph.add(
                Some(house),
                format!("bush{}", i + 1),
                Transform::from_position(b.position)
                    .with_scale(b.scale)
                    .with_euler(house_cfg.bush_rotation_x, 0.0, 0.0),
                NodeKind::Mesh(bush),
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    let door_light = scene.add_light(
        Some(house),
        "door_light",
        house_cfg.door_light_position,
        Light::Point(PointLight::new(
            house_cfg.door_light_color,
            house_cfg.door_light_intensity,
        )),
    )?;

    let placements = place_graves(&config.graves, rng)?;
    let graves = scene.graph.add_group(None, "graves", Transform::default())?;
    let grave_maps = arm_maps(&mut textures, "grave", |t| t);
    let grave = MeshNode::new(
        scene.assets.add_mesh(Geometry::cuboid(
            config.graves.size.x,
            config.graves.size.y,
            config.graves.size.z,
        )),
        scene
            .assets
            .add_material(StandardMaterial::named("grave").with_maps(grave_maps)),
    )
    .with_shadows(true, true);
    for (i, placement) in placements.iter().enumerate() {
        scene.graph.add(
            Some(graves),
            format!("grave{i}"),
            placement.transform(),
            NodeKind::Mesh(grave),
        )?;
    }

    let floor_cfg = &config.floor;
    let repeat = floor_cfg.repeat;
    let floor_maps = MaterialMaps {
        alpha: Some(textures.texture("floor/alpha")),
        displacement: Some(
            textures
                .texture("floor/coast_sand_rocks/disp")
                .tiled(repeat, repeat),
        ),
        ..arm_maps(&mut textures, "floor/coast_sand_rocks", |t| {
            t.tiled(repeat, repeat)
        })
    };
    let (floor, floor_mesh) = scene.add_mesh(
        None,
        "floor",
        Transform::default().with_euler(-PI * 0.5, 0.0, 0.0),
        Geometry::plane(
            floor_cfg.size,
            floor_cfg.size,
            floor_cfg.segments,
            floor_cfg.segments,
        ),
        StandardMaterial {
            transparent: true,
            displacement_scale: floor_cfg.displacement_scale,
            displacement_bias: floor_cfg.displacement_bias,
            ..StandardMaterial::named("floor").with_maps(floor_maps)
        },
    )?;

    let lights = &config.lights;
    let ambient_light = scene.add_light(
        None,
        "ambient_light",
        Vec3::ZERO,
        Light::Ambient(AmbientLight {
            color: lights.ambient_color,
            intensity: lights.ambient_intensity,
        }),
    )?;
    let directional_light = scene.add_light(
        None,
        "directional_light",
        lights.directional_position,
        Light::Directional(DirectionalLight {
            color: lights.directional_color,
            intensity: lights.directional_intensity,
            target: Vec3::ZERO,
            shadow: Some(lights.shadow),
        }),
    )?;

    for id in [walls, roof, door] {
        if let Some(node) = scene.graph.get_mut(id) {
            if let NodeKind::Mesh(mesh) = &mut node.kind {
                mesh.cast_shadow = true;
            }
        }
    }
    if let Some(node) = scene.graph.get_mut(floor) {
        if let NodeKind::Mesh(mesh) = &mut node.kind {
            mesh.receive_shadow = true;
        }
    }

    tracing::info!(
        "assembled scene: {} nodes, {} graves, {} textures",
        scene.graph.len(),
        placements.len(),
        textures.len()
    );

    Ok(Assembly {
        scene,
        handles: SceneHandles {
            house,
            walls,
            roof,
            door,
            bushes,
            graves,
            floor,
            floor_material: floor_mesh.material,
            ambient_light,
            directional_light,
            door_light,
            tree: None,
            ghost: None,
        },
        textures,
        graves: placements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use haunt_assets::ColorSpace;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn assembled() -> Assembly {
        assemble(&SceneConfig::default(), &mut StdRng::seed_from_u64(1)).unwrap()
    }

    #[test]
    fn invalid_config_is_an_error() {
        let mut config = SceneConfig::default();
        config.graves.min_radius = f32::NAN;
        let err = assemble(&config, &mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, AssembleError::Config(ConfigError::InvalidRange { .. })));

        let mut config = SceneConfig::default();
        config.graves.max_radius = config.graves.min_radius;
        assert!(assemble(&config, &mut StdRng::seed_from_u64(1)).is_err());
    }

    fn mesh_of(assembly: &Assembly, id: NodeId) -> MeshNode {
        match assembly.scene.graph.get(id).unwrap().kind {
            NodeKind::Mesh(mesh) => mesh,
            _ => panic!("not a mesh"),
        }
    }

    #[test]
    fn builds_house_graves_floor_and_lights() {
        let a = assembled();
        let graph = &a.scene.graph;

        assert_eq!(graph.roots().len(), 5);
        assert_eq!(graph.get(a.handles.graves).unwrap().children().len(), 30);
        assert_eq!(a.graves.len(), 30);
        assert_eq!(a.handles.bushes.len(), 4);
        // walls, roof, door, 4 bushes, door light
        assert_eq!(graph.get(a.handles.house).unwrap().children().len(), 8);
        assert_eq!(a.scene.lights().len(), 3);
        assert!(a.handles.tree.is_none() && a.handles.ghost.is_none());
    }

    #[test]
    fn shadow_flags_follow_scene_layout() {
        let a = assembled();
        assert!(mesh_of(&a, a.handles.walls).cast_shadow);
        assert!(mesh_of(&a, a.handles.roof).cast_shadow);
        assert!(mesh_of(&a, a.handles.door).cast_shadow);
        assert!(mesh_of(&a, a.handles.floor).receive_shadow);
        assert!(!mesh_of(&a, a.handles.floor).cast_shadow);
        for bush in &a.handles.bushes {
            let m = mesh_of(&a, *bush);
            assert!(m.receive_shadow && !m.cast_shadow);
        }
        for (_, grave) in a.scene.graph.meshes_under(a.handles.graves) {
            assert!(grave.cast_shadow && grave.receive_shadow);
        }
    }

    #[test]
    fn graves_share_one_mesh_and_material() {
        let a = assembled();
        let graves = a.scene.graph.meshes_under(a.handles.graves);
        let first = graves[0].1;
        assert!(graves.iter().all(|(_, m)| *m == first));
        assert_eq!(a.scene.materials_under(a.handles.graves).len(), 1);
    }

    #[test]
    fn door_sits_in_front_of_wall() {
        let a = assembled();
        let door = a.scene.graph.get(a.handles.door).unwrap();
        assert_eq!(door.transform.position, Vec3::new(0.0, 1.0, 2.01));
        let material = a.scene.assets.material(mesh_of(&a, a.handles.door).material).unwrap();
        assert!(material.transparent);
        assert_eq!(material.displacement_scale, 0.15);
        assert_eq!(material.displacement_bias, -0.04);
        assert_eq!(material.maps.sources().len(), 7);
    }

    #[test]
    fn floor_material_tiles_except_alpha() {
        let a = assembled();
        let floor = a.scene.assets.material(a.handles.floor_material).unwrap();
        assert_eq!(floor.displacement_scale, 0.3);
        assert_eq!(floor.displacement_bias, -0.2);
        let alpha = floor.maps.alpha.unwrap();
        assert_eq!(alpha.repeat, glam::Vec2::ONE);
        assert_eq!(alpha.wrap_s, WrapMode::ClampToEdge);
        let color = floor.maps.color.unwrap();
        assert_eq!(color.repeat, glam::Vec2::splat(8.0));
        assert_eq!(color.color_space, ColorSpace::Srgb);
        assert_eq!(floor.maps.displacement.unwrap().wrap_t, WrapMode::Repeat);
    }

    #[test]
    fn manifest_lists_each_file_once() {
        let a = assembled();
        // walls 3, roof 3, door 7, bush 3, grave 3, floor 5
        assert_eq!(a.textures.len(), 24);
        assert!(
            a.textures
                .entries()
                .iter()
                .all(|e| e.path.extension().is_some_and(|x| x == "webp"))
        );
    }

    #[test]
    fn texture_extension_is_configurable() {
        let mut config = SceneConfig::default();
        config.assets.texture_extension = "jpg".into();
        let a = assemble(&config, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(
            a.textures
                .entries()
                .iter()
                .any(|e| e.path == PathBuf::from("door/color.jpg"))
        );
    }

    #[test]
    fn door_light_rides_with_house() {
        let a = assembled();
        let world = a.scene.graph.world_position(a.handles.door_light).unwrap();
        let rotated = glam::Quat::from_rotation_y(PI * 0.05) * Vec3::new(0.0, 2.2, 2.7);
        assert!((world - rotated).length() < 1e-4);
    }
}
