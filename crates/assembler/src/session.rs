use crate::assemble::{AssembleError, SceneHandles, TextureManifest, assemble};
use crate::config::SceneConfig;
use crate::graves::GravePlacement;
use crate::models::{ModelSlot, attach_model};
use glam::Vec3;
use haunt_kernel::{FrameLoop, FrameTick, Scene};
use haunt_stream::{AssetStreamer, LoadEvent, LoadRequest, LoadTracker, StreamError};
use rand::Rng;
use std::time::Instant;

/// A running scene: the assembled graph, its pending loads and the frame loop.
///
/// Everything here lives on the frame-loop thread. Loads finish on the
/// streamer's worker and come back through [`HauntSession::apply`].
#[derive(Debug)]
pub struct HauntSession {
    pub config: SceneConfig,
    pub scene: Scene,
    pub handles: SceneHandles,
    pub graves: Vec<GravePlacement>,
    pub frame_loop: FrameLoop,
    pub tracker: LoadTracker,
    textures: TextureManifest,
}

impl HauntSession {
    pub fn new<R: Rng>(
        config: SceneConfig,
        rng: &mut R,
        start: Instant,
    ) -> Result<Self, AssembleError> {
        let assembly = assemble(&config, rng)?;
        tracing::info!(
            "scene assembled: {} nodes, {} textures to load",
            assembly.scene.graph.len(),
            assembly.textures.len()
        );
        Ok(Self {
            config,
            scene: assembly.scene,
            handles: assembly.handles,
            graves: assembly.graves,
            frame_loop: FrameLoop::new(start),
            tracker: LoadTracker::new(ModelSlot::ALL.map(|s| s.key())),
            textures: assembly.textures,
        })
    }

    pub fn textures(&self) -> &TextureManifest {
        &self.textures
    }

    /// Every load the scene needs, with paths resolved against the asset root.
    pub fn load_requests(&self) -> Vec<LoadRequest> {
        let textures = self.textures.entries().iter().map(|t| LoadRequest::Texture {
            id: t.id,
            path: self.config.asset_path(&t.path),
        });
        let models = ModelSlot::ALL.into_iter().map(|slot| LoadRequest::Model {
            key: slot.key().to_string(),
            path: self.config.asset_path(&slot.placement(&self.config).path),
        });
        textures.chain(models).collect()
    }

    /// Queue every load on the streamer. Returns the number queued.
    pub fn request_assets(&self, streamer: &mut AssetStreamer) -> Result<usize, StreamError> {
        let requests = self.load_requests();
        let count = requests.len();
        for request in requests {
            streamer.request(request)?;
        }
        tracing::info!("requested {count} asset loads");
        Ok(count)
    }

    /// Apply a finished load to the scene. A failure is logged and leaves
    /// the object absent.
    pub fn apply(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Texture { id, path, result } => match result {
                Ok(data) => {
                    tracing::debug!("texture {} ready", path.display());
                    self.scene.assets.insert_texture(id, data);
                    self.tracker.texture_loaded();
                }
                Err(e) => {
                    tracing::warn!("texture {} failed to load: {e}", path.display());
                    self.tracker.texture_failed();
                }
            },
            LoadEvent::Model { key, path, result } => {
                let Some(slot) = ModelSlot::from_key(&key) else {
                    tracing::warn!("ignoring model with unknown key {key}");
                    return;
                };
                let model = match result {
                    Ok(model) => model,
                    Err(e) => {
                        tracing::warn!("model {} failed to load: {e}", path.display());
                        self.tracker.model_failed(&key);
                        return;
                    }
                };
                match attach_model(&mut self.scene, &mut self.handles, &self.config, slot, model) {
                    Ok(root) => {
                        if slot == ModelSlot::Ghost {
                            self.frame_loop.set_ghost(root);
                        }
                        self.tracker.model_loaded(&key);
                    }
                    Err(e) => {
                        tracing::warn!("could not attach {key}: {e}");
                        self.tracker.model_failed(&key);
                    }
                }
            }
        }
    }

    pub fn apply_all(&mut self, events: impl IntoIterator<Item = LoadEvent>) -> usize {
        let mut applied = 0;
        for event in events {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Advance the frame loop to `now`.
    pub fn tick(&mut self, now: Instant, camera_position: Vec3) -> FrameTick {
        self.frame_loop.tick(&mut self.scene, now, camera_position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haunt_assets::{
        AssetError, Geometry, ModelData, ModelNode, ModelPrimitive, StandardMaterial, TextureData,
    };
    use haunt_common::Transform;
    use haunt_stream::LoadState;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::path::PathBuf;
    use std::time::Duration;

    fn session() -> HauntSession {
        HauntSession::new(
            SceneConfig::default(),
            &mut StdRng::seed_from_u64(7),
            Instant::now(),
        )
        .unwrap()
    }

    fn model_event(key: &str) -> LoadEvent {
        LoadEvent::Model {
            key: key.into(),
            path: PathBuf::from(format!("{key}/{key}.glb")),
            result: Ok(ModelData {
                name: key.into(),
                roots: vec![ModelNode {
                    name: None,
                    transform: Transform::default(),
                    primitives: vec![ModelPrimitive {
                        geometry: Geometry::sphere(1.0, 8, 8),
                        material: StandardMaterial::named("body"),
                    }],
                    children: vec![],
                }],
                textures: vec![],
            }),
        }
    }

    fn missing(path: &str) -> AssetError {
        AssetError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, path.to_string()))
    }

    #[test]
    fn requests_cover_textures_and_models_under_the_asset_root() {
        let session = session();
        let requests = session.load_requests();
        assert_eq!(requests.len(), session.textures().len() + 2);
        assert!(requests.iter().all(|r| match r {
            LoadRequest::Texture { path, .. } | LoadRequest::Model { path, .. } =>
                path.starts_with("static"),
        }));
        assert!(requests.contains(&LoadRequest::Model {
            key: "ghost".into(),
            path: PathBuf::from("static/ghost/ghost.glb"),
        }));
    }

    #[test]
    fn ghost_arrival_starts_animation() {
        let start = Instant::now();
        let mut session =
            HauntSession::new(SceneConfig::default(), &mut StdRng::seed_from_u64(7), start)
                .unwrap();
        let camera = Vec3::new(5.0, 3.0, 8.0);

        assert!(!session.tick(start, camera).ghost_animated);
        assert_eq!(session.tracker.state(), LoadState::Loading);

        session.apply(model_event("ghost"));
        assert_eq!(session.tracker.state(), LoadState::ReadyPartial);
        let ghost = session.frame_loop.ghost().unwrap();
        assert_eq!(session.handles.ghost, Some(ghost));

        let tick = session.tick(start + Duration::from_millis(16), camera);
        assert!(tick.ghost_animated);

        session.apply(model_event("tree"));
        assert_eq!(session.tracker.state(), LoadState::ReadyFull);
    }

    #[test]
    fn failed_loads_leave_objects_absent() {
        let mut session = session();
        let texture = session.textures().entries()[0].clone();
        let applied = session.apply_all([
            LoadEvent::Model {
                key: "tree".into(),
                path: "tree/tree.glb".into(),
                result: Err(missing("tree/tree.glb")),
            },
            LoadEvent::Texture {
                id: texture.id,
                path: texture.path.clone(),
                result: Err(missing("floor/alpha.webp")),
            },
        ]);
        assert_eq!(applied, 2);
        assert!(session.handles.tree.is_none());
        assert!(!session.scene.assets.has_texture(texture.id));
        let counts = session.tracker.counts();
        assert_eq!(counts.models_failed, 1);
        assert_eq!(counts.textures_failed, 1);
        assert_eq!(session.tracker.state(), LoadState::Loading);
    }

    #[test]
    fn textures_land_in_the_store() {
        let mut session = session();
        let texture = session.textures().entries()[0].clone();
        session.apply(LoadEvent::Texture {
            id: texture.id,
            path: texture.path,
            result: Ok(TextureData::solid([255, 0, 0, 255])),
        });
        assert!(session.scene.assets.has_texture(texture.id));
        assert_eq!(session.tracker.counts().textures_loaded, 1);
    }

    #[test]
    fn unknown_model_keys_are_ignored() {
        let mut session = session();
        let nodes = session.scene.graph.len();
        session.apply(model_event("pumpkin"));
        assert_eq!(session.scene.graph.len(), nodes);
        assert_eq!(session.tracker.state(), LoadState::Loading);
    }
}
