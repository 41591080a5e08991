use crate::texture::{Texture, TextureId};
use haunt_common::Color;

/// Optional texture slots of a [`StandardMaterial`].
///
/// Channel conventions: ambient occlusion reads red, roughness green,
/// metalness blue, alpha green, displacement red. A packed ARM texture can
/// therefore fill the first three slots at once.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MaterialMaps {
    pub color: Option<Texture>,
    pub ambient_occlusion: Option<Texture>,
    pub roughness: Option<Texture>,
    pub metalness: Option<Texture>,
    pub normal: Option<Texture>,
    pub alpha: Option<Texture>,
    pub displacement: Option<Texture>,
}

impl MaterialMaps {
    /// Use one packed ambient-occlusion/roughness/metalness texture.
    pub fn with_arm(mut self, arm: Texture) -> Self {
        self.ambient_occlusion = Some(arm);
        self.roughness = Some(arm);
        self.metalness = Some(arm);
        self
    }

    /// Slots in binding order.
    pub fn slots(&self) -> [Option<Texture>; 7] {
        [
            self.color,
            self.ambient_occlusion,
            self.roughness,
            self.metalness,
            self.normal,
            self.alpha,
            self.displacement,
        ]
    }

    /// Distinct texture sources referenced by this material.
    pub fn sources(&self) -> Vec<TextureId> {
        let mut ids: Vec<TextureId> = self.slots().iter().flatten().map(|t| t.source).collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Physically based metallic/roughness material.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardMaterial {
    pub name: String,
    pub color: Color,
    pub emissive: Color,
    pub emissive_intensity: f32,
    pub roughness: f32,
    pub metalness: f32,
    pub opacity: f32,
    pub transparent: bool,
    pub displacement_scale: f32,
    pub displacement_bias: f32,
    pub maps: MaterialMaps,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            name: "default".into(),
            color: Color::WHITE,
            emissive: Color::BLACK,
            emissive_intensity: 1.0,
            roughness: 1.0,
            metalness: 0.0,
            opacity: 1.0,
            transparent: false,
            displacement_scale: 1.0,
            displacement_bias: 0.0,
            maps: MaterialMaps::default(),
        }
    }
}

impl StandardMaterial {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_maps(mut self, maps: MaterialMaps) -> Self {
        self.maps = maps;
        self
    }

    /// Whether the material is drawn in the blended pass.
    pub fn is_blended(&self) -> bool {
        self.transparent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_model() {
        let m = StandardMaterial::default();
        assert_eq!(m.roughness, 1.0);
        assert_eq!(m.metalness, 0.0);
        assert_eq!(m.opacity, 1.0);
        assert!(!m.is_blended());
    }

    #[test]
    fn arm_fills_three_slots() {
        let arm = Texture::new(TextureId(7));
        let maps = MaterialMaps::default().with_arm(arm);
        assert_eq!(maps.ambient_occlusion, Some(arm));
        assert_eq!(maps.roughness, Some(arm));
        assert_eq!(maps.metalness, Some(arm));
        assert_eq!(maps.sources(), vec![TextureId(7)]);
    }
}
