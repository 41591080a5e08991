//! Analytic daylight sky (Preetham scattering model).
//!
//! The per-sky terms are derived here once per frame; the per-pixel
//! in-scattering runs in the sky shader.

use glam::Vec3;
use haunt_kernel::SkyParams;

const E: f32 = std::f32::consts::E;
const UP: Vec3 = Vec3::Y;

/// Total Rayleigh scattering coefficient per wavelength (680, 550, 450 nm).
pub const TOTAL_RAYLEIGH: Vec3 = Vec3::new(5.804_543e-6, 1.356_291_1e-5, 3.026_590_2e-5);
const MIE_CONST: Vec3 = Vec3::new(1.839_991_9e14, 2.779_802_4e14, 4.079_048e14);
const CUTOFF_ANGLE: f32 = 1.611_073_2;
const STEEPNESS: f32 = 1.5;
const SUN_INTENSITY: f32 = 1000.0;

/// Sky terms consumed by the sky shader.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyUniforms {
    pub sun_direction: Vec3,
    /// Sun irradiance at the current elevation.
    pub sun_e: f32,
    /// 1 while the sun is up, falling toward 0 as it sets.
    pub sun_fade: f32,
    pub beta_r: Vec3,
    pub beta_m: Vec3,
    pub mie_directional_g: f32,
    pub scale: f32,
}

impl SkyUniforms {
    pub fn from_params(params: &SkyParams) -> Self {
        let sun_direction = params.sun_position.normalize_or(UP);
        let sun_e = sun_intensity(sun_direction.dot(UP));
        let sun_fade = 1.0 - (1.0 - (params.sun_position.y / 450_000.0).exp()).clamp(0.0, 1.0);
        let rayleigh_coefficient = params.rayleigh - (1.0 - sun_fade);
        Self {
            sun_direction,
            sun_e,
            sun_fade,
            beta_r: TOTAL_RAYLEIGH * rayleigh_coefficient,
            beta_m: total_mie(params.turbidity) * params.mie_coefficient,
            mie_directional_g: params.mie_directional_g,
            scale: params.scale,
        }
    }
}

fn sun_intensity(zenith_angle_cos: f32) -> f32 {
    let zenith_angle = zenith_angle_cos.clamp(-1.0, 1.0).acos();
    SUN_INTENSITY * (1.0 - E.powf(-((CUTOFF_ANGLE - zenith_angle) / STEEPNESS))).max(0.0)
}

fn total_mie(turbidity: f32) -> Vec3 {
    let c = 0.2 * turbidity * 10e-18;
    MIE_CONST * (0.434 * c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sun_at_zenith_is_brightest() {
        let params = SkyParams {
            sun_position: Vec3::Y,
            ..SkyParams::default()
        };
        let sky = SkyUniforms::from_params(&params);
        let expected = 1000.0 * (1.0 - (-CUTOFF_ANGLE / STEEPNESS).exp());
        assert!((sky.sun_e - expected).abs() < 0.5);
        assert_eq!(sky.sun_direction, Vec3::Y);
    }

    #[test]
    fn sun_below_cutoff_is_dark() {
        let params = SkyParams {
            sun_position: Vec3::new(0.0, -1.0, 0.1),
            ..SkyParams::default()
        };
        assert_eq!(SkyUniforms::from_params(&params).sun_e, 0.0);
    }

    #[test]
    fn scene_sky_is_dusk() {
        let sky = SkyUniforms::from_params(&SkyParams::default());
        // Sun just under the horizon: dim but not black.
        assert!(sky.sun_e > 5.0 && sky.sun_e < 20.0, "sun_e {}", sky.sun_e);
        assert!((sky.sun_direction.length() - 1.0).abs() < 1e-5);
        assert!(sky.sun_fade > 0.99 && sky.sun_fade <= 1.0);
        // Rayleigh 10 with the sun nearly up scales the base coefficient ~10x.
        let ratio = sky.beta_r.x / TOTAL_RAYLEIGH.x;
        assert!((ratio - 10.0).abs() < 0.01);
    }

    #[test]
    fn mie_scales_with_turbidity_and_coefficient() {
        let base = SkyUniforms::from_params(&SkyParams::default());
        let hazier = SkyUniforms::from_params(&SkyParams {
            turbidity: 6.0,
            ..SkyParams::default()
        });
        assert!((hazier.beta_m.x / base.beta_m.x - 2.0).abs() < 1e-4);
        let expected = 0.434 * 0.2 * 3.0 * 10e-18 * MIE_CONST.x * 0.1;
        assert!((base.beta_m.x - expected).abs() / expected < 1e-4);
    }
}
