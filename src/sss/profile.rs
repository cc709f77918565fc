use std::f32::consts::PI;

use glam::{vec3, Mat4, Vec3};

use super::texture::DepthTexture;

/// Added to falloff so that `r / falloff` never divides by zero.
pub const FALLOFF_EPSILON: f32 = 0.001;

/// `(weight, variance)` of gaussians that approximate the skin reflectance profile [d'Eon07].
///
/// The narrowest term of the measured profile `(0.233, 0.0064)` is directly bounced
/// light. It is not part of the sum, the strength parameter accounts for it.
const REFLECTANCE_GAUSSIANS: [(f32, f32); 5] = [
  (0.100, 0.0484),
  (0.118, 0.187),
  (0.113, 0.567),
  (0.358, 1.99),
  (0.078, 7.41),
];

/// `(per channel weight, variance)` of the transmittance profile.
const TRANSMITTANCE_GAUSSIANS: [(Vec3, f32); 6] = [
  (Vec3::new(0.233, 0.455, 0.649), 0.0064),
  (Vec3::new(0.1, 0.336, 0.344), 0.0484),
  (Vec3::new(0.118, 0.198, 0.0), 0.187),
  (Vec3::new(0.113, 0.007, 0.007), 0.567),
  (Vec3::new(0.358, 0.004, 0.0), 1.99),
  (Vec3::new(0.078, 0.0, 0.0), 7.41),
];

/// Scale of the thickness used to index the transmittance profile.
const TRANSMITTANCE_SCALE: f32 = 8.25;
/// Offset along the normal that moves the shaded point inside the surface
/// before the shadow map lookup.
const TRANSMITTANCE_SHRINK: f32 = 0.005;
/// Light wrap used for back lighting.
const TRANSMITTANCE_WRAP: f32 = 0.3;

/// How much light re-emerges at distance `r` from the entry point, per color channel.
///
/// We use the red channel of the skin profile for all 3 channels. Green and blue are
/// only scaled using `falloff`. This allows full control over the profile,
/// e.g. to get blue gradients for blue creatures.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DiffusionProfile {
  /// Per-channel radial rescale. Big falloff spreads the shape, small one makes it narrower.
  pub falloff: Vec3,
}

impl DiffusionProfile {
  pub fn new(falloff: Vec3) -> Self {
    Self { falloff }
  }

  /// Normalized 1D gaussian, with radius rescaled independently for each channel.
  pub fn gaussian(&self, variance: f32, r: f32) -> Vec3 {
    let channel = |falloff: f32| {
      let rr = r / (FALLOFF_EPSILON + falloff);
      f32::exp(-(rr * rr) / (2.0 * variance)) / (2.0 * PI * variance)
    };
    vec3(
      channel(self.falloff.x),
      channel(self.falloff.y),
      channel(self.falloff.z),
    )
  }

  pub fn evaluate(&self, r: f32) -> Vec3 {
    REFLECTANCE_GAUSSIANS
      .iter()
      .fold(Vec3::ZERO, |acc, &(weight, variance)| {
        acc + weight * self.gaussian(variance, r)
      })
  }
}

/// Precalculated transmittance profile for thickness `d`.
/// Could be baked into a texture.
pub fn transmittance_profile(d: f32) -> Vec3 {
  let dd = -d * d;
  TRANSMITTANCE_GAUSSIANS
    .iter()
    .fold(Vec3::ZERO, |acc, &(weight, variance)| {
      acc + weight * f32::exp(dd / variance)
    })
}

/// Light transmitted from the back of the object.
///
/// * `translucency` - [0, 1], higher values give stronger effect
/// * `sss_width` - same value as used for the blur
/// * `thickness` - distance the light travelled inside the object, in world units
/// * `light` - `light_world_position - world_position`, normalized
/// * `world_normal` - normalized
pub fn transmittance(
  translucency: f32,
  sss_width: f32,
  thickness: f32,
  light: Vec3,
  world_normal: Vec3,
) -> Vec3 {
  let scale = TRANSMITTANCE_SCALE * (1.0 - translucency) / sss_width;
  let d = scale * thickness;
  let n_dot_l = (TRANSMITTANCE_WRAP + light.dot(-world_normal)).clamp(0.0, 1.0);
  transmittance_profile(d) * n_dot_l
}

/// Distance between the shaded point and the closest occluder seen from the light.
///
/// * `shadow_map` - linear depth in [0, 1]
/// * `light_view_projection` - world to shadow map texture space
/// * `light_far_plane` - far plane used for the light projection
pub fn shadow_map_thickness(
  shadow_map: &DepthTexture,
  world_position: Vec3,
  world_normal: Vec3,
  light_view_projection: &Mat4,
  light_far_plane: f32,
) -> f32 {
  // shrink inside the surface to avoid artifacts
  let shrinked_pos = (world_position - TRANSMITTANCE_SHRINK * world_normal).extend(1.0);
  let shadow_position = *light_view_projection * shrinked_pos;
  let uv = shadow_position.truncate().truncate() / shadow_position.w;
  let d1 = shadow_map.sample_linear(uv) * light_far_plane;
  let d2 = shadow_position.z;
  (d1 - d2).abs()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn skin() -> DiffusionProfile {
    DiffusionProfile::new(vec3(1.0, 0.37, 0.3))
  }

  #[test]
  fn profile_is_symmetric_and_positive() {
    let profile = skin();
    for i in 0..50 {
      let r = i as f32 * 0.07;
      let a = profile.evaluate(r);
      let b = profile.evaluate(-r);
      assert_eq!(a, b);
      assert!(a.min_element() >= 0.0);
    }
  }

  #[test]
  fn profile_decays_with_distance() {
    let profile = skin();
    let mut prev = profile.evaluate(0.0);
    for i in 1..60 {
      let next = profile.evaluate(i as f32 * 0.05);
      assert!(next.cmple(prev).all(), "{} > {} at step {}", next, prev, i);
      prev = next;
    }
  }

  #[test]
  fn smaller_falloff_is_narrower() {
    let profile = skin();
    let center = profile.evaluate(0.0);
    let tail = profile.evaluate(1.0) / center;
    // red has the widest falloff, so keeps the most energy in the tail
    assert!(tail.x > tail.y);
    assert!(tail.y > tail.z);
  }

  #[test]
  fn zero_falloff_is_finite() {
    let profile = DiffusionProfile::new(Vec3::ZERO);
    let v = profile.evaluate(0.5);
    assert!(v.is_finite());
    assert!(profile.evaluate(0.0).is_finite());
  }

  #[test]
  fn transmittance_fades_with_thickness() {
    let light = vec3(0.0, 0.0, 1.0);
    let normal = vec3(0.0, 0.0, -1.0);
    let thin = transmittance(0.5, 0.012, 0.0001, light, normal);
    let thick = transmittance(0.5, 0.012, 0.01, light, normal);
    assert!(thin.cmpgt(thick).any());
    assert!(thick.min_element() >= 0.0);
  }

  #[test]
  fn transmittance_is_zero_when_lit_from_front() {
    let light = vec3(0.0, 0.0, 1.0);
    let v = transmittance(0.5, 0.012, 0.0, light, light);
    assert_eq!(v, Vec3::ZERO);
  }
}
