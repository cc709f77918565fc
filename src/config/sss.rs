use glam::{vec3, Vec3};

use super::LightCfg;
use crate::sss::ColorFormat;

/// Light from the back of the head, seen through the ears and nose.
pub struct SSSForwardScatterPassCfg {
  pub depthmap_size: u32,
  /// [0, 1], higher values give stronger effect
  pub translucency: f32,
  pub source: LightCfg,
  /// Half of the side of the orthographic projection box
  pub projection_size: f32,
  pub projection_far: f32,
}

impl Default for SSSForwardScatterPassCfg {
  fn default() -> Self {
    Self {
      depthmap_size: 256,
      translucency: 0.83,
      source: LightCfg {
        pos_phi: -93.0,  // horizontal [dgr]
        pos_theta: 95.0, // verical [dgr]
        pos_distance: 1.0,
        ..LightCfg::light1()
      },
      projection_size: 0.2,
      projection_far: 2.0,
    }
  }
}

pub struct SSSBlurPassCfg {
  /// In world space units
  pub blur_width: f32,
  pub blur_strength: Vec3,
  pub blur_falloff: Vec3,
  pub sample_count: usize,
  /// slight changes for incident angles ~90dgr
  pub blur_follow_surface: bool,
  /// stencil arrives with skin already marked. If not, first pass marks it on the fly
  pub stencil_initialized: bool,
  /// read strength from a separate texture instead of color's alpha
  pub separate_strength_source: bool,
  pub color_format: ColorFormat,
}

impl Default for SSSBlurPassCfg {
  fn default() -> Self {
    Self {
      blur_width: 0.012,
      blur_strength: Self::DEFAULT_STRENGTH,
      blur_falloff: Self::DEFAULT_FALLOFF,
      sample_count: 17,
      blur_follow_surface: true,
      stencil_initialized: true,
      separate_strength_source: false,
      color_format: ColorFormat::Rgba8UnormSrgb,
    }
  }
}

impl SSSBlurPassCfg {
  pub const SSS_WIDTH_MIN: f32 = 0.001;
  pub const SSS_WIDTH_MAX: f32 = 0.025;
  pub const SAMPLE_COUNT_MIN: usize = 3;
  pub const SAMPLE_COUNT_MAX: usize = 33;
  pub const DEFAULT_STRENGTH: Vec3 = vec3(0.48, 0.41, 0.28);
  pub const DEFAULT_FALLOFF: Vec3 = vec3(1.0, 0.37, 0.3);

  /// Clamp to supported range and round to odd, so that there is a center tap.
  pub fn sanitize_sample_count(sample_count: usize) -> usize {
    let n = sample_count.clamp(Self::SAMPLE_COUNT_MIN, Self::SAMPLE_COUNT_MAX);
    2 * (n / 2) + 1
  }

  pub fn clamp_width(width: f32) -> f32 {
    width.clamp(Self::SSS_WIDTH_MIN, Self::SSS_WIDTH_MAX)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn sample_count_is_odd_and_in_range() {
    assert_eq!(SSSBlurPassCfg::sanitize_sample_count(0), 3);
    assert_eq!(SSSBlurPassCfg::sanitize_sample_count(3), 3);
    assert_eq!(SSSBlurPassCfg::sanitize_sample_count(4), 5);
    assert_eq!(SSSBlurPassCfg::sanitize_sample_count(16), 17);
    assert_eq!(SSSBlurPassCfg::sanitize_sample_count(17), 17);
    assert_eq!(SSSBlurPassCfg::sanitize_sample_count(32), 33);
    assert_eq!(SSSBlurPassCfg::sanitize_sample_count(100), 33);
  }

  #[test]
  fn width_is_clamped() {
    assert_eq!(SSSBlurPassCfg::clamp_width(0.0), SSSBlurPassCfg::SSS_WIDTH_MIN);
    assert_eq!(SSSBlurPassCfg::clamp_width(0.012), 0.012);
    assert_eq!(SSSBlurPassCfg::clamp_width(1.0), SSSBlurPassCfg::SSS_WIDTH_MAX);
  }
}
