use glam::{vec3, Vec3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Convert u8 [0..255) into float
pub fn color_u8_to_float(col_u8: u8) -> f32 {
  (col_u8 as f32) / 255.0
}

/// Convert u8 [0..255) into float vector
pub fn color_hex_to_vec(c0: u8, c1: u8, c2: u8) -> Vec3 {
  vec3(
    color_u8_to_float(c0),
    color_u8_to_float(c1),
    color_u8_to_float(c2),
  )
}

/// Convert spherical->cartesian. Both angles in degrees.
pub fn spherical_to_cartesian_dgr(phi_dgr: f32, theta_dgr: f32, distance: f32) -> Vec3 {
  spherical_to_cartesian_rad(phi_dgr.to_radians(), theta_dgr.to_radians(), distance)
}

/// Convert spherical->cartesian. Both angles in radians.
pub fn spherical_to_cartesian_rad(phi: f32, theta: f32, distance: f32) -> Vec3 {
  vec3(
    f32::cos(phi) * f32::sin(theta) * distance,
    f32::cos(theta) * distance,
    f32::sin(phi) * f32::sin(theta) * distance,
  )
}

/// https://registry.khronos.org/OpenGL-Refpages/gl4/html/mix.xhtml
pub fn lerp_f32(min: f32, max: f32, weight: f32) -> f32 {
  min + (max - min) * weight
}

pub fn vec3_to_pretty_str(v: Vec3) -> String {
  format!("[{:.3}, {:.3}, {:.3}]", v.x, v.y, v.z)
}

/// Seeded noise, so that the demo output is the same between runs.
pub struct RngNoiseGenerator {
  rng: StdRng,
}

impl RngNoiseGenerator {
  pub fn new(seed: u64) -> Self {
    Self {
      rng: StdRng::seed_from_u64(seed),
    }
  }

  /// Random value in `[1 - amplitude, 1 + amplitude]`
  pub fn generate_multiplier(&mut self, amplitude: f32) -> f32 {
    let t = self.rng.gen::<f32>(); // [0, 1)
    lerp_f32(1.0 - amplitude, 1.0 + amplitude, t)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn spherical_up_vector() {
    let v = spherical_to_cartesian_dgr(0.0, 0.0, 2.0);
    assert!((v - vec3(0.0, 2.0, 0.0)).length() < 1e-5);
  }

  #[test]
  fn noise_is_deterministic_and_bounded() {
    let mut a = RngNoiseGenerator::new(7);
    let mut b = RngNoiseGenerator::new(7);
    for _ in 0..100 {
      let v = a.generate_multiplier(0.1);
      assert_eq!(v, b.generate_multiplier(0.1));
      assert!((0.9..=1.1).contains(&v));
    }
  }
}
