use glam::Vec3;

use crate::utils::{color_hex_to_vec, spherical_to_cartesian_dgr};

pub struct LightAmbient {
  pub color: Vec3,
  pub energy: f32,
}

impl Default for LightAmbient {
  fn default() -> Self {
    Self {
      color: color_hex_to_vec(160, 160, 160),
      energy: 0.02,
    }
  }
}

pub struct LightCfg {
  /// horizontal [dgr]
  pub pos_phi: f32,
  /// verical [dgr]
  pub pos_theta: f32,
  pub pos_distance: f32,
  pub color: Vec3,
  pub energy: f32,
}

impl LightCfg {
  pub fn light0() -> Self {
    LightCfg {
      pos_phi: 55.0,   // horizontal [dgr]
      pos_theta: 60.0, // verical [dgr]
      pos_distance: 10.0,
      color: color_hex_to_vec(214, 197, 208),
      energy: 1.0,
    }
  }

  pub fn light1() -> Self {
    LightCfg {
      pos_phi: 150.0,  // horizontal [dgr]
      pos_theta: 82.0, // verical [dgr]
      pos_distance: 10.0,
      color: color_hex_to_vec(214, 166, 166),
      energy: 0.80,
    }
  }

  pub fn position(&self) -> Vec3 {
    spherical_to_cartesian_dgr(self.pos_phi, self.pos_theta, self.pos_distance)
  }

  pub fn radiance(&self) -> Vec3 {
    self.color * self.energy
  }
}
