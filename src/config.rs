use glam::Vec3;

use crate::utils::color_hex_to_vec;

pub use self::{camera::*, light::*, sss::*};

pub mod camera;
pub mod light;
pub mod sss;

/// What the demo writes to the output image.
pub enum DisplayMode {
  Final = 0,
  /// Input of the blur
  Original = 1,
  /// Difference between the blurred and the original color
  SSSContribution = 2,
  /// Transmittance from the back light
  SSSThickness = 3,
}

pub struct Config {
  /// debug display mode
  pub display_mode: usize,
  // window
  pub window_width: u32,
  pub window_height: u32,
  // clear colors
  pub clear_color: Vec3,
  pub clear_stencil: u8,
  // scene-related
  /// radius of the sphere that stands in for the head
  pub model_scale: f32,
  pub camera: CameraConfig,
  // lights
  pub light_ambient: LightAmbient,
  pub light0: LightCfg,
  // sss
  pub sss_forward_scatter: SSSForwardScatterPassCfg,
  pub sss_blur: SSSBlurPassCfg,
}

impl Config {
  pub const DEBUG_LAYOUT_TRANSITIONS: bool = false;
  /// Vulkan validation layers. Requires the Vulkan SDK
  pub const GRAPHICS_DEBUGGING: bool = false;

  pub const STENCIL_BIT_SKIN: u8 = 1 << 0;

  pub fn new() -> Config {
    let clear_col: u8 = 93;

    Config {
      display_mode: DisplayMode::Final as _,
      // window
      window_width: 800,
      window_height: 600,
      // clear colors
      clear_color: color_hex_to_vec(clear_col, clear_col, clear_col),
      clear_stencil: 0,
      // scene
      model_scale: 0.1,
      camera: CameraConfig::default(),
      // lights
      light_ambient: LightAmbient::default(),
      light0: LightCfg::light0(),
      // sss
      sss_forward_scatter: SSSForwardScatterPassCfg::default(),
      sss_blur: SSSBlurPassCfg::default(),
    }
  }

  pub fn aspect_ratio(&self) -> f32 {
    self.window_width as f32 / self.window_height as f32
  }
}

impl Default for Config {
  fn default() -> Self {
    Self::new()
  }
}
