use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use glam::{vec3, vec4, Mat4, Vec3, Vec4, Vec4Swizzles};
use image::{ImageBuffer, Rgb};
use jpeg_decoder::{Decoder, PixelFormat};
use log::{info, trace};

use crate::config::{Config, DisplayMode, SSSForwardScatterPassCfg};
use crate::sss::{
  linear_to_srgb, shadow_map_thickness, srgb_to_linear, transmittance, ColorTexture,
  DepthTexture, SSSError, SSSResult, StencilTexture, StrengthTexture,
};
use crate::utils::{color_hex_to_vec, RngNoiseGenerator};

const SKIN_ALBEDO: (u8, u8, u8) = (214, 160, 138);
/// Albedo variation, so that the blur has something to smooth out.
const SKIN_NOISE: f32 = 0.25;
const NOISE_SEED: u64 = 0x5555;

/// Everything that the blur needs, as produced by the forward pass.
pub struct SceneBuffers {
  /// Linear HDR color. Alpha is SSS strength
  pub color: ColorTexture,
  /// Linear depth, in world units
  pub depth: DepthTexture,
  /// `Config::STENCIL_BIT_SKIN` where skin is
  pub stencil: StencilTexture,
  /// Same as color's alpha
  pub strength: StrengthTexture,
  /// Light transmitted from the back light, already added to `color`
  pub transmittance: ColorTexture,
}

struct Camera {
  position: Vec3,
  forward: Vec3,
  right: Vec3,
  up: Vec3,
  tan_half_fov: f32,
  aspect: f32,
}

impl Camera {
  fn new(cfg: &Config) -> Self {
    let forward = (cfg.camera.look_at_target - cfg.camera.position).normalize();
    let right = forward.cross(Vec3::Y).normalize();
    let up = right.cross(forward);
    Self {
      position: cfg.camera.position,
      forward,
      right,
      up,
      tan_half_fov: (0.5 * cfg.camera.fov_dgr.to_radians()).tan(),
      aspect: cfg.aspect_ratio(),
    }
  }

  fn ray_dir(&self, x: u32, y: u32, width: u32, height: u32) -> Vec3 {
    let ndc_x = 2.0 * (x as f32 + 0.5) / width as f32 - 1.0;
    let ndc_y = 1.0 - 2.0 * (y as f32 + 0.5) / height as f32;
    let dir = self.forward
      + self.right * ndc_x * self.aspect * self.tan_half_fov
      + self.up * ndc_y * self.tan_half_fov;
    dir.normalize()
  }
}

/// Distance along the ray to the first hit with the sphere.
fn intersect_sphere(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
  let oc = origin - center;
  let b = oc.dot(dir);
  let c = oc.length_squared() - radius * radius;
  let discriminant = b * b - c;
  if discriminant < 0.0 {
    return None;
  }
  let t = -b - discriminant.sqrt();
  if t > 0.0 {
    Some(t)
  } else {
    None
  }
}

/// World to shadow map texture space. `z` is the distance from the light.
fn light_view_projection(cfg: &SSSForwardScatterPassCfg) -> Mat4 {
  let view = Mat4::look_at_rh(cfg.source.position(), Vec3::ZERO, Vec3::Y);
  let s = 1.0 / (2.0 * cfg.projection_size);
  let to_texture_space = Mat4::from_cols(
    vec4(s, 0.0, 0.0, 0.0),
    vec4(0.0, -s, 0.0, 0.0),
    vec4(0.0, 0.0, -1.0, 0.0),
    vec4(0.5, 0.5, 0.0, 1.0),
  );
  to_texture_space * view
}

/// Linear 0..1 depth of the sphere, as seen from the back light.
fn create_sss_depth_map(cfg: &Config) -> SSSResult<DepthTexture> {
  let scatter_cfg = &cfg.sss_forward_scatter;
  let size = scatter_cfg.depthmap_size;
  let view = Mat4::look_at_rh(scatter_cfg.source.position(), Vec3::ZERO, Vec3::Y);
  let sphere_center = view.transform_point3(Vec3::ZERO);
  let half_size = scatter_cfg.projection_size;

  DepthTexture::from_fn(size, size, |x, y| {
    let u = (x as f32 + 0.5) / size as f32;
    let v = (y as f32 + 0.5) / size as f32;
    let origin = vec3((2.0 * u - 1.0) * half_size, (1.0 - 2.0 * v) * half_size, 0.0);
    let dir = vec3(0.0, 0.0, -1.0);
    match intersect_sphere(origin, dir, sphere_center, cfg.model_scale) {
      Some(t) => (t / scatter_cfg.projection_far).min(1.0),
      None => 1.0,
    }
  })
}

/// Lit sphere that stands in for the head.
pub fn create_sphere_scene(cfg: &Config) -> SSSResult<SceneBuffers> {
  let (width, height) = (cfg.window_width, cfg.window_height);
  info!("Creating sphere scene ({}x{})", width, height);

  let camera = Camera::new(cfg);
  let scatter_cfg = &cfg.sss_forward_scatter;
  let sss_depth_map = create_sss_depth_map(cfg)?;
  let light_vp = light_view_projection(scatter_cfg);
  let albedo_base = color_hex_to_vec(SKIN_ALBEDO.0, SKIN_ALBEDO.1, SKIN_ALBEDO.2);
  let ambient = cfg.light_ambient.color * cfg.light_ambient.energy;

  let mut color = ColorTexture::new(width, height, cfg.clear_color.extend(0.0))?;
  let mut depth = DepthTexture::new(width, height, cfg.camera.z_far)?;
  let mut stencil = StencilTexture::new(width, height, cfg.clear_stencil)?;
  let mut transmitted = ColorTexture::new(width, height, Vec4::ZERO)?;
  let mut noise = RngNoiseGenerator::new(NOISE_SEED);

  for y in 0..height {
    for x in 0..width {
      let dir = camera.ray_dir(x, y, width, height);
      let t = match intersect_sphere(camera.position, dir, Vec3::ZERO, cfg.model_scale) {
        Some(t) => t,
        None => continue,
      };
      let position = camera.position + t * dir;
      let normal = position.normalize();
      let albedo = albedo_base * noise.generate_multiplier(SKIN_NOISE);

      let to_light0 = (cfg.light0.position() - position).normalize();
      let diffuse = normal.dot(to_light0).max(0.0) * cfg.light0.radiance();

      let to_back_light = (scatter_cfg.source.position() - position).normalize();
      let thickness = shadow_map_thickness(
        &sss_depth_map,
        position,
        normal,
        &light_vp,
        scatter_cfg.projection_far,
      );
      let transmitted_light = transmittance(
        scatter_cfg.translucency,
        cfg.sss_blur.blur_width,
        thickness,
        to_back_light,
        normal,
      ) * scatter_cfg.source.radiance();

      let radiance = albedo * (ambient + diffuse + transmitted_light);
      color.set(x, y, radiance.extend(1.0));
      depth.set(x, y, (position - camera.position).dot(camera.forward));
      stencil.set(x, y, Config::STENCIL_BIT_SKIN);
      transmitted.set(x, y, transmitted_light.extend(1.0));
    }
  }

  let strength = strength_from_alpha(&color)?;
  Ok(SceneBuffers {
    color,
    depth,
    stencil,
    strength,
    transmittance: transmitted,
  })
}

fn strength_from_alpha(color: &ColorTexture) -> SSSResult<StrengthTexture> {
  let alpha = color.data().iter().map(|c| c.w).collect();
  StrengthTexture::from_data(color.width(), color.height(), alpha)
}

/// Color from a JPEG file, treated as skin placed `depth` units from the camera.
pub fn load_jpeg_scene(path: &Path, depth: f32) -> SSSResult<SceneBuffers> {
  info!("Loading scene from '{}'", path.to_string_lossy());
  let path_str = path.to_string_lossy().to_string();
  let file = File::open(path).map_err(|source| SSSError::Io {
    path: path_str.clone(),
    source,
  })?;
  let mut decoder = Decoder::new(BufReader::new(file));
  let pixel_bytes_rgb = decoder.decode().map_err(|e| SSSError::ImageDecode {
    path: path_str.clone(),
    reason: e.to_string(),
  })?;
  let metadata = decoder.info().ok_or_else(|| SSSError::ImageDecode {
    path: path_str.clone(),
    reason: "missing image metadata".to_string(),
  })?;
  trace!("File meta: {:?}", metadata);

  if metadata.pixel_format != PixelFormat::RGB24 {
    return Err(SSSError::ImageDecode {
      path: path_str,
      reason: format!(
        "pixel format {:?}, expected PixelFormat::RGB24",
        metadata.pixel_format
      ),
    });
  }
  let width = metadata.width as u32;
  let height = metadata.height as u32;

  let pixels = pixel_bytes_rgb
    .chunks_exact(3)
    .map(|rgb| {
      let c = color_hex_to_vec(rgb[0], rgb[1], rgb[2]);
      vec4(srgb_to_linear(c.x), srgb_to_linear(c.y), srgb_to_linear(c.z), 1.0)
    })
    .collect();
  let color = ColorTexture::from_data(width, height, pixels)?;
  let strength = strength_from_alpha(&color)?;

  Ok(SceneBuffers {
    depth: DepthTexture::new(width, height, depth)?,
    stencil: StencilTexture::new(width, height, Config::STENCIL_BIT_SKIN)?,
    transmittance: ColorTexture::new(width, height, Vec4::ZERO)?,
    color,
    strength,
  })
}

/// Tonemap (clamp) and write as 8-bit sRGB png.
pub fn save_png(path: &Path, texture: &ColorTexture) -> SSSResult<()> {
  info!("Writing '{}'", path.to_string_lossy());
  let to_u8 = |v: f32| (linear_to_srgb(v.clamp(0.0, 1.0)) * 255.0).round() as u8;
  let img = ImageBuffer::from_fn(texture.width(), texture.height(), |x, y| {
    let c = texture.get(x, y).xyz();
    Rgb([to_u8(c.x), to_u8(c.y), to_u8(c.z)])
  });
  img.save(path).map_err(|source| SSSError::ImageEncode {
    path: path.to_string_lossy().to_string(),
    source,
  })
}

/// Image selected by `Config::display_mode`.
pub fn select_display_texture<'a>(
  cfg: &Config,
  scene: &'a SceneBuffers,
  original: &'a ColorTexture,
  blurred: &'a ColorTexture,
  contribution: &'a ColorTexture,
) -> &'a ColorTexture {
  match cfg.display_mode {
    m if m == DisplayMode::SSSContribution as usize => contribution,
    m if m == DisplayMode::SSSThickness as usize => &scene.transmittance,
    m if m == DisplayMode::Original as usize => original,
    _ => blurred,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn small_config() -> Config {
    let mut cfg = Config::new();
    cfg.window_width = 40;
    cfg.window_height = 30;
    cfg.sss_forward_scatter.depthmap_size = 32;
    cfg
  }

  #[test]
  fn sphere_is_centered() {
    let cfg = small_config();
    let scene = create_sphere_scene(&cfg).unwrap();
    assert_eq!(scene.stencil.get(20, 15), Config::STENCIL_BIT_SKIN);
    assert_eq!(scene.stencil.get(0, 0), 0);
    assert_eq!(scene.color.get(20, 15).w, 1.0);
    assert_eq!(scene.color.get(0, 0).w, 0.0);
    assert_eq!(scene.strength.get(20, 15), 1.0);
  }

  #[test]
  fn sphere_depth_is_linear() {
    let cfg = small_config();
    let scene = create_sphere_scene(&cfg).unwrap();
    let center = scene.depth.get(20, 15);
    // camera at 0.6 from the center, sphere radius 0.1
    assert!((center - 0.5).abs() < 0.01, "depth {}", center);
    assert_eq!(scene.depth.get(0, 0), cfg.camera.z_far);
  }

  #[test]
  fn sphere_scene_is_deterministic() {
    let cfg = small_config();
    let a = create_sphere_scene(&cfg).unwrap();
    let b = create_sphere_scene(&cfg).unwrap();
    assert_eq!(a.color, b.color);
  }

  #[test]
  fn sss_depth_map_sees_sphere() {
    let cfg = small_config();
    let depth_map = create_sss_depth_map(&cfg).unwrap();
    // light is 1.0 from the sphere center, sphere radius 0.1, far plane 2.0
    assert!((depth_map.get(16, 16) - 0.45).abs() < 0.01);
    assert_eq!(depth_map.get(0, 0), 1.0);
  }

  #[test]
  fn missing_jpeg_is_io_error() {
    let result = load_jpeg_scene(Path::new("./does-not-exist.jpg"), 1.0);
    assert!(matches!(result, Err(SSSError::Io { .. })));
  }
}
