use glam::{vec2, Vec2, Vec4};
use half::f16;

use super::error::{SSSError, SSSResult};

pub type ColorTexture = Texture2D<Vec4>;
/// Linear depth, in world units.
pub type DepthTexture = Texture2D<f32>;
/// Per-pixel SSS strength, when not stored in the color's alpha channel.
pub type StrengthTexture = Texture2D<f32>;
pub type StencilTexture = Texture2D<u8>;

pub trait Texel: Copy + Default {}

impl Texel for f32 {}
impl Texel for u8 {}
impl Texel for Vec4 {}

/// Texels that can be bilinearly filtered.
pub trait FilterableTexel: Texel {
  fn mix(self, other: Self, t: f32) -> Self;
}

impl FilterableTexel for f32 {
  fn mix(self, other: Self, t: f32) -> Self {
    self + (other - self) * t
  }
}

impl FilterableTexel for Vec4 {
  fn mix(self, other: Self, t: f32) -> Self {
    self.lerp(other, t)
  }
}

/// Format of the color buffer and of the blur's intermediate render target.
/// Each written texel is stored at the precision of the format.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ColorFormat {
  Rgba8Unorm,
  Rgba8UnormSrgb,
  Rgba16Float,
  Rgba32Float,
}

impl ColorFormat {
  /// Value that would be read back after writing `v` to a texture of this format.
  pub fn store(&self, v: Vec4) -> Vec4 {
    match self {
      ColorFormat::Rgba8Unorm => Vec4::new(unorm8(v.x), unorm8(v.y), unorm8(v.z), unorm8(v.w)),
      ColorFormat::Rgba8UnormSrgb => Vec4::new(
        srgb8(v.x),
        srgb8(v.y),
        srgb8(v.z),
        unorm8(v.w), // alpha is always linear
      ),
      ColorFormat::Rgba16Float => Vec4::new(
        f16::from_f32(v.x).to_f32(),
        f16::from_f32(v.y).to_f32(),
        f16::from_f32(v.z).to_f32(),
        f16::from_f32(v.w).to_f32(),
      ),
      ColorFormat::Rgba32Float => v,
    }
  }

  /// [`ColorFormat::store`] for each texel.
  pub fn store_all(&self, texels: &mut [Vec4]) {
    texels.iter_mut().for_each(|t| *t = self.store(*t));
  }

  pub fn bytes_per_pixel(&self) -> usize {
    match self {
      ColorFormat::Rgba8Unorm | ColorFormat::Rgba8UnormSrgb => 4,
      ColorFormat::Rgba16Float => 8,
      ColorFormat::Rgba32Float => 16,
    }
  }

  /// Raw texel bytes, as uploaded to a GPU texture of this format.
  pub fn encode(&self, texels: &[Vec4]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(texels.len() * self.bytes_per_pixel());
    for v in texels {
      match self {
        ColorFormat::Rgba8Unorm => {
          bytes.extend(v.to_array().iter().map(|c| to_unorm8(*c)));
        }
        ColorFormat::Rgba8UnormSrgb => {
          let [r, g, b, a] = v.to_array();
          bytes.extend([r, g, b].iter().map(|c| to_unorm8(linear_to_srgb(c.clamp(0.0, 1.0)))));
          bytes.push(to_unorm8(a));
        }
        ColorFormat::Rgba16Float => {
          for c in v.to_array() {
            bytes.extend_from_slice(&f16::from_f32(c).to_le_bytes());
          }
        }
        ColorFormat::Rgba32Float => {
          for c in v.to_array() {
            bytes.extend_from_slice(&c.to_le_bytes());
          }
        }
      }
    }
    bytes
  }

  /// Inverse of [`ColorFormat::encode`]. Trailing bytes that do not form a full texel are ignored.
  pub fn decode(&self, bytes: &[u8]) -> Vec<Vec4> {
    bytes
      .chunks_exact(self.bytes_per_pixel())
      .map(|texel| match self {
        ColorFormat::Rgba8Unorm => {
          Vec4::new(texel[0] as f32, texel[1] as f32, texel[2] as f32, texel[3] as f32) / 255.0
        }
        ColorFormat::Rgba8UnormSrgb => Vec4::new(
          srgb_to_linear(texel[0] as f32 / 255.0),
          srgb_to_linear(texel[1] as f32 / 255.0),
          srgb_to_linear(texel[2] as f32 / 255.0),
          texel[3] as f32 / 255.0,
        ),
        ColorFormat::Rgba16Float => {
          let mut c = texel
            .chunks_exact(2)
            .map(|h| f16::from_le_bytes([h[0], h[1]]).to_f32());
          Vec4::new(
            c.next().unwrap_or_default(),
            c.next().unwrap_or_default(),
            c.next().unwrap_or_default(),
            c.next().unwrap_or_default(),
          )
        }
        ColorFormat::Rgba32Float => {
          let mut c = texel
            .chunks_exact(4)
            .map(|f| f32::from_le_bytes([f[0], f[1], f[2], f[3]]));
          Vec4::new(
            c.next().unwrap_or_default(),
            c.next().unwrap_or_default(),
            c.next().unwrap_or_default(),
            c.next().unwrap_or_default(),
          )
        }
      })
      .collect()
  }
}

fn to_unorm8(v: f32) -> u8 {
  (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn unorm8(v: f32) -> f32 {
  (v.clamp(0.0, 1.0) * 255.0).round() / 255.0
}

fn srgb8(v: f32) -> f32 {
  srgb_to_linear(unorm8(linear_to_srgb(v.clamp(0.0, 1.0))))
}

pub fn linear_to_srgb(v: f32) -> f32 {
  if v <= 0.0031308 {
    v * 12.92
  } else {
    1.055 * v.powf(1.0 / 2.4) - 0.055
  }
}

pub fn srgb_to_linear(v: f32) -> f32 {
  if v <= 0.04045 {
    v / 12.92
  } else {
    ((v + 0.055) / 1.055).powf(2.4)
  }
}

/// Largest supported width or height, the guaranteed `maxImageDimension2D` of desktop GPUs.
pub const MAX_TEXTURE_DIMENSION: u32 = 16384;

/// Row-major 2D texture. Sampling uses normalized coordinates
/// with clamp-to-edge addressing, texel centers are at `(i + 0.5) / size`.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture2D<T: Texel> {
  width: u32,
  height: u32,
  data: Vec<T>,
}

impl<T: Texel> Texture2D<T> {
  pub fn new(width: u32, height: u32, fill: T) -> SSSResult<Self> {
    let texel_count = Self::texel_count(width, height)?;
    Ok(Self {
      width,
      height,
      data: vec![fill; texel_count],
    })
  }

  pub fn from_fn<F>(width: u32, height: u32, f: F) -> SSSResult<Self>
  where
    F: Fn(u32, u32) -> T,
  {
    Self::texel_count(width, height)?;
    let data = (0..height)
      .flat_map(|y| (0..width).map(move |x| (x, y)))
      .map(|(x, y)| f(x, y))
      .collect();
    Ok(Self {
      width,
      height,
      data,
    })
  }

  pub fn from_data(width: u32, height: u32, data: Vec<T>) -> SSSResult<Self> {
    if data.len() != Self::texel_count(width, height)? {
      return Err(SSSError::InvalidResolution { width, height });
    }
    Ok(Self {
      width,
      height,
      data,
    })
  }

  fn texel_count(width: u32, height: u32) -> SSSResult<usize> {
    let valid = 1..=MAX_TEXTURE_DIMENSION;
    if !valid.contains(&width) || !valid.contains(&height) {
      return Err(SSSError::InvalidResolution { width, height });
    }
    (width as usize)
      .checked_mul(height as usize)
      .ok_or(SSSError::InvalidResolution { width, height })
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn size(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  pub fn data(&self) -> &[T] {
    &self.data
  }

  pub fn data_mut(&mut self) -> &mut [T] {
    &mut self.data
  }

  fn index(&self, x: u32, y: u32) -> usize {
    y as usize * self.width as usize + x as usize
  }

  pub fn get(&self, x: u32, y: u32) -> T {
    self.data[self.index(x, y)]
  }

  pub fn set(&mut self, x: u32, y: u32, value: T) {
    let idx = self.index(x, y);
    self.data[idx] = value;
  }

  pub fn fill(&mut self, value: T) {
    self.data.iter_mut().for_each(|t| *t = value);
  }

  /// Size of a single texel in normalized coordinates.
  pub fn texel_size(&self) -> Vec2 {
    vec2(1.0 / self.width as f32, 1.0 / self.height as f32)
  }

  /// Normalized coordinates of the texel's center.
  pub fn texel_center(&self, x: u32, y: u32) -> Vec2 {
    (vec2(x as f32, y as f32) + 0.5) * self.texel_size()
  }

  /// Texel at `(x, y)`, clamped to edge. Float to int casts saturate, so NaN lands on 0.
  fn clamped(&self, x: i64, y: i64) -> T {
    let x = x.clamp(0, self.width as i64 - 1) as u32;
    let y = y.clamp(0, self.height as i64 - 1) as u32;
    self.get(x, y)
  }

  /// Nearest texel.
  pub fn sample_point(&self, uv: Vec2) -> T {
    let x = (uv.x * self.width as f32).floor() as i64;
    let y = (uv.y * self.height as f32).floor() as i64;
    self.clamped(x, y)
  }
}

impl<T: FilterableTexel> Texture2D<T> {
  /// Bilinear filtering of the 4 closest texels.
  pub fn sample_linear(&self, uv: Vec2) -> T {
    let x = uv.x * self.width as f32 - 0.5;
    let y = uv.y * self.height as f32 - 0.5;
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;
    let (x0, y0) = (x0 as i64, y0 as i64);

    let top = self.clamped(x0, y0).mix(self.clamped(x0 + 1, y0), fx);
    let bottom = self
      .clamped(x0, y0 + 1)
      .mix(self.clamped(x0 + 1, y0 + 1), fx);
    top.mix(bottom, fy)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const EPSILON: f32 = 1e-5;

  fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
  }

  fn gradient() -> DepthTexture {
    Texture2D::from_fn(4, 2, |x, y| (x + 10 * y) as f32).unwrap()
  }

  #[test]
  fn rejects_empty_texture() {
    assert!(DepthTexture::new(0, 4, 0.0).is_err());
    assert!(DepthTexture::from_data(2, 2, vec![0.0; 3]).is_err());
  }

  #[test]
  fn rejects_oversized_texture() {
    let too_big = MAX_TEXTURE_DIMENSION + 1;
    assert!(matches!(
      StencilTexture::new(65536, 65536, 0),
      Err(SSSError::InvalidResolution {
        width: 65536,
        height: 65536
      })
    ));
    assert!(DepthTexture::new(too_big, 1, 0.0).is_err());
    assert!(DepthTexture::from_fn(1, too_big, |_, _| 0.0).is_err());
    assert!(StencilTexture::from_data(u32::MAX, u32::MAX, Vec::new()).is_err());
  }

  #[test]
  fn widest_texture_is_indexable() {
    let x = MAX_TEXTURE_DIMENSION - 1;
    let mut tex = StencilTexture::new(MAX_TEXTURE_DIMENSION, 2, 0).unwrap();
    tex.set(x, 1, 5);
    assert_eq!(tex.data().len(), 2 * MAX_TEXTURE_DIMENSION as usize);
    assert_eq!(tex.data()[2 * MAX_TEXTURE_DIMENSION as usize - 1], 5);
    assert_eq!(tex.get(x, 0), 0);
  }

  #[test]
  fn point_sampling_picks_texel() {
    let tex = gradient();
    assert_eq!(tex.sample_point(tex.texel_center(2, 1)), 12.0);
    assert_eq!(tex.sample_point(vec2(0.0, 0.0)), 0.0);
    assert_eq!(tex.sample_point(vec2(0.999, 0.999)), 13.0);
  }

  #[test]
  fn linear_sampling_at_center_is_exact() {
    let tex = gradient();
    for y in 0..2 {
      for x in 0..4 {
        assert_eq!(tex.sample_linear(tex.texel_center(x, y)), tex.get(x, y));
      }
    }
  }

  #[test]
  fn linear_sampling_interpolates() {
    let tex = gradient();
    // halfway between (1,0) and (2,0)
    let uv = vec2(2.0 / 4.0, 0.5 / 2.0);
    assert!(approx(tex.sample_linear(uv), 1.5));
    // halfway between rows
    let uv = vec2(0.5 / 4.0, 0.5);
    assert!(approx(tex.sample_linear(uv), 5.0));
  }

  #[test]
  fn sampling_clamps_to_edge() {
    let tex = gradient();
    assert_eq!(tex.sample_linear(vec2(-3.0, -3.0)), 0.0);
    assert_eq!(tex.sample_linear(vec2(5.0, 5.0)), 13.0);
    assert_eq!(tex.sample_point(vec2(5.0, -1.0)), 3.0);
  }

  #[test]
  fn color_format_precision() {
    let v = Vec4::new(0.31, 0.5001, 1.7, -0.2);
    assert_eq!(ColorFormat::Rgba32Float.store(v), v);

    let unorm = ColorFormat::Rgba8Unorm.store(v);
    assert!(approx(unorm.x, 79.0 / 255.0));
    assert!(approx(unorm.z, 1.0));
    assert!(approx(unorm.w, 0.0));

    let half = ColorFormat::Rgba16Float.store(v);
    assert!((half.x - 0.31).abs() < 1e-3);
    assert!((half.z - 1.7).abs() < 2e-3);
    assert_ne!(half.x, v.x);

    let srgb = ColorFormat::Rgba8UnormSrgb.store(Vec4::new(0.0, 1.0, 0.2, 0.5));
    assert!(approx(srgb.x, 0.0));
    assert!(approx(srgb.y, 1.0));
    assert!((srgb.z - 0.2).abs() < 0.01);
    assert!(approx(srgb.w, 128.0 / 255.0));
  }

  #[test]
  fn decoded_bytes_match_stored_precision() {
    let texels = [
      Vec4::new(0.31, 0.5001, 1.7, -0.2),
      Vec4::new(0.0, 0.02, 0.75, 1.0),
    ];
    for format in [
      ColorFormat::Rgba8Unorm,
      ColorFormat::Rgba8UnormSrgb,
      ColorFormat::Rgba16Float,
      ColorFormat::Rgba32Float,
    ] {
      let bytes = format.encode(&texels);
      assert_eq!(bytes.len(), 2 * format.bytes_per_pixel());
      let decoded = format.decode(&bytes);
      for (d, v) in decoded.iter().zip(texels.iter()) {
        assert!((*d - format.store(*v)).abs().max_element() < EPSILON, "{:?}", format);
      }
    }
  }

  #[test]
  fn srgb_roundtrip() {
    for i in 0..=10 {
      let v = i as f32 / 10.0;
      assert!(approx(srgb_to_linear(linear_to_srgb(v)), v));
    }
  }
}
