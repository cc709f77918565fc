use glam::Vec3;
use thiserror::Error;

pub type SSSResult<T> = Result<T, SSSError>;

#[derive(Error, Debug)]
pub enum SSSError {
  #[error("Sample count must be odd and positive, got {0}")]
  InvalidSampleCount(usize),

  #[error("Invalid texture resolution {width}x{height}")]
  InvalidResolution { width: u32, height: u32 },

  #[error("Field of view must be in (0, 180) degrees, got {0}")]
  InvalidFieldOfView(f32),

  #[error("SSS width must be positive and finite, got {0}")]
  InvalidWidth(f32),

  #[error("SSS falloff must be in (0, 1] per channel, got {0}")]
  InvalidFalloff(Vec3),

  #[error("Texture '{name}' is {actual_width}x{actual_height}, expected {expected_width}x{expected_height}")]
  TargetSizeMismatch {
    name: &'static str,
    expected_width: u32,
    expected_height: u32,
    actual_width: u32,
    actual_height: u32,
  },

  #[error("Kernel has {sample_count} samples, the GPU blur supports at most {max}")]
  KernelTooLarge { sample_count: usize, max: usize },

  #[error("Region id {0} is the stencil clear value, it cannot mark pixels on the fly")]
  ReservedRegionId(u8),

  #[error("Context was configured with a separate strength source, but none was provided")]
  MissingStrengthSource,

  #[error("Failed to read '{path}'")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Failed to decode image '{path}': {reason}")]
  ImageDecode { path: String, reason: String },

  #[error("Failed to write image '{path}'")]
  ImageEncode {
    path: String,
    #[source]
    source: image::ImageError,
  },
}
