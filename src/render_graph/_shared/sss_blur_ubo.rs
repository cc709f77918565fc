use bytemuck;
use glam::{vec4, Vec4};

use crate::sss::SSSBlurContext;

/// Same as `SSSS_N_SAMPLES_MAX` in `sss_blur.frag.glsl`.
pub const SSS_KERNEL_SIZE_MAX: usize = 64;

/// Kernel and blur settings, updated before every blur.
/// Layout matches `std140`, every member is a `vec4`.
#[derive(Copy, Clone, Debug)] // , bytemuck::Zeroable, bytemuck::Pod
#[repr(C)]
pub struct SSSBlurUBO {
  /// `[weight.rgb, offset]`, center tap first
  pub u_kernel: [Vec4; SSS_KERNEL_SIZE_MAX],
  /// `[sss width, distance to projection window, sample count, follow surface]`
  pub u_params: Vec4,
  /// `[separate strength source, -, -, -]`
  pub u_flags: Vec4,
}

unsafe impl bytemuck::Zeroable for SSSBlurUBO {}
unsafe impl bytemuck::Pod for SSSBlurUBO {}

impl SSSBlurUBO {
  /// Caller checks that the kernel fits in [`SSS_KERNEL_SIZE_MAX`].
  pub fn new(ctx: &SSSBlurContext) -> SSSBlurUBO {
    let mut u_kernel = [Vec4::ZERO; SSS_KERNEL_SIZE_MAX];
    ctx
      .kernel()
      .as_vec4s()
      .iter()
      .zip(u_kernel.iter_mut())
      .for_each(|(sample, dst)| *dst = *sample);

    SSSBlurUBO {
      u_kernel,
      u_params: vec4(
        ctx.width(),
        ctx.distance_to_projection_window(),
        ctx.kernel().len() as f32,
        bool_to_f32(ctx.is_following_surface()),
      ),
      u_flags: vec4(
        bool_to_f32(ctx.has_separate_strength_source()),
        0.0,
        0.0,
        0.0,
      ),
    }
  }
}

fn bool_to_f32(v: bool) -> f32 {
  if v {
    1.0
  } else {
    0.0
  }
}
