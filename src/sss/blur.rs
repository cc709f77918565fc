use glam::{vec2, Vec2, Vec3, Vec4, Vec4Swizzles};
use log::trace;

use super::kernel::SSSKernel;
use super::texture::{ColorFormat, ColorTexture, DepthTexture, StencilTexture, StrengthTexture};

/// If the depth difference between the center and a tap is big, the tap's color is
/// lerped back to the center color. Empirically tuned, renderers may want to change it.
pub const FOLLOW_SURFACE_STRENGTH: f32 = 300.0;
/// Pixels with this strength are discarded when the stencil is initialized on the fly.
pub const DISCARD_STRENGTH: f32 = 0.0;
/// Stencil value of unmarked pixels, after the stencil is cleared on the fly.
/// Cannot be used as a region id in that mode.
pub const STENCIL_CLEAR_VALUE: u8 = 0;
/// The kernels range from -3 to 3.
pub const KERNEL_RANGE_NORMALIZATION: f32 = 1.0 / 3.0;

pub const BLUR_DIRECTION_PASS0: Vec2 = vec2(1.0, 0.0);
pub const BLUR_DIRECTION_PASS1: Vec2 = vec2(0.0, 1.0);

/// `1 / tan(fov / 2)`. Scale of `sss_width` for a unit plane sitting on the projection window.
pub fn distance_to_projection_window(fov_dgr: f32) -> f32 {
  1.0 / (0.5 * fov_dgr.to_radians()).tan()
}

/// Step between kernel taps, in normalized texture coordinates.
pub fn final_step(
  sss_width: f32,
  distance_to_projection_window: f32,
  linear_depth: f32,
  strength: f32,
  direction: Vec2,
) -> Vec2 {
  let scale = distance_to_projection_window / linear_depth;
  sss_width * scale * direction * strength * KERNEL_RANGE_NORMALIZATION
}

/// What the stencil does for the pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StencilOp {
  /// Every pixel passes the test. Written pixels get the region id.
  Replace,
  /// Only pixels with the region id are written.
  Equal,
}

/// Where per-pixel SSS strength comes from.
#[derive(Copy, Clone, Debug)]
pub enum StrengthSource<'a> {
  /// Alpha channel of the color that is blurred.
  ColorAlpha,
  Texture(&'a StrengthTexture),
}

/// Per-pass state, analogous to the pipeline state of the shader implementation.
#[derive(Copy, Clone, Debug)]
pub struct BlurPassDesc {
  pub direction: Vec2,
  pub stencil_op: StencilOp,
  /// Skip pixels with [`DISCARD_STRENGTH`]. Used to initialize stencil.
  pub discard_zero_strength: bool,
  pub follow_surface: bool,
  pub sss_width: f32,
  pub distance_to_projection_window: f32,
  /// Precision of `target`.
  pub target_format: ColorFormat,
}

/// Inputs and outputs of a single blur pass.
pub struct BlurPassTargets<'a> {
  pub color_source: &'a ColorTexture,
  pub depth: &'a DepthTexture,
  pub strength: StrengthSource<'a>,
  pub stencil: &'a mut StencilTexture,
  pub target: &'a mut ColorTexture,
}

/// Run a single 1D blur pass over the whole target. Pixels rejected by stencil or
/// discarded keep the previous content of `target`.
///
/// Returns the number of written pixels.
pub fn execute_blur_pass(
  desc: &BlurPassDesc,
  kernel: &SSSKernel,
  region_id: u8,
  targets: BlurPassTargets,
) -> usize {
  let BlurPassTargets {
    color_source,
    depth,
    strength,
    stencil,
    target,
  } = targets;
  let (width, height) = target.size();
  let mut written = 0;

  for y in 0..height {
    for x in 0..width {
      if desc.stencil_op == StencilOp::Equal && stencil.get(x, y) != region_id {
        continue;
      }

      let texcoord = target.texel_center(x, y);
      let color_m = color_source.sample_point(texcoord);
      let strength_m = match strength {
        StrengthSource::ColorAlpha => color_m.w,
        StrengthSource::Texture(tex) => tex.sample_linear(texcoord),
      };
      if desc.discard_zero_strength && strength_m == DISCARD_STRENGTH {
        continue;
      }

      let depth_m = depth.sample_point(texcoord);
      let result = blur_pixel(
        desc,
        kernel,
        color_source,
        depth,
        texcoord,
        color_m,
        depth_m,
        strength_m,
      );
      target.set(x, y, desc.target_format.store(result));
      if desc.stencil_op == StencilOp::Replace {
        stencil.set(x, y, region_id);
      }
      written += 1;
    }
  }

  trace!(
    "SSS blur pass dir={} wrote {}/{} pixels",
    desc.direction,
    written,
    width * height
  );
  written
}

#[allow(clippy::too_many_arguments)]
fn blur_pixel(
  desc: &BlurPassDesc,
  kernel: &SSSKernel,
  color_source: &ColorTexture,
  depth: &DepthTexture,
  texcoord: Vec2,
  color_m: Vec4,
  depth_m: f32,
  strength_m: f32,
) -> Vec4 {
  let step = final_step(
    desc.sss_width,
    desc.distance_to_projection_window,
    depth_m,
    strength_m,
    desc.direction,
  );
  let samples = kernel.samples();

  let mut color_blurred: Vec3 = color_m.xyz() * samples[0].weight;
  for sample in &samples[1..] {
    let offset = texcoord + sample.offset * step;
    let mut color = color_source.sample_linear(offset).xyz();

    if desc.follow_surface {
      let depth = depth.sample_linear(offset);
      let s = (FOLLOW_SURFACE_STRENGTH
        * desc.distance_to_projection_window
        * desc.sss_width
        * (depth_m - depth).abs())
      .clamp(0.0, 1.0);
      color = color.lerp(color_m.xyz(), s);
    }

    color_blurred += sample.weight * color;
  }

  color_blurred.extend(color_m.w)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::sss::kernel::KernelQuality;

  const EPSILON: f32 = 1e-5;

  fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
  }

  fn desc(stencil_op: StencilOp, discard: bool) -> BlurPassDesc {
    BlurPassDesc {
      direction: BLUR_DIRECTION_PASS0,
      stencil_op,
      discard_zero_strength: discard,
      follow_surface: false,
      sss_width: 0.012,
      distance_to_projection_window: distance_to_projection_window(20.0),
      target_format: ColorFormat::Rgba32Float,
    }
  }

  #[test]
  fn projection_window_of_90_dgr_fov_is_one() {
    assert!(approx(distance_to_projection_window(90.0), 1.0));
  }

  #[test]
  fn step_shrinks_with_depth() {
    let near = final_step(0.012, 1.0, 1.0, 1.0, BLUR_DIRECTION_PASS0);
    let far = final_step(0.012, 1.0, 2.0, 1.0, BLUR_DIRECTION_PASS0);
    assert!(approx(near.x, 0.004));
    assert!(approx(far.x, 0.002));
    assert_eq!(near.y, 0.0);
  }

  #[test]
  fn stencil_equal_skips_other_regions() {
    let color = ColorTexture::new(4, 1, Vec4::ONE).unwrap();
    let depth = DepthTexture::new(4, 1, 1.0).unwrap();
    let mut stencil = StencilTexture::from_data(4, 1, vec![1, 0, 1, 2]).unwrap();
    let mut target = ColorTexture::new(4, 1, Vec4::ZERO).unwrap();
    let kernel = SSSKernel::preset(KernelQuality::Low);

    let written = execute_blur_pass(
      &desc(StencilOp::Equal, false),
      &kernel,
      1,
      BlurPassTargets {
        color_source: &color,
        depth: &depth,
        strength: StrengthSource::ColorAlpha,
        stencil: &mut stencil,
        target: &mut target,
      },
    );

    assert_eq!(written, 2);
    assert_eq!(target.get(1, 0), Vec4::ZERO);
    assert_eq!(target.get(3, 0), Vec4::ZERO);
    assert!(approx(target.get(0, 0).w, 1.0));
    assert_eq!(stencil.data(), &[1, 0, 1, 2]);
  }

  #[test]
  fn discarded_pixels_do_not_mark_stencil() {
    let color =
      ColorTexture::from_fn(3, 1, |x, _| Vec4::new(1.0, 1.0, 1.0, x as f32 * 0.5)).unwrap();
    let depth = DepthTexture::new(3, 1, 1.0).unwrap();
    let mut stencil = StencilTexture::new(3, 1, 0).unwrap();
    let mut target = ColorTexture::new(3, 1, Vec4::ZERO).unwrap();
    let kernel = SSSKernel::preset(KernelQuality::Low);

    let written = execute_blur_pass(
      &desc(StencilOp::Replace, true),
      &kernel,
      5,
      BlurPassTargets {
        color_source: &color,
        depth: &depth,
        strength: StrengthSource::ColorAlpha,
        stencil: &mut stencil,
        target: &mut target,
      },
    );

    assert_eq!(written, 2);
    assert_eq!(stencil.data(), &[0, 5, 5]);
    assert_eq!(target.get(0, 0), Vec4::ZERO);
  }

  #[test]
  fn follow_surface_keeps_center_color_across_edges() {
    // left half is far away and red, right half is close and green
    let color = ColorTexture::from_fn(16, 1, |x, _| {
      if x < 8 {
        Vec4::new(1.0, 0.0, 0.0, 1.0)
      } else {
        Vec4::new(0.0, 1.0, 0.0, 1.0)
      }
    })
    .unwrap();
    let depth = DepthTexture::from_fn(16, 1, |x, _| if x < 8 { 10.0 } else { 1.0 }).unwrap();
    let kernel = SSSKernel::synthesize(17, Vec3::ONE, Vec3::ONE).unwrap();

    let run = |follow_surface: bool| {
      let mut stencil = StencilTexture::new(16, 1, 0).unwrap();
      let mut target = ColorTexture::new(16, 1, Vec4::ZERO).unwrap();
      let mut d = desc(StencilOp::Replace, false);
      d.follow_surface = follow_surface;
      d.sss_width = 0.5;
      execute_blur_pass(
        &d,
        &kernel,
        1,
        BlurPassTargets {
          color_source: &color,
          depth: &depth,
          strength: StrengthSource::ColorAlpha,
          stencil: &mut stencil,
          target: &mut target,
        },
      );
      target.get(8, 0)
    };

    let bleeding = run(false);
    let following = run(true);
    assert!(bleeding.x > 0.0);
    assert!(following.x < bleeding.x);
    assert!(approx(following.x, 0.0));
  }
}
