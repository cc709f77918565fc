//! Two-pass blur tests
//!
//! Tests for:
//! - Identity at zero strength (in every color format) and for a single tap kernel
//! - Diffusion of a single bright pixel
//! - Perspective correction of the blur width
//! - Stencil handling (initialized / marked on the fly)
//! - Separate strength source
//! - Precondition errors

use glam::{vec2, vec3, Vec3, Vec4};
use proptest::prelude::*;

use separable_sss::sss::{
  ColorFormat, ColorTexture, DepthTexture, SSSBlurContext, SSSBlurTargets, SSSError,
  StencilTexture, StrengthTexture, BLUR_DIRECTION_PASS0, BLUR_DIRECTION_PASS1,
  STENCIL_CLEAR_VALUE,
};

const EPSILON: f32 = 1e-5;
const REGION_ID: u8 = 1;

fn approx(a: f32, b: f32) -> bool {
  (a - b).abs() < EPSILON
}

/// Deterministic pseudo random texel values in `[0, 1)`.
fn hash(x: u32, y: u32, seed: u32) -> f32 {
  let mut h = x
    .wrapping_mul(374761393)
    .wrapping_add(y.wrapping_mul(668265263))
    .wrapping_add(seed.wrapping_mul(2246822519));
  h = (h ^ (h >> 13)).wrapping_mul(1274126177);
  h ^= h >> 16;
  (h & 0xffff) as f32 / 65536.0
}

fn noise_color(width: u32, height: u32, seed: u32) -> ColorTexture {
  ColorTexture::from_fn(width, height, |x, y| {
    Vec4::new(
      hash(x, y, seed),
      hash(x, y, seed.wrapping_add(1)),
      hash(x, y, seed.wrapping_add(2)),
      hash(x, y, seed.wrapping_add(3)),
    )
  })
  .unwrap()
}

fn context(
  width: u32,
  height: u32,
  sample_count: usize,
  stencil_initialized: bool,
) -> SSSBlurContext {
  SSSBlurContext::configure(
    width,
    height,
    20.0,
    sample_count,
    stencil_initialized,
    true,
    false,
    ColorFormat::Rgba32Float,
  )
  .unwrap()
}

fn apply(
  ctx: &mut SSSBlurContext,
  color: &mut ColorTexture,
  depth: &DepthTexture,
  stencil: &mut StencilTexture,
) {
  ctx
    .apply(
      SSSBlurTargets {
        color,
        depth,
        stencil,
        strength: None,
      },
      REGION_ID,
    )
    .unwrap();
}

// ============================================================================
// Identity
// ============================================================================

#[test]
fn zero_strength_is_identity() {
  let mut ctx = context(16, 12, 17, true);
  ctx.set_strength(Vec3::ZERO).unwrap();
  ctx.set_width(0.025).unwrap();

  let original = noise_color(16, 12, 7);
  let depth = DepthTexture::from_fn(16, 12, |x, y| 0.5 + hash(x, y, 99)).unwrap();
  let mut stencil = StencilTexture::new(16, 12, REGION_ID).unwrap();
  let mut color = original.clone();
  apply(&mut ctx, &mut color, &depth, &mut stencil);

  assert_eq!(color, original);
}

#[test]
fn single_tap_kernel_is_idempotent() {
  let mut ctx = context(16, 12, 1, true);
  let depth = DepthTexture::new(16, 12, 1.0).unwrap();
  let mut stencil = StencilTexture::new(16, 12, REGION_ID).unwrap();

  let original = noise_color(16, 12, 3);
  let mut once = original.clone();
  apply(&mut ctx, &mut once, &depth, &mut stencil);
  let mut twice = once.clone();
  apply(&mut ctx, &mut twice, &depth, &mut stencil);

  assert_eq!(once, original);
  assert_eq!(twice, once);
}

#[test]
fn zero_strength_is_identity_in_every_color_format() {
  for format in [
    ColorFormat::Rgba8Unorm,
    ColorFormat::Rgba8UnormSrgb,
    ColorFormat::Rgba16Float,
    ColorFormat::Rgba32Float,
  ] {
    let mut ctx = SSSBlurContext::configure(9, 7, 20.0, 17, false, true, false, format).unwrap();
    ctx.set_strength(Vec3::ZERO).unwrap();

    // odd columns are not skin, so only some pixels go through both passes
    let noise = noise_color(9, 7, 11);
    let input = ColorTexture::from_fn(9, 7, |x, y| {
      let c = noise.get(x, y);
      if x % 2 == 1 {
        c.truncate().extend(0.0)
      } else {
        c.truncate().extend(0.25 + 0.5 * c.w)
      }
    })
    .unwrap();
    let depth = DepthTexture::new(9, 7, 1.0).unwrap();
    let mut stencil = StencilTexture::new(9, 7, 0).unwrap();

    let mut color = input.clone();
    apply(&mut ctx, &mut color, &depth, &mut stencil);
    for (out, c) in color.data().iter().zip(input.data()) {
      assert_eq!(*out, format.store(*c), "{:?}", format);
    }

    // representable input comes back unchanged
    let quantized = color.clone();
    apply(&mut ctx, &mut color, &depth, &mut stencil);
    assert_eq!(color, quantized, "{:?}", format);
  }
}

// ============================================================================
// Diffusion
// ============================================================================

/// Single row with a white pixel in the middle, full strength everywhere.
fn blur_bright_pixel() -> ColorTexture {
  let width = 41;
  let mut ctx = SSSBlurContext::configure(
    width,
    1,
    90.0,
    17,
    true,
    false,
    false,
    ColorFormat::Rgba32Float,
  )
  .unwrap();
  ctx.set_strength(Vec3::ONE).unwrap();
  ctx.set_falloff(Vec3::ONE).unwrap();
  // kernel reaches ~5 pixels
  ctx.set_width(0.183).unwrap();

  let mut color = ColorTexture::from_fn(width, 1, |x, _| {
    if x == width / 2 {
      Vec4::ONE
    } else {
      Vec4::new(0.0, 0.0, 0.0, 1.0)
    }
  })
  .unwrap();
  let depth = DepthTexture::new(width, 1, 1.0).unwrap();
  let mut stencil = StencilTexture::new(width, 1, REGION_ID).unwrap();
  apply(&mut ctx, &mut color, &depth, &mut stencil);
  color
}

#[test]
fn bright_pixel_spreads_symmetrically() {
  let color = blur_bright_pixel();
  let center = 20;
  for d in 1..=center {
    let left = color.get(center - d, 0);
    let right = color.get(center + d, 0);
    assert!(
      (left - right).abs().max_element() < EPSILON,
      "asymmetric at distance {}: {} vs {}",
      d,
      left,
      right
    );
  }
  // energy is preserved
  let total: f32 = color.data().iter().map(|c| c.x).sum();
  assert!((total - 1.0).abs() < 1e-4, "total energy {}", total);
}

#[test]
fn bright_pixel_falls_off_with_distance() {
  let color = blur_bright_pixel();
  let center = 20;
  assert!(color.get(center, 0).x < 1.0);
  assert!(color.get(center + 1, 0).x > 0.0);
  for d in 1..=center {
    let closer = color.get(center + d - 1, 0).x;
    let further = color.get(center + d, 0).x;
    assert!(
      further <= closer + EPSILON,
      "not decreasing at distance {}: {} > {}",
      d,
      further,
      closer
    );
  }
  // far away pixels are untouched
  assert_eq!(color.get(0, 0).x, 0.0);
  // alpha passes through
  assert!(color.data().iter().all(|c| c.w == 1.0));
}

// ============================================================================
// Perspective correction
// ============================================================================

#[test]
fn step_keeps_world_space_extent_across_resolutions() {
  let low = context(320, 240, 17, true);
  let high = context(640, 480, 17, true);

  let step_low = low.final_step(1.0, 1.0, BLUR_DIRECTION_PASS0);
  let step_high = high.final_step(1.0, 1.0, BLUR_DIRECTION_PASS0);
  // same extent in normalized coordinates, so twice as many pixels
  assert!(approx(step_low.x, step_high.x));
  assert!(approx(step_high.x * 640.0, 2.0 * step_low.x * 320.0));
  assert_eq!(step_low.y, 0.0);
}

#[test]
fn step_shrinks_with_depth_and_strength() {
  let ctx = context(320, 240, 17, true);
  let near = ctx.final_step(1.0, 1.0, BLUR_DIRECTION_PASS1);
  let far = ctx.final_step(2.0, 1.0, BLUR_DIRECTION_PASS1);
  let weak = ctx.final_step(1.0, 0.5, BLUR_DIRECTION_PASS1);
  assert_eq!(near.x, 0.0);
  assert!(approx(far.y, 0.5 * near.y));
  assert!(approx(weak.y, 0.5 * near.y));

  let expected = ctx.width() * ctx.distance_to_projection_window() / 3.0;
  assert!(approx(near.y, expected));
  assert_eq!(ctx.final_step(1.0, 0.0, vec2(1.0, 1.0)), vec2(0.0, 0.0));
}

// ============================================================================
// Stencil
// ============================================================================

#[test]
fn pixels_of_other_regions_are_untouched() {
  let mut ctx = context(16, 16, 11, true);
  ctx.set_strength(Vec3::ONE).unwrap();
  let original = noise_color(16, 16, 11);
  let depth = DepthTexture::new(16, 16, 1.0).unwrap();
  // left half belongs to another region
  let mut stencil =
    StencilTexture::from_fn(16, 16, |x, _| if x < 8 { 2 } else { REGION_ID }).unwrap();
  let stencil_before = stencil.clone();

  let mut color = original.clone();
  apply(&mut ctx, &mut color, &depth, &mut stencil);

  for y in 0..16 {
    for x in 0..8 {
      assert_eq!(color.get(x, y), original.get(x, y));
    }
  }
  assert_ne!(color, original);
  assert_eq!(stencil, stencil_before);
}

#[test]
fn stencil_is_marked_where_strength_is_not_zero() {
  let mut ctx = context(8, 4, 11, false);
  let mut color = ColorTexture::from_fn(8, 4, |x, y| {
    let strength = if x >= 4 { 1.0 } else { 0.0 };
    Vec4::new(hash(x, y, 1), hash(x, y, 2), hash(x, y, 3), strength)
  })
  .unwrap();
  let original = color.clone();
  let depth = DepthTexture::new(8, 4, 1.0).unwrap();
  // garbage from the previous frame
  let mut stencil = StencilTexture::new(8, 4, 7).unwrap();

  apply(&mut ctx, &mut color, &depth, &mut stencil);

  for y in 0..4 {
    for x in 0..8 {
      let expected = if x >= 4 { REGION_ID } else { 0 };
      assert_eq!(stencil.get(x, y), expected, "stencil at ({}, {})", x, y);
      if x < 4 {
        assert_eq!(color.get(x, y), original.get(x, y));
      }
    }
  }
}

// ============================================================================
// Strength source
// ============================================================================

#[test]
fn separate_strength_source_overrides_alpha() {
  let mut ctx =
    SSSBlurContext::configure(8, 8, 20.0, 11, true, true, true, ColorFormat::Rgba32Float)
      .unwrap();
  ctx.set_strength(Vec3::ONE).unwrap();
  // alpha says full strength, but the strength texture disables the blur
  let original = ColorTexture::from_fn(8, 8, |x, y| {
    Vec4::new(hash(x, y, 5), hash(x, y, 6), hash(x, y, 7), 1.0)
  })
  .unwrap();
  let strength = StrengthTexture::new(8, 8, 0.0).unwrap();
  let depth = DepthTexture::new(8, 8, 1.0).unwrap();
  let mut stencil = StencilTexture::new(8, 8, REGION_ID).unwrap();

  let mut color = original.clone();
  ctx
    .apply(
      SSSBlurTargets {
        color: &mut color,
        depth: &depth,
        stencil: &mut stencil,
        strength: Some(&strength),
      },
      REGION_ID,
    )
    .unwrap();

  for (a, b) in color.data().iter().zip(original.data()) {
    assert!((*a - *b).abs().max_element() < EPSILON);
  }
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn mismatched_buffers_are_rejected() {
  let mut ctx = context(8, 8, 11, true);
  let mut color = noise_color(8, 8, 0);
  let original = color.clone();
  let depth = DepthTexture::new(8, 4, 1.0).unwrap();
  let mut stencil = StencilTexture::new(8, 8, REGION_ID).unwrap();

  let result = ctx.apply(
    SSSBlurTargets {
      color: &mut color,
      depth: &depth,
      stencil: &mut stencil,
      strength: None,
    },
    REGION_ID,
  );

  assert!(matches!(
    result,
    Err(SSSError::TargetSizeMismatch {
      name: "depth",
      actual_height: 4,
      ..
    })
  ));
  assert_eq!(color, original);
}

#[test]
fn missing_strength_source_is_rejected() {
  let mut ctx =
    SSSBlurContext::configure(8, 8, 20.0, 11, true, true, true, ColorFormat::Rgba16Float)
      .unwrap();
  let mut color = noise_color(8, 8, 0);
  let depth = DepthTexture::new(8, 8, 1.0).unwrap();
  let mut stencil = StencilTexture::new(8, 8, REGION_ID).unwrap();

  let result = ctx.apply(
    SSSBlurTargets {
      color: &mut color,
      depth: &depth,
      stencil: &mut stencil,
      strength: None,
    },
    REGION_ID,
  );
  assert!(matches!(result, Err(SSSError::MissingStrengthSource)));
}

#[test]
fn stencil_clear_value_is_not_a_region_id() {
  let mut ctx = context(4, 1, 17, false);
  ctx.set_strength(Vec3::ZERO).unwrap();
  let mut color =
    ColorTexture::from_fn(4, 1, |x, _| Vec4::new(0.7, 0.3, 0.2, x as f32 / 3.0)).unwrap();
  let original = color.clone();
  let depth = DepthTexture::new(4, 1, 1.0).unwrap();
  let mut stencil = StencilTexture::new(4, 1, 0).unwrap();

  let result = ctx.apply(
    SSSBlurTargets {
      color: &mut color,
      depth: &depth,
      stencil: &mut stencil,
      strength: None,
    },
    STENCIL_CLEAR_VALUE,
  );
  assert!(matches!(result, Err(SSSError::ReservedRegionId(0))));
  assert_eq!(color, original);

  // fine when the caller marked the stencil
  let mut ctx = context(4, 1, 17, true);
  ctx.set_strength(Vec3::ZERO).unwrap();
  ctx
    .apply(
      SSSBlurTargets {
        color: &mut color,
        depth: &depth,
        stencil: &mut stencil,
        strength: None,
      },
      STENCIL_CLEAR_VALUE,
    )
    .unwrap();
  assert_eq!(color, original);
}

#[test]
fn out_of_range_strength_is_clamped() {
  let mut ctx = context(8, 8, 11, true);
  ctx.set_strength(vec3(2.0, -1.0, f32::NAN)).unwrap();
  assert_eq!(ctx.strength(), vec3(1.0, 0.0, 0.0));
  assert!(ctx.kernel().samples().iter().all(|s| s.weight.is_finite()));
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
  #![proptest_config(ProptestConfig::with_cases(32))]

  #[test]
  fn zero_strength_is_identity_for_any_input(
    width in 1u32..12,
    height in 1u32..12,
    seed in any::<u32>(),
    sss_width in 0.001f32..0.025,
  ) {
    let mut ctx = context(width, height, 17, false);
    ctx.set_strength(Vec3::ZERO).unwrap();
    ctx.set_width(sss_width).unwrap();

    let original = noise_color(width, height, seed);
    let depth =
      DepthTexture::from_fn(width, height, |x, y| 0.1 + 10.0 * hash(x, y, seed ^ 0xabcd)).unwrap();
    let mut stencil = StencilTexture::new(width, height, 0).unwrap();
    let mut color = original.clone();
    apply(&mut ctx, &mut color, &depth, &mut stencil);

    prop_assert_eq!(color, original);
  }
}
