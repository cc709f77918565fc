//! Kernel synthesis tests
//!
//! Tests for:
//! - Baked preset kernels vs synthesized ones
//! - Normalization and center tap placement
//! - Strength modulation per channel
//! - Kernel source export

use glam::{vec3, Vec3};
use proptest::prelude::*;

use separable_sss::config::SSSBlurPassCfg;
use separable_sss::sss::{ColorFormat, KernelQuality, SSSBlurContext, SSSKernel};

const EPSILON: f32 = 1e-4;
/// Precision of the literal preset tables
const PRESET_EPSILON: f32 = 1e-3;

fn approx_vec3(a: Vec3, b: Vec3, epsilon: f32) -> bool {
  (a - b).abs().max_element() < epsilon
}

fn default_kernel(sample_count: usize) -> SSSKernel {
  SSSKernel::synthesize(
    sample_count,
    SSSBlurPassCfg::DEFAULT_STRENGTH,
    SSSBlurPassCfg::DEFAULT_FALLOFF,
  )
  .unwrap()
}

// ============================================================================
// Presets
// ============================================================================

#[test]
fn synthesized_kernels_match_presets() {
  for quality in [KernelQuality::Low, KernelQuality::Medium, KernelQuality::High] {
    let preset = SSSKernel::preset(quality);
    let kernel = default_kernel(quality.sample_count());
    assert_eq!(kernel.len(), preset.len(), "{:?}", quality);

    for (i, (a, b)) in kernel.samples().iter().zip(preset.samples()).enumerate() {
      assert!(
        approx_vec3(a.weight, b.weight, PRESET_EPSILON),
        "{:?} sample {}: weight {} != {}",
        quality,
        i,
        a.weight,
        b.weight
      );
      assert!(
        (a.offset - b.offset).abs() < PRESET_EPSILON,
        "{:?} sample {}: offset {} != {}",
        quality,
        i,
        a.offset,
        b.offset
      );
    }
  }
}

#[test]
fn medium_preset_golden_values() {
  let kernel = default_kernel(17);
  let center = kernel.center();
  assert!(approx_vec3(
    center.weight,
    vec3(0.536343, 0.624624, 0.748867),
    PRESET_EPSILON
  ));
  assert_eq!(center.offset, 0.0);

  let last = kernel.samples()[16];
  assert!(approx_vec3(
    last.weight,
    vec3(0.00317394, 0.000134823, 3.77269e-5),
    PRESET_EPSILON
  ));
  assert!((last.offset - 2.0).abs() < EPSILON);
}

// ============================================================================
// Normalization
// ============================================================================

#[test]
fn kernel_is_symmetric_around_center() {
  let kernel = default_kernel(25);
  let rest = &kernel.samples()[1..];
  let half = rest.len() / 2;
  for i in 0..half {
    let left = rest[i];
    let right = rest[rest.len() - 1 - i];
    assert!((left.offset + right.offset).abs() < EPSILON);
    assert!(approx_vec3(left.weight, right.weight, 1e-6));
  }
}

#[test]
fn off_center_weights_fall_off_with_distance() {
  // fully diffused, so the weights are only the discretized profile
  let kernel = SSSKernel::synthesize(17, Vec3::ONE, Vec3::ONE).unwrap();
  let samples = kernel.samples();
  // right half, sorted by offset. Tail samples cover growing areas,
  // so compare weight per unit of offset
  let right = &samples[9..];
  let density = |i: usize| {
    let prev = if i == 0 { 0.0 } else { right[i - 1].offset };
    right[i].weight.x / (right[i].offset - prev)
  };
  for i in 1..right.len() {
    assert!(
      density(i) < density(i - 1),
      "density at {} is not decreasing",
      right[i].offset
    );
  }
}

#[test]
fn strength_increase_moves_weight_off_center() {
  let falloff = SSSBlurPassCfg::DEFAULT_FALLOFF;
  let weak = SSSKernel::synthesize(17, vec3(0.2, 0.41, 0.28), falloff).unwrap();
  let strong = SSSKernel::synthesize(17, vec3(0.6, 0.41, 0.28), falloff).unwrap();

  assert!(strong.center().weight.x < weak.center().weight.x);
  for (w, s) in weak.samples()[1..].iter().zip(strong.samples()[1..].iter()) {
    assert!(s.weight.x > w.weight.x);
    // other channels are untouched
    assert_eq!(s.weight.y, w.weight.y);
    assert_eq!(s.weight.z, w.weight.z);
  }

  // at full strength the center is the raw profile value
  let full = SSSKernel::synthesize(17, vec3(1.0, 0.41, 0.28), falloff).unwrap();
  assert!(full.center().weight.x < strong.center().weight.x);
  let zero = SSSKernel::synthesize(17, vec3(0.0, 0.41, 0.28), falloff).unwrap();
  assert_eq!(zero.center().weight.x, 1.0);
}

#[test]
fn single_sample_kernel_is_identity() {
  let kernel = SSSKernel::synthesize(1, vec3(0.3, 0.6, 0.9), vec3(0.5, 0.5, 0.5)).unwrap();
  assert_eq!(kernel.len(), 1);
  assert_eq!(kernel.center().weight, Vec3::ONE);
  assert_eq!(kernel.center().offset, 0.0);
}

// ============================================================================
// Kernel source export
// ============================================================================

#[test]
fn exported_source_follows_kernel_updates() {
  let mut ctx =
    SSSBlurContext::configure(32, 32, 20.0, 11, true, true, false, ColorFormat::Rgba8Unorm)
      .unwrap();
  let before = ctx.export_kernel_source();
  assert_eq!(before.lines().count(), 11 + 2);
  assert!(before.starts_with("const vec4 kernel[11] = vec4[11](\n"));

  ctx.set_strength(Vec3::ZERO).unwrap();
  let after = ctx.export_kernel_source();
  assert_ne!(before, after);
  assert_eq!(after.lines().nth(1), Some("  vec4(1.0, 1.0, 1.0, 0.0),"));

  ctx.set_width(0.02).unwrap();
  assert_eq!(ctx.export_kernel_source(), after);
}

// ============================================================================
// Properties
// ============================================================================

fn odd_sample_count() -> impl Strategy<Value = usize> {
  (0usize..32).prop_map(|k| 2 * k + 1)
}

fn rgb(min: f32, max: f32) -> impl Strategy<Value = Vec3> {
  (min..=max, min..=max, min..=max).prop_map(|(r, g, b)| vec3(r, g, b))
}

proptest! {
  #[test]
  fn weights_sum_to_one(
    sample_count in odd_sample_count(),
    strength in rgb(0.0, 1.0),
    falloff in rgb(0.05, 1.0),
  ) {
    let kernel = SSSKernel::synthesize(sample_count, strength, falloff).unwrap();
    prop_assert_eq!(kernel.len(), sample_count);
    prop_assert!(approx_vec3(kernel.weight_sum(), Vec3::ONE, EPSILON));
    prop_assert_eq!(kernel.center().offset, 0.0);
  }

  #[test]
  fn even_sample_count_is_rejected(k in 0usize..32) {
    let result = SSSKernel::synthesize(2 * k, Vec3::ONE, Vec3::ONE);
    prop_assert!(result.is_err());
  }
}
