use glam::{vec3, Vec3, Vec4};
use log::debug;

use super::error::{SSSError, SSSResult};
use super::profile::DiffusionProfile;

/// Offsets are distributed with `|o / RANGE|^EXPONENT`, so density increases near the center.
const OFFSET_EXPONENT: f32 = 2.0;
/// Kernels with more samples than this reach further, see [`SSSKernel::range_for`].
const WIDE_RANGE_SAMPLE_COUNT: usize = 20;

/// Single tap of the blur. Layout matches `vec4(weight.rgb, offset)` in the shader.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(C)]
pub struct SSSKernelSample {
  pub weight: Vec3,
  pub offset: f32,
}

unsafe impl bytemuck::Zeroable for SSSKernelSample {}
unsafe impl bytemuck::Pod for SSSKernelSample {}

impl SSSKernelSample {
  pub fn new(weight: Vec3, offset: f32) -> Self {
    Self { weight, offset }
  }

  pub fn to_vec4(&self) -> Vec4 {
    self.weight.extend(self.offset)
  }
}

/// Baked kernels for the default strength and falloff.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum KernelQuality {
  /// Enough for 720p.
  Low,
  Medium,
  /// For 1080p and above.
  High,
}

impl KernelQuality {
  pub fn sample_count(&self) -> usize {
    match self {
      KernelQuality::Low => 11,
      KernelQuality::Medium => 17,
      KernelQuality::High => 25,
    }
  }
}

/// Discretized, normalized and strength-modulated diffusion profile.
/// Sample at index 0 is always the center tap.
#[derive(Clone, Debug, PartialEq)]
pub struct SSSKernel {
  samples: Vec<SSSKernelSample>,
}

impl SSSKernel {
  /// Build the kernel from the diffusion profile.
  ///
  /// * `sample_count` - odd. `1` produces a single center tap (identity filter)
  /// * `strength` - per channel mix between the unfiltered and the fully diffused image
  /// * `falloff` - per channel spread of the profile, see [`DiffusionProfile`]
  pub fn synthesize(sample_count: usize, strength: Vec3, falloff: Vec3) -> SSSResult<Self> {
    if sample_count == 0 || sample_count % 2 == 0 {
      return Err(SSSError::InvalidSampleCount(sample_count));
    }
    debug!(
      "Synthesizing SSS kernel (samples={}, strength={}, falloff={})",
      sample_count, strength, falloff
    );

    if sample_count == 1 {
      return Ok(Self {
        samples: vec![SSSKernelSample::new(Vec3::ONE, 0.0)],
      });
    }

    let profile = DiffusionProfile::new(falloff);
    let range = Self::range_for(sample_count);
    let offsets = Self::calculate_offsets(sample_count, range);

    // trapezoidal weights
    let last = sample_count - 1;
    let mut samples: Vec<SSSKernelSample> = offsets
      .iter()
      .enumerate()
      .map(|(i, &offset)| {
        let w0 = if i > 0 { (offset - offsets[i - 1]).abs() } else { 0.0 };
        let w1 = if i < last { (offset - offsets[i + 1]).abs() } else { 0.0 };
        let area = (w0 + w1) / 2.0;
        SSSKernelSample::new(area * profile.evaluate(offset), offset)
      })
      .collect();

    // offset 0.0 comes first
    samples[..=sample_count / 2].rotate_right(1);

    let sum = samples
      .iter()
      .fold(Vec3::ZERO, |acc, sample| acc + sample.weight);
    samples.iter_mut().for_each(|sample| sample.weight /= sum);

    // center: lerp(1.0, weight, strength), others: lerp(0.0, weight, strength)
    let (center, others) = samples.split_at_mut(1);
    center[0].weight = (Vec3::ONE - strength) + strength * center[0].weight;
    others.iter_mut().for_each(|sample| sample.weight *= strength);

    Ok(Self { samples })
  }

  /// Kernel baked for default strength `(0.48, 0.41, 0.28)` and falloff `(1.0, 0.37, 0.3)`.
  pub fn preset(quality: KernelQuality) -> Self {
    let table: &[[f32; 4]] = match quality {
      KernelQuality::Low => &PRESET_KERNEL_LOW,
      KernelQuality::Medium => &PRESET_KERNEL_MEDIUM,
      KernelQuality::High => &PRESET_KERNEL_HIGH,
    };
    let samples = table
      .iter()
      .map(|s| SSSKernelSample::new(vec3(s[0], s[1], s[2]), s[3]))
      .collect();
    Self { samples }
  }

  /// Kernels are defined in `[-range, range]`.
  pub fn range_for(sample_count: usize) -> f32 {
    if sample_count > WIDE_RANGE_SAMPLE_COUNT {
      3.0
    } else {
      2.0
    }
  }

  fn calculate_offsets(sample_count: usize, range: f32) -> Vec<f32> {
    let last = (sample_count - 1) as f32;
    (0..sample_count)
      .map(|i| {
        // exactly 0.0 for the middle sample
        let o = range * (2.0 * i as f32 / last - 1.0);
        let sign = if o < 0.0 { -1.0 } else { 1.0 };
        range * sign * (o / range).abs().powf(OFFSET_EXPONENT)
      })
      .collect()
  }

  pub fn samples(&self) -> &[SSSKernelSample] {
    &self.samples
  }

  pub fn len(&self) -> usize {
    self.samples.len()
  }

  pub fn is_empty(&self) -> bool {
    self.samples.is_empty()
  }

  pub fn center(&self) -> &SSSKernelSample {
    &self.samples[0]
  }

  /// Per channel sum of all weights.
  pub fn weight_sum(&self) -> Vec3 {
    self
      .samples
      .iter()
      .fold(Vec3::ZERO, |acc, sample| acc + sample.weight)
  }

  pub fn as_vec4s(&self) -> Vec<Vec4> {
    self.samples.iter().map(|s| s.to_vec4()).collect()
  }

  /// Raw bytes, ready to be copied into an uniform buffer.
  pub fn as_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.samples)
  }

  /// GLSL declaration of the kernel, one sample per line, center tap first.
  pub fn to_source_code(&self) -> String {
    let n = self.samples.len();
    let mut s = format!("const vec4 kernel[{}] = vec4[{}](\n", n, n);
    for (i, sample) in self.samples.iter().enumerate() {
      let separator = if i + 1 < n { "," } else { "" };
      s.push_str(&format!(
        "  vec4({}, {}, {}, {}){}\n",
        format_float(sample.weight.x),
        format_float(sample.weight.y),
        format_float(sample.weight.z),
        format_float(sample.offset),
        separator
      ));
    }
    s.push_str(");\n");
    s
  }
}

/// 6 significant digits, trailing zeros removed. Always a valid GLSL float literal.
fn format_float(v: f32) -> String {
  const SIGNIFICANT_DIGITS: i32 = 6;
  if v == 0.0 {
    return "0.0".to_string();
  }
  let exp = v.abs().log10().floor() as i32;
  if exp < -4 || exp >= SIGNIFICANT_DIGITS {
    let text = format!("{:.*e}", (SIGNIFICANT_DIGITS - 1) as usize, v);
    return match text.split_once('e') {
      Some((mantissa, exponent)) => {
        format!("{}e{}", trim_fraction(mantissa), exponent)
      }
      None => text,
    };
  }
  let decimals = (SIGNIFICANT_DIGITS - 1 - exp).max(1) as usize;
  trim_fraction(&format!("{:.*}", decimals, v))
}

fn trim_fraction(text: &str) -> String {
  if !text.contains('.') {
    return text.to_string();
  }
  let trimmed = text.trim_end_matches('0');
  if trimmed.ends_with('.') {
    format!("{}0", trimmed)
  } else {
    trimmed.to_string()
  }
}

#[rustfmt::skip]
const PRESET_KERNEL_LOW: [[f32; 4]; 11] = [
  [0.560479, 0.669086, 0.784728, 0.0],
  [0.00471691, 0.000184771, 5.07566e-5, -2.0],
  [0.0192831, 0.00282018, 0.00084214, -1.28],
  [0.03639, 0.0130999, 0.00643685, -0.72],
  [0.0821904, 0.0358608, 0.0209261, -0.32],
  [0.0771802, 0.113491, 0.0793803, -0.08],
  [0.0771802, 0.113491, 0.0793803, 0.08],
  [0.0821904, 0.0358608, 0.0209261, 0.32],
  [0.03639, 0.0130999, 0.00643685, 0.72],
  [0.0192831, 0.00282018, 0.00084214, 1.28],
  [0.00471691, 0.000184771, 5.07565e-5, 2.0],
];

#[rustfmt::skip]
const PRESET_KERNEL_MEDIUM: [[f32; 4]; 17] = [
  [0.536343, 0.624624, 0.748867, 0.0],
  [0.00317394, 0.000134823, 3.77269e-5, -2.0],
  [0.0100386, 0.000914679, 0.000275702, -1.53125],
  [0.0144609, 0.00317269, 0.00106399, -1.125],
  [0.0216301, 0.00794618, 0.00376991, -0.78125],
  [0.0347317, 0.0151085, 0.00871983, -0.5],
  [0.0571056, 0.0287432, 0.0172844, -0.28125],
  [0.0582416, 0.0659959, 0.0411329, -0.125],
  [0.0324462, 0.0656718, 0.0532821, -0.03125],
  [0.0324462, 0.0656718, 0.0532821, 0.03125],
  [0.0582416, 0.0659959, 0.0411329, 0.125],
  [0.0571056, 0.0287432, 0.0172844, 0.28125],
  [0.0347317, 0.0151085, 0.00871983, 0.5],
  [0.0216301, 0.00794618, 0.00376991, 0.78125],
  [0.0144609, 0.00317269, 0.00106399, 1.125],
  [0.0100386, 0.000914679, 0.000275702, 1.53125],
  [0.00317394, 0.000134823, 3.77269e-5, 2.0],
];

#[rustfmt::skip]
const PRESET_KERNEL_HIGH: [[f32; 4]; 25] = [
  [0.530605, 0.613514, 0.739601, 0.0],
  [0.000973794, 1.11862e-5, 9.43437e-7, -3.0],
  [0.00333804, 7.85443e-5, 1.2945e-5, -2.52083],
  [0.00500364, 0.00020094, 5.28848e-5, -2.08333],
  [0.00700976, 0.00049366, 0.000151938, -1.6875],
  [0.0094389, 0.00139119, 0.000416598, -1.33333],
  [0.0128496, 0.00356329, 0.00132016, -1.02083],
  [0.017924, 0.00711691, 0.00347194, -0.75],
  [0.0263642, 0.0119715, 0.00684598, -0.520833],
  [0.0410172, 0.0199899, 0.0118481, -0.333333],
  [0.0493588, 0.0367726, 0.0219485, -0.1875],
  [0.0402784, 0.0657244, 0.04631, -0.0833333],
  [0.0211412, 0.0459286, 0.0378196, -0.0208333],
  [0.0211412, 0.0459286, 0.0378196, 0.0208333],
  [0.0402784, 0.0657244, 0.04631, 0.0833333],
  [0.0493588, 0.0367726, 0.0219485, 0.1875],
  [0.0410172, 0.0199899, 0.0118481, 0.333333],
  [0.0263642, 0.0119715, 0.00684598, 0.520833],
  [0.017924, 0.00711691, 0.00347194, 0.75],
  [0.0128496, 0.00356329, 0.00132016, 1.02083],
  [0.0094389, 0.00139119, 0.000416598, 1.33333],
  [0.00700976, 0.00049366, 0.000151938, 1.6875],
  [0.00500364, 0.00020094, 5.28848e-5, 2.08333],
  [0.00333804, 7.85443e-5, 1.2945e-5, 2.52083],
  [0.000973794, 1.11862e-5, 9.43437e-7, 3.0],
];

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rejects_even_or_zero_sample_count() {
    let s = vec3(0.48, 0.41, 0.28);
    let f = vec3(1.0, 0.37, 0.3);
    assert!(matches!(
      SSSKernel::synthesize(0, s, f),
      Err(SSSError::InvalidSampleCount(0))
    ));
    assert!(matches!(
      SSSKernel::synthesize(16, s, f),
      Err(SSSError::InvalidSampleCount(16))
    ));
  }

  #[test]
  fn single_sample_is_identity() {
    let kernel = SSSKernel::synthesize(1, Vec3::ONE, Vec3::ONE).unwrap();
    assert_eq!(kernel.samples(), &[SSSKernelSample::new(Vec3::ONE, 0.0)]);
  }

  #[test]
  fn offsets_use_power_curve() {
    let offsets = SSSKernel::calculate_offsets(5, 2.0);
    assert_eq!(offsets, vec![-2.0, -0.5, 0.0, 0.5, 2.0]);
  }

  #[test]
  fn range_grows_for_big_kernels() {
    assert_eq!(SSSKernel::range_for(17), 2.0);
    assert_eq!(SSSKernel::range_for(19), 2.0);
    assert_eq!(SSSKernel::range_for(21), 3.0);
  }

  #[test]
  fn center_tap_is_first() {
    let kernel = SSSKernel::synthesize(9, vec3(0.48, 0.41, 0.28), vec3(1.0, 0.37, 0.3)).unwrap();
    assert_eq!(kernel.center().offset, 0.0);
    let rest: Vec<f32> = kernel.samples()[1..].iter().map(|s| s.offset).collect();
    let mut sorted = rest.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(rest, sorted);
  }

  #[test]
  fn bytes_have_vec4_layout() {
    let kernel = SSSKernel::preset(KernelQuality::Low);
    assert_eq!(std::mem::size_of::<SSSKernelSample>(), 16);
    assert_eq!(kernel.as_bytes().len(), 11 * 16);
    let floats: &[f32] = bytemuck::cast_slice(kernel.as_bytes());
    assert_eq!(floats[4..8], [0.00471691, 0.000184771, 5.07566e-5, -2.0]);
  }

  #[test]
  fn format_float_is_glsl_literal() {
    assert_eq!(format_float(0.0), "0.0");
    assert_eq!(format_float(-2.0), "-2.0");
    assert_eq!(format_float(0.536343), "0.536343");
    assert_eq!(format_float(-0.03125), "-0.03125");
    assert_eq!(format_float(1.11862e-5), "1.11862e-5");
    assert_eq!(format_float(9.43437e-7), "9.43437e-7");
  }

  #[test]
  fn source_code_has_line_per_sample() {
    let kernel = SSSKernel::preset(KernelQuality::Medium);
    let code = kernel.to_source_code();
    let lines: Vec<&str> = code.lines().collect();
    assert_eq!(lines.len(), 17 + 2);
    assert_eq!(lines[0], "const vec4 kernel[17] = vec4[17](");
    assert_eq!(lines[1], "  vec4(0.536343, 0.624624, 0.748867, 0.0),");
    assert_eq!(lines[17], "  vec4(0.00317394, 0.000134823, 3.77269e-5, 2.0)");
    assert_eq!(lines[18], ");");
  }
}
