use glam::{Vec2, Vec3, Vec4};
use log::{debug, info, trace, warn};

use super::blur::{
  distance_to_projection_window, execute_blur_pass, final_step, BlurPassDesc, BlurPassTargets,
  StencilOp, StrengthSource, BLUR_DIRECTION_PASS0, BLUR_DIRECTION_PASS1, STENCIL_CLEAR_VALUE,
};
use super::error::{SSSError, SSSResult};
use super::kernel::SSSKernel;
use super::texture::{
  ColorFormat, ColorTexture, DepthTexture, StencilTexture, StrengthTexture, Texel, Texture2D,
};
use crate::config::{Config, SSSBlurPassCfg};

/// Buffers for a single [`SSSBlurContext::apply`].
pub struct SSSBlurTargets<'a> {
  /// Blurred in place. Alpha holds the SSS strength, unless
  /// the context uses a separate strength source.
  pub color: &'a mut ColorTexture,
  /// Linear depth
  pub depth: &'a DepthTexture,
  pub stencil: &'a mut StencilTexture,
  /// Required if the context was configured with `separate_strength_source`.
  pub strength: Option<&'a StrengthTexture>,
}

/// Separable subsurface scattering for a single render resolution.
///
/// Owns the kernel and the intermediate texture. Changing strength or falloff
/// recalculates the kernel, width is used as-is during [`SSSBlurContext::apply`].
pub struct SSSBlurContext {
  width: u32,
  height: u32,
  fov_dgr: f32,
  distance_to_projection_window: f32,
  stencil_initialized: bool,
  follow_surface: bool,
  separate_strength_source: bool,
  color_format: ColorFormat,
  // live parameters
  sss_width: f32,
  strength: Vec3,
  falloff: Vec3,
  sample_count: usize,
  kernel: SSSKernel,
  /// Result of the horizontal pass.
  scratch: ColorTexture,
}

impl SSSBlurContext {
  /// * `fov_dgr` - vertical field of view of the scene camera
  /// * `stencil_initialized` - stencil already has the skin marked with the region id.
  ///     Otherwise the first pass marks every pixel with non-zero strength
  /// * `follow_surface` - do not diffuse across depth discontinuities
  /// * `separate_strength_source` - strength comes from a separate texture, not color's alpha
  #[allow(clippy::too_many_arguments)]
  pub fn configure(
    width: u32,
    height: u32,
    fov_dgr: f32,
    sample_count: usize,
    stencil_initialized: bool,
    follow_surface: bool,
    separate_strength_source: bool,
    color_format: ColorFormat,
  ) -> SSSResult<Self> {
    info!(
      "Creating SSSBlurContext ({}x{}, fov={}dgr, samples={}, stencil_initialized={}, follow_surface={}, separate_strength_source={}, format={:?})",
      width,
      height,
      fov_dgr,
      sample_count,
      stencil_initialized,
      follow_surface,
      separate_strength_source,
      color_format
    );
    if !(fov_dgr.is_finite() && fov_dgr > 0.0 && fov_dgr < 180.0) {
      return Err(SSSError::InvalidFieldOfView(fov_dgr));
    }
    let scratch = ColorTexture::new(width, height, Vec4::ZERO)?;

    let strength = SSSBlurPassCfg::DEFAULT_STRENGTH;
    let falloff = SSSBlurPassCfg::DEFAULT_FALLOFF;
    let kernel = SSSKernel::synthesize(sample_count, strength, falloff)?;

    Ok(Self {
      width,
      height,
      fov_dgr,
      distance_to_projection_window: distance_to_projection_window(fov_dgr),
      stencil_initialized,
      follow_surface,
      separate_strength_source,
      color_format,
      sss_width: SSSBlurPassCfg::default().blur_width,
      strength,
      falloff,
      sample_count,
      kernel,
      scratch,
    })
  }

  /// Configure using window size, camera and `sss_blur` settings.
  pub fn from_config(cfg: &Config) -> SSSResult<Self> {
    let blur_cfg = &cfg.sss_blur;
    let mut ctx = Self::configure(
      cfg.window_width,
      cfg.window_height,
      cfg.camera.fov_dgr,
      blur_cfg.sample_count,
      blur_cfg.stencil_initialized,
      blur_cfg.blur_follow_surface,
      blur_cfg.separate_strength_source,
      blur_cfg.color_format,
    )?;
    ctx.set_width(blur_cfg.blur_width)?;
    ctx.set_falloff(blur_cfg.blur_falloff)?;
    ctx.set_strength(blur_cfg.blur_strength)?;
    Ok(ctx)
  }

  /// Clamped to `[0, 1]`. Recalculates the kernel.
  pub fn set_strength(&mut self, strength: Vec3) -> SSSResult<()> {
    let clamped = strength.clamp(Vec3::ZERO, Vec3::ONE);
    if clamped != strength {
      warn!(
        "SSS strength {} is outside of [0, 1], clamped to {}",
        strength, clamped
      );
    }
    self.strength = clamped;
    self.update_kernel()
  }

  /// Each component in `(0, 1]`. Recalculates the kernel.
  pub fn set_falloff(&mut self, falloff: Vec3) -> SSSResult<()> {
    let is_valid = |v: f32| v.is_finite() && v > 0.0 && v <= 1.0;
    if !(is_valid(falloff.x) && is_valid(falloff.y) && is_valid(falloff.z)) {
      return Err(SSSError::InvalidFalloff(falloff));
    }
    self.falloff = falloff;
    self.update_kernel()
  }

  /// In world space units. Used directly by the blur, the kernel stays the same.
  pub fn set_width(&mut self, sss_width: f32) -> SSSResult<()> {
    if !(sss_width.is_finite() && sss_width > 0.0) {
      return Err(SSSError::InvalidWidth(sss_width));
    }
    debug!("SSS width set to {}", sss_width);
    self.sss_width = sss_width;
    Ok(())
  }

  /// Odd number of kernel taps. Recalculates the kernel.
  pub fn set_sample_count(&mut self, sample_count: usize) -> SSSResult<()> {
    let kernel = SSSKernel::synthesize(sample_count, self.strength, self.falloff)?;
    self.sample_count = sample_count;
    self.kernel = kernel;
    Ok(())
  }

  fn update_kernel(&mut self) -> SSSResult<()> {
    self.kernel = SSSKernel::synthesize(self.sample_count, self.strength, self.falloff)?;
    Ok(())
  }

  /// Blur `targets.color` in place: horizontal pass into the intermediate texture,
  /// then vertical pass back into `targets.color`. Only pixels marked in the stencil
  /// with `region_id` are written by the second pass.
  ///
  /// All buffers have to match the resolution of the context. The color buffer
  /// is first stored at the precision of the context's color format, as if uploaded
  /// to a texture of that format, so untouched pixels share the precision of
  /// blurred ones.
  pub fn apply(&mut self, targets: SSSBlurTargets, region_id: u8) -> SSSResult<()> {
    let strength_source = self.check_targets(&targets, region_id)?;
    let SSSBlurTargets {
      color,
      depth,
      stencil,
      ..
    } = targets;

    trace!("SSSBlurContext::apply(region_id={})", region_id);
    self.color_format.store_all(color.data_mut());
    self.scratch.fill(Vec4::ZERO);
    if !self.stencil_initialized {
      stencil.fill(STENCIL_CLEAR_VALUE);
    }

    let pass0 = self.pass_desc(BLUR_DIRECTION_PASS0, !self.stencil_initialized);
    execute_blur_pass(
      &pass0,
      &self.kernel,
      region_id,
      BlurPassTargets {
        color_source: &*color,
        depth,
        strength: strength_source,
        stencil: &mut *stencil,
        target: &mut self.scratch,
      },
    );

    let pass1 = self.pass_desc(BLUR_DIRECTION_PASS1, false);
    execute_blur_pass(
      &pass1,
      &self.kernel,
      region_id,
      BlurPassTargets {
        color_source: &self.scratch,
        depth,
        strength: strength_source,
        stencil,
        target: color,
      },
    );

    Ok(())
  }

  /// `init_stencil` - discard zero strength pixels, and mark the rest in stencil.
  fn pass_desc(&self, direction: Vec2, init_stencil: bool) -> BlurPassDesc {
    BlurPassDesc {
      direction,
      stencil_op: if init_stencil {
        StencilOp::Replace
      } else {
        StencilOp::Equal
      },
      discard_zero_strength: init_stencil,
      follow_surface: self.follow_surface,
      sss_width: self.sss_width,
      distance_to_projection_window: self.distance_to_projection_window,
      target_format: self.color_format,
    }
  }

  /// Fails if any buffer does not match the context resolution, the strength
  /// texture is missing, or `region_id` collides with the stencil clear value.
  pub fn check_targets<'a>(
    &self,
    targets: &SSSBlurTargets<'a>,
    region_id: u8,
  ) -> SSSResult<StrengthSource<'a>> {
    if !self.stencil_initialized && region_id == STENCIL_CLEAR_VALUE {
      return Err(SSSError::ReservedRegionId(region_id));
    }
    self.check_target_size("color", &*targets.color)?;
    self.check_target_size("depth", targets.depth)?;
    self.check_target_size("stencil", &*targets.stencil)?;

    if !self.separate_strength_source {
      return Ok(StrengthSource::ColorAlpha);
    }
    let tex = targets.strength.ok_or(SSSError::MissingStrengthSource)?;
    self.check_target_size("strength", tex)?;
    Ok(StrengthSource::Texture(tex))
  }

  fn check_target_size<T: Texel>(
    &self,
    name: &'static str,
    tex: &Texture2D<T>,
  ) -> SSSResult<()> {
    if tex.size() == self.resolution() {
      return Ok(());
    }
    Err(SSSError::TargetSizeMismatch {
      name,
      expected_width: self.width,
      expected_height: self.height,
      actual_width: tex.width(),
      actual_height: tex.height(),
    })
  }

  /// Current kernel as GLSL source, center tap first.
  pub fn export_kernel_source(&self) -> String {
    self.kernel.to_source_code()
  }

  /// Step between kernel taps for a pixel, in normalized texture coordinates.
  pub fn final_step(&self, linear_depth: f32, strength: f32, direction: Vec2) -> Vec2 {
    final_step(
      self.sss_width,
      self.distance_to_projection_window,
      linear_depth,
      strength,
      direction,
    )
  }

  pub fn width(&self) -> f32 {
    self.sss_width
  }

  pub fn strength(&self) -> Vec3 {
    self.strength
  }

  pub fn falloff(&self) -> Vec3 {
    self.falloff
  }

  pub fn sample_count(&self) -> usize {
    self.sample_count
  }

  pub fn kernel(&self) -> &SSSKernel {
    &self.kernel
  }

  pub fn resolution(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  pub fn fov_dgr(&self) -> f32 {
    self.fov_dgr
  }

  pub fn distance_to_projection_window(&self) -> f32 {
    self.distance_to_projection_window
  }

  pub fn color_format(&self) -> ColorFormat {
    self.color_format
  }

  pub fn is_stencil_initialized(&self) -> bool {
    self.stencil_initialized
  }

  pub fn is_following_surface(&self) -> bool {
    self.follow_surface
  }

  pub fn has_separate_strength_source(&self) -> bool {
    self.separate_strength_source
  }
}
