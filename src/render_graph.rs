use ash;
use ash::vk;
use bytemuck;
use log::{info, trace};

use crate::sss::{SSSBlurContext, SSSBlurTargets, SSSError, SSSResult, StrengthSource};
use crate::vk_ctx::{VkCtx, WithSetupCmdBuffer};
use crate::vk_utils::*;

mod _shared;
mod sss_blur_pass;

pub use self::_shared::*;
use self::sss_blur_pass::{SSSBlurPass, SSSBlurPassExec};

/// Runs [`SSSBlurContext::apply`] on the GPU. Textures live on the GPU between
/// calls, inputs are uploaded and the results read back on every call.
pub struct RenderGraph {
  sss_blur_pass: SSSBlurPass,
  resources: RenderGraphResources,
  /// Kernel and blur settings, see [`SSSBlurUBO`]
  config_buffer: VkBuffer,
}

impl RenderGraph {
  /// Resolution and color format are taken from `ctx`.
  pub fn new(vk_app: &VkCtx, ctx: &SSSBlurContext) -> Self {
    let (width, height) = ctx.resolution();
    info!("Creating RenderGraph ({}x{})", width, height);
    let size = vk::Extent2D { width, height };

    let sss_blur_pass = SSSBlurPass::new(vk_app, color_format_to_vk(ctx.color_format()));
    let mut resources =
      RenderGraphResources::new(vk_app, size, ctx.color_format(), &sss_blur_pass);
    let config_buffer = VkBuffer::empty(
      &vk_app.allocator,
      "sss_blur_config_ubo".to_string(),
      std::mem::size_of::<SSSBlurUBO>(),
      vk::BufferUsageFlags::UNIFORM_BUFFER,
      VkMemoryPreference::GpuMappable,
    );

    vk_app.with_setup_cb(|device, cmd_buf| unsafe {
      cmd_transition_to_resting_layouts(device, cmd_buf, &mut resources);
    });

    Self {
      sss_blur_pass,
      resources,
      config_buffer,
    }
  }

  pub unsafe fn destroy(&mut self, vk_app: &VkCtx) {
    let device = vk_app.vk_device();
    self.resources.destroy(vk_app);
    self.config_buffer.delete(&vk_app.allocator);
    self.sss_blur_pass.destroy(device);
  }

  /// Same as [`SSSBlurContext::apply`], but executed with Vulkan.
  /// `ctx` provides the kernel and blur settings, it has to use the same
  /// resolution as the one this render graph was created with.
  pub fn execute_sss_blur(
    &mut self,
    vk_app: &VkCtx,
    ctx: &SSSBlurContext,
    mut targets: SSSBlurTargets,
    region_id: u8,
  ) -> SSSResult<()> {
    let strength_source = ctx.check_targets(&targets, region_id)?;
    let size = self.resources.size;
    if ctx.resolution() != (size.width, size.height) {
      return Err(SSSError::TargetSizeMismatch {
        name: "render graph",
        expected_width: size.width,
        expected_height: size.height,
        actual_width: ctx.resolution().0,
        actual_height: ctx.resolution().1,
      });
    }
    if ctx.kernel().len() > SSS_KERNEL_SIZE_MAX {
      return Err(SSSError::KernelTooLarge {
        sample_count: ctx.kernel().len(),
        max: SSS_KERNEL_SIZE_MAX,
      });
    }
    trace!("RenderGraph::execute_sss_blur(region_id={})", region_id);

    let allocator = &vk_app.allocator;
    let color_format = ctx.color_format();
    let stencil_aspect = vk::ImageAspectFlags::STENCIL;
    let color_aspect = vk::ImageAspectFlags::COLOR;

    // kernel + settings
    let ubo = SSSBlurUBO::new(ctx);
    self.config_buffer.write_to_mapped(bytemuck::bytes_of(&ubo));

    // staging
    let mut color_upload = VkBuffer::staging_from_data(
      allocator,
      "sss_color_upload".to_string(),
      &color_format.encode(targets.color.data()),
    );
    let mut depth_upload = VkBuffer::staging_from_data(
      allocator,
      "sss_depth_upload".to_string(),
      bytemuck::cast_slice(targets.depth.data()),
    );
    let mut stencil_upload = VkBuffer::staging_from_data(
      allocator,
      "sss_stencil_upload".to_string(),
      targets.stencil.data(),
    );
    let mut strength_upload = match strength_source {
      StrengthSource::Texture(tex) => Some(VkBuffer::staging_from_data(
        allocator,
        "sss_strength_upload".to_string(),
        bytemuck::cast_slice(tex.data()),
      )),
      StrengthSource::ColorAlpha => None,
    };
    let mut color_readback = VkBuffer::readback(
      allocator,
      "sss_color_readback".to_string(),
      color_upload.size,
    );
    let mut stencil_readback = VkBuffer::readback(
      allocator,
      "sss_stencil_readback".to_string(),
      stencil_upload.size,
    );

    let init_stencil = !ctx.is_stencil_initialized();
    let sss_blur_pass = &self.sss_blur_pass;
    let config_buffer = &self.config_buffer;
    let resources = &mut self.resources;

    vk_app.with_setup_cb(|device, command_buffer| unsafe {
      with_layouts_restored(device, command_buffer, resources, |resources| {
        // upload
        VkTexture::cmd_transition_barriers(
          device,
          command_buffer,
          &mut resources.textures_mut(),
          |tex| tex.barrier_prepare_for_transfer_dst(),
        );
        let rs = &*resources;
        rs.color_tex
          .cmd_copy_from_buffer(device, command_buffer, &color_upload, color_aspect);
        rs.linear_depth_tex
          .cmd_copy_from_buffer(device, command_buffer, &depth_upload, color_aspect);
        rs.depth_stencil_tex
          .cmd_copy_from_buffer(device, command_buffer, &stencil_upload, stencil_aspect);
        if let Some(strength_upload) = strength_upload.as_ref() {
          rs.strength_tex
            .cmd_copy_from_buffer(device, command_buffer, strength_upload, color_aspect);
        }

        // blur
        let exec = SSSBlurPassExec {
          vk_app,
          command_buffer,
          config_buffer,
          region_id,
          init_stencil,
        };
        sss_blur_pass.execute(&exec, resources);

        // readback
        VkTexture::cmd_transition_barriers(
          device,
          command_buffer,
          &mut [&mut resources.color_tex, &mut resources.depth_stencil_tex],
          |tex| tex.barrier_prepare_for_transfer_src(),
        );
        let rs = &*resources;
        rs.color_tex
          .cmd_copy_to_buffer(device, command_buffer, &color_readback, color_aspect);
        rs.depth_stencil_tex
          .cmd_copy_to_buffer(device, command_buffer, &stencil_readback, stencil_aspect);
        let host_barrier =
          create_host_transfer_barrier(vk::AccessFlags::TRANSFER_WRITE, vk::AccessFlags::HOST_READ);
        device.cmd_pipeline_barrier(
          command_buffer,
          vk::PipelineStageFlags::TRANSFER,
          vk::PipelineStageFlags::HOST,
          vk::DependencyFlags::empty(),
          &[host_barrier],
          &[],
          &[],
        );
      });
    });

    // results
    let color_bytes = color_readback.read_from_mapped();
    targets
      .color
      .data_mut()
      .copy_from_slice(&color_format.decode(&color_bytes));
    let stencil_bytes = stencil_readback.read_from_mapped();
    targets.stencil.data_mut().copy_from_slice(&stencil_bytes);

    unsafe {
      color_upload.delete(allocator);
      depth_upload.delete(allocator);
      stencil_upload.delete(allocator);
      if let Some(buf) = strength_upload.as_mut() {
        buf.delete(allocator);
      }
      color_readback.delete(allocator);
      stencil_readback.delete(allocator);
    }

    Ok(())
  }
}
