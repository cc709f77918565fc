use ash;
use ash::vk;

use crate::render_graph::sss_blur_pass::{SSSBlurFramebuffer, SSSBlurPass};
use crate::sss::ColorFormat;
use crate::vk_ctx::VkCtx;
use crate::vk_utils::VkTexture;

pub fn color_format_to_vk(format: ColorFormat) -> vk::Format {
  match format {
    ColorFormat::Rgba8Unorm => vk::Format::R8G8B8A8_UNORM,
    ColorFormat::Rgba8UnormSrgb => vk::Format::R8G8B8A8_SRGB,
    ColorFormat::Rgba16Float => vk::Format::R16G16B16A16_SFLOAT,
    ColorFormat::Rgba32Float => vk::Format::R32G32B32A32_SFLOAT,
  }
}

pub struct RenderGraphResources {
  pub size: vk::Extent2D,
  /// Read by the 1st pass, written by the 2nd
  pub color_tex: VkTexture,
  /// SSS - first result attachment in ping-pong
  pub sss_ping_result_tex: VkTexture,
  pub linear_depth_tex: VkTexture,
  /// Only uploaded if strength does not come from the color's alpha
  pub strength_tex: VkTexture,
  /// Stencil source for both passes
  pub depth_stencil_tex: VkTexture,

  // framebuffers
  pub sss_blur_fbo0: SSSBlurFramebuffer,
  pub sss_blur_fbo1: SSSBlurFramebuffer,
}

impl RenderGraphResources {
  pub fn new(
    vk_app: &VkCtx,
    size: vk::Extent2D,
    color_format: ColorFormat,
    sss_blur_pass: &SSSBlurPass,
  ) -> Self {
    let device = vk_app.vk_device();
    let allocator = &vk_app.allocator;
    let color_format = color_format_to_vk(color_format);

    let create_color = |name: &str| {
      VkTexture::empty(
        device,
        allocator,
        name.to_string(),
        size,
        color_format,
        vk::ImageUsageFlags::COLOR_ATTACHMENT
          | vk::ImageUsageFlags::SAMPLED
          | vk::ImageUsageFlags::TRANSFER_SRC
          | vk::ImageUsageFlags::TRANSFER_DST,
        vk::ImageAspectFlags::COLOR,
      )
    };
    let create_single_channel = |name: &str| {
      VkTexture::empty(
        device,
        allocator,
        name.to_string(),
        size,
        VkTexture::SINGLE_CHANNEL_FLOAT_FORMAT,
        vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
        vk::ImageAspectFlags::COLOR,
      )
    };

    let color_tex = create_color("sss_color");
    let sss_ping_result_tex = create_color("sss_blur_tmp");
    let linear_depth_tex = create_single_channel("sss_linear_depth");
    let strength_tex = create_single_channel("sss_strength");
    let depth_stencil_tex = VkTexture::empty(
      device,
      allocator,
      "sss_depth_stencil".to_string(),
      size,
      vk_app.device.depth_stencil_format,
      vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
        | vk::ImageUsageFlags::TRANSFER_SRC
        | vk::ImageUsageFlags::TRANSFER_DST,
      vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL,
    );

    let sss_blur_fbo0 =
      sss_blur_pass.create_framebuffer(vk_app, &depth_stencil_tex, &sss_ping_result_tex);
    let sss_blur_fbo1 =
      sss_blur_pass.create_framebuffer(vk_app, &depth_stencil_tex, &color_tex);

    Self {
      size,
      color_tex,
      sss_ping_result_tex,
      linear_depth_tex,
      strength_tex,
      depth_stencil_tex,
      sss_blur_fbo0,
      sss_blur_fbo1,
    }
  }

  pub fn textures_mut(&mut self) -> Vec<&mut VkTexture> {
    vec![
      &mut self.color_tex,
      &mut self.sss_ping_result_tex,
      &mut self.linear_depth_tex,
      &mut self.strength_tex,
      &mut self.depth_stencil_tex,
    ]
  }

  /// Layout of the texture between the blurs.
  pub fn resting_layout(tex: &VkTexture) -> vk::ImageLayout {
    if tex.is_depth_stencil() {
      vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
    } else {
      vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL
    }
  }

  pub unsafe fn destroy(&mut self, vk_app: &VkCtx) {
    let device = vk_app.vk_device();
    let allocator = &vk_app.allocator;

    self.sss_blur_fbo0.destroy(vk_app);
    self.sss_blur_fbo1.destroy(vk_app);
    self
      .textures_mut()
      .into_iter()
      .for_each(|tex| tex.delete(device, allocator));
  }
}
