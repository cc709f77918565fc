use std::mem::size_of;

use ash;
use ash::vk;
use glam::{vec4, Vec2, Vec4};
use log::{info, trace};

use crate::sss::{BLUR_DIRECTION_PASS0, BLUR_DIRECTION_PASS1, STENCIL_CLEAR_VALUE};
use crate::vk_ctx::VkCtx;
use crate::vk_utils::*;

use super::RenderGraphResources;

const BINDING_INDEX_CONFIG_UBO: u32 = 0;
const BINDING_INDEX_COLOR_SOURCE_POINT: u32 = 1;
const BINDING_INDEX_COLOR_SOURCE_LINEAR: u32 = 2;
const BINDING_INDEX_DEPTH_POINT: u32 = 3;
const BINDING_INDEX_DEPTH_LINEAR: u32 = 4;
const BINDING_INDEX_STRENGTH: u32 = 5;

const COLOR_ATTACHMENT_COUNT: usize = 1;
const SHADER_PATHS: (&str, &str) = (
  "./assets/shaders-compiled/fullscreen_quad.vert.spv",
  "./assets/shaders-compiled/sss_blur.frag.spv",
);

/// Per-submit state shared by both directions.
pub struct SSSBlurPassExec<'a> {
  pub vk_app: &'a VkCtx,
  pub command_buffer: vk::CommandBuffer,
  /// Kernel and blur settings, see `SSSBlurUBO`.
  pub config_buffer: &'a VkBuffer,
  /// Stencil value of the blurred region.
  pub region_id: u8,
  /// Clear the stencil, then mark every pixel with non-zero strength during the 1st pass.
  pub init_stencil: bool,
}

/// Blur SSS, so a blur, but with a special per-channel profile.
/// `SSSSBlurPS` from Jimenez, Gutierrez, see `sss_blur.frag.glsl`.
///
/// Attachment 0 is the depth-stencil (only stencil is used), attachment 1 is the result.
pub struct SSSBlurPass {
  /// 1st pass if the stencil is initialized on the fly: clear stencil and result
  render_pass_clear_all: vk::RenderPass,
  /// 1st pass with the stencil already initialized: clear result only
  render_pass_clear_color: vk::RenderPass,
  /// 2nd pass, result keeps the pixels outside of the stencil
  render_pass_load_all: vk::RenderPass,
  /// Writes region id to stencil for every pixel that is not discarded
  pipeline_stencil_write: vk::Pipeline,
  /// Only pixels with stencil equal to region id
  pipeline_stencil_test: vk::Pipeline,
  pipeline_layout: vk::PipelineLayout,
  uniforms_layout: vk::DescriptorSetLayout,
}

impl SSSBlurPass {
  /// * `color_format` - format of the blurred texture and of the intermediate result
  pub fn new(vk_app: &VkCtx, color_format: vk::Format) -> Self {
    info!("Creating SSSBlurPass ({:?})", color_format);
    let device = vk_app.vk_device();
    let pipeline_cache = &vk_app.pipeline_cache;
    let ds_format = vk_app.device.depth_stencil_format;

    let render_pass_clear_all = Self::create_render_pass(
      device,
      ds_format,
      color_format,
      vk::AttachmentLoadOp::CLEAR,
      vk::AttachmentLoadOp::CLEAR,
    );
    let render_pass_clear_color = Self::create_render_pass(
      device,
      ds_format,
      color_format,
      vk::AttachmentLoadOp::LOAD,
      vk::AttachmentLoadOp::CLEAR,
    );
    let render_pass_load_all = Self::create_render_pass(
      device,
      ds_format,
      color_format,
      vk::AttachmentLoadOp::LOAD,
      vk::AttachmentLoadOp::LOAD,
    );

    let uniforms_desc = Self::get_uniforms_layout();
    let push_constant_ranges = Self::get_push_constant_layout();
    let uniforms_layout = create_push_descriptor_layout(device, uniforms_desc);
    let pipeline_layout =
      create_pipeline_layout(device, &[uniforms_layout], &[push_constant_ranges]);

    // all render passes are compatible, pipelines can be used with any of them
    let pipeline_stencil_write = Self::create_pipeline(
      device,
      pipeline_cache,
      &render_pass_load_all,
      &pipeline_layout,
      ps_stencil_write_always(),
    );
    let pipeline_stencil_test = Self::create_pipeline(
      device,
      pipeline_cache,
      &render_pass_load_all,
      &pipeline_layout,
      ps_stencil_compare_equal(),
    );

    Self {
      render_pass_clear_all,
      render_pass_clear_color,
      render_pass_load_all,
      pipeline_stencil_write,
      pipeline_stencil_test,
      pipeline_layout,
      uniforms_layout,
    }
  }

  pub unsafe fn destroy(&self, device: &ash::Device) {
    device.destroy_render_pass(self.render_pass_clear_all, None);
    device.destroy_render_pass(self.render_pass_clear_color, None);
    device.destroy_render_pass(self.render_pass_load_all, None);
    device.destroy_descriptor_set_layout(self.uniforms_layout, None);
    device.destroy_pipeline_layout(self.pipeline_layout, None);
    device.destroy_pipeline(self.pipeline_stencil_write, None);
    device.destroy_pipeline(self.pipeline_stencil_test, None);
  }

  fn create_render_pass(
    device: &ash::Device,
    depth_stencil_format: vk::Format,
    color_format: vk::Format,
    stencil_load_op: vk::AttachmentLoadOp,
    color_load_op: vk::AttachmentLoadOp,
  ) -> vk::RenderPass {
    let depth_attachment = create_depth_stencil_attachment(
      0,
      depth_stencil_format,
      vk::AttachmentLoadOp::DONT_CARE, // depth_load_op
      vk::AttachmentStoreOp::DONT_CARE, // depth_store_op
      stencil_load_op,
      vk::AttachmentStoreOp::STORE, // stencil_store_op
      vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
    );
    let color_attachment = create_color_attachment(
      1,
      color_format,
      color_load_op,
      vk::AttachmentStoreOp::STORE,
    );

    unsafe {
      create_render_pass_from_attachments(device, Some(depth_attachment), &[color_attachment])
    }
  }

  fn get_uniforms_layout() -> Vec<vk::DescriptorSetLayoutBinding> {
    vec![
      create_ubo_binding(BINDING_INDEX_CONFIG_UBO, vk::ShaderStageFlags::FRAGMENT),
      create_texture_binding(BINDING_INDEX_COLOR_SOURCE_POINT, vk::ShaderStageFlags::FRAGMENT),
      create_texture_binding(BINDING_INDEX_COLOR_SOURCE_LINEAR, vk::ShaderStageFlags::FRAGMENT),
      create_texture_binding(BINDING_INDEX_DEPTH_POINT, vk::ShaderStageFlags::FRAGMENT),
      create_texture_binding(BINDING_INDEX_DEPTH_LINEAR, vk::ShaderStageFlags::FRAGMENT),
      create_texture_binding(BINDING_INDEX_STRENGTH, vk::ShaderStageFlags::FRAGMENT),
    ]
  }

  fn get_push_constant_layout() -> vk::PushConstantRange {
    vk::PushConstantRange::builder()
      .offset(0)
      .size(size_of::<SSSBlurPassPushConstants>() as _)
      .stage_flags(vk::ShaderStageFlags::FRAGMENT)
      .build()
  }

  fn create_pipeline(
    device: &ash::Device,
    pipeline_cache: &vk::PipelineCache,
    render_pass: &vk::RenderPass,
    pipeline_layout: &vk::PipelineLayout,
    stencil: vk::StencilOpState,
  ) -> vk::Pipeline {
    let vertex_desc = ps_vertex_empty();

    create_pipeline_with_defaults(
      device,
      render_pass,
      pipeline_layout,
      SHADER_PATHS,
      vertex_desc,
      COLOR_ATTACHMENT_COUNT,
      |builder| {
        let depth_stencil = ps_depth_always_stencil(stencil);
        let dynamic_states = [
          vk::DynamicState::VIEWPORT,
          vk::DynamicState::SCISSOR,
          vk::DynamicState::STENCIL_REFERENCE,
        ];
        let dynamic_state = ps_dynamic_state(&dynamic_states);

        let pipeline_create_info = builder
          .depth_stencil_state(&depth_stencil)
          .dynamic_state(&dynamic_state)
          .build();
        create_pipeline(device, pipeline_cache, pipeline_create_info)
      },
    )
  }

  pub fn create_framebuffer(
    &self,
    vk_app: &VkCtx,
    stencil_source_tex: &VkTexture,
    result_tex: &VkTexture,
  ) -> SSSBlurFramebuffer {
    let device = vk_app.vk_device();
    let fbo = create_framebuffer(
      device,
      self.render_pass_load_all,
      &[stencil_source_tex.image_view(), result_tex.image_view()],
      &result_tex.size(),
    );
    SSSBlurFramebuffer { fbo }
  }

  #[allow(clippy::too_many_arguments)]
  unsafe fn execute_blur_single_direction(
    &self,
    exec: &SSSBlurPassExec,
    size: vk::Extent2D,
    render_pass: vk::RenderPass,
    pipeline: vk::Pipeline,
    framebuffer: &SSSBlurFramebuffer,
    blur_direction: Vec2,
    discard_zero_strength: bool,
    result_tex: &mut VkTexture,        // write
    depth_stencil_tex: &mut VkTexture, // write (stencil source)
    color_source_tex: &mut VkTexture,  // read
    linear_depth_tex: &mut VkTexture,  // read
    strength_tex: &mut VkTexture,      // read
  ) {
    let command_buffer = exec.command_buffer;
    let device = exec.vk_app.vk_device();
    trace!(
      "SSSBlurPass dir={} discard_zero_strength={}",
      blur_direction,
      discard_zero_strength
    );

    VkTexture::cmd_transition_attachments_for_read_barrier(
      device,
      command_buffer,
      &mut [
        &mut *color_source_tex,
        &mut *linear_depth_tex,
        &mut *strength_tex,
      ],
    );
    VkTexture::cmd_transition_attachments_for_write_barrier(
      device,
      command_buffer,
      &mut [&mut *depth_stencil_tex, &mut *result_tex],
    );

    // start render pass. Clear values are ignored for LOAD attachments
    let clear_values = [
      vk::ClearValue {
        depth_stencil: vk::ClearDepthStencilValue {
          depth: 1.0,
          stencil: STENCIL_CLEAR_VALUE as u32,
        },
      },
      vk::ClearValue {
        color: vk::ClearColorValue {
          float32: [0.0, 0.0, 0.0, 0.0],
        },
      },
    ];
    // whole target, row 0 at the top like the CPU textures
    let render_area = vk::Rect2D {
      offset: vk::Offset2D::default(),
      extent: size,
    };
    let viewport = vk::Viewport {
      x: 0.0,
      y: 0.0,
      width: size.width as f32,
      height: size.height as f32,
      min_depth: 0.0,
      max_depth: 1.0,
    };
    let begin_info = vk::RenderPassBeginInfo::builder()
      .render_pass(render_pass)
      .framebuffer(framebuffer.fbo)
      .render_area(render_area)
      .clear_values(&clear_values);
    device.cmd_begin_render_pass(command_buffer, &begin_info, vk::SubpassContents::INLINE);
    device.cmd_set_viewport(command_buffer, 0, &[viewport]);
    device.cmd_set_scissor(command_buffer, 0, &[render_area]);
    device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline);
    device.cmd_set_stencil_reference(
      command_buffer,
      vk::StencilFaceFlags::FRONT_AND_BACK,
      exec.region_id as u32,
    );

    // bind uniforms (do not move this)
    self.bind_uniforms(
      exec,
      blur_direction,
      discard_zero_strength,
      color_source_tex,
      linear_depth_tex,
      strength_tex,
    );

    // fullscreen triangle, vertices are generated in the shader
    device.cmd_draw(command_buffer, 3, 1, 0, 0);

    // end
    device.cmd_end_render_pass(command_buffer)
  }

  unsafe fn bind_uniforms(
    &self,
    exec: &SSSBlurPassExec,
    blur_direction: Vec2,
    discard_zero_strength: bool,
    color_source_tex: &VkTexture,
    linear_depth_tex: &VkTexture,
    strength_tex: &VkTexture,
  ) {
    let vk_app = exec.vk_app;
    let command_buffer = exec.command_buffer;
    let device = vk_app.vk_device();
    let resouce_binder = ResouceBinder {
      push_descriptor: &vk_app.push_descriptor,
      command_buffer,
      pipeline_layout: self.pipeline_layout,
    };
    let sampler_nearest = vk_app.default_texture_sampler_nearest;
    let sampler_linear = vk_app.default_texture_sampler_linear;

    let uniform_resouces = [
      BindableResource::Uniform {
        binding: BINDING_INDEX_CONFIG_UBO,
        buffer: exec.config_buffer,
      },
      BindableResource::Texture {
        binding: BINDING_INDEX_COLOR_SOURCE_POINT,
        texture: color_source_tex,
        sampler: sampler_nearest,
      },
      BindableResource::Texture {
        binding: BINDING_INDEX_COLOR_SOURCE_LINEAR,
        texture: color_source_tex,
        sampler: sampler_linear,
      },
      BindableResource::Texture {
        binding: BINDING_INDEX_DEPTH_POINT,
        texture: linear_depth_tex,
        sampler: sampler_nearest,
      },
      BindableResource::Texture {
        binding: BINDING_INDEX_DEPTH_LINEAR,
        texture: linear_depth_tex,
        sampler: sampler_linear,
      },
      BindableResource::Texture {
        binding: BINDING_INDEX_STRENGTH,
        texture: strength_tex,
        sampler: sampler_linear,
      },
    ];
    bind_resources_to_descriptors(&resouce_binder, 0, &uniform_resouces);

    // push constants
    let discard = if discard_zero_strength { 1.0 } else { 0.0 };
    let push_constants = SSSBlurPassPushConstants {
      u_blur_direction: vec4(blur_direction.x, blur_direction.y, discard, 0.0),
    };
    let push_constants_bytes = bytemuck::bytes_of(&push_constants);
    device.cmd_push_constants(
      command_buffer,
      self.pipeline_layout,
      vk::ShaderStageFlags::FRAGMENT,
      0,
      push_constants_bytes,
    );
  }

  /// Horizontal pass from `color_tex` into `sss_ping_result_tex`, then vertical
  /// pass back into `color_tex`.
  pub fn execute(&self, exec: &SSSBlurPassExec, resources: &mut RenderGraphResources) {
    let init_stencil = exec.init_stencil;
    let RenderGraphResources {
      size,
      color_tex,
      sss_ping_result_tex,
      linear_depth_tex,
      strength_tex,
      depth_stencil_tex,
      sss_blur_fbo0,
      sss_blur_fbo1,
      ..
    } = resources;

    let (pass0_render_pass, pass0_pipeline) = if init_stencil {
      (self.render_pass_clear_all, self.pipeline_stencil_write)
    } else {
      (self.render_pass_clear_color, self.pipeline_stencil_test)
    };

    unsafe {
      self.execute_blur_single_direction(
        exec,
        *size,
        pass0_render_pass,
        pass0_pipeline,
        sss_blur_fbo0,
        BLUR_DIRECTION_PASS0,
        init_stencil,
        sss_ping_result_tex, // write
        depth_stencil_tex,   // write (stencil source)
        color_tex,           // read
        linear_depth_tex,    // read
        strength_tex,        // read
      );

      self.execute_blur_single_direction(
        exec,
        *size,
        self.render_pass_load_all,
        self.pipeline_stencil_test,
        sss_blur_fbo1,
        BLUR_DIRECTION_PASS1,
        false,
        color_tex,           // write
        depth_stencil_tex,   // write (stencil source)
        sss_ping_result_tex, // read
        linear_depth_tex,    // read
        strength_tex,        // read
      );
    }
  }
}

pub struct SSSBlurFramebuffer {
  pub fbo: vk::Framebuffer,
}

impl SSSBlurFramebuffer {
  pub unsafe fn destroy(&mut self, vk_app: &VkCtx) {
    let device = vk_app.vk_device();
    device.destroy_framebuffer(self.fbo, None);
  }
}

#[derive(Copy, Clone, Debug)] // , bytemuck::Zeroable, bytemuck::Pod
#[repr(C)]
struct SSSBlurPassPushConstants {
  /// `.xy` - direction, `.z` - discard pixels with zero strength (1.0 or 0.0)
  u_blur_direction: Vec4,
}

unsafe impl bytemuck::Zeroable for SSSBlurPassPushConstants {}
unsafe impl bytemuck::Pod for SSSBlurPassPushConstants {}
