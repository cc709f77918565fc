use ash;
use ash::vk;

use super::load_render_shaders;

pub fn create_pipeline_cache(device: &ash::Device) -> vk::PipelineCache {
  let create_info = vk::PipelineCacheCreateInfo::builder().build();
  unsafe {
    device
      .create_pipeline_cache(&create_info, None)
      .expect("Failed to create pipeline cache")
  }
}

pub fn create_pipeline_layout(
  device: &ash::Device,
  uniform_layouts: &[vk::DescriptorSetLayout],
  push_constant_ranges: &[vk::PushConstantRange],
) -> vk::PipelineLayout {
  let create_info = vk::PipelineLayoutCreateInfo::builder()
    .set_layouts(uniform_layouts)
    .push_constant_ranges(push_constant_ranges)
    .build();
  unsafe {
    device
      .create_pipeline_layout(&create_info, None)
      .expect("Failed to create pipeline layout")
  }
}

pub fn create_pipeline(
  device: &ash::Device,
  pipeline_cache: &vk::PipelineCache,
  pipeline_create_info: vk::GraphicsPipelineCreateInfo,
) -> vk::Pipeline {
  let pipelines = unsafe {
    device
      .create_graphics_pipelines(*pipeline_cache, &[pipeline_create_info], None)
      .ok()
  };
  match pipelines.as_deref() {
    Some([pipeline, ..]) => *pipeline,
    _ => panic!("Failed to create graphic pipeline"),
  }
}

/// Fullscreen-ish defaults: no culling, no depth/stencil, no blending, dynamic viewport.
/// Use `creator` to override the state before the pipeline is created.
pub fn create_pipeline_with_defaults(
  device: &ash::Device,
  render_pass: &vk::RenderPass,
  pipeline_layout: &vk::PipelineLayout,
  shader_paths: (&str, &str),
  vertex_desc: vk::PipelineVertexInputStateCreateInfo,
  color_attachment_count: usize,
  creator: impl Fn(vk::GraphicsPipelineCreateInfoBuilder) -> vk::Pipeline,
) -> vk::Pipeline {
  let (module_vs, stage_vs, module_fs, stage_fs) =
    load_render_shaders(device, shader_paths.0, shader_paths.1);

  let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
  let dynamic_state = ps_dynamic_state(&dynamic_states);

  // create pipeline itself
  let stages = [stage_vs, stage_fs];
  let input_assembly_state = ps_ia_triangle_list();
  let viewport_state = ps_viewport_single_dynamic();
  let rasterization_state = ps_raster_polygons(vk::CullModeFlags::NONE);
  let multisample_state = ps_multisample_disabled();
  let depth_stencil_state = ps_depth_always_stencil_always();
  let color_attachments = ps_color_attachments_write_all(color_attachment_count);
  let color_blend_state = vk::PipelineColorBlendStateCreateInfo::builder()
    .attachments(&color_attachments)
    .build();
  let create_info_builder = vk::GraphicsPipelineCreateInfo::builder()
    .stages(&stages)
    .vertex_input_state(&vertex_desc)
    .input_assembly_state(&input_assembly_state)
    .viewport_state(&viewport_state)
    .rasterization_state(&rasterization_state)
    .multisample_state(&multisample_state)
    .depth_stencil_state(&depth_stencil_state)
    .color_blend_state(&color_blend_state)
    .dynamic_state(&dynamic_state)
    .layout(*pipeline_layout)
    .render_pass(*render_pass);

  let pipeline = creator(create_info_builder);

  unsafe {
    device.destroy_shader_module(module_vs, None);
    device.destroy_shader_module(module_fs, None);
  }

  pipeline
}

// This file contains presets for `vk::GraphicsPipelineCreateInfo`.
// Most common options, so it's actually manageable and <100LOC every time

/// No data for vertices provided by the app, it will all be handled in the shader.
/// Common usage is
/// https://www.saschawillems.de/blog/2016/08/13/vulkan-tutorial-on-rendering-a-fullscreen-quad-without-buffers/
pub fn ps_vertex_empty() -> vk::PipelineVertexInputStateCreateInfo {
  vk::PipelineVertexInputStateCreateInfo::builder().build()
}

/// PipelineInputAssembly-TRIANGLE_LIST
pub fn ps_ia_triangle_list() -> vk::PipelineInputAssemblyStateCreateInfo {
  vk::PipelineInputAssemblyStateCreateInfo::builder()
    .topology(vk::PrimitiveTopology::TRIANGLE_LIST)
    .build()
}

/// Does not specify dimensions during pipeline create, requires PipelineDynamicStateCreateInfo with
/// - vk::DynamicState::VIEWPORT
/// - vk::DynamicState::SCISSOR
pub fn ps_viewport_single_dynamic() -> vk::PipelineViewportStateCreateInfo {
  vk::PipelineViewportStateCreateInfo {
    viewport_count: 1,
    scissor_count: 1,
    ..Default::default()
  }
}

pub fn ps_raster_polygons(
  cull_mode: vk::CullModeFlags,
) -> vk::PipelineRasterizationStateCreateInfo {
  vk::PipelineRasterizationStateCreateInfo::builder()
    .depth_clamp_enable(false)
    .polygon_mode(vk::PolygonMode::FILL)
    .cull_mode(cull_mode)
    .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
    .line_width(1.0) // validation layers: has to be 1.0 if not dynamic
    .build()
}

/// - Depth: test SKIP, write OFF
/// - Stencil: test SKIP
pub fn ps_depth_always_stencil_always() -> vk::PipelineDepthStencilStateCreateInfo {
  vk::PipelineDepthStencilStateCreateInfo::builder()
    .depth_test_enable(false)
    .depth_write_enable(false)
    .depth_compare_op(vk::CompareOp::ALWAYS)
    .depth_bounds_test_enable(false)
    .stencil_test_enable(false)
    .build()
}

/// - Depth: test SKIP, write OFF
/// - Stencil: `stencil` for both faces
pub fn ps_depth_always_stencil(
  stencil: vk::StencilOpState,
) -> vk::PipelineDepthStencilStateCreateInfo {
  vk::PipelineDepthStencilStateCreateInfo::builder()
    .depth_test_enable(false)
    .depth_write_enable(false)
    .depth_compare_op(vk::CompareOp::ALWAYS)
    .depth_bounds_test_enable(false)
    .stencil_test_enable(true)
    .front(stencil)
    .back(stencil)
    .build()
}

/// Every fragment that is not discarded writes the reference value.
/// Reference is set with `cmd_set_stencil_reference` (`vk::DynamicState::STENCIL_REFERENCE`).
pub fn ps_stencil_write_always() -> vk::StencilOpState {
  vk::StencilOpState::builder()
    .fail_op(vk::StencilOp::KEEP)
    .pass_op(vk::StencilOp::REPLACE)
    .depth_fail_op(vk::StencilOp::KEEP)
    .compare_op(vk::CompareOp::ALWAYS)
    .compare_mask(0xff)
    .write_mask(0xff)
    .build()
}

/// Only fragments with stencil equal to the reference are drawn. Stencil is not modified.
/// Reference is set with `cmd_set_stencil_reference` (`vk::DynamicState::STENCIL_REFERENCE`).
pub fn ps_stencil_compare_equal() -> vk::StencilOpState {
  vk::StencilOpState::builder()
    .fail_op(vk::StencilOp::KEEP)
    .pass_op(vk::StencilOp::KEEP)
    .depth_fail_op(vk::StencilOp::KEEP)
    .compare_op(vk::CompareOp::EQUAL)
    .compare_mask(0xff)
    .write_mask(0x00)
    .build()
}

pub fn ps_multisample_disabled() -> vk::PipelineMultisampleStateCreateInfo {
  vk::PipelineMultisampleStateCreateInfo::builder()
    .rasterization_samples(vk::SampleCountFlags::TYPE_1)
    .sample_shading_enable(false)
    .build()
}

/// Write result to all color attachments, disable blending
pub fn ps_color_attachments_write_all(
  attachment_count: usize,
) -> Vec<vk::PipelineColorBlendAttachmentState> {
  // VULKAN SPEC:
  // > If the independent blending feature is not enabled on the device,
  // all VkPipelineColorBlendAttachmentState elements in the pAttachments
  // array must be identical.

  // PS. I always hated blend state
  let write_all = vk::PipelineColorBlendAttachmentState::builder()
    .color_write_mask(vk::ColorComponentFlags::RGBA)
    .blend_enable(false)
    .src_color_blend_factor(vk::BlendFactor::ONE) // shader output
    .dst_color_blend_factor(vk::BlendFactor::ZERO) // existing value on destination attachment
    .src_alpha_blend_factor(vk::BlendFactor::ONE) // shader output
    .dst_alpha_blend_factor(vk::BlendFactor::ZERO) // existing value on destination attachment
    .build();

  vec![write_all; attachment_count]
}

/// List of things that will be provided as separate command before draw (actuall 'runtime').
/// Used so that we do not have to specify everything during pipeline create
pub fn ps_dynamic_state(states: &[vk::DynamicState]) -> vk::PipelineDynamicStateCreateInfo {
  vk::PipelineDynamicStateCreateInfo::builder()
    .dynamic_states(states)
    .build()
}
