use ash;
use ash::vk;

use super::RenderGraphResources;
use crate::vk_utils::VkTexture;

/// Run `callback`, then move every texture of `resources` back to the layout
/// it had before. Restores also when `callback` returns early with an error.
///
/// Passes can then assume each texture rests in a known layout
/// (see `RenderGraphResources::resting_layout`).
pub unsafe fn with_layouts_restored<R>(
  device: &ash::Device,
  command_buffer: vk::CommandBuffer,
  resources: &mut RenderGraphResources,
  callback: impl FnOnce(&mut RenderGraphResources) -> R,
) -> R {
  let saved_layouts = resources
    .textures_mut()
    .iter()
    .map(|tex| tex.layout)
    .collect::<Vec<_>>();

  let result = callback(resources);

  let mut textures = resources.textures_mut();
  let barriers = textures
    .iter_mut()
    .zip(saved_layouts.iter())
    .filter(|(tex, layout)| tex.layout != **layout)
    .map(|(tex, layout)| {
      let dst_access_mask = access_mask_for_resting_layout(*layout);
      tex.barrier_prepare_for_layout_transition(*layout, dst_access_mask)
    })
    .collect::<Vec<_>>();

  if !barriers.is_empty() {
    device.cmd_pipeline_barrier(
      command_buffer,
      vk::PipelineStageFlags::ALL_COMMANDS,
      vk::PipelineStageFlags::ALL_COMMANDS,
      vk::DependencyFlags::empty(),
      &[],
      &[],
      &barriers,
    );
  }

  result
}

fn access_mask_for_resting_layout(layout: vk::ImageLayout) -> vk::AccessFlags {
  match layout {
    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL => vk::AccessFlags::SHADER_READ,
    vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL => {
      vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
        | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE
    }
    _ => vk::AccessFlags::MEMORY_READ,
  }
}

/// Move freshly created textures from `UNDEFINED` to their resting layouts.
pub unsafe fn cmd_transition_to_resting_layouts(
  device: &ash::Device,
  command_buffer: vk::CommandBuffer,
  resources: &mut RenderGraphResources,
) {
  let mut textures = resources.textures_mut();
  VkTexture::cmd_transition_barriers(device, command_buffer, &mut textures, |tex| {
    let layout = RenderGraphResources::resting_layout(tex);
    tex.barrier_prepare_for_layout_transition(layout, access_mask_for_resting_layout(layout))
  });
}
