use ash;
use ash::vk;

/// OMG so much fluff for simple sampler.
/// Always clamps to edge, the blur taps near the border must not wrap around.
pub fn create_sampler(
  device: &ash::Device,
  mag_filter: vk::Filter,
  min_filter: vk::Filter,
) -> vk::Sampler {
  let create_info = vk::SamplerCreateInfo::builder()
    .mag_filter(mag_filter)
    .min_filter(min_filter)
    .address_mode_u(vk::SamplerAddressMode::CLAMP_TO_EDGE)
    .address_mode_v(vk::SamplerAddressMode::CLAMP_TO_EDGE)
    .address_mode_w(vk::SamplerAddressMode::CLAMP_TO_EDGE)
    .anisotropy_enable(false)
    .max_anisotropy(1f32)
    .compare_enable(false)
    .compare_op(vk::CompareOp::ALWAYS)
    .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
    .unnormalized_coordinates(false) // address with [0, 1) instead of [0, tex_width)
    // no mipmaps
    .mipmap_mode(vk::SamplerMipmapMode::NEAREST)
    .mip_lod_bias(0f32)
    .min_lod(0f32)
    .max_lod(0f32)
    .build();

  unsafe {
    device
      .create_sampler(&create_info, None)
      .expect("Failed creating sampler")
  }
}
