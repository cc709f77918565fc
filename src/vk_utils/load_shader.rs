use log::trace;

use ash;
use ash::vk;

// https://github.com/zeux/niagara/blob/master/src/shaders.cpp

fn load_shader_module(device: &ash::Device, path: &std::path::Path) -> vk::ShaderModule {
  trace!("Loading shader from {}", path.to_string_lossy());

  let mut file = std::fs::File::open(path).unwrap_or_else(|_| {
    panic!(
      "Could not open file '{}'. Did you compile the shaders?",
      path.to_string_lossy()
    )
  });
  let spirv_code = ash::util::read_spv(&mut file)
    .unwrap_or_else(|_| panic!("Invalid SPIR-V in '{}'", path.to_string_lossy()));
  let create_info = vk::ShaderModuleCreateInfo::builder()
    .code(&spirv_code)
    .build();

  unsafe {
    device
      .create_shader_module(&create_info, None)
      .unwrap_or_else(|_| {
        panic!(
          "Failed to create shader module from file '{}'",
          path.to_string_lossy()
        )
      })
  }
}

/// Returned `vk::PipelineShaderStageCreateInfo` points to a static name, it can outlive this call.
pub fn load_shader(
  device: &ash::Device,
  stage: vk::ShaderStageFlags,
  path: &std::path::Path,
) -> (vk::ShaderModule, vk::PipelineShaderStageCreateInfo) {
  let shader_fn_name = unsafe { std::ffi::CStr::from_bytes_with_nul_unchecked(b"main\0") };

  let shader_module = load_shader_module(device, path);

  let stage_stage = vk::PipelineShaderStageCreateInfo::builder()
    .stage(stage)
    .module(shader_module)
    .name(shader_fn_name)
    .build();
  trace!("Shader {:?} loaded from {}", stage, path.to_string_lossy());

  (shader_module, stage_stage)
}

pub fn load_render_shaders(
  device: &ash::Device,
  vs_path: &str,
  fs_path: &str,
) -> (
  vk::ShaderModule,
  vk::PipelineShaderStageCreateInfo,
  vk::ShaderModule,
  vk::PipelineShaderStageCreateInfo,
) {
  let (module_vs, stage_vs) = load_shader(
    device,
    vk::ShaderStageFlags::VERTEX,
    std::path::Path::new(vs_path),
  );
  let (module_fs, stage_fs) = load_shader(
    device,
    vk::ShaderStageFlags::FRAGMENT,
    std::path::Path::new(fs_path),
  );
  (module_vs, stage_vs, module_fs, stage_fs)
}
