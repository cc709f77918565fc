use std::path::Path;

use log::{error, info};

use separable_sss::config::Config;
#[cfg(feature = "gpu")]
use separable_sss::demo_scene::SceneBuffers;
use separable_sss::demo_scene::{
  create_sphere_scene, load_jpeg_scene, save_png, select_display_texture,
};
use separable_sss::sss::{ColorTexture, SSSBlurContext, SSSBlurTargets, SSSResult};
use separable_sss::utils::vec3_to_pretty_str;

const OUTPUT_PATH: &str = "./output.png";
#[cfg(feature = "gpu")]
const OUTPUT_PATH_GPU: &str = "./output_gpu.png";
/// Distance from the camera to the photo, in world units
const JPEG_SCENE_DEPTH: f32 = 0.5;

// usage: rs-separable-sss [image.jpg]

fn main() {
  simple_logger::SimpleLogger::new().init().unwrap();
  log::set_max_level(log::LevelFilter::Trace);
  info!("-- Start --");

  if let Err(e) = run() {
    error!("{}", e);
    std::process::exit(1);
  }

  info!("-- Done --");
}

fn run() -> SSSResult<()> {
  let mut cfg = Config::new();

  let scene = match std::env::args().nth(1) {
    Some(path) => {
      let scene = load_jpeg_scene(Path::new(&path), JPEG_SCENE_DEPTH)?;
      cfg.window_width = scene.color.width();
      cfg.window_height = scene.color.height();
      scene
    }
    None => create_sphere_scene(&cfg)?,
  };

  let mut ctx = SSSBlurContext::from_config(&cfg)?;
  info!(
    "SSS width={}, strength={}, falloff={}, samples={}",
    ctx.width(),
    vec3_to_pretty_str(ctx.strength()),
    vec3_to_pretty_str(ctx.falloff()),
    ctx.sample_count()
  );
  info!("Kernel:\n{}", ctx.export_kernel_source());

  // same precision as the blurred result, so only blurred pixels differ
  let mut original = scene.color.clone();
  ctx.color_format().store_all(original.data_mut());
  let mut blurred = original.clone();
  let mut stencil = scene.stencil.clone();
  ctx.apply(
    SSSBlurTargets {
      color: &mut blurred,
      depth: &scene.depth,
      stencil: &mut stencil,
      strength: Some(&scene.strength),
    },
    Config::STENCIL_BIT_SKIN,
  )?;

  let contribution = difference(&blurred, &original)?;
  let changed = contribution
    .data()
    .iter()
    .filter(|c| c.truncate().max_element() > 0.0)
    .count();
  info!(
    "SSS changed {}/{} pixels, max difference {:.4}",
    changed,
    contribution.data().len(),
    max_difference(&blurred, &original)
  );

  let display = select_display_texture(&cfg, &scene, &original, &blurred, &contribution);
  save_png(Path::new(OUTPUT_PATH), display)?;

  #[cfg(feature = "gpu")]
  run_gpu(&ctx, &scene, &blurred)?;

  Ok(())
}

/// Same blur with Vulkan, compared against the CPU result.
#[cfg(feature = "gpu")]
fn run_gpu(ctx: &SSSBlurContext, scene: &SceneBuffers, cpu_result: &ColorTexture) -> SSSResult<()> {
  use separable_sss::render_graph::RenderGraph;
  use separable_sss::vk_ctx::vk_ctx_initialize;

  let mut vk_app = vk_ctx_initialize(Config::GRAPHICS_DEBUGGING);
  let mut render_graph = RenderGraph::new(&vk_app, ctx);

  let mut color = scene.color.clone();
  let mut stencil = scene.stencil.clone();
  let result = render_graph.execute_sss_blur(
    &vk_app,
    ctx,
    SSSBlurTargets {
      color: &mut color,
      depth: &scene.depth,
      stencil: &mut stencil,
      strength: Some(&scene.strength),
    },
    Config::STENCIL_BIT_SKIN,
  );

  unsafe {
    render_graph.destroy(&vk_app);
    vk_app.destroy();
  }
  result?;

  info!(
    "GPU vs CPU max difference {:.4}",
    max_difference(&color, cpu_result)
  );
  save_png(Path::new(OUTPUT_PATH_GPU), &color)
}

fn difference(a: &ColorTexture, b: &ColorTexture) -> SSSResult<ColorTexture> {
  ColorTexture::from_fn(a.width(), a.height(), |x, y| {
    (a.get(x, y) - b.get(x, y)).abs().truncate().extend(1.0)
  })
}

fn max_difference(a: &ColorTexture, b: &ColorTexture) -> f32 {
  a.data()
    .iter()
    .zip(b.data().iter())
    .map(|(a, b)| (*a - *b).abs().max_element())
    .fold(0.0, f32::max)
}
