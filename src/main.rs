use log::{error, info, trace};

use crate::app_timer::AppTimer;
use crate::app_window::AppWindow;
use crate::config::Config;
use crate::frame_driver::{FrameDriver, PresentSurface};
use crate::vk_backend::VulkanBackend;

mod app_timer;
mod app_window;
mod config;
mod error;
mod frame_driver;
mod mesh;
mod vk_backend;
mod vk_ctx;
mod vk_utils;

// glslangValidator.exe -V src/shaders/triangle.frag.glsl src/shaders/triangle.vert.glsl
// spirv-dis.exe vert.spv

const LOG_FRAME_INTERVAL: u64 = 2000;

fn main() {
  simple_logger::SimpleLogger::new().init().unwrap();
  log::set_max_level(log::LevelFilter::Trace);
  info!("-- Start --");

  let config = Config::new();

  // init window
  let mut window = AppWindow::new(&config);

  // init renderer
  let mut backend = VulkanBackend::new(&window.window, &config);
  info!("Render init went OK!");

  let mut frame_driver = FrameDriver::new();
  let mut timer = AppTimer::new();

  // start render loop
  info!("Starting render loop");
  let mut render_failed = false;
  loop {
    window.pump_events();
    if window.should_stop() {
      break;
    }

    timer.mark_start_frame();
    if timer.frame_idx() % LOG_FRAME_INTERVAL == 0 {
      trace!(
        "Frame {} (filtered dt={:.2}ms)",
        timer.frame_idx(),
        timer.delta_time_ms()
      );
    }

    if let Err(e) = frame_driver.advance_frame(&mut backend, &mut window) {
      error!("Rendering failed, exiting: {}", e);
      render_failed = true;
      break;
    }
  }

  info!("Render loop stopped");
  frame_driver.shutdown(&mut backend);
  unsafe { backend.destroy() };
  info!("-- Finished --");

  if render_failed {
    std::process::exit(1);
  }
}
