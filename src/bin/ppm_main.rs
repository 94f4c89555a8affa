//! Headless single-frame renderer: draws the sample triangle scene into an
//! 800x600 swap chain and writes the front buffer to `output.ppm`.

use std::fs::File;
use std::io::{BufWriter, Write};

use graphics::SceneRenderer;
use renderer::demo_scene::TriangleScene;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const FRAME_BUDGET_MS: f64 = 1000.0 / 200.0;

fn main() -> Result<(), error::Error> {
	renderer::install_logger();

	let mut scene_renderer = SceneRenderer::new(WIDTH, HEIGHT);
	scene_renderer.switch_scene(Box::new(TriangleScene::new(WIDTH as f32 / HEIGHT as f32)));

	scene_renderer.clear();
	scene_renderer.update(FRAME_BUDGET_MS);
	scene_renderer.draw();
	scene_renderer.present();

	let swap_chain = scene_renderer.swap_chain();
	let front = scene_renderer.device().front_buffer(swap_chain);

	let path = "output.ppm";
	let file = File::create(path)?;
	let mut writer = BufWriter::new(file);
	write!(writer, "P6\n{WIDTH} {HEIGHT}\n255\n")?;
	for row in 0..HEIGHT {
		for bgr in front.row(row).chunks_exact(3) {
			writer.write_all(&[bgr[2], bgr[1], bgr[0]])?;
		}
	}
	writer.flush()?;

	log::info!("wrote {path}");
	Ok(())
}
