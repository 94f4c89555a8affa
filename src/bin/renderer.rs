//! Windowed demo binary: pumps the platform message loop, drives the sample
//! scene's update/draw, and blits the finished frame through a native
//! window, throttled to a target frame budget.

#[cfg(windows)]
fn main() -> Result<(), error::Error> {
	use std::time::{Duration, Instant};

	use graphics::{Behavior, Controller, SceneRenderer, Transform};
	use platform::{App, Event, Key, Rect, Window, WindowDesc};
	use renderer::demo_scene::TriangleScene;

	const WIDTH: u32 = 800;
	const HEIGHT: u32 = 600;
	const FRAME_BUDGET_MS: f64 = 1000.0 / 200.0;

	renderer::install_logger();

	fn key_to_char(key: Key) -> Option<char> {
		match key {
			Key::W => Some('W'),
			Key::A => Some('A'),
			Key::S => Some('S'),
			Key::D => Some('D'),
			Key::Q => Some('Q'),
			Key::E => Some('E'),
			Key::Z => Some('Z'),
			Key::C => Some('C'),
			Key::R => Some('R'),
			Key::F => Some('F'),
			_ => None,
		}
	}

	let mut app = platform::win32::App::new();
	let window = app.create_window(&WindowDesc {
		title: "renderer".to_string(),
		rect: Rect { x: 100, y: 100, width: WIDTH as i32, height: HEIGHT as i32 },
	});

	let mut scene_renderer = SceneRenderer::new(WIDTH, HEIGHT);
	scene_renderer.switch_scene(Box::new(TriangleScene::new(WIDTH as f32 / HEIGHT as f32)));

	let mut controller = Controller::new();
	let mut controller_transform = Transform::IDENTITY;

	let mut packed = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
	let mut last_frame = Instant::now();

	while app.run() {
		for event in app.events() {
			match event {
				Event::Key { key, pressed } => {
					if let Some(c) = key_to_char(key) {
						if pressed {
							controller.on_key_down(c);
						} else {
							controller.on_key_up(c);
						}
					}
				}
				Event::Text { .. } | Event::MouseButton { .. } | Event::MouseWheel { .. } => {}
			}
		}
		let mouse = app.mouse_pos();
		controller.on_mouse_move(mouse.x, mouse.y);

		let now = Instant::now();
		let dt_ms = now.duration_since(last_frame).as_secs_f64() * 1000.0;
		last_frame = now;
		controller.update(dt_ms.max(FRAME_BUDGET_MS), &mut controller_transform);

		scene_renderer.clear();
		scene_renderer.update(dt_ms.max(FRAME_BUDGET_MS));
		scene_renderer.draw();
		scene_renderer.present();

		let swap_chain = scene_renderer.swap_chain();
		let front = scene_renderer.device().front_buffer(swap_chain);
		packed.clear();
		for row in 0..HEIGHT {
			packed.extend_from_slice(front.row(row));
		}
		window.present(WIDTH as i32, HEIGHT as i32, &packed);

		let frame_time_ms = now.elapsed().as_secs_f64() * 1000.0;
		if frame_time_ms < FRAME_BUDGET_MS {
			std::thread::sleep(Duration::from_secs_f64((FRAME_BUDGET_MS - frame_time_ms) / 1000.0));
		}
	}

	Ok(())
}

#[cfg(not(windows))]
fn main() {
	eprintln!("the windowed demo binary only runs on Windows (GDI blit); use ppm_main or test_harness instead");
	std::process::exit(1);
}
