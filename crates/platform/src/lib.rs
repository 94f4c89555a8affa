//! Minimal window + input layer: one native window good for blitting a
//! 24-bit top-down framebuffer to, and polling keyboard/mouse events.
//!
//! Not a general-purpose windowing toolkit — there is exactly one backend
//! (`win32`) and one thing a [`Window`] needs to do beyond the usual
//! position/size/focus plumbing: [`Window::present`] the finished frame.

#[cfg(windows)]
pub mod win32;

#[cfg(windows)]
pub use win32 as platform;

#[derive(Clone, Copy)]
pub struct Rect<T> {
	pub x: T,
	pub y: T,
	pub width: T,
	pub height: T,
}

#[derive(Clone, Copy)]
pub struct Point<T> {
	pub x: T,
	pub y: T,
}

pub type Size<T> = Point<T>;

#[derive(Clone, Copy)]
pub enum MouseButton {
	Left,
	Middle,
	Right,
}

#[derive(Clone, Copy)]
pub enum Key {
	A, B, C, D, E, F, G, H, I, J, K, L, M,
	N, O, P, Q, R, S, T, U, V, W, X, Y, Z,

	ArrowLeft,
	ArrowRight,
	ArrowUp,
	ArrowDown,

	Escape,
	Tab,
	Backspace,
	Enter,
	Space,

	Insert,
	Delete,
	Home,
	End,
	PageUp,
	PageDown,

	Minus,
	Plus,

	Num0, Num1, Num2, Num3, Num4,
	Num5, Num6, Num7, Num8, Num9,

	F1, F2, F3, F4, F5, F6, F7, F8, F9, F10,
	F11, F12, F13, F14, F15, F16, F17, F18, F19, F20,
}

#[derive(Clone, Copy)]
pub enum Event {
	Key { key: Key, pressed: bool },
	Text { character: char },
	MouseButton { button: MouseButton, pressed: bool },
	MouseWheel { delta: [f32; 2] },
}

#[derive(Clone, Copy)]
pub struct WindowDesc {
	pub title: String,
	pub rect: Rect<i32>,
}

pub struct NativeHandle(pub u64);

pub trait App {
	type Window: Window;

	/// Creates a new app instance.
	fn new() -> Self;

	/// Creates a new window.
	fn create_window(&mut self, desc: &WindowDesc) -> Self::Window;

	/// Should be called every frame to update app and window state.
	/// Returns false when the app is requested to close.
	fn run(&mut self) -> bool;

	/// Returns the events that have occurred since the last call to [`App::run`].
	fn events(&self) -> Vec<Event>;

	/// Returns the mouse position relative to the top-left corner of the desktop.
	fn mouse_pos(&self) -> Point<i32>;
}

pub trait Window {
	fn title(&self) -> String;
	fn set_title(&self, title: &str);

	/// Returns the size of the window's client area.
	fn size(&self) -> Size<u32>;

	fn is_focused(&self) -> bool;

	/// Returns the platform native handle for the window.
	fn native_handle(&self) -> NativeHandle;

	/// Blits a top-down, 24-bit BGR framebuffer of `width` by `height`
	/// pixels (row length `width * 3` bytes, unpadded) into the window's
	/// client area.
	fn present(&self, width: i32, height: i32, bgr_data: &[u8]);
}
