//! The crate-wide error type: a single carrier for precondition failures,
//! resource-exhaustion failures, and external-collaborator failures (window
//! creation, image decode), so every layer of the renderer can propagate
//! with `?` instead of inventing its own enum.

pub struct Error {
	pub error: String,
}

impl Error {
	pub fn new(message: impl Into<String>) -> Self {
		Self { error: message.into() }
	}
}

impl std::fmt::Debug for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.error)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.error)
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Error {
		Error { error: err.to_string() }
	}
}

#[cfg(windows)]
impl From<windows::core::Error> for Error {
	fn from(err: windows::core::Error) -> Error {
		Error { error: err.message().to_string_lossy() }
	}
}
