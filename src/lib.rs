//! Shared glue for the three binaries: the crate-wide error type and a
//! minimal stderr logger, since there is no egui console panel here to
//! route log records to.

pub mod demo_scene;

pub use error::Error;

struct StderrLog;

impl log::Log for StderrLog {
	fn enabled(&self, metadata: &log::Metadata) -> bool {
		metadata.level() <= log::Level::Debug
	}

	fn log(&self, record: &log::Record) {
		if self.enabled(record.metadata()) {
			eprintln!("{}: {}", record.level(), record.args());
		}
	}

	fn flush(&self) {}
}

static LOGGER: StderrLog = StderrLog;

/// Installs the stderr logger. Safe to call more than once; later calls
/// are no-ops.
pub fn install_logger() {
	let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(log::LevelFilter::Debug));
}
