use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Filter directive for a verbosity level.
pub fn filter_for(verbosity: u8) -> &'static str {
	// 0 = errors only, with RPC noise off
	// 1 (-v) = connection progress, login warnings
	// 2+ (-vv) = every login phase and RPC call
	match verbosity {
		0 => "error,ctrl.rpc=off",
		1 => "info,ctrl.login=warn,ctrl.rpc=off",
		_ => "debug",
	}
}

/// Installs a stderr subscriber for binaries built on this crate.
///
/// `RUST_LOG` overrides the verbosity. Calling this twice is harmless.
pub fn init_logging(verbosity: u8) {
	let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_for(verbosity)));

	let stderr = std::io::stderr.with_max_level(tracing::Level::TRACE);

	let _ = tracing_subscriber::fmt()
		.with_env_filter(env_filter)
		.with_writer(stderr)
		.with_target(true)
		.with_level(true)
		.compact()
		.try_init();
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn verbosity_filters_parse() {
		for level in 0..=3 {
			assert!(EnvFilter::try_new(filter_for(level)).is_ok(), "level {level}");
		}
	}
}
