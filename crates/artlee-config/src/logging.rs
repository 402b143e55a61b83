// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use tracing_subscriber::EnvFilter;

use crate::runtime::{LogFormat, LoggingConfig};

/// Install the global fmt subscriber. `RUST_LOG` overrides the configured
/// level. Calling this more than once is harmless.
pub fn init_logging(config: &LoggingConfig) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
	let builder = tracing_subscriber::fmt().with_env_filter(filter);

	let result = match config.format {
		LogFormat::Pretty => builder.pretty().try_init(),
		LogFormat::Compact => builder.compact().try_init(),
		LogFormat::Json => builder.json().try_init(),
	};

	if result.is_err() {
		tracing::debug!("global subscriber already installed");
	}
}
