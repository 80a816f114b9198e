// /////////////////////////////////////////////////////////////////////////////
// lexpipe
// Copyright (c) 2025 the lexpipe contributors
// SPDX-License-Identifier: MIT
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Structured logging setup via `tracing-subscriber`. Log level is derived
//! from `RUST_LOG` when set, falling back to `info` (or `debug` when
//! `--verbose` is passed).

use tracing_subscriber::{fmt, EnvFilter};

/// Initializes the global `tracing` subscriber. Safe to call once per
/// process; a second call is a no-op (the underlying `set_global_default`
/// error is swallowed).
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
