// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Structured logging setup for host shells.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured JSON logging.
///
/// Intended to be called once by the embedding shell. Honors
/// `RUST_LOG`-style directives via the default env filter.
pub fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("habitforge=debug".parse().expect("static directive"))
                .add_directive("info".parse().expect("static directive")),
        )
        .with(format)
        .try_init()
        .ok();
}
