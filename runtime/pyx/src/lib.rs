//! Pyx - a host simulator for script objects.
//!
//! Plays the part of the patching environment: objects are created and
//! freed by a line-oriented patch script, their outlets and console print
//! to a [`Transcript`], and `sched` runs against a simulated [`Clock`].

mod host;
mod simulator;

pub use host::{Clock, ConsoleSink, EnvHome, Objects, ScriptDirFiles, Transcript};
pub use simulator::{ScriptError, Simulator};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber. Does nothing unless `RUST_LOG` is set.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(tracing_tree::HierarchicalLayer::new(2).with_targets(true))
                .with(filter)
                .init();
        }
    });
}
