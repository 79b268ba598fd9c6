//! Portable Kitten middle-end driver.
//!
//! Takes a class table and the typed bodies of its signatures, and runs the
//! middle-end over them: every body is lowered into one block arena, the
//! whole program is cleaned up from its entry point, and the result is
//! checked and handed back in emission order.
//!
//! # Usage
//!
//! ```ignore
//! use kit_compiler::{compile, CompileConfig};
//!
//! let compiled = compile(&table, &bodies, main, &CompileConfig::default())?;
//! for sig in &compiled.order {
//!     encode(sig, compiled.program.code(*sig));
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! kit_types → kit_cfg → kit_lower
//!                  ↓        ↓
//!                kit_compiler  ← this crate
//! ```

mod error;
mod output;
mod pipeline;

pub use error::CompileError;
pub use output::{Compiled, TestPlan};
pub use pipeline::{compile, CompileConfig};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Does nothing unless `RUST_LOG` is set, e.g.
/// `RUST_LOG=kit_cfg=debug` for pass summaries or `RUST_LOG=kit_cfg=trace`
/// for every graph edit.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
