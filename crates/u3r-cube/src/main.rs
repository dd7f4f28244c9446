//! Spinning cube demo for the u3r engine.
//!
//! Opens a window, builds the reference cube and orbits the camera around it.
//! Set `RUST_LOG` to change verbosity.

mod clock;
mod gpu;
mod runtime;
mod scene;

use anyhow::Result;
use u3r_engine::logging::{LoggingConfig, init_logging};

use crate::gpu::GpuInit;
use crate::runtime::{Runtime, RuntimeConfig};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());
    Runtime::run(RuntimeConfig::default(), GpuInit::default())
}
