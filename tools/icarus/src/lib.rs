//! Icarus Verilog and GTKWave plugin.
//!
//! Builds `iverilog`, `vvp` and `gtkwave` invocations, instruments
//! testbenches so they dump a trace and report progress, and launches the
//! simulator and waveform viewer as a cooperating pair.

use lazy_static::lazy_static;
use tera::Tera;

pub mod commands;
pub mod error;
pub mod launch;
pub mod testbench;

pub use commands::{Elaboration, GtkWave, Vvp};
pub use launch::{
    LaunchEvent, LaunchEventKind, LaunchMode, Launched, ParallelSimulationLauncher,
    SimulationLaunch, Source,
};
pub use testbench::{Injection, SimControl, TestbenchInjector, DEFAULT_DELAY};

pub const TEMPLATES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        match Tera::new(&format!("{TEMPLATES_PATH}/*")) {
            Ok(t) => t,
            Err(e) => {
                panic!("Encountered errors while parsing Tera templates: {e}");
            }
        }
    };
}
