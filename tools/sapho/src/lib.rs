//! SAPHO processor toolchain plugin.
//!
//! The processor flow compiles C-like `.cmm` sources to assembly with
//! `cmmcomp`, preprocesses the assembly with `appcomp`, and turns it into a
//! processor instance (Verilog plus memory images) with `asmcomp`. All three
//! take positional arguments in a fixed order.

pub mod asm;
pub mod cmm;

pub use asm::{AssemblyCompile, AssemblyPreprocess};
pub use cmm::SourceCompile;

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}
