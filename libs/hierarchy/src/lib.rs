//! Module/instance hierarchies of synthesized designs.
//!
//! A Yosys JSON netlist is parsed into a [`Netlist`], turned into a
//! [`Design`] (modules with instances grouped by type, names cleaned by a
//! [`NameCleaner`]), and rendered into a numbered [`Tree`] from a chosen top
//! module. Traversal is depth-bounded and stops at modules already on the
//! current path, so circular netlists terminate.

pub mod clean;
pub mod design;
pub mod error;
pub mod netlist;
pub mod tree;

#[cfg(test)]
mod tests;

pub use clean::{NameCleaner, YosysNameCleaner};
pub use design::{CellKind, Design, InstanceGroup, ModuleDef};
pub use netlist::{Netlist, SourceLocation};
pub use tree::{NodeKind, Tree, TreeNode, MAX_DEPTH};
