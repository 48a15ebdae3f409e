//! Hierarchy errors.

use thiserror::Error as ThisError;

/// The result type returned by hierarchy functions.
pub type Result<T> = std::result::Result<T, Error>;

/// Possible hierarchy errors.
#[derive(ThisError, Debug)]
pub enum Error {
    /// The netlist is not valid Yosys JSON.
    #[error("malformed netlist json")]
    Parse(#[from] serde_json::Error),
    /// The requested top module is not declared in the netlist.
    #[error("top module `{0}` not found in netlist")]
    TopNotFound(String),
}
