//! Aurora integration tests.

pub mod fixture;
pub mod paths;
pub mod toolchain;

#[cfg(test)]
mod hierarchy;
#[cfg(test)]
mod pipeline;
