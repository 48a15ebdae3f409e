//! Serde model of the JSON netlists written by `yosys write_json`.
//!
//! Only the parts needed to build hierarchies are modeled; ports, nets and
//! connections are ignored.

use arcstr::ArcStr;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

lazy_static! {
    static ref SRC_ATTR: Regex =
        Regex::new(r"^(.+\.s?v):(\d+)(?:\.\d+)?(?:-\d+(?:\.\d+)?)?$").unwrap();
}

/// A parsed Yosys netlist.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Netlist {
    /// The tool that wrote the netlist.
    #[serde(default)]
    pub creator: String,
    /// Modules keyed by raw module name, in file order.
    #[serde(default)]
    pub modules: IndexMap<String, Module>,
}

/// A module declaration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    #[serde(default)]
    pub attributes: IndexMap<String, serde_json::Value>,
    /// Cell instances keyed by raw instance name.
    #[serde(default)]
    pub cells: IndexMap<String, Cell>,
}

/// A cell instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub hide_name: u8,
    /// The raw type name, possibly mangled.
    #[serde(rename = "type")]
    pub cell_type: String,
    #[serde(default)]
    pub attributes: IndexMap<String, serde_json::Value>,
}

/// Where a module was declared.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: ArcStr,
    pub line: u32,
}

impl Netlist {
    /// Parses a netlist from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parses a netlist from JSON bytes.
    pub fn from_slice(json: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(json)?)
    }
}

impl Module {
    /// Returns `true` if the module is a black box (a library cell with no body).
    pub fn is_blackbox(&self) -> bool {
        self.attributes.get("blackbox").is_some_and(attr_is_set)
    }

    /// Returns the declaration site recorded in the `src` attribute.
    pub fn source(&self) -> Option<SourceLocation> {
        let src = self.attributes.get("src")?.as_str()?;
        // Modules merged from several files list every site, separated by `|`.
        let first = src.split('|').next()?;
        SourceLocation::parse(first)
    }
}

impl SourceLocation {
    /// Parses a Yosys source annotation such as `rtl/core.v:12.3-40.9`.
    pub fn parse(src: &str) -> Option<Self> {
        let caps = SRC_ATTR.captures(src.trim())?;
        Some(Self {
            file: ArcStr::from(&caps[1]),
            line: caps[2].parse().ok()?,
        })
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Yosys writes boolean attributes as integers or as strings of binary digits.
fn attr_is_set(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Number(n) => n.as_u64().is_some_and(|n| n != 0),
        serde_json::Value::String(s) => s.chars().any(|c| c == '1'),
        serde_json::Value::Bool(b) => *b,
        _ => false,
    }
}
