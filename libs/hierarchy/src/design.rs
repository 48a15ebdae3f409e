use std::collections::HashMap;

use arcstr::ArcStr;
use indexmap::IndexMap;

use crate::clean::{NameCleaner, YosysNameCleaner};
use crate::error::{Error, Result};
use crate::netlist::{Netlist, SourceLocation};
use crate::tree::Tree;

/// Whether a cell type is one of the design's own modules.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum CellKind {
    /// A module declared in the netlist.
    Module,
    /// A synthesis primitive, library cell or black box.
    Primitive,
}

/// All instances of one cell type inside a module.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InstanceGroup {
    /// The raw cell type.
    pub cell_type: ArcStr,
    /// The display name of the cell type.
    pub name: ArcStr,
    pub kind: CellKind,
    /// Display names of the instances, sorted.
    pub instances: Vec<ArcStr>,
}

/// A module and its instances grouped by type.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ModuleDef {
    pub raw: ArcStr,
    pub name: ArcStr,
    pub source: Option<SourceLocation>,
    /// Module groups first, then primitive groups, each ordered by display name.
    pub groups: Vec<InstanceGroup>,
}

/// The module graph of a synthesized design.
#[derive(Debug, Clone, Default)]
pub struct Design {
    modules: IndexMap<ArcStr, ModuleDef>,
    names: HashMap<ArcStr, ArcStr>,
}

impl Design {
    /// Builds the module graph of `netlist`, naming things with `cleaner`.
    pub fn new(netlist: &Netlist, cleaner: &dyn NameCleaner) -> Self {
        let mut names: HashMap<ArcStr, ArcStr> = HashMap::new();
        let mut display = |raw: &str| -> ArcStr {
            if let Some(name) = names.get(raw) {
                return name.clone();
            }
            let name = ArcStr::from(cleaner.clean(raw));
            names.insert(ArcStr::from(raw), name.clone());
            name
        };

        let mut modules = IndexMap::with_capacity(netlist.modules.len());
        for (raw, module) in netlist.modules.iter() {
            let mut groups: IndexMap<&str, InstanceGroup> = IndexMap::new();
            for (instance, cell) in module.cells.iter() {
                let ty = cell.cell_type.as_str();
                let kind = match netlist.modules.get(ty) {
                    Some(def) if !def.is_blackbox() => CellKind::Module,
                    _ => CellKind::Primitive,
                };
                let instance = display(instance);
                let group = groups.entry(ty).or_insert_with(|| InstanceGroup {
                    cell_type: ArcStr::from(ty),
                    name: display(ty),
                    kind,
                    instances: Vec::new(),
                });
                group.instances.push(instance);
            }

            let mut groups: Vec<_> = groups.into_values().collect();
            for group in groups.iter_mut() {
                group.instances.sort();
            }
            groups.sort_by(|a, b| {
                (a.kind, &a.name, &a.cell_type).cmp(&(b.kind, &b.name, &b.cell_type))
            });

            let raw = ArcStr::from(raw.as_str());
            modules.insert(
                raw.clone(),
                ModuleDef {
                    name: display(&raw),
                    raw,
                    source: module.source(),
                    groups,
                },
            );
        }

        tracing::debug!(
            modules = modules.len(),
            names = names.len(),
            "built module graph"
        );
        Self { modules, names }
    }

    /// Parses Yosys JSON and builds its module graph with [`YosysNameCleaner`].
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(&Netlist::from_json(json)?, &YosysNameCleaner))
    }

    /// Iterates over all modules in netlist order.
    pub fn modules(&self) -> impl Iterator<Item = &ModuleDef> {
        self.modules.values()
    }

    /// Looks up a module by raw name.
    pub fn module(&self, raw: &str) -> Option<&ModuleDef> {
        self.modules.get(raw)
    }

    /// Looks up a module by raw name, falling back to its display name.
    pub fn find_module(&self, name: &str) -> Option<&ModuleDef> {
        self.modules
            .get(name)
            .or_else(|| self.modules.values().find(|m| m.name == name))
    }

    /// The display name recorded for a raw identifier.
    pub fn display_name(&self, raw: &str) -> Option<&str> {
        self.names.get(raw).map(|s| s.as_str())
    }

    /// Renders the hierarchy below `top`.
    pub fn tree(&self, top: &str) -> Result<Tree> {
        let top = self
            .find_module(top)
            .ok_or_else(|| Error::TopNotFound(top.to_string()))?;
        Ok(Tree::build(self, top))
    }
}
