use std::collections::HashSet;
use std::fmt::{Display, Write};

use arcstr::ArcStr;

use crate::design::{CellKind, Design, InstanceGroup, ModuleDef};
use crate::netlist::SourceLocation;

/// Nodes deeper than this are not expanded.
pub const MAX_DEPTH: usize = 15;

/// The kind of a tree node.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum NodeKind {
    Top,
    Module,
    Primitive,
}

/// A node of a rendered hierarchy.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct TreeNode {
    /// Dotted position such as `1.2`; `None` for the top module.
    pub number: Option<String>,
    pub label: String,
    pub kind: NodeKind,
    /// Display name of the module or primitive type.
    pub type_name: ArcStr,
    /// Number of instances represented; above one only for primitive groups.
    pub count: usize,
    pub source: Option<SourceLocation>,
    /// The module already appears on the path from the top.
    pub recursive: bool,
    /// Expansion stopped at [`MAX_DEPTH`].
    pub truncated: bool,
    pub children: Vec<TreeNode>,
}

/// A numbered module/instance hierarchy.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Tree {
    pub root: TreeNode,
}

impl Tree {
    pub(crate) fn build(design: &Design, top: &ModuleDef) -> Self {
        let mut path = HashSet::new();
        path.insert(top.raw.clone());
        let children = expand(design, top, None, 0, &mut path);
        Self {
            root: TreeNode {
                number: None,
                label: top.name.to_string(),
                kind: NodeKind::Top,
                type_name: top.name.clone(),
                count: 1,
                source: top.source.clone(),
                recursive: false,
                truncated: false,
                children,
            },
        }
    }

    /// Visits every node depth-first together with its depth.
    pub fn walk(&self) -> Vec<(usize, &TreeNode)> {
        fn visit<'a>(node: &'a TreeNode, depth: usize, out: &mut Vec<(usize, &'a TreeNode)>) {
            out.push((depth, node));
            for child in node.children.iter() {
                visit(child, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.root, 0, &mut out);
        out
    }

    /// Finds a node by its dotted number.
    pub fn get(&self, number: &str) -> Option<&TreeNode> {
        self.walk()
            .into_iter()
            .map(|(_, node)| node)
            .find(|node| node.number.as_deref() == Some(number))
    }
}

fn expand(
    design: &Design,
    module: &ModuleDef,
    prefix: Option<&str>,
    depth: usize,
    path: &mut HashSet<ArcStr>,
) -> Vec<TreeNode> {
    let mut children = Vec::new();
    let mut index = 0;
    let mut next_number = || {
        index += 1;
        match prefix {
            Some(prefix) => format!("{prefix}.{index}"),
            None => index.to_string(),
        }
    };

    for group in module.groups.iter() {
        match group.kind {
            CellKind::Module => {
                let Some(def) = design.module(&group.cell_type) else {
                    continue;
                };
                for instance in group.instances.iter() {
                    let mut node = module_node(next_number(), instance, def);
                    if path.contains(&def.raw) {
                        node.recursive = true;
                    } else if depth + 1 >= MAX_DEPTH {
                        node.truncated = true;
                    } else {
                        path.insert(def.raw.clone());
                        node.children = expand(design, def, node.number.as_deref(), depth + 1, path);
                        path.remove(&def.raw);
                    }
                    children.push(node);
                }
            }
            CellKind::Primitive => children.push(primitive_node(next_number(), group)),
        }
    }
    children
}

fn module_node(number: String, instance: &ArcStr, def: &ModuleDef) -> TreeNode {
    let label = if *instance == def.name {
        instance.to_string()
    } else {
        format!("{instance} ({})", def.name)
    };
    TreeNode {
        number: Some(number),
        label,
        kind: NodeKind::Module,
        type_name: def.name.clone(),
        count: 1,
        source: def.source.clone(),
        recursive: false,
        truncated: false,
        children: Vec::new(),
    }
}

fn primitive_node(number: String, group: &InstanceGroup) -> TreeNode {
    let count = group.instances.len();
    let label = if count > 1 {
        format!("{} x{count}", group.name)
    } else {
        group.name.to_string()
    };
    TreeNode {
        number: Some(number),
        label,
        kind: NodeKind::Primitive,
        type_name: group.name.clone(),
        count,
        source: None,
        recursive: false,
        truncated: false,
        children: Vec::new(),
    }
}

impl Display for Tree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (depth, node) in self.walk() {
            let mut line = "  ".repeat(depth);
            if let Some(number) = &node.number {
                write!(line, "{number} ")?;
            }
            line.push_str(&node.label);
            if let Some(source) = &node.source {
                write!(line, "  [{source}]")?;
            }
            if node.recursive {
                line.push_str("  [recursive]");
            }
            if node.truncated {
                line.push_str("  [truncated]");
            }
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}
