use test_log::test;

use crate::*;

const CPU_JSON: &str = r#"{
  "creator": "Yosys 0.38",
  "modules": {
    "cpu": {
      "attributes": { "top": "00000000000000000000000000000001", "src": "/p/cpu.v:1.1-30.10" },
      "ports": { "clk": { "direction": "input", "bits": [ 2 ] } },
      "cells": {
        "\\u_dec": { "hide_name": 0, "type": "instr_dec", "attributes": {} },
        "\\u_alu": { "hide_name": 0, "type": "$paramod\\alu\\WIDTH=8", "attributes": {} },
        "$and$/p/cpu.v:12$3": { "hide_name": 1, "type": "$and" },
        "$and$/p/cpu.v:13$4": { "hide_name": 1, "type": "$and" },
        "\\u_ram": { "hide_name": 0, "type": "ram_cell" }
      },
      "netnames": {}
    },
    "$paramod\\alu\\WIDTH=8": {
      "attributes": { "src": "/p/alu.v:1.1-9.10" },
      "cells": { "$add$/p/alu.v:5$1": { "hide_name": 1, "type": "$add" } }
    },
    "instr_dec": { "attributes": {}, "cells": {} },
    "ram_cell": { "attributes": { "blackbox": "00000000000000000000000000000001" }, "cells": {} }
  }
}"#;

fn module(name: &str, children: &[(&str, &str)]) -> String {
    let cells: Vec<String> = children
        .iter()
        .map(|(inst, ty)| format!(r#""{inst}": {{ "type": "{ty}" }}"#))
        .collect();
    format!(r#""{name}": {{ "cells": {{ {} }} }}"#, cells.join(", "))
}

fn netlist(modules: &[String]) -> String {
    format!(r#"{{ "modules": {{ {} }} }}"#, modules.join(", "))
}

#[test]
fn clean_yosys_names() {
    let cleaner = YosysNameCleaner;
    assert_eq!(cleaner.clean("\\u_core"), "u_core");
    assert_eq!(cleaner.clean("$paramod\\alu\\WIDTH=8"), "alu");
    assert_eq!(
        cleaner.clean("$paramod$8a1f2b3c4d5e6f708192a3b4c5d6e7f8091a2b3c\\fifo"),
        "fifo"
    );
    assert_eq!(cleaner.clean("$and$/home/u/rtl/cpu.v:12$34"), "and");
    assert_eq!(cleaner.clean("$and$C:\\Users\\u\\cpu.v:12$34"), "and");
    assert_eq!(cleaner.clean("$_DFF_P_"), "_DFF_P_");
    assert_eq!(cleaner.clean("$12$lut"), "lut");
    assert_eq!(cleaner.clean("core\\DEPTH=16"), "core");
    assert_eq!(cleaner.clean("plain"), "plain");
    assert_eq!(cleaner.clean("$$"), "unknown");
}

#[test]
fn parse_source_locations() {
    let loc = SourceLocation::parse("/p/cpu.v:12.3-40.9").unwrap();
    assert_eq!(loc.file, "/p/cpu.v");
    assert_eq!(loc.line, 12);
    assert_eq!(SourceLocation::parse("rtl/top.sv:7.1").unwrap().line, 7);
    assert!(SourceLocation::parse("no location").is_none());
}

#[test]
fn malformed_json_is_a_parse_error() {
    let err = Design::from_json("{ \"modules\": [").unwrap_err();
    assert!(matches!(err, error::Error::Parse(_)));
}

#[test]
fn groups_instances_by_type() {
    let design = Design::from_json(CPU_JSON).unwrap();
    let cpu = design.module("cpu").unwrap();
    let groups: Vec<_> = cpu
        .groups
        .iter()
        .map(|g| (g.name.as_str(), g.kind, g.instances.len()))
        .collect();
    assert_eq!(
        groups,
        [
            ("alu", CellKind::Module, 1),
            ("instr_dec", CellKind::Module, 1),
            ("and", CellKind::Primitive, 2),
            ("ram_cell", CellKind::Primitive, 1),
        ]
    );
    assert_eq!(design.display_name("$paramod\\alu\\WIDTH=8"), Some("alu"));
    assert_eq!(design.find_module("alu").unwrap().raw, "$paramod\\alu\\WIDTH=8");
}

#[test]
fn renders_numbered_tree() {
    let design = Design::from_json(CPU_JSON).unwrap();
    let tree = design.tree("cpu").unwrap();

    assert_eq!(tree.root.number, None);
    assert_eq!(tree.root.kind, NodeKind::Top);
    assert_eq!(tree.root.source.as_ref().unwrap().line, 1);

    let alu = tree.get("1").unwrap();
    assert_eq!(alu.label, "u_alu (alu)");
    assert_eq!(alu.source.as_ref().unwrap().file, "/p/alu.v");
    assert_eq!(tree.get("1.1").unwrap().label, "add");
    assert_eq!(tree.get("2").unwrap().label, "u_dec (instr_dec)");
    let and = tree.get("3").unwrap();
    assert_eq!(and.kind, NodeKind::Primitive);
    assert_eq!(and.count, 2);
    assert!(and.children.is_empty());
    assert_eq!(tree.get("4").unwrap().kind, NodeKind::Primitive);
    assert!(tree.get("5").is_none());

    let text = tree.to_string();
    assert_eq!(
        text,
        "cpu  [/p/cpu.v:1]\n  1 u_alu (alu)  [/p/alu.v:1]\n    1.1 add\n  2 u_dec (instr_dec)\n  3 and x2\n  4 ram_cell\n"
    );
}

#[test]
fn label_omits_type_when_equal_to_instance() {
    let json = netlist(&[module("top", &[("\\\\core", "core")]), module("core", &[])]);
    let tree = Design::from_json(&json).unwrap().tree("top").unwrap();
    assert_eq!(tree.get("1").unwrap().label, "core");
}

#[test]
fn missing_top_is_an_error() {
    let design = Design::from_json(CPU_JSON).unwrap();
    assert!(matches!(
        design.tree("gpu"),
        Err(error::Error::TopNotFound(name)) if name == "gpu"
    ));
}

#[test]
fn circular_modules_terminate() {
    let json = netlist(&[
        module("a", &[("u_b", "b"), ("u_self", "a")]),
        module("b", &[("u_a", "a")]),
    ]);
    let tree = Design::from_json(&json).unwrap().tree("a").unwrap();

    let self_ref = tree.get("1").unwrap();
    assert_eq!(self_ref.label, "u_self (a)");
    assert!(self_ref.recursive);
    assert!(self_ref.children.is_empty());

    assert_eq!(tree.get("2").unwrap().label, "u_b (b)");
    let back_edge = tree.get("2.1").unwrap();
    assert_eq!(back_edge.label, "u_a (a)");
    assert!(back_edge.recursive);
    assert_eq!(tree.walk().len(), 4);
}

#[test]
fn deep_chains_stop_at_depth_ceiling() {
    let modules: Vec<String> = (0..30)
        .map(|i| {
            if i == 29 {
                module(&format!("m{i}"), &[])
            } else {
                module(&format!("m{i}"), &[("u", format!("m{}", i + 1).as_str())])
            }
        })
        .collect();
    let tree = Design::from_json(&netlist(&modules)).unwrap().tree("m0").unwrap();

    let nodes = tree.walk();
    let (depth, deepest) = nodes.last().unwrap();
    assert_eq!(*depth, MAX_DEPTH);
    assert!(deepest.truncated);
    assert!(deepest.children.is_empty());
    assert!(nodes.iter().all(|(_, n)| !n.recursive));
}
