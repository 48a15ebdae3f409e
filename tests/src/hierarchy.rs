use aurora::{Error, HierarchyRequest, Pipeline, RunMode};
use exec::fs::LocalFs;
use hierarchy::NodeKind;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::fixture::Fixture;
use crate::toolchain::{Behavior, ScriptedExecutor};

fn netlist() -> String {
    json!({
        "creator": "Yosys 0.38",
        "modules": {
            "fir": {
                "attributes": { "top": "00000000000000000000000000000001", "src": "/p/cpu/Hardware/fir.v:1.1-20.10" },
                "cells": {
                    "p_fir": { "hide_name": 0, "type": "processor", "attributes": {} },
                    "$add$fir.v:12$3": { "hide_name": 1, "type": "$add", "attributes": {} },
                    "$add$fir.v:13$4": { "hide_name": 1, "type": "$add", "attributes": {} }
                }
            },
            "processor": {
                "attributes": { "src": "/c/HDL/processor.v:3.1-90.10" },
                "cells": {
                    "core": { "hide_name": 0, "type": "core", "attributes": {} }
                }
            },
            "core": {
                "attributes": {},
                "cells": {}
            }
        }
    })
    .to_string()
}

#[test_log::test(tokio::test)]
async fn analyzes_processor_hierarchy() {
    let fixture = Fixture::new("analyzes_processor_hierarchy");
    fixture.single_processor("standard");
    let json_path = fixture.temp().join("cpu").join("hierarchy.json");
    let executor = ScriptedExecutor::new();
    executor.on("yosys", Behavior::default().write(&json_path, netlist()));
    let pipeline = Pipeline::new(fixture.settings()).with_executor(executor.clone());

    let request =
        HierarchyRequest::resolve(&pipeline, &LocalFs, &fixture.project, RunMode::Processor)
            .unwrap();
    assert_eq!(request.json_path, json_path);
    let tree = request
        .analyze(&pipeline, &CancellationToken::new())
        .await
        .unwrap();

    let yosys = executor.invocation_of("yosys").unwrap();
    assert_eq!(yosys.args[0], "-s");
    let script = std::fs::read_to_string(&yosys.args[1]).unwrap();
    assert!(script.contains("hierarchy -top fir"));

    assert_eq!(tree.root.kind, NodeKind::Top);
    assert_eq!(tree.root.label, "fir");
    let numbers: Vec<_> = tree
        .walk()
        .into_iter()
        .filter_map(|(_, node)| node.number.clone())
        .collect();
    assert_eq!(numbers, ["1", "1.1", "2"]);
    assert_eq!(tree.get("1").unwrap().label, "p_fir (processor)");
    assert_eq!(tree.get("1.1").unwrap().label, "core");
    let adders = tree.get("2").unwrap();
    assert_eq!(adders.kind, NodeKind::Primitive);
    assert_eq!(adders.count, 2);
}

#[test_log::test(tokio::test)]
async fn failed_synthesis_is_a_hierarchy_error() {
    let fixture = Fixture::new("failed_synthesis_is_a_hierarchy_error");
    fixture.single_processor("standard");
    let executor = ScriptedExecutor::new();
    executor.on("yosys", Behavior::exit(1).print("ERROR: syntax error"));
    let pipeline = Pipeline::new(fixture.settings()).with_executor(executor.clone());

    let request =
        HierarchyRequest::resolve(&pipeline, &LocalFs, &fixture.project, RunMode::Processor)
            .unwrap();
    let err = request
        .analyze(&pipeline, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Hierarchy(yosys::error::Error::ToolFailed { code: 1, .. })
    ));
}
