use std::sync::Arc;
use std::time::Duration;

use aurora::{ConfigError, Error, Pipeline, RunMode, Stage, StageStatus};
use diagnostics::Severity;
use progress::Outcome;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::fixture::{write, Fixture, TESTBENCH};
use crate::toolchain::{Behavior, RecordingReporter, Report, ScriptedExecutor};

fn pipeline(fixture: &Fixture, executor: &Arc<ScriptedExecutor>) -> Pipeline {
    Pipeline::new(fixture.settings()).with_executor(executor.clone())
}

#[test_log::test(tokio::test)]
async fn cancel_before_start_spawns_nothing() {
    let fixture = Fixture::new("cancel_before_start_spawns_nothing");
    fixture.single_processor("standard");
    let executor = ScriptedExecutor::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let failure = pipeline(&fixture, &executor)
        .run(&fixture.project, RunMode::Processor, &cancel)
        .await
        .unwrap_err();

    assert!(failure.is_canceled());
    assert_eq!(executor.count(), 0);
    for stage in Stage::ALL {
        assert_eq!(failure.report.status(stage), StageStatus::NotRun);
    }
}

#[test_log::test(tokio::test)]
async fn missing_active_processor_is_a_config_error() {
    let fixture = Fixture::new("missing_active_processor_is_a_config_error");
    fixture.processor("cpu", "fir");
    fixture.processor_config(json!({
        "processors": [{ "name": "cpu", "cmmFile": "fir.cmm", "isActive": false }]
    }));
    let executor = ScriptedExecutor::new();
    let reporter = RecordingReporter::new();

    let failure = pipeline(&fixture, &executor)
        .with_reporter(reporter.clone())
        .run(&fixture.project, RunMode::Processor, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        Error::Config(ConfigError::NoActiveProcessor)
    ));
    assert_eq!(executor.count(), 0);
    assert_eq!(
        reporter.lines_with(Severity::Error),
        ["configuration error: no active processor found"]
    );
}

#[test_log::test(tokio::test)]
async fn failing_assembler_stops_before_elaboration() {
    let fixture = Fixture::new("failing_assembler_stops_before_elaboration");
    fixture.single_processor("standard");
    let executor = ScriptedExecutor::new();
    executor.on(
        "asmcomp",
        Behavior::exit(2).print("Erro de sintaxe na linha 3"),
    );
    let reporter = RecordingReporter::new();

    let failure = pipeline(&fixture, &executor)
        .with_reporter(reporter.clone())
        .run(&fixture.project, RunMode::Processor, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        Error::Stage {
            stage: Stage::AssemblyCompile,
            ..
        }
    ));
    assert_eq!(executor.programs(), ["cmmcomp", "appcomp", "asmcomp"]);
    assert_eq!(executor.count_of("iverilog"), 0);

    let report = &failure.report;
    assert_eq!(report.status(Stage::SourceCompile), StageStatus::Succeeded);
    assert_eq!(report.status(Stage::AssemblyCompile), StageStatus::Failed);
    assert_eq!(report.status(Stage::StructuralCompile), StageStatus::NotRun);
    assert_eq!(report.status(Stage::Simulate), StageStatus::NotRun);
    let counts = report.counts(Stage::AssemblyCompile);
    assert_eq!(counts.num_errors(), 1);
    assert_eq!(counts.num_lines(), 1);
    assert!(!report.counts(Stage::SourceCompile).has_error());

    assert_eq!(
        reporter.lines_with(Severity::Error),
        ["Erro de sintaxe na linha 3"]
    );
    let errors: Vec<_> = reporter
        .reports()
        .into_iter()
        .filter(|r| matches!(r, Report::Error(..)))
        .collect();
    assert_eq!(
        errors,
        [Report::Error(
            Stage::AssemblyCompile,
            "assembly-compile failed: asmcomp exited with code 2".to_string()
        )]
    );
}

#[test_log::test(tokio::test)]
async fn processor_mode_runs_every_stage() {
    let fixture = Fixture::new("processor_mode_runs_every_stage");
    fixture.single_processor("standard");
    let temp = fixture.temp().join("cpu");
    let executor = ScriptedExecutor::new();
    executor.on(
        "cmmcomp",
        Behavior::default().print("Sucesso: compilado"),
    );
    executor.on(
        "asmcomp",
        Behavior::default().write(temp.join("fir_tb.v"), TESTBENCH),
    );
    executor.on(
        "vvp",
        Behavior::default()
            .print("VCD info: dumpfile fir_tb.vcd opened for output.")
            .write(temp.join("progress.txt"), "100\n")
            .write_after(Duration::from_millis(30), temp.join("fir_tb.vcd"), ""),
    );
    let reporter = RecordingReporter::new();

    let report = pipeline(&fixture, &executor)
        .with_reporter(reporter.clone())
        .run(&fixture.project, RunMode::Processor, &CancellationToken::new())
        .await
        .unwrap();

    // Simulator output is reported before the run returns.
    assert!(reporter
        .lines_with(Severity::Plain)
        .contains(&"VCD info: dumpfile fir_tb.vcd opened for output.".to_string()));
    assert!(reporter
        .lines_with(Severity::Success)
        .contains(&"vvp exited with code 0".to_string()));

    assert!(report.succeeded());
    assert_eq!(report.compiled, ["cpu"]);
    assert_eq!(
        executor.programs(),
        ["cmmcomp", "appcomp", "asmcomp", "iverilog", "iverilog", "vvp", "gtkwave"]
    );
    assert_eq!(report.progress, Some(Outcome::Completed));
    assert!(!reporter.progress().is_empty());

    let cmmcomp = executor.invocation_of("cmmcomp").unwrap();
    let cpu = fixture.project.join("cpu");
    assert_eq!(
        cmmcomp.args,
        [
            cpu.join("Software").join("fir.cmm").display().to_string(),
            "fir".to_string(),
            cpu.display().to_string(),
            fixture.components.join("Macros").display().to_string(),
            temp.display().to_string(),
            "0".to_string(),
        ]
    );

    let iverilog = executor.invocation_of("iverilog").unwrap();
    let vvp_path = temp.join("fir.vvp").display().to_string();
    assert_eq!(
        iverilog.args[..5],
        ["-g2012", "-s", "fir_tb", "-o", vvp_path.as_str()]
    );
    assert_eq!(iverilog.cwd, Some(fixture.components.join("HDL")));

    // The generated testbench and memory images are staged.
    assert!(cpu.join("Simulation").join("fir_tb.v").exists());
    assert!(temp.join("fir_data.mif").exists());
    assert!(temp.join("fir_inst.mif").exists());
    assert!(temp.join("fix.vcd").exists());
    assert_eq!(
        std::fs::read_to_string(temp.join("tcl_infos.txt")).unwrap(),
        format!(
            "{}\n{}\n",
            temp.display(),
            fixture.components.join("bin").display()
        )
    );

    let vvp = executor.invocation_of("vvp").unwrap();
    let gtkwave = executor.invocation_of("gtkwave").unwrap();
    assert!(gtkwave.at >= vvp.at + Duration::from_millis(30));
    assert_eq!(report.viewer_pid, Some(gtkwave.pid));
    assert_eq!(
        gtkwave.args.last().unwrap(),
        &format!(
            "--script={}",
            fixture.components.join("Scripts").join("gtk_proc_init.tcl").display()
        )
    );
    assert!(gtkwave
        .args
        .contains(&temp.join("fir_tb.vcd").display().to_string()));
}

#[test_log::test(tokio::test)]
async fn explicit_testbench_gets_control_block() {
    let fixture = Fixture::new("explicit_testbench_gets_control_block");
    fixture.single_processor("bench.v");
    let bench = fixture.project.join("cpu").join("Simulation").join("bench.v");
    write(&bench, "module bench;\n  reg clk;\nendmodule\n");
    let temp = fixture.temp().join("cpu");
    let executor = ScriptedExecutor::new();
    executor.on(
        "vvp",
        Behavior::default()
            .write(temp.join("progress.txt"), "100\n")
            .write(temp.join("bench.vcd"), ""),
    );

    let report = pipeline(&fixture, &executor)
        .run(&fixture.project, RunMode::Processor, &CancellationToken::new())
        .await
        .unwrap();
    assert!(report.succeeded());

    let contents = std::fs::read_to_string(&bench).unwrap();
    assert!(contents.contains("$dumpfile(\"bench.vcd\");"));
    assert!(contents.contains("#5000;"));
    assert_eq!(contents.matches("integer progress, chrys;").count(), 1);
    assert!(contents.trim_end().ends_with("endmodule"));

    // Only the generated testbench is copied into the project.
    assert!(!fixture
        .project
        .join("cpu")
        .join("Simulation")
        .join("fir_tb.v")
        .exists());
    let iverilog = executor.invocation_of("iverilog").unwrap();
    assert_eq!(iverilog.args[2], "bench");
}

#[test_log::test(tokio::test)]
async fn cancel_during_simulation_kills_simulator() {
    let fixture = Fixture::new("cancel_during_simulation_kills_simulator");
    fixture.single_processor("standard");
    let temp = fixture.temp().join("cpu");
    let executor = ScriptedExecutor::new();
    executor.on(
        "asmcomp",
        Behavior::default().write(temp.join("fir_tb.v"), TESTBENCH),
    );
    executor.on("vvp", Behavior::hang().write(temp.join("progress.txt"), "30\n"));

    let cancel = CancellationToken::new();
    let watcher = {
        let executor = executor.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            while executor.count_of("vvp") == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        })
    };

    let failure = pipeline(&fixture, &executor)
        .run(&fixture.project, RunMode::Processor, &cancel)
        .await
        .unwrap_err();
    watcher.await.unwrap();

    assert!(failure.is_canceled());
    assert_eq!(failure.report.status(Stage::StructuralCompile), StageStatus::Succeeded);
    assert_eq!(failure.report.status(Stage::Simulate), StageStatus::Canceled);
    assert_eq!(failure.report.progress, Some(Outcome::Stopped));
    let vvp = executor.invocation_of("vvp").unwrap();
    assert_eq!(executor.killed(), [vvp.pid]);
    assert_eq!(executor.count_of("gtkwave"), 0);
}

fn project_fixture(test_name: &str) -> Fixture {
    project_fixture_with_delay(test_name, "150000")
}

fn project_fixture_with_delay(test_name: &str, simu_delay: &str) -> Fixture {
    let fixture = Fixture::new(test_name);
    fixture.processor("cpu", "fir");
    fixture.processor("dsp", "filt");
    fixture.processor_config(json!({
        "processors": [
            { "name": "cpu", "clk": 100, "numClocks": 1000, "cmmFile": "fir.cmm", "isActive": true },
            { "name": "dsp", "clk": 50, "numClocks": 2000, "cmmFile": "filt.cmm" }
        ]
    }));
    let top_level = fixture.project.join("TopLevel");
    write(&top_level.join("soc.v"), "module soc; endmodule\n");
    write(&top_level.join("soc_tb.v"), "module soc_tb;\nendmodule\n");
    write(&top_level.join("input.txt"), "1 2 3\n");
    fixture.project_config(json!({
        "topLevelFile": top_level.join("soc.v"),
        "testbenchFile": top_level.join("soc_tb.v"),
        "gtkwaveFile": "Standard",
        "synthesizableFiles": [
            { "name": "soc.v", "path": top_level.join("soc.v"), "starred": true }
        ],
        "processors": [
            { "type": "cpu", "instance": "u0" },
            { "type": "cpu", "instance": "u1" },
            { "type": "dsp", "instance": "u2" }
        ],
        "iverilogFlags": "-g2012",
        "simuDelay": simu_delay
    }));
    fixture
}

#[test_log::test(tokio::test)]
async fn project_mode_compiles_each_type_once() {
    let fixture = project_fixture("project_mode_compiles_each_type_once");
    let executor = ScriptedExecutor::new();
    executor.on("iverilog", Behavior::exit(1));
    let reporter = RecordingReporter::new();

    let failure = pipeline(&fixture, &executor)
        .with_reporter(reporter.clone())
        .run(&fixture.project, RunMode::Project, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        Error::Stage {
            stage: Stage::StructuralCompile,
            ..
        }
    ));
    assert_eq!(executor.count_of("cmmcomp"), 2);
    assert_eq!(failure.report.compiled, ["cpu", "dsp"]);
    assert!(reporter
        .lines_with(Severity::Info)
        .contains(&"Skipping duplicate processor type: cpu".to_string()));

    let asmcomp = executor.invocation_of("asmcomp").unwrap();
    assert_eq!(asmcomp.args.last().unwrap(), "1");
    assert_eq!(asmcomp.args[5..7], ["100", "1000"]);

    let report = &failure.report;
    assert_eq!(report.status(Stage::AssemblyCompile), StageStatus::Succeeded);
    assert_eq!(report.status(Stage::StructuralCompile), StageStatus::Failed);
    assert_eq!(report.status(Stage::Simulate), StageStatus::NotRun);
    assert_eq!(executor.count_of("vvp"), 0);
}

#[test_log::test(tokio::test)]
async fn project_mode_stages_runtime_files() {
    let fixture = project_fixture("project_mode_stages_runtime_files");
    write(
        &fixture.project.join("cpu").join("Hardware").join("cpu_inst.mif"),
        "",
    );
    let temp = fixture.temp();
    let executor = ScriptedExecutor::new();
    executor.on(
        "vvp",
        Behavior::default()
            .write(temp.join("progress.txt"), "100\n")
            .write(temp.join("soc_tb.vcd"), ""),
    );

    let report = pipeline(&fixture, &executor)
        .run(&fixture.project, RunMode::Project, &CancellationToken::new())
        .await
        .unwrap();
    assert!(report.succeeded());

    let elaboration = executor.invocation_of("iverilog").unwrap();
    assert_eq!(elaboration.cwd, Some(temp.clone()));
    assert_eq!(
        elaboration.args.last().unwrap(),
        &fixture
            .project
            .join("TopLevel")
            .join("soc_tb.v")
            .display()
            .to_string()
    );
    let vvp = executor.invocation_of("vvp").unwrap();
    assert_eq!(vvp.args, [temp.join("project.vvp").display().to_string()]);

    // The testbench copy is instrumented, the original is untouched.
    let copy = std::fs::read_to_string(temp.join("soc_tb.v")).unwrap();
    assert!(copy.contains("#150000;"));
    let original =
        std::fs::read_to_string(fixture.project.join("TopLevel").join("soc_tb.v")).unwrap();
    assert!(!original.contains("chrys"));

    assert!(temp.join("input.txt").exists());
    assert!(temp.join("cpu_inst.mif").exists());
    assert!(temp.join("fix.vcd").exists());
    assert_eq!(
        std::fs::read_to_string(temp.join("tcl_infos.txt")).unwrap(),
        format!(
            "u0 u1 u2\ncpu cpu dsp\n{}\n{}\n{}\n",
            temp.display(),
            fixture.components.join("bin").display(),
            fixture.components.join("Scripts").display()
        )
    );
    let gtkwave = executor.invocation_of("gtkwave").unwrap();
    assert!(gtkwave.args.last().unwrap().ends_with("gtk_proj_init.tcl"));
}

#[test_log::test(tokio::test)]
async fn zero_project_delay_uses_default() {
    let fixture = project_fixture_with_delay("zero_project_delay_uses_default", "0");
    let temp = fixture.temp();
    let executor = ScriptedExecutor::new();
    executor.on(
        "vvp",
        Behavior::default()
            .write(temp.join("progress.txt"), "100\n")
            .write(temp.join("soc_tb.vcd"), ""),
    );

    let report = pipeline(&fixture, &executor)
        .run(&fixture.project, RunMode::Project, &CancellationToken::new())
        .await
        .unwrap();
    assert!(report.succeeded());

    let copy = std::fs::read_to_string(temp.join("soc_tb.v")).unwrap();
    assert!(copy.contains("#200000;"));
    assert!(!copy.contains("#0;"));
}
