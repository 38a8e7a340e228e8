//! CLI integration tests for the `run`, `models` and `check-script` commands.
//!
//! Tests cover:
//! - Config file plus flag overrides (resolve_run_config)
//! - The load/run/script/export/chart pipeline on real files (run_pipeline)
//! - Exit codes of the full command for each error category

mod common;

use clap::Parser;
use common::*;
use periodsim::adapters::file_config_adapter::FileConfigAdapter;
use periodsim::cli::{self, Cli, RunOptions};
use periodsim::domain::chart::ChartKind;
use periodsim::domain::config_validation::{ChartSettings, RunConfig};
use periodsim::domain::error::SimError;
use periodsim::domain::export::parse_delimited_text;
use periodsim::domain::schema::ModelKind;
use periodsim::ports::log_port::NullLog;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tempfile::TempDir;

// ExitCode has no PartialEq; compare the Debug rendering.
fn assert_exit(actual: ExitCode, expected: u8) {
    assert_eq!(
        format!("{actual:?}"),
        format!("{:?}", ExitCode::from(expected)),
        "expected exit code {expected}"
    );
}

fn run_args(args: &[&str]) -> ExitCode {
    let mut argv = vec!["periodsim"];
    argv.extend_from_slice(args);
    cli::run(Cli::try_parse_from(argv).unwrap())
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn growth_config(data: &Path) -> RunConfig {
    RunConfig {
        model: ModelKind::Growth,
        data_path: data.to_path_buf(),
        scripts: Vec::new(),
        export_path: None,
        chart: None,
        log_filter: None,
        show_history: false,
    }
}

mod config_loading {
    use super::*;

    #[test]
    fn file_values_are_read_and_flags_override() {
        let ini = write_temp_file(
            "[model]\nkind = savings\n[data]\npath = file.txt\n[export]\noutput = file.tsv\n\
             [chart]\nkind = line\noutput = chart.svg\n",
        );
        let mut adapter = cli::load_config(ini.path()).unwrap();
        let options = RunOptions {
            data: Some(PathBuf::from("flag.txt")),
            chart: Some("area".into()),
            ..Default::default()
        };
        let config = cli::resolve_run_config(&mut adapter, &options).unwrap();

        assert_eq!(config.model, ModelKind::Savings);
        assert_eq!(config.data_path, PathBuf::from("flag.txt"));
        assert_eq!(config.export_path, Some(PathBuf::from("file.tsv")));
        assert_eq!(
            config.chart,
            Some(ChartSettings {
                kind: ChartKind::Area,
                output: PathBuf::from("chart.svg"),
            })
        );
    }

    #[test]
    fn invalid_chart_flag_is_rejected() {
        let mut adapter = FileConfigAdapter::empty();
        let options = RunOptions {
            model: Some("growth".into()),
            data: Some(PathBuf::from("d.txt")),
            chart: Some("pie".into()),
            chart_output: Some(PathBuf::from("c.svg")),
            ..Default::default()
        };
        let err = cli::resolve_run_config(&mut adapter, &options).unwrap_err();
        assert!(matches!(err, SimError::ConfigInvalid { .. }));
    }

    #[test]
    fn missing_config_file_is_a_config_error() {
        let code = cli::load_config(Path::new("/nonexistent/periodsim.ini")).unwrap_err();
        assert_exit(code, 2);
    }
}

mod pipeline {
    use super::*;

    #[test]
    fn writes_export_and_runs_scripts_in_order() {
        let dir = TempDir::new().unwrap();
        let data = write_temp_file(GROWTH_DATA);
        let first = write_temp_file("gain = result + capital\n");
        let second = write_temp_file("half = gain / 2\n");
        let output = dir.path().join("out.tsv");

        let mut config = growth_config(data.path());
        config.scripts = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        config.export_path = Some(output.clone());

        let view = cli::run_pipeline(&config, &NullLog).unwrap();
        assert_eq!(view.column("half"), Some(&[55.0, 110.0, 110.0][..]));

        let table = parse_delimited_text(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(table.period_labels, vec!["2024_01", "2024_02", "2024_03"]);
        assert_eq!(table.row("gain"), Some(&[110.0, 220.0, 220.0][..]));
        assert_eq!(table.rows.last().unwrap().0, "half");
    }

    #[test]
    fn renders_chart_file() {
        let dir = TempDir::new().unwrap();
        let data = write_temp_file(SAVINGS_DATA);
        let chart = dir.path().join("chart.svg");

        let config = RunConfig {
            model: ModelKind::Savings,
            export_path: Some(dir.path().join("out.tsv")),
            chart: Some(ChartSettings {
                kind: ChartKind::Area,
                output: chart.clone(),
            }),
            ..growth_config(data.path())
        };
        cli::run_pipeline(&config, &NullLog).unwrap();

        let svg = fs::read_to_string(&chart).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Total Savings Over Time"));
    }

    #[test]
    fn missing_data_file_is_a_read_error() {
        let config = growth_config(Path::new("/nonexistent/data.txt"));
        let err = cli::run_pipeline(&config, &NullLog).unwrap_err();
        assert!(matches!(err, SimError::DataRead { .. }));
    }
}

mod exit_codes {
    use super::*;

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        fn file(&self, name: &str, content: &str) -> String {
            let path = self.dir.path().join(name);
            fs::write(&path, content).unwrap();
            path_str(&path).to_string()
        }

        fn output(&self) -> String {
            path_str(&self.dir.path().join("out.tsv")).to_string()
        }
    }

    #[test]
    fn successful_run_from_config_file() {
        let fx = Fixture::new();
        let data = fx.file("data.txt", GROWTH_DATA);
        let script = fx.file("script.txt", "x = capital + 1\n");
        let ini = fx.file(
            "run.ini",
            &format!(
                "[model]\nkind = Model2\n[data]\npath = {data}\n[script]\npaths = {script}\n\
                 [export]\noutput = {}\n[logging]\nfilter = warn\n",
                fx.output()
            ),
        );

        assert_exit(run_args(&["run", "--config", &ini, "--table"]), 0);
        let text = fs::read_to_string(fx.output()).unwrap();
        assert!(text.ends_with("x\t101\t201\t201\n"));
    }

    #[test]
    fn unknown_model_exits_2() {
        let fx = Fixture::new();
        let data = fx.file("data.txt", GROWTH_DATA);
        assert_exit(run_args(&["run", "-m", "Model9", "-d", &data]), 2);
    }

    #[test]
    fn unreadable_data_exits_1() {
        let fx = Fixture::new();
        let missing = path_str(&fx.dir.path().join("absent.txt")).to_string();
        assert_exit(run_args(&["run", "-m", "growth", "-d", &missing]), 1);
    }

    #[test]
    fn script_syntax_error_exits_4() {
        let fx = Fixture::new();
        let data = fx.file("data.txt", GROWTH_DATA);
        let script = fx.file("bad.txt", "x = (capital +\n");
        let out = fx.output();
        assert_exit(
            run_args(&["run", "-m", "growth", "-d", &data, "-s", &script, "-o", &out]),
            4,
        );
    }

    #[test]
    fn model_failure_exits_5() {
        let fx = Fixture::new();
        let data = fx.file("data.txt", "LATA a b\ncapital 1 2\n");
        assert_exit(run_args(&["run", "-m", "growth", "-d", &data]), 5);
    }

    #[test]
    fn extraction_error_exits_6() {
        let fx = Fixture::new();
        let data = fx.file("data.txt", GROWTH_DATA);
        let script = fx.file("script.txt", "LL = [1, 2, 3]\n");
        let out = fx.output();
        assert_exit(
            run_args(&["run", "-m", "growth", "-d", &data, "-s", &script, "-o", &out]),
            6,
        );
    }

    #[test]
    fn chart_without_inputs_exits_7() {
        let fx = Fixture::new();
        let data = fx.file("data.txt", GROWTH_DATA);
        let out = fx.output();
        let chart = path_str(&fx.dir.path().join("chart.svg")).to_string();
        assert_exit(
            run_args(&[
                "run",
                "-m",
                "growth",
                "-d",
                &data,
                "-o",
                &out,
                "--chart",
                "LINE",
                "--chart-output",
                &chart,
            ]),
            7,
        );
        assert!(!Path::new(&chart).exists());
    }

    #[test]
    fn models_lists_kinds() {
        assert_exit(run_args(&["models"]), 0);
    }

    #[test]
    fn check_script_reports_parse_errors() {
        let fx = Fixture::new();
        let good = fx.file("good.txt", "a = capital * 2\nfor (t in 0..<LL) { a[t] += t }\n");
        let bad = fx.file("bad.txt", "a = [1, 2\n");
        let missing = path_str(&fx.dir.path().join("none.txt")).to_string();

        assert_exit(run_args(&["check-script", "--script", &good]), 0);
        assert_exit(run_args(&["check-script", "--script", &bad]), 4);
        assert_exit(run_args(&["check-script", "--script", &missing]), 1);
    }
}
