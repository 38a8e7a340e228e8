//! CLI definition and dispatch.

use clap::{Args, Parser, Subcommand};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::fanout_log_adapter::FanoutLogAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::history_log_adapter::HistoryLogAdapter;
use crate::adapters::svg_chart_adapter::SvgChartAdapter;
use crate::adapters::tracing_log_adapter::{TracingLogAdapter, init_logging};
use crate::domain::config_validation::{RunConfig, build_run_config};
use crate::domain::error::SimError;
use crate::domain::export::{self, MergedResultView};
use crate::domain::runtime::ModelRuntime;
use crate::domain::schema::ModelKind;
use crate::domain::script::parser;
use crate::ports::chart_port::ChartPort;
use crate::ports::log_port::LogPort;

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "periodsim", about = "Period-indexed financial model runner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load data, run a model, execute scripts and export the results
    Run(RunOptions),
    /// List supported models and their variables
    Models,
    /// Parse a script and list the names it assigns
    CheckScript {
        #[arg(short, long)]
        script: PathBuf,
    },
}

/// Flags for `run`. Each one overrides the matching config file key.
#[derive(Args, Debug, Default, Clone)]
pub struct RunOptions {
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(short, long)]
    pub model: Option<String>,
    #[arg(short, long)]
    pub data: Option<PathBuf>,
    /// Script file; repeat to run several in order
    #[arg(short, long = "script")]
    pub scripts: Vec<PathBuf>,
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// LINE or AREA
    #[arg(long)]
    pub chart: Option<String>,
    #[arg(long)]
    pub chart_output: Option<PathBuf>,
    /// Print the formatted result table to stderr
    #[arg(long)]
    pub table: bool,
    /// Print the log history to stderr when done
    #[arg(long)]
    pub history: bool,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run(options) => run_simulation(&options),
        Command::Models => {
            print!("{}", describe_models());
            ExitCode::SUCCESS
        }
        Command::CheckScript { script } => run_check_script(&script),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

/// Merge the optional config file with command-line overrides.
pub fn resolve_run_config(
    adapter: &mut FileConfigAdapter,
    options: &RunOptions,
) -> Result<RunConfig, SimError> {
    if let Some(model) = &options.model {
        adapter.set("model", "kind", model.as_str());
    }
    if let Some(data) = &options.data {
        adapter.set("data", "path", data.display().to_string());
    }
    if let Some(output) = &options.output {
        adapter.set("export", "output", output.display().to_string());
    }
    if let Some(chart) = &options.chart {
        adapter.set("chart", "kind", chart.as_str());
    }
    if let Some(chart_output) = &options.chart_output {
        adapter.set("chart", "output", chart_output.display().to_string());
    }

    let mut config = build_run_config(&*adapter)?;
    if !options.scripts.is_empty() {
        config.scripts = options.scripts.clone();
    }
    config.show_history |= options.history;
    Ok(config)
}

fn run_simulation(options: &RunOptions) -> ExitCode {
    // Stage 1: Load config
    let mut adapter = match &options.config {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            match load_config(path) {
                Ok(a) => a,
                Err(code) => return code,
            }
        }
        None => FileConfigAdapter::empty(),
    };

    // Stage 2: Validate and apply overrides
    let config = match resolve_run_config(&mut adapter, options) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    init_logging(config.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER));
    let history = HistoryLogAdapter::new();
    let tracing_log = TracingLogAdapter;
    let log = FanoutLogAdapter::new(vec![&tracing_log, &history]);

    // Stages 3-7
    let outcome = run_pipeline(&config, &log);

    if config.show_history {
        eprintln!("\n=== Log History ===");
        eprint!("{}", history.render());
    }

    match outcome {
        Ok(view) => {
            if options.table {
                eprintln!("\n=== Results ===");
                eprint!("{}", export::to_display_table(&view));
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Load, run, script, export and chart. Returns the final merged view.
pub fn run_pipeline(config: &RunConfig, log: &dyn LogPort) -> Result<MergedResultView, SimError> {
    let mut runtime = ModelRuntime::new(config.model, log);

    // Stage 3: Load data
    eprintln!("Loading data from {}", config.data_path.display());
    let report = runtime.load_file(&config.data_path)?;
    eprintln!(
        "  {} periods, {} variables, {} warnings",
        report.period_count,
        report.assigned.len(),
        report.warnings.len()
    );

    // Stage 4: Run model
    eprintln!("Running model: {}", config.model);
    runtime.run()?;

    // Stage 5: Execute scripts in order
    for script in &config.scripts {
        eprintln!("Executing script {}", script.display());
        let report = runtime.execute_script_file(script)?;
        if !report.introduced.is_empty() {
            eprintln!("  new variables: {}", report.introduced.join(", "));
        }
    }

    // Stage 6: Export
    let text = runtime.to_delimited_text()?;
    match &config.export_path {
        Some(path) => {
            fs::write(path, &text)?;
            eprintln!("Results written to {}", path.display());
        }
        None => print!("{text}"),
    }

    // Stage 7: Chart
    let view = runtime.merged_view();
    if let Some(chart) = &config.chart {
        let svg = SvgChartAdapter.render(&view, chart.kind)?;
        fs::write(&chart.output, svg)?;
        eprintln!("{} chart written to {}", chart.kind, chart.output.display());
    }

    Ok(view)
}

/// One block per model: name, alias, then each variable and its kind.
pub fn describe_models() -> String {
    let mut out = String::new();
    for kind in ModelKind::ALL {
        let _ = writeln!(out, "{} (alias {})", kind.name(), kind.alias());
        for variable in kind.schema().variables {
            let _ = writeln!(out, "  {:<16} {}", variable.name, variable.kind);
        }
    }
    out
}

pub fn run_check_script(path: &Path) -> ExitCode {
    eprintln!("Checking script: {}", path.display());
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            let err = SimError::DataRead {
                path: path.display().to_string(),
                reason: e.to_string(),
            };
            eprintln!("error: {err}");
            return (&err).into();
        }
    };

    match parser::parse(&source) {
        Ok(program) => {
            for name in program.assigned_names() {
                println!("{name}");
            }
            eprintln!("Script is valid.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e.display_with_context(&source));
            (&SimError::from(e)).into()
        }
    }
}
