// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use labgrid_app::{Dataset, Session, TableSchema, ViewReconciler};
use labgrid_testkit::{DEFAULT_PROJECT_COUNT, ResearchFaker};
use runtime::{DemoRuntime, FileRuntime};
use std::env;
use std::path::PathBuf;
use time::OffsetDateTime;
use tracing::{info, warn};

const DEMO_SEED: u64 = 42;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `labgrid --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let data_path = match &options.data_path {
        Some(path) => {
            labgrid_data::validate_data_path(&path.to_string_lossy())?;
            path.clone()
        }
        None => config.data_path()?,
    };
    if options.print_data_path {
        println!("{}", data_path.display());
        return Ok(());
    }

    logging::init(config.log_level(), &config.log_path()?)?;

    let today = OffsetDateTime::now_utc().date();
    if let Some(count) = options.generate {
        let seed = OffsetDateTime::now_utc().unix_timestamp().unsigned_abs();
        let dataset = ResearchFaker::new(seed, today).research_dataset(count)?;
        labgrid_data::save_dataset(&data_path, &dataset).with_context(|| {
            format!(
                "write generated data to {} -- pass --data to choose another path",
                data_path.display()
            )
        })?;
        println!("wrote {count} projects to {}", data_path.display());
        return Ok(());
    }

    let schema = TableSchema::research_projects();
    let dataset = if options.demo {
        ResearchFaker::new(DEMO_SEED, today).research_dataset(DEFAULT_PROJECT_COUNT)?
    } else {
        labgrid_data::load_dataset(&data_path, &schema)?
    };

    let session = start_session(&config, dataset, schema.clone())?;
    if options.check_only {
        let stats = session.stats();
        println!(
            "{} rows, {} columns in {}",
            stats.total_rows,
            stats.total_columns,
            data_path.display()
        );
        return Ok(());
    }

    if options.demo {
        let mut runtime = DemoRuntime::new(session.dataset().clone());
        run_session(session, &mut runtime)
    } else {
        let mut runtime = FileRuntime::new(data_path, schema);
        run_session(session, &mut runtime)
    }
}

fn start_session(config: &Config, dataset: Dataset, schema: TableSchema) -> Result<Session> {
    let reconciler = ViewReconciler::new(config.edit_policy(), schema);
    let mut session = Session::start(dataset, reconciler, config.cache_capacity());
    session
        .set_filter_columns(&config.filter_columns())
        .context("invalid [data].filter_columns -- every name must be a column in the data file")?;
    Ok(session)
}

fn run_session<R: labgrid_tui::AppRuntime>(mut session: Session, runtime: &mut R) -> Result<()> {
    let result = labgrid_tui::run_app(&mut session, runtime);
    let unsaved = session.has_unsaved_changes();
    let dataset = session.end();
    if unsaved {
        warn!(rows = dataset.len(), "exited with unsaved changes");
        eprintln!(
            "warning: changes to {} were not saved",
            runtime.source_label()
        );
    } else {
        info!("exited cleanly");
    }
    result
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    data_path: Option<PathBuf>,
    print_config_path: bool,
    print_data_path: bool,
    demo: bool,
    generate: Option<usize>,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        data_path: None,
        print_config_path: false,
        print_data_path: false,
        demo: false,
        generate: None,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--data" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--data requires a CSV file path"))?;
                options.data_path = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-data-path" => {
                options.print_data_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--generate" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--generate requires a project count"))?;
                let count = value
                    .as_ref()
                    .parse::<usize>()
                    .ok()
                    .filter(|count| *count > 0)
                    .ok_or_else(|| {
                        anyhow!(
                            "--generate expects a positive project count, got {:?}",
                            value.as_ref()
                        )
                    })?;
                options.generate = Some(count);
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.demo && options.generate.is_some() {
        return Err(anyhow!(
            "--demo and --generate cannot be combined; --generate writes to the data path"
        ));
    }

    Ok(options)
}

fn print_help() {
    println!("labgrid -- research project register");
    println!("  --config <path>          Use a specific config path");
    println!("  --data <path>            Use a specific CSV data file");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-data-path        Print resolved data file path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch with generated demo data (in-memory)");
    println!("  --generate <n>           Write <n> generated projects to the data path");
    println!("  --check                  Validate config + data file, then exit");
    println!("  --help                   Show this help");
}
