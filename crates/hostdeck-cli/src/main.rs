// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, bail};
use config::Config;
use hostdeck_app::{BrowserState, InstanceId};
use hostdeck_db::Store;
use runtime::DbRuntime;
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

const DEMO_SEED: u64 = 20_260_219;

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
            "load config {}; run `hostdeck --print-example-config` to generate a v1 template",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    logging::init_logging(&config)?;

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or HOSTDECK_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;

    if let Some(import_path) = &options.import_path {
        return import_events(&store, import_path);
    }

    let seeded = if options.demo {
        Some(store.seed_demo_data(DEMO_SEED)?)
    } else {
        None
    };
    let instance_id = resolve_instance(&store, &db_path, options.instance.as_ref(), seeded)?;
    tracing::info!(instance = %instance_id, db = %db_path.display(), "browsing instance");
    if options.check_only {
        return Ok(());
    }

    let mut state = BrowserState::new(instance_id);
    let mut runtime = DbRuntime::new(&store, config.page_size());
    hostdeck_tui::run_app(&mut state, &mut runtime)
}

fn import_events(store: &Store, path: &Path) -> Result<()> {
    let file = File::open(path)
        .with_context(|| format!("open import file {}; pass a JSONL export", path.display()))?;
    let summary = store
        .import_events_jsonl(BufReader::new(file))
        .with_context(|| format!("import {}", path.display()))?;
    println!(
        "imported {} task events into {} instance(s)",
        summary.events,
        summary.instances.len()
    );
    Ok(())
}

fn resolve_instance(
    store: &Store,
    db_path: &Path,
    requested: Option<&InstanceId>,
    seeded: Option<InstanceId>,
) -> Result<InstanceId> {
    if let Some(instance_id) = requested {
        if !store.instance_exists(instance_id)? {
            bail!(
                "instance {instance_id} not found in {}; omit --instance to browse the newest run",
                db_path.display()
            );
        }
        return Ok(instance_id.clone());
    }
    if let Some(instance_id) = seeded {
        return Ok(instance_id);
    }
    match store.latest_instance()? {
        Some(instance_id) => Ok(instance_id),
        None => bail!(
            "no instances recorded in {}; import events with --import <file.jsonl> or try --demo",
            db_path.display()
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    instance: Option<InstanceId>,
    import_path: Option<PathBuf>,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
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
        instance: None,
        import_path: None,
        print_config_path: false,
        print_db_path: false,
        demo: false,
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
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--instance" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--instance requires an instance id"))?;
                if value.as_ref().trim().is_empty() {
                    bail!("--instance requires a non-empty instance id");
                }
                options.instance = Some(InstanceId::new(value.as_ref()));
            }
            "--import" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--import requires a JSONL file path"))?;
                options.import_path = Some(PathBuf::from(value.as_ref()));
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-path" => {
                options.print_db_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    if options.demo && options.import_path.is_some() {
        bail!("--demo uses a throwaway in-memory database; drop --demo to import events");
    }

    Ok(options)
}

fn print_help() {
    println!("hostdeck: browse per-host results of a playbook run");
    println!("  --config <path>          Use a specific config path");
    println!("  --instance <id>          Browse this instance (default: newest)");
    println!("  --import <file.jsonl>    Record task events from a JSONL export and exit");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-path             Print resolved database path");
    println!("  --print-example-config   Print a v1 config template");
    println!("  --demo                   Launch with seeded demo data (in-memory)");
    println!("  --check                  Validate config + DB + instance, then exit");
    println!("  --help                   Show this help");
}
