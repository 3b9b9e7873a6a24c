use playback::{cli, commands, config::Config, store::Store};

use anyhow::Result;
use env_logger::Builder;
use log::{info, LevelFilter};
use std::io::Write;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Delay logger initialization until after parsing arguments
    let app = cli::build_cli();
    let matches = app.get_matches();

    // Set log level based on the number of verbose flags
    let log_level = match matches.get_count("verbose") {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    // Custom log format
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .filter_level(log_level)
        .init();

    let mut config = Config::from_env();
    if let Some(path) = matches.get_one::<String>("database") {
        config.database = PathBuf::from(path);
    }

    let store = Store::open(&config.database)?;
    info!("Using run database at {}", config.database.display());

    let outcome = match matches.subcommand() {
        Some(("playbook", sub)) => match sub.subcommand() {
            Some(("list", m)) => commands::playbook::list(&store, m),
            Some(("show", m)) => commands::playbook::show(&store, m),
            Some(("delete", m)) => commands::playbook::delete(&store, m),
            _ => unreachable!("subcommand is required"),
        },
        Some(("play", sub)) => match sub.subcommand() {
            Some(("list", m)) => commands::play::list(&store, m),
            Some(("show", m)) => commands::play::show(&store, m),
            _ => unreachable!("subcommand is required"),
        },
        Some(("task", sub)) => match sub.subcommand() {
            Some(("list", m)) => commands::task::list(&store, m),
            Some(("show", m)) => commands::task::show(&store, m),
            _ => unreachable!("subcommand is required"),
        },
        Some(("host", sub)) => match sub.subcommand() {
            Some(("list", m)) => commands::host::list(&store, m),
            Some(("show", m)) => commands::host::show(&store, m),
            _ => unreachable!("subcommand is required"),
        },
        Some(("result", sub)) => match sub.subcommand() {
            Some(("list", m)) => commands::result::list(&store, m),
            Some(("show", m)) => commands::result::show(&store, m),
            _ => unreachable!("subcommand is required"),
        },
        Some(("record", sub)) => match sub.subcommand() {
            Some(("list", m)) => commands::record::list(&store, m),
            Some(("show", m)) => commands::record::show(&store, m),
            _ => unreachable!("subcommand is required"),
        },
        Some(("generate", sub)) => match sub.subcommand() {
            Some(("html", m)) => commands::generate::html(&store, m, &config),
            Some(("junit", m)) => commands::generate::junit(&store, m, &config),
            Some(("subunit", m)) => commands::generate::subunit(&store, m, &config),
            _ => unreachable!("subcommand is required"),
        },
        _ => unreachable!("subcommand is required"),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
