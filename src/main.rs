use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Default)]
struct CliArgs {
    dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;
    let settings = dirplay::config::load_settings()?;
    let _log_guard = dirplay::logging::init(&dirplay::config::log_dir(&settings)?)?;
    info!(version = env!("CARGO_PKG_VERSION"), "starting");

    let result = dirplay::app::run_with_startup(
        settings,
        dirplay::app::AppStartupOptions {
            initial_dir: args.dir,
        },
    );
    if let Err(err) = &result {
        error!("exiting with error: {err:#}");
    }
    result
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--dir" => {
                index += 1;
                let Some(value) = args.get(index) else {
                    anyhow::bail!("--dir requires a directory path");
                };
                if value.trim().is_empty() {
                    anyhow::bail!("--dir cannot be empty");
                }
                out.dir = Some(PathBuf::from(value.trim()));
            }
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn print_help() {
    println!("dirplay");
    println!("  --dir <path>      Load this directory on startup");
    println!("  -h, --help        Show this help");
    println!();
    println!("Settings are read from $DIRPLAY_CONFIG_DIR/settings.json");
    println!("(default ~/.config/dirplay/settings.json).");
}
