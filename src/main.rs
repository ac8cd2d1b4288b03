mod cli;

use autopub::{
    api::ProcessOptions,
    config::{self, Config},
    runner::{self, PlatformFlags, PublishTargets, RunOptions},
    scanner::ForceList,
};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, RunArgs};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_filter(verbose: bool) -> EnvFilter {
    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag
    let directives = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if verbose {
            "autopub=debug,autopub_av=debug".to_string()
        } else {
            "autopub=info,autopub_av=info".to_string()
        }
    });
    EnvFilter::new(directives)
}

/// Console logging, plus a plain-text copy in `log_file` when given.
fn init_logging(verbose: bool, log_file: Option<File>) {
    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(fmt::layer())
        .with(file_layer)
        .init();
}

/// Load config with console-only logging so fallback warnings are visible
/// before the real subscriber exists.
fn load_config(path: Option<&Path>, verbose: bool) -> Config {
    let console = fmt().with_env_filter(env_filter(verbose)).finish();
    tracing::subscriber::with_default(console, || config::load_config_or_default(path))
}

fn open_run_log(logs_dir: &Path) -> Result<File> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory {:?}", logs_dir))?;
    let name = chrono::Local::now().format("%Y-%m-%d %H-%M-%S.txt").to_string();
    let path = logs_dir.join(name);
    File::create(&path).with_context(|| format!("Failed to create log file {:?}", path))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref(), cli.verbose);
            let log_file = match open_run_log(&config.paths.logs_dir) {
                Ok(file) => Some(file),
                Err(e) => {
                    eprintln!("Warning: {:#}. Logging to console only.", e);
                    None
                }
            };
            init_logging(cli.verbose, log_file);

            let options = run_options(cli.run, &config, cli.verbose);
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(runner::run(&config, &options))?;
            Ok(())
        }
        Some(command) => {
            init_logging(cli.verbose, None);
            match command {
                Commands::CheckTools => check_tools(cli.config.as_deref()),
                Commands::Validate { file } => {
                    validate_config(file.as_deref().or(cli.config.as_deref()))
                }
                Commands::Probe { file } => probe_file(&file, cli.config.as_deref()),
                Commands::Init => init(cli.config.as_deref()),
                Commands::Version => {
                    println!("autopub {}", env!("CARGO_PKG_VERSION"));
                    Ok(())
                }
            }
        }
    }
}

fn run_options(args: RunArgs, config: &Config, verbose: bool) -> RunOptions {
    let flags = PlatformFlags {
        xhs: args.pub_xhs,
        bilibili: args.pub_bilibili,
        douyin: args.pub_douyin,
        shipinhao: args.pub_shipinhao,
        y2b: args.pub_y2b,
    };

    RunOptions {
        targets: PublishTargets::resolve(flags, config.publish, args.no_pub),
        test_mode: args.test,
        process: ProcessOptions {
            use_cache: args.use_cache,
            use_translation_cache: args.use_translation_cache,
            use_metadata_cache: args.use_metadata_cache,
        },
        force: args
            .force
            .as_deref()
            .map(ForceList::parse)
            .unwrap_or_default(),
        path: args.path,
        verbose,
    }
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path);
    let tools = autopub_av::check_tools(&config.toolchain());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Short videos cannot be looped without them.");
    }

    Ok(())
}

fn print_summary(config: &Config) {
    println!("  Watch dir: {}", config.paths.watch_dir.display());
    println!("  Transcription dir: {}", config.paths.transcription_dir.display());
    println!("  Upload URL: {}", config.endpoints.upload_url);
    println!("  Process URL: {}", config.endpoints.process_url);
    println!("  Publish URL: {}", config.endpoints.publish_url);
    println!("  App API routing: {}", config.endpoints.use_app_api);
    println!("  Minimum length: {}s", config.video.min_duration_secs);
    println!("  Extensions: {}", config.video.extensions.join(", "));
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            print_summary(&config);
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            println!("Default config:");
            print_summary(&config);
        }
    }

    Ok(())
}

fn probe_file(file: &Path, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path);
    let duration = autopub_av::probe_duration(&config.toolchain(), file)?;
    let minimum = config.video.min_duration();

    println!("File: {}", file.display());
    println!("Duration: {:.3}s", duration.as_secs_f64());
    if duration >= minimum {
        println!("Meets the {}s minimum", minimum.as_secs_f64());
    } else {
        let count = autopub_av::actions::repeat_count(duration, minimum)?;
        println!(
            "Shorter than the {}s minimum, would be repeated {} times",
            minimum.as_secs_f64(),
            count
        );
    }

    Ok(())
}

fn init(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path);
    runner::prepare(&config)?;
    println!("✓ Data directories ready under {}", config.paths.data_dir.display());

    let target = match config_path {
        Some(p) => p.to_path_buf(),
        None => PathBuf::from(shellexpand::tilde("~/.config/autopub/config.toml").as_ref()),
    };
    if target.exists() {
        println!("Config file {} already exists, leaving it alone", target.display());
    } else {
        config::save_config(&target, &config.to_file())?;
        println!("✓ Wrote config file {}", target.display());
    }

    Ok(())
}
