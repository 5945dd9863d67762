use blobsift::cli::{Cli, Commands, ConfigAction, OutputFormat};
use blobsift::config::Config;
use blobsift::error::{Result, SiftError};
use blobsift::strings::{extract_printable, DEFAULT_MIN_LENGTH};
use blobsift::{Artifact, Settings, Sifter};
use anyhow::Context;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Sift {
            input,
            strings,
            format,
            pretty,
        } => {
            cmd_sift(cli.config, input, strings, format, pretty)?;
        }
        Commands::Preflight => {
            cmd_preflight(cli.config)?;
        }
        Commands::Config { action } => {
            cmd_config(cli.config, action)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "blobsift=debug" } else { "blobsift=info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // stdout carries the artifact output
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_sift(
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    strings: bool,
    format: OutputFormat,
    pretty: bool,
) -> Result<()> {
    let config = load_config(config_path)?;
    let limit = config.max_blob_bytes()?;
    let settings = Settings::from_config(&config)?;

    let bytes = read_input(input.as_deref(), limit)?;
    let text = if strings {
        extract_printable(&bytes, DEFAULT_MIN_LENGTH)
    } else {
        String::from_utf8_lossy(&bytes).into_owned()
    };

    let sifter = Sifter::new(settings);
    let artifacts = sifter.sift(&text)?;

    match format {
        OutputFormat::Json => print_json(&artifacts, pretty)?,
        OutputFormat::Text => print_text(&artifacts)?,
    }

    Ok(())
}

fn read_input(input: Option<&Path>, limit: u64) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();

    match input {
        Some(path) if path != Path::new("-") => {
            let size = std::fs::metadata(path)
                .map_err(|e| SiftError::Io {
                    source: e,
                    context: format!("Failed to stat input file: {:?}", path),
                })?
                .len();
            if size > limit {
                return Err(SiftError::BlobTooLarge { size, limit });
            }

            bytes = std::fs::read(path).map_err(|e| SiftError::Io {
                source: e,
                context: format!("Failed to read input file: {:?}", path),
            })?;
        }
        _ => {
            // Read one byte past the limit to detect oversized input
            std::io::stdin()
                .take(limit.saturating_add(1))
                .read_to_end(&mut bytes)
                .map_err(|e| SiftError::Io {
                    source: e,
                    context: "Failed to read stdin".to_string(),
                })?;
            if bytes.len() as u64 > limit {
                return Err(SiftError::BlobTooLarge {
                    size: bytes.len() as u64,
                    limit,
                });
            }
        }
    }

    Ok(bytes)
}

fn print_json(artifacts: &[Artifact], pretty: bool) -> Result<()> {
    let envelope = serde_json::json!({ "data": artifacts });
    let rendered = if pretty {
        serde_json::to_string_pretty(&envelope)
    } else {
        serde_json::to_string(&envelope)
    }
    .map_err(|e| SiftError::Json {
        source: e,
        context: "Failed to serialize artifacts".to_string(),
    })?;

    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", rendered).context("Failed to write artifacts to stdout")?;
    Ok(())
}

fn print_text(artifacts: &[Artifact]) -> Result<()> {
    let mut out = std::io::stdout().lock();
    for artifact in artifacts {
        let written = if artifact.tags.is_empty() {
            writeln!(out, "{:<13} {}", artifact.data_type, artifact.value)
        } else {
            writeln!(
                out,
                "{:<13} {} [{}]",
                artifact.data_type,
                artifact.value,
                artifact.tags.join(", ")
            )
        };
        written.context("Failed to write artifacts to stdout")?;
    }
    Ok(())
}

fn cmd_preflight(config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config(config_path)?;
    let settings = Settings::from_config(&config)?;

    let missing = settings.lookups.preflight();
    if missing.is_empty() {
        println!("✓ All lookup files are present");
        return Ok(());
    }

    for (file, path) in &missing {
        println!("✗ Missing {}: {}", file, path.display());
    }
    println!("Run the updaters to fetch the missing lookup files.");
    std::process::exit(1);
}

fn cmd_config(config_path: Option<PathBuf>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(config_path)?;
            let json = serde_json::to_string_pretty(&config).map_err(|e| SiftError::Json {
                source: e,
                context: "Failed to serialize config".to_string(),
            })?;

            println!("{}", json);
        }
        ConfigAction::Validate { file } => {
            let path = match file.or(config_path) {
                Some(path) => path,
                None => Config::default_path()?,
            };
            let config = Config::load(&path)?;
            Settings::from_config(&config)?;
            println!("✓ Configuration is valid");
            println!("  Schema version: {}", config.meta.schema_version);
            println!("  Named networks: {}", config.named_networks.len());
        }
        ConfigAction::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_path()?,
            };

            if path.exists() && !force {
                println!("Configuration file already exists at: {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }

            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| SiftError::Io {
                    source: e,
                    context: format!("Failed to create config directory: {:?}", parent),
                })?;
            }

            Config::default().save(&path)?;

            println!("✓ Configuration initialized at: {}", path.display());
        }
    }

    Ok(())
}

fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let path = match config_path {
        Some(path) => path,
        None => Config::default_path()?,
    };

    if !path.exists() {
        tracing::warn!(
            "Config file not found, using defaults. Run 'blobsift config init' to create one."
        );
        let mut config = Config::default();
        config.apply_env_overrides();
        return Ok(config);
    }

    Config::load(&path)
}
