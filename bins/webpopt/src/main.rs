//! webpopt - convert uploaded images to WebP and keep the media library in sync.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use webpopt_cli::output::{format_size, Status};
use webpopt_core::config::{Config, ConversionSettings};
use webpopt_core::error::{exit_codes, Error};
use webpopt_image::{
    detect_format, AttachmentId, ConversionConfig, ConversionOutcome, Engine, FailureReason,
    ImageAsset, ImageFormat, WebpCodec,
};
use webpopt_media::{
    convert_action, show_convert_action, AttachmentRecord, AttachmentStore, Capability,
    HmacNonce, JsonFileStore, ManualAction, ManualRequest, MediaError, RedirectStatus, Upload,
    UploadHook,
};
use webpopt_telemetry::{metrics, TelemetryConfig};

#[derive(Parser)]
#[command(name = "webpopt")]
#[command(about = "Convert uploaded images to WebP and keep the media library in sync")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Settings file (defaults to webpopt.toml lookup)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print collected metrics to stderr before exiting
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether a WebP encoder is available
    Probe,

    /// Convert one file in place, regardless of the enabled setting
    Convert {
        /// Image to convert
        path: PathBuf,
        /// Encoder quality (1-100)
        #[arg(short, long)]
        quality: Option<u32>,
        /// Maximum output width in pixels
        #[arg(long)]
        max_width: Option<u32>,
        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Register a stored file in the library and run the upload hook on it
    Upload {
        /// Stored file
        path: PathBuf,
        /// Attachment id (next free id when omitted)
        #[arg(long)]
        id: Option<u64>,
    },

    /// Run the "Convert to WebP" action on a registered attachment
    Manual {
        /// Attachment id
        #[arg(long)]
        id: u64,
        /// Request token (issued from the configured secret when omitted)
        #[arg(long)]
        nonce: Option<String>,
    },

    /// Issue a request token for the manual action
    Token {
        /// Attachment id
        #[arg(long)]
        id: u64,
    },

    /// Show one attachment record and whether it can be converted
    Show {
        /// Attachment id
        #[arg(long)]
        id: u64,
    },

    /// Print the effective settings
    Settings,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            report_error(&e, cli.json);
            std::process::exit(e.exit_code());
        }
    };

    webpopt_telemetry::init_with_config(TelemetryConfig {
        log_level: if cli.verbose {
            "debug".to_string()
        } else {
            config.schema.logging.level.clone()
        },
        json: config.schema.logging.json,
        ..TelemetryConfig::default()
    })?;

    let json = cli.json;
    let result = match cli.command {
        Commands::Probe => run_probe(json),
        Commands::Convert {
            path,
            quality,
            max_width,
            timeout,
        } => run_convert(&path, &config, quality, max_width, timeout, json),
        Commands::Upload { path, id } => run_upload(&path, id, &config, json),
        Commands::Manual { id, nonce } => run_manual(AttachmentId(id), nonce, &config, json),
        Commands::Token { id } => run_token(AttachmentId(id), &config),
        Commands::Show { id } => run_show(AttachmentId(id), &config, json),
        Commands::Settings => run_settings(&config, json),
    };

    let code = result.unwrap_or_else(|e| {
        report_error(&e, json);
        e.exit_code()
    });

    if cli.metrics {
        eprintln!("{}", serde_json::to_string_pretty(&metrics().export_json())?);
    }

    std::process::exit(code);
}

type CmdResult = std::result::Result<i32, Error>;

fn report_error(error: &Error, json: bool) {
    if json {
        match serde_json::to_string_pretty(&error.to_report()) {
            Ok(report) => println!("{report}"),
            Err(_) => Status::error(&error.to_string()),
        }
    } else {
        Status::error(&error.to_string());
    }
}

fn print_json(value: &impl serde::Serialize) -> std::result::Result<(), Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn media_error(e: MediaError) -> Error {
    match e {
        MediaError::Unauthorized(msg) => Error::unauthorized(msg),
        MediaError::InvalidSecret(msg) => Error::config(msg)
            .with_suggestion("Set [security] nonce_secret to a non-empty string"),
        MediaError::NotFound(id) => Error::attachment_not_found(id),
        MediaError::Corrupt(msg) => Error::new(webpopt_core::ErrorCode::StoreCorrupt, msg),
        MediaError::IoError(e) => e.into(),
        MediaError::JsonError(e) => e.into(),
    }
}

fn outcome_exit_code(outcome: &ConversionOutcome) -> i32 {
    match outcome {
        ConversionOutcome::Converted { .. } => exit_codes::SUCCESS,
        ConversionOutcome::SkippedNotSmaller | ConversionOutcome::SkippedDisabled => {
            exit_codes::NOT_CONVERTED
        }
        ConversionOutcome::Failed {
            reason: FailureReason::Timeout,
        } => exit_codes::TIMEOUT,
        ConversionOutcome::Failed { .. } => exit_codes::FAILURE,
    }
}

fn open_store(config: &Config) -> JsonFileStore {
    let path = PathBuf::from(&config.schema.store.path);
    // relative store paths live next to the settings file
    let path = match config.path.as_deref().and_then(Path::parent) {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path,
    };
    JsonFileStore::open(path)
}

fn nonce_issuer(config: &Config) -> std::result::Result<HmacNonce, Error> {
    let secret = config.schema.security.nonce_secret.as_deref().ok_or_else(|| {
        Error::config("No request token secret configured")
            .with_suggestion("Add nonce_secret under [security] in webpopt.toml")
    })?;
    HmacNonce::new(secret.as_bytes()).map_err(media_error)
}

fn run_probe(json: bool) -> CmdResult {
    let engine = Engine::new();
    let codec = engine.codec();
    let formats: Vec<&str> = [
        ImageFormat::Jpeg,
        ImageFormat::Png,
        ImageFormat::Gif,
        ImageFormat::WebP,
        ImageFormat::Bmp,
        ImageFormat::Tiff,
    ]
    .iter()
    .map(ImageFormat::mime_type)
    .collect();

    if json {
        print_json(&serde_json::json!({
            "codec": codec.name(),
            "available": codec.is_available(),
            "decodes": formats,
        }))?;
    } else if codec.is_available() {
        Status::success(&format!("WebP encoder available ({})", codec.name()));
        Status::info(&format!("Decodes: {}", formats.join(", ")));
    } else {
        Status::warning("No WebP encoder available; conversions are disabled");
    }

    Ok(if codec.is_available() {
        exit_codes::SUCCESS
    } else {
        exit_codes::FAILURE
    })
}

fn run_convert(
    path: &Path,
    config: &Config,
    quality: Option<u32>,
    max_width: Option<u32>,
    timeout: Option<u64>,
    json: bool,
) -> CmdResult {
    let settings = ConversionSettings {
        quality: quality.unwrap_or(config.schema.conversion.quality),
        max_width: max_width.unwrap_or(config.schema.conversion.max_width),
        ..config.schema.conversion
    };
    let engine_config: ConversionConfig = settings.to_engine_config()?;

    let engine = Engine::new();
    let asset = ImageAsset::new(path, AttachmentId(0));
    let outcome = match timeout {
        Some(secs) => engine.convert_with_timeout(asset, engine_config, Duration::from_secs(secs)),
        None => engine.convert(&asset, &engine_config),
    };
    metrics().record_conversion(outcome.kind(), outcome.bytes_saved());

    if json {
        print_json(&outcome)?;
    } else {
        Status::outcome(&outcome);
    }
    Ok(outcome_exit_code(&outcome))
}

fn run_upload(path: &Path, id: Option<u64>, config: &Config, json: bool) -> CmdResult {
    let path = std::fs::canonicalize(path).map_err(|_| Error::file_not_found(path))?;
    let store = open_store(config);
    let id = match id {
        Some(id) => AttachmentId(id),
        None => store.next_id().map_err(media_error)?,
    };

    let head = std::fs::read(&path)?;
    let mime = detect_format(&head)
        .map(|format| format.mime_type())
        .unwrap_or("application/octet-stream");
    let guid = format!("file://{}", path.display());
    store
        .insert(AttachmentRecord::new(id, &path, mime, guid))
        .map_err(media_error)?;
    tracing::debug!(attachment_id = %id, path = %path.display(), mime, "Registered upload");

    let engine = Engine::new();
    let engine_config = config.schema.conversion.to_engine_config()?;
    let report = UploadHook::new(&engine, &store).on_upload(
        Upload {
            file_path: path,
            attachment_id: id,
        },
        &engine_config,
    );

    if json {
        print_json(&report)?;
    } else {
        Status::info(&format!(
            "Attachment {} stored at {}",
            id,
            report.upload.file_path.display()
        ));
        Status::outcome(&report.outcome);
    }

    // The upload itself always succeeds.
    Ok(exit_codes::SUCCESS)
}

fn run_manual(id: AttachmentId, nonce: Option<String>, config: &Config, json: bool) -> CmdResult {
    let issuer = nonce_issuer(config)?;
    let nonce = nonce.unwrap_or_else(|| issuer.issue(&convert_action(id)));

    let store = open_store(config);
    let engine = Engine::new();
    let engine_config = config.schema.conversion.to_engine_config()?;

    let request = ManualRequest {
        attachment_id: id,
        capability: Capability::ManageOptions,
        nonce,
    };
    let redirect = ManualAction::new(&engine, &store, &issuer)
        .handle(&request, &engine_config)
        .map_err(media_error)?;

    if json {
        print_json(&serde_json::json!({
            "redirect": redirect,
            "query": redirect.query(),
        }))?;
    } else {
        match &redirect.status {
            RedirectStatus::Converted => Status::success(&format!("Attachment {id} converted")),
            RedirectStatus::ConvertedUnrecorded => Status::warning(&format!(
                "Attachment {id} converted but its record still points at the old file"
            )),
            RedirectStatus::NotSmaller => {
                Status::info(&format!("Attachment {id} kept: WebP was not smaller"));
            }
            RedirectStatus::Failed { reason } => {
                Status::error(&format!("Attachment {id} not converted: {reason}"));
            }
            RedirectStatus::NotFound => Status::warning(&format!("Attachment {id} not found")),
        }
        println!("{}", redirect.query());
    }

    Ok(match redirect.status {
        RedirectStatus::Converted => exit_codes::SUCCESS,
        RedirectStatus::NotSmaller => exit_codes::NOT_CONVERTED,
        RedirectStatus::Failed { reason: "timeout" } => exit_codes::TIMEOUT,
        RedirectStatus::ConvertedUnrecorded
        | RedirectStatus::Failed { .. }
        | RedirectStatus::NotFound => exit_codes::FAILURE,
    })
}

fn run_token(id: AttachmentId, config: &Config) -> CmdResult {
    let issuer = nonce_issuer(config)?;
    println!("{}", issuer.issue(&convert_action(id)));
    Ok(exit_codes::SUCCESS)
}

fn run_show(id: AttachmentId, config: &Config, json: bool) -> CmdResult {
    let store = open_store(config);
    let record = store
        .get(id)
        .map_err(media_error)?
        .ok_or_else(|| Error::attachment_not_found(id))?;
    let engine = Engine::new();
    let offer = show_convert_action(&record, engine.codec());

    if json {
        print_json(&serde_json::json!({
            "record": record,
            "convert_action": offer,
        }))?;
    } else {
        Status::header(&format!("Attachment {id}"));
        println!("Path: {}", record.file_path.display());
        println!("MIME: {}", record.mime_type);
        println!("GUID: {}", record.guid);
        if let Ok(meta) = std::fs::metadata(&record.file_path) {
            println!("Size: {}", format_size(meta.len()));
        }
        println!("Convert to WebP: {}", if offer { "offered" } else { "hidden" });
    }
    Ok(exit_codes::SUCCESS)
}

fn run_settings(config: &Config, json: bool) -> CmdResult {
    if json {
        print_json(&config.schema)?;
    } else {
        let source = config
            .path
            .as_deref()
            .map_or_else(|| "built-in defaults".to_string(), |p| p.display().to_string());
        Status::info(&format!("Settings from {source}"));
        print!("{}", toml::to_string_pretty(&config.schema)?);
    }
    Ok(exit_codes::SUCCESS)
}
