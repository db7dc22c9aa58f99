use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, Result};
use meigen_proto::{schema_value, ErrorResponse, Pagination, QuoteListParams};
use meigen_server::{DatasetCache, Server, ServerOptions, DEFAULT_HTTP_ADDR};
use meigen_storage_local::{FileSource, DEFAULT_DATA_PATH};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "meigen", version, about = "Japanese quotations API server")]
struct Cli {
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[arg(long, global = true)]
    config: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the quotes API over HTTP.
    Serve(ServeArgs),
    /// Print the dataset integrity report.
    Check(CheckArgs),
    /// Run the dataset through the load gate.
    Validate(DataArgs),
    /// Print JSON schemas for the wire types.
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Dataset file [default: ./data/quotes.json]
    #[arg(long)]
    data: Option<String>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Listen address [default: 127.0.0.1:3000]
    #[arg(long)]
    addr: Option<String>,
    /// Page size when a request omits `limit`.
    #[arg(long)]
    page_size: Option<usize>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    data: DataArgs,
    /// Fail when the quality score is below this value.
    #[arg(long)]
    min_score: Option<u8>,
}

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq)]
enum SchemaKind {
    All,
    Params,
    Error,
    Pagination,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    #[arg(value_enum, default_value_t = SchemaKind::All)]
    kind: SchemaKind,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(&cli.log_level);
    let cfg = load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Serve(args) => serve(args, &cfg).await?,
        Commands::Check(args) => check_cmd(args, &cfg).await?,
        Commands::Validate(args) => validate_cmd(args, &cfg).await?,
        Commands::Schema(args) => schema_cmd(&args)?,
    }
    Ok(())
}

fn resolve_data(args: &DataArgs, cfg: &AppConfig) -> String {
    args.data
        .clone()
        .or_else(|| cfg.serve.as_ref().and_then(|s| s.data.clone()))
        .unwrap_or_else(|| DEFAULT_DATA_PATH.to_string())
}

fn server_options(args: &ServeArgs, cfg: &AppConfig) -> ServerOptions {
    let mut options = ServerOptions::default();
    if let Some(cors) = &cfg.cors {
        if let Some(origins) = cors.allowed_origins.clone() {
            options.cors.allowed_origins = origins
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Some(max_age) = cors.max_age_secs {
            options.cors.max_age_secs = max_age;
        }
        if let Some(credentials) = cors.allow_credentials {
            options.cors.allow_credentials = credentials;
        }
    }
    if let Some(size) = args
        .page_size
        .or_else(|| cfg.serve.as_ref().and_then(|s| s.page_size))
    {
        options.default_page_size = size;
    }
    options
}

async fn serve(args: ServeArgs, cfg: &AppConfig) -> Result<()> {
    let data = resolve_data(&args.data, cfg);
    let addr = args
        .addr
        .clone()
        .or_else(|| cfg.serve.as_ref().and_then(|s| s.addr.clone()))
        .unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
    let options = server_options(&args, cfg);
    info!(
        data = %data,
        origins = options.cors.allowed_origins.len(),
        page_size = options.default_page_size,
        "starting server"
    );

    let server = Server::new_with_options(FileSource::new(&data), options);
    match server.preload().await {
        Ok(count) => info!(count, "dataset ready"),
        Err(err) => warn!(
            code = err.code(),
            error = %err,
            "dataset not loaded; requests will retry"
        ),
    }
    server
        .run_http(&addr)
        .await
        .map_err(|e| eyre!("http server error: {}", e))
}

async fn check_cmd(args: CheckArgs, cfg: &AppConfig) -> Result<()> {
    let data = resolve_data(&args.data, cfg);
    let min_score = args
        .min_score
        .or_else(|| cfg.check.as_ref().and_then(|c| c.min_score));
    let cache = DatasetCache::new(FileSource::new(&data));
    let report = cache
        .integrity_report()
        .await
        .map_err(|e| eyre!("{} [{}]: {}", data, e.code(), e))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    info!(
        total = report.total_quotes,
        invalid = report.invalid_quotes,
        duplicates = report.duplicate_ids.len(),
        score = report.quality_score,
        "integrity check complete"
    );
    if let Some(min) = min_score {
        if report.quality_score < min {
            return Err(eyre!(
                "quality score {} is below the required minimum {}",
                report.quality_score,
                min
            ));
        }
    }
    Ok(())
}

async fn validate_cmd(args: DataArgs, cfg: &AppConfig) -> Result<()> {
    let data = resolve_data(&args, cfg);
    let cache = DatasetCache::new(FileSource::new(&data));
    let quotes = cache
        .load()
        .await
        .map_err(|e| eyre!("{} [{}]: {}", data, e.code(), e))?;
    println!("{}: {} quotes valid", data, quotes.len());
    Ok(())
}

fn schema_cmd(args: &SchemaArgs) -> Result<()> {
    let out = match args.kind {
        SchemaKind::Params => schema_value::<QuoteListParams>(),
        SchemaKind::Error => schema_value::<ErrorResponse>(),
        SchemaKind::Pagination => schema_value::<Pagination>(),
        SchemaKind::All => serde_json::json!({
            "params": schema_value::<QuoteListParams>(),
            "error": schema_value::<ErrorResponse>(),
            "pagination": schema_value::<Pagination>(),
        }),
    };
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

// -----------------
// Config handling

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ServeSection {
    addr: Option<String>,
    data: Option<String>,
    page_size: Option<usize>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct CorsSection {
    allowed_origins: Option<Vec<String>>,
    max_age_secs: Option<u64>,
    allow_credentials: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct CheckSection {
    min_score: Option<u8>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct AppConfig {
    #[serde(default)]
    serve: Option<ServeSection>,
    #[serde(default)]
    cors: Option<CorsSection>,
    #[serde(default)]
    check: Option<CheckSection>,
}

fn load_config(path: Option<&str>) -> Result<AppConfig> {
    let mut builder = config::Config::builder().add_source(
        config::Environment::with_prefix("MEIGEN")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("cors.allowed_origins"),
    );

    if let Some(raw) = path {
        let expanded = expand_path(raw);
        if !expanded.exists() {
            warn!(
                path = expanded.display().to_string(),
                "config file not found; continuing with defaults and env overrides"
            );
        }
        builder = builder.add_source(config::File::from(expanded).required(false));
    }

    let cfg = builder
        .build()
        .map_err(|e| eyre!("config load error: {}", e))?;
    cfg.try_deserialize()
        .map_err(|e| eyre!("config parse error: {}", e))
}

fn expand_path(input: &str) -> PathBuf {
    if input == "~" {
        return home_dir().unwrap_or_else(|| PathBuf::from(input));
    }
    if let Some(rest) = input.strip_prefix("~/") {
        return home_dir()
            .map(|mut base| {
                base.push(rest);
                base
            })
            .unwrap_or_else(|| PathBuf::from(rest));
    }
    PathBuf::from(input)
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("USERPROFILE").map(PathBuf::from))
}
