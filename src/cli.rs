// Command-line front end for mvtread.
//
// Subcommands list a tile's layers or dump the features of one layer, in a
// tab-separated text form or as JSON.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use serde_json::json;

use crate::error::DecodeError;
use crate::geometry::Point;
use crate::io::{self, MAX_INFLATED_SIZE};
use crate::mvt::{DEFAULT_EXTENT, DEFAULT_VERSION, Feature, Layer, Tile, Value};

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Mapbox Vector Tile inspector.
#[derive(Parser, Debug)]
#[command(
    name = "mvtread",
    version,
    about = "Mapbox Vector Tile inspector",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Quiet mode (only errors are logged).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use twice for debug logging).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Print output as JSON.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// List the layers of a tile.
    Layers(LayersArgs),
    /// Print the features of one layer.
    Features(FeaturesArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct LayersArgs {
    /// Tile file (raw or gzip-compressed protobuf).
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,
}

#[derive(Args, Debug)]
struct FeaturesArgs {
    /// Tile file (raw or gzip-compressed protobuf).
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,

    /// Name of the layer to dump.
    #[arg(long, short = 'l')]
    layer: String,

    /// Stop after this many features.
    #[arg(long, short = 'n')]
    limit: Option<usize>,

    /// Also decode and print each feature's geometry.
    #[arg(long, short = 'g')]
    geometry: bool,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Layers,
    Features,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    input_file: Option<PathBuf>,
    layer: Option<String>,
    limit: Option<usize>,
    geometry: bool,
}

fn resolve_options(cli: Cli) -> Options {
    let mut opts = Options {
        command: Command::Config,
        quiet: cli.quiet,
        verbose: cli.verbose.min(2),
        json_output: cli.json_output,
        input_file: None,
        layer: None,
        limit: None,
        geometry: false,
    };

    match cli.command {
        Cmd::Layers(args) => {
            opts.command = Command::Layers;
            opts.input_file = Some(args.file);
        }
        Cmd::Features(args) => {
            opts.command = Command::Features;
            opts.input_file = Some(args.file);
            opts.layer = Some(args.layer);
            opts.limit = args.limit;
            opts.geometry = args.geometry;
        }
        Cmd::Config => {}
    }
    opts
}

impl Options {
    /// Log filter used when `RUST_LOG` is unset.
    fn default_log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("mvtread".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let opts = resolve_options(cli);
        let _ = opts.default_log_filter();
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

fn value_json(value: Value<'_>) -> serde_json::Value {
    match value {
        Value::String(s) => json!(s),
        Value::Float(f) => json!(f),
        Value::Double(d) => json!(d),
        Value::Int(i) | Value::SInt(i) => json!(i),
        Value::UInt(u) => json!(u),
        Value::Bool(b) => json!(b),
    }
}

fn geometry_json(parts: &[Vec<Point>]) -> serde_json::Value {
    parts
        .iter()
        .map(|part| part.iter().map(|p| json!([p.x, p.y])).collect::<Vec<_>>())
        .collect::<Vec<_>>()
        .into()
}

/// `k=v` pairs separated by spaces.
fn format_properties(feature: &Feature<'_>) -> Result<String, DecodeError> {
    let mut out = String::new();
    for (key, value) in feature.properties()? {
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "{key}={value}");
    }
    Ok(out)
}

/// Parts in brackets, points as `x,y`.
fn format_geometry(parts: &[Vec<Point>]) -> String {
    let mut out = String::new();
    for part in parts {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push('[');
        for (i, p) in part.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{},{}", p.x, p.y);
        }
        out.push(']');
    }
    out
}

fn load_tile(opts: &Options) -> Option<Tile> {
    let Some(path) = &opts.input_file else {
        eprintln!("mvtread: an input file is required");
        return None;
    };
    match io::decode_file(path) {
        Ok(tile) => Some(tile),
        Err(e) => {
            eprintln!("mvtread: {}: {e}", path.display());
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("mvtread version {version}");

    let gzip = cfg!(feature = "gzip") as u8;
    let parallel = cfg!(feature = "parallel") as u8;

    eprintln!("GZIP={gzip}");
    eprintln!("PARALLEL={parallel}");
    eprintln!("DEFAULT_VERSION={DEFAULT_VERSION}");
    eprintln!("DEFAULT_EXTENT={DEFAULT_EXTENT}");
    eprintln!("MAX_INFLATED_SIZE={MAX_INFLATED_SIZE}");

    0
}

// ---------------------------------------------------------------------------
// Layers command
// ---------------------------------------------------------------------------

fn cmd_layers(opts: &Options) -> i32 {
    let Some(tile) = load_tile(opts) else {
        return 1;
    };
    match print_layers(&tile, opts.json_output) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("mvtread: invalid layer: {e}");
            1
        }
    }
}

fn print_layers(tile: &Tile, json_output: bool) -> Result<(), DecodeError> {
    if json_output {
        let mut layers = Vec::with_capacity(tile.layer_count());
        for layer in tile.layers() {
            let info = layer.info()?;
            layers.push(json!({
                "index": layer.index(),
                "name": info.name,
                "version": info.version,
                "extent": info.extent,
                "features": info.feature_count,
            }));
        }
        println!("{:#}", serde_json::Value::from(layers));
        return Ok(());
    }

    for layer in tile.layers() {
        let info = layer.info()?;
        println!(
            "{}\t{}\tversion={}\textent={}\tfeatures={}",
            layer.index(),
            info.name,
            info.version,
            info.extent,
            info.feature_count
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Features command
// ---------------------------------------------------------------------------

fn cmd_features(opts: &Options) -> i32 {
    let Some(tile) = load_tile(opts) else {
        return 1;
    };
    let name = opts.layer.as_deref().unwrap_or_default();
    let layer = match tile.layer_by_name(name) {
        Ok(Some(layer)) => layer,
        Ok(None) => {
            eprintln!("mvtread: no layer named '{name}'");
            return 1;
        }
        Err(e) => {
            eprintln!("mvtread: invalid layer: {e}");
            return 1;
        }
    };

    match print_features(layer, opts) {
        Ok(count) => {
            if !opts.quiet && !opts.json_output {
                eprintln!("mvtread: {count} features in '{name}'");
            }
            0
        }
        Err(e) => {
            eprintln!("mvtread: invalid feature: {e}");
            1
        }
    }
}

fn print_features(layer: Layer<'_>, opts: &Options) -> Result<usize, DecodeError> {
    let limit = opts.limit.unwrap_or(usize::MAX);
    let mut rows = Vec::new();
    let mut count = 0;

    for feature in layer.features()?.take(limit) {
        count += 1;
        if opts.json_output {
            let mut properties = serde_json::Map::new();
            for (key, value) in feature.properties()? {
                properties.insert(key.to_string(), value_json(value));
            }
            let mut row = json!({
                "index": feature.index(),
                "id": feature.id()?,
                "type": feature.geom_type()?.as_str(),
                "properties": properties,
            });
            if opts.geometry {
                row["geometry"] = geometry_json(&feature.decode_geometry()?);
            }
            rows.push(row);
            continue;
        }

        let id = match feature.id()? {
            Some(id) => id.to_string(),
            None => "-".to_string(),
        };
        let mut line = format!(
            "{}\tid={id}\t{}\t{}",
            feature.index(),
            feature.geom_type()?,
            format_properties(&feature)?
        );
        if opts.geometry {
            line.push('\t');
            line.push_str(&format_geometry(&feature.decode_geometry()?));
        }
        println!("{line}");
    }

    if opts.json_output {
        println!("{:#}", serde_json::Value::from(rows));
    }
    Ok(count)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(opts.default_log_filter()),
    )
    .format_timestamp(None)
    .format_target(false)
    .init();

    let exit_code = match opts.command {
        Command::Layers => cmd_layers(&opts),
        Command::Features => cmd_features(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
