//! Annota: sidecar annotation files for image assets.
//!
//! Every image (`main_menu.png`) can carry a JSON sidecar (`main_menu.meta`)
//! describing named regions and gestures on it: slices, boxes, points,
//! swipes, or tool-specific custom shapes.
//!
//! # Modules
//!
//! - [`schema`]: Document types and the JSON codec
//! - [`asset`]: Load, edit and save the sidecar of one image
//! - [`env`]: Storage, clock, id and provenance collaborators
//! - [`error`]: Error types for annota operations

pub mod asset;
pub mod env;
pub mod error;
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

pub use asset::{sidecar_path, Asset, SIDECAR_EXTENSION};
pub use env::{Environment, Provenance};
pub use error::{AnnotaError, CodecError, DecodeError, ValidationError};
pub use schema::{Annotation, AnnotationAttributes, Document, FORMAT_VERSION};

/// The annota CLI application.
#[derive(Parser)]
#[command(name = "annota")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Print debug logs to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create an empty sidecar for an image.
    Create(CreateArgs),
    /// Print the annotations of an image.
    Show(ShowArgs),
    /// Add (or replace) an annotation.
    Add(AddArgs),
    /// Remove an annotation by name.
    Remove(RemoveArgs),
    /// Check every sidecar under a directory.
    Scan(ScanArgs),
}

/// Arguments for the create subcommand.
#[derive(clap::Args)]
struct CreateArgs {
    /// Image the sidecar belongs to.
    image: PathBuf,

    /// Image width; read from the image header when omitted.
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Image height; read from the image header when omitted.
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Replace an existing sidecar.
    #[arg(long)]
    force: bool,

    /// Tool name recorded in the sidecar.
    #[arg(long, env = "ANNOTA_TOOL")]
    tool: Option<String>,

    /// Tool version recorded in the sidecar.
    #[arg(long, env = "ANNOTA_TOOL_VERSION")]
    tool_version: Option<String>,
}

/// Arguments for the show subcommand.
#[derive(clap::Args)]
struct ShowArgs {
    /// Image whose sidecar to print.
    image: PathBuf,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the add subcommand.
#[derive(clap::Args)]
struct AddArgs {
    /// Image whose sidecar to edit.
    image: PathBuf,

    /// Unique annotation name.
    name: String,

    /// Human readable label.
    #[arg(long)]
    display_name: String,

    /// Attributes as JSON, e.g. '{"type":"box","geometry":{"x":0,"y":0,"width":10,"height":5}}'.
    #[arg(long)]
    attributes: String,

    /// Optional description.
    #[arg(long)]
    description: Option<String>,

    /// Extra data as a JSON object.
    #[arg(long)]
    extra: Option<String>,

    /// Replace an annotation with the same name.
    #[arg(long)]
    overwrite: bool,
}

/// Arguments for the remove subcommand.
#[derive(clap::Args)]
struct RemoveArgs {
    /// Image whose sidecar to edit.
    image: PathBuf,

    /// Name of the annotation to remove.
    name: String,
}

/// Arguments for the scan subcommand.
#[derive(clap::Args)]
struct ScanArgs {
    /// Directory to search for sidecar files.
    #[arg(default_value = ".")]
    root: PathBuf,
}

/// Run the annota CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), AnnotaError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Create(args)) => run_create(args),
        Some(Commands::Show(args)) => run_show(args),
        Some(Commands::Add(args)) => run_add(args),
        Some(Commands::Remove(args)) => run_remove(args),
        Some(Commands::Scan(args)) => run_scan(args),
        None => {
            println!("annota {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Sidecar annotation files for image assets.");
            println!();
            println!("Run 'annota --help' for usage information.");
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("annota=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when embedded; that one wins.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Execute the create subcommand.
fn run_create(args: CreateArgs) -> Result<(), AnnotaError> {
    let meta_path = sidecar_path(&args.image);
    if meta_path.exists() && !args.force {
        return Err(AnnotaError::SidecarExists { path: meta_path });
    }

    let (width, height) = match (args.width, args.height) {
        (Some(width), Some(height)) => (width, height),
        _ => read_image_dimensions(&args.image)?,
    };

    let defaults = Provenance::default();
    let provenance = Provenance::new(
        args.tool.unwrap_or(defaults.tool),
        args.tool_version.unwrap_or(defaults.tool_version),
    );
    let env = Environment::default().with_provenance(provenance);

    let mut asset = Asset::create_with(&args.image, width, height, env)?;
    asset.save(None)?;

    println!("Created {} ({}x{})", meta_path.display(), width, height);
    Ok(())
}

fn read_image_dimensions(path: &Path) -> Result<(u32, u32), AnnotaError> {
    let size = imagesize::size(path).map_err(|source| AnnotaError::ImageDimensionRead {
        path: path.to_path_buf(),
        source,
    })?;

    let width: u32 = size.width.try_into().map_err(|_| AnnotaError::InvalidImage {
        path: path.to_path_buf(),
        message: format!("image width {} does not fit in u32", size.width),
    })?;
    let height: u32 = size.height.try_into().map_err(|_| AnnotaError::InvalidImage {
        path: path.to_path_buf(),
        message: format!("image height {} does not fit in u32", size.height),
    })?;

    Ok((width, height))
}

/// Execute the show subcommand.
fn run_show(args: ShowArgs) -> Result<(), AnnotaError> {
    let mut asset = Asset::load(&args.image)?;

    match args.output.as_str() {
        "json" => println!("{}", asset.to_text(false, 2)?),
        "text" => print!("{}", summarize(&asset)),
        other => {
            return Err(AnnotaError::UnsupportedFormat(format!(
                "'{}' (supported: text, json)",
                other
            )));
        }
    }
    Ok(())
}

fn summarize(asset: &Asset) -> String {
    let doc = asset.document();
    let mut out = String::new();

    if let Some(path) = asset.path() {
        out.push_str(&format!("{}\n", path.display()));
    }
    out.push_str(&format!(
        "  {} {}x{}, format v{} ({} {})\n",
        doc.kind,
        doc.file.width,
        doc.file.height,
        doc.meta.version,
        doc.meta.tool,
        doc.meta.tool_version
    ));
    out.push_str(&format!(
        "  created {}, updated {}\n",
        doc.meta.created_at.to_rfc3339(),
        doc.meta.updated_at.to_rfc3339()
    ));
    out.push_str(&format!("  {} annotation(s)\n", asset.len()));

    for ann in asset {
        let kind = match ann.attributes.kind() {
            "" => "custom",
            kind => kind,
        };
        out.push_str(&format!("    {:<24} {:<8} {}\n", ann.name, kind, ann.display_name));
    }
    out
}

/// Execute the add subcommand.
fn run_add(args: AddArgs) -> Result<(), AnnotaError> {
    let mut asset = Asset::load(&args.image)?;

    let attributes = parse_json_arg("--attributes", &args.attributes).and_then(|value| {
        schema::codec::decode_attributes(&value, "attributes").map_err(|err| {
            AnnotaError::InvalidArgument {
                argument: "--attributes",
                source: err.into(),
            }
        })
    })?;

    let mut annotation = asset.new_annotation(&args.name, &args.display_name, attributes);
    annotation.description = args.description;
    if let Some(extra) = &args.extra {
        annotation.extra = match parse_json_arg("--extra", extra)? {
            Value::Object(map) => Some(map),
            other => {
                return Err(AnnotaError::InvalidArgument {
                    argument: "--extra",
                    source: ValidationError::new(
                        "extra",
                        format!("expected a JSON object, found {}", other),
                    )
                    .into(),
                })
            }
        };
    }

    asset.add_annotation(annotation, args.overwrite)?;
    asset.save(None)?;

    println!("Added '{}' ({} annotation(s))", args.name, asset.len());
    Ok(())
}

fn parse_json_arg(argument: &'static str, text: &str) -> Result<Value, AnnotaError> {
    serde_json::from_str(text).map_err(|source| AnnotaError::InvalidArgument {
        argument,
        source: DecodeError {
            origin: argument.to_string(),
            source,
        }
        .into(),
    })
}

/// Execute the remove subcommand.
fn run_remove(args: RemoveArgs) -> Result<(), AnnotaError> {
    let mut asset = Asset::load(&args.image)?;

    match asset.remove_annotation(&args.name) {
        Some(removed) => {
            asset.save(None)?;
            println!("Removed '{}' ({} annotation(s) left)", removed.name, asset.len());
            Ok(())
        }
        None => Err(AnnotaError::UnknownAnnotation { name: args.name }),
    }
}

/// Execute the scan subcommand.
fn run_scan(args: ScanArgs) -> Result<(), AnnotaError> {
    let sidecars = collect_sidecars(&args.root)?;
    let mut invalid = 0;

    for path in &sidecars {
        let result = fs::read_to_string(path)
            .map_err(|source| AnnotaError::Io {
                path: path.clone(),
                source,
            })
            .and_then(|text| Asset::from_text(&text, Some(path.clone())));

        match result {
            Ok(asset) => println!("[OK]    {} ({} annotation(s))", path.display(), asset.len()),
            Err(err) => {
                invalid += 1;
                println!("[ERROR] {}", err);
            }
        }
    }

    println!();
    println!("Scanned {} sidecar file(s), {} invalid", sidecars.len(), invalid);

    if invalid > 0 {
        Err(AnnotaError::ScanFailed {
            invalid,
            total: sidecars.len(),
        })
    } else {
        Ok(())
    }
}

fn collect_sidecars(root: &Path) -> Result<Vec<PathBuf>, AnnotaError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| AnnotaError::ScanTraversal {
            path: root.to_path_buf(),
            message: source.to_string(),
        })?;

        let is_sidecar = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(SIDECAR_EXTENSION));
        if entry.file_type().is_file() && is_sidecar {
            files.push(entry.path().to_path_buf());
        }
    }

    Ok(files)
}
