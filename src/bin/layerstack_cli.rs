//! LayerStack CLI - Bridge Interface For External Compositors
//!
//! Commands: scan, parse, resolve, permute
//! Outputs JSON to stdout (diagnostics go to stderr via tracing)
//! Returns non-zero on conflicts and parse failures

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use layerstack_core::{
    compose::{BlendMode, CompositeJob},
    index::LayerIndex,
    manifest::StackManifest,
    names::parse_path,
    permute::permute,
    resolve::{resolve, ResolveError, ResolveRequest},
};

#[derive(Parser)]
#[command(name = "layerstack-cli")]
#[command(about = "LayerStack CLI - Layer Stack Compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Show stage-by-stage resolution diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Index a layer directory and list tags with their layers
    Scan {
        /// Directory of exported layer files
        #[arg(short, long)]
        dir: PathBuf,
    },

    /// Parse a single layer path into its identity
    Parse {
        /// Layer file path
        path: PathBuf,
    },

    /// Resolve a tag + attribute request into a composite stack
    Resolve {
        /// Directory of exported layer files
        #[arg(short, long)]
        dir: PathBuf,

        /// Tag to resolve
        #[arg(short, long)]
        tag: String,

        /// Requested attribute (repeatable)
        #[arg(short, long = "attrib")]
        attribs: Vec<String>,

        /// Destination for the composite; must not already exist
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Blend mode: over or multiply
        #[arg(short, long, default_value = "over")]
        blend: String,
    },

    /// Emit every one-pick-per-category combination
    Permute {
        /// Directory of exported layer files
        #[arg(short, long)]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Scan { dir } => cmd_scan(&dir),
        Commands::Parse { path } => cmd_parse(&path),
        Commands::Resolve {
            dir,
            tag,
            attribs,
            out,
            blend,
        } => cmd_resolve(&dir, &tag, &attribs, out.as_deref(), &blend),
        Commands::Permute { dir } => cmd_permute(&dir),
    }
}

fn load_index(dir: &Path) -> Result<LayerIndex, ExitCode> {
    LayerIndex::scan(dir).map_err(|e| {
        eprintln!(r#"{{"error": "Failed to scan layer directory: {e}"}}"#);
        ExitCode::FAILURE
    })
}

fn cmd_scan(dir: &Path) -> ExitCode {
    let index = match load_index(dir) {
        Ok(index) => index,
        Err(code) => return code,
    };

    let tags: Vec<_> = index
        .tags()
        .map(|tag| {
            let layers = index.candidates(tag);
            serde_json::json!({
                "tag": tag,
                "count": layers.len(),
                "layers": layers.iter().map(|l| l.name.clone()).collect::<Vec<_>>(),
            })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&tags).unwrap());
    ExitCode::SUCCESS
}

fn cmd_parse(path: &Path) -> ExitCode {
    match parse_path(path) {
        Some(identity) => {
            println!("{}", serde_json::to_string_pretty(&identity).unwrap());
            ExitCode::SUCCESS
        }
        None => {
            println!(
                "{}",
                serde_json::json!({
                    "parsed": false,
                    "path": path,
                    "error": "name does not match <segment>( :: <segment>)*__<order>",
                })
            );
            ExitCode::from(2)
        }
    }
}

fn cmd_resolve(
    dir: &Path,
    tag: &str,
    attribs: &[String],
    out: Option<&Path>,
    blend: &str,
) -> ExitCode {
    let blend = match blend {
        "over" => BlendMode::Over,
        "multiply" => BlendMode::Multiply,
        other => {
            eprintln!(r#"{{"error": "Unknown blend mode: {other}"}}"#);
            return ExitCode::FAILURE;
        }
    };

    let index = match load_index(dir) {
        Ok(index) => index,
        Err(code) => return code,
    };

    let request = ResolveRequest::new(tag, attribs);
    let resolution = match resolve(&request, index.candidates(request.tag())) {
        Ok(resolution) => resolution,
        Err(ResolveError::Ambiguous { tag, groups }) => {
            let output = serde_json::json!({
                "success": false,
                "error": format!("ambiguous resolution for tag '{tag}'"),
                "conflicts": groups,
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
            return ExitCode::from(2);
        }
        Err(err @ ResolveError::EmptyStack { .. }) => {
            let output = serde_json::json!({
                "success": false,
                "error": err.to_string(),
            });
            println!("{}", serde_json::to_string(&output).unwrap());
            return ExitCode::from(2);
        }
    };

    let paths = resolution.paths();
    let manifest = match StackManifest::new(request.tag(), request.attribs(), paths.clone(), blend)
    {
        Ok(manifest) => manifest,
        Err(e) => {
            eprintln!(r#"{{"error": "Failed to build manifest: {e}"}}"#);
            return ExitCode::FAILURE;
        }
    };

    // With a destination, validate the compositor hand-off contract; the
    // external engine does the pixel work.
    let job = match out {
        Some(dest) => match CompositeJob::new(paths, blend, dest) {
            Ok(job) => Some(job),
            Err(e) => {
                let output = serde_json::json!({
                    "success": false,
                    "error": e.to_string(),
                });
                println!("{}", serde_json::to_string(&output).unwrap());
                return ExitCode::from(2);
            }
        },
        None => None,
    };

    let output = serde_json::json!({
        "success": true,
        "stack": resolution.layers.iter().map(|l| l.path.clone()).collect::<Vec<_>>(),
        "report": resolution.report,
        "manifest": manifest,
        "job": job,
    });
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
    ExitCode::SUCCESS
}

fn cmd_permute(dir: &Path) -> ExitCode {
    let index = match load_index(dir) {
        Ok(index) => index,
        Err(code) => return code,
    };

    let pool: Vec<_> = index.all().cloned().collect();
    let combos = permute(&pool);
    if combos.len() == 1 && combos[0].is_empty() {
        println!(r#"{{"success": false, "error": "no layers to permute"}}"#);
        return ExitCode::from(2);
    }

    let output: Vec<Vec<_>> = combos
        .iter()
        .map(|combo| combo.iter().map(|l| l.path.clone()).collect())
        .collect();
    println!("{}", serde_json::to_string_pretty(&output).unwrap());
    ExitCode::SUCCESS
}
