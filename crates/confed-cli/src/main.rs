//! # confed
//!
//! Command-line front end for schema-driven configuration documents.
//!
//! Generates a schema and a default document from type descriptors,
//! shows and validates stored documents, and applies edits that are only
//! written back when the whole document stays valid.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use confed_schema::{DescriptorLoader, Kind};
use confed_store::DocumentStore;
use confed_tree::{EditableNode, EditableTree, Serializer, path::walk};
use confed_validation::{ValidationEngine, ValidationReporter};
use config::AppConfig;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "confed")]
#[command(about = "Schema-driven configuration document editor")]
#[command(version)]
struct Cli {
    /// Path to configuration file (YAML or JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the documents, overrides the configuration file
    #[arg(short, long, global = true)]
    dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the schema of a type and, if missing, its default document
    Generate {
        /// Descriptor file (YAML or JSON)
        #[arg(long)]
        descriptors: PathBuf,

        /// Root type name
        #[arg(short = 't', long = "type")]
        type_name: String,

        /// Document name, defaults to the type name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Print a document as a tree with per-node validity
    Show {
        /// Document name
        #[arg(short, long)]
        name: String,
    },

    /// Validate a document, exiting with status 1 when it is invalid
    Validate {
        /// Document name
        #[arg(short, long)]
        name: String,
    },

    /// Apply edits and save the document if it stays valid
    Set {
        /// Document name
        #[arg(short, long)]
        name: String,

        /// Object paths to materialize before assigning
        #[arg(long)]
        materialize: Vec<String>,

        /// Array paths to append one element to before assigning
        #[arg(long)]
        add: Vec<String>,

        /// Assignments `path=value`; an empty value clears the node
        assignments: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(dir) = cli.dir {
        config.store.data_dir = dir;
    }
    let store = DocumentStore::new(config.store.clone());

    match cli.command {
        Commands::Generate {
            descriptors,
            type_name,
            name,
        } => {
            let registry = DescriptorLoader::default()
                .load_from_file(&descriptors)
                .with_context(|| format!("loading descriptors {}", descriptors.display()))?;
            let name = name.unwrap_or_else(|| type_name.clone());
            let schema = store
                .generate(&registry, &type_name, &name)
                .await
                .with_context(|| format!("generating '{name}' from type '{type_name}'"))?;

            info!(name = %name, types = schema.len(), "generated");
            println!("schema: {}", store.definition_path(&name).display());
            println!("data:   {}", store.data_path(&name).display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Show { name } => {
            let tree = open_tree(&store, &name).await?;
            print!("{}", render_tree(tree.root()));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate { name } => {
            let tree = open_tree(&store, &name).await?;
            let report = ValidationEngine::with_config(config.validation).validate(tree.root());
            println!("{}", ValidationReporter::new().numbered().render(&report));
            Ok(if report.is_valid() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Set {
            name,
            materialize,
            add,
            assignments,
        } => {
            let mut tree = open_tree(&store, &name).await?;

            for path in &materialize {
                let resolved = tree.resolve(path)?;
                tree.materialize(&resolved)
                    .with_context(|| format!("materializing '{path}'"))?;
            }
            for path in &add {
                let resolved = tree.resolve(path)?;
                let added = tree
                    .add_element(&resolved)
                    .with_context(|| format!("adding an element to '{path}'"))?;
                debug!(path = %tree.display_path(&added), "added element");
            }
            for assignment in &assignments {
                let (path, value) = assignment
                    .split_once('=')
                    .with_context(|| format!("expected path=value, got '{assignment}'"))?;
                let resolved = tree.resolve(path)?;
                let value = (!value.is_empty()).then(|| value.to_string());
                tree.set_value(&resolved, value)
                    .with_context(|| format!("setting '{path}'"))?;
            }

            let report = ValidationEngine::with_config(config.validation).validate(tree.root());
            if !report.is_valid() {
                println!("{}", ValidationReporter::new().numbered().render(&report));
                println!("document not saved");
                return Ok(ExitCode::FAILURE);
            }

            let document = Serializer::new()
                .serialize(tree.root())
                .context("serializing document")?;
            store.write(&name, &document).await?;
            println!("saved {}", store.data_path(&name).display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_tree(store: &DocumentStore, name: &str) -> Result<EditableTree> {
    let schema = store.read_definition(name).await?;
    let document = store.read_existing(name).await?;
    EditableTree::build(schema, document.as_ref())
        .with_context(|| format!("building the tree of '{name}'"))
}

/// One line per node: label, value and own violations, indented by depth
fn render_tree(root: &EditableNode) -> String {
    let mut out = String::new();
    walk(root, |node, _, depth| {
        let mark = if node.is_valid() { ' ' } else { '!' };
        let detail = match node.kind() {
            Kind::Object if !node.is_materialized() => "(unset)".to_string(),
            Kind::Object => String::new(),
            Kind::Array => format!("[{}]", node.children().len()),
            _ => node
                .value()
                .map_or_else(|| "(unset)".to_string(), |v| format!("= {v}")),
        };
        let violations: Vec<String> = node.violations().iter().map(ToString::to_string).collect();

        out.push(mark);
        out.push_str(&"  ".repeat(depth + 1));
        out.push_str(&node.label);
        if !detail.is_empty() {
            out.push(' ');
            out.push_str(&detail);
        }
        if !violations.is_empty() {
            out.push_str("  <- ");
            out.push_str(&violations.join("; "));
        }
        out.push('\n');
    });
    out
}
