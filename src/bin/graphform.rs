//! Command-line front end: inspect a database folder's schema or render its
//! graph as JSON.
#![forbid(unsafe_code)]

use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use graphform::config::EditorConfig;
use graphform::schema::{SchemaMapping, SchemaSnapshot};
use graphform::session::MemoryConnector;
use graphform::view::{self, GraphView};
use graphform::Workspace;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "graphform",
    version,
    about = "Schema-driven property-graph editor tools",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        env = "GRAPHFORM_CONFIG",
        value_name = "FILE",
        help = "Path to the editor config file"
    )]
    config: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Json,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Print the schema loaded from a database folder")]
    Schema {
        #[arg(value_name = "FOLDER")]
        folder: Option<PathBuf>,
    },
    #[command(about = "Import CSV files into a scratch graph and print it")]
    View(ViewCmd),
}

#[derive(Args, Debug)]
struct ViewCmd {
    #[arg(value_name = "FOLDER")]
    folder: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Node rows: ID,type,key,value,...")]
    nodes: Option<PathBuf>,

    #[arg(
        long,
        value_name = "FILE",
        help = "Relationship rows: ID1,ID2,type,key,value,..."
    )]
    relationships: Option<PathBuf>,

    #[arg(long, value_name = "ID", help = "Only the two-hop neighborhood of this node")]
    node: Option<String>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn main() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = EditorConfig::load(cli.config.clone())?;

    match cli.command {
        Command::Schema { folder } => {
            let folder = resolve_folder(folder, &config)?;
            let schema = graphform::schema::load_folder(&folder, config.schema_files())?;
            emit(cli.format, &schema, |out| print_schema_text(out, &schema))?;
        }
        Command::View(cmd) => {
            let folder = resolve_folder(cmd.folder, &config)?;
            let mut connector = MemoryConnector::new();
            let mut workspace = Workspace::open_with_config(&mut connector, &config, &folder)?;
            if let Some(path) = &cmd.nodes {
                workspace.import_nodes(path)?;
            }
            if let Some(path) = &cmd.relationships {
                workspace.import_relationships(path)?;
            }
            let graph = match &cmd.node {
                Some(id) => GraphView::from(&view::neighborhood(workspace.session(), id)?),
                None => workspace.whole_graph_view()?,
            };
            emit(cli.format, &graph, |out| print_view_text(out, &graph))?;
        }
    }

    Ok(())
}

fn resolve_folder(folder: Option<PathBuf>, config: &EditorConfig) -> Result<PathBuf, Box<dyn Error>> {
    folder
        .or_else(|| config.default_database().map(Path::to_path_buf))
        .ok_or_else(|| "no database folder given and no default configured".into())
}

fn emit<T: Serialize>(
    format: OutputFormat,
    value: &T,
    text: impl FnOnce(&mut dyn Write) -> io::Result<()>,
) -> Result<(), Box<dyn Error>> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputFormat::Text => text(&mut out)?,
    }
    Ok(())
}

fn print_mapping(out: &mut dyn Write, title: &str, mapping: &SchemaMapping) -> io::Result<()> {
    writeln!(out, "{title}:")?;
    for (key, values) in mapping {
        writeln!(out, "  {key}: {}", values.join(", "))?;
    }
    Ok(())
}

fn print_schema_text(out: &mut dyn Write, schema: &SchemaSnapshot) -> io::Result<()> {
    print_mapping(out, "node properties", schema.node_properties())?;
    print_mapping(out, "relationship properties", schema.relationship_property_map())?;
    writeln!(out, "node types: {}", schema.node_types().as_slice().join(", "))
}

fn print_view_text(out: &mut dyn Write, view: &GraphView) -> io::Result<()> {
    for node in &view.nodes {
        match &node.group {
            Some(group) => writeln!(out, "({}) {} :{group}", node.id, node.label)?,
            None => writeln!(out, "({}) {}", node.id, node.label)?,
        }
    }
    for edge in &view.edges {
        writeln!(out, "({})-[:{}]->({})", edge.source_id, edge.label, edge.target_id)?;
    }
    writeln!(
        out,
        "{} nodes, {} relationships",
        view.node_count(),
        view.edge_count()
    )
}
