//! Cirq CLI - inspect and check circuit documents from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cirq::{Circuit, CircuitOptions, CircuitRepresentation, LoadReport, PortOwner};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cirq")]
#[command(about = "Circuit graph document inspector", long_about = None)]
#[command(version)]
struct Cli {
    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a circuit document
    Show {
        /// Path to a circuit .json document
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// List the nets of one domain
    Nets {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Domain name
        #[arg(short, long)]
        domain: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Reload a document with connection checking and report refused connections
    Check {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Show { file, format } => handle_show(&file, format),
        Commands::Nets {
            file,
            domain,
            format,
        } => handle_nets(&file, &domain, format),
        Commands::Check { file, format } => handle_check(&file, format),
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };
    process::exit(exit_code);
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(file: &Path, options: CircuitOptions) -> Result<LoadReport> {
    tracing::debug!(path = %file.display(), verify = options.verify_on_load, "Reading circuit document");
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let repr = CircuitRepresentation::from_json(&content)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    repr.load(options)
        .with_context(|| format!("Failed to load circuit from {}", file.display()))
}

fn handle_show(file: &Path, format: OutputFormat) -> Result<i32> {
    let circuit = load(file, CircuitOptions::default())?.circuit;
    match format {
        OutputFormat::Human => output_summary(&circuit),
        OutputFormat::Json => println!("{}", circuit.to_json_pretty()?),
    }
    Ok(0)
}

fn output_summary(circuit: &Circuit) {
    println!("\nCircuit: {}", circuit.name());
    println!("{}", "─".repeat(60));

    println!("\n  Ports ({}):", circuit.port_list().len());
    for port in circuit.external_ports().filter_map(|id| circuit.port(id)) {
        println!("    - {} ({}, {})", port.name(), port.domain().name(), port.direction());
    }

    println!("\n  Instances ({}):", circuit.instance_count());
    for instance in circuit.instances() {
        let (col, row) = circuit.options().grid_cell(instance.layout_index());
        println!(
            "    - {}: {} (column {}, row {})",
            instance.name(),
            instance.component_type().name(),
            col,
            row
        );
    }

    println!("\n  Connections ({}):", circuit.connection_count());
    for connection in &circuit.to_representation().connections {
        println!("    - {}", connection);
    }

    let stats = circuit.stats();
    println!("\n  Summary:");
    println!("    Domains:         {}", stats.domain_count);
    println!("    Component types: {}", stats.component_type_count);
    println!("    Ports (total):   {}", stats.port_count);
}

fn handle_nets(file: &Path, domain: &str, format: OutputFormat) -> Result<i32> {
    let circuit = load(file, CircuitOptions::default())?.circuit;
    let Some(found) = circuit.domain_named(domain) else {
        anyhow::bail!("Unknown domain {:?} in {}", domain, file.display());
    };

    let nets: Vec<Vec<String>> = circuit
        .get_nets(&found)
        .into_iter()
        .map(|net| net.into_iter().filter_map(|p| circuit.port_label(p)).collect())
        .collect();

    match format {
        OutputFormat::Human => {
            println!("Nets of {} ({}):", domain, nets.len());
            for (i, net) in nets.iter().enumerate() {
                println!("  {}. {}", i + 1, net.join(", "));
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "domain": domain,
                "nets": nets,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(0)
}

fn handle_check(file: &Path, format: OutputFormat) -> Result<i32> {
    let report = load(file, CircuitOptions::verified())?;

    match format {
        OutputFormat::Human => {
            println!("\nFile: {}", file.display());
            println!("{}", "─".repeat(60));
            if report.rejected.is_empty() {
                println!("  All {} connections are valid", report.circuit.connection_count());
            } else {
                println!("\n  REJECTED:");
                for rejected in &report.rejected {
                    println!("    - {}: {}", rejected.connection, rejected.reason);
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "file": file.display().to_string(),
                "valid": report.rejected.is_empty(),
                "connections": report.circuit.connection_count(),
                "rejected": report.rejected.iter().map(|r| {
                    serde_json::json!({
                        "connection": r.connection,
                        "reason": r.reason.to_string(),
                    })
                }).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(if report.rejected.is_empty() { 0 } else { 1 })
}
