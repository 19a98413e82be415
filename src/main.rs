use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use log::info;

use healthguard_report::{ReportConfig, ReportEngine, ReportRecord};

#[derive(Parser)]
#[command(name = "healthguard-report", version, about = "Render HealthGuard prediction reports to PDF")]
struct Cli {
    /// JSON configuration file (missing keys keep their defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a report record (JSON file, or `-` for stdin) to PDF
    Render {
        record: PathBuf,
        /// Storage root; the PDF is written to <DIR>/reports/
        #[arg(long, default_value = "uploads", conflicts_with = "stdout")]
        out_dir: PathBuf,
        /// Write the PDF to stdout instead of storing it
        #[arg(long)]
        stdout: bool,
    },
    /// Print the computed card geometry for a record as JSON
    Layout { record: PathBuf },
}

fn read_record(path: &Path) -> anyhow::Result<ReportRecord> {
    let text = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("reading record from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    ReportRecord::from_json(&text).with_context(|| format!("decoding {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ReportConfig::from_json_file(path)?,
        None => ReportConfig::default(),
    };
    let engine = ReportEngine::new(config)?;

    match cli.command {
        Command::Render { record, out_dir, stdout } => {
            let record = read_record(&record)?;
            if stdout {
                let bytes = engine.render_to_bytes(&record)?;
                let mut out = io::stdout().lock();
                out.write_all(&bytes)?;
                out.flush()?;
            } else {
                let path = engine.render_and_store(&record, &out_dir)?;
                info!("report {} rendered", record.report_id);
                println!("{}", path.display());
            }
        }
        Command::Layout { record } => {
            let record = read_record(&record)?;
            let layout = engine.layout(&record)?;
            println!("{}", serde_json::to_string_pretty(&layout)?);
        }
    }
    Ok(())
}
