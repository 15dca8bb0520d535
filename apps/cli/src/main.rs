//! `ddcc` - issue DDCC certificates into an IHE MHD registry from the command line.

mod config;
mod logging;
mod render;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use ddcc_mhd::{
    fetch_proof_attachment, AssemblyOptions, EncounterResponses, GenerationContext, Generator,
    ImmunizationConverter, SourceDocument, SubmissionOutcome,
};
use ddcc_models::List;
use ddcc_registry_client::{RegistryClient, RegistryClientOptions};
use serde_json::Value;

use crate::config::Config;
use crate::render::FileRenderer;

#[derive(Parser)]
#[command(
    name = "ddcc",
    about = "Issue DDCC certificates as IHE MHD Provide Document Bundle transactions",
    version,
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the certificate transaction for a DDCC document and submit it to the registry.
    Generate {
        /// Structured DDCC document bundle (JSON).
        #[arg(long)]
        document: PathBuf,
        /// Patient resource of the holder (JSON).
        #[arg(long)]
        patient: PathBuf,
        /// Encounter responses (JSON).
        #[arg(long)]
        responses: PathBuf,
        /// Holder's existing folder List (JSON). Omit on first issuance.
        #[arg(long)]
        folder: Option<PathBuf>,
        /// Pre-rendered certificate document to attach.
        #[arg(long)]
        rendered: PathBuf,
        /// Print the transaction instead of submitting it.
        #[arg(long, action = ArgAction::SetTrue)]
        dry_run: bool,
        /// Where to write the dry-run transaction (stdout if omitted).
        #[arg(short, long, requires = "dry_run")]
        output: Option<PathBuf>,
        /// Pretty-print JSON output.
        #[arg(short, long)]
        pretty: bool,
    },

    /// Fetch the proof-of-vaccination image attached to a DocumentReference.
    Qr {
        /// DocumentReference id.
        id: String,
        /// Output file path (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print CLI version.
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Version = cli.command {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = Config::load().context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {e}"))?;
    logging::init_logging(&config.logging).context("Failed to initialize logging")?;

    match cli.command {
        Commands::Generate {
            document,
            patient,
            responses,
            folder,
            rendered,
            dry_run,
            output,
            pretty,
        } => {
            run_generate(
                &config,
                GenerateInputs {
                    document: &document,
                    patient: &patient,
                    responses: &responses,
                    folder: folder.as_deref(),
                    rendered: &rendered,
                },
                dry_run.then_some(output.as_deref()),
                pretty,
            )
            .await?;
        }
        Commands::Qr { id, output } => {
            run_qr(&config, &id, output.as_deref()).await?;
        }
        Commands::Version => {}
    }

    Ok(())
}

struct GenerateInputs<'a> {
    document: &'a Path,
    patient: &'a Path,
    responses: &'a Path,
    folder: Option<&'a Path>,
    rendered: &'a Path,
}

async fn run_generate(
    config: &Config,
    inputs: GenerateInputs<'_>,
    dry_run: Option<Option<&Path>>,
    pretty: bool,
) -> Result<()> {
    let document = SourceDocument::new(read_json(inputs.document)?)
        .context("Document bundle is not usable")?;
    let responses: EncounterResponses = serde_json::from_value(read_json(inputs.responses)?)
        .with_context(|| format!("Invalid responses in '{}'", inputs.responses.display()))?;
    let folder: Option<List> = inputs
        .folder
        .map(|path| {
            serde_json::from_value(read_json(path)?)
                .with_context(|| format!("Invalid folder List in '{}'", path.display()))
        })
        .transpose()?;
    let context = GenerationContext::new(Utc::now(), read_json(inputs.patient)?, folder, responses)
        .context("Generation context is not usable")?;

    let client = Arc::new(registry_client(config)?);
    let options = AssemblyOptions {
        registry_base: client.base_url().clone(),
        submission_set_system: config.identifiers.submission_set_system.clone(),
        folder_system: config.identifiers.folder_system.clone(),
    };
    let generator = Generator::new(
        client.clone(),
        Arc::new(ImmunizationConverter),
        Arc::new(FileRenderer::new(inputs.rendered)),
        client,
        options,
    );

    if let Some(output) = dry_run {
        let prepared = generator.prepare(&document, &context).await?;
        tracing::info!(
            history_recovered = prepared.history_recovered,
            history_skipped = prepared.history_skipped,
            "Dry run, transaction not submitted"
        );
        return write_json_output(&serde_json::to_value(&prepared.bundle)?, output, pretty);
    }

    let report = generator.generate(&document, context).await?;
    tracing::info!(
        document_id = %report.document_id,
        submission_set = %report.ids.submission_set,
        folder = %report.ids.folder,
        history_recovered = report.history_recovered,
        history_skipped = report.history_skipped,
        "Generation finished"
    );
    match report.submission {
        SubmissionOutcome::Accepted { status } => {
            eprintln!("Registry accepted the transaction ({status})");
            Ok(())
        }
        SubmissionOutcome::Failed { message } => {
            anyhow::bail!("Registry rejected the transaction: {message}")
        }
    }
}

async fn run_qr(config: &Config, id: &str, output: Option<&Path>) -> Result<()> {
    let client = registry_client(config)?;
    let proof = fetch_proof_attachment(&client, id)
        .await
        .with_context(|| format!("Failed to fetch proof attachment of DocumentReference/{id}"))?;
    tracing::info!(
        content_type = proof.content_type.as_deref(),
        bytes = proof.data.len(),
        "Proof attachment fetched"
    );

    match output {
        Some(path) => {
            fs::write(path, &proof.data)
                .with_context(|| format!("Failed to write to {:?}", path))?;
            eprintln!("Wrote proof image to {:?}", path);
        }
        None => {
            use std::io::Write;
            std::io::stdout()
                .write_all(&proof.data)
                .context("Failed to write proof image to stdout")?;
        }
    }
    Ok(())
}

fn registry_client(config: &Config) -> Result<RegistryClient> {
    let base_url = config.registry_base_url().map_err(anyhow::Error::msg)?;
    let options = RegistryClientOptions {
        base_url,
        submission_url: config.submission_url().map_err(anyhow::Error::msg)?,
        timeout: config.timeout(),
    };
    RegistryClient::new(options).context("Failed to create registry client")
}

fn read_json(path: &Path) -> Result<Value> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("File is not valid JSON: {}", path.display()))
}

fn write_json_output(value: &Value, output: Option<&Path>, pretty: bool) -> Result<()> {
    let content = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match output {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("Failed to write to {:?}", path))?;
            eprintln!("Wrote output to {:?}", path);
        }
        None => println!("{content}"),
    }
    Ok(())
}
