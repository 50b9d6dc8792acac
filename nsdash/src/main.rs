//! nsdash - command-line view over the dashboard core
//!
//! Every command follows the same loop the interactive dashboard uses:
//! resume the persisted session, dispatch the intent actions, let the runtime
//! settle, then print the affected slice as JSON.
//!
//! # Usage
//!
//! ```sh
//! nsdash species
//! nsdash species 1
//! nsdash --api https://chewbbaca.online/NS/api/ modes 1 1
//! nsdash login ana@example.org 'secret'
//! nsdash whoami
//! ```

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use nsdash::error::ErrorInfo;
use nsdash::{
    creators, load_settings, Action, AppState, Dashboard, FileStorage, HttpTransport, Settings,
    SystemClock,
};

/// Query a chewie-NS nomenclature server from the terminal
#[derive(Parser, Debug)]
#[command(name = "nsdash")]
#[command(about = "Browse species, schemas and loci of a nomenclature server")]
struct Args {
    /// TOML settings file (defaults to the user config directory)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// API base URL, overriding settings and environment
    #[arg(long)]
    api: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Species roster, or the schemas of one species
    Species { id: Option<String> },
    /// Alleles per locus for every schema of a species
    Loci { species: String },
    /// Allele mode distribution of a schema
    Modes { species: String, schema: String },
    /// Allele length statistics of a schema
    Lengths { species: String, schema: String },
    Annotations { species: String, schema: String },
    Description { species: String, schema: String },
    Contributions { species: String, schema: String },
    /// Alleles and UniProt annotation of a locus
    Locus { id: String },
    /// Find loci containing a DNA sequence (raw or FASTA)
    Search { sequence: String },
    Login { email: String, password: String },
    Logout,
    /// Profile of the logged-in user
    Whoami,
}

impl Command {
    fn actions(&self) -> Result<Vec<Action>, Box<dyn Error>> {
        let actions = match self {
            Command::Species { id: None } => vec![Action::StatsFetch],
            Command::Species { id: Some(id) } => vec![Action::SpeciesSchemasFetch {
                species: id.clone(),
            }],
            Command::Loci { species } => vec![Action::SpeciesLociFetch {
                species: species.clone(),
            }],
            Command::Modes { species, schema } => vec![Action::SchemaModesFetch {
                species: species.clone(),
                schema: schema.clone(),
            }],
            Command::Lengths { species, schema } => vec![Action::SchemaLengthsFetch {
                species: species.clone(),
                schema: schema.clone(),
            }],
            Command::Annotations { species, schema } => vec![Action::AnnotationsFetch {
                species: species.clone(),
                schema: schema.clone(),
            }],
            Command::Description { species, schema } => vec![Action::DescriptionsFetch {
                species: species.clone(),
                schema: schema.clone(),
            }],
            Command::Contributions { species, schema } => vec![Action::ContributionsFetch {
                species: species.clone(),
                schema: schema.clone(),
            }],
            Command::Locus { id } => vec![
                Action::LocusFastaFetch { locus: id.clone() },
                Action::LocusUniprotFetch { locus: id.clone() },
            ],
            Command::Search { sequence } => vec![creators::search_sequence(sequence)?],
            Command::Login { email, password } => vec![creators::login(email, password)?],
            Command::Logout => vec![Action::AuthLogout],
            Command::Whoami => vec![Action::ProfileFetch],
        };
        Ok(actions)
    }

    /// The slice this command displays, plus the first error it holds.
    fn view(&self, state: &AppState) -> serde_json::Result<(Value, Option<ErrorInfo>)> {
        let (value, error) = match self {
            Command::Species { id: None } => (
                serde_json::to_value(&state.stats)?,
                state.stats.species.error.clone(),
            ),
            Command::Species { id: Some(_) } => (
                serde_json::to_value(&state.species.schemas)?,
                state.species.schemas.error.clone(),
            ),
            Command::Loci { .. } => (
                serde_json::to_value(&state.species.loci_alleles)?,
                state.species.loci_alleles.error.clone(),
            ),
            Command::Modes { .. } => (
                serde_json::to_value(&state.schema.modes)?,
                state.schema.modes.error.clone(),
            ),
            Command::Lengths { .. } => (
                serde_json::to_value(&state.schema.lengths)?,
                state.schema.lengths.error.clone(),
            ),
            Command::Annotations { .. } => (
                serde_json::to_value(&state.annotations)?,
                state.annotations.rows.error.clone(),
            ),
            Command::Description { .. } => (
                serde_json::to_value(&state.descriptions)?,
                state.descriptions.text.error.clone(),
            ),
            Command::Contributions { .. } => (
                serde_json::to_value(&state.contributions)?,
                state.contributions.rows.error.clone(),
            ),
            Command::Locus { .. } => (
                serde_json::to_value(&state.locus)?,
                state
                    .locus
                    .alleles
                    .error
                    .clone()
                    .or_else(|| state.locus.uniprot.error.clone()),
            ),
            Command::Search { .. } => (
                serde_json::to_value(&state.sequences)?,
                state.sequences.search.error.clone(),
            ),
            Command::Login { .. } | Command::Logout => (
                serde_json::to_value(&state.auth)?,
                state.auth.error.clone(),
            ),
            Command::Whoami => (
                serde_json::to_value(&state.profile)?,
                state.profile.user.error.clone(),
            ),
        };
        Ok((value, error))
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<ExitCode, Box<dyn Error>> {
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(api) = args.api {
        settings.api_base_url = api;
    }
    init_tracing(&settings);

    // Validate input before touching storage or the network
    let actions = args.command.actions()?;

    let transport = HttpTransport::new(&settings)?;
    let storage = FileStorage::open(settings.storage_path())?;
    let mut dashboard = Dashboard::new(
        &settings,
        Arc::new(transport),
        Arc::new(storage),
        Arc::new(SystemClock),
    );

    dashboard.resume_session();
    for action in actions {
        dashboard.dispatch(action);
    }
    if !dashboard.settle().await {
        return Err("runtime stopped before the request finished".into());
    }

    let (value, error) = args.command.view(dashboard.state())?;
    println!("{}", serde_json::to_string_pretty(&value)?);

    match error {
        Some(error) => {
            eprintln!("Error: {}", error.message);
            Ok(ExitCode::FAILURE)
        }
        None => Ok(ExitCode::SUCCESS),
    }
}
