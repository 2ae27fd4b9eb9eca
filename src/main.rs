use std::fs::File;
use std::path::{Path, PathBuf};
use std::process;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};

use roster_docs::config::ReportConfig;
use roster_docs::media::HttpImageSource;
use roster_docs::registration::{RegistrationForm, validate_registration};
use roster_docs::store::{MemoryStore, RosterStore};
use roster_docs::{Artifact, Error, ExportKind, all_players_workbook, team_report, write_artifact};

#[derive(Parser)]
#[command(name = "roster-docs", about = "Team roster reports and player registration")]
struct Cli {
    /// TOML report configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// League logo used for the header band and watermark.
    #[arg(long, global = true)]
    watermark: Option<PathBuf>,

    /// Per-image fetch timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct TeamArgs {
    /// Roster snapshot (JSON).
    #[arg(long)]
    roster: PathBuf,

    /// Official whose team is reported.
    #[arg(long)]
    official: String,

    /// Output file; defaults to the artifact name in the current directory.
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// PDF roster with declaration and signature block.
    Pdf(TeamArgs),
    /// Word-processor roster.
    Docx(TeamArgs),
    /// Spreadsheet with embedded ID photos and selfies.
    Xlsx {
        #[arg(long)]
        roster: PathBuf,
        #[arg(long, conflicts_with = "all", required_unless_present = "all")]
        official: Option<String>,
        /// Every registered player instead of a single team.
        #[arg(long)]
        all: bool,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Validate a registration form and append it to the roster.
    Register {
        #[arg(long)]
        roster: PathBuf,
        /// Registration form (JSON).
        #[arg(long)]
        form: PathBuf,
        /// Reference date for the age check (YYYY-MM-DD); defaults to today.
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

fn load_config(cli: &Cli) -> Result<ReportConfig, Error> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::from_file(path)?,
        None => ReportConfig::default(),
    };
    if let Some(watermark) = &cli.watermark {
        config.watermark = Some(watermark.clone());
    }
    if let Some(timeout) = cli.timeout {
        config.fetch_timeout_secs = timeout;
    }
    Ok(config)
}

fn save(artifact: &Artifact, out: Option<&Path>) -> Result<(), Error> {
    let path = out.map_or_else(|| PathBuf::from(&artifact.filename), Path::to_path_buf);
    let mut file = File::create(&path)?;
    write_artifact(artifact, &mut file)?;
    println!("{} ({}, {} bytes)", path.display(), artifact.content_type, artifact.bytes.len());
    Ok(())
}

fn run(cli: &Cli) -> Result<(), Error> {
    let config = load_config(cli)?;

    match &cli.command {
        Command::Pdf(args) | Command::Docx(args) => {
            let kind = if matches!(cli.command, Command::Pdf(_)) {
                ExportKind::Pdf
            } else {
                ExportKind::Docx
            };
            let store = MemoryStore::load(&args.roster)?;
            let source = HttpImageSource::new(config.fetch_timeout())?;
            let artifact = team_report(&store, &args.official, kind, &source, &config)?;
            save(&artifact, args.out.as_deref())
        }
        Command::Xlsx {
            roster,
            official,
            all,
            out,
        } => {
            let store = MemoryStore::load(roster)?;
            let source = HttpImageSource::new(config.fetch_timeout())?;
            let artifact = match official {
                Some(official) if !*all => {
                    team_report(&store, official, ExportKind::Xlsx, &source, &config)?
                }
                _ => all_players_workbook(&store, &source, &config)?,
            };
            save(&artifact, out.as_deref())
        }
        Command::Register {
            roster,
            form,
            today,
        } => {
            let mut store = MemoryStore::load(roster)?;
            let form: RegistrationForm = serde_json::from_str(&std::fs::read_to_string(form)?)?;
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            let player = validate_registration(&form, &store, today)?;
            let id = store.insert_player(player)?;
            store.save(roster)?;
            println!("registered {id}");
            Ok(())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
