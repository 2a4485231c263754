/// Pacer - headless training program player
use clap::{Parser, Subcommand};
use pacer_cli::{simulate, CliConfig, Library};
use pacer_core::{flatten_with_store, parse_program, Track, TrackStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pacer")]
#[command(about = "Manage training programs and play them on a simulated clock", long_about = None)]
struct Cli {
    /// Configuration file path (defaults to ./pacer.toml when present)
    #[arg(short, long, global = true, env = "PACER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a program document without storing it
    Validate {
        /// Program JSON file
        file: PathBuf,
    },
    /// Copy an audio file into the library as a track
    AddTrack {
        /// Audio file to import
        file: PathBuf,
        /// Track name (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,
        /// Tempo in beats per minute
        #[arg(short, long)]
        tempo: f64,
        /// Intro length in beats
        #[arg(short, long, default_value_t = 0.0)]
        intro: f64,
    },
    /// Validate a program document and store it in the library
    AddProgram {
        /// Program JSON file
        file: PathBuf,
    },
    /// List tracks and programs
    List,
    /// Print the flattened form of a stored program
    Flatten {
        /// Program name
        name: String,
    },
    /// Write programs with everything they reference into a zip archive
    Export {
        /// Archive to create
        file: PathBuf,
        /// Programs to export
        #[arg(required = true)]
        programs: Vec<String>,
    },
    /// Import an archive written by `export`
    Import {
        /// Archive to read
        file: PathBuf,
    },
    /// Play a stored program to the end on a virtual clock
    Simulate {
        /// Program name
        name: String,
        /// Seconds of virtual time between status lines
        #[arg(short, long, default_value_t = 10.0, value_parser = report_interval)]
        report_every: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pacer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate { file } => {
            validate(&file).await?;
        }
        Commands::AddTrack {
            file,
            name,
            tempo,
            intro,
        } => {
            add_track(&config, file, name, tempo, intro).await?;
        }
        Commands::AddProgram { file } => {
            let program = parse_program(&tokio::fs::read_to_string(&file).await?)?;
            let library = Library::open(&config.library).await?;
            library.add_program(program).await?;
        }
        Commands::List => {
            list(&config).await?;
        }
        Commands::Flatten { name } => {
            let library = Library::open(&config.library).await?;
            let root = library.store.require_program(&name).await?;
            let playable = flatten_with_store(library.store.as_ref(), &root).await?;
            println!("{}", serde_json::to_string_pretty(&playable)?);
        }
        Commands::Export { file, programs } => {
            let library = Library::open(&config.library).await?;
            let names: Vec<&str> = programs.iter().map(String::as_str).collect();
            let bundle = library.export(&file, &names).await?;
            println!(
                "Exported {} programs, {} tracks to {}",
                bundle.document.programs.len(),
                bundle.document.tracks.len(),
                file.display()
            );
        }
        Commands::Import { file } => {
            let library = Library::open(&config.library).await?;
            let summary = library.import(&file).await?;
            println!(
                "Imported {} programs, {} tracks, {} assets",
                summary.programs, summary.tracks, summary.assets
            );
        }
        Commands::Simulate { name, report_every } => {
            let library = Library::open(&config.library).await?;
            let mut stdout = std::io::stdout();
            simulate::run(&library, &config, &name, report_every, &mut stdout).await?;
        }
    }

    Ok(())
}

fn report_interval(value: &str) -> Result<f64, String> {
    let secs: f64 = value.parse().map_err(|e| format!("{e}"))?;
    simulate::parse_report_interval(secs).map_err(|e| e.to_string())
}

async fn validate(file: &Path) -> anyhow::Result<()> {
    let program = parse_program(&tokio::fs::read_to_string(file).await?)?;
    let nested: Vec<&str> = program.sub_program_names().collect();

    println!("{}: valid", program.name);
    println!("  entries: {}", program.content.len());
    if !nested.is_empty() {
        println!("  sub-programs: {}", nested.join(", "));
    }
    Ok(())
}

async fn add_track(
    config: &CliConfig,
    file: PathBuf,
    name: Option<String>,
    tempo: f64,
    intro: f64,
) -> anyhow::Result<()> {
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("{} has no usable file name", file.display()))?
        .to_string();
    let name = match name {
        Some(name) => name,
        None => file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&file_name)
            .to_string(),
    };

    let library = Library::open(&config.library).await?;
    library
        .add_track(&file, Track::new(name, file_name, tempo).with_intro(intro))
        .await?;
    Ok(())
}

async fn list(config: &CliConfig) -> anyhow::Result<()> {
    let library = Library::open(&config.library).await?;

    println!("Tracks:");
    for track in library.store.list_tracks().await? {
        println!("  {} - {} BPM ({})", track.name, track.tempo, track.path);
    }

    println!("Programs:");
    for program in library.store.list_programs().await? {
        let kind = if program.template { "template" } else { "program" };
        println!("  {} - {} entries, {kind}", program.name, program.content.len());
    }

    Ok(())
}
