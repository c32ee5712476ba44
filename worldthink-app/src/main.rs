use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use worldthink_common::observability::{LogConfig, init_logging};
use worldthink_common::{ClaimResult, CountryAnalysis};
use worldthink_config::{CredentialStore, WorldThinkConfig, WorldThinkConfigLoader};
use worldthink_geo::{CountryIndex, MapRenderer};
use worldthink_llm::normalize::normalize;
use worldthink_llm::prompt::{SYSTEM_PROMPT, build_prompt};
use session::{Level, Notification, Session};

mod render;
mod session;
mod tether;

/// See how the world reads a claim, country by country.
#[derive(Parser, Debug)]
#[command(name = "worldthink", version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: worldthink.yaml in the config dir and working dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Mirror logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a claim and print the summary and country cards
    Analyze {
        claim: String,

        /// Print the result as JSON instead of cards
        #[arg(long)]
        json: bool,

        /// Write the styled GeoJSON map to this path
        #[arg(long)]
        map: Option<PathBuf>,

        /// Show only this country
        #[arg(long)]
        country: Option<String>,
    },

    /// Print the prompt that would be sent for a claim
    Prompt { claim: String },

    /// Normalize a saved model response without calling the API
    Normalize {
        file: PathBuf,

        #[arg(long)]
        claim: String,

        #[arg(long)]
        json: bool,
    },

    /// Read claims from stdin, keeping the latest result in memory
    Interactive,

    /// Manage the stored Perplexity API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
}

#[derive(Subcommand, Debug)]
enum KeyAction {
    /// Store a key
    Set { key: String },
    /// Report whether a key is stored
    Status {
        /// Also send a tiny request to confirm the key is accepted
        #[arg(long)]
        check: bool,
    },
    /// Remove the stored key
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let loader = match &cli.config {
        Some(path) => WorldThinkConfigLoader::new().with_file(path),
        None => WorldThinkConfigLoader::new().with_default_files(),
    };
    let cfg: WorldThinkConfig = loader.load().context("failed to load configuration")?;

    init_logging(LogConfig {
        log_dir: cfg.logging.dir.clone(),
        emit_stderr: cli.verbose,
        format: cfg.logging.format,
        ..LogConfig::default()
    })?;
    tracing::debug!(config = ?cli.config, verbose = cli.verbose, "worldthink starting");

    match cli.command {
        Command::Analyze {
            claim,
            json,
            map,
            country,
        } => analyze(&cfg, &claim, json, map.as_deref(), country.as_deref()).await,
        Command::Prompt { claim } => {
            println!("# System\n{SYSTEM_PROMPT}\n\n# User\n{}", build_prompt(&claim));
            Ok(())
        }
        Command::Normalize { file, claim, json } => {
            let text = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let result = normalize(&text, &claim, chrono::Utc::now())?;
            print_result(&result, json, None)
        }
        Command::Interactive => interactive(&cfg).await,
        Command::Key { action } => key(&cfg, action).await,
    }
}

async fn analyze(
    cfg: &WorldThinkConfig,
    claim: &str,
    json: bool,
    map: Option<&Path>,
    country: Option<&str>,
) -> Result<()> {
    let store = CredentialStore::default_location()?;
    let analyzer = tether::build_analyzer(&cfg.llm, &store)?;

    let analysis = match analyzer.analyze(claim).await {
        Ok(analysis) => analysis,
        Err(err) => bail!(Notification::for_failure(&err).message),
    };
    let note = Notification::for_analysis(&analysis);
    notify(&note);

    let selected = match country {
        Some(name) => {
            let hit = CountryIndex::build(&analysis.result.country_analysis).lookup(name);
            if hit.is_none() {
                bail!("no analysis for country {name:?}");
            }
            hit
        }
        None => None,
    };
    print_result(&analysis.result, json, selected)?;

    if let Some(path) = map {
        let renderer = tether::build_map_renderer(&cfg.map)?;
        export_map(&renderer, &analysis.result.country_analysis, path).await;
    }
    Ok(())
}

fn print_result(
    result: &ClaimResult,
    json: bool,
    selected: Option<&CountryAnalysis>,
) -> Result<()> {
    if json {
        let out = match selected {
            Some(country) => serde_json::to_string_pretty(country)?,
            None => serde_json::to_string_pretty(result)?,
        };
        println!("{out}");
        return Ok(());
    }

    println!("{}", render::summary_card(result));
    let cards = match selected {
        Some(country) => render::country_card(country),
        None => render::country_cards(&result.country_analysis),
    };
    if !cards.is_empty() {
        println!("\n{cards}");
    }
    println!("\n{}", render::legend());
    Ok(())
}

/// Map failures are reported and otherwise ignored; the analysis stands.
async fn export_map(renderer: &MapRenderer, countries: &[CountryAnalysis], path: &Path) {
    let styled = match renderer.render(countries).await {
        Ok(styled) => styled,
        Err(err) => {
            eprintln!("{err}");
            return;
        }
    };
    let written = match serde_json::to_vec_pretty(&styled.collection) {
        Ok(bytes) => tokio::fs::write(path, bytes).await.map_err(anyhow::Error::from),
        Err(err) => Err(err.into()),
    };
    match written {
        Ok(()) => {
            println!("{}", render::map_stats(&styled.stats));
            println!("Map written to {}", path.display());
        }
        Err(err) => {
            tracing::error!(path = %path.display(), error = %err, "map.write_failed");
            eprintln!("Failed to write map to {}: {err}", path.display());
        }
    }
}

fn notify(note: &Notification) {
    match note.level {
        Level::Success => println!("{}", note.message),
        Level::Warning => println!("warning: {}", note.message),
        Level::Error => eprintln!("{}", note.message),
    }
}

async fn interactive(cfg: &WorldThinkConfig) -> Result<()> {
    let store = CredentialStore::default_location()?;
    let analyzer = tether::build_analyzer(&cfg.llm, &store)?;
    let renderer = tether::build_map_renderer(&cfg.map)?;
    let mut session = Session::new();

    println!("Enter a claim to analyze. Commands: :country <NAME>, :all, :map <PATH>, :quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match line.split_once(' ').unwrap_or((line, "")) {
            ("", _) => continue,
            (":quit" | ":q", _) => break,
            (":all", _) => {
                session.clear_selection();
                show(&session);
            }
            (":country", name) => match session.select(name.trim()) {
                Some(country) => println!("{}", render::country_card(country)),
                None => println!("No data for {:?}", name.trim()),
            },
            (":map", path) => match session.result() {
                Some(result) if !path.trim().is_empty() => {
                    export_map(&renderer, &result.country_analysis, Path::new(path.trim())).await
                }
                Some(_) => println!("usage: :map <PATH>"),
                None => println!("Nothing to map yet"),
            },
            (cmd, _) if cmd.starts_with(':') => println!("Unknown command {cmd}"),
            _ => {
                let note = session.record(analyzer.analyze(line).await);
                notify(&note);
                if note.level != Level::Error {
                    show(&session);
                }
            }
        }
    }
    Ok(())
}

fn show(session: &Session) {
    let Some(result) = session.result() else {
        return;
    };
    println!("{}", render::summary_card(result));
    let cards = render::country_cards(session.visible_countries());
    if !cards.is_empty() {
        println!("\n{cards}");
    }
}

async fn key(cfg: &WorldThinkConfig, action: KeyAction) -> Result<()> {
    let store = CredentialStore::default_location()?;
    match action {
        KeyAction::Set { key } => {
            store.save(&key)?;
            println!("API key saved to {}", store.path().display());
        }
        KeyAction::Status { check } => {
            if store.load()?.key().is_some() {
                println!("An API key is stored in {}", store.path().display());
            } else {
                println!("No API key stored");
            }
            if check {
                let api_key = tether::resolve_api_key(&cfg.llm, &store)?;
                let client = tether::build_llm_client(&cfg.llm, api_key)?;
                if client.health_check().await? {
                    println!("{} accepted the key", client.model_name());
                } else {
                    bail!("{} did not answer; see the log for details", client.model_name());
                }
            }
        }
        KeyAction::Clear => {
            store.clear()?;
            println!("Stored API key cleared");
        }
    }
    Ok(())
}
