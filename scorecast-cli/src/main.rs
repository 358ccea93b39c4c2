use std::collections::HashMap;
use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tinyrand::StdRand;
use tracing::{debug, info};

use scorecast_core::domain::{Bundle, Fixture, LateShock, League, LeagueCode};
use scorecast_core::domain::error::Warning;
use scorecast_core::domain::{Distribution, FitArtifact, Match, TeamId};
use scorecast_core::fit::FitConfig;
use scorecast_core::model::ticket_generator::GenerationConfig;
use scorecast_core::model::{correlation, shock};
use scorecast_core::{generate_bundle, predict_fixture};
use scorecast_core::print::{tabulate_bundle, tabulate_distribution, tabulate_fit_artifact, tabulate_fit_metrics};

#[derive(Debug, Parser)]
#[command(name = "scorecast", version, about = "Dixon-Coles fitting and jackpot ticket generation")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fit team strengths from a JSON file of historical matches
    Fit {
        /// path to a JSON array of `Match` records
        #[arg(short = 'f', long)]
        file: PathBuf,

        /// where to write the fitted `FitArtifact` as JSON
        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
    /// Predict a 1x2 distribution for a single fixture given a fitted artifact
    Predict {
        /// path to a JSON-serialised `FitArtifact`
        #[arg(short = 'a', long)]
        artifact: PathBuf,

        /// home team id
        #[arg(long)]
        home: String,

        /// away team id
        #[arg(long)]
        away: String,
    },
    /// Generate a jackpot ticket bundle for a slate of fixtures
    GenerateBundle {
        /// path to a JSON-serialised `FitArtifact`
        #[arg(short = 'a', long)]
        artifact: PathBuf,

        /// path to a JSON array of `Fixture` records
        #[arg(short = 'f', long)]
        fixtures: PathBuf,

        /// optional path to a JSON array of `League` records, used for the
        /// league-prior draw component
        #[arg(short = 'l', long)]
        leagues: Option<PathBuf>,

        /// number of tickets to produce
        #[arg(short = 'n', long, default_value_t = 5)]
        tickets: usize,
    },
}

impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        match &self.command {
            Command::Fit { file, .. } if !file.exists() => {
                bail!("match file {} does not exist", file.display())
            }
            Command::Predict { artifact, .. } if !artifact.exists() => {
                bail!("artifact file {} does not exist", artifact.display())
            }
            Command::GenerateBundle { artifact, fixtures, leagues, tickets } => {
                if !artifact.exists() {
                    bail!("artifact file {} does not exist", artifact.display());
                }
                if !fixtures.exists() {
                    bail!("fixtures file {} does not exist", fixtures.display());
                }
                if let Some(leagues) = leagues {
                    if !leagues.exists() {
                        bail!("leagues file {} does not exist", leagues.display());
                    }
                }
                if *tickets == 0 {
                    bail!("--tickets must be at least 1");
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");

    match &args.command {
        Command::Fit { file, out } => run_fit(file, out.as_deref()),
        Command::Predict { artifact, home, away } => run_predict(artifact, home, away),
        Command::GenerateBundle { artifact, fixtures, leagues, tickets } => {
            run_generate_bundle(artifact, fixtures, leagues.as_deref(), *tickets)
        }
    }
}

fn run_fit(file: &PathBuf, out: Option<&std::path::Path>) -> Result<(), Box<dyn Error>> {
    let body = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let matches: Vec<Match> = serde_json::from_str(&body)?;
    info!("loaded {} matches", matches.len());

    let config = FitConfig::default();
    let (artifact, metrics, warnings) = scorecast_core::fit(&matches, &config)?;
    log_warnings(&warnings);

    println!("{}", Console::default().render(&tabulate_fit_artifact(&artifact)));
    println!("{}", Console::default().render(&tabulate_fit_metrics(&metrics)));

    if let Some(out) = out {
        let json = serde_json::to_string_pretty(&artifact)?;
        fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;
        info!("wrote fitted artifact to {}", out.display());
    }
    Ok(())
}

fn run_predict(artifact_path: &PathBuf, home: &str, away: &str) -> Result<(), Box<dyn Error>> {
    let artifact = load_artifact(artifact_path)?;
    let home_id: TeamId = home.into();
    let away_id: TeamId = away.into();
    // no structural fixture data is available for a bare team-id pair, so
    // every §4.3 component falls back to neutral
    let fixture = Fixture {
        id: format!("{home}-vs-{away}"),
        league: LeagueCode(String::new()),
        home_id,
        away_id,
        kickoff: None,
        opening_odds: None,
        closing_odds: None,
        weather_draw_index: None,
        rest_days_home: None,
        rest_days_away: None,
        referee_avg_cards: None,
        referee_avg_penalties: None,
        xg_draw_index: None,
        head_to_head: None,
        home_elo: None,
        away_elo: None,
    };
    let dist: Distribution = predict_fixture(&fixture, &artifact, None, None)?;
    println!("{}", Console::default().render(&tabulate_distribution(&dist)));
    Ok(())
}

fn run_generate_bundle(
    artifact_path: &PathBuf,
    fixtures_path: &PathBuf,
    leagues_path: Option<&std::path::Path>,
    tickets: usize,
) -> Result<(), Box<dyn Error>> {
    let artifact = load_artifact(artifact_path)?;
    let body = fs::read_to_string(fixtures_path)
        .with_context(|| format!("reading {}", fixtures_path.display()))?;
    let fixtures: Vec<Fixture> = serde_json::from_str(&body)?;
    info!("loaded {} fixtures", fixtures.len());

    let leagues = match leagues_path {
        Some(path) => load_leagues(path)?,
        None => HashMap::new(),
    };

    let distributions = fixtures
        .iter()
        .map(|fixture| predict_fixture(fixture, &artifact, leagues.get(&fixture.league), None))
        .collect::<Result<Vec<Distribution>, _>>()?;

    let weights = correlation::CorrelationWeights::default();
    let correlation_matrix = correlation::build_correlation_matrix(&fixtures, &distributions, weights);
    let shocks: Vec<LateShock> = shock::detect_late_shocks(&fixtures, &distributions);

    let config = GenerationConfig::default();
    let mut rng = StdRand::default();
    let (bundle, warnings): (Bundle, Vec<Warning>) = generate_bundle(
        &fixtures,
        &distributions,
        &correlation_matrix,
        &shocks,
        tickets,
        &config,
        &mut rng,
    )?;
    log_warnings(&warnings);

    println!("{}", Console::default().render(&tabulate_bundle(&bundle)));
    Ok(())
}

fn load_artifact(path: &PathBuf) -> anyhow::Result<FitArtifact> {
    let body = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let artifact: FitArtifact = serde_json::from_str(&body)?;
    Ok(artifact)
}

fn load_leagues(path: &std::path::Path) -> anyhow::Result<HashMap<LeagueCode, League>> {
    let body = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let leagues: Vec<League> = serde_json::from_str(&body)?;
    info!("loaded {} leagues", leagues.len());
    Ok(leagues.into_iter().map(|league| (league.code.clone(), league)).collect())
}

fn log_warnings(warnings: &[Warning]) {
    for warning in warnings {
        tracing::warn!("{warning}");
    }
}
