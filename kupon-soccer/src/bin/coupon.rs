use std::env;
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info, warn};

use kupon::file::{ReadJsonFile, WriteJsonFile};
use kupon_soccer::classifier::LinearSoftmax;
use kupon_soccer::domain::OddsQuote;
use kupon_soccer::engine::{CouponLeg, Engine, EngineConfig, Strategy};
use kupon_soccer::provider::{gather, StaticProvider};
use kupon_soccer::print;
use kupon_soccer::strength::TeamTable;

const SAMPLE_ODDS: OddsQuote = OddsQuote {
    home: 2.1,
    draw: 3.2,
    away: 4.5,
    over_2_5: 1.8,
    under_2_5: 2.0,
};

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// file to source the coupon legs from
    #[clap(short = 'f', long)]
    file: Option<PathBuf>,

    /// file to source the team ratings from
    #[clap(long)]
    teams: Option<PathBuf>,

    /// engine configuration file
    #[clap(long)]
    config: Option<PathBuf>,

    /// classifier parameter file
    #[clap(long)]
    classifier: Option<PathBuf>,

    /// prediction strategy: simple, enhanced or classifier
    #[clap(short = 's', long)]
    strategy: Option<Strategy>,

    /// time limit for each data fetch, in milliseconds
    #[clap(long = "timeout-ms", default_value = "2000")]
    timeout_ms: u64,

    /// quote sample odds for legs that carry none
    #[clap(long = "sample-market")]
    sample_market: bool,

    /// write the evaluated coupon to this file
    #[clap(short = 'o', long)]
    output: Option<PathBuf>,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if self.timeout_ms == 0 {
            bail!("the fetch timeout must be positive");
        }
        if self.strategy == Some(Strategy::Classifier) && self.classifier.is_none() {
            bail!("the classifier strategy requires the --classifier flag");
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
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

    let config = match &args.config {
        Some(path) => EngineConfig::read_json_file(path)?,
        None => EngineConfig::default(),
    };
    let teams = match &args.teams {
        Some(path) => TeamTable::read_json_file(path)?,
        None => TeamTable::sample(),
    };
    info!("rated teams: {}", teams.names().join(", "));
    let legs = match &args.file {
        Some(path) => Vec::<CouponLeg>::read_json_file(path)?,
        None => sample_coupon(),
    };

    let mut provider = StaticProvider::new(teams.clone());
    if args.sample_market {
        provider = provider.with_default_odds(SAMPLE_ODDS);
    }
    let mut engine = Engine::new(config, teams)?;
    if let Some(path) = &args.classifier {
        engine = engine.with_classifier(LinearSoftmax::load(path)?);
    }
    let strategy = args.strategy.unwrap_or_else(|| engine.default_strategy());
    info!("evaluating {} legs with the {strategy} strategy", legs.len());

    let legs = gather(&provider, legs, Duration::from_millis(args.timeout_ms)).await;
    let parlay = engine.evaluate_coupon(&strategy, &legs);

    info!(
        "legs:\n{}",
        Console::default().render(&print::tabulate_legs(&parlay.legs))
    );
    info!(
        "factors:\n{}",
        Console::default().render(&print::tabulate_factors(&parlay.legs))
    );
    if !parlay.failed.is_empty() {
        warn!(
            "{} legs could not be evaluated:\n{}",
            parlay.failed.len(),
            Console::default().render(&print::tabulate_failures(&parlay.failed))
        );
    }
    if parlay.is_degenerate() {
        warn!("no leg could be evaluated; there is nothing to recommend");
    }
    info!(
        "coupon:\n{}",
        Console::default().render(&print::tabulate_summary(&parlay))
    );

    if let Some(path) = &args.output {
        parlay.write_json_file(path)?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

fn sample_coupon() -> Vec<CouponLeg> {
    vec![
        CouponLeg::new("Galatasaray", "Fenerbahce", "1X2"),
        CouponLeg::new("Besiktas", "Trabzonspor", "O/U2.5"),
        CouponLeg::new("Basaksehir", "Besiktas", "1X2"),
    ]
}
