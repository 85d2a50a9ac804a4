use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use sunrank_core::{AppError, Config, ConfigError};
use sunrank_weather::format::{format_day, format_duration, format_optional, kmh_to_beaufort};
use sunrank_weather::{
    load_catalog, search_cities, CatalogSource, CityDescriptor, CityRanking, RankingService,
};

/// Rank cities by forecast sunshine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/sunrank/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the sunniest cities (default)
    Rank,
    /// Show the daily forecast for one city
    City { query: String },
    /// List cities matching a name
    Search { query: String },
    /// Manage the ranking cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum CacheCommands {
    /// Delete the cached ranking
    Clear,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = sunrank_core::init(cli.verbose) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    // An explicit path must exist; only the default location is created on demand
    if let Some(path) = cli.config.as_deref().filter(|path| !path.exists()) {
        return Err(ConfigError::Missing(path.display().to_string()).into());
    }

    let (config, _) = Config::load_validated(cli.config.as_deref())
        .map_err(|e| ConfigError::Invalid(format!("{:#}", e)))?;

    match cli.command.unwrap_or(Commands::Rank) {
        Commands::Rank => rank(&config).await,
        Commands::City { query } => city(&config, &query).await,
        Commands::Search { query } => search(&config, &query).await,
        Commands::Cache {
            command: CacheCommands::Clear,
        } => {
            RankingService::from_config(&config)?.cache().clear()?;
            println!("Cleared cached ranking in {}", config.cache.dir.display());
            Ok(())
        }
        Commands::Config {
            command: ConfigCommands::Show,
        } => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Commands::Config {
            command: ConfigCommands::Path,
        } => {
            let path = match cli.config {
                Some(path) => path,
                None => Config::config_path()?,
            };
            println!("{}", path.display());
            Ok(())
        }
    }
}

async fn rank(config: &Config) -> Result<(), AppError> {
    let service = RankingService::from_config(config)?;
    let outcome = service.rank_with_outcome().await;

    if outcome.rankings().is_empty() {
        println!("No sunshine ranking available right now. Try again later.");
        return Ok(());
    }

    println!("Sunniest cities, next {} days ({})", config.ranking.forecast_days, outcome.label());
    print_ranking(outcome.rankings());
    Ok(())
}

fn print_ranking(rankings: &[CityRanking]) {
    println!(
        "{:>3}  {:<28} {:>9} {:>9} {:>7}",
        "#", "City", "Avg sun", "Max temp", "Max UV"
    );
    for (position, city) in rankings.iter().enumerate() {
        println!(
            "{:>3}  {:<28} {:>9} {:>9} {:>7}",
            position + 1,
            city.name,
            format_duration(city.average_hours * 3600.0),
            format_optional(city.max_temp, "°C"),
            format_optional(city.max_uv, ""),
        );
    }
}

async fn load_search_catalog(
    service: &RankingService<sunrank_weather::FileStore>,
    config: &Config,
) -> Result<Vec<CityDescriptor>, AppError> {
    let source = CatalogSource::parse(&config.catalog.search_source);
    let catalog = load_catalog(service.client().http(), &source).await;

    if catalog.is_empty() {
        return Err(AppError::Catalog(format!("no cities loaded from {}", source)));
    }
    Ok(catalog)
}

async fn search(config: &Config, query: &str) -> Result<(), AppError> {
    let service = RankingService::from_config(config)?;
    let catalog = load_search_catalog(&service, config).await?;
    let matches = search_cities(&catalog, query);

    if matches.is_empty() {
        println!("No cities match {:?}", query);
        return Ok(());
    }

    for city in matches {
        println!(
            "{:<32} {:>7.2} {:>8.2}  {}",
            city.name, city.latitude, city.longitude, city.timezone
        );
    }
    Ok(())
}

async fn city(config: &Config, query: &str) -> Result<(), AppError> {
    let service = RankingService::from_config(config)?;
    let catalog = load_search_catalog(&service, config).await?;

    let Some(city) = search_cities(&catalog, query).into_iter().next() else {
        println!("No cities match {:?}", query);
        return Ok(());
    };

    let ranking = service
        .fetch_single_city_weather(city)
        .await
        .ok_or_else(|| AppError::Forecast(format!("no forecast for {}", city.name)))?;

    println!(
        "{}: {} of sunshine per day on average",
        ranking.name,
        format_duration(ranking.average_hours * 3600.0)
    );
    println!(
        "{:<11} {:>8} {:>8} {:>8} {:>5} {:>5}",
        "Day", "Sun", "Min", "Max", "UV", "Bft"
    );
    for day in &ranking.forecast {
        println!(
            "{:<11} {:>8} {:>8} {:>8} {:>5} {:>5}",
            format_day(day.date),
            format_duration(day.sun_seconds.unwrap_or(0.0)),
            format_optional(day.min_temp, "°C"),
            format_optional(day.max_temp, "°C"),
            format_optional(day.uv_index, ""),
            day.wind_speed
                .map(|kmh| kmh_to_beaufort(kmh).to_string())
                .unwrap_or_else(|| "-".to_string()),
        );
    }
    Ok(())
}
