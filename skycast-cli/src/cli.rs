use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use inquire::{Password, Select, Text};
use skycast_core::{
    ClientConfig, Config, DEFAULT_FORECAST_COUNT, Presenter, Report, Units, WeatherClient,
    WeatherQuery,
};

use crate::interactive;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Current weather and forecasts from OpenWeatherMap")]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Settings that override the config file for a single run.
#[derive(Debug, Args)]
pub struct ConnectionArgs {
    /// OpenWeatherMap API key; falls back to the config file, then a prompt.
    #[arg(long, env = "API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Optional bearer token sent in the Authorization header.
    #[arg(long, env = "API_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// Measurement units: standard, metric or imperial.
    #[arg(long, global = true, value_parser = parse_units)]
    pub units: Option<Units>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key, token and preferred units.
    Configure,

    /// Show current weather for a city.
    Current {
        /// City name, optionally with country code, e.g. "Paris,FR".
        city: String,
    },

    /// Show current conditions at a coordinate pair.
    #[command(allow_negative_numbers = true)]
    Coords { lat: f64, lon: f64 },

    /// Show the forecast for a city.
    Forecast {
        city: String,

        /// Number of 3-hour forecast slots to request.
        #[arg(long, default_value_t = DEFAULT_FORECAST_COUNT)]
        count: u32,

        /// Print the provider's JSON instead of daily summaries.
        #[arg(long)]
        raw: bool,
    },

    /// Prompt for cities until `quit` (the default without a subcommand).
    Interactive,
}

fn parse_units(value: &str) -> Result<Units, String> {
    Units::try_from(value).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::load()?;
        let conn = &self.connection;

        match self.command.unwrap_or(Command::Interactive) {
            Command::Configure => configure(config)?,
            Command::Current { city } => {
                let (client, presenter) = conn.connect(&config)?;
                let report = client.lookup(&WeatherQuery::City(city)).await;
                show(&presenter, report)?;
            }
            Command::Coords { lat, lon } => {
                let (client, presenter) = conn.connect(&config)?;
                let report = client.lookup(&WeatherQuery::Coordinates { lat, lon }).await;
                show(&presenter, report)?;
            }
            Command::Forecast { city, count, raw: true } => {
                let (client, _) = conn.connect(&config)?;
                match client.forecast(&city, count).await {
                    Some(json) => println!("{}", serde_json::to_string_pretty(&json)?),
                    None => println!("⚠️  Could not retrieve forecast data."),
                }
            }
            Command::Forecast { city, count, raw: false } => {
                let (client, presenter) = conn.connect(&config)?;
                let report = client.daily_forecast(&city, count).await.map(Report::Forecast);
                show(&presenter, report)?;
            }
            Command::Interactive => {
                let (client, presenter) = conn.connect(&config)?;
                interactive::run(&client, &presenter).await?;
            }
        }

        Ok(())
    }
}

impl ConnectionArgs {
    /// Build the client and a matching presenter.
    fn connect(&self, config: &Config) -> Result<(WeatherClient, Presenter)> {
        let client_config = self.client_config(config)?;
        let presenter = Presenter::new(client_config.units);
        let client = WeatherClient::new(client_config)?;
        Ok((client, presenter))
    }

    /// Flags and environment win over the config file; a prompt is the last resort.
    fn client_config(&self, config: &Config) -> Result<ClientConfig> {
        let api_key = match &self.api_key {
            Some(key) => Some(key.clone()),
            None if config.is_configured() => None,
            None => Some(
                Password::new("Enter your OpenWeatherMap API key:")
                    .without_confirmation()
                    .prompt()
                    .context("API key is required to run the application")?,
            ),
        };

        let mut client_config = config.client_config(api_key, self.token.clone())?;
        if let Some(units) = self.units {
            client_config = client_config.with_units(units);
        }
        Ok(client_config)
    }
}

fn show(presenter: &Presenter, report: Option<Report>) -> Result<()> {
    match report {
        Some(report) => presenter.display(&report)?,
        None => println!("⚠️  Could not retrieve weather data."),
    }
    Ok(())
}

fn configure(mut config: Config) -> Result<()> {
    let api_key = Password::new("OpenWeatherMap API key:")
        .without_confirmation()
        .prompt()?;
    if api_key.trim().is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }
    config.api_key = Some(api_key.trim().to_string());

    let token = Text::new("Bearer token (optional, Esc to skip):").prompt_skippable()?;
    config.token = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

    let units = Select::new("Units:", Units::all().to_vec())
        .with_starting_cursor(1)
        .prompt()?;
    config.units = Some(units);

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
