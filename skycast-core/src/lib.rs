//! Core library for the `skycast` CLI.
//!
//! This crate defines:
//! - A resilient OpenWeatherMap client (bounded retry, 404 as absence)
//! - Normalized weather models and the [`Report`] union over them
//! - A text presenter with condition icons
//! - Configuration & credentials handling
//!
//! It is used by `skycast-cli`, but can also be reused by other binaries or services.

pub mod client;
pub mod config;
pub mod error;
pub mod forecast;
mod lenient;
pub mod model;
pub mod present;

pub use client::{DEFAULT_FORECAST_COUNT, WeatherClient};
pub use config::{ClientConfig, Config, RetrySettings};
pub use error::WeatherError;
pub use forecast::summarize_forecast;
pub use model::{
    CoordinateWeatherSummary, Credentials, CurrentWeather, ForecastEntry, Report, Units,
    WeatherQuery,
};
pub use present::{Presenter, condition_icon};
