use reqwest::{
    StatusCode,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue},
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{
    RetryTransientMiddleware, Retryable, RetryableStrategy, policies::ExponentialBackoff,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    config::ClientConfig,
    error::{Result, WeatherError},
    forecast::summarize_forecast,
    lenient,
    model::{CoordinateWeatherSummary, CurrentWeather, ForecastEntry, Report, Units, WeatherQuery},
};

/// Number of forecast slots requested when the caller has no preference.
pub const DEFAULT_FORECAST_COUNT: u32 = 5;

const CURRENT_ENDPOINT: &str = "weather";
const FORECAST_ENDPOINT: &str = "forecast";

/// Statuses worth another attempt: rate limiting and flaky upstream servers.
const TRANSIENT_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

fn is_transient(status: StatusCode) -> bool {
    TRANSIENT_STATUSES.contains(&status)
}

/// Retries on [`TRANSIENT_STATUSES`] only. Transport errors and every other status are final.
struct TransientStatusStrategy;

impl RetryableStrategy for TransientStatusStrategy {
    fn handle(
        &self,
        res: &std::result::Result<reqwest::Response, reqwest_middleware::Error>,
    ) -> Option<Retryable> {
        match res {
            Ok(response) if is_transient(response.status()) => Some(Retryable::Transient),
            Ok(_) => None,
            Err(_) => Some(Retryable::Fatal),
        }
    }
}

/// OpenWeatherMap client holding one pooled HTTP session with bounded retry.
///
/// Query methods never fail: a 404, exhausted retries, timeouts and bad payloads are
/// logged and come back as `None`.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    units: Units,
    max_attempts: u32,
}

impl WeatherClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let retry = config.retry;
        if retry.max_attempts == 0 {
            return Err(WeatherError::InvalidConfiguration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if retry.min_backoff > retry.max_backoff {
            return Err(WeatherError::InvalidConfiguration(format!(
                "min_backoff {:?} exceeds max_backoff {:?}",
                retry.min_backoff, retry.max_backoff
            )));
        }

        let base_url = config.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(WeatherError::InvalidConfiguration("base URL is empty".to_string()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Some(token) = config.credentials.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
                WeatherError::InvalidConfiguration(
                    "bearer token contains characters not allowed in a header".to_string(),
                )
            })?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| {
                WeatherError::InvalidConfiguration(format!("failed to build HTTP client: {e}"))
            })?;

        let policy = ExponentialBackoff::builder()
            .retry_bounds(retry.min_backoff, retry.max_backoff)
            .build_with_max_retries(retry.max_attempts - 1);

        let http = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy_and_strategy(
                policy,
                TransientStatusStrategy,
            ))
            .build();

        Ok(Self {
            http,
            base_url,
            api_key: config.credentials.api_key().to_string(),
            units: config.units,
            max_attempts: retry.max_attempts,
        })
    }

    pub fn units(&self) -> Units {
        self.units
    }

    pub async fn current_weather_by_city(&self, city: &str) -> Option<CurrentWeather> {
        let data = self.request(CURRENT_ENDPOINT, vec![("q", city.to_string())]).await?;
        absorb(CURRENT_ENDPOINT, normalize_current(data))
    }

    pub async fn weather_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Option<CoordinateWeatherSummary> {
        let params = vec![("lat", lat.to_string()), ("lon", lon.to_string())];
        let data = self.request(CURRENT_ENDPOINT, params).await?;
        absorb(CURRENT_ENDPOINT, normalize_summary(data))
    }

    /// Raw forecast payload, passed through untouched.
    pub async fn forecast(&self, city: &str, count: u32) -> Option<Value> {
        let params = vec![("q", city.to_string()), ("cnt", count.to_string())];
        self.request(FORECAST_ENDPOINT, params).await
    }

    /// Forecast folded into one [`ForecastEntry`] per calendar day.
    pub async fn daily_forecast(&self, city: &str, count: u32) -> Option<Vec<ForecastEntry>> {
        let raw = self.forecast(city, count).await?;
        absorb(FORECAST_ENDPOINT, summarize_forecast(&raw))
    }

    pub async fn lookup(&self, query: &WeatherQuery) -> Option<Report> {
        match query {
            WeatherQuery::City(city) => self.current_weather_by_city(city).await.map(Report::from),
            WeatherQuery::Coordinates { lat, lon } => {
                self.weather_by_coordinates(*lat, *lon).await.map(Report::from)
            }
        }
    }

    async fn request(&self, endpoint: &str, params: Vec<(&'static str, String)>) -> Option<Value> {
        absorb(endpoint, self.fetch(endpoint, params).await)
    }

    async fn fetch(&self, endpoint: &str, mut params: Vec<(&'static str, String)>) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);

        params.push(("appid", self.api_key.clone()));
        if let Some(units) = self.units.query_value() {
            params.push(("units", units.to_string()));
        }

        debug!(%url, "sending weather request");
        let res = self.http.get(&url).query(&params).send().await?;

        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::NotFound { url });
        }
        if is_transient(status) {
            return Err(WeatherError::TransientUpstreamFailure {
                status: status.as_u16(),
                attempts: self.max_attempts,
            });
        }

        let body = res.text().await?;

        if !status.is_success() {
            return Err(WeatherError::UnexpectedStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// Report a failed outcome and turn it into absence.
fn absorb<T>(endpoint: &str, outcome: Result<T>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(err @ WeatherError::NotFound { .. }) => {
            info!(endpoint, "{err}");
            None
        }
        Err(err) if err.is_absence() => {
            warn!(endpoint, error = %err, "weather request failed");
            None
        }
        Err(err) => {
            error!(endpoint, error = %err, "unusable weather response");
            None
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwMain {
    #[serde(deserialize_with = "lenient::field")]
    temp: Option<f64>,
    #[serde(deserialize_with = "lenient::percent")]
    humidity: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCondition {
    #[serde(deserialize_with = "lenient::field")]
    id: Option<i64>,
    #[serde(deserialize_with = "lenient::field")]
    main: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    description: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwWind {
    #[serde(deserialize_with = "lenient::field")]
    speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwCurrentResponse {
    #[serde(deserialize_with = "lenient::field")]
    main: Option<OwMain>,
    #[serde(deserialize_with = "lenient::field")]
    weather: Option<Vec<OwCondition>>,
    #[serde(deserialize_with = "lenient::field")]
    wind: Option<OwWind>,
}

fn first_condition(weather: Option<Vec<OwCondition>>) -> OwCondition {
    weather.and_then(|w| w.into_iter().next()).unwrap_or_default()
}

/// Pull temperature, description, humidity and wind speed out of a `/weather` payload.
pub fn normalize_current(data: Value) -> Result<CurrentWeather> {
    let OwCurrentResponse { main, weather, wind } = serde_json::from_value(data)?;
    let main = main.unwrap_or_default();

    Ok(CurrentWeather {
        temperature: main.temp,
        description: first_condition(weather).description,
        humidity: main.humidity,
        wind: wind.unwrap_or_default().speed,
    })
}

/// Pull the first condition block out of a `/weather` payload.
pub fn normalize_summary(data: Value) -> Result<CoordinateWeatherSummary> {
    let OwCurrentResponse { weather, .. } = serde_json::from_value(data)?;
    let condition = first_condition(weather);

    Ok(CoordinateWeatherSummary {
        id: condition.id,
        main: condition.main,
        description: condition.description,
        icon: condition.icon,
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
