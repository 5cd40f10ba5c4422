use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{convert::TryFrom, fmt};

use crate::{
    error::{Result, WeatherError},
    lenient,
};

/// API key plus an optional bearer token. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    token: Option<String>,
}

impl Credentials {
    /// Fails with [`WeatherError::InvalidConfiguration`] when the key is empty or blank.
    pub fn new(api_key: impl Into<String>, token: Option<String>) -> Result<Self> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(WeatherError::InvalidConfiguration("API key is required".to_string()));
        }

        let token = token.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

        Ok(Self { api_key, token })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    City(String),
    Coordinates { lat: f64, lon: f64 },
}

/// Measurement system requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Standard,
    #[default]
    Metric,
    Imperial,
}

impl Units {
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Standard => "standard",
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub const fn all() -> &'static [Units] {
        &[Units::Standard, Units::Metric, Units::Imperial]
    }

    /// Value of the `units` query parameter; kelvin is the provider default so it is omitted.
    pub fn query_value(&self) -> Option<&'static str> {
        match self {
            Units::Standard => None,
            other => Some(other.as_str()),
        }
    }

    pub fn temperature_suffix(&self) -> &'static str {
        match self {
            Units::Standard => " K",
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }

    pub fn wind_suffix(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Standard | Units::Metric => "m/s",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Units {
    type Error = WeatherError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "standard" => Ok(Units::Standard),
            "metric" => Ok(Units::Metric),
            "imperial" => Ok(Units::Imperial),
            _ => Err(WeatherError::InvalidConfiguration(format!(
                "Unknown units '{value}'. Supported units: standard, metric, imperial."
            ))),
        }
    }
}

/// Current conditions reduced to the four fields the presenter cares about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentWeather {
    #[serde(deserialize_with = "lenient::field")]
    pub temperature: Option<f64>,
    #[serde(deserialize_with = "lenient::field")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::percent")]
    pub humidity: Option<u8>,
    #[serde(deserialize_with = "lenient::field")]
    pub wind: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinateWeatherSummary {
    #[serde(deserialize_with = "lenient::field")]
    pub id: Option<i64>,
    #[serde(deserialize_with = "lenient::field")]
    pub main: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    pub icon: Option<String>,
}

/// One day of forecast. Loosely shaped: any JSON object with these keys deserializes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastEntry {
    #[serde(deserialize_with = "lenient::field")]
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    pub avg_temp: Option<f64>,
    #[serde(deserialize_with = "lenient::field")]
    pub avg_humidity: Option<f64>,
    #[serde(deserialize_with = "lenient::field")]
    pub avg_wind: Option<f64>,
}

/// Everything the presenter knows how to render.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Current(CurrentWeather),
    Coordinates(CoordinateWeatherSummary),
    Forecast(Vec<ForecastEntry>),
}

impl Report {
    /// Interpret loosely-typed JSON: an object is a single result, an array is a forecast.
    ///
    /// An object carrying condition keys (`id`, `main`, `icon`) and no measurements is read
    /// as a coordinate summary, everything else as current weather.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Object(map) => {
                let has_any = |keys: &[&str]| keys.iter().any(|k| map.contains_key(*k));
                let is_summary = has_any(&["id", "main", "icon"])
                    && !has_any(&["temperature", "humidity", "wind"]);
                let parsed = if is_summary {
                    serde_json::from_value(value.clone()).map(Report::Coordinates)
                } else {
                    serde_json::from_value(value.clone()).map(Report::Current)
                };
                parsed.map_err(|e| {
                    WeatherError::InvalidInput(format!("malformed weather result: {e}"))
                })
            }
            Value::Array(items) => {
                if let Some(pos) = items.iter().position(|item| !item.is_object()) {
                    return Err(WeatherError::InvalidInput(format!(
                        "forecast entry {pos} is not an object"
                    )));
                }
                serde_json::from_value(value.clone())
                    .map(Report::Forecast)
                    .map_err(|e| {
                        WeatherError::InvalidInput(format!("malformed forecast entry: {e}"))
                    })
            }
            other => Err(WeatherError::InvalidInput(format!(
                "expected a weather object or a list of forecast entries, got {}",
                json_kind(other)
            ))),
        }
    }
}

impl From<CurrentWeather> for Report {
    fn from(value: CurrentWeather) -> Self {
        Report::Current(value)
    }
}

impl From<CoordinateWeatherSummary> for Report {
    fn from(value: CoordinateWeatherSummary) -> Self {
        Report::Coordinates(value)
    }
}

impl From<Vec<ForecastEntry>> for Report {
    fn from(value: Vec<ForecastEntry>) -> Self {
        Report::Forecast(value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_api_keys_are_rejected() {
        for key in ["", " ", "\t\n", "    "] {
            let err = Credentials::new(key, None).unwrap_err();
            assert!(matches!(err, WeatherError::InvalidConfiguration(_)), "key {key:?}");
        }
    }

    #[test]
    fn credentials_trim_and_drop_blank_token() {
        let creds = Credentials::new("  KEY ", Some("   ".into())).expect("valid key");
        assert_eq!(creds.api_key(), "KEY");
        assert_eq!(creds.token(), None);
    }

    #[test]
    fn credentials_debug_hides_secrets() {
        let creds = Credentials::new("SECRET", Some("TOKEN".into())).unwrap();
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("SECRET"));
        assert!(!dbg.contains("TOKEN"));
    }

    #[test]
    fn units_as_str_roundtrip() {
        for units in Units::all() {
            let parsed = Units::try_from(units.as_str()).expect("roundtrip should succeed");
            assert_eq!(*units, parsed);
        }
        assert!(Units::try_from("furlongs").is_err());
        assert_eq!(Units::Standard.query_value(), None);
        assert_eq!(Units::Imperial.query_value(), Some("imperial"));
    }

    #[test]
    fn report_from_object_is_current_weather() {
        let report = Report::from_json(&json!({"description": "haze", "humidity": 40})).unwrap();
        assert_eq!(
            report,
            Report::Current(CurrentWeather {
                description: Some("haze".into()),
                humidity: Some(40),
                ..Default::default()
            })
        );
    }

    #[test]
    fn report_from_object_tolerates_float_humidity() {
        let report = Report::from_json(&json!({"description": "rain", "humidity": 60.0})).unwrap();
        assert_eq!(
            report,
            Report::Current(CurrentWeather {
                description: Some("rain".into()),
                humidity: Some(60),
                ..Default::default()
            })
        );
    }

    #[test]
    fn report_from_condition_object_is_coordinate_summary() {
        let report = Report::from_json(&json!({"id": 800, "main": "Clear", "icon": "01d"})).unwrap();
        assert_eq!(
            report,
            Report::Coordinates(CoordinateWeatherSummary {
                id: Some(800),
                main: Some("Clear".into()),
                description: None,
                icon: Some("01d".into()),
            })
        );
    }

    #[test]
    fn measurements_keep_object_as_current_weather() {
        let report = Report::from_json(&json!({"main": "Rain", "temperature": 4.5})).unwrap();
        assert!(matches!(report, Report::Current(w) if w.temperature == Some(4.5)));
    }

    #[test]
    fn report_from_array_is_forecast() {
        let report = Report::from_json(&json!([
            {"date": "2024-05-01", "description": "snow", "avg_temp": -1.0},
            {"date": "2024-05-02"}
        ]))
        .unwrap();

        match report {
            Report::Forecast(entries) => {
                assert_eq!(entries.len(), 2);
                assert_eq!(entries[0].avg_temp, Some(-1.0));
                assert_eq!(entries[1].description, None);
            }
            other => panic!("unexpected report {other:?}"),
        }
    }

    #[test]
    fn report_from_scalar_is_invalid_input() {
        for value in [json!(42), json!("sunny"), json!(null), json!(true)] {
            let err = Report::from_json(&value).unwrap_err();
            assert!(matches!(err, WeatherError::InvalidInput(_)));
        }
    }

    #[test]
    fn report_from_array_of_scalars_is_invalid_input() {
        let err = Report::from_json(&json!([{"date": "x"}, 3])).unwrap_err();
        assert!(err.to_string().contains("forecast entry 1"));
    }
}
