use serde_json::Value;
use std::io::{self, Write};

use crate::{
    error::Result,
    model::{CoordinateWeatherSummary, CurrentWeather, ForecastEntry, Report, Units},
};

/// Pick a decorative icon for a condition description.
///
/// Case-insensitive substring match, first hit wins.
pub fn condition_icon(description: &str) -> &'static str {
    let desc = description.to_lowercase();

    if desc.contains("clear") {
        "☀️"
    } else if desc.contains("cloud") {
        "☁️"
    } else if desc.contains("rain") || desc.contains("drizzle") {
        "🌧️"
    } else if desc.contains("thunder") {
        "⛈️"
    } else if desc.contains("snow") {
        "❄️"
    } else {
        ""
    }
}

/// Renders [`Report`]s as plain text lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct Presenter {
    units: Units,
}

impl Presenter {
    pub fn new(units: Units) -> Self {
        Self { units }
    }

    /// Print a report to stdout.
    pub fn display(&self, report: &Report) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.render(report, &mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Print loosely-typed JSON; see [`Report::from_json`] for the accepted shapes.
    pub fn display_json(&self, value: &Value) -> Result<()> {
        self.display(&Report::from_json(value)?)
    }

    pub fn render<W: Write>(&self, report: &Report, out: &mut W) -> Result<()> {
        match report {
            Report::Current(weather) => self.render_current(weather, out)?,
            Report::Coordinates(summary) => self.render_summary(summary, out)?,
            Report::Forecast(entries) => self.render_forecast(entries, out)?,
        }
        Ok(())
    }

    /// Convenience for callers that want the lines as a string.
    pub fn render_to_string(&self, report: &Report) -> Result<String> {
        let mut buf = Vec::new();
        self.render(report, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn render_current<W: Write>(&self, weather: &CurrentWeather, out: &mut W) -> io::Result<()> {
        weather_line(out, "", weather.description.as_deref().unwrap_or_default())?;

        if let Some(temp) = weather.temperature {
            writeln!(out, "Temperature: {temp}{}", self.units.temperature_suffix())?;
        }
        if let Some(humidity) = weather.humidity {
            writeln!(out, "Humidity: {humidity}%")?;
        }
        if let Some(wind) = weather.wind {
            writeln!(out, "Wind Speed: {wind} {}", self.units.wind_suffix())?;
        }
        Ok(())
    }

    fn render_summary<W: Write>(
        &self,
        summary: &CoordinateWeatherSummary,
        out: &mut W,
    ) -> io::Result<()> {
        let desc = summary
            .description
            .as_deref()
            .or(summary.main.as_deref())
            .unwrap_or_default();
        weather_line(out, "", desc)
    }

    fn render_forecast<W: Write>(&self, entries: &[ForecastEntry], out: &mut W) -> io::Result<()> {
        for day in entries {
            writeln!(out, "Date: {}", day.date.as_deref().unwrap_or_default())?;
            weather_line(out, "  ", day.description.as_deref().unwrap_or_default())?;

            if let Some(temp) = day.avg_temp {
                writeln!(out, "  Avg Temp: {temp:.1}{}", self.units.temperature_suffix())?;
            }
            if let Some(humidity) = day.avg_humidity {
                writeln!(out, "  Avg Humidity: {humidity:.0}%")?;
            }
            if let Some(wind) = day.avg_wind {
                writeln!(out, "  Avg Wind: {wind:.1} {}", self.units.wind_suffix())?;
            }

            writeln!(out)?;
        }
        Ok(())
    }
}

fn weather_line<W: Write>(out: &mut W, indent: &str, desc: &str) -> io::Result<()> {
    match condition_icon(desc) {
        "" => writeln!(out, "{indent}Weather: {desc}"),
        icon => writeln!(out, "{indent}Weather: {desc} {icon}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WeatherError;
    use serde_json::json;

    fn render(report: &Report) -> String {
        Presenter::new(Units::Metric).render_to_string(report).expect("rendering to memory")
    }

    #[test]
    fn icon_rules_in_order() {
        assert_eq!(condition_icon("Clear sky"), "☀️");
        assert_eq!(condition_icon("broken CLOUDS"), "☁️");
        assert_eq!(condition_icon("light rain"), "🌧️");
        assert_eq!(condition_icon("drizzle"), "🌧️");
        assert_eq!(condition_icon("thunderstorm"), "⛈️");
        assert_eq!(condition_icon("heavy snow"), "❄️");
        assert_eq!(condition_icon("mist"), "");
        assert_eq!(condition_icon(""), "");
    }

    #[test]
    fn first_matching_rule_wins() {
        // "rain" is checked before "thunder"
        assert_eq!(condition_icon("thunderstorm with rain"), "🌧️");
        assert_eq!(condition_icon("clouds with snow"), "☁️");
    }

    #[test]
    fn full_current_weather_renders_four_lines() {
        let report = Report::Current(CurrentWeather {
            temperature: Some(21.5),
            description: Some("light rain".into()),
            humidity: Some(60),
            wind: Some(3.2),
        });

        let text = render(&report);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "Weather: light rain 🌧️",
                "Temperature: 21.5°C",
                "Humidity: 60%",
                "Wind Speed: 3.2 m/s",
            ]
        );
    }

    #[test]
    fn description_only_renders_one_line() {
        let report = Report::Current(CurrentWeather {
            description: Some("clear sky".into()),
            ..Default::default()
        });

        assert_eq!(render(&report), "Weather: clear sky ☀️\n");
    }

    #[test]
    fn zero_values_are_still_present() {
        let report = Report::Current(CurrentWeather {
            temperature: Some(0.0),
            description: Some("haze".into()),
            humidity: Some(0),
            wind: Some(0.0),
        });

        assert_eq!(render(&report).lines().count(), 4);
    }

    #[test]
    fn imperial_units_change_labels() {
        let report = Report::Current(CurrentWeather {
            temperature: Some(70.0),
            wind: Some(5.0),
            ..Default::default()
        });

        let text = Presenter::new(Units::Imperial).render_to_string(&report).unwrap();

        assert!(text.contains("Temperature: 70°F"));
        assert!(text.contains("Wind Speed: 5 mph"));
    }

    #[test]
    fn forecast_omits_missing_wind_line() {
        let report = Report::Forecast(vec![
            ForecastEntry {
                date: Some("2024-05-01".into()),
                description: Some("overcast clouds".into()),
                avg_temp: Some(12.34),
                avg_humidity: Some(71.6),
                avg_wind: Some(4.26),
            },
            ForecastEntry {
                date: Some("2024-05-02".into()),
                description: Some("light snow".into()),
                avg_temp: Some(-1.0),
                avg_humidity: Some(88.0),
                avg_wind: None,
            },
        ]);

        let text = render(&report);

        assert_eq!(
            text,
            "Date: 2024-05-01\n\
             \x20 Weather: overcast clouds ☁️\n\
             \x20 Avg Temp: 12.3°C\n\
             \x20 Avg Humidity: 72%\n\
             \x20 Avg Wind: 4.3 m/s\n\
             \n\
             Date: 2024-05-02\n\
             \x20 Weather: light snow ❄️\n\
             \x20 Avg Temp: -1.0°C\n\
             \x20 Avg Humidity: 88%\n\
             \n"
        );
    }

    #[test]
    fn coordinate_summary_falls_back_to_main() {
        let report = Report::Coordinates(CoordinateWeatherSummary {
            id: Some(800),
            main: Some("Clear".into()),
            description: None,
            icon: Some("01d".into()),
        });

        assert_eq!(render(&report), "Weather: Clear ☀️\n");
    }

    #[test]
    fn display_json_rejects_scalars() {
        let presenter = Presenter::default();
        for value in [json!(3.5), json!("rain"), json!(null)] {
            let err = presenter.display_json(&value).unwrap_err();
            assert!(matches!(err, WeatherError::InvalidInput(_)));
        }
    }
}
