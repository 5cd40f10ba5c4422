//! Folding the provider's 3-hourly forecast slots into daily averages.

use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{
    error::{Result, WeatherError},
    lenient,
    model::ForecastEntry,
};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwSlotMain {
    #[serde(deserialize_with = "lenient::field")]
    temp: Option<f64>,
    #[serde(deserialize_with = "lenient::field")]
    humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwSlotCondition {
    #[serde(deserialize_with = "lenient::field")]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwSlotWind {
    #[serde(deserialize_with = "lenient::field")]
    speed: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OwSlot {
    #[serde(deserialize_with = "lenient::field")]
    dt: Option<i64>,
    #[serde(deserialize_with = "lenient::field")]
    dt_txt: Option<String>,
    #[serde(deserialize_with = "lenient::field")]
    main: Option<OwSlotMain>,
    #[serde(deserialize_with = "lenient::field")]
    weather: Option<Vec<OwSlotCondition>>,
    #[serde(deserialize_with = "lenient::field")]
    wind: Option<OwSlotWind>,
}

impl OwSlot {
    fn date(&self) -> Option<NaiveDate> {
        self.dt
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.date_naive())
            .or_else(|| {
                let txt = self.dt_txt.as_deref()?;
                NaiveDate::parse_from_str(txt.get(..10)?, "%Y-%m-%d").ok()
            })
    }
}

#[derive(Debug, Default)]
struct Mean {
    sum: f64,
    count: u32,
}

impl Mean {
    fn add(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    fn get(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / f64::from(self.count))
    }
}

#[derive(Debug, Default)]
struct DayAccumulator {
    temp: Mean,
    humidity: Mean,
    wind: Mean,
    /// (description, occurrences), in first-seen order.
    descriptions: Vec<(String, u32)>,
}

impl DayAccumulator {
    fn add(&mut self, slot: OwSlot) {
        let main = slot.main.unwrap_or_default();
        self.temp.add(main.temp);
        self.humidity.add(main.humidity);
        self.wind.add(slot.wind.unwrap_or_default().speed);

        let description = slot
            .weather
            .and_then(|w| w.into_iter().next())
            .and_then(|c| c.description);
        if let Some(desc) = description {
            match self.descriptions.iter_mut().find(|(d, _)| *d == desc) {
                Some((_, n)) => *n += 1,
                None => self.descriptions.push((desc, 1)),
            }
        }
    }

    /// Most frequent description; the earliest one wins a tie.
    fn dominant_description(&self) -> Option<String> {
        let mut best: Option<&(String, u32)> = None;
        for entry in &self.descriptions {
            if best.is_none_or(|b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(d, _)| d.clone())
    }

    fn finish(self, date: Option<NaiveDate>) -> ForecastEntry {
        ForecastEntry {
            date: date.map(|d| d.to_string()),
            description: self.dominant_description(),
            avg_temp: self.temp.get(),
            avg_humidity: self.humidity.get(),
            avg_wind: self.wind.get(),
        }
    }
}

/// Group the raw `/forecast` payload's `list` by calendar day (UTC) and average each day.
///
/// Slots without a usable timestamp are collected into one trailing undated entry.
pub fn summarize_forecast(raw: &Value) -> Result<Vec<ForecastEntry>> {
    let list = raw
        .get("list")
        .and_then(Value::as_array)
        .ok_or_else(|| WeatherError::InvalidInput("forecast payload has no `list` array".into()))?;

    let mut days: BTreeMap<Option<NaiveDate>, DayAccumulator> = BTreeMap::new();
    for item in list {
        let slot: OwSlot = serde_json::from_value(item.clone())
            .map_err(|e| WeatherError::InvalidInput(format!("malformed forecast slot: {e}")))?;
        days.entry(slot.date()).or_default().add(slot);
    }

    // `None` sorts first in a BTreeMap; undated slots belong at the end.
    let undated = days.remove(&None);
    let mut entries: Vec<ForecastEntry> =
        days.into_iter().map(|(date, acc)| acc.finish(date)).collect();
    if let Some(acc) = undated {
        entries.push(acc.finish(None));
    }

    Ok(entries)
}
