//! CSV record parsing.
//!
//! Header names are matched case-insensitively after trimming, so
//! `Tarih`, ` tarih ` and `TARIH` all find the date column. Rows that
//! cannot be converted are skipped with a warning; only a missing
//! required column or an unreadable file fails the whole load.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use ecopulse_score_models::{Month, Quarter, Score};
use serde::Serialize;

use crate::IngestError;

/// Observation date column of the monthly and daily files.
pub const DATE_COLUMN: &str = "tarih";
/// City name column of every file.
pub const CITY_COLUMN: &str = "sehir";
/// Monthly average score column.
pub const MONTHLY_SCORE_COLUMN: &str = "aylik_ortalama_ecopulse";
/// Forecast date column.
pub const FORECAST_DATE_COLUMN: &str = "tahmin_tarihi";
/// Forecast score column.
pub const FORECAST_SCORE_COLUMN: &str = "tahmini_ecopulse_skoru";
/// Daily NO2 score column.
pub const NO2_COLUMN: &str = "no2_skoru";
/// Daytime temperature column (°C).
pub const TEMP_DAY_COLUMN: &str = "sicaklik_gunduz_c";
/// Night-time temperature column (°C).
pub const TEMP_NIGHT_COLUMN: &str = "sicaklik_gece_c";
/// Daily precipitation column (mm).
pub const PRECIPITATION_COLUMN: &str = "yagis_mm_gun";

/// One city's average score for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyRecord {
    /// City name.
    pub city: String,
    /// Calendar year.
    pub year: i32,
    /// Calendar month.
    pub month: Month,
    /// Monthly average score.
    pub score: Score,
}

/// One city's forecast score for one quarter.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRecord {
    /// City name.
    pub city: String,
    /// Forecast year.
    pub year: i32,
    /// Quarter the forecast date falls in.
    pub quarter: Quarter,
    /// Forecast score.
    pub score: Score,
}

/// One city's observations for one day. Every measurement is optional.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyObservation {
    /// City name.
    pub city: String,
    /// Observation date.
    pub date: NaiveDate,
    /// NO2 score.
    pub no2: Option<f64>,
    /// Daytime temperature in °C.
    pub temp_day: Option<f64>,
    /// Night-time temperature in °C.
    pub temp_night: Option<f64>,
    /// Precipitation in mm.
    pub precipitation: Option<f64>,
}

/// Parses a date in `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM` form. Month-only dates resolve to
/// the first of the month.
///
/// # Errors
///
/// Returns [`IngestError::InvalidRow`] if none of the formats match.
pub fn parse_date(s: &str) -> Result<NaiveDate, IngestError> {
    let s = s.trim();
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt.date());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(date);
    }
    NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").map_err(|e| {
        IngestError::InvalidRow {
            message: format!("Invalid date '{s}': {e}. Expected format: YYYY-MM-DD"),
        }
    })
}

/// Reads monthly score rows (`tarih`, `sehir`, `aylik_ortalama_ecopulse`).
///
/// # Errors
///
/// Returns [`IngestError`] if the header row is unreadable or a required
/// column is missing.
pub fn read_monthly<R: Read>(reader: R) -> Result<Vec<MonthlyRecord>, IngestError> {
    read_rows(
        reader,
        "monthly",
        &[DATE_COLUMN, CITY_COLUMN, MONTHLY_SCORE_COLUMN],
        |row| {
            let date = parse_date(row.required(DATE_COLUMN)?)?;
            Ok(MonthlyRecord {
                city: row.city()?,
                year: date.year(),
                month: month_of(date)?,
                score: parse_score(row.required(MONTHLY_SCORE_COLUMN)?)?,
            })
        },
    )
}

/// Reads forecast rows (`tahmin_tarihi`, `sehir`, `tahmini_ecopulse_skoru`).
/// The quarter is derived from the forecast date's month.
///
/// # Errors
///
/// Returns [`IngestError`] if the header row is unreadable or a required
/// column is missing.
pub fn read_forecast<R: Read>(reader: R) -> Result<Vec<ForecastRecord>, IngestError> {
    read_rows(
        reader,
        "forecast",
        &[FORECAST_DATE_COLUMN, CITY_COLUMN, FORECAST_SCORE_COLUMN],
        |row| {
            let date = parse_date(row.required(FORECAST_DATE_COLUMN)?)?;
            Ok(ForecastRecord {
                city: row.city()?,
                year: date.year(),
                quarter: Quarter::for_month(month_of(date)?),
                score: parse_score(row.required(FORECAST_SCORE_COLUMN)?)?,
            })
        },
    )
}

/// Reads daily observation rows. Only `tarih` and `sehir` are required;
/// measurement columns may be missing or blank.
///
/// # Errors
///
/// Returns [`IngestError`] if the header row is unreadable or a required
/// column is missing.
pub fn read_daily<R: Read>(reader: R) -> Result<Vec<DailyObservation>, IngestError> {
    read_rows(reader, "daily", &[DATE_COLUMN, CITY_COLUMN], |row| {
        Ok(DailyObservation {
            city: row.city()?,
            date: parse_date(row.required(DATE_COLUMN)?)?,
            no2: row.number(NO2_COLUMN),
            temp_day: row.number(TEMP_DAY_COLUMN),
            temp_night: row.number(TEMP_NIGHT_COLUMN),
            precipitation: row.number(PRECIPITATION_COLUMN),
        })
    })
}

/// A CSV row with its fields addressable by normalized header name.
struct Row<'a> {
    columns: &'a BTreeMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl<'a> Row<'a> {
    fn get(&self, column: &str) -> Option<&'a str> {
        self.columns
            .get(column)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
    }

    fn required(&self, column: &str) -> Result<&'a str, IngestError> {
        self.get(column)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| IngestError::InvalidRow {
                message: format!("empty '{column}'"),
            })
    }

    fn city(&self) -> Result<String, IngestError> {
        self.required(CITY_COLUMN).map(str::to_string)
    }

    fn number(&self, column: &str) -> Option<f64> {
        self.get(column)
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| value.is_finite())
    }
}

fn read_rows<R, T, F>(
    reader: R,
    kind: &str,
    required: &[&'static str],
    parse: F,
) -> Result<Vec<T>, IngestError>
where
    R: Read,
    F: Fn(&Row<'_>) -> Result<T, IngestError>,
{
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let columns: BTreeMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect();

    if let Some(column) = required
        .iter()
        .copied()
        .find(|c| !columns.contains_key(*c))
    {
        return Err(IngestError::MissingColumn { column });
    }

    let mut records = Vec::new();
    let mut skipped = 0_usize;

    for (i, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = i + 2;
        let parsed = result
            .map_err(IngestError::from)
            .and_then(|record| {
                parse(&Row {
                    columns: &columns,
                    record: &record,
                })
            });
        match parsed {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                log::warn!("Skipping {kind} row at line {line}: {e}");
            }
        }
    }

    log::debug!(
        "Parsed {} {kind} records ({skipped} skipped)",
        records.len()
    );
    Ok(records)
}

fn parse_score(value: &str) -> Result<Score, IngestError> {
    value
        .parse::<f64>()
        .ok()
        .and_then(|v| Score::new(v).ok())
        .ok_or_else(|| IngestError::InvalidRow {
            message: format!("invalid score '{value}'"),
        })
}

fn month_of(date: NaiveDate) -> Result<Month, IngestError> {
    u8::try_from(date.month())
        .ok()
        .and_then(|m| Month::new(m).ok())
        .ok_or_else(|| IngestError::InvalidRow {
            message: format!("invalid month in {date}"),
        })
}
