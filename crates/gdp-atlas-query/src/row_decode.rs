// SPDX-License-Identifier: Apache-2.0

use gdp_atlas_model::{Country, CountryCode, Metric, Observation, Year};

use crate::query_error::{QueryError, QueryErrorCode};
use crate::tabular::{Cell, Record, TabularResult};

fn decode_error(row: usize, message: impl std::fmt::Display) -> QueryError {
    QueryError::new(QueryErrorCode::Parse, format!("row {row}: {message}"))
}

fn required_text(record: &Record<'_>, column: &str) -> Result<String, QueryError> {
    record
        .get(column)
        .filter(|cell| !cell.is_null())
        .map(Cell::render)
        .ok_or_else(|| decode_error(record.index(), format!("missing `{column}`")))
}

fn country_code(record: &Record<'_>) -> Result<CountryCode, QueryError> {
    let raw = required_text(record, "country_code")?;
    CountryCode::parse(&raw).map_err(|e| decode_error(record.index(), e))
}

/// Rows of the `countries` table (or any projection carrying `country_code`
/// and `name`). Missing coordinate columns decode as `None`.
pub fn decode_countries(table: &TabularResult) -> Result<Vec<Country>, QueryError> {
    table
        .records()
        .map(|record| -> Result<Country, QueryError> {
            Ok(Country {
                code: country_code(&record)?,
                name: required_text(&record, "name")?,
                lat: record.f64("lat"),
                lng: record.f64("lng"),
            })
        })
        .collect()
}

/// Rows carrying `country_code` and `year`; indicator columns that are not
/// projected stay `None`.
pub fn decode_observations(table: &TabularResult) -> Result<Vec<Observation>, QueryError> {
    let present: Vec<Metric> = Metric::ALL
        .into_iter()
        .filter(|m| table.column(m.column()).is_some())
        .collect();
    table
        .records()
        .map(|record| -> Result<Observation, QueryError> {
            let raw_year = record
                .i64("year")
                .ok_or_else(|| decode_error(record.index(), "missing or non-integer `year`"))?;
            let year = i32::try_from(raw_year)
                .map_err(|e| decode_error(record.index(), e))
                .and_then(|y| Year::new(y).map_err(|e| decode_error(record.index(), e)))?;
            let mut obs = Observation::empty(country_code(&record)?, year);
            for metric in &present {
                obs.set_metric(*metric, record.f64(metric.column()));
            }
            Ok(obs)
        })
        .collect()
}
