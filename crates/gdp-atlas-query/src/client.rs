// SPDX-License-Identifier: Apache-2.0

//! Typed query surface over the executor: builds a template, runs it and
//! shapes the result.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use gdp_atlas_core::ProcessPort;
use gdp_atlas_model::{Country, CountryCode, Metric, Observation, Year, YearRange};

use crate::config::BridgeConfig;
use crate::descriptor::{OutputFormat, QueryDescriptor};
use crate::events::EventSink;
use crate::executor::QueryExecutor;
use crate::limits::QueryLimits;
use crate::query_error::{QueryError, QueryErrorCode};
use crate::row_decode::{decode_countries, decode_observations};
use crate::tabular::TabularResult;
use crate::templates::{self, SortOrder, GEO_ANALYSIS_SINCE_YEAR};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearSpan {
    pub min_year: Year,
    pub max_year: Year,
    pub total_years: u64,
    pub countries_with_data: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryStatistics {
    pub total_countries: u64,
    pub total_records: u64,
    /// `None` when the observation table is empty.
    pub year_range: Option<YearSpan>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeographicalAnalysis {
    pub geographical: TabularResult,
    pub regional: TabularResult,
    pub correlation: TabularResult,
}

pub struct GdpQueries {
    executor: QueryExecutor,
    limits: QueryLimits,
    min_country_observations: u32,
}

impl GdpQueries {
    pub fn connect(
        config: &BridgeConfig,
        process: Arc<dyn ProcessPort>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, QueryError> {
        let executor = QueryExecutor::connect(config, process, sink)?;
        Ok(Self::new(executor, config))
    }

    #[must_use]
    pub fn new(executor: QueryExecutor, config: &BridgeConfig) -> Self {
        Self {
            executor,
            limits: config.limits.clone(),
            min_country_observations: config.min_country_observations,
        }
    }

    #[must_use]
    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    #[must_use]
    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    fn table(&self, query: &QueryDescriptor) -> Result<TabularResult, QueryError> {
        self.executor.query_table(query)
    }

    fn first_count(&self, query: &QueryDescriptor, column: &str) -> Result<u64, QueryError> {
        let table = self.table(query)?;
        let value = table
            .record(0)
            .and_then(|r| r.i64(column))
            .ok_or_else(|| {
                QueryError::new(QueryErrorCode::Parse, format!("`{column}` missing from result"))
            })?;
        u64::try_from(value).map_err(|e| QueryError::new(QueryErrorCode::Parse, e.to_string()))
    }

    /// Runs caller-written SQL read-only and normalizes the output.
    pub fn custom(&self, sql: &str) -> Result<TabularResult, QueryError> {
        if sql.trim().is_empty() {
            return Err(QueryError::validation("query text must not be empty"));
        }
        self.table(&QueryDescriptor::new(sql, OutputFormat::Csv))
    }

    /// Runs caller-written SQL and returns the backend text in `format`.
    pub fn custom_raw(&self, sql: &str, format: OutputFormat) -> Result<String, QueryError> {
        if sql.trim().is_empty() {
            return Err(QueryError::validation("query text must not be empty"));
        }
        Ok(self.executor.execute(&QueryDescriptor::new(sql, format))?)
    }

    pub fn all_countries(&self) -> Result<TabularResult, QueryError> {
        self.table(&templates::all_countries())
    }

    pub fn countries(&self) -> Result<Vec<Country>, QueryError> {
        decode_countries(&self.all_countries()?)
    }

    pub fn countries_with_gdp_data(&self) -> Result<TabularResult, QueryError> {
        self.table(&templates::countries_with_gdp_data(
            self.min_country_observations,
        ))
    }

    pub fn country_by_code(&self, code: &CountryCode) -> Result<TabularResult, QueryError> {
        self.table(&templates::country_by_code(code))
    }

    pub fn search_countries_by_name(&self, pattern: &str) -> Result<TabularResult, QueryError> {
        self.table(&templates::search_countries_by_name(pattern, &self.limits)?)
    }

    pub fn data_by_country(
        &self,
        code: &CountryCode,
        start: Option<Year>,
        end: Option<Year>,
    ) -> Result<TabularResult, QueryError> {
        self.table(&templates::data_by_country(code, start, end)?)
    }

    pub fn observations_by_country(
        &self,
        code: &CountryCode,
        start: Option<Year>,
        end: Option<Year>,
    ) -> Result<Vec<Observation>, QueryError> {
        decode_observations(&self.data_by_country(code, start, end)?)
    }

    pub fn data_by_year(&self, year: Year) -> Result<TabularResult, QueryError> {
        self.table(&templates::data_by_year(year))
    }

    pub fn data_range(
        &self,
        range: YearRange,
        codes: &[CountryCode],
    ) -> Result<TabularResult, QueryError> {
        self.table(&templates::data_range(range, codes, &self.limits)?)
    }

    pub fn latest_data_by_country(&self, code: &CountryCode) -> Result<TabularResult, QueryError> {
        self.table(&templates::latest_data_by_country(code))
    }

    pub fn top_countries_by_metric(
        &self,
        metric: Metric,
        year: Year,
        limit: usize,
        order: SortOrder,
    ) -> Result<TabularResult, QueryError> {
        self.table(&templates::top_countries_by_metric(
            metric,
            year,
            limit,
            order,
            &self.limits,
        )?)
    }

    pub fn trend_data(&self, code: &CountryCode, metric: Metric) -> Result<TabularResult, QueryError> {
        self.table(&templates::trend_data(code, metric))
    }

    pub fn comparative_data(
        &self,
        codes: &[CountryCode],
        metric: Metric,
        range: YearRange,
    ) -> Result<TabularResult, QueryError> {
        self.table(&templates::comparative_data(
            codes,
            metric,
            range,
            &self.limits,
        )?)
    }

    pub fn summary_statistics(&self) -> Result<SummaryStatistics, QueryError> {
        let total_countries = self.first_count(&templates::country_count(), "count")?;
        let total_records = self.first_count(&templates::observation_count(), "count")?;
        let span = self.table(&templates::year_span())?;
        let year_range = match span.record(0) {
            Some(row) => match (row.i64("min_year"), row.i64("max_year")) {
                (Some(min), Some(max)) => Some(YearSpan {
                    min_year: to_year(min)?,
                    max_year: to_year(max)?,
                    total_years: row.i64("total_years").map_or(0, |v| v.max(0) as u64),
                    countries_with_data: row
                        .i64("countries_with_data")
                        .map_or(0, |v| v.max(0) as u64),
                }),
                _ => None,
            },
            None => None,
        };
        Ok(SummaryStatistics {
            total_countries,
            total_records,
            year_range,
        })
    }

    pub fn metric_statistics(
        &self,
        metric: Metric,
        year: Option<Year>,
    ) -> Result<TabularResult, QueryError> {
        self.table(&templates::metric_statistics(metric, year))
    }

    pub fn yearly_averages(&self, metric: Metric) -> Result<TabularResult, QueryError> {
        self.table(&templates::yearly_averages(metric))
    }

    pub fn country_rankings(&self, metric: Metric, year: Year) -> Result<TabularResult, QueryError> {
        self.table(&templates::country_rankings(metric, year))
    }

    pub fn data_completeness(&self) -> Result<TabularResult, QueryError> {
        self.table(&templates::data_completeness())
    }

    pub fn correlation_data(
        &self,
        metrics: &[Metric],
        year: Option<Year>,
    ) -> Result<TabularResult, QueryError> {
        self.table(&templates::correlation_data(metrics, year, &self.limits)?)
    }

    pub fn metric_distribution(
        &self,
        metric: Metric,
        year: Option<Year>,
    ) -> Result<TabularResult, QueryError> {
        self.table(&templates::metric_distribution(metric, year))
    }

    pub fn outliers(
        &self,
        metric: Metric,
        year: Year,
        threshold: f64,
    ) -> Result<TabularResult, QueryError> {
        self.table(&templates::outliers(metric, year, threshold)?)
    }

    pub fn geographical_analysis(&self) -> Result<GeographicalAnalysis, QueryError> {
        let since = Year::new(GEO_ANALYSIS_SINCE_YEAR)?;
        Ok(GeographicalAnalysis {
            geographical: self.table(&templates::geographical_latest())?,
            regional: self.table(&templates::regional_aggregates(since))?,
            correlation: self.table(&templates::development_correlation(since))?,
        })
    }

    pub fn available_years(&self) -> Result<Vec<Year>, QueryError> {
        let table = self.table(&templates::available_years())?;
        table
            .records()
            .filter_map(|r| r.i64("year"))
            .map(to_year)
            .collect()
    }

    #[must_use]
    pub fn available_metrics(&self) -> &'static [Metric] {
        &Metric::ALL
    }

    /// False for malformed codes as well as unknown ones.
    pub fn validate_country_code(&self, raw: &str) -> Result<bool, QueryError> {
        let Ok(code) = CountryCode::parse(raw) else {
            return Ok(false);
        };
        Ok(!self.country_by_code(&code)?.is_empty())
    }

    pub fn validate_year(&self, raw: i32) -> Result<bool, QueryError> {
        let Ok(year) = Year::new(raw) else {
            return Ok(false);
        };
        Ok(self.first_count(&templates::year_observation_count(year), "count")? > 0)
    }

    /// Writes the query result as CSV. Returns the number of rows written;
    /// an empty result writes nothing and returns 0.
    pub fn export_to_csv(&self, query: &QueryDescriptor, path: &Path) -> Result<usize, QueryError> {
        let table = self.table(query)?;
        if table.is_empty() {
            return Ok(0);
        }
        let csv = table.to_csv()?;
        std::fs::write(path, csv).map_err(|e| {
            QueryError::new(
                QueryErrorCode::Io,
                format!("cannot write {}: {e}", path.display()),
            )
        })?;
        Ok(table.row_count())
    }

    pub fn list_tables(&self) -> Result<Vec<String>, QueryError> {
        let table = self.table(&templates::list_tables())?;
        Ok(table
            .records()
            .filter_map(|r| r.get("name").map(|c| c.render()))
            .collect())
    }

    pub fn table_schema(&self, name: &str) -> Result<Option<String>, QueryError> {
        let table = self.table(&templates::table_schema(name))?;
        Ok(table.record(0).and_then(|r| r.text("sql")).map(str::to_string))
    }

    fn known_table(&self, name: &str) -> Result<String, QueryError> {
        self.list_tables()?
            .into_iter()
            .find(|t| t == name)
            .ok_or_else(|| QueryError::validation(format!("unknown table `{name}`")))
    }

    pub fn row_count(&self, table: &str) -> Result<u64, QueryError> {
        let table = self.known_table(table)?;
        self.first_count(&templates::row_count(&table), "total_rows")
    }

    pub fn sample_rows(&self, table: &str, limit: usize) -> Result<TabularResult, QueryError> {
        let table = self.known_table(table)?;
        self.table(&templates::sample_rows(&table, limit, &self.limits)?)
    }
}

fn to_year(raw: i64) -> Result<Year, QueryError> {
    let value = i32::try_from(raw).map_err(|e| QueryError::new(QueryErrorCode::Parse, e.to_string()))?;
    Ok(Year::new(value)?)
}
