// SPDX-License-Identifier: Apache-2.0

//! Fixed catalog of query templates. Data values are bound as `?N`
//! parameters; identifiers come only from [`Metric`] or from table names
//! already confirmed against `sqlite_master`.

use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use gdp_atlas_model::{
    CountryCode, LatitudeBand, Metric, Year, YearRange, NORTHERN_MIN_LAT, SOUTHERN_MAX_LAT,
};

use crate::descriptor::QueryDescriptor;
use crate::limits::QueryLimits;
use crate::query_error::QueryError;

pub const DEFAULT_OUTLIER_THRESHOLD: f64 = 2.0;
pub const GEO_ANALYSIS_SINCE_YEAR: i32 = 2020;

/// Indicators projected by the geographical and development queries.
pub const GEO_METRICS: [Metric; 5] = [
    Metric::Gdp,
    Metric::Population,
    Metric::LifeExpectancy,
    Metric::Internet,
    Metric::UrbanPop,
];
pub const DEVELOPMENT_METRICS: [Metric; 6] = [
    Metric::Gdp,
    Metric::LifeExpectancy,
    Metric::Internet,
    Metric::Enrollment,
    Metric::UrbanPop,
    Metric::InfantMortality,
];
/// Indicators a development-correlation row must carry.
pub const DEVELOPMENT_REQUIRED: [Metric; 3] =
    [Metric::Gdp, Metric::LifeExpectancy, Metric::Internet];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Collects bound values and hands out their placeholders.
#[derive(Default)]
struct Binder {
    params: Vec<Value>,
}

impl Binder {
    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("?{}", self.params.len())
    }

    fn year(&mut self, year: Year) -> String {
        self.bind(Value::Integer(i64::from(year.get())))
    }

    fn text(&mut self, text: &str) -> String {
        self.bind(Value::Text(text.to_string()))
    }

    fn code(&mut self, code: &CountryCode) -> String {
        self.text(code.as_str())
    }

    fn code_list(&mut self, codes: &[CountryCode]) -> String {
        codes
            .iter()
            .map(|c| self.code(c))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn finish(self, sql: String) -> QueryDescriptor {
        QueryDescriptor::csv(sql, self.params)
    }
}

/// `<col> IS NOT NULL AND <col> > 0` for the "valid data only" policy.
fn positive(prefix: &str, metric: Metric) -> String {
    let m = metric.column();
    format!("{prefix}{m} IS NOT NULL AND {prefix}{m} > 0")
}

/// `<col> IS NOT NULL`; zero and negative readings are kept.
fn present(prefix: &str, metric: Metric) -> String {
    format!("{prefix}{} IS NOT NULL", metric.column())
}

pub fn escape_like(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '!' | '%' | '_' => {
                out.push('!');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[must_use]
pub fn normalize_name_lookup(input: &str) -> String {
    input.trim().nfkc().collect::<String>().to_lowercase()
}

fn dedupe_metrics(metrics: &[Metric]) -> Vec<Metric> {
    let mut out: Vec<Metric> = Vec::with_capacity(metrics.len());
    for m in metrics {
        if !out.contains(m) {
            out.push(*m);
        }
    }
    out
}

#[must_use]
pub fn all_countries() -> QueryDescriptor {
    Binder::default().finish("SELECT * FROM countries ORDER BY name".to_string())
}

#[must_use]
pub fn countries_with_gdp_data(min_observations: u32) -> QueryDescriptor {
    let mut b = Binder::default();
    let min = b.bind(Value::Integer(i64::from(min_observations)));
    b.finish(format!(
        "SELECT c.country_code, c.name FROM countries c \
         INNER JOIN data d ON c.country_code = d.country_code \
         WHERE d.gdp IS NOT NULL \
         GROUP BY c.country_code, c.name \
         HAVING COUNT(*) >= {min} \
         ORDER BY c.name"
    ))
}

#[must_use]
pub fn country_by_code(code: &CountryCode) -> QueryDescriptor {
    let mut b = Binder::default();
    let code = b.code(code);
    b.finish(format!("SELECT * FROM countries WHERE country_code = {code}"))
}

/// Case-insensitive substring match on the display name. Wildcards in the
/// input are matched literally.
pub fn search_countries_by_name(
    pattern: &str,
    limits: &QueryLimits,
) -> Result<QueryDescriptor, QueryError> {
    let normalized = normalize_name_lookup(pattern);
    limits.check_name_pattern(&normalized)?;
    let mut b = Binder::default();
    let like = b.text(&format!("%{}%", escape_like(&normalized)));
    Ok(b.finish(format!(
        "SELECT * FROM countries WHERE name LIKE {like} ESCAPE '!' ORDER BY name"
    )))
}

pub fn data_by_country(
    code: &CountryCode,
    start: Option<Year>,
    end: Option<Year>,
) -> Result<QueryDescriptor, QueryError> {
    if let (Some(s), Some(e)) = (start, end) {
        YearRange::new(s, e)?;
    }
    let mut b = Binder::default();
    let mut sql = format!("SELECT * FROM data WHERE country_code = {}", b.code(code));
    if let Some(start) = start {
        sql.push_str(&format!(" AND year >= {}", b.year(start)));
    }
    if let Some(end) = end {
        sql.push_str(&format!(" AND year <= {}", b.year(end)));
    }
    sql.push_str(" ORDER BY year");
    Ok(b.finish(sql))
}

#[must_use]
pub fn data_by_year(year: Year) -> QueryDescriptor {
    let mut b = Binder::default();
    let year = b.year(year);
    b.finish(format!(
        "SELECT * FROM data WHERE year = {year} ORDER BY country_code"
    ))
}

pub fn data_range(
    range: YearRange,
    codes: &[CountryCode],
    limits: &QueryLimits,
) -> Result<QueryDescriptor, QueryError> {
    limits.check_country_codes(codes.len())?;
    let mut b = Binder::default();
    let start = b.year(range.start());
    let end = b.year(range.end());
    let mut sql = format!("SELECT * FROM data WHERE year BETWEEN {start} AND {end}");
    if !codes.is_empty() {
        sql.push_str(&format!(" AND country_code IN ({})", b.code_list(codes)));
    }
    sql.push_str(" ORDER BY country_code, year");
    Ok(b.finish(sql))
}

#[must_use]
pub fn latest_data_by_country(code: &CountryCode) -> QueryDescriptor {
    let mut b = Binder::default();
    let code = b.code(code);
    b.finish(format!(
        "SELECT * FROM data WHERE country_code = {code} ORDER BY year DESC LIMIT 1"
    ))
}

/// Ranked projection; rows with a null or non-positive metric are dropped.
pub fn top_countries_by_metric(
    metric: Metric,
    year: Year,
    limit: usize,
    order: SortOrder,
    limits: &QueryLimits,
) -> Result<QueryDescriptor, QueryError> {
    limits.check_limit(limit)?;
    let m = metric.column();
    let mut b = Binder::default();
    let year = b.year(year);
    let limit = b.bind(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
    Ok(b.finish(format!(
        "SELECT c.name, d.country_code, d.{m}, d.year FROM data d \
         JOIN countries c ON d.country_code = c.country_code \
         WHERE d.year = {year} AND {} \
         ORDER BY d.{m} {} LIMIT {limit}",
        positive("d.", metric),
        order.as_sql()
    )))
}

#[must_use]
pub fn trend_data(code: &CountryCode, metric: Metric) -> QueryDescriptor {
    let m = metric.column();
    let mut b = Binder::default();
    let code = b.code(code);
    b.finish(format!(
        "SELECT year, {m} FROM data WHERE country_code = {code} AND {} ORDER BY year",
        positive("", metric)
    ))
}

pub fn comparative_data(
    codes: &[CountryCode],
    metric: Metric,
    range: YearRange,
    limits: &QueryLimits,
) -> Result<QueryDescriptor, QueryError> {
    if codes.is_empty() {
        return Err(QueryError::validation("at least one country code required"));
    }
    limits.check_country_codes(codes.len())?;
    let m = metric.column();
    let mut b = Binder::default();
    let list = b.code_list(codes);
    let start = b.year(range.start());
    let end = b.year(range.end());
    Ok(b.finish(format!(
        "SELECT c.name, d.country_code, d.year, d.{m} FROM data d \
         JOIN countries c ON d.country_code = c.country_code \
         WHERE d.country_code IN ({list}) AND d.year BETWEEN {start} AND {end} AND {} \
         ORDER BY d.country_code, d.year",
        present("d.", metric)
    )))
}

#[must_use]
pub fn country_count() -> QueryDescriptor {
    Binder::default().finish("SELECT COUNT(*) AS count FROM countries".to_string())
}

#[must_use]
pub fn observation_count() -> QueryDescriptor {
    Binder::default().finish("SELECT COUNT(*) AS count FROM data".to_string())
}

#[must_use]
pub fn year_span() -> QueryDescriptor {
    Binder::default().finish(
        "SELECT MIN(year) AS min_year, MAX(year) AS max_year, \
         COUNT(DISTINCT year) AS total_years, \
         COUNT(DISTINCT country_code) AS countries_with_data FROM data"
            .to_string(),
    )
}

#[must_use]
pub fn metric_statistics(metric: Metric, year: Option<Year>) -> QueryDescriptor {
    let m = metric.column();
    let mut b = Binder::default();
    let mut sql = format!(
        "SELECT COUNT({m}) AS count, AVG({m}) AS mean, MIN({m}) AS min, MAX({m}) AS max \
         FROM data WHERE {}",
        positive("", metric)
    );
    if let Some(year) = year {
        sql.push_str(&format!(" AND year = {}", b.year(year)));
    }
    b.finish(sql)
}

#[must_use]
pub fn yearly_averages(metric: Metric) -> QueryDescriptor {
    let m = metric.column();
    Binder::default().finish(format!(
        "SELECT year, AVG({m}) AS avg_{m}, COUNT({m}) AS countries_count \
         FROM data WHERE {} GROUP BY year ORDER BY year",
        positive("", metric)
    ))
}

#[must_use]
pub fn country_rankings(metric: Metric, year: Year) -> QueryDescriptor {
    let m = metric.column();
    let mut b = Binder::default();
    let year = b.year(year);
    b.finish(format!(
        "SELECT ROW_NUMBER() OVER (ORDER BY d.{m} DESC) AS rank, c.name, d.country_code, d.{m} \
         FROM data d JOIN countries c ON d.country_code = c.country_code \
         WHERE d.year = {year} AND {} ORDER BY d.{m} DESC",
        positive("d.", metric)
    ))
}

/// Per-year count of rows and of non-null values for every indicator.
#[must_use]
pub fn data_completeness() -> QueryDescriptor {
    let counts = Metric::ALL
        .iter()
        .map(|m| format!("COUNT({0}) AS {0}_count", m.column()))
        .collect::<Vec<_>>()
        .join(", ");
    Binder::default().finish(format!(
        "SELECT year, COUNT(*) AS total_countries, {counts} FROM data GROUP BY year ORDER BY year"
    ))
}

/// Rows where every requested metric is present and positive. Repeated
/// metrics are collapsed.
pub fn correlation_data(
    metrics: &[Metric],
    year: Option<Year>,
    limits: &QueryLimits,
) -> Result<QueryDescriptor, QueryError> {
    let metrics = dedupe_metrics(metrics);
    limits.check_metrics(metrics.len())?;
    let columns = metrics
        .iter()
        .map(|m| m.column())
        .collect::<Vec<_>>()
        .join(", ");
    let mut conditions = vec!["country_code IS NOT NULL AND country_code != ''".to_string()];
    conditions.extend(metrics.iter().map(|m| positive("", *m)));
    let mut b = Binder::default();
    if let Some(year) = year {
        conditions.push(format!("year = {}", b.year(year)));
    }
    Ok(b.finish(format!(
        "SELECT country_code, {columns} FROM data WHERE {} ORDER BY country_code",
        conditions.join(" AND ")
    )))
}

#[must_use]
pub fn metric_distribution(metric: Metric, year: Option<Year>) -> QueryDescriptor {
    let m = metric.column();
    let mut b = Binder::default();
    let mut filter = positive("d.", metric);
    if let Some(year) = year {
        filter.push_str(&format!(" AND d.year = {}", b.year(year)));
    }
    b.finish(format!(
        "SELECT c.name, d.{m} FROM data d \
         JOIN countries c ON d.country_code = c.country_code \
         WHERE {filter} ORDER BY d.{m} DESC"
    ))
}

/// Countries whose metric lies more than `threshold` population standard
/// deviations from the year's mean. Mean and variance come from one
/// aggregate pass: `var = E[x^2] - E[x]^2`.
pub fn outliers(metric: Metric, year: Year, threshold: f64) -> Result<QueryDescriptor, QueryError> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(QueryError::validation(
            "outlier threshold must be a finite non-negative number",
        ));
    }
    let m = metric.column();
    let mut b = Binder::default();
    let year = b.year(year);
    let threshold = b.bind(Value::Real(threshold));
    let z = format!("ABS(d.{m} - stats.mean_val) / SQRT(stats.variance)");
    Ok(b.finish(format!(
        "WITH stats AS (\
           SELECT AVG({m}) AS mean_val, (AVG({m} * {m}) - AVG({m}) * AVG({m})) AS variance \
           FROM data WHERE year = {year} AND {}\
         ) \
         SELECT c.name, d.country_code, d.{m}, {z} AS z_score FROM data d \
         JOIN countries c ON d.country_code = c.country_code \
         CROSS JOIN stats \
         WHERE d.year = {year} AND {} AND {z} > {threshold} \
         ORDER BY z_score DESC",
        positive("", metric),
        positive("d.", metric)
    )))
}

/// Latest observation per country with coordinates, largest economy first.
#[must_use]
pub fn geographical_latest() -> QueryDescriptor {
    let columns = GEO_METRICS
        .iter()
        .map(|m| format!("d.{}", m.column()))
        .collect::<Vec<_>>()
        .join(", ");
    Binder::default().finish(format!(
        "SELECT c.country_code, c.name, c.lat, c.lng, {columns}, d.year \
         FROM countries c JOIN data d ON c.country_code = d.country_code \
         WHERE d.year = (SELECT MAX(year) FROM data d2 WHERE d2.country_code = c.country_code) \
         AND {} ORDER BY d.gdp DESC",
        present("d.", Metric::Gdp)
    ))
}

/// Averages per latitude band since `since`. A country without a latitude
/// falls through to the tropical band.
#[must_use]
pub fn regional_aggregates(since: Year) -> QueryDescriptor {
    let mut b = Binder::default();
    let north = b.bind(Value::Real(NORTHERN_MIN_LAT));
    let south = b.bind(Value::Real(SOUTHERN_MAX_LAT));
    let since = b.year(since);
    b.finish(format!(
        "SELECT CASE WHEN c.lat >= {north} THEN '{}' WHEN c.lat <= {south} THEN '{}' ELSE '{}' END AS region, \
         AVG(d.gdp) AS avg_gdp, AVG(d.life_expectancy) AS avg_life_expectancy, \
         AVG(d.internet) AS avg_internet, COUNT(*) AS country_count \
         FROM countries c JOIN data d ON c.country_code = d.country_code \
         WHERE d.year >= {since} \
         GROUP BY region ORDER BY region",
        LatitudeBand::Northern.as_str(),
        LatitudeBand::Southern.as_str(),
        LatitudeBand::Tropical.as_str()
    ))
}

#[must_use]
pub fn development_correlation(since: Year) -> QueryDescriptor {
    let columns = DEVELOPMENT_METRICS
        .iter()
        .map(|m| format!("d.{}", m.column()))
        .collect::<Vec<_>>()
        .join(", ");
    let required = DEVELOPMENT_REQUIRED
        .iter()
        .map(|m| present("d.", *m))
        .collect::<Vec<_>>()
        .join(" AND ");
    let mut b = Binder::default();
    let since = b.year(since);
    b.finish(format!(
        "SELECT {columns}, c.name AS country_name FROM data d \
         JOIN countries c ON d.country_code = c.country_code \
         WHERE d.year >= {since} AND {required}"
    ))
}

#[must_use]
pub fn available_years() -> QueryDescriptor {
    Binder::default().finish("SELECT DISTINCT year FROM data ORDER BY year".to_string())
}

#[must_use]
pub fn year_observation_count(year: Year) -> QueryDescriptor {
    let mut b = Binder::default();
    let year = b.year(year);
    b.finish(format!(
        "SELECT COUNT(*) AS count FROM data WHERE year = {year}"
    ))
}

#[must_use]
pub fn list_tables() -> QueryDescriptor {
    Binder::default().finish(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite!_%' ESCAPE '!' ORDER BY name"
            .to_string(),
    )
}

#[must_use]
pub fn table_schema(table: &str) -> QueryDescriptor {
    let mut b = Binder::default();
    let name = b.text(table);
    b.finish(format!(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = {name}"
    ))
}

/// Double-quoted identifier. Callers pass only names read back from
/// `sqlite_master`.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[must_use]
pub fn row_count(known_table: &str) -> QueryDescriptor {
    Binder::default().finish(format!(
        "SELECT COUNT(*) AS total_rows FROM {}",
        quote_identifier(known_table)
    ))
}

pub fn sample_rows(
    known_table: &str,
    limit: usize,
    limits: &QueryLimits,
) -> Result<QueryDescriptor, QueryError> {
    limits.check_limit(limit)?;
    let mut b = Binder::default();
    let limit = b.bind(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
    Ok(b.finish(format!(
        "SELECT * FROM {} LIMIT {limit}",
        quote_identifier(known_table)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CountryCode {
        CountryCode::parse(s).expect("code")
    }

    fn year(y: i32) -> Year {
        Year::new(y).expect("year")
    }

    #[test]
    fn data_values_are_bound_not_inlined() {
        let q = data_by_country(&code("US"), Some(year(2010)), Some(year(2020))).expect("query");
        assert_eq!(
            q.sql(),
            "SELECT * FROM data WHERE country_code = ?1 AND year >= ?2 AND year <= ?3 ORDER BY year"
        );
        assert_eq!(
            q.params(),
            &[
                Value::Text("US".to_string()),
                Value::Integer(2010),
                Value::Integer(2020)
            ]
        );
        assert!(data_by_country(&code("US"), Some(year(2021)), Some(year(2020))).is_err());
    }

    #[test]
    fn top_n_orders_and_filters_positive_values() {
        let q = top_countries_by_metric(
            Metric::Gdp,
            year(2020),
            2,
            SortOrder::Descending,
            &QueryLimits::default(),
        )
        .expect("query");
        assert!(q.sql().contains("d.gdp IS NOT NULL AND d.gdp > 0"));
        assert!(q.sql().ends_with("ORDER BY d.gdp DESC LIMIT ?2"));
        assert_eq!(q.params(), &[Value::Integer(2020), Value::Integer(2)]);
        let asc = top_countries_by_metric(
            Metric::Gdp,
            year(2020),
            2,
            SortOrder::Ascending,
            &QueryLimits::default(),
        )
        .expect("query");
        assert!(asc.sql().contains("ORDER BY d.gdp ASC"));
    }

    #[test]
    fn limits_are_enforced() {
        let limits = QueryLimits::default();
        assert!(top_countries_by_metric(Metric::Gdp, year(2020), 0, SortOrder::Descending, &limits).is_err());
        assert!(top_countries_by_metric(Metric::Gdp, year(2020), 201, SortOrder::Descending, &limits).is_err());
        assert!(correlation_data(&[], None, &limits).is_err());
        assert!(search_countries_by_name(&"x".repeat(65), &limits).is_err());
        assert!(comparative_data(&[], Metric::Gdp, YearRange::new(year(2000), year(2001)).expect("range"), &limits).is_err());
    }

    #[test]
    fn like_patterns_escape_wildcards_and_normalize() {
        let q = search_countries_by_name("100%_Ｋorea", &QueryLimits::default()).expect("query");
        assert_eq!(q.params(), &[Value::Text("%100!%!_korea%".to_string())]);
        assert!(q.sql().contains("ESCAPE '!'"));
    }

    #[test]
    fn correlation_requires_every_metric_positive() {
        let q = correlation_data(
            &[Metric::Gdp, Metric::Internet, Metric::Gdp],
            Some(year(2020)),
            &QueryLimits::default(),
        )
        .expect("query");
        assert_eq!(
            q.sql(),
            "SELECT country_code, gdp, internet FROM data WHERE country_code IS NOT NULL AND country_code != '' \
             AND gdp IS NOT NULL AND gdp > 0 AND internet IS NOT NULL AND internet > 0 AND year = ?1 \
             ORDER BY country_code"
        );
    }

    #[test]
    fn comparison_and_geography_keep_non_positive_readings() {
        let range = YearRange::new(year(2018), year(2020)).expect("range");
        let q = comparative_data(&[code("US")], Metric::Migration, range, &QueryLimits::default())
            .expect("query");
        assert!(q.sql().contains("AND d.migration IS NOT NULL ORDER BY"));
        assert!(!q.sql().contains("d.migration > 0"));
        assert!(!geographical_latest().sql().contains("> 0"));
        assert!(!development_correlation(year(2020)).sql().contains("> 0"));
        assert!(!regional_aggregates(year(2020)).sql().contains("lat IS NOT NULL"));
    }

    #[test]
    fn code_lists_bind_each_code() {
        let q = data_range(
            YearRange::new(year(2018), year(2020)).expect("range"),
            &[code("US"), code("CN")],
            &QueryLimits::default(),
        )
        .expect("query");
        assert!(q.sql().contains("country_code IN (?3, ?4)"));
        assert_eq!(q.params().len(), 4);
    }

    #[test]
    fn outlier_threshold_is_validated_and_bound() {
        assert!(outliers(Metric::Gdp, year(2020), f64::NAN).is_err());
        assert!(outliers(Metric::Gdp, year(2020), -1.0).is_err());
        let q = outliers(Metric::Gdp, year(2020), 1.5).expect("query");
        assert_eq!(q.params(), &[Value::Integer(2020), Value::Real(1.5)]);
        assert!(q.sql().contains("> ?2"));
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(
            row_count("we\"ird").sql(),
            "SELECT COUNT(*) AS total_rows FROM \"we\"\"ird\""
        );
    }

    #[test]
    fn completeness_counts_every_metric() {
        let q = data_completeness();
        for m in Metric::ALL {
            assert!(q.sql().contains(&format!("COUNT({0}) AS {0}_count", m.column())));
        }
    }
}
