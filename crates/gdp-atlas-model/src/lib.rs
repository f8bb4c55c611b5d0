// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! Domain vocabulary shared by the query bridge and its callers: the two
//! stored entities (countries and country-year observations) and the closed
//! catalog of indicator columns.

mod country;
mod metric;
mod observation;
mod region;

use std::fmt::{Display, Formatter};

pub use country::{parse_country_code, Country, CountryCode, COUNTRY_CODE_MAX_LEN};
pub use metric::{parse_metric, Metric, METRIC_COUNT};
pub use observation::{parse_year, Observation, Year, YearRange, YEAR_MAX, YEAR_MIN};
pub use region::{LatitudeBand, NORTHERN_MIN_LAT, SOUTHERN_MAX_LAT};

pub const CRATE_NAME: &str = "gdp-atlas-model";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}
