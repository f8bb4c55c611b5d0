// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::country::CountryCode;
use crate::metric::Metric;
use crate::ValidationError;

pub const YEAR_MIN: i32 = 1000;
pub const YEAR_MAX: i32 = 9999;

pub fn parse_year(input: &str) -> Result<Year, ValidationError> {
    let value = input
        .trim()
        .parse::<i32>()
        .map_err(|_| ValidationError(format!("year `{}` is not an integer", input.trim())))?;
    Year::new(value)
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Year(i32);

impl Year {
    pub fn new(value: i32) -> Result<Self, ValidationError> {
        if !(YEAR_MIN..=YEAR_MAX).contains(&value) {
            return Err(ValidationError(format!(
                "year must be between {YEAR_MIN} and {YEAR_MAX}"
            )));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl Display for Year {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive year bounds, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    start: Year,
    end: Year,
}

impl YearRange {
    pub fn new(start: Year, end: Year) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError(format!(
                "year range start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> Year {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> Year {
        self.end
    }

    #[must_use]
    pub fn contains(&self, year: Year) -> bool {
        self.start <= year && year <= self.end
    }
}

/// One row of the observation table; every indicator may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub country_code: CountryCode,
    pub year: Year,
    pub gdp: Option<f64>,
    pub population: Option<f64>,
    pub female: Option<f64>,
    pub male: Option<f64>,
    pub life_expectancy: Option<f64>,
    pub migration: Option<f64>,
    pub infant_mortality: Option<f64>,
    pub internet: Option<f64>,
    pub hci: Option<f64>,
    pub enrollment: Option<f64>,
    pub urban_pop: Option<f64>,
}

impl Observation {
    #[must_use]
    pub fn empty(country_code: CountryCode, year: Year) -> Self {
        Self {
            country_code,
            year,
            gdp: None,
            population: None,
            female: None,
            male: None,
            life_expectancy: None,
            migration: None,
            infant_mortality: None,
            internet: None,
            hci: None,
            enrollment: None,
            urban_pop: None,
        }
    }

    #[must_use]
    pub const fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Gdp => self.gdp,
            Metric::Population => self.population,
            Metric::Female => self.female,
            Metric::Male => self.male,
            Metric::LifeExpectancy => self.life_expectancy,
            Metric::Migration => self.migration,
            Metric::InfantMortality => self.infant_mortality,
            Metric::Internet => self.internet,
            Metric::Hci => self.hci,
            Metric::Enrollment => self.enrollment,
            Metric::UrbanPop => self.urban_pop,
        }
    }

    pub fn set_metric(&mut self, metric: Metric, value: Option<f64>) {
        let slot = match metric {
            Metric::Gdp => &mut self.gdp,
            Metric::Population => &mut self.population,
            Metric::Female => &mut self.female,
            Metric::Male => &mut self.male,
            Metric::LifeExpectancy => &mut self.life_expectancy,
            Metric::Migration => &mut self.migration,
            Metric::InfantMortality => &mut self.infant_mortality,
            Metric::Internet => &mut self.internet,
            Metric::Hci => &mut self.hci,
            Metric::Enrollment => &mut self.enrollment,
            Metric::UrbanPop => &mut self.urban_pop,
        };
        *slot = value;
    }
}
