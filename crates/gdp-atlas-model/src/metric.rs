// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::ValidationError;

pub const METRIC_COUNT: usize = 11;

/// Indicator columns of the observation table. This enum is the only way an
/// identifier reaches query text, so the set doubles as the allow-list.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Gdp,
    Population,
    Female,
    Male,
    LifeExpectancy,
    Migration,
    InfantMortality,
    Internet,
    Hci,
    Enrollment,
    UrbanPop,
}

impl Metric {
    pub const ALL: [Self; METRIC_COUNT] = [
        Self::Gdp,
        Self::Population,
        Self::Female,
        Self::Male,
        Self::LifeExpectancy,
        Self::Migration,
        Self::InfantMortality,
        Self::Internet,
        Self::Hci,
        Self::Enrollment,
        Self::UrbanPop,
    ];

    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Gdp => "gdp",
            Self::Population => "population",
            Self::Female => "female",
            Self::Male => "male",
            Self::LifeExpectancy => "life_expectancy",
            Self::Migration => "migration",
            Self::InfantMortality => "infant_mortality",
            Self::Internet => "internet",
            Self::Hci => "hci",
            Self::Enrollment => "enrollment",
            Self::UrbanPop => "urban_pop",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gdp => "GDP (current US$)",
            Self::Population => "Population",
            Self::Female => "Female population",
            Self::Male => "Male population",
            Self::LifeExpectancy => "Life expectancy (years)",
            Self::Migration => "Net migration",
            Self::InfantMortality => "Infant mortality (per 1,000)",
            Self::Internet => "Internet users (% of population)",
            Self::Hci => "Human capital index",
            Self::Enrollment => "School enrollment (%)",
            Self::UrbanPop => "Urban population (%)",
        }
    }

    /// Stored as whole numbers in the observation table.
    #[must_use]
    pub const fn is_count(self) -> bool {
        matches!(self, Self::Population | Self::Migration)
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let wanted = input.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.column() == wanted)
            .ok_or_else(|| {
                ValidationError(format!(
                    "unknown metric `{wanted}`; expected one of: {}",
                    Self::ALL.map(Self::column).join(", ")
                ))
            })
    }
}

pub fn parse_metric(input: &str) -> Result<Metric, ValidationError> {
    Metric::parse(input)
}

impl FromStr for Metric {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_columns_are_unique_snake_case_identifiers() {
        let mut seen = std::collections::BTreeSet::new();
        for m in Metric::ALL {
            let col = m.column();
            assert!(col
                .chars()
                .all(|c| c.is_ascii_lowercase() || c == '_'));
            assert!(seen.insert(col), "duplicate column {col}");
        }
        assert_eq!(seen.len(), METRIC_COUNT);
    }

    #[test]
    fn parse_rejects_identifier_injection() {
        assert!(Metric::parse("gdp) FROM data; --").is_err());
        assert!(Metric::parse("GDP").is_err());
        assert!(Metric::parse("").is_err());
        assert_eq!(Metric::parse(" urban_pop "), Ok(Metric::UrbanPop));
    }
}
