// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::region::LatitudeBand;
use crate::ValidationError;

pub const COUNTRY_CODE_MAX_LEN: usize = 3;

pub fn parse_country_code(input: &str) -> Result<CountryCode, ValidationError> {
    CountryCode::parse(input)
}

/// Short country key (`US`, `DE`, `EUU`), stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError("country code must not be empty".to_string()));
        }
        if s.len() < 2 || s.len() > COUNTRY_CODE_MAX_LEN {
            return Err(ValidationError(format!(
                "country code must be 2 to {COUNTRY_CODE_MAX_LEN} characters"
            )));
        }
        if !s.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValidationError(
                "country code must match [A-Za-z0-9]+".to_string(),
            ));
        }
        Ok(Self(s.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for CountryCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub code: CountryCode,
    pub name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl Country {
    #[must_use]
    pub fn band(&self) -> Option<LatitudeBand> {
        self.lat.map(LatitudeBand::classify)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_upper_cased_and_trimmed() {
        let code = CountryCode::parse(" us ").expect("valid code");
        assert_eq!(code.as_str(), "US");
    }

    #[test]
    fn codes_reject_quotes_and_length_violations() {
        assert!(CountryCode::parse("U").is_err());
        assert!(CountryCode::parse("USAX").is_err());
        assert!(CountryCode::parse("U'").is_err());
        assert!(CountryCode::parse("").is_err());
    }

    #[test]
    fn country_without_latitude_has_no_band() {
        let c = Country {
            code: CountryCode::parse("XK").expect("code"),
            name: "Kosovo".to_string(),
            lat: None,
            lng: None,
        };
        assert_eq!(c.band(), None);
    }
}
