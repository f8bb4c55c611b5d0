// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use gdp_atlas_model::METRIC_COUNT;

use crate::query_error::QueryError;

/// Upper bounds applied to caller-supplied arguments before any SQL is built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryLimits {
    pub max_limit: usize,
    pub max_country_codes: usize,
    pub max_name_pattern_len: usize,
    pub max_metrics: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_limit: 200,
            max_country_codes: 64,
            max_name_pattern_len: 64,
            max_metrics: METRIC_COUNT,
        }
    }
}

impl QueryLimits {
    pub fn check_limit(&self, limit: usize) -> Result<(), QueryError> {
        if limit == 0 || limit > self.max_limit {
            return Err(QueryError::validation(format!(
                "limit must be between 1 and {}",
                self.max_limit
            )));
        }
        Ok(())
    }

    pub fn check_country_codes(&self, count: usize) -> Result<(), QueryError> {
        if count > self.max_country_codes {
            return Err(QueryError::validation(format!(
                "at most {} country codes per query",
                self.max_country_codes
            )));
        }
        Ok(())
    }

    pub fn check_name_pattern(&self, pattern: &str) -> Result<(), QueryError> {
        let len = pattern.chars().count();
        if len == 0 || len > self.max_name_pattern_len {
            return Err(QueryError::validation(format!(
                "name pattern must be 1 to {} characters",
                self.max_name_pattern_len
            )));
        }
        Ok(())
    }

    pub fn check_metrics(&self, count: usize) -> Result<(), QueryError> {
        if count == 0 || count > self.max_metrics {
            return Err(QueryError::validation(format!(
                "between 1 and {} metrics required",
                self.max_metrics
            )));
        }
        Ok(())
    }
}
