// SPDX-License-Identifier: Apache-2.0

//! Shape of the indicator store. The bridge never writes; this DDL exists
//! for loaders and fixtures that need a compatible file.

pub const COUNTRIES_TABLE: &str = "countries";
pub const DATA_TABLE: &str = "data";

pub const STORE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS countries (
  country_code TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  lat REAL,
  lng REAL
) STRICT;
CREATE TABLE IF NOT EXISTS data (
  country_code TEXT NOT NULL REFERENCES countries(country_code),
  year INTEGER NOT NULL,
  gdp REAL,
  population INTEGER,
  female REAL,
  male REAL,
  life_expectancy REAL,
  migration INTEGER,
  infant_mortality REAL,
  internet REAL,
  hci REAL,
  enrollment REAL,
  urban_pop REAL,
  PRIMARY KEY (country_code, year)
) STRICT;
CREATE INDEX IF NOT EXISTS idx_data_year ON data(year);
";
