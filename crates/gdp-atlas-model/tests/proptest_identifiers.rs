// SPDX-License-Identifier: Apache-2.0

use gdp_atlas_model::{CountryCode, Metric, Year, YearRange};
use proptest::prelude::*;
use proptest::test_runner::Config;

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn only_catalog_columns_parse_as_metrics(raw in ".{0,24}") {
        match Metric::parse(&raw) {
            Ok(m) => prop_assert_eq!(m.column(), raw.trim()),
            Err(_) => prop_assert!(Metric::ALL.iter().all(|m| m.column() != raw.trim())),
        }
    }

    #[test]
    fn accepted_country_codes_are_plain_alphanumerics(raw in ".{0,6}") {
        if let Ok(code) = CountryCode::parse(&raw) {
            prop_assert!(code.as_str().chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
            prop_assert!((2..=3).contains(&code.as_str().len()));
        }
    }

    #[test]
    fn year_ranges_are_ordered(a in 1000_i32..9999, b in 1000_i32..9999) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let range = YearRange::new(Year::new(lo).expect("lo"), Year::new(hi).expect("hi"))
            .expect("ordered range");
        prop_assert!(range.start() <= range.end());
    }
}
