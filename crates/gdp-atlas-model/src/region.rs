// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const NORTHERN_MIN_LAT: f64 = 35.0;
pub const SOUTHERN_MAX_LAT: f64 = -35.0;

/// Coarse latitude bucket used by the regional aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LatitudeBand {
    Northern,
    Southern,
    Tropical,
}

impl LatitudeBand {
    #[must_use]
    pub fn classify(lat: f64) -> Self {
        if lat >= NORTHERN_MIN_LAT {
            Self::Northern
        } else if lat <= SOUTHERN_MAX_LAT {
            Self::Southern
        } else {
            Self::Tropical
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Northern => "Northern",
            Self::Southern => "Southern",
            Self::Tropical => "Tropical",
        }
    }
}

impl Display for LatitudeBand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
