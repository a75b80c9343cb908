use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A fiscal quarter parsed from a `Q<1-4>-YYYY` label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodKey {
    #[schemars(description = "Calendar year taken from the quarter label")]
    pub year: i32,

    #[schemars(description = "Quarter within the year, 1 to 4")]
    pub quarter_index: u8,

    #[schemars(
        description = "Monotonic ordering key: year + quarter_index / 4 (Q1-2023 = 2023.25)"
    )]
    pub sort_key: f64,
}

impl PeriodKey {
    /// Returns `None` for a year that cannot be written with four digits or a
    /// quarter outside 1..=4.
    pub fn new(year: i32, quarter_index: u8) -> Option<Self> {
        if !(0..=9999).contains(&year) || !(1..=4).contains(&quarter_index) {
            return None;
        }

        Some(Self {
            year,
            quarter_index,
            sort_key: year as f64 + quarter_index as f64 / 4.0,
        })
    }

    /// The calendar quarter immediately before this one (Q1 rolls back to Q4 of the prior year).
    pub fn previous_quarter(&self) -> Option<Self> {
        if self.quarter_index == 1 {
            Self::new(self.year - 1, 4)
        } else {
            Self::new(self.year, self.quarter_index - 1)
        }
    }

    pub fn same_quarter_prior_year(&self) -> Option<Self> {
        Self::new(self.year - 1, self.quarter_index)
    }

    /// Last calendar day of the quarter.
    pub fn end_date(&self) -> NaiveDate {
        let (month, day) = match self.quarter_index {
            1 => (3, 31),
            2 => (6, 30),
            3 => (9, 30),
            _ => (12, 31),
        };

        NaiveDate::from_ymd_opt(self.year, month, day).unwrap_or(NaiveDate::MIN)
    }

    pub fn cmp_chronological(&self, other: &Self) -> Ordering {
        self.sort_key.total_cmp(&other.sort_key)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}-{:04}", self.quarter_index, self.year)
    }
}

/// Parses a quarter label of the form `Q<1-4>-YYYY`, e.g. "Q3-2024".
/// Surrounding whitespace is ignored; anything else that deviates from the
/// pattern (lowercase `q`, "2023-Q1", two-digit years) is rejected.
pub fn parse_quarter_label(label: &str) -> Option<PeriodKey> {
    let bytes = label.trim().as_bytes();

    match bytes {
        [b'Q', q @ b'1'..=b'4', b'-', y @ ..] if y.len() == 4 && y.iter().all(u8::is_ascii_digit) => {
            let year = y
                .iter()
                .fold(0i32, |acc, digit| acc * 10 + (digit - b'0') as i32);
            PeriodKey::new(year, q - b'0')
        }
        _ => None,
    }
}
