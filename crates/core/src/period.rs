//! Accounting period value type (`YYYY-MM`).

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::OfficeError;

/// A month-granular accounting period such as `2024-01`.
///
/// Stored in its canonical string form; lexicographic ordering of that form
/// is chronological, which keeps period-range filters simple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period(String);

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, OfficeError> {
        format!("{year:04}-{month:02}").parse()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn year(&self) -> i32 {
        self.0[..4].parse().unwrap_or(0)
    }

    pub fn month(&self) -> u32 {
        self.0[5..].parse().unwrap_or(0)
    }
}

impl FromStr for Period {
    type Err = OfficeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || OfficeError::invalid_id(format!("period '{s}' is not YYYY-MM"));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        year.parse::<u32>().map_err(|_| invalid())?;
        let m: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&m) {
            return Err(invalid());
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for Period {
    type Error = OfficeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.0
    }
}

impl core::fmt::Display for Period {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
