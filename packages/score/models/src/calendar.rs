//! Calendar selectors: months, the month selector used by the map
//! controls, and the quarter grouping used by forecast data.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A calendar month, 1 (January) through 12 (December).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Month(u8);

impl Month {
    /// Creates a month from its calendar number.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-12.
    pub const fn new(value: u8) -> Result<Self, InvalidMonthError> {
        if value >= 1 && value <= 12 {
            Ok(Self(value))
        } else {
            Err(InvalidMonthError { value })
        }
    }

    /// Returns the calendar number (1-12).
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Returns the zero-based position of this month within a year.
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Returns the forecast quarter this month falls in.
    #[must_use]
    pub const fn quarter(self) -> Quarter {
        Quarter::for_month(self)
    }

    /// Iterates over all twelve months in calendar order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=12).map(Self)
    }
}

impl TryFrom<u8> for Month {
    type Error = InvalidMonthError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Month> for u8 {
    fn from(month: Month) -> Self {
        month.0
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// Error returned when a [`Month`] is created from a number outside 1-12.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidMonthError {
    /// The rejected month number.
    pub value: u8,
}

impl std::fmt::Display for InvalidMonthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid month {}: expected 1-12", self.value)
    }
}

impl std::error::Error for InvalidMonthError {}

/// Three-month grouping used by forecast datasets.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Quarter {
    /// January-March
    Q1,
    /// April-June
    Q2,
    /// July-September
    Q3,
    /// October-December
    Q4,
}

impl Quarter {
    /// All quarters in calendar order.
    pub const ALL: [Self; 4] = [Self::Q1, Self::Q2, Self::Q3, Self::Q4];

    /// Maps a month to its quarter: 1-3 `q1`, 4-6 `q2`, 7-9 `q3`, 10-12 `q4`.
    #[must_use]
    pub const fn for_month(month: Month) -> Self {
        match month.number() {
            1..=3 => Self::Q1,
            4..=6 => Self::Q2,
            7..=9 => Self::Q3,
            _ => Self::Q4,
        }
    }

    /// Creates a quarter from its number (1-4).
    #[must_use]
    pub const fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::Q1),
            2 => Some(Self::Q2),
            3 => Some(Self::Q3),
            4 => Some(Self::Q4),
            _ => None,
        }
    }

    /// Returns the quarter number (1-4).
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8 + 1
    }
}

/// The month control of the map: the whole year, or one calendar month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MonthSelector {
    /// Whole-year figures.
    #[default]
    All,
    /// A single calendar month.
    Month(Month),
}

impl MonthSelector {
    /// Returns the selected month, or `None` for the whole year.
    #[must_use]
    pub const fn month(self) -> Option<Month> {
        match self {
            Self::All => None,
            Self::Month(month) => Some(month),
        }
    }

    /// Returns `true` when the whole year is selected.
    #[must_use]
    pub const fn is_all(self) -> bool {
        matches!(self, Self::All)
    }
}

impl From<Month> for MonthSelector {
    fn from(month: Month) -> Self {
        Self::Month(month)
    }
}

impl std::fmt::Display for MonthSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Month(month) => write!(f, "{month}"),
        }
    }
}

impl std::str::FromStr for MonthSelector {
    type Err = ParseMonthSelectorError;

    /// Accepts `all` (any case) or a month number, optionally zero-padded
    /// (`"3"`, `"03"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }

        trimmed
            .parse::<u8>()
            .ok()
            .and_then(|n| Month::new(n).ok())
            .map(Self::Month)
            .ok_or_else(|| ParseMonthSelectorError {
                input: s.to_string(),
            })
    }
}

impl TryFrom<String> for MonthSelector {
    type Error = ParseMonthSelectorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthSelector> for String {
    fn from(selector: MonthSelector) -> Self {
        selector.to_string()
    }
}

/// Error returned when a string is neither `all` nor a month number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMonthSelectorError {
    /// The rejected input.
    pub input: String,
}

impl std::fmt::Display for ParseMonthSelectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid month selector '{}': expected 'all' or 1-12",
            self.input
        )
    }
}

impl std::error::Error for ParseMonthSelectorError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_range() {
        assert!(Month::new(0).is_err());
        assert!(Month::new(13).is_err());
        assert_eq!(Month::all().count(), 12);
        assert_eq!(Month::new(1).unwrap().index(), 0);
        assert_eq!(Month::new(12).unwrap().index(), 11);
    }

    #[test]
    fn every_month_maps_to_its_quarter() {
        let expected = [
            Quarter::Q1,
            Quarter::Q1,
            Quarter::Q1,
            Quarter::Q2,
            Quarter::Q2,
            Quarter::Q2,
            Quarter::Q3,
            Quarter::Q3,
            Quarter::Q3,
            Quarter::Q4,
            Quarter::Q4,
            Quarter::Q4,
        ];
        for (month, quarter) in Month::all().zip(expected) {
            assert_eq!(month.quarter(), quarter, "month {month}");
        }
    }

    #[test]
    fn quarter_ids() {
        assert_eq!(Quarter::Q1.to_string(), "q1");
        assert_eq!("q4".parse::<Quarter>().unwrap(), Quarter::Q4);
        for quarter in Quarter::ALL {
            assert_eq!(Quarter::from_number(quarter.number()), Some(quarter));
        }
        assert_eq!(Quarter::from_number(5), None);
    }

    #[test]
    fn selector_parsing() {
        assert_eq!("all".parse::<MonthSelector>().unwrap(), MonthSelector::All);
        assert_eq!("ALL".parse::<MonthSelector>().unwrap(), MonthSelector::All);
        assert_eq!(
            "03".parse::<MonthSelector>().unwrap(),
            MonthSelector::Month(Month::new(3).unwrap())
        );
        assert_eq!(
            "11".parse::<MonthSelector>().unwrap(),
            MonthSelector::Month(Month::new(11).unwrap())
        );
        assert!("0".parse::<MonthSelector>().is_err());
        assert!("13".parse::<MonthSelector>().is_err());
        assert!("june".parse::<MonthSelector>().is_err());
    }

    #[test]
    fn selector_display_is_zero_padded() {
        assert_eq!(MonthSelector::All.to_string(), "all");
        assert_eq!(MonthSelector::from(Month::new(7).unwrap()).to_string(), "07");
    }
}
