//! In-game calendar months and the month-to-season mapping.
use serde::{Deserialize, Serialize};

use crate::season::SeasonKind;
use crate::store::SettingsStore;

/// One in-game calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// Settings key for this month under `[Settings]`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Month::January => "January",
            Month::February => "February",
            Month::March => "March",
            Month::April => "April",
            Month::May => "May",
            Month::June => "June",
            Month::July => "July",
            Month::August => "August",
            Month::September => "September",
            Month::October => "October",
            Month::November => "November",
            Month::December => "December",
        }
    }

    /// Zero-based position within the year.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Month at a zero-based position within the year.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Month::ALL.get(index).copied()
    }
}

/// Total mapping from calendar month to the season shown that month.
///
/// A `None` slot disables seasonal swapping for that month entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthToSeasonMap {
    seasons: [Option<SeasonKind>; 12],
}

impl Default for MonthToSeasonMap {
    /// Real-world Northern-hemisphere mapping.
    fn default() -> Self {
        Self {
            seasons: [
                Some(SeasonKind::Winter),
                Some(SeasonKind::Winter),
                Some(SeasonKind::Spring),
                Some(SeasonKind::Spring),
                Some(SeasonKind::Spring),
                Some(SeasonKind::Summer),
                Some(SeasonKind::Summer),
                Some(SeasonKind::Summer),
                Some(SeasonKind::Autumn),
                Some(SeasonKind::Autumn),
                Some(SeasonKind::Autumn),
                Some(SeasonKind::Winter),
            ],
        }
    }
}

impl MonthToSeasonMap {
    /// Season configured for `month`.
    #[must_use]
    pub const fn resolve(&self, month: Month) -> Option<SeasonKind> {
        self.seasons[month.index()]
    }

    pub fn set(&mut self, month: Month, season: Option<SeasonKind>) {
        self.seasons[month.index()] = season;
    }

    /// Reads the twelve month keys from `[Settings]`, writing the current
    /// values back as defaults so the backing file documents itself.
    /// Season codes: 0 none, 1 winter, 2 spring, 3 summer, 4 autumn.
    pub fn load(&mut self, store: &mut impl SettingsStore) {
        for month in Month::ALL {
            let default = self.resolve(month).map_or(0, SeasonKind::code);
            let code = store.get_or_insert_i64("Settings", month.name(), i64::from(default));
            self.seasons[month.index()] = u8::try_from(code).ok().and_then(SeasonKind::from_code);
        }
    }
}
