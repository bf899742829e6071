//! Countries supported by the top-headlines endpoint

use std::fmt;

use serde::Serialize;

/// A selectable country: API code plus display name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Country {
    /// Two-letter code sent to the API (e.g. "us")
    pub code: &'static str,
    /// Name shown to the user (e.g. "United States")
    pub name: &'static str,
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

const fn country(code: &'static str, name: &'static str) -> Country {
    Country { code, name }
}

/// Every country the API accepts, ordered by code
pub const ALL: &[Country] = &[
    country("ae", "United Arab Emirates"),
    country("ar", "Argentina"),
    country("at", "Austria"),
    country("au", "Australia"),
    country("be", "Belgium"),
    country("bg", "Bulgaria"),
    country("br", "Brazil"),
    country("ca", "Canada"),
    country("ch", "Switzerland"),
    country("cn", "China"),
    country("co", "Colombia"),
    country("cu", "Cuba"),
    country("cz", "Czech Republic"),
    country("de", "Germany"),
    country("eg", "Egypt"),
    country("fr", "France"),
    country("gb", "United Kingdom"),
    country("gr", "Greece"),
    country("hk", "Hong Kong"),
    country("hu", "Hungary"),
    country("id", "Indonesia"),
    country("ie", "Ireland"),
    country("il", "Israel"),
    country("in", "India"),
    country("it", "Italy"),
    country("jp", "Japan"),
    country("kr", "South Korea"),
    country("lt", "Lithuania"),
    country("lv", "Latvia"),
    country("ma", "Morocco"),
    country("mx", "Mexico"),
    country("my", "Malaysia"),
    country("ng", "Nigeria"),
    country("nl", "Netherlands"),
    country("no", "Norway"),
    country("nz", "New Zealand"),
    country("ph", "Philippines"),
    country("pl", "Poland"),
    country("pt", "Portugal"),
    country("ro", "Romania"),
    country("rs", "Serbia"),
    country("ru", "Russia"),
    country("sa", "Saudi Arabia"),
    country("se", "Sweden"),
    country("sg", "Singapore"),
    country("si", "Slovenia"),
    country("sk", "Slovakia"),
    country("th", "Thailand"),
    country("tr", "Turkey"),
    country("tw", "Taiwan"),
    country("ua", "Ukraine"),
    country("us", "United States"),
    country("ve", "Venezuela"),
    country("za", "South Africa"),
];

/// Selected when nothing else is configured
pub const DEFAULT: Country = country("us", "United States");

impl Default for Country {
    fn default() -> Self {
        DEFAULT
    }
}

impl Country {
    /// Look up a country by its code, ignoring case
    pub fn from_code(code: &str) -> Option<Country> {
        let code = code.trim();
        ALL.iter().copied().find(|c| c.code.eq_ignore_ascii_case(code))
    }
}

/// Countries whose name contains `query`, ignoring case
///
/// An empty query returns the full list. Whitespace is matched like any
/// other character.
pub fn filter(query: &str) -> Vec<Country> {
    if query.is_empty() {
        return ALL.to_vec();
    }
    let needle = query.to_lowercase();
    ALL.iter()
        .copied()
        .filter(|c| c.name.to_lowercase().contains(&needle))
        .collect()
}
