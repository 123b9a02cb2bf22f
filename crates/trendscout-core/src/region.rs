use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Marketplace region a scan runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Region {
    #[default]
    #[serde(rename = "US", alias = "us")]
    Us,
    #[serde(rename = "UK", alias = "uk")]
    Uk,
}

impl Region {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Region::Us => "US",
            Region::Uk => "UK",
        }
    }

    /// Symbol prices are listed in on this region's storefront.
    #[must_use]
    pub fn currency_symbol(self) -> &'static str {
        match self {
            Region::Us => "$",
            Region::Uk => "£",
        }
    }

    /// Geo code used for search-interest lookups.
    #[must_use]
    pub fn geo(self) -> &'static str {
        match self {
            Region::Us => "US",
            Region::Uk => "GB",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown region \"{0}\"; expected US or UK")]
pub struct UnknownRegion(pub String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "US" => Ok(Region::Us),
            "UK" | "GB" => Ok(Region::Uk),
            other => Err(UnknownRegion(other.to_string())),
        }
    }
}
