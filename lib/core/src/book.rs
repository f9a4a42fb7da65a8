use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;
use crate::{Error, Result};

/// Book identifier as found in the catalog - integer or free-form string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BookId {
    Integer(u64),
    String(String),
}

impl BookId {
    /// Loose comparison used for lookups: `Integer(7)` matches `String("7")`
    pub fn matches(&self, other: &BookId) -> bool {
        match (self, other) {
            (BookId::Integer(a), BookId::Integer(b)) => a == b,
            (BookId::String(a), BookId::String(b)) => a == b,
            (BookId::Integer(n), BookId::String(s)) | (BookId::String(s), BookId::Integer(n)) => {
                s.parse::<u64>().map(|v| v == *n).unwrap_or(false)
            }
        }
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookId::Integer(i) => write!(f, "{}", i),
            BookId::String(s) => write!(f, "{}", s),
        }
    }
}

impl FromStr for BookId {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(s.parse::<u64>()
            .map(BookId::Integer)
            .unwrap_or_else(|_| BookId::String(s.to_string())))
    }
}

impl From<u64> for BookId {
    fn from(i: u64) -> Self {
        BookId::Integer(i)
    }
}

impl From<String> for BookId {
    fn from(s: String) -> Self {
        BookId::String(s)
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        BookId::String(s.to_string())
    }
}

/// Five-level star rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rating {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
}

impl Rating {
    pub const ALL: [Rating; 5] = [Rating::One, Rating::Two, Rating::Three, Rating::Four, Rating::Five];

    #[inline]
    #[must_use]
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u64) -> Result<Self> {
        match value {
            1 => Ok(Rating::One),
            2 => Ok(Rating::Two),
            3 => Ok(Rating::Three),
            4 => Ok(Rating::Four),
            5 => Ok(Rating::Five),
            other => Err(Error::InvalidRating(other.to_string())),
        }
    }

    #[must_use]
    pub fn as_word(self) -> &'static str {
        match self {
            Rating::One => "One",
            Rating::Two => "Two",
            Rating::Three => "Three",
            Rating::Four => "Four",
            Rating::Five => "Five",
        }
    }

    /// Absolute difference on the 1..5 scale
    #[inline]
    #[must_use]
    pub fn distance(self, other: Rating) -> u8 {
        self.value().abs_diff(other.value())
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_word())
    }
}

impl FromStr for Rating {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<u64>() {
            return Rating::from_value(n);
        }
        Rating::ALL
            .into_iter()
            .find(|r| r.as_word().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| Error::InvalidRating(trimmed.to_string()))
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_word())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RatingRepr {
    Number(u64),
    Word(String),
}

impl<'de> Deserialize<'de> for Rating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match RatingRepr::deserialize(deserializer)? {
            RatingRepr::Number(n) => Rating::from_value(n),
            RatingRepr::Word(w) => w.parse(),
        }
        .map_err(de::Error::custom)
    }
}

/// Parse a price that may carry a currency prefix, e.g. `"£51.77"` or `"Â£51.77"`
pub fn parse_price(text: &str) -> Result<f64> {
    let digits = text
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit() && c != '.' && c != '-');
    digits
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| Error::InvalidPrice(text.to_string()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceRepr {
    Number(f64),
    Text(String),
}

fn deserialize_price<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    match PriceRepr::deserialize(deserializer)? {
        PriceRepr::Number(n) => Ok(n),
        PriceRepr::Text(t) => parse_price(&t).map_err(de::Error::custom),
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(deserialize_with = "deserialize_price")]
    pub price: f64,
    pub rating: Rating,
    #[serde(default)]
    pub availability: String,
    pub category: String,
}

impl Book {
    #[must_use]
    pub fn new(
        id: impl Into<BookId>,
        title: impl Into<String>,
        price: f64,
        rating: Rating,
        availability: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            rating,
            availability: availability.into(),
            category: category.into(),
        }
    }

    /// Case-insensitive title comparison
    #[inline]
    pub fn title_matches(&self, title: &str) -> bool {
        self.title.to_lowercase() == title.to_lowercase()
    }
}
