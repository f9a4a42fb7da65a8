// Book filters used by catalog search
use crate::{Book, Rating};

pub trait BookFilter {
    fn matches(&self, book: &Book) -> bool;
}

impl<F> BookFilter for F
where
    F: Fn(&Book) -> bool,
{
    fn matches(&self, book: &Book) -> bool {
        self(book)
    }
}

pub struct FieldFilter {
    condition: FilterCondition,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    /// Exact, case-sensitive title match
    TitleEquals(String),
    /// Exact, case-sensitive category match
    CategoryEquals(String),
    /// Inclusive on both ends
    PriceBetween { min: f64, max: f64 },
    RatingAtLeast(Rating),
    And(Vec<FilterCondition>),
    Or(Vec<FilterCondition>),
    Not(Box<FilterCondition>),
}

impl FieldFilter {
    pub fn new(condition: FilterCondition) -> Self {
        Self { condition }
    }

    pub fn condition(&self) -> &FilterCondition {
        &self.condition
    }

    fn matches_condition(condition: &FilterCondition, book: &Book) -> bool {
        match condition {
            FilterCondition::TitleEquals(title) => book.title == *title,
            FilterCondition::CategoryEquals(category) => book.category == *category,
            FilterCondition::PriceBetween { min, max } => book.price >= *min && book.price <= *max,
            FilterCondition::RatingAtLeast(rating) => book.rating >= *rating,
            FilterCondition::And(conditions) => {
                conditions.iter().all(|c| Self::matches_condition(c, book))
            }
            FilterCondition::Or(conditions) => {
                conditions.iter().any(|c| Self::matches_condition(c, book))
            }
            FilterCondition::Not(condition) => !Self::matches_condition(condition, book),
        }
    }
}

impl BookFilter for FieldFilter {
    fn matches(&self, book: &Book) -> bool {
        Self::matches_condition(&self.condition, book)
    }
}
