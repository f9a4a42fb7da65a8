use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Category not in category map: {0}")]
    CategoryUnknown(String),

    #[error("Insufficient data to fit index: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("Book not found: {0}")]
    BookNotFound(String),

    #[error("Category '{category}' of book '{title}' is not recognized")]
    CategoryUnreconciled { title: String, category: String },

    #[error("Recommendation index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Invalid rating: {0}")]
    InvalidRating(String),

    #[error("Invalid price: {0}")]
    InvalidPrice(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
