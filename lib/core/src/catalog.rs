use ahash::AHashMap;
use serde::Serialize;
use std::collections::BTreeMap;
use crate::{Book, BookFilter, BookId, FieldFilter, FilterCondition, Rating};

/// Aggregate figures over the whole catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogStats {
    pub total_books: usize,
    pub total_price: f64,
    /// Rounded to the nearest whole unit
    pub mean_price: f64,
}

/// Per-category figures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub count: usize,
    /// Rounded to two decimals
    pub average_price: f64,
}

/// Ordered, immutable collection of books.
///
/// Positions are stable for the lifetime of the catalog; the recommender
/// refers to books by position.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: Vec<Book>,
    /// Lowercased title -> first position with that title
    by_title: AHashMap<String, usize>,
}

impl Catalog {
    pub fn new(books: Vec<Book>) -> Self {
        let mut by_title = AHashMap::with_capacity(books.len());
        for (pos, book) in books.iter().enumerate() {
            by_title.entry(book.title.to_lowercase()).or_insert(pos);
        }
        Self { books, by_title }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    #[inline]
    pub fn get(&self, position: usize) -> Option<&Book> {
        self.books.get(position)
    }

    #[inline]
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn iter(&self) -> impl Iterator<Item = &Book> {
        self.books.iter()
    }

    /// Position of the first book whose title matches case-insensitively
    #[inline]
    pub fn position_of_title(&self, title: &str) -> Option<usize> {
        self.by_title.get(&title.to_lowercase()).copied()
    }

    /// First book whose title matches case-insensitively
    pub fn find_by_title(&self, title: &str) -> Option<&Book> {
        self.position_of_title(title).and_then(|pos| self.books.get(pos))
    }

    /// First book with a matching id
    pub fn find_by_id(&self, id: &BookId) -> Option<&Book> {
        self.books.iter().find(|book| book.id.matches(id))
    }

    /// Titles shared by more than one book (case-insensitive), in first-seen order
    pub fn duplicate_titles(&self) -> Vec<&str> {
        let mut seen: AHashMap<String, usize> = AHashMap::new();
        let mut duplicates = Vec::new();
        for book in &self.books {
            let count = seen.entry(book.title.to_lowercase()).or_insert(0);
            *count += 1;
            if *count == 2 {
                duplicates.push(book.title.as_str());
            }
        }
        duplicates
    }

    pub fn titles(&self) -> Vec<&str> {
        self.books.iter().map(|b| b.title.as_str()).collect()
    }

    /// Category of every book, in catalog order (repeats included)
    pub fn categories(&self) -> Vec<&str> {
        self.books.iter().map(|b| b.category.as_str()).collect()
    }

    pub fn search(&self, filter: &dyn BookFilter) -> Vec<&Book> {
        self.books.iter().filter(|b| filter.matches(b)).collect()
    }

    /// Books rated Four or Five
    pub fn top_rated(&self) -> Vec<&Book> {
        self.search(&FieldFilter::new(FilterCondition::RatingAtLeast(Rating::Four)))
    }

    pub fn price_range(&self, min: f64, max: f64) -> Vec<&Book> {
        self.search(&FieldFilter::new(FilterCondition::PriceBetween { min, max }))
    }

    pub fn stats(&self) -> CatalogStats {
        let total_books = self.books.len();
        let total_price: f64 = self.books.iter().map(|b| b.price).sum();
        let mean_price = if total_books == 0 {
            0.0
        } else {
            (total_price / total_books as f64).round()
        };

        CatalogStats {
            total_books,
            total_price,
            mean_price,
        }
    }

    /// Count and average price per category, ordered by category name
    pub fn category_stats(&self) -> Vec<CategoryStats> {
        let mut groups: BTreeMap<&str, (usize, f64)> = BTreeMap::new();
        for book in &self.books {
            let entry = groups.entry(book.category.as_str()).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += book.price;
        }

        groups
            .into_iter()
            .map(|(category, (count, total))| CategoryStats {
                category: category.to_string(),
                count,
                average_price: (total / count as f64 * 100.0).round() / 100.0,
            })
            .collect()
    }
}

impl From<Vec<Book>> for Catalog {
    fn from(books: Vec<Book>) -> Self {
        Self::new(books)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        Catalog::new(vec![
            Book::new(1u64, "A Light in the Attic", 51.77, Rating::Three, "In stock", "Poetry"),
            Book::new(2u64, "Tipping the Velvet", 53.74, Rating::One, "In stock", "Historical Fiction"),
            Book::new(3u64, "Soumission", 50.10, Rating::One, "In stock", "Fiction"),
            Book::new(4u64, "Sharp Objects", 47.82, Rating::Four, "In stock", "Mystery"),
            Book::new(5u64, "Sapiens", 54.23, Rating::Five, "In stock", "History"),
            Book::new(6u64, "sharp objects", 10.00, Rating::Two, "In stock", "Mystery"),
        ])
    }

    #[test]
    fn test_title_lookup_is_case_insensitive_first_match() {
        let catalog = sample();
        let book = catalog.find_by_title("SHARP OBJECTS").unwrap();
        assert_eq!(book.id, BookId::Integer(4));
        assert_eq!(catalog.position_of_title("sharp objects"), Some(3));
        assert!(catalog.find_by_title("Sharp").is_none());
    }

    #[test]
    fn test_find_by_id() {
        let catalog = sample();
        assert_eq!(catalog.find_by_id(&BookId::Integer(5)).unwrap().title, "Sapiens");
        assert_eq!(catalog.find_by_id(&"2".parse().unwrap()).unwrap().title, "Tipping the Velvet");
        assert!(catalog.find_by_id(&BookId::Integer(99)).is_none());
    }

    #[test]
    fn test_duplicate_titles() {
        assert_eq!(sample().duplicate_titles(), vec!["sharp objects"]);
        assert!(Catalog::default().duplicate_titles().is_empty());
    }

    #[test]
    fn test_top_rated_and_price_range() {
        let catalog = sample();
        let top: Vec<&str> = catalog.top_rated().into_iter().map(|b| b.title.as_str()).collect();
        assert_eq!(top, vec!["Sharp Objects", "Sapiens"]);

        let mid: Vec<&str> = catalog.price_range(50.0, 52.0).into_iter().map(|b| b.title.as_str()).collect();
        assert_eq!(mid, vec!["A Light in the Attic", "Soumission"]);
        assert!(catalog.price_range(100.0, 200.0).is_empty());
    }

    #[test]
    fn test_stats() {
        let stats = sample().stats();
        assert_eq!(stats.total_books, 6);
        assert!((stats.total_price - 267.66).abs() < 1e-9);
        assert_eq!(stats.mean_price, 45.0);

        let empty = Catalog::default().stats();
        assert_eq!(empty.total_books, 0);
        assert_eq!(empty.mean_price, 0.0);
    }

    #[test]
    fn test_category_stats() {
        let stats = sample().category_stats();
        let names: Vec<&str> = stats.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["Fiction", "Historical Fiction", "History", "Mystery", "Poetry"]);

        let mystery = stats.iter().find(|s| s.category == "Mystery").unwrap();
        assert_eq!(mystery.count, 2);
        assert!((mystery.average_price - 28.91).abs() < 1e-9);
    }
}
