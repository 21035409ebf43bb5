use std::collections::{BTreeSet, HashSet};

use serde::Serialize;

use crate::catalog::Catalog;
use crate::domain::{Book, PublisherFilter, YearRange};

/// Legal values for each filterable attribute, derived from the current
/// catalog. Recomputed only when the catalog changes, never per filter
/// change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilterDomain {
    pub years: Vec<i32>,
    pub publishers: Vec<String>,
    pub year_bounds: Option<YearRange>,
}

impl FilterDomain {
    /// One pass over the catalog: distinct years (ascending), distinct
    /// publishers (first-seen order), numeric year bounds.
    pub fn derive(catalog: &Catalog) -> Self {
        let mut years = BTreeSet::new();
        let mut seen = HashSet::new();
        let mut publishers = Vec::new();
        for book in catalog.books() {
            years.insert(book.year);
            if seen.insert(book.publisher.clone()) {
                publishers.push(book.publisher.clone());
            }
        }
        let year_bounds = match (years.first(), years.last()) {
            (Some(&low), Some(&high)) => Some(YearRange::new(low, high)),
            _ => None,
        };
        Self {
            years: years.into_iter().collect(),
            publishers,
            year_bounds,
        }
    }

    pub fn knows_publisher(&self, name: &str) -> bool {
        self.publishers.iter().any(|publisher| publisher == name)
    }
}

/// User-editable filter state. The default state selects the whole catalog.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub search: String,
    pub publisher: PublisherFilter,
    pub year_range: Option<YearRange>,
}

impl FilterState {
    /// Conjunctive predicate: search AND year range AND publisher.
    pub fn matches(&self, book: &Book, domain: &FilterDomain) -> bool {
        self.matches_search(book) && self.matches_year(book, domain) && self.matches_publisher(book)
    }

    fn matches_search(&self, book: &Book) -> bool {
        if self.search.is_empty() {
            return true;
        }
        book.title
            .to_lowercase()
            .contains(&self.search.to_lowercase())
    }

    fn matches_year(&self, book: &Book, domain: &FilterDomain) -> bool {
        let Some(range) = self.year_range else {
            return true;
        };
        // A range spanning the full bounds means "no year restriction".
        if domain.year_bounds == Some(range) {
            return true;
        }
        range.contains(book.year)
    }

    fn matches_publisher(&self, book: &Book) -> bool {
        match &self.publisher {
            PublisherFilter::Any => true,
            PublisherFilter::Named(name) => book.publisher == *name,
        }
    }
}

/// Evaluate the predicate over the catalog. Pure selection: the result is
/// an order-stable subsequence of the catalog and the catalog is untouched.
/// An empty result is valid, not an error.
pub fn apply(catalog: &Catalog, state: &FilterState, domain: &FilterDomain) -> Vec<Book> {
    catalog
        .books()
        .iter()
        .filter(|book| state.matches(book, domain))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(title: &str, year: i32, publisher: &str) -> Book {
        Book {
            title: title.to_string(),
            year,
            publisher: publisher.to_string(),
            isbn: String::new(),
            pages: 0,
            image: None,
        }
    }

    fn sample_catalog() -> Catalog {
        Catalog::new(vec![
            book("It", 1986, "Viking"),
            book("Misery", 1987, "Viking"),
            book("Carrie", 1974, "Doubleday"),
        ])
    }

    #[test]
    fn derive_collects_distinct_values_and_bounds() {
        let domain = FilterDomain::derive(&sample_catalog());
        assert_eq!(domain.years, vec![1974, 1986, 1987]);
        assert_eq!(domain.publishers, vec!["Viking", "Doubleday"]);
        assert_eq!(domain.year_bounds, Some(YearRange::new(1974, 1987)));
    }

    #[test]
    fn derive_dedupes() {
        let catalog = Catalog::new(vec![
            book("It", 1986, "Viking"),
            book("Eyes of the Dragon", 1986, "Viking"),
        ]);
        let domain = FilterDomain::derive(&catalog);
        assert_eq!(domain.years, vec![1986]);
        assert_eq!(domain.publishers, vec!["Viking"]);
    }

    #[test]
    fn derive_of_empty_catalog_has_no_bounds() {
        let domain = FilterDomain::derive(&Catalog::default());
        assert!(domain.years.is_empty());
        assert!(domain.publishers.is_empty());
        assert!(domain.year_bounds.is_none());
    }

    #[test]
    fn no_active_filters_is_identity() {
        let catalog = sample_catalog();
        let domain = FilterDomain::derive(&catalog);
        let state = FilterState {
            year_range: domain.year_bounds,
            ..FilterState::default()
        };
        assert_eq!(apply(&catalog, &state, &domain), catalog.books());
    }

    #[test]
    fn search_is_case_insensitive() {
        let catalog = sample_catalog();
        let domain = FilterDomain::derive(&catalog);
        let lower = FilterState {
            search: "it".to_string(),
            ..FilterState::default()
        };
        let upper = FilterState {
            search: "IT".to_string(),
            ..FilterState::default()
        };
        assert_eq!(
            apply(&catalog, &lower, &domain),
            apply(&catalog, &upper, &domain)
        );
    }

    #[test]
    fn full_bounds_range_does_not_restrict() {
        let catalog = sample_catalog();
        let domain = FilterDomain::derive(&catalog);
        let state = FilterState {
            year_range: Some(YearRange::new(1974, 1987)),
            ..FilterState::default()
        };
        assert_eq!(apply(&catalog, &state, &domain).len(), 3);
    }

    #[test]
    fn narrowed_range_is_inclusive_on_both_ends() {
        let catalog = sample_catalog();
        let domain = FilterDomain::derive(&catalog);
        let state = FilterState {
            year_range: Some(YearRange::new(1986, 1987)),
            ..FilterState::default()
        };
        let titles: Vec<_> = apply(&catalog, &state, &domain)
            .into_iter()
            .map(|book| book.title)
            .collect();
        assert_eq!(titles, ["It", "Misery"]);
    }

    #[test]
    fn publisher_filter_selects_exact_matches_in_order() {
        let catalog = sample_catalog();
        let domain = FilterDomain::derive(&catalog);
        let state = FilterState {
            publisher: PublisherFilter::Named("Viking".to_string()),
            year_range: Some(YearRange::new(1974, 1987)),
            ..FilterState::default()
        };
        let titles: Vec<_> = apply(&catalog, &state, &domain)
            .into_iter()
            .map(|book| book.title)
            .collect();
        assert_eq!(titles, ["It", "Misery"]);
    }

    #[test]
    fn filters_are_conjunctive() {
        let catalog = sample_catalog();
        let domain = FilterDomain::derive(&catalog);
        let state = FilterState {
            search: "misery".to_string(),
            publisher: PublisherFilter::Named("Doubleday".to_string()),
            year_range: None,
        };
        assert!(apply(&catalog, &state, &domain).is_empty());
    }

    #[test]
    fn view_is_a_subsequence_of_the_catalog() {
        let catalog = sample_catalog();
        let domain = FilterDomain::derive(&catalog);
        let state = FilterState {
            search: "r".to_string(),
            ..FilterState::default()
        };
        let view = apply(&catalog, &state, &domain);
        let mut cursor = catalog.books().iter();
        for selected in &view {
            assert!(cursor.any(|book| book == selected));
        }
    }

    #[test]
    fn apply_is_idempotent() {
        let catalog = sample_catalog();
        let domain = FilterDomain::derive(&catalog);
        let state = FilterState {
            search: "i".to_string(),
            publisher: PublisherFilter::Named("Viking".to_string()),
            year_range: Some(YearRange::new(1980, 1990)),
        };
        assert_eq!(
            apply(&catalog, &state, &domain),
            apply(&catalog, &state, &domain)
        );
    }
}
