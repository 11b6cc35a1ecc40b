//! Head-to-head comparison engine.
//!
//! A comparison's slug and title follow the argument order, so the engine
//! also owns canonicalization: [`canonical_comparison`] orders the two
//! products by slug, and [`resolve_comparison`] turns a non-canonical URL
//! segment into a redirect instead of a second page for the same pair.

use serde::Serialize;
use tracing::debug;

use crate::catalog::{Catalog, Product, require_vertical};
use crate::error::CatalogError;
use crate::ranking::comparison_pairs;

/// Separator between the two product slugs of a comparison slug.
pub const VS_SEPARATOR: &str = "-vs-";

/// Rule applied when both products have exactly the same rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// The first argument given to [`generate_comparison`] is the winner.
    FirstArgumentWins,
}

/// A derived head-to-head record between two products.
#[derive(Debug, Clone, Serialize)]
pub struct Comparison<'a> {
    pub slug: String,
    pub title: String,
    pub products: [&'a Product; 2],
    pub winner: &'a Product,
    /// Rating difference between the two products (never negative).
    pub margin: f64,
    /// Whether the winner was decided by [`Comparison::TIE_BREAK`].
    pub is_tie: bool,
}

impl<'a> Comparison<'a> {
    pub const TIE_BREAK: TieBreak = TieBreak::FirstArgumentWins;

    pub fn loser(&self) -> &'a Product {
        if std::ptr::eq(self.winner, self.products[0]) {
            self.products[1]
        } else {
            self.products[0]
        }
    }
}

/// Compare two products in the order given.
///
/// The strictly higher rating wins. Equal ratings fall back to
/// [`Comparison::TIE_BREAK`], i.e. `a` wins.
pub fn generate_comparison<'a>(a: &'a Product, b: &'a Product) -> Comparison<'a> {
    let is_tie = a.overall_rating == b.overall_rating;
    let winner = if b.overall_rating > a.overall_rating {
        b
    } else {
        match Comparison::TIE_BREAK {
            TieBreak::FirstArgumentWins => a,
        }
    };

    Comparison {
        slug: format!("{}{}{}", a.slug, VS_SEPARATOR, b.slug),
        title: format!("{} vs {}", a.name, b.name),
        products: [a, b],
        winner,
        margin: (a.overall_rating - b.overall_rating).abs(),
        is_tie,
    }
}

/// Order two products canonically: ascending slug, then ascending id.
pub fn canonical_order<'a>(a: &'a Product, b: &'a Product) -> (&'a Product, &'a Product) {
    if (b.slug.as_str(), b.id) < (a.slug.as_str(), a.id) {
        (b, a)
    } else {
        (a, b)
    }
}

/// Compare two products in canonical order, so swapped arguments produce
/// the same slug and the same winner.
pub fn canonical_comparison<'a>(a: &'a Product, b: &'a Product) -> Comparison<'a> {
    let (first, second) = canonical_order(a, b);
    generate_comparison(first, second)
}

/// Canonical `{a}-vs-{b}` slug for an unordered pair.
pub fn comparison_slug(a: &Product, b: &Product) -> String {
    let (first, second) = canonical_order(a, b);
    format!("{}{}{}", first.slug, VS_SEPARATOR, second.slug)
}

/// Canonical comparisons for every pair, in [`comparison_pairs`] order.
pub fn canonical_comparisons<'a>(products: &[&'a Product]) -> Vec<Comparison<'a>> {
    comparison_pairs(products)
        .into_iter()
        .map(|(a, b)| canonical_comparison(a, b))
        .collect()
}

/// Every way to split `segment` into two non-empty slugs around `-vs-`.
///
/// Slugs may contain hyphens (and in principle `-vs-` itself), so each
/// occurrence of the separator is a candidate split.
pub fn parse_comparison_segment(segment: &str) -> Vec<(&str, &str)> {
    segment
        .match_indices(VS_SEPARATOR)
        .map(|(idx, _)| (&segment[..idx], &segment[idx + VS_SEPARATOR.len()..]))
        .filter(|(a, b)| !a.is_empty() && !b.is_empty())
        .collect()
}

/// Outcome of resolving a comparison URL segment.
#[derive(Debug, Clone)]
pub enum ComparisonRoute<'a> {
    /// The segment is canonical; render this comparison.
    Page(Comparison<'a>),
    /// Both products exist but in non-canonical order.
    Redirect { canonical_slug: String },
}

/// Resolve `{a}-vs-{b}` within a vertical.
///
/// Unknown slugs and self-comparisons are reported as not found, so the
/// engine only ever sees two resolved, distinct products.
pub fn resolve_comparison<'a, C: Catalog + ?Sized>(
    catalog: &'a C,
    vertical_slug: &str,
    segment: &str,
) -> Result<ComparisonRoute<'a>, CatalogError> {
    require_vertical(catalog, vertical_slug)?;

    let resolved = parse_comparison_segment(segment)
        .into_iter()
        .find_map(|(left, right)| {
            let a = catalog.product(vertical_slug, left)?;
            let b = catalog.product(vertical_slug, right)?;
            Some((a, b))
        });

    let Some((a, b)) = resolved else {
        debug!(vertical = vertical_slug, segment, "Comparison segment did not resolve");
        return Err(CatalogError::ComparisonNotFound {
            segment: segment.to_string(),
        });
    };

    if a.id == b.id {
        return Err(CatalogError::ComparisonNotFound {
            segment: segment.to_string(),
        });
    }

    let comparison = canonical_comparison(a, b);
    if comparison.slug == segment {
        Ok(ComparisonRoute::Page(comparison))
    } else {
        Ok(ComparisonRoute::Redirect {
            canonical_slug: comparison.slug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryCatalog, Vertical};

    fn product(id: u64, slug: &str, rating: f64) -> Product {
        Product::new(id, "vpn", slug, slug.to_uppercase(), rating)
    }

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new(
            vec![Vertical::new("vpn", "VPNs")],
            vec![
                product(1, "nordvpn", 9.5),
                product(2, "surfshark", 9.5),
                product(3, "private-internet-access", 8.0),
                product(4, "ivpn", 7.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_higher_rating_wins() {
        let a = product(1, "a", 7.0);
        let b = product(2, "b", 8.5);
        let cmp = generate_comparison(&a, &b);
        assert_eq!(cmp.winner.id, b.id);
        assert_eq!(cmp.loser().id, a.id);
        assert!(!cmp.is_tie);
        assert!((cmp.margin - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_tie_goes_to_first_argument() {
        let a = product(1, "a", 9.5);
        let b = product(2, "b", 9.5);
        assert_eq!(generate_comparison(&a, &b).winner.id, a.id);
        assert_eq!(generate_comparison(&b, &a).winner.id, b.id);
        assert!(generate_comparison(&a, &b).is_tie);
        assert_eq!(Comparison::TIE_BREAK, TieBreak::FirstArgumentWins);
    }

    #[test]
    fn test_slug_and_title_follow_argument_order() {
        let a = product(1, "nordvpn", 9.5);
        let b = product(2, "surfshark", 9.0);
        let cmp = generate_comparison(&b, &a);
        assert_eq!(cmp.slug, "surfshark-vs-nordvpn");
        assert_eq!(cmp.title, "SURFSHARK vs NORDVPN");
    }

    #[test]
    fn test_canonical_comparison_is_order_independent() {
        let a = product(1, "surfshark", 9.5);
        let b = product(2, "nordvpn", 9.5);
        let ab = canonical_comparison(&a, &b);
        let ba = canonical_comparison(&b, &a);
        assert_eq!(ab.slug, "nordvpn-vs-surfshark");
        assert_eq!(ab.slug, ba.slug);
        assert_eq!(ab.winner.id, ba.winner.id);
        assert_eq!(comparison_slug(&a, &b), ab.slug);
    }

    #[test]
    fn test_parse_segment_with_hyphenated_slugs() {
        let splits = parse_comparison_segment("private-internet-access-vs-nordvpn");
        assert_eq!(splits, vec![("private-internet-access", "nordvpn")]);
        assert!(parse_comparison_segment("nordvpn").is_empty());
        assert!(parse_comparison_segment("-vs-nordvpn").is_empty());
    }

    #[test]
    fn test_parse_segment_multiple_separators() {
        let splits = parse_comparison_segment("a-vs-b-vs-c");
        assert_eq!(splits, vec![("a", "b-vs-c"), ("a-vs-b", "c")]);
    }

    #[test]
    fn test_resolve_canonical_page() {
        let catalog = catalog();
        let route =
            resolve_comparison(&catalog, "vpn", "nordvpn-vs-private-internet-access").unwrap();
        match route {
            ComparisonRoute::Page(cmp) => {
                assert_eq!(cmp.winner.slug, "nordvpn");
                assert_eq!(cmp.products[1].slug, "private-internet-access");
            }
            other => panic!("expected page, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_reversed_segment_redirects() {
        let catalog = catalog();
        let route = resolve_comparison(&catalog, "vpn", "surfshark-vs-nordvpn").unwrap();
        match route {
            ComparisonRoute::Redirect { canonical_slug } => {
                assert_eq!(canonical_slug, "nordvpn-vs-surfshark");
            }
            other => panic!("expected redirect, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_unknown_and_self_comparisons() {
        let catalog = catalog();
        assert!(matches!(
            resolve_comparison(&catalog, "vpn", "nordvpn-vs-expressvpn"),
            Err(CatalogError::ComparisonNotFound { .. })
        ));
        assert!(matches!(
            resolve_comparison(&catalog, "vpn", "nordvpn-vs-nordvpn"),
            Err(CatalogError::ComparisonNotFound { .. })
        ));
        assert!(matches!(
            resolve_comparison(&catalog, "hosting", "nordvpn-vs-surfshark"),
            Err(CatalogError::VerticalNotFound { .. })
        ));
    }

    #[test]
    fn test_canonical_comparisons_cover_all_pairs() {
        let catalog = catalog();
        let products = catalog.products("vpn");
        let comparisons = canonical_comparisons(&products);
        assert_eq!(comparisons.len(), 6);
        let mut slugs: Vec<&str> = comparisons.iter().map(|c| c.slug.as_str()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), 6);
        for slug in slugs {
            assert!(matches!(
                resolve_comparison(&catalog, "vpn", slug),
                Ok(ComparisonRoute::Page(_))
            ));
        }
    }
}
