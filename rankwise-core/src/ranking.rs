//! Derivation layer: pure views over catalog products.
//!
//! Every function here is side-effect free and tolerates empty input.
//! Sorting is always stable, so products with equal ratings keep their
//! catalog order and generated pages do not reshuffle between builds.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::{Catalog, PricingPlan, Product};

/// Default number of products shown on an "alternatives" page.
pub const DEFAULT_ALTERNATIVES_LIMIT: usize = 7;

/// Placeholder shown when a product has no pricing plans.
pub const PRICE_PLACEHOLDER: &str = "N/A";

fn by_rating_desc(a: &&Product, b: &&Product) -> Ordering {
    b.overall_rating
        .partial_cmp(&a.overall_rating)
        .unwrap_or(Ordering::Equal)
}

/// Stable sort, highest rating first.
pub fn sort_by_rating<'a>(products: impl IntoIterator<Item = &'a Product>) -> Vec<&'a Product> {
    let mut sorted: Vec<&Product> = products.into_iter().collect();
    sorted.sort_by(by_rating_desc);
    sorted
}

/// All products of a vertical, highest rated first. Unknown verticals yield
/// an empty list.
pub fn products_by_vertical<'a, C: Catalog + ?Sized>(
    catalog: &'a C,
    vertical_slug: &str,
) -> Vec<&'a Product> {
    sort_by_rating(catalog.products(vertical_slug))
}

/// Up to `limit` other products, highest rated first. `current` is excluded
/// by id.
pub fn alternatives<'a>(
    products: &[&'a Product],
    current: &Product,
    limit: usize,
) -> Vec<&'a Product> {
    let mut rest = sort_by_rating(products.iter().copied().filter(|p| p.id != current.id));
    rest.truncate(limit);
    rest
}

/// Every unordered pair exactly once, first element earlier in the input.
pub fn comparison_pairs<'a>(products: &[&'a Product]) -> Vec<(&'a Product, &'a Product)> {
    let n = products.len();
    let mut pairs = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            pairs.push((products[i], products[j]));
        }
    }
    pairs
}

/// The first `n` products by rating.
pub fn top_rated<'a>(products: &[&'a Product], n: usize) -> Vec<&'a Product> {
    let mut sorted = sort_by_rating(products.iter().copied());
    sorted.truncate(n);
    sorted
}

/// Editor's choice products, highest rated first.
pub fn editors_choice<'a>(products: &[&'a Product]) -> Vec<&'a Product> {
    sort_by_rating(products.iter().copied().filter(|p| p.is_editors_choice))
}

/// The cheapest plan. Earlier plans win price ties.
pub fn cheapest_plan(product: &Product) -> Option<&PricingPlan> {
    product.pricing.iter().reduce(|best, plan| {
        if plan.price < best.price {
            plan
        } else {
            best
        }
    })
}

/// Format a plan price as `Free` or `$4.99/mo`.
pub fn format_plan_price(plan: &PricingPlan) -> String {
    if plan.price == 0.0 {
        return "Free".to_string();
    }
    match plan.billing_cycle.period_label() {
        Some(period) => format!("${:.2}/{}", plan.price, period),
        None => format!("${:.2}", plan.price),
    }
}

/// Starting price label, or [`PRICE_PLACEHOLDER`] when there are no plans.
pub fn starting_price(product: &Product) -> String {
    starting_price_or(product, PRICE_PLACEHOLDER)
}

pub fn starting_price_or(product: &Product, placeholder: &str) -> String {
    cheapest_plan(product)
        .map(format_plan_price)
        .unwrap_or_else(|| placeholder.to_string())
}

/// Lowest and highest plan price across a product list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    pub fn label(&self) -> String {
        let fmt = |v: f64| {
            if v == 0.0 {
                "Free".to_string()
            } else {
                format!("${:.2}", v)
            }
        };
        if self.min == self.max {
            fmt(self.min)
        } else {
            format!("{} - {}", fmt(self.min), fmt(self.max))
        }
    }
}

/// Price range over every plan of every product. `None` when no product
/// has a plan.
pub fn price_range(products: &[&Product]) -> Option<PriceRange> {
    products
        .iter()
        .flat_map(|p| p.pricing.iter().map(|plan| plan.price))
        .fold(None, |range, price| match range {
            None => Some(PriceRange {
                min: price,
                max: price,
            }),
            Some(r) => Some(PriceRange {
                min: r.min.min(price),
                max: r.max.max(price),
            }),
        })
}

/// How many products have each boolean feature switched on.
pub fn feature_counts(products: &[&Product]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for feature in products.iter().flat_map(|p| p.features.iter()) {
        if feature.value.is_true() {
            *counts.entry(feature.name.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// The product with the latest `updated_at`. Products without a timestamp
/// are ignored; the earliest product wins ties.
pub fn most_recently_updated<'a>(products: &[&'a Product]) -> Option<&'a Product> {
    products
        .iter()
        .copied()
        .filter(|p| p.updated_at.is_some())
        .reduce(|latest, p| {
            if p.updated_at > latest.updated_at {
                p
            } else {
                latest
            }
        })
}

pub fn average_rating(products: &[&Product]) -> Option<f64> {
    if products.is_empty() {
        return None;
    }
    let total: f64 = products.iter().map(|p| p.overall_rating).sum();
    Some(total / products.len() as f64)
}

/// Aggregate figures for a vertical's hub and data-report pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerticalSummary {
    pub product_count: usize,
    pub average_rating: Option<f64>,
    pub price_range: Option<PriceRange>,
    pub editors_choice_count: usize,
    pub feature_counts: BTreeMap<String, usize>,
    pub most_recently_updated: Option<String>,
}

pub fn summarize(products: &[&Product]) -> VerticalSummary {
    VerticalSummary {
        product_count: products.len(),
        average_rating: average_rating(products),
        price_range: price_range(products),
        editors_choice_count: products.iter().filter(|p| p.is_editors_choice).count(),
        feature_counts: feature_counts(products),
        most_recently_updated: most_recently_updated(products).map(|p| p.slug.clone()),
    }
}
