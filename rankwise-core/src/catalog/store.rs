//! Catalog storage.
//!
//! The catalog is built once at startup and handed to the ranking and
//! comparison layers by reference. `Catalog` is the seam for swapping the
//! in-memory store for a database-backed one.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::model::{Product, ProductId, Vertical};
use crate::error::CatalogError;

/// Bundled demo catalog used when no catalog file is configured.
const SEED_CATALOG: &str = include_str!("../../data/seed_catalog.json");

/// Read access to verticals and products.
///
/// `products` must return products in their original insertion order; the
/// ranking layer relies on that order for stable tie-breaking.
pub trait Catalog: Send + Sync {
    /// All verticals in insertion order, active or not.
    fn verticals(&self) -> Vec<&Vertical>;

    fn vertical(&self, slug: &str) -> Option<&Vertical>;

    /// Products of a vertical in insertion order. Empty for unknown verticals.
    fn products(&self, vertical_slug: &str) -> Vec<&Product>;

    fn product(&self, vertical_slug: &str, product_slug: &str) -> Option<&Product>;

    fn product_by_id(&self, id: ProductId) -> Option<&Product>;
}

/// On-disk shape of a catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub verticals: Vec<Vertical>,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Immutable in-memory catalog, validated on construction.
#[derive(Debug, Clone)]
pub struct InMemoryCatalog {
    verticals: Vec<Vertical>,
    products: Vec<Product>,
    /// vertical slug -> indices into `products`, insertion ordered.
    by_vertical: HashMap<String, Vec<usize>>,
    by_id: HashMap<ProductId, usize>,
}

impl InMemoryCatalog {
    pub fn new(verticals: Vec<Vertical>, products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut by_vertical: HashMap<String, Vec<usize>> = HashMap::new();
        for v in &verticals {
            if by_vertical.insert(v.slug.clone(), Vec::new()).is_some() {
                return Err(CatalogError::DuplicateVertical {
                    slug: v.slug.clone(),
                });
            }
        }

        let mut by_id = HashMap::with_capacity(products.len());
        let mut slugs: HashSet<(&str, &str)> = HashSet::with_capacity(products.len());

        for (idx, p) in products.iter().enumerate() {
            if !p.overall_rating.is_finite() || !(0.0..=10.0).contains(&p.overall_rating) {
                return Err(CatalogError::InvalidRating {
                    slug: p.slug.clone(),
                    rating: p.overall_rating,
                });
            }
            if let Some(plan) = p
                .pricing
                .iter()
                .find(|plan| !plan.price.is_finite() || plan.price < 0.0)
            {
                return Err(CatalogError::InvalidPrice {
                    slug: p.slug.clone(),
                    plan: plan.plan_name.clone(),
                    price: plan.price,
                });
            }
            let Some(members) = by_vertical.get_mut(&p.vertical) else {
                return Err(CatalogError::UnknownVertical {
                    product: p.slug.clone(),
                    vertical: p.vertical.clone(),
                });
            };
            if by_id.insert(p.id, idx).is_some() {
                return Err(CatalogError::DuplicateProductId { id: p.id.0 });
            }
            if !slugs.insert((p.vertical.as_str(), p.slug.as_str())) {
                return Err(CatalogError::DuplicateProductSlug {
                    vertical: p.vertical.clone(),
                    slug: p.slug.clone(),
                });
            }
            members.push(idx);
        }

        debug!(
            verticals = verticals.len(),
            products = products.len(),
            "Catalog validated"
        );

        Ok(Self {
            verticals,
            products,
            by_vertical,
            by_id,
        })
    }

    pub fn from_data(data: CatalogData) -> Result<Self, CatalogError> {
        Self::new(data.verticals, data.products)
    }

    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json).map_err(|e| CatalogError::Parse {
            message: e.to_string(),
        })?;
        Self::from_data(data)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = toml::from_str(source).map_err(|e| CatalogError::Parse {
            message: e.to_string(),
        })?;
        Self::from_data(data)
    }

    /// Load a catalog file, choosing the format by extension (`.json` or `.toml`).
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Parse {
            message: format!("{}: {}", path.display(), e),
        })?;
        let catalog = match ext.as_deref() {
            Some("json") => Self::from_json_str(&content)?,
            Some("toml") => Self::from_toml_str(&content)?,
            _ => {
                return Err(CatalogError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };
        info!(
            path = %path.display(),
            verticals = catalog.verticals.len(),
            products = catalog.products.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// The bundled demo catalog.
    pub fn seed() -> Result<Self, CatalogError> {
        Self::from_json_str(SEED_CATALOG)
    }

    pub fn product_count(&self) -> usize {
        self.products.len()
    }

    pub fn all_products(&self) -> &[Product] {
        &self.products
    }
}

impl Catalog for InMemoryCatalog {
    fn verticals(&self) -> Vec<&Vertical> {
        self.verticals.iter().collect()
    }

    fn vertical(&self, slug: &str) -> Option<&Vertical> {
        self.verticals.iter().find(|v| v.slug == slug)
    }

    fn products(&self, vertical_slug: &str) -> Vec<&Product> {
        self.by_vertical
            .get(vertical_slug)
            .map(|idxs| idxs.iter().map(|&i| &self.products[i]).collect())
            .unwrap_or_default()
    }

    fn product(&self, vertical_slug: &str, product_slug: &str) -> Option<&Product> {
        self.by_vertical
            .get(vertical_slug)?
            .iter()
            .map(|&i| &self.products[i])
            .find(|p| p.slug == product_slug)
    }

    fn product_by_id(&self, id: ProductId) -> Option<&Product> {
        self.by_id.get(&id).map(|&i| &self.products[i])
    }
}

/// Active verticals, stably sorted ascending by `sort_order`.
pub fn active_verticals<C: Catalog + ?Sized>(catalog: &C) -> Vec<&Vertical> {
    let mut active: Vec<&Vertical> = catalog
        .verticals()
        .into_iter()
        .filter(|v| v.is_active)
        .collect();
    active.sort_by_key(|v| v.sort_order);
    active
}

/// Resolve a vertical slug, or report it as not found.
pub fn require_vertical<'a, C: Catalog + ?Sized>(
    catalog: &'a C,
    slug: &str,
) -> Result<&'a Vertical, CatalogError> {
    catalog
        .vertical(slug)
        .ok_or_else(|| CatalogError::VerticalNotFound {
            slug: slug.to_string(),
        })
}

/// Resolve a product slug within a vertical, or report it as not found.
pub fn require_product<'a, C: Catalog + ?Sized>(
    catalog: &'a C,
    vertical_slug: &str,
    product_slug: &str,
) -> Result<&'a Product, CatalogError> {
    require_vertical(catalog, vertical_slug)?;
    catalog
        .product(vertical_slug, product_slug)
        .ok_or_else(|| CatalogError::ProductNotFound {
            vertical: vertical_slug.to_string(),
            slug: product_slug.to_string(),
        })
}
