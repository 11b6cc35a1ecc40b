//! Catalog of verticals and products.

pub mod model;
pub mod store;

pub use model::{BillingCycle, Feature, FeatureValue, PricingPlan, Product, ProductId, Vertical};
pub use store::{
    Catalog, CatalogData, InMemoryCatalog, active_verticals, require_product, require_vertical,
};
