//! Catalog record types: verticals, products, pricing plans, and features.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A top-level product category such as VPNs or web hosting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vertical {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub color: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_true() -> bool {
    true
}

impl Vertical {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            description: String::new(),
            icon: String::new(),
            color: String::new(),
            is_active: true,
            sort_order: 0,
        }
    }
}

/// Unique identifier for a product across the whole catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single reviewable product within a vertical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Unique within the owning vertical.
    pub slug: String,
    /// Slug of the owning vertical.
    pub vertical: String,
    pub name: String,
    /// Editorial score on a 0-10 scale.
    pub overall_rating: f64,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub pricing: Vec<PricingPlan>,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub is_editors_choice: bool,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(
        id: u64,
        vertical: impl Into<String>,
        slug: impl Into<String>,
        name: impl Into<String>,
        overall_rating: f64,
    ) -> Self {
        Self {
            id: ProductId(id),
            slug: slug.into(),
            vertical: vertical.into(),
            name: name.into(),
            overall_rating,
            ..Default::default()
        }
    }

    /// Look up a feature by name (case-insensitive).
    pub fn feature(&self, name: &str) -> Option<&FeatureValue> {
        self.features
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .map(|f| &f.value)
    }
}

/// One pricing tier of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPlan {
    pub plan_name: String,
    pub price: f64,
    #[serde(default)]
    pub billing_cycle: BillingCycle,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub is_popular: bool,
}

impl PricingPlan {
    pub fn new(plan_name: impl Into<String>, price: f64, billing_cycle: BillingCycle) -> Self {
        Self {
            plan_name: plan_name.into(),
            price,
            billing_cycle,
            features: Vec::new(),
            is_popular: false,
        }
    }
}

/// How often a plan's price is charged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
    Biennial,
    OneTime,
    #[serde(other)]
    Other,
}

impl BillingCycle {
    /// Short period suffix used in price labels, e.g. `mo` in `$4.99/mo`.
    pub fn period_label(&self) -> Option<&'static str> {
        match self {
            Self::Monthly => Some("mo"),
            Self::Quarterly => Some("qtr"),
            Self::Yearly => Some("yr"),
            Self::Biennial => Some("2yr"),
            Self::OneTime | Self::Other => None,
        }
    }
}

/// A named product attribute, e.g. `kill_switch: true` or `servers: 5500`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub name: String,
    pub value: FeatureValue,
}

impl Feature {
    pub fn new(name: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FeatureValue {
    pub fn is_true(&self) -> bool {
        matches!(self, Self::Bool(true))
    }
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl std::fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(true) => write!(f, "Yes"),
            Self::Bool(false) => write!(f, "No"),
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}
