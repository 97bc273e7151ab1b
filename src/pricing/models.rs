use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Instance type -> on-demand hourly USD price, exactly as the catalog spells it
pub type RegionPrices = BTreeMap<String, String>;

/// Complete region -> instance type -> price snapshot.
///
/// Built in full by the fetcher and never mutated after it is published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceTable(BTreeMap<String, RegionPrices>);

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a price while the table is still being built
    pub fn insert(&mut self, region: &str, instance_type: &str, price: String) {
        self.0
            .entry(region.to_string())
            .or_default()
            .insert(instance_type.to_string(), price);
    }

    pub fn region(&self, region: &str) -> Option<&RegionPrices> {
        self.0.get(region)
    }

    pub fn price(&self, region: &str, instance_type: &str) -> Option<&str> {
        self.region(region)?.get(instance_type).map(String::as_str)
    }

    pub fn regions(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            regions: self.0.len(),
            instance_types: self.0.values().map(BTreeMap::len).sum(),
        }
    }
}

impl FromIterator<(String, RegionPrices)> for PriceTable {
    fn from_iter<I: IntoIterator<Item = (String, RegionPrices)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Region and price counts of a table, used for logs, health and metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub regions: usize,
    pub instance_types: usize,
}

// ============================================================
// Pricing API wire types
// ============================================================

/// Single `TERM_MATCH` filter of a GetProducts request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductFilter {
    #[serde(rename = "Type")]
    pub filter_type: &'static str,
    #[serde(rename = "Field")]
    pub field: &'static str,
    #[serde(rename = "Value")]
    pub value: &'static str,
}

impl ProductFilter {
    pub const fn term_match(field: &'static str, value: &'static str) -> Self {
        Self {
            filter_type: "TERM_MATCH",
            field,
            value,
        }
    }
}

/// GetProducts request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetProductsRequest {
    pub service_code: &'static str,
    pub filters: Vec<ProductFilter>,
    pub format_version: &'static str,
    pub max_results: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// One page of GetProducts output.
///
/// Each `PriceList` element is itself a JSON document encoded as a string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GetProductsPage {
    #[serde(default)]
    pub price_list: Vec<String>,
    #[serde(default)]
    pub next_token: Option<String>,
}

impl GetProductsPage {
    /// Continuation token, if another page follows
    pub fn continuation(&self) -> Option<&str> {
        self.next_token.as_deref().filter(|token| !token.is_empty())
    }
}

/// Catalog entry decoded from one `PriceList` element
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogEntry {
    pub product: Product,
    pub terms: Terms,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    pub attributes: ProductAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductAttributes {
    /// Human-readable location label, e.g. "EU (Ireland)"
    pub location: String,
    #[serde(rename = "instanceType")]
    pub instance_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Terms {
    #[serde(rename = "OnDemand", default)]
    pub on_demand: HashMap<String, OfferTerm>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OfferTerm {
    #[serde(rename = "priceDimensions")]
    pub price_dimensions: HashMap<String, PriceDimension>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceDimension {
    #[serde(rename = "pricePerUnit")]
    pub price_per_unit: HashMap<String, String>,
}

impl CatalogEntry {
    /// The entry's single on-demand USD unit price.
    ///
    /// Exactly one on-demand term holding exactly one price dimension is expected.
    pub fn on_demand_usd(&self) -> Result<&str, String> {
        let mut terms = self.terms.on_demand.values();
        let term = match (terms.next(), terms.next()) {
            (Some(term), None) => term,
            (None, _) => return Err("no OnDemand term".to_string()),
            (Some(_), Some(_)) => {
                return Err(format!(
                    "{} OnDemand terms, expected one",
                    self.terms.on_demand.len()
                ))
            }
        };

        let mut dimensions = term.price_dimensions.values();
        let dimension = match (dimensions.next(), dimensions.next()) {
            (Some(dimension), None) => dimension,
            (None, _) => return Err("OnDemand term has no price dimension".to_string()),
            (Some(_), Some(_)) => {
                return Err(format!(
                    "{} price dimensions, expected one",
                    term.price_dimensions.len()
                ))
            }
        };

        dimension
            .price_per_unit
            .get("USD")
            .map(String::as_str)
            .ok_or_else(|| "price dimension has no USD price".to_string())
    }
}
