use crate::error::AppError;
use crate::pricing::models::{PriceTable, RegionPrices};

/// Slice of a price table answering one lookup
#[derive(Debug, PartialEq, Eq)]
pub enum Resolved<'a> {
    /// Every region (no region requested)
    Table(&'a PriceTable),
    /// One region's instance type -> price map
    Region(&'a RegionPrices),
    /// A single price string
    Price(&'a str),
}

/// Resolve a lookup against one table snapshot.
///
/// Empty tables and empty regions count as not found.
pub fn resolve<'a>(
    table: &'a PriceTable,
    region: Option<&str>,
    instance_type: Option<&str>,
) -> Result<Resolved<'a>, AppError> {
    let Some(region) = region else {
        if table.is_empty() {
            return Err(AppError::NotFound);
        }
        return Ok(Resolved::Table(table));
    };

    let prices = table
        .region(region)
        .filter(|prices| !prices.is_empty())
        .ok_or(AppError::NotFound)?;

    match instance_type {
        None => Ok(Resolved::Region(prices)),
        Some(instance_type) => prices
            .get(instance_type)
            .filter(|price| !price.is_empty())
            .map(|price| Resolved::Price(price.as_str()))
            .ok_or(AppError::NotFound),
    }
}
