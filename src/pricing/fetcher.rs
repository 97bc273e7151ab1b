use crate::error::AppError;
use crate::metrics;
use crate::pricing::client::PricingApi;
use crate::pricing::models::{CatalogEntry, GetProductsRequest, PriceTable, ProductFilter};
use crate::pricing::regions::RegionNameIndex;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SERVICE_CODE: &str = "AmazonEC2";
const FORMAT_VERSION: &str = "aws_v1";

/// Fixed catalog filters selecting the on-demand Linux shared-tenancy price point
pub const PRICE_FILTERS: [ProductFilter; 6] = [
    ProductFilter::term_match("ServiceCode", SERVICE_CODE),
    ProductFilter::term_match("operatingSystem", "Linux"),
    ProductFilter::term_match("preInstalledSw", "NA"),
    ProductFilter::term_match("licenseModel", "No License required"),
    ProductFilter::term_match("capacitystatus", "UnusedCapacityReservation"),
    ProductFilter::term_match("tenancy", "Shared"),
];

/// Builds a complete price table from the pricing catalog.
///
/// The table is assembled privately and only returned once every page has
/// been consumed; a failed page yields no table at all.
pub struct PriceFetcher {
    api: Arc<dyn PricingApi>,
    regions: Arc<RegionNameIndex>,
    page_size: u32,
    max_pages: u32,
}

impl PriceFetcher {
    pub fn new(
        api: Arc<dyn PricingApi>,
        regions: Arc<RegionNameIndex>,
        page_size: u32,
        max_pages: u32,
    ) -> Self {
        Self {
            api,
            regions,
            page_size,
            max_pages,
        }
    }

    fn request(&self, next_token: Option<String>) -> GetProductsRequest {
        GetProductsRequest {
            service_code: SERVICE_CODE,
            filters: PRICE_FILTERS.to_vec(),
            format_version: FORMAT_VERSION,
            max_results: self.page_size,
            next_token,
        }
    }

    /// Fetch every catalog page and build a fresh table
    pub async fn fetch(&self) -> Result<PriceTable, AppError> {
        let mut table = PriceTable::new();
        let mut next_token: Option<String> = None;
        let mut pages: u32 = 0;
        let mut skipped: usize = 0;

        loop {
            if pages >= self.max_pages {
                return Err(AppError::ProviderFetch(format!(
                    "Catalog still paginating after {} pages",
                    pages
                )));
            }

            let page = self.api.get_products(&self.request(next_token.clone())).await?;
            pages += 1;

            for raw in &page.price_list {
                if let Err(e) = self.ingest(&mut table, raw) {
                    skipped += 1;
                    debug!(error = %e, "Skipping catalog entry");
                }
            }

            match page.continuation() {
                Some(token) if next_token.as_deref() == Some(token) => {
                    return Err(AppError::ProviderFetch(format!(
                        "Pricing API repeated continuation token after page {}",
                        pages
                    )));
                }
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        if skipped > 0 {
            warn!(skipped, "Skipped malformed catalog entries");
            metrics::record_skipped_entries(skipped);
        }

        let summary = table.summary();
        info!(
            pages,
            regions = summary.regions,
            instance_types = summary.instance_types,
            "Fetched price catalog"
        );
        Ok(table)
    }

    /// Add one `PriceList` element to the table under construction.
    ///
    /// Entries in unknown locations are dropped without error.
    fn ingest(&self, table: &mut PriceTable, raw: &str) -> Result<(), AppError> {
        let entry: CatalogEntry = serde_json::from_str(raw)?;

        let Some(region) = self.regions.resolve(&entry.product.attributes.location) else {
            return Ok(());
        };

        let price = entry.on_demand_usd().map_err(|reason| {
            AppError::MalformedEntry(format!(
                "{} in {}: {}",
                entry.product.attributes.instance_type, region, reason
            ))
        })?;

        table.insert(region, &entry.product.attributes.instance_type, price.to_string());
        Ok(())
    }
}
