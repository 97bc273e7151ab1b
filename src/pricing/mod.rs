pub mod client;
pub mod fetcher;
pub mod models;
pub mod regions;
pub mod resolver;
pub mod sigv4;
pub mod store;
pub mod updater;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{AwsPricingClient, PricingApi};
pub use fetcher::PriceFetcher;
pub use models::{PriceTable, RegionPrices, TableSummary};
pub use regions::RegionNameIndex;
pub use resolver::{resolve, Resolved};
pub use store::PriceStore;
pub use updater::PricingUpdater;
