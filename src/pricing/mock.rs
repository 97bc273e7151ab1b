//! Scripted pricing API used by unit tests.

use crate::error::AppError;
use crate::pricing::client::PricingApi;
use crate::pricing::models::{GetProductsPage, GetProductsRequest};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Returns queued responses in order, one per `get_products` call
#[derive(Default)]
pub struct ScriptedPricingApi {
    responses: Mutex<VecDeque<Result<GetProductsPage, AppError>>>,
    seen_tokens: Mutex<Vec<Option<String>>>,
}

impl ScriptedPricingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&self, entries: Vec<String>, next_token: Option<&str>) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(GetProductsPage {
            price_list: entries,
            next_token: next_token.map(str::to_string),
        }));
        self
    }

    pub fn push_error(&self, error: AppError) -> &Self {
        self.responses.lock().unwrap().push_back(Err(error));
        self
    }

    /// Continuation tokens of every request received so far
    pub fn seen_tokens(&self) -> Vec<Option<String>> {
        self.seen_tokens.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.seen_tokens.lock().unwrap().len()
    }
}

#[async_trait]
impl PricingApi for ScriptedPricingApi {
    async fn get_products(&self, request: &GetProductsRequest) -> Result<GetProductsPage, AppError> {
        self.seen_tokens
            .lock()
            .unwrap()
            .push(request.next_token.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::ProviderFetch("script exhausted".to_string())))
    }
}

/// A `PriceList` element as the pricing API encodes it
pub fn catalog_entry(location: &str, instance_type: &str, usd: &str) -> String {
    json!({
        "product": {
            "productFamily": "Compute Instance",
            "attributes": {
                "location": location,
                "instanceType": instance_type,
                "operatingSystem": "Linux",
                "tenancy": "Shared"
            },
            "sku": format!("SKU-{}-{}", location.len(), instance_type)
        },
        "serviceCode": "AmazonEC2",
        "terms": {
            "OnDemand": {
                "SKU.JRTCKXETXF": {
                    "priceDimensions": {
                        "SKU.JRTCKXETXF.6YS6EN2CT7": {
                            "unit": "Hrs",
                            "pricePerUnit": {"USD": usd}
                        }
                    }
                }
            }
        }
    })
    .to_string()
}
