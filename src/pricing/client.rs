use crate::config::{AwsConfig, PricingConfig};
use crate::error::AppError;
use crate::pricing::models::{GetProductsPage, GetProductsRequest};
use crate::pricing::sigv4::{self, SigningCredentials};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

const SERVICE_NAME: &str = "pricing";
const TARGET: &str = "AWSPriceListService.GetProducts";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Source of catalog pages.
///
/// Implemented by the AWS client in production and by scripted sources in tests.
#[async_trait]
pub trait PricingApi: Send + Sync {
    /// Fetch one page of products matching `request`
    async fn get_products(&self, request: &GetProductsRequest) -> Result<GetProductsPage, AppError>;
}

/// AWS Price List Query API client.
///
/// URL: `https://api.pricing.{region}.amazonaws.com/`
/// Auth: AWS SigV4 signing (service = "pricing")
/// Protocol: JSON 1.1 RPC, `X-Amz-Target: AWSPriceListService.GetProducts`
pub struct AwsPricingClient {
    http_client: Client,
    endpoint: url::Url,
    region: String,
    credentials: AwsConfig,
}

impl AwsPricingClient {
    pub fn new(pricing: &PricingConfig, credentials: AwsConfig) -> Result<Self, AppError> {
        let endpoint = url::Url::parse(&pricing.endpoint)
            .map_err(|e| AppError::ConfigError(format!("Invalid pricing endpoint: {}", e)))?;

        // The provider call carries its own timeout; the refresh loop adds none
        let http_client = Client::builder()
            .timeout(pricing.request_timeout())
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint,
            region: pricing.region.clone(),
            credentials,
        })
    }
}

#[async_trait]
impl PricingApi for AwsPricingClient {
    async fn get_products(&self, request: &GetProductsRequest) -> Result<GetProductsPage, AppError> {
        if !self.credentials.has_credentials() {
            return Err(AppError::ConfigError(
                "No AWS credentials configured (aws.access_key_id / AWS_ACCESS_KEY_ID)".to_string(),
            ));
        }

        let body = serde_json::to_vec(request)
            .map_err(|e| AppError::ProviderFetch(format!("Failed to serialize request: {}", e)))?;

        let credentials = SigningCredentials {
            access_key_id: &self.credentials.access_key_id,
            secret_access_key: &self.credentials.secret_access_key,
            session_token: self.credentials.session_token.as_deref(),
        };
        let signed_headers = sigv4::sign(
            "POST",
            &self.endpoint,
            &[("content-type", CONTENT_TYPE), ("x-amz-target", TARGET)],
            &body,
            &credentials,
            &self.region,
            SERVICE_NAME,
        );

        let mut req = self
            .http_client
            .post(self.endpoint.clone())
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", TARGET);
        for (key, value) in &signed_headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let response = req.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AppError::ProviderFetch(format!("HTTP {}: {}", status, message)));
        }

        let page: GetProductsPage = response
            .json()
            .await
            .map_err(|e| AppError::ProviderFetch(format!("Invalid GetProducts response: {}", e)))?;

        debug!(
            entries = page.price_list.len(),
            has_next = page.continuation().is_some(),
            "Received pricing page"
        );
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::ProductFilter;
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, header, header_exists, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn pricing_config(endpoint: &str) -> PricingConfig {
        PricingConfig {
            endpoint: endpoint.to_string(),
            region: "us-east-1".to_string(),
            refresh_interval_seconds: 3600,
            request_timeout_seconds: 5,
            page_size: 100,
            max_pages: 10,
            extra_regions: Vec::new(),
        }
    }

    fn credentials() -> AwsConfig {
        AwsConfig {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: None,
        }
    }

    fn request(next_token: Option<&str>) -> GetProductsRequest {
        GetProductsRequest {
            service_code: "AmazonEC2",
            filters: vec![ProductFilter::term_match("tenancy", "Shared")],
            format_version: "aws_v1",
            max_results: 100,
            next_token: next_token.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_get_products_sends_signed_rpc_call() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/"))
            .and(header("x-amz-target", TARGET))
            .and(header("content-type", CONTENT_TYPE))
            .and(header_exists("authorization"))
            .and(header_exists("x-amz-date"))
            .and(body_partial_json(json!({"ServiceCode": "AmazonEC2", "NextToken": "page-2"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "FormatVersion": "aws_v1",
                "PriceList": ["{}"],
                "NextToken": "page-3"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = AwsPricingClient::new(&pricing_config(&mock_server.uri()), credentials()).unwrap();
        let page = client.get_products(&request(Some("page-2"))).await.unwrap();

        assert_eq!(page.price_list.len(), 1);
        assert_eq!(page.continuation(), Some("page-3"));
    }

    #[tokio::test]
    async fn test_get_products_maps_service_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "__type": "AccessDeniedException",
                "message": "not authorized"
            })))
            .mount(&mock_server)
            .await;

        let client = AwsPricingClient::new(&pricing_config(&mock_server.uri()), credentials()).unwrap();
        let err = client.get_products(&request(None)).await.unwrap_err();

        match err {
            AppError::ProviderFetch(msg) => assert!(msg.contains("400")),
            other => panic!("Expected ProviderFetch, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_products_rejects_undecodable_page() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let client = AwsPricingClient::new(&pricing_config(&mock_server.uri()), credentials()).unwrap();
        let err = client.get_products(&request(None)).await.unwrap_err();
        assert!(matches!(err, AppError::ProviderFetch(_)));
    }

    #[tokio::test]
    async fn test_get_products_requires_credentials() {
        let client = AwsPricingClient::new(
            &pricing_config("http://127.0.0.1:9"),
            AwsConfig::default(),
        )
        .unwrap();

        let err = client.get_products(&request(None)).await.unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
