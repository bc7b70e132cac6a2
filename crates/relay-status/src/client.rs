//! Relay HTTP API client.

use crate::types::{AppFeeBalances, ClaimAppFeesRequest, QuoteRequest};
use crate::StatusError;
use relay_config::ApiConfig;
use relay_types::{CheckDescriptor, PostData, Quote, RequestDescriptor, StatusResponse};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

const API_KEY_HEADER: &str = "x-api-key";
const SOURCE_HEADER: &str = "x-relay-source";

/// Client for the relay service. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RelayApiClient {
	http: reqwest::Client,
	base_url: String,
	referrer: Option<String>,
}

impl RelayApiClient {
	pub fn new(config: &ApiConfig) -> Result<Self, StatusError> {
		let mut headers = HeaderMap::new();
		if let Some(key) = &config.api_key {
			insert_header(&mut headers, API_KEY_HEADER, key)?;
		}
		if let Some(source) = &config.source {
			insert_header(&mut headers, SOURCE_HEADER, source)?;
		}

		let http = reqwest::Client::builder()
			.default_headers(headers)
			.build()?;
		Ok(Self::with_client(http, config))
	}

	/// Uses a caller-built HTTP client. Headers from `config` are not applied.
	pub fn with_client(http: reqwest::Client, config: &ApiConfig) -> Self {
		Self {
			http,
			base_url: config.base_url.trim_end_matches('/').to_string(),
			referrer: config.referrer.clone().or_else(|| config.source.clone()),
		}
	}

	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	fn url(&self, endpoint: &str) -> String {
		if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
			endpoint.to_string()
		} else if endpoint.starts_with('/') {
			format!("{}{}", self.base_url, endpoint)
		} else {
			format!("{}/{}", self.base_url, endpoint)
		}
	}

	async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, endpoint: &str) -> Result<T, StatusError> {
		let response = request.send().await?;
		let status = response.status();
		let body = response.text().await?;

		if !status.is_success() {
			debug!(endpoint, status = status.as_u16(), "Relay API returned an error");
			return Err(StatusError::Api {
				status: status.as_u16(),
				body,
				endpoint: endpoint.to_string(),
			});
		}

		serde_json::from_str(&body).map_err(|e| StatusError::InvalidResponse {
			endpoint: endpoint.to_string(),
			message: e.to_string(),
		})
	}

	/// Requests an execution plan. The referrer from configuration fills in
	/// when the request carries none, and the request is recorded on the quote.
	#[instrument(skip_all, fields(origin = request.origin_chain_id, destination = request.destination_chain_id))]
	pub async fn get_quote(&self, request: &QuoteRequest) -> Result<Quote, StatusError> {
		let mut request = request.clone();
		if request.referrer.is_none() {
			request.referrer = self.referrer.clone();
		}
		let body = serde_json::to_value(&request).map_err(|e| StatusError::InvalidRequest(e.to_string()))?;

		let url = self.url("/quote");
		let mut quote: Quote = self
			.send(self.http.post(&url).json(&body), "/quote")
			.await?;
		debug!(steps = quote.steps.len(), "Received quote");

		quote.request = Some(RequestDescriptor {
			url,
			method: "POST".to_string(),
			body: Some(body),
		});
		Ok(quote)
	}

	pub async fn get_status(&self, request_id: &str) -> Result<StatusResponse, StatusError> {
		let endpoint = "/intents/status/v2";
		self.send(
			self.http
				.get(self.url(endpoint))
				.query(&[("requestId", request_id)]),
			endpoint,
		)
		.await
	}

	/// Asks the service for the steps that withdraw accrued app fees.
	pub async fn claim_app_fees(&self, wallet: &str, request: &ClaimAppFeesRequest) -> Result<Quote, StatusError> {
		let endpoint = format!("/app-fees/{}/claim", wallet);
		let url = self.url(&endpoint);
		let body = serde_json::to_value(request).map_err(|e| StatusError::InvalidRequest(e.to_string()))?;

		let mut quote: Quote = self.send(self.http.post(&url).json(&body), &endpoint).await?;
		quote.request = Some(RequestDescriptor {
			url,
			method: "POST".to_string(),
			body: Some(body),
		});
		Ok(quote)
	}

	pub async fn get_app_fees(&self, wallet: &str) -> Result<AppFeeBalances, StatusError> {
		let endpoint = format!("/app-fees/{}", wallet);
		self.send(self.http.get(self.url(&endpoint)), &endpoint)
			.await
	}

	/// Submits a produced signature to the endpoint named by the item.
	pub async fn post_signature(&self, post: &PostData, signature: &str) -> Result<Value, StatusError> {
		let method = parse_method(&post.method)?;
		let mut request = self
			.http
			.request(method, self.url(&post.endpoint))
			.query(&[("signature", signature)]);
		if !post.body.is_null() {
			request = request.json(&post.body);
		}
		self.send(request, &post.endpoint).await
	}

	/// Reads an item's check endpoint.
	pub async fn check(&self, check: &CheckDescriptor) -> Result<StatusResponse, StatusError> {
		let method = parse_method(&check.method)?;
		self.send(
			self.http.request(method, self.url(&check.endpoint)),
			&check.endpoint,
		)
		.await
	}
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), StatusError> {
	let value = HeaderValue::from_str(value)
		.map_err(|_| StatusError::InvalidRequest(format!("invalid value for header {}", name)))?;
	headers.insert(HeaderName::from_static(name), value);
	Ok(())
}

fn parse_method(method: &str) -> Result<Method, StatusError> {
	Method::from_bytes(method.to_ascii_uppercase().as_bytes())
		.map_err(|_| StatusError::InvalidRequest(format!("unsupported HTTP method {}", method)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::TradeType;
	use relay_types::RequestStatus;
	use serde_json::json;
	use wiremock::matchers::{body_partial_json, header, method, path, query_param};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	fn config(base_url: &str) -> ApiConfig {
		ApiConfig {
			base_url: base_url.to_string(),
			source: Some("relay-cli".to_string()),
			referrer: None,
			api_key: Some("secret".to_string()),
			websocket_url: None,
			websocket_enabled: false,
		}
	}

	#[tokio::test]
	async fn test_get_quote_injects_referrer_and_headers() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/quote"))
			.and(header("x-api-key", "secret"))
			.and(header("x-relay-source", "relay-cli"))
			.and(body_partial_json(json!({
				"referrer": "relay-cli",
				"tradeType": "EXACT_INPUT",
				"originChainId": 1
			})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"steps": [{
					"id": "deposit",
					"kind": "transaction",
					"requestId": "0xreq",
					"items": [{"status": "incomplete", "data": {"to": "0x01", "chainId": 1}}]
				}]
			})))
			.expect(1)
			.mount(&server)
			.await;

		let client = RelayApiClient::new(&config(&format!("{}/", server.uri()))).unwrap();
		let quote = client
			.get_quote(&QuoteRequest {
				user: "0x03508bB71268BBA25ECaCC8F620e01866650532c".to_string(),
				origin_chain_id: 1,
				destination_chain_id: 8453,
				origin_currency: "0x0000000000000000000000000000000000000000".to_string(),
				destination_currency: "0x0000000000000000000000000000000000000000".to_string(),
				amount: "1000000".to_string(),
				trade_type: TradeType::ExactInput,
				..Default::default()
			})
			.await
			.unwrap();

		assert_eq!(quote.steps.len(), 1);
		assert_eq!(quote.steps[0].request_id.as_deref(), Some("0xreq"));
		let request = quote.request.as_ref().unwrap();
		assert_eq!(request.method, "POST");
		assert!(request.url.ends_with("/quote"));
		assert_eq!(quote.origin_chain_id(), Some(1));
	}

	#[tokio::test]
	async fn test_get_status() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/intents/status/v2"))
			.and(query_param("requestId", "0xreq"))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"status": "success",
				"txHashes": ["0xdest"],
				"inTxHashes": ["0xorigin"]
			})))
			.mount(&server)
			.await;

		let client = RelayApiClient::new(&config(&server.uri())).unwrap();
		let status = client.get_status("0xreq").await.unwrap();
		assert_eq!(status.status, RequestStatus::Success);
		assert_eq!(status.tx_hashes, vec!["0xdest".to_string()]);
	}

	#[tokio::test]
	async fn test_non_success_becomes_api_error() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/intents/status/v2"))
			.respond_with(ResponseTemplate::new(400).set_body_string("bad request id"))
			.mount(&server)
			.await;

		let client = RelayApiClient::new(&config(&server.uri())).unwrap();
		match client.get_status("nope").await.unwrap_err() {
			StatusError::Api {
				status,
				body,
				endpoint,
			} => {
				assert_eq!(status, 400);
				assert_eq!(body, "bad request id");
				assert_eq!(endpoint, "/intents/status/v2");
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[tokio::test]
	async fn test_post_signature_passes_signature_as_query() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/execute/permits"))
			.and(query_param("signature", "0xsig"))
			.and(body_partial_json(json!({"kind": "eip3009"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
			.expect(1)
			.mount(&server)
			.await;

		let client = RelayApiClient::new(&config(&server.uri())).unwrap();
		let post = PostData {
			endpoint: "/execute/permits".to_string(),
			method: "POST".to_string(),
			body: json!({"kind": "eip3009"}),
		};
		let response = client.post_signature(&post, "0xsig").await.unwrap();
		assert_eq!(response["message"], "ok");
	}

	#[tokio::test]
	async fn test_claim_app_fees() {
		let server = MockServer::start().await;
		Mock::given(method("POST"))
			.and(path("/app-fees/0xwallet/claim"))
			.and(body_partial_json(json!({"chainId": 8453, "recipient": "0xwallet"})))
			.respond_with(ResponseTemplate::new(200).set_body_json(json!({
				"steps": [{"id": "claim", "kind": "signature", "items": []}]
			})))
			.mount(&server)
			.await;

		let client = RelayApiClient::new(&config(&server.uri())).unwrap();
		let quote = client
			.claim_app_fees(
				"0xwallet",
				&ClaimAppFeesRequest {
					chain_id: 8453,
					currency: "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913".to_string(),
					recipient: "0xwallet".to_string(),
				},
			)
			.await
			.unwrap();
		assert_eq!(quote.steps[0].id, "claim");
	}
}
