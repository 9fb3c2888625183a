pub mod config;
pub mod dtos;
pub mod error;
pub mod models;
pub mod service;
pub mod utils;

use std::sync::Arc;

use config::Config;
use service::{
    api_gateway::ApiGatewayClient,
    payment_gateway::PaymentGatewayClient,
    realtime::HttpChannelAuthorizer,
};

/// Shared wiring for one authenticated portal session.
#[derive(Debug, Clone)]
pub struct AppState {
    pub env: Config,
    pub api_client: Arc<ApiGatewayClient>,
    pub payment_client: Arc<PaymentGatewayClient>,
    pub channel_authorizer: Arc<HttpChannelAuthorizer>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let http = reqwest::Client::new();

        let api_client = Arc::new(ApiGatewayClient::new(http.clone(), &config));
        let payment_client = Arc::new(PaymentGatewayClient::new(http.clone(), &config));
        let channel_authorizer = Arc::new(HttpChannelAuthorizer::new(http, &config));

        Self {
            env: config,
            api_client,
            payment_client,
            channel_authorizer,
        }
    }
}
