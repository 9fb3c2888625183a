// config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub app_url: String,
    pub bearer_token: String,
    // Realtime channel authorization endpoint
    pub realtime_auth_url: String,
    // Payment gateway configurations
    pub gateway_url: String,
    pub merchant_id: String,
    pub merchant_name: String,
}

impl Config {
    pub fn init() -> Config {
        let api_base_url = std::env::var("API_BASE_URL").expect("API_BASE_URL must be set");
        let app_url = std::env::var("APP_URL").expect("APP_URL must be set");
        let bearer_token = std::env::var("BEARER_TOKEN").expect("BEARER_TOKEN must be set");
        let gateway_url = std::env::var("GATEWAY_URL").expect("GATEWAY_URL must be set");

        // Channel auth defaults to the backend's broadcasting endpoint
        let realtime_auth_url = std::env::var("REALTIME_AUTH_URL")
            .unwrap_or_else(|_| format!("{}/broadcasting/auth", api_base_url));

        // Merchant identity (with the production defaults)
        let merchant_id = std::env::var("MERCHANT_ID")
            .unwrap_or_else(|_| "7530".to_string());
        let merchant_name = std::env::var("MERCHANT_NAME")
            .unwrap_or_else(|_| "dbridge".to_string());

        Config {
            api_base_url,
            app_url,
            bearer_token,
            realtime_auth_url,
            gateway_url,
            merchant_id,
            merchant_name,
        }
    }

    /// The URL the gateway sends the user back to after a payment attempt.
    pub fn response_url(&self, document_id: &str) -> String {
        format!(
            "{}/payment/response?docId={}",
            self.app_url,
            urlencoding::encode(document_id)
        )
    }
}
