// service/payment_gateway.rs
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    dtos::paymentdtos::*,
    error::ClientError,
    models::paymentmodels::{Instrument, MerchantIdentity, PaymentKind, ServiceCharge, TransactionStatus},
};

/// Locations the aggregator has been observed to put the process id in.
/// The payload is normalized here, once; anything else is a contract error.
const PROCESS_ID_CANDIDATES: [&str; 6] = [
    "ProcessId",
    "processId",
    "process_id",
    "data.ProcessId",
    "data.processId",
    "data.process_id",
];

/// The payment aggregator, reached through the backend's proxy endpoints.
#[async_trait]
pub trait PaymentAggregator: Send + Sync {
    async fn get_instruments(&self, merchant: &MerchantIdentity) -> Result<Vec<Instrument>, ClientError>;

    async fn get_service_charge(
        &self,
        merchant: &MerchantIdentity,
        instrument_code: &str,
        amount: f64,
    ) -> Result<ServiceCharge, ClientError>;

    async fn get_process_id(
        &self,
        merchant: &MerchantIdentity,
        amount: f64,
        merchant_txn_id: &str,
    ) -> Result<String, ClientError>;

    async fn check_transaction_status(
        &self,
        merchant: &MerchantIdentity,
        merchant_txn_id: &str,
    ) -> Result<TransactionStatus, ClientError>;

    async fn record_payment(
        &self,
        document_id: &str,
        merchant_txn_id: &str,
        transaction_id: &str,
        amount: f64,
        kind: PaymentKind,
    ) -> Result<(), ClientError>;
}

#[derive(Debug, Clone)]
pub struct PaymentGatewayClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl PaymentGatewayClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.api_base_url.clone(),
            bearer_token: config.bearer_token.clone(),
        }
    }

    async fn post<B: serde::Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.bearer_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let payload: serde_json::Value = response.json().await?;
        let message = payload
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string);
        if !status.is_success() {
            return Err(ClientError::from_server_message(message));
        }
        Ok(serde_json::from_value(
            payload.get("data").cloned().unwrap_or(payload),
        )?)
    }

    async fn post_raw<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.bearer_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let payload: serde_json::Value = response.json().await?;
        if !status.is_success() {
            let message = payload
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string);
            return Err(ClientError::from_server_message(message));
        }
        Ok(payload)
    }
}

/// Normalize the aggregator's irregular process-id payload. Fails fast
/// with the full candidate list when nothing matches, so contract drift
/// surfaces immediately instead of being papered over downstream.
pub fn extract_process_id(payload: &serde_json::Value) -> Result<String, ClientError> {
    for candidate in PROCESS_ID_CANDIDATES {
        let mut node = Some(payload);
        for segment in candidate.split('.') {
            node = node.and_then(|n| n.get(segment));
        }
        match node {
            Some(serde_json::Value::String(s)) if !s.is_empty() => return Ok(s.clone()),
            Some(serde_json::Value::Number(n)) => return Ok(n.to_string()),
            _ => {}
        }
    }
    Err(ClientError::Contract {
        field_candidates: PROCESS_ID_CANDIDATES.iter().map(|c| c.to_string()).collect(),
    })
}

#[async_trait]
impl PaymentAggregator for PaymentGatewayClient {
    async fn get_instruments(&self, merchant: &MerchantIdentity) -> Result<Vec<Instrument>, ClientError> {
        let dto = GetInstrumentsDto {
            merchant_id: merchant.merchant_id.clone(),
            merchant_name: merchant.merchant_name.clone(),
        };
        self.post("/api/payment/get-instruments", &dto).await
    }

    async fn get_service_charge(
        &self,
        merchant: &MerchantIdentity,
        instrument_code: &str,
        amount: f64,
    ) -> Result<ServiceCharge, ClientError> {
        let dto = GetServiceChargeDto {
            merchant_id: merchant.merchant_id.clone(),
            merchant_name: merchant.merchant_name.clone(),
            amount,
            instrument_code: instrument_code.to_string(),
        };
        self.post("/api/payment/get-service-charge", &dto).await
    }

    async fn get_process_id(
        &self,
        merchant: &MerchantIdentity,
        amount: f64,
        merchant_txn_id: &str,
    ) -> Result<String, ClientError> {
        let dto = GetProcessIdDto {
            merchant_id: merchant.merchant_id.clone(),
            merchant_name: merchant.merchant_name.clone(),
            amount,
            merchant_txn_id: merchant_txn_id.to_string(),
        };
        let payload = self.post_raw("/api/payment/get-process-id", &dto).await?;
        extract_process_id(&payload)
    }

    async fn check_transaction_status(
        &self,
        merchant: &MerchantIdentity,
        merchant_txn_id: &str,
    ) -> Result<TransactionStatus, ClientError> {
        let dto = CheckTransactionStatusDto {
            merchant_id: merchant.merchant_id.clone(),
            merchant_name: merchant.merchant_name.clone(),
            merchant_txn_id: merchant_txn_id.to_string(),
        };
        self.post("/api/payment/check-transaction-status", &dto).await
    }

    async fn record_payment(
        &self,
        document_id: &str,
        merchant_txn_id: &str,
        transaction_id: &str,
        amount: f64,
        kind: PaymentKind,
    ) -> Result<(), ClientError> {
        let dto = RecordPaymentDto {
            document_id: document_id.to_string(),
            merchant_txn_id: merchant_txn_id.to_string(),
            transaction_id: transaction_id.to_string(),
            amount,
            payment_type: kind,
        };
        let _: serde_json::Value = self.post_raw("/api/payment/record", &dto).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_id_found_at_top_level() {
        let payload = serde_json::json!({"ProcessId": "PID-7"});
        assert_eq!(extract_process_id(&payload).unwrap(), "PID-7");
    }

    #[test]
    fn process_id_found_nested_and_numeric() {
        let payload = serde_json::json!({"data": {"process_id": 99123}});
        assert_eq!(extract_process_id(&payload).unwrap(), "99123");
    }

    #[test]
    fn missing_process_id_lists_probed_fields() {
        let payload = serde_json::json!({"data": {"Outcome": "ok"}});
        let err = extract_process_id(&payload).unwrap_err();
        match err {
            ClientError::Contract { field_candidates } => {
                assert_eq!(field_candidates.len(), 6);
                assert!(field_candidates.contains(&"data.process_id".to_string()));
            }
            other => panic!("expected contract error, got {:?}", other),
        }
        // the rendered message names every candidate for diagnostics
        let payload = serde_json::json!({});
        let message = extract_process_id(&payload).unwrap_err().to_string();
        assert!(message.contains("ProcessId"));
        assert!(message.contains("data.process_id"));
    }

    #[test]
    fn empty_string_process_id_is_not_accepted() {
        let payload = serde_json::json!({"ProcessId": "", "data": {"processId": "PID-8"}});
        assert_eq!(extract_process_id(&payload).unwrap(), "PID-8");
    }
}
