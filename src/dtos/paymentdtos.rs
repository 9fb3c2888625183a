// dtos/paymentdtos.rs
use serde::Serialize;

use crate::models::paymentmodels::PaymentKind;

#[derive(Debug, Serialize)]
pub struct GetInstrumentsDto {
    #[serde(rename = "MerchantId")]
    pub merchant_id: String,
    #[serde(rename = "MerchantName")]
    pub merchant_name: String,
}

#[derive(Debug, Serialize)]
pub struct GetServiceChargeDto {
    #[serde(rename = "MerchantId")]
    pub merchant_id: String,
    #[serde(rename = "MerchantName")]
    pub merchant_name: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "InstrumentCode")]
    pub instrument_code: String,
}

#[derive(Debug, Serialize)]
pub struct GetProcessIdDto {
    #[serde(rename = "MerchantId")]
    pub merchant_id: String,
    #[serde(rename = "MerchantName")]
    pub merchant_name: String,
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "MerchantTxnId")]
    pub merchant_txn_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckTransactionStatusDto {
    #[serde(rename = "MerchantId")]
    pub merchant_id: String,
    #[serde(rename = "MerchantName")]
    pub merchant_name: String,
    #[serde(rename = "MerchantTxnId")]
    pub merchant_txn_id: String,
}

/// Tells the backend a gateway payment went through so the document's
/// payment record can be updated.
#[derive(Debug, Serialize)]
pub struct RecordPaymentDto {
    pub document_id: String,
    pub merchant_txn_id: String,
    pub transaction_id: String,
    pub amount: f64,
    pub payment_type: PaymentKind,
}
