// models/paymentmodels.rs
use serde::{Deserialize, Serialize};

/// Merchant constants sent with every aggregator call.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MerchantIdentity {
    #[serde(rename = "MerchantId")]
    pub merchant_id: String,
    #[serde(rename = "MerchantName")]
    pub merchant_name: String,
}

/// A selectable payment method returned by the aggregator.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Instrument {
    #[serde(rename = "InstrumentCode")]
    pub code: String,
    #[serde(rename = "InstrumentName")]
    pub name: String,
    #[serde(rename = "BankType", default)]
    pub bank_type: Option<String>,
    #[serde(rename = "LogoUrl", default)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServiceCharge {
    #[serde(rename = "Amount")]
    pub amount: f64,
    #[serde(rename = "TotalAmount", default)]
    pub total_amount: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    Initial,
    Final,
}

/// Transient client-local record of one payment attempt. Populated step by
/// step as the flow advances; never persisted anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSession {
    pub document_id: String,
    pub kind: PaymentKind,
    pub amount: f64,
    pub instrument_code: String,
    pub service_charge: f64,
    pub merchant_txn_id: String,
    pub process_id: String,
}

/// Aggregator-side view of a transaction, used on the return trip.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TransactionStatus {
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "TransactionId", default)]
    pub transaction_id: Option<String>,
}

impl TransactionStatus {
    pub fn is_success(&self) -> bool {
        self.status.eq_ignore_ascii_case("success")
    }
}

/// The complete field set the gateway's hosted page expects via form POST.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct GatewayRedirect {
    #[serde(skip)]
    pub gateway_url: String,
    #[serde(rename = "MerchantId")]
    pub merchant_id: String,
    #[serde(rename = "MerchantName")]
    pub merchant_name: String,
    #[serde(rename = "MerchantTxnId")]
    pub merchant_txn_id: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "ProcessId")]
    pub process_id: String,
    #[serde(rename = "InstrumentCode")]
    pub instrument_code: String,
    #[serde(rename = "TransactionRemarks")]
    pub transaction_remarks: String,
    #[serde(rename = "ResponseUrl")]
    pub response_url: String,
}

impl GatewayRedirect {
    /// URL-encoded body for a direct form POST to the gateway.
    pub fn to_form_body(&self) -> Result<String, crate::error::ClientError> {
        serde_urlencoded::to_string(self)
            .map_err(|e| crate::error::ClientError::Validation(e.to_string()))
    }

    /// Fallback construction path: a self-submitting hidden form document
    /// for hosts where a programmatic POST is not available.
    pub fn to_auto_submit_html(&self) -> String {
        let fields = [
            ("MerchantId", &self.merchant_id),
            ("MerchantName", &self.merchant_name),
            ("MerchantTxnId", &self.merchant_txn_id),
            ("Amount", &self.amount),
            ("ProcessId", &self.process_id),
            ("InstrumentCode", &self.instrument_code),
            ("TransactionRemarks", &self.transaction_remarks),
            ("ResponseUrl", &self.response_url),
        ];
        let inputs: String = fields
            .iter()
            .map(|(name, value)| {
                format!(
                    "<input type=\"hidden\" name=\"{}\" value=\"{}\" />",
                    name,
                    escape_html(value)
                )
            })
            .collect();
        format!(
            "<html><body onload=\"document.forms[0].submit()\">\
             <form method=\"POST\" action=\"{}\">{}</form>\
             </body></html>",
            escape_html(&self.gateway_url),
            inputs
        )
    }
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
