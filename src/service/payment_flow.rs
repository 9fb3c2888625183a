// service/payment_flow.rs
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    config::Config,
    error::ClientError,
    models::paymentmodels::*,
};

use super::payment_gateway::PaymentAggregator;

/// The four aggregator-facing steps, in their mandatory order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowStep {
    Instruments,
    ServiceCharge,
    ProcessId,
    Redirect,
}

impl FlowStep {
    pub fn name(&self) -> &'static str {
        match self {
            FlowStep::Instruments => "instrument listing",
            FlowStep::ServiceCharge => "service charge lookup",
            FlowStep::ProcessId => "process id acquisition",
            FlowStep::Redirect => "gateway redirect",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    New,
    InstrumentsListed { instruments: Vec<Instrument> },
    InstrumentSelected { instrument: Instrument },
    ChargeFetched { instrument: Instrument, charge: ServiceCharge },
    ReadyToRedirect { session: PaymentSession },
    Redirected { session: PaymentSession },
    Failed { step: FlowStep, message: String },
}

/// The single side-effect boundary for handing the user to the gateway's
/// hosted page. Production hosts submit the form; tests observe it.
#[async_trait]
pub trait RedirectSink: Send + Sync {
    async fn submit(&self, redirect: &GatewayRedirect) -> Result<(), ClientError>;
}

/// Client-orchestrated payment handshake. Strictly sequential: each step
/// runs only if the previous one succeeded, and any failure parks the flow
/// in `Failed` until the user restarts from scratch.
pub struct PaymentFlow {
    aggregator: Arc<dyn PaymentAggregator>,
    merchant: MerchantIdentity,
    gateway_url: String,
    response_url: String,
    document_id: String,
    amount: f64,
    kind: PaymentKind,
    state: FlowState,
}

impl PaymentFlow {
    pub fn new(
        aggregator: Arc<dyn PaymentAggregator>,
        config: &Config,
        document_id: &str,
        amount: f64,
        kind: PaymentKind,
    ) -> Self {
        Self {
            aggregator,
            merchant: MerchantIdentity {
                merchant_id: config.merchant_id.clone(),
                merchant_name: config.merchant_name.clone(),
            },
            gateway_url: config.gateway_url.clone(),
            response_url: config.response_url(document_id),
            document_id: document_id.to_string(),
            amount,
            kind,
            state: FlowState::New,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    fn fail(&mut self, step: FlowStep, err: &ClientError) -> ClientError {
        let message = err.to_string();
        tracing::warn!("payment flow halted at {}: {}", step.name(), message);
        self.state = FlowState::Failed { step, message: message.clone() };
        ClientError::PaymentStep { step: step.name(), message }
    }

    fn out_of_order(&self, step: FlowStep) -> ClientError {
        ClientError::Validation(format!(
            "{} is not available in the current flow state",
            step.name()
        ))
    }

    /// Step 1: list the instruments available for the merchant.
    pub async fn list_instruments(&mut self) -> Result<&[Instrument], ClientError> {
        if self.state != FlowState::New {
            return Err(self.out_of_order(FlowStep::Instruments));
        }
        tracing::info!("listing payment instruments for document {}", self.document_id);
        match self.aggregator.get_instruments(&self.merchant).await {
            Ok(instruments) => {
                self.state = FlowState::InstrumentsListed { instruments };
                match &self.state {
                    FlowState::InstrumentsListed { instruments } => Ok(instruments),
                    _ => unreachable!(),
                }
            }
            Err(e) => Err(self.fail(FlowStep::Instruments, &e)),
        }
    }

    /// Step 2: user-driven instrument choice.
    pub fn select_instrument(&mut self, code: &str) -> Result<(), ClientError> {
        let instruments = match &self.state {
            FlowState::InstrumentsListed { instruments } => instruments,
            _ => {
                return Err(ClientError::Validation(
                    "instrument selection is not available in the current flow state".to_string(),
                ))
            }
        };
        let instrument = instruments
            .iter()
            .find(|i| i.code == code)
            .cloned()
            .ok_or_else(|| {
                ClientError::Validation(format!("Unknown payment instrument '{}'", code))
            })?;
        self.state = FlowState::InstrumentSelected { instrument };
        Ok(())
    }

    /// Step 3: service charge for the chosen instrument and amount.
    pub async fn fetch_service_charge(&mut self) -> Result<ServiceCharge, ClientError> {
        let instrument = match &self.state {
            FlowState::InstrumentSelected { instrument } => instrument.clone(),
            _ => return Err(self.out_of_order(FlowStep::ServiceCharge)),
        };
        match self
            .aggregator
            .get_service_charge(&self.merchant, &instrument.code, self.amount)
            .await
        {
            Ok(charge) => {
                self.state = FlowState::ChargeFetched { instrument, charge: charge.clone() };
                Ok(charge)
            }
            Err(e) => Err(self.fail(FlowStep::ServiceCharge, &e)),
        }
    }

    /// Step 4: obtain the process id that unlocks the hosted payment page.
    pub async fn acquire_process_id(&mut self) -> Result<(), ClientError> {
        let (instrument, charge) = match &self.state {
            FlowState::ChargeFetched { instrument, charge } => (instrument.clone(), charge.clone()),
            _ => return Err(self.out_of_order(FlowStep::ProcessId)),
        };
        let merchant_txn_id = merchant_txn_id(&self.document_id);
        match self
            .aggregator
            .get_process_id(&self.merchant, self.amount, &merchant_txn_id)
            .await
        {
            Ok(process_id) => {
                self.state = FlowState::ReadyToRedirect {
                    session: PaymentSession {
                        document_id: self.document_id.clone(),
                        kind: self.kind,
                        amount: self.amount,
                        instrument_code: instrument.code,
                        service_charge: charge.amount,
                        merchant_txn_id,
                        process_id,
                    },
                };
                Ok(())
            }
            Err(e) => Err(self.fail(FlowStep::ProcessId, &e)),
        }
    }

    /// Step 5: hand off to the gateway through the redirect sink.
    pub async fn redirect(&mut self, sink: &dyn RedirectSink) -> Result<PaymentSession, ClientError> {
        let session = match &self.state {
            FlowState::ReadyToRedirect { session } => session.clone(),
            _ => return Err(self.out_of_order(FlowStep::Redirect)),
        };
        let redirect = GatewayRedirect {
            gateway_url: self.gateway_url.clone(),
            merchant_id: self.merchant.merchant_id.clone(),
            merchant_name: self.merchant.merchant_name.clone(),
            merchant_txn_id: session.merchant_txn_id.clone(),
            amount: format!("{:.2}", session.amount),
            process_id: session.process_id.clone(),
            instrument_code: session.instrument_code.clone(),
            transaction_remarks: format!("Document notarization payment ({})", session.document_id),
            response_url: self.response_url.clone(),
        };
        match sink.submit(&redirect).await {
            Ok(()) => {
                tracing::info!(
                    "redirected to gateway for {} ({})",
                    session.merchant_txn_id,
                    redirect.amount
                );
                self.state = FlowState::Redirected { session: session.clone() };
                Ok(session)
            }
            Err(e) => Err(self.fail(FlowStep::Redirect, &e)),
        }
    }
}

/// Client-generated reference correlating a gateway attempt with our
/// document record.
pub fn merchant_txn_id(document_id: &str) -> String {
    format!("TXN_{}_{}", Utc::now().timestamp_millis(), document_id)
}

/// Outcome the gateway reports via query parameters on the return trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReturn {
    pub status: ReturnStatus,
    pub transaction_id: Option<String>,
    pub process_id: Option<String>,
}

impl PaymentReturn {
    pub fn from_query(params: &HashMap<String, String>) -> Result<Self, ClientError> {
        let status = match params.get("status").map(String::as_str) {
            Some("success") => ReturnStatus::Success,
            Some("failed") => ReturnStatus::Failed,
            other => {
                return Err(ClientError::Validation(format!(
                    "Unrecognized gateway return status: {:?}",
                    other
                )))
            }
        };
        Ok(Self {
            status,
            transaction_id: params.get("TransactionId").cloned(),
            process_id: params.get("ProcessId").cloned(),
        })
    }
}

/// Manual "check status" recovery offered after a failed return: re-query
/// the aggregator and, only on confirmed success, tell the backend to
/// record the payment. Returns whether the payment turned out successful.
pub async fn resolve_failed_return(
    aggregator: &dyn PaymentAggregator,
    merchant: &MerchantIdentity,
    session: &PaymentSession,
) -> Result<bool, ClientError> {
    let status = aggregator
        .check_transaction_status(merchant, &session.merchant_txn_id)
        .await?;
    if !status.is_success() {
        return Ok(false);
    }
    aggregator
        .record_payment(
            &session.document_id,
            &session.merchant_txn_id,
            status.transaction_id.as_deref().unwrap_or_default(),
            session.amount,
            session.kind,
        )
        .await?;
    Ok(true)
}
