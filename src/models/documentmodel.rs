// models/documentmodel.rs
use serde::{Deserialize, Serialize};

use crate::utils::amount::{format_rupees, initial_deposit};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Pending,
    CostEstimated,
    PaymentPending,
    InProgress,
    Completed,
    Rejected,
    Approved,
    UnderReview,
    AwaitingPayment,
    NeedsRevision,
    DocumentProcessing,
    ReadyForPickup,
    OnHold,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    NotPaid,
    PartiallyPaid,
    FullPaid,
    Paid,
}

impl PaymentStatus {
    pub fn is_paid(&self) -> bool {
        matches!(self, PaymentStatus::FullPaid | PaymentStatus::Paid)
    }
}

/// Server-computed payment summary. The client never recomputes
/// `remaining` from `total - partial`; the backend value is authoritative.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaymentRecord {
    #[serde(rename = "total_payment_amount", deserialize_with = "flexible_amount")]
    pub total: f64,
    #[serde(rename = "partial_payment_amount", deserialize_with = "flexible_amount", default)]
    pub partial: f64,
    #[serde(rename = "remaining_payment_amount", deserialize_with = "flexible_amount", default)]
    pub remaining: f64,
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Document {
    #[serde(deserialize_with = "flexible_id")]
    pub id: String,
    pub status: DocumentStatus,
    pub payment: Option<PaymentRecord>,
    pub file_url: Option<String>,
    pub recheck_file_url: Option<String>,
    pub final_zip_url: Option<String>,
    #[serde(rename = "isAcceptedByUser", default)]
    pub is_accepted_by_user: Option<bool>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    #[serde(default)]
    pub has_new_update: bool,
    #[serde(default)]
    pub has_new_message: bool,
}

impl Document {
    /// The reviewed file stays hidden until the deposit has been paid
    /// while the document is still in the cost-estimated stage.
    pub fn recheck_file_visible(&self) -> bool {
        if self.recheck_file_url.is_none() {
            return false;
        }
        if self.status == DocumentStatus::CostEstimated {
            return self
                .payment
                .as_ref()
                .map(|p| p.payment_status.is_paid())
                .unwrap_or(false);
        }
        true
    }
}

/// Requester's verdict on the reviewed (recheck) file.
#[derive(Debug, Clone, PartialEq)]
pub enum Acceptance {
    Undecided,
    Accepted,
    Rejected { reason: String },
}

impl Acceptance {
    fn of(document: &Document) -> Self {
        match document.is_accepted_by_user {
            None => Acceptance::Undecided,
            Some(true) => Acceptance::Accepted,
            Some(false) => Acceptance::Rejected {
                reason: document
                    .rejection_reason
                    .clone()
                    .unwrap_or_else(|| "No reason given".to_string()),
            },
        }
    }
}

/// Explicit workflow state derived from a document snapshot.
///
/// Each variant carries only the fields that matter in that state, so the
/// action dispatch below cannot observe impossible combinations (e.g. an
/// acceptance verdict while the estimate is still pending).
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentState {
    Submitted,
    Estimated { total: f64, deposit_paid: bool },
    AwaitingPayment,
    ReviewInProgress { recheck_available: bool },
    RecheckAccepted { remaining: f64 },
    RecheckRejected { reason: String },
    Processing,
    ReadyForPickup { final_zip_url: Option<String> },
    Completed { final_zip_url: Option<String> },
    Declined,
    OnHold,
}

/// One user-facing action made available by the current state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    PayInitial { amount: f64 },
    AcceptRecheck,
    RejectRecheck,
    PayRemaining { amount: f64 },
    DownloadFinal { url: String },
}

impl Action {
    pub fn label(&self) -> String {
        match self {
            Action::PayInitial { amount } => format!("Pay 20% now ({})", format_rupees(*amount)),
            Action::AcceptRecheck => "Accept reviewed document".to_string(),
            Action::RejectRecheck => "Reject reviewed document".to_string(),
            Action::PayRemaining { amount } => format!("Pay Now {}", format_rupees(*amount)),
            Action::DownloadFinal { .. } => "Download final documents".to_string(),
        }
    }
}

impl DocumentState {
    /// Single classification point for the scattered status checks the
    /// portal used to do inline.
    pub fn classify(document: &Document) -> DocumentState {
        // While the document is still under review, the requester's verdict
        // on the recheck file outranks the raw status label. Terminal and
        // side-branch statuses keep classifying by status so a completed
        // document stays completed even though the verdict is recorded.
        let in_review = matches!(
            document.status,
            DocumentStatus::InProgress
                | DocumentStatus::NeedsRevision
                | DocumentStatus::DocumentProcessing
        );
        if in_review {
            match Acceptance::of(document) {
                Acceptance::Accepted => {
                    let remaining =
                        document.payment.as_ref().map(|p| p.remaining).unwrap_or(0.0);
                    return DocumentState::RecheckAccepted { remaining };
                }
                Acceptance::Rejected { reason } => {
                    return DocumentState::RecheckRejected { reason };
                }
                Acceptance::Undecided => {}
            }
        }

        match document.status {
            DocumentStatus::Pending | DocumentStatus::UnderReview | DocumentStatus::Approved => {
                DocumentState::Submitted
            }
            DocumentStatus::CostEstimated => {
                let payment = document.payment.as_ref();
                DocumentState::Estimated {
                    total: payment.map(|p| p.total).unwrap_or(0.0),
                    deposit_paid: payment.map(|p| p.payment_status.is_paid()).unwrap_or(false),
                }
            }
            DocumentStatus::PaymentPending | DocumentStatus::AwaitingPayment => {
                DocumentState::AwaitingPayment
            }
            DocumentStatus::InProgress => DocumentState::ReviewInProgress {
                recheck_available: document.recheck_file_visible(),
            },
            DocumentStatus::NeedsRevision | DocumentStatus::DocumentProcessing => {
                DocumentState::Processing
            }
            DocumentStatus::ReadyForPickup => DocumentState::ReadyForPickup {
                final_zip_url: document.final_zip_url.clone(),
            },
            DocumentStatus::Completed => DocumentState::Completed {
                final_zip_url: document.final_zip_url.clone(),
            },
            DocumentStatus::Rejected => DocumentState::Declined,
            DocumentStatus::OnHold => DocumentState::OnHold,
        }
    }

    /// The exhaustive action dispatch. Every state yields its full action
    /// set here; no caller checks raw statuses again.
    pub fn actions(&self) -> Vec<Action> {
        match self {
            DocumentState::Estimated { total, deposit_paid } => {
                if *deposit_paid {
                    vec![]
                } else {
                    vec![Action::PayInitial { amount: initial_deposit(*total) }]
                }
            }
            DocumentState::ReviewInProgress { recheck_available } => {
                if *recheck_available {
                    vec![Action::AcceptRecheck, Action::RejectRecheck]
                } else {
                    vec![]
                }
            }
            DocumentState::RecheckAccepted { remaining } => {
                if *remaining > 0.0 {
                    vec![Action::PayRemaining { amount: *remaining }]
                } else {
                    vec![]
                }
            }
            DocumentState::ReadyForPickup { final_zip_url }
            | DocumentState::Completed { final_zip_url } => final_zip_url
                .as_ref()
                .map(|url| vec![Action::DownloadFinal { url: url.clone() }])
                .unwrap_or_default(),
            DocumentState::Submitted
            | DocumentState::AwaitingPayment
            | DocumentState::RecheckRejected { .. }
            | DocumentState::Processing
            | DocumentState::Declined
            | DocumentState::OnHold => vec![],
        }
    }

    /// Informational notices rendered alongside (or instead of) actions.
    pub fn notices(&self) -> Vec<String> {
        match self {
            DocumentState::Submitted => {
                vec!["Your document is being reviewed for a cost estimate.".to_string()]
            }
            DocumentState::AwaitingPayment => {
                vec!["Your payment is being confirmed.".to_string()]
            }
            DocumentState::RecheckAccepted { remaining } if *remaining <= 0.0 => {
                vec!["Fully paid. We are preparing your final documents.".to_string()]
            }
            DocumentState::RecheckRejected { reason } => vec![
                format!("You declined the reviewed document. Reason: {}", reason),
                "We are waiting for another recheck file from the notary team.".to_string(),
            ],
            DocumentState::Processing => {
                vec!["Your document is being processed.".to_string()]
            }
            DocumentState::OnHold => {
                vec!["This request is on hold. Please contact support.".to_string()]
            }
            _ => vec![],
        }
    }
}

/// Amounts arrive either as JSON numbers or as strings like "350.00".
fn flexible_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        None,
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid amount: {:?}", s))),
        Raw::None => Ok(0.0),
    }
}

/// Ids arrive either as JSON numbers or as strings.
pub(crate) fn flexible_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n.to_string(),
        Raw::Text(s) => s,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_document() -> Document {
        Document {
            id: "42".to_string(),
            status: DocumentStatus::Pending,
            payment: None,
            file_url: Some("https://files.example/original.pdf".to_string()),
            recheck_file_url: None,
            final_zip_url: None,
            is_accepted_by_user: None,
            rejection_reason: None,
            has_new_update: false,
            has_new_message: false,
        }
    }

    fn payment(total: f64, remaining: f64, status: PaymentStatus) -> PaymentRecord {
        PaymentRecord { total, partial: total - remaining, remaining, payment_status: status }
    }

    #[test]
    fn cost_estimated_unpaid_offers_twenty_percent_deposit() {
        let mut doc = base_document();
        doc.status = DocumentStatus::CostEstimated;
        doc.payment = Some(payment(1000.0, 1000.0, PaymentStatus::NotPaid));

        let state = DocumentState::classify(&doc);
        let actions = state.actions();
        assert_eq!(actions, vec![Action::PayInitial { amount: 200.0 }]);
        assert!(actions[0].label().contains("Rs200.00"));
    }

    #[test]
    fn cost_estimated_paid_offers_nothing() {
        let mut doc = base_document();
        doc.status = DocumentStatus::CostEstimated;
        doc.payment = Some(payment(1000.0, 800.0, PaymentStatus::PartiallyPaid));
        // partially paid is still not "paid" for the deposit gate
        assert_eq!(
            DocumentState::classify(&doc).actions(),
            vec![Action::PayInitial { amount: 200.0 }]
        );

        doc.payment = Some(payment(1000.0, 0.0, PaymentStatus::FullPaid));
        assert!(DocumentState::classify(&doc).actions().is_empty());
    }

    #[test]
    fn in_progress_with_recheck_offers_verdict_actions() {
        let mut doc = base_document();
        doc.status = DocumentStatus::InProgress;
        doc.recheck_file_url = Some("https://files.example/recheck.pdf".to_string());

        let actions = DocumentState::classify(&doc).actions();
        assert_eq!(actions, vec![Action::AcceptRecheck, Action::RejectRecheck]);
    }

    #[test]
    fn accepted_with_remaining_offers_pay_now() {
        let mut doc = base_document();
        doc.status = DocumentStatus::InProgress;
        doc.is_accepted_by_user = Some(true);
        doc.payment = Some(payment(1000.0, 350.0, PaymentStatus::PartiallyPaid));

        let state = DocumentState::classify(&doc);
        let actions = state.actions();
        assert_eq!(actions, vec![Action::PayRemaining { amount: 350.0 }]);
        assert_eq!(actions[0].label(), "Pay Now Rs350.00");
    }

    #[test]
    fn accepted_fully_paid_shows_waiting_notice() {
        let mut doc = base_document();
        doc.status = DocumentStatus::InProgress;
        doc.is_accepted_by_user = Some(true);
        doc.payment = Some(payment(1000.0, 0.0, PaymentStatus::FullPaid));

        let state = DocumentState::classify(&doc);
        assert!(state.actions().is_empty());
        assert!(state.notices().iter().any(|n| n.contains("final documents")));
    }

    #[test]
    fn rejected_recheck_renders_reason_and_waiting_notice_without_buttons() {
        let mut doc = base_document();
        doc.status = DocumentStatus::InProgress;
        doc.recheck_file_url = Some("https://files.example/recheck.pdf".to_string());
        doc.is_accepted_by_user = Some(false);
        doc.rejection_reason = Some("blurry scan".to_string());

        let state = DocumentState::classify(&doc);
        assert!(state.actions().is_empty());
        let notices = state.notices();
        assert!(notices.iter().any(|n| n.contains("Reason: blurry scan")));
        assert!(notices.iter().any(|n| n.contains("waiting for another recheck file")));
    }

    #[test]
    fn completed_document_offers_final_download_despite_recorded_verdict() {
        let mut doc = base_document();
        doc.status = DocumentStatus::Completed;
        doc.is_accepted_by_user = Some(true);
        doc.payment = Some(payment(1000.0, 0.0, PaymentStatus::FullPaid));
        doc.final_zip_url = Some("https://files.example/final.zip".to_string());

        let state = DocumentState::classify(&doc);
        assert_eq!(
            state,
            DocumentState::Completed {
                final_zip_url: Some("https://files.example/final.zip".to_string())
            }
        );
        assert_eq!(
            state.actions(),
            vec![Action::DownloadFinal { url: "https://files.example/final.zip".to_string() }]
        );

        doc.status = DocumentStatus::ReadyForPickup;
        let state = DocumentState::classify(&doc);
        assert!(matches!(state, DocumentState::ReadyForPickup { .. }));
        assert_eq!(state.actions().len(), 1);
    }

    #[test]
    fn terminal_statuses_ignore_a_stale_rejection_verdict() {
        let mut doc = base_document();
        doc.status = DocumentStatus::Completed;
        doc.is_accepted_by_user = Some(false);
        doc.rejection_reason = Some("blurry scan".to_string());

        // a completed document is done; the old verdict no longer renders
        assert!(matches!(DocumentState::classify(&doc), DocumentState::Completed { .. }));

        doc.status = DocumentStatus::InProgress;
        assert!(matches!(
            DocumentState::classify(&doc),
            DocumentState::RecheckRejected { .. }
        ));
    }

    #[test]
    fn recheck_file_hidden_until_deposit_paid() {
        let mut doc = base_document();
        doc.status = DocumentStatus::CostEstimated;
        doc.recheck_file_url = Some("https://files.example/recheck.pdf".to_string());
        doc.payment = Some(payment(1000.0, 1000.0, PaymentStatus::NotPaid));
        assert!(!doc.recheck_file_visible());

        doc.payment = Some(payment(1000.0, 800.0, PaymentStatus::Paid));
        assert!(doc.recheck_file_visible());

        doc.status = DocumentStatus::InProgress;
        doc.payment = Some(payment(1000.0, 1000.0, PaymentStatus::NotPaid));
        assert!(doc.recheck_file_visible());
    }

    #[test]
    fn deserializes_mixed_amount_shapes() {
        let doc: Document = serde_json::from_str(
            r#"{
                "id": 42,
                "status": "cost_estimated",
                "payment": {
                    "total_payment_amount": 1000,
                    "partial_payment_amount": "650.00",
                    "remaining_payment_amount": "350.00",
                    "payment_status": "partially_paid"
                },
                "file_url": null,
                "recheck_file_url": null,
                "final_zip_url": null
            }"#,
        )
        .unwrap();

        assert_eq!(doc.id, "42");
        let payment = doc.payment.unwrap();
        assert_eq!(payment.total, 1000.0);
        assert_eq!(payment.partial, 650.0);
        assert_eq!(payment.remaining, 350.0);
    }
}
