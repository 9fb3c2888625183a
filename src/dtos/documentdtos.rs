// dtos/documentdtos.rs
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::chatmodels::ChatMessage;

/// Uniform response envelope the backend wraps every resource in.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Paginated message listing, as nested by the backend:
/// `{data: {messages: {data: [...], current_page, last_page, total}}}`.
#[derive(Debug, Deserialize)]
pub struct MessagesData {
    pub messages: MessagePage,
}

#[derive(Debug, Deserialize)]
pub struct MessagePage {
    pub data: Vec<ChatMessage>,
    pub current_page: u32,
    pub last_page: u32,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct AcceptRejectDto {
    pub document_id: String,
    #[serde(rename = "isAcceptedByUser")]
    pub is_accepted_by_user: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_reason: Option<String>,
}

impl AcceptRejectDto {
    pub fn accept(document_id: &str) -> Self {
        Self {
            document_id: document_id.to_string(),
            is_accepted_by_user: true,
            rejected_reason: None,
        }
    }

    pub fn reject(document_id: &str, reason: &str) -> Result<Self, ValidationError> {
        if reason.trim().is_empty() {
            return Err(ValidationError::new("rejected_reason_blank"));
        }
        Ok(Self {
            document_id: document_id.to_string(),
            is_accepted_by_user: false,
            rejected_reason: Some(reason.to_string()),
        })
    }
}

#[derive(Debug, Serialize, Validate)]
pub struct ReportProblemDto {
    pub document_id: String,
    #[validate(length(min = 1, max = 5000))]
    pub problem_description: String,
}

#[derive(Debug, Serialize)]
pub struct MarkAsReadDto {
    pub document_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_requires_non_blank_reason() {
        assert!(AcceptRejectDto::reject("42", "").is_err());
        assert!(AcceptRejectDto::reject("42", "   ").is_err());

        let dto = AcceptRejectDto::reject("42", "blurry scan").unwrap();
        assert!(!dto.is_accepted_by_user);
        assert_eq!(dto.rejected_reason.as_deref(), Some("blurry scan"));
    }

    #[test]
    fn accept_carries_no_reason() {
        let dto = AcceptRejectDto::accept("42");
        assert!(dto.is_accepted_by_user);
        assert!(dto.rejected_reason.is_none());

        let body = serde_json::to_value(&dto).unwrap();
        assert_eq!(body["isAcceptedByUser"], true);
        assert!(body.get("rejected_reason").is_none());
    }
}
