// service/api_gateway.rs
use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    dtos::documentdtos::*,
    error::ClientError,
    models::chatmodels::Attachment,
    models::documentmodel::Document,
};

/// Backend REST surface the workflow depends on. Implemented over HTTP in
/// production and by in-memory fakes in tests.
#[async_trait]
pub trait DocumentApi: Send + Sync {
    async fn get_document(&self, document_id: &str) -> Result<Document, ClientError>;

    async fn get_messages(&self, document_id: &str, page: u32) -> Result<MessagePage, ClientError>;

    async fn send_message(
        &self,
        document_id: &str,
        text: &str,
        attachment: Option<&Attachment>,
    ) -> Result<(), ClientError>;

    async fn mark_as_read_requester(&self, document_id: &str) -> Result<(), ClientError>;

    async fn mark_as_read_admin(&self, document_id: &str) -> Result<(), ClientError>;

    async fn accept_or_reject(&self, dto: &AcceptRejectDto) -> Result<(), ClientError>;

    async fn report_problem(&self, dto: &ReportProblemDto) -> Result<(), ClientError>;
}

/// Thin authenticated wrapper over the backend API. One attempt per call,
/// no retries; failures carry the server's message when it sent one.
#[derive(Debug, Clone)]
pub struct ApiGatewayClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl ApiGatewayClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.api_base_url.clone(),
            bearer_token: config.bearer_token.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(self.url(path))
            .bearer_auth(&self.bearer_token)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(self.url(path))
            .bearer_auth(&self.bearer_token)
    }

    async fn unwrap_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string);

        if !status.is_success() {
            return Err(ClientError::from_server_message(message));
        }

        let envelope: ApiEnvelope<T> = serde_json::from_value(body)?;
        if !envelope.success {
            return Err(ClientError::from_server_message(envelope.message));
        }
        envelope
            .data
            .ok_or_else(|| ClientError::api("Response contained no data"))
    }

    /// For acknowledgement-only endpoints where `data` may be absent.
    async fn unwrap_ack(response: reqwest::Response) -> Result<(), ClientError> {
        let status = response.status();
        let body: serde_json::Value = response.json().await?;
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string);

        let success = body
            .get("success")
            .and_then(|s| s.as_bool())
            .unwrap_or(status.is_success());
        if !status.is_success() || !success {
            return Err(ClientError::from_server_message(message));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentApi for ApiGatewayClient {
    async fn get_document(&self, document_id: &str) -> Result<Document, ClientError> {
        let response = self
            .get(&format!("/api/documents/{}", document_id))
            .send()
            .await?;
        Self::unwrap_envelope(response).await
    }

    async fn get_messages(&self, document_id: &str, page: u32) -> Result<MessagePage, ClientError> {
        let response = self
            .get(&format!("/api/documents/{}/messages", document_id))
            .query(&[("page", page)])
            .send()
            .await?;
        let data: MessagesData = Self::unwrap_envelope(response).await?;
        Ok(data.messages)
    }

    async fn send_message(
        &self,
        document_id: &str,
        text: &str,
        attachment: Option<&Attachment>,
    ) -> Result<(), ClientError> {
        let mut form = reqwest::multipart::Form::new()
            .text("document_id", document_id.to_string())
            .text("message", text.to_string());

        if let Some(attachment) = attachment {
            let part = reqwest::multipart::Part::bytes(attachment.bytes.clone())
                .file_name(attachment.file_name.clone())
                .mime_str(&attachment.mime_type)?;
            form = form.part("file", part);
        }

        let response = self
            .post("/api/messages/send")
            .multipart(form)
            .send()
            .await?;
        Self::unwrap_ack(response).await
    }

    async fn mark_as_read_requester(&self, document_id: &str) -> Result<(), ClientError> {
        let response = self
            .post("/api/documents/mark-as-read")
            .json(&MarkAsReadDto { document_id: document_id.to_string() })
            .send()
            .await?;
        Self::unwrap_ack(response).await
    }

    async fn mark_as_read_admin(&self, document_id: &str) -> Result<(), ClientError> {
        let response = self
            .post("/api/admin/documents/mark-as-read")
            .json(&MarkAsReadDto { document_id: document_id.to_string() })
            .send()
            .await?;
        Self::unwrap_ack(response).await
    }

    async fn accept_or_reject(&self, dto: &AcceptRejectDto) -> Result<(), ClientError> {
        let response = self
            .post("/api/documents/accept-or-reject")
            .json(dto)
            .send()
            .await?;
        Self::unwrap_ack(response).await
    }

    async fn report_problem(&self, dto: &ReportProblemDto) -> Result<(), ClientError> {
        let response = self
            .post("/api/documents/report-problem")
            .json(dto)
            .send()
            .await?;
        Self::unwrap_ack(response).await
    }
}
