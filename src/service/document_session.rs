// service/document_session.rs
use std::sync::Arc;

use tokio::task::JoinHandle;
use validator::Validate;

use crate::{
    dtos::documentdtos::{AcceptRejectDto, ReportProblemDto},
    error::ClientError,
    models::chatmodels::{Attachment, ChatMessage, ChatThread},
    models::documentmodel::{Action, Document, DocumentState},
};

use super::api_gateway::DocumentApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    Requester,
    Admin,
}

/// One open document detail view: the document snapshot, its chat thread,
/// and the actions the current state allows.
pub struct DocumentSession {
    api: Arc<dyn DocumentApi>,
    document_id: String,
    user_id: String,
    role: SessionRole,
    document: Option<Document>,
    thread: ChatThread,
    current_page: u32,
    last_page: u32,
    read_receipts: Vec<JoinHandle<()>>,
}

impl DocumentSession {
    pub fn new(api: Arc<dyn DocumentApi>, document_id: &str, user_id: &str, role: SessionRole) -> Self {
        Self {
            api,
            document_id: document_id.to_string(),
            user_id: user_id.to_string(),
            role,
            document: None,
            thread: ChatThread::new(),
            current_page: 0,
            last_page: 0,
            read_receipts: Vec::new(),
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn thread(&self) -> &ChatThread {
        &self.thread
    }

    pub fn state(&self) -> Option<DocumentState> {
        self.document.as_ref().map(DocumentState::classify)
    }

    pub fn available_actions(&self) -> Vec<Action> {
        self.state().map(|s| s.actions()).unwrap_or_default()
    }

    /// Initial load: document plus the first message page. New-update and
    /// new-message markers fire tracked mark-as-read tasks that never block
    /// the view; their outcome is logged when they finish.
    pub async fn mount(&mut self) -> Result<(), ClientError> {
        let document = self.api.get_document(&self.document_id).await?;

        if document.has_new_update || document.has_new_message {
            self.spawn_read_receipt();
        }

        let page = self.api.get_messages(&self.document_id, 1).await?;
        self.current_page = page.current_page;
        self.last_page = page.last_page;
        self.thread.replace_all(page.data);
        self.document = Some(document);
        Ok(())
    }

    /// Full resynchronization, replacing every piece of derived view state.
    /// Pending local messages are superseded by the server's copy.
    pub async fn refetch(&mut self) -> Result<(), ClientError> {
        let document = self.api.get_document(&self.document_id).await?;
        let page = self.api.get_messages(&self.document_id, 1).await?;
        self.current_page = page.current_page;
        self.last_page = page.last_page;
        self.thread.replace_all(page.data);
        self.document = Some(document);
        Ok(())
    }

    /// Fetch the next older message page, if any.
    pub async fn load_more(&mut self) -> Result<bool, ClientError> {
        if self.current_page >= self.last_page {
            return Ok(false);
        }
        let page = self.api.get_messages(&self.document_id, self.current_page + 1).await?;
        self.current_page = page.current_page;
        self.last_page = page.last_page;
        self.thread.merge_page(page.data);
        Ok(true)
    }

    /// Validate, optimistically append, then send. Validation failures
    /// never reach the network. A failed send leaves the entry visible but
    /// marked failed so the user can retry it.
    pub async fn send_message(
        &mut self,
        text: &str,
        attachment: Option<Attachment>,
    ) -> Result<(), ClientError> {
        if text.trim().is_empty() && attachment.is_none() {
            return Err(ClientError::Validation("Message cannot be empty".to_string()));
        }
        if let Some(attachment) = &attachment {
            attachment.validate()?;
        }

        let local = ChatMessage::local(
            &self.user_id,
            text,
            attachment.as_ref().map(|a| a.file_name.clone()),
        );
        let local_id = local.id.clone();
        self.thread.push_pending(local);

        match self
            .api
            .send_message(&self.document_id, text, attachment.as_ref())
            .await
        {
            Ok(()) => Ok(()),
            Err(e) => {
                self.thread.mark_failed(&local_id);
                Err(e)
            }
        }
    }

    /// Accept the reviewed file: one accept call, one narration message,
    /// then a full resync.
    pub async fn accept_recheck(&mut self) -> Result<(), ClientError> {
        let dto = AcceptRejectDto::accept(&self.document_id);
        self.api.accept_or_reject(&dto).await?;
        self.api
            .send_message(&self.document_id, "I have accepted the reviewed document.", None)
            .await?;
        self.refetch().await
    }

    /// Reject the reviewed file. The reason must be non-blank; nothing is
    /// sent otherwise.
    pub async fn reject_recheck(&mut self, reason: &str) -> Result<(), ClientError> {
        let dto = AcceptRejectDto::reject(&self.document_id, reason)
            .map_err(|_| ClientError::Validation("Rejection reason cannot be empty".to_string()))?;
        self.api.accept_or_reject(&dto).await?;
        self.api
            .send_message(
                &self.document_id,
                &format!("I have rejected the reviewed document. Reason: {}", reason.trim()),
                None,
            )
            .await?;
        self.refetch().await
    }

    pub async fn report_problem(&self, description: &str) -> Result<(), ClientError> {
        let dto = ReportProblemDto {
            document_id: self.document_id.clone(),
            problem_description: description.trim().to_string(),
        };
        dto.validate()
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        self.api.report_problem(&dto).await
    }

    /// Apply one realtime delivery. Duplicates are dropped by the thread.
    pub fn apply_realtime(&mut self, message: ChatMessage) -> bool {
        self.thread.apply_inbound(message)
    }

    fn spawn_read_receipt(&mut self) {
        let api = self.api.clone();
        let document_id = self.document_id.clone();
        let role = self.role;
        let handle = tokio::spawn(async move {
            let result = match role {
                SessionRole::Requester => api.mark_as_read_requester(&document_id).await,
                SessionRole::Admin => api.mark_as_read_admin(&document_id).await,
            };
            if let Err(e) = result {
                tracing::warn!("mark-as-read failed for document {}: {}", document_id, e);
            }
        });
        self.read_receipts.push(handle);
    }

    /// Await all in-flight read receipts. Used on teardown and in tests;
    /// the receipts themselves never block normal operation.
    pub async fn flush_read_receipts(&mut self) {
        let handles: Vec<_> = self.read_receipts.drain(..).collect();
        futures::future::join_all(handles).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    use crate::dtos::documentdtos::MessagePage;
    use crate::models::chatmodels::{Delivery, MAX_ATTACHMENT_BYTES};
    use crate::models::documentmodel::{DocumentStatus, PaymentRecord, PaymentStatus};

    #[derive(Default)]
    struct FakeApi {
        document: Mutex<Option<Document>>,
        messages: Mutex<Vec<ChatMessage>>,
        fail_send: Mutex<bool>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeApi {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn count(&self, name: &str) -> usize {
            self.calls().iter().filter(|c| c.as_str() == name).count()
        }
    }

    #[async_trait]
    impl DocumentApi for FakeApi {
        async fn get_document(&self, _document_id: &str) -> Result<Document, ClientError> {
            self.calls.lock().unwrap().push("get_document".to_string());
            self.document
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| ClientError::api("Document not found"))
        }

        async fn get_messages(&self, _document_id: &str, page: u32) -> Result<MessagePage, ClientError> {
            self.calls.lock().unwrap().push("get_messages".to_string());
            let messages = self.messages.lock().unwrap().clone();
            let total = messages.len() as u64;
            Ok(MessagePage {
                data: messages,
                current_page: page,
                last_page: 1,
                total,
            })
        }

        async fn send_message(
            &self,
            _document_id: &str,
            _text: &str,
            _attachment: Option<&Attachment>,
        ) -> Result<(), ClientError> {
            self.calls.lock().unwrap().push("send_message".to_string());
            if *self.fail_send.lock().unwrap() {
                Err(ClientError::api("Could not deliver message"))
            } else {
                Ok(())
            }
        }

        async fn mark_as_read_requester(&self, _document_id: &str) -> Result<(), ClientError> {
            self.calls.lock().unwrap().push("mark_as_read_requester".to_string());
            Ok(())
        }

        async fn mark_as_read_admin(&self, _document_id: &str) -> Result<(), ClientError> {
            self.calls.lock().unwrap().push("mark_as_read_admin".to_string());
            Ok(())
        }

        async fn accept_or_reject(&self, dto: &AcceptRejectDto) -> Result<(), ClientError> {
            self.calls.lock().unwrap().push("accept_or_reject".to_string());
            let mut doc = self.document.lock().unwrap();
            if let Some(doc) = doc.as_mut() {
                doc.is_accepted_by_user = Some(dto.is_accepted_by_user);
                doc.rejection_reason = dto.rejected_reason.clone();
            }
            Ok(())
        }

        async fn report_problem(&self, _dto: &ReportProblemDto) -> Result<(), ClientError> {
            self.calls.lock().unwrap().push("report_problem".to_string());
            Ok(())
        }
    }

    fn document(status: DocumentStatus) -> Document {
        Document {
            id: "42".to_string(),
            status,
            payment: Some(PaymentRecord {
                total: 1000.0,
                partial: 0.0,
                remaining: 1000.0,
                payment_status: PaymentStatus::NotPaid,
            }),
            file_url: Some("https://files.example/original.pdf".to_string()),
            recheck_file_url: Some("https://files.example/recheck.pdf".to_string()),
            final_zip_url: None,
            is_accepted_by_user: None,
            rejection_reason: None,
            has_new_update: false,
            has_new_message: false,
        }
    }

    fn server_message(id: &str, secs: i64) -> ChatMessage {
        ChatMessage {
            id: id.to_string(),
            user_id: "9".to_string(),
            message: format!("server message {}", id),
            file: None,
            created_at: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    fn session(api: Arc<FakeApi>) -> DocumentSession {
        DocumentSession::new(api, "42", "5", SessionRole::Requester)
    }

    #[tokio::test]
    async fn mount_loads_document_and_sorted_thread() {
        let api = Arc::new(FakeApi::default());
        *api.document.lock().unwrap() = Some(document(DocumentStatus::InProgress));
        *api.messages.lock().unwrap() = vec![server_message("2", 20), server_message("1", 10)];

        let mut session = session(api.clone());
        session.mount().await.unwrap();

        let entries = session.thread().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message.id, "1");
        assert_eq!(entries[1].message.id, "2");
        // no marker flags, so no read receipt fired
        assert_eq!(api.count("mark_as_read_requester"), 0);
    }

    #[tokio::test]
    async fn marker_flags_fire_role_specific_read_receipt() {
        let api = Arc::new(FakeApi::default());
        let mut doc = document(DocumentStatus::InProgress);
        doc.has_new_message = true;
        *api.document.lock().unwrap() = Some(doc);

        let mut session = session(api.clone());
        session.mount().await.unwrap();
        session.flush_read_receipts().await;
        assert_eq!(api.count("mark_as_read_requester"), 1);
        assert_eq!(api.count("mark_as_read_admin"), 0);
    }

    #[tokio::test]
    async fn invalid_attachment_never_reaches_the_network() {
        let api = Arc::new(FakeApi::default());
        *api.document.lock().unwrap() = Some(document(DocumentStatus::InProgress));
        let mut session = session(api.clone());
        session.mount().await.unwrap();

        let oversized = Attachment {
            file_name: "big.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: vec![0; MAX_ATTACHMENT_BYTES + 1],
        };
        let err = session.send_message("see attached", Some(oversized)).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        let wrong_type = Attachment {
            file_name: "clip.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            bytes: vec![0; 16],
        };
        let err = session.send_message("see attached", Some(wrong_type)).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));

        assert_eq!(api.count("send_message"), 0);
        // nothing was appended optimistically either
        assert!(session.thread().is_empty());
    }

    #[tokio::test]
    async fn valid_attachment_is_sent() {
        let api = Arc::new(FakeApi::default());
        *api.document.lock().unwrap() = Some(document(DocumentStatus::InProgress));
        let mut session = session(api.clone());
        session.mount().await.unwrap();

        let scan = Attachment {
            file_name: "scan.jpg".to_string(),
            mime_type: "image/jpeg".to_string(),
            bytes: vec![0; 1024],
        };
        session.send_message("see attached", Some(scan)).await.unwrap();
        assert_eq!(api.count("send_message"), 1);
        assert_eq!(session.thread().len(), 1);
    }

    #[tokio::test]
    async fn failed_send_marks_the_optimistic_entry() {
        let api = Arc::new(FakeApi::default());
        *api.document.lock().unwrap() = Some(document(DocumentStatus::InProgress));
        *api.fail_send.lock().unwrap() = true;

        let mut session = session(api.clone());
        session.mount().await.unwrap();

        assert!(session.send_message("hello?", None).await.is_err());
        let entries = session.thread().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].delivery, Delivery::Failed);
    }

    #[tokio::test]
    async fn reject_with_blank_reason_makes_no_calls() {
        let api = Arc::new(FakeApi::default());
        *api.document.lock().unwrap() = Some(document(DocumentStatus::InProgress));
        let mut session = session(api.clone());
        session.mount().await.unwrap();
        let before = api.calls().len();

        let err = session.reject_recheck("   ").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(api.calls().len(), before);
    }

    #[tokio::test]
    async fn reject_issues_one_verdict_call_and_one_narration() {
        let api = Arc::new(FakeApi::default());
        *api.document.lock().unwrap() = Some(document(DocumentStatus::InProgress));
        let mut session = session(api.clone());
        session.mount().await.unwrap();

        session.reject_recheck("blurry scan").await.unwrap();
        assert_eq!(api.count("accept_or_reject"), 1);
        assert_eq!(api.count("send_message"), 1);

        // resynced document now renders the rejection branch
        let state = session.state().unwrap();
        assert!(state.actions().is_empty());
        assert!(state
            .notices()
            .iter()
            .any(|n| n.contains("Reason: blurry scan")));
    }

    #[tokio::test]
    async fn accept_narrates_and_resyncs() {
        let api = Arc::new(FakeApi::default());
        let mut doc = document(DocumentStatus::InProgress);
        doc.payment = Some(PaymentRecord {
            total: 1000.0,
            partial: 650.0,
            remaining: 350.0,
            payment_status: PaymentStatus::PartiallyPaid,
        });
        *api.document.lock().unwrap() = Some(doc);
        let mut session = session(api.clone());
        session.mount().await.unwrap();

        session.accept_recheck().await.unwrap();
        assert_eq!(api.count("accept_or_reject"), 1);
        assert_eq!(api.count("send_message"), 1);

        let actions = session.available_actions();
        assert_eq!(actions, vec![Action::PayRemaining { amount: 350.0 }]);
    }

    #[tokio::test]
    async fn realtime_duplicates_are_dropped_by_the_session() {
        let api = Arc::new(FakeApi::default());
        *api.document.lock().unwrap() = Some(document(DocumentStatus::InProgress));
        let mut session = session(api.clone());
        session.mount().await.unwrap();

        assert!(session.apply_realtime(server_message("77", 30)));
        assert!(!session.apply_realtime(server_message("77", 30)));
        assert_eq!(session.thread().len(), 1);
    }
}
