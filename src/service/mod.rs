pub mod api_gateway;
pub mod document_session;
pub mod payment_flow;
pub mod payment_gateway;
pub mod realtime;
