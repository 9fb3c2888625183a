use std::sync::Arc;

use dotenv::dotenv;
use tracing_subscriber::filter::LevelFilter;

use notarclient::{
    config::Config,
    service::{
        api_gateway::DocumentApi,
        document_session::{DocumentSession, SessionRole},
    },
    utils::amount::format_rupees,
    AppState,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::INFO)
        .init();

    dotenv().ok();

    let mut args = std::env::args().skip(1);
    let document_id = match args.next() {
        Some(id) => id,
        None => {
            eprintln!("usage: notarclient <document-id> [user-id]");
            std::process::exit(1);
        }
    };
    let user_id = args.next().unwrap_or_else(|| "0".to_string());

    let config = Config::init();
    let app_state = AppState::new(config);

    let api: Arc<dyn DocumentApi> = app_state.api_client.clone();
    let mut session = DocumentSession::new(api, &document_id, &user_id, SessionRole::Requester);

    if let Err(e) = session.mount().await {
        tracing::error!("failed to load document {}: {}", document_id, e);
        std::process::exit(1);
    }

    let document = session.document().expect("document loaded on mount");
    println!("Document {}", document.id);
    println!("  status: {:?}", document.status);
    if let Some(payment) = &document.payment {
        println!(
            "  payment: total {} / remaining {} ({:?})",
            format_rupees(payment.total),
            format_rupees(payment.remaining),
            payment.payment_status,
        );
    }

    if let Some(state) = session.state() {
        for notice in state.notices() {
            println!("  note: {}", notice);
        }
        for action in state.actions() {
            println!("  action: {}", action.label());
        }
    }

    println!("  messages: {}", session.thread().len());
    session.flush_read_receipts().await;
}
