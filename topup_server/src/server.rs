use std::time::Duration;

use actix_web::{
    dev::{HttpServiceFactory, Server},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use log::*;
use razorpay_tools::WebhookVerifier;
use topup_engine::{LedgerApi, LedgerStore, MemoryLedgerStore, SqliteDatabase};

use crate::{
    config::{RazorpayConfig, ServerConfig, ServerOptions},
    errors::ServerError,
    middleware::WebhookAuthMiddlewareFactory,
    routes::{health, WebhookRoute},
};

const MAX_DB_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    if config.uses_memory_backend() {
        warn!("🗃️ Using the in-memory ledger. All balances will be lost when the server stops.");
        let srv = create_server_instance(config, MemoryLedgerStore::new())?;
        return srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    }
    let db = SqliteDatabase::new_with_url(&config.database_url, MAX_DB_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("🗃️ Ledger database ready at {}", db.url());
    let srv = create_server_instance(config, db.clone())?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    db.close().await;
    result
}

pub fn create_server_instance<B>(config: ServerConfig, db: B) -> Result<Server, ServerError>
where B: LedgerStore + Clone + Send + 'static {
    let options = ServerOptions::from_config(&config);
    let razorpay = config.razorpay.clone();
    let ledger_config = config.ledger;
    let srv = HttpServer::new(move || {
        let ledger_api = LedgerApi::with_config(db.clone(), ledger_config);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("topup::access_log"))
            .app_data(web::Data::new(ledger_api))
            .service(health)
            .service(webhook_scope::<B>(&razorpay, options))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// The `/webhook` scope, with signature checks and the optional IP whitelist in front of the handler. The ledger API
/// must be registered as app data by the caller.
pub fn webhook_scope<B>(razorpay: &RazorpayConfig, options: ServerOptions) -> impl HttpServiceFactory
where B: LedgerStore + 'static {
    let verifier = WebhookVerifier::new(razorpay.webhook_secret.clone());
    let auth = WebhookAuthMiddlewareFactory::new(
        verifier,
        razorpay.signature_checks,
        razorpay.whitelist.clone(),
        options,
    );
    web::scope("/webhook").wrap(auth).service(WebhookRoute::<B>::new())
}
