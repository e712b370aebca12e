use std::net::SocketAddr;

use actix_web::{http::StatusCode, test, test::TestRequest, web, App};
use log::debug;
use razorpay_tools::{calculate_signature, SIGNATURE_HEADER};
use topup_common::Secret;
use topup_engine::{LedgerApi, LedgerStore};

use crate::{
    config::{RazorpayConfig, ServerOptions},
    routes::health,
    server::webhook_scope,
};

pub const TEST_SECRET: &str = "mysecretkey123";

pub fn razorpay_config() -> RazorpayConfig {
    RazorpayConfig { webhook_secret: Some(Secret::new(TEST_SECRET.to_string())), ..Default::default() }
}

/// A Razorpay `payment.captured` body. `notes` is inserted verbatim, so pass `[]` for "no notes".
pub fn captured_body(payment_id: &str, amount: i64, notes: &str) -> String {
    format!(
        r#"{{"entity":"event","account_id":"acc_BFQ7uQEaa7j2z7","event":"payment.captured","contains":["payment"],"payload":{{"payment":{{"entity":{{"id":"{payment_id}","entity":"payment","amount":{amount},"currency":"INR","status":"captured","method":"upi","notes":{notes}}}}}}},"created_at":1567674606}}"#
    )
}

pub fn user_notes(user_id: &str) -> String {
    format!(r#"{{"user_id":"{user_id}"}}"#)
}

pub fn webhook_request(body: &str) -> TestRequest {
    TestRequest::post()
        .uri("/webhook")
        .insert_header(("content-type", "application/json"))
        .peer_addr(SocketAddr::from(([10, 0, 0, 1], 44321)))
        .set_payload(body.to_string())
}

pub fn signed_request(body: &str, secret: &str) -> TestRequest {
    let signature = calculate_signature(secret, body.as_bytes()).expect("Could not sign body");
    webhook_request(body).insert_header((SIGNATURE_HEADER, signature))
}

/// Sends `req` to an app serving `/health` and the `/webhook` scope over `api`.
pub async fn send<B: LedgerStore + 'static>(
    api: LedgerApi<B>,
    razorpay: &RazorpayConfig,
    req: TestRequest,
) -> (StatusCode, String) {
    let app = App::new()
        .app_data(web::Data::new(api))
        .service(health)
        .service(webhook_scope::<B>(razorpay, ServerOptions::default()));
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = test::read_body(res).await;
    let body = String::from_utf8_lossy(&body).into_owned();
    debug!("Response: {status} {body}");
    (status, body)
}
