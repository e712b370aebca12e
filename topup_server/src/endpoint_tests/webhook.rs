use std::net::SocketAddr;

use actix_web::{http::StatusCode, test::TestRequest};
use serde_json::Value;
use topup_engine::{
    db_types::{NewCredit, Paise, PaymentId},
    LedgerApi,
    LedgerConfig,
    LedgerStoreError,
    MemoryLedgerStore,
};

use super::{
    helpers::{captured_body, razorpay_config, send, signed_request, user_notes, webhook_request, TEST_SECRET},
    mocks::MockLedgerBackend,
};
use crate::{config::RazorpayConfig, data_objects::JsonResponse};

fn json_response(body: &str) -> JsonResponse {
    serde_json::from_str(body).expect("Response was not a JsonResponse")
}

fn error_message(body: &str) -> String {
    let value: Value = serde_json::from_str(body).expect("Response was not JSON");
    value["error"].as_str().expect("No error field in response").to_string()
}

/// A store that must not be touched
fn untouchable() -> LedgerApi<MockLedgerBackend> {
    LedgerApi::new(MockLedgerBackend::new())
}

#[actix_web::test]
async fn first_capture_creates_ledger() {
    let _ = env_logger::try_init().ok();
    let store = MemoryLedgerStore::new();
    let body = captured_body("pay_1", 10_000, &user_notes("user123"));
    let (status, res) = send(LedgerApi::new(store.clone()), &razorpay_config(), signed_request(&body, TEST_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    let res = json_response(&res);
    assert!(res.success);
    assert_eq!(res.message, "Payment pay_1 credited. Balance is now ₹100.00.");

    let ledger = LedgerApi::new(store).ledger_for_user(&"user123".into()).await.unwrap().unwrap();
    assert_eq!(ledger.balance.to_major().to_string(), "100.00");
    assert_eq!(ledger.total_top_up, Paise::from(10_000));
    assert_eq!(ledger.last_payment_id, PaymentId::from("pay_1"));
    let json = serde_json::to_value(&ledger).unwrap();
    assert_eq!(json["balance"], 100.0);
    assert_eq!(json["totalTopUp"], 100.0);
}

#[actix_web::test]
async fn capture_adds_to_ledger_and_redelivery_is_harmless() {
    let _ = env_logger::try_init().ok();
    let store = MemoryLedgerStore::new();
    let api = LedgerApi::new(store.clone());
    api.apply_credit(NewCredit::new("user123", "pay_0", Paise::from_major(50))).await.unwrap();

    let body = captured_body("pay_2", 2_500, &user_notes("user123"));
    let (status, res) = send(LedgerApi::new(store.clone()), &razorpay_config(), signed_request(&body, TEST_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_response(&res).message, "Payment pay_2 credited. Balance is now ₹75.00.");
    let ledger = api.ledger_for_user(&"user123".into()).await.unwrap().unwrap();
    assert_eq!(ledger.balance, Paise::from_major(75));
    assert_eq!(ledger.total_top_up, Paise::from_major(75));
    assert_eq!(ledger.last_payment_id, PaymentId::from("pay_2"));

    // Razorpay redelivers the same event
    let (status, res) = send(LedgerApi::new(store.clone()), &razorpay_config(), signed_request(&body, TEST_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    let res = json_response(&res);
    assert!(res.success);
    assert_eq!(res.message, "Payment pay_2 has already been applied.");
    let after = api.ledger_for_user(&"user123".into()).await.unwrap().unwrap();
    assert_eq!(after, ledger);
}

#[actix_web::test]
async fn missing_signature() {
    let _ = env_logger::try_init().ok();
    let body = captured_body("pay_1", 10_000, &user_notes("user123"));
    let (status, res) = send(untouchable(), &razorpay_config(), webhook_request(&body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&res), "Authentication Error. No webhook signature was provided.");
}

#[actix_web::test]
async fn signed_with_the_wrong_secret() {
    let _ = env_logger::try_init().ok();
    let body = captured_body("pay_1", 10_000, &user_notes("user123"));
    let (status, res) = send(untouchable(), &razorpay_config(), signed_request(&body, "not-the-secret")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(&res),
        "Authentication Error. Webhook signature is invalid. The signature does not match the request body"
    );
}

#[actix_web::test]
async fn signature_is_not_hex() {
    let _ = env_logger::try_init().ok();
    let body = captured_body("pay_1", 10_000, &user_notes("user123"));
    let req = webhook_request(&body).insert_header(("X-Razorpay-Signature", "not a hex digest"));
    let (status, res) = send(untouchable(), &razorpay_config(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error_message(&res).contains("not a valid hex string"));
}

#[actix_web::test]
async fn signature_over_reencoded_json_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = captured_body("pay_1", 10_000, &user_notes("user123"));
    let pretty = serde_json::to_string_pretty(&serde_json::from_str::<Value>(&body).unwrap()).unwrap();
    let signature = razorpay_tools::calculate_signature(TEST_SECRET, body.as_bytes()).unwrap();
    let req = webhook_request(&pretty).insert_header((razorpay_tools::SIGNATURE_HEADER, signature));
    let (status, _) = send(untouchable(), &razorpay_config(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn capture_without_user_id_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    for notes in ["[]", "{}", r#"{"user_id":""}"#, r#"{"user_id":42}"#, r#"{"customer":"someone"}"#] {
        let body = captured_body("pay_3", 10_000, notes);
        let (status, res) = send(untouchable(), &razorpay_config(), signed_request(&body, TEST_SECRET)).await;
        assert_eq!(status, StatusCode::OK, "notes: {notes}");
        let res = json_response(&res);
        assert!(res.success);
        assert_eq!(res.message, "Payment not credited. Payment pay_3 has no user_id in its notes.");
    }
}

#[actix_web::test]
async fn capture_without_usable_amount_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    for amount in [0, -100] {
        let body = captured_body("pay_4", amount, &user_notes("user123"));
        let (status, res) = send(untouchable(), &razorpay_config(), signed_request(&body, TEST_SECRET)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json_response(&res).message.contains("invalid amount"));
    }
    let body = r#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":"pay_5","notes":{"user_id":"u"}}}}}"#;
    let (status, _) = send(untouchable(), &razorpay_config(), signed_request(body, TEST_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    let body = r#"{"event":"payment.captured","payload":{}}"#;
    let (status, res) = send(untouchable(), &razorpay_config(), signed_request(body, TEST_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_response(&res).message, "Payment not credited. The event does not contain a payment entity.");
}

#[actix_web::test]
async fn lifecycle_and_unknown_events_do_not_touch_the_ledger() {
    let _ = env_logger::try_init().ok();
    let expected = [
        ("payment.authorized", "Event payment.authorized acknowledged."),
        ("payment.failed", "Event payment.failed acknowledged."),
        ("order.paid", "Event order.paid ignored."),
    ];
    for (event, message) in expected {
        let body = captured_body("pay_6", 10_000, &user_notes("user123")).replace("payment.captured", event);
        let (status, res) = send(untouchable(), &razorpay_config(), signed_request(&body, TEST_SECRET)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_response(&res).message, message);
    }
}

#[actix_web::test]
async fn missing_secret_is_a_server_error() {
    let _ = env_logger::try_init().ok();
    let body = captured_body("pay_1", 10_000, &user_notes("user123"));
    let config = RazorpayConfig { webhook_secret: None, ..Default::default() };
    let (status, res) = send(untouchable(), &config, signed_request(&body, TEST_SECRET)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_message(&res), "Invalid server configuration. The webhook secret has not been configured");
    // Checked before the signature is even looked at
    let (status, _) = send(untouchable(), &config, webhook_request(&body)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn empty_body() {
    let _ = env_logger::try_init().ok();
    let (status, res) = send(untouchable(), &razorpay_config(), signed_request("", TEST_SECRET)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&res), "Could not read request body: The request body is empty");
}

#[actix_web::test]
async fn malformed_payloads() {
    let _ = env_logger::try_init().ok();
    for body in [r#"{"event":"payment.captured""#, "[1,2,3]", r#"{"payload":{}}"#, r#"{"event":""}"#, r#"{"event":7}"#] {
        let (status, res) = send(untouchable(), &razorpay_config(), signed_request(body, TEST_SECRET)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert!(error_message(&res).starts_with("Payload deserialization error."), "body: {body}");
    }
}

#[actix_web::test]
async fn off_shape_payloads_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let bodies = [
        (r#"{"event":"refund.processed","payload":{"payment":{"entity":{"id":12345}}}}"#, "Event refund.processed ignored."),
        (r#"{"event":"payment.authorized","payload":{"payment":{}}}"#, "Event payment.authorized acknowledged."),
        (r#"{"event":"order.paid","payload":{"payment":{"entity":null}}}"#, "Event order.paid ignored."),
        (r#"{"event":"payment.failed","created_at":"yesterday","payload":"none"}"#, "Event payment.failed acknowledged."),
    ];
    for (body, message) in bodies {
        let (status, res) = send(untouchable(), &razorpay_config(), signed_request(body, TEST_SECRET)).await;
        assert_eq!(status, StatusCode::OK, "body: {body}");
        assert_eq!(json_response(&res).message, message, "body: {body}");
    }
    // A capture whose payment id is not a string cannot be credited, but is still acknowledged
    let body = r#"{"event":"payment.captured","payload":{"payment":{"entity":{"id":12345,"amount":10000,"notes":{"user_id":"u"}}}}}"#;
    let (status, res) = send(untouchable(), &razorpay_config(), signed_request(body, TEST_SECRET)).await;
    assert_eq!(status, StatusCode::OK);
    let res = json_response(&res);
    assert!(res.success);
    assert!(res.message.starts_with("Payment not credited."));
}

#[actix_web::test]
async fn store_failure_is_a_server_error() {
    let _ = env_logger::try_init().ok();
    let mut store = MockLedgerBackend::new();
    store.expect_fetch_ledger().returning(|_| Err(LedgerStoreError::DatabaseError("disk I/O error".into())));
    store.expect_insert_ledger().never();
    store.expect_update_ledger().never();
    let body = captured_body("pay_1", 10_000, &user_notes("user123"));
    let (status, res) = send(LedgerApi::new(store), &razorpay_config(), signed_request(&body, TEST_SECRET)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error_message(&res).contains("disk I/O error"));
}

#[actix_web::test]
async fn endless_write_conflicts_are_a_server_error() {
    let _ = env_logger::try_init().ok();
    let mut store = MockLedgerBackend::new();
    store.expect_fetch_ledger().times(3).returning(|_| Ok(None));
    store.expect_insert_ledger().times(3).returning(|r| Err(LedgerStoreError::Conflict(r.user_id.clone())));
    let api = LedgerApi::with_config(store, LedgerConfig::new(3, 256));
    let body = captured_body("pay_1", 10_000, &user_notes("user123"));
    let (status, res) = send(api, &razorpay_config(), signed_request(&body, TEST_SECRET)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(error_message(&res).contains("after 3 attempts"));
}

#[actix_web::test]
async fn unsigned_requests_pass_when_checks_are_disabled() {
    let _ = env_logger::try_init().ok();
    let store = MemoryLedgerStore::new();
    let config = RazorpayConfig { signature_checks: false, ..Default::default() };
    let body = captured_body("pay_1", 10_000, &user_notes("user123"));
    let (status, _) = send(LedgerApi::new(store.clone()), &config, webhook_request(&body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.len().await, 1);
    let (status, _) = send(LedgerApi::new(store), &config, webhook_request("")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn whitelist() {
    let _ = env_logger::try_init().ok();
    let store = MemoryLedgerStore::new();
    let config = RazorpayConfig { whitelist: Some(vec!["52.66.75.174".parse().unwrap()]), ..razorpay_config() };
    let body = captured_body("pay_1", 10_000, &user_notes("user123"));

    // webhook_request comes from 10.0.0.1
    let (status, res) = send(untouchable(), &config, signed_request(&body, TEST_SECRET)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_message(&res), "Authentication Error. The remote peer is not allowed to call this endpoint.");

    let req = signed_request(&body, TEST_SECRET).peer_addr(SocketAddr::from(([52, 66, 75, 174], 443)));
    let (status, _) = send(LedgerApi::new(store.clone()), &config, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(store.len().await, 1);
}

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let (status, body) = send(untouchable(), &razorpay_config(), TestRequest::get().uri("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}
