use bson::doc;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;

use crate::fixtures::test_app::TestApp;

fn sign(secret: &str, payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

async fn seed_order_with_payout(app: &TestApp, payout_id: &str) {
    let now = bson::DateTime::now();
    app.db
        .collection("completed_orders")
        .insert_one(doc! {
            "service_id": "svc1",
            "order_ref": "ord1",
            "user_id": "u1",
            "is_end_pin_used": false,
            "payout": {
                "payout_id": payout_id,
                "payout_status": "processing",
                "payout_done": false,
                "created_at": now,
            },
            "created_at": now,
            "updated_at": now,
        })
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn webhook_with_a_bad_signature_is_unauthorized() {
    let app = TestApp::spawn().await;
    seed_order_with_payout(&app, "pout_1").await;

    let body = br#"{"event":"payout.processed","payload":{"payout":{"entity":{"id":"pout_1","status":"processed"}}}}"#;
    let resp = app
        .client
        .post(app.url("/api/payouts/webhook"))
        .header("x-razorpay-signature", "not-a-signature")
        .body(body.to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let order = app
        .db
        .collection::<bson::Document>("completed_orders")
        .find_one(doc! { "order_ref": "ord1" })
        .await
        .unwrap()
        .unwrap();
    let payout = order.get_document("payout").unwrap();
    assert_eq!(payout.get_str("payout_status"), Ok("processing"));
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn verified_webhook_converges_the_order_and_is_logged() {
    let app = TestApp::spawn().await;
    seed_order_with_payout(&app, "pout_1").await;

    let body = br#"{"event":"payout.processed","payload":{"payout":{"entity":{"id":"pout_1","status":"processed"}}}}"#;
    let sig = sign("whsec_test", body);
    let resp = app
        .client
        .post(app.url("/api/payouts/webhook"))
        .header("x-razorpay-signature", sig)
        .body(body.to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let order = app
        .db
        .collection::<bson::Document>("completed_orders")
        .find_one(doc! { "order_ref": "ord1" })
        .await
        .unwrap()
        .unwrap();
    let payout = order.get_document("payout").unwrap();
    assert_eq!(payout.get_str("payout_status"), Ok("processed"));
    assert_eq!(payout.get_bool("payout_done"), Ok(true));

    let logged = app
        .db
        .collection::<bson::Document>("webhook_logs")
        .find_one(doc! { "payout_id": "pout_1" })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(logged.get_str("source"), Ok("razorpay"));
    assert_eq!(logged.get_str("event"), Ok("payout.processed"));
    assert_eq!(logged.get_str("status"), Ok("processed"));
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn webhook_without_a_payout_entity_is_acknowledged() {
    let app = TestApp::spawn().await;

    let body = br#"{"event":"ping"}"#;
    let sig = sign("whsec_test", body);
    let resp = app
        .client
        .post(app.url("/api/payouts/webhook"))
        .header("x-razorpay-signature", sig)
        .body(body.to_vec())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let logged = app
        .db
        .collection::<bson::Document>("webhook_logs")
        .count_documents(doc! {})
        .await
        .unwrap();
    assert_eq!(logged, 0);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn parked_payout_attaches_when_the_order_lands() {
    let app = TestApp::spawn().await;

    let now = bson::DateTime::now();
    app.db
        .collection("pending_payouts")
        .insert_one(doc! {
            "order_ref": "ord1",
            "service_id": "svc1",
            "payout_id": "pout_9",
            "payout_status": "queued",
            "payout_done": false,
            "created_at": now,
        })
        .await
        .unwrap();
    app.db
        .collection("completed_orders")
        .insert_one(doc! {
            "service_id": "svc1",
            "order_ref": "ord1",
            "user_id": "u1",
            "is_end_pin_used": false,
            "created_at": now,
            "updated_at": now,
        })
        .await
        .unwrap();

    let resp = app
        .post_events(json!([{
            "kind": "order_completed",
            "service_id": "svc1",
            "doc_id": "ord1",
        }]))
        .await;
    assert_eq!(resp.status(), 200);

    let order = app
        .db
        .collection::<bson::Document>("completed_orders")
        .find_one(doc! { "order_ref": "ord1" })
        .await
        .unwrap()
        .unwrap();
    let payout = order.get_document("payout").unwrap();
    assert_eq!(payout.get_str("payout_id"), Ok("pout_9"));
    assert_eq!(payout.get_str("payout_status"), Ok("queued"));

    let parked = app
        .db
        .collection::<bson::Document>("pending_payouts")
        .count_documents(doc! { "order_ref": "ord1" })
        .await
        .unwrap();
    assert_eq!(parked, 0);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn initiate_with_missing_fund_account_is_bad_request() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .post(app.url("/api/payouts/initiate"))
        .json(&json!({
            "service_id": "svc1",
            "order_ref": "ord1",
            "fund_account_id": "",
            "amount": 50_000,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
