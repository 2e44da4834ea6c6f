use std::sync::atomic::Ordering;

use bson::doc;
use serde_json::{Value, json};

use crate::fixtures::test_app::TestApp;

async fn seed_order(app: &TestApp, end_pin_used: bool) {
    let now = bson::DateTime::now();
    app.db
        .collection("completed_orders")
        .insert_one(doc! {
            "service_id": "svc1",
            "order_ref": "ord1",
            "user_id": "u1",
            "user_name": "Asha",
            "shop_name": "Paws Inn",
            "phone_number": "9876543210",
            "is_end_pin_used": end_pin_used,
            "created_at": now,
            "updated_at": now,
        })
        .await
        .unwrap();
}

fn order_event() -> Value {
    json!([{
        "kind": "order_updated",
        "service_id": "svc1",
        "doc_id": "ord1",
    }])
}

async fn order_doc(app: &TestApp) -> bson::Document {
    app.db
        .collection::<bson::Document>("completed_orders")
        .find_one(doc! { "service_id": "svc1", "order_ref": "ord1" })
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn order_done_template_sends_exactly_once() {
    let app = TestApp::spawn().await;
    seed_order(&app, true).await;

    app.post_events(order_event()).await;
    app.post_events(order_event()).await;

    let wa = app.whatsapp.sent.lock().unwrap().clone();
    assert_eq!(wa.len(), 1);
    assert_eq!(wa[0].0, "9876543210");
    assert_eq!(wa[0].1, "user_boarding_order_done");

    let order = order_doc(&app).await;
    let state = order.get_document("wa_order_done").unwrap();
    assert_eq!(state.get_bool("sent"), Ok(true));
    assert_eq!(state.get_bool("in_progress"), Ok(false));
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn concurrent_redelivery_sends_at_most_once() {
    let app = TestApp::spawn().await;
    seed_order(&app, true).await;

    // Two deliveries of the same event race; the claim admits one.
    let (first, second) = tokio::join!(app.post_events(order_event()), app.post_events(order_event()));
    assert_eq!(first.status(), 200);
    assert_eq!(second.status(), 200);

    assert_eq!(app.whatsapp.sent.lock().unwrap().len(), 1);
    let order = order_doc(&app).await;
    let state = order.get_document("wa_order_done").unwrap();
    assert_eq!(state.get_bool("sent"), Ok(true));
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn failed_send_releases_the_claim_for_retry() {
    let app = TestApp::spawn().await;
    seed_order(&app, true).await;

    app.whatsapp.fail.store(true, Ordering::SeqCst);
    let resp = app.post_events(order_event()).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["results"][0]["status"], "handled");
    assert!(app.whatsapp.sent.lock().unwrap().is_empty());

    let order = order_doc(&app).await;
    let state = order.get_document("wa_order_done").unwrap();
    assert_eq!(state.get_bool("failed"), Ok(true));
    assert_eq!(state.get_bool("in_progress"), Ok(false));

    // The provider recovers; redelivery goes through.
    app.whatsapp.fail.store(false, Ordering::SeqCst);
    app.post_events(order_event()).await;

    assert_eq!(app.whatsapp.sent.lock().unwrap().len(), 1);
    let order = order_doc(&app).await;
    let state = order.get_document("wa_order_done").unwrap();
    assert_eq!(state.get_bool("sent"), Ok(true));
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn unredeemed_end_pin_sends_nothing() {
    let app = TestApp::spawn().await;
    seed_order(&app, false).await;

    let resp = app.post_events(order_event()).await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["results"][0]["status"], "handled");

    assert!(app.whatsapp.sent.lock().unwrap().is_empty());
    let order = order_doc(&app).await;
    assert!(order.get_document("wa_order_done").is_err());
}
