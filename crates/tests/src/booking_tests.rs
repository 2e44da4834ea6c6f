use bson::doc;
use serde_json::{Value, json};

use crate::fixtures::test_app::TestApp;

async fn seed_confirmed_booking_world(app: &TestApp) {
    let now = bson::DateTime::now();
    app.db
        .collection("boarding_services")
        .insert_one(doc! {
            "service_id": "svc1",
            "shop_name": "Paws Inn",
            "owner_email": "owner@test.local",
            "admin_approved": true,
            "display": true,
            "created_at": now,
            "updated_at": now,
        })
        .await
        .unwrap();
    app.db
        .collection("push_contacts")
        .insert_one(doc! { "service_id": "svc1", "fcm_token": "sp-tok", "created_at": now })
        .await
        .unwrap();
    app.db
        .collection("users")
        .insert_one(doc! {
            "uid": "u1",
            "email": "asha@test.local",
            "fcm_token": "user-tok",
            "account_status": "active",
            "created_at": now,
            "updated_at": now,
        })
        .await
        .unwrap();
    app.db
        .collection("booking_requests")
        .insert_one(doc! {
            "service_id": "svc1",
            "booking_ref": "bk1",
            "user_id": "u1",
            "user_name": "Asha",
            "phone_number": "9876543210",
            "pet_names": ["Bruno"],
            "selected_dates": [now],
            "order_status": "confirmed",
            "drop_time": "10:00 AM",
            "open_time": "9:00 AM",
            "close_time": "8:00 PM",
            "shop_name": "Paws Inn",
            "created_at": now,
            "updated_at": now,
        })
        .await
        .unwrap();
}

fn push_titles(app: &TestApp) -> Vec<String> {
    app.push
        .sent
        .lock()
        .unwrap()
        .iter()
        .map(|(_, title, _)| title.clone())
        .collect()
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn confirmation_edge_notifies_provider_user_and_whatsapp() {
    let app = TestApp::spawn().await;
    seed_confirmed_booking_world(&app).await;

    let resp = app
        .post_events(json!([{
            "kind": "booking_updated",
            "service_id": "svc1",
            "doc_id": "bk1",
            "before": { "order_status": "pending" },
            "after": { "order_status": "confirmed" },
        }]))
        .await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["results"][0]["status"], "handled");

    let titles = push_titles(&app);
    assert!(titles.contains(&"Booking Confirmed!".to_string()));
    assert!(titles.contains(&"Request Accepted".to_string()));

    let subjects = app.email.subjects_for("owner@test.local");
    assert_eq!(subjects, vec!["✅ Booking Confirmed!".to_string()]);

    let wa = app.whatsapp.sent.lock().unwrap().clone();
    assert_eq!(wa.len(), 1);
    assert_eq!(wa[0].1, "user_boarding_booking_confirmation");
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn level_redelivery_of_confirmed_state_stays_silent() {
    let app = TestApp::spawn().await;
    seed_confirmed_booking_world(&app).await;

    let resp = app
        .post_events(json!([{
            "kind": "booking_updated",
            "service_id": "svc1",
            "doc_id": "bk1",
            "before": { "order_status": "confirmed" },
            "after": { "order_status": "confirmed" },
        }]))
        .await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["results"][0]["status"], "handled");

    assert!(app.push.sent.lock().unwrap().is_empty());
    assert!(app.email.sent.lock().unwrap().is_empty());
    assert!(app.whatsapp.sent.lock().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn user_cancellation_notifies_both_sides() {
    let app = TestApp::spawn().await;
    seed_confirmed_booking_world(&app).await;

    let now = bson::DateTime::now();
    app.db
        .collection::<bson::Document>("booking_requests")
        .update_one(
            doc! { "service_id": "svc1", "booking_ref": "bk1" },
            doc! { "$set": {
                "order_status": "user_cancellation",
                "cancelled_dates": [now],
                "rejection_reason": "travel plans changed",
            }},
        )
        .await
        .unwrap();

    let resp = app
        .post_events(json!([{
            "kind": "booking_updated",
            "service_id": "svc1",
            "doc_id": "bk1",
            "before": { "order_status": "confirmed" },
            "after": { "order_status": "user_cancellation" },
        }]))
        .await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["results"][0]["status"], "handled");

    let titles = push_titles(&app);
    assert!(titles.contains(&"Request Canceled".to_string()));
    assert!(titles.contains(&"Booking Cancelled".to_string()));

    let subjects = app.email.subjects_for("owner@test.local");
    assert_eq!(subjects, vec!["🚫 Booking Cancelled!".to_string()]);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn provider_confirmation_flag_sends_whatsapp_once() {
    let app = TestApp::spawn().await;
    seed_confirmed_booking_world(&app).await;

    let event = json!([{
        "kind": "booking_updated",
        "service_id": "svc1",
        "doc_id": "bk1",
        "before": { "sp_confirmation": false },
        "after": { "sp_confirmation": true },
    }]);
    app.post_events(event.clone()).await;
    app.post_events(event).await;

    let wa = app.whatsapp.sent.lock().unwrap().clone();
    assert_eq!(wa.len(), 1);
    assert_eq!(wa[0].1, "sp_confirmed_overnight_boarding_request");

    let booking = app
        .db
        .collection::<bson::Document>("booking_requests")
        .find_one(doc! { "service_id": "svc1", "booking_ref": "bk1" })
        .await
        .unwrap()
        .unwrap();
    let wa_state = booking.get_document("wa_confirmation").unwrap();
    assert_eq!(wa_state.get_bool("sent"), Ok(true));
    assert_eq!(wa_state.get_bool("in_progress"), Ok(false));
}
