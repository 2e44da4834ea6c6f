use bson::doc;
use serde_json::Value;

use crate::fixtures::test_app::TestApp;

async fn seed_boarder(app: &TestApp, service_id: &str, capacity: Option<u32>) {
    let now = bson::DateTime::now();
    let mut doc = doc! {
        "service_id": service_id,
        "shop_name": format!("Shop {service_id}"),
        "owner_email": "owner@test.local",
        "admin_approved": true,
        "display": true,
        "open_time": "9:00 AM",
        "close_time": "8:00 PM",
        "created_at": now,
        "updated_at": now,
    };
    if let Some(capacity) = capacity {
        doc.insert("max_pets_allowed", capacity);
    }
    app.db
        .collection("boarding_services")
        .insert_one(doc)
        .await
        .unwrap();
}

async fn seed_summary(app: &TestApp, service_id: &str, date: &str, booked: u32) {
    app.db
        .collection("daily_summaries")
        .insert_one(doc! {
            "service_id": service_id,
            "date": date,
            "booked_count": booked,
        })
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn availability_reports_spots_left_per_day() {
    let app = TestApp::spawn().await;
    seed_boarder(&app, "svc1", Some(3)).await;
    seed_summary(&app, "svc1", "2026-09-01", 2).await;

    let resp = app
        .client
        .get(app.url("/api/lookup/availability"))
        .query(&[
            ("service_id", "svc1"),
            ("start_date", "2026-09-01"),
            ("end_date", "2026-09-02"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let days: Value = resp.json().await.unwrap();
    let days = days.as_array().unwrap();
    assert_eq!(days.len(), 2);
    assert_eq!(days[0]["date"], "2026-09-01");
    assert_eq!(days[0]["spots_left"], 1);
    assert_eq!(days[0]["available"], true);
    assert_eq!(days[1]["spots_left"], 3);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn availability_for_an_unknown_service_is_not_found() {
    let app = TestApp::spawn().await;

    let resp = app
        .client
        .get(app.url("/api/lookup/availability"))
        .query(&[
            ("service_id", "ghost"),
            ("start_date", "2026-09-01"),
            ("end_date", "2026-09-01"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn availability_without_capacity_is_bad_request() {
    let app = TestApp::spawn().await;
    seed_boarder(&app, "svc1", None).await;

    let resp = app
        .client
        .get(app.url("/api/lookup/availability"))
        .query(&[
            ("service_id", "svc1"),
            ("start_date", "2026-09-01"),
            ("end_date", "2026-09-01"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn reversed_date_range_is_bad_request() {
    let app = TestApp::spawn().await;
    seed_boarder(&app, "svc1", Some(3)).await;

    let resp = app
        .client
        .get(app.url("/api/lookup/availability"))
        .query(&[
            ("service_id", "svc1"),
            ("start_date", "2026-09-05"),
            ("end_date", "2026-09-01"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn boarders_filters_services_that_cannot_fit_the_pets() {
    let app = TestApp::spawn().await;
    seed_boarder(&app, "roomy", Some(5)).await;
    seed_boarder(&app, "tight", Some(2)).await;
    seed_boarder(&app, "uncapped", None).await;
    seed_summary(&app, "tight", "2026-09-01", 1).await;

    let resp = app
        .client
        .get(app.url("/api/lookup/boarders"))
        .query(&[
            ("pet_count", "2"),
            ("start_date", "2026-09-01"),
            ("end_date", "2026-09-02"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["service_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["roomy"]);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn boarders_without_filters_lists_everything_displayed() {
    let app = TestApp::spawn().await;
    seed_boarder(&app, "svc1", Some(3)).await;
    seed_boarder(&app, "svc2", None).await;
    let now = bson::DateTime::now();
    app.db
        .collection("boarding_services")
        .insert_one(doc! {
            "service_id": "hidden",
            "admin_approved": true,
            "display": false,
            "created_at": now,
            "updated_at": now,
        })
        .await
        .unwrap();

    let resp = app
        .client
        .get(app.url("/api/lookup/boarders"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn pricing_lookup_is_case_insensitive_on_pet_type() {
    let app = TestApp::spawn().await;
    app.db
        .collection("pet_pricing")
        .insert_one(doc! {
            "service_id": "svc1",
            "pet_type": "dog",
            "price_per_day": 750,
        })
        .await
        .unwrap();

    let resp = app
        .client
        .get(app.url("/api/lookup/pricing"))
        .query(&[("service_id", "svc1"), ("pet_type", "Dog")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["pet_type"], "dog");
    assert_eq!(body["price_per_day"], 750);

    let resp = app
        .client
        .get(app.url("/api/lookup/pricing"))
        .query(&[("service_id", "svc1"), ("pet_type", "parrot")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn account_lookup_reports_lock_state() {
    let app = TestApp::spawn().await;
    let now = bson::DateTime::now();
    app.db
        .collection("users")
        .insert_one(doc! {
            "uid": "u1",
            "email": "asha@test.local",
            "account_status": "locked",
            "locked_at": now,
            "created_at": now,
            "updated_at": now,
        })
        .await
        .unwrap();

    let resp = app
        .client
        .get(app.url("/api/lookup/account"))
        .query(&[("uid", "u1")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["account_status"], "locked");
    assert_eq!(body["locked_at"], now.timestamp_millis());

    let resp = app
        .client
        .get(app.url("/api/lookup/account"))
        .query(&[("uid", "ghost")])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
