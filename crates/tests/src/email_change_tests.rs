use bson::doc;
use serde_json::{Value, json};

use crate::fixtures::test_app::TestApp;

async fn seed_service(app: &TestApp) {
    let now = bson::DateTime::now();
    app.db
        .collection("boarding_services")
        .insert_one(doc! {
            "service_id": "svc1",
            "shop_name": "Paws Inn",
            "shop_user_id": "acct1",
            "owner_email": "old@test.local",
            "login_email": "signin@test.local",
            "admin_approved": true,
            "display": true,
            "created_at": now,
            "updated_at": now,
        })
        .await
        .unwrap();
}

async fn request_change(app: &TestApp, kind: &str, new_email: &str) -> reqwest::Response {
    app.client
        .post(app.url("/api/email-change/request"))
        .json(&json!({ "subject_key": subject_for(kind), "kind": kind, "new_email": new_email }))
        .send()
        .await
        .unwrap()
}

fn subject_for(kind: &str) -> &'static str {
    match kind {
        "login" => "acct1",
        _ => "svc1",
    }
}

async fn stored_request(app: &TestApp, kind: &str) -> bson::Document {
    let stored_kind = match kind {
        "login" => "login_email",
        _ => "contact_email",
    };
    app.db
        .collection::<bson::Document>("email_change_requests")
        .find_one(doc! { "subject_key": subject_for(kind), "kind": stored_kind })
        .await
        .unwrap()
        .unwrap()
}

async fn confirm(app: &TestApp, kind: &str, party: &str, token: &str) -> reqwest::Response {
    app.client
        .get(app.url("/api/email-change/confirm"))
        .query(&[
            ("subject", subject_for(kind)),
            ("kind", kind),
            ("type", party),
            ("token", token),
        ])
        .send()
        .await
        .unwrap()
}

async fn finalize(app: &TestApp, kind: &str) -> reqwest::Response {
    app.client
        .post(app.url("/api/email-change/finalize"))
        .json(&json!({ "subject_key": subject_for(kind), "kind": kind }))
        .send()
        .await
        .unwrap()
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn contact_change_runs_the_full_dual_confirmation_flow() {
    let app = TestApp::spawn().await;
    seed_service(&app).await;

    assert_eq!(request_change(&app, "contact", "new@test.local").await.status(), 204);
    assert_eq!(
        app.email.subjects_for("old@test.local"),
        vec!["Confirm Your CURRENT Email".to_string()]
    );
    assert_eq!(
        app.email.subjects_for("new@test.local"),
        vec!["Confirm Your NEW Email".to_string()]
    );

    // Finalizing before either party confirms is refused.
    assert_eq!(finalize(&app, "contact").await.status(), 412);

    let request = stored_request(&app, "contact").await;
    let old_token = request.get_str("old_token").unwrap().to_string();
    let new_token = request.get_str("new_token").unwrap().to_string();

    let resp = confirm(&app, "contact", "old", &old_token).await;
    assert_eq!(resp.status(), 200);
    assert!(resp.text().await.unwrap().contains("Old email verified!"));

    // Re-clicking the same link changes nothing.
    assert_eq!(confirm(&app, "contact", "old", &old_token).await.status(), 200);
    assert_eq!(finalize(&app, "contact").await.status(), 412);

    assert_eq!(confirm(&app, "contact", "new", &new_token).await.status(), 200);

    let resp = finalize(&app, "contact").await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["new_email"], "new@test.local");

    let service = app
        .db
        .collection::<bson::Document>("boarding_services")
        .find_one(doc! { "service_id": "svc1" })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(service.get_str("owner_email"), Ok("new@test.local"));
    assert_eq!(service.get_bool("notification_email_verified"), Ok(true));

    // The request is gone; a replayed finalize cannot commit twice.
    assert_eq!(finalize(&app, "contact").await.status(), 404);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn wrong_token_is_refused() {
    let app = TestApp::spawn().await;
    seed_service(&app).await;
    request_change(&app, "contact", "new@test.local").await;

    assert_eq!(
        confirm(&app, "contact", "old", "deadbeefdeadbeefdeadbeefdeadbeef")
            .await
            .status(),
        403
    );
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn unchanged_address_is_rejected() {
    let app = TestApp::spawn().await;
    seed_service(&app).await;

    assert_eq!(request_change(&app, "contact", "old@test.local").await.status(), 400);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn login_change_updates_the_directory_and_owned_services() {
    let app = TestApp::spawn().await;
    seed_service(&app).await;
    app.directory
        .emails
        .lock()
        .unwrap()
        .insert("acct1".to_string(), "signin@test.local".to_string());

    assert_eq!(request_change(&app, "login", "fresh@test.local").await.status(), 204);

    let request = stored_request(&app, "login").await;
    let old_token = request.get_str("old_token").unwrap().to_string();
    let new_token = request.get_str("new_token").unwrap().to_string();
    confirm(&app, "login", "old", &old_token).await;
    confirm(&app, "login", "new", &new_token).await;

    assert_eq!(finalize(&app, "login").await.status(), 200);
    assert_eq!(
        app.directory.emails.lock().unwrap().get("acct1").cloned(),
        Some("fresh@test.local".to_string())
    );

    let service = app
        .db
        .collection::<bson::Document>("boarding_services")
        .find_one(doc! { "service_id": "svc1" })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(service.get_str("login_email"), Ok("fresh@test.local"));
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn login_change_to_an_address_in_use_conflicts() {
    let app = TestApp::spawn().await;
    seed_service(&app).await;
    {
        let mut emails = app.directory.emails.lock().unwrap();
        emails.insert("acct1".to_string(), "signin@test.local".to_string());
        emails.insert("acct2".to_string(), "taken@test.local".to_string());
    }

    assert_eq!(request_change(&app, "login", "taken@test.local").await.status(), 409);
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn expired_request_returns_gone_and_is_removed() {
    let app = TestApp::spawn().await;
    seed_service(&app).await;
    request_change(&app, "contact", "new@test.local").await;

    let stale = bson::DateTime::from_millis(
        bson::DateTime::now().timestamp_millis() - 25 * 60 * 60 * 1000,
    );
    app.db
        .collection::<bson::Document>("email_change_requests")
        .update_one(
            doc! { "subject_key": "svc1" },
            doc! { "$set": { "created_at": stale } },
        )
        .await
        .unwrap();

    assert_eq!(finalize(&app, "contact").await.status(), 410);
    let remaining = app
        .db
        .collection::<bson::Document>("email_change_requests")
        .count_documents(doc! { "subject_key": "svc1" })
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}
