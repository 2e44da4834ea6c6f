use bson::doc;
use serde_json::{Value, json};

use fellowpet_services::accounts::AccountService;
use fellowpet_services::compose::Composer;

use crate::fixtures::test_app::TestApp;

async fn seed_user(app: &TestApp, uid: &str, email: &str, status: &str) {
    let now = bson::DateTime::now();
    app.db
        .collection("users")
        .insert_one(doc! {
            "uid": uid,
            "email": email,
            "account_status": status,
            "created_at": now,
            "updated_at": now,
        })
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn lock_transition_stamps_locked_at_and_notifies() {
    let app = TestApp::spawn().await;
    seed_user(&app, "u1", "asha@test.local", "locked").await;

    let resp = app
        .post_events(json!([{
            "kind": "user_updated",
            "uid": "u1",
            "before": { "account_status": "active" },
            "after": { "account_status": "locked" },
        }]))
        .await;
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["results"][0]["status"], "handled");

    let user = app
        .db
        .collection::<bson::Document>("users")
        .find_one(doc! { "uid": "u1" })
        .await
        .unwrap()
        .unwrap();
    assert!(user.get_datetime("locked_at").is_ok());

    assert_eq!(
        app.email.subjects_for("asha@test.local"),
        vec!["MyFellowPet Account Locked for Security".to_string()]
    );
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn redelivered_locked_state_sends_nothing() {
    let app = TestApp::spawn().await;
    seed_user(&app, "u1", "asha@test.local", "locked").await;

    app.post_events(json!([{
        "kind": "user_updated",
        "uid": "u1",
        "before": { "account_status": "locked" },
        "after": { "account_status": "locked" },
    }]))
    .await;

    assert!(app.email.sent.lock().unwrap().is_empty());
}

#[tokio::test]
#[ignore = "requires MongoDB"]
async fn cleanup_removes_only_locks_past_the_grace_period() {
    let app = TestApp::spawn().await;
    seed_user(&app, "old", "old@test.local", "locked").await;
    seed_user(&app, "young", "young@test.local", "locked").await;

    let hour_ms: i64 = 60 * 60 * 1000;
    let now_ms = bson::DateTime::now().timestamp_millis();
    let users = app.db.collection::<bson::Document>("users");
    users
        .update_one(
            doc! { "uid": "old" },
            doc! { "$set": { "locked_at": bson::DateTime::from_millis(now_ms - 72 * hour_ms - 2 * 60_000) } },
        )
        .await
        .unwrap();
    users
        .update_one(
            doc! { "uid": "young" },
            doc! { "$set": { "locked_at": bson::DateTime::from_millis(now_ms - 72 * hour_ms + 2 * 60_000) } },
        )
        .await
        .unwrap();

    let accounts = AccountService::new(
        &app.db,
        app.email.clone(),
        app.directory.clone(),
        Composer::new(app.settings.branding.clone()),
    );
    let removed = accounts.cleanup_locked_accounts().await.unwrap();
    assert_eq!(removed, 1);

    assert!(users.find_one(doc! { "uid": "old" }).await.unwrap().is_none());
    assert!(users.find_one(doc! { "uid": "young" }).await.unwrap().is_some());

    assert_eq!(
        app.email.subjects_for("old@test.local"),
        vec!["MyFellowPet Account Removed".to_string()]
    );
    assert!(app.email.subjects_for("young@test.local").is_empty());
    assert_eq!(app.directory.deleted.lock().unwrap().clone(), vec!["old".to_string()]);
}
