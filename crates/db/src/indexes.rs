use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Services
    create_indexes(
        db,
        "boarding_services",
        vec![
            index_unique(bson::doc! { "service_id": 1 }),
            index(bson::doc! { "shop_user_id": 1 }),
            index(bson::doc! { "admin_approved": 1, "display": 1 }),
        ],
    )
    .await?;

    // Push contacts
    create_indexes(
        db,
        "push_contacts",
        vec![
            index(bson::doc! { "service_id": 1 }),
            index(bson::doc! { "service_id": 1, "employee_id": 1 }),
        ],
    )
    .await?;

    // Bookings
    create_indexes(
        db,
        "booking_requests",
        vec![
            index_unique(bson::doc! { "service_id": 1, "booking_ref": 1 }),
            index(bson::doc! { "user_id": 1, "created_at": -1 }),
        ],
    )
    .await?;

    // Completed orders
    create_indexes(
        db,
        "completed_orders",
        vec![
            index_unique(bson::doc! { "service_id": 1, "order_ref": 1 }),
            index(bson::doc! { "payout.payout_done": 1 }),
            index(bson::doc! { "payout.payout_id": 1 }),
        ],
    )
    .await?;

    // Pending payouts
    create_indexes(
        db,
        "pending_payouts",
        vec![index_unique(bson::doc! { "order_ref": 1 })],
    )
    .await?;

    // Users
    create_indexes(
        db,
        "users",
        vec![
            index_unique(bson::doc! { "uid": 1 }),
            index(bson::doc! { "email": 1 }),
            index(bson::doc! { "account_status": 1, "locked_at": 1 }),
        ],
    )
    .await?;

    // Employees & tasks
    create_indexes(
        db,
        "employees",
        vec![index_unique(bson::doc! { "service_id": 1, "employee_id": 1 })],
    )
    .await?;
    create_indexes(
        db,
        "employee_tasks",
        vec![index_unique(bson::doc! { "service_id": 1, "task_id": 1 })],
    )
    .await?;

    // Verification codes: one live code per subject+purpose
    create_indexes(
        db,
        "verification_codes",
        vec![index_unique(bson::doc! { "subject_key": 1, "purpose": 1 })],
    )
    .await?;

    // Email-change requests: one live request per subject+kind
    create_indexes(
        db,
        "email_change_requests",
        vec![index_unique(bson::doc! { "subject_key": 1, "kind": 1 })],
    )
    .await?;

    // Chats
    create_indexes(
        db,
        "chats",
        vec![index_unique(bson::doc! { "chat_id": 1 })],
    )
    .await?;
    create_indexes(
        db,
        "chat_messages",
        vec![index(bson::doc! { "chat_id": 1, "timestamp": -1 })],
    )
    .await?;
    create_indexes(
        db,
        "chat_notifications_sent",
        vec![index(bson::doc! { "chat_id": 1, "timestamp": -1 })],
    )
    .await?;

    // Dispatch log
    create_indexes(
        db,
        "notification_log",
        vec![index(bson::doc! { "subject": 1, "event_kind": 1, "completed_at": -1 })],
    )
    .await?;

    // Lookup feeds
    create_indexes(
        db,
        "daily_summaries",
        vec![index_unique(bson::doc! { "service_id": 1, "date": 1 })],
    )
    .await?;
    create_indexes(
        db,
        "pet_pricing",
        vec![index_unique(bson::doc! { "service_id": 1, "pet_type": 1 })],
    )
    .await?;

    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
