use axum::{
    Json,
    extract::{Query, State},
};
use bson::doc;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use fellowpet_db::models::{AppUser, DailySummary, PetPricing, ServiceProfile};
use fellowpet_services::dao::BaseDao;

use crate::{error::ApiError, state::AppState};

const MAX_RANGE_DAYS: usize = 366;

fn date_range(start: &str, end: &str) -> Result<Vec<String>, ApiError> {
    let parse = |s: &str| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ApiError::BadRequest(format!("Invalid date: {s}")))
    };
    let start = parse(start)?;
    let end = parse(end)?;
    if end < start {
        return Err(ApiError::BadRequest(
            "end_date must not be before start_date".to_string(),
        ));
    }

    let mut dates = Vec::new();
    let mut current = start;
    while current <= end {
        dates.push(current.format("%Y-%m-%d").to_string());
        if dates.len() > MAX_RANGE_DAYS {
            return Err(ApiError::BadRequest("Date range too large".to_string()));
        }
        current = current
            .succ_opt()
            .ok_or_else(|| ApiError::BadRequest("Date out of range".to_string()))?;
    }
    Ok(dates)
}

async fn booked_counts(
    state: &AppState,
    service_id: &str,
    dates: &[String],
) -> Result<Vec<u32>, ApiError> {
    let summaries: BaseDao<DailySummary> = BaseDao::new(&state.db, DailySummary::COLLECTION);
    let mut counts = Vec::with_capacity(dates.len());
    for date in dates {
        let booked = summaries
            .find_one(doc! { "service_id": service_id, "date": date })
            .await?
            .map_or(0, |s| s.booked_count);
        counts.push(booked);
    }
    Ok(counts)
}

// ---- GET /api/lookup/boarders ---------------------------------------------

#[derive(Debug, Deserialize)]
pub struct BoardersQuery {
    pub pet_count: Option<u32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BoarderSummary {
    pub service_id: String,
    pub shop_name: Option<String>,
    pub open_time: Option<String>,
    pub close_time: Option<String>,
    pub max_pets_allowed: Option<u32>,
}

/// Lists displayed, approved boarding services. When `pet_count` and a date
/// range are given, services that cannot fit the pets on every requested
/// date are filtered out.
pub async fn boarders(
    State(state): State<AppState>,
    Query(query): Query<BoardersQuery>,
) -> Result<Json<Vec<BoarderSummary>>, ApiError> {
    let services: BaseDao<ServiceProfile> = BaseDao::new(&state.db, ServiceProfile::COLLECTION);
    let listed = services
        .find_many(doc! { "admin_approved": true, "display": true }, None)
        .await?;

    let filter = match (&query.pet_count, &query.start_date, &query.end_date) {
        (Some(count), Some(start), Some(end)) if *count > 0 => {
            Some((*count, date_range(start, end)?))
        }
        _ => None,
    };

    let mut results = Vec::new();
    for profile in listed {
        if let Some((pet_count, dates)) = &filter {
            let Some(capacity) = profile.max_pets_allowed.filter(|c| *c > 0) else {
                continue;
            };
            let counts = booked_counts(&state, &profile.service_id, dates).await?;
            if counts.iter().any(|booked| booked + pet_count > capacity) {
                continue;
            }
        }
        results.push(BoarderSummary {
            service_id: profile.service_id,
            shop_name: profile.shop_name,
            open_time: profile.open_time,
            close_time: profile.close_time,
            max_pets_allowed: profile.max_pets_allowed,
        });
    }
    Ok(Json(results))
}

// ---- GET /api/lookup/availability -----------------------------------------

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub service_id: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct DayAvailability {
    pub date: String,
    pub available: bool,
    pub spots_left: u32,
}

pub async fn availability(
    State(state): State<AppState>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<DayAvailability>>, ApiError> {
    let services: BaseDao<ServiceProfile> = BaseDao::new(&state.db, ServiceProfile::COLLECTION);
    let profile = services
        .find_one(doc! { "service_id": &query.service_id })
        .await?
        .ok_or_else(|| ApiError::NotFound("Service not found".to_string()))?;

    let capacity = profile
        .max_pets_allowed
        .filter(|c| *c > 0)
        .ok_or_else(|| {
            ApiError::BadRequest("Service has no valid boarding capacity".to_string())
        })?;

    let dates = date_range(&query.start_date, &query.end_date)?;
    let counts = booked_counts(&state, &query.service_id, &dates).await?;

    let days = dates
        .into_iter()
        .zip(counts)
        .map(|(date, booked)| {
            let spots_left = capacity.saturating_sub(booked);
            DayAvailability {
                date,
                available: spots_left > 0,
                spots_left,
            }
        })
        .collect();
    Ok(Json(days))
}

// ---- GET /api/lookup/pricing ----------------------------------------------

#[derive(Debug, Deserialize)]
pub struct PricingQuery {
    pub service_id: String,
    pub pet_type: String,
}

pub async fn pricing(
    State(state): State<AppState>,
    Query(query): Query<PricingQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let pricing: BaseDao<PetPricing> = BaseDao::new(&state.db, PetPricing::COLLECTION);
    let entry = pricing
        .find_one(doc! {
            "service_id": &query.service_id,
            "pet_type": query.pet_type.to_lowercase(),
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("Pet pricing not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "pet_type": entry.pet_type,
        "price_per_day": entry.price_per_day,
    })))
}

// ---- GET /api/lookup/account ----------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AccountQuery {
    pub uid: String,
}

pub async fn account(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let users: BaseDao<AppUser> = BaseDao::new(&state.db, AppUser::COLLECTION);
    let user = users
        .find_one(doc! { "uid": &query.uid })
        .await?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))?;

    Ok(Json(serde_json::json!({
        "uid": user.uid,
        "account_status": user.account_status,
        "locked_at": user.locked_at.map(|d| d.timestamp_millis()),
    })))
}
