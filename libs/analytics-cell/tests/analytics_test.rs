use std::sync::Arc;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use chrono::{Datelike, TimeZone, Utc};
use tower::ServiceExt;

use analytics_cell::{analytics_routes, AnalyticsError, AnalyticsRefresher, AnalyticsService};
use appointment_cell::models::BookAppointmentRequest;
use appointment_cell::services::{AppointmentBookingService, NoopObserver};
use shared_database::Database;
use shared_utils::test_utils::{body_json, fixed_today, get_request, seed_base_date, seeded_database};

fn request(doctor_id: &str, email: &str, date: &str, time: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor_id: Some(doctor_id.into()),
        patient_name: Some("Asha Rao".into()),
        patient_email: Some(email.into()),
        date: Some(date.into()),
        time: Some(time.into()),
    }
}

/// Three bookings by two patients, one of them cancelled.
async fn ledger() -> (Database, AppointmentBookingService) {
    let db = seeded_database(seed_base_date()).await;
    let booking = AppointmentBookingService::new(db.clone(), Arc::new(NoopObserver));

    booking
        .book_appointment_on(request("1", "asha@example.com", "2025-08-10", "09:00 AM"), fixed_today())
        .await
        .unwrap();
    booking
        .book_appointment_on(request("4", "ravi@example.com", "2025-08-10", "10:00 AM"), fixed_today())
        .await
        .unwrap();
    let cancelled = booking
        .book_appointment_on(request("2", "asha@example.com", "2025-08-10", "08:00 AM"), fixed_today())
        .await
        .unwrap();
    booking.cancel_appointment(&cancelled.id).await.unwrap();

    (db, booking)
}

#[tokio::test]
async fn recompute_counts_the_ledger() {
    let (db, _) = ledger().await;

    let snapshot = AnalyticsService::new(db).recompute().await.unwrap();

    assert_eq!(snapshot.total_appointments, 2);
    assert_eq!(snapshot.total_doctors, 6);
    assert_eq!(snapshot.available_doctors, 6);
    assert_eq!(snapshot.total_patients, 2);
    // Kusuma 1200 + Gupta 1500, the cancelled booking does not count
    assert_eq!(snapshot.monthly_revenue, 2700);
    assert_eq!(snapshot.recent_appointments.len(), 2);
    assert_eq!(snapshot.speciality_stats.get("Cardiologist"), Some(&1));
    assert_eq!(snapshot.speciality_stats.len(), 6);

    assert_eq!(snapshot.monthly_stats.len(), 1);
    assert_eq!(snapshot.monthly_stats[0].appointments, 2);
    assert_eq!(snapshot.monthly_stats[0].revenue, 2700);
}

#[tokio::test]
async fn revenue_only_counts_current_month() {
    let (db, _) = ledger().await;

    let later = Utc.with_ymd_and_hms(Utc::now().year() + 2, 1, 15, 0, 0, 0).unwrap();
    let snapshot = AnalyticsService::new(db).recompute_at(later).await.unwrap();

    assert_eq!(snapshot.monthly_revenue, 0);
    assert!(snapshot.monthly_stats.is_empty());
    assert_eq!(snapshot.total_appointments, 2);
}

#[tokio::test]
async fn recompute_is_idempotent_and_stored() {
    let (db, _) = ledger().await;
    let service = AnalyticsService::new(db);

    assert_matches!(service.load().await, Err(AnalyticsError::NotComputed));

    let at = Utc::now();
    let first = service.recompute_at(at).await.unwrap();
    let second = service.recompute_at(at).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(service.load().await.unwrap(), second);
}

#[tokio::test]
async fn refresher_updates_after_booking() {
    let db = seeded_database(seed_base_date()).await;
    let refresher = AnalyticsRefresher::start(AnalyticsService::new(db.clone()));
    let booking = AppointmentBookingService::new(db.clone(), refresher.clone());

    booking
        .book_appointment_on(request("1", "asha@example.com", "2025-08-11", "10:00 AM"), fixed_today())
        .await
        .unwrap();

    // shutdown drains the queue
    refresher.shutdown().await;

    let snapshot = AnalyticsService::new(db).load().await.unwrap();
    assert_eq!(snapshot.total_appointments, 1);

    // requests after shutdown are ignored
    booking
        .book_appointment_on(request("1", "asha@example.com", "2025-08-11", "11:30 AM"), fixed_today())
        .await
        .unwrap();
}

#[tokio::test]
async fn analytics_endpoint_recomputes() {
    let (db, _) = ledger().await;

    let response = analytics_routes(db)
        .oneshot(get_request("/analytics"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["totalAppointments"], 2);
    assert_eq!(json["data"]["totalPatients"], 2);
    assert_eq!(json["data"]["specialityStats"]["Neurologist"], 1);
    assert_eq!(json["data"]["recentAppointments"].as_array().unwrap().len(), 2);
    assert!(json["data"]["lastUpdated"].is_string());
}
