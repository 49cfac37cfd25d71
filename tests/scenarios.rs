//! The six end-to-end scenarios from spec §8, each seeding its own slot.

mod support;

use chrono::{Duration, Utc};
use slot_reservation_core::domain::booking::AttendeeInput;
use slot_reservation_core::hold_manager::VerifyHoldReason;
use slot_reservation_core::SrcError;

fn ada() -> AttendeeInput {
    AttendeeInput {
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@example.org".into(),
        phone: None,
        notes: None,
    }
}

#[tokio::test]
async fn happy_path_hold_then_confirm() {
    let db = support::start_db().await;
    let now = Utc::now();
    let (service, _clock) = support::service_with_fixed_clock(db.pool.clone(), now);

    let event_id = support::seed_event(&db.pool, now).await;
    let slot_id = support::seed_slot(&db.pool, event_id, now + Duration::hours(2), 5, 1_000).await;

    let hold = service
        .create_hold(slot_id, "sess-A", 2, None, Some(10))
        .await
        .expect("create_hold should succeed");

    let booking = service
        .confirm_booking(hold.hold_id, "sess-A", ada())
        .await
        .expect("confirm_booking should succeed");

    let slot = slot_reservation_core::storage::slots::find_readonly(&db.pool, slot_id)
        .await
        .expect("slot should still exist");
    assert_eq!(slot.booked_count, 2);

    let verify = service.verify_hold(hold.hold_id).await.unwrap();
    assert!(!verify.is_valid);
    assert_eq!(verify.reason, Some(VerifyHoldReason::Released));

    let row: (String,) = sqlx::query_as("SELECT booking_reference FROM bookings WHERE booking_id = $1")
        .bind(booking.booking_id)
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(row.0.len(), 8);
    assert!(row.0.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
}

#[tokio::test]
async fn double_book_race_exactly_one_winner() {
    let db = support::start_db().await;
    let now = Utc::now();
    let (service, _clock) = support::service_with_fixed_clock(db.pool.clone(), now);

    let event_id = support::seed_event(&db.pool, now).await;
    let slot_id = support::seed_slot(&db.pool, event_id, now + Duration::hours(2), 1, 500).await;

    let service_a = service.clone();
    let service_b = service.clone();
    let (res_a, res_b) = tokio::join!(
        service_a.create_hold(slot_id, "A", 1, None, None),
        service_b.create_hold(slot_id, "B", 1, None, None),
    );

    let successes = [&res_a, &res_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one of the two racing holds must win");

    let failure = if res_a.is_err() { res_a } else { res_b };
    match failure.unwrap_err() {
        SrcError::CapacityExceeded { available, .. } => assert_eq!(available, 0),
        other => panic!("expected CapacityExceeded, got {other:?}"),
    }
}

#[tokio::test]
async fn own_hold_is_excluded_from_effective_availability() {
    let db = support::start_db().await;
    let now = Utc::now();
    let (service, _clock) = support::service_with_fixed_clock(db.pool.clone(), now);

    let event_id = support::seed_event(&db.pool, now).await;
    let slot_id = support::seed_slot(&db.pool, event_id, now + Duration::hours(2), 3, 0).await;

    service.create_hold(slot_id, "A", 2, None, None).await.unwrap();

    let as_a = service.list_availability(event_id, Some("A")).await.unwrap();
    let row_a = as_a.iter().find(|r| r.slot_id == slot_id).expect("slot visible to A");
    assert_eq!(row_a.effective_available, 3);

    let as_b = service.list_availability(event_id, Some("B")).await.unwrap();
    let row_b = as_b.iter().find(|r| r.slot_id == slot_id).expect("slot visible to B");
    assert_eq!(row_b.effective_available, 1);
}

#[tokio::test]
async fn expired_hold_self_heals_and_frees_capacity() {
    let db = support::start_db().await;
    let now = Utc::now();
    let (service, clock) = support::service_with_fixed_clock(db.pool.clone(), now);

    let event_id = support::seed_event(&db.pool, now).await;
    let slot_id = support::seed_slot(&db.pool, event_id, now + Duration::hours(2), 4, 0).await;

    let hold = service.create_hold(slot_id, "A", 1, None, Some(1)).await.unwrap();

    clock.advance(Duration::seconds(61));

    let verify = service.verify_hold(hold.hold_id).await.unwrap();
    assert!(!verify.is_valid);
    assert_eq!(verify.reason, Some(VerifyHoldReason::Expired));

    let as_b = service.list_availability(event_id, Some("B")).await.unwrap();
    let row_b = as_b.iter().find(|r| r.slot_id == slot_id).unwrap();
    assert_eq!(row_b.effective_available, 4);

    let confirm = service.confirm_booking(hold.hold_id, "A", ada()).await;
    assert!(matches!(confirm, Err(SrcError::HoldInvalid(_))));
}

#[tokio::test]
async fn capacity_drift_at_confirm_is_rejected() {
    let db = support::start_db().await;
    let now = Utc::now();
    let (service, _clock) = support::service_with_fixed_clock(db.pool.clone(), now);

    let event_id = support::seed_event(&db.pool, now).await;
    let slot_id = support::seed_slot(&db.pool, event_id, now + Duration::hours(2), 2, 0).await;

    let hold = service.create_hold(slot_id, "A", 1, None, None).await.unwrap();

    // Simulate an external/admin import bumping booked_count directly.
    sqlx::query("UPDATE time_slots SET booked_count = 2 WHERE slot_id = $1")
        .bind(slot_id)
        .execute(&db.pool)
        .await
        .unwrap();

    let confirm = service.confirm_booking(hold.hold_id, "A", ada()).await;
    assert!(matches!(confirm, Err(SrcError::CapacityExceeded { .. })));

    let failed_rows: (i64,) = sqlx::query_as(
        "SELECT count(*) FROM attempt_log WHERE slot_id = $1 AND status = 'failed'",
    )
    .bind(slot_id)
    .fetch_one(&db.pool)
    .await
    .unwrap();
    assert_eq!(failed_rows.0, 1);
}

#[tokio::test]
async fn re_holding_the_same_session_supersedes_the_prior_hold() {
    let db = support::start_db().await;
    let now = Utc::now();
    let (service, _clock) = support::service_with_fixed_clock(db.pool.clone(), now);

    let event_id = support::seed_event(&db.pool, now).await;
    let slot_id = support::seed_slot(&db.pool, event_id, now + Duration::hours(2), 5, 0).await;

    let first = service.create_hold(slot_id, "A", 1, None, None).await.unwrap();
    let second = service.create_hold(slot_id, "A", 3, None, None).await.unwrap();

    let verify_first = service.verify_hold(first.hold_id).await.unwrap();
    assert!(!verify_first.is_valid);
    assert_eq!(verify_first.reason, Some(VerifyHoldReason::Released));

    let verify_second = service.verify_hold(second.hold_id).await.unwrap();
    assert!(verify_second.is_valid);

    let as_other = service.list_availability(event_id, Some("B")).await.unwrap();
    let row = as_other.iter().find(|r| r.slot_id == slot_id).unwrap();
    assert_eq!(row.effective_available, 2);
}
