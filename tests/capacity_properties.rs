//! Property test (spec §8 invariant 1): for any capacity and any number of
//! concurrently-issued single-seat hold requests, the number that succeed
//! never exceeds capacity.

mod support;

use chrono::{Duration, Utc};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn concurrent_holds_never_exceed_capacity(capacity in 1i32..6, contenders in 1usize..10) {
        let runtime = tokio::runtime::Runtime::new().expect("failed to build tokio runtime");
        runtime.block_on(async {
            let db = support::start_db().await;
            let now = Utc::now();
            let (service, _clock) = support::service_with_fixed_clock(db.pool.clone(), now);

            let event_id = support::seed_event(&db.pool, now).await;
            let slot_id =
                support::seed_slot(&db.pool, event_id, now + Duration::hours(2), capacity, 0).await;

            let handles: Vec<_> = (0..contenders)
                .map(|i| {
                    let service = service.clone();
                    let session_id = format!("sess-{i}");
                    tokio::spawn(async move {
                        service.create_hold(slot_id, &session_id, 1, None, None).await.is_ok()
                    })
                })
                .collect();

            let mut successes = 0i32;
            for handle in handles {
                if handle.await.expect("hold task panicked") {
                    successes += 1;
                }
            }

            prop_assert!(successes <= capacity, "successes {successes} exceeded capacity {capacity}");
            Ok(())
        })?;
    }
}
