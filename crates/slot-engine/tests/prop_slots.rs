//! Property-based tests for the slot sweep using proptest.
//!
//! Busy intervals are generated on a minute grid inside and around a one-day window so
//! that overlaps, nesting, and out-of-window blocks all occur regularly.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use slot_engine::{find_open_slots, Buffers, SlotQuery, TimeInterval};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap()
}

/// Window from 08:00 to 18:00.
fn window() -> (DateTime<Utc>, DateTime<Utc>) {
    (base() + Duration::hours(8), base() + Duration::hours(18))
}

/// A busy interval starting anywhere from 06:00 to 20:00, lasting 0-180 minutes.
fn arb_busy() -> impl Strategy<Value = TimeInterval> {
    (360i64..=1200, 0i64..=180).prop_map(|(start_min, len)| {
        let start = base() + Duration::minutes(start_min);
        TimeInterval {
            start,
            end: start + Duration::minutes(len),
        }
    })
}

fn arb_busy_list() -> impl Strategy<Value = Vec<TimeInterval>> {
    prop::collection::vec(arb_busy(), 0..12)
}

fn query(duration: i64, before: i64, after: i64) -> SlotQuery {
    let (start, end) = window();
    SlotQuery::new(start, end, duration)
        .unwrap()
        .with_buffers(Buffers::from_minutes(before, after).unwrap())
}

fn covered_by(slot: &TimeInterval, slots: &[TimeInterval]) -> bool {
    slots.iter().any(|s| s.contains(slot))
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn slots_lie_inside_window_and_fit_duration(
        busy in arb_busy_list(),
        duration in 1i64..=240,
        before in 0i64..=30,
        after in 0i64..=30,
    ) {
        let q = query(duration, before, after);
        let slots = find_open_slots(&busy, &q);

        for slot in &slots {
            prop_assert!(slot.start >= q.window_start());
            prop_assert!(slot.end <= q.window_end());
            prop_assert!(slot.fits(q.duration()));
        }
    }

    #[test]
    fn slots_are_chronological_and_disjoint(
        busy in arb_busy_list(),
        duration in 1i64..=240,
        before in 0i64..=30,
        after in 0i64..=30,
    ) {
        let slots = find_open_slots(&busy, &query(duration, before, after));
        for pair in slots.windows(2) {
            prop_assert!(pair[0].end <= pair[1].start);
        }
    }

    #[test]
    fn slots_avoid_every_buffered_busy_interval(
        busy in arb_busy_list(),
        duration in 1i64..=240,
        before in 0i64..=30,
        after in 0i64..=30,
    ) {
        let q = query(duration, before, after);
        let slots = find_open_slots(&busy, &q);
        for b in &busy {
            let padded = b.buffered(q.buffers().before(), q.buffers().after());
            for slot in &slots {
                prop_assert!(!slot.overlaps(&padded), "{:?} overlaps {:?}", slot, padded);
            }
        }
    }

    #[test]
    fn identical_inputs_give_identical_output(
        busy in arb_busy_list(),
        duration in 1i64..=240,
    ) {
        let q = query(duration, 15, 15);
        prop_assert_eq!(find_open_slots(&busy, &q), find_open_slots(&busy, &q));
    }

    #[test]
    fn input_order_does_not_matter(
        busy in arb_busy_list(),
        duration in 1i64..=240,
    ) {
        let q = query(duration, 10, 5);
        let mut reversed = busy.clone();
        reversed.reverse();
        prop_assert_eq!(find_open_slots(&busy, &q), find_open_slots(&reversed, &q));
    }

    #[test]
    fn longer_duration_only_removes_slots(
        busy in arb_busy_list(),
        short in 1i64..=120,
        extra in 0i64..=120,
    ) {
        let short_slots = find_open_slots(&busy, &query(short, 5, 5));
        let long_slots = find_open_slots(&busy, &query(short + extra, 5, 5));

        prop_assert!(long_slots.len() <= short_slots.len());
        for slot in &long_slots {
            prop_assert!(short_slots.contains(slot));
        }
    }

    #[test]
    fn larger_buffers_only_shrink_slots(
        busy in arb_busy_list(),
        duration in 1i64..=120,
        before in 0i64..=30,
        after in 0i64..=30,
        grow_before in 0i64..=30,
        grow_after in 0i64..=30,
    ) {
        let narrow = find_open_slots(&busy, &query(duration, before, after));
        let wide = find_open_slots(&busy, &query(duration, before + grow_before, after + grow_after));

        for slot in &wide {
            prop_assert!(covered_by(slot, &narrow), "{:?} not inside any of {:?}", slot, narrow);
        }
    }

    #[test]
    fn disjoint_busy_and_slots_partition_window(
        starts in prop::collection::btree_set(0i64..19, 0..8),
        before in 0i64..=10,
        after in 0i64..=10,
    ) {
        // Five minute blocks on a 30 minute grid: with buffers of at most 10 minutes the
        // buffered spans never touch each other or the window edges.
        let (window_start, window_end) = window();
        let busy: Vec<TimeInterval> = starts
            .iter()
            .map(|i| {
                let start = window_start + Duration::minutes(30 + i * 30);
                TimeInterval { start, end: start + Duration::minutes(5) }
            })
            .collect();
        let padded: Vec<TimeInterval> = busy
            .iter()
            .map(|b| b.buffered(Duration::minutes(before), Duration::minutes(after)))
            .collect();

        let slots = find_open_slots(&busy, &query(1, before, after));

        let mut pieces: Vec<TimeInterval> = slots.iter().chain(padded.iter()).copied().collect();
        pieces.sort_by_key(|p| p.start);
        let covered = pieces
            .iter()
            .fold(Duration::zero(), |acc, p| acc + p.duration());

        prop_assert_eq!(covered, window_end - window_start);
        prop_assert_eq!(pieces.first().map(|p| p.start), Some(window_start));
        prop_assert_eq!(pieces.last().map(|p| p.end), Some(window_end));
        for pair in pieces.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
    }
}
