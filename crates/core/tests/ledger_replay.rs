//! Ledger replay against live engine state.
//!
//! Drafts of several shapes are played to completion with a mix of manual and
//! forced auto-picks. At every step, replaying the stored ledger from scratch
//! must reproduce exactly what the engine reports.

use snakedraft_core::{
    draft::{replay, ReplayedDraft},
    testing::fixtures::{self, EngineHarness},
    DraftReader, DraftStatus, PickMethod, PickRequest, SnakeOrder,
};

fn replay_stored(harness: &EngineHarness, session_id: &str) -> ReplayedDraft {
    let session = harness.store.get_session(session_id).unwrap().unwrap();
    let pool: Vec<String> = harness
        .store
        .pool(session_id)
        .unwrap()
        .into_iter()
        .map(|entry| entry.castaway_id)
        .collect();
    let picks = harness.store.ledger(session_id).unwrap();
    replay(&session.participants, session.roster_size, &pool, &picks).unwrap()
}

fn assert_replay_matches(harness: &EngineHarness, session_id: &str) {
    let replayed = replay_stored(harness, session_id);
    let snapshot = harness.engine.get_state(session_id).unwrap();

    assert_eq!(replayed.pick_index, snapshot.pick_index);
    assert_eq!(replayed.pick_index, snapshot.version);
    assert_eq!(replayed.available.len(), snapshot.available_castaways);
    assert_eq!(replayed.rosters, snapshot.rosters);
    assert_eq!(
        replayed.complete,
        snapshot.status == DraftStatus::Completed
    );

    // Replay is deterministic
    assert_eq!(replay_stored(harness, session_id), replayed);
    harness.engine.verify_ledger(session_id).unwrap();
}

#[tokio::test]
async fn test_replay_tracks_every_pick() {
    let shapes: &[(&[&str], u32)] = &[
        (&["A"], 3),
        (&["A", "B"], 2),
        (&["A", "B", "C"], 3),
        (&["A", "B", "C", "D", "E"], 2),
    ];

    for (n, (participants, roster_size)) in shapes.iter().enumerate() {
        let harness = EngineHarness::new();
        let pool = participants.len() * *roster_size as usize + 2;
        let id = harness
            .create_and_start(&format!("shape-{}", n), participants, *roster_size, pool)
            .await;
        let names = fixtures::names(participants);
        let order = SnakeOrder::new(&names);
        let total = participants.len() as u32 * roster_size;

        for index in 0..total {
            let picker = order.picker_at(index).unwrap();
            if index % 3 == 2 {
                harness.engine.force_auto_pick(&id, index).await.unwrap();
            } else {
                // Highest remaining castaway, so manual and auto picks differ
                let replayed = replay_stored(&harness, &id);
                let castaway = replayed.available.iter().next_back().unwrap().clone();
                harness
                    .engine
                    .submit_pick(
                        &id,
                        PickRequest {
                            participant_id: picker.to_string(),
                            expected_pick_index: index,
                            castaway_id: castaway,
                        },
                    )
                    .await
                    .unwrap();
            }
            assert_replay_matches(&harness, &id);
        }

        let ledger = harness.engine.ledger(&id).unwrap();
        assert_eq!(ledger.len() as u32, total);
        for pick in &ledger {
            assert_eq!(Some(pick.participant_id.as_str()), order.picker_at(pick.pick_index));
            let expected = if pick.pick_index % 3 == 2 {
                PickMethod::Auto
            } else {
                PickMethod::Manual
            };
            assert_eq!(pick.method, expected);
        }
    }
}

#[tokio::test]
async fn test_replay_of_partial_draft_after_pause() {
    let harness = EngineHarness::new();
    let id = harness.create_and_start("d1", &["A", "B", "C"], 2, 6).await;

    harness.engine.force_auto_pick(&id, 0).await.unwrap();
    harness.engine.force_auto_pick(&id, 1).await.unwrap();
    harness.engine.pause_draft(&id).await.unwrap();

    let replayed = replay_stored(&harness, &id);
    assert_eq!(replayed.pick_index, 2);
    assert!(!replayed.complete);
    assert_eq!(
        replayed.available.iter().cloned().collect::<Vec<_>>(),
        fixtures::names(&["c03", "c04", "c05", "c06"])
    );
    assert_replay_matches(&harness, &id);
}
