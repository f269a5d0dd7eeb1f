mod common;

use anchor_lang::prelude::Pubkey;
use common::{service, voter, MemoryLedger, PlainEncryptor};
use prediction_client::{
    ChoiceEncryptor, ClientError, LedgerReader, LedgerWriter, PredictionState, RefreshOutcome,
};

fn labels(results: &[(String, u64)]) -> Vec<(&str, u64)> {
    results.iter().map(|(l, c)| (l.as_str(), *c)).collect()
}

#[test]
fn created_prediction_starts_active_and_private() {
    let ledger = MemoryLedger::new();
    ledger.advance_clock(1_700_000_000);
    let creator = service(&ledger);

    let id = creator.create("Will it rain tomorrow?", "Yes, No").unwrap();
    assert_eq!(id, 0);
    assert_eq!(ledger.prediction_count().unwrap(), 1);

    let p = ledger.prediction(id).unwrap();
    assert_eq!(p.title, "Will it rain tomorrow?");
    assert_eq!(p.options, vec!["Yes", "No"]);
    assert_eq!(p.creator, ledger.signer());
    assert_eq!(p.state(), PredictionState::Active);
    assert!(!p.results_are_public);
    assert_eq!(p.created_at, 1_700_000_000);
    assert_eq!(p.closed_at(), None);
    assert_eq!(p.encrypted_counts.len(), 2);
    assert_eq!(p.revealed_counts, None);

    // The write refreshed the snapshot.
    let snapshot = creator.sync().snapshot();
    assert_eq!(snapshot.len(), 1);
    assert!(!snapshot[0].has_voted);
}

#[test]
fn ids_are_sequential() {
    let ledger = MemoryLedger::new();
    let creator = service(&ledger);
    let ids: Vec<u32> = (0..3)
        .map(|i| creator.create(&format!("Question {i}"), "A,B,C").unwrap())
        .collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert_eq!(ledger.prediction(2).unwrap().options.len(), 3);
}

#[test]
fn bad_option_count_leaves_ledger_unchanged() {
    let ledger = MemoryLedger::new();
    let creator = service(&ledger);

    let err = creator.create("Single option", "OnlyOne").unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "You must pass between 2 and 4 options");

    // Bypassing the client checks, the ledger refuses too.
    let five: Vec<String> = ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect();
    match ledger.create_prediction("Too many", &five).unwrap_err() {
        ClientError::Validation(msg) => assert_eq!(msg, "A prediction needs between 2 and 4 options"),
        other => panic!("unexpected {other:?}"),
    }

    assert_eq!(ledger.prediction_count().unwrap(), 0);
}

#[test]
fn vote_is_recorded_without_revealing_choice() {
    let ledger = MemoryLedger::new();
    let id = service(&ledger).create("Best team", "Team A,Team B").unwrap();

    let alice = voter(&ledger);
    let alice_key = alice.ledger().signer();
    alice.vote(id, 1).unwrap();

    assert!(ledger.has_user_voted(id, &alice_key).unwrap());
    assert!(!ledger.has_user_voted(id, &Pubkey::new_unique()).unwrap());
    let p = ledger.prediction(id).unwrap();
    assert_eq!(p.voter_count, 1);
    assert_eq!(p.revealed_counts, None);
    assert!(alice.sync().record(id).unwrap().has_voted);
}

#[test]
fn second_vote_is_rejected() {
    let ledger = MemoryLedger::new();
    let id = service(&ledger).create("Best team", "Team A,Team B").unwrap();
    let alice = voter(&ledger);

    alice.vote(id, 0).unwrap();
    assert!(matches!(alice.vote(id, 1), Err(ClientError::AlreadyVoted)));

    // The ledger enforces it on its own as well.
    let sealed = PlainEncryptor
        .encrypt_choice(1, &encrypted_prediction::ID, &alice.ledger().signer())
        .unwrap();
    let err = alice.ledger().submit_vote(id, &sealed).unwrap_err();
    assert!(matches!(err, ClientError::AlreadyVoted));
    assert!(err.is_state_conflict());

    assert_eq!(ledger.prediction(id).unwrap().voter_count, 1);
}

#[test]
fn vote_after_close_is_rejected() {
    let ledger = MemoryLedger::new();
    let creator = service(&ledger);
    let id = creator.create("Best team", "Team A,Team B").unwrap();
    let alice = voter(&ledger);
    alice.vote(id, 0).unwrap();
    creator.close(id).unwrap();

    let bob = voter(&ledger);
    assert!(matches!(bob.vote(id, 0), Err(ClientError::PredictionAlreadyClosed)));

    // Closed wins over already voted.
    let sealed = PlainEncryptor
        .encrypt_choice(0, &encrypted_prediction::ID, &alice.ledger().signer())
        .unwrap();
    assert!(matches!(
        alice.ledger().submit_vote(id, &sealed),
        Err(ClientError::PredictionAlreadyClosed)
    ));
    assert_eq!(ledger.prediction(id).unwrap().voter_count, 1);
}

#[test]
fn two_voters_decrypt_to_one_each() {
    let ledger = MemoryLedger::new();
    let creator = service(&ledger);
    let id = creator.create("Who wins?", "Team A,Team B").unwrap();

    voter(&ledger).vote(id, 0).unwrap();
    voter(&ledger).vote(id, 1).unwrap();

    let outsider = voter(&ledger);
    outsider.close(id).unwrap();

    let p = ledger.prediction(id).unwrap();
    assert_eq!(p.state(), PredictionState::Closed);
    assert!(p.results_are_public);
    assert_eq!(p.voter_count, 2);

    let results = creator.decrypt(id).unwrap();
    assert_eq!(labels(&results), vec![("Team A", 1), ("Team B", 1)]);
    assert_eq!(creator.sync().record(id).unwrap().results(), Some(results));
}

#[test]
fn counts_follow_option_order() {
    let ledger = MemoryLedger::new();
    let creator = service(&ledger);
    let id = creator.create("Favourite", "Red,Green,Blue,Black").unwrap();
    for choice in [2, 2, 0, 3, 2] {
        voter(&ledger).vote(id, choice).unwrap();
    }
    creator.close(id).unwrap();

    let results = creator.decrypt(id).unwrap();
    assert_eq!(
        labels(&results),
        vec![("Red", 1), ("Green", 0), ("Blue", 3), ("Black", 1)]
    );
}

#[test]
fn second_close_keeps_first_close_time() {
    let ledger = MemoryLedger::new();
    let creator = service(&ledger);
    let id = creator.create("Close twice", "Yes,No").unwrap();

    ledger.advance_clock(100);
    creator.close(id).unwrap();
    ledger.advance_clock(50);

    assert!(matches!(creator.close(id), Err(ClientError::PredictionAlreadyClosed)));
    assert!(matches!(
        ledger.close_prediction(id),
        Err(ClientError::PredictionAlreadyClosed)
    ));
    assert_eq!(ledger.prediction(id).unwrap().closed_at(), Some(100));
}

#[test]
fn decrypt_needs_closed_prediction() {
    let ledger = MemoryLedger::new();
    let creator = service(&ledger);
    let id = creator.create("Still open", "Yes,No").unwrap();
    voter(&ledger).vote(id, 0).unwrap();

    assert!(matches!(creator.decrypt(id), Err(ClientError::ResultsNotPublic)));
    assert_eq!(creator.sync().record(id).unwrap().decrypted_counts, None);
}

#[test]
fn decrypt_waits_for_reveal() {
    let ledger = MemoryLedger::new();
    let creator = service(&ledger);
    let id = creator.create("Slow reveal", "Yes,No").unwrap();
    voter(&ledger).vote(id, 1).unwrap();

    ledger.hold_callbacks();
    creator.close(id).unwrap();
    assert!(matches!(creator.decrypt(id), Err(ClientError::ResultsPending)));

    ledger.release_callbacks();
    let results = creator.decrypt(id).unwrap();
    assert_eq!(labels(&results), vec![("Yes", 0), ("No", 1)]);
}

#[test]
fn pending_computation_blocks_writes() {
    let ledger = MemoryLedger::new();
    let creator = service(&ledger);
    let id = creator.create("Busy", "Yes,No").unwrap();

    ledger.hold_callbacks();
    voter(&ledger).vote(id, 0).unwrap();

    let bob = voter(&ledger);
    assert!(matches!(bob.vote(id, 1), Err(ClientError::ComputationPending)));
    assert!(matches!(creator.close(id), Err(ClientError::ComputationPending)));
    assert!(!ledger.has_user_voted(id, &bob.ledger().signer()).unwrap());

    ledger.release_callbacks();
    bob.vote(id, 1).unwrap();
    creator.close(id).unwrap();
    assert_eq!(
        labels(&creator.decrypt(id).unwrap()),
        vec![("Yes", 1), ("No", 1)]
    );
}

#[test]
fn unknown_prediction_is_not_found() {
    let ledger = MemoryLedger::new();
    let alice = voter(&ledger);

    assert!(matches!(alice.vote(5, 0), Err(ClientError::PredictionNotFound(5))));
    assert!(matches!(alice.close(5), Err(ClientError::PredictionNotFound(5))));
    assert!(!ledger.has_user_voted(5, &alice.ledger().signer()).unwrap());
}

#[test]
fn out_of_range_choice_is_rejected_before_sending() {
    let ledger = MemoryLedger::new();
    let id = service(&ledger).create("Binary", "Yes,No").unwrap();
    let alice = voter(&ledger);

    assert!(alice.vote(id, 2).unwrap_err().is_validation());
    assert!(!ledger.has_user_voted(id, &alice.ledger().signer()).unwrap());
    assert_eq!(ledger.prediction(id).unwrap().voter_count, 0);
}

#[test]
fn lost_confirmation_is_resolved_by_reading_back() {
    let ledger = MemoryLedger::new();
    let creator = service(&ledger);

    ledger.drop_next_response();
    let id = creator.create("Flaky network", "Yes,No").unwrap();
    assert_eq!(id, 0);

    let alice = voter(&ledger);
    ledger.drop_next_response();
    alice.vote(id, 0).unwrap();
    assert!(ledger.has_user_voted(id, &alice.ledger().signer()).unwrap());

    ledger.drop_next_response();
    creator.close(id).unwrap();
    assert!(!ledger.prediction(id).unwrap().is_active);
}

#[test]
fn other_clients_see_writes_after_refresh() {
    let ledger = MemoryLedger::new();
    let watcher = voter(&ledger);
    assert_eq!(
        watcher.sync().refresh().unwrap(),
        RefreshOutcome::Applied { predictions: 0 }
    );

    let id = service(&ledger).create("Seen elsewhere", "Yes,No").unwrap();
    assert!(watcher.sync().record(id).is_none());

    watcher.sync().refresh().unwrap();
    let record = watcher.sync().record(id).unwrap();
    assert_eq!(record.prediction.title, "Seen elsewhere");
    assert!(!record.has_voted);
}

#[test]
fn aborted_tally_initialization_can_be_retried() {
    let ledger = MemoryLedger::new();
    let creator = service(&ledger);

    ledger.abort_next_computation();
    let id = creator.create("Unlucky start", "Yes,No").unwrap();
    let p = ledger.prediction(id).unwrap();
    assert!(!p.tallies_ready);
    assert!(!p.computation_pending);

    let alice = voter(&ledger);
    assert!(matches!(alice.vote(id, 0), Err(ClientError::TalliesNotReady)));
    assert!(matches!(creator.close(id), Err(ClientError::TalliesNotReady)));
    let sealed = PlainEncryptor
        .encrypt_choice(0, &encrypted_prediction::ID, &alice.ledger().signer())
        .unwrap();
    assert!(matches!(
        alice.ledger().submit_vote(id, &sealed),
        Err(ClientError::TalliesNotReady)
    ));

    // Anyone may ask for the computation again.
    alice.retry(id).unwrap();
    assert!(ledger.prediction(id).unwrap().tallies_ready);
    assert!(alice.retry(id).unwrap_err().is_validation());

    alice.vote(id, 0).unwrap();
    creator.close(id).unwrap();
    assert_eq!(labels(&creator.decrypt(id).unwrap()), vec![("Yes", 1), ("No", 0)]);
}

#[test]
fn aborted_reveal_can_be_retried() {
    let ledger = MemoryLedger::new();
    let creator = service(&ledger);
    let id = creator.create("Lost reveal", "Yes,No").unwrap();
    voter(&ledger).vote(id, 1).unwrap();

    ledger.advance_clock(300);
    ledger.abort_next_computation();
    creator.close(id).unwrap();
    let p = ledger.prediction(id).unwrap();
    assert!(p.results_are_public);
    assert!(!p.computation_pending);
    assert!(matches!(creator.decrypt(id), Err(ClientError::ResultsPending)));

    ledger.advance_clock(50);
    voter(&ledger).retry(id).unwrap();
    assert_eq!(labels(&creator.decrypt(id).unwrap()), vec![("Yes", 0), ("No", 1)]);
    assert_eq!(ledger.prediction(id).unwrap().closed_at(), Some(300));

    assert!(creator.retry(id).unwrap_err().is_validation());
    match ledger.retry_reveal(id).unwrap_err() {
        ClientError::Program(msg) => assert_eq!(msg, "Results are already revealed"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn retry_waits_for_pending_computation() {
    let ledger = MemoryLedger::new();
    let creator = service(&ledger);

    ledger.hold_callbacks();
    let id = creator.create("Still initializing", "Yes,No").unwrap();
    assert!(matches!(creator.retry(id), Err(ClientError::ComputationPending)));
    assert!(matches!(
        ledger.retry_init_tallies(id),
        Err(ClientError::ComputationPending)
    ));

    ledger.release_callbacks();
    assert!(ledger.prediction(id).unwrap().tallies_ready);
}
