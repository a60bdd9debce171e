//! Multi-contest rating history through the ledger.

use skillgraph_core::{RatingError, RatingLedger, TrueSkill, TrueSkillConfig};

use crate::{assert_close, default_system, NEWCOMER_MU, NEWCOMER_SIGMA};

#[test]
fn ledger_matches_repeated_adjust_players() {
    let mut ledger = RatingLedger::new(default_system());
    for _ in 0..2 {
        ledger
            .process_contest(&[("ann", 1), ("ben", 2)])
            .expect("contest");
    }

    let ann = ledger.rating("ann").expect("ann");
    let ben = ledger.rating("ben").expect("ben");
    assert_close(ann.mu, 31.229_628_995_525_41, 1e-5, "ann mu");
    assert_close(ben.mu, 18.770_371_004_474_6, 1e-5, "ben mu");
    assert_close(ann.sigma, ben.sigma, 1e-12, "shared sigma");
}

#[test]
fn history_tracks_each_contest() {
    let mut ledger = RatingLedger::new(default_system());
    let contests: [&[(&str, u32)]; 3] = [
        &[("ann", 1), ("ben", 2), ("cat", 3)],
        &[("cat", 1), ("ann", 2)],
        &[("ben", 1), ("cat", 1), ("dan", 2)],
    ];
    for standings in contests {
        ledger.process_contest(standings).expect("contest");
    }

    assert_eq!(ledger.contests_processed(), 3);
    assert_eq!(ledger.len(), 4);

    let cat = ledger.record("cat").expect("cat");
    let indices: Vec<usize> = cat.history.iter().map(|e| e.contest_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    let ranks: Vec<u32> = cat.history.iter().map(|e| e.rank).collect();
    assert_eq!(ranks, vec![3, 1, 1]);
    let last = cat.history.last().expect("last event");
    assert_eq!(last.mu, cat.rating.mu);
    assert_eq!(last.sigma, cat.rating.sigma);

    let dan = ledger.record("dan").expect("dan");
    assert_eq!(dan.history.len(), 1);
    assert!(dan.rating.mu < NEWCOMER_MU);
    assert!(dan.rating.sigma < NEWCOMER_SIGMA);
}

#[test]
fn uncertainty_shrinks_with_every_contest() {
    let mut ledger = RatingLedger::new(default_system());
    let mut previous = NEWCOMER_SIGMA;
    for round in 0..6 {
        let standings = if round % 2 == 0 {
            [("ann", 1), ("ben", 2)]
        } else {
            [("ann", 2), ("ben", 1)]
        };
        ledger.process_contest(&standings).expect("contest");
        let sigma = ledger.rating("ann").expect("ann").sigma;
        assert!(sigma < previous, "sigma grew in contest {}", round);
        previous = sigma;
    }
}

#[test]
fn rejected_contest_is_not_counted() {
    let mut ledger = RatingLedger::new(default_system());
    let err = ledger
        .process_contest(&[("ann", 1), ("ann", 2)])
        .expect_err("duplicate");
    assert!(matches!(err, RatingError::InvalidContest(_)));

    let empty: [(&str, u32); 0] = [];
    assert!(ledger.process_contest(&empty).is_err());
    assert!(ledger.is_empty());
    assert_eq!(ledger.contests_processed(), 0);
}

#[test]
fn newcomer_prior_follows_config() {
    let system = TrueSkill::new(TrueSkillConfig::from_initial_mu(100.0)).expect("config");
    let ledger = RatingLedger::new(system);
    let newcomer = ledger.newcomer();
    assert_eq!(newcomer.mu, 100.0);
    assert_close(newcomer.sigma, 100.0 / 3.0, 1e-12, "newcomer sigma");
}
