//! End-to-end contest scenarios for the TrueSkill schedule.
//!
//! Reference values were computed with an independent double-precision
//! evaluation of the same schedule (5 rounds, β = 25/6, γ = 25/300,
//! ε from draw probability 0.1 over two players).

use skillgraph_core::{Player, Rating, RatingError, Team, TrueSkill, TrueSkillConfig};

use crate::{assert_close, default_system, newcomers_ranked, NEWCOMER_MU, NEWCOMER_SIGMA};

#[test]
fn two_player_win_is_symmetric_and_informative() {
    let mut players = newcomers_ranked(2);
    default_system()
        .adjust_players(&mut players)
        .expect("contest rated");

    let (winner, loser) = (players[0], players[1]);
    assert!(winner.mu > NEWCOMER_MU);
    assert!(loser.mu < NEWCOMER_MU);
    assert_close(
        winner.mu - NEWCOMER_MU,
        NEWCOMER_MU - loser.mu,
        1e-9,
        "symmetric mean shift",
    );
    assert!(winner.sigma < NEWCOMER_SIGMA);
    assert!(loser.sigma < NEWCOMER_SIGMA);

    assert_close(winner.mu, 29.395_831_692_991_52, 1e-6, "winner mu");
    assert_close(winner.sigma, 7.171_475_807_009_22, 1e-6, "winner sigma");
}

#[test]
fn draw_between_equals_keeps_means_and_shrinks_sigma() {
    let mut players = vec![
        Player::new(NEWCOMER_MU, NEWCOMER_SIGMA, 1),
        Player::new(NEWCOMER_MU, NEWCOMER_SIGMA, 1),
    ];
    default_system()
        .adjust_players(&mut players)
        .expect("contest rated");

    assert_close(players[0].mu, players[1].mu, 1e-9, "equal means");
    assert_close(players[0].mu, NEWCOMER_MU, 1e-9, "unchanged mean");
    assert_close(players[0].sigma, players[1].sigma, 1e-12, "equal sigma");
    assert!(players[0].sigma < NEWCOMER_SIGMA);
}

#[test]
fn draw_confines_difference_more_than_a_win() {
    // With ε ≈ 0.74 a draw pins |skill difference| to a narrow window, which
    // is a sharper observation than "one side is ahead by more than ε".
    let ts = default_system();
    let mut decisive = newcomers_ranked(2);
    let mut drawn = vec![
        Player::new(NEWCOMER_MU, NEWCOMER_SIGMA, 1),
        Player::new(NEWCOMER_MU, NEWCOMER_SIGMA, 1),
    ];
    ts.adjust_players(&mut decisive).expect("decisive");
    ts.adjust_players(&mut drawn).expect("drawn");

    assert_close(drawn[0].sigma, 6.457_515_683_245_05, 1e-6, "draw sigma");
    assert!(drawn[0].sigma < decisive[0].sigma);
}

#[test]
fn four_player_ladder_orders_means() {
    let mut players = newcomers_ranked(4);
    default_system()
        .adjust_players(&mut players)
        .expect("contest rated");

    for pair in players.windows(2) {
        assert!(
            pair[0].mu > pair[1].mu,
            "rank {} should end above rank {}",
            pair[0].rank,
            pair[1].rank
        );
    }

    // Mirror symmetry: first/last and second/third share sigma and shift.
    assert_close(players[0].sigma, players[3].sigma, 1e-3, "outer sigma");
    assert_close(players[1].sigma, players[2].sigma, 1e-3, "inner sigma");
    assert_close(
        players[0].mu + players[3].mu,
        2.0 * NEWCOMER_MU,
        1e-2,
        "outer mirror",
    );
    assert_close(
        players[1].mu + players[2].mu,
        2.0 * NEWCOMER_MU,
        1e-2,
        "inner mirror",
    );
    // Inner players get evidence from both neighbours.
    assert!(players[1].sigma < players[0].sigma);

    assert_close(players[0].mu, 33.207_789_326_863_9, 1e-5, "first mu");
    assert_close(players[3].mu, 16.793_374_093_106_96, 1e-5, "last mu");
}

#[test]
fn repeated_outcome_keeps_drifting_the_same_way() {
    let ts = default_system();
    let mut players = newcomers_ranked(2);
    let mut history = vec![(players[0].mu, players[1].mu)];
    for _ in 0..4 {
        ts.adjust_players(&mut players).expect("contest rated");
        history.push((players[0].mu, players[1].mu));
    }

    for step in history.windows(2) {
        assert!(step[1].0 > step[0].0, "winner mean must keep rising");
        assert!(step[1].1 < step[0].1, "loser mean must keep falling");
    }
    assert_close(history[2].0, 31.229_628_995_525_41, 1e-5, "second winner mu");
    assert_close(history[2].1, 18.770_371_004_474_6, 1e-5, "second loser mu");
}

#[test]
fn tied_runners_up_end_close_together() {
    let mut players = vec![
        Player::new(NEWCOMER_MU, NEWCOMER_SIGMA, 2),
        Player::new(NEWCOMER_MU, NEWCOMER_SIGMA, 1),
        Player::new(NEWCOMER_MU, NEWCOMER_SIGMA, 2),
    ];
    default_system()
        .adjust_players(&mut players)
        .expect("contest rated");

    assert_close(players[1].mu, 30.109_298_728_195_3, 1e-5, "winner mu");
    assert_close(players[0].mu, players[2].mu, 1e-2, "tied means");
    assert!(players[0].mu < players[1].mu);
}

#[test]
fn upset_moves_favourite_down() {
    let mut players = vec![Player::new(40.0, 2.0, 2), Player::new(10.0, 2.0, 1)];
    default_system()
        .adjust_players(&mut players)
        .expect("contest rated");

    assert!(players[0].mu < 40.0);
    assert!(players[1].mu > 10.0);
    assert_close(players[0].mu, 36.997_179_965_401_17, 1e-5, "favourite mu");
    assert_close(players[1].mu, 13.002_820_034_598_83, 1e-5, "underdog mu");
}

#[test]
fn larger_contest_stays_finite() {
    let mut players: Vec<Player> = (0..64)
        .map(|idx| {
            let spread = (idx % 7) as f64;
            Player::new(15.0 + 2.0 * spread, 3.0 + spread / 2.0, idx as u32 / 3 + 1)
        })
        .collect();
    let diagnostics = default_system()
        .adjust_players(&mut players)
        .expect("contest rated");

    assert!(players
        .iter()
        .all(|p| p.mu.is_finite() && p.sigma.is_finite() && p.sigma > 0.0));
    assert_eq!(diagnostics.rounds_run, 5);
    assert!(diagnostics.final_max_delta.is_finite());
}

#[test]
fn team_contest_rewards_every_winning_member() {
    let strong = Rating::new(30.0, 5.0);
    let weak = Rating::new(20.0, 5.0);
    let mut teams = vec![
        Team::new(2, vec![strong, weak]),
        Team::new(1, vec![weak, weak, weak]),
    ];
    default_system().adjust_teams(&mut teams).expect("teams rated");

    assert!(teams[0].members.iter().all(|r| r.sigma < 5.0));
    assert!(teams[0].members[0].mu < 30.0);
    assert!(teams[0].members[1].mu < 20.0);
    assert!(teams[1].members.iter().all(|r| r.mu > 20.0));
}

#[test]
fn empty_team_is_rejected() {
    let mut teams = vec![
        Team::new(1, vec![]),
        Team::new(2, vec![Rating::new(NEWCOMER_MU, NEWCOMER_SIGMA)]),
    ];
    assert!(matches!(
        default_system().adjust_teams(&mut teams),
        Err(RatingError::InvalidContest(_))
    ));
}

#[test]
fn custom_constants_change_the_update() {
    let mut noisy = TrueSkillConfig::default();
    noisy.beta *= 4.0;
    let noisy = TrueSkill::new(noisy).expect("valid config");

    let mut sharp = newcomers_ranked(2);
    let mut vague = newcomers_ranked(2);
    default_system().adjust_players(&mut sharp).expect("sharp");
    noisy.adjust_players(&mut vague).expect("vague");

    // Noisier performances make the same outcome less informative.
    assert!(vague[0].mu - NEWCOMER_MU < sharp[0].mu - NEWCOMER_MU);
    assert!(vague[0].sigma > sharp[0].sigma);
}
