//! Persistent ratings across a chronological sequence of contests.
//!
//! The factor graph lives for one contest; the ledger is what survives
//! between contests. It resolves player identities to their current
//! [`Rating`], seeds unseen players with the newcomer prior, runs the
//! schedule, and commits every posterior of a contest or none of them.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::engine::errors::RatingError;
use crate::engine::schedule::{Player, Rating, ScheduleDiagnostics, TrueSkill};

/// One contest's effect on a player.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RatingEvent {
    /// Zero-based index of the contest in processing order.
    pub contest_index: usize,
    pub rank: u32,
    /// Posterior mean after the contest.
    pub mu: f64,
    /// Posterior standard deviation after the contest.
    pub sigma: f64,
}

/// A player's current rating and the contests that produced it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerRecord {
    pub rating: Rating,
    pub history: Vec<RatingEvent>,
}

/// Identity-keyed ratings evolving contest by contest.
#[derive(Debug, Clone)]
pub struct RatingLedger {
    system: TrueSkill,
    newcomer: Rating,
    players: FxHashMap<String, PlayerRecord>,
    contests_processed: usize,
}

impl RatingLedger {
    /// Creates an empty ledger seeding newcomers from the system's config.
    pub fn new(system: TrueSkill) -> Self {
        let config = system.config();
        let newcomer = Rating::new(config.initial_mu, config.initial_sigma);
        Self::with_newcomer(system, newcomer)
    }

    /// Creates an empty ledger with an explicit newcomer prior.
    pub fn with_newcomer(system: TrueSkill, newcomer: Rating) -> Self {
        Self {
            system,
            newcomer,
            players: FxHashMap::default(),
            contests_processed: 0,
        }
    }

    pub fn system(&self) -> &TrueSkill {
        &self.system
    }

    pub fn newcomer(&self) -> Rating {
        self.newcomer
    }

    /// Number of contests committed so far.
    pub fn contests_processed(&self) -> usize {
        self.contests_processed
    }

    /// Number of distinct players seen.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Current rating of `player`, if they have competed.
    pub fn rating(&self, player: &str) -> Option<Rating> {
        self.players.get(player).map(|record| record.rating)
    }

    pub fn record(&self, player: &str) -> Option<&PlayerRecord> {
        self.players.get(player)
    }

    /// Iterates all players in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlayerRecord)> + '_ {
        self.players
            .iter()
            .map(|(name, record)| (name.as_str(), record))
    }

    /// Rates one contest given `(identity, rank)` standings.
    ///
    /// Contests must be fed in chronological order: each one starts from the
    /// posteriors the previous ones committed. A player may appear only once
    /// per contest. On error the ledger is unchanged.
    pub fn process_contest<S: AsRef<str>>(
        &mut self,
        standings: &[(S, u32)],
    ) -> Result<ScheduleDiagnostics, RatingError> {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut players = Vec::with_capacity(standings.len());
        for (name, rank) in standings {
            let name = name.as_ref();
            if !seen.insert(name) {
                return Err(RatingError::InvalidContest(format!(
                    "player '{}' appears twice in contest {}",
                    name, self.contests_processed
                )));
            }
            let prior = self.rating(name).unwrap_or(self.newcomer);
            players.push(Player::new(prior.mu, prior.sigma, *rank));
        }

        let diagnostics = self.system.adjust_players(&mut players)?;

        let contest_index = self.contests_processed;
        let mut newcomers = 0;
        for ((name, _), player) in standings.iter().zip(&players) {
            let event = RatingEvent {
                contest_index,
                rank: player.rank,
                mu: player.mu,
                sigma: player.sigma,
            };
            let record = self
                .players
                .entry(name.as_ref().to_string())
                .or_insert_with(|| {
                    newcomers += 1;
                    PlayerRecord {
                        rating: player.rating(),
                        history: Vec::new(),
                    }
                });
            record.rating = player.rating();
            record.history.push(event);
        }
        self.contests_processed += 1;

        tracing::info!(
            contest = contest_index,
            participants = standings.len(),
            newcomers,
            "contest applied to ledger"
        );
        Ok(diagnostics)
    }
}
