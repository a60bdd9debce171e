//! Per-contest message-passing schedule.
//!
//! For one contest the schedule builds a chain-shaped factor graph:
//!
//! ```text
//! prior ─ skill ─ likelihood(β²) ─ perf ─┐
//!                                        sum ─ team ─┐
//! prior ─ skill ─ likelihood(β²) ─ perf ─┘           diff ─ truncate(win|draw)
//!                                              team ─┘
//! ```
//!
//! Teams are sorted by rank and each adjacent pair is linked through a
//! difference variable `team[k] − team[k+1]` carrying a win or draw
//! truncation. The difference chain has loops once there are three or more
//! teams, so it is iterated a fixed number of rounds instead of solved
//! exactly. The graph is dropped as soon as skill posteriors are read out.

use crate::engine::config::{Constants, TrueSkillConfig};
use crate::engine::errors::RatingError;
use crate::engine::factor_graph::{FactorGraph, FactorId, VariableId};
use crate::engine::factors::TruncateKind;
use crate::engine::gaussian::Gaussian;
use crate::engine::normal;

/// A skill estimate (mean and standard deviation).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rating {
    pub mu: f64,
    pub sigma: f64,
}

impl Rating {
    pub const fn new(mu: f64, sigma: f64) -> Self {
        Self { mu, sigma }
    }

    pub fn to_gaussian(self) -> Gaussian {
        Gaussian::from_mean_sigma(self.mu, self.sigma)
    }
}

/// A competitor's rating together with their rank in the current contest.
///
/// Lower rank is better; equal ranks are a draw.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Player {
    pub mu: f64,
    pub sigma: f64,
    pub rank: u32,
}

impl Player {
    pub const fn new(mu: f64, sigma: f64, rank: u32) -> Self {
        Self { mu, sigma, rank }
    }

    pub fn rating(&self) -> Rating {
        Rating::new(self.mu, self.sigma)
    }
}

/// A team whose performance is the sum of its members' performances.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Team {
    pub rank: u32,
    pub members: Vec<Rating>,
}

impl Team {
    pub fn new(rank: u32, members: Vec<Rating>) -> Self {
        Self { rank, members }
    }
}

/// What one schedule run did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleDiagnostics {
    /// Rounds executed over the difference chain.
    pub rounds_run: usize,
    /// Variables created for the contest.
    pub variable_count: usize,
    /// Factors created for the contest.
    pub factor_count: usize,
    /// Max truncation-message change in the last round.
    pub final_max_delta: f64,
    /// Truncation updates that used an asymptotic correction.
    pub asymptotic_corrections: usize,
}

/// The TrueSkill-style rating system: validated constants plus the schedule.
#[derive(Debug, Clone)]
pub struct TrueSkill {
    config: TrueSkillConfig,
    constants: Constants,
}

impl TrueSkill {
    /// Verifies the normal primitives and derives constants from `config`.
    ///
    /// Any error here is a [`RatingError::Configuration`] and must abort before
    /// a single contest is rated.
    pub fn new(config: TrueSkillConfig) -> Result<Self, RatingError> {
        normal::verify_primitives()?;
        let constants = Constants::derive(&config)?;
        tracing::debug!(
            beta = constants.beta,
            epsilon = constants.epsilon,
            gamma = constants.gamma,
            rounds = constants.rounds,
            "derived rating constants"
        );
        Ok(Self { config, constants })
    }

    pub fn config(&self) -> &TrueSkillConfig {
        &self.config
    }

    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    /// Rates one contest of individual players and writes posteriors back.
    ///
    /// The slice keeps its order; players are ranked through a stable sort
    /// of indices. On error no player is modified.
    pub fn adjust_players(
        &self,
        players: &mut [Player],
    ) -> Result<ScheduleDiagnostics, RatingError> {
        let entries: Vec<(u32, Vec<Rating>)> = players
            .iter()
            .map(|p| (p.rank, vec![p.rating()]))
            .collect();
        let (posteriors, diagnostics) = self.run(&entries)?;
        for (player, posterior) in players.iter_mut().zip(posteriors) {
            player.mu = posterior[0].mu;
            player.sigma = posterior[0].sigma;
        }
        Ok(diagnostics)
    }

    /// Rates one contest of teams and writes member posteriors back.
    pub fn adjust_teams(&self, teams: &mut [Team]) -> Result<ScheduleDiagnostics, RatingError> {
        let entries: Vec<(u32, Vec<Rating>)> = teams
            .iter()
            .map(|t| (t.rank, t.members.clone()))
            .collect();
        let (posteriors, diagnostics) = self.run(&entries)?;
        for (team, posterior) in teams.iter_mut().zip(posteriors) {
            team.members = posterior;
        }
        Ok(diagnostics)
    }

    /// Builds, solves and drops the contest graph; returns posteriors in input order.
    fn run(
        &self,
        entries: &[(u32, Vec<Rating>)],
    ) -> Result<(Vec<Vec<Rating>>, ScheduleDiagnostics), RatingError> {
        validate_contest(entries)?;

        let mut order: Vec<usize> = (0..entries.len()).collect();
        order.sort_by_key(|&idx| entries[idx].0);

        let c = &self.constants;
        let member_count: usize = entries.iter().map(|(_, m)| m.len()).sum();
        let team_count = entries.len();
        let mut graph = FactorGraph::with_capacity(
            2 * member_count + 2 * team_count - 1,
            2 * member_count + 3 * team_count - 2,
        );

        // Variables and factors, in rank order.
        let mut skills: Vec<Vec<VariableId>> = Vec::with_capacity(team_count);
        let mut priors: Vec<FactorId> = Vec::with_capacity(member_count);
        let mut likelihoods: Vec<FactorId> = Vec::with_capacity(member_count);
        let mut team_sums: Vec<FactorId> = Vec::with_capacity(team_count);
        let mut team_vars: Vec<VariableId> = Vec::with_capacity(team_count);

        for &idx in &order {
            let members = &entries[idx].1;
            let mut team_skills = Vec::with_capacity(members.len());
            let mut team_perfs = Vec::with_capacity(members.len());
            for rating in members {
                let skill = graph.add_variable();
                let perf = graph.add_variable();
                let prior_sigma = (rating.sigma * rating.sigma + c.gamma_sq()).sqrt();
                priors.push(graph.add_prior(skill, Gaussian::from_mean_sigma(rating.mu, prior_sigma))?);
                likelihoods.push(graph.add_likelihood(skill, perf, c.beta_sq())?);
                team_skills.push(skill);
                team_perfs.push(perf);
            }
            let team = graph.add_variable();
            let coeffs = vec![1.0; team_perfs.len()];
            team_sums.push(graph.add_sum(team, &team_perfs, &coeffs)?);
            team_vars.push(team);
            skills.push(team_skills);
        }

        let mut diffs: Vec<FactorId> = Vec::with_capacity(team_count - 1);
        let mut truncations: Vec<FactorId> = Vec::with_capacity(team_count - 1);
        for k in 0..team_count - 1 {
            let diff = graph.add_variable();
            diffs.push(graph.add_sum(diff, &[team_vars[k], team_vars[k + 1]], &[1.0, -1.0])?);
            let kind = if entries[order[k]].0 == entries[order[k + 1]].0 {
                TruncateKind::Draw
            } else {
                TruncateKind::Win
            };
            truncations.push(graph.add_truncate(diff, c.epsilon, kind)?);
        }

        // Downward pass: skill → performance → team.
        for &f in &priors {
            graph.start_prior(f)?;
        }
        for &f in &likelihoods {
            graph.update_likelihood_value(f)?;
        }
        for &f in &team_sums {
            graph.update_sum(f)?;
        }

        // Bounded loopy iteration over the difference chain.
        let mut final_max_delta = 0.0_f64;
        let mut asymptotic_corrections = 0;
        for round in 0..c.rounds {
            for &f in &diffs {
                graph.update_sum(f)?;
            }
            let mut max_delta = 0.0_f64;
            for &f in &truncations {
                let update = graph.update_truncate(f)?;
                max_delta = max_delta.max(update.message_delta);
                asymptotic_corrections += usize::from(update.asymptotic);
            }
            for &f in &diffs {
                graph.update_sum_term(f, 0)?;
                graph.update_sum_term(f, 1)?;
            }
            tracing::trace!(round, max_delta, "difference chain round");
            final_max_delta = max_delta;
        }

        // Upward pass: team → performance → skill.
        for (&f, team_skills) in team_sums.iter().zip(&skills) {
            for member in 0..team_skills.len() {
                graph.update_sum_term(f, member)?;
            }
        }
        for &f in &likelihoods {
            graph.update_likelihood_mean(f)?;
        }

        // Read out in rank order, then scatter back to input order.
        let mut posteriors: Vec<Vec<Rating>> = vec![Vec::new(); team_count];
        for (&idx, team_skills) in order.iter().zip(&skills) {
            let mut ratings = Vec::with_capacity(team_skills.len());
            for &skill in team_skills {
                let belief = graph.belief(skill)?;
                let rating = Rating::new(belief.mean(), belief.sigma());
                if !rating.mu.is_finite() || !rating.sigma.is_finite() || rating.sigma <= 0.0 {
                    tracing::warn!(
                        team = idx,
                        mu = rating.mu,
                        sigma = rating.sigma,
                        "degenerate posterior, contest discarded"
                    );
                    return Err(RatingError::Numerical(format!(
                        "posterior for team {} is degenerate (mu={}, sigma={})",
                        idx, rating.mu, rating.sigma
                    )));
                }
                ratings.push(rating);
            }
            posteriors[idx] = ratings;
        }

        let diagnostics = ScheduleDiagnostics {
            rounds_run: c.rounds,
            variable_count: graph.variable_count(),
            factor_count: graph.factor_count(),
            final_max_delta,
            asymptotic_corrections,
        };
        tracing::debug!(
            teams = team_count,
            members = member_count,
            rounds = diagnostics.rounds_run,
            final_max_delta,
            "contest rated"
        );
        Ok((posteriors, diagnostics))
    }
}

fn validate_contest(entries: &[(u32, Vec<Rating>)]) -> Result<(), RatingError> {
    if entries.len() < 2 {
        return Err(RatingError::InvalidContest(format!(
            "a contest needs at least two participants, got {}",
            entries.len()
        )));
    }
    for (idx, (_, members)) in entries.iter().enumerate() {
        if members.is_empty() {
            return Err(RatingError::InvalidContest(format!(
                "participant {} has no members",
                idx
            )));
        }
        for rating in members {
            if !rating.mu.is_finite() || !rating.sigma.is_finite() || rating.sigma <= 0.0 {
                return Err(RatingError::InvalidContest(format!(
                    "participant {} has an invalid prior (mu={}, sigma={})",
                    idx, rating.mu, rating.sigma
                )));
            }
        }
    }
    Ok(())
}
