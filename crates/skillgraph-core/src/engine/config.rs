//! Rating-system configuration and derived constants.

use crate::engine::errors::RatingError;
use crate::engine::gaussian::Gaussian;
use crate::engine::normal;

/// Default newcomer mean.
pub const DEFAULT_INITIAL_MU: f64 = 25.0;

/// Default probability that two adjacent competitors draw.
pub const DEFAULT_DRAW_PROBABILITY: f64 = 0.1;

/// Default message-passing rounds per contest.
pub const DEFAULT_ROUNDS: usize = 5;

/// Configuration for the TrueSkill-style schedule.
///
/// The defaults follow from a newcomer prior of `N(25, (25/3)²)`: performance
/// noise β is half the newcomer sigma and per-contest skill drift γ is one
/// percent of it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrueSkillConfig {
    /// Newcomer mean.
    pub initial_mu: f64,
    /// Newcomer standard deviation.
    pub initial_sigma: f64,
    /// Performance noise scale β.
    pub beta: f64,
    /// Skill drift γ added to every prior before a contest.
    pub gamma: f64,
    /// Probability of a draw between adjacent competitors, in (0, 1).
    pub draw_probability: f64,
    /// Player count used when scaling the draw margin.
    pub draw_margin_players: f64,
    /// Forward/backward rounds over the difference chain.
    pub rounds: usize,
}

impl Default for TrueSkillConfig {
    fn default() -> Self {
        Self::from_initial_mu(DEFAULT_INITIAL_MU)
    }
}

impl TrueSkillConfig {
    /// Derives every default from a newcomer mean.
    pub fn from_initial_mu(initial_mu: f64) -> Self {
        let initial_sigma = initial_mu / 3.0;
        Self {
            initial_mu,
            initial_sigma,
            beta: initial_sigma / 2.0,
            gamma: initial_sigma / 100.0,
            draw_probability: DEFAULT_DRAW_PROBABILITY,
            draw_margin_players: 2.0,
            rounds: DEFAULT_ROUNDS,
        }
    }

    /// Newcomer prior as a [`Gaussian`].
    pub fn newcomer(&self) -> Gaussian {
        Gaussian::from_mean_sigma(self.initial_mu, self.initial_sigma)
    }

    /// Checks every field and returns the config unchanged when valid.
    pub fn validate(self) -> Result<Self, RatingError> {
        if !self.initial_mu.is_finite() {
            return Err(RatingError::Configuration(
                "initial_mu must be finite".into(),
            ));
        }
        positive("initial_sigma", self.initial_sigma)?;
        positive("beta", self.beta)?;
        positive("gamma", self.gamma)?;
        positive("draw_margin_players", self.draw_margin_players)?;
        if !(self.draw_probability > 0.0 && self.draw_probability < 1.0) {
            return Err(RatingError::Configuration(format!(
                "draw_probability must be in (0, 1), got {}",
                self.draw_probability
            )));
        }
        if self.rounds == 0 {
            return Err(RatingError::Configuration("rounds must be > 0".into()));
        }
        Ok(self)
    }
}

fn positive(name: &str, value: f64) -> Result<(), RatingError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RatingError::Configuration(format!(
            "{} must be finite and > 0, got {}",
            name, value
        )))
    }
}

/// Constants used by every contest schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constants {
    /// Performance noise scale β.
    pub beta: f64,
    /// Draw margin ε.
    pub epsilon: f64,
    /// Skill drift γ.
    pub gamma: f64,
    /// Rounds over the difference chain.
    pub rounds: usize,
}

impl Constants {
    /// Validates `config` and derives β, ε and γ.
    ///
    /// `ε = ppf((p + 1) / 2) · √n · β` for draw probability `p` and
    /// `n = draw_margin_players`. All three must be strictly positive; this is
    /// the only place that is checked.
    pub fn derive(config: &TrueSkillConfig) -> Result<Self, RatingError> {
        let config = config.validate()?;
        let epsilon = draw_margin(
            config.draw_probability,
            config.beta,
            config.draw_margin_players,
        );
        positive("epsilon", epsilon)?;
        Ok(Self {
            beta: config.beta,
            epsilon,
            gamma: config.gamma,
            rounds: config.rounds,
        })
    }

    #[inline]
    pub fn beta_sq(&self) -> f64 {
        self.beta * self.beta
    }

    #[inline]
    pub fn gamma_sq(&self) -> f64 {
        self.gamma * self.gamma
    }
}

/// Draw margin for draw probability `p` between `total_players` competitors.
pub fn draw_margin(p: f64, beta: f64, total_players: f64) -> f64 {
    normal::ppf((p + 1.0) / 2.0) * total_players.sqrt() * beta
}
