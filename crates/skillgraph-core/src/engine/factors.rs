//! Factor shapes and their message updates.
//!
//! Four shapes are enough for ranking updates:
//!
//! - **Prior**: injects a fixed belief into one variable, once.
//! - **Likelihood**: `value ≈ mean + N(0, variance)`, updatable in both directions.
//! - **Sum**: `sum = Σ aᵢ·termᵢ`, updatable toward the sum or toward any term.
//! - **Truncate**: moment-matched observation of a win (`x > ε`) or a draw
//!   (`|x| < ε`) on a difference variable.
//!
//! Every update reads the *leave-one-out* belief of its source variables,
//! `belief / message(self)`, i.e. what all other factors currently say.

use smallvec::{smallvec, SmallVec};

use crate::engine::errors::RatingError;
use crate::engine::factor_graph::{FactorGraph, FactorId, VariableId};
use crate::engine::gaussian::Gaussian;
use crate::engine::normal;

/// Which observation a truncation factor encodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncateKind {
    /// The difference exceeds the draw margin.
    Win,
    /// The difference lies within the draw margin.
    Draw,
}

#[derive(Debug, Clone)]
pub struct PriorFactor {
    pub variable: VariableId,
    pub gaussian: Gaussian,
}

#[derive(Debug, Clone)]
pub struct LikelihoodFactor {
    pub mean: VariableId,
    pub value: VariableId,
    pub variance: f64,
}

#[derive(Debug, Clone)]
pub struct SumFactor {
    pub sum: VariableId,
    pub terms: SmallVec<[VariableId; 2]>,
    pub coeffs: SmallVec<[f64; 2]>,
}

#[derive(Debug, Clone)]
pub struct TruncateFactor {
    pub variable: VariableId,
    pub epsilon: f64,
    pub kind: TruncateKind,
}

/// A factor node. Variants share one interface: the variables they touch.
#[derive(Debug, Clone)]
pub enum Factor {
    Prior(PriorFactor),
    Likelihood(LikelihoodFactor),
    Sum(SumFactor),
    Truncate(TruncateFactor),
}

impl Factor {
    /// Variables this factor is attached to, in attachment order.
    pub fn variables(&self) -> SmallVec<[VariableId; 4]> {
        match self {
            Factor::Prior(f) => smallvec![f.variable],
            Factor::Likelihood(f) => smallvec![f.mean, f.value],
            Factor::Sum(f) => {
                let mut vars = SmallVec::with_capacity(f.terms.len() + 1);
                vars.push(f.sum);
                vars.extend(f.terms.iter().copied());
                vars
            }
            Factor::Truncate(f) => smallvec![f.variable],
        }
    }

    /// Short name of the factor shape.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Factor::Prior(_) => "prior",
            Factor::Likelihood(_) => "likelihood",
            Factor::Sum(_) => "sum",
            Factor::Truncate(f) => match f.kind {
                TruncateKind::Win => "truncate-win",
                TruncateKind::Draw => "truncate-draw",
            },
        }
    }
}

/// Outcome of one truncation update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TruncateUpdate {
    /// Max absolute change of the stored message's natural parameters.
    pub message_delta: f64,
    /// The correction function returned its asymptotic limit.
    pub asymptotic: bool,
}

impl FactorGraph {
    /// Adds a prior factor on `variable`.
    pub fn add_prior(
        &mut self,
        variable: VariableId,
        gaussian: Gaussian,
    ) -> Result<FactorId, RatingError> {
        self.insert_factor(Factor::Prior(PriorFactor { variable, gaussian }))
    }

    /// Adds `value ≈ mean + N(0, variance)`.
    pub fn add_likelihood(
        &mut self,
        mean: VariableId,
        value: VariableId,
        variance: f64,
    ) -> Result<FactorId, RatingError> {
        self.insert_factor(Factor::Likelihood(LikelihoodFactor {
            mean,
            value,
            variance,
        }))
    }

    /// Adds `sum = Σ coeffs[i]·terms[i]`.
    pub fn add_sum(
        &mut self,
        sum: VariableId,
        terms: &[VariableId],
        coeffs: &[f64],
    ) -> Result<FactorId, RatingError> {
        if terms.is_empty() || terms.len() != coeffs.len() {
            return Err(RatingError::Internal(format!(
                "sum factor needs matching non-empty terms and coefficients (got {} and {})",
                terms.len(),
                coeffs.len()
            )));
        }
        if coeffs.iter().any(|&a| a == 0.0 || !a.is_finite()) {
            return Err(RatingError::Internal(
                "sum factor coefficients must be finite and non-zero".into(),
            ));
        }
        self.insert_factor(Factor::Sum(SumFactor {
            sum,
            terms: SmallVec::from_slice(terms),
            coeffs: SmallVec::from_slice(coeffs),
        }))
    }

    /// Adds a win or draw truncation on a difference variable.
    pub fn add_truncate(
        &mut self,
        variable: VariableId,
        epsilon: f64,
        kind: TruncateKind,
    ) -> Result<FactorId, RatingError> {
        self.insert_factor(Factor::Truncate(TruncateFactor {
            variable,
            epsilon,
            kind,
        }))
    }

    /// Injects a prior's belief into its variable.
    pub fn start_prior(&mut self, id: FactorId) -> Result<(), RatingError> {
        let (variable, gaussian) = match self.factor(id)? {
            Factor::Prior(f) => (f.variable, f.gaussian),
            other => return Err(wrong_kind(id, "prior", other)),
        };
        self.variable_mut(variable)?.update_value(id, gaussian)
    }

    /// Sends the likelihood message toward the value (performance ← skill + noise).
    pub fn update_likelihood_value(&mut self, id: FactorId) -> Result<(), RatingError> {
        let (mean, value, variance) = self.likelihood(id)?;
        self.push_likelihood(id, mean, value, variance)
    }

    /// Sends the likelihood message toward the mean (skill ← performance − noise).
    pub fn update_likelihood_mean(&mut self, id: FactorId) -> Result<(), RatingError> {
        let (mean, value, variance) = self.likelihood(id)?;
        self.push_likelihood(id, value, mean, variance)
    }

    /// Recomputes the message toward the sum variable.
    pub fn update_sum(&mut self, id: FactorId) -> Result<(), RatingError> {
        let (sum, sources) = match self.factor(id)? {
            Factor::Sum(f) => {
                let sources: SmallVec<[(VariableId, f64); 4]> = f
                    .terms
                    .iter()
                    .copied()
                    .zip(f.coeffs.iter().copied())
                    .collect();
                (f.sum, sources)
            }
            other => return Err(wrong_kind(id, "sum", other)),
        };
        let message = self.linear_message(id, &sources)?;
        self.variable_mut(sum)?.update_message(id, message)
    }

    /// Recomputes the message toward term `index`.
    ///
    /// The relation is solved for that term: the sum enters with coefficient
    /// `1/aₖ` and every other term `j` with `−aⱼ/aₖ`.
    pub fn update_sum_term(&mut self, id: FactorId, index: usize) -> Result<(), RatingError> {
        let (target, sources) = match self.factor(id)? {
            Factor::Sum(f) => {
                let target = *f.terms.get(index).ok_or_else(|| {
                    RatingError::Internal(format!(
                        "sum factor {:?} has no term {} ({} terms)",
                        id,
                        index,
                        f.terms.len()
                    ))
                })?;
                let pivot = f.coeffs[index];
                let sources: SmallVec<[(VariableId, f64); 4]> = f
                    .terms
                    .iter()
                    .zip(f.coeffs.iter())
                    .enumerate()
                    .map(|(i, (&term, &coeff))| {
                        if i == index {
                            (f.sum, 1.0 / pivot)
                        } else {
                            (term, -coeff / pivot)
                        }
                    })
                    .collect();
                (target, sources)
            }
            other => return Err(wrong_kind(id, "sum", other)),
        };
        let message = self.linear_message(id, &sources)?;
        self.variable_mut(target)?.update_message(id, message)
    }

    /// Applies a truncation factor's moment-matched correction.
    pub fn update_truncate(&mut self, id: FactorId) -> Result<TruncateUpdate, RatingError> {
        let (variable, epsilon, kind) = match self.factor(id)? {
            Factor::Truncate(f) => (f.variable, f.epsilon, f.kind),
            other => return Err(wrong_kind(id, "truncate", other)),
        };

        let var = self.variable(variable)?;
        let x = var.belief();
        let fx = var.message(id)?;
        let c = x.pi - fx.pi;
        let d = x.tau - fx.tau;
        if !c.is_finite() || c <= 0.0 || !d.is_finite() {
            return Err(RatingError::Numerical(format!(
                "truncation factor {:?}: leave-one-out precision {} is not positive",
                id, c
            )));
        }

        let sqrt_c = c.sqrt();
        let t = d / sqrt_c;
        let e = epsilon * sqrt_c;
        let (v, w, asymptotic) = match kind {
            TruncateKind::Win => (
                normal::v_win(t, e),
                normal::w_win(t, e),
                normal::win_is_asymptotic(t, e),
            ),
            TruncateKind::Draw => (
                normal::v_draw(t, e),
                normal::w_draw(t, e),
                normal::draw_is_asymptotic(t, e),
            ),
        };
        if asymptotic {
            tracing::warn!(
                factor = id.0,
                t,
                e,
                ?kind,
                "truncation correction fell back to its asymptotic limit"
            );
        }

        // 1 − W is the truncated variance ratio; keep it strictly positive.
        let one_minus_w = (1.0 - w).max(f64::EPSILON);
        let value = Gaussian::from_precision(c / one_minus_w, (d + sqrt_c * v) / one_minus_w);

        let var = self.variable_mut(variable)?;
        var.update_value(id, value)?;
        let message_delta = var.message(id)?.max_abs_delta(&fx);
        Ok(TruncateUpdate {
            message_delta,
            asymptotic,
        })
    }

    fn likelihood(&self, id: FactorId) -> Result<(VariableId, VariableId, f64), RatingError> {
        match self.factor(id)? {
            Factor::Likelihood(f) => Ok((f.mean, f.value, f.variance)),
            other => Err(wrong_kind(id, "likelihood", other)),
        }
    }

    /// `a = 1 / (1 + variance·Δπ)`, message `(a·Δπ, a·Δτ)` from `from` to `to`.
    fn push_likelihood(
        &mut self,
        id: FactorId,
        from: VariableId,
        to: VariableId,
        variance: f64,
    ) -> Result<(), RatingError> {
        let source = self.variable(from)?;
        let y = source.belief();
        let fy = source.message(id)?;
        let d_pi = y.pi - fy.pi;
        let d_tau = y.tau - fy.tau;
        let a = 1.0 / (1.0 + variance * d_pi);
        let message = Gaussian::from_precision(a * d_pi, a * d_tau);
        self.variable_mut(to)?.update_message(id, message)
    }

    /// Message for `Σ aᵢ·yᵢ` given the leave-one-out beliefs of the `yᵢ`.
    ///
    /// ```text
    /// π_new = 1 / Σ aᵢ² / (π_yᵢ − π_fyᵢ)
    /// τ_new = π_new · Σ aᵢ·(τ_yᵢ − τ_fyᵢ) / (π_yᵢ − π_fyᵢ)
    /// ```
    fn linear_message(
        &self,
        id: FactorId,
        sources: &[(VariableId, f64)],
    ) -> Result<Gaussian, RatingError> {
        let mut sum_pi = 0.0;
        let mut sum_tau = 0.0;
        for &(var, a) in sources {
            let source = self.variable(var)?;
            let y = source.belief();
            let fy = source.message(id)?;
            let d_pi = y.pi - fy.pi;
            sum_pi += a * a / d_pi;
            sum_tau += a * (y.tau - fy.tau) / d_pi;
        }
        let new_pi = 1.0 / sum_pi;
        Ok(Gaussian::from_precision(new_pi, new_pi * sum_tau))
    }
}

fn wrong_kind(id: FactorId, expected: &str, actual: &Factor) -> RatingError {
    RatingError::Internal(format!(
        "factor {:?} is a {} factor, expected {}",
        id,
        actual.kind_name(),
        expected
    ))
}
