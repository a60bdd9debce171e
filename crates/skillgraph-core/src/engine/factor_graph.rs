//! Contest-scoped factor graph.
//!
//! A [`FactorGraph`] is the arena for one contest: it owns every
//! [`Variable`] and [`Factor`] created while rating that contest, hands out
//! `u32` handles to them, and releases all of them together when dropped.
//! Nothing in the graph outlives the schedule invocation that built it.
//!
//! ## Sum-product bookkeeping
//!
//! Each variable stores its current belief plus, for every attached factor,
//! the message that factor most recently sent. The belief is always the
//! product of the stored messages:
//!
//! ```text
//! belief = Π_f message(f)
//! ```
//!
//! [`Variable::update_message`] and [`Variable::update_value`] are the only
//! mutators and both preserve that product. Messages are keyed by
//! [`FactorId`], the factor's identity, never by its content.

use smallvec::SmallVec;

use crate::engine::errors::RatingError;
use crate::engine::factors::Factor;
use crate::engine::gaussian::Gaussian;

/// Handle of a variable inside a [`FactorGraph`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct VariableId(pub u32);

/// Stable identity of a factor inside a [`FactorGraph`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct FactorId(pub u32);

/// A latent quantity with its current belief and per-factor messages.
///
/// Skill, performance, team and difference variables all have at most four
/// attached factors, so the message list lives inline.
#[derive(Debug, Clone, Default)]
pub struct Variable {
    belief: Gaussian,
    messages: SmallVec<[(FactorId, Gaussian); 4]>,
}

impl Variable {
    /// Creates a variable with a vacuous belief and no attached factors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current belief (marginal).
    #[inline]
    pub fn belief(&self) -> Gaussian {
        self.belief
    }

    /// Number of attached factors.
    pub fn factor_count(&self) -> usize {
        self.messages.len()
    }

    /// Iterates `(factor, message)` slots in attachment order.
    pub fn messages(&self) -> impl Iterator<Item = (FactorId, Gaussian)> + '_ {
        self.messages.iter().copied()
    }

    /// Registers a vacuous message slot for `factor`.
    ///
    /// Each (variable, factor) edge is attached exactly once.
    pub fn attach_factor(&mut self, factor: FactorId) -> Result<(), RatingError> {
        if self.messages.iter().any(|(id, _)| *id == factor) {
            return Err(RatingError::Internal(format!(
                "factor {:?} is already attached to this variable",
                factor
            )));
        }
        self.messages.push((factor, Gaussian::VACUOUS));
        Ok(())
    }

    /// Last message stored for `factor`.
    pub fn message(&self, factor: FactorId) -> Result<Gaussian, RatingError> {
        self.messages
            .iter()
            .find(|(id, _)| *id == factor)
            .map(|(_, message)| *message)
            .ok_or_else(|| not_attached(factor))
    }

    /// Replaces the message from `factor`, swapping its contribution in the belief.
    ///
    /// `belief ← (belief / old) · message`
    pub fn update_message(
        &mut self,
        factor: FactorId,
        message: Gaussian,
    ) -> Result<(), RatingError> {
        let slot = self.slot_mut(factor)?;
        let old = *slot;
        *slot = message;
        self.belief = (self.belief / old) * message;
        Ok(())
    }

    /// Sets the belief directly and stores the message `factor` implies.
    ///
    /// `message ← (value · old) / belief`, then `belief ← value`.
    pub fn update_value(&mut self, factor: FactorId, value: Gaussian) -> Result<(), RatingError> {
        let belief = self.belief;
        let slot = self.slot_mut(factor)?;
        *slot = (value * *slot) / belief;
        self.belief = value;
        Ok(())
    }

    /// Product of all stored messages; equals [`belief`](Self::belief) up to rounding.
    pub fn messages_product(&self) -> Gaussian {
        self.messages
            .iter()
            .fold(Gaussian::VACUOUS, |acc, (_, message)| acc * *message)
    }

    fn slot_mut(&mut self, factor: FactorId) -> Result<&mut Gaussian, RatingError> {
        self.messages
            .iter_mut()
            .find(|(id, _)| *id == factor)
            .map(|(_, message)| message)
            .ok_or_else(|| not_attached(factor))
    }
}

fn not_attached(factor: FactorId) -> RatingError {
    RatingError::Internal(format!(
        "factor {:?} is not attached to this variable",
        factor
    ))
}

/// Arena holding every variable and factor of one contest.
#[derive(Debug, Clone, Default)]
pub struct FactorGraph {
    variables: Vec<Variable>,
    factors: Vec<Factor>,
}

impl FactorGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty graph with room for the given node counts.
    pub fn with_capacity(variables: usize, factors: usize) -> Self {
        Self {
            variables: Vec::with_capacity(variables),
            factors: Vec::with_capacity(factors),
        }
    }

    /// Adds a variable with a vacuous belief.
    pub fn add_variable(&mut self) -> VariableId {
        let id = VariableId(self.variables.len() as u32);
        self.variables.push(Variable::new());
        id
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn factor_count(&self) -> usize {
        self.factors.len()
    }

    pub fn variable(&self, id: VariableId) -> Result<&Variable, RatingError> {
        self.variables
            .get(id.0 as usize)
            .ok_or_else(|| RatingError::Internal(format!("missing variable {:?}", id)))
    }

    pub(crate) fn variable_mut(&mut self, id: VariableId) -> Result<&mut Variable, RatingError> {
        self.variables
            .get_mut(id.0 as usize)
            .ok_or_else(|| RatingError::Internal(format!("missing variable {:?}", id)))
    }

    /// Current belief of a variable.
    pub fn belief(&self, id: VariableId) -> Result<Gaussian, RatingError> {
        self.variable(id).map(Variable::belief)
    }

    pub fn factor(&self, id: FactorId) -> Result<&Factor, RatingError> {
        self.factors
            .get(id.0 as usize)
            .ok_or_else(|| RatingError::Internal(format!("missing factor {:?}", id)))
    }

    /// Iterates all variables with their handles.
    pub fn variables(&self) -> impl Iterator<Item = (VariableId, &Variable)> + '_ {
        self.variables
            .iter()
            .enumerate()
            .map(|(idx, v)| (VariableId(idx as u32), v))
    }

    /// Stores `factor` and attaches it to every variable it references.
    pub(crate) fn insert_factor(&mut self, factor: Factor) -> Result<FactorId, RatingError> {
        let id = FactorId(self.factors.len() as u32);
        let vars = factor.variables();
        for (idx, var) in vars.iter().enumerate() {
            self.variable(*var)?;
            if vars[..idx].contains(var) {
                return Err(RatingError::Internal(format!(
                    "{} factor references variable {:?} twice",
                    factor.kind_name(),
                    var
                )));
            }
        }
        for var in vars {
            self.variable_mut(var)?.attach_factor(id)?;
        }
        self.factors.push(factor);
        Ok(id)
    }
}
