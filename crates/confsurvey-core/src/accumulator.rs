//! Per-option accumulator storage.
//!
//! The [`AccumulatorStore`] owns one opaque accumulator per survey option
//! together with the option label and a monotonic `has_votes` flag. It knows
//! nothing about who contributed to an accumulator: there is no back
//! reference from an option to its voters.

use crate::error::SurveyError;

/// One survey choice.
#[derive(Debug, Clone)]
pub struct OptionSlot<A> {
    label: String,
    total: A,
    has_votes: bool,
}

impl<A> OptionSlot<A> {
    /// Returns the option label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the current accumulator.
    #[must_use]
    pub const fn total(&self) -> &A {
        &self.total
    }

    /// Returns `true` once the option has received at least one vote.
    #[must_use]
    pub const fn has_votes(&self) -> bool {
        self.has_votes
    }
}

/// Ordered option slots; indices are stable once created.
#[derive(Debug, Clone)]
pub struct AccumulatorStore<A> {
    slots: Vec<OptionSlot<A>>,
}

impl<A> Default for AccumulatorStore<A> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<A> AccumulatorStore<A> {
    /// Creates a store from `(label, zero accumulator)` pairs.
    #[must_use]
    pub fn from_initial(options: Vec<(String, A)>) -> Self {
        let slots = options
            .into_iter()
            .map(|(label, total)| OptionSlot {
                label,
                total,
                has_votes: false,
            })
            .collect();
        Self { slots }
    }

    /// Returns the number of options.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no options exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the slot at `index`.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::InvalidOption` if `index` is out of range.
    pub fn slot(&self, index: usize) -> Result<&OptionSlot<A>, SurveyError> {
        self.slots
            .get(index)
            .ok_or_else(|| SurveyError::invalid_option(index, self.slots.len()))
    }

    /// Iterates all slots in index order.
    pub fn iter(&self) -> impl Iterator<Item = &OptionSlot<A>> {
        self.slots.iter()
    }

    /// Returns the labels in index order.
    #[must_use]
    pub fn labels(&self) -> Vec<&str> {
        self.slots.iter().map(OptionSlot::label).collect()
    }

    /// Returns the indices of options that have received votes.
    #[must_use]
    pub fn voted_indices(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.has_votes)
            .map(|(index, _)| index)
            .collect()
    }

    /// Replaces the accumulator at `index` and marks the option as voted.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::InvalidOption` if `index` is out of range.
    pub fn commit(&mut self, index: usize, total: A) -> Result<&A, SurveyError> {
        let count = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(SurveyError::invalid_option(index, count))?;
        slot.total = total;
        slot.has_votes = true;
        Ok(&slot.total)
    }
}
