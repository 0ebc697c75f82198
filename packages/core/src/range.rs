//! Index range selection
//!
//! Builds "include these indices, then exclude those" views over an
//! ordered collection, e.g. picking a subset of nodes from the inventory.

use std::collections::BTreeSet;

use thiserror::Error;

/// Errors from parsing an index list like `"0,2-4"`
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RangeParseError {
    /// A part was not a number or a `start-end` pair
    #[error("Invalid index '{0}'")]
    InvalidIndex(String),

    /// A range whose start is after its end
    #[error("Invalid range '{0}': start is greater than end")]
    ReversedRange(String),
}

/// Whether a rule adds or removes indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Include,
    Exclude,
}

/// Ordered include/exclude rules applied to a collection's indices
///
/// Rules are owned by the instance and applied in insertion order, so a
/// later rule wins over an earlier one for overlapping indices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeList {
    initial: Option<BTreeSet<usize>>,
    rules: Vec<(Polarity, BTreeSet<usize>)>,
}

impl RangeList {
    /// Start from every index of the collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from `initial` intersected with the collection's indices
    pub fn with_initial(initial: impl IntoIterator<Item = usize>) -> Self {
        Self {
            initial: Some(initial.into_iter().collect()),
            rules: Vec::new(),
        }
    }

    /// Append an include rule
    pub fn include(&mut self, indices: impl IntoIterator<Item = usize>) -> &mut Self {
        self.rules
            .push((Polarity::Include, indices.into_iter().collect()));
        self
    }

    /// Append an exclude rule
    pub fn exclude(&mut self, indices: impl IntoIterator<Item = usize>) -> &mut Self {
        self.rules
            .push((Polarity::Exclude, indices.into_iter().collect()));
        self
    }

    /// The rules in application order
    pub fn rules(&self) -> &[(Polarity, BTreeSet<usize>)] {
        &self.rules
    }

    /// Surviving indices for a collection of length `len`, ascending
    pub fn indices(&self, len: usize) -> Vec<usize> {
        let mut applied: BTreeSet<usize> = match &self.initial {
            Some(initial) => initial.iter().copied().filter(|&i| i < len).collect(),
            None => (0..len).collect(),
        };

        for (polarity, set) in &self.rules {
            match polarity {
                Polarity::Include => applied.extend(set.iter().copied()),
                Polarity::Exclude => applied.retain(|i| !set.contains(i)),
            }
        }

        // Includes may name indices past the end; drop them on projection
        applied.into_iter().filter(|&i| i < len).collect()
    }

    /// Project the surviving indices back onto `items`, preserving order
    pub fn filter<'a, T>(&self, items: &'a [T]) -> Vec<&'a T> {
        self.indices(items.len())
            .into_iter()
            .map(|i| &items[i])
            .collect()
    }
}

/// Parse `"0,2-4,7"` into sorted, de-duplicated indices
pub fn parse_index_list(input: &str) -> Result<Vec<usize>, RangeParseError> {
    let mut result = BTreeSet::new();

    for part in input.split(',').map(str::trim) {
        if let Some((start, end)) = part.split_once('-') {
            let start: usize = start
                .trim()
                .parse()
                .map_err(|_| RangeParseError::InvalidIndex(part.to_string()))?;
            let end: usize = end
                .trim()
                .parse()
                .map_err(|_| RangeParseError::InvalidIndex(part.to_string()))?;
            if start > end {
                return Err(RangeParseError::ReversedRange(part.to_string()));
            }
            result.extend(start..=end);
        } else {
            let index = part
                .parse()
                .map_err(|_| RangeParseError::InvalidIndex(part.to_string()))?;
            result.insert(index);
        }
    }

    Ok(result.into_iter().collect())
}
