//! Coverage spectra and fault instances
//!
//! A [`SpectrumRecord`] holds the per-element coverage counts a suspiciousness
//! formula is evaluated against. A [`FaultInstance`] groups the records of one
//! faulty program version together with the ground-truth faulty elements.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Coverage counts for a single program element.
///
/// `e_f`/`e_p` count the failing/passing tests that execute the element,
/// `n_f`/`n_p` the failing/passing tests that do not. `fail_prob` is an
/// optional prior on the element being faulty, 1.0 when no prior is known.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpectrumRecord {
    pub e_f: u32,
    pub e_p: u32,
    pub n_f: u32,
    pub n_p: u32,
    #[serde(default = "default_fail_prob")]
    pub fail_prob: f64,
}

fn default_fail_prob() -> f64 {
    1.0
}

impl SpectrumRecord {
    /// Creates a record with the four coverage counts and no failure prior.
    pub fn new(e_f: u32, e_p: u32, n_f: u32, n_p: u32) -> Self {
        Self {
            e_f,
            e_p,
            n_f,
            n_p,
            fail_prob: 1.0,
        }
    }

    /// Attaches a failure-probability prior in `[0, 1]`.
    pub fn with_fail_prob(mut self, fail_prob: f64) -> Self {
        debug_assert!((0.0..=1.0).contains(&fail_prob));
        self.fail_prob = fail_prob;
        self
    }

    /// Total number of failing tests in the suite.
    pub fn total_failing(&self) -> u32 {
        self.e_f + self.n_f
    }

    /// Total number of passing tests in the suite.
    pub fn total_passing(&self) -> u32 {
        self.e_p + self.n_p
    }
}

/// One faulty program version: an ordered element-to-spectrum mapping plus the
/// set of elements known to be faulty.
///
/// Insertion order is significant: elements with equal suspiciousness scores
/// are ranked in the order they were added.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FaultInstance {
    id: String,
    elements: Vec<(String, SpectrumRecord)>,
    faulty: HashSet<String>,
}

impl FaultInstance {
    /// Creates an empty instance with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            elements: Vec::new(),
            faulty: HashSet::new(),
        }
    }

    /// Appends an element and its spectrum. Later entries rank lower on ties.
    pub fn push_element(&mut self, name: impl Into<String>, record: SpectrumRecord) {
        self.elements.push((name.into(), record));
    }

    /// Marks an element as faulty ground truth.
    pub fn mark_faulty(&mut self, name: impl Into<String>) {
        self.faulty.insert(name.into());
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of elements in the instance.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The elements in insertion order.
    pub fn elements(&self) -> &[(String, SpectrumRecord)] {
        &self.elements
    }

    /// The ground-truth faulty elements.
    pub fn faulty(&self) -> &HashSet<String> {
        &self.faulty
    }

    pub fn is_faulty(&self, name: &str) -> bool {
        self.faulty.contains(name)
    }

    /// True if at least one faulty element appears in the element mapping.
    pub fn has_localizable_fault(&self) -> bool {
        self.elements.iter().any(|(name, _)| self.faulty.contains(name))
    }
}
