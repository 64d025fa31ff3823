//! Warning accumulation for a build pass.
//!
//! Stages push findings as they go; nothing is logged until [`Warnings::report`]
//! runs after the whole pipeline has finished.

use pakt_exports::Warning;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, warning: Warning) {
        self.items.push(warning);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Warning> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Emit every recorded warning as a `tracing` event. Returns the count.
    pub fn report(&self) -> usize {
        for warning in &self.items {
            tracing::warn!("{}", warning);
        }
        if !self.items.is_empty() {
            tracing::debug!(count = self.items.len(), "reported build warnings");
        }
        self.items.len()
    }

    pub fn into_vec(self) -> Vec<Warning> {
        self.items
    }
}

impl Extend<Warning> for Warnings {
    fn extend<T: IntoIterator<Item = Warning>>(&mut self, iter: T) {
        self.items.extend(iter);
    }
}

impl FromIterator<Warning> for Warnings {
    fn from_iter<T: IntoIterator<Item = Warning>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Warnings {
    type Item = &'a Warning;
    type IntoIter = std::slice::Iter<'a, Warning>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
