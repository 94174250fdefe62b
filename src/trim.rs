//! Generational tracking of idle instances
//!
//! Returned instances enter the young generation. Every trim pass
//! decommissions whatever is still sitting in the old generation (it stayed
//! idle for a whole interval) and then ages the young generation into the
//! old one. Checkout prefers the young generation, so busy instances keep
//! getting rescued from trimming.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// A ready instance together with its per-pool identity
#[derive(Debug)]
pub(crate) struct Entry<T> {
    pub id: usize,
    pub object: T,
}

/// Bounds a trim pass must respect
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrimBounds {
    /// Never shrink the pool below this many instances
    pub min: usize,
    /// Shrink an overgrown pool back to this size; 0 means unbounded
    pub max: usize,
}

pub(crate) struct Generations<T> {
    young: VecDeque<Entry<T>>,
    old: VecDeque<Entry<T>>,
    last_trim: Instant,
}

impl<T> Generations<T> {
    pub fn new() -> Self {
        Self {
            young: VecDeque::new(),
            old: VecDeque::new(),
            last_trim: Instant::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.young.len() + self.old.len()
    }

    pub fn push(&mut self, entry: Entry<T>) {
        self.young.push_back(entry);
    }

    /// Most recently returned instance first
    pub fn pop(&mut self) -> Option<Entry<T>> {
        self.young.pop_back().or_else(|| self.old.pop_back())
    }

    pub fn drain(&mut self) -> Vec<Entry<T>> {
        self.old.drain(..).chain(self.young.drain(..)).collect()
    }

    pub fn is_due(&self, interval: Option<Duration>) -> bool {
        match interval {
            Some(interval) => self.last_trim.elapsed() >= interval,
            None => false,
        }
    }

    /// Remove idle and surplus entries given the current pool `size`.
    /// The caller owns the returned entries and must decommission them.
    pub fn trim(&mut self, size: usize, bounds: TrimBounds) -> Vec<Entry<T>> {
        let mut removed = Vec::new();
        let mut remaining = size;

        while remaining > bounds.min {
            match self.old.pop_front() {
                Some(entry) => {
                    removed.push(entry);
                    remaining -= 1;
                }
                None => break,
            }
        }

        if bounds.max > 0 {
            while remaining > bounds.max && remaining > bounds.min {
                match self.young.pop_front() {
                    Some(entry) => {
                        removed.push(entry);
                        remaining -= 1;
                    }
                    None => break,
                }
            }
        }

        self.old.extend(self.young.drain(..));
        self.last_trim = Instant::now();
        removed
    }
}
