//! Block id allocation.
//!
//! Ids are drawn independently of content from an [`IdSource`] and checked
//! against every id the allocator has seen. A candidate that collides is
//! redrawn; after `retry_limit` failed draws the allocator hands out a
//! sequential placeholder id instead of failing the note.

use std::collections::HashSet;
use std::fmt;

use pulm_types::BlockId;
use uuid::Uuid;

use crate::config::IdConfig;

/// Produces candidate ids. Candidates may collide; the allocator checks.
pub trait IdSource {
    fn next_candidate(&mut self) -> String;
}

/// Random UUID v4, rendered as 32 lowercase hex characters.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn next_candidate(&mut self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

impl<F> IdSource for F
where
    F: FnMut() -> String,
{
    fn next_candidate(&mut self) -> String {
        self()
    }
}

/// Fresh random id, for records created outside an allocator (new notes).
pub fn generate_id() -> String {
    UuidSource.next_candidate()
}

/// Result of an allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub id: BlockId,
    /// True when the source never produced a free candidate
    pub placeholder: bool,
}

pub struct IdAllocator {
    taken: HashSet<BlockId>,
    source: Box<dyn IdSource>,
    retry_limit: u32,
    placeholder_prefix: String,
    placeholder_seq: u64,
}

impl IdAllocator {
    pub fn new(config: &IdConfig) -> Self {
        Self::with_source(config, UuidSource)
    }

    pub fn with_source(config: &IdConfig, source: impl IdSource + 'static) -> Self {
        Self {
            taken: HashSet::new(),
            source: Box::new(source),
            retry_limit: config.retry_limit.max(1),
            placeholder_prefix: config.placeholder_prefix.clone(),
            placeholder_seq: 0,
        }
    }

    /// Record an id as in use so it is never handed out
    pub fn observe(&mut self, id: &BlockId) {
        if !id.is_empty() {
            self.taken.insert(id.clone());
        }
    }

    pub fn observe_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a BlockId>) {
        for id in ids {
            self.observe(id);
        }
    }

    pub fn is_taken(&self, id: &BlockId) -> bool {
        self.taken.contains(id)
    }

    /// Number of ids observed or issued
    pub fn len(&self) -> usize {
        self.taken.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taken.is_empty()
    }

    pub fn allocate(&mut self) -> Allocation {
        for attempt in 0..self.retry_limit {
            let candidate = BlockId::new(self.source.next_candidate());
            if candidate.is_empty() || self.taken.contains(&candidate) {
                tracing::trace!(attempt, "id candidate collided, redrawing");
                continue;
            }
            self.taken.insert(candidate.clone());
            return Allocation {
                id: candidate,
                placeholder: false,
            };
        }

        tracing::warn!(
            retries = self.retry_limit,
            "id source exhausted, issuing placeholder id"
        );
        loop {
            self.placeholder_seq += 1;
            let candidate = BlockId::new(format!(
                "{}-{}",
                self.placeholder_prefix, self.placeholder_seq
            ));
            if self.taken.insert(candidate.clone()) {
                return Allocation {
                    id: candidate,
                    placeholder: true,
                };
            }
        }
    }
}

impl fmt::Debug for IdAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdAllocator")
            .field("taken", &self.taken.len())
            .field("retry_limit", &self.retry_limit)
            .field("placeholder_prefix", &self.placeholder_prefix)
            .finish()
    }
}
