//! Published bubble snapshots, keyed by bubble id.
//!
//! RULE: Snapshots are immutable once published. Publishing again
//! replaces the whole snapshot; readers holding the old Arc keep it.
//! The registry is owned by whoever serves requests. There is no global.

use crate::{
    composite::CompositeResult,
    error::{ScoreError, ScoreResult},
    presentation::{to_bubble_state, BubbleState},
    types::BubbleId,
};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct BubbleSnapshot {
    pub result: CompositeResult,
    pub state:  BubbleState,
}

#[derive(Debug, Default)]
pub struct BubbleRegistry {
    snapshots: HashMap<BubbleId, Arc<BubbleSnapshot>>,
}

impl BubbleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a fresh result for `bubble_id` and return its derived state.
    pub fn publish(&mut self, bubble_id: &str, result: CompositeResult) -> BubbleState {
        let state = to_bubble_state(&result);
        log::info!(
            "published {bubble_id}: {} ({:?})",
            state.risk_score,
            state.risk_level
        );
        self.snapshots.insert(
            bubble_id.to_string(),
            Arc::new(BubbleSnapshot {
                result,
                state: state.clone(),
            }),
        );
        state
    }

    pub fn snapshot(&self, bubble_id: &str) -> Option<Arc<BubbleSnapshot>> {
        self.snapshots.get(bubble_id).cloned()
    }

    pub fn state(&self, bubble_id: &str) -> ScoreResult<BubbleState> {
        self.snapshots
            .get(bubble_id)
            .map(|s| s.state.clone())
            .ok_or_else(|| ScoreError::BubbleNotInitialized {
                bubble_id: bubble_id.to_string(),
            })
    }

    pub fn is_initialized(&self, bubble_id: &str) -> bool {
        self.snapshots.contains_key(bubble_id)
    }

    /// Known bubble ids, sorted.
    pub fn ids(&self) -> Vec<BubbleId> {
        let mut ids: Vec<BubbleId> = self.snapshots.keys().cloned().collect();
        ids.sort();
        ids
    }
}
