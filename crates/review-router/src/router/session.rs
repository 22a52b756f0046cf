use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{RoutingDecision, Worker};

/// Per-conversation routing state, owned by the caller. Routing itself is
/// stateless; this only records what was decided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub id: Uuid,
    /// Worker chosen for the most recent message.
    pub current_worker: Option<Worker>,
    /// Routed messages so far; only ever increases.
    pub loop_step: u32,
    pub last_routed_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            current_worker: None,
            loop_step: 0,
            last_routed_at: None,
        }
    }

    pub(crate) fn record(&mut self, decision: &RoutingDecision) {
        self.current_worker = Some(decision.worker);
        self.loop_step = self.loop_step.saturating_add(1);
        self.last_routed_at = Some(Utc::now());
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
