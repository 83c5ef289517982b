// 11.0: every accepted trade produces an ordered batch of events. the batch is built once
// inside apply_trade and frozen; the publishing collaborator appends it to its own store.
// events carry the challenge id and the version they produced, so a stream can be replayed.

use crate::challenge::ChallengeStatus;
use crate::rules::RuleId;
use crate::types::{ChallengeId, Money, Percentage, PnL, TradeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub challenge_id: ChallengeId,
    /// Challenge version this event produced.
    pub version: u64,
    /// Position within the batch of `version`, starting at 0.
    pub sequence: u32,
    pub payload: EventPayload,
}

impl Event {
    pub fn at(&self) -> DateTime<Utc> {
        match &self.payload {
            EventPayload::StatusChanged(e) => e.at,
            EventPayload::Failed(e) => e.at,
            EventPayload::Funded(e) => e.at,
            EventPayload::TradeApplied(e) => e.at,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match &self.payload {
            EventPayload::StatusChanged(_) => "challenge_status_changed",
            EventPayload::Failed(_) => "challenge_failed",
            EventPayload::Funded(_) => "challenge_funded",
            EventPayload::TradeApplied(_) => "trade_applied",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    StatusChanged(StatusChangedEvent),
    Failed(ChallengeFailedEvent),
    Funded(ChallengeFundedEvent),
    TradeApplied(TradeAppliedEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChangedEvent {
    pub from: ChallengeStatus,
    pub to: ChallengeStatus,
    pub reason: StatusChangeReason,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusChangeReason {
    FirstTradeAccepted,
}

impl fmt::Display for StatusChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusChangeReason::FirstTradeAccepted => write!(f, "first trade accepted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeFailedEvent {
    pub rule_id: RuleId,
    pub metric_value: Percentage,
    pub limit_value: Percentage,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeFundedEvent {
    pub metric_value: Percentage,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeAppliedEvent {
    pub trade_id: TradeId,
    pub symbol: String,
    pub equity_after: Money,
    pub pnl: PnL,
    pub at: DateTime<Utc>,
}

/// Ordered, read-only events of one `apply_trade` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventBatch(Vec<Event>);

impl EventBatch {
    pub fn as_slice(&self) -> &[Event] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Event> {
        self.0
    }
}

impl Deref for EventBatch {
    type Target = [Event];

    fn deref(&self) -> &[Event] {
        &self.0
    }
}

impl IntoIterator for EventBatch {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a EventBatch {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// stamps id, version and sequence on payloads while a trade is being evaluated
#[derive(Debug)]
pub(crate) struct EventCollector {
    challenge_id: ChallengeId,
    version: u64,
    events: Vec<Event>,
}

impl EventCollector {
    pub(crate) fn new(challenge_id: ChallengeId, version: u64) -> Self {
        Self {
            challenge_id,
            version,
            events: Vec::with_capacity(3),
        }
    }

    pub(crate) fn emit(&mut self, payload: EventPayload) {
        let sequence = self.events.len() as u32;
        self.events.push(Event {
            challenge_id: self.challenge_id,
            version: self.version,
            sequence,
            payload,
        });
    }

    pub(crate) fn finish(self) -> EventBatch {
        EventBatch(self.events)
    }
}
