//! Matching confirmation logs against the escrow contract's event schemas.

use std::collections::BTreeMap;

use ethers::abi::{Abi, Event, RawLog, Token};
use ethers::types::{H256, U256};
use paylock_core::{ErrorKind, EscrowError};
use tracing::trace;

use crate::error::Result;
use crate::receipt::{Confirmation, LogEntry};

/// A log entry decoded against a known event schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedEvent {
    pub name: String,
    pub fields: BTreeMap<String, Token>,
}

impl TypedEvent {
    pub fn field(&self, name: &str) -> Option<&Token> {
        self.fields.get(name)
    }
}

/// Outcome of matching one log entry.
#[derive(Debug, Clone, PartialEq)]
pub enum LogMatch {
    Matched(TypedEvent),
    /// Belongs to another contract or event; skipped.
    Unmatched,
}

/// Decodes logs against a closed set of event schemas, keyed by topic 0.
#[derive(Debug, Clone)]
pub struct EventDecoder {
    events: BTreeMap<H256, Event>,
}

impl EventDecoder {
    pub fn new(abi: &Abi) -> Self {
        let events = abi
            .events()
            .filter(|ev| !ev.anonymous)
            .map(|ev| (ev.signature(), ev.clone()))
            .collect();
        Self { events }
    }

    pub fn decode_entry(&self, entry: &LogEntry) -> LogMatch {
        let Some(event) = entry.topics.first().and_then(|t| self.events.get(t)) else {
            return LogMatch::Unmatched;
        };
        match event.parse_log(RawLog::from(entry)) {
            Ok(log) => LogMatch::Matched(TypedEvent {
                name: event.name.clone(),
                fields: log.params.into_iter().map(|p| (p.name, p.value)).collect(),
            }),
            Err(e) => {
                trace!(event = %event.name, error = %e, "Log matched topic but failed to decode");
                LogMatch::Unmatched
            }
        }
    }

    /// Returns the first event named `name`, in log order.
    pub fn find_event(&self, confirmation: &Confirmation, name: &str) -> Result<TypedEvent> {
        for entry in &confirmation.logs {
            trace!(address = ?entry.address, topics = ?entry.topics, "Parsing log");
            match self.decode_entry(entry) {
                LogMatch::Matched(ev) if ev.name == name => return Ok(ev),
                LogMatch::Matched(_) | LogMatch::Unmatched => continue,
            }
        }
        Err(event_not_found(confirmation, name))
    }

    /// Returns the integer `field` of the first `event` in the confirmation.
    pub fn extract_identifier(
        &self,
        confirmation: &Confirmation,
        event: &str,
        field: &str,
    ) -> Result<U256> {
        let ev = self.find_event(confirmation, event)?;
        match ev.field(field) {
            Some(Token::Uint(id)) => Ok(*id),
            other => Err(EscrowError::new(ErrorKind::EventNotFound).with_message(format!(
                "Event not found: {event} in transaction {:#x} has no integer field `{field}` (got {other:?})",
                confirmation.tx_hash
            ))),
        }
    }
}

fn event_not_found(confirmation: &Confirmation, name: &str) -> EscrowError {
    EscrowError::new(ErrorKind::EventNotFound).with_message(format!(
        "Event not found: transaction {:#x} succeeded but emitted no {name} event",
        confirmation.tx_hash
    ))
}
