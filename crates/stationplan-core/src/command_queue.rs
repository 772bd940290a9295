//! Command queue for station mutations.
//!
//! Hosts (UI, scripting) submit commands here instead of mutating a
//! [`Station`](crate::station::Station) directly. Each submission gets a
//! [`Ticket`] so the host can match it against the outcome later. The
//! station pops commands one at a time in submission order and records the
//! outcome in the queue's journal, which keeps a single writer on the
//! ledger.

use std::collections::VecDeque;

use crate::id::{PlacementId, WareId};
use crate::ledger::ModuleOrder;

/// A single mutation that can be submitted to a station.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    PlaceModules { orders: Vec<ModuleOrder> },
    RemoveModules { orders: Vec<ModuleOrder> },
    RemovePlacement { placement: PlacementId },
    ChangeModuleCount { placement: PlacementId, count: u32 },
    /// Mount (`Some`) or clear (`None`) the equipment on a connection.
    SetEquipment {
        placement: PlacementId,
        connection: String,
        equipment: Option<WareId>,
    },
    UpdateSettings { workforce_ratio: f64, sunlight: f64 },
    /// Recompute the workforce ratio from the placed modules.
    SyncWorkforce,
}

/// Submission number of a queued command. Increases by one per submission
/// over the lifetime of a queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

/// A command waiting in the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Submitted {
    pub ticket: Ticket,
    pub command: Command,
}

/// What happened to a command once the station ran it.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub ticket: Ticket,
    pub command: Command,
    /// Station revision after the command ran.
    pub revision: u64,
    pub accepted: bool,
}

#[derive(Debug, Default)]
pub struct CommandQueue {
    next_ticket: u64,
    pending: VecDeque<Submitted>,
    journal: VecDeque<JournalEntry>,
    /// Journal entries kept; older ones are dropped. 0 disables the journal.
    journal_limit: usize,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// A queue that remembers the last `limit` outcomes.
    pub fn with_journal(limit: usize) -> Self {
        Self {
            journal_limit: limit,
            ..Self::default()
        }
    }

    pub fn submit(&mut self, command: Command) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.pending.push_back(Submitted { ticket, command });
        ticket
    }

    /// Submit several commands; returns the ticket of each, in order.
    pub fn submit_all(&mut self, commands: impl IntoIterator<Item = Command>) -> Vec<Ticket> {
        commands.into_iter().map(|c| self.submit(c)).collect()
    }

    /// Withdraw a command that has not run yet.
    pub fn cancel(&mut self, ticket: Ticket) -> Option<Command> {
        let index = self.pending.iter().position(|s| s.ticket == ticket)?;
        self.pending.remove(index).map(|s| s.command)
    }

    /// The oldest pending command.
    pub fn pop(&mut self) -> Option<Submitted> {
        self.pending.pop_front()
    }

    /// Note the outcome of a popped command.
    pub fn record(&mut self, submitted: Submitted, revision: u64, accepted: bool) {
        if self.journal_limit == 0 {
            return;
        }
        if self.journal.len() == self.journal_limit {
            self.journal.pop_front();
        }
        self.journal.push_back(JournalEntry {
            ticket: submitted.ticket,
            command: submitted.command,
            revision,
            accepted,
        });
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Recorded outcomes, oldest first.
    pub fn journal(&self) -> impl Iterator<Item = &JournalEntry> + '_ {
        self.journal.iter()
    }

    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }
}
