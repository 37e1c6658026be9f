use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;

/// Identity of a server-owned page region. The full key set is constructed
/// once per session; operations against anything else fail fast instead of
/// discovering a missing target after the network round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContainerKey {
    AssignedSubjects(String),
    AssignedClasses(String),
    /// The shared panel the section loader writes into.
    SharedPanel,
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKey::AssignedSubjects(teacher) => {
                write!(f, "assigned-subjects-{}", teacher)
            }
            ContainerKey::AssignedClasses(teacher) => write!(f, "assigned-classes-{}", teacher),
            ContainerKey::SharedPanel => write!(f, "dynamic-content"),
        }
    }
}

impl ContainerKey {
    pub fn parse(raw: &str) -> Option<ContainerKey> {
        if raw == "dynamic-content" {
            return Some(ContainerKey::SharedPanel);
        }
        if let Some(teacher) = raw.strip_prefix("assigned-subjects-") {
            if !teacher.is_empty() {
                return Some(ContainerKey::AssignedSubjects(teacher.to_string()));
            }
        }
        if let Some(teacher) = raw.strip_prefix("assigned-classes-") {
            if !teacher.is_empty() {
                return Some(ContainerKey::AssignedClasses(teacher.to_string()));
            }
        }
        None
    }
}

#[derive(Debug, thiserror::Error)]
#[error("container not bound: {0}")]
pub struct UnknownContainer(pub String);

/// Permission to write one response into one container. Issued before the
/// request goes out; a newer ticket for the same container invalidates it.
#[derive(Debug, Clone)]
pub struct Ticket {
    key: ContainerKey,
    seq: u64,
}

impl Ticket {
    pub fn key(&self) -> &ContainerKey {
        &self.key
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer ticket was issued for the container after this one; the
    /// response is discarded and current content stands.
    Superseded,
}

#[derive(Debug, Clone, Default)]
struct Slot {
    issued: u64,
    applied: Option<u64>,
    content: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Snapshot {
    pub issued: u64,
    pub applied: Option<u64>,
    pub content: Option<String>,
    pub error: Option<String>,
}

/// Binding table plus per-container sync state. Each container's content is
/// wholly owned by the newest applied response; there is no merge.
pub struct Registry {
    slots: Mutex<HashMap<ContainerKey, Slot>>,
}

impl Registry {
    pub fn with_bindings<I>(keys: I) -> Registry
    where
        I: IntoIterator<Item = ContainerKey>,
    {
        let slots = keys
            .into_iter()
            .map(|k| (k, Slot::default()))
            .collect::<HashMap<_, _>>();
        Registry {
            slots: Mutex::new(slots),
        }
    }

    /// Issue a write ticket for a container, invalidating any outstanding one.
    pub fn begin(&self, key: &ContainerKey) -> Result<Ticket, UnknownContainer> {
        let mut slots = self.slots.lock();
        let slot = slots
            .get_mut(key)
            .ok_or_else(|| UnknownContainer(key.to_string()))?;
        slot.issued += 1;
        Ok(Ticket {
            key: key.clone(),
            seq: slot.issued,
        })
    }

    /// Replace the container's content if the ticket is still the newest.
    pub fn apply(&self, ticket: &Ticket, html: String) -> Result<ApplyOutcome, UnknownContainer> {
        let mut slots = self.slots.lock();
        let slot = slots
            .get_mut(&ticket.key)
            .ok_or_else(|| UnknownContainer(ticket.key.to_string()))?;
        if ticket.seq != slot.issued {
            return Ok(ApplyOutcome::Superseded);
        }
        slot.applied = Some(ticket.seq);
        slot.content = Some(html);
        slot.error = None;
        Ok(ApplyOutcome::Applied)
    }

    /// Record a local error for a failed job. Prior content stays intact, and
    /// a superseded failure is dropped entirely.
    pub fn fail(&self, ticket: &Ticket, message: &str) -> Result<ApplyOutcome, UnknownContainer> {
        let mut slots = self.slots.lock();
        let slot = slots
            .get_mut(&ticket.key)
            .ok_or_else(|| UnknownContainer(ticket.key.to_string()))?;
        if ticket.seq != slot.issued {
            return Ok(ApplyOutcome::Superseded);
        }
        slot.error = Some(message.to_string());
        Ok(ApplyOutcome::Applied)
    }

    pub fn snapshot(&self, key: &ContainerKey) -> Result<Snapshot, UnknownContainer> {
        let slots = self.slots.lock();
        let slot = slots
            .get(key)
            .ok_or_else(|| UnknownContainer(key.to_string()))?;
        Ok(Snapshot {
            issued: slot.issued,
            applied: slot.applied,
            content: slot.content.clone(),
            error: slot.error.clone(),
        })
    }

    pub fn keys(&self) -> Vec<String> {
        let slots = self.slots.lock();
        let mut keys = slots.keys().cloned().collect::<Vec<_>>();
        keys.sort();
        keys.into_iter().map(|k| k.to_string()).collect()
    }
}
