//! Per-resource polling state machine.
//!
//! A poller never performs I/O. It answers "fetch now?" on every tick and
//! "apply this?" on every response, which keeps at most one fetch in flight
//! and drops responses from a cycle that has since been replaced.

use runmon_core::RunId;
use runmon_ui::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PollPhase {
    /// Nothing observed.
    Idle,
    /// Observing a subject; fetch on every tick.
    Active,
    /// Stop condition seen; one last fetch before going idle.
    Draining,
}

/// What happens once a resource no longer needs polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrainPolicy {
    /// Go idle right away.
    Immediate,
    /// Fetch once more, then go idle after that fetch succeeds.
    FinalFetch,
}

/// Entity a poll cycle observes. A new subject starts a new cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    Mounted,
    Run(RunId),
    Branch(String),
}

/// Identifies one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PollToken {
    pub resource: Resource,
    pub generation: u64,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickDecision {
    Idle,
    /// The previous fetch has not come back yet.
    Busy,
    Fetch(PollToken),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Acceptance {
    Accept,
    Discard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePoller {
    resource: Resource,
    drain: DrainPolicy,
    phase: PollPhase,
    subject: Option<Subject>,
    generation: u64,
    seq: u64,
    in_flight: Option<PollToken>,
    completed: u64,
    /// Last seq issued before the stop condition; only later fetches end a drain.
    drain_from: u64,
}

impl ResourcePoller {
    pub fn new(resource: Resource, drain: DrainPolicy) -> Self {
        Self {
            resource,
            drain,
            phase: PollPhase::Idle,
            subject: None,
            generation: 0,
            seq: 0,
            in_flight: None,
            completed: 0,
            drain_from: 0,
        }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    pub fn in_flight(&self) -> Option<PollToken> {
        self.in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.phase == PollPhase::Idle
    }

    /// Responses accepted in the current cycle.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Point the poller at `subject`. Returns true when a new cycle started
    /// or the previous one was stopped; an in-flight fetch of the old cycle
    /// will be discarded.
    pub fn observe(&mut self, subject: Option<Subject>) -> bool {
        if self.subject == subject {
            return false;
        }
        self.generation += 1;
        self.in_flight = None;
        self.completed = 0;
        self.drain_from = self.seq;
        self.phase = if subject.is_some() {
            PollPhase::Active
        } else {
            PollPhase::Idle
        };
        self.subject = subject;
        true
    }

    /// Decide what to do on a timer tick. `keep_polling` is false once the
    /// observed data can no longer change.
    pub fn on_tick(&mut self, keep_polling: bool) -> TickDecision {
        match self.phase {
            PollPhase::Idle => return TickDecision::Idle,
            PollPhase::Draining if keep_polling => self.phase = PollPhase::Active,
            PollPhase::Active if !keep_polling => match self.drain {
                DrainPolicy::Immediate => {
                    self.phase = PollPhase::Idle;
                    self.in_flight = None;
                    return TickDecision::Idle;
                }
                DrainPolicy::FinalFetch => {
                    self.phase = PollPhase::Draining;
                    self.drain_from = self.seq;
                }
            },
            PollPhase::Active | PollPhase::Draining => {}
        }

        if self.in_flight.is_some() {
            return TickDecision::Busy;
        }
        self.seq += 1;
        let token = PollToken {
            resource: self.resource,
            generation: self.generation,
            seq: self.seq,
        };
        self.in_flight = Some(token);
        TickDecision::Fetch(token)
    }

    /// Settle the fetch identified by `token`. Anything but the fetch
    /// currently in flight is stale. A fetch issued before the stop condition
    /// was seen does not end a drain.
    pub fn on_response(&mut self, token: PollToken, succeeded: bool) -> Acceptance {
        if self.in_flight != Some(token) {
            return Acceptance::Discard;
        }
        self.in_flight = None;
        self.completed += 1;
        if succeeded && self.phase == PollPhase::Draining && token.seq > self.drain_from {
            self.phase = PollPhase::Idle;
        }
        Acceptance::Accept
    }
}
