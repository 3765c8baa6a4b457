//! The monitoring session: state, pollers and the loop that drives them.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use runmon_client::{RunBackend, SourceRepository};
use runmon_core::{ClientConfig, PollingConfig, Run};
use runmon_ui::{
    Action, AppState, Change, FetchEvent, ReduceError, Resource, RunMonitorApp, View,
};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::SyncError;
use crate::fetch::FetchRequest;
use crate::gate;
use crate::poller::{Acceptance, PollToken, ResourcePoller, TickDecision};

/// Who asked for a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Poll(PollToken),
    Launch(u64),
}

/// A finished remote call, delivered back to the session.
#[derive(Debug)]
pub struct Completion {
    pub origin: Origin,
    pub event: FetchEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunUntil {
    /// Until the shutdown future resolves.
    Shutdown,
    /// Until no resource is being polled and no launch is pending.
    Settled,
}

pub struct Session {
    app: RunMonitorApp,
    polling: PollingConfig,
    pollers: BTreeMap<Resource, ResourcePoller>,
    due: BTreeMap<Resource, Instant>,
    backend: Arc<dyn RunBackend>,
    source: Arc<dyn SourceRepository>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    launch_seq: u64,
    pending_launch: Option<u64>,
}

impl Session {
    pub fn new(
        config: &ClientConfig,
        backend: Arc<dyn RunBackend>,
        source: Arc<dyn SourceRepository>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let pollers = Resource::ALL
            .into_iter()
            .map(|resource| {
                (
                    resource,
                    ResourcePoller::new(resource, gate::drain_policy(resource)),
                )
            })
            .collect();
        let mut session = Self {
            app: RunMonitorApp::new(AppState::new(config.launch.clone())),
            polling: config.polling.clone(),
            pollers,
            due: BTreeMap::new(),
            backend,
            source,
            completions_tx,
            completions_rx,
            launch_seq: 0,
            pending_launch: None,
        };
        session.sync_pollers();
        session
    }

    pub fn state(&self) -> &AppState {
        &self.app.state
    }

    pub fn revision(&self) -> u64 {
        self.app.revision()
    }

    pub fn poller(&self, resource: Resource) -> Option<&ResourcePoller> {
        self.pollers.get(&resource)
    }

    /// True when nothing is polled and no launch awaits its answer.
    pub fn is_settled(&self) -> bool {
        self.pending_launch.is_none() && self.pollers.values().all(ResourcePoller::is_idle)
    }

    /// Apply `action`, then restart or stop poll cycles whose subject moved.
    pub fn dispatch(&mut self, action: Action) -> Result<Change, SyncError> {
        let label = action.label();
        let change = self
            .app
            .apply(action)
            .map_err(|source| SyncError::Reducer {
                action: label,
                source,
            })?;
        if change.is_changed() {
            self.sync_pollers();
        }
        Ok(change)
    }

    fn sync_pollers(&mut self) {
        let now = Instant::now();
        for (resource, poller) in self.pollers.iter_mut() {
            let subject = gate::subject(*resource, &self.app.state);
            if poller.observe(subject) {
                debug!(resource = %resource, subject = ?poller.subject(), "poll cycle changed");
                self.due.insert(*resource, now);
            }
        }
    }

    /// Timer tick for `resource`. A fetch, if any, runs in the background and
    /// comes back through [`Session::next_completion`].
    pub fn tick(&mut self, resource: Resource) -> TickDecision {
        let keep_polling = gate::keep_polling(resource, &self.app.state);
        let Some(poller) = self.pollers.get_mut(&resource) else {
            return TickDecision::Idle;
        };
        let decision = poller.on_tick(keep_polling);
        if let TickDecision::Fetch(token) = decision {
            let request = poller
                .subject()
                .and_then(|subject| FetchRequest::for_poll(resource, subject, &self.app.state));
            match request {
                Some(request) => {
                    debug!(resource = %resource, seq = token.seq, ?request, "fetch issued");
                    spawn_fetch(
                        &self.completions_tx,
                        &self.backend,
                        &self.source,
                        Origin::Poll(token),
                        request,
                    );
                }
                None => {
                    poller.on_response(token, false);
                    return TickDecision::Idle;
                }
            }
        }
        decision
    }

    /// Confirm the new-run form and submit the draft. Returns the draft.
    pub fn launch(&mut self, launched_at: DateTime<Utc>) -> Result<Run, SyncError> {
        let draft = launch_draft(&self.app.state, launched_at).map_err(|source| {
            SyncError::Reducer {
                action: "confirm_launch",
                source,
            }
        })?;
        self.dispatch(Action::ConfirmLaunch)?;

        self.launch_seq += 1;
        self.pending_launch = Some(self.launch_seq);
        info!(
            commit = %draft.short_hash(),
            branch = %draft.code.branch,
            script = %draft.script,
            "launching run"
        );
        spawn_fetch(
            &self.completions_tx,
            &self.backend,
            &self.source,
            Origin::Launch(self.launch_seq),
            FetchRequest::Launch(Box::new(draft.clone())),
        );
        Ok(draft)
    }

    pub async fn next_completion(&mut self) -> Result<Completion, SyncError> {
        self.completions_rx
            .recv()
            .await
            .ok_or(SyncError::ChannelClosed)
    }

    /// Fold a finished fetch into the state, unless its cycle is over.
    pub fn apply_completion(&mut self, completion: Completion) -> Result<Change, SyncError> {
        let Completion { origin, event } = completion;
        match origin {
            Origin::Poll(token) => {
                let acceptance = match self.pollers.get_mut(&token.resource) {
                    Some(poller) => poller.on_response(token, event.is_ok()),
                    None => Acceptance::Discard,
                };
                if acceptance == Acceptance::Discard {
                    debug!(
                        resource = %token.resource,
                        generation = token.generation,
                        seq = token.seq,
                        "discarding stale response"
                    );
                    return Ok(Change::Unchanged);
                }
            }
            Origin::Launch(seq) => {
                if self.pending_launch != Some(seq) {
                    debug!(seq, "discarding superseded launch response");
                    return Ok(Change::Unchanged);
                }
                self.pending_launch = None;
                if self.app.state.home().is_none() {
                    debug!(seq, "launch answered after leaving the home view");
                    return Ok(Change::Unchanged);
                }
                if let FetchEvent::Launch(Ok(run)) = &event {
                    info!(id = ?run.id, "run launched");
                }
            }
        }
        self.dispatch(event.into_action())
    }

    /// Drive every resource on its own cadence until `until` is met or
    /// `shutdown` resolves. `on_change` sees the state after each effective
    /// change.
    pub async fn run<F, O>(
        &mut self,
        until: RunUntil,
        shutdown: F,
        mut on_change: O,
    ) -> Result<(), SyncError>
    where
        F: Future<Output = ()>,
        O: FnMut(&AppState),
    {
        tokio::pin!(shutdown);
        on_change(&self.app.state);

        loop {
            let now = Instant::now();
            for resource in Resource::ALL {
                let due = self.due.get(&resource).copied().unwrap_or(now);
                if due <= now {
                    self.tick(resource);
                    self.due
                        .insert(resource, now + gate::interval(resource, &self.polling));
                }
            }

            if until == RunUntil::Settled && self.is_settled() {
                debug!("every poller idle");
                return Ok(());
            }

            let next_due = self
                .due
                .values()
                .min()
                .copied()
                .unwrap_or(now + Duration::from_secs(1));
            let revision = self.app.revision();
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("shutdown requested");
                    return Ok(());
                }
                received = self.completions_rx.recv() => {
                    let completion = received.ok_or(SyncError::ChannelClosed)?;
                    self.apply_completion(completion)?;
                }
                _ = tokio::time::sleep_until(next_due) => {}
            }
            if self.app.revision() != revision {
                on_change(&self.app.state);
            }
        }
    }
}

fn launch_draft(state: &AppState, launched_at: DateTime<Utc>) -> Result<Run, ReduceError> {
    match &state.view {
        View::Home(home) => home.setup.launch_draft(launched_at),
        View::Run(_) => Err(ReduceError::WrongView {
            action: "confirm_launch",
            view: "run",
        }),
    }
}

fn spawn_fetch(
    tx: &mpsc::UnboundedSender<Completion>,
    backend: &Arc<dyn RunBackend>,
    source: &Arc<dyn SourceRepository>,
    origin: Origin,
    request: FetchRequest,
) {
    let tx = tx.clone();
    let backend = Arc::clone(backend);
    let source = Arc::clone(source);
    tokio::spawn(async move {
        let event = request.execute(backend, source).await;
        // Send only fails once the session is gone.
        let _ = tx.send(Completion { origin, event });
    });
}
