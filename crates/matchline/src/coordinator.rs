//! Coordinator actor: the task that owns the matchmaking state machine.
//!
//! All inbound messages, user actions, timer signals, and completions of
//! async calls go through one Tokio task, so the state machine only ever
//! sees one input at a time. Everything slow (server requests, launch
//! process calls) runs on spawned tasks that post their result back into
//! the command channel.

use std::future::Future;
use std::sync::Arc;

use matchline_launch::{GameLauncher, LaunchRequestBuilder};
use matchline_protocol::{
    Codec, InboundMessage, JsonCodec, MatchmakingEvent, MatchmakingStatus, MatchmakingType, Route,
};
use matchline_session::{
    Anomaly, Completion, Effect, Input, LocalAction, MatchSnapshot, MatchStateMachine, TimerSignal,
    UiEvent,
};
use matchline_timer::{TimerConfig, TimerFired, TimerName, TimerRegistry};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{LocalIdentity, MatchlineError, MatchmakingConfig, ServerLink};

/// Stream of UI output from a coordinator.
pub type UiEvents = mpsc::UnboundedReceiver<UiEvent>;

/// Commands sent to the coordinator through its channel.
pub(crate) enum CoordinatorCommand {
    /// A message the transport received.
    Inbound(InboundMessage),

    /// Something the user did.
    Local(LocalAction),

    /// Result of an async call the coordinator started.
    Completion(Completion),

    /// Request the current snapshot.
    Snapshot {
        reply: oneshot::Sender<MatchSnapshot>,
    },

    /// Unwind and stop.
    Shutdown,
}

/// Handle to a running coordinator. Cheap to clone.
#[derive(Clone)]
pub struct CoordinatorHandle {
    sender: mpsc::Sender<CoordinatorCommand>,
}

impl CoordinatorHandle {
    /// Delivers a message received by the transport.
    pub async fn deliver(&self, message: InboundMessage) -> Result<(), MatchlineError> {
        self.send(CoordinatorCommand::Inbound(message)).await
    }

    /// Decodes a raw JSON transport frame and delivers it.
    ///
    /// # Errors
    /// Returns [`MatchlineError::Protocol`] if the frame is not an inbound
    /// message; nothing is delivered then.
    pub async fn deliver_frame(&self, frame: &[u8]) -> Result<(), MatchlineError> {
        let message: InboundMessage = JsonCodec.decode(frame)?;
        self.deliver(message).await
    }

    /// Enters the queue for `matchmaking_type`.
    pub async fn find_match(&self, matchmaking_type: MatchmakingType) -> Result<(), MatchlineError> {
        self.send(CoordinatorCommand::Local(LocalAction::FindMatch { matchmaking_type }))
            .await
    }

    /// Leaves the queue, or dismisses a failed accept.
    pub async fn cancel_search(&self) -> Result<(), MatchlineError> {
        self.send(CoordinatorCommand::Local(LocalAction::CancelSearch)).await
    }

    /// Accepts the proposed match.
    pub async fn accept_match(&self) -> Result<(), MatchlineError> {
        self.send(CoordinatorCommand::Local(LocalAction::AcceptMatch)).await
    }

    /// Reports that the server connection is gone.
    pub async fn disconnect(&self) -> Result<(), MatchlineError> {
        self.send(CoordinatorCommand::Local(LocalAction::Disconnect)).await
    }

    /// Returns the current matchmaking snapshot.
    pub async fn snapshot(&self) -> Result<MatchSnapshot, MatchlineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(CoordinatorCommand::Snapshot { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| MatchlineError::Unavailable)
    }

    /// Unwinds any session and stops the coordinator.
    pub async fn shutdown(&self) -> Result<(), MatchlineError> {
        self.send(CoordinatorCommand::Shutdown).await
    }

    async fn send(&self, command: CoordinatorCommand) -> Result<(), MatchlineError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| MatchlineError::Unavailable)
    }
}

/// The coordinator actor. Runs inside a Tokio task.
pub struct MatchCoordinator<S: ServerLink, L: GameLauncher> {
    identity: LocalIdentity,
    machine: MatchStateMachine,
    timer_config: TimerConfig,
    /// Timers of the open session, scoped to its epoch.
    timers: Option<TimerRegistry<TimerSignal>>,
    timer_tx: mpsc::UnboundedSender<TimerFired<TimerSignal>>,
    timer_rx: mpsc::UnboundedReceiver<TimerFired<TimerSignal>>,
    link: Arc<S>,
    launcher: Arc<L>,
    /// The launch call in flight, if any. Teardown aborts it first so the
    /// game process never sees a launch after its teardown.
    launch_task: Option<JoinHandle<()>>,
    receiver: mpsc::Receiver<CoordinatorCommand>,
    /// For posting completions without keeping the actor alive. See
    /// [`MatchCoordinator::complete`].
    completions: mpsc::WeakSender<CoordinatorCommand>,
    ui: mpsc::UnboundedSender<UiEvent>,
}

impl<S: ServerLink, L: GameLauncher> MatchCoordinator<S, L> {
    /// Spawns a coordinator task and returns a handle to it together with
    /// its UI event stream.
    ///
    /// The task stops on [`CoordinatorHandle::shutdown`] or once every
    /// handle has been dropped.
    pub fn spawn(
        config: MatchmakingConfig,
        identity: LocalIdentity,
        link: S,
        launcher: L,
    ) -> (CoordinatorHandle, UiEvents) {
        let config = config.validated();
        let (tx, rx) = mpsc::channel(config.channel_size);
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();

        let builder = LaunchRequestBuilder::new(identity.local_user(), config.server_url.clone());
        let machine = MatchStateMachine::new(config.match_config(), identity.client_id.clone(), builder);

        let actor = MatchCoordinator {
            identity,
            machine,
            timer_config: config.timer_config(),
            timers: None,
            timer_tx,
            timer_rx,
            link: Arc::new(link),
            launcher: Arc::new(launcher),
            launch_task: None,
            receiver: rx,
            completions: tx.downgrade(),
            ui: ui_tx,
        };

        tokio::spawn(actor.run());

        (CoordinatorHandle { sender: tx }, ui_rx)
    }

    /// Runs the actor loop until shutdown.
    async fn run(mut self) {
        info!(
            user = %self.identity.user_name,
            client_id = %self.identity.client_id,
            "matchmaking coordinator started"
        );

        loop {
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(CoordinatorCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(fired) = self.timer_rx.recv() => self.handle_timer(fired),
            }
        }

        self.apply(Input::Local(LocalAction::Disconnect));
        info!(client_id = %self.identity.client_id, "matchmaking coordinator stopped");
    }

    fn handle_command(&mut self, command: CoordinatorCommand) {
        match command {
            CoordinatorCommand::Inbound(message) => self.handle_inbound(message),
            CoordinatorCommand::Local(action) => self.apply(Input::Local(action)),
            CoordinatorCommand::Completion(completion) => self.apply(Input::Completion(completion)),
            CoordinatorCommand::Snapshot { reply } => {
                let _ = reply.send(self.machine.snapshot());
            }
            CoordinatorCommand::Shutdown => {}
        }
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    fn handle_inbound(&mut self, message: InboundMessage) {
        let route = match message.route.parse::<Route>() {
            Ok(route) => route,
            Err(e) => {
                debug!(error = %e, "dropping message on foreign route");
                return;
            }
        };

        match route {
            Route::Status => match decode_statuses(message.payload) {
                Ok(statuses) => self.apply(Input::Status(statuses)),
                Err(e) => warn!(error = %e, "malformed matchmaking status"),
            },
            Route::User { user_name } if user_name == self.identity.user_name => {
                self.handle_event(message.payload)
            }
            Route::Client { user_id, client_id }
                if user_id == self.identity.user_id && client_id == self.identity.client_id =>
            {
                self.handle_event(message.payload)
            }
            other => debug!(route = %other, "dropping message for another client"),
        }
    }

    fn handle_event(&mut self, payload: Value) {
        match MatchmakingEvent::from_value(payload) {
            Ok(Some(event)) => {
                debug!(event = event.tag(), "matchmaking event");
                self.apply(Input::Event(event));
            }
            Ok(None) => debug!("dropping unknown matchmaking event"),
            Err(e) => warn!(error = %e, "dropping malformed matchmaking event"),
        }
    }

    fn handle_timer(&mut self, fired: TimerFired<TimerSignal>) {
        let Some(timers) = self.timers.as_mut() else {
            debug!(timer = %fired.name, "timer signal with no open session");
            return;
        };
        if let Some(signal) = timers.accept(fired) {
            self.apply(Input::Timer(signal));
        }
    }

    // -----------------------------------------------------------------------
    // Effects
    // -----------------------------------------------------------------------

    fn apply(&mut self, input: Input) {
        let name = input.name();
        match self.machine.apply(input) {
            Ok(effects) => {
                for effect in effects {
                    self.execute(effect);
                }
            }
            Err(anomaly @ Anomaly::StaleCompletion { .. }) => {
                debug!(input = name, %anomaly, "dropping stale completion");
            }
            Err(anomaly) => warn!(input = name, %anomaly, "input ignored"),
        }
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::OpenSession { epoch } => {
                self.timers = Some(TimerRegistry::new(epoch.0, self.timer_config.clone(), self.timer_tx.clone()));
            }
            Effect::CloseSession { epoch } => {
                if self.timers.as_ref().is_some_and(|t| t.scope() == epoch.0) {
                    self.timers = None;
                }
            }
            Effect::StartTimer { timer, ticks } => {
                let Some(timers) = self.timers.as_mut() else {
                    warn!(%timer, "no open session to start timer in");
                    return;
                };
                match timer {
                    TimerName::Accept => {
                        timers.start(
                            timer,
                            ticks,
                            |remaining| TimerSignal::AcceptTick { remaining },
                            || TimerSignal::AcceptExpired,
                        );
                    }
                    TimerName::Countdown => {
                        timers.start(
                            timer,
                            ticks,
                            |remaining| TimerSignal::CountdownTick { remaining },
                            || TimerSignal::CountdownFinished,
                        );
                    }
                    TimerName::Requeue => warn!(%timer, "requeue is a one-shot timer"),
                }
            }
            Effect::StartRequeueFallback { delay } => {
                if let Some(timers) = self.timers.as_mut() {
                    timers.start_once(TimerName::Requeue, delay, || TimerSignal::RequeueElapsed);
                }
            }
            Effect::CancelTimer(timer) => {
                if let Some(timers) = self.timers.as_mut() {
                    timers.cancel(timer);
                }
            }
            Effect::Send { epoch, request } => {
                let link = Arc::clone(&self.link);
                self.complete(async move {
                    let result = link.send(request.clone()).await.map_err(|e| e.to_string());
                    Completion::Request { epoch, request, result }
                });
            }
            Effect::VerifyMap { epoch, hash, format, url } => {
                let launcher = Arc::clone(&self.launcher);
                self.complete(async move {
                    let result = launcher
                        .download_map(hash.clone(), format, url)
                        .await
                        .map_err(|e| e.to_string());
                    Completion::MapVerified { epoch, hash, result }
                });
            }
            Effect::Launch { epoch, request } => {
                let launcher = Arc::clone(&self.launcher);
                let task = self.complete(async move {
                    let result = matchline_launch::launch(&*launcher, request).await;
                    Completion::Launch { epoch, result }
                });
                if let Some(previous) = self.launch_task.replace(task) {
                    previous.abort();
                }
            }
            Effect::SetRoutes { game_id, routes } => {
                let launcher = Arc::clone(&self.launcher);
                tokio::spawn(async move {
                    if let Err(e) = launcher.set_routes(game_id, routes).await {
                        warn!(error = %e, "forwarding routes failed");
                    }
                });
            }
            Effect::TeardownLaunch => {
                let launcher = Arc::clone(&self.launcher);
                let in_flight = self.launch_task.take();
                if let Some(task) = &in_flight {
                    task.abort();
                }
                tokio::spawn(async move {
                    // An aborted task only stops at its next await point, so
                    // wait for it before clearing the config.
                    if let Some(task) = in_flight {
                        let _ = task.await;
                    }
                    matchline_launch::teardown(&*launcher).await
                });
            }
            Effect::Ui(event) => {
                let _ = self.ui.send(event);
            }
        }
    }

    /// Runs `call` on its own task and posts the completion back.
    ///
    /// The task holds a [`mpsc::WeakSender`] rather than a `Sender`: a
    /// strong sender would count as a live handle and keep the actor's
    /// `recv()` from ever returning `None`, so a slow launch could hold a
    /// coordinator open after every [`CoordinatorHandle`] was dropped.
    /// `upgrade()` fails once the actor is gone, and the completion is
    /// simply discarded.
    fn complete<F>(&self, call: F) -> JoinHandle<()>
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let completion = call.await;
            if let Some(sender) = completions.upgrade() {
                let _ = sender.send(CoordinatorCommand::Completion(completion)).await;
            }
        })
    }
}

/// Status broadcasts carry either one status or a list of them.
fn decode_statuses(payload: Value) -> Result<Vec<MatchmakingStatus>, serde_json::Error> {
    if payload.is_array() {
        serde_json::from_value(payload)
    } else {
        serde_json::from_value(payload).map(|status| vec![status])
    }
}
