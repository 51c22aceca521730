//! The matchmaking state machine.
//!
//! [`MatchStateMachine::apply`] is the only way state changes. It checks the
//! input against the current phase, mutates the session, and returns the
//! side effects for the caller to run, in order. Rejected inputs leave the
//! machine untouched and come back as an [`Anomaly`].

use std::collections::BTreeMap;

use matchline_launch::{Assignment, LaunchError, LaunchRequestBuilder};
use matchline_protocol::{
    CancelLoading, ClientId, GameId, MatchFound, MatchReady, MatchmakingEvent, MatchmakingStatus,
    MatchmakingType, PlayerAccepted, QueueStatus, ServerRequest, SetRoutes, StartWhenReady,
    TimerName,
};
use tracing::{debug, info, trace, warn};

use crate::{
    ActiveGame, Anomaly, Completion, Cue, Effect, Epoch, Input, LOAD_FAILED_NOTICE, LaunchStatus,
    LocalAction, MapUnavailable, MatchConfig, MatchFailure, MatchPhase, MatchSession,
    MatchSnapshot, ReadyStage, TimerSignal, UiEvent, View,
};

type Outcome = Result<Vec<Effect>, Anomaly>;

/// Drives one client's matchmaking from queue entry to game launch.
///
/// Owns at most one [`MatchSession`]. When there is none the machine still
/// reports a phase: `Idle`, `Finding`, or the `Canceled` left behind by the
/// last session together with its failure reason.
#[derive(Debug)]
pub struct MatchStateMachine {
    config: MatchConfig,
    client_id: ClientId,
    builder: LaunchRequestBuilder,
    idle_phase: MatchPhase,
    searching: Option<MatchmakingType>,
    session: Option<MatchSession>,
    last_failure: Option<String>,
    epoch: Epoch,
    statuses: BTreeMap<MatchmakingType, bool>,
    queue_status: Option<QueueStatus>,
}

impl MatchStateMachine {
    pub fn new(config: MatchConfig, client_id: ClientId, builder: LaunchRequestBuilder) -> Self {
        Self {
            config: config.validated(),
            client_id,
            builder,
            idle_phase: MatchPhase::Idle,
            searching: None,
            session: None,
            last_failure: None,
            epoch: Epoch(0),
            statuses: BTreeMap::new(),
            queue_status: None,
        }
    }

    /// Current phase, with or without a session.
    pub fn phase(&self) -> MatchPhase {
        self.session.as_ref().map_or(self.idle_phase, |s| s.phase)
    }

    pub fn session(&self) -> Option<&MatchSession> {
        self.session.as_ref()
    }

    /// The epoch async calls started right now would carry.
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.session {
            Some(session) => session.failure_reason(),
            None => self.last_failure.as_deref(),
        }
    }

    /// Last reported availability of each queue.
    pub fn statuses(&self) -> &BTreeMap<MatchmakingType, bool> {
        &self.statuses
    }

    /// The last `queueStatus` the server sent.
    pub fn queue_status(&self) -> Option<&QueueStatus> {
        self.queue_status.as_ref()
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        match &self.session {
            Some(s) => MatchSnapshot {
                phase: s.phase,
                matchmaking_type: Some(s.matchmaking_type),
                accept_ticks_remaining: s.accept_ticks_remaining,
                accepted_players: s.accepted_players,
                num_players: s.num_players,
                accept_confirmed: s.accept_confirmed,
                countdown_ticks_remaining: s.countdown_ticks_remaining,
                failure_reason: s.failure_reason.clone(),
            },
            None => MatchSnapshot {
                phase: self.idle_phase,
                matchmaking_type: self.searching,
                accept_ticks_remaining: 0,
                accepted_players: 0,
                num_players: 0,
                accept_confirmed: false,
                countdown_ticks_remaining: 0,
                failure_reason: self.last_failure.clone(),
            },
        }
    }

    /// Applies one input.
    ///
    /// On success returns the effects to run, in order. A snapshot effect is
    /// appended whenever the UI-visible state changed.
    ///
    /// # Errors
    /// Returns an [`Anomaly`] when the input does not fit the current
    /// phase or carries an invalid payload. The machine is unchanged.
    pub fn apply(&mut self, input: Input) -> Outcome {
        let before = self.snapshot();

        let mut effects = match input {
            Input::Event(event) => self.on_event(event)?,
            Input::Status(statuses) => self.on_status(statuses),
            Input::Local(action) => self.on_local(action)?,
            Input::Timer(signal) => self.on_timer(signal)?,
            Input::Completion(completion) => self.on_completion(completion)?,
        };

        let after = self.snapshot();
        if after.phase != before.phase {
            info!(from = %before.phase, to = %after.phase, epoch = %self.epoch, "match phase changed");
        }
        if after != before {
            effects.push(Effect::Ui(UiEvent::Snapshot(after)));
        }
        Ok(effects)
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    fn on_event(&mut self, event: MatchmakingEvent) -> Outcome {
        match event {
            MatchmakingEvent::MatchFound(found) => self.match_found(found),
            MatchmakingEvent::PlayerAccepted(accepted) => self.player_accepted(accepted),
            MatchmakingEvent::AcceptTimeout => self.accept_timeout("acceptTimeout", false),
            MatchmakingEvent::Requeue => self.requeue(),
            MatchmakingEvent::MatchReady(ready) => self.match_ready(ready),
            MatchmakingEvent::SetRoutes(routes) => self.set_routes(routes),
            MatchmakingEvent::StartCountdown => self.start_countdown(),
            MatchmakingEvent::StartWhenReady(start) => self.start_when_ready(start),
            MatchmakingEvent::CancelLoading(cancel) => self.cancel_loading(cancel),
            MatchmakingEvent::GameStarted => self.game_started(),
            MatchmakingEvent::QueueStatus(status) => Ok(self.queue_status_changed(status)),
        }
    }

    fn on_local(&mut self, action: LocalAction) -> Outcome {
        match action {
            LocalAction::FindMatch { matchmaking_type } => self.find_match(matchmaking_type),
            LocalAction::CancelSearch => self.cancel_search(),
            LocalAction::AcceptMatch => self.accept_match(),
            LocalAction::Disconnect => Ok(self.disconnect()),
        }
    }

    fn on_timer(&mut self, signal: TimerSignal) -> Outcome {
        match signal {
            TimerSignal::AcceptTick { remaining } => {
                let session = self.live_timer(TimerName::Accept, signal.name())?;
                session.accept_ticks_remaining = remaining;
                trace!(remaining, "accept tick");
                Ok(Vec::new())
            }
            TimerSignal::AcceptExpired => {
                self.live_timer(TimerName::Accept, signal.name())?;
                self.accept_timeout(signal.name(), true)
            }
            TimerSignal::CountdownTick { remaining } => {
                let session = self.live_timer(TimerName::Countdown, signal.name())?;
                session.countdown_ticks_remaining = remaining;
                trace!(remaining, "countdown tick");
                Ok(Vec::new())
            }
            TimerSignal::CountdownFinished => {
                let session = self.live_timer(TimerName::Countdown, signal.name())?;
                session.timers.remove(TimerName::Countdown);
                session.countdown_ticks_remaining = 0;
                Ok(vec![Effect::Ui(UiEvent::Cue(Cue::CountdownStopped))])
            }
            TimerSignal::RequeueElapsed => {
                let session = self.live_timer(TimerName::Requeue, signal.name())?;
                session.timers.remove(TimerName::Requeue);
                let mut effects = vec![Effect::Ui(UiEvent::CloseDialog)];
                self.close_session(&mut effects);
                self.idle_phase = MatchPhase::Idle;
                self.last_failure = None;
                Ok(effects)
            }
        }
    }

    fn on_completion(&mut self, completion: Completion) -> Outcome {
        let epoch = completion.epoch();
        if epoch != self.epoch {
            return Err(Anomaly::StaleCompletion {
                epoch,
                current: self.epoch,
            });
        }

        match completion {
            Completion::Request { request, result, .. } => Ok(self.request_completed(request, result)),
            Completion::MapVerified { hash, result, .. } => {
                match result {
                    Ok(()) => debug!(%hash, "map available"),
                    Err(reason) => {
                        let unavailable = MapUnavailable { hash, reason };
                        warn!(error = %unavailable, "map verification failed");
                    }
                }
                Ok(Vec::new())
            }
            Completion::Launch { result, .. } => self.launch_completed(result),
        }
    }

    // -----------------------------------------------------------------------
    // Searching
    // -----------------------------------------------------------------------

    fn find_match(&mut self, matchmaking_type: MatchmakingType) -> Outcome {
        let phase = self.phase();
        if !phase.can_search() {
            return Err(ordering(phase, "findMatchRequested"));
        }

        let mut effects = Vec::new();
        self.close_session(&mut effects);
        self.epoch = self.epoch.next();
        self.idle_phase = MatchPhase::Finding;
        self.searching = Some(matchmaking_type);
        self.last_failure = None;

        effects.push(Effect::Send {
            epoch: self.epoch,
            request: ServerRequest::FindMatch {
                client_id: self.client_id.clone(),
                matchmaking_type,
            },
        });
        Ok(effects)
    }

    fn cancel_search(&mut self) -> Outcome {
        let mut effects = Vec::new();
        match self.phase() {
            MatchPhase::Finding if self.session.is_none() => {
                self.epoch = self.epoch.next();
                effects.push(Effect::Send {
                    epoch: self.epoch,
                    request: ServerRequest::CancelMatch,
                });
            }
            MatchPhase::FailedToAccept => {
                effects.push(Effect::Ui(UiEvent::CloseDialog));
                self.close_session(&mut effects);
            }
            phase => return Err(ordering(phase, "cancelSearch")),
        }
        self.idle_phase = MatchPhase::Idle;
        self.searching = None;
        self.last_failure = None;
        Ok(effects)
    }

    fn queue_status_changed(&mut self, status: QueueStatus) -> Vec<Effect> {
        if self.session.is_none() {
            match (&status.matchmaking, self.idle_phase) {
                (Some(queued), MatchPhase::Idle) => {
                    self.idle_phase = MatchPhase::Finding;
                    self.searching = Some(queued.matchmaking_type);
                }
                (None, MatchPhase::Finding) => {
                    self.idle_phase = MatchPhase::Idle;
                    self.searching = None;
                }
                _ => {}
            }
        }
        self.queue_status = Some(status);
        Vec::new()
    }

    fn on_status(&mut self, statuses: Vec<MatchmakingStatus>) -> Vec<Effect> {
        let mut effects = Vec::new();
        for status in statuses {
            let previous = self.statuses.insert(status.matchmaking_type, status.enabled);
            if previous != Some(status.enabled) {
                debug!(queue = status.matchmaking_type.as_str(), enabled = status.enabled, "queue availability");
                effects.push(Effect::Ui(UiEvent::QueueAvailability(status)));
            }
        }
        effects
    }

    // -----------------------------------------------------------------------
    // Accepting
    // -----------------------------------------------------------------------

    fn match_found(&mut self, found: MatchFound) -> Outcome {
        let phase = self.phase();
        if phase != MatchPhase::Finding || self.session.is_some() {
            return Err(ordering(phase, "matchFound"));
        }
        if found.num_players == 0 {
            return Err(Anomaly::InvalidPayload {
                input: "matchFound",
                reason: "numPlayers is zero".into(),
            });
        }

        self.epoch = self.epoch.next();
        let ticks = self.config.accept_window_secs;
        let mut session = MatchSession::new(self.epoch, found.matchmaking_type, found.num_players, ticks);
        session.timers.insert(TimerName::Accept);
        self.session = Some(session);
        self.searching = None;

        info!(
            epoch = %self.epoch,
            queue = found.matchmaking_type.as_str(),
            num_players = found.num_players,
            "match found"
        );

        Ok(vec![
            Effect::OpenSession { epoch: self.epoch },
            Effect::StartTimer {
                timer: TimerName::Accept,
                ticks,
            },
            Effect::Ui(UiEvent::AttentionRequired),
            Effect::Ui(UiEvent::Cue(Cue::MatchFound)),
            Effect::Ui(UiEvent::OpenAcceptPrompt),
        ])
    }

    fn accept_match(&mut self) -> Outcome {
        let phase = self.phase();
        let session = match self.session.as_mut() {
            Some(s)
                if s.phase == MatchPhase::MatchFound
                    && s.accept_ticks_remaining > 0
                    && s.timers.contains(TimerName::Accept) =>
            {
                s
            }
            _ => return Err(ordering(phase, "localAcceptClick")),
        };

        session.phase = MatchPhase::Accepting;
        Ok(vec![Effect::Send {
            epoch: session.epoch,
            request: ServerRequest::AcceptMatch,
        }])
    }

    fn player_accepted(&mut self, accepted: PlayerAccepted) -> Outcome {
        let phase = self.phase();
        let session = match self.session.as_mut() {
            Some(s) if s.phase.is_accepting() => s,
            _ => return Err(ordering(phase, "playerAccepted")),
        };

        let count = accepted.accepted_players.min(session.num_players);
        if count < session.accepted_players {
            return Err(Anomaly::InvalidPayload {
                input: "playerAccepted",
                reason: format!(
                    "acceptedPlayers went from {} to {}",
                    session.accepted_players, accepted.accepted_players
                ),
            });
        }

        session.accepted_players = count;
        if session.phase == MatchPhase::Accepting && session.accept_confirmed {
            session.phase = MatchPhase::AwaitingOthers;
        }
        Ok(Vec::new())
    }

    /// Ends the accept window. `expired` is set when the local accept timer
    /// ran out, in which case the registry has already retired it.
    fn accept_timeout(&mut self, input: &'static str, expired: bool) -> Outcome {
        let phase = self.phase();
        let delay = self.config.requeue_delay;
        let session = match self.session.as_mut() {
            Some(s) if s.phase.is_accepting() => s,
            _ => return Err(ordering(phase, input)),
        };

        let mut effects = Vec::new();
        if session.timers.remove(TimerName::Accept) && !expired {
            effects.push(Effect::CancelTimer(TimerName::Accept));
        }

        let reason = MatchFailure::AcceptTimeout.to_string();
        session.accept_ticks_remaining = 0;
        session.phase = MatchPhase::FailedToAccept;
        session.failure_reason = Some(reason.clone());
        session.timers.insert(TimerName::Requeue);

        info!(epoch = %session.epoch, "failed to accept in time");

        effects.extend([
            Effect::Ui(UiEvent::CloseDialog),
            Effect::Ui(UiEvent::Notice(reason)),
            Effect::StartRequeueFallback { delay },
        ]);
        Ok(effects)
    }

    fn requeue(&mut self) -> Outcome {
        let phase = self.phase();
        let matchmaking_type = match &self.session {
            Some(s) if s.phase.is_accepting() || s.phase == MatchPhase::FailedToAccept => s.matchmaking_type,
            _ => return Err(ordering(phase, "requeue")),
        };

        let mut effects = Vec::new();
        if phase.is_accepting() {
            effects.push(Effect::Ui(UiEvent::CloseDialog));
        }
        self.close_session(&mut effects);
        self.idle_phase = MatchPhase::Finding;
        self.searching = Some(matchmaking_type);
        self.last_failure = None;
        Ok(effects)
    }

    // -----------------------------------------------------------------------
    // Ready
    // -----------------------------------------------------------------------

    fn match_ready(&mut self, ready: MatchReady) -> Outcome {
        let phase = self.phase();
        let countdown = self.config.countdown_secs;
        let session = match self.session.as_mut() {
            Some(s) if matches!(s.phase, MatchPhase::Accepting | MatchPhase::AwaitingOthers) => s,
            _ => return Err(ordering(phase, "matchReady")),
        };

        let mut effects = Vec::new();
        if session.timers.remove(TimerName::Accept) {
            effects.push(Effect::CancelTimer(TimerName::Accept));
        }
        effects.push(Effect::Ui(UiEvent::CloseDialog));

        let assignment = Assignment::from_match_ready(session.matchmaking_type, ready);
        let map = &assignment.map;
        match &map.map_url {
            Some(url) => effects.push(Effect::VerifyMap {
                epoch: session.epoch,
                hash: map.hash.clone(),
                format: map.map_data.format.clone(),
                url: url.clone(),
            }),
            None => warn!(hash = %map.hash, "chosen map has no download url"),
        }

        info!(
            epoch = %session.epoch,
            map = %assignment.map.name,
            slots = assignment.slots.len(),
            "match ready"
        );

        session.assignment = Some(assignment);
        session.phase = MatchPhase::Ready(ReadyStage::Countdown);
        session.countdown_ticks_remaining = countdown;
        session.timers.insert(TimerName::Countdown);

        effects.extend([
            Effect::StartTimer {
                timer: TimerName::Countdown,
                ticks: countdown,
            },
            Effect::Ui(UiEvent::Cue(Cue::CountdownStarted)),
            Effect::Ui(UiEvent::Navigate(View::Countdown)),
        ]);
        Ok(effects)
    }

    fn start_countdown(&mut self) -> Outcome {
        let phase = self.phase();
        let countdown = self.config.countdown_secs;
        let session = match self.session.as_mut() {
            Some(s) if s.phase == MatchPhase::Ready(ReadyStage::Countdown) => s,
            _ => return Err(ordering(phase, "startCountdown")),
        };

        session.countdown_ticks_remaining = countdown;
        session.timers.insert(TimerName::Countdown);
        Ok(vec![
            Effect::StartTimer {
                timer: TimerName::Countdown,
                ticks: countdown,
            },
            Effect::Ui(UiEvent::Cue(Cue::CountdownStarted)),
        ])
    }

    fn set_routes(&mut self, routes: SetRoutes) -> Outcome {
        let phase = self.phase();
        let session = match self.session.as_ref() {
            Some(s) if s.phase.is_ready() => s,
            _ => return Err(ordering(phase, "setRoutes")),
        };
        check_game_id(session, &routes.game_id, "setRoutes")?;

        Ok(vec![Effect::SetRoutes {
            game_id: routes.game_id,
            routes: routes.routes,
        }])
    }

    fn start_when_ready(&mut self, start: StartWhenReady) -> Outcome {
        let phase = self.phase();
        let session = match self.session.as_mut() {
            Some(s) if s.phase.is_ready() => s,
            _ => return Err(ordering(phase, "startWhenReady")),
        };
        check_game_id(session, &start.game_id, "startWhenReady")?;

        if let LaunchStatus::Issued { game_id } = &session.launch {
            debug!(%game_id, "launch already issued");
            return Ok(Vec::new());
        }

        let built = session
            .assignment
            .as_ref()
            .ok_or(LaunchError::MissingField("assignment"))
            .and_then(|assignment| self.builder.build(assignment));

        match built {
            Ok(request) => {
                info!(epoch = %session.epoch, game_id = %request.game_id, "issuing launch");
                session.launch = LaunchStatus::Issued {
                    game_id: request.game_id.clone(),
                };
                session.phase = MatchPhase::Ready(ReadyStage::Launching);
                Ok(vec![
                    Effect::Launch {
                        epoch: session.epoch,
                        request,
                    },
                    Effect::Ui(UiEvent::Navigate(View::GameStarting)),
                ])
            }
            Err(e) => {
                warn!(error = %e, "could not build launch request");
                Ok(self.cancel_session(MatchFailure::LaunchFailed(e)))
            }
        }
    }

    fn game_started(&mut self) -> Outcome {
        let phase = self.phase();
        let session = match self.session.as_mut() {
            Some(s) if s.phase == MatchPhase::Ready(ReadyStage::Launching) => s,
            _ => return Err(ordering(phase, "gameStarted")),
        };

        let game_id = match &session.launch {
            LaunchStatus::Issued { game_id } => game_id.clone(),
            LaunchStatus::NotIssued => return Err(ordering(phase, "gameStarted")),
        };

        let mut effects = Vec::new();
        if session.timers.remove(TimerName::Countdown) {
            effects.push(Effect::CancelTimer(TimerName::Countdown));
        }
        session.countdown_ticks_remaining = 0;
        session.phase = MatchPhase::Active;
        info!(epoch = %session.epoch, %game_id, "game started");

        effects.extend([
            Effect::Ui(UiEvent::Cue(Cue::AtmosphereFaded)),
            Effect::Ui(UiEvent::GameActive(ActiveGame {
                game_id,
                matchmaking_type: session.matchmaking_type,
            })),
            Effect::Ui(UiEvent::Navigate(View::ActiveGame)),
        ]);
        Ok(effects)
    }

    // -----------------------------------------------------------------------
    // Completions
    // -----------------------------------------------------------------------

    fn request_completed(&mut self, request: ServerRequest, result: Result<(), String>) -> Vec<Effect> {
        let mut effects = Vec::new();
        match (request, result) {
            (ServerRequest::AcceptMatch, Ok(())) => {
                if let Some(session) = self.session.as_mut().filter(|s| s.phase.is_accepting()) {
                    session.accept_confirmed = true;
                    if session.phase == MatchPhase::Accepting {
                        session.phase = MatchPhase::AwaitingOthers;
                    }
                }
            }
            (ServerRequest::AcceptMatch, Err(e)) => {
                warn!(error = %e, "accept request failed");
                if let Some(session) = self.session.as_mut().filter(|s| s.phase == MatchPhase::Accepting) {
                    if session.timers.contains(TimerName::Accept) {
                        session.phase = MatchPhase::MatchFound;
                    }
                    effects.push(Effect::Ui(UiEvent::Notice(format!("Failed to accept match: {e}"))));
                }
            }
            (ServerRequest::FindMatch { .. }, Err(e)) => {
                warn!(error = %e, "find match request failed");
                if self.session.is_none() && self.idle_phase == MatchPhase::Finding {
                    self.idle_phase = MatchPhase::Idle;
                    self.searching = None;
                    effects.push(Effect::Ui(UiEvent::Notice(format!("Failed to find match: {e}"))));
                }
            }
            (request, Err(e)) => warn!(request = request.name(), error = %e, "request failed"),
            (request, Ok(())) => debug!(request = request.name(), "request completed"),
        }
        effects
    }

    fn launch_completed(&mut self, result: Result<GameId, LaunchError>) -> Outcome {
        match result {
            Ok(game_id) => {
                debug!(%game_id, "game launch started");
                Ok(Vec::new())
            }
            Err(e) => {
                let phase = self.phase();
                if !phase.is_ready() {
                    return Err(ordering(phase, "launchFailed"));
                }
                warn!(error = %e, "game launch failed");
                Ok(self.cancel_session(MatchFailure::LaunchFailed(e)))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    fn cancel_loading(&mut self, cancel: CancelLoading) -> Outcome {
        let phase = self.phase();
        if self.session.is_none() || !phase.is_cancelable() {
            return Err(ordering(phase, "cancelLoading"));
        }
        Ok(self.cancel_session(MatchFailure::Canceled(cancel.reason)))
    }

    /// Destroys the session and leaves the machine in `Canceled`.
    fn cancel_session(&mut self, failure: MatchFailure) -> Vec<Effect> {
        let prompt_open = self.phase().is_accepting();
        let reason = failure.to_string();
        let notice = match failure {
            MatchFailure::Canceled(_) => LOAD_FAILED_NOTICE.to_string(),
            _ => reason.clone(),
        };

        let mut effects = Vec::new();
        self.close_session(&mut effects);
        self.idle_phase = MatchPhase::Canceled;
        self.searching = None;
        self.last_failure = Some(reason);

        if prompt_open {
            effects.push(Effect::Ui(UiEvent::CloseDialog));
        }
        effects.push(Effect::Ui(UiEvent::Navigate(View::Home)));
        effects.push(Effect::Ui(UiEvent::Notice(notice)));
        effects
    }

    fn disconnect(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.phase().is_accepting() {
            effects.push(Effect::Ui(UiEvent::CloseDialog));
        }
        if self.close_session(&mut effects).is_none() && self.idle_phase == MatchPhase::Finding {
            self.epoch = self.epoch.next();
        }
        self.idle_phase = MatchPhase::Idle;
        self.searching = None;
        self.last_failure = None;
        effects
    }

    /// Removes the session, queuing cancellation of its timers, teardown of
    /// an unfinished launch, and the close itself. Bumps the epoch so every
    /// completion still in flight for it goes stale.
    fn close_session(&mut self, effects: &mut Vec<Effect>) -> Option<MatchSession> {
        let session = self.session.take()?;

        effects.extend(session.timers.names().map(Effect::CancelTimer));
        if session.launch.is_issued() && session.phase != MatchPhase::Active {
            effects.push(Effect::TeardownLaunch);
        }
        effects.push(Effect::CloseSession { epoch: session.epoch });

        self.epoch = self.epoch.next();
        debug!(epoch = %session.epoch, phase = %session.phase, "session closed");
        Some(session)
    }

    /// Returns the session if `timer` is running for it.
    fn live_timer(&mut self, timer: TimerName, input: &'static str) -> Result<&mut MatchSession, Anomaly> {
        let phase = self.phase();
        match self.session.as_mut() {
            Some(s) if s.timers.contains(timer) => Ok(s),
            _ => Err(ordering(phase, input)),
        }
    }
}

fn ordering(phase: MatchPhase, input: &'static str) -> Anomaly {
    Anomaly::ProtocolOrdering { phase, input }
}

fn check_game_id(session: &MatchSession, game_id: &GameId, input: &'static str) -> Result<(), Anomaly> {
    let expected = session.assignment.as_ref().and_then(|a| a.game_id.as_ref());
    match expected {
        Some(expected) if expected != game_id => Err(Anomaly::InvalidPayload {
            input,
            reason: format!("game {game_id} does not match assigned game {expected}"),
        }),
        _ => Ok(()),
    }
}
