use crate::core::bus::Signal;
use crate::core::playlist::Playlist;
use crate::domain::model::{
    Command, PauseReason, Phase, PlayOrigin, PlayOutcome, PlayRequest, PlaybackState,
    PlayerStatus, RequestId, Track,
};
use crate::domain::ports::PlayerSettings;
use crate::utils::error::Result;

pub const DEFAULT_VOLUME: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinatorOptions {
    pub volume: f32,
    /// Let the first click after a suppression resume playback.
    pub resume_on_interaction: bool,
}

impl Default for CoordinatorOptions {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            resume_on_interaction: true,
        }
    }
}

/// Owns the session playlist and playback state.
///
/// Every operation mutates state synchronously and returns the [`Command`]s
/// the audio source has to carry out. Play attempts are two-phase: they enter
/// [`Phase::Pending`] and only become [`Phase::Playing`] once
/// [`play_settled`](Self::play_settled) reports success for the same request.
///
/// `was_playing_before_suppression` is true only while suppressed, or while a
/// resume attempt out of suppression is pending.
#[derive(Debug)]
pub struct AudioCoordinator {
    playlist: Playlist,
    state: PlaybackState,
    options: CoordinatorOptions,
    next_request: u64,
    load_failures: usize,
    failure_run_start: Option<usize>,
    reload_needed: bool,
}

impl AudioCoordinator {
    pub fn new(playlist: Playlist, options: CoordinatorOptions) -> Self {
        Self {
            playlist,
            state: PlaybackState::new(options.volume),
            options,
            next_request: 0,
            load_failures: 0,
            failure_run_start: None,
            reload_needed: false,
        }
    }

    /// Shuffles the configured tracks into this session's playlist.
    pub fn from_settings<C: PlayerSettings + ?Sized>(settings: &C) -> Result<Self> {
        let playlist = Playlist::for_session(settings.tracks(), settings.seed())?;
        let options = CoordinatorOptions {
            volume: settings.volume(),
            resume_on_interaction: settings.resume_on_interaction(),
        };
        Ok(Self::new(playlist, options))
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn current_track(&self) -> &Track {
        &self.playlist.tracks()[self.state.current_index]
    }

    pub fn is_current_request(&self, id: RequestId) -> bool {
        self.state.phase.pending_request().map(|r| r.id) == Some(id)
    }

    pub fn status(&self) -> PlayerStatus {
        let track = self.current_track();
        PlayerStatus {
            index: self.state.current_index,
            title: track.title.clone(),
            url: track.url.clone(),
            phase: self.state.phase,
            playing: self.state.is_playing(),
            muted: self.state.muted,
            consent_given: self.state.consent_given,
            volume: self.state.volume,
        }
    }

    /// Prepares the first track without playing it.
    pub fn mount(&mut self) -> Vec<Command> {
        self.state.volume = self.options.volume;
        vec![
            Command::SetVolume(self.state.volume),
            Command::Load {
                index: self.state.current_index,
                track: self.current_track().clone(),
            },
        ]
    }

    pub fn handle_signal(&mut self, signal: Signal) -> Vec<Command> {
        match signal {
            Signal::EnableAudio => self.enable_audio(),
            Signal::RequestSuppress => self.request_suppress(),
            Signal::RequestResume => self.request_resume(),
            Signal::Interaction => self.interaction(),
        }
    }

    pub fn enable_audio(&mut self) -> Vec<Command> {
        self.state.consent_given = true;
        self.state.muted = false;
        self.state.volume = self.options.volume;

        let mut commands = vec![
            Command::SetVolume(self.state.volume),
            Command::SetMuted(false),
        ];
        if self.state.is_playing() {
            tracing::debug!("enable-audio while already playing");
            return commands;
        }
        commands.extend(self.start(PlayOrigin::Consent));
        commands
    }

    /// The disc click: pause when playing, play otherwise.
    pub fn toggle(&mut self) -> Vec<Command> {
        if self.state.is_playing() {
            self.state.phase = Phase::paused(PauseReason::User);
            self.state.was_playing_before_suppression = false;
            self.state.resume_armed = false;
            tracing::info!("⏸ paused '{}'", self.current_track().title);
            return vec![Command::Pause];
        }
        self.state.consent_given = true;
        self.start(PlayOrigin::Toggle)
    }

    pub fn next(&mut self) -> Vec<Command> {
        self.state.consent_given = true;
        let load = self.advance();
        vec![load, self.begin_play(PlayOrigin::Skip)]
    }

    /// `index` is the track that finished. Ends reported for another track,
    /// or while a play attempt is still pending, are stale.
    pub fn track_ended(&mut self, index: usize) -> Vec<Command> {
        if self.state.phase != Phase::Playing || index != self.state.current_index {
            tracing::debug!(
                "ignoring end of track {} while {:?} on track {}",
                index,
                self.state.phase,
                self.state.current_index
            );
            return Vec::new();
        }
        let load = self.advance();
        vec![load, self.begin_play(PlayOrigin::AutoAdvance)]
    }

    /// Unmuting is a request to hear sound, so it also starts playback when
    /// nothing is playing. Muting leaves the phase alone.
    pub fn toggle_mute(&mut self) -> Vec<Command> {
        self.state.muted = !self.state.muted;
        let mut commands = vec![Command::SetMuted(self.state.muted)];
        if !self.state.muted && !self.state.is_playing() {
            self.state.consent_given = true;
            commands.extend(self.start(PlayOrigin::Unmute));
        }
        commands
    }

    pub fn request_suppress(&mut self) -> Vec<Command> {
        if !self.state.is_playing() {
            tracing::debug!("suppress ignored while {:?}", self.state.phase);
            return Vec::new();
        }
        self.state.phase = Phase::paused(PauseReason::Suppression);
        self.state.was_playing_before_suppression = true;
        self.state.resume_armed = self.options.resume_on_interaction;
        tracing::info!("🔇 background audio suppressed");
        vec![Command::Pause]
    }

    pub fn request_resume(&mut self) -> Vec<Command> {
        self.resume(PlayOrigin::Resume)
    }

    /// Generic click. Acts as a resume at most once per suppression episode.
    pub fn interaction(&mut self) -> Vec<Command> {
        if !self.state.resume_armed {
            return Vec::new();
        }
        let commands = self.resume(PlayOrigin::Interaction);
        if !commands.is_empty() {
            self.state.resume_armed = false;
        }
        commands
    }

    pub fn play_settled(&mut self, id: RequestId, outcome: PlayOutcome) -> Vec<Command> {
        let Some(request) = self.state.phase.pending_request().filter(|r| r.id == id) else {
            tracing::debug!("ignoring stale resolution of request {}: {:?}", id.0, outcome);
            // a late start must not leave the source audible behind a pause
            if outcome == PlayOutcome::Started && !self.state.is_playing() {
                return vec![Command::Pause];
            }
            return Vec::new();
        };

        match outcome {
            PlayOutcome::Started => {
                self.state.phase = Phase::Playing;
                self.state.was_playing_before_suppression = false;
                self.state.resume_armed = false;
                self.clear_load_failures();
                tracing::info!("▶ playing '{}'", self.current_track().title);
                Vec::new()
            }
            PlayOutcome::Rejected(reason) => {
                let reason_kind = if request.origin.is_resume() {
                    PauseReason::Suppression
                } else {
                    PauseReason::Blocked
                };
                self.state.phase = Phase::paused(reason_kind);
                tracing::warn!(
                    "playback rejected ({:?}): {}; waiting for the next gesture",
                    request.origin,
                    reason
                );
                Vec::new()
            }
            PlayOutcome::LoadFailed(message) => self.load_failed(request.index, &message),
        }
    }

    /// The sink accepted the track at `index`, which ends any failure run.
    pub fn load_succeeded(&mut self, index: usize) {
        if index == self.state.current_index {
            self.clear_load_failures();
        }
    }

    /// The track at `index` could not be loaded. Skips ahead instead of
    /// stalling, and gives up after every track failed in a row.
    pub fn load_failed(&mut self, index: usize, message: &str) -> Vec<Command> {
        if index != self.state.current_index {
            tracing::debug!("ignoring load failure for stale track {}", index);
            return Vec::new();
        }

        let run_start = *self.failure_run_start.get_or_insert(index);
        self.load_failures += 1;
        tracing::warn!(
            "failed to load '{}' ({}): {}",
            self.current_track().title,
            self.current_track().url,
            message
        );

        if self.load_failures >= self.playlist.len() {
            tracing::error!("every track failed to load; staying paused");
            self.clear_load_failures();
            // back to where the run began; the next gesture reloads it
            self.state.current_index = run_start;
            self.reload_needed = true;
            if self.state.is_playing() {
                self.state.phase = Phase::paused(PauseReason::Blocked);
                self.state.was_playing_before_suppression = false;
                self.state.resume_armed = false;
            }
            return Vec::new();
        }

        let pending = self.state.phase.pending_request();
        let wanted = self.state.is_playing();
        let mut commands = vec![self.advance()];
        if wanted {
            let origin = pending.map_or(PlayOrigin::AutoAdvance, |r| r.origin);
            commands.push(self.begin_play(origin));
        }
        commands
    }

    fn resume(&mut self, origin: PlayOrigin) -> Vec<Command> {
        if self.state.phase != Phase::paused(PauseReason::Suppression) {
            tracing::debug!("{:?} ignored while {:?}", origin, self.state.phase);
            return Vec::new();
        }
        if !self.state.was_playing_before_suppression {
            return Vec::new();
        }
        if self.state.muted {
            tracing::debug!("{:?} ignored while muted", origin);
            return Vec::new();
        }
        self.start(origin)
    }

    /// Plays the current track, reloading it first after a give-up.
    fn start(&mut self, origin: PlayOrigin) -> Vec<Command> {
        let mut commands = Vec::with_capacity(2);
        if std::mem::take(&mut self.reload_needed) {
            commands.push(self.load_current());
        }
        commands.push(self.begin_play(origin));
        commands
    }

    fn begin_play(&mut self, origin: PlayOrigin) -> Command {
        self.next_request += 1;
        let request = PlayRequest {
            id: RequestId(self.next_request),
            origin,
            index: self.state.current_index,
        };
        if !origin.is_resume() {
            // an explicit gesture ends any suppression episode
            self.state.was_playing_before_suppression = false;
            self.state.resume_armed = false;
        }
        self.state.phase = Phase::Pending { request };
        Command::Play {
            request: request.id,
            track: self.current_track().clone(),
        }
    }

    fn advance(&mut self) -> Command {
        self.state.current_index = self.playlist.next_index(self.state.current_index);
        self.reload_needed = false;
        self.load_current()
    }

    fn load_current(&self) -> Command {
        Command::Load {
            index: self.state.current_index,
            track: self.current_track().clone(),
        }
    }

    fn clear_load_failures(&mut self) {
        self.load_failures = 0;
        self.failure_run_start = None;
    }
}
