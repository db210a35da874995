use crate::core::bus::{BroadcastBus, Signal, Subscription};
use crate::core::coordinator::AudioCoordinator;
use crate::domain::model::{Command, PlayOutcome, PlayerStatus, RequestId, Track};
use crate::domain::ports::AudioSink;
use crate::utils::error::{PlayerError, Result};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum EngineInput {
    Signal(Signal),
    Toggle,
    Next,
    ToggleMute,
    /// The track at `index` played to its end.
    TrackEnded { index: usize },
    /// The source for the track at `index` failed, e.g. the stream dropped.
    SourceError { index: usize, message: String },
    PlaySettled {
        request: RequestId,
        outcome: PlayOutcome,
    },
    Shutdown,
}

/// Runs an [`AudioCoordinator`] against a sink.
///
/// All inputs (bus signals, player controls, play resolutions) go through one
/// channel and are handled in arrival order by a single task. Play attempts run
/// as separate tasks and report back through the same channel.
pub struct AudioEngine<S: AudioSink + 'static> {
    sink: Arc<S>,
    coordinator: AudioCoordinator,
    inbox: UnboundedReceiver<EngineInput>,
    outbox: WeakUnboundedSender<EngineInput>,
    status: watch::Sender<PlayerStatus>,
    _subscriptions: Vec<Subscription>,
}

impl<S: AudioSink + 'static> AudioEngine<S> {
    pub fn new(
        sink: Arc<S>,
        coordinator: AudioCoordinator,
        bus: &BroadcastBus,
    ) -> (Self, EngineHandle) {
        let (tx, inbox) = mpsc::unbounded_channel();
        let outbox = tx.downgrade();

        // Weak senders only: the bus must not keep a stopped engine's inbox open.
        let subscriptions: Vec<Subscription> = Signal::ALL
            .into_iter()
            .map(|signal| {
                let forward = tx.downgrade();
                bus.subscribe(signal, move |signal| {
                    forward
                        .upgrade()
                        .ok_or(PlayerError::EngineClosed)?
                        .send(EngineInput::Signal(signal))
                        .map_err(|_| PlayerError::EngineClosed)
                })
            })
            .collect();

        let (status, status_rx) = watch::channel(coordinator.status());
        let engine = Self {
            sink,
            coordinator,
            inbox,
            outbox,
            status,
            _subscriptions: subscriptions,
        };
        let handle = EngineHandle {
            tx,
            status: status_rx,
        };
        (engine, handle)
    }

    pub fn spawn(self) -> JoinHandle<PlayerStatus> {
        tokio::spawn(self.run())
    }

    /// Mounts the coordinator and processes inputs until shutdown or until
    /// every [`EngineHandle`] is dropped. Returns the final status.
    pub async fn run(mut self) -> PlayerStatus {
        tracing::info!(
            "🎵 Starting audio engine with {} track(s)",
            self.coordinator.playlist().len()
        );

        let commands = self.coordinator.mount();
        self.apply(commands).await;
        self.publish_status();

        while let Some(input) = self.inbox.recv().await {
            if input == EngineInput::Shutdown {
                break;
            }
            tracing::trace!("engine input: {:?}", input);
            let commands = self.dispatch(input);
            self.apply(commands).await;
            self.publish_status();
        }

        tracing::info!("Audio engine stopped");
        self.coordinator.status()
    }

    fn dispatch(&mut self, input: EngineInput) -> Vec<Command> {
        match input {
            EngineInput::Signal(signal) => self.coordinator.handle_signal(signal),
            EngineInput::Toggle => self.coordinator.toggle(),
            EngineInput::Next => self.coordinator.next(),
            EngineInput::ToggleMute => self.coordinator.toggle_mute(),
            EngineInput::TrackEnded { index } => self.coordinator.track_ended(index),
            EngineInput::SourceError { index, message } => {
                self.coordinator.load_failed(index, &message)
            }
            EngineInput::PlaySettled { request, outcome } => {
                self.coordinator.play_settled(request, outcome)
            }
            EngineInput::Shutdown => Vec::new(),
        }
    }

    async fn apply(&mut self, commands: Vec<Command>) {
        let mut queue = VecDeque::from(commands);
        while let Some(command) = queue.pop_front() {
            match command {
                Command::Load { index, track } => {
                    tracing::debug!("Loading track {}: {}", index, track.title);
                    match self.sink.load(&track).await {
                        Ok(()) => self.coordinator.load_succeeded(index),
                        Err(e) => {
                            queue.extend(self.coordinator.load_failed(index, &e.to_string()))
                        }
                    }
                }
                Command::Play { request, track } => {
                    // a failed load may already have replaced this request
                    if self.coordinator.is_current_request(request) {
                        self.spawn_play(request, track);
                    } else {
                        tracing::debug!("skipping superseded play request {}", request.0);
                    }
                }
                Command::Pause => log_failure("pause", self.sink.pause().await),
                Command::SetMuted(muted) => log_failure("mute", self.sink.set_muted(muted).await),
                Command::SetVolume(volume) => {
                    log_failure("volume", self.sink.set_volume(volume).await)
                }
            }
        }
    }

    fn spawn_play(&self, request: RequestId, track: Track) {
        let sink = Arc::clone(&self.sink);
        let outbox = self.outbox.clone();
        tokio::spawn(async move {
            let outcome = match sink.play(&track).await {
                Ok(()) => PlayOutcome::Started,
                Err(PlayerError::ResourceLoad { message, .. }) => PlayOutcome::LoadFailed(message),
                Err(e) => PlayOutcome::Rejected(e.to_string()),
            };
            if let Some(tx) = outbox.upgrade() {
                let _ = tx.send(EngineInput::PlaySettled { request, outcome });
            }
        });
    }

    fn publish_status(&self) {
        self.status.send_replace(self.coordinator.status());
    }
}

fn log_failure(action: &str, result: Result<()>) {
    if let Err(e) = result {
        tracing::warn!("sink {} failed: {}", action, e);
    }
}

/// Player controls and status for a running [`AudioEngine`].
#[derive(Clone)]
pub struct EngineHandle {
    tx: UnboundedSender<EngineInput>,
    status: watch::Receiver<PlayerStatus>,
}

impl EngineHandle {
    pub fn toggle(&self) -> Result<()> {
        self.send(EngineInput::Toggle)
    }

    pub fn next(&self) -> Result<()> {
        self.send(EngineInput::Next)
    }

    pub fn toggle_mute(&self) -> Result<()> {
        self.send(EngineInput::ToggleMute)
    }

    /// Reports that the track at `index` finished. Use the index from the
    /// status the source was started under, not the latest one.
    pub fn track_ended(&self, index: usize) -> Result<()> {
        self.send(EngineInput::TrackEnded { index })
    }

    pub fn source_error(&self, index: usize, message: impl Into<String>) -> Result<()> {
        self.send(EngineInput::SourceError {
            index,
            message: message.into(),
        })
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(EngineInput::Shutdown)
    }

    pub fn status(&self) -> PlayerStatus {
        self.status.borrow().clone()
    }

    /// Waits until the published status satisfies `predicate`.
    pub async fn wait_for<F>(&mut self, predicate: F) -> Result<PlayerStatus>
    where
        F: FnMut(&PlayerStatus) -> bool,
    {
        self.status
            .wait_for(predicate)
            .await
            .map(|status| status.clone())
            .map_err(|_| PlayerError::EngineClosed)
    }

    fn send(&self, input: EngineInput) -> Result<()> {
        self.tx.send(input).map_err(|_| PlayerError::EngineClosed)
    }
}
