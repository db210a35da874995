use std::sync::Arc;
use std::time::Duration;
use vinyl_deck::domain::model::{PauseReason, Phase, PlayerStatus, Track};
use vinyl_deck::{
    AudioCoordinator, AudioEngine, AutoplayPolicy, BroadcastBus, CoordinatorOptions,
    EngineHandle, Playlist, Signal, SimulatedSink, SinkEvent,
};

fn tracks(titles: &[&str]) -> Vec<Track> {
    titles
        .iter()
        .map(|t| Track::new(*t, format!("https://cdn.example.com/{}.mp3", t)))
        .collect()
}

fn start(
    sink: Arc<SimulatedSink>,
    titles: &[&str],
    bus: &BroadcastBus,
) -> (EngineHandle, tokio::task::JoinHandle<PlayerStatus>) {
    let playlist = Playlist::in_order(tracks(titles)).unwrap();
    let coordinator = AudioCoordinator::new(playlist, CoordinatorOptions::default());
    let (engine, handle) = AudioEngine::new(sink, coordinator, bus);
    (handle, engine.spawn())
}

async fn settle<F>(handle: &mut EngineHandle, predicate: F) -> PlayerStatus
where
    F: FnMut(&PlayerStatus) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), handle.wait_for(predicate))
        .await
        .expect("timed out waiting for player status")
        .expect("engine stopped")
}

fn confirmed(status: &PlayerStatus) -> bool {
    status.phase == Phase::Playing
}

fn suppressed(status: &PlayerStatus) -> bool {
    status.phase
        == Phase::Paused {
            reason: PauseReason::Suppression,
        }
}

#[tokio::test]
async fn test_consent_starts_playback_at_default_volume() {
    let bus = BroadcastBus::new();
    let sink = Arc::new(SimulatedSink::default());
    let (mut handle, _task) = start(Arc::clone(&sink), &["A", "B"], &bus);

    assert!(!handle.status().consent_given);
    bus.publish(Signal::EnableAudio);

    let status = settle(&mut handle, confirmed).await;
    assert_eq!(status.title, "A");
    assert!(status.consent_given);
    assert!(sink.is_playing());
    assert!(!sink.is_muted());
    assert_eq!(sink.volume(), 0.4);
}

#[tokio::test]
async fn test_repeated_consent_does_not_restart_playback() {
    let bus = BroadcastBus::new();
    let sink = Arc::new(SimulatedSink::default());
    let (mut handle, _task) = start(Arc::clone(&sink), &["A", "B"], &bus);

    bus.publish(Signal::EnableAudio);
    settle(&mut handle, confirmed).await;

    bus.publish(Signal::EnableAudio);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(sink.play_count(), 1);
    assert_eq!(handle.status().phase, Phase::Playing);
    assert_eq!(sink.volume(), 0.4);
}

#[tokio::test]
async fn test_video_suppression_round_trip() {
    let bus = BroadcastBus::new();
    let sink = Arc::new(SimulatedSink::default());
    let (mut handle, _task) = start(Arc::clone(&sink), &["A", "B", "C"], &bus);

    bus.publish(Signal::EnableAudio);
    settle(&mut handle, confirmed).await;

    bus.publish(Signal::RequestSuppress);
    settle(&mut handle, suppressed).await;
    assert!(!sink.is_playing());

    bus.publish(Signal::RequestResume);
    let status = settle(&mut handle, confirmed).await;
    assert_eq!(status.index, 0);
    assert!(sink.is_playing());
}

#[tokio::test]
async fn test_muted_player_stays_paused_on_resume() {
    let bus = BroadcastBus::new();
    let sink = Arc::new(SimulatedSink::default());
    let (mut handle, _task) = start(Arc::clone(&sink), &["A", "B"], &bus);

    bus.publish(Signal::EnableAudio);
    settle(&mut handle, confirmed).await;
    bus.publish(Signal::RequestSuppress);
    settle(&mut handle, suppressed).await;

    handle.toggle_mute().unwrap();
    settle(&mut handle, |s| s.muted).await;
    bus.publish(Signal::RequestResume);
    bus.publish(Signal::Interaction);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(suppressed(&handle.status()));
    assert!(!sink.is_playing());
    assert_eq!(sink.play_count(), 1);
}

#[tokio::test]
async fn test_track_end_walks_the_playlist_and_wraps() {
    let bus = BroadcastBus::new();
    let sink = Arc::new(SimulatedSink::default());
    let (mut handle, _task) = start(Arc::clone(&sink), &["A", "B", "C"], &bus);

    bus.publish(Signal::EnableAudio);
    settle(&mut handle, confirmed).await;

    handle.track_ended(0).unwrap();
    settle(&mut handle, |s| confirmed(s) && s.index == 1).await;
    handle.track_ended(1).unwrap();
    let status = settle(&mut handle, |s| confirmed(s) && s.index == 2).await;
    assert_eq!(status.title, "C");

    handle.track_ended(2).unwrap();
    let status = settle(&mut handle, |s| confirmed(s) && s.index == 0).await;
    assert_eq!(status.title, "A");
    assert_eq!(sink.loaded().unwrap().title, "A");
}

#[tokio::test]
async fn test_rapid_skips_settle_on_the_last_track() {
    let bus = BroadcastBus::new();
    let slow = tracks(&["B"]).remove(0);
    let sink = Arc::new(
        SimulatedSink::default().with_track_latency(slow.url.clone(), Duration::from_millis(150)),
    );
    let (mut handle, _task) = start(Arc::clone(&sink), &["A", "B", "C"], &bus);

    bus.publish(Signal::EnableAudio);
    settle(&mut handle, confirmed).await;

    handle.next().unwrap();
    handle.next().unwrap();
    settle(&mut handle, |s| confirmed(s) && s.index == 2).await;

    // let the slow request for B resolve
    tokio::time::sleep(Duration::from_millis(250)).await;

    let status = handle.status();
    assert_eq!(status.phase, Phase::Playing);
    assert_eq!(status.title, "C");
    assert_eq!(sink.loaded().unwrap().title, "C");
    assert!(sink.is_playing());
    assert!(sink.events().contains(&SinkEvent::Rejected("B".to_string())));
}

#[tokio::test]
async fn test_end_of_skipped_track_does_not_advance_again() {
    let bus = BroadcastBus::new();
    let sink = Arc::new(SimulatedSink::default());
    let (mut handle, _task) = start(Arc::clone(&sink), &["A", "B", "C"], &bus);

    bus.publish(Signal::EnableAudio);
    settle(&mut handle, confirmed).await;

    // A finishes just as the listener skips to B
    handle.next().unwrap();
    handle.track_ended(0).unwrap();
    handle.source_error(0, "stream dropped").unwrap();
    settle(&mut handle, |s| confirmed(s) && s.index == 1).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let status = handle.status();
    assert_eq!(status.index, 1);
    assert_eq!(status.title, "B");
    assert_eq!(sink.loaded().unwrap().title, "B");
}

#[tokio::test]
async fn test_one_dead_track_never_exhausts_the_playlist() {
    let bus = BroadcastBus::new();
    let dead = tracks(&["B"]).remove(0);
    let sink = Arc::new(SimulatedSink::new(AutoplayPolicy::Deny).with_unreachable(dead.url));
    let (mut handle, _task) = start(Arc::clone(&sink), &["A", "B", "C"], &bus);

    let blocked = |s: &PlayerStatus| {
        s.phase
            == Phase::Paused {
                reason: PauseReason::Blocked,
            }
    };
    bus.publish(Signal::EnableAudio);
    settle(&mut handle, blocked).await;

    for step in 0..9 {
        let before = handle.status().index;
        handle.next().unwrap();
        let status = settle(&mut handle, |s| blocked(s) && s.index != before).await;
        assert_ne!(status.title, "B", "rested on the dead track at step {}", step);
        assert_eq!(sink.loaded().unwrap().title, status.title);
    }
}

#[tokio::test]
async fn test_blocked_autoplay_waits_for_a_gesture() {
    let bus = BroadcastBus::new();
    let sink = Arc::new(SimulatedSink::new(AutoplayPolicy::RequireGesture));
    let (mut handle, _task) = start(Arc::clone(&sink), &["A"], &bus);

    bus.publish(Signal::EnableAudio);
    let status = settle(&mut handle, |s| {
        s.phase
            == Phase::Paused {
                reason: PauseReason::Blocked,
            }
    })
    .await;
    assert!(!status.playing);

    sink.unlock();
    handle.toggle().unwrap();
    settle(&mut handle, confirmed).await;
    assert!(sink.is_playing());
}

#[tokio::test]
async fn test_click_resumes_once_after_suppression() {
    let bus = BroadcastBus::new();
    let sink = Arc::new(SimulatedSink::default());
    let (mut handle, _task) = start(Arc::clone(&sink), &["A"], &bus);

    bus.publish(Signal::EnableAudio);
    settle(&mut handle, confirmed).await;
    bus.publish(Signal::RequestSuppress);
    settle(&mut handle, suppressed).await;

    bus.publish(Signal::Interaction);
    settle(&mut handle, confirmed).await;

    // once resumed, clicks no longer touch playback
    handle.toggle().unwrap();
    settle(&mut handle, |s| !s.playing).await;
    bus.publish(Signal::Interaction);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(
        handle.status().phase,
        Phase::Paused {
            reason: PauseReason::User
        }
    );
}

#[tokio::test]
async fn test_unreachable_track_is_skipped() {
    let bus = BroadcastBus::new();
    let dead = tracks(&["A"]).remove(0);
    let sink = Arc::new(SimulatedSink::default().with_unreachable(dead.url));
    let (mut handle, _task) = start(Arc::clone(&sink), &["A", "B", "C"], &bus);

    bus.publish(Signal::EnableAudio);
    let status = settle(&mut handle, confirmed).await;

    assert_eq!(status.title, "B");
    assert_eq!(sink.loaded().unwrap().title, "B");
}

#[tokio::test]
async fn test_failing_subscriber_does_not_starve_the_player() {
    let bus = BroadcastBus::new();
    let _broken = bus.subscribe(Signal::EnableAudio, |_| panic!("overlay crashed"));
    let sink = Arc::new(SimulatedSink::default());
    let (mut handle, _task) = start(Arc::clone(&sink), &["A"], &bus);

    let delivery = bus.publish(Signal::EnableAudio);

    assert_eq!(delivery.failed, 1);
    assert_eq!(delivery.delivered, 1);
    settle(&mut handle, confirmed).await;
}

#[tokio::test]
async fn test_shutdown_releases_bus_subscriptions() {
    let bus = BroadcastBus::new();
    let sink = Arc::new(SimulatedSink::default());
    let (handle, task) = start(sink, &["A"], &bus);

    for signal in Signal::ALL {
        assert_eq!(bus.subscriber_count(signal), 1);
    }

    handle.shutdown().unwrap();
    let final_status = task.await.unwrap();

    assert_eq!(final_status.phase, Phase::Idle);
    for signal in Signal::ALL {
        assert_eq!(bus.subscriber_count(signal), 0);
    }
    assert_eq!(bus.publish(Signal::EnableAudio).delivered, 0);
}
