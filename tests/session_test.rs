use vinyl_deck::domain::model::{Command, PlayOutcome};
use vinyl_deck::domain::ports::PlayerSettings;
use vinyl_deck::{AudioCoordinator, PlayerConfig};

const THREE_TRACKS: &str = r#"
[player]
seed = 11

[[tracks]]
title = "A"
url = "https://cdn.example.com/a.mp3"

[[tracks]]
title = "B"
url = "https://cdn.example.com/b.mp3"

[[tracks]]
title = "C"
url = "https://cdn.example.com/c.mp3"
"#;

fn settle(coordinator: &mut AudioCoordinator, commands: &[Command]) {
    for command in commands {
        if let Command::Play { request, .. } = command {
            coordinator.play_settled(*request, PlayOutcome::Started);
        }
    }
}

#[test]
fn test_configured_session_is_a_permutation() {
    let config = PlayerConfig::from_toml_str(THREE_TRACKS).unwrap();
    let coordinator = AudioCoordinator::from_settings(&config).unwrap();

    let mut session: Vec<_> = coordinator.playlist().tracks().to_vec();
    let mut source = config.tracks().to_vec();
    session.sort_by(|a, b| a.title.cmp(&b.title));
    source.sort_by(|a, b| a.title.cmp(&b.title));
    assert_eq!(session, source);
}

#[test]
fn test_shuffled_session_walks_and_wraps() {
    let config = PlayerConfig::from_toml_str(THREE_TRACKS).unwrap();
    let mut coordinator = AudioCoordinator::from_settings(&config).unwrap();
    let order = coordinator.playlist().tracks().to_vec();

    coordinator.mount();
    let commands = coordinator.enable_audio();
    settle(&mut coordinator, &commands);
    assert_eq!(coordinator.current_track(), &order[0]);

    for _ in 0..2 {
        let index = coordinator.state().current_index;
        let commands = coordinator.track_ended(index);
        settle(&mut coordinator, &commands);
    }
    assert_eq!(coordinator.state().current_index, 2);
    assert_eq!(coordinator.current_track(), &order[2]);

    let commands = coordinator.track_ended(2);
    settle(&mut coordinator, &commands);
    assert_eq!(coordinator.state().current_index, 0);
    assert_eq!(coordinator.current_track(), &order[0]);
}

#[test]
fn test_same_seed_gives_same_session() {
    let config = PlayerConfig::from_toml_str(THREE_TRACKS).unwrap();
    let a = AudioCoordinator::from_settings(&config).unwrap();
    let b = AudioCoordinator::from_settings(&config).unwrap();
    assert_eq!(a.playlist(), b.playlist());
}
