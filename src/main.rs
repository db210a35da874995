use clap::Parser;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use vinyl_deck::domain::model::PlayerStatus;
use vinyl_deck::domain::ports::AudioSink;
use vinyl_deck::utils::error::{ErrorSeverity, PlayerError};
use vinyl_deck::utils::logger::{self, LogFormat};
use vinyl_deck::utils::validation::Validate;
use vinyl_deck::{
    AudioCoordinator, AudioEngine, BroadcastBus, CliConfig, EngineHandle, PlayerConfig,
    ProbingSink, Signal, SimulatedSink,
};

const HELP: &str = "\
commands:
  enable     consent to music (enable-audio)
  suppress   something needs silence (request-suppress)
  resume     silence no longer needed (request-resume)
  click      generic page click (interaction)
  toggle     click the disc: play / pause
  next       skip to the next track
  mute       toggle mute
  end        the current track finished
  fail       the current source errored
  status     print the player status
  quit       stop the player";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let format = if cli.json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    logger::init_logger(format, cli.verbose)?;

    tracing::info!("Starting vinyl-deck");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_player_config().and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let simulated = Arc::new(SimulatedSink::new(config.autoplay()).with_latency(config.latency()));
    let coordinator = match AudioCoordinator::from_settings(&config) {
        Ok(coordinator) => coordinator,
        Err(e) => exit_with(&e),
    };

    if config.probe_enabled() {
        tracing::info!("🔍 Probing track locators before loading");
        let probing = ProbingSink::new(Arc::clone(&simulated), config.probe_timeout())?;
        run_console(Arc::new(probing), simulated, coordinator, &config, cli.json).await
    } else {
        run_console(Arc::clone(&simulated), simulated, coordinator, &config, cli.json).await
    }
}

async fn run_console<S: AudioSink + 'static>(
    sink: Arc<S>,
    simulated: Arc<SimulatedSink>,
    coordinator: AudioCoordinator,
    config: &PlayerConfig,
    json: bool,
) -> anyhow::Result<()> {
    let bus = BroadcastBus::new();
    let (engine, handle) = AudioEngine::new(sink, coordinator, &bus);
    let task = engine.spawn();

    tracing::info!(
        "Autoplay policy: {:?}, {} track(s)",
        config.autoplay(),
        config.tracks.len()
    );
    if !json {
        println!("{}", HELP);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let result = match line.trim() {
            "" => continue,
            "enable" | "yes" => {
                simulated.unlock();
                publish(&bus, Signal::EnableAudio)
            }
            "suppress" => publish(&bus, Signal::RequestSuppress),
            "resume" => publish(&bus, Signal::RequestResume),
            "click" => {
                simulated.unlock();
                publish(&bus, Signal::Interaction)
            }
            "toggle" => {
                simulated.unlock();
                handle.toggle()
            }
            "next" => {
                simulated.unlock();
                handle.next()
            }
            "mute" => {
                simulated.unlock();
                handle.toggle_mute()
            }
            "end" => handle.track_ended(handle.status().index),
            "fail" => handle.source_error(handle.status().index, "stream dropped"),
            "status" => {
                print_status(&handle.status(), json)?;
                continue;
            }
            "help" => {
                println!("{}", HELP);
                continue;
            }
            "quit" | "exit" => break,
            other => match other.parse::<Signal>() {
                Ok(signal) => publish(&bus, signal),
                Err(_) => {
                    eprintln!("unknown command '{}', try 'help'", other);
                    continue;
                }
            },
        };

        if let Err(e) = result {
            tracing::error!("❌ {}", e);
            break;
        }
    }

    shutdown(&handle);
    let final_status = task.await?;
    print_status(&final_status, json)?;
    Ok(())
}

fn publish(bus: &BroadcastBus, signal: Signal) -> vinyl_deck::Result<()> {
    let delivery = bus.publish(signal);
    if delivery.delivered == 0 {
        return Err(PlayerError::EngineClosed);
    }
    Ok(())
}

fn shutdown(handle: &EngineHandle) {
    if let Err(e) = handle.shutdown() {
        tracing::debug!("engine already stopped: {}", e);
    }
}

fn print_status(status: &PlayerStatus, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(status)?);
        return Ok(());
    }
    let icon = if status.playing { "▶" } else { "⏸" };
    println!(
        "{} [{}] {} ({:?}{}{})",
        icon,
        status.index,
        status.title,
        status.phase,
        if status.muted { ", muted" } else { "" },
        if status.consent_given { "" } else { ", awaiting consent" },
    );
    Ok(())
}

fn exit_with(e: &PlayerError) -> ! {
    tracing::error!(
        "❌ vinyl-deck failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
