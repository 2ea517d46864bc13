use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tubemark_core::{
    Emotion, Gender, PlaybackEvent, RecordId, Session, Settings, SimulatedPlayer, TimestampField,
    TubemarkError, VideoPlayer, format_playback_status, format_record_line,
    format_records_readable, player_ready, resolve,
};

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "tubemark")]
#[command(about = "Mark, tag and replay timestamp segments on YouTube videos")]
struct Cli {
    /// Timestamp document to work on (defaults to the configured export file name)
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Settings file (defaults to <config dir>/tubemark/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start an empty timestamp document for a video
    New {
        /// YouTube URL (watch, share or embed link)
        url: String,
    },

    /// Print the video id a reference resolves to
    Resolve { reference: String },

    /// Show the video and its timestamps
    List,

    /// Add a timestamp at the given playhead position
    Add {
        /// Playhead position in seconds
        #[arg(long)]
        at: f64,
    },

    /// Change one field of a timestamp
    Edit {
        #[arg(allow_negative_numbers = true)]
        id: RecordId,

        /// start, end, emotion or gender
        field: TimestampField,

        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Play a single timestamp segment and stop at its end
    Play {
        #[arg(allow_negative_numbers = true)]
        id: RecordId,

        /// Playback rate of the simulated player
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
    },
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .expect("static spinner template"),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    // RUST_LOG, when set, takes precedence over -v
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn check(msg: impl std::fmt::Display) {
    println!("{} {}", style("✓").green().bold(), msg);
}

fn notice(msg: impl std::fmt::Display) {
    println!("{} {}", style("!").yellow().bold(), msg);
}

fn known_tags(field: TimestampField) -> Option<Vec<&'static str>> {
    match field {
        TimestampField::Emotion => Some(Emotion::ALL.iter().map(|e| e.as_str()).collect()),
        TimestampField::Gender => Some(Gender::ALL.iter().map(|g| g.as_str()).collect()),
        TimestampField::Start | TimestampField::End => None,
    }
}

/// Session with a simulated player attached, its playhead at `position`.
async fn attach_simulated_player(
    session: &mut Session,
    position: f64,
    rate: f64,
) -> Result<Arc<SimulatedPlayer>> {
    let player = Arc::new(SimulatedPlayer::with_rate(rate));
    player.seek_to(position, true).await;

    let (sender, ready) = player_ready();
    if sender.ready(player.clone()).is_err() {
        bail!(TubemarkError::PlayerUnavailable);
    }
    session.attach_player(ready).await?;
    Ok(player)
}

async fn run(cli: Cli) -> Result<()> {
    let settings = match &cli.settings {
        Some(path) => Settings::load_from(path)?,
        None => Settings::load()?,
    };
    let path = cli
        .file
        .unwrap_or_else(|| PathBuf::from(&settings.export_file_name));
    let mut session = Session::new(settings.controller_config());

    match cli.command {
        Command::New { url } => {
            let video_id = session.load_video(&url)?;
            session.save_to(&path).await?;
            check(format!(
                "Video {} ready in {}",
                style(video_id).yellow(),
                style(path.display()).cyan()
            ));
        }

        Command::Resolve { reference } => {
            let video_id = resolve(&reference)
                .ok_or(TubemarkError::UnresolvableVideoReference { reference })?;
            println!("{}  {}", video_id, style(video_id.watch_url()).dim());
        }

        Command::List => {
            session.load_from(&path).await?;
            print!(
                "{}",
                format_records_readable(session.video(), session.timestamps())
            );
        }

        Command::Add { at } => {
            if !at.is_finite() || at < 0.0 {
                bail!("playhead position must be a non-negative number of seconds");
            }
            session.load_from(&path).await?;
            attach_simulated_player(&mut session, at, 1.0).await?;

            let record = session
                .add_timestamp()
                .await
                .context("no player attached")?;
            session.save_to(&path).await?;
            check(format!("Added {}", format_record_line(&record)));
        }

        Command::Edit { id, field, value } => {
            session.load_from(&path).await?;
            if !session.edit_timestamp(id, field, &value) {
                notice(format!("No timestamp with id {id}, nothing changed"));
                return Ok(());
            }
            session.save_to(&path).await?;
            if let Some(record) = session.store().get(id) {
                check(format!("Updated {}", format_record_line(record)));
            }
            if let Some(known) = known_tags(field) {
                if !known.contains(&value.as_str()) {
                    notice(format!("'{value}' stored as-is; offered values are {}", known.join(", ")));
                }
            }
        }

        Command::Play { id, speed } => {
            if !speed.is_finite() || speed <= 0.0 {
                bail!("speed must be greater than zero");
            }
            session.load_from(&path).await?;
            let Some(start) = session.store().get(id).map(|r| r.start) else {
                notice(format!("No timestamp with id {id}"));
                return Ok(());
            };
            attach_simulated_player(&mut session, start, speed).await?;

            let mut events = session
                .subscribe()
                .context("no player attached")?;
            let started_at = Instant::now();
            session.play(id).await;

            let spinner = create_spinner(&format_playback_status(&session.playback_state().await));
            loop {
                match events.recv().await {
                    Ok(PlaybackEvent::Finished { segment, position }) if segment.id == id => {
                        spinner.finish_with_message(format!(
                            "{} Stopped at {:.2}s {}",
                            style("✓").green().bold(),
                            position,
                            style(format!("[{}]", format_duration(started_at.elapsed()))).dim()
                        ));
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        spinner.abandon();
                        return Err(e).context("playback events closed");
                    }
                }
            }

            println!("{}", style(format_playback_status(&session.playback_state().await)).dim());
            session.shutdown().await;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn edit_accepts_negative_values() {
        let cli = Cli::try_parse_from(["tubemark", "edit", "1700000000000", "start", "-5"]).unwrap();
        match cli.command {
            Command::Edit { id, field, value } => {
                assert_eq!(id, RecordId::Int(1_700_000_000_000));
                assert_eq!(field, TimestampField::Start);
                assert_eq!(value, "-5");
            }
            _ => panic!("expected edit"),
        }
    }

    #[test]
    fn imported_ids_can_be_addressed() {
        let cli = Cli::try_parse_from(["tubemark", "play", "-3"]).unwrap();
        assert!(matches!(cli.command, Command::Play { id: RecordId::NegInt(-3), .. }));

        let cli = Cli::try_parse_from(["tubemark", "edit", "12.5", "end", "4"]).unwrap();
        assert!(matches!(cli.command, Command::Edit { id: RecordId::Float(f), .. } if f == 12.5));
    }

    #[test]
    fn unknown_field_is_rejected() {
        assert!(Cli::try_parse_from(["tubemark", "edit", "1", "duration", "3"]).is_err());
    }

    #[test]
    fn durations_read_naturally() {
        assert_eq!(format_duration(Duration::from_millis(10_300)), "10.3s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }
}
