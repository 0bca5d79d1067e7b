use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use pomotray_core::storage::data_dir;
use pomotray_core::{
    Collaborators, CompletionDispatcher, ConfigSettings, Event, SettingsStore, SystemClock,
    TimerMode,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use crate::terminal::{StatusLine, TerminalBell, TerminalNotifier};
use crate::writer::SessionWriter;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Args)]
pub struct RunArgs {
    /// Mode to begin in (work, short-break, long-break)
    #[arg(long, default_value = "work")]
    pub mode: TimerMode,
    /// Start the countdown immediately
    #[arg(long)]
    pub start: bool,
}

/// A line typed while the timer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    Reset,
    Mode(TimerMode),
    Break,
    SetDuration(TimerMode, i64),
    Status,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let head = words.next().unwrap_or_default().to_ascii_lowercase();
    let command = match head.as_str() {
        "s" | "start" => Command::Start,
        "p" | "pause" => Command::Pause,
        "r" | "reset" => Command::Reset,
        "w" | "work" => Command::Mode(TimerMode::Work),
        "sb" | "short" => Command::Mode(TimerMode::ShortBreak),
        "lb" | "long" => Command::Mode(TimerMode::LongBreak),
        "b" | "break" => Command::Break,
        "st" | "status" => Command::Status,
        "q" | "quit" | "exit" => Command::Quit,
        "set" => {
            let (Some(mode), Some(minutes)) = (words.next(), words.next()) else {
                return Err("usage: set <work|short|long> <minutes>".into());
            };
            let mode = mode.parse::<TimerMode>()?;
            let minutes = minutes
                .parse::<i64>()
                .map_err(|_| format!("not a number of minutes: '{minutes}'"))?;
            Command::SetDuration(mode, minutes)
        }
        "" => return Err("empty command".into()),
        other => return Err(format!("unknown command: '{other}'")),
    };
    if words.next().is_some() {
        return Err(format!("unexpected arguments after '{head}'"));
    }
    Ok(command)
}

/// One-line message for events the user should see. Countdown progress
/// goes to the status line instead.
pub fn describe(event: &Event) -> Option<String> {
    match event {
        Event::TimerCompleted {
            mode, next_mode, ..
        } => Some(format!("{} complete. Next: {}", mode.label(), next_mode.label())),
        Event::AutoStarted { mode, .. } => Some(format!("{} started", mode.label())),
        Event::ModeChanged { to, .. } => Some(format!("Mode: {}", to.label())),
        Event::TimerPaused { .. } => Some("Paused".into()),
        Event::TimerReset { .. } => Some("Reset".into()),
        Event::SessionSaveFailed { message, .. } => {
            Some(format!("warning: session not saved: {message}"))
        }
        _ => None,
    }
}

fn print_message(message: &str, title: &str) {
    let mut out = std::io::stdout();
    if let Err(e) = write!(out, "\r\x1b[2K{message}\n{title}").and_then(|_| out.flush()) {
        tracing::debug!(error = %e, "message write failed");
    }
}

fn report(dispatcher: &CompletionDispatcher<ConfigSettings>, events: Vec<Event>) {
    for event in &events {
        if let Some(message) = describe(event) {
            print_message(&message, &dispatcher.title());
        }
    }
}

fn apply(dispatcher: &mut CompletionDispatcher<ConfigSettings>, command: Command) {
    let events = match command {
        Command::Start => dispatcher.start(),
        Command::Pause => dispatcher.pause(),
        Command::Reset => dispatcher.reset(),
        Command::Mode(mode) => dispatcher.set_mode(mode),
        Command::Break => dispatcher.start_break(),
        Command::SetDuration(mode, minutes) => {
            let events = dispatcher.set_duration(mode, minutes);
            let stored = dispatcher.settings().durations().minutes_for(mode);
            print_message(
                &format!("{} set to {stored} min", mode.label()),
                &dispatcher.title(),
            );
            events
        }
        Command::Status => {
            match serde_json::to_string(&dispatcher.engine().snapshot()) {
                Ok(json) => print_message(&json, &dispatcher.title()),
                Err(e) => tracing::warn!(error = %e, "failed to serialize snapshot"),
            }
            Vec::new()
        }
        Command::Quit => Vec::new(),
    };
    report(dispatcher, events);
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run_loop(args));
    // A pending stdin read would otherwise hold up exit. Queued saves were
    // already flushed inside the loop.
    runtime.shutdown_background();
    result
}

async fn run_loop(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let settings = ConfigSettings::load_or_default();
    let notifications = settings.config().notifications.clone();
    let (writer, mut writer_handle) = SessionWriter::spawn(data_dir()?.join("pomotray.db"));

    let collaborators = Collaborators {
        sound: Box::new(TerminalBell {
            enabled: notifications.sound,
        }),
        notifier: Box::new(TerminalNotifier {
            enabled: notifications.enabled,
        }),
        sessions: Box::new(writer),
        display: Box::new(StatusLine),
    };
    let mut dispatcher =
        CompletionDispatcher::new(Arc::new(SystemClock), settings, collaborators);

    if args.mode != TimerMode::Work {
        dispatcher.set_mode(args.mode);
    }
    if args.start {
        dispatcher.start();
    }

    let mut ticker = tokio::time::interval(POLL_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let events = dispatcher.tick();
                report(&dispatcher, events);
                while let Some(message) = writer_handle.try_failure() {
                    print_message(&format!("warning: session not saved: {message}"), &dispatcher.title());
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match parse_command(&line) {
                        Ok(Command::Quit) => break,
                        Ok(command) => apply(&mut dispatcher, command),
                        Err(message) => print_message(&message, &dispatcher.title()),
                    },
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin closed");
                        stdin_open = false;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    // Dropping the dispatcher closes the save queue.
    drop(dispatcher);
    for message in writer_handle.finish().await {
        eprintln!("warning: session not saved: {message}");
    }
    println!();
    Ok(())
}
