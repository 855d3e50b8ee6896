use clap::{Args, Subcommand};
use tenang_core::{Command, Config, Event, SessionController, SessionRunner, Shortcut};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::render::Printer;

#[derive(Args)]
pub struct SessionOptions {
    /// Session length in minutes (defaults to session.default_minutes)
    #[arg(short, long)]
    minutes: Option<u64>,
    /// Enable the breathing guide
    #[arg(long, conflicts_with = "no_breathing")]
    breathing: bool,
    /// Disable the breathing guide
    #[arg(long)]
    no_breathing: bool,
    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
pub enum SessionAction {
    /// Run a session in real time. Type a key and press enter:
    /// space or p = pause/resume, r = reset, +/- = duration, q = quit
    Run {
        #[command(flatten)]
        options: SessionOptions,
    },
    /// Run a session instantly on a simulated clock
    Simulate {
        #[command(flatten)]
        options: SessionOptions,
        /// Session length in seconds (overrides --minutes)
        #[arg(long)]
        seconds: Option<u64>,
        /// Pause after this many seconds
        #[arg(long, requires = "pause_for")]
        pause_at: Option<u64>,
        /// Stay paused for this many seconds
        #[arg(long, requires = "pause_at")]
        pause_for: Option<u64>,
    },
}

enum Input {
    Command(Command),
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input {
    // Enter on its own (or space + enter) toggles, like the space bar.
    let Some(key) = line.trim().chars().next() else {
        return Input::Command(Command::TogglePause);
    };
    match key {
        'q' | 'Q' => Input::Quit,
        'p' | 'P' => Input::Command(Command::TogglePause),
        other => Shortcut::from_key(other)
            .map(|s| Input::Command(s.command()))
            .unwrap_or(Input::Unknown),
    }
}

/// Controller, session length and printer built from config plus flags.
fn prepare(
    options: &SessionOptions,
    seconds: Option<u64>,
) -> Result<(SessionController, u64, Printer), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut settings = config.session_settings()?;
    if options.breathing {
        settings.breathing_guide = true;
    } else if options.no_breathing {
        settings.breathing_guide = false;
    }

    let duration_secs = seconds
        .or_else(|| options.minutes.map(|m| m.saturating_mul(60)))
        .unwrap_or(settings.default_duration_secs);

    let printer = Printer {
        json: options.json,
        show_instructions: config.display.show_instructions,
    };
    Ok((SessionController::new(settings)?, duration_secs, printer))
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        SessionAction::Run { options } => {
            let (controller, duration_secs, printer) = prepare(&options, None)?;
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            let result = runtime.block_on(run_live(controller, duration_secs, printer));
            // A quit leaves a blocking stdin read behind; don't wait for it.
            runtime.shutdown_background();
            result
        }
        SessionAction::Simulate {
            options,
            seconds,
            pause_at,
            pause_for,
        } => {
            let (controller, duration_secs, printer) = prepare(&options, seconds)?;
            let pause = pause_at.zip(pause_for);
            simulate(controller, duration_secs, pause, &printer)
        }
    }
}

async fn run_live(
    controller: SessionController,
    duration_secs: u64,
    printer: Printer,
) -> Result<(), Box<dyn std::error::Error>> {
    let runner = SessionRunner::spawn(controller);
    let mut events = runner.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    eprintln!("keys (then enter): space/p = pause/resume, r = reset, +/- = duration, q = quit");
    runner.send(Command::Start { duration_secs }).await?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    printer.print(None, &event)?;
                    if event.is_completion() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "display fell behind"),
                Err(RecvError::Closed) => break,
            },
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => match parse_input(&line) {
                    Input::Command(command) => {
                        if let Err(e) = runner.send(command).await {
                            eprintln!("{e}");
                        }
                    }
                    Input::Quit => break,
                    Input::Unknown => eprintln!("unknown key: {}", line.trim()),
                },
                // Without input a ticking session still runs to completion;
                // a paused or reset one would wait forever.
                None => {
                    stdin_open = false;
                    if !is_ticking(&runner).await? {
                        while let Ok(event) = events.try_recv() {
                            printer.print(None, &event)?;
                        }
                        eprintln!("input closed while the session is stopped, exiting");
                        break;
                    }
                }
            },
        }
    }

    runner.shutdown().await?;
    Ok(())
}

async fn is_ticking(runner: &SessionRunner) -> Result<bool, Box<dyn std::error::Error>> {
    match runner.snapshot().await? {
        Event::StateSnapshot { timer, .. } => Ok(timer.is_ticking()),
        _ => Ok(false),
    }
}

fn simulate(
    mut controller: SessionController,
    duration_secs: u64,
    pause: Option<(u64, u64)>,
    printer: &Printer,
) -> Result<(), Box<dyn std::error::Error>> {
    let started = controller.start(duration_secs)?;
    printer.print_all(Some(controller.now_ms()), &started)?;

    if let Some((pause_at, pause_for)) = pause {
        let before = controller.advance_to(pause_at.saturating_mul(1000))?;
        printer.print_all(Some(controller.now_ms()), &before)?;
        let paused = controller.pause()?;
        printer.print_all(Some(controller.now_ms()), &paused)?;
        let during = controller.advance_by(pause_for.saturating_mul(1000))?;
        printer.print_all(Some(controller.now_ms()), &during)?;
        let resumed = controller.resume()?;
        printer.print_all(Some(controller.now_ms()), &resumed)?;
    }

    while controller.state().is_ticking() {
        let events = controller.advance_by(1000)?;
        printer.print_all(Some(controller.now_ms()), &events)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_toggles() {
        assert!(matches!(
            parse_input(""),
            Input::Command(Command::TogglePause)
        ));
        assert!(matches!(
            parse_input(" "),
            Input::Command(Command::TogglePause)
        ));
    }

    #[test]
    fn keys_map_to_commands() {
        assert!(matches!(parse_input("r"), Input::Command(Command::Reset)));
        assert!(matches!(parse_input("q"), Input::Quit));
        assert!(matches!(parse_input("x"), Input::Unknown));
        assert!(matches!(
            parse_input("+"),
            Input::Command(Command::StepPreset { .. })
        ));
    }
}
