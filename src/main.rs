//! Lumen CLI
//!
//! Usage:
//!   lumen                     # Auto-driven demo: watch the onboarding run
//!   lumen --interactive       # Drive the sensors yourself from stdin
//!   lumen --script            # Print the onboarding script
//!   lumen --json              # JSON output (demo ticks / command results)

use std::io::{self, BufRead, Write};
use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use colored::Colorize;

use lumen::core::collab::{LogAudio, LogHaptics, SimMotionSensor, StoreDisplay, TermDisplay};
use lumen::core::{AppConfig, PresenceApp, SharedStore, TutorialScript};
use lumen::types::{Stage, StepGate};
use lumen::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "lumen",
    version = VERSION,
    about = "A single animated point of light with a sensor-driven onboarding",
    long_about = "Lumen renders a pulsing presence indicator and walks a scripted\n\
                  onboarding that reacts to stillness, movement, and touch.\n\n\
                  Modes:\n  \
                  (default)      Auto-driven demo; sensors are simulated\n  \
                  --interactive  Feed the sensors yourself from stdin\n  \
                  --script       Print the onboarding script and exit\n\n\
                  Stages:\n  \
                  dormant    - Idle, nothing has happened yet\n  \
                  awakening  - First contact, the tutorial runs here\n  \
                  attuned    - Onboarding done"
)]
struct Args {
    /// Interactive mode - drive the sensors from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Print the onboarding script and exit
    #[arg(long)]
    script: bool,

    /// Skip the introduction paragraphs
    #[arg(long)]
    skip_intro: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Canvas width in cells
    #[arg(long, default_value_t = 64)]
    width: u16,

    /// Canvas height in cells
    #[arg(long, default_value_t = 20)]
    height: u16,

    /// Demo frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Hard tick cap for the demo loop
    #[arg(long, default_value_t = 4000)]
    ticks: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    if args.script {
        run_script(&args);
    } else if args.interactive {
        run_interactive(&args);
    } else {
        run_demo(&args).await;
    }
}

fn chosen_script(args: &Args) -> TutorialScript {
    if args.skip_intro {
        TutorialScript::onboarding_without_intro()
    } else {
        TutorialScript::onboarding()
    }
}

/// Print the onboarding script
fn run_script(args: &Args) {
    let script = chosen_script(args);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&script).unwrap());
        return;
    }

    for (i, paragraph) in script.intro_paragraphs().iter().enumerate() {
        println!("{} {}", format!("intro[{}]", i).dimmed(), paragraph);
    }
    println!();
    for (i, step) in script.steps.iter().enumerate() {
        let gate = match &step.gate {
            StepGate::Dwell { duration_ms } => format!("dwell {}ms", duration_ms),
            StepGate::Condition { kind, .. } => format!("wait for {}", kind),
        };
        println!(
            "{} {} {} {}",
            format!("step[{}]", i).bold(),
            format!("[{}]", gate).yellow(),
            step.pixel_color.to_hex().dimmed(),
            step.message
        );
    }
}

/// Auto-driven demo: the loop feeds the simulated sensor whatever the
/// current condition-gated step is waiting for
async fn run_demo(args: &Args) {
    let store = Rc::new(SharedStore::new());
    let sensor = SimMotionSensor::new(0.06);
    let magnitude = sensor.handle();

    let mut app = PresenceApp::init(AppConfig {
        width: args.width,
        height: args.height,
        script: chosen_script(args),
        store: Some(store.clone()),
        display: Some(Box::new(StoreDisplay::new(store.clone()))),
        sensor: Some(Box::new(sensor)),
        ..AppConfig::default()
    });

    // Reported once; the demo keeps running headless
    if let Some(e) = app.render_error() {
        eprintln!("rendering disabled: {}", e);
    }

    let delta_ms = (1000 / args.fps.max(1) as u64).max(1);
    let mut interval = tokio::time::interval(Duration::from_millis(delta_ms));

    let mut last_step: Option<usize> = None;
    let mut step_entered_ms = 0u64;
    let mut tapped_this_step = false;
    let mut completed_at: Option<u64> = None;

    for _ in 0..args.ticks {
        interval.tick().await;
        app.tick(delta_ms);
        let now = app.now_ms();

        // Wake the presence shortly after startup
        if now >= 500 && store.get_str("interaction.stage").as_deref() == Some("dormant") {
            app.set_stage(Stage::Awakening);
        }

        drive_sensors(
            &app,
            &magnitude,
            now,
            &mut last_step,
            &mut step_entered_ms,
            &mut tapped_this_step,
        );

        if args.json {
            println!("{}", serde_json::to_string(&app.frame_output()).unwrap());
        } else if let Some(frame) = app.render() {
            let message = store.get_str("display.message").unwrap_or_default();
            let status = app.frame_output().to_terminal_string();
            print!("\x1b[2J\x1b[H{}\n  {}\n{}\n", frame, message.italic(), status);
            io::stdout().flush().unwrap();
        }

        let complete = app.sequencer().borrow().is_tutorial_complete();
        if complete && completed_at.is_none() {
            completed_at = Some(now);
        }
        // Let the closing pulse play out before exiting
        if matches!(completed_at, Some(t) if now >= t + 2000) {
            break;
        }
    }

    if !args.json {
        println!(
            "\n{}",
            "Onboarding finished. The light is attuned.".green()
        );
    }
}

/// Feed the simulated sensor whatever the current step is gated on,
/// after a short dwell so each step is visible
fn drive_sensors(
    app: &PresenceApp,
    magnitude: &Rc<std::cell::Cell<f64>>,
    now: u64,
    last_step: &mut Option<usize>,
    step_entered_ms: &mut u64,
    tapped_this_step: &mut bool,
) {
    let gate = {
        let seq = app.sequencer().borrow();
        seq.current_step_index()
            .and_then(|i| seq.current_step().map(|s| (i, s.gate.clone())))
    };

    let Some((index, gate)) = gate else {
        return;
    };

    if *last_step != Some(index) {
        *last_step = Some(index);
        *step_entered_ms = now;
        *tapped_this_step = false;
        magnitude.set(0.06); // ambient, between the two thresholds
    }

    if let StepGate::Condition { kind, .. } = gate {
        if now.saturating_sub(*step_entered_ms) > 1500 {
            use lumen::types::ConditionKind::*;
            match kind {
                Stillness => magnitude.set(0.0),
                Movement => magnitude.set(0.5),
                Tap => {
                    if !*tapped_this_step {
                        app.tap();
                        *tapped_this_step = true;
                    }
                }
            }
        }
    }
}

/// Interactive mode: stdin commands drive the sensors; each command is
/// followed by one simulated second of 16ms ticks
fn run_interactive(args: &Args) {
    let sensor = SimMotionSensor::new(0.06);
    let magnitude = sensor.handle();

    let mut app = PresenceApp::init(AppConfig {
        width: args.width,
        height: args.height,
        script: chosen_script(args),
        display: Some(Box::new(TermDisplay)),
        haptics: Some(Box::new(LogHaptics)),
        audio: Some(Box::new(LogAudio)),
        sensor: Some(Box::new(sensor)),
        ..AppConfig::default()
    });

    print_header();
    println!("Commands: start, still, move <mag>, tap, skip, state, quit");
    println!("          color <#rrggbb>, pulse <size>, fade <in|out>");
    println!("Goal: complete the onboarding (stillness, movement, touch)");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{}", format_prompt(&app));
        stdout.flush().unwrap();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(_) => break,
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            println!("\nSession ended at t={}ms", app.now_ms());
            break;
        }
        if line.is_empty() {
            continue;
        }

        let mut parts = line.split_whitespace();
        match parts.next().unwrap_or("") {
            "start" => app.set_stage(Stage::Awakening),
            "still" => magnitude.set(0.0),
            "tap" => app.tap(),
            "skip" => app.sequencer().borrow_mut().skip_tutorial(),
            "state" => {}
            "move" => match parts.next().and_then(|m| m.parse::<f64>().ok()) {
                Some(m) if m >= 0.0 => magnitude.set(m),
                _ => {
                    println!("{}", "usage: move <non-negative magnitude>".yellow());
                    continue;
                }
            },
            "color" => match parts.next().map(lumen::types::Rgb::parse) {
                Some(Ok(color)) => app.engine().borrow_mut().transition_color_default(color),
                Some(Err(e)) => {
                    println!("{}", e.to_string().yellow());
                    continue;
                }
                None => {
                    println!("{}", "usage: color <#rrggbb>".yellow());
                    continue;
                }
            },
            "pulse" => match parts.next().and_then(|s| s.parse::<f64>().ok()) {
                Some(size) if size > 0.0 => app.engine().borrow_mut().pulse_size_default(size),
                _ => {
                    println!("{}", "usage: pulse <size>".yellow());
                    continue;
                }
            },
            "fade" => match parts.next() {
                Some("in") => app.engine().borrow_mut().fade_in_default(),
                Some("out") => app.engine().borrow_mut().fade_out_default(),
                _ => {
                    println!("{}", "usage: fade <in|out>".yellow());
                    continue;
                }
            },
            other => {
                println!("{}", format!("unknown command: {}", other).yellow());
                continue;
            }
        }

        // One simulated second per command, polled at frame rate
        simulate(&mut app, 1000);

        let output = app.frame_output();
        if args.json {
            println!("{}", serde_json::to_string(&output).unwrap());
        } else if args.no_color {
            println!("{}", output.to_parseable_string());
        } else {
            println!("{}", output.to_terminal_string());
        }
    }
}

/// Advance the app by `ms` of virtual time in 16ms ticks
fn simulate(app: &mut PresenceApp, ms: u64) {
    let mut remaining = ms;
    while remaining > 0 {
        let delta = remaining.min(16);
        app.tick(delta);
        remaining -= delta;
    }
}

fn print_header() {
    println!("{}", "=".repeat(48).bold());
    println!("{}", format!("  Lumen v{} - Interactive", VERSION).bold());
    println!("{}", "=".repeat(48).bold());
    println!();
}

fn format_prompt(app: &PresenceApp) -> String {
    let stage = app
        .store()
        .get_str("interaction.stage")
        .unwrap_or_else(|| "dormant".to_string());
    let seq = app.sequencer().borrow();
    let detail = if seq.is_tutorial_complete() {
        " done".to_string()
    } else {
        match seq.current_step_index() {
            Some(i) => format!(" step {}", i),
            None if seq.is_tutorial_active() => " intro".to_string(),
            None => String::new(),
        }
    };
    format!("[{}{}] > ", stage.cyan(), detail.dimmed())
}
