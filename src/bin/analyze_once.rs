use std::io::{self, Read};
use std::sync::mpsc;

use anyhow::{Context, Result, bail};

use dsmatch_terminal::api::HttpGateway;
use dsmatch_terminal::config::Settings;
use dsmatch_terminal::presenter::{self, RenderTree};
use dsmatch_terminal::state::{AppState, EXAMPLE_TEXT, apply_delta};
use dsmatch_terminal::{logging, worker};

fn main() -> Result<()> {
    let settings = Settings::load();
    logging::init(&settings)?;
    let gateway = HttpGateway::new(&settings)?;

    let mut state = AppState::new();
    state.input = read_input_text()?;

    // Same command flow as the TUI, driven synchronously on this thread.
    let (tx, rx) = mpsc::channel();
    worker::send_stats(&gateway, &tx);
    let Some(cmd) = state.submit() else {
        bail!("nothing to analyze: pass text as arguments, via stdin, or use --example");
    };
    worker::handle_command(&gateway, cmd, &tx);
    drop(tx);
    for delta in rx {
        apply_delta(&mut state, delta);
    }

    if let Some(stats) = &state.stats {
        let line = presenter::stat_cards(stats)
            .into_iter()
            .map(|card| format!("{}: {}", card.label, card.value))
            .collect::<Vec<_>>()
            .join(" | ");
        println!("{line}");
    }

    match presenter::render_tree(&state) {
        RenderTree::Landing(_) => {
            println!("Analysis failed");
            for line in &state.logs {
                println!(" - {line}");
            }
        }
        RenderTree::Results(view) => {
            println!("Skills:");
            for skill in &view.skills {
                println!("  {} {} ({})", skill.name, skill.confidence, skill.evidence);
            }
            println!("Experience level: {}", view.scorecards.experience_level);
            println!("Collaboration style: {}", view.scorecards.collaboration_style);
            println!("Portfolio readiness: {}", view.scorecards.readiness);
            match view.matches {
                Some(cards) => {
                    println!("Matches:");
                    for card in cards {
                        println!(
                            "  [{}] {} - {} ({}) {} match",
                            card.initials, card.name, card.title, card.location, card.compatibility
                        );
                        println!(
                            "      skill fit {} | learning {} | collab {}",
                            card.skill_fit, card.learning, card.collab
                        );
                        if !card.skills.is_empty() {
                            println!("      {}", card.skills.join("  "));
                        }
                    }
                }
                None => println!("Matches: unavailable"),
            }
        }
    }

    Ok(())
}

fn read_input_text() -> Result<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|arg| arg == "--example") {
        return Ok(EXAMPLE_TEXT.to_string());
    }
    if !args.is_empty() {
        return Ok(args.join(" "));
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf)
}
