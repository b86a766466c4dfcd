use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use tracing::{info, warn};

use crate::api::{MatchmakerApi, fetch_stats_or_fallback};
use crate::error::{ApiCall, FailureReport, GatewayError};
use crate::state::{Delta, ProviderCommand};

/// Runs `api` on its own thread. Commands are handled one at a time in arrival
/// order; the thread exits once either channel is closed.
pub fn spawn_provider(
    api: Box<dyn MatchmakerApi>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while let Ok(cmd) = cmd_rx.recv() {
            if !handle_command(api.as_ref(), cmd, &tx) {
                break;
            }
        }
    })
}

/// One-shot stats fetch on a thread of its own, so a slow stats endpoint never
/// holds up an analysis.
pub fn spawn_stats_fetch(api: Box<dyn MatchmakerApi>, tx: Sender<Delta>) -> JoinHandle<()> {
    thread::spawn(move || {
        send_stats(api.as_ref(), &tx);
    })
}

/// Fetches stats (or the fallback) and sends them. Returns `false` when the UI
/// side has gone away.
pub fn send_stats(api: &dyn MatchmakerApi, tx: &Sender<Delta>) -> bool {
    let (stats, failure) = fetch_stats_or_fallback(api);
    tx.send(Delta::StatsLoaded { stats, failure }).is_ok()
}

/// Executes one command. Returns `false` when the UI side has gone away.
pub fn handle_command(api: &dyn MatchmakerApi, cmd: ProviderCommand, tx: &Sender<Delta>) -> bool {
    match cmd {
        ProviderCommand::Analyze { generation, text } => run_pipeline(api, generation, &text, tx),
    }
}

/// Analyze, then match on the extracted skill names. The match call is made
/// even when no skills were extracted.
fn run_pipeline(api: &dyn MatchmakerApi, generation: u64, text: &str, tx: &Sender<Delta>) -> bool {
    info!(generation, chars = text.chars().count(), "analysis requested");
    let result = match api.analyze(text) {
        Ok(result) => result,
        Err(err) => {
            let failure = report(ApiCall::Analyze, generation, &err);
            return tx.send(Delta::AnalysisFailed { generation, failure }).is_ok();
        }
    };

    let skills = result.skill_names();
    if tx
        .send(Delta::AnalysisSucceeded { generation, result })
        .is_err()
    {
        return false;
    }

    info!(generation, skills = skills.len(), "match requested");
    let delta = match api.find_matches(&skills) {
        Ok(matches) => Delta::MatchesSucceeded {
            generation,
            matches,
        },
        Err(err) => Delta::MatchesFailed {
            generation,
            failure: report(ApiCall::Match, generation, &err),
        },
    };
    tx.send(delta).is_ok()
}

fn report(call: ApiCall, generation: u64, err: &GatewayError) -> FailureReport {
    warn!(
        %call,
        generation,
        kind = err.kind().label(),
        transient = err.is_transient(),
        error = %err,
        "request abandoned"
    );
    FailureReport::new(call, err)
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::state::{AnalysisResult, MatchSet, Stats};

    struct DownApi;

    impl MatchmakerApi for DownApi {
        fn fetch_stats(&self) -> Result<Stats, GatewayError> {
            Err(GatewayError::Status {
                status: 503,
                body: "down".to_string(),
            })
        }

        fn analyze(&self, _text: &str) -> Result<AnalysisResult, GatewayError> {
            Err(GatewayError::Status {
                status: 500,
                body: String::new(),
            })
        }

        fn find_matches(&self, _skills: &[String]) -> Result<MatchSet, GatewayError> {
            panic!("match must not be called after a failed analysis");
        }
    }

    #[test]
    fn failed_analysis_skips_match_call() {
        let (tx, rx) = mpsc::channel();
        let cmd = ProviderCommand::Analyze {
            generation: 3,
            text: "python".to_string(),
        };
        assert!(handle_command(&DownApi, cmd, &tx));
        drop(tx);

        let deltas: Vec<Delta> = rx.iter().collect();
        assert_eq!(deltas.len(), 1);
        match &deltas[0] {
            Delta::AnalysisFailed {
                generation,
                failure,
            } => {
                assert_eq!(*generation, 3);
                assert_eq!(failure.call, ApiCall::Analyze);
            }
            other => panic!("unexpected delta: {other:?}"),
        }
    }

    #[test]
    fn stats_failure_sends_fallback_with_report() {
        let (tx, rx) = mpsc::channel();
        assert!(send_stats(&DownApi, &tx));
        match rx.recv().expect("delta expected") {
            Delta::StatsLoaded { stats, failure } => {
                assert_eq!(stats, Stats::fallback());
                let failure = failure.expect("failure reported");
                assert_eq!(failure.call, ApiCall::Stats);
                assert!(failure.message.contains("503"));
            }
            other => panic!("unexpected delta: {other:?}"),
        }
    }

    #[test]
    fn closed_channel_stops_worker() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        assert!(!send_stats(&DownApi, &tx));
        let cmd = ProviderCommand::Analyze {
            generation: 1,
            text: "python".to_string(),
        };
        assert!(!handle_command(&DownApi, cmd, &tx));
    }
}
