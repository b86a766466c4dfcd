use dsmatch_terminal::error::{ApiCall, FailureKind, FailureReport};
use dsmatch_terminal::state::{
    AnalysisResult, AppState, Delta, MatchCandidate, MatchSet, MatchUser, MutualBenefits,
    ProviderCommand, Screen, Skill, ViewState, apply_delta,
};

fn analysis(skills: &[&str]) -> AnalysisResult {
    AnalysisResult {
        extracted_skills: skills
            .iter()
            .map(|name| Skill {
                skill: name.to_string(),
                confidence: 0.9,
                evidence: vec!["3 years".to_string()],
            })
            .collect(),
        experience_level: "intermediate".to_string(),
        collaboration_style: "Portfolio Builder".to_string(),
        portfolio_readiness: 0.5,
        learning_goals: Vec::new(),
        problem_solving_approach: None,
    }
}

fn candidate(name: &str) -> MatchCandidate {
    MatchCandidate {
        user: MatchUser {
            name: name.to_string(),
            title: "Engineer".to_string(),
            location: "Remote".to_string(),
            skills: vec![("Python".to_string(), 3)],
            bio: None,
            learning_goals: Vec::new(),
        },
        compatibility_score: 0.5,
        skill_complementarity: 0.5,
        learning_synergy: 0.5,
        collaboration_fit: 0.5,
        reasoning: Vec::new(),
        suggested_projects: Vec::new(),
        mutual_benefits: MutualBenefits::default(),
    }
}

fn failure(call: ApiCall) -> FailureReport {
    FailureReport {
        call,
        kind: FailureKind::Transport,
        message: "connection refused".to_string(),
    }
}

fn submitted(text: &str) -> (AppState, u64) {
    let mut state = AppState::new();
    state.input = text.to_string();
    let cmd = state.submit().expect("submission should be accepted");
    let ProviderCommand::Analyze { generation, .. } = cmd;
    (state, generation)
}

#[test]
fn submit_moves_landing_to_analyzing_and_blocks_resubmission() {
    let (mut state, generation) = submitted("I know Python");
    assert_eq!(state.view, ViewState::Analyzing);
    assert_eq!(state.screen(), Screen::Landing);
    assert!(!state.can_submit());
    assert!(state.submit().is_none());
    assert_eq!(state.generation, generation);
}

#[test]
fn whitespace_input_is_a_no_op() {
    let mut state = AppState::new();
    for text in ["", "   ", "\n\t "] {
        state.input = text.to_string();
        assert!(!state.can_submit());
        assert!(state.submit().is_none());
        assert_eq!(state.view, ViewState::Landing);
    }
    assert_eq!(state.generation, 0);
}

#[test]
fn analysis_then_matches_reaches_results_with_matches() {
    let (mut state, generation) = submitted("I know Python");
    apply_delta(
        &mut state,
        Delta::AnalysisSucceeded {
            generation,
            result: analysis(&["Python"]),
        },
    );
    assert!(matches!(state.view, ViewState::Results { .. }));
    assert_eq!(state.screen(), Screen::Results);

    apply_delta(
        &mut state,
        Delta::MatchesSucceeded {
            generation,
            matches: MatchSet {
                matches: vec![candidate("Ada Lovelace")],
            },
        },
    );
    let ViewState::ResultsWithMatches { analysis, matches } = &state.view else {
        panic!("expected matches, got {}", state.view);
    };
    assert_eq!(analysis.skill_names(), vec!["Python".to_string()]);
    assert_eq!(matches.matches.len(), 1);
}

#[test]
fn analysis_failure_returns_to_landing_silently() {
    let (mut state, generation) = submitted("I know Python");
    apply_delta(
        &mut state,
        Delta::AnalysisFailed {
            generation,
            failure: failure(ApiCall::Analyze),
        },
    );
    assert_eq!(state.view, ViewState::Landing);
    assert_eq!(state.input, "I know Python");
    assert!(state.can_submit());
    assert!(state.logs.iter().any(|line| line.contains("[WARN]")));
}

#[test]
fn match_failure_keeps_results_without_matches() {
    let (mut state, generation) = submitted("I know Python");
    apply_delta(
        &mut state,
        Delta::AnalysisSucceeded {
            generation,
            result: analysis(&["Python"]),
        },
    );
    apply_delta(
        &mut state,
        Delta::MatchesFailed {
            generation,
            failure: failure(ApiCall::Match),
        },
    );
    assert!(matches!(state.view, ViewState::Results { .. }));
    assert!(state.view.matches().is_none());
}

#[test]
fn reset_clears_results_together_and_keeps_text() {
    let (mut state, generation) = submitted("I know Python");
    apply_delta(
        &mut state,
        Delta::AnalysisSucceeded {
            generation,
            result: analysis(&["Python"]),
        },
    );
    apply_delta(
        &mut state,
        Delta::MatchesSucceeded {
            generation,
            matches: MatchSet {
                matches: vec![candidate("Ada")],
            },
        },
    );

    state.reset();
    assert_eq!(state.view, ViewState::Landing);
    assert!(state.view.analysis().is_none());
    assert!(state.view.matches().is_none());
    assert_eq!(state.input, "I know Python");
    assert!(state.can_submit());
}

#[test]
fn completions_after_reset_are_discarded() {
    let (mut state, generation) = submitted("I know Python");
    apply_delta(
        &mut state,
        Delta::AnalysisSucceeded {
            generation,
            result: analysis(&["Python"]),
        },
    );
    state.reset();

    apply_delta(
        &mut state,
        Delta::MatchesSucceeded {
            generation,
            matches: MatchSet {
                matches: vec![candidate("Ada")],
            },
        },
    );
    assert_eq!(state.view, ViewState::Landing);
}

#[test]
fn analysis_landing_after_reset_does_not_flip_back_to_results() {
    let (mut state, generation) = submitted("I know Python");
    state.reset();
    apply_delta(
        &mut state,
        Delta::AnalysisSucceeded {
            generation,
            result: analysis(&["Python"]),
        },
    );
    assert_eq!(state.view, ViewState::Landing);
}

#[test]
fn older_round_cannot_overwrite_newer_round() {
    let (mut state, first) = submitted("first text");
    state.reset();
    state.input = "second text".to_string();
    let ProviderCommand::Analyze {
        generation: second, ..
    } = state.submit().expect("second submission accepted");
    assert!(second > first);

    apply_delta(
        &mut state,
        Delta::AnalysisSucceeded {
            generation: second,
            result: analysis(&["Rust"]),
        },
    );
    apply_delta(
        &mut state,
        Delta::MatchesSucceeded {
            generation: first,
            matches: MatchSet {
                matches: vec![candidate("Stale Person")],
            },
        },
    );
    assert!(matches!(state.view, ViewState::Results { .. }));

    apply_delta(
        &mut state,
        Delta::MatchesSucceeded {
            generation: second,
            matches: MatchSet {
                matches: vec![candidate("Fresh Person")],
            },
        },
    );
    let matches = state.view.matches().expect("matches present");
    assert_eq!(matches.matches[0].user.name, "Fresh Person");
    assert_eq!(
        state.view.analysis().map(|a| a.skill_names()),
        Some(vec!["Rust".to_string()])
    );
}

#[test]
fn match_selection_is_bounded_by_visible_cards() {
    let (mut state, generation) = submitted("I know Python");
    apply_delta(
        &mut state,
        Delta::AnalysisSucceeded {
            generation,
            result: analysis(&["Python"]),
        },
    );
    apply_delta(
        &mut state,
        Delta::MatchesSucceeded {
            generation,
            matches: MatchSet {
                matches: (0..6).map(|i| candidate(&format!("P{i}"))).collect(),
            },
        },
    );

    for _ in 0..10 {
        state.select_next_match();
    }
    assert_eq!(state.selected_match, 3);
    state.toggle_profile();
    assert!(state.profile_overlay);
    assert_eq!(
        state.selected_candidate().map(|c| c.user.name.as_str()),
        Some("P3")
    );

    state.reset();
    assert!(!state.profile_overlay);
    assert_eq!(state.selected_match, 0);
}

#[test]
fn stats_delta_is_applied_in_any_state() {
    let (mut state, _) = submitted("I know Python");
    apply_delta(
        &mut state,
        Delta::StatsLoaded {
            stats: dsmatch_terminal::state::Stats::fallback(),
            failure: None,
        },
    );
    assert_eq!(state.stats.map(|s| s.total_users), Some(1247));
    assert_eq!(state.view, ViewState::Analyzing);
}
