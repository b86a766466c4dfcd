use std::collections::VecDeque;
use std::fmt;

use serde::Deserialize;

use crate::error::FailureReport;

pub const EXAMPLE_TEXT: &str = "I'm a mechanical engineer with 2 years of data science experience. I'm working on a football momentum prediction project using machine learning with walk-forward validation. I need to learn web development and NLP to build the complete application. Looking for portfolio building collaboration partners.";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Skill {
    pub skill: String,
    pub confidence: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub evidence: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub extracted_skills: Vec<Skill>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub experience_level: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub collaboration_style: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub portfolio_readiness: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub learning_goals: Vec<String>,
    #[serde(default)]
    pub problem_solving_approach: Option<String>,
}

impl AnalysisResult {
    /// Skill names in extraction order, as sent to the matching service.
    pub fn skill_names(&self) -> Vec<String> {
        self.extracted_skills
            .iter()
            .map(|s| s.skill.clone())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchUser {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,
    /// Skill name to level, in the order the server listed them.
    #[serde(default, deserialize_with = "skill_levels::deserialize")]
    pub skills: Vec<(String, i64)>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub learning_goals: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MutualBenefits {
    #[serde(default, deserialize_with = "null_as_default")]
    pub you_gain: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub they_gain: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchCandidate {
    pub user: MatchUser,
    #[serde(default, deserialize_with = "null_as_default")]
    pub compatibility_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skill_complementarity: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub learning_synergy: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub collaboration_fit: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reasoning: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub suggested_projects: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mutual_benefits: MutualBenefits,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MatchSet {
    #[serde(default, deserialize_with = "null_as_default")]
    pub matches: Vec<MatchCandidate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Stats {
    pub total_users: u64,
    pub successful_matches: u64,
    pub completed_projects: u64,
    pub avg_match_accuracy: f64,
}

impl Stats {
    /// Snapshot shown whenever the stats endpoint cannot be read.
    pub fn fallback() -> Self {
        Self {
            total_users: 1247,
            successful_matches: 89,
            completed_projects: 23,
            avg_match_accuracy: 0.87,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Landing,
    Analyzing,
    Results {
        analysis: AnalysisResult,
    },
    ResultsWithMatches {
        analysis: AnalysisResult,
        matches: MatchSet,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Results,
}

impl ViewState {
    pub fn screen(&self) -> Screen {
        match self {
            ViewState::Landing | ViewState::Analyzing => Screen::Landing,
            ViewState::Results { .. } | ViewState::ResultsWithMatches { .. } => Screen::Results,
        }
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        match self {
            ViewState::Results { analysis } | ViewState::ResultsWithMatches { analysis, .. } => {
                Some(analysis)
            }
            ViewState::Landing | ViewState::Analyzing => None,
        }
    }

    pub fn matches(&self) -> Option<&MatchSet> {
        match self {
            ViewState::ResultsWithMatches { matches, .. } => Some(matches),
            _ => None,
        }
    }

    pub fn is_analyzing(&self) -> bool {
        matches!(self, ViewState::Analyzing)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewState::Landing => "LANDING",
            ViewState::Analyzing => "ANALYZING",
            ViewState::Results { .. } => "RESULTS",
            ViewState::ResultsWithMatches { .. } => "RESULTS+MATCHES",
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub input: String,
    pub view: ViewState,
    pub stats: Option<Stats>,
    pub generation: u64,
    pub selected_match: usize,
    pub profile_overlay: bool,
    pub help_overlay: bool,
    pub diagnostics_overlay: bool,
    pub logs: VecDeque<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            input: String::new(),
            view: ViewState::Landing,
            stats: None,
            generation: 0,
            selected_match: 0,
            profile_overlay: false,
            help_overlay: false,
            diagnostics_overlay: false,
            logs: VecDeque::new(),
        }
    }

    pub fn screen(&self) -> Screen {
        self.view.screen()
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.view, ViewState::Landing) && !self.input.trim().is_empty()
    }

    /// Starts a new analysis round-trip. Returns the command for the provider
    /// thread, or `None` when the guard rejects the submission.
    pub fn submit(&mut self) -> Option<ProviderCommand> {
        if !self.can_submit() {
            return None;
        }
        self.generation += 1;
        self.view = ViewState::Analyzing;
        self.selected_match = 0;
        self.profile_overlay = false;
        Some(ProviderCommand::Analyze {
            generation: self.generation,
            text: self.input.clone(),
        })
    }

    /// Fills the input with [`EXAMPLE_TEXT`] and submits it. While a round-trip
    /// is in flight the text is still replaced but nothing new is sent.
    pub fn load_example(&mut self) -> Option<ProviderCommand> {
        if self.screen() != Screen::Landing {
            return None;
        }
        self.input = EXAMPLE_TEXT.to_string();
        self.submit()
    }

    /// Back to the landing screen. The input text is kept so it can be
    /// re-analysed; anything still in flight for the old round-trip is dropped
    /// when it lands.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.view = ViewState::Landing;
        self.selected_match = 0;
        self.profile_overlay = false;
    }

    pub fn push_char(&mut self, c: char) {
        if self.screen() == Screen::Landing {
            self.input.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if self.screen() == Screen::Landing {
            self.input.pop();
        }
    }

    pub fn clear_input(&mut self) {
        if self.screen() == Screen::Landing {
            self.input.clear();
        }
    }

    pub fn visible_match_count(&self) -> usize {
        self.view
            .matches()
            .map(|set| set.matches.len().min(crate::presenter::MAX_MATCH_CARDS))
            .unwrap_or(0)
    }

    pub fn select_next_match(&mut self) {
        let total = self.visible_match_count();
        if total == 0 {
            self.selected_match = 0;
            return;
        }
        self.selected_match = (self.selected_match + 1).min(total - 1);
    }

    pub fn select_prev_match(&mut self) {
        self.selected_match = self.selected_match.saturating_sub(1);
    }

    pub fn selected_candidate(&self) -> Option<&MatchCandidate> {
        let total = self.visible_match_count();
        if self.selected_match >= total {
            return None;
        }
        self.view
            .matches()
            .and_then(|set| set.matches.get(self.selected_match))
    }

    pub fn toggle_profile(&mut self) {
        if self.selected_candidate().is_some() {
            self.profile_overlay = !self.profile_overlay;
        } else {
            self.profile_overlay = false;
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        let stamp = chrono::Local::now().format("%H:%M:%S");
        self.logs.push_back(format!("{stamp} {}", msg.into()));
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    StatsLoaded {
        stats: Stats,
        failure: Option<FailureReport>,
    },
    AnalysisSucceeded {
        generation: u64,
        result: AnalysisResult,
    },
    AnalysisFailed {
        generation: u64,
        failure: FailureReport,
    },
    MatchesSucceeded {
        generation: u64,
        matches: MatchSet,
    },
    MatchesFailed {
        generation: u64,
        failure: FailureReport,
    },
    Log(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    Analyze { generation: u64, text: String },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::StatsLoaded { stats, failure } => {
            if let Some(failure) = failure {
                state.push_log(format!("[WARN] {failure}"));
            }
            state.stats = Some(stats);
        }
        Delta::AnalysisSucceeded { generation, result } => {
            if !state.is_current(generation) || !state.view.is_analyzing() {
                state.push_log(format!("[INFO] Dropped stale analysis (round {generation})"));
                return;
            }
            state.push_log(format!(
                "[INFO] Analysis ready: {} skills",
                result.extracted_skills.len()
            ));
            state.view = ViewState::Results { analysis: result };
        }
        Delta::AnalysisFailed {
            generation,
            failure,
        } => {
            if !state.is_current(generation) || !state.view.is_analyzing() {
                state.push_log(format!("[INFO] Dropped stale analysis failure (round {generation})"));
                return;
            }
            state.push_log(format!("[WARN] {failure}"));
            state.view = ViewState::Landing;
        }
        Delta::MatchesSucceeded {
            generation,
            matches,
        } => {
            if !state.is_current(generation) {
                state.push_log(format!("[INFO] Dropped stale matches (round {generation})"));
                return;
            }
            match std::mem::replace(&mut state.view, ViewState::Landing) {
                ViewState::Results { analysis } => {
                    state.push_log(format!("[INFO] {} matches received", matches.matches.len()));
                    state.selected_match = 0;
                    state.view = ViewState::ResultsWithMatches { analysis, matches };
                }
                other => state.view = other,
            }
        }
        Delta::MatchesFailed {
            generation,
            failure,
        } => {
            if !state.is_current(generation) {
                state.push_log(format!("[INFO] Dropped stale match failure (round {generation})"));
                return;
            }
            state.push_log(format!("[WARN] {failure}"));
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

mod skill_levels {
    use std::fmt;

    use serde::Deserializer;
    use serde::de::{MapAccess, Visitor};

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Vec<(String, i64)>, D::Error> {
        de.deserialize_option(OptionalLevels)
    }

    struct OptionalLevels;

    impl<'de> Visitor<'de> for OptionalLevels {
        type Value = Vec<(String, i64)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of skill name to level")
        }

        fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_some<D: Deserializer<'de>>(self, de: D) -> Result<Self::Value, D::Error> {
            de.deserialize_map(self)
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some((name, level)) = access.next_entry::<String, i64>()? {
                out.push((name, level));
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_skills_keep_server_order() {
        let raw = r#"{"name":"Sarah Chen","title":"Dev","location":"SF",
            "skills":{"JavaScript":5,"React":5,"Python":3,"Machine Learning":2}}"#;
        let user: MatchUser = serde_json::from_str(raw).expect("user should parse");
        let names: Vec<&str> = user.skills.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["JavaScript", "React", "Python", "Machine Learning"]);
        assert_eq!(user.skills[3].1, 2);
    }

    #[test]
    fn null_collections_become_empty() {
        let raw = r#"{"extracted_skills":null,"experience_level":"beginner",
            "collaboration_style":"Learning Partner","portfolio_readiness":0.1}"#;
        let result: AnalysisResult = serde_json::from_str(raw).expect("analysis should parse");
        assert!(result.extracted_skills.is_empty());
        assert!(result.skill_names().is_empty());

        let set: MatchSet = serde_json::from_str("{}").expect("empty set should parse");
        assert!(set.matches.is_empty());
    }

    #[test]
    fn load_example_replaces_text_and_submits() {
        let mut state = AppState::new();
        state.input = "something else".to_string();
        let cmd = state.load_example();
        assert_eq!(
            cmd,
            Some(ProviderCommand::Analyze {
                generation: 1,
                text: EXAMPLE_TEXT.to_string(),
            })
        );
        assert_eq!(state.view, ViewState::Analyzing);
    }

    #[test]
    fn input_is_frozen_outside_landing_screen() {
        let mut state = AppState::new();
        state.input = "abc".to_string();
        state.view = ViewState::Results {
            analysis: AnalysisResult {
                extracted_skills: Vec::new(),
                experience_level: String::new(),
                collaboration_style: String::new(),
                portfolio_readiness: 0.0,
                learning_goals: Vec::new(),
                problem_solving_approach: None,
            },
        };
        state.push_char('d');
        state.clear_input();
        assert_eq!(state.input, "abc");
    }

    #[test]
    fn null_or_missing_scalars_default() {
        let raw = r#"{"extracted_skills":[],"experience_level":null,
            "collaboration_style":null,"portfolio_readiness":null}"#;
        let result: AnalysisResult = serde_json::from_str(raw).expect("analysis should parse");
        assert_eq!(result.experience_level, "");
        assert_eq!(result.collaboration_style, "");
        assert_eq!(result.portfolio_readiness, 0.0);

        let raw = r#"{"user":{"name":"Alex Kim","title":null,"location":null},
            "skill_complementarity":null,"learning_synergy":0.5}"#;
        let candidate: MatchCandidate = serde_json::from_str(raw).expect("candidate should parse");
        assert_eq!(candidate.compatibility_score, 0.0);
        assert_eq!(candidate.skill_complementarity, 0.0);
        assert_eq!(candidate.learning_synergy, 0.5);
        assert_eq!(candidate.user.title, "");
        assert!(candidate.user.skills.is_empty());
    }

    #[test]
    fn load_example_while_analyzing_sets_text_only() {
        let mut state = AppState::new();
        state.input = "first".to_string();
        state.submit().expect("first submit");
        assert_eq!(state.load_example(), None);
        assert_eq!(state.input, EXAMPLE_TEXT);
        assert_eq!(state.generation, 1);
        assert_eq!(state.view, ViewState::Analyzing);
    }

    #[test]
    fn stats_failure_reaches_diagnostics() {
        use crate::error::{ApiCall, FailureKind};

        let mut state = AppState::new();
        let failure = FailureReport {
            call: ApiCall::Stats,
            kind: FailureKind::Status,
            message: "HTTP 504".to_string(),
        };
        apply_delta(
            &mut state,
            Delta::StatsLoaded {
                stats: Stats::fallback(),
                failure: Some(failure),
            },
        );
        assert_eq!(state.stats, Some(Stats::fallback()));
        assert_eq!(state.logs.len(), 1);
        assert!(state.logs[0].contains("[WARN] stats status error"));
    }
}
