//! Pure projection of [`AppState`] into what the terminal draws.
//!
//! Nothing here touches the terminal or the network; `main.rs` only lays the
//! returned views out with ratatui widgets.

use crate::config::{REPOSITORY_URL, Settings};
use crate::state::{
    AnalysisResult, AppState, MatchCandidate, MatchSet, Skill, Stats, ViewState,
};

pub const MAX_MATCH_CARDS: usize = 4;
pub const LEVEL_GLYPH: char = '★';
const MAX_LEVEL_GLYPHS: usize = 32;

pub const EXAMPLE_HINTS: [&str; 3] = [
    "\"I'm a data scientist with 3 years in Python and ML...\"",
    "\"Currently learning React to build better interfaces...\"",
    "\"Looking for collaboration partners for portfolio projects...\"",
];

#[derive(Debug, Clone, PartialEq)]
pub enum RenderTree {
    Landing(LandingView),
    Results(ResultsView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub label: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LandingView {
    /// Empty until the stats call (or its fallback) has landed.
    pub stats: Vec<StatCard>,
    pub input: String,
    pub show_examples: bool,
    pub submit_label: &'static str,
    pub submit_enabled: bool,
    pub analyzing: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkillRow {
    pub name: String,
    pub confidence: String,
    pub evidence: String,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scorecards {
    pub experience_level: String,
    pub collaboration_style: String,
    pub readiness: String,
    pub readiness_ratio: f64,
    pub problem_solving: Option<String>,
    pub learning_goals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCard {
    pub initials: String,
    pub name: String,
    pub title: String,
    pub location: String,
    pub compatibility: String,
    pub skill_fit: String,
    pub learning: String,
    pub collab: String,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub name: String,
    pub title: String,
    pub location: String,
    pub bio: Option<String>,
    pub learning_goals: Vec<String>,
    pub reasoning: Vec<String>,
    pub suggested_projects: Vec<String>,
    pub you_gain: Vec<String>,
    pub they_gain: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultsView {
    pub skills: Vec<SkillRow>,
    pub scorecards: Scorecards,
    /// `None` while the match call has not come back.
    pub matches: Option<Vec<MatchCard>>,
    pub selected: usize,
    pub profile: Option<ProfileView>,
}

pub fn render_tree(state: &AppState) -> RenderTree {
    match &state.view {
        ViewState::Landing | ViewState::Analyzing => RenderTree::Landing(landing_view(state)),
        ViewState::Results { analysis } => RenderTree::Results(results_view(state, analysis, None)),
        ViewState::ResultsWithMatches { analysis, matches } => {
            RenderTree::Results(results_view(state, analysis, Some(matches)))
        }
    }
}

fn landing_view(state: &AppState) -> LandingView {
    let analyzing = state.view.is_analyzing();
    LandingView {
        stats: state.stats.as_ref().map(stat_cards).unwrap_or_default(),
        input: state.input.clone(),
        show_examples: state.input.is_empty(),
        submit_label: if analyzing {
            "Analyzing..."
        } else {
            "Analyze with AI"
        },
        submit_enabled: state.can_submit(),
        analyzing,
    }
}

fn results_view(
    state: &AppState,
    analysis: &AnalysisResult,
    matches: Option<&MatchSet>,
) -> ResultsView {
    let cards = matches.map(|set| visible_matches(set).iter().map(match_card).collect::<Vec<_>>());
    let profile = if state.profile_overlay {
        state.selected_candidate().map(profile_view)
    } else {
        None
    };
    ResultsView {
        skills: analysis.extracted_skills.iter().map(skill_row).collect(),
        scorecards: scorecards(analysis),
        matches: cards,
        selected: state.selected_match,
        profile,
    }
}

pub fn stat_cards(stats: &Stats) -> Vec<StatCard> {
    vec![
        StatCard {
            label: "Active Users",
            value: stats.total_users.to_string(),
        },
        StatCard {
            label: "Successful Matches",
            value: stats.successful_matches.to_string(),
        },
        StatCard {
            label: "Projects Built",
            value: stats.completed_projects.to_string(),
        },
        StatCard {
            label: "Match Accuracy",
            value: fixed_percent(stats.avg_match_accuracy),
        },
    ]
}

pub fn landing_links(settings: &Settings) -> Vec<Link> {
    vec![
        Link {
            label: "API Docs",
            url: settings.docs_url(),
        },
        Link {
            label: "View Code",
            url: REPOSITORY_URL.to_string(),
        },
    ]
}

pub fn skill_row(skill: &Skill) -> SkillRow {
    SkillRow {
        name: skill.skill.clone(),
        confidence: fixed_percent(skill.confidence),
        evidence: skill.evidence.join(", "),
        ratio: bar_ratio(skill.confidence),
    }
}

pub fn scorecards(analysis: &AnalysisResult) -> Scorecards {
    Scorecards {
        experience_level: capitalize_words(&analysis.experience_level),
        collaboration_style: analysis.collaboration_style.clone(),
        readiness: fixed_percent(analysis.portfolio_readiness),
        readiness_ratio: bar_ratio(analysis.portfolio_readiness),
        problem_solving: analysis
            .problem_solving_approach
            .clone()
            .filter(|s| !s.trim().is_empty()),
        learning_goals: analysis.learning_goals.clone(),
    }
}

/// The first [`MAX_MATCH_CARDS`] candidates, in the order the server ranked them.
pub fn visible_matches(set: &MatchSet) -> &[MatchCandidate] {
    let end = set.matches.len().min(MAX_MATCH_CARDS);
    &set.matches[..end]
}

pub fn match_card(candidate: &MatchCandidate) -> MatchCard {
    let user = &candidate.user;
    MatchCard {
        initials: initials(&user.name),
        name: user.name.clone(),
        title: user.title.clone(),
        location: user.location.clone(),
        compatibility: rounded_percent(candidate.compatibility_score),
        skill_fit: rounded_percent(candidate.skill_complementarity),
        learning: rounded_percent(candidate.learning_synergy),
        collab: rounded_percent(candidate.collaboration_fit),
        skills: user
            .skills
            .iter()
            .map(|(name, level)| format!("{name} {}", level_glyphs(*level)))
            .collect(),
    }
}

pub fn profile_view(candidate: &MatchCandidate) -> ProfileView {
    let user = &candidate.user;
    ProfileView {
        name: user.name.clone(),
        title: user.title.clone(),
        location: user.location.clone(),
        bio: user.bio.clone().filter(|b| !b.trim().is_empty()),
        learning_goals: user.learning_goals.clone(),
        reasoning: candidate.reasoning.clone(),
        suggested_projects: candidate.suggested_projects.clone(),
        you_gain: candidate.mutual_benefits.you_gain.clone(),
        they_gain: candidate.mutual_benefits.they_gain.clone(),
    }
}

/// Whole percent, rounding halves up. `None` for NaN and infinities.
/// Halves always go towards positive infinity, so `-0.005` gives `0`.
pub fn whole_percent(fraction: f64) -> Option<i64> {
    let scaled = fraction * 100.0;
    if !scaled.is_finite() {
        return None;
    }
    let floor = scaled.floor();
    let rounded = if scaled - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    };
    Some(rounded as i64)
}

/// Percent label for skills, readiness and accuracy.
pub fn fixed_percent(fraction: f64) -> String {
    format_percent(whole_percent(fraction))
}

/// Percent label for match scores. Same rounding as [`fixed_percent`].
pub fn rounded_percent(fraction: f64) -> String {
    format_percent(whole_percent(fraction))
}

fn format_percent(value: Option<i64>) -> String {
    match value {
        Some(v) => format!("{v}%"),
        None => "--%".to_string(),
    }
}

pub fn bar_ratio(fraction: f64) -> f64 {
    if fraction.is_nan() {
        return 0.0;
    }
    fraction.clamp(0.0, 1.0)
}

pub fn level_glyphs(level: i64) -> String {
    let count = usize::try_from(level).unwrap_or(0).min(MAX_LEVEL_GLYPHS);
    std::iter::repeat_n(LEVEL_GLYPH, count).collect()
}

pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|token| token.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

pub fn capitalize_words(raw: &str) -> String {
    raw.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
