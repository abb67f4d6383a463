// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recognition of individual WP output lines.
//!
//! WP prints one section per function, and inside it one `Goal ...` line per proof obligation
//! followed (possibly after the printed formula) by a `Prover ... returns ...` line. A single
//! line can carry several facts at once, so [`recognize`] returns all of them, in the order the
//! correlator has to apply them.

use once_cell::sync::Lazy;
use regex::Regex;

static PROVED_GOALS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S*Proved goals:\s*(\d+)\s*/\s*(\d+)\s*$").unwrap());
static PROVER_RESULT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Prover\s+(.+?)\s+returns\s+(\w+)").unwrap());
static GOAL_TOPIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Goal\s+(\S+)\s+([^( ]+)?(?:\s+in '[^']+')? \(").unwrap());
static PRE_CONDITION: Lazy<Regex> = Lazy::new(|| Regex::new(r"Goal.*Pre-condition\s").unwrap());
static POST_CONDITION: Lazy<Regex> = Lazy::new(|| Regex::new(r"Goal.*Post-condition\s").unwrap());
static LOCATED_GOAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Goal(.*?)\(file\s*([^\s,]+)\s*,\s*line\s*(\d+)\s*\)(?:\s*in '(\S+)')?(.*)$")
        .unwrap()
});
static NAMED_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\s*\bin '([^']+)'$").unwrap());
static ASSIGNS_NOTHING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Goal Assigns(?:\s*for '\S+')? nothing\b").unwrap());
static LOOP_ASSIGNS_NOTHING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Goal Loop assigns nothing\b").unwrap());
static BEHAVIORS_CLAUSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Goal (Complete|Disjoint) behaviors\s*('[^']+'(?:,\s*'[^']+')*)").unwrap()
});
static GOAL_WITHOUT_LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Goal[^']*(?:'\S+')?(?:\s*in '\S+'(?: at call [^:]+)?)?[^:]*:\s*$").unwrap()
});
static ASSIGNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Goal Assigns\s").unwrap());
static LEMMA: Lazy<Regex> = Lazy::new(|| Regex::new(r"Lemma\s*(\S+)[^:]*:\s*$").unwrap());

const COMMAND_NOT_FOUND: &str = "command not found";

/// The kind of contract clause a goal line talks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseKind {
    Pre,
    Post,
}

impl ClauseKind {
    pub fn label(&self) -> &'static str {
        match self {
            ClauseKind::Pre => "Pre-condition",
            ClauseKind::Post => "Post-condition",
        }
    }
}

/// A goal definition that names a source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedGoal {
    /// The goal text between `Goal` and the location, without the function it names.
    pub text: String,
    pub file: String,
    pub line: u32,
    /// The function named by the goal (`in 'f'`), before or right after the location.
    pub function: Option<String>,
    /// Everything after the location. May describe a call site.
    pub trailer: String,
}

/// Goal definitions that carry no usable location. They still receive a prover result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlocatedGoalKind {
    AssignsNothing,
    LoopAssignsNothing,
    Behaviors { clause: String, behaviors: Vec<String> },
    WithoutLocation,
    Assigns,
    Lemma(String),
}

impl UnlocatedGoalKind {
    /// A short description for logs.
    pub fn describe(&self) -> String {
        match self {
            UnlocatedGoalKind::AssignsNothing => "assigns nothing".to_string(),
            UnlocatedGoalKind::LoopAssignsNothing => "loop assigns nothing".to_string(),
            UnlocatedGoalKind::Behaviors { clause, behaviors } => {
                format!("{} behaviors {}", clause.to_lowercase(), behaviors.join(", "))
            }
            UnlocatedGoalKind::WithoutLocation => "goal without location".to_string(),
            UnlocatedGoalKind::Assigns => "assigns".to_string(),
            UnlocatedGoalKind::Lemma(name) => format!("lemma {name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// `Function <name>` opens the section of a function.
    SectionHeader(String),
    ClauseMarker(ClauseKind),
    GoalTopic(String),
    LocatedGoal(LocatedGoal),
    UnlocatedGoal(UnlocatedGoalKind),
    /// `Prover <prover> returns <verdict>`. The verdict is kept verbatim.
    ProverResult { prover: String, verdict: String },
}

/// All facts carried by `line`, in application order.
pub fn recognize(line: &str) -> Vec<LineEvent> {
    let mut events = Vec::new();

    let mut words = line.split_whitespace();
    if words.next() == Some("Function") {
        if let Some(name) = words.next() {
            events.push(LineEvent::SectionHeader(name.to_string()));
        }
    }

    if PRE_CONDITION.is_match(line) {
        events.push(LineEvent::ClauseMarker(ClauseKind::Pre));
    } else if POST_CONDITION.is_match(line) {
        events.push(LineEvent::ClauseMarker(ClauseKind::Post));
    }

    if let Some(topic) = GOAL_TOPIC.captures(line).and_then(|c| c.get(2)) {
        events.push(LineEvent::GoalTopic(topic.as_str().to_string()));
    }

    if let Some(goal) = located_goal(line) {
        // A goal line never carries its own verdict.
        events.push(LineEvent::LocatedGoal(goal));
        return events;
    }
    if let Some(kind) = unlocated_goal(line) {
        events.push(LineEvent::UnlocatedGoal(kind));
    }

    if let Some(captures) = PROVER_RESULT.captures(line) {
        events.push(LineEvent::ProverResult {
            prover: captures[1].to_string(),
            verdict: captures[2].to_string(),
        });
    }
    events
}

fn located_goal(line: &str) -> Option<LocatedGoal> {
    let captures = LOCATED_GOAL.captures(line)?;
    let Ok(line_number) = captures[3].parse::<u32>() else {
        tracing::debug!(line, "goal location has an unusable line number");
        return None;
    };
    let mut text = captures[1].trim().to_string();
    let mut function = captures.get(4).map(|f| f.as_str().replace('\'', ""));
    if let Some(named) = NAMED_FUNCTION.captures(&text) {
        function = function.or_else(|| Some(named[2].to_string()));
        text = named[1].to_string();
    }
    Some(LocatedGoal {
        text,
        file: captures[2].to_string(),
        line: line_number,
        function: function.filter(|f| !f.is_empty()),
        trailer: captures.get(5).map_or("", |t| t.as_str()).to_string(),
    })
}

fn unlocated_goal(line: &str) -> Option<UnlocatedGoalKind> {
    if ASSIGNS_NOTHING.is_match(line) {
        Some(UnlocatedGoalKind::AssignsNothing)
    } else if LOOP_ASSIGNS_NOTHING.is_match(line) {
        Some(UnlocatedGoalKind::LoopAssignsNothing)
    } else if let Some(captures) = BEHAVIORS_CLAUSE.captures(line) {
        let behaviors = captures[2]
            .split(',')
            .map(|b| b.trim().trim_matches('\'').to_string())
            .filter(|b| !b.is_empty())
            .collect();
        Some(UnlocatedGoalKind::Behaviors { clause: captures[1].to_string(), behaviors })
    } else if GOAL_WITHOUT_LOCATION.is_match(line) || located_shape_without_number(line) {
        Some(UnlocatedGoalKind::WithoutLocation)
    } else if ASSIGNS.is_match(line) {
        Some(UnlocatedGoalKind::Assigns)
    } else {
        LEMMA.captures(line).map(|c| UnlocatedGoalKind::Lemma(c[1].to_string()))
    }
}

/// A located goal whose line number could not be used still counts as a definition.
fn located_shape_without_number(line: &str) -> bool {
    LOCATED_GOAL.is_match(line)
}

/// The `(proved, total)` pair of the `Proved goals: P / T` summary line.
pub fn proved_goals(line: &str) -> Option<(u64, u64)> {
    let captures = PROVED_GOALS.captures(line)?;
    Some((captures[1].parse().ok()?, captures[2].parse().ok()?))
}

/// Whether the shell reported that the verifier could not be started.
pub fn is_command_not_found(line: &str) -> bool {
    line.contains(COMMAND_NOT_FOUND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_proved_goals() {
        assert_eq!(proved_goals("[wp] Proved goals:   3 / 5"), Some((3, 5)));
        assert_eq!(proved_goals("Proved goals: 1/2  "), Some((1, 2)));
        assert_eq!(proved_goals("[wp] Proved goals: 3 / 5 (Qed)"), None);
        assert_eq!(proved_goals("[wp] 5 goals scheduled"), None);
    }

    #[test]
    fn check_section_header() {
        assert_eq!(recognize("  Function f"), vec![LineEvent::SectionHeader("f".into())]);
        assert_eq!(recognize("Function"), vec![]);
        assert_eq!(recognize("Functional test"), vec![]);
    }

    #[test]
    fn check_located_goal() {
        let events = recognize("Goal Pre-condition 'x' (file a.c, line 10):");
        assert_eq!(
            events,
            vec![
                LineEvent::ClauseMarker(ClauseKind::Pre),
                LineEvent::GoalTopic("'x'".into()),
                LineEvent::LocatedGoal(LocatedGoal {
                    text: "Pre-condition 'x'".into(),
                    file: "a.c".into(),
                    line: 10,
                    function: None,
                    trailer: ":".into(),
                }),
            ]
        );
    }

    #[test]
    fn check_located_goal_with_call_site() {
        let events = recognize(
            "Goal Instance of 'Pre-condition (file a.c, line 3) in 'f'' in 'main' at call 'f' (file b.c, line 12):",
        );
        let Some(LineEvent::LocatedGoal(goal)) = events.last() else {
            panic!("expected a located goal, got {events:?}")
        };
        assert_eq!(events[0], LineEvent::ClauseMarker(ClauseKind::Pre));
        assert_eq!(goal.file, "a.c");
        assert_eq!(goal.line, 3);
        assert_eq!(goal.function.as_deref(), Some("f"));
        assert_eq!(goal.trailer, " in 'main' at call 'f' (file b.c, line 12):");
    }

    #[test]
    fn check_post_condition_marker() {
        let events = recognize("Goal Post-condition 'y' in 'g' (file a.c, line 14):");
        assert_eq!(events[0], LineEvent::ClauseMarker(ClauseKind::Post));
        assert_eq!(events[1], LineEvent::GoalTopic("'y'".into()));
        assert_eq!(
            events[2],
            LineEvent::LocatedGoal(LocatedGoal {
                text: "Post-condition 'y'".into(),
                file: "a.c".into(),
                line: 14,
                function: Some("g".into()),
                trailer: ":".into(),
            })
        );
    }

    #[test]
    fn check_unlocated_goals() {
        let kind = |line: &str| match recognize(line).pop() {
            Some(LineEvent::UnlocatedGoal(kind)) => Some(kind),
            _ => None,
        };
        assert_eq!(kind("Goal Assigns nothing in 'f':"), Some(UnlocatedGoalKind::AssignsNothing));
        assert_eq!(
            kind("Goal Loop assigns nothing in 'f':"),
            Some(UnlocatedGoalKind::LoopAssignsNothing)
        );
        assert_eq!(
            kind("Goal Complete behaviors 'pos', 'neg' in 'f':"),
            Some(UnlocatedGoalKind::Behaviors {
                clause: "Complete".into(),
                behaviors: vec!["pos".into(), "neg".into()]
            })
        );
        assert_eq!(
            kind("Goal Post-condition 'ok' in 'f':"),
            Some(UnlocatedGoalKind::WithoutLocation)
        );
        assert_eq!(kind("Lemma sum_pos:"), Some(UnlocatedGoalKind::Lemma("sum_pos".into())));
        assert_eq!(
            kind("Goal Assertion (file a.c, line 99999999999):"),
            Some(UnlocatedGoalKind::WithoutLocation)
        );
        assert_eq!(kind("Assume { Type: is_sint32(x). }"), None);
    }

    #[test]
    fn check_describe_unlocated_goal() {
        let behaviors = UnlocatedGoalKind::Behaviors {
            clause: "Disjoint".into(),
            behaviors: vec!["a".into(), "b".into()],
        };
        assert_eq!(behaviors.describe(), "disjoint behaviors a, b");
        assert_eq!(UnlocatedGoalKind::Lemma("sum_pos".into()).describe(), "lemma sum_pos");
    }

    #[test]
    fn check_prover_result() {
        assert_eq!(
            recognize("Prover Alt-Ergo returns Valid (Qed:2ms) (4ms)"),
            vec![LineEvent::ProverResult { prover: "Alt-Ergo".into(), verdict: "Valid".into() }]
        );
        assert_eq!(
            recognize("Prover Alt-Ergo 2.4.0 returns Timeout (Qed:4ms) (10s)"),
            vec![LineEvent::ProverResult {
                prover: "Alt-Ergo 2.4.0".into(),
                verdict: "Timeout".into()
            }]
        );
    }

    #[test]
    fn check_command_not_found() {
        assert!(is_command_not_found("sh: 1: frama-c: command not found"));
        assert!(!is_command_not_found("[kernel] Parsing a.c (with preprocessing)"));
    }
}
