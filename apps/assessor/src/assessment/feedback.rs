//! Human Feedback Gate — an operator likes or dislikes every generated style.
//!
//! The gate blocks until a verdict exists for every style. Where verdicts come
//! from is injected through `DecisionSource`: the terminal for interactive runs,
//! a fixed script for automation and tests.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::sync::Mutex;

use owo_colors::OwoColorize;
use tracing::{debug, info};

use crate::assessment::styles::{QuestionStyle, StyleSet};
use crate::errors::PipelineError;
use crate::pipeline::Stage;
use crate::state::{PipelineState, DISLIKED_QUESTION_STYLES, DIVERSIFIED_QUESTIONS, LIKED_QUESTION_STYLES};

const STAGE: Stage = Stage::Feedback;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Like,
    Dislike,
}

/// Anything other than `like` / `dislike`. Never leaves this module: the
/// operator is simply asked again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidVerdict(pub String);

impl FromStr for Verdict {
    type Err = InvalidVerdict;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" => Ok(Verdict::Like),
            "dislike" => Ok(Verdict::Dislike),
            _ => Err(InvalidVerdict(s.trim().to_string())),
        }
    }
}

/// Source of like/dislike decisions. `index` is 1-based.
pub trait DecisionSource: Send + Sync {
    fn ask(&self, index: usize, total: usize, style: &QuestionStyle) -> Result<Verdict, PipelineError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Terminal operator
// ────────────────────────────────────────────────────────────────────────────

/// Interactive operator on stdin/stderr. stdout carries only the final state.
pub struct TerminalOperator;

impl DecisionSource for TerminalOperator {
    fn ask(&self, index: usize, total: usize, style: &QuestionStyle) -> Result<Verdict, PipelineError> {
        let stdin = io::stdin();
        let stderr = io::stderr();
        prompt_verdict(index, total, style, &mut stdin.lock(), &mut stderr.lock())
    }
}

/// Renders one style and reads verdicts until a valid one arrives.
/// End of input is an operator error, since no verdict can ever arrive.
pub fn prompt_verdict<R: BufRead, W: Write>(
    index: usize,
    total: usize,
    style: &QuestionStyle,
    input: &mut R,
    output: &mut W,
) -> Result<Verdict, PipelineError> {
    render_style(index, total, style, output)?;

    loop {
        write!(
            output,
            "   {}  ",
            "Do you like this style? (like/dislike):".bright_magenta()
        )?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(PipelineError::Operator(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before every style received a verdict",
            )));
        }

        match line.parse::<Verdict>() {
            Ok(verdict) => {
                writeln!(output)?;
                return Ok(verdict);
            }
            Err(InvalidVerdict(token)) => {
                writeln!(
                    output,
                    "   {}  '{}' is not valid. Please enter 'like' or 'dislike'.",
                    "!".yellow(),
                    token
                )?;
            }
        }
    }
}

fn render_style<W: Write>(index: usize, total: usize, style: &QuestionStyle, output: &mut W) -> io::Result<()> {
    writeln!(output)?;
    writeln!(
        output,
        "{}  {}",
        format!("Style {index}/{total}").bright_cyan().bold(),
        style.style_name.bright_white().bold()
    )?;
    writeln!(output, "   {} {}", "Definition:".dimmed(), style.definition)?;
    writeln!(output, "   {} {}", "Example:".dimmed(), style.example)?;
    writeln!(output, "   {} {}", "Assessment goal:".dimmed(), style.assessment_goal)?;
    writeln!(
        output,
        "   {} {}",
        "Suitable topics:".dimmed(),
        style.suitable_for_topics.join(", ")
    )?;
    writeln!(output)
}

// ────────────────────────────────────────────────────────────────────────────
// Scripted operator
// ────────────────────────────────────────────────────────────────────────────

/// Replays a fixed list of answers in order. Invalid answers are skipped the
/// same way the terminal re-prompts.
pub struct ScriptedOperator {
    answers: Mutex<VecDeque<String>>,
}

impl ScriptedOperator {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
        }
    }
}

impl DecisionSource for ScriptedOperator {
    fn ask(&self, index: usize, total: usize, style: &QuestionStyle) -> Result<Verdict, PipelineError> {
        let mut answers = self.answers.lock().unwrap_or_else(|e| e.into_inner());
        while let Some(answer) = answers.pop_front() {
            match answer.parse::<Verdict>() {
                Ok(verdict) => {
                    debug!("Style {index}/{total} '{}': {verdict:?}", style.style_name);
                    return Ok(verdict);
                }
                Err(InvalidVerdict(token)) => debug!("Skipping invalid scripted answer '{token}'"),
            }
        }
        Err(PipelineError::Operator(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("feedback script ran out of answers at style {index}/{total}"),
        )))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gate
// ────────────────────────────────────────────────────────────────────────────

/// Partitions styles into liked and disliked, preserving their order.
pub fn partition_styles(
    styles: Vec<QuestionStyle>,
    operator: &dyn DecisionSource,
) -> Result<(Vec<QuestionStyle>, Vec<QuestionStyle>), PipelineError> {
    let total = styles.len();
    let mut liked = Vec::new();
    let mut disliked = Vec::new();

    for (idx, style) in styles.into_iter().enumerate() {
        match operator.ask(idx + 1, total, &style)? {
            Verdict::Like => liked.push(style),
            Verdict::Dislike => disliked.push(style),
        }
    }
    Ok((liked, disliked))
}

pub fn collect_style_feedback(
    state: PipelineState,
    operator: &dyn DecisionSource,
) -> Result<PipelineState, PipelineError> {
    let styles: StyleSet = state.require_json(STAGE, DIVERSIFIED_QUESTIONS)?;

    let (liked, disliked) = partition_styles(styles.question_styles, operator)?;
    if liked.is_empty() {
        return Err(PipelineError::EmptySelection);
    }

    info!(
        "Feedback collected: {} liked, {} disliked",
        liked.len(),
        disliked.len()
    );

    state
        .with_json(LIKED_QUESTION_STYLES, &liked)?
        .with_json(DISLIKED_QUESTION_STYLES, &disliked)
}
