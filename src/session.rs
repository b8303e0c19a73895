//! Line-based study session
//!
//! Drives [`StudyQueries`] in a show / reveal / mark cycle. Input and output
//! are generic so the loop runs the same against a terminal or a buffer.

use std::io::{BufRead, Write};
use std::time::{Duration, Instant};
use owo_colors::OwoColorize;
use serde::Serialize;
use crate::{Error, Result};
use crate::level::Level;
use crate::phrase::Phrase;
use crate::query::StudyQueries;
use crate::ui::theme;

/// What happened during one session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub shown: usize,
    pub learned: usize,
    pub skipped: usize,
    /// True when the session ended because nothing was left to study
    pub exhausted: bool,
    #[serde(skip)]
    pub elapsed: Duration,
}

enum Answer {
    Learned,
    Skip,
    Quit,
}

/// Run a session until the user quits, input ends, or no phrase is due.
///
/// Skipping a phrase touches it, which moves it behind the other phrases of
/// its level.
pub fn run_session<R: BufRead, W: Write>(
    queries: &StudyQueries<'_>,
    level: Option<Level>,
    input: &mut R,
    out: &mut W,
) -> Result<SessionSummary> {
    let started = Instant::now();
    let mut summary = SessionSummary::default();

    loop {
        let Some(phrase) = queries.next_due(level)? else {
            summary.exhausted = true;
            break;
        };
        summary.shown += 1;

        match ask(&phrase, input, out)? {
            Answer::Learned => {
                queries.set_completed(phrase.id, true)?;
                summary.learned += 1;
            }
            Answer::Skip => {
                queries.set_completed(phrase.id, false)?;
                summary.skipped += 1;
            }
            Answer::Quit => break,
        }
    }

    summary.elapsed = started.elapsed();
    tracing::debug!(?summary, "Session finished");
    Ok(summary)
}

fn ask<R: BufRead, W: Write>(phrase: &Phrase, input: &mut R, out: &mut W) -> Result<Answer> {
    writeln!(out)?;
    writeln!(
        out,
        "[{} #{}] {}",
        phrase.level,
        phrase.id,
        phrase.source_text.style(theme().prompt.clone())
    )?;
    write!(out, "{}", "Enter to reveal, q to quit: ".style(theme().dim.clone()))?;
    out.flush()?;

    match read_answer(input)? {
        None => return Ok(Answer::Quit),
        Some(line) if line == "q" => return Ok(Answer::Quit),
        Some(_) => {}
    }

    writeln!(out, "  {}", phrase.target_text.style(theme().answer.clone()))?;
    write!(out, "{}", "Learned? [y/N/q]: ".style(theme().dim.clone()))?;
    out.flush()?;

    Ok(match read_answer(input)?.as_deref() {
        None | Some("q") => Answer::Quit,
        Some("y") | Some("yes") => Answer::Learned,
        Some(_) => Answer::Skip,
    })
}

/// Next trimmed, lowercased line, `None` at end of input
fn read_answer<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input.read_line(&mut line).map_err(Error::Io)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_lowercase()))
}
