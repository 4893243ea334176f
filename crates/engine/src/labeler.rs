//! Labeling collaborators for active learning.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use crate::error::EngineError;
use crate::types::{Label, RecordPair};

/// Answer to one labeling prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelDecision {
    Match,
    Distinct,
    /// Skip this pair without labeling it.
    Unsure,
    /// Stop labeling and train on what has been collected.
    Finished,
}

impl LabelDecision {
    pub fn label(self) -> Option<Label> {
        match self {
            LabelDecision::Match => Some(Label::Match),
            LabelDecision::Distinct => Some(Label::Distinct),
            LabelDecision::Unsure | LabelDecision::Finished => None,
        }
    }
}

impl From<Label> for LabelDecision {
    fn from(label: Label) -> Self {
        match label {
            Label::Match => LabelDecision::Match,
            Label::Distinct => LabelDecision::Distinct,
        }
    }
}

/// Presents a pair and returns a decision. Blocks for as long as it needs.
pub trait Labeler {
    fn label(&mut self, pair: &RecordPair) -> Result<LabelDecision, EngineError>;
}

impl<L: Labeler + ?Sized> Labeler for &mut L {
    fn label(&mut self, pair: &RecordPair) -> Result<LabelDecision, EngineError> {
        (**self).label(pair)
    }
}

/// Replays a fixed sequence of decisions, then answers `Finished`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLabeler {
    script: VecDeque<LabelDecision>,
    prompts: usize,
}

impl ScriptedLabeler {
    pub fn new(script: impl IntoIterator<Item = LabelDecision>) -> Self {
        Self {
            script: script.into_iter().collect(),
            prompts: 0,
        }
    }

    /// Labeler that finishes immediately.
    pub fn finished() -> Self {
        Self::default()
    }

    /// How many pairs have been presented.
    pub fn prompts(&self) -> usize {
        self.prompts
    }
}

impl Labeler for ScriptedLabeler {
    fn label(&mut self, _pair: &RecordPair) -> Result<LabelDecision, EngineError> {
        self.prompts += 1;
        Ok(self.script.pop_front().unwrap_or(LabelDecision::Finished))
    }
}

/// Line-oriented console labeler.
///
/// Prints both records field by field and reads `y` (match), `n`
/// (distinct), `u` (unsure) or `f` (finished). End of input counts as
/// finished; anything else re-prompts.
pub struct ConsoleLabeler<R, W> {
    input: R,
    output: W,
    matches: usize,
    distinct: usize,
}

impl<R: BufRead, W: Write> ConsoleLabeler<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            matches: 0,
            distinct: 0,
        }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn show(&mut self, pair: &RecordPair) -> std::io::Result<()> {
        let mut ordered: Vec<&str> = pair.left.names().collect();
        ordered.extend(pair.right.names().filter(|n| pair.left.get(n).is_none()));

        for name in ordered {
            for record in [&pair.left, &pair.right] {
                let shown = record
                    .get(name)
                    .and_then(|v| v.render())
                    .unwrap_or_default();
                writeln!(self.output, "{name} : {shown}")?;
            }
            writeln!(self.output)?;
        }
        writeln!(
            self.output,
            "{}/10 positive, {}/10 negative",
            self.matches, self.distinct
        )?;
        writeln!(self.output, "Do these records refer to the same thing?")?;
        write!(self.output, "(y)es / (n)o / (u)nsure / (f)inished: ")?;
        self.output.flush()
    }
}

impl<R: BufRead, W: Write> Labeler for ConsoleLabeler<R, W> {
    fn label(&mut self, pair: &RecordPair) -> Result<LabelDecision, EngineError> {
        self.show(pair)?;
        loop {
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(LabelDecision::Finished);
            }
            let decision = match line.trim().to_ascii_lowercase().as_str() {
                "y" => LabelDecision::Match,
                "n" => LabelDecision::Distinct,
                "u" => LabelDecision::Unsure,
                "f" => LabelDecision::Finished,
                _ => {
                    write!(self.output, "Please enter y, n, u or f: ")?;
                    self.output.flush()?;
                    continue;
                }
            };
            match decision {
                LabelDecision::Match => self.matches += 1,
                LabelDecision::Distinct => self.distinct += 1,
                _ => {}
            }
            return Ok(decision);
        }
    }
}
