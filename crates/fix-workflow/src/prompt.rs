use crate::policy::{FixAction, PromptOutcome};
use std::io::{BufRead, Write};
use tfc_bug_report::Bug;

/// Question shown for every presented bug
pub const PROMPT_QUESTION: &str = "Apply this fix? [Y/n/a]";

/// Hint shown after an unrecognized answer
pub const PROMPT_RETRY_HINT: &str =
    "Please answer 'Y' (yes), 'n' (no), or 'a' (yes, and commit the fix).";

/// Asks the operator what to do with one bug
pub trait DecisionPrompt {
    /// `index` is zero-based; `total` is the report size
    fn decide(&mut self, index: usize, total: usize, bug: &Bug) -> PromptOutcome;
}

/// Map an answer to an action; `None` means ask again.
///
/// Empty input accepts the default (apply).
#[must_use]
pub fn parse_answer(answer: &str) -> Option<FixAction> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "" | "y" | "yes" => Some(FixAction::Apply),
        "n" | "no" => Some(FixAction::Skip),
        "a" | "all" | "commit" => Some(FixAction::ApplyAndCommit),
        _ => None,
    }
}

/// Line-oriented prompt over any reader/writer pair; end of input aborts
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }
}

impl<R: BufRead, W: Write> DecisionPrompt for LinePrompt<R, W> {
    fn decide(&mut self, _index: usize, _total: usize, _bug: &Bug) -> PromptOutcome {
        loop {
            if write!(self.output, "{PROMPT_QUESTION}: ")
                .and_then(|()| self.output.flush())
                .is_err()
            {
                log::warn!("Prompt output closed, aborting session");
                return PromptOutcome::Abort;
            }

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) => {
                    log::info!("End of input at prompt, aborting session");
                    return PromptOutcome::Abort;
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Failed to read answer: {e}");
                    return PromptOutcome::Abort;
                }
            }

            if let Some(action) = parse_answer(&line) {
                return PromptOutcome::Decided(action);
            }

            let _ = writeln!(self.output, "{PROMPT_RETRY_HINT}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use tfc_bug_report::{Confidence, LineRange, Severity};

    fn sample_bug() -> Bug {
        Bug {
            description: "d".into(),
            file: "a.py".into(),
            lines: LineRange::new(1, 1),
            severity: Severity::High,
            confidence: Confidence::High,
            suggested_fix: String::new(),
            code_snippet: None,
        }
    }

    #[test]
    fn answers_map_to_actions() {
        assert_eq!(parse_answer(""), Some(FixAction::Apply));
        assert_eq!(parse_answer("Y\n"), Some(FixAction::Apply));
        assert_eq!(parse_answer(" no "), Some(FixAction::Skip));
        assert_eq!(parse_answer("A"), Some(FixAction::ApplyAndCommit));
        assert_eq!(parse_answer("maybe"), None);
    }

    #[test]
    fn unrecognized_answer_reprompts() {
        let mut prompt = LinePrompt::new(Cursor::new("what\nn\n"), Vec::new());

        let outcome = prompt.decide(0, 1, &sample_bug());

        assert_eq!(outcome, PromptOutcome::Decided(FixAction::Skip));
        let (_, output) = prompt.into_inner();
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches(PROMPT_QUESTION).count(), 2);
        assert!(text.contains(PROMPT_RETRY_HINT));
    }

    #[test]
    fn empty_line_applies() {
        let mut prompt = LinePrompt::new(Cursor::new("\n"), Vec::new());
        assert_eq!(
            prompt.decide(0, 1, &sample_bug()),
            PromptOutcome::Decided(FixAction::Apply)
        );
    }

    #[test]
    fn end_of_input_aborts() {
        let mut prompt = LinePrompt::new(Cursor::new(""), Vec::new());
        assert_eq!(prompt.decide(0, 1, &sample_bug()), PromptOutcome::Abort);

        let mut prompt = LinePrompt::new(Cursor::new("bogus\n"), Vec::new());
        assert_eq!(prompt.decide(0, 1, &sample_bug()), PromptOutcome::Abort);
    }
}
