use console::Term;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use std::io::{self, IsTerminal};
use tfc_bug_report::Bug;
use tfc_fix_workflow::{
    parse_answer, DecisionPrompt, LinePrompt, PromptOutcome, PROMPT_QUESTION, PROMPT_RETRY_HINT,
};

/// Terminal prompt with line editing; Ctrl-C or Ctrl-D aborts the session
pub(crate) struct DialoguerPrompt {
    term: Term,
    theme: ColorfulTheme,
}

impl DialoguerPrompt {
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl DecisionPrompt for DialoguerPrompt {
    fn decide(&mut self, _index: usize, _total: usize, _bug: &Bug) -> PromptOutcome {
        loop {
            let answer = Input::<String>::with_theme(&self.theme)
                .with_prompt(PROMPT_QUESTION)
                .allow_empty(true)
                .interact_text_on(&self.term);

            match answer {
                Ok(answer) => {
                    if let Some(action) = parse_answer(&answer) {
                        return PromptOutcome::Decided(action);
                    }
                    let _ = self.term.write_line(PROMPT_RETRY_HINT);
                }
                Err(e) => {
                    log::info!("Prompt closed ({e}), aborting session");
                    return PromptOutcome::Abort;
                }
            }
        }
    }
}

/// Dialoguer on a terminal, plain line reading for piped input
pub(crate) fn choose_prompt() -> Box<dyn DecisionPrompt> {
    if io::stdin().is_terminal() && io::stderr().is_terminal() {
        Box::new(DialoguerPrompt::new())
    } else {
        log::debug!("stdin is not a terminal, reading answers line by line");
        Box::new(LinePrompt::new(io::stdin().lock(), io::stderr()))
    }
}
