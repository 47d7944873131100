use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tabula_core::Location;
use tabula_shell::{PromptAnswer, Prompter, SaveChoice};
use tracing::warn;

/// 以文字介面回答外殼的提問。 / Answers shell questions over a line-based terminal.
///
/// Commands and prompt answers share the same input stream. End of input answers
/// every prompt with its cautious default.
pub struct TerminalPrompter<R, W> {
    input: R,
    output: W,
    cwd: PathBuf,
}

impl<R: BufRead, W: Write> TerminalPrompter<R, W> {
    pub fn new(input: R, output: W, cwd: PathBuf) -> Self {
        Self { input, output, cwd }
    }

    pub fn cwd(&self) -> &PathBuf {
        &self.cwd
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// 讀取下一行；輸入結束時回傳 `None`。 / Next input line, `None` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        let asked = write!(self.output, "{question} ").and_then(|()| self.output.flush());
        if let Err(err) = asked {
            warn!(error = %err, "failed to write prompt");
        }
        match self.read_line() {
            Ok(answer) => answer.map(|answer| answer.trim().to_ascii_lowercase()),
            Err(err) => {
                warn!(error = %err, "failed to read answer");
                None
            }
        }
    }
}

impl<R: BufRead, W: Write> Prompter for TerminalPrompter<R, W> {
    fn confirm_continue(&mut self, title: &str, text: &str) -> PromptAnswer {
        let question = format!("{title}: {} [y]es/[n]o/[a]lways", text.replace("\n\n", " "));
        match self.ask(&question).as_deref() {
            Some("y" | "yes") => PromptAnswer::proceed(),
            Some("a" | "always") => PromptAnswer {
                proceed: true,
                remember: true,
            },
            _ => PromptAnswer::cancel(),
        }
    }

    fn resolve_unsaved(&mut self, caption: &str) -> SaveChoice {
        let question = format!("Save changes to {caption}? [s]ave/[d]iscard/[c]ancel");
        match self.ask(&question).as_deref() {
            Some("s" | "save") => SaveChoice::Save,
            Some("d" | "discard") => SaveChoice::Discard,
            _ => SaveChoice::Cancel,
        }
    }

    fn ask_save_location(&mut self, caption: &str) -> Option<Location> {
        let question = format!("Save {caption} as:");
        let asked = write!(self.output, "{question} ").and_then(|()| self.output.flush());
        if let Err(err) = asked {
            warn!(error = %err, "failed to write prompt");
        }
        let answer = self.read_line().ok().flatten()?;
        Location::from_user_input(&answer, &self.cwd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(input: &str) -> TerminalPrompter<Cursor<Vec<u8>>, Vec<u8>> {
        TerminalPrompter::new(
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
            PathBuf::from("/work"),
        )
    }

    #[test]
    fn confirmation_answers() {
        let mut prompter = prompter("y\nALWAYS\nn\n");
        assert_eq!(
            prompter.confirm_continue("Quit", "Sure?"),
            PromptAnswer::proceed()
        );
        assert!(prompter.confirm_continue("Quit", "Sure?").remember);
        assert!(!prompter.confirm_continue("Quit", "Sure?").proceed);
        assert!(!prompter.confirm_continue("Quit", "Sure?").proceed);

        let shown = String::from_utf8(prompter.output().clone()).unwrap();
        assert!(shown.starts_with("Quit: Sure? [y]es/[n]o/[a]lways"));
    }

    #[test]
    fn unsaved_answers_default_to_cancel() {
        let mut prompter = prompter("s\nd\nwhat\n");
        assert_eq!(prompter.resolve_unsaved("a.txt"), SaveChoice::Save);
        assert_eq!(prompter.resolve_unsaved("a.txt"), SaveChoice::Discard);
        assert_eq!(prompter.resolve_unsaved("a.txt"), SaveChoice::Cancel);
        assert_eq!(prompter.resolve_unsaved("a.txt"), SaveChoice::Cancel);
    }

    #[cfg(unix)]
    #[test]
    fn save_location_is_resolved_against_cwd() {
        let mut prompter = prompter("out/new.txt\n\n");
        let location = prompter.ask_save_location("Untitled").unwrap();
        assert_eq!(location.as_path(), std::path::Path::new("/work/out/new.txt"));
        assert_eq!(prompter.ask_save_location("Untitled"), None);
        assert_eq!(prompter.ask_save_location("Untitled"), None);
    }

    #[test]
    fn commands_and_answers_share_input() {
        let mut prompter = prompter("list\r\nquit");
        assert_eq!(prompter.read_line().unwrap().as_deref(), Some("list"));
        assert_eq!(prompter.read_line().unwrap().as_deref(), Some("quit"));
        assert_eq!(prompter.read_line().unwrap(), None);
    }
}
