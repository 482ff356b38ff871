use inquire::{Confirm, InquireError, Text};
use std::io::{BufRead, Write};

use projtrack_core::{Result, TrackerError};

/// Question-and-answer channel the shell talks through.
///
/// End of input surfaces as `TrackerError::Interrupted` from `text` and
/// `confirm`.
pub trait Prompter {
    fn text(&mut self, message: &str) -> Result<String>;

    /// Yes/no question; only `yes` or `y` count as yes
    fn confirm(&mut self, message: &str) -> Result<bool> {
        let answer = self.text(&format!("{} (yes/no):", message))?;
        Ok(is_affirmative(&answer))
    }

    fn say(&mut self, line: &str) -> Result<()>;
}

pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "yes" | "y")
}

/// Terminal prompts through `inquire`
pub struct InquirePrompter;

fn from_inquire(err: InquireError) -> TrackerError {
    match err {
        InquireError::IO(e) => TrackerError::Io(e),
        _ => TrackerError::Interrupted,
    }
}

impl Prompter for InquirePrompter {
    fn text(&mut self, message: &str) -> Result<String> {
        Text::new(message).prompt().map_err(from_inquire)
    }

    fn confirm(&mut self, message: &str) -> Result<bool> {
        Confirm::new(message)
            .with_default(false)
            .with_parser(&|answer| Ok(is_affirmative(answer)))
            .prompt()
            .map_err(from_inquire)
    }

    fn say(&mut self, line: &str) -> Result<()> {
        println!("{}", line);
        Ok(())
    }
}

/// Line-at-a-time prompts for pipes and `--plain`
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn text(&mut self, message: &str) -> Result<String> {
        write!(self.output, "{} ", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(TrackerError::Interrupted);
        }
        Ok(line.trim_end_matches(['\n', '\r']).to_string())
    }

    fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.output, "{}", line)?;
        Ok(())
    }
}
