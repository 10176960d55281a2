//! Typed fallback for hosts without a microphone or STT model.
//!
//! Prompts go to the speaker (if any) and to the writer; answers are read one
//! line at a time.  A blank line maps to `Unknown`, a read failure or end of
//! input to `Error`.

use std::io::{BufRead, Write};

use super::prompter::PromptListener;
use super::speaker::Speaker;
use super::transcript::Transcript;

pub struct ConsolePrompter<R, W, S> {
    input: R,
    output: W,
    speaker: S,
}

impl<R: BufRead, W: Write, S: Speaker> ConsolePrompter<R, W, S> {
    pub fn new(input: R, output: W, speaker: S) -> Self {
        Self {
            input,
            output,
            speaker,
        }
    }

    fn read_answer(&mut self) -> Transcript {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => {
                log::warn!("console: end of input");
                Transcript::Error
            }
            Ok(_) => {
                let answer = line.trim_end_matches(['\r', '\n']);
                if answer.trim().is_empty() {
                    Transcript::Unknown
                } else {
                    Transcript::Text(answer.to_string())
                }
            }
            Err(e) => {
                log::warn!("console: read failed: {e}");
                Transcript::Error
            }
        }
    }
}

impl<R: BufRead, W: Write, S: Speaker> PromptListener for ConsolePrompter<R, W, S> {
    fn prompt_and_listen(&mut self, prompt: &str) -> Transcript {
        self.say(prompt);
        let _ = write!(self.output, "> ");
        let _ = self.output.flush();
        self.read_answer()
    }

    fn say(&mut self, text: &str) {
        let _ = writeln!(self.output, "{text}");
        if let Err(e) = self.speaker.speak(text) {
            log::warn!("Error in text-to-speech: {e}");
        }
    }
}
