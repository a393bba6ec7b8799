use std::io::{self, Write};

use console::Style;
use duolog_core::config::BotColor;

const SEPARATOR_WIDTH: usize = 50;

fn speaker_style(color: BotColor) -> Style {
    let style = Style::new();
    match color {
        BotColor::Cyan => style.cyan(),
        BotColor::Yellow => style.yellow(),
        BotColor::Green => style.green(),
        BotColor::Blue => style.blue(),
        BotColor::Magenta => style.magenta(),
        BotColor::Red => style.red(),
    }
}

/// Splits streamed fragments into whole words at whitespace boundaries.
///
/// Each emitted word keeps its trailing whitespace character, so the
/// concatenation of all emitted words plus the final leftover equals the
/// concatenation of the fragments fed in, character for character.
#[derive(Debug, Default)]
pub struct WordBuffer {
    buf: String,
}

impl WordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fragment and returns any words it completed.
    pub fn push(&mut self, fragment: &str) -> Vec<String> {
        self.buf.push_str(fragment);
        let mut words = Vec::new();
        while let Some((i, c)) = self.buf.char_indices().find(|&(_, c)| c.is_whitespace()) {
            let rest = self.buf.split_off(i + c.len_utf8());
            words.push(std::mem::replace(&mut self.buf, rest));
        }
        words
    }

    /// Returns the trailing partial word, if any.
    pub fn finish(self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(self.buf)
        }
    }
}

/// Streams one speaker's turn to the terminal word by word.
pub struct SpeakerPrinter {
    name: String,
    style: Style,
    extra_line: bool,
    words: WordBuffer,
    transcript: String,
}

impl SpeakerPrinter {
    pub fn new(name: &str, color: BotColor, extra_line: bool) -> Self {
        Self {
            name: name.to_string(),
            style: speaker_style(color),
            extra_line,
            words: WordBuffer::new(),
            transcript: String::new(),
        }
    }

    /// Prints the bold speaker header; the response starts on the next line.
    pub fn begin(&self) {
        print!("{}", self.style.apply_to(format!("[{}]", self.name)).bold());
        if self.extra_line {
            println!();
        }
        println!();
        let _ = io::stdout().flush();
    }

    /// Feeds a response fragment, printing any words it completed.
    pub fn feed(&mut self, fragment: &str) {
        for word in self.words.push(fragment) {
            print!("{}", self.style.apply_to(word.as_str()));
            self.transcript.push_str(&word);
        }
        let _ = io::stdout().flush();
    }

    /// Flushes the leftover partial word and the turn separator, and returns
    /// the full response text trimmed of surrounding whitespace.
    pub fn finish(mut self) -> String {
        if let Some(rest) = std::mem::take(&mut self.words).finish() {
            print!("{}", self.style.apply_to(rest.as_str()));
            self.transcript.push_str(&rest);
        }
        println!("\n{}", "-".repeat(SEPARATOR_WIDTH));
        let _ = io::stdout().flush();
        self.transcript.trim().to_string()
    }
}
