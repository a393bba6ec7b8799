mod presenter;

pub use presenter::SpeakerPrinter;

use console::style;

pub fn present_error(error: anyhow::Error) {
    let error_text = style("ERROR:").red().bold();
    eprintln!("\n{error_text} {error}");
}

/// Prints a non-fatal turn failure into the conversation stream.
pub fn print_error_line(message: &str) {
    println!("{}", style(message).red());
}

/// Prints the opening topic banner.
pub fn print_topic_banner(topic: &str) {
    println!("{}", style(format!("\nSeeding with: '{topic}'\n")).green().bold());
}
