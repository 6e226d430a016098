use colored::*;
use std::io::{self, Write};

/// Console handles all terminal I/O with colored formatting
pub struct Console {
    prompt_color: Color,
    answer_color: Color,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            prompt_color: Color::Cyan,
            answer_color: Color::Yellow,
        }
    }

    /// Print the welcome banner
    pub fn print_banner(&self) {
        println!(
            "{}",
            format!(" Commerce Orchestrator v{} ", env!("CARGO_PKG_VERSION"))
                .yellow()
                .bold()
        );
        println!("This agent routes your requests to the order and inventory agents.");
        println!("Type 'exit' to quit.");
        println!();
    }

    pub fn print_input_separator(&self) {
        println!("{}", " =.=.= ".repeat(15).on_red());
    }

    pub fn print_answer_separator(&self) {
        println!("{}", " *.*.* ".repeat(15).on_blue());
    }

    /// Read a line of input from the user
    pub fn read_input(&self) -> io::Result<Option<String>> {
        print!("\n{} ", ">".color(self.prompt_color).bold());
        io::stdout().flush()?;

        let mut input = String::new();
        let read = io::stdin().read_line(&mut input)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(input))
    }

    pub fn print_processing(&self) {
        println!("{}", "...Processing...".red().bold());
        println!();
    }

    /// Print the final answer between separators
    pub fn print_answer(&self, answer: &str) {
        self.print_answer_separator();
        println!("{}", answer.color(self.answer_color).bold());
        println!();
        self.print_answer_separator();
        println!("\n");
    }

    /// Print a system message (notices, goodbye)
    pub fn print_system(&self, message: &str) {
        println!("{}", message);
    }

    pub fn print_warning(&self, message: &str) {
        println!("{}", message.red().bold());
    }

    /// Print an error message
    pub fn print_error(&self, error: &str) {
        eprintln!("{} {}", "An error occurred:".red().bold(), error);
        eprintln!("Please try again");
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
