//! Console output helpers

use colored::Colorize;

pub fn print_info(message: &str) {
    println!("{}", message);
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message);
}
