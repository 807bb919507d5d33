use colored::Colorize;
use std::fmt;

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Hint,
    Section,
}

fn apply_style(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    match kind {
        MessageKind::Info => text,
        MessageKind::Success => text.bright_green().to_string(),
        MessageKind::Warning => format!("warning: {text}").bright_yellow().to_string(),
        MessageKind::Error => format!("error: {text}").bright_red().to_string(),
        MessageKind::Hint => format!("hint: {text}").dimmed().to_string(),
        MessageKind::Section => format!("=== {} ===", text.trim()).bold().to_string(),
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let formatted = apply_style(kind, message);
    match kind {
        MessageKind::Section => println!("\n{formatted}"),
        _ => println!("{formatted}"),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn hint(message: impl fmt::Display) {
    print(MessageKind::Hint, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

/// Signed amount with two decimals, e.g. `+62.00 USD`.
pub fn format_signed(amount: f64, currency: &str) -> String {
    format!("{amount:+.2} {currency}")
}

pub fn format_amount(amount: f64, currency: &str) -> String {
    format!("{amount:.2} {currency}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amounts_render_with_two_decimals() {
        assert_eq!(format_signed(62.0, "USD"), "+62.00 USD");
        assert_eq!(format_signed(-18.0, "EUR"), "-18.00 EUR");
        assert_eq!(format_amount(43.999, "USD"), "44.00 USD");
    }

    #[test]
    fn error_lines_carry_prefix() {
        colored::control::set_override(false);
        assert_eq!(apply_style(MessageKind::Error, "boom"), "error: boom");
        assert_eq!(apply_style(MessageKind::Section, " Balances "), "=== Balances ===");
    }
}
