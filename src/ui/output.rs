//! Human-facing status lines. Everything goes to stderr so stdout can carry
//! JSON untouched.

use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

pub fn header(text: &str) {
    eprintln!("{} {}", Icons::ROCKET, text.style(theme().header.clone()));
}

pub fn warn(label: &str) {
    eprintln!("{} {}", Icons::WARN, label.style(theme().warn.clone()));
}

pub fn timing(elapsed: &str) {
    eprintln!("{} {}", Icons::CLOCK.style(theme().dim.clone()), elapsed);
}
