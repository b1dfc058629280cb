use owo_colors::Style;
use std::sync::OnceLock;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Styles for the status lines written to stderr.
#[derive(Debug, Clone)]
pub struct Theme {
    pub header: Style,
    pub success: Style,
    pub warn: Style,
    pub info: Style,
    pub dim: Style,
}

impl Theme {
    pub fn for_terminal(is_term: bool) -> Self {
        if !is_term {
            return Self {
                header: Style::new(),
                success: Style::new(),
                warn: Style::new(),
                info: Style::new(),
                dim: Style::new(),
            };
        }
        Self {
            header: Style::new().cyan().bold(),
            success: Style::new().green().bold(),
            warn: Style::new().yellow().bold(),
            info: Style::new().magenta(),
            dim: Style::new().white().dimmed(),
        }
    }
}

pub fn theme() -> &'static Theme {
    THEME.get_or_init(|| Theme::for_terminal(console::Term::stderr().is_term()))
}
