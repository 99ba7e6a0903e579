use console::{Term, style};

/// Human-facing status lines.
///
/// Everything goes to stderr so stdout can carry JSON.
pub struct Output {
    term: Term,
}

impl Output {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }

    fn line(&self, text: String) {
        let _ = self.term.write_line(&text);
    }

    pub fn success(&self, message: &str) {
        self.line(format!("{} {}", style("✓").green(), message));
    }

    pub fn error(&self, message: &str) {
        self.line(format!("{} {}", style("✗").red(), message));
    }

    pub fn warning(&self, message: &str) {
        self.line(format!("{} {}", style("⚠").yellow(), message));
    }

    pub fn info(&self, message: &str) {
        self.line(format!("{} {}", style("ℹ").blue(), message));
    }

    pub fn section(&self, message: &str) {
        self.line(format!("\n{}", style(message).bold()));
        self.line("─".repeat(40));
    }

    /// Aligned `label: value` row
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        self.line(format!("  {:<18} {}", style(format!("{}:", label)).dim(), value));
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
