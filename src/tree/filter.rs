//! Name filtering for `--ignore` patterns

use glob::Pattern;

/// Names matching any of these patterns are left out of listings and
/// not descended into.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    literals: Vec<String>,
    patterns: Vec<Pattern>,
}

impl NameFilter {
    /// Patterns that fail to compile still match their literal text.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let literals = patterns.iter().map(|p| p.as_ref().to_string()).collect();
        let patterns = patterns
            .iter()
            .filter_map(|p| Pattern::new(p.as_ref()).ok())
            .collect();
        Self { literals, patterns }
    }

    /// Check if a name should be ignored.
    pub fn is_ignored(&self, name: &str) -> bool {
        self.literals.iter().any(|l| l == name) || self.patterns.iter().any(|p| p.matches(name))
    }
}
