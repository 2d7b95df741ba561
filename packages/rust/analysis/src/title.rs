//! Control title discovery.

use regex::Regex;

use controlkb_shared::{ControlKbError, Result};

/// Default attribute a control assigns its title to.
pub const DEFAULT_TITLE_FIELD: &str = "self.title";

/// How a control's title is read from its source.
pub trait TitleStrategy: Send + Sync {
    /// The declared title, or `None` when the source declares none.
    fn extract_title(&self, source: &str) -> Option<String>;
}

/// Reads the string literal assigned to a field, e.g. `self.title = "Kerberoasting"`.
///
/// The first matching line wins.
#[derive(Debug, Clone)]
pub struct AssignmentTitle {
    pattern: Regex,
}

impl AssignmentTitle {
    pub fn new(field: &str) -> Result<Self> {
        let pattern = format!(
            r#"{}\s*=\s*(?:"([^"]*)"|'([^']*)')"#,
            regex::escape(field)
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| ControlKbError::config(format!("invalid title field '{field}': {e}")))?;
        Ok(Self { pattern })
    }
}

impl Default for AssignmentTitle {
    fn default() -> Self {
        Self::new(DEFAULT_TITLE_FIELD).expect("default title field is a valid pattern")
    }
}

impl TitleStrategy for AssignmentTitle {
    fn extract_title(&self, source: &str) -> Option<String> {
        source.lines().find_map(|line| {
            let caps = self.pattern.captures(line)?;
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_double_and_single_quoted_titles() {
        let strategy = AssignmentTitle::default();
        assert_eq!(
            strategy.extract_title("        self.title = \"Kerberoasting\"\n").as_deref(),
            Some("Kerberoasting")
        );
        assert_eq!(
            strategy.extract_title("self.title='Old passwords'").as_deref(),
            Some("Old passwords")
        );
    }

    #[test]
    fn surrounding_whitespace_is_irrelevant() {
        let strategy = AssignmentTitle::default();
        let a = strategy.extract_title("self.title=\"Users with SPN\"");
        let b = strategy.extract_title("\t\tself.title    =     \"Users with SPN\"   # comment");
        assert_eq!(a, b);
        assert_eq!(a.as_deref(), Some("Users with SPN"));
    }

    #[test]
    fn skips_non_assignment_mentions() {
        let source = r#"
class Control:
    def check(self):
        if self.title == "x":
            print(self.title)
        self.title = "Real title"
"#;
        assert_eq!(
            AssignmentTitle::default().extract_title(source).as_deref(),
            Some("Real title")
        );
    }

    #[test]
    fn missing_title() {
        assert!(AssignmentTitle::default()
            .extract_title("self.name = \"nope\"\nself.title = get_title()\n")
            .is_none());
    }

    #[test]
    fn custom_field() {
        let strategy = AssignmentTitle::new("TITLE").unwrap();
        assert_eq!(
            strategy.extract_title("TITLE = \"Module title\"").as_deref(),
            Some("Module title")
        );
    }
}
