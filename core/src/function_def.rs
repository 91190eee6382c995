//! Help metadata for built-in and user functions.

use core::cmp::Ordering;
use core::fmt;

use once_cell::sync::Lazy;

use crate::node::UnaryOp;

/// Column at which help descriptions are wrapped.
const WRAP_WIDTH: usize = 72;

/// Name and description of one function, for help output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDef {
    name: String,
    description: String,
}

impl FunctionDef {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Ord for FunctionDef {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.name.chars().map(|c| c.to_ascii_lowercase());
        let rhs = other.name.chars().map(|c| c.to_ascii_lowercase());
        lhs.cmp(rhs)
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.description.cmp(&other.description))
    }
}

impl PartialOrd for FunctionDef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        let mut line = String::new();
        for word in self.description.split_whitespace() {
            if !line.is_empty() && line.len() + 1 + word.len() > WRAP_WIDTH {
                writeln!(f, "    {}", line)?;
                line.clear();
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        if !line.is_empty() {
            writeln!(f, "    {}", line)?;
        }
        Ok(())
    }
}

static BUILTINS: Lazy<Vec<FunctionDef>> = Lazy::new(|| {
    let mut defs: Vec<FunctionDef> = UnaryOp::ALL
        .iter()
        .map(|op| FunctionDef::new(op.signature(), op.description()))
        .collect();
    defs.sort();
    defs
});

/// Help entries for every built-in operator, sorted by name.
pub fn builtin_functions() -> &'static [FunctionDef] {
    &BUILTINS
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ordering_ignores_case() {
        let mut defs = vec![
            FunctionDef::new("beta", ""),
            FunctionDef::new("Alpha", ""),
            FunctionDef::new("gamma", ""),
        ];
        defs.sort();
        let names: Vec<&str> = defs.iter().map(FunctionDef::name).collect();
        assert_eq!(names, vec!["Alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_display_wraps_description() {
        let def = FunctionDef::new("clump(F)", "word ".repeat(40));
        let text = def.to_string();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("clump(F)"));
        for line in lines {
            assert!(line.starts_with("    "));
            assert!(line.len() <= WRAP_WIDTH + 4);
        }
    }

    #[test]
    fn test_builtins_cover_every_operator() {
        let defs = builtin_functions();
        assert_eq!(defs.len(), UnaryOp::ALL.len());
        assert!(defs.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(defs.iter().any(|def| def.name() == "smooth(F, n)"));
    }
}
