use regex::Regex;

/// Gitignore-style rules as used by `.funcignore`.
///
/// Patterns are anchored at the start of the relative path and match on a
/// word boundary, so `test1` ignores `test1/x` but not `test1File.wat`.
/// A negated rule wins over every positive one.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    positive: Option<Regex>,
    negative: Option<Regex>,
}

impl IgnoreRules {
    pub fn parse(content: &str) -> Self {
        let mut positive = Vec::new();
        let mut negative = Vec::new();

        for line in content.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (list, pattern) = match line.strip_prefix('!') {
                Some(rest) => (&mut negative, rest),
                None => (&mut positive, line),
            };
            list.push(pattern.strip_prefix('/').unwrap_or(pattern).to_string());
        }

        Self {
            positive: combine(positive),
            negative: combine(negative),
        }
    }

    pub fn accepts(&self, path: &str) -> bool {
        let path = if path == "/" { "" } else { path };
        matches(&self.negative, path) || !matches(&self.positive, path)
    }

    pub fn denies(&self, path: &str) -> bool {
        !self.accepts(path)
    }

    pub fn is_empty(&self) -> bool {
        self.positive.is_none() && self.negative.is_none()
    }
}

fn matches(rule: &Option<Regex>, path: &str) -> bool {
    rule.as_ref().is_some_and(|r| r.is_match(path))
}

fn combine(mut patterns: Vec<String>) -> Option<Regex> {
    if patterns.is_empty() {
        return None;
    }
    patterns.sort();
    let alternatives: Vec<String> = patterns.iter().map(|p| glob_to_regex(p)).collect();
    // Every piece is escaped, so the combined expression always compiles.
    Regex::new(&format!("^(({}))\\b", alternatives.join(")|("))).ok()
}

/// `**` spans directories, `*` stays within one path segment.
fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::new();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '*' {
            if chars.peek() == Some(&'*') {
                chars.next();
                out.push_str("(.+)");
            } else {
                out.push_str("([^/]+)");
            }
        } else {
            out.push_str(&regex::escape(c.encode_utf8(&mut [0; 4])));
        }
    }
    out
}
