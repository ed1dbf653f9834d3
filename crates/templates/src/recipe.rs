//! A small Dockerfile parser.
//!
//! Enough of the format is understood to inspect generated recipes:
//! stages, environment variables, copies (including `--from`) and run
//! commands. Anything else is kept as [`Instruction::Other`].

use funckit_models::FuncError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    From { image: String, alias: Option<String> },
    Env(Vec<(String, String)>),
    Copy(CopyInstruction),
    Run(String),
    Workdir(String),
    Other { keyword: String, args: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyInstruction {
    pub from: Option<String>,
    pub sources: Vec<String>,
    pub dest: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub line: usize,
    pub instruction: Instruction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub index: usize,
    pub line: usize,
    pub image: String,
    pub alias: Option<String>,
    pub steps: Vec<Step>,
}

impl Stage {
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// Environment variables in declaration order; later ones win on lookup.
    pub fn env(&self) -> Vec<(String, String)> {
        self.steps
            .iter()
            .filter_map(|s| match &s.instruction {
                Instruction::Env(pairs) => Some(pairs.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn env_value(&self, key: &str) -> Option<String> {
        self.env().into_iter().rev().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn copies(&self) -> Vec<&CopyInstruction> {
        self.steps
            .iter()
            .filter_map(|s| match &s.instruction {
                Instruction::Copy(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    pub fn runs(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|s| match &s.instruction {
                Instruction::Run(cmd) => Some(cmd.as_str()),
                _ => None,
            })
            .collect()
    }

    fn answers_to(&self, reference: &str) -> bool {
        self.alias
            .as_deref()
            .is_some_and(|a| a.eq_ignore_ascii_case(reference))
            || reference.parse::<usize>().is_ok_and(|i| i == self.index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    /// `ARG` instructions that precede the first `FROM`.
    pub preamble: Vec<Step>,
    stages: Vec<Stage>,
}

impl Recipe {
    pub fn parse(text: &str) -> Result<Self, FuncError> {
        let mut preamble = Vec::new();
        let mut stages: Vec<Stage> = Vec::new();

        for (line, content) in logical_lines(text) {
            let (keyword, args) = match content.split_once(char::is_whitespace) {
                Some((k, a)) => (k.to_ascii_uppercase(), a.trim().to_string()),
                None => (content.to_ascii_uppercase(), String::new()),
            };
            let instruction = parse_instruction(line, &keyword, &args)?;

            match instruction {
                Instruction::From { image, alias } => stages.push(Stage {
                    index: stages.len(),
                    line,
                    image,
                    alias,
                    steps: Vec::new(),
                }),
                other => match stages.last_mut() {
                    Some(stage) => stage.steps.push(Step {
                        line,
                        instruction: other,
                    }),
                    None if keyword == "ARG" => preamble.push(Step {
                        line,
                        instruction: other,
                    }),
                    None => {
                        return Err(FuncError::InvalidDockerfile {
                            line,
                            reason: format!("{keyword} before the first FROM"),
                        })
                    }
                },
            }
        }

        if stages.is_empty() {
            return Err(FuncError::InvalidDockerfile {
                line: 0,
                reason: "no FROM instruction".to_string(),
            });
        }

        Ok(Self { preamble, stages })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn final_stage(&self) -> Option<&Stage> {
        self.stages.last()
    }

    pub fn stage(&self, reference: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.answers_to(reference))
    }

    /// Every `COPY --from` must name an earlier stage.
    pub fn validate(&self) -> Result<(), FuncError> {
        for stage in &self.stages {
            for step in &stage.steps {
                if let Instruction::Copy(CopyInstruction { from: Some(from), .. }) = &step.instruction {
                    let known = self.stages[..stage.index].iter().any(|s| s.answers_to(from));
                    if !known {
                        return Err(FuncError::InvalidDockerfile {
                            line: step.line,
                            reason: format!("COPY --from={from} does not name an earlier stage"),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

/// Joins `\` continuations and drops comments and blank lines. Each
/// logical line carries the number of its first physical line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for (idx, raw) in text.lines().enumerate() {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (content, continues) = match trimmed.strip_suffix('\\') {
            Some(stripped) => (stripped.trim_end(), true),
            None => (trimmed, false),
        };

        match current.as_mut() {
            Some((_, buf)) => {
                if !content.is_empty() {
                    buf.push(' ');
                    buf.push_str(content);
                }
            }
            None => current = Some((idx + 1, content.to_string())),
        }

        if !continues {
            lines.extend(current.take());
        }
    }

    lines.extend(current);
    lines
}

fn parse_instruction(line: usize, keyword: &str, args: &str) -> Result<Instruction, FuncError> {
    let invalid = |reason: String| FuncError::InvalidDockerfile { line, reason };

    match keyword {
        "FROM" => {
            let words: Vec<&str> = args.split_whitespace().filter(|w| !w.starts_with("--")).collect();
            let image = words
                .first()
                .ok_or_else(|| invalid("FROM requires an image".to_string()))?
                .to_string();
            let alias = match words.get(1) {
                Some(kw) if kw.eq_ignore_ascii_case("AS") => Some(
                    words
                        .get(2)
                        .ok_or_else(|| invalid("FROM ... AS requires a stage name".to_string()))?
                        .to_string(),
                ),
                Some(other) => return Err(invalid(format!("unexpected token '{other}' in FROM"))),
                None => None,
            };
            Ok(Instruction::From { image, alias })
        }
        "ENV" => parse_env(args).map(Instruction::Env).map_err(invalid),
        "COPY" => parse_copy(args).map(Instruction::Copy).map_err(invalid),
        "RUN" => Ok(Instruction::Run(args.to_string())),
        "WORKDIR" => Ok(Instruction::Workdir(args.to_string())),
        _ => Ok(Instruction::Other {
            keyword: keyword.to_string(),
            args: args.to_string(),
        }),
    }
}

fn parse_env(args: &str) -> Result<Vec<(String, String)>, String> {
    let words = split_words(args)?;
    let first = words.first().ok_or_else(|| "ENV requires a key".to_string())?;

    if !first.contains('=') {
        // Legacy `ENV key value` form: everything after the key is the value.
        let (raw_key, rest) = split_first_word(args.trim());
        let key = split_words(raw_key)?.concat();
        return Ok(vec![(key, rest.trim().to_string())]);
    }

    words
        .into_iter()
        .map(|w| match w.split_once('=') {
            Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
            _ => Err(format!("ENV expects key=value, got '{w}'")),
        })
        .collect()
}

fn parse_copy(args: &str) -> Result<CopyInstruction, String> {
    let mut rest = args.trim();
    let mut from = None;

    while let Some(flagged) = rest.strip_prefix("--") {
        let (flag, remainder) = flagged.split_once(char::is_whitespace).unwrap_or((flagged, ""));
        if let Some(stage) = flag.strip_prefix("from=") {
            from = Some(stage.to_string());
        }
        rest = remainder.trim_start();
    }

    let paths: Vec<String> = if rest.starts_with('[') {
        serde_json::from_str(rest).map_err(|e| format!("invalid COPY array: {e}"))?
    } else {
        split_words(rest)?
    };

    match paths.split_last() {
        Some((dest, sources)) if !sources.is_empty() => Ok(CopyInstruction {
            from,
            sources: sources.to_vec(),
            dest: dest.clone(),
        }),
        _ => Err("COPY requires at least one source and a destination".to_string()),
    }
}

/// Splits off the first word of `input`, quotes and escapes included, at
/// the first unquoted whitespace.
fn split_first_word(input: &str) -> (&str, &str) {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, c) in input.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), _) => {}
            (_, '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, c) if c.is_whitespace() => return (&input[..idx], &input[idx..]),
            _ => {}
        }
    }
    (input, "")
}

/// Whitespace split that honours single and double quotes and backslash
/// escapes. Quotes are removed from the result.
fn split_words(input: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
            }
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuations_and_comments() {
        let text = "# syntax=docker/dockerfile:1\nFROM alpine AS base\nRUN echo a && \\\n    # inline comment\n    echo b\n";
        let recipe = Recipe::parse(text).unwrap();
        let stage = &recipe.stages()[0];
        assert_eq!(stage.alias(), Some("base"));
        assert_eq!(stage.runs(), vec!["echo a && echo b"]);
        assert_eq!(stage.steps[0].line, 3);
    }

    #[test]
    fn test_env_forms() {
        let recipe = Recipe::parse(
            "FROM alpine\nENV A=1 B=\"two words\" \\\n    C=3\nENV LEGACY some value here\n",
        )
        .unwrap();
        let stage = recipe.final_stage().unwrap();
        assert_eq!(stage.env_value("A").as_deref(), Some("1"));
        assert_eq!(stage.env_value("B").as_deref(), Some("two words"));
        assert_eq!(stage.env_value("C").as_deref(), Some("3"));
        assert_eq!(stage.env_value("LEGACY").as_deref(), Some("some value here"));
    }

    #[test]
    fn test_legacy_env_with_quoted_or_non_ascii_key() {
        let recipe = Recipe::parse("FROM a\nENV \"KEY\" value\nENV \"é\" x\nENV SP\\ ACE  spaced out\n").unwrap();
        let stage = recipe.final_stage().unwrap();
        assert_eq!(stage.env_value("KEY").as_deref(), Some("value"));
        assert_eq!(stage.env_value("é").as_deref(), Some("x"));
        assert_eq!(stage.env_value("SP ACE").as_deref(), Some("spaced out"));
    }

    #[test]
    fn test_split_first_word() {
        assert_eq!(split_first_word("\"a b\" rest"), ("\"a b\"", " rest"));
        assert_eq!(split_first_word("a\\ b rest"), ("a\\ b", " rest"));
        assert_eq!(split_first_word("alone"), ("alone", ""));
    }

    #[test]
    fn test_copy_forms() {
        let recipe = Recipe::parse(
            "FROM a AS build\nFROM b\nCOPY --from=build [\"/x\", \"/y\"]\nCOPY --chown=1000:1000 src1 src2 /dst/\n",
        )
        .unwrap();
        let copies = recipe.final_stage().unwrap().copies();
        assert_eq!(copies[0].from.as_deref(), Some("build"));
        assert_eq!(copies[0].sources, vec!["/x"]);
        assert_eq!(copies[0].dest, "/y");
        assert_eq!(copies[1].from, None);
        assert_eq!(copies[1].sources, vec!["src1", "src2"]);
        recipe.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_unknown_stage() {
        let recipe = Recipe::parse("FROM a\nCOPY --from=ghost /x /y\n").unwrap();
        let err = recipe.validate().unwrap_err();
        assert!(matches!(err, FuncError::InvalidDockerfile { line: 2, .. }));
    }

    #[test]
    fn test_validate_accepts_stage_index() {
        let recipe = Recipe::parse("FROM a\nFROM b\nCOPY --from=0 /x /y\n").unwrap();
        recipe.validate().unwrap();
        assert!(recipe.stage("0").is_some());
    }

    #[test]
    fn test_instruction_before_from_rejected() {
        let err = Recipe::parse("RUN echo hi\nFROM alpine\n").unwrap_err();
        assert!(matches!(err, FuncError::InvalidDockerfile { line: 1, .. }));

        let recipe = Recipe::parse("ARG TAG=3\nFROM alpine:${TAG}\n").unwrap();
        assert_eq!(recipe.preamble.len(), 1);
    }

    #[test]
    fn test_empty_and_bad_from() {
        assert!(Recipe::parse("# nothing\n\n").is_err());
        assert!(Recipe::parse("FROM\n").is_err());
        assert!(Recipe::parse("FROM a AS\n").is_err());
        assert!(Recipe::parse("FROM a b\n").is_err());
    }

    #[test]
    fn test_split_words_quotes() {
        assert_eq!(
            split_words(r#"a "b c" 'd e' f\ g"#).unwrap(),
            vec!["a", "b c", "d e", "f g"]
        );
        assert!(split_words("\"open").is_err());
    }
}
