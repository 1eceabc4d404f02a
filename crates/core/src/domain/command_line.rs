// Command Line Domain Model
// Keyword -> flag translation (POSIX short flags, GNU long flags)

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::arg::{ArgValue, KwArgs};
use super::error::{DomainError, Result};

/// Flag marker prefix
pub const FLAG_MARKER: char = '-';

/// Translate a keyword into its flag spelling
///
/// Keys that already carry a marker pass through unchanged. Otherwise a
/// single-character key becomes `-k` and a longer key becomes `--key`.
pub fn flag_for(key: &str) -> Result<String> {
    if key.is_empty() {
        return Err(DomainError::EmptyKey);
    }

    if key.starts_with(FLAG_MARKER) {
        return Ok(key.to_string());
    }

    if key.chars().count() == 1 {
        Ok(format!("-{}", key))
    } else {
        Ok(format!("--{}", key))
    }
}

fn is_long_flag(flag: &str) -> bool {
    flag.starts_with("--")
}

fn push_option(out: &mut Vec<String>, key: &str, flag: &str, value: &ArgValue) -> Result<()> {
    match value {
        ArgValue::Bool(true) => out.push(flag.to_string()),
        ArgValue::Bool(false) => {
            return Err(DomainError::FalseFlag {
                key: key.to_string(),
            })
        }
        ArgValue::List(items) => {
            for item in items {
                push_option(out, key, flag, item)?;
            }
        }
        scalar if is_long_flag(flag) => out.push(format!("{}={}", flag, scalar)),
        scalar => {
            out.push(flag.to_string());
            out.push(scalar.to_string());
        }
    }
    Ok(())
}

/// Turn keyword and positional arguments into argv tokens (without the program)
///
/// Option tokens come first in keyword order, positionals follow in order.
///
/// # Errors
/// - `DomainError::FalseFlag` if any keyword (or list element) is `false`
/// - `DomainError::EmptyKey` for an empty keyword
pub fn prepare_args(args: &[String], kwargs: &KwArgs) -> Result<Vec<String>> {
    let mut options = Vec::with_capacity(kwargs.len() * 2 + args.len());

    for (key, value) in kwargs.iter() {
        let flag = flag_for(key)?;
        push_option(&mut options, key, &flag, value)?;
    }

    options.extend(args.iter().cloned());

    debug!(tokens = ?options, "Prepared arguments");

    Ok(options)
}

/// A complete invocation: program followed by its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct CommandLine(Vec<String>);

impl TryFrom<Vec<String>> for CommandLine {
    type Error = DomainError;

    fn try_from(tokens: Vec<String>) -> Result<Self> {
        Self::from_tokens(tokens)
    }
}

impl From<CommandLine> for Vec<String> {
    fn from(line: CommandLine) -> Self {
        line.0
    }
}

impl CommandLine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Result<Self> {
        let program = program.into();
        if program.is_empty() {
            return Err(DomainError::EmptyProgram);
        }

        let mut tokens = Vec::with_capacity(args.len() + 1);
        tokens.push(program);
        tokens.extend(args);
        Ok(Self(tokens))
    }

    pub fn from_tokens(tokens: Vec<String>) -> Result<Self> {
        match tokens.first() {
            Some(program) if !program.is_empty() => Ok(Self(tokens)),
            _ => Err(DomainError::EmptyProgram),
        }
    }

    pub fn program(&self) -> &str {
        &self.0[0]
    }

    pub fn args(&self) -> &[String] {
        &self.0[1..]
    }

    pub fn tokens(&self) -> &[String] {
        &self.0
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.0
    }
}

fn needs_quoting(token: &str) -> bool {
    token.is_empty()
        || token
            .chars()
            .any(|c| c.is_whitespace() || "'\"\\$`!*?;&|<>()[]{}#~".contains(c))
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if needs_quoting(token) {
                write!(f, "'{}'", token.replace('\'', r"'\''"))?;
            } else {
                f.write_str(token)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw<const N: usize>(pairs: [(&str, ArgValue); N]) -> KwArgs {
        pairs.into_iter().collect()
    }

    #[test]
    fn test_short_flag_takes_separate_value() {
        let tokens = prepare_args(&[], &kw([("o", ArgValue::from("out.txt"))])).unwrap();
        assert_eq!(tokens, vec!["-o", "out.txt"]);
    }

    #[test]
    fn test_long_flag_joins_value() {
        let tokens = prepare_args(&[], &kw([("output", ArgValue::from("out.txt"))])).unwrap();
        assert_eq!(tokens, vec!["--output=out.txt"]);
    }

    #[test]
    fn test_marker_not_duplicated() {
        let tokens = prepare_args(
            &[],
            &kw([
                ("-r", ArgValue::from("rec.pdb")),
                ("--out", ArgValue::from("a.pdbqt")),
                ("-ighn", ArgValue::Bool(true)),
            ]),
        )
        .unwrap();
        assert_eq!(tokens, vec!["-r", "rec.pdb", "--out=a.pdbqt", "-ighn"]);
    }

    #[test]
    fn test_true_is_bare_flag() {
        let tokens = prepare_args(
            &[],
            &kw([("v", ArgValue::Bool(true)), ("verbose", ArgValue::Bool(true))]),
        )
        .unwrap();
        assert_eq!(tokens, vec!["-v", "--verbose"]);
    }

    #[test]
    fn test_false_is_rejected() {
        let err = prepare_args(&[], &kw([("no_refine", ArgValue::Bool(false))])).unwrap_err();
        assert_eq!(
            err,
            DomainError::FalseFlag {
                key: "no_refine".to_string()
            }
        );
    }

    #[test]
    fn test_numbers_are_stringified() {
        let tokens = prepare_args(
            &[],
            &kw([("n", ArgValue::Int(9)), ("energy_range", ArgValue::Float(2.5))]),
        )
        .unwrap();
        assert_eq!(tokens, vec!["-n", "9", "--energy_range=2.5"]);
    }

    #[test]
    fn test_list_repeats_flag() {
        let tokens = prepare_args(
            &[],
            &kw([
                ("ligand", ArgValue::from(vec!["a.pdbqt", "b.pdbqt"])),
                ("l", ArgValue::from(vec!["c.pdbqt"])),
                ("flex", ArgValue::List(vec![])),
            ]),
        )
        .unwrap();
        assert_eq!(
            tokens,
            vec!["--ligand=a.pdbqt", "--ligand=b.pdbqt", "-l", "c.pdbqt"]
        );
    }

    #[test]
    fn test_false_inside_list_is_rejected() {
        let result = prepare_args(
            &[],
            &kw([("x", ArgValue::List(vec![ArgValue::Bool(false)]))]),
        );
        assert!(matches!(result, Err(DomainError::FalseFlag { .. })));
    }

    #[test]
    fn test_typed_values_pass_through() {
        let mut kwargs = KwArgs::new();
        for (key, text) in [("x", "007"), ("center_x", "1.0"), ("size", "1e3")] {
            kwargs.insert(key, text.parse::<ArgValue>().unwrap());
        }

        let tokens = prepare_args(&[], &kwargs).unwrap();
        assert_eq!(tokens, vec!["-x", "007", "--center_x=1.0", "--size=1e3"]);
    }

    #[test]
    fn test_deserialize_rejects_empty_line() {
        let line: CommandLine = serde_json::from_str(r#"["vina","--cpu=4"]"#).unwrap();
        assert_eq!(line.program(), "vina");
        assert_eq!(serde_json::to_string(&line).unwrap(), r#"["vina","--cpu=4"]"#);

        assert!(serde_json::from_str::<CommandLine>("[]").is_err());
        assert!(serde_json::from_str::<CommandLine>(r#"[""]"#).is_err());
    }

    #[test]
    fn test_positionals_follow_options() {
        let tokens = prepare_args(
            &["x".to_string(), "y".to_string()],
            &kw([("a", ArgValue::Int(1))]),
        )
        .unwrap();
        assert_eq!(tokens, vec!["-a", "1", "x", "y"]);
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let result = prepare_args(&[], &kw([("", ArgValue::Int(1))]));
        assert_eq!(result, Err(DomainError::EmptyKey));
    }

    #[test]
    fn test_command_line_requires_program() {
        assert_eq!(
            CommandLine::new("", vec![]),
            Err(DomainError::EmptyProgram)
        );
        assert_eq!(
            CommandLine::from_tokens(vec![]),
            Err(DomainError::EmptyProgram)
        );

        let cmd = CommandLine::new("vina", vec!["--help".to_string()]).unwrap();
        assert_eq!(cmd.program(), "vina");
        assert_eq!(cmd.args(), ["--help".to_string()]);
    }

    #[test]
    fn test_display_quotes_when_needed() {
        let cmd = CommandLine::from_tokens(vec![
            "vina".to_string(),
            "--out=my result.pdbqt".to_string(),
            "it's".to_string(),
            "plain".to_string(),
        ])
        .unwrap();
        assert_eq!(
            cmd.to_string(),
            r#"vina '--out=my result.pdbqt' 'it'\''s' plain"#
        );
    }
}
