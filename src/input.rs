//! Command-line input: one job specification per line.

use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::config::InputSource;
use crate::error::{Result, UschedError};

/// One parsed input line: a program name plus its arguments. The raw line is
/// kept for diagnostics. There is no cap on argument count or line length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub line: String,
}

impl CommandSpec {
    /// Split a line into program and arguments on ASCII whitespace.
    /// Returns `None` for blank lines and `#` comments.
    pub fn parse(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }

        let mut words = trimmed.split_ascii_whitespace().map(String::from);
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
            line: trimmed.to_string(),
        })
    }
}

/// Read every job specification from `reader`, skipping blank lines and
/// comments. Input order is preserved; it becomes round-robin order.
pub async fn read_commands<R>(reader: R) -> Result<Vec<CommandSpec>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut specs = Vec::new();
    let mut lineno = 0u64;

    while let Some(line) = lines.next_line().await? {
        lineno += 1;
        match CommandSpec::parse(&line) {
            Some(spec) => specs.push(spec),
            None => tracing::debug!(line = lineno, "skipping blank or comment line"),
        }
    }

    Ok(specs)
}

/// Read job specifications from the configured source.
pub async fn read_input(source: &InputSource) -> Result<Vec<CommandSpec>> {
    match source {
        InputSource::Stdin => read_commands(BufReader::new(tokio::io::stdin())).await,
        InputSource::File(path) => {
            let file = File::open(path)
                .await
                .map_err(|source| UschedError::InputOpen {
                    path: path.clone(),
                    source,
                })?;
            read_commands(BufReader::new(file)).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_program_and_args() {
        let spec = CommandSpec::parse("grep -r needle /tmp").unwrap();
        assert_eq!(spec.program, "grep");
        assert_eq!(spec.args, vec!["-r", "needle", "/tmp"]);
        assert_eq!(spec.line, "grep -r needle /tmp");
    }

    #[test]
    fn parse_collapses_whitespace() {
        let spec = CommandSpec::parse("  echo \t hello   world  ").unwrap();
        assert_eq!(spec.program, "echo");
        assert_eq!(spec.args, vec!["hello", "world"]);
    }

    #[test]
    fn parse_program_without_args() {
        let spec = CommandSpec::parse("true").unwrap();
        assert_eq!(spec.program, "true");
        assert!(spec.args.is_empty());
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        assert!(CommandSpec::parse("").is_none());
        assert!(CommandSpec::parse("   \t ").is_none());
        assert!(CommandSpec::parse("# a comment").is_none());
    }

    #[tokio::test]
    async fn read_commands_preserves_input_order() {
        let input = b"echo one\n\n# comment\necho two\nsleep 3\n";
        let specs = read_commands(&input[..]).await.unwrap();
        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].line, "echo one");
        assert_eq!(specs[1].line, "echo two");
        assert_eq!(specs[2].line, "sleep 3");
    }

    #[tokio::test]
    async fn read_commands_empty_input() {
        let specs = read_commands(&b""[..]).await.unwrap();
        assert!(specs.is_empty());
    }
}
