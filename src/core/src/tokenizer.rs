//! Shell-like splitting of label-supplied command lines.
//!
//! Rules:
//! - unquoted spaces and tabs separate tokens
//! - `"` or `'` open a quoted region closed by the same character; the
//!   closing quote ends the token and backslashes inside are literal
//! - outside quotes a backslash copies the next character verbatim
//! - the first character of the input is always copied verbatim, as if it
//!   had been escaped
//! - an unclosed quoted region is an error

use crate::error::{AutoRunError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Arg,
    Quoted(char),
}

/// Split a command line into arguments.
pub fn split_command_line(command: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut state = State::Start;
    let mut escape_next = true;

    for c in command.chars() {
        if let State::Quoted(quote) = state {
            if c == quote {
                args.push(std::mem::take(&mut current));
                state = State::Start;
            } else {
                current.push(c);
            }
            continue;
        }

        if escape_next {
            current.push(c);
            escape_next = false;
            state = State::Arg;
            continue;
        }

        match c {
            '\\' => escape_next = true,
            '"' | '\'' => state = State::Quoted(c),
            ' ' | '\t' => {
                if state == State::Arg {
                    args.push(std::mem::take(&mut current));
                    state = State::Start;
                }
            }
            _ => {
                current.push(c);
                state = State::Arg;
            }
        }
    }

    if matches!(state, State::Quoted(_)) {
        return Err(AutoRunError::MalformedInput {
            input: command.to_string(),
        });
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(s: &str) -> Vec<String> {
        split_command_line(s).unwrap()
    }

    #[test]
    fn test_empty_input() {
        assert!(split("").is_empty());
    }

    #[test]
    fn test_whitespace_separates() {
        assert_eq!(split("a b"), vec!["a", "b"]);
        assert_eq!(split("ls  -la\t/tmp"), vec!["ls", "-la", "/tmp"]);
    }

    #[test]
    fn test_trailing_token_without_whitespace() {
        assert_eq!(split("serve --port 8080"), vec!["serve", "--port", "8080"]);
    }

    #[test]
    fn test_trailing_whitespace_ignored() {
        assert_eq!(split("serve   "), vec!["serve"]);
    }

    #[test]
    fn test_first_character_copied_literally() {
        assert_eq!(split("ab"), vec!["ab"]);
        assert_eq!(split("a"), vec!["a"]);
    }

    #[test]
    fn test_leading_quote_is_literal() {
        assert_eq!(split("\"x"), vec!["\"x"]);
        assert_eq!(split("'hello"), vec!["'hello"]);
    }

    #[test]
    fn test_leading_backslash_is_literal() {
        // The first backslash is copied as-is; the second one escapes the 'n'.
        assert_eq!(split("\\\\n"), vec!["\\n"]);
        assert_eq!(split("\\ab"), vec!["\\ab"]);
    }

    #[test]
    fn test_leading_blank_is_literal() {
        assert_eq!(split(" a"), vec![" a"]);
    }

    #[test]
    fn test_quoted_region() {
        assert_eq!(split("x 'hello world'"), vec!["x", "hello world"]);
        assert_eq!(split("sh -c \"echo hi; sleep 1\""), vec!["sh", "-c", "echo hi; sleep 1"]);
    }

    #[test]
    fn test_quote_joins_current_token() {
        assert_eq!(split("--msg='a b'"), vec!["--msg=a b"]);
    }

    #[test]
    fn test_closing_quote_ends_token() {
        assert_eq!(split("x 'a'b"), vec!["x", "a", "b"]);
    }

    #[test]
    fn test_empty_quoted_region_yields_empty_token() {
        assert_eq!(split("x ''"), vec!["x", ""]);
    }

    #[test]
    fn test_mismatched_quote_kinds() {
        assert_eq!(split("x \"it's\""), vec!["x", "it's"]);
    }

    #[test]
    fn test_backslash_escapes_blank() {
        assert_eq!(split("a\\ b c"), vec!["a b", "c"]);
    }

    #[test]
    fn test_backslash_escapes_quote() {
        assert_eq!(split("say \\\"hi"), vec!["say", "\"hi"]);
    }

    #[test]
    fn test_backslash_literal_inside_quotes() {
        assert_eq!(split("x 'a\\b'"), vec!["x", "a\\b"]);
    }

    #[test]
    fn test_escaped_character_starts_token() {
        assert_eq!(split("x \\-y z"), vec!["x", "-y", "z"]);
    }

    #[test]
    fn test_trailing_backslash_dropped() {
        assert_eq!(split("ab\\"), vec!["ab"]);
    }

    #[test]
    fn test_unclosed_quote_is_error() {
        let err = split_command_line("echo \"unterminated").unwrap_err();
        match err {
            AutoRunError::MalformedInput { input } => {
                assert_eq!(input, "echo \"unterminated");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unclosed_single_quote_is_error() {
        assert!(split_command_line("x 'a").is_err());
    }

    #[test]
    fn test_non_ascii() {
        assert_eq!(split("héllo 'wörld x'"), vec!["héllo", "wörld x"]);
    }
}
