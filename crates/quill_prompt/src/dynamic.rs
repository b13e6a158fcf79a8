//! Dynamic prompt evaluation.
//!
//! Free text may embed `{opt1|opt2|"opt 3"}` expressions. Each evaluation
//! replaces every expression with one uniformly chosen option. Nothing is
//! cached, so evaluating the same text twice yields independent choices.
//!
//! Nested braces are not supported: `{A|{B|C}}` resolves the span `{A|{B|C}`
//! and leaves the trailing `}` in place.

use rand::Rng;
use rand::seq::SliceRandom;
use regex::{Captures, Regex};
use std::sync::LazyLock;
use tracing::trace;

static EXPRESSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^}]+)\}").expect("Valid expression regex"));

// Quoted segments may contain '|'; bare segments run to the next '|'.
static OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*"|'[^']*'|[^|]+"#).expect("Valid option regex"));

/// Evaluate every dynamic prompt expression in `text` using the thread RNG.
///
/// # Examples
///
/// ```
/// use quill_prompt::evaluate;
///
/// let out = evaluate("{朝|夜}の森");
/// assert!(out == "朝の森" || out == "夜の森");
///
/// assert_eq!(evaluate("no braces here"), "no braces here");
/// assert_eq!(evaluate("empty {} stays"), "empty {} stays");
/// ```
pub fn evaluate(text: &str) -> String {
    evaluate_with(text, &mut rand::thread_rng())
}

/// Evaluate with a caller-supplied RNG.
pub fn evaluate_with<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    if !text.contains('{') {
        return text.to_string();
    }

    EXPRESSION
        .replace_all(text, |caps: &Captures| {
            let options = parse_options(&caps[1]);
            match options.choose(&mut *rng) {
                Some(choice) => strip_quotes(choice).to_string(),
                None => {
                    trace!(expression = &caps[0], "No options, leaving expression as-is");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Split an expression body into trimmed, non-empty options.
///
/// Quotes are kept; they are stripped only from the chosen option.
fn parse_options(body: &str) -> Vec<&str> {
    OPTION
        .find_iter(body)
        .map(|m| m.as_str().trim())
        .filter(|option| !option.is_empty())
        .collect()
}

fn strip_quotes(option: &str) -> &str {
    for quote in ['"', '\''] {
        if option.len() >= 2 && option.starts_with(quote) && option.ends_with(quote) {
            return &option[1..option.len() - 1];
        }
    }
    option
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn quoted_options_keep_inner_pipes_and_spaces() {
        assert_eq!(parse_options(r#""a|b" | c "#), vec![r#""a|b""#, "c"]);
        assert_eq!(
            parse_options(r#"  option1  |  " option 2 " | option3 "#),
            vec!["option1", r#"" option 2 ""#, "option3"]
        );
    }

    #[test]
    fn empty_segments_are_dropped() {
        assert!(parse_options("||").is_empty());
        assert_eq!(parse_options("a||b"), vec!["a", "b"]);
    }

    #[test]
    fn pipes_only_is_left_literal() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(evaluate_with("x {||} y", &mut rng), "x {||} y");
        assert_eq!(evaluate_with("x { } y", &mut rng), "x { } y");
    }

    #[test]
    fn single_quotes_are_stripped() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(evaluate_with("{'E F'}", &mut rng), "E F");
        assert_eq!(evaluate_with(r#"{"quoted lonely"}"#, &mut rng), "quoted lonely");
    }

    #[test]
    fn lone_quote_character_is_kept() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(evaluate_with(r#"{"}"#, &mut rng), "\"");
    }

    #[test]
    fn adjacent_expressions_resolve_independently() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            seen.insert(evaluate_with("{one|two}{three|four}", &mut rng));
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn nested_braces_are_a_known_limitation() {
        let mut rng = StdRng::seed_from_u64(3);
        let out = evaluate_with("{A|{B|C}}", &mut rng);
        assert!(out == "A}" || out == "{B}" || out == "C}", "got {out}");
    }
}
