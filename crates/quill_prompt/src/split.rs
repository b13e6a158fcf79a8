//! Continuation head/tail split.

/// Number of trailing lines that anchor a continuation.
pub const TAIL_LINES: usize = 3;

/// Split body text into background `head` and the last few `tail` lines.
///
/// Both halves are trimmed. Texts of [`TAIL_LINES`] lines or fewer are all tail.
///
/// # Examples
///
/// ```
/// use quill_prompt::split_continuation;
///
/// assert_eq!(split_continuation(""), (String::new(), String::new()));
/// assert_eq!(split_continuation("a\nb\nc"), (String::new(), "a\nb\nc".to_string()));
/// assert_eq!(split_continuation("a\nb\nc\nd"), ("a".to_string(), "b\nc\nd".to_string()));
/// ```
pub fn split_continuation(body_text: &str) -> (String, String) {
    let trimmed = body_text.trim();
    if trimmed.is_empty() {
        return (String::new(), String::new());
    }

    let lines: Vec<&str> = trimmed.lines().collect();
    if lines.len() <= TAIL_LINES {
        return (String::new(), lines.join("\n").trim().to_string());
    }

    let (head, tail) = lines.split_at(lines.len() - TAIL_LINES);
    (
        head.join("\n").trim().to_string(),
        tail.join("\n").trim().to_string(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surrounding_whitespace_is_ignored() {
        assert_eq!(
            split_continuation("\n\n  one\ntwo\n"),
            (String::new(), "one\ntwo".to_string())
        );
    }

    #[test]
    fn blank_lines_inside_count_as_lines() {
        let (head, tail) = split_continuation("a\n\nb\nc\nd");
        assert_eq!(head, "a");
        assert_eq!(tail, "b\nc\nd");

        let (head, tail) = split_continuation("a\nb\n\nc\nd");
        assert_eq!(head, "a\nb");
        assert_eq!(tail, "c\nd");
    }

    #[test]
    fn crlf_lines_are_split() {
        let (head, tail) = split_continuation("a\r\nb\r\nc\r\nd");
        assert_eq!(head, "a");
        assert_eq!(tail, "b\nc\nd");
    }
}
