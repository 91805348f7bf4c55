//! Strip code-fence wrapping from raw model output.

const FENCE: &str = "```";

/// Remove one leading fence opener line and one trailing fence closer line.
///
/// The opener may carry a language tag (```` ```python ````). The body between
/// the fences is returned verbatim.
///
/// Only one fence layer is removed. Output whose body is itself fenced (a
/// reply wrapped twice) keeps the inner fence, so a second call strips it
/// again; idempotence holds only for bodies that do not start with a fence.
pub fn sanitize(raw: &str) -> &str {
    let body = strip_opener(raw);
    strip_closer(body)
}

fn strip_opener(text: &str) -> &str {
    let Some(rest) = text.strip_prefix(FENCE) else {
        return text;
    };
    let Some(newline) = rest.find('\n') else {
        return text;
    };
    let tag = rest[..newline].trim_end_matches('\r');
    if is_language_tag(tag) {
        &rest[newline + 1..]
    } else {
        text
    }
}

fn strip_closer(text: &str) -> &str {
    let Some(head) = text.strip_suffix(FENCE) else {
        return text;
    };
    if let Some(head) = head.strip_suffix("\r\n") {
        return head;
    }
    if let Some(head) = head.strip_suffix('\n') {
        return head;
    }
    text
}

fn is_language_tag(tag: &str) -> bool {
    tag.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_' | '.' | '#'))
}
