//! Response parsing for LLM outputs.
//!
//! Completions are free-form text. Models tend to wrap SQL (or JSON) in a
//! markdown fence, sometimes with a language tag, sometimes not.

const FENCE: &str = "```";

/// Returns the body of the first markdown code fence in `text`.
///
/// Prose around the fence is dropped. The opening fence may carry a language
/// tag (`sql`, `SQL`, `json`, ...) on its own line, or a `sql` tag followed
/// by code on the same line. A fence nested inside the block stays in the
/// body. An unterminated fence runs to the end of the text. Text without a fence is returned trimmed and otherwise untouched.
pub fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find(FENCE) else {
        return text.trim();
    };

    let after_open = &text[open + FENCE.len()..];
    let inner = match closing_fence(after_open) {
        Some(close) => &after_open[..close],
        None => after_open,
    };

    skip_language_tag(inner).trim()
}

/// Finds the fence closing a block: the first one opening a line, else the last one.
///
/// Fences in the middle of a line (say, inside a JSON string) don't close the block.
fn closing_fence(body: &str) -> Option<usize> {
    body.match_indices(FENCE)
        .map(|(i, _)| i)
        .find(|&i| body[..i].trim_end_matches([' ', '\t']).ends_with('\n'))
        .or_else(|| body.rfind(FENCE))
}

/// Cleans a completion down to the candidate SQL statement.
pub fn sanitize_sql(text: &str) -> String {
    strip_code_fence(text).to_string()
}

fn skip_language_tag(inner: &str) -> &str {
    if let Some((first_line, rest)) = inner.split_once('\n') {
        if first_line.trim().chars().all(|c| c.is_ascii_alphanumeric()) {
            return rest;
        }
    }

    // Same-line tag such as "```sql SELECT 1```".
    match inner.get(..3) {
        Some(tag)
            if tag.eq_ignore_ascii_case("sql")
                && inner[3..].chars().next().map_or(true, char::is_whitespace) =>
        {
            &inner[3..]
        }
        _ => inner,
    }
}
