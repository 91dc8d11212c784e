//! Smart text compressor, applied to thought text before it is
//! woven into a rendered prompt or progress overview.
//!
//! Word-boundary truncation is the one place in this codebase that gives
//! `unicode-segmentation` real work.

use unicode_segmentation::UnicodeSegmentation;

/// Byte offsets, relative to `text`, right after every `. `/`? `/`! `
/// sentence boundary.
fn sentence_boundaries(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut boundaries = Vec::new();
    for (i, ch) in text.char_indices() {
        if matches!(ch, '.' | '?' | '!') {
            let after = i + ch.len_utf8();
            if bytes.get(after).map(|b| b.is_ascii_whitespace()).unwrap_or(false) {
                boundaries.push(after);
            }
        }
    }
    boundaries
}

/// Truncate `text` to at most `max_len` bytes, backing off to the nearest
/// preceding Unicode word boundary so multi-byte characters and words are
/// never split mid-sequence.
fn truncate_at_word_boundary(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }
    let mut boundary = 0;
    for (idx, word) in text.split_word_bound_indices() {
        if idx + word.len() > max_len {
            break;
        }
        boundary = idx + word.len();
    }
    text[..boundary].trim_end().to_string()
}

/// verbatim under the cap; else sentence-boundary summary; else
/// a single word-boundary truncation with a trailing ellipsis.
pub fn compress(text: &str, max_thought_display_length: usize) -> String {
    if text.len() <= max_thought_display_length {
        return text.to_string();
    }

    let boundaries = sentence_boundaries(text);
    if let Some(&first_end) = boundaries.first() {
        // With a single boundary, the "last sentence" is just the tail that
        // follows it; with more, it's the tail after the final boundary.
        let last_sentence_start = if boundaries.len() > 1 {
            *boundaries.last().unwrap()
        } else {
            first_end
        };
        if last_sentence_start < text.len() {
            let budget = max_thought_display_length.saturating_sub(" [...] ".len());
            let first_budget = budget / 2;
            let last_budget = budget - first_budget;

            let first_sentence = truncate_at_word_boundary(&text[..first_end], first_budget.max(1));
            let last_sentence =
                truncate_at_word_boundary(text[last_sentence_start..].trim_start(), last_budget.max(1));
            return format!("{first_sentence} [...] {last_sentence}");
        }
    }

    format!("{}...", truncate_at_word_boundary(text, max_thought_display_length.saturating_sub(3)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_under_the_cap_is_returned_verbatim() {
        assert_eq!(compress("short text", 150), "short text");
    }

    #[test]
    fn long_text_with_sentences_keeps_first_and_last() {
        let text = "First sentence here. ".to_string()
            + &"middle filler word ".repeat(30)
            + "Last sentence concludes it.";
        let out = compress(&text, 80);
        assert!(out.contains("[...]"));
        assert!(out.starts_with("First sentence"));
        assert!(out.contains("Last sentence") || out.contains("concludes"));
    }

    #[test]
    fn long_text_without_sentence_boundary_gets_ellipsis() {
        let text = "word ".repeat(100);
        let out = compress(&text, 40);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 43);
    }

    #[test]
    fn truncation_never_splits_a_multibyte_character() {
        let text = "café ".repeat(50);
        let out = compress(&text, 20);
        assert!(out.is_char_boundary(out.len()));
    }
}
