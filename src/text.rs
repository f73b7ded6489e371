//! Text preparation: cleaning, chunking, and truncation.
//!
//! Cleaning is deterministic and idempotent. Chunking produces
//! forward-only overlapping windows with contiguous indices starting
//! at zero; the window that reaches the end of the text is the last
//! one. All operations count characters, never bytes, so multi-byte
//! text is handled safely.

use crate::error::{AssistantError, Result};

/// One window of chunked text with its ordinal position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// The window's text.
    pub text: String,
    /// Position of this window in the source text, starting at 0.
    pub index: usize,
}

/// Normalize whitespace and strip non-printing characters.
///
/// Line endings become `\n`, runs of spaces and tabs collapse to a
/// single space, trailing whitespace is removed per line, runs of blank
/// lines collapse to one, and other control characters are dropped.
/// Idempotent: `clean_text(clean_text(x)) == clean_text(x)`.
pub fn clean_text(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(normalized.len());
    let mut blank_run = 0usize;

    for line in normalized.lines() {
        let mut cleaned = String::with_capacity(line.len());
        let mut pending_space = false;

        for ch in line.chars() {
            if ch.is_whitespace() {
                pending_space = !cleaned.is_empty();
            } else if ch.is_control() {
                continue;
            } else {
                if pending_space {
                    cleaned.push(' ');
                    pending_space = false;
                }
                cleaned.push(ch);
            }
        }

        if cleaned.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }

        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(&cleaned);
    }

    out.trim_matches('\n').to_string()
}

/// Split text into consecutive overlapping windows of at most
/// `window_size` characters.
///
/// Consecutive windows overlap by exactly `overlap` characters; the
/// final window may be shorter than `window_size`. Concatenating the
/// windows with the overlap removed reconstructs the input.
///
/// # Errors
///
/// Returns [`AssistantError::InvalidInput`] if `window_size == 0` or
/// `overlap >= window_size`.
pub fn chunk_text(text: &str, window_size: usize, overlap: usize) -> Result<Vec<TextChunk>> {
    if window_size == 0 {
        return Err(AssistantError::InvalidInput(
            "chunk window size must be greater than zero".to_string(),
        ));
    }
    if overlap >= window_size {
        return Err(AssistantError::InvalidInput(format!(
            "chunk overlap ({overlap}) must be less than window size ({window_size})"
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Ok(Vec::new());
    }

    let step = window_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut index = 0;

    loop {
        let end = (start + window_size).min(chars.len());
        chunks.push(TextChunk { text: chars[start..end].iter().collect(), index });
        if end == chars.len() {
            break;
        }
        start += step;
        index += 1;
    }

    Ok(chunks)
}

/// Return at most the first `max_chars` characters of `text`.
///
/// Used for display and prompt-size bounding only, never for chunk
/// boundaries.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_text_is_idempotent() {
        let raw = "  Hotel   Menu \r\n\r\n\r\n  Injera \t with  wot \u{0007} \n\nPrices below\n";
        let once = clean_text(raw);
        assert_eq!(clean_text(&once), once);
    }

    #[test]
    fn clean_text_normalizes_whitespace() {
        let raw = "a   b\t\tc\r\nd\n\n\n\ne";
        assert_eq!(clean_text(raw), "a b c\nd\n\ne");
    }

    #[test]
    fn clean_text_strips_control_characters() {
        assert_eq!(clean_text("he\u{0000}llo\u{0008} world"), "hello world");
    }

    #[test]
    fn chunk_indices_are_contiguous_from_zero() {
        let text = "x".repeat(3500);
        let chunks = chunk_text(&text, 1000, 200).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn chunks_overlap_by_exactly_overlap_chars() {
        let text: String = ('a'..='z').cycle().take(2600).collect();
        let chunks = chunk_text(&text, 1000, 200).unwrap();
        for pair in chunks.windows(2) {
            let tail: String = pair[0].text.chars().skip(800).collect();
            let head: String = pair[1].text.chars().take(200).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn chunking_2500_chars_yields_three_chunks() {
        let text = "m".repeat(2500);
        let chunks = chunk_text(&text, 1000, 200).unwrap();
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text.chars().count(), 1000);
        assert_eq!(chunks[1].text.chars().count(), 1000);
        assert_eq!(chunks[2].text.chars().count(), 900);
    }

    #[test]
    fn chunks_reconstruct_the_source_text() {
        let text: String = ('a'..='z').cycle().take(2731).collect();
        let chunks = chunk_text(&text, 1000, 200).unwrap();
        let mut rebuilt = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.text.chars().skip(200));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn text_shorter_than_window_is_a_single_chunk() {
        let chunks = chunk_text("short", 1000, 200).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 1000, 200).unwrap().is_empty());
    }

    #[test]
    fn rejects_overlap_not_less_than_window() {
        assert!(chunk_text("abc", 10, 10).is_err());
        assert!(chunk_text("abc", 0, 0).is_err());
    }

    #[test]
    fn chunking_is_char_boundary_safe() {
        let text = "ም".repeat(1500);
        let chunks = chunk_text(&text, 1000, 200).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text.chars().count(), 1000);
    }

    #[test]
    fn truncate_respects_char_count() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 5), "hello");
        assert_eq!(truncate_text("ምግብ ቤት", 4), "ምግብ ");
    }
}
