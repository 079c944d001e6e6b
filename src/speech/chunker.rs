//! Splits utterance text into chunks the synthesizer can render one at a
//! time, keeping absolute character offsets so progress events can point
//! back into the source text.

/// A single word inside a chunk, with its offset into the full text
/// (counted in Unicode scalar values, matching the text area contents).
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub char_index: usize,
    pub text: String,
}

/// A clause- or sentence-sized piece of the utterance text
#[derive(Debug, Clone)]
pub struct SpeechChunk {
    pub char_index: usize,
    pub text: String,
    pub words: Vec<Word>,
}

impl SpeechChunk {
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Upper bound on chunk size. Clause breaks are preferred; a run of text
/// with no punctuation is split at the last word boundary before the cap.
const MAX_CHUNK_CHARS: usize = 240;

const CLAUSE_TERMINATORS: [char; 5] = ['.', '!', '?', ';', ':'];

/// Split text into speech chunks with word offsets.
///
/// Whitespace-only input yields no chunks.
pub fn chunk_text(text: &str) -> Vec<SpeechChunk> {
    let chars: Vec<char> = text.chars().collect();

    // Clause boundaries: a terminator followed by whitespace or end of
    // text, or a bare newline.
    let mut pieces: Vec<(usize, usize)> = Vec::new();
    let mut start = 0usize;
    for (i, &ch) in chars.iter().enumerate() {
        let at_boundary = ch == '\n'
            || (CLAUSE_TERMINATORS.contains(&ch)
                && chars.get(i + 1).map_or(true, |next| next.is_whitespace()));
        if at_boundary {
            pieces.push((start, i + 1 - start));
            start = i + 1;
        }
    }
    if start < chars.len() {
        pieces.push((start, chars.len() - start));
    }

    let mut chunks = Vec::new();
    for (piece_start, piece_len) in pieces {
        for (sub_start, sub_len) in split_to_cap(&chars, piece_start, piece_len) {
            push_chunk(&mut chunks, &chars, sub_start, sub_len);
        }
    }
    chunks
}

/// Break an overlong piece at word boundaries below the chunk cap. A
/// single token longer than the cap is hard-cut.
fn split_to_cap(chars: &[char], start: usize, len: usize) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut start = start;
    let mut len = len;

    while len > MAX_CHUNK_CHARS {
        let window = &chars[start..start + MAX_CHUNK_CHARS];
        let cut = window
            .iter()
            .rposition(|c| c.is_whitespace())
            .map(|ws| ws + 1)
            .unwrap_or(MAX_CHUNK_CHARS);
        out.push((start, cut));
        start += cut;
        len -= cut;
    }

    if len > 0 {
        out.push((start, len));
    }
    out
}

fn push_chunk(chunks: &mut Vec<SpeechChunk>, chars: &[char], start: usize, len: usize) {
    // Trim surrounding whitespace, keeping offsets anchored to the source.
    let mut start = start;
    let mut end = start + len;
    while start < end && chars[start].is_whitespace() {
        start += 1;
    }
    while end > start && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    if start == end {
        return;
    }

    let chunk_text: String = chars[start..end].iter().collect();
    let words = split_words(&chunk_text, start);
    chunks.push(SpeechChunk {
        char_index: start,
        text: chunk_text,
        words,
    });
}

fn split_words(chunk_text: &str, chunk_offset: usize) -> Vec<Word> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut word_start = 0usize;

    for (i, ch) in chunk_text.chars().enumerate() {
        if ch.is_whitespace() {
            if !current.is_empty() {
                words.push(Word {
                    char_index: chunk_offset + word_start,
                    text: std::mem::take(&mut current),
                });
            }
        } else {
            if current.is_empty() {
                word_start = i;
            }
            current.push(ch);
        }
    }

    if !current.is_empty() {
        words.push(Word {
            char_index: chunk_offset + word_start,
            text: current,
        });
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("").is_empty());
        assert!(chunk_text("   \n\t  ").is_empty());
    }

    #[test]
    fn single_sentence_is_one_chunk() {
        let chunks = chunk_text("Hello world.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].char_index, 0);
        assert_eq!(chunks[0].text, "Hello world.");
    }

    #[test]
    fn sentences_split_at_terminators() {
        let chunks = chunk_text("First sentence. Second one! Third?");
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text, "First sentence.");
        assert_eq!(chunks[1].text, "Second one!");
        assert_eq!(chunks[2].text, "Third?");
    }

    #[test]
    fn abbreviation_without_space_does_not_split() {
        let chunks = chunk_text("Version 1.2 is out.");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn chunk_offsets_index_into_source() {
        let text = "One two. Three four.";
        let chunks = chunk_text(text);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            let from_source: String = text
                .chars()
                .skip(chunk.char_index)
                .take(chunk.char_len())
                .collect();
            assert_eq!(from_source, chunk.text);
        }
    }

    #[test]
    fn word_offsets_index_into_source() {
        let text = "The quick brown fox. Jumps over.";
        let chunks = chunk_text(text);
        let words: Vec<&Word> = chunks.iter().flat_map(|c| c.words.iter()).collect();
        assert_eq!(
            words.iter().map(|w| w.text.as_str()).collect::<Vec<_>>(),
            vec!["The", "quick", "brown", "fox.", "Jumps", "over."]
        );
        for word in words {
            let from_source: String = text
                .chars()
                .skip(word.char_index)
                .take(word.text.chars().count())
                .collect();
            assert_eq!(from_source, word.text);
        }
    }

    #[test]
    fn long_unpunctuated_text_splits_at_word_boundary() {
        let text = "word ".repeat(200);
        let chunks = chunk_text(&text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.char_len() <= MAX_CHUNK_CHARS);
            assert!(!chunk.words.is_empty());
        }
    }

    #[test]
    fn overlong_token_is_hard_cut() {
        let text = "x".repeat(MAX_CHUNK_CHARS * 2 + 10);
        let chunks = chunk_text(&text);
        assert_eq!(chunks.len(), 3);
    }

    #[test]
    fn non_ascii_offsets_are_char_based() {
        let text = "héllo wörld. déjà vu.";
        let chunks = chunk_text(text);
        assert_eq!(chunks.len(), 2);
        let second = &chunks[1];
        let from_source: String = text
            .chars()
            .skip(second.char_index)
            .take(second.char_len())
            .collect();
        assert_eq!(from_source, second.text);
    }

    #[test]
    fn newlines_break_chunks() {
        let chunks = chunk_text("line one\nline two");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "line one");
        assert_eq!(chunks[1].text, "line two");
    }
}
