//! Tokenizer shared by every in-process ranking strategy.

/// English stop words dropped during tokenization. Kept sorted for
/// binary search.
const STOP_WORDS: &[&str] = &[
    "an", "and", "are", "as", "at", "be", "been", "being", "but", "by", "can", "could", "did",
    "do", "does", "for", "from", "had", "has", "have", "he", "in", "is", "it", "its", "may",
    "might", "of", "on", "or", "should", "that", "the", "these", "this", "those", "to", "was",
    "were", "will", "with", "would",
];

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Lowercase `text`, split it on non-alphanumeric characters, and drop
/// single-character tokens and stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > 1 && !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_words_sorted() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
    }

    #[test]
    fn test_tokenize_lowercases_and_filters() {
        let tokens = tokenize("Hello, World! This is a Test-123.");
        assert_eq!(tokens, vec!["hello", "world", "test", "123"]);
    }

    #[test]
    fn test_tokenize_splits_identifiers() {
        let tokens = tokenize("browser_navigate. Navigate to a URL");
        assert_eq!(tokens, vec!["browser", "navigate", "navigate", "url"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("a . ! ?").is_empty());
    }
}
