//! Extractive answer generation.
//!
//! Builds a reply from stored chunks without any model: keywords from the
//! question select the best-matching sentences, which are returned as a
//! numbered list.
//!
//! Scoring is one point per keyword a sentence contains (case-insensitive
//! substring test). Frequency does not count, and neither does position.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::markup::collapse_whitespace;

/// Sentences kept per chunk.
const SENTENCES_PER_CHUNK: usize = 3;
/// Sentences kept in the final answer.
const MAX_ANSWER_SENTENCES: usize = 5;
/// Sentence length bounds in characters, both exclusive.
const MIN_SENTENCE_CHARS: usize = 20;
const MAX_SENTENCE_CHARS: usize = 200;

static RE_CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static RE_INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`[^`]*`").unwrap());
static RE_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#{1,6}\s+").unwrap());
static RE_EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*|\*|__|\|_").unwrap());
static RE_BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s*[-*+]\s+").unwrap());
static RE_URL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());
static RE_SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

/// Question words and filler that never make useful keywords. Only words
/// longer than three characters are listed; shorter ones are dropped anyway.
const STOP_WORDS: &[&str] = &[
    "what", "when", "where", "which", "tell", "about", "does", "were", "will", "would", "could",
    "should", "might", "must", "have", "having", "been", "being", "that", "this", "these", "those",
    "there", "their", "they", "them", "then", "than", "from", "with", "without", "within", "into",
    "onto", "upon", "above", "below", "between", "among", "through", "throughout", "during",
    "before", "after", "since", "until", "while", "because", "although", "though", "even", "still",
    "however", "nevertheless", "nonetheless", "therefore", "thus", "hence", "consequently",
    "accordingly", "instead", "rather", "also", "moreover", "furthermore", "additionally",
    "besides", "likewise", "similarly", "indeed", "certainly", "surely", "actually", "really",
    "truly", "basically", "essentially", "simply", "just", "only", "merely", "exactly",
    "precisely", "specifically", "particularly", "especially", "notably", "primarily", "mainly",
    "mostly", "largely", "generally", "usually", "typically", "often", "frequently",
    "occasionally", "sometimes", "rarely", "seldom", "never", "always", "ever", "almost", "nearly",
    "approximately", "around", "roughly", "quite", "somewhat", "fairly", "pretty", "very",
    "extremely", "incredibly", "amazingly", "surprisingly", "remarkably", "exceptionally",
    "extraordinarily", "tremendously", "enormously", "hugely", "vastly", "immensely", "intensely",
    "profoundly", "deeply", "thoroughly", "completely", "entirely", "totally", "wholly", "fully",
    "absolutely", "perfectly", "utterly", "altogether", "overall", "broadly", "widely",
    "extensively", "comprehensively", "universally", "globally", "internationally", "nationally",
    "locally", "regionally", "personally", "individually", "collectively", "jointly", "mutually",
    "reciprocally", "respectively", "separately", "independently", "dependently", "relatively",
    "comparatively", "proportionally", "subsequently", "eventually", "ultimately", "finally",
    "lastly", "firstly", "secondly", "thirdly", "next", "afterwards", "later", "earlier",
    "previously", "formerly", "initially", "originally", "recently", "lately", "currently",
    "presently", "immediately", "instantly", "suddenly", "abruptly", "gradually", "progressively",
    "incrementally", "steadily", "consistently", "constantly", "continually", "continuously",
    "persistently", "repeatedly", "regularly", "routinely", "habitually", "customarily",
    "traditionally", "conventionally", "commonly", "normally", "ordinarily", "naturally",
    "obviously", "evidently", "apparently", "seemingly", "ostensibly", "supposedly", "allegedly",
    "reputedly", "reportedly", "presumably", "likely", "probably", "possibly", "perhaps", "maybe",
    "conceivably", "imaginably", "feasibly", "plausibly", "credibly", "believably", "undoubtedly",
    "unquestionably", "indisputably", "indubitably", "undeniably", "irrefutably",
    "incontrovertibly", "incontestably", "unequivocally", "definitely", "assuredly", "decidedly",
    "positively", "significantly", "substantially", "considerably", "appreciably", "markedly",
    "noticeably", "detectably", "perceptibly", "visibly", "clearly", "plainly", "manifestly",
    "patently", "openly", "explicitly", "expressly", "directly", "straightforwardly",
    "unambiguously", "unmistakably", "categorically", "definitively", "conclusively", "decisively",
    "ergo", "such", "whom", "whose", "whatever", "whichever", "whoever", "whomever", "whenever",
    "wherever", "whatsoever", "howsoever", "whyever", "wheresoever", "whensoever", "whosoever",
    "whomsoever", "whichsoever", "whysoever",
];

/// Keyword groups used when the question has no usable words at all.
const DEFAULT_KEYWORD_GROUPS: &[(&str, &[&str])] = &[
    ("roadmap", &["roadmap", "immigration", "process", "steps"]),
    ("cost", &["cost", "price", "fee", "subscription"]),
    ("visafy", &["visafy", "platform", "service"]),
];
const GENERIC_KEYWORDS: &[&str] = &["immigration", "visa", "process"];

/// Answer `query` from `chunks` by quoting their most relevant sentences.
pub fn generate_simple_response(query: &str, chunks: &[String]) -> String {
    let keywords = extract_keywords(query);
    tracing::debug!(?keywords, "responder keywords");

    let mut seen = HashSet::new();
    let sentences: Vec<String> = chunks
        .iter()
        .flat_map(|chunk| relevant_sentences(&clean_text(chunk), &keywords))
        .filter(|s| seen.insert(s.clone()))
        .take(MAX_ANSWER_SENTENCES)
        .collect();

    if sentences.is_empty() {
        return no_information_message(query);
    }

    let mut response = format!("Here's what I know about \"{}\":\n\n", query);
    for (i, sentence) in sentences.iter().enumerate() {
        response.push_str(&format!("{}. {}.\n\n", i + 1, sentence));
    }
    response
}

/// The reply used when no sentence matches.
pub fn no_information_message(query: &str) -> String {
    format!(
        "I don't have specific information about \"{}\" in my knowledge base. \
         Please try asking a different question about Visafy or immigration programs.",
        query
    )
}

/// Keywords for scoring: lowercase tokens longer than three characters that
/// are not stop words, with fallbacks so the result is never empty.
pub fn extract_keywords(query: &str) -> Vec<String> {
    let lower = query.to_lowercase();
    let long_tokens: Vec<&str> = lower
        .split_whitespace()
        .filter(|w| w.chars().count() > 3)
        .collect();

    let keywords: Vec<String> = long_tokens
        .iter()
        .filter(|w| !STOP_WORDS.contains(*w))
        .map(|w| w.to_string())
        .collect();
    if !keywords.is_empty() {
        return keywords;
    }

    if !long_tokens.is_empty() {
        return long_tokens.iter().map(|w| w.to_string()).collect();
    }

    let group = DEFAULT_KEYWORD_GROUPS
        .iter()
        .find(|(trigger, _)| lower.contains(trigger))
        .map(|(_, words)| *words)
        .unwrap_or(GENERIC_KEYWORDS);
    group.iter().map(|w| w.to_string()).collect()
}

/// Strip markdown, code, and URLs, then collapse whitespace.
pub fn clean_text(text: &str) -> String {
    let text = RE_CODE_BLOCK.replace_all(text, "");
    let text = RE_INLINE_CODE.replace_all(&text, "");
    let text = RE_HEADER.replace_all(&text, "");
    let text = RE_EMPHASIS.replace_all(&text, "");
    let text = RE_BULLET.replace_all(&text, "");
    let text = RE_URL.replace_all(&text, "");
    collapse_whitespace(&text)
}

/// Up to three sentences of `text` that contain at least one keyword, best
/// first. Ties keep their order in the text.
fn relevant_sentences(text: &str, keywords: &[String]) -> Vec<String> {
    let mut scored: Vec<(usize, &str)> = RE_SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| {
            let len = s.chars().count();
            len > MIN_SENTENCE_CHARS && len < MAX_SENTENCE_CHARS
        })
        .map(|s| (score_sentence(s, keywords), s))
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .take(SENTENCES_PER_CHUNK)
        .map(|(_, s)| s.to_string())
        .collect()
}

fn score_sentence(sentence: &str, keywords: &[String]) -> usize {
    let lower = sentence.to_lowercase();
    keywords
        .iter()
        .filter(|k| lower.contains(&k.to_lowercase()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_includes_matching_sentence() {
        let chunks = vec!["Visafy offers immigration roadmaps for applicants.".to_string()];
        let answer = generate_simple_response("What roadmap does Visafy offer?", &chunks);
        assert!(answer.starts_with("Here's what I know about \"What roadmap does Visafy offer?\""));
        assert!(answer.contains("1. Visafy offers immigration roadmaps for applicants."));
    }

    #[test]
    fn test_keywords_drop_stop_words_and_short_tokens() {
        assert_eq!(
            extract_keywords("What roadmap does Visafy offer?"),
            vec!["roadmap", "visafy", "offer?"]
        );
    }

    #[test]
    fn test_keywords_drop_adverbs() {
        assert_eq!(extract_keywords("visa processing locally"), vec!["visa", "processing"]);
        assert_eq!(
            extract_keywords("deeply thorough internationally reviewed"),
            vec!["thorough", "reviewed"]
        );
    }

    #[test]
    fn test_stop_word_only_match_is_no_information() {
        let chunks = vec!["Food is sourced locally by many restaurants in town.".to_string()];
        let answer = generate_simple_response("visa processing locally", &chunks);
        assert_eq!(answer, no_information_message("visa processing locally"));
        assert!(answer.ends_with("about Visafy or immigration programs."));
    }

    #[test]
    fn test_keywords_fall_back_to_long_tokens() {
        assert_eq!(extract_keywords("what about that"), vec!["what", "about", "that"]);
    }

    #[test]
    fn test_keywords_generic_default() {
        assert_eq!(extract_keywords("is it ok"), vec!["immigration", "visa", "process"]);
        assert_eq!(extract_keywords(""), vec!["immigration", "visa", "process"]);
    }

    #[test]
    fn test_clean_text_strips_markdown() {
        let text = "## Title\n- **Bold** item with `code` and https://x.io/y link\n```\nfn main() {}\n```\nEnd";
        assert_eq!(clean_text(text), "Title Bold item with and link End");
    }

    #[test]
    fn test_clean_text_drops_pipe_underscore() {
        assert_eq!(clean_text("| col|_a | b |"), "| cola | b |");
    }

    #[test]
    fn test_sentence_length_bounds() {
        let keywords = vec!["visa".to_string()];
        let text = format!("Visa short. {}. A visa sentence of decent length.", "visa ".repeat(50));
        let sentences = relevant_sentences(&text, &keywords);
        assert_eq!(sentences, vec!["A visa sentence of decent length"]);
    }

    #[test]
    fn test_ranking_and_per_chunk_cap() {
        let keywords = vec!["alpha".to_string(), "beta".to_string()];
        let text = "Only alpha appears in this one. Both alpha and beta are here. \
                    Another alpha only sentence. Yet another alpha sentence here.";
        let sentences = relevant_sentences(text, &keywords);
        assert_eq!(
            sentences,
            vec![
                "Both alpha and beta are here",
                "Only alpha appears in this one",
                "Another alpha only sentence",
            ]
        );
    }

    #[test]
    fn test_duplicates_removed_and_capped_at_five() {
        let sentence = "The visa process takes several weeks";
        let chunks: Vec<String> = (0..4)
            .map(|i| format!("{}. Visa step number {} is paperwork review.", sentence, i))
            .collect();
        let answer = generate_simple_response("visa", &chunks);
        assert_eq!(answer.matches(sentence).count(), 1);
        assert!(answer.contains("5. "));
        assert!(!answer.contains("6. "));
    }

    #[test]
    fn test_no_information() {
        let chunks = vec!["Nothing relevant lives in this chunk at all.".to_string()];
        let answer = generate_simple_response("kubernetes scheduling", &chunks);
        assert_eq!(answer, no_information_message("kubernetes scheduling"));
        assert!(answer.contains("\"kubernetes scheduling\""));
    }
}
