//! Email-intent classifier.
//!
//! A cheap lexical heuristic, not NLP: a message is "email-like" if it
//! contains one of a fixed set of phrases or anything shaped like an email
//! address. Known misfires are intentional and covered by tests:
//! - any address triggers it, even in unrelated context
//!   ("my handle is dev@home.io, no email needed");
//! - phrasing outside the keyword set is missed ("let Sam know by mail").

use std::sync::LazyLock;

use regex::Regex;

/// `local@domain.tld` with a TLD of two or more letters.
static EMAIL_ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("Invalid email regex")
});

/// Phrases matched as lower-case substrings.
const DEFAULT_KEYWORDS: &[&str] = &[
    "send email",
    "send an email",
    "send mail",
    "email to",
    "mail to",
    "notify",
    "compose email",
    "compose an email",
    "draft email",
    "draft an email",
    "write an email",
];

/// Why a message was classified as email-like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentSignal {
    Keyword(String),
    Address(String),
}

/// Decides whether a message asks for an email to be sent.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    keywords: Vec<String>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self::with_keywords(DEFAULT_KEYWORDS.iter().copied())
    }

    /// Classifier with a custom phrase set (matched case-insensitively).
    pub fn with_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// `true` if `text` looks like an email-sending request.
    pub fn classify(&self, text: &str) -> bool {
        self.signal(text).is_some()
    }

    /// The first matching signal; keywords are checked before addresses.
    pub fn signal(&self, text: &str) -> Option<IntentSignal> {
        let lowered = text.to_lowercase();
        if let Some(keyword) = self.keywords.iter().find(|k| lowered.contains(k.as_str())) {
            return Some(IntentSignal::Keyword(keyword.clone()));
        }
        EMAIL_ADDRESS_RE
            .find(text)
            .map(|m| IntentSignal::Address(m.as_str().to_string()))
    }
}
