//! Question dispatch.
//!
//! [`QueryRouter::ask`] decides where an answer comes from:
//!
//! ```text
//! question ─▶ site intent? ──yes─▶ resolve site ─▶ trained? ──no─▶ "not trained" reply
//!                 │                                  │ yes
//!                 │ no                               ▼
//!                 ▼                         get_website_content
//!            store.search ──(empty)─▶ "no information" reply
//!                 │                                  │
//!                 └──────────────┬───────────────────┘
//!                                ▼
//!                    generator (if configured) or responder
//! ```

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::generator::{generate_with_fallback, AnswerGenerator, OpenRouterGenerator};
use crate::responder::generate_simple_response;
use crate::site::{sources_overlap, SiteMatcher};
use crate::store::DocumentStore;

/// Reply used when answering failed unexpectedly.
pub const APOLOGY: &str = "I'm sorry, I encountered an error while trying to answer your question. \
Please try again later or ask a different question.";

/// Routes questions to site content or general search.
#[derive(Clone)]
pub struct QueryRouter {
    store: Arc<DocumentStore>,
    sites: SiteMatcher,
    generator: Option<Arc<dyn AnswerGenerator>>,
}

impl QueryRouter {
    pub fn new(store: Arc<DocumentStore>, sites: SiteMatcher) -> Self {
        Self {
            store,
            sites,
            generator: None,
        }
    }

    /// Router with the configured brands, plus the remote generator when
    /// `generator.enabled` is set and a client can be built.
    pub fn from_config(store: Arc<DocumentStore>, config: &Config) -> Self {
        let router = Self::new(store, SiteMatcher::from_config(&config.sites.brands));
        if !config.generator.enabled {
            return router;
        }
        match OpenRouterGenerator::from_config(&config.generator) {
            Ok(generator) => {
                info!(model = generator.name(), "remote generation enabled");
                router.with_generator(Arc::new(generator))
            }
            Err(e) => {
                warn!(error = %e, "remote generation disabled");
                router
            }
        }
    }

    /// Hand retrieved chunks to `generator` instead of the extractive responder.
    pub fn with_generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// Answer `question` from the trained corpus.
    pub async fn ask(&self, question: &str) -> String {
        let trained = self.store.get_websites();
        info!(question = %question, sites = trained.len(), "answering question");

        if self.sites.has_site_intent(question) {
            if let Some(site) = self.sites.extract_site_reference(question) {
                debug!(site = %site, "question refers to a site");

                if !trained.iter().any(|t| sources_overlap(t, &site)) {
                    return not_trained_message(&site, &trained);
                }

                let content = self.store.get_website_content(&site);
                if !content.is_empty() {
                    return self.answer(question, &content).await;
                }
            }
        }

        let results = self.store.search(question);
        debug!(results = results.len(), "search finished");
        if results.is_empty() {
            return no_specific_information_message(question);
        }

        self.answer(question, &results).await
    }

    async fn answer(&self, question: &str, chunks: &[String]) -> String {
        match &self.generator {
            Some(generator) => {
                let context = chunks.join("\n\n");
                generate_with_fallback(generator.as_ref(), question, &context).await
            }
            None => generate_simple_response(question, chunks),
        }
    }
}

/// Reply for a question about a site that is not in the corpus.
pub fn not_trained_message(site: &str, trained: &[String]) -> String {
    let list = if trained.is_empty() {
        "none".to_string()
    } else {
        trained.join(", ")
    };
    format!(
        "I haven't been trained on {site}. I only have information about websites I've been \
         trained on, which currently include: {list}. Please train me on {site} first if you want \
         me to answer questions about it."
    )
}

/// Reply for a general question that matched no chunk.
pub fn no_specific_information_message(question: &str) -> String {
    format!(
        "I don't have specific information about \"{question}\" in my knowledge base.\n\n\
         This might be because:\n\
         1. The content wasn't covered in the websites I've been trained on\n\
         2. The question might be using different terminology than what's in my database\n\n\
         Please try:\n\
         - Rephrasing your question\n\
         - Training me on a website that contains this information\n\
         - Asking about a different topic"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerateError;
    use async_trait::async_trait;

    fn router() -> QueryRouter {
        QueryRouter::new(Arc::new(DocumentStore::new()), SiteMatcher::default())
    }

    struct EchoGenerator;

    #[async_trait]
    impl AnswerGenerator for EchoGenerator {
        fn name(&self) -> &str {
            "echo"
        }
        async fn generate(&self, _: &str, context: &str) -> Result<String, GenerateError> {
            Ok(format!("echo: {}", context))
        }
    }

    #[test]
    fn test_from_config_without_key_has_no_generator() {
        let mut config = Config::default();
        config.generator.enabled = true;
        let r = QueryRouter::from_config(Arc::new(DocumentStore::new()), &config);
        assert!(r.generator.is_none());
    }

    #[tokio::test]
    async fn test_untrained_site_lists_trained_sources() {
        let r = router();
        r.store().add_document("Example Domain is for illustrative examples.", "http://example.org");

        let answer = r.ask("tell me about visafy.com").await;
        assert!(answer.starts_with("I haven't been trained on visafy.com."));
        assert!(answer.contains("which currently include: example.org."));
    }

    #[tokio::test]
    async fn test_brand_question_uses_site_content() {
        let r = router();
        r.store().add_document(
            "Visafy offers immigration roadmaps for applicants.",
            "https://visafy.com/",
        );
        r.store().add_document("Unrelated roadmap text about trains and stations.", "other.org");

        let answer = r.ask("What do you know about Visafy roadmaps?").await;
        assert!(answer.contains("1. Visafy offers immigration roadmaps for applicants."));
        assert!(!answer.contains("trains"));
    }

    #[tokio::test]
    async fn test_general_question_answered_from_search() {
        let r = router();
        r.store().add_document(
            "Visafy offers immigration roadmaps for applicants.",
            "visafy.com",
        );
        let answer = r.ask("What roadmap does Visafy offer?").await;
        assert!(answer.contains("Visafy offers immigration roadmaps for applicants."));
    }

    #[tokio::test]
    async fn test_empty_store_general_question() {
        let r = router();
        let answer = r.ask("how long does processing take").await;
        assert_eq!(answer, no_specific_information_message("how long does processing take"));
        assert!(answer.contains("Rephrasing your question"));
    }

    #[tokio::test]
    async fn test_empty_store_site_question_is_not_trained() {
        let r = router();
        let answer = r.ask("what have you learned from supernova").await;
        assert!(answer.starts_with("I haven't been trained on supernova.to."));
        assert!(answer.contains("currently include: none."));
    }

    #[tokio::test]
    async fn test_generator_receives_joined_chunks() {
        let store = Arc::new(DocumentStore::new());
        store.add_document("Pricing starts at ten dollars.", "a.org");
        store.add_document("Pricing tiers vary by plan.", "a.org");
        let r = QueryRouter::new(store, SiteMatcher::default())
            .with_generator(Arc::new(EchoGenerator));

        let answer = r.ask("pricing").await;
        assert_eq!(
            answer,
            "echo: Pricing starts at ten dollars.\n\nPricing tiers vary by plan."
        );
    }
}
