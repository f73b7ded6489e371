//! Answer generation with a deterministic synthesis fallback.
//!
//! The [`GenerationProvider`] trait is the seam to the external
//! generative model. The [`AnswerGenerator`] assembles a bounded
//! context from retrieved documents, issues one generation request,
//! and — when the provider fails, times out, or is rate limited —
//! synthesizes a best-effort answer directly from the retrieved text.
//! It never returns an error.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::AssistantConfig;
use crate::document::{Answer, RetrievedDocument, SourceRef};
use crate::error::ProviderError;
use crate::text::truncate_text;

/// The fixed persona instruction sent with every generation request.
pub const SYSTEM_INSTRUCTION: &str = "\
You are Smart Hotel & Food Assistant for Adama city.

IMPORTANT RULES:
- You are NOT ChatGPT.
- You are NOT OpenAI.
- You are NOT Google AI.
- You are Smart Hotel & Food Assistant.

Your job:
- Help users find hotels in Adama
- Help users find restaurants and food services
- Suggest services based only on Adama city
- Keep answers short (maximum 5 lines)
- Be friendly, professional, and helpful

If the user asks:
\"Who are you?\"
You must answer exactly:
\"I am Smart Hotel & Food Assistant. I help you find the best hotels, restaurants, and services in Adama.\"

If user asks something unrelated:
Politely say:
\"I am here to help you with hotels and food services in Adama.\"

DO NOT:
- Return JSON
- Return database raw text
- Say you are an AI model
- Say you are trained by OpenAI
- Give very long paragraphs
- Make up information outside Adama

Always respond like a real hotel concierge assistant.";

/// Fixed answer for identity questions when the model is unavailable.
const PERSONA_ANSWER: &str = "I am Smart Hotel & Food Assistant for Adama city. I help you \
    find the best hotels, restaurants, and services in Adama. How can I assist you today?";

/// Fixed fallback when the provider is rate limited and no context exists.
const QUOTA_FALLBACK: &str = "I'm currently experiencing high demand. Please try asking \
    about specific hotels, restaurants, or services in Adama, and I'll search our database \
    for you.";

/// Fixed fallback for any other provider failure with no context.
const GENERIC_FALLBACK: &str = "I'm having trouble processing your request right now. \
    Please try asking about hotels, restaurants, or services in Adama!";

/// A single generation request: persona, retrieved context, question.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// The fixed persona instruction.
    pub system_instruction: String,
    /// The assembled context block; empty when nothing was retrieved.
    pub contextual_prompt: String,
    /// The user's question.
    pub question: String,
}

/// A provider that generates text from a [`GenerationRequest`].
///
/// Implementations must report rate limiting distinctly (see
/// [`ProviderError::QuotaExceeded`]); everything else surfaces as
/// [`ProviderError::Unavailable`].
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate an answer for the request.
    async fn generate(&self, request: &GenerationRequest)
    -> std::result::Result<String, ProviderError>;
}

/// Generates grounded answers, degrading to synthesis when the model
/// is unavailable.
#[derive(Clone)]
pub struct AnswerGenerator {
    provider: Arc<dyn GenerationProvider>,
    config: AssistantConfig,
}

impl AnswerGenerator {
    /// Create a generator over the given provider.
    pub fn new(provider: Arc<dyn GenerationProvider>, config: AssistantConfig) -> Self {
        Self { provider, config }
    }

    /// Generate an answer for `question` grounded in `context`.
    ///
    /// Always returns a usable [`Answer`]. On the normal path the
    /// returned `sources` are empty and the caller attaches its own
    /// source list; the synthesis path fills `sources` from the
    /// context documents it drew on.
    pub async fn generate(&self, question: &str, context: &[RetrievedDocument]) -> Answer {
        let request = GenerationRequest {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            contextual_prompt: self.build_context(context),
            question: question.to_string(),
        };

        let outcome =
            tokio::time::timeout(self.config.provider_timeout, self.provider.generate(&request))
                .await;

        match outcome {
            Ok(Ok(text)) => {
                info!(answer_chars = text.len(), "answer generated");
                Answer { text, sources: Vec::new() }
            }
            Ok(Err(e)) => {
                warn!(error = %e, quota = e.is_quota(), "generation failed, synthesizing");
                self.synthesize(question, context, e.is_quota())
            }
            Err(_) => {
                warn!("generation timed out, synthesizing");
                self.synthesize(question, context, false)
            }
        }
    }

    /// Assemble the bounded context block: title, relevance, preview.
    fn build_context(&self, context: &[RetrievedDocument]) -> String {
        if context.is_empty() {
            return String::new();
        }

        let mut block =
            String::from("Relevant Information from Adama Restaurant & Food Documents:\n");
        for (i, retrieved) in
            context.iter().take(self.config.max_context_documents).enumerate()
        {
            let relevance = match retrieved.similarity {
                Some(s) => format!(" (Relevance: {:.1}%)", s * 100.0),
                None => String::new(),
            };
            let preview =
                truncate_text(&retrieved.document.content, self.config.context_preview_chars);
            block.push_str(&format!(
                "\n{}. {}{}\n{}\n",
                i + 1,
                retrieved.document.title,
                relevance,
                preview
            ));
        }
        block
    }

    /// Build an answer directly from the retrieved documents.
    ///
    /// With no context the result is one of two fixed fallback strings,
    /// quota-specific or generic.
    fn synthesize(&self, question: &str, context: &[RetrievedDocument], quota: bool) -> Answer {
        if context.is_empty() {
            let text = if quota { QUOTA_FALLBACK } else { GENERIC_FALLBACK };
            return Answer { text: text.to_string(), sources: Vec::new() };
        }

        let lowered = question.to_lowercase();
        let text = if lowered.contains("who are you") || lowered.contains("what are you") {
            PERSONA_ANSWER.to_string()
        } else {
            let snippet: Vec<&str> = context[0]
                .document
                .content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .take(self.config.synthesis_max_lines)
                .collect();
            format!(
                "Based on the information I found:\n\n{}\n\nIs there anything specific you \
                 would like me to clarify regarding this?",
                snippet.join("\n")
            )
        };

        info!(source_count = context.len(), "synthesized answer from retrieved documents");
        Answer { text, sources: context.iter().map(SourceRef::from_retrieved).collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    struct FailingProvider {
        error: fn() -> ProviderError,
    }

    #[async_trait]
    impl GenerationProvider for FailingProvider {
        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> std::result::Result<String, ProviderError> {
            Err((self.error)())
        }
    }

    fn retrieved(title: &str, content: &str, similarity: Option<f32>) -> RetrievedDocument {
        RetrievedDocument { document: Document::new(title, content), similarity }
    }

    fn generator(error: fn() -> ProviderError) -> AnswerGenerator {
        AnswerGenerator::new(Arc::new(FailingProvider { error }), AssistantConfig::default())
    }

    #[tokio::test]
    async fn quota_failure_with_context_synthesizes_from_top_document() {
        let answerer = generator(|| ProviderError::QuotaExceeded("429".to_string()));
        let context = vec![
            retrieved("Dire Hotel", "Dire Hotel offers rooms from 1200 birr.\nFree wifi.", Some(0.9)),
            retrieved("Cafe List", "Tomoca serves coffee.", Some(0.7)),
        ];

        let answer = answerer.generate("Best hotel?", &context).await;
        assert!(answer.text.contains("Dire Hotel offers rooms from 1200 birr."));
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0].title, "Dire Hotel");
        assert_eq!(answer.sources[0].similarity, Some(0.9));
    }

    #[tokio::test]
    async fn identity_question_gets_the_persona_answer() {
        let answerer = generator(|| ProviderError::Unavailable("down".to_string()));
        let context = vec![retrieved("Doc", "irrelevant", None)];

        let answer = answerer.generate("Who are you?", &context).await;
        assert!(answer.text.starts_with("I am Smart Hotel & Food Assistant"));
    }

    #[tokio::test]
    async fn quota_failure_without_context_uses_quota_fallback() {
        let answerer = generator(|| ProviderError::QuotaExceeded("quota".to_string()));
        let answer = answerer.generate("Best hotel?", &[]).await;
        assert_eq!(answer.text, QUOTA_FALLBACK);
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn generic_failure_without_context_uses_generic_fallback() {
        let answerer = generator(|| ProviderError::Unavailable("boom".to_string()));
        let answer = answerer.generate("Best hotel?", &[]).await;
        assert_eq!(answer.text, GENERIC_FALLBACK);
    }

    #[tokio::test]
    async fn synthesis_is_bounded_by_max_lines() {
        let answerer = generator(|| ProviderError::Unavailable("down".to_string()));
        let content: String =
            (0..40).map(|i| format!("line {i}\n")).collect::<Vec<_>>().join("");
        let context = vec![retrieved("Long Doc", &content, Some(0.5))];

        let answer = answerer.generate("menu?", &context).await;
        assert!(answer.text.contains("line 14"));
        assert!(!answer.text.contains("line 15"));
    }

    struct EchoProvider;

    #[async_trait]
    impl GenerationProvider for EchoProvider {
        async fn generate(
            &self,
            request: &GenerationRequest,
        ) -> std::result::Result<String, ProviderError> {
            Ok(format!("ctx:[{}]", request.contextual_prompt))
        }
    }

    #[tokio::test]
    async fn context_block_includes_relevance_and_preview() {
        let answerer = AnswerGenerator::new(Arc::new(EchoProvider), AssistantConfig::default());
        let context = vec![retrieved("Dire Hotel", "Rooms available.", Some(0.87))];

        let answer = answerer.generate("Best hotel?", &context).await;
        assert!(answer.text.contains("1. Dire Hotel (Relevance: 87.0%)"));
        assert!(answer.text.contains("Rooms available."));
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn context_block_is_capped_at_max_context_documents() {
        let answerer = AnswerGenerator::new(Arc::new(EchoProvider), AssistantConfig::default());
        let context: Vec<RetrievedDocument> = (0..5)
            .map(|i| retrieved(&format!("Doc {i}"), "text", Some(0.5)))
            .collect();

        let answer = answerer.generate("q", &context).await;
        assert!(answer.text.contains("3. Doc 2"));
        assert!(!answer.text.contains("4. Doc 3"));
    }
}
