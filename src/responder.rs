//! Single-turn answer-or-escalate flow.
//!
//! Ties triage, embedding and the retriever's confidence gate together and
//! maps the result onto an FAQ answer. Used by the `faq-bot ask` command.

use crate::dataset::FaqItem;
use crate::embed::Embedder;
use crate::error::Result;
use crate::retriever::Retriever;
use crate::triage::{GenericRule, generic_rule};
use std::collections::HashMap;
use std::fmt;

/// What to tell the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The message had no text.
    Empty,
    /// Vague request; ask for details and hand over to an operator.
    Generic { rule: GenericRule },
    /// Confident match with a known answer.
    Answer {
        faq_id: String,
        answer: String,
        score: f32,
    },
    /// Low confidence or unknown FAQ id; hand over to an operator.
    Escalate {
        score: f32,
        /// Best-scoring FAQ id, kept for operator context.
        nearest: Option<String>,
    },
}

impl Reply {
    /// Whether a human needs to take over.
    pub fn needs_operator(&self) -> bool {
        matches!(self, Reply::Generic { .. } | Reply::Escalate { .. })
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Empty => write!(f, "Please send your question as text."),
            Reply::Generic { rule } => write!(
                f,
                "This looks like a general request without details ({}).\n\
                 Forwarding you to an operator.\n\n\
                 Please describe:\n\
                 - what exactly is not working;\n\
                 - in which section;\n\
                 - what you were trying to do.",
                rule.describe()
            ),
            Reply::Answer {
                faq_id,
                answer,
                score,
            } => write!(f, "{}\n\n(id: {}, score: {:.3})", answer, faq_id, score),
            Reply::Escalate { score, .. } => write!(
                f,
                "Not sure about this one, forwarding you to an operator.\n\
                 Leave your contacts or rephrase the question.\n\n\
                 (score: {:.3})",
                score
            ),
        }
    }
}

/// Answers free-text questions from an FAQ knowledge base.
pub struct Responder<E: Embedder> {
    embedder: E,
    retriever: Retriever,
    answers: HashMap<String, String>,
}

impl<E: Embedder> Responder<E> {
    pub fn new(embedder: E, retriever: Retriever, faq: &[FaqItem]) -> Self {
        Self {
            embedder,
            retriever,
            answers: crate::dataset::answer_map(faq),
        }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Produce a reply for one message.
    pub fn respond(&self, message: &str) -> Result<Reply> {
        let query = message.trim();
        if query.is_empty() {
            return Ok(Reply::Empty);
        }

        if let Some(rule) = generic_rule(query) {
            return Ok(Reply::Generic { rule });
        }

        let vector = self.embedder.embed(query)?;
        let outcome = self.retriever.predict(&vector)?;
        let score = outcome.score;

        if outcome.is_abstention() {
            let nearest = self.retriever.query(&vector)?.into_iter().next();
            return Ok(Reply::Escalate {
                score,
                nearest: nearest.map(|hit| hit.label),
            });
        }

        // confident outcomes always carry a label
        let faq_id = outcome.label.unwrap_or_default();
        Ok(match self.answers.get(&faq_id) {
            Some(answer) => Reply::Answer {
                faq_id,
                answer: answer.clone(),
                score,
            },
            None => Reply::Escalate {
                score,
                nearest: Some(faq_id),
            },
        })
    }
}
