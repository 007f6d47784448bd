//! FAQ retrieval - answer support questions from a fixed FAQ, or escalate.
//!
//! Question variants are embedded into an immutable [`VectorSpace`]. A
//! [`Retriever`] scores an embedded query against every variant and answers
//! with the best FAQ id only when the similarity clears a confidence
//! threshold; otherwise it abstains so a human can take over.
//!
//! # Quick Start
//!
//! ```no_run
//! use faq_retrieval::{
//!     config::Config,
//!     dataset::load_variants,
//!     embed::{Embedder, load_embedder},
//!     indexer::build_space,
//!     retriever::Retriever,
//! };
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     config.validate()?;
//!
//!     let embedder = load_embedder(&config.model)?;
//!     let rows = load_variants(&config.paths.variants_csv)?;
//!     let space = build_space(&rows, &embedder)?;
//!
//!     let retriever = Retriever::with_config(space, &config.retrieval)?;
//!     let outcome = retriever.predict(&embedder.embed("I forgot my password")?)?;
//!
//!     match outcome.label {
//!         Some(faq_id) => println!("answer {} ({:.3})", faq_id, outcome.score),
//!         None => println!("escalate ({:.3})", outcome.score),
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **VectorSpace**: labeled unit-length reference vectors
//! - **Retriever**: top-K search plus the answer-or-abstain gate
//! - **Splitter** / **evaluate**: stratified split and abstention-aware metrics
//! - **Embedder**: the text-to-vector boundary (hashing or candle BERT)
//! - **Responder**: triage + retrieval + answer lookup for a single message

pub mod config;
pub mod dataset;
pub mod embed;
pub mod error;
pub mod eval;
pub mod indexer;
pub mod persistence;
pub mod responder;
pub mod retriever;
pub mod space;
pub mod triage;

// Re-export commonly used types
pub use config::Config;
pub use dataset::{DatasetRow, FaqItem};
pub use embed::{Embedder, HashEmbedder};
pub use error::{FaqError, Result};
pub use eval::{EvalResult, Splitter, evaluate};
pub use persistence::{load_index, save_index};
pub use responder::{Reply, Responder};
pub use retriever::{PredictionOutcome, RetrievalHit, Retriever};
pub use space::{ReferenceItem, VectorSpace};
