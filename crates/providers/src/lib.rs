//! Language model backends for MediScreen.
//!
//! Every backend speaks the OpenAI chat-completions protocol; the router
//! picks one per configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{ProviderRouter, build_from_config, default_base_url};
