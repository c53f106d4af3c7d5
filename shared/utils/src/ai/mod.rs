//! AI-assisted analysis behind explicit provider capabilities

pub mod contract;
pub mod provider;

pub use contract::{ClauseRisk, ContractAnalysis, ContractAnalyzer, ContractClause};
pub use provider::{
    create_provider, AiProvider, AnthropicProvider, DisabledProvider, FreeformPrompt, OpenAiProvider,
    SupportsFreeformPrompt,
};
