//! Contract clause extraction through a free-form prompt

use serde::{Deserialize, Serialize};

use super::provider::{AiProvider, FreeformPrompt, SupportsFreeformPrompt};
use crate::error::{SolderlineError, SolderlineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseRisk {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractClause {
    pub category: String,
    pub title: String,
    pub summary: String,
    pub risk: ClauseRisk,
    #[serde(default)]
    pub excerpt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractAnalysis {
    pub summary: String,
    #[serde(default)]
    pub clauses: Vec<ContractClause>,
    #[serde(default)]
    pub missing_clauses: Vec<String>,
}

impl ContractAnalysis {
    pub fn high_risk(&self) -> impl Iterator<Item = &ContractClause> {
        self.clauses.iter().filter(|c| c.risk == ClauseRisk::High)
    }
}

pub struct ContractAnalyzer<'a> {
    prompter: &'a dyn SupportsFreeformPrompt,
    company_name: String,
}

impl<'a> ContractAnalyzer<'a> {
    /// Fails when the provider cannot take free-form prompts
    pub fn new(provider: &'a dyn AiProvider, company_name: impl Into<String>) -> SolderlineResult<Self> {
        let prompter = provider
            .freeform()
            .ok_or_else(|| SolderlineError::unsupported_capability(provider.name(), "freeform_prompt"))?;

        Ok(Self::with_prompter(prompter, company_name))
    }

    pub fn with_prompter(prompter: &'a dyn SupportsFreeformPrompt, company_name: impl Into<String>) -> Self {
        Self {
            prompter,
            company_name: company_name.into(),
        }
    }

    pub async fn analyze(&self, contract_text: &str) -> SolderlineResult<ContractAnalysis> {
        if contract_text.trim().is_empty() {
            return Err(SolderlineError::validation("contract_text", "Contract text is empty"));
        }

        let prompt = FreeformPrompt::new(format!(
            "Contract between {} and a customer or supplier:\n\n{}",
            self.company_name, contract_text
        ))
        .with_system(CONTRACT_ANALYSIS_PROMPT);

        let reply = self.prompter.complete(&prompt).await?;
        let analysis = parse_analysis(&reply)?;

        tracing::info!(
            clauses = analysis.clauses.len(),
            high_risk = analysis.high_risk().count(),
            "Contract analyzed"
        );
        Ok(analysis)
    }
}

/// Parses the model reply, accepting a JSON object wrapped in a markdown code fence
pub fn parse_analysis(reply: &str) -> SolderlineResult<ContractAnalysis> {
    let json = strip_code_fence(reply);
    serde_json::from_str(json).map_err(|e| {
        SolderlineError::external_service("ai", format!("Failed to parse contract analysis JSON: {}", e))
    })
}

fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the language tag line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

const CONTRACT_ANALYSIS_PROMPT: &str = r#"
You review electronics manufacturing contracts. Identify the clauses that matter to a contract manufacturer:
pricing and payment terms, lead times, component sourcing and substitution, warranty, liability, IP and termination.

Return only a JSON object with the following structure:
{
  "summary": "one paragraph",
  "clauses": [
    {"category": "...", "title": "...", "summary": "...", "risk": "low|medium|high", "excerpt": "quoted text"}
  ],
  "missing_clauses": ["categories the contract does not address"]
}
"#;
