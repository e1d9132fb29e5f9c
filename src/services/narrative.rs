//! Prompt assembly for the two narrative fields of a prediction response.
//!
//! Provider failures never surface to the HTTP caller: every error path
//! degrades to a fixed fallback string and is logged server-side.

use crate::services::detector::Detection;
use crate::services::providers::{GenerationParams, TextProvider};

pub const RECOMMENDATION_FALLBACK: &str = "Could not obtain a recommendation.";
pub const DETAILS_FALLBACK: &str = "Could not obtain flower details.";

const CARE_SYSTEM_INSTRUCTION: &str = "You are a flower-care expert. Respond with the care \
    each mentioned flower needs.";
const BOTANY_SYSTEM_INSTRUCTION: &str = "You are a botany expert. Respond with the place of \
    origin, scientific name, and key characteristics of the mentioned flowers.";

/// "rose (confidence: 0.95), tulip (confidence: 0.82)"
fn describe(flowers: &[Detection]) -> String {
    flowers
        .iter()
        .map(|d| format!("{} (confidence: {:.2})", d.label, d.confidence))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Ask the provider for a concise care recommendation for the detected
/// flowers. Infallible by contract: errors and empty replies become
/// `RECOMMENDATION_FALLBACK`.
pub async fn care_recommendation(provider: &dyn TextProvider, flowers: &[Detection]) -> String {
    let prompt = format!(
        "Give a concise care recommendation for the detected flowers: {}.",
        describe(flowers)
    );
    let params = GenerationParams {
        temperature: Some(0.2),
        max_tokens: Some(300),
    };

    generate_or_fallback(
        provider,
        CARE_SYSTEM_INSTRUCTION,
        &prompt,
        &params,
        RECOMMENDATION_FALLBACK,
    )
    .await
}

/// Ask the provider for botanical details on the detected flowers. Same
/// failure policy as `care_recommendation`, with its own fallback.
pub async fn flower_details(provider: &dyn TextProvider, flowers: &[Detection]) -> String {
    let prompt = format!(
        "Provide details about the following flowers: {}. Include place of origin, \
         scientific name, and key characteristics.",
        describe(flowers)
    );
    let params = GenerationParams {
        temperature: Some(0.2),
        max_tokens: Some(400),
    };

    generate_or_fallback(
        provider,
        BOTANY_SYSTEM_INSTRUCTION,
        &prompt,
        &params,
        DETAILS_FALLBACK,
    )
    .await
}

async fn generate_or_fallback(
    provider: &dyn TextProvider,
    system: &str,
    prompt: &str,
    params: &GenerationParams,
    fallback: &str,
) -> String {
    match provider.generate(system, prompt, params).await {
        Ok(response) => {
            let text = response.text.unwrap_or_default().trim().to_string();
            if text.is_empty() {
                tracing::warn!("Provider returned empty content");
                fallback.to_string()
            } else {
                text
            }
        }
        Err(e) => {
            tracing::error!("Text generation failed: {}", e);
            fallback.to_string()
        }
    }
}
