/// USD rates per 1000 tokens for one provider/model pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRate {
    pub provider: &'static str,
    pub model: &'static str,
    pub input: f64,
    pub output: f64,
}

pub static COST_RATES: &[ModelRate] = &[
    ModelRate {
        provider: "openai",
        model: "gpt-5-nano",
        input: 0.00005,
        output: 0.0004,
    },
    ModelRate {
        provider: "openai",
        model: "gpt-4o-mini",
        input: 0.00015,
        output: 0.0006,
    },
    ModelRate {
        provider: "google",
        model: "gemini-2.5-flash",
        input: 0.0003,
        output: 0.0025,
    },
    ModelRate {
        provider: "ollama",
        model: "mistral",
        input: 0.0,
        output: 0.0,
    },
    ModelRate {
        provider: "ollama",
        model: "llama3",
        input: 0.0,
        output: 0.0,
    },
    ModelRate {
        provider: "ollama",
        model: "codellama",
        input: 0.0,
        output: 0.0,
    },
];

pub fn rate_for(provider: &str, model: &str) -> Option<&'static ModelRate> {
    COST_RATES
        .iter()
        .find(|rate| rate.provider == provider && rate.model == model)
}

/// Estimated cost in USD. Unknown pairs cost nothing.
pub fn cost(provider: &str, model: &str, prompt_tokens: u32, completion_tokens: u32) -> f64 {
    match rate_for(provider, model) {
        Some(rate) => {
            (f64::from(prompt_tokens) / 1000.0) * rate.input
                + (f64::from(completion_tokens) / 1000.0) * rate.output
        }
        None => 0.0,
    }
}
