use clap::Parser;
use std::time::Duration;

use crate::interpreter::ResponseFormat;
use crate::kitchen::KitchenSettings;
use crate::llm::{DEFAULT_API_BASE, GenerationSettings};

// CLI argument structure; every flag can also come from the environment (or .env)
#[derive(Parser, Debug, Clone)]
#[command(name = "hotpot-kitchen")]
#[command(about = "Cooking combinator backed by a generative model, with a memoized dish cache")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    // Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "GEMINI_MODEL", default_value = "gemini-2.0-flash")]
    pub model: String,

    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    #[arg(long, default_value_t = 0.6)]
    pub temperature: f32,

    #[arg(long, default_value_t = 1.0)]
    pub top_p: f32,

    #[arg(long, default_value_t = 1)]
    pub top_k: u32,

    #[arg(long, default_value_t = 300)]
    pub max_output_tokens: u32,

    // Applied to all four harm categories
    #[arg(long, default_value = "BLOCK_MEDIUM_AND_ABOVE")]
    pub safety_threshold: String,

    // Seconds before a generation call is abandoned
    #[arg(long, default_value_t = 30)]
    pub request_timeout: u64,

    #[arg(long, value_enum, default_value_t = ResponseFormat::Extended)]
    pub response_format: ResponseFormat,

    // Cap on ingredients per cook (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub max_ingredients: usize,

    // Fail blocked cooks instead of serving the stand-in dish
    #[arg(long, default_value_t = false)]
    pub fail_on_blocked: bool,

    // Allowed CORS origins (comma-separated)
    #[arg(
        long,
        env = "CORS_ORIGINS",
        value_delimiter = ',',
        default_value = "http://localhost,http://localhost:8000,http://127.0.0.1,http://127.0.0.1:8000"
    )]
    pub cors_origins: Vec<String>,
}

impl Args {
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            api_base: self.api_base.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.top_k,
            max_output_tokens: self.max_output_tokens,
            safety_threshold: self.safety_threshold.clone(),
            timeout: Duration::from_secs(self.request_timeout),
        }
    }

    pub fn kitchen_settings(&self) -> KitchenSettings {
        KitchenSettings {
            format: self.response_format,
            max_ingredients: (self.max_ingredients > 0).then_some(self.max_ingredients),
            serve_unavailable_placeholder: !self.fail_on_blocked,
        }
    }
}
