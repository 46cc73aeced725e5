pub mod extraction;
pub mod gateway;
pub mod openrouter;
pub mod prompts;

pub use extraction::{
    ActionEnvelope, ActionTag, ExtractionClient, ExtractionError, HISTORY_WINDOW,
    parse_action_envelope, recent_turns, strip_code_fences,
};
pub use gateway::{
    LlmCompletion, LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmGatewayRequest,
    LlmTokenUsage,
};
pub use openrouter::{LlmGatewayConfig, LlmGatewayConfigError, OpenRouterGateway};
pub use prompts::assistant_system_prompt;
