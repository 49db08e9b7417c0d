pub mod cli;
pub mod config;
pub mod error;
pub mod llm;

pub use error::{ForgeError, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::config::{ConfigFile, GatewayConfig};
    pub use crate::error::{ForgeError, Result};
    pub use crate::llm::gateways::DeepSeekGateway;
    pub use crate::llm::{
        ChatSession, ChatSink, CompletionGateway, CompletionOptions, OneShotQuery, Transcript,
        TurnOutcome,
    };
}
