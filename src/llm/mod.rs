pub mod chat_session;
pub mod gateway;
pub mod gateways;
pub mod models;
pub mod one_shot;
pub mod prompts;
pub mod sink;
pub mod transcript;

#[cfg(test)]
pub(crate) mod test_support;

pub use chat_session::{ChatSession, SessionState, SharedChatSession, TurnOutcome};
pub use gateway::{CompletionGateway, CompletionOptions, CompletionPurpose, FragmentStream};
pub use models::{Role, Turn};
pub use one_shot::OneShotQuery;
pub use sink::{ChatSink, CollectingSink};
pub use transcript::Transcript;
