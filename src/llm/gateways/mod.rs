pub mod deepseek;
pub mod sse;

pub use deepseek::DeepSeekGateway;
pub use sse::{SseEvent, SseLineBuffer};
