pub mod fallback;
pub mod generator;
pub mod service;

pub use fallback::{append_user_quote, FallbackQuotes};
pub use generator::{GroqClient, TextGenerator};
pub use service::QuoteService;
