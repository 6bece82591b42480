pub mod chain;
pub mod core;
pub mod embedding;
pub mod history;
pub mod llm;
pub mod metrics;
pub mod rag;
pub mod server;
pub mod state;

#[cfg(test)]
mod test_support;
