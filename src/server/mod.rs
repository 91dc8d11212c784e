pub mod handler;

use crate::config::EngineConfig;
use crate::core::processor::Processor;
use std::sync::Arc;

/// The MCP server wiring the reasoning engine's processor facade to the
/// `rmcp` transport.
#[derive(Clone)]
pub struct ThinkingServer {
    processor: Arc<Processor>,
}

impl ThinkingServer {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            processor: Arc::new(Processor::new(config)),
        }
    }

    pub fn processor(&self) -> Arc<Processor> {
        self.processor.clone()
    }
}
