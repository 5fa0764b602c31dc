use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;

use aegis_core::{AegisError, FragmentStream, GenerationRequest, Generator};

/// Generator that replays canned fragments and records every request.
pub struct ScriptedGenerator {
    fragments: Vec<Result<String, AegisError>>,
    healthy: bool,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new(fragments: &[&str]) -> Self {
        Self::with_items(fragments.iter().map(|f| Ok(f.to_string())).collect())
    }

    pub fn with_items(fragments: Vec<Result<String, AegisError>>) -> Self {
        Self {
            fragments,
            healthy: true,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn health_check(&self) -> Result<(), AegisError> {
        if self.healthy {
            Ok(())
        } else {
            Err(AegisError::TransportError("connection refused".to_string()))
        }
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, AegisError> {
        self.requests.lock().unwrap().push(request.clone());
        let mut answer = String::new();
        for item in &self.fragments {
            answer.push_str(&item.clone()?);
        }
        Ok(answer)
    }

    async fn stream(&self, request: &GenerationRequest) -> FragmentStream {
        self.requests.lock().unwrap().push(request.clone());
        Box::pin(stream::iter(self.fragments.clone()))
    }
}
