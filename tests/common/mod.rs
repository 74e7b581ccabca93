#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use sqmap::resolve::{ReasoningService, ServiceError};

/// Reasoning service that answers from a table keyed by the prompt's legacy item
#[derive(Default)]
pub struct ScriptedService {
    replies: HashMap<String, Result<String, ServiceError>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, item: &str, raw: &str) -> Self {
        self.replies.insert(item.to_string(), Ok(raw.to_string()));
        self
    }

    pub fn fail(mut self, item: &str, err: ServiceError) -> Self {
        self.replies.insert(item.to_string(), Err(err));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ReasoningService for ScriptedService {
    fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        let item = prompt
            .lines()
            .find_map(|l| l.strip_prefix("Legacy Item: "))
            .unwrap_or_default();
        self.replies
            .get(item)
            .cloned()
            .unwrap_or_else(|| Ok("I am not sure about this one.".to_string()))
    }
}

pub fn verdict(best_match: &str, confidence: f64) -> String {
    format!(
        r#"{{"best_match": "{}", "confidence": {}, "transformation_logic": "Direct mapping", "reasoning": "scripted"}}"#,
        best_match, confidence
    )
}
