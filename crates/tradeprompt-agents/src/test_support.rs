//! Test doubles for code that depends on a [`CompletionClient`].
//!
//! `ScriptedCompletion` replays queued results in order and counts calls, so
//! callers can assert both what happened and that no completion was requested
//! at all.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::completion::CompletionClient;
use crate::error::CompletionError;

pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, CompletionError>>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answers with the same text.
    pub fn replying(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string())])
    }

    pub fn failing(err: CompletionError) -> Self {
        Self::new(vec![Err(err)])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for ScriptedCompletion {
    fn model(&self) -> &str {
        "scripted"
    }

    async fn ask(&self, prompt: &str) -> Result<String, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let mut replies = self
            .replies
            .lock()
            .map_err(|_| CompletionError::Config("scripted replies poisoned".to_string()))?;
        // The last reply repeats once the script runs out.
        match replies.len() {
            0 => Err(CompletionError::Config("no scripted reply".to_string())),
            1 => replies[0].clone(),
            _ => replies
                .pop_front()
                .unwrap_or_else(|| Err(CompletionError::Config("no scripted reply".to_string()))),
        }
    }
}
