//! Shared in-memory doubles for the external collaborators, used across the
//! unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use axum::async_trait;
use bytes::Bytes;

use crate::gemini::client::{GenerativeModel, Part};
use crate::line::client::{ChatClient, OutgoingMessage};
use crate::storage::StorageClient;

#[derive(Default)]
pub struct FakeChat {
    pub replies: Mutex<Vec<(String, Vec<OutgoingMessage>)>>,
    pub pushes: Mutex<Vec<(String, Vec<OutgoingMessage>)>>,
    pub content: Mutex<HashMap<String, Bytes>>,
}

impl FakeChat {
    pub fn with_content(message_id: &str, bytes: &'static [u8]) -> Self {
        let chat = Self::default();
        chat.content
            .lock()
            .unwrap()
            .insert(message_id.to_string(), Bytes::from_static(bytes));
        chat
    }

    /// Flattened text of every reply sent so far.
    pub fn reply_texts(&self) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, msgs)| msgs.iter())
            .filter_map(|m| match m {
                OutgoingMessage::Text { text } => Some(text.clone()),
                OutgoingMessage::Flex { .. } => None,
            })
            .collect()
    }

    pub fn push_count(&self) -> usize {
        self.pushes.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatClient for FakeChat {
    async fn reply(&self, reply_token: &str, messages: Vec<OutgoingMessage>) -> anyhow::Result<()> {
        self.replies
            .lock()
            .unwrap()
            .push((reply_token.to_string(), messages));
        Ok(())
    }

    async fn push(&self, to: &str, messages: Vec<OutgoingMessage>) -> anyhow::Result<()> {
        self.pushes.lock().unwrap().push((to.to_string(), messages));
        Ok(())
    }

    async fn get_message_content(&self, message_id: &str) -> anyhow::Result<Bytes> {
        self.content
            .lock()
            .unwrap()
            .get(message_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no content for message {message_id}"))
    }
}

/// Pops canned responses in order; an exhausted queue fails the call.
#[derive(Default)]
pub struct FakeModel {
    pub responses: Mutex<VecDeque<anyhow::Result<String>>>,
}

impl FakeModel {
    pub fn replying(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| Ok(r.to_string())).collect()),
        }
    }

    pub fn failing() -> Self {
        Self {
            responses: Mutex::new(VecDeque::from([Err(anyhow::anyhow!("model unavailable"))])),
        }
    }
}

#[async_trait]
impl GenerativeModel for FakeModel {
    async fn generate(&self, _parts: Vec<Part>) -> anyhow::Result<String> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(anyhow::anyhow!("no canned response left")))
    }
}

#[derive(Default)]
pub struct FakeStorage {
    pub uploads: Mutex<Vec<String>>,
}

impl FakeStorage {
    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, _body: Bytes, _ct: &str) -> anyhow::Result<()> {
        self.uploads.lock().unwrap().push(key.to_string());
        Ok(())
    }

    fn public_url(&self, key: &str) -> Option<String> {
        Some(format!("https://media.local/{key}"))
    }
}
