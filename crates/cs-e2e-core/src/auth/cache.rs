//! In-memory bearer token cache, keyed by persona.
//!
//! Owned by the test context and shared through `Arc`. It is seeded once from
//! the per-persona token variables CI exports; after that the
//! [`TokenManager`](super::TokenManager) is the only writer.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use super::Persona;

#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: RwLock<HashMap<Persona, String>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Seed from an arbitrary variable lookup. Empty values are ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let tokens: HashMap<Persona, String> = Persona::ALL
            .into_iter()
            .filter_map(|persona| {
                lookup(persona.env_var())
                    .filter(|token| !token.trim().is_empty())
                    .map(|token| (persona, token))
            })
            .collect();
        debug!(seeded = tokens.len(), "Seeded token cache");
        Self {
            tokens: RwLock::new(tokens),
        }
    }

    pub async fn get(&self, persona: Persona) -> Option<String> {
        self.tokens.read().await.get(&persona).cloned()
    }

    pub async fn contains(&self, persona: Persona) -> bool {
        self.tokens.read().await.contains_key(&persona)
    }

    pub(crate) async fn set(&self, persona: Persona, token: String) {
        self.tokens.write().await.insert(persona, token);
    }

    /// Personas that currently hold a token, in table order
    pub async fn personas(&self) -> Vec<Persona> {
        let tokens = self.tokens.read().await;
        Persona::ALL
            .into_iter()
            .filter(|p| tokens.contains_key(p))
            .collect()
    }
}
