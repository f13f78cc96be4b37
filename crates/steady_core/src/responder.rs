use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Keywords that escalate a message straight to the safety reply.
pub const CRISIS_KEYWORDS: &[&str] = &["suicide", "self-harm", "end my life", "can't go on"];

pub const CRISIS_REPLY: &str = "I'm really sorry you're feeling this way. \
Please reach out to a professional or call a helpline immediately.";

pub const APOLOGY_REPLY: &str = "Sorry, I couldn't process that. Can you try rephrasing?";

/// Which cascade stage produced the reply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ReplyTag {
    Crisis,
    Rule,
    Ai,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reply {
    pub tag: ReplyTag,
    pub text: String,
}

/// Remote text-generation adapters implement this trait.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, message: &str) -> Result<String>;
}

/// Fixed-priority classifier: crisis keyword match, then an exact normalized
/// lookup, then the remote completion call. Holds no state shared with the
/// habit engine.
pub struct Responder {
    rules: HashMap<String, String>,
    client: Option<Box<dyn CompletionClient>>,
}

#[derive(Debug, Deserialize)]
struct ConversationTurn {
    user: Option<String>,
    system: Option<String>,
}

impl Responder {
    pub fn new() -> Self {
        let mut responder = Self {
            rules: HashMap::new(),
            client: None,
        };
        responder.add_rule("hello", "Hi! How are you feeling today?");
        responder.add_rule(
            "i am sad",
            "I'm sorry to hear that. Do you want to talk about it?",
        );
        responder.add_rule("yes", "I'm here for you. Can you tell me more?");
        responder.add_rule("no", "That's okay. Remember, you're not alone.");
        responder.add_rule(
            "help",
            "If you need urgent help, please reach out to a professional or call a helpline.",
        );
        responder
    }

    pub fn with_client(mut self, client: Box<dyn CompletionClient>) -> Self {
        self.client = Some(client);
        self
    }

    pub fn add_rule(&mut self, prompt: &str, reply: &str) {
        self.rules.insert(normalize(prompt), reply.to_string());
    }

    /// Load rules from a conversation-pair dataset of the form
    /// `[[{"user": "..."}, {"system": "..."}], ...]`. Returns how many pairs
    /// were added; malformed pairs are skipped.
    pub fn extend_from_pairs(&mut self, raw: &str) -> Result<usize> {
        let conversations: Vec<Vec<ConversationTurn>> = serde_json::from_str(raw)?;
        let mut added = 0;
        for turns in conversations {
            let Some(user) = turns.first().and_then(|turn| turn.user.clone()) else {
                continue;
            };
            let Some(system) = turns.get(1).and_then(|turn| turn.system.clone()) else {
                continue;
            };
            self.rules.insert(normalize(&user), system);
            added += 1;
        }
        Ok(added)
    }

    pub fn detect_crisis(&self, message: &str) -> bool {
        let lowered = message.to_lowercase();
        CRISIS_KEYWORDS.iter().any(|word| lowered.contains(word))
    }

    pub fn respond(&self, message: &str) -> Reply {
        if self.detect_crisis(message) {
            return Reply {
                tag: ReplyTag::Crisis,
                text: CRISIS_REPLY.to_string(),
            };
        }

        if let Some(reply) = self.rules.get(&normalize(message)) {
            return Reply {
                tag: ReplyTag::Rule,
                text: reply.clone(),
            };
        }

        let text = match &self.client {
            Some(client) => match client.complete(message) {
                Ok(text) => text,
                Err(err) => {
                    warn!(%err, "completion request failed; substituting apology");
                    APOLOGY_REPLY.to_string()
                }
            },
            None => {
                warn!("no completion client configured; substituting apology");
                APOLOGY_REPLY.to_string()
            }
        };
        Reply {
            tag: ReplyTag::Ai,
            text,
        }
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(message: &str) -> String {
    message.trim().to_lowercase()
}
