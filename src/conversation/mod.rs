use crate::catalog::Product;
use crate::completion::{CompletionError, CompletionPayload};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

pub const ROUTINE_PROMPT_PREFIX: &str =
    "Please create a skincare or beauty routine using the following L'Oréal products:";
pub const MISSING_REPLY_NOTICE: &str = "Error from AI.";
pub const FAILURE_NOTICE: &str = "Something went wrong.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Conversation history sent with every request. The system directive is
/// always the first message and nothing is ever removed.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new(system_directive: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::new(Role::System, system_directive)],
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    fn push(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(Uuid);

impl RequestId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Freeform,
    Routine,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub id: RequestId,
    pub kind: RequestKind,
    pub payload: CompletionPayload,
}

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("message is empty")]
    EmptyInput,

    #[error("no products selected")]
    EmptySelection,

    #[error("failed to encode selected products: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What the chat surface should show in place of a placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Failed(&'static str),
}

impl Resolution {
    pub fn text(&self) -> &str {
        match self {
            Self::Resolved(reply) => reply,
            Self::Failed(notice) => notice,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenBudgets {
    pub freeform: u32,
    pub routine: u32,
}

#[derive(Serialize)]
struct RoutineProduct<'a> {
    name: &'a str,
    brand: &'a str,
    category: &'a str,
    description: &'a str,
}

pub struct ConversationManager {
    transcript: Transcript,
    model: String,
    budgets: TokenBudgets,
    in_flight: HashMap<RequestId, RequestKind>,
}

impl ConversationManager {
    pub fn new(
        system_directive: impl Into<String>,
        model: impl Into<String>,
        budgets: TokenBudgets,
    ) -> Self {
        Self {
            transcript: Transcript::new(system_directive),
            model: model.into(),
            budgets,
            in_flight: HashMap::new(),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn begin_freeform(&mut self, text: &str) -> Result<CompletionRequest, ConversationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ConversationError::EmptyInput);
        }
        self.transcript.push(Role::User, text);
        Ok(self.request(RequestKind::Freeform, self.budgets.freeform))
    }

    pub fn begin_routine(
        &mut self,
        selection: &[Product],
    ) -> Result<CompletionRequest, ConversationError> {
        if selection.is_empty() {
            return Err(ConversationError::EmptySelection);
        }
        let prompt = routine_prompt(selection)?;
        self.transcript.push(Role::User, prompt);
        Ok(self.request(RequestKind::Routine, self.budgets.routine))
    }

    /// Records a successful reply in the transcript. Failures leave the
    /// transcript untouched and map to a fixed notice.
    pub fn resolve(
        &mut self,
        id: RequestId,
        outcome: Result<String, CompletionError>,
    ) -> Resolution {
        if self.in_flight.remove(&id).is_none() {
            tracing::warn!(%id, "completion resolved for an unknown request");
        }

        match outcome {
            Ok(reply) => {
                self.transcript.push(Role::Assistant, reply.clone());
                Resolution::Resolved(reply)
            }
            Err(CompletionError::MissingReply) => {
                tracing::error!(%id, "completion response carried no reply");
                Resolution::Failed(MISSING_REPLY_NOTICE)
            }
            Err(err) => {
                tracing::error!(%id, "completion failed: {err}");
                Resolution::Failed(FAILURE_NOTICE)
            }
        }
    }

    fn request(&mut self, kind: RequestKind, max_tokens: u32) -> CompletionRequest {
        let id = RequestId::new();
        self.in_flight.insert(id, kind);
        CompletionRequest {
            id,
            kind,
            payload: CompletionPayload {
                model: self.model.clone(),
                messages: self.transcript.messages().to_vec(),
                max_tokens,
            },
        }
    }
}

/// The synthetic user turn behind a routine request.
pub fn routine_prompt(selection: &[Product]) -> Result<String, serde_json::Error> {
    let products: Vec<RoutineProduct<'_>> = selection
        .iter()
        .map(|product| RoutineProduct {
            name: &product.name,
            brand: &product.brand,
            category: &product.category,
            description: &product.description,
        })
        .collect();
    let json = serde_json::to_string_pretty(&products)?;
    Ok(format!("{ROUTINE_PROMPT_PREFIX}\n{json}"))
}
