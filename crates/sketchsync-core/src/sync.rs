//! Realtime channel messages and transport contract.
//!
//! Messages are `{"event": <name>, "data": {...}}` objects using the event
//! names of the canvas socket room.

use crate::document::CanvasId;
use crate::elements::{ElementId, WireElement};
use crate::presence::{ActiveUser, UserId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Realtime channel errors.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel closed")]
    Closed,
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Messages sent to the realtime server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    /// Join a canvas room.
    #[serde(rename = "join_canvas")]
    JoinCanvas { canvas_id: CanvasId, user: ActiveUser },
    #[serde(rename = "canvas:element_added")]
    ElementAdded {
        canvas_id: CanvasId,
        element: WireElement,
    },
    #[serde(rename = "canvas:element_updated")]
    ElementUpdated {
        canvas_id: CanvasId,
        element: WireElement,
    },
    #[serde(rename = "canvas:element_deleted")]
    ElementDeleted {
        canvas_id: CanvasId,
        element_id: ElementId,
    },
}

/// Messages received from the realtime server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "canvas:user_joined")]
    UserJoined { user: ActiveUser },
    #[serde(rename = "canvas:user_left")]
    UserLeft { user_id: UserId },
    #[serde(rename = "canvas:active_users")]
    ActiveUsers { users: Vec<ActiveUser> },
    #[serde(rename = "canvas:element_added")]
    ElementAdded { element: WireElement, user_id: UserId },
    #[serde(rename = "canvas:element_updated")]
    ElementUpdated { element: WireElement, user_id: UserId },
    #[serde(rename = "canvas:element_deleted")]
    ElementDeleted {
        element_id: ElementId,
        user_id: UserId,
    },
}

impl ServerMessage {
    pub fn from_json(json: &str) -> Result<Self, ChannelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Originating user of an element event.
    pub fn origin(&self) -> Option<UserId> {
        match self {
            ServerMessage::ElementAdded { user_id, .. }
            | ServerMessage::ElementUpdated { user_id, .. }
            | ServerMessage::ElementDeleted { user_id, .. } => Some(*user_id),
            _ => None,
        }
    }
}

impl ClientMessage {
    pub fn to_json(&self) -> Result<String, ChannelError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Publish/subscribe transport scoped to one canvas room.
pub trait RealtimeChannel {
    fn join(&mut self, canvas_id: CanvasId, user: &ActiveUser) -> Result<(), ChannelError>;

    fn publish(&mut self, message: &ClientMessage) -> Result<(), ChannelError>;

    /// Drain messages received since the last poll.
    fn poll(&mut self) -> Vec<ServerMessage>;
}

/// In-process channel that records what was published and replays queued
/// inbound messages.
#[derive(Debug, Default)]
pub struct LoopbackChannel {
    joined: Option<(CanvasId, UserId)>,
    published: Vec<ClientMessage>,
    inbox: VecDeque<ServerMessage>,
    closed: bool,
}

impl LoopbackChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message as if it came from the server.
    pub fn deliver(&mut self, message: ServerMessage) {
        self.inbox.push_back(message);
    }

    /// Everything published so far.
    pub fn published(&self) -> &[ClientMessage] {
        &self.published
    }

    pub fn take_published(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.published)
    }

    pub fn joined(&self) -> Option<(CanvasId, UserId)> {
        self.joined
    }

    pub fn close(&mut self) {
        self.closed = true;
    }
}

impl RealtimeChannel for LoopbackChannel {
    fn join(&mut self, canvas_id: CanvasId, user: &ActiveUser) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.joined = Some((canvas_id, user.id));
        self.published.push(ClientMessage::JoinCanvas {
            canvas_id,
            user: user.clone(),
        });
        Ok(())
    }

    fn publish(&mut self, message: &ClientMessage) -> Result<(), ChannelError> {
        if self.closed {
            return Err(ChannelError::Closed);
        }
        self.published.push(message.clone());
        Ok(())
    }

    fn poll(&mut self) -> Vec<ServerMessage> {
        self.inbox.drain(..).collect()
    }
}
