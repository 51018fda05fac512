// Send path: moderate, decide, then persist.
//
// One ToxicityResult decides both the stored content and the is_toxic flag,
// and both go to the store in a single row. Blocked messages never reach
// the store or the timeline.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use super::models::{Body, Draft, Message, NewMessage};
use super::timeline::Timeline;
use super::traits::MessageStore;
use crate::moderation::admission::{mark, Admission, AdmissionPolicy};
use crate::moderation::gate::ModerationGate;
use crate::moderation::traits::ToxicityResult;

/// Result of a send attempt that didn't hit an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Stored; `masked` means it went out flagged and hidden
    Sent {
        message: Message,
        verdict: ToxicityResult,
        masked: bool,
    },
    /// Kept on the client
    Blocked {
        notice: String,
        verdict: ToxicityResult,
    },
}

pub struct Messenger {
    gate: Arc<ModerationGate>,
    store: Arc<dyn MessageStore>,
    policy: AdmissionPolicy,
    sender_id: String,
}

impl Messenger {
    pub fn new(
        gate: Arc<ModerationGate>,
        store: Arc<dyn MessageStore>,
        policy: AdmissionPolicy,
        sender_id: impl Into<String>,
    ) -> Self {
        Self {
            gate,
            store,
            policy,
            sender_id: sender_id.into(),
        }
    }

    pub fn sender_id(&self) -> &str {
        &self.sender_id
    }

    /// Send a draft into the timeline's scope.
    ///
    /// Errors only for blank drafts and store failures; in the latter case
    /// the optimistic entry has already been removed from the timeline.
    pub async fn send(&self, timeline: &mut Timeline, draft: Draft) -> Result<SendOutcome> {
        if draft.is_blank() {
            anyhow::bail!("Nothing to send: message is empty");
        }

        let text = draft.text.trim();
        let verdict = self.gate.evaluate(text).await;

        let (content, is_toxic) = match self.policy.decide(&verdict) {
            Admission::Block { notice } => {
                info!(
                    label = %verdict.label,
                    source = verdict.source.as_str(),
                    "Message blocked before sending"
                );
                return Ok(SendOutcome::Blocked { notice, verdict });
            }
            // Masked sends keep only the text; an attached image is dropped.
            Admission::Mask => (mark(&Body::Text(text.to_string()).encode()), true),
            Admission::Transmit => {
                let body = match draft.image {
                    Some(ref image) if !image.trim().is_empty() => Body::Image(image.clone()),
                    _ => Body::Text(text.to_string()),
                };
                (body.encode(), false)
            }
        };

        let local = timeline.push_pending(&self.sender_id, &content, is_toxic);
        let new_message = NewMessage {
            sender_id: self.sender_id.clone(),
            receiver_id: timeline.scope().receiver().map(str::to_string),
            content,
            is_toxic,
        };

        match self.store.persist(new_message).await {
            Ok(message) => {
                debug!(id = message.id, is_toxic, "Message stored");
                timeline.confirm(local, message.clone());
                Ok(SendOutcome::Sent {
                    message,
                    verdict,
                    masked: is_toxic,
                })
            }
            Err(e) => {
                timeline.rollback(local);
                Err(e.context("Message could not be delivered"))
            }
        }
    }
}
