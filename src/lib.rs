// GiggleChat: moderation-gated chat backend
//
// This is the library root. `moderation` decides what may be sent,
// `chat` stores and delivers what was sent.

pub mod chat;
pub mod config;
pub mod moderation;
pub mod output;
pub mod status;
