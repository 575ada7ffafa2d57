//! Agent module for Kimi Agent
//!
//! This module contains the conversational core: the session registry, the
//! search augmentation policy, and the agent that runs turns against them.

pub mod augmentation;
pub mod core;
pub mod registry;

pub use augmentation::{augment, Augmentation, ContextAugmentationPolicy, KeywordTriggerPolicy};
pub use core::{Agent, AgentSettings, ChatReply, DocumentReply};
pub use registry::{Session, SessionRegistry, SessionRegistryConfig};
