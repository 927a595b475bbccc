//! Lightweight structural scanning of markup documents.
//!
//! This module turns raw text into a flat sequence of structural events
//! (container open/close/self-close, everything else as text) and verifies
//! tag balance over that sequence. It is deliberately not a full markup
//! parser: attribute values are captured as raw strings and embedded
//! template syntax degrades to text events.

pub mod balance;
pub mod events;
pub mod tokenizer;

pub use balance::{find_matching_close, verify, BalanceMode, BalanceReport, MismatchedClose};
pub use events::{Attribute, EventKind, StructuralEvent};
pub use tokenizer::tokenize;
