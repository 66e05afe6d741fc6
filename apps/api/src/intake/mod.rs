//! Intake: the gate every upload passes before any parser sees its bytes.
//!
//! `validation` checks declared type and size; `scanner` inspects content for
//! malicious payloads.

pub mod scanner;
pub mod validation;
