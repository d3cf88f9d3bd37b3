//! SMTP client used by textrelay to hand gateway messages to outbound relays.

pub mod client;
