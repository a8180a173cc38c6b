//! Realtime notification plumbing.
//!
//! Three pieces: a one-hour channel token bound to a user id, a
//! LISTEN/NOTIFY listener fanning registry INSERT events into a broadcast
//! channel, and the per-session bridge state machine that turns events into
//! deduplicated notifications.

pub mod bridge;
pub mod feed;
pub mod token;
