//! Storyboard Script — the narrative scripting layer of a party adventure.
//!
//! Authors write storyboards in a line-oriented markup: narration with
//! stat and trait effects, multi-player decisions and conditional
//! branches. Branches and decisions are guarded by a small condition
//! language evaluated against a read-only snapshot of the party and the
//! current encounter and session.

pub mod core;
pub mod schema;
