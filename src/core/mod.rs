//! The condition language, the storyboard markup parser and the helpers
//! that play parsed panels back.

pub mod condition;
pub mod effect;
pub mod lexer;
pub mod parser;
pub mod playback;
pub mod text;
pub mod tree;
