//! Value types shared by the condition language, the storyboard parser
//! and whatever plays the parsed content back.

pub mod character;
pub mod game_data;
pub mod panel;
pub mod stat;
pub mod storyboard;
