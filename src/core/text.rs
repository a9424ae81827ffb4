/// `{player}` substitution for narration and prompts.

use crate::schema::character::CharacterState;

pub const PLAYER_TOKEN: &str = "{player}";

/// Names the characters a panel is about, by first name.
///
/// "" for nobody, "The Party" when the whole party is present,
/// otherwise "A", "A and B" or "A, B, and C".
pub fn player_name_string<'a>(
    characters: impl IntoIterator<Item = &'a CharacterState>,
    is_party: bool,
) -> String {
    let names: Vec<&str> = characters
        .into_iter()
        .map(CharacterState::first_name)
        .collect();
    match names.as_slice() {
        [] => String::new(),
        _ if is_party => "The Party".to_string(),
        [only] => (*only).to_string(),
        [first, second] => format!("{first} and {second}"),
        [rest @ .., last] => format!("{}, and {last}", rest.join(", ")),
    }
}

/// Replace every `{player}` in `text` with `name`.
pub fn replace_player(text: &str, name: &str) -> String {
    text.replace(PLAYER_TOKEN, name)
}
