use super::data::{Character, CharacterId};

/// The Library holds every character authored during this session.
///
/// Characters are appended by the creation modal and never mutated or
/// removed; the library lives as long as the process does.
#[derive(Debug, Default)]
pub struct Library {
    characters: Vec<Character>,
}

impl Library {
    /// Append a new character to the end of the library
    pub fn add(&mut self, character: Character) {
        tracing::info!("🎭 Added character '{}' ({})", character.name, character.id);
        self.characters.push(character);
    }

    /// Look up a character by id
    pub fn get(&self, id: &CharacterId) -> Option<&Character> {
        self.characters.iter().find(|character| &character.id == id)
    }

    pub fn contains(&self, id: &CharacterId) -> bool {
        self.get(id).is_some()
    }

    /// All characters in creation order
    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    /// Resolve ids to characters, preserving their order and skipping unknown ids
    pub fn resolve<'a>(&'a self, ids: &'a [CharacterId]) -> impl Iterator<Item = &'a Character> + 'a {
        ids.iter().filter_map(move |id| self.get(id))
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }
}
