use tracing::debug;

use crate::lang::Localizer;

use super::{EventContext, EventId, OverworldRequest};

/// Localization keys plus their text in the language last resolved.
///
/// The keys are authoritative; `lines` is a cache rebuilt on every language change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialogue {
    keys: Vec<String>,
    lines: Vec<String>,
}

impl Dialogue {
    pub fn new(keys: Vec<String>, localizer: &dyn Localizer) -> Self {
        let mut dialogue = Self {
            keys,
            lines: Vec::new(),
        };
        dialogue.reload(localizer);
        dialogue
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn reload(&mut self, localizer: &dyn Localizer) {
        self.lines = self
            .keys
            .iter()
            .map(|key| localizer.resolve(key))
            .collect();
    }

    pub fn replace_keys(&mut self, keys: Vec<String>, localizer: &dyn Localizer) {
        self.keys = keys;
        self.reload(localizer);
    }

    pub(crate) fn start(&self, source: EventId, ctx: &mut EventContext<'_>) {
        debug!(event = source.0, lines = self.lines.len(), "dialogue_requested");
        ctx.frame.request(OverworldRequest::StartDialogue {
            source,
            lines: self.lines.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::StringTable;

    fn table() -> StringTable {
        let mut table = StringTable::new("en");
        table.insert("en", "npc.hello", "Hello!");
        table.insert("en", "npc.bye", "Bye!");
        table.insert("fr", "npc.hello", "Bonjour !");
        table.insert("fr", "npc.bye", "Salut !");
        table
    }

    #[test]
    fn language_change_re_resolves_every_key() {
        let mut table = table();
        let mut dialogue = Dialogue::new(vec!["npc.hello".into(), "npc.bye".into()], &table);
        assert_eq!(dialogue.lines(), ["Hello!", "Bye!"]);

        table.set_language("fr");
        dialogue.reload(&table);
        assert_eq!(dialogue.lines(), ["Bonjour !", "Salut !"]);
    }

    #[test]
    fn repeated_resolution_is_stable() {
        let table = table();
        let first = Dialogue::new(vec!["npc.hello".into(), "npc.bye".into()], &table);
        let mut second = first.clone();
        second.reload(&table);
        assert_eq!(first.lines(), second.lines());
    }

    #[test]
    fn replace_keys_resolves_new_set() {
        let table = table();
        let mut dialogue = Dialogue::new(vec!["npc.hello".into()], &table);
        dialogue.replace_keys(vec!["npc.bye".into()], &table);
        assert_eq!(dialogue.keys(), ["npc.bye"]);
        assert_eq!(dialogue.lines(), ["Bye!"]);
    }
}
