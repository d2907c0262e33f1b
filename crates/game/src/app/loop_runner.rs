use std::process::ExitCode;

use overworld::{Overworld, OverworldEvent};
use tracing::{debug, error, info, warn};

use super::bootstrap::AppWiring;
use super::scenario::ScriptStep;

/// Totals of what a scripted run produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RunSummary {
    pub(crate) frames: u64,
    pub(crate) dialogues: u32,
    pub(crate) sounds: u32,
    pub(crate) teleports: u32,
    pub(crate) battles: u32,
}

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        mut overworld,
        script,
    } = app;
    let summary = replay(&mut overworld, &script);
    info!(
        frames = summary.frames,
        dialogues = summary.dialogues,
        sounds = summary.sounds,
        teleports = summary.teleports,
        battles = summary.battles,
        map = overworld.current_map().id(),
        x = overworld.player().tile().x,
        y = overworld.player().tile().y,
        "script_finished"
    );
    ExitCode::SUCCESS
}

/// Feeds the script to the overworld and settles every declared battle as
/// a win for the player.
pub(crate) fn replay(overworld: &mut Overworld, script: &[ScriptStep]) -> RunSummary {
    let mut summary = RunSummary::default();
    for step in script {
        if let Some(language) = &step.language {
            if !overworld.set_language(language) {
                warn!(language = %language, "script_language_unavailable");
            }
        }
        for frame in 0..step.frames {
            overworld.step(step.input_for_frame(frame));
            summary.frames += 1;
            for event in overworld.drain_outbox() {
                record(&mut summary, &event);
            }
            for trainer in overworld.take_pending_battles() {
                if let Err(err) = overworld.defeat_trainer(trainer) {
                    error!(trainer = trainer.0, error = %err, "battle_resolution_failed");
                }
            }
        }
    }
    summary
}

fn record(summary: &mut RunSummary, event: &OverworldEvent) {
    match event {
        OverworldEvent::DialogueStarted { source, lines } => {
            summary.dialogues += 1;
            info!(event = source.0, lines = lines.len(), "dialogue_started");
            for line in lines {
                info!(event = source.0, text = %line, "dialogue_line");
            }
        }
        OverworldEvent::DialogueClosed { source } => {
            debug!(event = source.0, "dialogue_closed");
        }
        OverworldEvent::SoundPlayed { cue } => {
            summary.sounds += 1;
            info!(cue = %cue, "sound_played");
        }
        OverworldEvent::Teleported { map, tile } => {
            summary.teleports += 1;
            info!(map = %map, x = tile.x, y = tile.y, "player_teleported");
        }
        OverworldEvent::BattleDeclared { trainer } => {
            summary.battles += 1;
            info!(trainer = trainer.0, "battle_started");
        }
        OverworldEvent::TrainerDefeated { trainer } => {
            info!(trainer = trainer.0, "battle_won");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::scenario::default_scenario;
    use overworld::{EventId, ItemId, Localizer, OverworldConfig, TileCoord};

    #[test]
    fn default_script_visits_every_event_kind() {
        let scenario = default_scenario().expect("default scenario");
        let mut overworld = scenario
            .build(OverworldConfig::default())
            .expect("overworld");

        let summary = replay(&mut overworld, &scenario.script);

        assert_eq!(summary.teleports, 3, "door, exit teleporter, shop door");
        assert_eq!(summary.sounds, 2);
        assert_eq!(summary.dialogues, 2, "villager and trainer");
        assert_eq!(summary.battles, 1);
        assert_eq!(overworld.current_map().id(), "house");
        assert_eq!(overworld.player().tile(), TileCoord::new(1, 2));
        assert!(overworld.pending_battles().is_empty());
        let trainer = overworld
            .map("town")
            .and_then(|town| town.event(EventId(4)))
            .and_then(|event| event.as_trainer())
            .expect("trainer");
        assert!(trainer.is_defeated());
        assert_eq!(
            overworld
                .player()
                .inventory
                .count(&ItemId::new("item.shop_key")),
            0,
            "the shop door keeps the key"
        );
    }

    #[test]
    fn script_language_switch_is_applied() {
        let scenario = default_scenario().expect("default scenario");
        let mut overworld = scenario
            .build(OverworldConfig::default())
            .expect("overworld");
        let script = [ScriptStep {
            frames: 1,
            language: Some("fr".to_string()),
            ..ScriptStep::default()
        }];
        replay(&mut overworld, &script);
        assert_eq!(overworld.strings().language(), "fr");
    }
}
