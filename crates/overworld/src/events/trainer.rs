use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::lang::Localizer;

use super::{EventBase, EventContext, EventId, OverworldRequest, TalkingCharacter};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub species: String,
    pub level: u8,
}

/// Roster a trainer fights with. Owned by the trainer and dropped with it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    pub members: Vec<TeamMember>,
}

/// Talking character that challenges the player once a conversation ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trainer {
    talker: TalkingCharacter,
    team: Team,
    defeated_keys: Vec<String>,
    defeated: bool,
    spotted: bool,
    battle_pending: bool,
}

impl Trainer {
    pub fn new(talker: TalkingCharacter, team: Team, defeated_keys: Vec<String>) -> Self {
        Self {
            talker,
            team,
            defeated_keys,
            defeated: false,
            spotted: false,
            battle_pending: false,
        }
    }

    pub fn talker(&self) -> &TalkingCharacter {
        &self.talker
    }

    pub fn team(&self) -> &Team {
        &self.team
    }

    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    pub fn is_battle_pending(&self) -> bool {
        self.battle_pending
    }

    pub(crate) fn action(&mut self, base: &mut EventBase) {
        self.talker.action(base);
    }

    /// Starts the pre-battle conversation. Beaten trainers ignore the player.
    pub(crate) fn spot(&mut self, base: &mut EventBase) -> bool {
        if self.defeated || self.talker.is_conversing() || self.spotted {
            return false;
        }
        self.talker.action(base);
        true
    }

    pub(crate) fn update(&mut self, id: EventId, base: &mut EventBase, ctx: &mut EventContext<'_>) {
        if self.battle_pending {
            self.battle_pending = false;
            info!(trainer = id.0, team = %self.team.name, "battle_declared");
            ctx.frame
                .request(OverworldRequest::DeclareBattle { trainer: id });
        }
        if !self.defeated {
            let conversing = self.talker.is_conversing();
            if conversing && !self.spotted {
                self.spotted = true;
            } else if !conversing && self.spotted {
                self.spotted = false;
                self.battle_pending = true;
            }
        }
        self.talker.update(id, base, ctx);
    }

    pub(crate) fn reload_dialogue(&mut self, localizer: &dyn Localizer) {
        self.talker.dialogue_mut().reload(localizer);
    }

    pub(crate) fn defeat(&mut self, localizer: &dyn Localizer) {
        self.defeated = true;
        self.spotted = false;
        self.battle_pending = false;
        let keys = self.defeated_keys.clone();
        self.talker.dialogue_mut().replace_keys(keys, localizer);
        debug!(team = %self.team.name, "trainer_defeated");
    }
}

/// Trigger-only companion of a trainer covering its line of sight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SightZone {
    trainer: EventId,
}

impl SightZone {
    pub fn new(trainer: EventId) -> Self {
        Self { trainer }
    }

    pub fn trainer(&self) -> EventId {
        self.trainer
    }

    pub(crate) fn action(&self, ctx: &mut EventContext<'_>) {
        ctx.frame.request(OverworldRequest::SpotPlayer {
            trainer: self.trainer,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::test_support::{character_frames, Harness};
    use crate::events::{Character, Dialogue, Event, EventKind, Placement, TriggerKind};
    use crate::frames::FrameCatalog;
    use crate::geometry::{Side, TileCoord};
    use crate::lang::StringTable;

    fn strings() -> StringTable {
        let mut table = StringTable::new("en");
        table.insert("en", "trainer.challenge", "You there! Battle!");
        table.insert("en", "trainer.beaten", "You were too strong.");
        table
    }

    fn trainer_event(table: &StringTable) -> Event {
        let talker = TalkingCharacter::new(
            Character::stationary(),
            Dialogue::new(vec!["trainer.challenge".into()], table),
        );
        let trainer = Trainer::new(
            talker,
            Team {
                name: "bug catcher".into(),
                members: vec![TeamMember {
                    species: "caterpie".into(),
                    level: 4,
                }],
            },
            vec!["trainer.beaten".into()],
        );
        Event::trainer(
            EventId(20),
            character_frames(),
            Placement::new(TileCoord::new(3, 3), TriggerKind::Interact),
            Side::Down,
            trainer,
        )
        .expect("trainer")
    }

    fn count_requests(harness: &Harness, wanted: fn(&OverworldRequest) -> bool) -> usize {
        harness
            .frame
            .pending_requests()
            .iter()
            .filter(|request| wanted(request))
            .count()
    }

    fn is_battle(request: &OverworldRequest) -> bool {
        matches!(request, OverworldRequest::DeclareBattle { .. })
    }

    #[test]
    fn conversation_end_declares_exactly_one_battle() {
        let table = strings();
        let mut harness = Harness::new();
        let mut trainer = trainer_event(&table);

        assert!(trainer.alert());
        trainer.update(&mut harness.ctx());
        assert!(matches!(
            harness.frame.pending_requests(),
            [OverworldRequest::StartDialogue { .. }]
        ));

        trainer.update(&mut harness.ctx());
        assert_eq!(count_requests(&harness, is_battle), 0);
        assert!(trainer.as_trainer().expect("trainer").is_battle_pending());

        trainer.update(&mut harness.ctx());
        assert_eq!(count_requests(&harness, is_battle), 1);
        assert_eq!(
            harness.frame.pending_requests().last(),
            Some(&OverworldRequest::DeclareBattle {
                trainer: EventId(20)
            })
        );

        for _ in 0..30 {
            trainer.update(&mut harness.ctx());
        }
        assert_eq!(count_requests(&harness, is_battle), 1);
    }

    #[test]
    fn defeated_trainer_never_battles_again() {
        let table = strings();
        let mut harness = Harness::new();
        let mut trainer = trainer_event(&table);
        assert!(trainer.defeat(&table));

        assert!(!trainer.alert());
        for _ in 0..3 {
            trainer.action(&mut harness.ctx());
            for _ in 0..5 {
                trainer.update(&mut harness.ctx());
            }
        }
        assert_eq!(count_requests(&harness, is_battle), 0);

        let EventKind::Trainer(inner) = trainer.kind() else {
            panic!("expected trainer");
        };
        assert_eq!(inner.talker().dialogue().lines(), ["You were too strong."]);
        assert_eq!(
            harness.frame.pending_requests().first(),
            Some(&OverworldRequest::StartDialogue {
                source: EventId(20),
                lines: vec!["You were too strong.".to_string()],
            })
        );
    }

    #[test]
    fn defeat_between_conversation_and_battle_cancels_it() {
        let table = strings();
        let mut harness = Harness::new();
        let mut trainer = trainer_event(&table);

        trainer.alert();
        trainer.update(&mut harness.ctx());
        trainer.update(&mut harness.ctx());
        trainer.defeat(&table);
        for _ in 0..5 {
            trainer.update(&mut harness.ctx());
        }
        assert_eq!(count_requests(&harness, is_battle), 0);
    }

    #[test]
    fn sight_zone_signals_its_trainer() {
        let mut harness = Harness::new();
        let catalog = FrameCatalog::default();
        let mut zone = Event::sight_zone(
            EventId(21),
            catalog.neutral(),
            TileCoord::new(3, 4),
            EventId(20),
        )
        .expect("zone");
        assert!(zone.base().passable());
        assert_eq!(zone.base().trigger(), TriggerKind::BeIn);

        zone.action(&mut harness.ctx());
        zone.update(&mut harness.ctx());
        assert_eq!(
            harness.frame.pending_requests(),
            [OverworldRequest::SpotPlayer {
                trainer: EventId(20)
            }]
        );
    }
}
