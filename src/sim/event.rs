/// Events emitted during a simulation step.
/// The presentation layer consumes these for animation/sound;
/// the core itself performs no I/O for them.

use crate::domain::entity::Coord;
use crate::domain::tile::AxeColor;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    AxePicked { color: AxeColor },
    ChoppingStarted { at: Coord },
    TreeFelled { at: Coord },
    CoinCollected { at: Coord, total: u32 },
    BonusStarted,
    /// A level was completed by reaching the finish.
    Won,
    /// The bonus countdown ran out.
    TimeUp,
}

impl GameEvent {
    /// Named side-effect for the audio/visual collaborator.
    pub fn effect_name(&self) -> &'static str {
        match self {
            GameEvent::AxePicked { .. } => "pickup",
            GameEvent::ChoppingStarted { .. } => "chopping",
            GameEvent::Won | GameEvent::BonusStarted => "win",
            GameEvent::TreeFelled { .. } => "felled",
            GameEvent::CoinCollected { .. } => "coin",
            GameEvent::TimeUp => "timeup",
        }
    }
}
