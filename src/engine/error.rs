use thiserror::Error;

use crate::engine::card::CardId;

/// Why a proposed opening was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpeningRejection {
    #[error("an opening needs at least one combination")]
    Empty,
    #[error("one or more combinations are invalid")]
    InvalidCombination,
    #[error("an opening must contain at least one suite")]
    MissingSuite,
    #[error("points insufficient: {total} points (required: {required})")]
    InsufficientPoints { total: u32, required: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("player count {count} outside {min}..={max}")]
    PlayerCount { count: usize, min: usize, max: usize },
    #[error("deck of {available} cards cannot deal {needed}")]
    DeckTooSmall { available: usize, needed: usize },
    #[error("at least one deck is required")]
    NoDecks,
    #[error("{count} decks exceeds the limit of {max}")]
    TooManyDecks { count: u16, max: u16 },
    #[error("{count} jokers exceeds the limit of {max}")]
    TooManyJokers { count: u16, max: u16 },
    #[error("unknown variant `{0}`")]
    UnknownVariant(String),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Every way an engine operation can be refused. None of them alter the match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("the match is finished")]
    MatchFinished,
    #[error("unknown player")]
    UnknownPlayer,
    #[error("the dealer must discard directly on the first turn")]
    DiscardOnlyTurn,
    #[error("you already drew this turn")]
    AlreadyDrew,
    #[error("you must draw before playing or discarding")]
    MustDrawFirst,
    #[error("the discard pile is empty")]
    EmptyDiscardPile,
    #[error("you cannot take the discard")]
    DiscardPickupForbidden,
    #[error("no cards left to draw")]
    DeckExhausted,
    #[error("card {0} is not in your hand")]
    CardNotInHand(CardId),
    #[error("one or more combinations are invalid")]
    InvalidCombination,
    #[error("opening rejected: {0}")]
    Opening(#[from] OpeningRejection),
    #[error("you must open first")]
    NotOpened,
    #[error("no combination at table index {0}")]
    CombinationNotFound(usize),
    #[error("you can only add to your own or your teammate's combinations")]
    CombinationNotAccessible,
    #[error("this card cannot be added to this combination")]
    CardDoesNotFit,
    #[error("this card cannot replace the joker")]
    JokerNotReplaceable,
    #[error("joker recovery is not available in this variant")]
    JokerRecoveryDisabled,
    #[error("invalid team assignment: {0}")]
    InvalidTeams(String),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
