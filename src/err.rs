//! Error types.

/// A variant whose `AC`/`AN` arrays do not fit the population roster.
///
/// This indicates malformed upstream data.  Callers are expected to skip the
/// affected gene rather than use a result computed from it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedVariantError {
    #[error("variant #{index} has AC values but no AN values")]
    MissingAn { index: usize },
    #[error("variant #{index} has {ac_len} AC values but {an_len} AN values")]
    LengthMismatch {
        index: usize,
        ac_len: usize,
        an_len: usize,
    },
    #[error("variant #{index} has {len} frequency slots, expected {expected}")]
    SlotCountMismatch {
        index: usize,
        len: usize,
        expected: usize,
    },
}

/// Problems with the population roster configuration.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown population roster: {0:?}")]
    UnknownRoster(String),
    #[error("population names must not be empty")]
    EmptyPopulationName,
    #[error("population {0:?} occurs more than once in roster")]
    DuplicatePopulation(String),
}
