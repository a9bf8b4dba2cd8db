use snafu::Snafu;

#[derive(Snafu, Debug, PartialEq)]
pub enum FlashcardError {
    InvalidIntervals,
    InvalidThresholds,
    InvalidPolicy,
    #[snafu(display("unknown study mode: {name}"))]
    UnknownMode {
        name: String,
    },
    SessionEnded,
    NoCurrentCard,
}

pub type Result<T, E = FlashcardError> = std::result::Result<T, E>;
