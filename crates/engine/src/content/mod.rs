mod atomic_io;
mod hashing;
mod loader;
mod tables;

pub use atomic_io::{read_text_if_exists, write_text_atomic};
pub use loader::{
    load_content_dir, parse_content_sources, ContentError, ContentErrorCode, ContentSource,
    SourceLocation,
};
pub use tables::{
    AnswerDef, CollectibleDef, ContentTables, LevelDef, MinigameDef, ObjectiveDef, QuestionDef,
    RoleDef, SpeakerDef, SubtaskDef,
};

#[cfg(test)]
pub(crate) use tables::fixtures;
