use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDef {
    pub id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtaskDef {
    pub id: String,
    pub task: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectiveDef {
    pub id: String,
    pub task: String,
    pub hide_subtasks: bool,
    pub subtasks: Vec<SubtaskDef>,
}

impl ObjectiveDef {
    pub fn is_leaf(&self) -> bool {
        self.subtasks.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDef {
    pub id: String,
    pub title: String,
    pub objectives: Vec<ObjectiveDef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectibleDef {
    pub id: String,
    pub label: String,
    /// Whether picking this item in a puzzle counts as a right answer.
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MinigameDef {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub time_limit_seconds: f32,
    pub failure_damage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerDef {
    pub text: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDef {
    pub text: String,
    pub answers: Vec<AnswerDef>,
}

impl QuestionDef {
    pub fn best_score(&self) -> u32 {
        self.answers
            .iter()
            .map(|answer| answer.score)
            .max()
            .unwrap_or(0)
    }
}

/// What a character says when talked to: lines shown in order, then an
/// optional question the player must answer.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerDef {
    pub id: String,
    pub lines: Vec<String>,
    /// Auto-advance delay per line; `None` waits for input.
    pub line_seconds: Option<f32>,
    pub question: Option<QuestionDef>,
}

/// Static content shared by every screen. Entries keep file order.
#[derive(Debug, Clone, Default)]
pub struct ContentTables {
    roles: Vec<RoleDef>,
    levels: Vec<LevelDef>,
    collectibles: Vec<CollectibleDef>,
    minigames: Vec<MinigameDef>,
    speakers: Vec<SpeakerDef>,
    index: HashMap<(TableKind, String), usize>,
    fingerprint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum TableKind {
    Role,
    Level,
    Collectible,
    Minigame,
    Speaker,
}

impl ContentTables {
    pub(crate) fn from_parts(
        roles: Vec<RoleDef>,
        levels: Vec<LevelDef>,
        collectibles: Vec<CollectibleDef>,
        minigames: Vec<MinigameDef>,
        fingerprint: String,
    ) -> Self {
        let mut index = HashMap::new();
        for (idx, role) in roles.iter().enumerate() {
            index.insert((TableKind::Role, role.id.clone()), idx);
        }
        for (idx, level) in levels.iter().enumerate() {
            index.insert((TableKind::Level, level.id.clone()), idx);
        }
        for (idx, item) in collectibles.iter().enumerate() {
            index.insert((TableKind::Collectible, item.id.clone()), idx);
        }
        for (idx, minigame) in minigames.iter().enumerate() {
            index.insert((TableKind::Minigame, minigame.id.clone()), idx);
        }
        Self {
            roles,
            levels,
            collectibles,
            minigames,
            speakers: Vec::new(),
            index,
            fingerprint,
        }
    }

    pub(crate) fn with_speakers(mut self, speakers: Vec<SpeakerDef>) -> Self {
        for (idx, speaker) in speakers.iter().enumerate() {
            self.index.insert((TableKind::Speaker, speaker.id.clone()), idx);
        }
        self.speakers = speakers;
        self
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn roles(&self) -> &[RoleDef] {
        &self.roles
    }

    pub fn levels(&self) -> &[LevelDef] {
        &self.levels
    }

    pub fn collectibles(&self) -> &[CollectibleDef] {
        &self.collectibles
    }

    pub fn minigames(&self) -> &[MinigameDef] {
        &self.minigames
    }

    pub fn role(&self, id: &str) -> Option<&RoleDef> {
        self.lookup(TableKind::Role, id)
            .and_then(|idx| self.roles.get(idx))
    }

    pub fn level(&self, id: &str) -> Option<&LevelDef> {
        self.lookup(TableKind::Level, id)
            .and_then(|idx| self.levels.get(idx))
    }

    pub fn collectible(&self, id: &str) -> Option<&CollectibleDef> {
        self.lookup(TableKind::Collectible, id)
            .and_then(|idx| self.collectibles.get(idx))
    }

    pub fn minigame(&self, id: &str) -> Option<&MinigameDef> {
        self.lookup(TableKind::Minigame, id)
            .and_then(|idx| self.minigames.get(idx))
    }

    pub fn speakers(&self) -> &[SpeakerDef] {
        &self.speakers
    }

    pub fn speaker(&self, id: &str) -> Option<&SpeakerDef> {
        self.lookup(TableKind::Speaker, id)
            .and_then(|idx| self.speakers.get(idx))
    }

    fn lookup(&self, kind: TableKind, id: &str) -> Option<usize> {
        self.index.get(&(kind, id.to_string())).copied()
    }
}
