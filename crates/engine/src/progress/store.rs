use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::objectives::{ObjectiveState, ObjectiveTree, TaskUpdate};
use crate::content::ContentTables;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ItemState {
    seen: bool,
}

/// Which milestones an `is_completed` query asks about. Both set means both
/// must be complete; neither set is never complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionQuery<'a> {
    pub level: Option<&'a str>,
    pub minigame: Option<&'a str>,
}

impl<'a> CompletionQuery<'a> {
    pub fn level(id: &'a str) -> Self {
        Self {
            level: Some(id),
            minigame: None,
        }
    }

    pub fn minigame(id: &'a str) -> Self {
        Self {
            level: None,
            minigame: Some(id),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedEntry {
    pub id: String,
    pub seen: bool,
}

/// Serializable copy of every milestone, in stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSnapshot {
    pub role: Option<String>,
    pub current_level: Option<String>,
    pub completed_levels: Vec<String>,
    pub completed_minigames: Vec<String>,
    pub collected: Vec<CollectedEntry>,
    /// Completed leaf task ids per level.
    pub tasks: BTreeMap<String, Vec<String>>,
}

/// Game-wide milestones. Created once at startup and handed to every screen
/// through the screen context.
///
/// Ids are checked against the content tables; unknown ids are logged and
/// ignored. Every mutator is idempotent and reports whether anything changed.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    content: Rc<ContentTables>,
    role: Option<String>,
    current_level: Option<String>,
    objectives: BTreeMap<String, ObjectiveTree>,
    collected: BTreeMap<String, ItemState>,
    completed_levels: BTreeSet<String>,
    completed_minigames: BTreeSet<String>,
}

impl ProgressStore {
    pub fn new(content: Rc<ContentTables>) -> Self {
        let objectives = fresh_objectives(&content);
        Self {
            content,
            role: None,
            current_level: None,
            objectives,
            collected: BTreeMap::new(),
            completed_levels: BTreeSet::new(),
            completed_minigames: BTreeSet::new(),
        }
    }

    pub fn content(&self) -> &ContentTables {
        &self.content
    }

    /// Clears every milestone. Called at the "new game" boundary only.
    pub fn reset(&mut self) {
        self.role = None;
        self.current_level = None;
        self.objectives = fresh_objectives(&self.content);
        self.collected.clear();
        self.completed_levels.clear();
        self.completed_minigames.clear();
        info!("progress_reset");
    }

    pub fn select_role(&mut self, role: &str) -> bool {
        if self.content.role(role).is_none() {
            warn!(role, "unknown_role_id");
            return false;
        }
        if self.role.as_deref() == Some(role) {
            return false;
        }
        self.role = Some(role.to_string());
        info!(role, "role_selected");
        true
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn set_current_level(&mut self, level: &str) -> bool {
        if self.content.level(level).is_none() {
            warn!(level, "unknown_level_id");
            return false;
        }
        if self.current_level.as_deref() == Some(level) {
            return false;
        }
        self.current_level = Some(level.to_string());
        true
    }

    pub fn current_level(&self) -> Option<&str> {
        self.current_level.as_deref()
    }

    pub fn mark_level_completed(&mut self, level: &str) -> bool {
        if self.content.level(level).is_none() {
            warn!(level, "unknown_level_id");
            return false;
        }
        let inserted = self.completed_levels.insert(level.to_string());
        if inserted {
            info!(level, "level_completed");
        }
        inserted
    }

    pub fn mark_minigame_completed(&mut self, minigame: &str) -> bool {
        if self.content.minigame(minigame).is_none() {
            warn!(minigame, "unknown_minigame_id");
            return false;
        }
        let inserted = self.completed_minigames.insert(minigame.to_string());
        if inserted {
            info!(minigame, "minigame_completed");
        }
        inserted
    }

    pub fn is_completed(&self, query: CompletionQuery<'_>) -> bool {
        match (query.level, query.minigame) {
            (None, None) => false,
            (level, minigame) => {
                level.map_or(true, |id| self.completed_levels.contains(id))
                    && minigame.map_or(true, |id| self.completed_minigames.contains(id))
            }
        }
    }

    pub fn completed_levels(&self) -> impl Iterator<Item = &str> {
        self.completed_levels.iter().map(String::as_str)
    }

    pub fn completed_minigames(&self) -> impl Iterator<Item = &str> {
        self.completed_minigames.iter().map(String::as_str)
    }

    /// Sets a leaf task (a subtask, or an objective without subtasks).
    pub fn set_objective_task(&mut self, level: &str, task: &str, complete: bool) -> bool {
        let Some(tree) = self.objectives.get_mut(level) else {
            warn!(level, task, "unknown_level_id");
            return false;
        };
        match tree.set_leaf(task, complete) {
            TaskUpdate::Changed => {
                debug!(level, task, complete, "objective_task_set");
                true
            }
            TaskUpdate::Unchanged => false,
            TaskUpdate::NotALeaf => {
                warn!(level, task, "objective_parent_not_settable");
                false
            }
            TaskUpdate::UnknownTask => {
                warn!(level, task, "unknown_task_id");
                false
            }
        }
    }

    /// True when `task` names an objective or subtask of `level`.
    pub fn has_task(&self, level: &str, task: &str) -> bool {
        self.objectives
            .get(level)
            .is_some_and(|tree| tree.is_complete(task).is_some())
    }

    pub fn is_task_complete(&self, level: &str, task: &str) -> bool {
        self.objectives
            .get(level)
            .and_then(|tree| tree.is_complete(task))
            .unwrap_or(false)
    }

    pub fn objectives(&self, level: &str) -> &[ObjectiveState] {
        self.objectives
            .get(level)
            .map(ObjectiveTree::objectives)
            .unwrap_or(&[])
    }

    pub fn all_objectives_complete(&self, level: &str) -> bool {
        self.objectives
            .get(level)
            .is_some_and(ObjectiveTree::all_complete)
    }

    pub fn reset_level_tasks(&mut self, level: &str) -> bool {
        let Some(tree) = self.objectives.get_mut(level) else {
            warn!(level, "unknown_level_id");
            return false;
        };
        tree.reset();
        debug!(level, "level_tasks_reset");
        true
    }

    /// Newly collected items stay unseen until the book is opened.
    pub fn add_collected_item(&mut self, item: &str) -> bool {
        if self.content.collectible(item).is_none() {
            warn!(item, "unknown_collectible_id");
            return false;
        }
        if self.collected.contains_key(item) {
            return false;
        }
        self.collected
            .insert(item.to_string(), ItemState { seen: false });
        info!(item, "item_collected");
        true
    }

    pub fn is_collected(&self, item: &str) -> bool {
        self.collected.contains_key(item)
    }

    pub fn is_seen(&self, item: &str) -> bool {
        self.collected.get(item).is_some_and(|state| state.seen)
    }

    pub fn collected_items(&self) -> impl Iterator<Item = &str> {
        self.collected.keys().map(String::as_str)
    }

    /// Returns how many items flipped from unseen to seen.
    pub fn mark_all_seen(&mut self) -> usize {
        let mut flipped = 0usize;
        for state in self.collected.values_mut().filter(|state| !state.seen) {
            state.seen = true;
            flipped += 1;
        }
        if flipped > 0 {
            debug!(count = flipped, "items_marked_seen");
        }
        flipped
    }

    pub fn has_unseen_items(&self) -> bool {
        self.collected.values().any(|state| !state.seen)
    }

    /// Every collectible flagged correct has been collected.
    pub fn all_collected(&self) -> bool {
        self.content
            .collectibles()
            .iter()
            .filter(|item| item.correct)
            .all(|item| self.collected.contains_key(&item.id))
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            role: self.role.clone(),
            current_level: self.current_level.clone(),
            completed_levels: self.completed_levels.iter().cloned().collect(),
            completed_minigames: self.completed_minigames.iter().cloned().collect(),
            collected: self
                .collected
                .iter()
                .map(|(id, state)| CollectedEntry {
                    id: id.clone(),
                    seen: state.seen,
                })
                .collect(),
            tasks: self
                .objectives
                .iter()
                .map(|(level, tree)| (level.clone(), tree.completed_leaf_ids()))
                .filter(|(_, ids)| !ids.is_empty())
                .collect(),
        }
    }

    /// Replaces all state with `snapshot`, dropping ids the content no longer has.
    pub fn restore(&mut self, snapshot: &ProgressSnapshot) {
        self.reset();
        if let Some(role) = &snapshot.role {
            self.select_role(role);
        }
        if let Some(level) = &snapshot.current_level {
            self.set_current_level(level);
        }
        for level in &snapshot.completed_levels {
            self.mark_level_completed(level);
        }
        for minigame in &snapshot.completed_minigames {
            self.mark_minigame_completed(minigame);
        }
        for entry in &snapshot.collected {
            if self.add_collected_item(&entry.id) && entry.seen {
                if let Some(state) = self.collected.get_mut(&entry.id) {
                    state.seen = true;
                }
            }
        }
        for (level, tasks) in &snapshot.tasks {
            for task in tasks {
                self.set_objective_task(level, task, true);
            }
        }
        info!(
            role = self.role.as_deref().unwrap_or("none"),
            completed_levels = self.completed_levels.len(),
            collected = self.collected.len(),
            "progress_restored"
        );
    }
}

fn fresh_objectives(content: &ContentTables) -> BTreeMap<String, ObjectiveTree> {
    content
        .levels()
        .iter()
        .map(|level| (level.id.clone(), ObjectiveTree::from_level(level)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures::sample_tables;

    fn store() -> ProgressStore {
        ProgressStore::new(Rc::new(sample_tables()))
    }

    #[test]
    fn level_completion_is_idempotent() {
        let mut progress = store();
        assert!(progress.mark_level_completed("level1"));
        assert!(!progress.mark_level_completed("level1"));
        assert!(progress.is_completed(CompletionQuery::level("level1")));
        assert_eq!(progress.completed_levels().count(), 1);
    }

    #[test]
    fn unknown_ids_are_ignored() {
        let mut progress = store();
        assert!(!progress.mark_level_completed("level99"));
        assert!(!progress.mark_minigame_completed("nope"));
        assert!(!progress.select_role("wizard"));
        assert!(!progress.add_collected_item("ghost"));
        assert!(!progress.set_objective_task("level99", "contact", true));
        assert!(!progress.set_objective_task("level1", "ghost", true));
        assert_eq!(progress.snapshot(), ProgressSnapshot::default());
    }

    #[test]
    fn completion_query_combinations() {
        let mut progress = store();
        progress.mark_level_completed("level1");
        assert!(!progress.is_completed(CompletionQuery::default()));
        assert!(!progress.is_completed(CompletionQuery {
            level: Some("level1"),
            minigame: Some("task_board"),
        }));
        progress.mark_minigame_completed("task_board");
        assert!(progress.is_completed(CompletionQuery {
            level: Some("level1"),
            minigame: Some("task_board"),
        }));
        assert!(!progress.is_completed(CompletionQuery::level("level2")));
    }

    #[test]
    fn objective_roll_up_through_store() {
        let mut progress = store();
        assert!(progress.set_objective_task("level1", "contact", true));
        assert!(!progress.set_objective_task("level1", "contact", true));
        assert!(!progress.is_task_complete("level1", "find_cv"));
        progress.set_objective_task("level1", "skills", true);
        assert!(progress.is_task_complete("level1", "find_cv"));
        assert!(!progress.set_objective_task("level1", "find_cv", false));
        assert!(progress.is_task_complete("level1", "find_cv"));

        progress.set_objective_task("level1", "submit_cv", true);
        assert!(progress.all_objectives_complete("level1"));
        progress.reset_level_tasks("level1");
        assert!(!progress.is_task_complete("level1", "contact"));
        assert!(!progress.all_objectives_complete("level1"));
    }

    #[test]
    fn has_task_covers_objectives_and_subtasks_only() {
        let progress = store();
        assert!(progress.has_task("level1", "find_cv"));
        assert!(progress.has_task("level1", "contact"));
        assert!(!progress.has_task("level1", "photo"));
        assert!(!progress.has_task("level99", "contact"));
    }

    #[test]
    fn collected_items_start_unseen_until_batch_mark() {
        let mut progress = store();
        assert!(progress.add_collected_item("contact"));
        assert!(!progress.add_collected_item("contact"));
        assert!(progress.has_unseen_items());
        assert!(!progress.is_seen("contact"));

        progress.add_collected_item("photo");
        assert_eq!(progress.mark_all_seen(), 2);
        assert_eq!(progress.mark_all_seen(), 0);
        assert!(!progress.has_unseen_items());
        assert!(progress.is_seen("contact"));
    }

    #[test]
    fn all_collected_counts_only_correct_items() {
        let mut progress = store();
        progress.add_collected_item("contact");
        assert!(!progress.all_collected());
        progress.add_collected_item("skills");
        assert!(progress.all_collected());
    }

    #[test]
    fn role_selection_and_reset() {
        let mut progress = store();
        assert!(progress.select_role("devops"));
        assert!(!progress.select_role("devops"));
        progress.set_current_level("level1");
        progress.add_collected_item("contact");
        progress.mark_minigame_completed("task_board");

        progress.reset();
        assert_eq!(progress.role(), None);
        assert_eq!(progress.current_level(), None);
        assert!(!progress.is_collected("contact"));
        assert!(!progress.is_completed(CompletionQuery::minigame("task_board")));
    }

    #[test]
    fn snapshot_restore_preserves_seen_flags_and_tasks() {
        let mut progress = store();
        progress.select_role("fullstack");
        progress.set_current_level("level1");
        progress.add_collected_item("contact");
        progress.mark_all_seen();
        progress.add_collected_item("skills");
        progress.set_objective_task("level1", "contact", true);
        progress.mark_level_completed("level1");
        let snapshot = progress.snapshot();

        let mut restored = store();
        restored.restore(&snapshot);
        assert_eq!(restored.snapshot(), snapshot);
        assert!(restored.is_seen("contact"));
        assert!(!restored.is_seen("skills"));
        assert!(restored.is_task_complete("level1", "contact"));
    }

    #[test]
    fn restore_drops_ids_missing_from_content() {
        let snapshot = ProgressSnapshot {
            role: Some("retired_role".into()),
            completed_levels: vec!["level1".into(), "level_gone".into()],
            collected: vec![CollectedEntry {
                id: "vanished".into(),
                seen: true,
            }],
            ..ProgressSnapshot::default()
        };
        let mut progress = store();
        progress.restore(&snapshot);
        assert_eq!(progress.role(), None);
        assert_eq!(progress.completed_levels().collect::<Vec<_>>(), vec!["level1"]);
        assert_eq!(progress.collected_items().count(), 0);
    }
}
