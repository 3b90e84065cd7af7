use crate::content::LevelDef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskState {
    pub id: String,
    pub complete: bool,
}

/// One top-level objective and its subtasks. A parent with subtasks is
/// complete exactly when every subtask is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectiveState {
    pub id: String,
    pub complete: bool,
    pub subtasks: Vec<TaskState>,
}

impl ObjectiveState {
    pub fn is_leaf(&self) -> bool {
        self.subtasks.is_empty()
    }

    fn recompute(&mut self) {
        if !self.is_leaf() {
            self.complete = self.subtasks.iter().all(|subtask| subtask.complete);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TaskUpdate {
    Changed,
    Unchanged,
    NotALeaf,
    UnknownTask,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ObjectiveTree {
    objectives: Vec<ObjectiveState>,
}

impl ObjectiveTree {
    pub(crate) fn from_level(level: &LevelDef) -> Self {
        Self {
            objectives: level
                .objectives
                .iter()
                .map(|objective| ObjectiveState {
                    id: objective.id.clone(),
                    complete: false,
                    subtasks: objective
                        .subtasks
                        .iter()
                        .map(|subtask| TaskState {
                            id: subtask.id.clone(),
                            complete: false,
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub(crate) fn objectives(&self) -> &[ObjectiveState] {
        &self.objectives
    }

    pub(crate) fn set_leaf(&mut self, task_id: &str, complete: bool) -> TaskUpdate {
        for objective in &mut self.objectives {
            if objective.id == task_id {
                if !objective.is_leaf() {
                    return TaskUpdate::NotALeaf;
                }
                if objective.complete == complete {
                    return TaskUpdate::Unchanged;
                }
                objective.complete = complete;
                return TaskUpdate::Changed;
            }

            if let Some(subtask) = objective
                .subtasks
                .iter_mut()
                .find(|subtask| subtask.id == task_id)
            {
                if subtask.complete == complete {
                    return TaskUpdate::Unchanged;
                }
                subtask.complete = complete;
                objective.recompute();
                return TaskUpdate::Changed;
            }
        }
        TaskUpdate::UnknownTask
    }

    /// Objective or subtask completion; `None` for unknown ids.
    pub(crate) fn is_complete(&self, task_id: &str) -> Option<bool> {
        self.objectives.iter().find_map(|objective| {
            if objective.id == task_id {
                return Some(objective.complete);
            }
            objective
                .subtasks
                .iter()
                .find(|subtask| subtask.id == task_id)
                .map(|subtask| subtask.complete)
        })
    }

    pub(crate) fn completed_leaf_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        for objective in &self.objectives {
            if objective.is_leaf() {
                if objective.complete {
                    ids.push(objective.id.clone());
                }
                continue;
            }
            ids.extend(
                objective
                    .subtasks
                    .iter()
                    .filter(|subtask| subtask.complete)
                    .map(|subtask| subtask.id.clone()),
            );
        }
        ids
    }

    pub(crate) fn all_complete(&self) -> bool {
        self.objectives.iter().all(|objective| objective.complete)
    }

    pub(crate) fn reset(&mut self) {
        for objective in &mut self.objectives {
            objective.complete = false;
            for subtask in &mut objective.subtasks {
                subtask.complete = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures::sample_tables;

    fn level1_tree() -> ObjectiveTree {
        let tables = sample_tables();
        ObjectiveTree::from_level(tables.level("level1").expect("level1"))
    }

    #[test]
    fn parent_rolls_up_when_all_subtasks_complete() {
        let mut tree = level1_tree();
        assert_eq!(tree.set_leaf("contact", true), TaskUpdate::Changed);
        assert_eq!(tree.is_complete("find_cv"), Some(false));
        assert_eq!(tree.set_leaf("skills", true), TaskUpdate::Changed);
        assert_eq!(tree.is_complete("find_cv"), Some(true));

        assert_eq!(tree.set_leaf("skills", false), TaskUpdate::Changed);
        assert_eq!(tree.is_complete("find_cv"), Some(false));
    }

    #[test]
    fn parent_is_not_settable_and_unknown_ids_are_reported() {
        let mut tree = level1_tree();
        assert_eq!(tree.set_leaf("find_cv", true), TaskUpdate::NotALeaf);
        assert_eq!(tree.set_leaf("nope", true), TaskUpdate::UnknownTask);
        assert_eq!(tree.is_complete("nope"), None);
    }

    #[test]
    fn leaf_objective_is_idempotent_and_reset_clears_everything() {
        let mut tree = level1_tree();
        assert_eq!(tree.set_leaf("submit_cv", true), TaskUpdate::Changed);
        assert_eq!(tree.set_leaf("submit_cv", true), TaskUpdate::Unchanged);
        tree.set_leaf("contact", true);
        assert_eq!(
            tree.completed_leaf_ids(),
            vec!["contact".to_string(), "submit_cv".to_string()]
        );

        tree.reset();
        assert!(tree.completed_leaf_ids().is_empty());
        assert!(!tree.all_complete());
    }
}
