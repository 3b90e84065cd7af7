use tracing::debug;

use super::geometry::Vec2;

pub const DEFAULT_INTERACTION_RADIUS: f32 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargeterConfig {
    /// Inclusive: a candidate exactly `radius` away is in range.
    pub radius: f32,
}

impl Default for TargeterConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_INTERACTION_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InteractableId(pub u32);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractableKind {
    Collectible { item: String },
    DialogTrigger { dialog: String },
    PuzzleTrigger { puzzle: String },
    MinigameTrigger { minigame: String },
    Npc { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interactable {
    pub id: InteractableId,
    pub position: Vec2,
    pub kind: InteractableKind,
}

/// Candidate set for one room. Iteration order is registration order.
#[derive(Debug, Default)]
pub struct InteractableSet {
    entries: Vec<Interactable>,
    next_id: u32,
}

impl InteractableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, position: Vec2, kind: InteractableKind) -> InteractableId {
        let id = InteractableId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.entries.push(Interactable { id, position, kind });
        id
    }

    pub fn remove(&mut self, id: InteractableId) -> Option<Interactable> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index))
    }

    pub fn get(&self, id: InteractableId) -> Option<&Interactable> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn set_position(&mut self, id: InteractableId, position: Vec2) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.position = position;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Interactable> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetChange {
    Changed { id: InteractableId, anchor: Vec2 },
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveTarget {
    id: InteractableId,
    anchor: Vec2,
}

/// Tracks the single interactable the player may trigger this tick.
#[derive(Debug)]
pub struct InteractionTargeter {
    config: TargeterConfig,
    enabled: bool,
    active: Option<ActiveTarget>,
}

impl InteractionTargeter {
    pub fn new(config: TargeterConfig) -> Self {
        Self {
            config,
            enabled: true,
            active: None,
        }
    }

    pub fn config(&self) -> &TargeterConfig {
        &self.config
    }

    /// Disabling drops the current target at once and reports the clear.
    pub fn set_enabled(&mut self, enabled: bool) -> Option<TargetChange> {
        self.enabled = enabled;
        if enabled || self.active.take().is_none() {
            return None;
        }
        debug!("interaction_target_cleared");
        Some(TargetChange::Cleared)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn active_target(&self) -> Option<InteractableId> {
        self.active.map(|active| active.id)
    }

    pub fn active_anchor(&self) -> Option<Vec2> {
        self.active.map(|active| active.anchor)
    }

    /// Recomputes the target. Returns a change only when the target or its
    /// anchor differs from the previous call.
    pub fn update(
        &mut self,
        player_position: Vec2,
        candidates: &InteractableSet,
    ) -> Option<TargetChange> {
        let next = if self.enabled {
            nearest_within(player_position, candidates, self.config.radius)
        } else {
            None
        };
        if next == self.active {
            return None;
        }
        self.active = next;
        match next {
            Some(active) => {
                debug!(
                    target = active.id.0,
                    anchor_x = active.anchor.x,
                    anchor_y = active.anchor.y,
                    "interaction_target_changed"
                );
                Some(TargetChange::Changed {
                    id: active.id,
                    anchor: active.anchor,
                })
            }
            None => {
                debug!("interaction_target_cleared");
                Some(TargetChange::Cleared)
            }
        }
    }
}

impl Default for InteractionTargeter {
    fn default() -> Self {
        Self::new(TargeterConfig::default())
    }
}

fn nearest_within(origin: Vec2, candidates: &InteractableSet, radius: f32) -> Option<ActiveTarget> {
    let mut best: Option<(f32, &Interactable)> = None;
    for candidate in candidates.iter() {
        let distance = origin.distance(candidate.position);
        // Strict comparison keeps the first-registered candidate on exact ties.
        if best.map_or(true, |(best_distance, _)| distance < best_distance) {
            best = Some((distance, candidate));
        }
    }
    let (distance, candidate) = best?;
    (distance <= radius).then_some(ActiveTarget {
        id: candidate.id,
        anchor: candidate.position,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collectible(item: &str) -> InteractableKind {
        InteractableKind::Collectible {
            item: item.to_string(),
        }
    }

    #[test]
    fn nearest_in_range_wins_and_out_of_range_clears() {
        let mut set = InteractableSet::new();
        let far = set.register(Vec2::new(45.0, 0.0), collectible("far"));
        let near = set.register(Vec2::new(0.0, 30.0), collectible("near"));
        let mut targeter = InteractionTargeter::new(TargeterConfig { radius: 50.0 });

        let change = targeter.update(Vec2::ZERO, &set);
        assert_eq!(
            change,
            Some(TargetChange::Changed {
                id: near,
                anchor: Vec2::new(0.0, 30.0)
            })
        );
        assert_eq!(targeter.active_target(), Some(near));
        assert_ne!(targeter.active_target(), Some(far));

        let change = targeter.update(Vec2::new(-200.0, -200.0), &set);
        assert_eq!(change, Some(TargetChange::Cleared));
        assert_eq!(targeter.active_target(), None);
    }

    #[test]
    fn unchanged_target_reports_no_change() {
        let mut set = InteractableSet::new();
        set.register(Vec2::new(10.0, 0.0), collectible("a"));
        let mut targeter = InteractionTargeter::default();

        assert!(targeter.update(Vec2::ZERO, &set).is_some());
        assert_eq!(targeter.update(Vec2::new(1.0, 0.0), &set), None);
        assert_eq!(targeter.update(Vec2::ZERO, &set), None);
    }

    #[test]
    fn moved_anchor_is_reported_as_change() {
        let mut set = InteractableSet::new();
        let npc = set.register(
            Vec2::new(10.0, 0.0),
            InteractableKind::Npc {
                name: "recruiter".to_string(),
            },
        );
        let mut targeter = InteractionTargeter::default();
        targeter.update(Vec2::ZERO, &set);

        set.set_position(npc, Vec2::new(12.0, 0.0));
        assert_eq!(
            targeter.update(Vec2::ZERO, &set),
            Some(TargetChange::Changed {
                id: npc,
                anchor: Vec2::new(12.0, 0.0)
            })
        );
    }

    #[test]
    fn exact_tie_goes_to_first_registered() {
        let mut set = InteractableSet::new();
        let first = set.register(Vec2::new(20.0, 0.0), collectible("first"));
        set.register(Vec2::new(-20.0, 0.0), collectible("second"));
        let mut targeter = InteractionTargeter::default();
        targeter.update(Vec2::ZERO, &set);
        assert_eq!(targeter.active_target(), Some(first));
    }

    #[test]
    fn radius_boundary_is_inclusive() {
        let mut set = InteractableSet::new();
        let edge = set.register(Vec2::new(DEFAULT_INTERACTION_RADIUS, 0.0), collectible("edge"));
        let mut targeter = InteractionTargeter::default();
        targeter.update(Vec2::ZERO, &set);
        assert_eq!(targeter.active_target(), Some(edge));
    }

    #[test]
    fn disabled_targeter_clears_and_empty_set_yields_nothing() {
        let mut set = InteractableSet::new();
        let mut targeter = InteractionTargeter::default();
        assert_eq!(targeter.update(Vec2::ZERO, &set), None);

        set.register(Vec2::new(5.0, 5.0), collectible("a"));
        targeter.update(Vec2::ZERO, &set);
        targeter.set_enabled(false);
        assert_eq!(targeter.active_target(), None);
        assert_eq!(targeter.update(Vec2::ZERO, &set), None);
    }

    #[test]
    fn disabling_clears_the_target_immediately() {
        let mut set = InteractableSet::new();
        let near = set.register(Vec2::new(5.0, 0.0), collectible("near"));
        let mut targeter = InteractionTargeter::default();
        targeter.update(Vec2::ZERO, &set);
        assert_eq!(targeter.active_target(), Some(near));

        assert_eq!(targeter.set_enabled(false), Some(TargetChange::Cleared));
        assert_eq!(targeter.active_target(), None);
        assert_eq!(targeter.set_enabled(false), None);

        assert_eq!(targeter.set_enabled(true), None);
        assert!(matches!(
            targeter.update(Vec2::ZERO, &set),
            Some(TargetChange::Changed { id, .. }) if id == near
        ));
    }

    #[test]
    fn removed_candidate_drops_out_next_update() {
        let mut set = InteractableSet::new();
        let near = set.register(Vec2::new(5.0, 0.0), collectible("near"));
        let other = set.register(Vec2::new(20.0, 0.0), collectible("other"));
        let mut targeter = InteractionTargeter::default();
        targeter.update(Vec2::ZERO, &set);

        assert!(set.remove(near).is_some());
        assert!(set.get(near).is_none());
        targeter.update(Vec2::ZERO, &set);
        assert_eq!(targeter.active_target(), Some(other));
    }

    #[test]
    fn ids_follow_registration_order() {
        let mut set = InteractableSet::new();
        let a = set.register(Vec2::ZERO, collectible("a"));
        let b = set.register(Vec2::ZERO, collectible("b"));
        set.remove(a);
        let c = set.register(Vec2::ZERO, collectible("c"));
        assert!(a < b && b < c);
        assert_eq!(set.len(), 2);
    }
}
