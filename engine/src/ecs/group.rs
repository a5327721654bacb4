//! Cached, incrementally maintained matcher results.
//!
//! A [`Group`] tracks which entities currently satisfy one [`Matcher`]. The
//! full match is computed eagerly once at construction; afterwards the world
//! re-evaluates only the touched entity on every mutation, so the cache never
//! recomputes the full match again.
//!
//! Membership changes are published on bounded add/remove channels with
//! non-blocking sends: a slow or absent listener misses the notification
//! rather than stalling entity mutation. [`entities()`](Group::entities) is
//! the ground truth; the channels are a wake-up hint, not a reliable log.

use crossbeam::channel::{Receiver, Sender, bounded};

use crate::ecs::component::ComponentStorage;
use crate::ecs::entity::Entity;
use crate::ecs::matcher::Matcher;
use crate::ecs::sparse::EntitySet;

/// Default bound for the add/remove notification channels.
pub const NOTIFY_CAPACITY: usize = 64;

/// A cached result set of the entities satisfying one matcher, with change
/// notifications.
#[derive(Debug)]
pub struct Group {
    matcher: Matcher,
    /// Entities currently matching, maintained incrementally.
    result: EntitySet,
    added_tx: Sender<Entity>,
    added_rx: Receiver<Entity>,
    removed_tx: Sender<Entity>,
    removed_rx: Receiver<Entity>,
}

impl Group {
    /// Build a group by eagerly evaluating the full match against the current
    /// storage. `notify_capacity` bounds each notification channel.
    pub(crate) fn new(
        matcher: Matcher,
        storage: &ComponentStorage,
        notify_capacity: usize,
    ) -> Self {
        let result = matcher.matches(storage);
        let (added_tx, added_rx) = bounded(notify_capacity);
        let (removed_tx, removed_rx) = bounded(notify_capacity);
        Self {
            matcher,
            result,
            added_tx,
            added_rx,
            removed_tx,
            removed_rx,
        }
    }

    /// The matcher this group maintains.
    #[inline]
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Snapshot of the currently matching entity ids. No recomputation; the
    /// order is arbitrary.
    pub fn entities(&self) -> Vec<Entity> {
        self.result.iter().map(|(id, _)| id).collect()
    }

    /// Whether the entity is currently in the cached result.
    #[inline]
    pub fn contains(&self, entity: Entity) -> bool {
        self.result.contains(entity)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.result.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.result.is_empty()
    }

    /// A receiver for entities that newly satisfied the matcher. Delivery is
    /// lossy: events sent while the channel is full are dropped.
    pub fn added(&self) -> Receiver<Entity> {
        self.added_rx.clone()
    }

    /// A receiver for entities that stopped satisfying the matcher. Same
    /// lossy delivery as [`added`](Self::added).
    pub fn removed(&self) -> Receiver<Entity> {
        self.removed_rx.clone()
    }

    /// Re-evaluate one mutated entity against the matcher and reconcile the
    /// cached result, emitting at most one notification:
    ///
    /// - entity no longer live and previously cached: removed
    /// - newly matching and not cached: added
    /// - no longer matching and cached: removed
    /// - unchanged: silence
    pub(crate) fn evaluate(&mut self, entity: Entity, storage: &ComponentStorage) {
        if !storage.is_live(entity) {
            if self.result.remove(entity) {
                let _ = self.removed_tx.try_send(entity);
            }
            return;
        }

        let matching = self.matcher.matches_entity(storage, entity);
        let cached = self.result.contains(entity);
        if matching && !cached {
            self.result.insert_id(entity);
            let _ = self.added_tx.try_send(entity);
        } else if !matching && cached {
            self.result.remove(entity);
            let _ = self.removed_tx.try_send(entity);
        }
    }
}
