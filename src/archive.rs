//! Soft deletion: entities move between a live collection and its archived
//! twin without being altered.

use tracing::debug;

use crate::clock::Clock;
use crate::model::EntityId;
use crate::repository::{Entity, Repository, take_by_id};
use crate::store::Store;

impl<S: Store, C: Clock> Repository<S, C> {
    /// Moves a live entity to the archive unchanged. Unknown id is a no-op.
    pub fn archive<T: Entity>(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.delete::<T>(id) else {
            return false;
        };
        T::archived_mut(&mut self.tables).push(entity);
        self.persist_archived::<T>();
        debug!(kind = T::KIND, id, "archived");
        true
    }

    /// Archives every live entity matching `pred` with one write per collection.
    /// Returns how many moved.
    pub fn archive_where<T: Entity>(&mut self, pred: impl Fn(&T) -> bool) -> usize {
        let live = std::mem::take(T::live_mut(&mut self.tables));
        let (moved, kept): (Vec<T>, Vec<T>) = live.into_iter().partition(|entity| pred(entity));
        *T::live_mut(&mut self.tables) = kept;
        if moved.is_empty() {
            return 0;
        }

        let count = moved.len();
        T::archived_mut(&mut self.tables).extend(moved);
        self.persist_live::<T>();
        self.persist_archived::<T>();
        debug!(kind = T::KIND, count, "archived in bulk");
        count
    }

    /// Moves an archived entity back to the live collection, keeping its identifiers.
    pub fn restore<T: Entity>(&mut self, id: EntityId) -> bool {
        let Some(entity) = take_by_id(T::archived_mut(&mut self.tables), id) else {
            return false;
        };
        self.persist_archived::<T>();
        T::live_mut(&mut self.tables).push(entity);
        self.persist_live::<T>();
        debug!(kind = T::KIND, id, "restored");
        true
    }

    /// Destroys an archived entity for good.
    pub fn purge<T: Entity>(&mut self, id: EntityId) -> Option<T> {
        let entity = take_by_id(T::archived_mut(&mut self.tables), id)?;
        self.persist_archived::<T>();
        debug!(kind = T::KIND, id, "purged from archive");
        Some(entity)
    }
}
