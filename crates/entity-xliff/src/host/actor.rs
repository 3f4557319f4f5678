//! Ambient actor context and scoped privilege elevation.
//!
//! Some lookups (translation sets containing unpublished siblings, host
//! entities of embedded sub-entities) must see content the current actor
//! cannot. [`ElevatedActor`] swaps in a privileged actor and puts the
//! previous one back when dropped, so the swap never outlives the lookup
//! even if it returns early or panics.

use uuid::Uuid;

/// Permission that lets an actor see every entity regardless of status.
pub const BYPASS_ACCESS: &str = "bypass content access";

/// The actor on whose behalf the host evaluates access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    /// Actor ID (Uuid::nil() for anonymous).
    pub id: Uuid,
    pub permissions: Vec<String>,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::nil(),
            permissions: Vec::new(),
        }
    }

    pub fn new(id: Uuid, permissions: Vec<String>) -> Self {
        Self { id, permissions }
    }

    /// The system actor used for elevated lookups.
    pub fn privileged() -> Self {
        Self {
            id: Uuid::from_u128(u128::MAX),
            permissions: vec![BYPASS_ACCESS.to_string()],
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }

    pub fn bypasses_access(&self) -> bool {
        self.has_permission(BYPASS_ACCESS)
    }
}

impl Default for Actor {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Get/set access to the host's current actor.
pub trait ActorContext: Send + Sync {
    fn current_actor(&self) -> Actor;

    fn set_current_actor(&self, actor: Actor);
}

/// Guard holding a privileged actor in place until dropped.
pub struct ElevatedActor<'a> {
    actors: &'a dyn ActorContext,
    previous: Option<Actor>,
}

impl<'a> ElevatedActor<'a> {
    pub fn acquire(actors: &'a dyn ActorContext) -> Self {
        let previous = actors.current_actor();
        actors.set_current_actor(Actor::privileged());
        tracing::trace!(previous = %previous.id, "elevated current actor");
        Self {
            actors,
            previous: Some(previous),
        }
    }
}

impl Drop for ElevatedActor<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            tracing::trace!(restored = %previous.id, "restored current actor");
            self.actors.set_current_actor(previous);
        }
    }
}

/// Run `f` with a privileged actor in place.
pub fn with_elevated_actor<T>(actors: &dyn ActorContext, f: impl FnOnce() -> T) -> T {
    let _guard = ElevatedActor::acquire(actors);
    f()
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;

    struct Slot(Mutex<Actor>);

    impl ActorContext for Slot {
        fn current_actor(&self) -> Actor {
            self.0.lock().clone()
        }

        fn set_current_actor(&self, actor: Actor) {
            *self.0.lock() = actor;
        }
    }

    fn editor() -> Actor {
        Actor::new(Uuid::now_v7(), vec!["translate content".into()])
    }

    #[test]
    fn elevation_is_visible_inside_and_restored_after() {
        let original = editor();
        let slot = Slot(Mutex::new(original.clone()));

        let seen = with_elevated_actor(&slot, || slot.current_actor());
        assert!(seen.bypasses_access());
        assert_eq!(slot.current_actor(), original);
    }

    #[test]
    fn elevation_is_restored_when_the_closure_panics() {
        let original = editor();
        let slot = Slot(Mutex::new(original.clone()));

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            with_elevated_actor::<()>(&slot, || panic!("lookup failed"));
        }));
        assert!(result.is_err());
        assert_eq!(slot.current_actor(), original);
    }

    #[test]
    fn nested_elevation_unwinds_in_order() {
        let original = editor();
        let slot = Slot(Mutex::new(original.clone()));
        {
            let _outer = ElevatedActor::acquire(&slot);
            {
                let _inner = ElevatedActor::acquire(&slot);
                assert!(slot.current_actor().bypasses_access());
            }
            assert!(slot.current_actor().bypasses_access());
        }
        assert_eq!(slot.current_actor(), original);
    }
}
