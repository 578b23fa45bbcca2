//! Object storage: a wrapper around `hecs::World` that keeps the scene roots

use super::components::{Active, Hierarchy, Name, ObjectId, Transform};
use tracing::debug;

/// All objects of a scene.
///
/// Every object is a `hecs` entity carrying [`Transform`], [`Name`],
/// [`Hierarchy`] and [`Active`]; the kind of object is given by the extra
/// components attached to it. Objects without a parent are kept in an
/// ordered root list, which is where the update traversal starts.
pub struct Objects {
    inner: hecs::World,
    roots: Vec<ObjectId>,
}

impl Default for Objects {
    fn default() -> Self {
        Self::new()
    }
}

impl Objects {
    /// Create a new, empty object store
    pub fn new() -> Self {
        Self {
            inner: hecs::World::new(),
            roots: Vec::new(),
        }
    }

    /// Spawn a root object with a default transform
    pub fn spawn(&mut self, name: impl Into<String>) -> ObjectId {
        self.spawn_with_transform(name, Transform::default())
    }

    /// Spawn a root object with the given local transform
    pub fn spawn_with_transform(&mut self, name: impl Into<String>, transform: Transform) -> ObjectId {
        let name = Name::new(name);
        debug!(name = %name.0, "Spawning object");
        let id = self
            .inner
            .spawn((transform, name, Hierarchy::default(), Active(true)));
        self.roots.push(id);
        id
    }

    /// Get a reference to a component on an object
    pub fn get<T: hecs::Component>(
        &self,
        id: ObjectId,
    ) -> Result<hecs::Ref<'_, T>, hecs::ComponentError> {
        self.inner.get::<&T>(id)
    }

    /// Get a mutable reference to a component on an object
    pub fn get_mut<T: hecs::Component>(
        &mut self,
        id: ObjectId,
    ) -> Result<&mut T, hecs::QueryOneError> {
        self.inner.query_one_mut::<&mut T>(id)
    }

    /// Whether the object carries a component of type `T`
    pub fn has<T: hecs::Component>(&self, id: ObjectId) -> bool {
        self.inner
            .entity(id)
            .map(|entity| entity.has::<T>())
            .unwrap_or(false)
    }

    /// Insert a component into an object
    pub fn insert_one(
        &mut self,
        id: ObjectId,
        component: impl hecs::Component,
    ) -> Result<(), hecs::NoSuchEntity> {
        self.inner.insert_one(id, component)
    }

    /// Remove a component from an object
    pub fn remove_one<T: hecs::Component>(&mut self, id: ObjectId) -> Result<T, hecs::ComponentError> {
        self.inner.remove_one::<T>(id)
    }

    /// Query objects with specific components
    pub fn query<Q: hecs::Query>(&self) -> hecs::QueryBorrow<'_, Q> {
        self.inner.query()
    }

    /// Query objects with specific components (mutable)
    pub fn query_mut<Q: hecs::Query>(&mut self) -> hecs::QueryMut<'_, Q> {
        self.inner.query_mut()
    }

    /// Check if an object exists
    pub fn contains(&self, id: ObjectId) -> bool {
        self.inner.contains(id)
    }

    /// Number of live objects
    pub fn len(&self) -> usize {
        self.inner.len() as usize
    }

    /// Whether no object is alive
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Objects without a parent, in insertion order
    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    /// Copy of the local transform
    pub fn transform(&self, id: ObjectId) -> Option<Transform> {
        self.get::<Transform>(id).ok().map(|t| *t)
    }

    /// Mutable access to the local transform
    pub fn transform_mut(&mut self, id: ObjectId) -> Option<&mut Transform> {
        self.get_mut::<Transform>(id).ok()
    }

    /// Name of the object
    pub fn name(&self, id: ObjectId) -> Option<String> {
        self.get::<Name>(id).ok().map(|n| n.0.clone())
    }

    /// Whether the object takes part in the update traversal
    pub fn is_active(&self, id: ObjectId) -> bool {
        self.get::<Active>(id).map(|a| a.0).unwrap_or(false)
    }

    /// Enable or disable an object and its subtree
    pub fn set_active(&mut self, id: ObjectId, active: bool) {
        if let Ok(flag) = self.get_mut::<Active>(id) {
            flag.0 = active;
        }
    }

    /// Parent of an object
    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.get::<Hierarchy>(id).ok().and_then(|h| h.parent)
    }

    /// Children of an object in insertion order
    pub fn children(&self, id: ObjectId) -> Vec<ObjectId> {
        self.get::<Hierarchy>(id)
            .map(|h| h.children.clone())
            .unwrap_or_default()
    }

    /// Despawn a single object, unlinking it from its parent and the root list.
    ///
    /// Children are left in place as new roots. Solver resources are not
    /// touched, so callers outside the crate go through
    /// [`Scene::destroy`](crate::core::scene::Scene::destroy) instead.
    pub(crate) fn despawn(&mut self, id: ObjectId) -> Result<(), hecs::NoSuchEntity> {
        if !self.contains(id) {
            return Err(hecs::NoSuchEntity);
        }
        self.set_parent(id, None);
        self.roots.retain(|root| *root != id);
        for child in self.children(id) {
            self.set_parent(child, None);
        }
        self.inner.despawn(id)
    }

    pub(crate) fn roots_mut(&mut self) -> &mut Vec<ObjectId> {
        &mut self.roots
    }

    /// Get access to the inner hecs::World for advanced operations
    pub fn inner(&self) -> &hecs::World {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_spawn_adds_required_components() {
        let mut objects = Objects::new();
        let id = objects.spawn("cube");

        assert!(objects.has::<Transform>(id));
        assert!(objects.has::<Hierarchy>(id));
        assert!(objects.is_active(id));
        assert_eq!(objects.name(id).as_deref(), Some("cube"));
        assert_eq!(objects.roots(), &[id]);
    }

    #[test]
    fn test_transform_access() {
        let mut objects = Objects::new();
        let id = objects.spawn_with_transform("a", Transform::from_position(Vec3::X));
        objects.transform_mut(id).unwrap().position.y = 2.0;
        assert_eq!(objects.transform(id).unwrap().position, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_despawn_promotes_children_to_roots() {
        let mut objects = Objects::new();
        let parent = objects.spawn("parent");
        let child = objects.spawn("child");
        objects.set_parent(child, Some(parent));

        objects.despawn(parent).unwrap();

        assert!(!objects.contains(parent));
        assert_eq!(objects.parent(child), None);
        assert_eq!(objects.roots(), &[child]);
        assert!(objects.despawn(parent).is_err());
    }
}
