//! Parent/child links and global transform queries
//!
//! Global values are recomputed on demand by walking the parent chain; there
//! is no cached world matrix to go stale. Position and rotation compose
//! additively, scale multiplicatively.

use super::components::{Hierarchy, Name, ObjectId, Transform};
use super::objects::Objects;
use crate::math::compose_transform;
use glam::{Mat4, Vec3};
use tracing::{trace, warn};

impl Objects {
    /// Re-parent `child` under `parent`, or make it a root when `parent` is `None`.
    ///
    /// The child is removed from its previous parent's children (or from the
    /// root list) before being attached. Parenting an object under itself or
    /// one of its descendants is refused.
    pub fn set_parent(&mut self, child: ObjectId, parent: Option<ObjectId>) {
        if !self.contains(child) {
            warn!(child = ?child, "set_parent on unknown object");
            return;
        }

        if let Some(parent) = parent {
            if !self.contains(parent) {
                warn!(child = ?child, parent = ?parent, "set_parent to unknown parent");
                return;
            }
            if parent == child || self.is_ancestor_of(child, parent) {
                warn!(child = ?child, parent = ?parent, "Refusing to create a parent cycle");
                return;
            }
        }

        let previous = self.parent(child);
        if previous == parent && (parent.is_some() || self.roots().contains(&child)) {
            return;
        }

        // Detach from the old parent or from the root list
        match previous {
            Some(old) => {
                if let Ok(hierarchy) = self.get_mut::<Hierarchy>(old) {
                    hierarchy.children.retain(|c| *c != child);
                }
            }
            None => self.roots_mut().retain(|r| *r != child),
        }

        match parent {
            Some(new_parent) => {
                if let Ok(hierarchy) = self.get_mut::<Hierarchy>(new_parent) {
                    if !hierarchy.children.contains(&child) {
                        hierarchy.children.push(child);
                    }
                }
            }
            None => {
                if !self.roots().contains(&child) {
                    self.roots_mut().push(child);
                }
            }
        }

        if let Ok(hierarchy) = self.get_mut::<Hierarchy>(child) {
            hierarchy.parent = parent;
        }
        trace!(child = ?child, parent = ?parent, "Re-parented object");
    }

    /// Whether `ancestor` appears on the parent chain of `id`
    pub fn is_ancestor_of(&self, ancestor: ObjectId, id: ObjectId) -> bool {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Sum of local positions along the parent chain
    pub fn global_position(&self, id: ObjectId) -> Vec3 {
        self.fold_chain(id, Vec3::ZERO, |acc, t| acc + t.position)
    }

    /// Sum of local Euler rotations along the parent chain, in degrees
    pub fn global_rotation(&self, id: ObjectId) -> Vec3 {
        self.fold_chain(id, Vec3::ZERO, |acc, t| acc + t.rotation)
    }

    /// Component-wise product of local scales along the parent chain
    pub fn global_scale(&self, id: ObjectId) -> Vec3 {
        self.fold_chain(id, Vec3::ONE, |acc, t| acc * t.scale)
    }

    /// `T * R * S` from the global position, rotation and scale
    pub fn global_transform(&self, id: ObjectId) -> Mat4 {
        compose_transform(
            self.global_position(id),
            self.global_rotation(id),
            self.global_scale(id),
        )
    }

    /// Depth-first list of `id` and everything below it, parents first
    pub fn descendants(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            let children = self.children(current);
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// First object with the given name, searching roots depth-first
    pub fn find_by_name(&self, name: &str) -> Option<ObjectId> {
        self.roots()
            .iter()
            .flat_map(|root| self.descendants(*root))
            .find(|id| {
                self.get::<Name>(*id)
                    .map(|n| n.0 == name)
                    .unwrap_or(false)
            })
    }

    /// Nearest relative carrying a `T`: the parent, then siblings, then children.
    ///
    /// A root object's siblings are the other roots.
    pub fn find_in_family<T: hecs::Component>(&self, id: ObjectId) -> Option<ObjectId> {
        let parent = self.parent(id);
        if let Some(p) = parent {
            if self.has::<T>(p) {
                return Some(p);
            }
        }

        let siblings = match parent {
            Some(p) => self.children(p),
            None => self.roots().to_vec(),
        };
        if let Some(sibling) = siblings
            .into_iter()
            .find(|s| *s != id && self.has::<T>(*s))
        {
            return Some(sibling);
        }

        self.children(id).into_iter().find(|c| self.has::<T>(*c))
    }

    fn fold_chain<A>(&self, id: ObjectId, init: A, f: impl Fn(A, &Transform) -> A) -> A {
        let mut acc = init;
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(transform) = self.transform(node) {
                acc = f(acc, &transform);
            }
            current = self.parent(node);
        }
        acc
    }
}
