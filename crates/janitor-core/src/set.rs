//! Minimal membership set

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::Hash;

/// Hash set whose insert reports whether the member was new
///
/// Several scanners log only on first sighting, so [`MembershipSet::insert`]
/// returns `true` exactly once per member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipSet<T: Eq + Hash = String> {
    members: HashSet<T>,
}

impl<T: Eq + Hash> Default for MembershipSet<T> {
    fn default() -> Self {
        Self {
            members: HashSet::new(),
        }
    }
}

impl<T: Eq + Hash> MembershipSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member, returning `true` if it was not present before
    pub fn insert(&mut self, member: T) -> bool {
        self.members.insert(member)
    }

    pub fn contains<Q>(&self, member: &Q) -> bool
    where
        T: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.members.contains(member)
    }

    pub fn remove<Q>(&mut self, member: &Q) -> bool
    where
        T: std::borrow::Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.members.remove(member)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.members.iter()
    }

    /// Add every member of `other`, returning how many were new
    pub fn merge(&mut self, other: MembershipSet<T>) -> usize {
        let mut added = 0;
        for member in other.members {
            if self.members.insert(member) {
                added += 1;
            }
        }
        added
    }
}

impl<T: Eq + Hash + Clone> MembershipSet<T> {
    /// New set holding the members of both sets
    pub fn union(&self, other: &MembershipSet<T>) -> MembershipSet<T> {
        self.members.union(&other.members).cloned().collect()
    }
}

impl<T: Eq + Hash + Ord + Clone> MembershipSet<T> {
    /// Members in sorted order
    pub fn sorted(&self) -> Vec<T> {
        let mut members: Vec<T> = self.members.iter().cloned().collect();
        members.sort();
        members
    }
}

impl<T: Eq + Hash> FromIterator<T> for MembershipSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            members: iter.into_iter().collect(),
        }
    }
}

impl<T: Eq + Hash> Extend<T> for MembershipSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.members.extend(iter);
    }
}

impl<T: Eq + Hash> IntoIterator for MembershipSet<T> {
    type Item = T;
    type IntoIter = std::collections::hash_set::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}
