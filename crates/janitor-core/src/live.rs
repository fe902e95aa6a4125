//! Live-reference ledger
//!
//! Maps every image reference found in use to the set of consumers that
//! use it (task definitions, Lambda versions, Kubernetes workloads, files).

use crate::error::Result;
use crate::reference::ImageReference;
use crate::set::MembershipSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// Image reference → consumer labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LiveImageTable {
    images: BTreeMap<ImageReference, MembershipSet>,
}

impl LiveImageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `consumer` as a user of `reference`
    ///
    /// Returns `true` when the consumer was not yet recorded for this
    /// reference; callers use it to log first sightings only.
    pub fn add(&mut self, reference: ImageReference, consumer: impl Into<String>) -> bool {
        self.images
            .entry(reference)
            .or_default()
            .insert(consumer.into())
    }

    /// Whether any consumer uses the reference
    pub fn contains(&self, reference: &ImageReference) -> bool {
        self.images
            .get(reference)
            .map(|consumers| !consumers.is_empty())
            .unwrap_or(false)
    }

    pub fn consumers(&self, reference: &ImageReference) -> Option<&MembershipSet> {
        self.images.get(reference)
    }

    /// Merge another table into this one, unioning consumer sets
    pub fn merge(&mut self, other: LiveImageTable) {
        for (reference, consumers) in other.images {
            self.images.entry(reference).or_default().merge(consumers);
        }
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// References in sorted order
    pub fn references(&self) -> impl Iterator<Item = &ImageReference> {
        self.images.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ImageReference, &MembershipSet)> {
        self.images.iter()
    }

    /// Write the references as a sorted, pretty JSON array
    ///
    /// This is the prescan format accepted back by the file loader.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<()> {
        let references: Vec<&ImageReference> = self.references().collect();
        serde_json::to_writer_pretty(&mut writer, &references)?;
        writeln!(writer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut table = LiveImageTable::new();
        assert!(!table.contains(&"foo".into()));

        assert!(table.add("foo".into(), "bar"));
        assert!(table.contains(&"foo".into()));
        assert!(!table.contains(&"bar".into()));

        assert!(table.add("foo".into(), "baz"));
        assert!(!table.add("foo".into(), "baz"));
        assert_eq!(table.consumers(&"foo".into()).unwrap().len(), 2);
    }

    #[test]
    fn test_merge_unions_consumers() {
        let mut table = LiveImageTable::new();
        table.add("foo".into(), "bar");

        let mut other = LiveImageTable::new();
        other.add("foo".into(), "qux");
        other.add("bar".into(), "qux");
        other.add("baz".into(), "qux");
        table.merge(other);

        for r in ["foo", "bar", "baz"] {
            assert!(table.contains(&r.into()), "missing {}", r);
        }
        assert_eq!(
            table.consumers(&"foo".into()).unwrap().sorted(),
            vec!["bar", "qux"]
        );
    }

    #[test]
    fn test_write_json_is_sorted() {
        let mut table = LiveImageTable::new();
        table.add(
            "9876543210987.dkr.ecr.ap-northeast-1.amazonaws.com/foo/bar:fe668fb9".into(),
            "baz",
        );
        table.add(
            "0123456789012.dkr.ecr.ap-northeast-1.amazonaws.com/foo/bar:fe668fb9".into(),
            "baz",
        );

        let mut buf = Vec::new();
        table.write_json(&mut buf).unwrap();
        let restored: Vec<String> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(
            restored,
            vec![
                "0123456789012.dkr.ecr.ap-northeast-1.amazonaws.com/foo/bar:fe668fb9",
                "9876543210987.dkr.ecr.ap-northeast-1.amazonaws.com/foo/bar:fe668fb9",
            ]
        );
    }
}
