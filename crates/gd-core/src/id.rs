use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Local identifier of a node, minted by its `GraphModel` in creation order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) u32);

/// Local identifier of a relationship, minted by its `GraphModel` in creation order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelationshipId(pub(crate) u32);

impl NodeId {
    /// Raw creation sequence number.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl RelationshipId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Debug for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl fmt::Display for RelationshipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Global string interner for store-assigned ids. They repeat across
/// reloads of the same remote graph, so interning keeps them 4 bytes and Copy.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Identity assigned by a remote graph store (or carried in loaded graph data).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(Spur);

impl StoreId {
    /// Intern a store id, or return the existing handle.
    pub fn intern(s: &str) -> Self {
        StoreId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }
}

impl fmt::Debug for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StoreId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StoreId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(StoreId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_id_interning_roundtrip() {
        let a = StoreId::intern("4:abc:17");
        let b = StoreId::intern("4:abc:17");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "4:abc:17");
    }

    #[test]
    fn local_ids_order_by_creation() {
        assert!(NodeId(1) < NodeId(2));
        assert_eq!(RelationshipId(7).to_string(), "r7");
        assert_eq!(format!("{:?}", NodeId(3)), "n3");
    }
}
