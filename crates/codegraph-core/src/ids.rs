use crate::types::NodeLabel;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A node's globally unique, deterministic identifier (§3, §8 property 2).
///
/// Definition nodes (files, folders, symbols) use `label:filePath:name`
/// verbatim so renaming an unrelated file never perturbs another node's id.
/// Derived nodes (`Community`, `Process`) have no natural key, so they use
/// `kind:hash` where `hash` is computed from their defining membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Builds the id for a `File`/`Folder`/symbol node. `name` is empty for
    /// `File`/`Folder` nodes, matching the root `Folder:` convention noted
    /// in §9.
    pub fn for_definition(label: NodeLabel, file_path: &str, name: &str) -> Self {
        NodeId(format!("{}:{}:{}", label.as_str(), file_path, name))
    }

    /// The synthetic repository root, per §9's open-question resolution:
    /// always emit a `Folder:` node with an empty path as the root of every
    /// `CONTAINS` chain.
    pub fn root_folder() -> Self {
        NodeId::for_definition(NodeLabel::Folder, "", "")
    }

    pub fn file(file_path: &str) -> Self {
        NodeId::for_definition(NodeLabel::File, file_path, "")
    }

    pub fn folder(file_path: &str) -> Self {
        NodeId::for_definition(NodeLabel::Folder, file_path, "")
    }

    /// Builds the id for a `Community`/`Process` node from a stable digest
    /// of its membership (§3: `kind:hash`). Callers must feed members in a
    /// deterministic order — sorted node ids — so the digest is stable
    /// across runs.
    pub fn for_derived<'a>(label: NodeLabel, members: impl IntoIterator<Item = &'a NodeId>) -> Self {
        let mut hasher = Sha256::new();
        for member in members {
            hasher.update(member.as_str().as_bytes());
            hasher.update(b"\0");
        }
        let digest = hasher.finalize();
        let hash_hex = hex_prefix(&digest, 16);
        NodeId(format!("{}:{}", label.as_str(), hash_hex))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn hex_prefix(bytes: &[u8], chars: usize) -> String {
    let mut s = String::with_capacity(chars);
    for byte in bytes {
        if s.len() >= chars {
            break;
        }
        s.push_str(&format!("{:02x}", byte));
    }
    s.truncate(chars);
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_id_is_deterministic() {
        let a = NodeId::for_definition(NodeLabel::Function, "src/a.ts", "foo");
        let b = NodeId::for_definition(NodeLabel::Function, "src/a.ts", "foo");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "Function:src/a.ts:foo");
    }

    #[test]
    fn renaming_unrelated_file_does_not_change_id() {
        let before = NodeId::for_definition(NodeLabel::Function, "src/a.ts", "foo");
        // Renaming `b.ts` has no bearing on `a.ts`'s symbol id.
        let after = NodeId::for_definition(NodeLabel::Function, "src/a.ts", "foo");
        assert_eq!(before, after);
    }

    #[test]
    fn root_folder_has_empty_path() {
        assert_eq!(NodeId::root_folder().as_str(), "Folder::");
    }

    #[test]
    fn derived_id_is_order_independent_of_input_type_but_sensitive_to_membership() {
        let m1 = NodeId::for_definition(NodeLabel::Function, "a.ts", "foo");
        let m2 = NodeId::for_definition(NodeLabel::Function, "b.ts", "bar");
        let c1 = NodeId::for_derived(NodeLabel::Community, [&m1, &m2]);
        let c2 = NodeId::for_derived(NodeLabel::Community, [&m1, &m2]);
        assert_eq!(c1, c2);
        let c3 = NodeId::for_derived(NodeLabel::Community, [&m2, &m1]);
        assert_ne!(c1, c3, "membership order is part of the digest; callers must sort first");
    }
}
