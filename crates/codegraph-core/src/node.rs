use crate::ids::NodeId;
use crate::types::{NodeLabel, Span};
use serde::{Deserialize, Serialize};

/// Attributes for a `File` node (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAttrs {
    pub name: String,
    pub file_path: String,
    pub content: String,
}

/// Attributes for a `Folder` node (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderAttrs {
    pub name: String,
    pub file_path: String,
}

/// Attributes shared by every symbol node: `Function`, `Class`, `Method`,
/// `Interface`, `CodeElement`, and every language-specific kind (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolAttrs {
    pub name: String,
    pub file_path: String,
    pub span: Span,
    pub is_exported: Option<bool>,
    pub content: String,
}

/// Attributes for a `Community` node (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommunityAttrs {
    pub label: String,
    pub keywords: Vec<String>,
    pub cohesion: f32,
    pub symbol_count: usize,
}

/// Attributes for a `Process` node (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessAttrs {
    pub label: String,
    pub process_type: String,
    pub step_count: usize,
    pub community_ids: Vec<NodeId>,
    pub entry_point_id: NodeId,
    pub terminal_id: NodeId,
}

/// The per-label payload carried by a [`Node`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NodePayload {
    File(FileAttrs),
    Folder(FolderAttrs),
    Symbol(SymbolAttrs),
    Community(CommunityAttrs),
    Process(ProcessAttrs),
}

/// A graph node: a stable id, the label that determines its table/schema,
/// and the attribute payload matching that label (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: NodeLabel,
    pub payload: NodePayload,
}

impl Node {
    pub fn file(file_path: &str, content: String) -> Self {
        let name = file_path.rsplit('/').next().unwrap_or(file_path).to_string();
        Node {
            id: NodeId::file(file_path),
            label: NodeLabel::File,
            payload: NodePayload::File(FileAttrs {
                name,
                file_path: file_path.to_string(),
                content,
            }),
        }
    }

    pub fn folder(file_path: &str) -> Self {
        let name = if file_path.is_empty() {
            String::new()
        } else {
            file_path.rsplit('/').next().unwrap_or(file_path).to_string()
        };
        Node {
            id: NodeId::folder(file_path),
            label: NodeLabel::Folder,
            payload: NodePayload::Folder(FolderAttrs {
                name,
                file_path: file_path.to_string(),
            }),
        }
    }

    pub fn symbol(label: NodeLabel, file_path: &str, name: &str, attrs: SymbolAttrs) -> Self {
        debug_assert!(label.is_symbol());
        Node {
            id: NodeId::for_definition(label, file_path, name),
            label,
            payload: NodePayload::Symbol(attrs),
        }
    }

    pub fn community(id: NodeId, attrs: CommunityAttrs) -> Self {
        Node {
            id,
            label: NodeLabel::Community,
            payload: NodePayload::Community(attrs),
        }
    }

    pub fn process(id: NodeId, attrs: ProcessAttrs) -> Self {
        Node {
            id,
            label: NodeLabel::Process,
            payload: NodePayload::Process(attrs),
        }
    }

    /// The node's own `filePath`, where the label carries one. `Community`
    /// and `Process` nodes have none.
    pub fn file_path(&self) -> Option<&str> {
        match &self.payload {
            NodePayload::File(a) => Some(&a.file_path),
            NodePayload::Folder(a) => Some(&a.file_path),
            NodePayload::Symbol(a) => Some(&a.file_path),
            NodePayload::Community(_) | NodePayload::Process(_) => None,
        }
    }
}
