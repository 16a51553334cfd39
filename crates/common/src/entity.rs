use serde::{Deserialize, Serialize};
use std::fmt;

const FABRIC_SCHEME: &str = "fabric:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    Application,
    Service,
    Node,
    Machine,
    Disk,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Service => "service",
            Self::Node => "node",
            Self::Machine => "machine",
            Self::Disk => "disk",
        }
    }

    fn is_hierarchical(&self) -> bool {
        matches!(self, Self::Application | Self::Service)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a health report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub identifier: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
        }
    }

    pub fn application(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Application, name)
    }

    pub fn service(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Service, name)
    }

    pub fn node(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Node, name)
    }

    pub fn machine(name: impl Into<String>) -> Self {
        Self::new(EntityKind::Machine, name)
    }

    pub fn disk(path: impl Into<String>) -> Self {
        Self::new(EntityKind::Disk, path)
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.identifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    Empty,
    NotHierarchical(String),
    IllegalCharacter(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidEntityError {
    pub kind: EntityKind,
    pub identifier: String,
    pub reason: InvalidReason,
}

impl fmt::Display for InvalidEntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            InvalidReason::Empty => write!(f, "invalid {} entity: identifier is empty", self.kind),
            InvalidReason::NotHierarchical(msg) => write!(
                f,
                "invalid {} entity '{}': {msg}",
                self.kind, self.identifier
            ),
            InvalidReason::IllegalCharacter(c) => write!(
                f,
                "invalid {} entity '{}': illegal character {c:?}",
                self.kind, self.identifier
            ),
        }
    }
}

impl std::error::Error for InvalidEntityError {}

/// Canonical form of an entity reference. Two references that address the
/// same target normalize to equal values.
pub fn normalize(entity: &EntityRef) -> Result<EntityRef, InvalidEntityError> {
    let fail = |reason| InvalidEntityError {
        kind: entity.kind,
        identifier: entity.identifier.clone(),
        reason,
    };

    let trimmed = entity.identifier.trim();
    if trimmed.is_empty() {
        return Err(fail(InvalidReason::Empty));
    }

    let identifier = match entity.kind {
        k if k.is_hierarchical() => {
            normalize_hierarchical(trimmed).map_err(|msg| fail(InvalidReason::NotHierarchical(msg)))?
        }
        EntityKind::Node | EntityKind::Machine => {
            if let Some(c) = trimmed.chars().find(|c| matches!(c, '/' | '\\')) {
                return Err(fail(InvalidReason::IllegalCharacter(c)));
            }
            trimmed.to_string()
        }
        _ => normalize_disk_path(trimmed),
    };

    Ok(EntityRef {
        kind: entity.kind,
        identifier,
    })
}

fn normalize_hierarchical(raw: &str) -> Result<String, String> {
    let path = raw.strip_prefix(FABRIC_SCHEME).unwrap_or(raw);
    if !path.starts_with('/') {
        return Err("name must start with '/' after the optional fabric: scheme".into());
    }

    let body = path.trim_end_matches('/');
    if body.is_empty() {
        return Err("name has no segments".into());
    }

    let segments: Vec<&str> = body[1..].split('/').collect();
    for segment in &segments {
        if segment.is_empty() {
            return Err("name contains an empty segment".into());
        }
        if segment.chars().any(char::is_whitespace) {
            return Err(format!("segment '{segment}' contains whitespace"));
        }
    }

    Ok(format!("{FABRIC_SCHEME}/{}", segments.join("/")))
}

fn normalize_disk_path(raw: &str) -> String {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        let rest = raw[2..].trim_end_matches(['\\', '/']);
        let drive = (bytes[0] as char).to_ascii_uppercase();
        return format!("{drive}:{rest}");
    }

    let stripped = raw.trim_end_matches(['\\', '/']);
    if stripped.is_empty() {
        raw[..1].to_string()
    } else {
        stripped.to_string()
    }
}
