use std::hash::{Hash, Hasher};

use crate::entity::EntityRef;

pub fn fingerprint(entity: &EntityRef, source_id: &str, property: &str) -> u64 {
    let mut hasher = std::hash::DefaultHasher::new();
    entity.hash(&mut hasher);
    source_id.hash(&mut hasher);
    property.hash(&mut hasher);
    hasher.finish()
}

pub fn fingerprint_string(entity: &EntityRef, source_id: &str, property: &str) -> String {
    format!("{:016x}", fingerprint(entity, source_id, property))
}
