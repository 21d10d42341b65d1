//! Serde support for the node graph.
//!
//! Ids serialize as their stable string form (`node_<n>`, or `null` for the
//! absent sentinel) and the node map serializes as a JSON object keyed by
//! those strings, which keeps the dumped unit a flat `id → node` mapping.

use super::{Node, NodeId, NodeMap};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_valid() {
            serializer.collect_str(&format_args!("node_{}", self.raw()))
        } else {
            serializer.serialize_none()
        }
    }
}

fn parse_node_id(text: &str) -> Option<NodeId> {
    let index = text.strip_prefix("node_")?.parse::<u32>().ok()?;
    if index == u32::MAX {
        return None;
    }
    Some(NodeId::new(index))
}

struct NodeIdVisitor;

impl<'de> Visitor<'de> for NodeIdVisitor {
    type Value = NodeId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a `node_<n>` string or null")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<NodeId, E> {
        parse_node_id(value)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Str(value), &"a `node_<n>` string"))
    }

    fn visit_none<E: de::Error>(self) -> Result<NodeId, E> {
        Ok(NodeId::INVALID)
    }

    fn visit_unit<E: de::Error>(self) -> Result<NodeId, E> {
        Ok(NodeId::INVALID)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<NodeId, D::Error> {
        deserializer.deserialize_any(NodeIdVisitor)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(NodeIdVisitor)
    }
}

impl Serialize for NodeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|node| (node.id.to_string(), node)))
    }
}

struct NodeMapVisitor;

impl<'de> Visitor<'de> for NodeMapVisitor {
    type Value = NodeMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of `node_<n>` keys to nodes")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<NodeMap, A::Error> {
        let mut entries: Vec<(NodeId, Node)> = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((key, node)) = access.next_entry::<String, Node>()? {
            let id = parse_node_id(&key).ok_or_else(|| {
                de::Error::invalid_value(de::Unexpected::Str(&key), &"a `node_<n>` key")
            })?;
            if id != node.id {
                return Err(de::Error::custom(format!(
                    "node map key {id} does not match node id {}",
                    node.id
                )));
            }
            entries.push((id, node));
        }
        entries.sort_by_key(|(id, _)| id.index());
        for (position, (id, _)) in entries.iter().enumerate() {
            if id.index() != position {
                return Err(de::Error::custom(format!(
                    "node map is not dense: expected node_{position}, found {id}"
                )));
            }
        }
        Ok(NodeMap::from_nodes(
            entries.into_iter().map(|(_, node)| node).collect(),
        ))
    }
}

impl<'de> Deserialize<'de> for NodeMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(NodeMapVisitor)
    }
}
