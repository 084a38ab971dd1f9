//! Depth-first traversal over a record's public fields.

use crate::error::{Error, TargetError};
use crate::field::{Config, Field, FieldInfo, Leaf, Node};

/// The chain of fields from the root record down to the field being visited
#[derive(Debug, Default, Clone)]
pub struct FieldPath {
    infos: Vec<&'static FieldInfo>,
}

impl FieldPath {
    /// The innermost field; an unnamed placeholder on the root path
    pub fn leaf(&self) -> &'static FieldInfo {
        static ROOT: FieldInfo = FieldInfo::new("");
        self.infos.last().copied().unwrap_or(&ROOT)
    }

    /// Every field above the innermost one, outermost first
    pub fn ancestors(&self) -> &[&'static FieldInfo] {
        match self.infos.split_last() {
            Some((_, ancestors)) => ancestors,
            None => &[],
        }
    }

    /// Number of fields in the path; `1` for a field of the root record
    pub fn depth(&self) -> usize {
        self.infos.len()
    }

    /// `postgres.port`
    pub fn dotted(&self) -> String {
        self.infos
            .iter()
            .map(|info| info.name)
            .collect::<Vec<_>>()
            .join(".")
    }

    fn push(&mut self, info: &'static FieldInfo) {
        self.infos.push(info);
    }

    fn pop(&mut self) {
        self.infos.pop();
    }
}

/// Callbacks for one traversal. Returning `true` reports a write, which keeps
/// a freshly allocated optional record alive.
pub trait Visitor {
    fn leaf(&mut self, path: &FieldPath, leaf: Leaf<'_>) -> Result<bool, Error>;

    /// Called after all fields of `record` were visited; `path` is empty for the root
    fn record_done(&mut self, _path: &FieldPath, _record: &mut dyn Config) -> Result<bool, Error> {
        Ok(false)
    }

    /// Called for an optional field that holds nothing. Returning `false` skips
    /// it instead of walking a fresh default.
    fn empty_optional(&mut self, _path: &FieldPath) -> Result<bool, Error> {
        Ok(true)
    }
}

/// Type name of the root record, rejecting roots that are not records
pub fn root_name(target: &mut dyn Field) -> Result<&'static str, Error> {
    match target.node() {
        Node::Record(record) => Ok(record.type_name()),
        Node::Optional(slot) if slot.is_none() => Err(TargetError::Nil.into()),
        Node::Optional(slot) => {
            let mut name = None;
            slot.with_slot(&mut |inner| {
                name = Some(root_name(inner)?);
                Ok(false)
            })?;
            name.ok_or_else(|| TargetError::Nil.into())
        }
        Node::Leaf(_) | Node::Custom(_) => Err(TargetError::NotARecord.into()),
    }
}

/// Visits every leaf of the root record in declaration order, depth-first
pub fn walk(target: &mut dyn Field, visitor: &mut dyn Visitor) -> Result<bool, Error> {
    match target.node() {
        Node::Record(record) => walk_record(record, &mut FieldPath::default(), visitor),
        Node::Optional(slot) if slot.is_none() => Err(TargetError::Nil.into()),
        Node::Optional(slot) => slot.with_slot(&mut |inner| walk(inner, visitor)),
        Node::Leaf(_) | Node::Custom(_) => Err(TargetError::NotARecord.into()),
    }
}

fn walk_record(
    record: &mut dyn Config,
    path: &mut FieldPath,
    visitor: &mut dyn Visitor,
) -> Result<bool, Error> {
    let mut wrote = false;
    for field in record.fields() {
        path.push(field.info);
        let result = walk_field(field.field, path, visitor);
        path.pop();
        wrote |= result?;
    }
    wrote |= visitor.record_done(path, record)?;
    Ok(wrote)
}

fn walk_field(
    field: &mut dyn Field,
    path: &mut FieldPath,
    visitor: &mut dyn Visitor,
) -> Result<bool, Error> {
    match field.node() {
        Node::Leaf(value) => visitor.leaf(path, Leaf::Value(value)),
        Node::Custom(custom) => visitor.leaf(path, Leaf::Custom(custom)),
        Node::Record(record) => walk_record(record, path, visitor),
        Node::Optional(slot) if slot.is_none() && !visitor.empty_optional(path)? => Ok(false),
        Node::Optional(slot) => slot.with_slot(&mut |inner| walk_field(inner, path, visitor)),
    }
}
