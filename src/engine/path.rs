//! String paths into the staged copy, e.g. `progression.classes[0].levels` or
//! `spellcasting.classes.Wizard.spellSlots.1.current`. Paths address the
//! camelCase JSON form of the staged fields.

use std::str::FromStr;

use serde_json::{Map, Value};

use crate::engine::{
    error::ProgressionError,
    staged::{StagedChanges, StagedField},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

pub fn parse_path(path: &str) -> Result<Vec<PathSegment>, ProgressionError> {
    let mut segments = Vec::new();

    for part in path.split('.') {
        let (key, mut rest) = match part.find('[') {
            Some(bracket) => part.split_at(bracket),
            None => (part, ""),
        };
        if key.is_empty() {
            return Err(ProgressionError::invalid_path(path, "empty segment"));
        }
        segments.push(PathSegment::Key(key.to_string()));

        while !rest.is_empty() {
            let Some(close) = rest.find(']') else {
                return Err(ProgressionError::invalid_path(path, "unclosed '['"));
            };
            let index = rest[1..close]
                .parse::<usize>()
                .map_err(|_| ProgressionError::invalid_path(path, "index is not a number"))?;
            segments.push(PathSegment::Index(index));
            rest = &rest[close + 1..];
            if !rest.is_empty() && !rest.starts_with('[') {
                return Err(ProgressionError::invalid_path(path, "text after ']'"));
            }
        }
    }

    Ok(segments)
}

fn split_field(path: &str) -> Result<(StagedField, Vec<PathSegment>), ProgressionError> {
    let mut segments = parse_path(path)?.into_iter();
    let field = match segments.next() {
        Some(PathSegment::Key(key)) => StagedField::from_str(&key)
            .map_err(|_| ProgressionError::invalid_path(path, format!("'{}' is not staged", key)))?,
        _ => return Err(ProgressionError::invalid_path(path, "missing field")),
    };
    Ok((field, segments.collect()))
}

fn lookup<'v>(value: &'v Value, segments: &[PathSegment]) -> Option<&'v Value> {
    segments.iter().try_fold(value, |value, segment| match segment {
        PathSegment::Key(key) => value.as_object()?.get(key),
        PathSegment::Index(index) => value.as_array()?.get(*index),
    })
}

/// Walks to the addressed value, creating missing objects and arrays on the
/// way. Arrays only grow by appending at their current length. Fails where an
/// existing value has the wrong shape or an index skips past the end.
fn lookup_or_create<'v>(
    path: &str,
    mut value: &'v mut Value,
    segments: &[PathSegment],
) -> Result<&'v mut Value, ProgressionError> {
    for segment in segments {
        value = match segment {
            PathSegment::Key(key) => {
                if value.is_null() {
                    *value = Value::Object(Map::new());
                }
                let Value::Object(map) = value else {
                    return Err(ProgressionError::invalid_path(
                        path,
                        format!("'{}' is not inside an object", key),
                    ));
                };
                map.entry(key.clone()).or_insert(Value::Null)
            }
            PathSegment::Index(index) => {
                if value.is_null() {
                    *value = Value::Array(Vec::new());
                }
                let Value::Array(array) = value else {
                    return Err(ProgressionError::invalid_path(
                        path,
                        format!("[{}] is not inside an array", index),
                    ));
                };
                if *index > array.len() {
                    return Err(ProgressionError::invalid_path(
                        path,
                        format!("index {} is past the end of {} items", index, array.len()),
                    ));
                }
                if *index == array.len() {
                    array.push(Value::Null);
                }
                &mut array[*index]
            }
        };
    }
    Ok(value)
}

impl StagedChanges {
    pub fn get(&self, path: &str) -> Result<Option<Value>, ProgressionError> {
        let (field, segments) = split_field(path)?;
        let root = self.field_value(field);
        Ok(lookup(&root, &segments).cloned())
    }

    pub fn set(&mut self, path: &str, new_value: Value) -> Result<(), ProgressionError> {
        let (field, segments) = split_field(path)?;
        let mut root = self.field_value(field);
        *lookup_or_create(path, &mut root, &segments)? = new_value;
        self.replace_field(path, field, root)
    }
}
