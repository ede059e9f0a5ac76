//! Path-guided immutable patching of a [`Structure`].

use crate::structure::{Key, Structure};
use std::mem;
use tracing::trace;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("Cannot descend into a primitive with key `{key}` at depth {depth}")]
    Primitive { key: Key, depth: usize },
    #[error("Key `{key}` at depth {depth} is not a sequence index")]
    NotAnIndex { key: Key, depth: usize },
    #[error("Index `{key}` at depth {depth} lies too far past the end of the sequence")]
    IndexTooLarge { key: Key, depth: usize },
}

/// How many null slots a single write may pad a sequence with.
pub const MAX_PADDING: usize = 1 << 16;

/// Return a copy of `target` whose node at `path` has been overwritten by `delta`.
///
/// At the end of the path a mapping is shallow-merged with `delta`'s entries, a
/// sequence receives `delta`'s entries as index-keyed overwrites, and a primitive is
/// replaced by `delta`. Keys that do not exist read as null, so a missing slot can be
/// filled but not descended through.
///
/// Descending into a primitive fails with [`MergeError::Primitive`]. Sequences have no
/// named slots, so a key that is not integer-like fails with [`MergeError::NotAnIndex`]
/// when it addresses a sequence, whether as a path step or as a delta mapping key. An
/// index more than [`MAX_PADDING`] slots past the end fails with
/// [`MergeError::IndexTooLarge`].
pub fn merge(
    target: &Structure,
    path: &[Key],
    delta: &Structure,
) -> Result<Structure, MergeError> {
    merge_owned(target.clone(), path, delta)
}

/// Like [`merge`] but consumes `target`, moving untouched branches into the result.
pub fn merge_owned(
    target: Structure,
    path: &[Key],
    delta: &Structure,
) -> Result<Structure, MergeError> {
    trace!(path_len = path.len(), "merge");
    merge_at(target, path, delta, 0)
}

fn merge_at(
    target: Structure,
    path: &[Key],
    delta: &Structure,
    depth: usize,
) -> Result<Structure, MergeError> {
    let Some((key, rest)) = path.split_first() else {
        return apply(target, delta, depth);
    };

    match target {
        Structure::Sequence(mut items) => {
            let index = key.as_index().ok_or_else(|| MergeError::NotAnIndex {
                key: key.clone(),
                depth,
            })?;
            let slot = slot_mut(&mut items, index, key, depth)?;
            let child = mem::take(slot);
            *slot = merge_at(child, rest, delta, depth + 1)?;
            Ok(Structure::Sequence(items))
        }
        Structure::Mapping(mut entries) => {
            let name = key.as_name();
            let child = entries
                .get_mut(name.as_ref())
                .map(mem::take)
                .unwrap_or_default();
            let merged = merge_at(child, rest, delta, depth + 1)?;
            entries.insert(name.into_owned(), merged);
            Ok(Structure::Mapping(entries))
        }
        Structure::Primitive(_) => Err(MergeError::Primitive {
            key: key.clone(),
            depth,
        }),
    }
}

/// Apply `delta` at the end of the path.
fn apply(target: Structure, delta: &Structure, depth: usize) -> Result<Structure, MergeError> {
    match target {
        Structure::Sequence(mut items) => {
            match delta {
                Structure::Sequence(values) => {
                    for (index, value) in values.iter().enumerate() {
                        *slot_mut(&mut items, index, &Key::Index(index), depth)? = value.clone();
                    }
                }
                Structure::Mapping(values) => {
                    for (name, value) in values {
                        let key = Key::Name(name.clone());
                        let Some(index) = key.as_index() else {
                            return Err(MergeError::NotAnIndex { key, depth });
                        };
                        *slot_mut(&mut items, index, &key, depth)? = value.clone();
                    }
                }
                // a primitive has no entries to overwrite with
                Structure::Primitive(_) => {}
            }
            Ok(Structure::Sequence(items))
        }
        Structure::Mapping(mut entries) => {
            match delta {
                Structure::Mapping(values) => {
                    for (name, value) in values {
                        entries.insert(name.clone(), value.clone());
                    }
                }
                Structure::Sequence(values) => {
                    for (index, value) in values.iter().enumerate() {
                        entries.insert(index.to_string(), value.clone());
                    }
                }
                Structure::Primitive(_) => {}
            }
            Ok(Structure::Mapping(entries))
        }
        Structure::Primitive(_) => Ok(delta.clone()),
    }
}

/// The slot at `index`, padding with nulls when it lies past the end.
fn slot_mut<'a>(
    items: &'a mut Vec<Structure>,
    index: usize,
    key: &Key,
    depth: usize,
) -> Result<&'a mut Structure, MergeError> {
    if index >= items.len() {
        let len = index
            .checked_add(1)
            .filter(|len| len - items.len() <= MAX_PADDING)
            .ok_or_else(|| MergeError::IndexTooLarge {
                key: key.clone(),
                depth,
            })?;
        items.resize(len, Structure::NULL);
    }
    Ok(&mut items[index])
}
