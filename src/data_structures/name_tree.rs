use std::cmp::Ordering;

use crate::{
    error::PdfResult,
    objects::{Dictionary, Object, PdfString},
    FromObj, Resolve,
};

/// Trees deeper than this are assumed to contain a cycle
const MAX_DEPTH: usize = 32;

/// A tree mapping byte-string keys to objects, such as the catalog's `/Names /Dests`
///
/// Leaves hold a `/Names` array of `[key1 value1 key2 value2 ...]` pairs, sorted by key.
/// Intermediate nodes hold `/Kids`, each with a `/Limits [least greatest]` bound
#[derive(Debug, Clone)]
pub struct NameTree {
    root: Dictionary,
}

impl FromObj for NameTree {
    fn from_obj(obj: Object, resolver: &dyn Resolve) -> PdfResult<Self> {
        Ok(Self {
            root: resolver.assert_dict(obj)?,
        })
    }
}

impl NameTree {
    /// Looks up `key`, resolving the value
    pub fn get(&self, key: &[u8], resolver: &dyn Resolve) -> PdfResult<Option<Object>> {
        let mut node = self.root.clone();

        for _ in 0..MAX_DEPTH {
            if let Some(names) = node.get_arr("Names", resolver)? {
                return find_in_leaf(names, key, resolver);
            }

            let kids = match node.get_arr("Kids", resolver)? {
                Some(kids) => kids,
                None => return Ok(None),
            };

            let mut next = None;

            for kid in kids {
                let kid = resolver.assert_dict(kid)?;

                match limits(&kid, resolver)? {
                    Some((least, greatest)) => {
                        if key.cmp(least.as_bytes()) != Ordering::Less
                            && key.cmp(greatest.as_bytes()) != Ordering::Greater
                        {
                            next = Some(kid);
                            break;
                        }
                    }
                    // malformed: a kid without limits could hold anything
                    None => {
                        if let Some(found) = (NameTree { root: kid }).get_unbounded(key, resolver)? {
                            return Ok(Some(found));
                        }
                    }
                }
            }

            match next {
                Some(kid) => node = kid,
                None => return Ok(None),
            }
        }

        log::warn!("name tree deeper than {} levels", MAX_DEPTH);

        Ok(None)
    }

    /// A leaf-only search, used below kids that lack `/Limits`
    fn get_unbounded(&self, key: &[u8], resolver: &dyn Resolve) -> PdfResult<Option<Object>> {
        match self.root.get_arr("Names", resolver)? {
            Some(names) => find_in_leaf(names, key, resolver),
            None => Ok(None),
        }
    }
}

fn limits(
    node: &Dictionary,
    resolver: &dyn Resolve,
) -> PdfResult<Option<(PdfString, PdfString)>> {
    let mut arr = match node.get_arr("Limits", resolver)? {
        Some(arr) if arr.len() == 2 => arr,
        _ => return Ok(None),
    };

    let greatest = resolver.assert_string(arr.pop().unwrap_or(Object::Null))?;
    let least = resolver.assert_string(arr.pop().unwrap_or(Object::Null))?;

    Ok(Some((least, greatest)))
}

fn find_in_leaf(
    names: Vec<Object>,
    key: &[u8],
    resolver: &dyn Resolve,
) -> PdfResult<Option<Object>> {
    // keys are meant to be sorted, but a linear scan tolerates writers that don't
    for pair in names.chunks_exact(2) {
        let name = match resolver.resolve(pair[0].clone())? {
            Object::String(s) => s,
            _ => continue,
        };

        if name.as_bytes() == key {
            return Ok(Some(resolver.resolve(pair[1].clone())?));
        }
    }

    Ok(None)
}
