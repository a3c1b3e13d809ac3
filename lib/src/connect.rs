//! Member-class reconnection
//!
//! The wire format does not record that a class is an inner or static
//! member class of another; the compiler's naming conventions do. This pass
//! walks the class descriptors of the final handle epoch and recovers the
//! containment:
//!
//! - a class with a synthetic `this$N` object field is a (non-static) inner
//!   class of the class that field references;
//! - a class named `Outer$Inner` whose `Outer` is present, but which has no
//!   outer reference, is a static member class.
//!
//! Recovered member classes are linked into their outer class and renamed
//! to their bare member name, with every field descriptor that mentioned
//! the old name rewritten. A rename that would collide with an existing
//! class aborts the pass.

use crate::content::{Content, ContentArena, ContentId};
use crate::descriptors::FieldKind;
use crate::errors::{Error, Result};
use crate::handles::HandleMap;
use crate::names;
use std::collections::HashMap;

pub fn connect(arena: &mut ContentArena, handles: &HandleMap) -> Result<()> {
    // Non-proxy class descriptors of the final epoch, in handle order so
    // the pass is deterministic.
    let mut descs: Vec<(u32, ContentId)> = handles
        .iter()
        .filter_map(|(&handle, &id)| match arena.get(id) {
            Content::ClassDesc(desc) if !desc.is_proxy() => Some((handle, id)),
            _ => None,
        })
        .collect();
    descs.sort_unstable_by_key(|&(handle, _)| handle);
    let descs: Vec<ContentId> = descs.into_iter().map(|(_, id)| id).collect();

    let mut by_name: HashMap<String, ContentId> = HashMap::new();
    for &id in &descs {
        if let Some(desc) = arena.class_desc(id) {
            by_name.insert(desc.name.clone(), id);
        }
    }

    // (descriptor, old name, new name), committed after both patterns ran
    let mut renames: Vec<(ContentId, String, String)> = Vec::new();

    // Pattern one: inner classes carrying an outer reference
    for &id in &descs {
        let outer_field = {
            let desc = match arena.class_desc(id) {
                Some(desc) => desc,
                None => continue,
            };
            desc.fields().iter().position(|f| {
                f.kind == FieldKind::Object && names::is_outer_reference(&f.name)
            })
        };
        let field_at = match outer_field {
            Some(at) => at,
            None => continue,
        };
        let name = match arena.class_desc(id) {
            Some(desc) => desc.name.clone(),
            None => continue,
        };
        let (outer_name, inner_name) = match names::split_member(&name) {
            Some(split) => split,
            None => return Err(Error::BadMemberName(name.clone())),
        };
        let outer_id = match by_name.get(outer_name) {
            Some(&outer_id) => outer_id,
            None => return Err(Error::MissingOuter(name.clone())),
        };
        let field_type = match arena.class_desc(id) {
            Some(desc) => desc.fields()[field_at].java_type(arena),
            None => None,
        };
        if field_type.as_deref() != Some(outer_name) {
            return Err(Error::OuterMismatch(name.clone()));
        }
        let inner_name = inner_name.to_string();
        let local = names::is_local_segment(&inner_name);
        log::debug!("'{}' is an inner class of '{}'", name, outer_name);
        if let Some(outer) = arena.class_desc_mut(outer_id) {
            outer.inner_classes.push(id);
        }
        if let Some(desc) = arena.class_desc_mut(id) {
            desc.outer_class = Some(outer_id);
            desc.is_inner_class = true;
            desc.is_local_inner_class = local;
            desc.fields_mut()[field_at].is_inner_class_reference = true;
        }
        renames.push((id, name, inner_name));
    }

    // Pattern two: static member classes, recognised by name alone. An
    // absent outer class leaves the descriptor untouched.
    for &id in &descs {
        let name = {
            let desc = match arena.class_desc(id) {
                Some(desc) => desc,
                None => continue,
            };
            if desc.is_inner_class {
                continue;
            }
            desc.name.clone()
        };
        let (outer_name, inner_name) = match names::split_member(&name) {
            Some(split) => split,
            None => continue,
        };
        let outer_id = match by_name.get(outer_name) {
            Some(&outer_id) => outer_id,
            None => continue,
        };
        let inner_name = inner_name.to_string();
        let local = names::is_local_segment(&inner_name);
        log::debug!("'{}' is a static member class of '{}'", name, outer_name);
        if let Some(outer) = arena.class_desc_mut(outer_id) {
            outer.inner_classes.push(id);
        }
        if let Some(desc) = arena.class_desc_mut(id) {
            desc.outer_class = Some(outer_id);
            desc.is_static_member_class = true;
            desc.is_local_inner_class = local;
        }
        renames.push((id, name, inner_name));
    }

    // Rename commit: member classes drop their qualified spelling, and
    // every field descriptor naming the old class is rewritten.
    for (id, old, new) in renames {
        if by_name.contains_key(&new) {
            return Err(Error::RenameCollision(old, new));
        }
        let new_descriptor = format!("L{};", new.replace('.', "/"));
        let mut rewrite: Vec<ContentId> = Vec::new();
        for &desc_id in &descs {
            if let Some(desc) = arena.class_desc(desc_id) {
                for field in desc.fields() {
                    if let Some(string_id) = field.descriptor {
                        if field.java_type(arena).as_deref() == Some(old.as_str())
                            && !rewrite.contains(&string_id)
                        {
                            rewrite.push(string_id);
                        }
                    }
                }
            }
        }
        for string_id in rewrite {
            if let Content::Str(s) = arena.get_mut(string_id) {
                s.value = new_descriptor.clone();
            }
        }
        if let Some(desc) = arena.class_desc_mut(id) {
            desc.name = new.clone();
        }
        by_name.remove(&old);
        by_name.insert(new, id);
    }

    Ok(())
}
