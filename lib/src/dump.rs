//! Pretty-printing of parsed streams
//!
//! Read-only consumers of the content arena: one-line summaries of content
//! items, pseudo-Java class declarations and per-instance field dumps. The
//! output streams are parameters; nothing here touches the model.

use crate::codes::DescFlags;
use crate::content::{ClassDesc, Content, ContentArena, ContentId, Instance, Value};
use crate::errors::{Error, Result};
use crate::handles::HandleMap;
use crate::names;
use regex::Regex;
use std::collections::HashSet;
use std::io::{self, Write};

/// What the class and instance printers show
#[derive(Debug, Default)]
pub struct DumpOptions {
    /// Include array classes in class output
    pub show_arrays: bool,
    /// Rewrite characters that are illegal in Java identifiers
    pub fix_names: bool,
    /// Class names to exclude from class output
    pub filter: Option<Regex>,
}

impl DumpOptions {
    /// Compile and install a class-name filter.
    pub fn set_filter(&mut self, pattern: &str) -> Result<()> {
        self.filter = Some(Regex::new(pattern).map_err(|e| Error::BadFilter(e.to_string()))?);
        Ok(())
    }

    fn shows_class(&self, desc: &ClassDesc) -> bool {
        if desc.is_array_class() && !self.show_arrays {
            return false;
        }
        if let Some(filter) = &self.filter {
            if filter.is_match(&desc.name) {
                return false;
            }
        }
        true
    }

    fn name(&self, raw: &str) -> String {
        if self.fix_names {
            names::sanitize(raw)
        } else {
            raw.to_string()
        }
    }
}

/// One-line summary of a content item.
pub fn describe(arena: &ContentArena, item: Option<ContentId>) -> String {
    let id = match item {
        Some(id) => id,
        None => return "null".to_string(),
    };
    match arena.get(id) {
        Content::Str(s) => format!("[String 0x{:X}: \"{}\"]", s.handle, s.value),
        Content::ClassDesc(d) => format!("[classdesc 0x{:X}: {}]", d.handle, d.name),
        Content::ClassObject(c) => format!(
            "[class 0x{:X}: {}]",
            c.handle,
            class_name(arena, c.class_desc)
        ),
        Content::Enum(e) => {
            let constant = arena
                .string(e.constant)
                .map(|s| s.value.as_str())
                .unwrap_or("?");
            format!(
                "[enum 0x{:X}: {}.{}]",
                e.handle,
                class_name(arena, e.class_desc),
                constant
            )
        }
        Content::Array(a) => format!(
            "[array 0x{:X}: {} element(s) of {}]",
            a.handle,
            a.elements.len(),
            class_name(arena, a.class_desc)
        ),
        Content::Instance(i) => format!(
            "[instance 0x{:X}: {}]",
            i.handle,
            class_name(arena, i.class_desc)
        ),
        Content::BlockData(b) => {
            format!("[blockdata: {} byte(s): {}]", b.bytes.len(), hex(&b.bytes, 32))
        }
        Content::Exception(x) => format!(
            "[stream exception: {}, {} raw byte(s)]",
            describe(arena, Some(x.exception)),
            x.data.len()
        ),
    }
}

/// A field or array-element value, one token.
pub fn format_value(arena: &ContentArena, value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Ref(id) => describe(arena, Some(*id)),
        Value::Byte(b) => format!("{}", b),
        Value::Char(unit) => match char::from_u32(u32::from(*unit)) {
            Some(c) if !c.is_control() => format!("'{}'", c),
            _ => format!("'\\u{:04X}'", unit),
        },
        Value::Double(d) => format!("{}", d),
        Value::Float(f) => format!("{}", f),
        Value::Int(i) => format!("{}", i),
        Value::Long(l) => format!("{}", l),
        Value::Short(s) => format!("{}", s),
        Value::Boolean(b) => format!("{}", b),
    }
}

fn hex(bytes: &[u8], limit: usize) -> String {
    let mut out = String::with_capacity(2 * bytes.len().min(limit) + 1);
    for b in bytes.iter().take(limit) {
        out.push_str(&format!("{:02X}", b));
    }
    if bytes.len() > limit {
        out.push('…');
    }
    out
}

fn class_name(arena: &ContentArena, desc: ContentId) -> String {
    match arena.class_desc(desc) {
        Some(d) => d.name.clone(),
        None => "?".to_string(),
    }
}

/// Print declarations for every class of every epoch, in handle order.
/// Member classes print nested inside their outer class.
pub fn write_class_declarations<W: Write>(
    out: &mut W,
    arena: &ContentArena,
    epochs: &[HandleMap],
    options: &DumpOptions,
) -> io::Result<()> {
    let mut seen: HashSet<ContentId> = HashSet::new();
    for epoch in epochs {
        let mut ids: Vec<(u32, ContentId)> = epoch
            .iter()
            .filter_map(|(&handle, &id)| match arena.get(id) {
                Content::ClassDesc(_) => Some((handle, id)),
                _ => None,
            })
            .collect();
        ids.sort_unstable_by_key(|&(handle, _)| handle);
        for (_, id) in ids {
            if seen.contains(&id) {
                continue;
            }
            let desc = match arena.class_desc(id) {
                Some(desc) => desc,
                None => continue,
            };
            if desc.outer_class.is_some() {
                // printed inside its outer class
                continue;
            }
            write_class_declaration(out, arena, id, options, 0, &mut seen)?;
        }
    }
    Ok(())
}

/// One class declaration, recursing into member classes.
pub fn write_class_declaration<W: Write>(
    out: &mut W,
    arena: &ContentArena,
    id: ContentId,
    options: &DumpOptions,
    depth: usize,
    seen: &mut HashSet<ContentId>,
) -> io::Result<()> {
    seen.insert(id);
    let desc = match arena.class_desc(id) {
        Some(desc) => desc,
        None => return Ok(()),
    };
    if !options.shows_class(desc) {
        return Ok(());
    }
    let pad = "    ".repeat(depth);

    if desc.is_proxy() {
        let interfaces = match &desc.kind {
            crate::content::ClassDescKind::Proxy { interfaces } => interfaces.join(", "),
            _ => String::new(),
        };
        writeln!(out, "{}class {} implements {} {{}}", pad, desc.name, interfaces)?;
        return Ok(());
    }

    if desc.flags().contains(DescFlags::ENUM) {
        writeln!(out, "{}enum {} {{", pad, options.name(&desc.name))?;
        for constant in &desc.enum_constants {
            writeln!(out, "{}    {},", pad, options.name(constant))?;
        }
        writeln!(out, "{}}}", pad)?;
        return Ok(());
    }

    let keyword = if desc.is_static_member_class {
        "static class"
    } else {
        "class"
    };
    write!(out, "{}{} {}", pad, keyword, options.name(&desc.name))?;
    if let Some(super_desc) = desc.super_desc {
        write!(out, " extends {}", options.name(&class_name(arena, super_desc)))?;
    }
    writeln!(out, " {{")?;
    for field in desc.fields() {
        if field.is_inner_class_reference {
            continue;
        }
        let type_name = match field.kind {
            crate::descriptors::FieldKind::Base(base) => base.java_name().to_string(),
            _ => field
                .java_type(arena)
                .unwrap_or_else(|| "java.lang.Object".to_string()),
        };
        writeln!(
            out,
            "{}    {} {};",
            pad,
            options.name(&type_name),
            options.name(&field.name)
        )?;
    }
    for &inner in &desc.inner_classes {
        write_class_declaration(out, arena, inner, options, depth + 1, seen)?;
    }
    writeln!(out, "{}}}", pad)?;
    Ok(())
}

/// Dump one instance: its classes eldest-first, each with its field values
/// and any object annotations.
pub fn write_instance<W: Write>(
    out: &mut W,
    arena: &ContentArena,
    instance: &Instance,
    options: &DumpOptions,
) -> io::Result<()> {
    writeln!(
        out,
        "[instance 0x{:X}: {}{}]",
        instance.handle,
        options.name(&class_name(arena, instance.class_desc)),
        if instance.is_exception {
            " (exception object)"
        } else {
            ""
        }
    )?;
    for class_data in &instance.class_data {
        let desc = match arena.class_desc(class_data.class_desc) {
            Some(desc) => desc,
            None => continue,
        };
        writeln!(out, "    {}:", options.name(&desc.name))?;
        for (field, value) in desc.fields().iter().zip(&class_data.values) {
            writeln!(
                out,
                "        {} = {}",
                options.name(&field.name),
                format_value(arena, value)
            )?;
        }
        if let Some(annotations) = &class_data.annotations {
            writeln!(out, "        annotations:")?;
            for item in annotations {
                writeln!(out, "            {}", describe(arena, *item))?;
            }
        }
    }
    Ok(())
}
