use std::collections::{HashMap, HashSet};

use crate::classfile::attributes::{Code, LocalVariable};
use crate::classfile::ACC_STATIC;
use crate::descriptor::{array_dimension, object_internal_name, parse_method_descriptor, parameter_slots};
use crate::utils::simple_name;

use super::context::attribute_position;
use super::{ClassContext, RewriteError, Stage, VariableKey};

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long", "native",
    "new", "package", "private", "protected", "public", "return", "short", "static", "strictfp",
    "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try", "void",
    "volatile", "while", "true", "false", "null", "var", "record", "yield",
];

/// Renames local variables and parameters.
///
/// Names come from the mapping first, then from the record components of
/// a canonical constructor. In regeneration mode every other variable is
/// named after its type, and the name is recorded to the ledger.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalVariableRenamer;

/// Hands out type-derived names, unique within one method.
#[derive(Default)]
struct NameGenerator {
    used: HashMap<String, usize>,
    taken: HashSet<String>,
}

impl NameGenerator {
    /// Marks a name given to another variable of the method.
    fn reserve(&mut self, name: &str) {
        self.taken.insert(name.to_string());
    }

    fn next(&mut self, descriptor: &str) -> String {
        let base = base_name(descriptor);
        let count = self.used.entry(base.clone()).or_insert(0);
        loop {
            *count += 1;
            let name = if *count == 1 {
                base.clone()
            } else {
                format!("{}{}", base, count)
            };
            if self.taken.insert(name.clone()) {
                return name;
            }
        }
    }
}

/// A variable name derived from a (mapped) field descriptor.
fn base_name(descriptor: &str) -> String {
    let dimension = array_dimension(descriptor);
    let element = &descriptor[dimension..];
    let mut name = match element {
        "B" => "b".to_string(),
        "C" => "c".to_string(),
        "D" => "d".to_string(),
        "F" => "f".to_string(),
        "I" => "i".to_string(),
        "J" => "l".to_string(),
        "S" => "s".to_string(),
        "Z" => "flag".to_string(),
        _ => match object_internal_name(element).map(simple_name) {
            Some(simple) if simple.starts_with(|c: char| c.is_alphabetic()) => lower_first(simple),
            _ => "obj".to_string(),
        },
    };
    if dimension > 0 {
        name.push_str("Array");
    }
    if JAVA_KEYWORDS.contains(&name.as_str()) {
        name.push('_');
    }
    name
}

fn lower_first(name: &str) -> String {
    if name.chars().all(|c| !c.is_lowercase()) {
        return name.to_lowercase();
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

struct MethodScope<'s> {
    class: &'s str,
    method: &'s str,
    descriptor: &'s str,
    generator: NameGenerator,
}

impl LocalVariableRenamer {
    /// A name the variable in `slot` gets without regeneration.
    fn known_name(cx: &ClassContext<'_>, scope: &MethodScope<'_>, slot: u16) -> Option<String> {
        cx.remapper
            .local_variable_name(scope.class, scope.method, scope.descriptor, slot)
            .map(str::to_string)
            .or_else(|| cx.parameter_names.get(&slot).cloned())
            .or_else(|| {
                let key = VariableKey::new(scope.class, scope.method, scope.descriptor, slot);
                cx.ledger?.get(&key)
            })
    }

    fn reserve_known(cx: &ClassContext<'_>, scope: &mut MethodScope<'_>, slots: impl IntoIterator<Item = u16>) {
        for slot in slots {
            if let Some(name) = Self::known_name(cx, scope, slot) {
                scope.generator.reserve(&name);
            }
        }
    }

    /// The new name of a variable, or `None` to keep it.
    fn resolve(cx: &ClassContext<'_>, scope: &mut MethodScope<'_>, slot: u16, descriptor: &str) -> Option<String> {
        if let Some(name) = cx
            .remapper
            .local_variable_name(scope.class, scope.method, scope.descriptor, slot)
        {
            return Some(name.to_string());
        }
        if let Some(name) = cx.parameter_names.get(&slot) {
            return Some(name.clone());
        }
        let ledger = cx.ledger?;
        let key = VariableKey::new(scope.class, scope.method, scope.descriptor, slot);
        let mapped = cx.remapper.map_descriptor(descriptor);
        Some(ledger.get_or_insert_with(key, || scope.generator.next(&mapped)))
    }

    fn record_parameters(cx: &ClassContext<'_>, scope: &mut MethodScope<'_>, is_static: bool) {
        let ledger = match cx.ledger {
            Some(ledger) => ledger,
            None => return,
        };
        let (parameters, _) = match parse_method_descriptor(scope.descriptor) {
            Some(parsed) => parsed,
            None => return,
        };
        let slots = parameter_slots(scope.descriptor, is_static).unwrap_or_default();
        Self::reserve_known(cx, scope, slots.iter().copied());
        for (slot, parameter) in slots.into_iter().zip(parameters) {
            let known = cx
                .remapper
                .local_variable_name(scope.class, scope.method, scope.descriptor, slot)
                .map(str::to_string)
                .or_else(|| cx.parameter_names.get(&slot).cloned());
            match known {
                Some(name) => ledger.record(VariableKey::new(scope.class, scope.method, scope.descriptor, slot), name),
                None => {
                    Self::resolve(cx, scope, slot, parameter);
                }
            }
        }
    }
}

impl Stage for LocalVariableRenamer {
    fn visit_method(&self, cx: &mut ClassContext<'_>, index: usize) -> Result<(), RewriteError> {
        let (method, descriptor) = cx.method(index)?;
        let (method, descriptor) = (method.to_string(), descriptor.to_string());
        let class = cx.name.clone();
        let is_static = cx.methods[index].access_flags & ACC_STATIC != 0;
        let mut scope = MethodScope {
            class: &class,
            method: &method,
            descriptor: &descriptor,
            generator: NameGenerator::default(),
        };

        let code_position = match attribute_position(&cx.original, &cx.methods[index].attributes, "Code") {
            Some(position) => position,
            None => {
                Self::record_parameters(cx, &mut scope, is_static);
                return Ok(());
            }
        };
        let mut code = Code::parse(&cx.methods[index].attributes[code_position].data)?;
        let table_position = match attribute_position(&cx.original, &code.attributes, "LocalVariableTable") {
            Some(position) => position,
            None => {
                Self::record_parameters(cx, &mut scope, is_static);
                return Ok(());
            }
        };

        let mut table = LocalVariable::parse_table(&code.attributes[table_position].data)?;
        if cx.ledger.is_some() {
            let slots = table.iter().map(|variable| variable.index).filter(|&slot| is_static || slot != 0);
            Self::reserve_known(cx, &mut scope, slots);
        }
        let mut renamed = HashMap::new();
        for variable in &mut table {
            if !is_static && variable.index == 0 {
                continue;
            }
            let variable_descriptor = cx.original.utf8(variable.descriptor_index)?.to_string();
            let name = match Self::resolve(cx, &mut scope, variable.index, &variable_descriptor) {
                Some(name) => name,
                None => continue,
            };
            if cx.original.utf8(variable.name_index).is_ok_and(|current| current == name) {
                continue;
            }
            variable.name_index = cx.pool.utf8(&name)?;
            renamed.insert((variable.index, variable.start_pc), variable.name_index);
        }
        if renamed.is_empty() {
            return Ok(());
        }
        code.attributes[table_position].data = LocalVariable::write_table(&table)?;

        if let Some(position) = attribute_position(&cx.original, &code.attributes, "LocalVariableTypeTable") {
            let mut types = LocalVariable::parse_table(&code.attributes[position].data)?;
            for variable in &mut types {
                if let Some(name_index) = renamed.get(&(variable.index, variable.start_pc)) {
                    variable.name_index = *name_index;
                }
            }
            code.attributes[position].data = LocalVariable::write_table(&types)?;
        }

        cx.methods[index].attributes[code_position].data = code.to_bytes()?;
        log::trace!("renamed {} local variables in {}.{}", renamed.len(), class, method);
        Ok(())
    }
}
