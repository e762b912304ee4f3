//! The runtime surface every program can reach without declaring it.
//!
//! The global scope and the lowered prelude are both built from [`ALL`], so a
//! name is either known to both or to neither.

use crate::types::DataType;

/// The static type of a built-in, in a form usable from a `static` table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BuiltinType {
    Void,
    String,
    Integer,
    Float,
    Bool,
    Any,
    /// `any[]`
    AnyList,
}

impl BuiltinType {
    pub fn data_type(self) -> DataType {
        match self {
            BuiltinType::Void => DataType::Void,
            BuiltinType::String => DataType::String,
            BuiltinType::Integer => DataType::Integer,
            BuiltinType::Float => DataType::Float,
            BuiltinType::Bool => DataType::Bool,
            BuiltinType::Any => DataType::Any,
            BuiltinType::AnyList => DataType::list_of(DataType::Any),
        }
    }
}

#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub ty: BuiltinType,
    /// The target definition. Arguments arrive as thunks.
    pub prelude: &'static str,
}

/// Private helpers emitted ahead of the built-ins. Not visible to the type
/// checker.
pub const PRELUDE_HEADER: &[&str] = &[
    "const __fs__ = require('fs');",
    "var __value = (v) => () => v;",
];

macro_rules! builtins {
    ($($name:literal: $ty:ident = $prelude:literal;)*) => {
        &[$(Builtin {
            name: $name,
            ty: BuiltinType::$ty,
            prelude: concat!("var ", $name, " = ", $prelude, ";"),
        }),*]
    };
}

pub static ALL: &[Builtin] = builtins! {
    "fileRead": String = "(path) => __fs__.readFileSync(path(), 'utf8')";
    "fileWrite": Void = "(path, data) => { try { __fs__.writeFileSync(path(), data(), 'utf8'); } catch (err) { console.error('Error writing to file:', err); } }";
    "fileAppend": Void = "(path, data) => { try { __fs__.appendFileSync(path(), data(), 'utf8'); } catch (err) { console.error('Error writing to file:', err); } }";
    "varErr": Void = "() => console.error('Variable is not a function')";
    "log": Void = "(...args) => { for (let i = 0; i < args.length; i++) { process.stdout.write(String(args[i]())); } }";
    "at": Any = "(x, index) => x()[index()]";
    "push": AnyList = "(x, val) => { let l = x(); l.push(val()); return l; }";
    "remove": AnyList = "(x, index) => { let l = x(); l.splice(index(), 1); return l; }";
    "listOf": AnyList = "(val, length) => Array(length()).fill(val())";
    "setAt": AnyList = "(x, index, val) => { let l = x(); l[index()] = val(); return l; }";
    "stringAt": String = "at";
    "intAt": Integer = "at";
    "floatAt": Float = "at";
    "boolAt": Bool = "at";
    "sin": Float = "(x) => Math.sin(x())";
    "cos": Float = "(x) => Math.cos(x())";
    "tan": Float = "(x) => Math.tan(x())";
    "abs": Float = "(x) => Math.abs(x())";
    "parseint": Integer = "(x) => parseInt(x())";
    "parsefloat": Float = "(x) => parseFloat(x())";
    "len": Integer = "(x) => x().length";
    "str": String = "(x) => String(x())";
    "sqrt": Float = "(x) => Math.sqrt(x())";
    "PI": Float = "() => Math.PI";
};

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_names_are_unique() {
        let names: HashSet<_> = ALL.iter().map(|b| b.name).collect();
        assert_eq!(names.len(), ALL.len());
    }

    #[test]
    fn test_prelude_defines_its_name() {
        for builtin in ALL {
            let head = format!("var {} = ", builtin.name);
            assert!(builtin.prelude.starts_with(&head), "{}", builtin.prelude);
            assert!(builtin.prelude.ends_with(';'));
        }
    }
}
