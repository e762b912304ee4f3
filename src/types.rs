use std::{collections::HashMap, fmt};

use crate::builtins;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    Integer,
    Float,
    String,
    Bool,
    Void,
    None,
    List(Box<DataType>),
    /// Function values carry no signature; every function has this type.
    Function,
    Any,
}

impl DataType {
    pub fn list_of(element: DataType) -> DataType {
        DataType::List(Box::new(element))
    }

    pub fn is_any(&self) -> bool {
        matches!(self, DataType::Any)
    }

    /// Structural compatibility, the only type equality the checker uses.
    ///
    /// Symmetric. Integers and floats are interchangeable, `any` matches
    /// everything and lists match when their elements do.
    pub fn similar(&self, other: &DataType) -> bool {
        use DataType::*;
        match (self, other) {
            _ if self == other => true,
            (Any, _) | (_, Any) => true,
            (Integer, Float) | (Float, Integer) => true,
            (List(a), List(b)) => a.similar(b),
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Integer => f.write_str("int"),
            DataType::Float => f.write_str("float"),
            DataType::String => f.write_str("string"),
            DataType::Bool => f.write_str("bool"),
            DataType::Void => f.write_str("void"),
            DataType::None => f.write_str("none"),
            DataType::List(element) => write!(f, "{element}[]"),
            DataType::Function => f.write_str("fn"),
            DataType::Any => f.write_str("any"),
        }
    }
}

/// A lexical scope. Child scopes borrow their parent, so the chain can only
/// grow at its innermost link.
#[derive(Debug, Default)]
pub struct Scope<'p> {
    parent: Option<&'p Scope<'p>>,
    bindings: HashMap<Box<str>, DataType>,
    /// Declared names, in declaration order.
    order: Vec<Box<str>>,
}

impl Scope<'static> {
    /// Creates a root scope seeded with every built-in.
    pub fn global() -> Scope<'static> {
        let mut scope = Scope::default();
        for builtin in builtins::ALL {
            scope
                .declare(builtin.name, builtin.ty.data_type())
                .expect("built-in names are unique");
        }
        scope
    }
}

impl<'p> Scope<'p> {
    pub fn child(&self) -> Scope<'_> {
        Scope {
            parent: Some(self),
            bindings: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Binds `name` in this scope.
    ///
    /// Fails, returning the existing type, if the name is already bound here.
    /// Names bound only by enclosing scopes may be shadowed.
    pub fn declare(&mut self, name: &str, ty: DataType) -> Result<(), DataType> {
        if let Some(existing) = self.bindings.get(name) {
            return Err(existing.clone());
        }
        self.bindings.insert(name.into(), ty);
        self.order.push(name.into());
        Ok(())
    }

    /// Looks `name` up in this scope only.
    pub fn get_immediate(&self, name: &str) -> Option<&DataType> {
        self.bindings.get(name)
    }

    /// Looks `name` up through the whole chain, innermost first.
    pub fn get(&self, name: &str) -> Option<&DataType> {
        let mut curr = self;
        loop {
            if let Some(ty) = curr.bindings.get(name) {
                return Some(ty);
            }
            curr = curr.parent?;
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(AsRef::as_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similar() {
        use DataType::*;
        assert!(Float.similar(&Integer));
        assert!(Integer.similar(&Float));
        assert!(DataType::list_of(Integer).similar(&DataType::list_of(Float)));
        assert!(!Integer.similar(&String));
        assert!(!String.similar(&Integer));
        assert!(!DataType::list_of(String).similar(&DataType::list_of(Bool)));
        assert!(!Function.similar(&Integer));
        assert!(!Void.similar(&None));
        for ty in [Integer, Float, String, Bool, Void, None, Function, Any] {
            assert!(Any.similar(&ty));
            assert!(ty.similar(&Any));
            assert!(ty.similar(&ty));
        }
        assert!(DataType::list_of(Any).similar(&DataType::list_of(String)));
        assert!(DataType::list_of(Integer).similar(&Any));
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::Integer.to_string(), "int");
        assert_eq!(DataType::Function.to_string(), "fn");
        assert_eq!(
            DataType::list_of(DataType::list_of(DataType::Bool)).to_string(),
            "bool[][]"
        );
    }

    #[test]
    fn test_scope_chain() {
        let mut global = Scope::global();
        global.declare("x", DataType::Integer).unwrap();
        assert_eq!(global.get("len"), Some(&DataType::Integer));

        let mut inner = global.child();
        assert_eq!(inner.get_immediate("x"), None);
        assert_eq!(inner.get("x"), Some(&DataType::Integer));

        // Shadowing an enclosing binding is fine.
        inner.declare("x", DataType::String).unwrap();
        assert_eq!(inner.get("x"), Some(&DataType::String));

        // Redeclaring in the same scope isn't.
        assert_eq!(
            inner.declare("x", DataType::Bool),
            Err(DataType::String)
        );
        assert_eq!(inner.names().collect::<Vec<_>>(), ["x"]);
    }
}
