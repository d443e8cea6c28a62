//! By-value type representation.
//!
//! Types are plain values carried inline on declarations and expressions, not
//! arena nodes: passes clone and rewrite them freely without touching the
//! handle table. `Prim` covers both the source primitives and the target
//! primitives the mapping pass rewrites them to.

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Prim {
    Bool,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Object,
    Void,
    // Target-language primitives, produced by the primitive-mapping pass.
    Number,
    Boolean,
    Any,
}

impl Prim {
    /// Whether this primitive is numeric in the source language.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Prim::Char
                | Prim::Byte
                | Prim::Short
                | Prim::Int
                | Prim::Long
                | Prim::Float
                | Prim::Double
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Ty {
    Prim(Prim),
    /// A named (possibly generic) type reference. Nested-type references use
    /// the dotted form `Outer.Inner` until the class-lifting pass flattens
    /// them.
    Named { name: String, args: Vec<Ty> },
    Array(Box<Ty>),
    /// A function type; parameters of this type never get runtime guards.
    Fn { params: Vec<Ty>, ret: Box<Ty> },
    /// Nullable sugar over an underlying type, stripped late in the pipeline.
    Nullable(Box<Ty>),
    /// No declared type; the printer leaves the slot empty.
    Infer,
}

impl Ty {
    pub fn named(name: impl Into<String>) -> Ty {
        Ty::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn array(elem: Ty) -> Ty {
        Ty::Array(Box::new(elem))
    }

    pub fn nullable(inner: Ty) -> Ty {
        Ty::Nullable(Box::new(inner))
    }

    pub const fn is_void(&self) -> bool {
        matches!(self, Ty::Prim(Prim::Void))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Ty::Named { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Structural type equality as the overload unifier sees it: primitives match
/// by code, named types by identifier and pairwise-equal arguments.
pub fn types_equal(x: &Ty, y: &Ty) -> bool {
    match (x, y) {
        (Ty::Prim(a), Ty::Prim(b)) => a == b,
        (Ty::Named { name: a, args: xa }, Ty::Named { name: b, args: ya }) => {
            a == b && xa.len() == ya.len() && xa.iter().zip(ya).all(|(p, q)| types_equal(p, q))
        }
        (Ty::Array(a), Ty::Array(b)) => types_equal(a, b),
        (Ty::Nullable(a), Ty::Nullable(b)) => types_equal(a, b),
        _ => false,
    }
}

/// Widen two parameter types to one the unified signature can carry: equal
/// types survive, anything else becomes the universal top type.
pub fn merge_types(x: &Ty, y: &Ty) -> Ty {
    if types_equal(x, y) {
        x.clone()
    } else {
        Ty::Prim(Prim::Object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_types_survive_merge() {
        let a = Ty::named("Vector");
        let b = Ty::named("Vector");
        assert_eq!(merge_types(&a, &b), Ty::named("Vector"));
    }

    #[test]
    fn mismatched_types_widen_to_object() {
        let a = Ty::Prim(Prim::Int);
        let b = Ty::Prim(Prim::String);
        assert_eq!(merge_types(&a, &b), Ty::Prim(Prim::Object));
    }

    #[test]
    fn generic_arity_matters() {
        let a = Ty::Named {
            name: "List".into(),
            args: vec![Ty::Prim(Prim::Int)],
        };
        let b = Ty::named("List");
        assert!(!types_equal(&a, &b));
    }
}
