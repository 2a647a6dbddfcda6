//! Arena-indexed handles for scopes and symbols.
//!
//! The compiler models the scope tree, symbol table, and class hierarchy as
//! flat arenas of values with index-based relations, rather than
//! `Rc`/`RefCell` ownership cycles (parent scopes, parent classes, and
//! method-enclosing-class all point "backwards"). See spec.md §9.

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            #[inline]
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            #[inline]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(ScopeId);
arena_id!(SymbolId);
arena_id!(ClassId);
arena_id!(FunctionId);
