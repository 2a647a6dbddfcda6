//! The scope tree and symbol table (spec.md §4.1). Scopes and symbols are
//! arena-indexed handles into flat vectors owned by the table, rather than
//! `Rc`/`RefCell` ownership cycles — scopes point at their parent, classes
//! point at their parent class, by index.

use indexmap::IndexMap;

use cpsc_util::{ClassId, Diagnostics, FunctionId, ScopeId, Span, Symbol, SymbolId};

use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function,
    Class,
    Block,
}

#[derive(Debug, Clone)]
pub struct ScopeData {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub symbols: IndexMap<Symbol, SymbolId>,
    pub is_loop: bool,
    pub function_context: Option<FunctionId>,
    pub class_context: Option<ClassId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable { initialized: bool },
    Constant,
    Function(FunctionId),
    Class(ClassId),
}

#[derive(Debug, Clone)]
pub struct SymbolData {
    pub name: Symbol,
    pub ty: Type,
    pub defining_scope: ScopeId,
    pub span: Span,
    pub kind: SymbolKind,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Symbol,
    pub ty: Type,
}

#[derive(Debug, Clone)]
pub struct FunctionData {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub return_type: Type,
    /// The scope holding the function's parameters and locals, created at
    /// signature-collection time and re-entered when bodies are checked.
    pub scope: ScopeId,
    pub owner_class: Option<ClassId>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub name: Symbol,
    pub ty: Type,
    pub offset: u32,
    pub span: Span,
}

/// Field slot width in bytes: integers, booleans (0/1), and references
/// (class/array/string addresses) are all one word (spec.md §4.3).
pub const FIELD_SLOT_SIZE: u32 = 4;

#[derive(Debug, Clone)]
pub struct ClassData {
    pub name: Symbol,
    pub parent: Option<ClassId>,
    /// Inherited fields first (in the parent's own order), then this
    /// class's own fields in declaration order. Offsets are stable once
    /// the class body is closed.
    pub fields: Vec<FieldInfo>,
    /// The scope holding this class's own (non-inherited) field and
    /// method symbols.
    pub scope: ScopeId,
    pub constructor: Option<FunctionId>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    Undeclared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclareError {
    Duplicate(SymbolId),
}

pub struct SymbolTable {
    scopes: Vec<ScopeData>,
    symbols: Vec<SymbolData>,
    classes: Vec<ClassData>,
    functions: Vec<FunctionData>,
    scope_stack: Vec<ScopeId>,
    global: ScopeId,
}

impl SymbolTable {
    pub fn new() -> Self {
        let global_scope = ScopeData {
            kind: ScopeKind::Global,
            parent: None,
            symbols: IndexMap::new(),
            is_loop: false,
            function_context: None,
            class_context: None,
        };
        let scopes = vec![global_scope];
        let global = ScopeId::from_raw(0);
        Self {
            scopes,
            symbols: Vec::new(),
            classes: Vec::new(),
            functions: Vec::new(),
            scope_stack: vec![global],
            global,
        }
    }

    pub fn global_scope(&self) -> ScopeId {
        self.global
    }

    pub fn current_scope(&self) -> ScopeId {
        *self.scope_stack.last().expect("scope stack never empty")
    }

    /// Scope stack depth after the global scope; zero once every
    /// `enter_scope` has been matched by an `exit_scope` (spec.md §8).
    pub fn depth(&self) -> usize {
        self.scope_stack.len() - 1
    }

    pub fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let parent = self.current_scope();
        let id = ScopeId::from_raw(self.scopes.len() as u32);
        self.scopes.push(ScopeData {
            kind,
            parent: Some(parent),
            symbols: IndexMap::new(),
            is_loop: false,
            function_context: self.scope(parent).function_context,
            class_context: self.scope(parent).class_context,
        });
        self.scope_stack.push(id);
        id
    }

    /// Re-enters a scope created during signature collection (for function
    /// bodies and class bodies, checked in a later pass). Same LIFO
    /// discipline as `enter_scope`.
    pub fn enter_existing_scope(&mut self, scope: ScopeId) {
        self.scope_stack.push(scope);
    }

    pub fn exit_scope(&mut self) {
        assert!(self.scope_stack.len() > 1, "cannot exit the global scope");
        self.scope_stack.pop();
    }

    pub fn mark_loop(&mut self, scope: ScopeId) {
        self.scopes[scope.index()].is_loop = true;
    }

    pub fn set_function_context(&mut self, scope: ScopeId, function: FunctionId) {
        self.scopes[scope.index()].function_context = Some(function);
    }

    pub fn set_class_context(&mut self, scope: ScopeId, class: ClassId) {
        self.scopes[scope.index()].class_context = Some(class);
    }

    pub fn scope(&self, id: ScopeId) -> &ScopeData {
        &self.scopes[id.index()]
    }

    pub fn symbol(&self, id: SymbolId) -> &SymbolData {
        &self.symbols[id.index()]
    }

    pub fn class(&self, id: ClassId) -> &ClassData {
        &self.classes[id.index()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassData {
        &mut self.classes[id.index()]
    }

    pub fn function(&self, id: FunctionId) -> &FunctionData {
        &self.functions[id.index()]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionData {
        &mut self.functions[id.index()]
    }

    pub fn mark_initialized(&mut self, id: SymbolId) {
        if let SymbolKind::Variable { initialized } = &mut self.symbols[id.index()].kind {
            *initialized = true;
        }
    }

    pub fn push_class(&mut self, data: ClassData) -> ClassId {
        let id = ClassId::from_raw(self.classes.len() as u32);
        self.classes.push(data);
        id
    }

    pub fn push_function(&mut self, data: FunctionData) -> FunctionId {
        let id = FunctionId::from_raw(self.functions.len() as u32);
        self.functions.push(data);
        id
    }

    /// Inserts into the current scope. Fails with the pre-existing symbol
    /// if the name is already present in this scope (spec.md §4.1).
    pub fn declare(
        &mut self,
        name: Symbol,
        ty: Type,
        kind: SymbolKind,
        span: Span,
    ) -> Result<SymbolId, DeclareError> {
        let scope_id = self.current_scope();
        if let Some(&existing) = self.scopes[scope_id.index()].symbols.get(&name) {
            return Err(DeclareError::Duplicate(existing));
        }
        let id = SymbolId::from_raw(self.symbols.len() as u32);
        self.symbols.push(SymbolData {
            name,
            ty,
            defining_scope: scope_id,
            span,
            kind,
        });
        self.scopes[scope_id.index()].symbols.insert(name, id);
        Ok(id)
    }

    /// Walks current scope then each parent in turn.
    pub fn resolve(&self, name: Symbol) -> Result<SymbolId, LookupError> {
        self.resolve_from(self.current_scope(), name)
    }

    pub fn resolve_from(&self, scope: ScopeId, name: Symbol) -> Result<SymbolId, LookupError> {
        let mut cur = Some(scope);
        while let Some(id) = cur {
            if let Some(&sym) = self.scopes[id.index()].symbols.get(&name) {
                return Ok(sym);
            }
            cur = self.scopes[id.index()].parent;
        }
        Err(LookupError::Undeclared)
    }

    /// Looks up `name` in exactly `scope`, with no parent walk — used for
    /// `obj.field` and `super.method` (spec.md §4.1).
    pub fn resolve_in(&self, scope: ScopeId, name: Symbol) -> Result<SymbolId, LookupError> {
        self.scopes[scope.index()]
            .symbols
            .get(&name)
            .copied()
            .ok_or(LookupError::Undeclared)
    }

    /// Resolves `name` as a member of `class`, walking the ancestor chain
    /// (spec.md §4.3: "field of `C` or an ancestor").
    pub fn resolve_member(&self, class: ClassId, name: Symbol) -> Option<(ClassId, SymbolId)> {
        let mut cur = Some(class);
        while let Some(id) = cur {
            let data = self.class(id);
            if let Ok(sym) = self.resolve_in(data.scope, name) {
                return Some((id, sym));
            }
            cur = data.parent;
        }
        None
    }

    pub fn current_function(&self) -> Option<FunctionId> {
        self.scope(self.current_scope()).function_context
    }

    pub fn current_class(&self) -> Option<ClassId> {
        self.scope(self.current_scope()).class_context
    }

    pub fn innermost_loop(&self) -> Option<ScopeId> {
        let mut cur = Some(self.current_scope());
        while let Some(id) = cur {
            if self.scope(id).is_loop {
                return Some(id);
            }
            cur = self.scope(id).parent;
        }
        None
    }

    /// Textual scope-tree dump (spec.md §6): one scope per indent level,
    /// each symbol as `kind name : type [const?] [init?]`.
    pub fn dump(&self, resolve_symbol: impl Fn(Symbol) -> String + Copy) -> String {
        let mut out = String::new();
        self.dump_scope(self.global, 0, resolve_symbol, &mut out);
        out
    }

    fn dump_scope(
        &self,
        scope: ScopeId,
        depth: usize,
        resolve_symbol: impl Fn(Symbol) -> String + Copy,
        out: &mut String,
    ) {
        let indent = "  ".repeat(depth);
        let data = self.scope(scope);
        out.push_str(&format!("{indent}{:?}\n", data.kind));
        for &sym_id in data.symbols.values() {
            let sym = self.symbol(sym_id);
            let (kind, extra) = match sym.kind {
                SymbolKind::Variable { initialized } => {
                    ("var", if initialized { " init" } else { "" })
                }
                SymbolKind::Constant => ("const", " init"),
                SymbolKind::Function(_) => ("function", ""),
                SymbolKind::Class(_) => ("class", ""),
            };
            let ty = sym.ty.describe(|id| resolve_symbol(self.class(id).name));
            out.push_str(&format!(
                "{indent}  {kind} {} : {ty}{extra}\n",
                resolve_symbol(sym.name)
            ));
        }
        for (idx, other) in self.scopes.iter().enumerate() {
            if other.parent == Some(scope) {
                self.dump_scope(ScopeId::from_raw(idx as u32), depth + 1, resolve_symbol, out);
            }
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Emits a `DuplicateDeclaration` diagnostic for a failed `declare` call.
pub fn report_duplicate(
    diagnostics: &mut Diagnostics,
    name: &str,
    span: Span,
) {
    diagnostics
        .report(cpsc_util::DiagnosticKind::DuplicateDeclaration, span)
        .message(format!("'{name}' is already declared in this scope"))
        .emit();
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpsc_util::Interner;

    #[test]
    fn duplicate_declaration_in_same_scope_fails() {
        let mut table = SymbolTable::new();
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let span = Span::new(0, 1);
        table
            .declare(x, Type::Integer, SymbolKind::Variable { initialized: true }, span)
            .unwrap();
        let err = table
            .declare(x, Type::Integer, SymbolKind::Variable { initialized: true }, span)
            .unwrap_err();
        assert!(matches!(err, DeclareError::Duplicate(_)));
    }

    #[test]
    fn resolve_walks_parent_chain() {
        let mut table = SymbolTable::new();
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let span = Span::new(0, 1);
        table
            .declare(x, Type::Integer, SymbolKind::Variable { initialized: true }, span)
            .unwrap();
        table.enter_scope(ScopeKind::Block);
        assert!(table.resolve(x).is_ok());
        table.exit_scope();
        assert_eq!(table.depth(), 0);
    }

    #[test]
    fn resolve_in_does_not_walk_parent() {
        let mut table = SymbolTable::new();
        let mut interner = Interner::new();
        let x = interner.intern("x");
        let span = Span::new(0, 1);
        table
            .declare(x, Type::Integer, SymbolKind::Variable { initialized: true }, span)
            .unwrap();
        let child = table.enter_scope(ScopeKind::Block);
        assert!(table.resolve_in(child, x).is_err());
        table.exit_scope();
    }

    #[test]
    fn innermost_loop_found_through_nested_blocks() {
        let mut table = SymbolTable::new();
        let loop_scope = table.enter_scope(ScopeKind::Block);
        table.mark_loop(loop_scope);
        table.enter_scope(ScopeKind::Block);
        assert_eq!(table.innermost_loop(), Some(loop_scope));
        table.exit_scope();
        table.exit_scope();
        assert!(table.innermost_loop().is_none());
    }
}
