//! The semantic analyzer (spec.md §4.1/§4.3): a two-pass traversal over the
//! parsed program. Pass one collects every class and function signature so
//! forward references and mutual recursion resolve; pass two checks bodies
//! and lowers them into the annotated tree in `checked`.

use cpsc_syntax::ast;
use cpsc_util::{ClassId, DiagnosticKind, Diagnostics, FunctionId, Interner, Span, Symbol, SymbolId};

use crate::checked::{
    CheckedClass, CheckedExpr, CheckedFunction, CheckedProgram, CheckedStmt, CheckedStmtKind,
};
use crate::symtab::{
    self, ClassData, FieldInfo, FunctionData, Param, ScopeKind, SymbolKind, SymbolTable, FIELD_SLOT_SIZE,
};
use crate::types::{is_assignable, Type};

pub struct Analyzer<'a> {
    pub(crate) table: SymbolTable,
    pub(crate) interner: &'a mut Interner,
    pub(crate) diagnostics: Diagnostics,
    /// Top-level function declarations only (methods and constructors are
    /// re-read off their `ClassDecl` during the class body pass), paired
    /// with the `FunctionId` their signature was registered under.
    top_level_fns: Vec<(FunctionId, ast::FunctionDecl)>,
    class_decls: Vec<ast::ClassDecl>,
}

/// Runs both passes and returns the annotated program, the symbol table
/// backing it, and every diagnostic raised along the way.
pub fn analyze(program: &ast::Program, interner: &mut Interner) -> (CheckedProgram, SymbolTable, Diagnostics) {
    let mut analyzer = Analyzer {
        table: SymbolTable::new(),
        interner,
        diagnostics: Diagnostics::new(),
        top_level_fns: Vec::new(),
        class_decls: Vec::new(),
    };
    let checked = analyzer.run(program);
    (checked, analyzer.table, analyzer.diagnostics)
}

impl<'a> Analyzer<'a> {
    pub(crate) fn error(&mut self, kind: DiagnosticKind, span: Span, message: impl Into<String>) {
        self.diagnostics.report(kind, span).message(message).emit();
    }

    pub(crate) fn describe(&self, ty: &Type) -> String {
        let interner = &*self.interner;
        let table = &self.table;
        ty.describe(|id| interner.resolve(table.class(id).name).to_owned())
    }

    fn run(&mut self, program: &ast::Program) -> CheckedProgram {
        self.collect_signatures(&program.items);

        let mut functions = Vec::new();
        for (id, decl) in std::mem::take(&mut self.top_level_fns) {
            functions.push(self.check_function_body(id, &decl.params, &decl.body, decl.span, decl.name));
        }

        let mut classes = Vec::new();
        for decl in std::mem::take(&mut self.class_decls) {
            classes.push(self.check_class_body(&decl));
        }

        let mut main_body = Vec::new();
        for item in &program.items {
            if let ast::StmtKind::FunctionDecl(_) | ast::StmtKind::ClassDecl(_) = &item.kind {
                continue;
            }
            main_body.push(self.check_stmt(item));
        }

        CheckedProgram { functions, classes, main_body }
    }

    // ---- Pass 1: signatures ------------------------------------------------

    fn collect_signatures(&mut self, items: &[ast::Stmt]) {
        // `main` names the synthetic TAC wrapper around global-scope
        // statements (spec.md §4.4); reserving it up front turns a user
        // declaration of the same name into an ordinary duplicate.
        self.reserve_global_name("main");

        // Classes are pre-declared before any signature is resolved, so a
        // parent or field type named later in the same program still binds.
        for item in items {
            if let ast::StmtKind::ClassDecl(decl) = &item.kind {
                self.predeclare_class(decl);
            }
        }
        for item in items {
            if let ast::StmtKind::FunctionDecl(decl) = &item.kind {
                self.collect_function_signature(decl, None);
            }
        }
        for item in items {
            if let ast::StmtKind::ClassDecl(decl) = &item.kind {
                self.collect_class_signature(decl);
            }
        }
        self.class_decls = items
            .iter()
            .filter_map(|item| match &item.kind {
                ast::StmtKind::ClassDecl(decl) => Some(decl.clone()),
                _ => None,
            })
            .collect();
    }

    /// Occupies a global-scope name with a phantom function symbol so any
    /// later user declaration of the same name reports `DuplicateDeclaration`
    /// through the normal `declare` path.
    fn reserve_global_name(&mut self, name: &str) {
        let sym = self.interner.intern(name);
        let fn_id = self.table.push_function(FunctionData {
            name: sym,
            params: Vec::new(),
            return_type: Type::Void,
            scope: self.table.global_scope(),
            owner_class: None,
            span: Span::new(0, 0),
        });
        self.table
            .declare(sym, Type::Function { params: Vec::new(), ret: Box::new(Type::Void) }, SymbolKind::Function(fn_id), Span::new(0, 0))
            .expect("reserved name declared before any user symbol");
    }

    fn predeclare_class(&mut self, decl: &ast::ClassDecl) {
        let scope = self.table.enter_scope(ScopeKind::Class);
        self.table.exit_scope();
        let id = self.table.push_class(ClassData {
            name: decl.name,
            parent: None,
            fields: Vec::new(),
            scope,
            constructor: None,
            span: decl.span,
        });
        self.table.set_class_context(scope, id);
        if let Err(symtab::DeclareError::Duplicate(_)) =
            self.table.declare(decl.name, Type::Class(id), SymbolKind::Class(id), decl.name_span)
        {
            symtab::report_duplicate(&mut self.diagnostics, self.interner.resolve(decl.name), decl.name_span);
        }
    }

    fn collect_class_signature(&mut self, decl: &ast::ClassDecl) {
        let class_id = self.class_id_of(decl.name);

        let parent_id = decl.parent.as_ref().and_then(|(name, span)| {
            if *name == decl.name {
                self.error(DiagnosticKind::BadInheritance, *span, "a class cannot inherit from itself");
                return None;
            }
            match self.table.resolve(*name) {
                Ok(sym) => match self.table.symbol(sym).kind {
                    SymbolKind::Class(parent_class) => Some(parent_class),
                    _ => {
                        self.error(
                            DiagnosticKind::BadInheritance,
                            *span,
                            format!("'{}' is not a class", self.interner.resolve(*name)),
                        );
                        None
                    }
                },
                Err(_) => {
                    self.error(
                        DiagnosticKind::UndeclaredIdentifier,
                        *span,
                        format!("undeclared class '{}'", self.interner.resolve(*name)),
                    );
                    None
                }
            }
        });
        if let Some(parent) = parent_id {
            if self.inherits_from(parent, class_id) {
                self.error(DiagnosticKind::BadInheritance, decl.span, "inheritance cycle detected");
            } else {
                self.table.class_mut(class_id).parent = Some(parent);
            }
        }

        let class_scope = self.table.class(class_id).scope;
        let mut fields: Vec<FieldInfo> = self
            .table
            .class(class_id)
            .parent
            .map(|p| self.table.class(p).fields.clone())
            .unwrap_or_default();
        let mut next_offset = fields.len() as u32 * FIELD_SLOT_SIZE;

        self.table.enter_existing_scope(class_scope);
        for field in &decl.fields {
            let ty = field.ty.as_ref().map(|t| self.resolve_type(t)).unwrap_or(Type::Unknown);
            let kind = if field.kind == ast::DeclKind::Const {
                SymbolKind::Constant
            } else {
                SymbolKind::Variable { initialized: field.init.is_some() }
            };
            match self.table.declare(field.name, ty.clone(), kind, field.span) {
                Ok(_) => {
                    fields.push(FieldInfo { name: field.name, ty, offset: next_offset, span: field.span });
                    next_offset += FIELD_SLOT_SIZE;
                }
                Err(symtab::DeclareError::Duplicate(_)) => {
                    symtab::report_duplicate(&mut self.diagnostics, self.interner.resolve(field.name), field.span);
                }
            }
        }
        self.table.class_mut(class_id).fields = fields;

        for method in &decl.methods {
            self.collect_function_signature(method, Some(class_id));
        }

        if let Some(ctor) = &decl.constructor {
            let params = self.resolve_params(&ctor.params);
            let fn_scope = self.table.enter_scope(ScopeKind::Function);
            self.declare_params(&params, &ctor.params);
            self.table.exit_scope();
            let fn_id = self.table.push_function(FunctionData {
                name: decl.name,
                params,
                return_type: Type::Void,
                scope: fn_scope,
                owner_class: Some(class_id),
                span: ctor.span,
            });
            self.table.set_function_context(fn_scope, fn_id);
            self.table.set_class_context(fn_scope, class_id);
            if self.table.class(class_id).constructor.is_some() {
                self.error(
                    DiagnosticKind::DuplicateDeclaration,
                    ctor.span,
                    "a class may declare at most one constructor",
                );
            } else {
                self.table.class_mut(class_id).constructor = Some(fn_id);
            }
        }
        for span in &decl.extra_constructors {
            self.error(DiagnosticKind::DuplicateDeclaration, *span, "a class may declare at most one constructor");
        }
        self.table.exit_scope();
    }

    fn inherits_from(&self, mut class: ClassId, ancestor: ClassId) -> bool {
        loop {
            if class == ancestor {
                return true;
            }
            match self.table.class(class).parent {
                Some(p) => class = p,
                None => return false,
            }
        }
    }

    fn class_id_of(&self, name: Symbol) -> ClassId {
        match self.table.resolve_in(self.table.global_scope(), name) {
            Ok(sym) => match self.table.symbol(sym).kind {
                SymbolKind::Class(id) => id,
                _ => unreachable!("predeclare_class always declares a Class symbol"),
            },
            Err(_) => unreachable!("class was just predeclared"),
        }
    }

    fn collect_function_signature(&mut self, decl: &ast::FunctionDecl, owner_class: Option<ClassId>) {
        let params = self.resolve_params(&decl.params);
        let return_type = decl.return_type.as_ref().map(|t| self.resolve_type(t)).unwrap_or(Type::Void);
        let fn_scope = self.table.enter_scope(ScopeKind::Function);
        self.declare_params(&params, &decl.params);
        self.table.exit_scope();
        let param_types: Vec<Type> = params.iter().map(|p| p.ty.clone()).collect();
        let fn_id = self.table.push_function(FunctionData {
            name: decl.name,
            params,
            return_type: return_type.clone(),
            scope: fn_scope,
            owner_class,
            span: decl.span,
        });
        self.table.set_function_context(fn_scope, fn_id);
        if let Some(class_id) = owner_class {
            self.table.set_class_context(fn_scope, class_id);
            self.check_override(class_id, decl.name, decl.name_span, &param_types, &return_type);
        }

        match self.table.declare(
            decl.name,
            Type::Function { params: param_types, ret: Box::new(return_type) },
            SymbolKind::Function(fn_id),
            decl.name_span,
        ) {
            Ok(_) => {}
            Err(symtab::DeclareError::Duplicate(_)) => {
                symtab::report_duplicate(&mut self.diagnostics, self.interner.resolve(decl.name), decl.name_span);
            }
        }

        if owner_class.is_none() {
            self.top_level_fns.push((fn_id, decl.clone()));
        }
    }

    /// Checks a method against the parent's member of the same name, if
    /// any: an override must match the parent's parameter and return types
    /// exactly (spec.md §4.3).
    fn check_override(
        &mut self,
        class_id: ClassId,
        name: Symbol,
        name_span: Span,
        param_types: &[Type],
        return_type: &Type,
    ) {
        let Some(parent) = self.table.class(class_id).parent else { return };
        let Some((_, sym_id)) = self.table.resolve_member(parent, name) else { return };
        let SymbolKind::Function(parent_fn) = self.table.symbol(sym_id).kind else { return };
        let parent_fn = self.table.function(parent_fn);
        let parent_params: Vec<Type> = parent_fn.params.iter().map(|p| p.ty.clone()).collect();
        let parent_return = parent_fn.return_type.clone();
        if parent_params.as_slice() != param_types || parent_return != *return_type {
            self.error(
                DiagnosticKind::OverrideSignatureMismatch,
                name_span,
                format!("override of '{}' does not match the parent's signature", self.interner.resolve(name)),
            );
        }
    }

    fn resolve_params(&mut self, params: &[ast::Param]) -> Vec<Param> {
        params.iter().map(|p| Param { name: p.name, ty: self.resolve_type(&p.ty) }).collect()
    }

    fn declare_params(&mut self, resolved: &[Param], source: &[ast::Param]) {
        for (param, src) in resolved.iter().zip(source) {
            if let Err(symtab::DeclareError::Duplicate(_)) =
                self.table.declare(param.name, param.ty.clone(), SymbolKind::Variable { initialized: true }, src.span)
            {
                symtab::report_duplicate(&mut self.diagnostics, self.interner.resolve(param.name), src.span);
            }
        }
    }

    pub(crate) fn resolve_type(&mut self, ty: &ast::Type) -> Type {
        match &ty.kind {
            ast::TypeKind::Integer => Type::Integer,
            ast::TypeKind::String => Type::String,
            ast::TypeKind::Boolean => Type::Boolean,
            ast::TypeKind::Void => Type::Void,
            ast::TypeKind::Array(elem) => Type::array_of(self.resolve_type(elem)),
            ast::TypeKind::Named(name) => match self.table.resolve(*name) {
                Ok(sym) => match self.table.symbol(sym).kind {
                    SymbolKind::Class(id) => Type::Class(id),
                    _ => {
                        self.error(
                            DiagnosticKind::UndeclaredIdentifier,
                            ty.span,
                            format!("'{}' is not a type", self.interner.resolve(*name)),
                        );
                        Type::Unknown
                    }
                },
                Err(_) => {
                    self.error(
                        DiagnosticKind::UndeclaredIdentifier,
                        ty.span,
                        format!("undeclared type '{}'", self.interner.resolve(*name)),
                    );
                    Type::Unknown
                }
            },
        }
    }

    // ---- Pass 2: bodies -----------------------------------------------------

    fn check_function_body(
        &mut self,
        id: FunctionId,
        params: &[ast::Param],
        body: &[ast::Stmt],
        span: Span,
        name: Symbol,
    ) -> CheckedFunction {
        let scope = self.table.function(id).scope;
        let return_type = self.table.function(id).return_type.clone();

        self.table.enter_existing_scope(scope);
        let param_ids: Vec<SymbolId> = params
            .iter()
            .filter_map(|p| self.table.resolve_in(scope, p.name).ok())
            .collect();
        let checked_body: Vec<CheckedStmt> = body.iter().map(|s| self.check_stmt(s)).collect();
        self.table.exit_scope();

        if return_type != Type::Void && !Self::always_returns(&checked_body) {
            self.error(
                DiagnosticKind::MissingReturn,
                span,
                format!("function '{}' does not return a value on every path", self.interner.resolve(name)),
            );
        }

        CheckedFunction { id, params: param_ids, body: checked_body }
    }

    fn always_returns(body: &[CheckedStmt]) -> bool {
        body.iter().any(Self::stmt_always_returns)
    }

    fn stmt_always_returns(stmt: &CheckedStmt) -> bool {
        match &stmt.kind {
            CheckedStmtKind::Return(_) => true,
            CheckedStmtKind::Block(inner) => Self::always_returns(inner),
            CheckedStmtKind::If { then_branch, else_branch: Some(else_branch), .. } => {
                Self::stmt_always_returns(then_branch) && Self::stmt_always_returns(else_branch)
            }
            _ => false,
        }
    }

    fn check_class_body(&mut self, decl: &ast::ClassDecl) -> CheckedClass {
        let class_id = self.class_id_of(decl.name);
        let class_scope = self.table.class(class_id).scope;

        let mut methods = Vec::new();
        for method in &decl.methods {
            let Ok(sym) = self.table.resolve_in(class_scope, method.name) else { continue };
            let SymbolKind::Function(fn_id) = self.table.symbol(sym).kind else { continue };
            methods.push(self.check_function_body(fn_id, &method.params, &method.body, method.span, method.name));
        }

        let constructor = match (&decl.constructor, self.table.class(class_id).constructor) {
            (Some(ctor), Some(fn_id)) => Some(self.check_function_body(
                fn_id,
                &ctor.params,
                &ctor.body,
                ctor.span,
                decl.name,
            )),
            _ => None,
        };

        CheckedClass { id: class_id, constructor, methods }
    }

    fn check_stmt(&mut self, stmt: &ast::Stmt) -> CheckedStmt {
        let span = stmt.span;
        let kind = match &stmt.kind {
            ast::StmtKind::VarDecl { kind, name, name_span, ty, init } => {
                self.check_var_decl(*kind, *name, *name_span, ty.as_ref(), init.as_ref())
            }
            ast::StmtKind::FunctionDecl(_) | ast::StmtKind::ClassDecl(_) => {
                // Hoisted and checked by the signature/body passes; a no-op
                // placeholder keeps statement ordinals aligned with source.
                CheckedStmtKind::Block(Vec::new())
            }
            ast::StmtKind::ExprStmt(expr) => CheckedStmtKind::ExprStmt(self.check_expr(expr)),
            ast::StmtKind::Block(stmts) => {
                self.table.enter_scope(ScopeKind::Block);
                let body = stmts.iter().map(|s| self.check_stmt(s)).collect();
                self.table.exit_scope();
                CheckedStmtKind::Block(body)
            }
            ast::StmtKind::If { cond, then_branch, else_branch } => {
                let cond = self.check_condition(cond);
                let then_branch = Box::new(self.check_stmt(then_branch));
                let else_branch = else_branch.as_ref().map(|s| Box::new(self.check_stmt(s)));
                CheckedStmtKind::If { cond, then_branch, else_branch }
            }
            ast::StmtKind::While { cond, body } => {
                let cond = self.check_condition(cond);
                let loop_scope = self.table.enter_scope(ScopeKind::Block);
                self.table.mark_loop(loop_scope);
                let body = Box::new(self.check_stmt(body));
                self.table.exit_scope();
                CheckedStmtKind::While { cond, body }
            }
            ast::StmtKind::DoWhile { body, cond } => {
                let loop_scope = self.table.enter_scope(ScopeKind::Block);
                self.table.mark_loop(loop_scope);
                let body = Box::new(self.check_stmt(body));
                self.table.exit_scope();
                let cond = self.check_condition(cond);
                CheckedStmtKind::DoWhile { body, cond }
            }
            ast::StmtKind::For { init, cond, step, body } => {
                self.table.enter_scope(ScopeKind::Block);
                let init = init.as_ref().map(|s| Box::new(self.check_stmt(s)));
                let cond = cond.as_ref().map(|c| self.check_condition(c));
                let step = step.as_ref().map(|s| self.check_expr(s));
                let loop_scope = self.table.enter_scope(ScopeKind::Block);
                self.table.mark_loop(loop_scope);
                let body = Box::new(self.check_stmt(body));
                self.table.exit_scope();
                self.table.exit_scope();
                CheckedStmtKind::For { init, cond, step, body }
            }
            ast::StmtKind::Foreach { var, var_span, iter, body } => {
                let iter = self.check_expr(iter);
                let elem_ty = match &iter.ty {
                    Type::Array(elem) => (**elem).clone(),
                    Type::Unknown => Type::Unknown,
                    other => {
                        self.error(
                            DiagnosticKind::TypeMismatch,
                            iter.span,
                            format!("'foreach' requires an array, found '{}'", self.describe(other)),
                        );
                        Type::Unknown
                    }
                };
                let loop_scope = self.table.enter_scope(ScopeKind::Block);
                self.table.mark_loop(loop_scope);
                let var_id = match self.table.declare(*var, elem_ty, SymbolKind::Variable { initialized: true }, *var_span) {
                    Ok(id) => id,
                    Err(symtab::DeclareError::Duplicate(existing)) => existing,
                };
                let body = Box::new(self.check_stmt(body));
                self.table.exit_scope();
                CheckedStmtKind::Foreach { var: var_id, iter, body }
            }
            ast::StmtKind::Switch { subject, cases, default } => {
                let subject = self.check_expr(subject);
                let cases = cases
                    .iter()
                    .map(|case| {
                        let value = self.check_expr(&case.value);
                        if value.ty != Type::Unknown && subject.ty != Type::Unknown && value.ty != subject.ty {
                            self.error(
                                DiagnosticKind::TypeMismatch,
                                value.span,
                                format!(
                                    "case value has type '{}', expected '{}'",
                                    self.describe(&value.ty),
                                    self.describe(&subject.ty)
                                ),
                            );
                        }
                        self.table.enter_scope(ScopeKind::Block);
                        let body = case.body.iter().map(|s| self.check_stmt(s)).collect();
                        self.table.exit_scope();
                        (value, body)
                    })
                    .collect();
                let default = default.as_ref().map(|stmts| {
                    self.table.enter_scope(ScopeKind::Block);
                    let body = stmts.iter().map(|s| self.check_stmt(s)).collect();
                    self.table.exit_scope();
                    body
                });
                CheckedStmtKind::Switch { subject, cases, default }
            }
            ast::StmtKind::Break => {
                if self.table.innermost_loop().is_none() {
                    self.error(DiagnosticKind::BreakContinueOutsideLoop, span, "'break' outside a loop");
                }
                CheckedStmtKind::Break
            }
            ast::StmtKind::Continue => {
                if self.table.innermost_loop().is_none() {
                    self.error(DiagnosticKind::BreakContinueOutsideLoop, span, "'continue' outside a loop");
                }
                CheckedStmtKind::Continue
            }
            ast::StmtKind::Return(value) => {
                let checked = value.as_ref().map(|e| self.check_expr(e));
                match self.table.current_function() {
                    None => {
                        self.error(DiagnosticKind::ReturnOutsideFunction, span, "'return' outside a function");
                    }
                    Some(fn_id) => {
                        let expected = self.table.function(fn_id).return_type.clone();
                        let actual = checked.as_ref().map(|c| c.ty.clone()).unwrap_or(Type::Void);
                        if !is_assignable(&expected, &actual) {
                            self.error(
                                DiagnosticKind::ReturnTypeMismatch,
                                span,
                                format!("returns '{}', expected '{}'", self.describe(&actual), self.describe(&expected)),
                            );
                        }
                    }
                }
                CheckedStmtKind::Return(checked)
            }
            ast::StmtKind::Try { body, catch_name, catch_body } => {
                self.table.enter_scope(ScopeKind::Block);
                let body = Box::new(self.check_stmt(body));
                self.table.exit_scope();
                self.table.enter_scope(ScopeKind::Block);
                let catch_symbol = match self.table.declare(
                    *catch_name,
                    Type::String,
                    SymbolKind::Variable { initialized: true },
                    span,
                ) {
                    Ok(id) => id,
                    Err(symtab::DeclareError::Duplicate(existing)) => existing,
                };
                let catch_body = Box::new(self.check_stmt(catch_body));
                self.table.exit_scope();
                CheckedStmtKind::Try { body, catch_symbol, catch_body }
            }
            ast::StmtKind::Print(expr) => CheckedStmtKind::Print(self.check_expr(expr)),
            ast::StmtKind::Error => CheckedStmtKind::Error,
        };
        CheckedStmt { kind, span }
    }

    fn check_condition(&mut self, expr: &ast::Expr) -> CheckedExpr {
        let checked = self.check_expr(expr);
        if checked.ty != Type::Unknown && checked.ty != Type::Boolean {
            self.error(
                DiagnosticKind::BadCondition,
                checked.span,
                format!("condition must be boolean, found '{}'", self.describe(&checked.ty)),
            );
        }
        checked
    }

    fn check_var_decl(
        &mut self,
        kind: ast::DeclKind,
        name: Symbol,
        name_span: Span,
        ty: Option<&ast::Type>,
        init: Option<&ast::Expr>,
    ) -> CheckedStmtKind {
        let declared_ty = ty.map(|t| self.resolve_type(t));
        let init_checked = init.map(|e| self.check_expr(e));

        let final_ty = match (&declared_ty, &init_checked) {
            (Some(t), Some(v)) => {
                if !is_assignable(t, &v.ty) {
                    self.error(
                        DiagnosticKind::TypeMismatch,
                        v.span,
                        format!("cannot initialize '{}' with '{}'", self.describe(t), self.describe(&v.ty)),
                    );
                }
                t.clone()
            }
            (Some(t), None) => t.clone(),
            (None, Some(v)) => v.ty.clone(),
            (None, None) => Type::Unknown,
        };

        if kind == ast::DeclKind::Const && init_checked.is_none() {
            self.error(DiagnosticKind::TypeMismatch, name_span, "constant must be initialized");
        }

        let symbol_kind = if kind == ast::DeclKind::Const {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable { initialized: init_checked.is_some() }
        };

        let symbol = match self.table.declare(name, final_ty, symbol_kind, name_span) {
            Ok(id) => id,
            Err(symtab::DeclareError::Duplicate(_)) => {
                symtab::report_duplicate(&mut self.diagnostics, self.interner.resolve(name), name_span);
                return CheckedStmtKind::Error;
            }
        };

        CheckedStmtKind::VarDecl { symbol, init: init_checked }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnose(src: &str) -> Vec<DiagnosticKind> {
        let mut parsed = cpsc_syntax::parse(src);
        assert!(parsed.diagnostics.is_empty(), "unexpected parse errors: {:?}", parsed.diagnostics.iter().collect::<Vec<_>>());
        let (_, _, diagnostics) = analyze(&parsed.program, &mut parsed.interner);
        diagnostics.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn valid_method_call_arity_accepts() {
        let src = "class T { function add(a:integer,b:integer):integer { return a+b; } } \
                    let o:T=new T(); let r:integer=o.add(1,2);";
        assert_eq!(diagnose(src), Vec::<DiagnosticKind>::new());
    }

    #[test]
    fn wrong_arity_call_rejected() {
        let src = "class T { function add(a:integer,b:integer):integer { return a+b; } } \
                    let o:T=new T(); o.add(1);";
        assert_eq!(diagnose(src), vec![DiagnosticKind::ArityMismatch]);
    }

    #[test]
    fn bad_property_access_rejected() {
        let src = "class P { let edad:integer; } let j:P=new P(); let x:integer=j.edades;";
        assert_eq!(diagnose(src), vec![DiagnosticKind::BadPropertyAccess]);
    }

    #[test]
    fn inherited_fields_laid_out_before_own_fields() {
        let src = "class Persona { let nombre:string; let edad:integer; let color:string; } \
                    class Estudiante:Persona { let grado:integer; }";
        let mut parsed = cpsc_syntax::parse(src);
        let (_, table, diagnostics) = analyze(&parsed.program, &mut parsed.interner);
        assert!(diagnostics.is_empty());
        let grado = parsed.interner.intern("grado");
        let estudiante = match table.symbol(table.resolve(parsed.interner.intern("Estudiante")).unwrap()).kind {
            SymbolKind::Class(id) => id,
            _ => panic!("expected a class symbol"),
        };
        let field = table.class(estudiante).fields.iter().find(|f| f.name == grado).unwrap();
        assert_eq!(field.offset, 3 * FIELD_SLOT_SIZE);
    }

    #[test]
    fn self_inheritance_rejected() {
        assert_eq!(diagnose("class C : C { }"), vec![DiagnosticKind::BadInheritance]);
    }

    #[test]
    fn inheriting_from_non_class_rejected() {
        let src = "function f():void {} class C : f { }";
        assert_eq!(diagnose(src), vec![DiagnosticKind::BadInheritance]);
    }

    #[test]
    fn assignment_to_constant_rejected() {
        assert_eq!(diagnose("const x:integer = 1; x = 2;"), vec![DiagnosticKind::AssignToImmutable]);
    }

    #[test]
    fn break_at_file_scope_rejected_inside_loop_accepted() {
        assert_eq!(diagnose("break;"), vec![DiagnosticKind::BreakContinueOutsideLoop]);
        assert_eq!(
            diagnose("function f():void { while (true) { break; } }"),
            Vec::<DiagnosticKind>::new()
        );
    }

    #[test]
    fn heterogeneous_array_literal_rejected() {
        assert_eq!(diagnose("let a = [1, \"two\"];"), vec![DiagnosticKind::BadArrayLiteral]);
    }

    #[test]
    fn missing_return_on_non_void_function_rejected() {
        assert_eq!(
            diagnose("function f():integer { let x:integer = 1; }"),
            vec![DiagnosticKind::MissingReturn]
        );
    }

    #[test]
    fn override_with_mismatched_signature_rejected() {
        let src = "class A { function m(a:integer):integer { return a; } } \
                    class B : A { function m(a:string):integer { return 1; } }";
        assert_eq!(diagnose(src), vec![DiagnosticKind::OverrideSignatureMismatch]);
    }

    #[test]
    fn duplicate_constructor_rejected() {
        let src = "class C { function constructor() {} init() {} }";
        assert_eq!(diagnose(src), vec![DiagnosticKind::DuplicateDeclaration]);
    }
}
