//! The expression evaluator (spec.md §4.2): assigns a type and a value
//! category to every expression node per the precedence/typing table.
//! Implemented as an `impl Analyzer` extension so it shares the analyzer's
//! symbol table, interner, and diagnostics without a second mutable
//! borrow of the same state.

use cpsc_util::DiagnosticKind;
use cpsc_syntax::ast::{self, BinaryOp, ExprKind, LogicalOp, UnaryOp};

use crate::analyzer::Analyzer;
use crate::checked::{CheckedExpr, CheckedExprKind};
use crate::symtab::SymbolKind;
use crate::types::{Type, ValueCategory, is_assignable, is_comparable_eq};

impl Analyzer<'_> {
    pub(crate) fn check_expr(&mut self, expr: &ast::Expr) -> CheckedExpr {
        let span = expr.span;
        match &expr.kind {
            ExprKind::IntLiteral(v) => self.value(CheckedExprKind::IntLiteral(*v), Type::Integer, span),
            ExprKind::StringLiteral(s) => {
                self.value(CheckedExprKind::StringLiteral(*s), Type::String, span)
            }
            ExprKind::BoolLiteral(b) => self.value(CheckedExprKind::BoolLiteral(*b), Type::Boolean, span),
            ExprKind::NullLiteral => self.value(CheckedExprKind::NullLiteral, Type::Null, span),
            ExprKind::ArrayLiteral(elems) => self.check_array_literal(elems, span),
            ExprKind::Identifier(name) => self.check_identifier(*name, span),
            ExprKind::This => self.check_this(span),
            ExprKind::Super => {
                self.error(DiagnosticKind::ThisOutsideClass, span, "'super' is only valid inside a method");
                self.err(span)
            }
            ExprKind::Unary { op, operand } => self.check_unary(*op, operand, span),
            ExprKind::Binary { op, lhs, rhs } => self.check_binary(*op, lhs, rhs, span),
            ExprKind::Logical { op, lhs, rhs } => self.check_logical(*op, lhs, rhs, span),
            ExprKind::Assign { target, value } => self.check_assign(target, value, span),
            ExprKind::Ternary { cond, then_branch, else_branch } => {
                self.check_ternary(cond, then_branch, else_branch, span)
            }
            ExprKind::Index { base, index } => self.check_index(base, index, span),
            ExprKind::Field { base, name, name_span } => self.check_field(base, *name, *name_span, span),
            ExprKind::Call { callee, args } => self.check_call(callee, args, span),
            ExprKind::New { class_name, class_span, args } => {
                self.check_new(*class_name, *class_span, args, span)
            }
            ExprKind::Error => self.err(span),
        }
    }

    fn value(&self, kind: CheckedExprKind, ty: Type, span: cpsc_util::Span) -> CheckedExpr {
        CheckedExpr { kind, ty, category: ValueCategory::Rvalue, span }
    }

    fn lvalue(&self, kind: CheckedExprKind, ty: Type, span: cpsc_util::Span) -> CheckedExpr {
        CheckedExpr { kind, ty, category: ValueCategory::Lvalue, span }
    }

    pub(crate) fn err(&self, span: cpsc_util::Span) -> CheckedExpr {
        CheckedExpr { kind: CheckedExprKind::Error, ty: Type::Unknown, category: ValueCategory::Rvalue, span }
    }

    fn check_array_literal(&mut self, elems: &[ast::Expr], span: cpsc_util::Span) -> CheckedExpr {
        let checked: Vec<_> = elems.iter().map(|e| self.check_expr(e)).collect();
        let elem_ty = match checked.first() {
            None => Type::Unknown,
            Some(first) => {
                for other in &checked[1..] {
                    if other.ty != Type::Unknown && first.ty != Type::Unknown && other.ty != first.ty {
                        self.error(
                            DiagnosticKind::BadArrayLiteral,
                            other.span,
                            format!(
                                "array literal element has type '{}', expected '{}'",
                                self.describe(&other.ty),
                                self.describe(&first.ty)
                            ),
                        );
                    }
                }
                first.ty.clone()
            }
        };
        self.value(
            CheckedExprKind::ArrayLiteral(checked),
            Type::array_of(elem_ty),
            span,
        )
    }

    fn check_identifier(&mut self, name: cpsc_util::Symbol, span: cpsc_util::Span) -> CheckedExpr {
        let Ok(sym_id) = self.table.resolve(name) else {
            self.error(
                DiagnosticKind::UndeclaredIdentifier,
                span,
                format!("undeclared identifier '{}'", self.interner.resolve(name)),
            );
            return self.err(span);
        };
        let sym = self.table.symbol(sym_id).clone();
        if let SymbolKind::Variable { initialized: false } = sym.kind {
            self.error(
                DiagnosticKind::UninitializedRead,
                span,
                format!("'{}' is read before it is initialized", self.interner.resolve(name)),
            );
        }
        let category = match sym.kind {
            SymbolKind::Constant | SymbolKind::Function(_) | SymbolKind::Class(_) => ValueCategory::Rvalue,
            SymbolKind::Variable { .. } => ValueCategory::Lvalue,
        };
        CheckedExpr { kind: CheckedExprKind::Local(sym_id), ty: sym.ty, category, span }
    }

    fn check_this(&mut self, span: cpsc_util::Span) -> CheckedExpr {
        match self.table.current_class() {
            Some(class) => self.value(CheckedExprKind::This, Type::Class(class), span),
            None => {
                self.error(DiagnosticKind::ThisOutsideClass, span, "'this' is only valid inside a method");
                self.err(span)
            }
        }
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &ast::Expr, span: cpsc_util::Span) -> CheckedExpr {
        let operand = self.check_expr(operand);
        let expected = match op {
            UnaryOp::Not => Type::Boolean,
            UnaryOp::Neg => Type::Integer,
        };
        if operand.ty != Type::Unknown && operand.ty != expected {
            self.error(
                DiagnosticKind::TypeMismatch,
                span,
                format!(
                    "operator '{}' expects {}, found '{}'",
                    if op == UnaryOp::Not { "!" } else { "-" },
                    self.describe(&expected),
                    self.describe(&operand.ty)
                ),
            );
        }
        self.value(
            CheckedExprKind::Unary { op, operand: Box::new(operand) },
            expected,
            span,
        )
    }

    fn check_binary(&mut self, op: BinaryOp, lhs: &ast::Expr, rhs: &ast::Expr, span: cpsc_util::Span) -> CheckedExpr {
        let lhs = self.check_expr(lhs);
        let rhs = self.check_expr(rhs);
        let result_ty = match op {
            BinaryOp::Add => match (&lhs.ty, &rhs.ty) {
                (Type::Unknown, _) | (_, Type::Unknown) => Type::Unknown,
                (Type::Integer, Type::Integer) => Type::Integer,
                (Type::String, Type::String) => Type::String,
                (Type::String, Type::Integer) | (Type::Integer, Type::String) => Type::String,
                _ => {
                    self.mismatch(op, &lhs.ty, &rhs.ty, span);
                    Type::Unknown
                }
            },
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
                if lhs.ty == Type::Unknown || rhs.ty == Type::Unknown {
                    Type::Unknown
                } else if lhs.ty == Type::Integer && rhs.ty == Type::Integer {
                    Type::Integer
                } else {
                    self.mismatch(op, &lhs.ty, &rhs.ty, span);
                    Type::Unknown
                }
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let ok = lhs.ty == Type::Unknown
                    || rhs.ty == Type::Unknown
                    || (lhs.ty == Type::Integer && rhs.ty == Type::Integer)
                    || (lhs.ty == Type::String && rhs.ty == Type::String);
                if !ok {
                    self.mismatch(op, &lhs.ty, &rhs.ty, span);
                }
                Type::Boolean
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                if !is_comparable_eq(&lhs.ty, &rhs.ty) {
                    self.mismatch(op, &lhs.ty, &rhs.ty, span);
                }
                Type::Boolean
            }
        };
        self.value(
            CheckedExprKind::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
            result_ty,
            span,
        )
    }

    fn mismatch(&mut self, op: BinaryOp, lhs: &Type, rhs: &Type, span: cpsc_util::Span) {
        self.error(
            DiagnosticKind::TypeMismatch,
            span,
            format!(
                "operator '{}' cannot be applied to '{}' and '{}'",
                op.as_str(),
                self.describe(lhs),
                self.describe(rhs)
            ),
        );
    }

    fn check_logical(&mut self, op: LogicalOp, lhs: &ast::Expr, rhs: &ast::Expr, span: cpsc_util::Span) -> CheckedExpr {
        let lhs = self.check_expr(lhs);
        let rhs = self.check_expr(rhs);
        for (side, operand) in [("left", &lhs), ("right", &rhs)] {
            if operand.ty != Type::Unknown && operand.ty != Type::Boolean {
                self.error(
                    DiagnosticKind::TypeMismatch,
                    operand.span,
                    format!("{side} operand of '&&'/'||' must be boolean, found '{}'", self.describe(&operand.ty)),
                );
            }
        }
        self.value(
            CheckedExprKind::Logical { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
            Type::Boolean,
            span,
        )
    }

    fn check_assign(&mut self, target: &ast::Expr, value: &ast::Expr, span: cpsc_util::Span) -> CheckedExpr {
        let target = self.check_expr(target);
        let value = self.check_expr(value);

        if target.category != ValueCategory::Lvalue {
            self.error(DiagnosticKind::AssignToImmutable, target.span, "assignment target is not an lvalue");
        } else if let CheckedExprKind::Local(sym_id) = &target.kind {
            let sym = self.table.symbol(*sym_id).clone();
            match sym.kind {
                SymbolKind::Constant => {
                    self.error(
                        DiagnosticKind::AssignToImmutable,
                        target.span,
                        format!("cannot assign to constant '{}'", self.interner.resolve(sym.name)),
                    );
                }
                SymbolKind::Function(_) | SymbolKind::Class(_) => {
                    self.error(
                        DiagnosticKind::AssignToImmutable,
                        target.span,
                        "cannot assign to a function or class name",
                    );
                }
                SymbolKind::Variable { .. } => {
                    self.table.mark_initialized(*sym_id);
                }
            }
        }

        if !is_assignable(&target.ty, &value.ty) {
            self.error(
                DiagnosticKind::TypeMismatch,
                span,
                format!(
                    "cannot assign '{}' to '{}'",
                    self.describe(&value.ty),
                    self.describe(&target.ty)
                ),
            );
        }

        let ty = target.ty.clone();
        self.value(
            CheckedExprKind::Assign { target: Box::new(target), value: Box::new(value) },
            ty,
            span,
        )
    }

    fn check_ternary(
        &mut self,
        cond: &ast::Expr,
        then_branch: &ast::Expr,
        else_branch: &ast::Expr,
        span: cpsc_util::Span,
    ) -> CheckedExpr {
        let cond = self.check_expr(cond);
        if cond.ty != Type::Unknown && cond.ty != Type::Boolean {
            self.error(
                DiagnosticKind::BadCondition,
                cond.span,
                format!("ternary condition must be boolean, found '{}'", self.describe(&cond.ty)),
            );
        }
        let then_branch = self.check_expr(then_branch);
        let else_branch = self.check_expr(else_branch);
        let ty = if then_branch.ty == Type::Unknown {
            else_branch.ty.clone()
        } else if else_branch.ty == Type::Unknown || then_branch.ty == else_branch.ty {
            then_branch.ty.clone()
        } else {
            self.error(
                DiagnosticKind::TypeMismatch,
                span,
                format!(
                    "ternary branches have different types: '{}' vs '{}'",
                    self.describe(&then_branch.ty),
                    self.describe(&else_branch.ty)
                ),
            );
            Type::Unknown
        };
        self.value(
            CheckedExprKind::Ternary {
                cond: Box::new(cond),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            ty,
            span,
        )
    }

    fn check_index(&mut self, base: &ast::Expr, index: &ast::Expr, span: cpsc_util::Span) -> CheckedExpr {
        let base = self.check_expr(base);
        let index = self.check_expr(index);
        if index.ty != Type::Unknown && index.ty != Type::Integer {
            self.error(
                DiagnosticKind::BadIndex,
                index.span,
                format!("array index must be integer, found '{}'", self.describe(&index.ty)),
            );
        }
        let elem_ty = match &base.ty {
            Type::Array(elem) => (**elem).clone(),
            Type::Unknown => Type::Unknown,
            other => {
                self.error(
                    DiagnosticKind::BadIndex,
                    base.span,
                    format!("cannot index into '{}'", self.describe(other)),
                );
                Type::Unknown
            }
        };
        self.lvalue(
            CheckedExprKind::Index { base: Box::new(base), index: Box::new(index) },
            elem_ty,
            span,
        )
    }

    fn check_field(
        &mut self,
        base: &ast::Expr,
        name: cpsc_util::Symbol,
        name_span: cpsc_util::Span,
        span: cpsc_util::Span,
    ) -> CheckedExpr {
        // `super.m` is handled as a standalone form in `check_call`; a bare
        // `super.field` read is not part of the grammar's call-only contract
        // but still resolves structurally for completeness.
        let base_checked = self.check_expr(base);
        let Type::Class(class_id) = base_checked.ty.clone() else {
            if base_checked.ty != Type::Unknown {
                self.error(
                    DiagnosticKind::BadPropertyAccess,
                    base.span,
                    format!("'{}' is not a class type", self.describe(&base_checked.ty)),
                );
            }
            return self.err(span);
        };
        match self.table.resolve_member(class_id, name) {
            Some((owner, sym_id)) => {
                let sym = self.table.symbol(sym_id).clone();
                let offset = self
                    .table
                    .class(owner)
                    .fields
                    .iter()
                    .find(|f| f.name == name)
                    .map(|f| f.offset)
                    .unwrap_or(0);
                self.lvalue(
                    CheckedExprKind::Field { base: Box::new(base_checked), owner, field: sym_id, offset },
                    sym.ty,
                    span,
                )
            }
            None => {
                self.error(
                    DiagnosticKind::BadPropertyAccess,
                    name_span,
                    format!("'{}' has no member '{}'", self.describe(&base_checked.ty), self.interner.resolve(name)),
                );
                self.err(span)
            }
        }
    }

    fn check_call(&mut self, callee: &ast::Expr, args: &[ast::Expr], span: cpsc_util::Span) -> CheckedExpr {
        if let ExprKind::Super = callee.kind {
            // handled via method form `super.m(args)`, not a bare call
        }
        if let ExprKind::Field { base, name, name_span } = &callee.kind {
            if let ExprKind::Super = base.kind {
                return self.check_super_call(*name, *name_span, args, span);
            }
            return self.check_method_call(base, *name, *name_span, args, span);
        }
        if let ExprKind::Identifier(name) = &callee.kind {
            return self.check_function_call(*name, callee.span, args, span);
        }
        self.error(DiagnosticKind::BadMethodCall, callee.span, "expression is not callable");
        self.err(span)
    }

    fn check_args(&mut self, args: &[ast::Expr]) -> Vec<CheckedExpr> {
        args.iter().map(|a| self.check_expr(a)).collect()
    }

    fn check_call_arity(
        &mut self,
        params: &[Type],
        checked_args: &[CheckedExpr],
        span: cpsc_util::Span,
    ) {
        if params.len() != checked_args.len() {
            self.error(
                DiagnosticKind::ArityMismatch,
                span,
                format!("expected {} argument(s), got {}", params.len(), checked_args.len()),
            );
            return;
        }
        for (param_ty, arg) in params.iter().zip(checked_args) {
            if !is_assignable(param_ty, &arg.ty) {
                self.error(
                    DiagnosticKind::TypeMismatch,
                    arg.span,
                    format!(
                        "argument has type '{}', expected '{}'",
                        self.describe(&arg.ty),
                        self.describe(param_ty)
                    ),
                );
            }
        }
    }

    fn check_method_call(
        &mut self,
        base: &ast::Expr,
        name: cpsc_util::Symbol,
        name_span: cpsc_util::Span,
        args: &[ast::Expr],
        span: cpsc_util::Span,
    ) -> CheckedExpr {
        let base_checked = self.check_expr(base);
        let checked_args = self.check_args(args);
        let Type::Class(class_id) = base_checked.ty.clone() else {
            if base_checked.ty != Type::Unknown {
                self.error(
                    DiagnosticKind::BadMethodCall,
                    base.span,
                    format!("'{}' is not a class type", self.describe(&base_checked.ty)),
                );
            }
            return self.err(span);
        };
        let Some((_, sym_id)) = self.table.resolve_member(class_id, name) else {
            self.error(
                DiagnosticKind::BadMethodCall,
                name_span,
                format!("'{}' has no method '{}'", self.describe(&base_checked.ty), self.interner.resolve(name)),
            );
            return self.err(span);
        };
        let sym = self.table.symbol(sym_id).clone();
        let SymbolKind::Function(function_id) = sym.kind else {
            self.error(DiagnosticKind::BadMethodCall, name_span, "member is not a method");
            return self.err(span);
        };
        let func = self.table.function(function_id).clone();
        let params: Vec<_> = func.params.iter().map(|p| p.ty.clone()).collect();
        self.check_call_arity(&params, &checked_args, span);
        self.value(
            CheckedExprKind::MethodCall { base: Box::new(base_checked), method: function_id, args: checked_args },
            func.return_type,
            span,
        )
    }

    fn check_super_call(
        &mut self,
        name: cpsc_util::Symbol,
        name_span: cpsc_util::Span,
        args: &[ast::Expr],
        span: cpsc_util::Span,
    ) -> CheckedExpr {
        let Some(class_id) = self.table.current_class() else {
            self.error(DiagnosticKind::ThisOutsideClass, span, "'super' is only valid inside a method");
            return self.err(span);
        };
        let checked_args = self.check_args(args);
        let Some(parent) = self.table.class(class_id).parent else {
            self.error(DiagnosticKind::BadInheritance, span, "class has no parent to call 'super' on");
            return self.err(span);
        };
        let Some((_, sym_id)) = self.table.resolve_member(parent, name) else {
            self.error(
                DiagnosticKind::BadMethodCall,
                name_span,
                format!("parent class has no method '{}'", self.interner.resolve(name)),
            );
            return self.err(span);
        };
        let sym = self.table.symbol(sym_id).clone();
        let SymbolKind::Function(function_id) = sym.kind else {
            self.error(DiagnosticKind::BadMethodCall, name_span, "member is not a method");
            return self.err(span);
        };
        let func = self.table.function(function_id).clone();
        let params: Vec<_> = func.params.iter().map(|p| p.ty.clone()).collect();
        self.check_call_arity(&params, &checked_args, span);
        self.value(
            CheckedExprKind::SuperCall { method: function_id, args: checked_args },
            func.return_type,
            span,
        )
    }

    fn check_function_call(
        &mut self,
        name: cpsc_util::Symbol,
        name_span: cpsc_util::Span,
        args: &[ast::Expr],
        span: cpsc_util::Span,
    ) -> CheckedExpr {
        let Ok(sym_id) = self.table.resolve(name) else {
            self.error(
                DiagnosticKind::UndeclaredIdentifier,
                name_span,
                format!("undeclared identifier '{}'", self.interner.resolve(name)),
            );
            let _ = self.check_args(args);
            return self.err(span);
        };
        let sym = self.table.symbol(sym_id).clone();
        let checked_args = self.check_args(args);
        let SymbolKind::Function(function_id) = sym.kind else {
            self.error(
                DiagnosticKind::BadMethodCall,
                name_span,
                format!("'{}' is not callable", self.interner.resolve(name)),
            );
            return self.err(span);
        };
        let func = self.table.function(function_id).clone();
        let params: Vec<_> = func.params.iter().map(|p| p.ty.clone()).collect();
        self.check_call_arity(&params, &checked_args, span);
        self.value(
            CheckedExprKind::Call { function: function_id, args: checked_args },
            func.return_type,
            span,
        )
    }

    fn check_new(
        &mut self,
        class_name: cpsc_util::Symbol,
        class_span: cpsc_util::Span,
        args: &[ast::Expr],
        span: cpsc_util::Span,
    ) -> CheckedExpr {
        let checked_args = self.check_args(args);
        let Ok(sym_id) = self.table.resolve(class_name) else {
            self.error(
                DiagnosticKind::UndeclaredIdentifier,
                class_span,
                format!("undeclared class '{}'", self.interner.resolve(class_name)),
            );
            return self.err(span);
        };
        let sym = self.table.symbol(sym_id).clone();
        let SymbolKind::Class(class_id) = sym.kind else {
            self.error(
                DiagnosticKind::TypeMismatch,
                class_span,
                format!("'{}' is not a class", self.interner.resolve(class_name)),
            );
            return self.err(span);
        };
        let constructor = self.table.class(class_id).constructor;
        let params: Vec<_> = constructor
            .map(|f| self.table.function(f).params.iter().map(|p| p.ty.clone()).collect())
            .unwrap_or_default();
        self.check_call_arity(&params, &checked_args, span);
        self.value(
            CheckedExprKind::New { class: class_id, constructor, args: checked_args },
            Type::Class(class_id),
            span,
        )
    }
}
