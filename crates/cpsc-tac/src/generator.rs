//! The TAC generator (spec.md §4.4): lowers the annotated tree from
//! `cpsc-sem` into a flat instruction stream, assigning storage locations
//! as it goes. Runs only when semantic analysis reports zero diagnostics
//! (spec.md §7) — its own traversal never re-resolves a name; every
//! reference on the annotated tree already carries a `SymbolId`
//! (spec.md §9).

use cpsc_sem::{
    CheckedClass, CheckedExpr, CheckedExprKind, CheckedFunction, CheckedProgram, CheckedStmt, CheckedStmtKind,
    SymbolTable,
};
use cpsc_sem::checked::{BinaryOp, LogicalOp, UnaryOp};
use cpsc_util::{FunctionId, Interner, SymbolId};

use crate::instr::{BinOp, Instr, UnOp};
use crate::operand::Operand;
use crate::storage::{Frame, Globals};
use crate::program::TacProgram;

const WORD_SIZE: i64 = 4;

pub fn generate(program: &CheckedProgram, table: &SymbolTable, interner: &Interner) -> TacProgram {
    let mut generator = Generator {
        table,
        interner,
        globals: Globals::default(),
        instrs: Vec::new(),
        frame: Frame::new(),
        temp_counter: 0,
        label_counter: 0,
        break_stack: Vec::new(),
        continue_stack: Vec::new(),
    };
    generator.lower_program(program);
    TacProgram { instrs: generator.instrs }
}

struct Generator<'a> {
    table: &'a SymbolTable,
    interner: &'a Interner,
    globals: Globals,
    instrs: Vec<Instr>,
    frame: Frame,
    temp_counter: u32,
    label_counter: u32,
    /// Innermost break target: pushed by every loop *and* by `switch`
    /// (spec.md §4.4: "an explicit `break` jumps to the switch end label").
    break_stack: Vec<String>,
    /// Innermost continue target: pushed only by loops (`switch` does not
    /// accept `continue`).
    continue_stack: Vec<String>,
}

impl<'a> Generator<'a> {
    fn emit(&mut self, instr: Instr) {
        self.instrs.push(instr);
    }

    fn fresh_temp(&mut self) -> Operand {
        let t = self.temp_counter;
        self.temp_counter += 1;
        Operand::Temp(t)
    }

    fn fresh_label(&mut self, prefix: &str) -> String {
        let k = self.label_counter;
        self.label_counter += 1;
        format!("{prefix}_{k}")
    }

    fn name_of(&self, sym: cpsc_util::Symbol) -> &str {
        self.interner.resolve(sym)
    }

    fn function_name(&self, id: FunctionId) -> String {
        let data = self.table.function(id);
        match data.owner_class {
            Some(class_id) => {
                let class_name = self.name_of(self.table.class(class_id).name).to_owned();
                format!("{}_{}", class_name, self.name_of(data.name))
            }
            None => self.name_of(data.name).to_owned(),
        }
    }

    fn new_name(&self, class_id: cpsc_util::ClassId) -> String {
        format!("new{}", self.name_of(self.table.class(class_id).name))
    }

    /// Resets the per-function counters (spec.md §9) and runs `body`.
    fn reset_function_state(&mut self) {
        self.temp_counter = 0;
        self.label_counter = 0;
        self.frame = Frame::new();
        self.break_stack.clear();
        self.continue_stack.clear();
    }

    fn lower_program(&mut self, program: &CheckedProgram) {
        for function in &program.functions {
            self.lower_top_level_function(function);
        }
        for class in &program.classes {
            self.lower_class(class);
        }
        self.lower_main(&program.main_body);
    }

    fn lower_top_level_function(&mut self, function: &CheckedFunction) {
        let name = self.function_name(function.id);
        self.reset_function_state();
        for (i, &param) in function.params.iter().enumerate() {
            self.frame.bind_param(param, -(i as i32 + 1));
        }
        self.emit(Instr::FunctionBegin(name.clone()));
        for stmt in &function.body {
            self.lower_stmt(stmt);
        }
        let ret_void = self.table.function(function.id).return_type == cpsc_sem::Type::Void;
        if ret_void {
            self.emit(Instr::Return(None));
        }
        self.emit(Instr::FunctionEnd(name));
    }

    fn lower_class(&mut self, class: &CheckedClass) {
        let class_id = class.id;
        let new_name = self.new_name(class_id);
        self.reset_function_state();
        // `fp[-1]` is `this`; constructor parameters (if any) follow.
        if let Some(ctor) = &class.constructor {
            for (i, &param) in ctor.params.iter().enumerate() {
                self.frame.bind_param(param, -(i as i32 + 2));
            }
        }
        self.emit(Instr::FunctionBegin(new_name.clone()));
        for field in &self.table.class(class_id).fields.clone() {
            let dflt = default_value(&field.ty);
            self.emit(Instr::Store { base: Operand::Frame(-1), index: Operand::IntLit(field.offset as i64), value: dflt });
        }
        if let Some(ctor) = &class.constructor {
            for stmt in &ctor.body {
                self.lower_stmt(stmt);
            }
        }
        self.emit(Instr::Return(Some(Operand::Frame(-1))));
        self.emit(Instr::FunctionEnd(new_name));

        for method in &class.methods {
            self.lower_method(method);
        }
    }

    fn lower_method(&mut self, method: &CheckedFunction) {
        let name = self.function_name(method.id);
        self.reset_function_state();
        // `fp[-1]` is `this` (spec.md §4.4); `CheckedExprKind::This`
        // lowers straight to `Operand::Frame(-1)` without a symbol lookup.
        for (i, &param) in method.params.iter().enumerate() {
            self.frame.bind_param(param, -(i as i32 + 2));
        }
        self.emit(Instr::FunctionBegin(name.clone()));
        for stmt in &method.body {
            self.lower_stmt(stmt);
        }
        let ret_void = self.table.function(method.id).return_type == cpsc_sem::Type::Void;
        if ret_void {
            self.emit(Instr::Return(None));
        }
        self.emit(Instr::FunctionEnd(name));
    }

    /// Global-scope statements wrap in a synthetic `FUNCTION main:`
    /// (spec.md §4.4).
    fn lower_main(&mut self, body: &[CheckedStmt]) {
        self.reset_function_state();
        self.emit(Instr::FunctionBegin("main".to_owned()));
        for stmt in body {
            self.lower_stmt(stmt);
        }
        self.emit(Instr::Return(None));
        self.emit(Instr::FunctionEnd("main".to_owned()));
    }

    /// Assigns storage the first time a declared symbol is seen: a global
    /// slot if it is declared directly in the global scope, a frame slot
    /// otherwise (spec.md §4.4's two-namespace storage model).
    fn storage_for(&mut self, sym: SymbolId) -> Operand {
        if let Some(op) = self.frame.get(sym) {
            return op;
        }
        if self.table.symbol(sym).defining_scope == self.table.global_scope() {
            self.globals.get_or_assign(sym)
        } else {
            self.frame.declare_local(sym)
        }
    }

    fn lower_stmt(&mut self, stmt: &CheckedStmt) {
        match &stmt.kind {
            CheckedStmtKind::VarDecl { symbol, init } => {
                let dst = self.storage_for(*symbol);
                if let Some(init) = init {
                    let val = self.lower_expr(init);
                    self.emit(Instr::Copy { dst, src: val });
                }
            }
            CheckedStmtKind::ExprStmt(e) => {
                self.lower_expr(e);
            }
            CheckedStmtKind::Block(stmts) => {
                for s in stmts {
                    self.lower_stmt(s);
                }
            }
            CheckedStmtKind::If { cond, then_branch, else_branch } => self.lower_if(cond, then_branch, else_branch.as_deref()),
            CheckedStmtKind::While { cond, body } => self.lower_while(cond, body),
            CheckedStmtKind::DoWhile { body, cond } => self.lower_do_while(body, cond),
            CheckedStmtKind::For { init, cond, step, body } => {
                self.lower_for(init.as_deref(), cond.as_ref(), step.as_ref(), body)
            }
            CheckedStmtKind::Foreach { var, iter, body } => self.lower_foreach(*var, iter, body),
            CheckedStmtKind::Switch { subject, cases, default } => self.lower_switch(subject, cases, default.as_deref()),
            CheckedStmtKind::Break => {
                let label = self.break_stack.last().expect("break only valid inside loop/switch").clone();
                self.emit(Instr::Goto(label));
            }
            CheckedStmtKind::Continue => {
                let label = self.continue_stack.last().expect("continue only valid inside loop").clone();
                self.emit(Instr::Goto(label));
            }
            CheckedStmtKind::Return(value) => {
                let val = value.as_ref().map(|e| self.lower_expr(e));
                self.emit(Instr::Return(val));
            }
            CheckedStmtKind::Try { body, catch_symbol, catch_body } => self.lower_try(body, *catch_symbol, catch_body),
            CheckedStmtKind::Print(e) => {
                let val = self.lower_expr(e);
                self.emit(Instr::Param(val));
                self.emit(Instr::Call { name: "print".to_owned(), argc: 1 });
            }
            CheckedStmtKind::Error => {}
        }
    }

    fn lower_if(&mut self, cond: &CheckedExpr, then_branch: &CheckedStmt, else_branch: Option<&CheckedStmt>) {
        let k = self.label_counter;
        self.label_counter += 1;
        let true_l = format!("IF_TRUE_{k}");
        let end_l = format!("IF_END_{k}");
        let false_l = if else_branch.is_some() { format!("IF_FALSE_{k}") } else { end_l.clone() };

        self.lower_bool_jump(cond, &true_l, &false_l);
        self.emit(Instr::Label(true_l));
        self.lower_stmt(then_branch);
        if let Some(else_branch) = else_branch {
            self.emit(Instr::Goto(end_l.clone()));
            self.emit(Instr::Label(false_l));
            self.lower_stmt(else_branch);
            self.emit(Instr::Label(end_l));
        } else {
            self.emit(Instr::Label(false_l));
        }
    }

    fn lower_while(&mut self, cond: &CheckedExpr, body: &CheckedStmt) {
        let k = self.label_counter;
        self.label_counter += 1;
        let start_l = format!("STARTWHILE_{k}");
        let true_l = format!("LABEL_TRUE_{k}");
        let end_l = format!("ENDWHILE_{k}");

        self.emit(Instr::Label(start_l.clone()));
        self.lower_bool_jump(cond, &true_l, &end_l);
        self.emit(Instr::Label(true_l));
        self.continue_stack.push(start_l.clone());
        self.break_stack.push(end_l.clone());
        self.lower_stmt(body);
        self.continue_stack.pop();
        self.break_stack.pop();
        self.emit(Instr::Goto(start_l));
        self.emit(Instr::Label(end_l));
    }

    fn lower_do_while(&mut self, body: &CheckedStmt, cond: &CheckedExpr) {
        let k = self.label_counter;
        self.label_counter += 1;
        let body_l = format!("STARTDO_{k}");
        let cond_l = format!("CONDDO_{k}");
        let end_l = format!("ENDDO_{k}");

        self.emit(Instr::Label(body_l.clone()));
        self.continue_stack.push(cond_l.clone());
        self.break_stack.push(end_l.clone());
        self.lower_stmt(body);
        self.continue_stack.pop();
        self.break_stack.pop();
        self.emit(Instr::Label(cond_l));
        self.lower_bool_jump(cond, &body_l, &end_l);
        self.emit(Instr::Label(end_l));
    }

    fn lower_for(
        &mut self,
        init: Option<&CheckedStmt>,
        cond: Option<&CheckedExpr>,
        step: Option<&CheckedExpr>,
        body: &CheckedStmt,
    ) {
        if let Some(init) = init {
            self.lower_stmt(init);
        }
        let k = self.label_counter;
        self.label_counter += 1;
        let start_l = format!("STARTFOR_{k}");
        let true_l = format!("FORBODY_{k}");
        let step_l = format!("STEPFOR_{k}");
        let end_l = format!("ENDFOR_{k}");

        self.emit(Instr::Label(start_l.clone()));
        match cond {
            Some(cond) => self.lower_bool_jump(cond, &true_l, &end_l),
            None => self.emit(Instr::Goto(true_l.clone())),
        }
        self.emit(Instr::Label(true_l));
        self.continue_stack.push(step_l.clone());
        self.break_stack.push(end_l.clone());
        self.lower_stmt(body);
        self.continue_stack.pop();
        self.break_stack.pop();
        self.emit(Instr::Label(step_l));
        if let Some(step) = step {
            self.lower_expr(step);
        }
        self.emit(Instr::Goto(start_l));
        self.emit(Instr::Label(end_l));
    }

    fn lower_foreach(&mut self, var: SymbolId, iter: &CheckedExpr, body: &CheckedStmt) {
        let arr = self.lower_expr(iter);
        let idx = self.frame.fresh_internal_local();
        self.emit(Instr::Copy { dst: idx.clone(), src: Operand::IntLit(0) });

        self.emit(Instr::Param(arr.clone()));
        self.emit(Instr::Call { name: "len".to_owned(), argc: 1 });
        let len = self.fresh_temp();
        self.emit(Instr::Copy { dst: len.clone(), src: Operand::Return });

        let k = self.label_counter;
        self.label_counter += 1;
        let start_l = format!("STARTFOREACH_{k}");
        let true_l = format!("FOREACHBODY_{k}");
        let step_l = format!("STEPFOREACH_{k}");
        let end_l = format!("ENDFOREACH_{k}");

        self.emit(Instr::Label(start_l.clone()));
        let cmp = self.fresh_temp();
        self.emit(Instr::Binary { dst: cmp.clone(), op: BinOp::Lt, lhs: idx.clone(), rhs: len });
        self.emit(Instr::IfGoto { cond: cmp, label: true_l.clone() });
        self.emit(Instr::Goto(end_l.clone()));
        self.emit(Instr::Label(true_l));

        let elem = self.fresh_temp();
        let byte_idx = self.scale_index(idx.clone());
        self.emit(Instr::Load { dst: elem.clone(), base: arr.clone(), index: byte_idx });
        let var_op = self.storage_for(var);
        self.emit(Instr::Copy { dst: var_op, src: elem });

        self.continue_stack.push(step_l.clone());
        self.break_stack.push(end_l.clone());
        self.lower_stmt(body);
        self.continue_stack.pop();
        self.break_stack.pop();

        self.emit(Instr::Label(step_l));
        let next = self.fresh_temp();
        self.emit(Instr::Binary { dst: next.clone(), op: BinOp::Add, lhs: idx.clone(), rhs: Operand::IntLit(1) });
        self.emit(Instr::Copy { dst: idx, src: next });
        self.emit(Instr::Goto(start_l));
        self.emit(Instr::Label(end_l));
    }

    fn lower_switch(
        &mut self,
        subject: &CheckedExpr,
        cases: &[(CheckedExpr, Vec<CheckedStmt>)],
        default: Option<&[CheckedStmt]>,
    ) {
        let subject_val = self.lower_expr(subject);
        let k = self.label_counter;
        self.label_counter += 1;
        let end_l = format!("SWITCHEND_{k}");
        let default_l = if default.is_some() { format!("DEFAULT_{k}") } else { end_l.clone() };
        let case_labels: Vec<String> = (0..cases.len()).map(|i| format!("CASE_{k}_{i}")).collect();

        for ((case_expr, _), label) in cases.iter().zip(&case_labels) {
            let case_val = self.lower_expr(case_expr);
            let cmp = self.fresh_temp();
            self.emit(Instr::Binary { dst: cmp.clone(), op: BinOp::Eq, lhs: subject_val.clone(), rhs: case_val });
            self.emit(Instr::IfGoto { cond: cmp, label: label.clone() });
        }
        self.emit(Instr::Goto(default_l.clone()));

        self.break_stack.push(end_l.clone());
        for ((_, case_body), label) in cases.iter().zip(&case_labels) {
            self.emit(Instr::Label(label.clone()));
            for stmt in case_body {
                self.lower_stmt(stmt);
            }
        }
        if let Some(default_body) = default {
            self.emit(Instr::Label(default_l));
            for stmt in default_body {
                self.lower_stmt(stmt);
            }
        }
        self.break_stack.pop();
        self.emit(Instr::Label(end_l));
    }

    fn lower_try(&mut self, body: &CheckedStmt, catch_symbol: SymbolId, catch_body: &CheckedStmt) {
        let k = self.label_counter;
        self.label_counter += 1;
        let end_l = format!("TRYEND_{k}");
        let catch_l = format!("CATCH_{k}");

        self.lower_stmt(body);
        self.emit(Instr::Goto(end_l.clone()));
        self.emit(Instr::Label(catch_l));
        self.frame.declare_local(catch_symbol);
        self.lower_stmt(catch_body);
        self.emit(Instr::Label(end_l));
    }

    /// Control-context boolean codegen: jumps to `true_l`/`false_l`
    /// without ever materializing the result (spec.md §9: "keep two
    /// code-generation entry points for boolean expressions").
    fn lower_bool_jump(&mut self, expr: &CheckedExpr, true_l: &str, false_l: &str) {
        match &expr.kind {
            CheckedExprKind::Logical { op: LogicalOp::And, lhs, rhs } => {
                let mid = self.fresh_label("AND_CONT");
                self.lower_bool_jump(lhs, &mid, false_l);
                self.emit(Instr::Label(mid));
                self.lower_bool_jump(rhs, true_l, false_l);
            }
            CheckedExprKind::Logical { op: LogicalOp::Or, lhs, rhs } => {
                let mid = self.fresh_label("OR_CONT");
                self.lower_bool_jump(lhs, true_l, &mid);
                self.emit(Instr::Label(mid));
                self.lower_bool_jump(rhs, true_l, false_l);
            }
            CheckedExprKind::Unary { op: UnaryOp::Not, operand } => {
                self.lower_bool_jump(operand, false_l, true_l);
            }
            _ => {
                let cond = self.lower_expr(expr);
                self.emit(Instr::IfGoto { cond, label: true_l.to_owned() });
                self.emit(Instr::Goto(false_l.to_owned()));
            }
        }
    }

    /// Value-context boolean codegen for `&&`/`||`: materializes a 0/1
    /// result via `AND_CONT_k`/`OR_CONT_k` labels (spec.md §4.4).
    fn lower_logical_value(&mut self, op: LogicalOp, lhs: &CheckedExpr, rhs: &CheckedExpr) -> Operand {
        let dst = self.fresh_temp();
        match op {
            LogicalOp::And => {
                let lhs_val = self.lower_expr(lhs);
                let cont = self.fresh_label("AND_CONT");
                let end = self.fresh_label("AND_END");
                self.emit(Instr::IfGoto { cond: lhs_val, label: cont.clone() });
                self.emit(Instr::Copy { dst: dst.clone(), src: Operand::IntLit(0) });
                self.emit(Instr::Goto(end.clone()));
                self.emit(Instr::Label(cont));
                let rhs_val = self.lower_expr(rhs);
                self.emit(Instr::Copy { dst: dst.clone(), src: rhs_val });
                self.emit(Instr::Label(end));
            }
            LogicalOp::Or => {
                let lhs_val = self.lower_expr(lhs);
                let short = self.fresh_label("OR_TRUE");
                let cont = self.fresh_label("OR_CONT");
                let end = self.fresh_label("OR_END");
                self.emit(Instr::IfGoto { cond: lhs_val, label: short.clone() });
                self.emit(Instr::Label(cont));
                let rhs_val = self.lower_expr(rhs);
                self.emit(Instr::Copy { dst: dst.clone(), src: rhs_val });
                self.emit(Instr::Goto(end.clone()));
                self.emit(Instr::Label(short));
                self.emit(Instr::Copy { dst: dst.clone(), src: Operand::IntLit(1) });
                self.emit(Instr::Label(end));
            }
        }
        dst
    }

    fn lower_expr(&mut self, expr: &CheckedExpr) -> Operand {
        match &expr.kind {
            CheckedExprKind::IntLiteral(v) => Operand::IntLit(*v),
            CheckedExprKind::StringLiteral(sym) => Operand::StrLit(self.name_of(*sym).to_owned()),
            CheckedExprKind::BoolLiteral(b) => Operand::bool_lit(*b),
            CheckedExprKind::NullLiteral => Operand::NullLit,
            CheckedExprKind::ArrayLiteral(elems) => self.lower_array_literal(elems),
            CheckedExprKind::Local(sym) => self.storage_for(*sym),
            CheckedExprKind::This => Operand::Frame(-1),
            CheckedExprKind::Unary { op, operand } => {
                let src = self.lower_expr(operand);
                // Fold negation of an integer literal immediately: the
                // alternative, `Unary{Neg, IntLit}`, prints as `-5` too
                // and is indistinguishable from a literal on reparse.
                if let (UnaryOp::Neg, Operand::IntLit(v)) = (op, &src) {
                    return Operand::IntLit(-v);
                }
                let dst = self.fresh_temp();
                let op = match op {
                    UnaryOp::Neg => UnOp::Neg,
                    UnaryOp::Not => UnOp::Not,
                };
                self.emit(Instr::Unary { dst: dst.clone(), op, src });
                dst
            }
            CheckedExprKind::Binary { op, lhs, rhs } => {
                let lhs_val = self.lower_expr(lhs);
                let rhs_val = self.lower_expr(rhs);
                let dst = self.fresh_temp();
                self.emit(Instr::Binary { dst: dst.clone(), op: binop(*op), lhs: lhs_val, rhs: rhs_val });
                dst
            }
            CheckedExprKind::Logical { op, lhs, rhs } => self.lower_logical_value(*op, lhs, rhs),
            CheckedExprKind::Assign { target, value } => self.lower_assign(target, value),
            CheckedExprKind::Ternary { cond, then_branch, else_branch } => self.lower_ternary(cond, then_branch, else_branch),
            CheckedExprKind::Index { base, index } => {
                let base_val = self.lower_expr(base);
                let index_val = self.lower_expr(index);
                let byte_index = self.scale_index(index_val);
                let dst = self.fresh_temp();
                self.emit(Instr::Load { dst: dst.clone(), base: base_val, index: byte_index });
                dst
            }
            CheckedExprKind::Field { base, offset, .. } => {
                let base_val = self.lower_expr(base);
                let dst = self.fresh_temp();
                self.emit(Instr::Load { dst: dst.clone(), base: base_val, index: Operand::IntLit(*offset as i64) });
                dst
            }
            CheckedExprKind::MethodCall { base, method, args } => {
                let base_val = self.lower_expr(base);
                let name = self.function_name(*method);
                self.emit(Instr::Param(base_val));
                let argc = 1 + self.lower_args(args);
                self.emit(Instr::Call { name, argc });
                let dst = self.fresh_temp();
                self.emit(Instr::Copy { dst: dst.clone(), src: Operand::Return });
                dst
            }
            CheckedExprKind::SuperCall { method, args } => {
                let name = self.function_name(*method);
                self.emit(Instr::Param(Operand::Frame(-1)));
                let argc = 1 + self.lower_args(args);
                self.emit(Instr::Call { name, argc });
                let dst = self.fresh_temp();
                self.emit(Instr::Copy { dst: dst.clone(), src: Operand::Return });
                dst
            }
            CheckedExprKind::Call { function, args } => {
                let name = self.function_name(*function);
                let argc = self.lower_args(args);
                self.emit(Instr::Call { name, argc });
                let dst = self.fresh_temp();
                self.emit(Instr::Copy { dst: dst.clone(), src: Operand::Return });
                dst
            }
            CheckedExprKind::New { class, args, .. } => {
                let name = self.new_name(*class);
                let argc = self.lower_args(args);
                self.emit(Instr::Call { name, argc });
                let dst = self.fresh_temp();
                self.emit(Instr::Copy { dst: dst.clone(), src: Operand::Return });
                dst
            }
            CheckedExprKind::Error => {
                unreachable!("TAC generation only runs once semantic analysis reports zero diagnostics")
            }
        }
    }

    /// Emits `PARAM` for each argument, leftmost first, and returns the
    /// count (spec.md §4.4).
    fn lower_args(&mut self, args: &[CheckedExpr]) -> u32 {
        let mut argc = 0;
        for arg in args {
            let val = self.lower_expr(arg);
            self.emit(Instr::Param(val));
            argc += 1;
        }
        argc
    }

    fn lower_array_literal(&mut self, elems: &[CheckedExpr]) -> Operand {
        self.emit(Instr::Param(Operand::IntLit(elems.len() as i64)));
        self.emit(Instr::Call { name: "__new_array".to_owned(), argc: 1 });
        let arr = self.fresh_temp();
        self.emit(Instr::Copy { dst: arr.clone(), src: Operand::Return });
        for (i, elem) in elems.iter().enumerate() {
            let val = self.lower_expr(elem);
            self.emit(Instr::Store { base: arr.clone(), index: Operand::IntLit(i as i64 * WORD_SIZE), value: val });
        }
        arr
    }

    /// Scales an element index to the byte offset `Load`/`Store` expect
    /// (spec.md §4.4: "backend free to compute `arr + i·stride`" — done
    /// here instead, so field offsets and array indices share one unit).
    fn scale_index(&mut self, index_val: Operand) -> Operand {
        if let Operand::IntLit(i) = index_val {
            return Operand::IntLit(i * WORD_SIZE);
        }
        let dst = self.fresh_temp();
        self.emit(Instr::Binary { dst: dst.clone(), op: BinOp::Mul, lhs: index_val, rhs: Operand::IntLit(WORD_SIZE) });
        dst
    }

    fn lower_assign(&mut self, target: &CheckedExpr, value: &CheckedExpr) -> Operand {
        let val = self.lower_expr(value);
        match &target.kind {
            CheckedExprKind::Local(sym) => {
                let dst = self.storage_for(*sym);
                self.emit(Instr::Copy { dst, src: val.clone() });
            }
            CheckedExprKind::Field { base, offset, .. } => {
                let base_val = self.lower_expr(base);
                self.emit(Instr::Store { base: base_val, index: Operand::IntLit(*offset as i64), value: val.clone() });
            }
            CheckedExprKind::Index { base, index } => {
                let base_val = self.lower_expr(base);
                let index_val = self.lower_expr(index);
                let byte_index = self.scale_index(index_val);
                self.emit(Instr::Store { base: base_val, index: byte_index, value: val.clone() });
            }
            other => unreachable!("semantic analysis only allows lvalue assignment targets, got {other:?}"),
        }
        val
    }

    fn lower_ternary(&mut self, cond: &CheckedExpr, then_branch: &CheckedExpr, else_branch: &CheckedExpr) -> Operand {
        let dst = self.fresh_temp();
        let k = self.label_counter;
        self.label_counter += 1;
        let true_l = format!("TERN_TRUE_{k}");
        let false_l = format!("TERN_FALSE_{k}");
        let end_l = format!("TERN_END_{k}");

        self.lower_bool_jump(cond, &true_l, &false_l);
        self.emit(Instr::Label(true_l));
        let then_val = self.lower_expr(then_branch);
        self.emit(Instr::Copy { dst: dst.clone(), src: then_val });
        self.emit(Instr::Goto(end_l.clone()));
        self.emit(Instr::Label(false_l));
        let else_val = self.lower_expr(else_branch);
        self.emit(Instr::Copy { dst: dst.clone(), src: else_val });
        self.emit(Instr::Label(end_l));
        dst
    }
}

fn binop(op: BinaryOp) -> BinOp {
    match op {
        BinaryOp::Add => BinOp::Add,
        BinaryOp::Sub => BinOp::Sub,
        BinaryOp::Mul => BinOp::Mul,
        BinaryOp::Div => BinOp::Div,
        BinaryOp::Mod => BinOp::Mod,
        BinaryOp::Eq => BinOp::Eq,
        BinaryOp::Ne => BinOp::Ne,
        BinaryOp::Lt => BinOp::Lt,
        BinaryOp::Le => BinOp::Le,
        BinaryOp::Gt => BinOp::Gt,
        BinaryOp::Ge => BinOp::Ge,
    }
}

fn default_value(ty: &cpsc_sem::Type) -> Operand {
    match ty {
        cpsc_sem::Type::Integer | cpsc_sem::Type::Boolean => Operand::IntLit(0),
        _ => Operand::NullLit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lower(source: &str) -> TacProgram {
        let parsed = cpsc_syntax::parse(source);
        assert!(parsed.diagnostics.is_empty(), "parse errors: {:?}", parsed.diagnostics);
        let mut interner = parsed.interner;
        let (checked, table, diagnostics) = cpsc_sem::analyze(&parsed.program, &mut interner);
        assert!(diagnostics.is_empty(), "semantic errors: {:?}", diagnostics);
        generate(&checked, &table, &interner)
    }

    #[test]
    fn while_loop_matches_the_label_family() {
        let tac = lower("let x = 0; while (x < 10) { x = x + 1; }");
        let labels: Vec<&str> = tac
            .instrs
            .iter()
            .filter_map(|i| match i {
                Instr::Label(l) => Some(l.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(labels, vec!["STARTWHILE_0", "LABEL_TRUE_0", "ENDWHILE_0"]);
        assert!(tac.instrs.iter().any(|i| matches!(i, Instr::Goto(l) if l == "STARTWHILE_0")));
    }

    #[test]
    fn inheritance_new_runs_field_defaults_then_constructor_then_returns_this() {
        let tac = lower(
            "class Animal { var name: integer; function constructor(n: integer) { this.name = n; } function speak(): integer { return this.name; } }\n\
             class Dog : Animal { function constructor(n: integer) { this.name = n; } }",
        );
        let dog_begin = tac.instrs.iter().position(|i| matches!(i, Instr::FunctionBegin(n) if n == "newDog")).unwrap();
        let dog_end = tac.instrs.iter().position(|i| matches!(i, Instr::FunctionEnd(n) if n == "newDog")).unwrap();
        let body = &tac.instrs[dog_begin..=dog_end];
        assert!(matches!(body[1], Instr::Store { base: Operand::Frame(-1), index: Operand::IntLit(0), value: Operand::IntLit(0) }));
        assert!(body.iter().any(|i| matches!(i, Instr::Store { index: Operand::IntLit(0), .. })));
        assert!(matches!(body.last().unwrap(), Instr::FunctionEnd(_)));
        assert!(matches!(body[body.len() - 2], Instr::Return(Some(Operand::Frame(-1)))));

        let speak_begin = tac.instrs.iter().position(|i| matches!(i, Instr::FunctionBegin(n) if n == "Animal_speak")).unwrap();
        assert!(matches!(tac.instrs[speak_begin], Instr::FunctionBegin(_)));
    }

    #[test]
    fn short_circuit_and_never_evaluates_rhs_in_jump_context() {
        let tac = lower("let x = 0; if (x > 0 && x < 10) { x = 1; }");
        let cont_label = tac.instrs.iter().find_map(|i| match i {
            Instr::Label(l) if l.starts_with("AND_CONT") => Some(l.clone()),
            _ => None,
        });
        assert!(cont_label.is_some(), "expected an AND_CONT label between the two operand evaluations");
    }

    #[test]
    fn array_index_is_scaled_to_a_byte_offset_but_field_offsets_are_not() {
        let tac = lower(
            "class P { var edad: integer; var color: integer; }\n\
             let xs: integer[] = [1, 2, 3]; let n: integer = xs[2]; let p: P = new P(); let c: integer = p.color;",
        );
        assert!(
            tac.instrs.iter().any(|i| matches!(i, Instr::Load { index: Operand::IntLit(8), .. })),
            "xs[2] should load at byte offset 8 (index 2 * word size 4)"
        );
        assert!(
            tac.instrs.iter().any(|i| matches!(i, Instr::Load { index: Operand::IntLit(4), .. })),
            "p.color (second field) should load at its raw byte offset 4, not scaled again"
        );
    }

    #[test]
    fn foreach_lowers_via_len_and_indexed_load() {
        let tac = lower("let xs: integer[] = [1, 2, 3]; foreach (x in xs) { print(x); }");
        assert!(tac.instrs.iter().any(|i| matches!(i, Instr::Call { name, argc: 1 } if name == "len")));
        assert!(tac.instrs.iter().any(|i| matches!(i, Instr::Load { .. })));
    }

    macro_rules! snap {
        ($name:ident, $source:expr) => {
            #[test]
            fn $name() {
                let source = $source.trim();
                let tac = lower(source);
                insta::assert_snapshot!(format!("{source}\n---\n{}", tac.to_text()));
            }
        };
    }

    snap!(
        snapshot_if_else_and_comparison,
        r#"
        let a: integer = 1;
        if (a < 10) {
            a = a + 1;
        } else {
            a = 0;
        }
        "#
    );

    snap!(
        snapshot_function_call_and_return,
        r#"
        function add(a: integer, b: integer): integer {
            return a + b;
        }
        let r: integer = add(1, 2);
        "#
    );

    snap!(
        snapshot_class_with_constructor_and_method,
        r#"
        class Point {
            var x: integer;
            var y: integer;
            function constructor(x: integer, y: integer) {
                this.x = x;
                this.y = y;
            }
            function sum(): integer {
                return this.x + this.y;
            }
        }
        let p: Point = new Point(1, 2);
        let s: integer = p.sum();
        "#
    );
}
