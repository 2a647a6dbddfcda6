//! A parser for the TAC textual format (spec.md §6/§8): the format must
//! "round-trip through a parser that accepts exactly the forms in §4.4."
//! Hand-rolled rather than built on `logos`/a grammar generator — the
//! format is a handful of fixed instruction shapes, not a language.

use crate::instr::{BinOp, Instr, UnOp};
use crate::operand::{unescape_string, Operand};
use crate::program::TacProgram;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct TacParseError {
    pub line: usize,
    pub message: String,
}

pub fn parse_tac(text: &str) -> Result<TacProgram, TacParseError> {
    let mut instrs = Vec::new();
    for (i, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        let line_no = i + 1;
        instrs.push(parse_line(line).map_err(|message| TacParseError { line: line_no, message })?);
    }
    Ok(TacProgram { instrs })
}

fn parse_line(line: &str) -> Result<Instr, String> {
    if let Some(rest) = line.strip_prefix("END FUNCTION ") {
        return Ok(Instr::FunctionEnd(rest.trim().to_owned()));
    }
    if let Some(rest) = line.strip_prefix("FUNCTION ") {
        let name = rest.trim().strip_suffix(':').ok_or("expected ':' after FUNCTION name")?;
        return Ok(Instr::FunctionBegin(name.trim().to_owned()));
    }
    if let Some(rest) = line.strip_prefix("GOTO ") {
        return Ok(Instr::Goto(rest.trim().to_owned()));
    }
    if let Some(rest) = line.strip_prefix("IF ") {
        return parse_if(rest);
    }
    if let Some(rest) = line.strip_prefix("PARAM ") {
        let (op, rest) = parse_operand(rest.trim())?;
        if !rest.trim().is_empty() {
            return Err(format!("trailing input after PARAM operand: {rest}"));
        }
        return Ok(Instr::Param(op));
    }
    if let Some(rest) = line.strip_prefix("CALL ") {
        return parse_call(rest.trim());
    }
    if line == "RETURN" {
        return Ok(Instr::Return(None));
    }
    if let Some(rest) = line.strip_prefix("RETURN ") {
        let (op, rest) = parse_operand(rest.trim())?;
        if !rest.trim().is_empty() {
            return Err(format!("trailing input after RETURN operand: {rest}"));
        }
        return Ok(Instr::Return(Some(op)));
    }
    if let Some(label) = line.strip_suffix(':')
        && label.chars().all(|c| c.is_alphanumeric() || c == '_') && !label.is_empty() {
            return Ok(Instr::Label(label.to_owned()));
        }
    parse_assignment(line)
}

fn parse_if(rest: &str) -> Result<Instr, String> {
    let (cond, rest) = parse_operand(rest.trim())?;
    let rest = rest.trim();
    let rest = rest.strip_prefix('>').ok_or("expected '>' in IF")?.trim();
    let rest = rest.strip_prefix('0').ok_or("expected '0' in IF cond > 0")?.trim();
    let rest = rest.strip_prefix("GOTO").ok_or("expected GOTO in IF")?.trim();
    if rest.is_empty() {
        return Err("expected label after GOTO".to_owned());
    }
    Ok(Instr::IfGoto { cond, label: rest.to_owned() })
}

fn parse_call(rest: &str) -> Result<Instr, String> {
    let (name, count) = rest.rsplit_once(',').ok_or("expected 'name,argc' after CALL")?;
    let argc: u32 = count.trim().parse().map_err(|_| format!("invalid argument count '{count}'"))?;
    Ok(Instr::Call { name: name.trim().to_owned(), argc })
}

/// `x := y`, `x := y op z`, `x := op y`, `x := base[idx]`, or
/// `base[idx] := v` — distinguished by what's left of `:=` and how many
/// operand-ish tokens sit on the right.
fn parse_assignment(line: &str) -> Result<Instr, String> {
    let (lhs, rhs) = line.split_once(":=").ok_or_else(|| format!("unrecognized instruction: {line}"))?;
    let lhs = lhs.trim();
    let rhs = rhs.trim();

    if let Some((base, index)) = parse_indexed(lhs)? {
        let (value, trailing) = parse_operand(rhs)?;
        if !trailing.trim().is_empty() {
            return Err(format!("trailing input in store: {trailing}"));
        }
        return Ok(Instr::Store { base, index, value });
    }

    let dst = parse_plain_operand(lhs)?;

    // `x := !y` — unary not. (`x := -y` is ambiguous with a negative
    // integer literal, which `parse_operand` already consumes whole, so
    // it never reaches this branch with a bare `-` prefix.)
    if let Some(operand_str) = rhs.strip_prefix('!') {
        let (src, trailing) = parse_operand(operand_str.trim())?;
        if trailing.trim().is_empty() {
            return Ok(Instr::Unary { dst, op: UnOp::Not, src });
        }
    }
    if rhs.starts_with('-') && !rhs[1..].trim_start().starts_with(|c: char| c.is_ascii_digit()) {
        let (src, trailing) = parse_operand(rhs[1..].trim())?;
        if trailing.trim().is_empty() {
            return Ok(Instr::Unary { dst, op: UnOp::Neg, src });
        }
    }

    let (first, rest) = parse_operand(rhs)?;
    let rest = rest.trim();
    if let Some(index_str) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        let (index, trailing) = parse_operand(index_str.trim())?;
        if !trailing.trim().is_empty() {
            return Err(format!("trailing input inside '[]': {trailing}"));
        }
        return Ok(Instr::Load { dst, base: first, index });
    }
    if rest.is_empty() {
        return Ok(Instr::Copy { dst, src: first });
    }

    let (op_tok, rest) = split_binop(rest)?;
    let op = BinOp::from_token(op_tok).ok_or_else(|| format!("unknown binary operator '{op_tok}'"))?;
    let (second, trailing) = parse_operand(rest.trim())?;
    if !trailing.trim().is_empty() {
        return Err(format!("trailing input after binary expression: {trailing}"));
    }
    Ok(Instr::Binary { dst, op, lhs: first, rhs: second })
}

fn split_binop(s: &str) -> Result<(&str, &str), String> {
    for op in ["==", "!=", "<=", ">=", "&&", "||", "+", "-", "*", "/", "%", "<", ">"] {
        if let Some(rest) = s.strip_prefix(op) {
            return Ok((op, rest));
        }
    }
    Err(format!("expected a binary operator at '{s}'"))
}

/// Parses `base[idx]` on the left of `:=`, i.e. a store target, or
/// returns `None` when `s` is a plain operand (a load/copy destination).
/// Uses `parse_operand` for `base` rather than a naive bracket search —
/// `base` may itself be `fp[k]`/`G[k]`, which already contain brackets.
fn parse_indexed(s: &str) -> Result<Option<(Operand, Operand)>, String> {
    let (base, rest) = parse_operand(s)?;
    let rest = rest.trim();
    let Some(index_str) = rest.strip_prefix('[').and_then(|r| r.strip_suffix(']')) else {
        if rest.is_empty() {
            return Ok(None);
        }
        return Err(format!("unexpected trailing input: {rest}"));
    };
    let (index, trailing) = parse_operand(index_str.trim())?;
    if !trailing.trim().is_empty() {
        return Err(format!("trailing input inside '[]': {trailing}"));
    }
    Ok(Some((base, index)))
}

fn parse_plain_operand(s: &str) -> Result<Operand, String> {
    let (op, rest) = parse_operand(s)?;
    if !rest.trim().is_empty() {
        return Err(format!("trailing input after operand: {rest}"));
    }
    Ok(op)
}

/// Parses one operand from the front of `s`, returning it plus the
/// unconsumed remainder.
fn parse_operand(s: &str) -> Result<(Operand, &str), String> {
    let s = s.trim_start();
    if s.is_empty() {
        return Err("expected an operand".to_owned());
    }
    if let Some(rest) = s.strip_prefix('"') {
        let end = rest.find('"').ok_or("unterminated string literal")?;
        let content = unescape_string(&rest[..end]);
        return Ok((Operand::StrLit(content), &rest[end + 1..]));
    }
    if let Some(rest) = s.strip_prefix("G[") {
        let end = rest.find(']').ok_or("unterminated 'G['")?;
        let k: u32 = rest[..end].trim().parse().map_err(|_| "invalid global offset".to_owned())?;
        return Ok((Operand::Global(k), &rest[end + 1..]));
    }
    if let Some(rest) = s.strip_prefix("fp[") {
        let end = rest.find(']').ok_or("unterminated 'fp['")?;
        let k: i32 = rest[..end].trim().parse().map_err(|_| "invalid frame offset".to_owned())?;
        return Ok((Operand::Frame(k), &rest[end + 1..]));
    }
    if let Some(rest) = s.strip_prefix('R')
        && !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
            return Ok((Operand::Return, rest));
        }
    if let Some(rest) = s.strip_prefix("null")
        && !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_') {
            return Ok((Operand::NullLit, rest));
        }
    if let Some(rest) = s.strip_prefix('t') {
        let digits_end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits_end > 0 {
            let n: u32 = rest[..digits_end].parse().map_err(|_| "invalid temporary index".to_owned())?;
            return Ok((Operand::Temp(n), &rest[digits_end..]));
        }
    }
    let neg = s.starts_with('-');
    let num_start = if neg { 1 } else { 0 };
    let digits_end = num_start + s[num_start..].find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len() - num_start);
    if digits_end > num_start {
        let v: i64 = s[..digits_end].parse().map_err(|_| "invalid integer literal".to_owned())?;
        return Ok((Operand::IntLit(v), &s[digits_end..]));
    }
    Err(format!("unrecognized operand at '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instr::Instr;

    #[test]
    fn round_trips_a_simple_function() {
        let program = TacProgram {
            instrs: vec![
                Instr::FunctionBegin("main".to_owned()),
                Instr::Copy { dst: Operand::Frame(0), src: Operand::IntLit(0) },
                Instr::Label("STARTWHILE_0".to_owned()),
                Instr::Binary { dst: Operand::Temp(0), op: BinOp::Lt, lhs: Operand::Frame(0), rhs: Operand::IntLit(5) },
                Instr::IfGoto { cond: Operand::Temp(0), label: "LABEL_TRUE_0".to_owned() },
                Instr::Goto("ENDWHILE_0".to_owned()),
                Instr::Label("LABEL_TRUE_0".to_owned()),
                Instr::Binary { dst: Operand::Temp(1), op: BinOp::Add, lhs: Operand::Frame(0), rhs: Operand::IntLit(1) },
                Instr::Copy { dst: Operand::Frame(0), src: Operand::Temp(1) },
                Instr::Goto("STARTWHILE_0".to_owned()),
                Instr::Label("ENDWHILE_0".to_owned()),
                Instr::Return(None),
                Instr::FunctionEnd("main".to_owned()),
            ],
        };
        let text = program.to_text();
        let reparsed = parse_tac(&text).expect("round trip parse");
        assert_eq!(reparsed, program);
    }

    #[test]
    fn parses_call_and_param() {
        let text = "PARAM fp[-1]\nPARAM 1\nCALL add,2\nt0 := R\n";
        let program = parse_tac(text).unwrap();
        assert_eq!(
            program.instrs,
            vec![
                Instr::Param(Operand::Frame(-1)),
                Instr::Param(Operand::IntLit(1)),
                Instr::Call { name: "add".to_owned(), argc: 2 },
                Instr::Copy { dst: Operand::Temp(0), src: Operand::Return },
            ]
        );
    }

    #[test]
    fn parses_field_store_and_load() {
        let program = parse_tac("fp[0][4] := 1\nt0 := fp[0][4]\n").unwrap();
        assert_eq!(
            program.instrs,
            vec![
                Instr::Store { base: Operand::Frame(0), index: Operand::IntLit(4), value: Operand::IntLit(1) },
                Instr::Load { dst: Operand::Temp(0), base: Operand::Frame(0), index: Operand::IntLit(4) },
            ]
        );
    }
}
