use indexmap::IndexMap;

use crate::{
    diagnostics::{Diagnostic, ErrorKind, NumenError, Result},
    interpreter::{Flow, Interpreter, LoopContext},
    token::{Memory, Token},
};

pub(crate) type BuiltinFn = fn(&mut Interpreter, Option<&Memory>) -> Result<Flow>;

/// Fixed registry of native operations, populated once at interpreter
/// startup. Symbols are tried against this table before any scope lookup.
pub struct BuiltinTable {
    ops: IndexMap<&'static str, BuiltinFn>,
}

impl BuiltinTable {
    pub fn standard() -> Self {
        let mut ops: IndexMap<&'static str, BuiltinFn> = IndexMap::new();
        ops.insert("+", op_add);
        ops.insert("-", op_sub);
        ops.insert("*", op_mul);
        ops.insert("/", op_div);
        ops.insert("<", op_lt);
        ops.insert(">", op_gt);
        ops.insert("<=", op_le);
        ops.insert(">=", op_ge);
        ops.insert("==", op_eq);
        ops.insert("!=", op_ne);
        ops.insert("dup", op_dup);
        ops.insert("drop", op_drop);
        ops.insert("swap", op_swap);
        ops.insert("over", op_over);
        ops.insert("rot", op_rot);
        ops.insert("push", op_push);
        ops.insert("pop", op_pop);
        ops.insert("store", op_store);
        ops.insert("load", op_load);
        ops.insert("storeto", op_storeto);
        ops.insert("loadfrom", op_loadfrom);
        ops.insert("run", op_run);
        ops.insert("runfrom", op_runfrom);
        ops.insert("call", op_call);
        ops.insert("if", op_if);
        ops.insert("loop", op_loop);
        ops.insert("break", op_break);
        ops.insert("len", op_len);
        ops.insert("dbgprint", op_dbgprint);
        ops.insert("print", op_print);
        Self { ops }
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<BuiltinFn> {
        self.ops.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ops.keys().copied()
    }
}

fn binary_type_error(op: &str, lhs: &Token, rhs: &Token) -> NumenError {
    NumenError::from(Diagnostic::new(
        ErrorKind::TypeError,
        format!(
            "`{op}` is not defined for {} and {}",
            lhs.type_name(),
            rhs.type_name()
        ),
    ))
}

// Arithmetic pops the top two values and combines the earlier operand with
// the later one in push order; INT/INT stays INT, any FLOAT involvement
// promotes to FLOAT.

fn op_add(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let top = interp.stack.pop_any("+")?;
    let earlier = interp.stack.pop_any("+")?;
    let result = match (earlier, top) {
        (Token::Int(a), Token::Int(b)) => Token::Int(a.wrapping_add(b)),
        (Token::Int(a), Token::Float(b)) => Token::Float(a as f64 + b),
        (Token::Float(a), Token::Int(b)) => Token::Float(a + b as f64),
        (Token::Float(a), Token::Float(b)) => Token::Float(a + b),
        // String concatenation puts the later operand in front.
        (Token::Str(a), Token::Str(b)) => Token::Str(format!("{b}{a}")),
        (earlier, top) => return Err(binary_type_error("+", &earlier, &top)),
    };
    interp.stack.push(result);
    Ok(Flow::Continue)
}

fn op_sub(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let top = interp.stack.pop_any("-")?;
    let earlier = interp.stack.pop_any("-")?;
    let result = match (earlier, top) {
        (Token::Int(a), Token::Int(b)) => Token::Int(a.wrapping_sub(b)),
        (Token::Int(a), Token::Float(b)) => Token::Float(a as f64 - b),
        (Token::Float(a), Token::Int(b)) => Token::Float(a - b as f64),
        (Token::Float(a), Token::Float(b)) => Token::Float(a - b),
        (earlier, top) => return Err(binary_type_error("-", &earlier, &top)),
    };
    interp.stack.push(result);
    Ok(Flow::Continue)
}

fn op_mul(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let top = interp.stack.pop_any("*")?;
    let earlier = interp.stack.pop_any("*")?;
    let result = match (earlier, top) {
        (Token::Int(a), Token::Int(b)) => Token::Int(a.wrapping_mul(b)),
        (Token::Int(a), Token::Float(b)) => Token::Float(a as f64 * b),
        (Token::Float(a), Token::Int(b)) => Token::Float(a * b as f64),
        (Token::Float(a), Token::Float(b)) => Token::Float(a * b),
        (earlier, top) => return Err(binary_type_error("*", &earlier, &top)),
    };
    interp.stack.push(result);
    Ok(Flow::Continue)
}

fn op_div(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let top = interp.stack.pop_any("/")?;
    let earlier = interp.stack.pop_any("/")?;
    let divisor_is_zero = match &top {
        Token::Int(n) => *n == 0,
        Token::Float(n) => *n == 0.0,
        _ => false,
    };
    if divisor_is_zero {
        return Err(NumenError::from(Diagnostic::new(
            ErrorKind::DivisionByZero,
            "`/` with a zero divisor",
        )));
    }
    let result = match (earlier, top) {
        (Token::Int(a), Token::Int(b)) => Token::Int(a.wrapping_div(b)),
        (Token::Int(a), Token::Float(b)) => Token::Float(a as f64 / b),
        (Token::Float(a), Token::Int(b)) => Token::Float(a / b as f64),
        (Token::Float(a), Token::Float(b)) => Token::Float(a / b),
        (earlier, top) => return Err(binary_type_error("/", &earlier, &top)),
    };
    interp.stack.push(result);
    Ok(Flow::Continue)
}

// Comparisons pop top and next and evaluate `next ⊕ top`; ordering is
// numeric-only, with INT promoted to FLOAT when mixed.

fn compare_numeric(
    interp: &mut Interpreter,
    caller: &str,
    cmp: fn(f64, f64) -> bool,
) -> Result<Flow> {
    let second = interp.stack.pop_any(caller)?;
    let first = interp.stack.pop_any(caller)?;
    let (a, b) = match (&first, &second) {
        (Token::Int(a), Token::Int(b)) => (*a as f64, *b as f64),
        (Token::Int(a), Token::Float(b)) => (*a as f64, *b),
        (Token::Float(a), Token::Int(b)) => (*a, *b as f64),
        (Token::Float(a), Token::Float(b)) => (*a, *b),
        _ => return Err(binary_type_error(caller, &first, &second)),
    };
    interp.stack.push(Token::Bool(cmp(a, b)));
    Ok(Flow::Continue)
}

fn op_lt(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    compare_numeric(interp, "<", |a, b| a < b)
}

fn op_gt(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    compare_numeric(interp, ">", |a, b| a > b)
}

fn op_le(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    compare_numeric(interp, "<=", |a, b| a <= b)
}

fn op_ge(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    compare_numeric(interp, ">=", |a, b| a >= b)
}

/// Equality semantics: numeric pairs compare with promotion, same-tag
/// strings and booleans compare payloads, any other differing-tag pair is
/// simply unequal, and a same-tag pair of any other kind is not comparable.
fn equality(interp: &mut Interpreter, caller: &str) -> Result<bool> {
    let second = interp.stack.pop_any(caller)?;
    let first = interp.stack.pop_any(caller)?;
    match (&first, &second) {
        (Token::Int(a), Token::Int(b)) => Ok(a == b),
        (Token::Int(a), Token::Float(b)) => Ok((*a as f64) == *b),
        (Token::Float(a), Token::Int(b)) => Ok(*a == (*b as f64)),
        (Token::Float(a), Token::Float(b)) => Ok(a == b),
        (Token::Str(a), Token::Str(b)) => Ok(a == b),
        (Token::Bool(a), Token::Bool(b)) => Ok(a == b),
        (a, b) if a.type_name() != b.type_name() => Ok(false),
        (a, _) => Err(NumenError::from(Diagnostic::new(
            ErrorKind::TypeError,
            format!("`{caller}` is not defined for {} values", a.type_name()),
        ))),
    }
}

fn op_eq(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let equal = equality(interp, "==")?;
    interp.stack.push(Token::Bool(equal));
    Ok(Flow::Continue)
}

fn op_ne(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let equal = equality(interp, "!=")?;
    interp.stack.push(Token::Bool(!equal));
    Ok(Flow::Continue)
}

// Forth-style stack shufflers.

fn op_dup(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let top = interp.stack.pop_any("dup")?;
    interp.stack.push(top.clone());
    interp.stack.push(top);
    Ok(Flow::Continue)
}

fn op_drop(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    interp.stack.pop_any("drop")?;
    Ok(Flow::Continue)
}

fn op_swap(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let b = interp.stack.pop_any("swap")?;
    let a = interp.stack.pop_any("swap")?;
    interp.stack.push(b);
    interp.stack.push(a);
    Ok(Flow::Continue)
}

fn op_over(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let b = interp.stack.pop_any("over")?;
    let a = interp.stack.pop_any("over")?;
    interp.stack.push(a.clone());
    interp.stack.push(b);
    interp.stack.push(a);
    Ok(Flow::Continue)
}

fn op_rot(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let c = interp.stack.pop_any("rot")?;
    let b = interp.stack.pop_any("rot")?;
    let a = interp.stack.pop_any("rot")?;
    interp.stack.push(b);
    interp.stack.push(c);
    interp.stack.push(a);
    Ok(Flow::Continue)
}

// `push` and `pop` operate on a STACK value sitting on the operand stack,
// not on the operand stack itself.

fn op_push(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let mut items = interp.stack.pop_stack("push")?;
    let value = interp.stack.pop_any("push")?;
    items.push(value);
    interp.stack.push(Token::Stack(items));
    Ok(Flow::Continue)
}

fn op_pop(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let mut items = interp.stack.pop_stack("pop")?;
    let value = items.pop().ok_or_else(|| {
        NumenError::from(Diagnostic::new(
            ErrorKind::StackUnderflow,
            "`pop` called on an empty stack value",
        ))
    })?;
    interp.stack.push(Token::Stack(items));
    interp.stack.push(value);
    Ok(Flow::Continue)
}

// Variables target the global scope; local records stay read-only.

fn op_store(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let name = interp.stack.pop_string("store")?;
    let value = interp.stack.pop_any("store")?;
    interp.globals.write(name, value);
    Ok(Flow::Continue)
}

fn op_load(interp: &mut Interpreter, local: Option<&Memory>) -> Result<Flow> {
    let name = interp.stack.pop_string("load")?;
    let value = interp.read_scoped(&name, local).ok_or_else(|| {
        NumenError::from(Diagnostic::new(
            ErrorKind::NotFound,
            format!("`load` found no binding named `{name}`"),
        ))
    })?;
    interp.stack.push(value);
    Ok(Flow::Continue)
}

/// Resolves a record operand: either a MEMORY value directly, or a SYMBOL
/// naming one in scope.
fn resolve_memory(
    interp: &Interpreter,
    local: Option<&Memory>,
    target: Token,
    caller: &str,
) -> Result<Memory> {
    match target {
        Token::Memory(entries) => Ok(entries),
        Token::Symbol(name) => match interp.read_scoped(&name, local) {
            Some(Token::Memory(entries)) => Ok(entries),
            Some(other) => Err(NumenError::from(Diagnostic::new(
                ErrorKind::TypeError,
                format!(
                    "`{caller}` expected `{name}` to name a Memory, found {}",
                    other.type_name()
                ),
            ))),
            None => Err(NumenError::from(Diagnostic::new(
                ErrorKind::NotFound,
                format!("`{caller}` found no binding named `{name}`"),
            ))),
        },
        other => Err(NumenError::from(Diagnostic::new(
            ErrorKind::TypeError,
            format!(
                "`{caller}` expected Memory or Symbol, found {}",
                other.type_name()
            ),
        ))),
    }
}

fn op_storeto(interp: &mut Interpreter, local: Option<&Memory>) -> Result<Flow> {
    let target = interp.stack.pop_any("storeto")?;
    let key = interp.stack.pop_string("storeto")?;
    let value = interp.stack.pop_any("storeto")?;
    let mut entries = resolve_memory(interp, local, target, "storeto")?;
    entries.insert(key, value);
    interp.stack.push(Token::Memory(entries));
    Ok(Flow::Continue)
}

fn op_loadfrom(interp: &mut Interpreter, local: Option<&Memory>) -> Result<Flow> {
    let target = interp.stack.pop_any("loadfrom")?;
    let key = interp.stack.pop_string("loadfrom")?;
    let entries = resolve_memory(interp, local, target, "loadfrom")?;
    let value = entries.get(&key).cloned().ok_or_else(|| {
        NumenError::from(Diagnostic::new(
            ErrorKind::NotFound,
            format!("`loadfrom` found no key named `{key}`"),
        ))
    })?;
    interp.stack.push(value);
    Ok(Flow::Continue)
}

// Control flow. Blocks re-enter the parser at execution time; `Flow::Break`
// propagates through nested executions until a `loop` observes its flag.

fn op_run(interp: &mut Interpreter, local: Option<&Memory>) -> Result<Flow> {
    let body = interp.stack.pop_block("run")?;
    interp.run_block(&body, local)
}

fn op_runfrom(interp: &mut Interpreter, local: Option<&Memory>) -> Result<Flow> {
    let body = interp.stack.pop_block("runfrom")?;
    let target = interp.stack.pop_any("runfrom")?;
    let entries = resolve_memory(interp, local, target, "runfrom")?;
    interp.run_block(&body, Some(&entries))
}

fn op_call(interp: &mut Interpreter, local: Option<&Memory>) -> Result<Flow> {
    let target = interp.stack.pop_any("call")?;
    let record = resolve_memory(interp, local, target, "call")?;
    let code = match record.get("code") {
        Some(token) => token
            .expect_block()
            .map_err(|diag| {
                NumenError::from(diag.with_note("while reading the `code` entry for `call`"))
            })?
            .to_string(),
        None => {
            return Err(NumenError::from(Diagnostic::new(
                ErrorKind::NotFound,
                "`call` requires a record with a `code` entry",
            )));
        }
    };
    // A `params` entry is tolerated and currently ignored.
    interp.run_block(&code, local)
}

fn op_if(interp: &mut Interpreter, local: Option<&Memory>) -> Result<Flow> {
    let body = interp.stack.pop_block("if")?;
    let condition = interp.stack.pop_boolean("if")?;
    if condition {
        return interp.run_block(&body, local);
    }
    Ok(Flow::Continue)
}

fn op_loop(interp: &mut Interpreter, local: Option<&Memory>) -> Result<Flow> {
    let body = interp.stack.pop_block("loop")?;
    interp.loops.push(LoopContext::default());
    let result = run_loop(interp, &body, local);
    interp.loops.pop();
    result
}

fn run_loop(interp: &mut Interpreter, body: &str, local: Option<&Memory>) -> Result<Flow> {
    loop {
        interp.run_block(body, local)?;
        let should_break = interp
            .loops
            .last()
            .map(|ctx| ctx.should_break)
            .unwrap_or(true);
        if should_break {
            return Ok(Flow::Continue);
        }
    }
}

fn op_break(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    match interp.loops.last_mut() {
        Some(ctx) => {
            ctx.should_break = true;
            Ok(Flow::Break)
        }
        None => Err(NumenError::from(Diagnostic::new(
            ErrorKind::BreakOutsideLoop,
            "`break` outside of a loop",
        ))),
    }
}

fn op_len(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let value = interp.stack.pop_any("len")?;
    let length = match &value {
        Token::Str(s) => s.len() as i64,
        Token::Stack(items) => items.len() as i64,
        Token::Memory(entries) => entries.len() as i64,
        other => {
            return Err(NumenError::from(Diagnostic::new(
                ErrorKind::TypeError,
                format!("`len` is not defined for {}", other.type_name()),
            )));
        }
    };
    interp.stack.push(value);
    interp.stack.push(Token::Int(length));
    Ok(Flow::Continue)
}

fn op_dbgprint(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let value = interp.stack.pop_any("dbgprint")?;
    println!("{value}");
    interp.stack.push(value);
    Ok(Flow::Continue)
}

fn op_print(interp: &mut Interpreter, _local: Option<&Memory>) -> Result<Flow> {
    let text = interp.stack.pop_string("print")?;
    println!("{text}");
    Ok(Flow::Continue)
}
