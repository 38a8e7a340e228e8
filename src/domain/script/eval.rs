//! Tree-walking evaluator for parsed scripts.
//!
//! Arithmetic rules:
//! - `int op int` stays `int` for `+ - *` (overflow is an error) and for `**`
//!   with a non-negative exponent; `/` always yields `f64`
//! - any other scalar pair is computed in `f64`
//! - a scalar combined with a series is broadcast over every element
//! - two series must have the same length

use crate::domain::script::ast::{AssignOp, BinaryOp, Expr, Program, Stmt};
use crate::domain::script::value::{Environment, SeriesRef, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
    pub position: usize,
}

type EvalResult<T> = Result<T, RuntimeError>;

/// Largest series `zeros` and `fill` will allocate.
pub const MAX_SERIES_LEN: usize = 1_000_000;

fn fail<T>(position: usize, message: impl Into<String>) -> EvalResult<T> {
    Err(RuntimeError {
        message: message.into(),
        position,
    })
}

/// Run every statement of `program` against `env`. Statements that ran
/// before a failure keep their effects.
pub fn execute(program: &Program, env: &mut Environment) -> EvalResult<()> {
    for stmt in &program.statements {
        exec_stmt(stmt, env)?;
    }
    Ok(())
}

fn exec_stmt(stmt: &Stmt, env: &mut Environment) -> EvalResult<()> {
    match stmt {
        Stmt::Assign {
            name,
            op,
            value,
            position,
        } => {
            let rhs = eval_expr(value, env)?;
            let new_value = match op {
                AssignOp::Set => rhs,
                AssignOp::Compound(bin) => {
                    let Some(current) = env.get(name) else {
                        return fail(*position, format!("undefined variable '{name}'"));
                    };
                    binary(*bin, current, &rhs, *position)?
                }
            };
            env.set(name, new_value);
            Ok(())
        }
        Stmt::AssignIndex {
            name,
            index,
            op,
            value,
            position,
        } => {
            let handle = match env.get(name) {
                Some(Value::Series(handle)) => handle.clone(),
                Some(other) => {
                    return fail(
                        *position,
                        format!("cannot index into '{name}' of type {}", other.type_name()),
                    );
                }
                None => return fail(*position, format!("undefined variable '{name}'")),
            };
            let idx = eval_expr(index, env)?;
            let rhs = eval_expr(value, env)?;
            let Some(rhs) = rhs.as_f64() else {
                return fail(
                    *position,
                    format!("cannot store a {} in an element of '{name}'", rhs.type_name()),
                );
            };

            let slot = resolve_index(&handle, &idx, *position)?;
            let mut values = handle.borrow_mut();
            let current = values[slot];
            values[slot] = match op {
                AssignOp::Set => rhs,
                AssignOp::Compound(bin) => apply(*bin, current, rhs),
            };
            Ok(())
        }
        Stmt::For {
            var,
            start,
            end,
            inclusive,
            body,
            position,
        } => {
            let from = expect_int(eval_expr(start, env)?, *position, "range start")?;
            let to = expect_int(eval_expr(end, env)?, *position, "range end")?;
            let range: Box<dyn Iterator<Item = i64>> = if *inclusive {
                Box::new(from..=to)
            } else {
                Box::new(from..to)
            };
            // The loop variable is scoped to the loop.
            let shadowed = env.remove(var);
            for i in range {
                env.set(var, Value::Int(i));
                for stmt in body {
                    exec_stmt(stmt, env)?;
                }
            }
            env.remove(var);
            if let Some(previous) = shadowed {
                env.set(var, previous);
            }
            Ok(())
        }
        Stmt::Expr(expr) => eval_expr(expr, env).map(|_| ()),
    }
}

fn expect_int(value: Value, position: usize, what: &str) -> EvalResult<i64> {
    match value {
        Value::Int(v) => Ok(v),
        other => fail(
            position,
            format!("{what} must be an int, found {}", other.type_name()),
        ),
    }
}

/// Map an index value onto a slot of `handle`, counting negatives from the end.
fn resolve_index(handle: &SeriesRef, index: &Value, position: usize) -> EvalResult<usize> {
    let Value::Int(i) = index else {
        return fail(
            position,
            format!("index must be an int, found {}", index.type_name()),
        );
    };
    let len = handle.borrow().len();
    let resolved = if *i < 0 {
        i64::try_from(len).ok().and_then(|l| l.checked_add(*i))
    } else {
        Some(*i)
    };
    match resolved.and_then(|r| usize::try_from(r).ok()) {
        Some(slot) if slot < len => Ok(slot),
        _ => fail(
            position,
            format!("index {i} out of bounds for series of length {len}"),
        ),
    }
}

fn eval_expr(expr: &Expr, env: &Environment) -> EvalResult<Value> {
    match expr {
        Expr::Int(v) => Ok(Value::Int(*v)),
        Expr::Num(v) => Ok(Value::Num(*v)),
        Expr::Var { name, position } => match env.get(name) {
            Some(value) => Ok(value.clone()),
            None => fail(*position, format!("undefined variable '{name}'")),
        },
        Expr::Array { items, position } => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                let value = eval_expr(item, env)?;
                match value.as_f64() {
                    Some(v) => values.push(v),
                    None => {
                        return fail(
                            *position,
                            format!("array elements must be numbers, found {}", value.type_name()),
                        );
                    }
                }
            }
            Ok(Value::series(values))
        }
        Expr::Index {
            target,
            index,
            position,
        } => {
            let handle = match eval_expr(target, env)? {
                Value::Series(handle) => handle,
                other => {
                    return fail(
                        *position,
                        format!("cannot index into a value of type {}", other.type_name()),
                    );
                }
            };
            let idx = eval_expr(index, env)?;
            let slot = resolve_index(&handle, &idx, *position)?;
            let value = handle.borrow()[slot];
            Ok(Value::Num(value))
        }
        Expr::Neg { operand, position } => match eval_expr(operand, env)? {
            Value::Int(v) => v
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| RuntimeError {
                    message: "integer overflow in negation".to_string(),
                    position: *position,
                }),
            Value::Num(v) => Ok(Value::Num(-v)),
            Value::Series(handle) => Ok(Value::series(
                handle.borrow().iter().map(|v| -v).collect(),
            )),
        },
        Expr::Binary {
            op,
            left,
            right,
            position,
        } => {
            let l = eval_expr(left, env)?;
            let r = eval_expr(right, env)?;
            binary(*op, &l, &r, *position)
        }
        Expr::Call {
            name,
            args,
            position,
        } => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_expr(arg, env)?);
            }
            call_builtin(name, &values, *position)
        }
    }
}

fn apply(op: BinaryOp, a: f64, b: f64) -> f64 {
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Pow => a.powf(b),
    }
}

fn int_binary(op: BinaryOp, a: i64, b: i64, position: usize) -> EvalResult<Value> {
    let checked = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div => {
            if b == 0 {
                return fail(position, "division by zero");
            }
            return Ok(Value::Num(a as f64 / b as f64));
        }
        BinaryOp::Pow => match u32::try_from(b) {
            Ok(exp) => a.checked_pow(exp),
            Err(_) => return Ok(Value::Num((a as f64).powf(b as f64))),
        },
    };
    checked.map(Value::Int).ok_or_else(|| RuntimeError {
        message: format!("integer overflow in {a} {} {b}", op.symbol()),
        position,
    })
}

fn binary(op: BinaryOp, left: &Value, right: &Value, position: usize) -> EvalResult<Value> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_binary(op, *a, *b, position),
        (Value::Series(a), Value::Series(b)) => {
            let a = a.borrow();
            let b = b.borrow();
            if a.len() != b.len() {
                return fail(
                    position,
                    format!(
                        "series length mismatch in '{}': {} vs {}",
                        op.symbol(),
                        a.len(),
                        b.len()
                    ),
                );
            }
            Ok(Value::series(
                a.iter().zip(b.iter()).map(|(x, y)| apply(op, *x, *y)).collect(),
            ))
        }
        (Value::Series(a), scalar) => {
            let b = scalar.as_f64().unwrap_or_default();
            Ok(Value::series(a.borrow().iter().map(|x| apply(op, *x, b)).collect()))
        }
        (scalar, Value::Series(b)) => {
            let a = scalar.as_f64().unwrap_or_default();
            Ok(Value::series(b.borrow().iter().map(|y| apply(op, a, *y)).collect()))
        }
        (a, b) => {
            let a = a.as_f64().unwrap_or_default();
            let b = b.as_f64().unwrap_or_default();
            Ok(Value::Num(apply(op, a, b)))
        }
    }
}

fn check_arity(name: &str, args: &[Value], expected: usize, position: usize) -> EvalResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        fail(
            position,
            format!(
                "{name}() takes {expected} argument(s), got {}",
                args.len()
            ),
        )
    }
}

fn series_arg<'v>(name: &str, value: &'v Value, position: usize) -> EvalResult<&'v SeriesRef> {
    value.as_series().ok_or_else(|| RuntimeError {
        message: format!("{name}() expects a series, found {}", value.type_name()),
        position,
    })
}

fn count_arg(name: &str, value: &Value, position: usize) -> EvalResult<usize> {
    match value {
        Value::Int(n) => match usize::try_from(*n) {
            Ok(count) if count <= MAX_SERIES_LEN => Ok(count),
            Ok(_) => fail(
                position,
                format!("{name}() count {n} exceeds the limit of {MAX_SERIES_LEN}"),
            ),
            Err(_) => fail(
                position,
                format!("{name}() expects a non-negative count, found {n}"),
            ),
        },
        other => fail(
            position,
            format!("{name}() expects an int count, found {}", other.type_name()),
        ),
    }
}

fn call_builtin(name: &str, args: &[Value], position: usize) -> EvalResult<Value> {
    match name {
        "len" => {
            check_arity(name, args, 1, position)?;
            let len = series_arg(name, &args[0], position)?.borrow().len();
            Ok(Value::Int(i64::try_from(len).unwrap_or(i64::MAX)))
        }
        "sum" => {
            check_arity(name, args, 1, position)?;
            let total = series_arg(name, &args[0], position)?.borrow().iter().sum();
            Ok(Value::Num(total))
        }
        "mean" => {
            check_arity(name, args, 1, position)?;
            let values = series_arg(name, &args[0], position)?.borrow();
            if values.is_empty() {
                return fail(position, "mean() of an empty series");
            }
            Ok(Value::Num(values.iter().sum::<f64>() / values.len() as f64))
        }
        "zeros" => {
            check_arity(name, args, 1, position)?;
            let n = count_arg(name, &args[0], position)?;
            Ok(Value::series(vec![0.0; n]))
        }
        "fill" => {
            check_arity(name, args, 2, position)?;
            let n = count_arg(name, &args[0], position)?;
            let Some(v) = args[1].as_f64() else {
                return fail(
                    position,
                    format!("fill() expects a number, found {}", args[1].type_name()),
                );
            };
            Ok(Value::series(vec![v; n]))
        }
        "cumsum" => {
            check_arity(name, args, 1, position)?;
            let values = series_arg(name, &args[0], position)?.borrow();
            let mut running = 0.0;
            Ok(Value::series(
                values
                    .iter()
                    .map(|v| {
                        running += v;
                        running
                    })
                    .collect(),
            ))
        }
        "abs" => {
            check_arity(name, args, 1, position)?;
            match &args[0] {
                Value::Int(v) => v.checked_abs().map(Value::Int).ok_or_else(|| RuntimeError {
                    message: "integer overflow in abs()".to_string(),
                    position,
                }),
                Value::Num(v) => Ok(Value::Num(v.abs())),
                Value::Series(handle) => {
                    Ok(Value::series(handle.borrow().iter().map(|v| v.abs()).collect()))
                }
            }
        }
        "min" | "max" => {
            check_arity(name, args, 2, position)?;
            let pick = if name == "min" { f64::min } else { f64::max };
            match (&args[0], &args[1]) {
                (Value::Int(a), Value::Int(b)) => {
                    Ok(Value::Int(if name == "min" { *a.min(b) } else { *a.max(b) }))
                }
                (Value::Series(a), Value::Series(b)) => {
                    let a = a.borrow();
                    let b = b.borrow();
                    if a.len() != b.len() {
                        return fail(
                            position,
                            format!(
                                "{name}() series length mismatch: {} vs {}",
                                a.len(),
                                b.len()
                            ),
                        );
                    }
                    Ok(Value::series(
                        a.iter().zip(b.iter()).map(|(x, y)| pick(*x, *y)).collect(),
                    ))
                }
                (Value::Series(s), scalar) | (scalar, Value::Series(s)) => {
                    let k = scalar.as_f64().unwrap_or_default();
                    Ok(Value::series(s.borrow().iter().map(|x| pick(*x, k)).collect()))
                }
                (a, b) => Ok(Value::Num(pick(
                    a.as_f64().unwrap_or_default(),
                    b.as_f64().unwrap_or_default(),
                ))),
            }
        }
        "lag" => {
            check_arity(name, args, 2, position)?;
            let values = series_arg(name, &args[0], position)?.borrow();
            let k = count_arg(name, &args[1], position)?;
            let shifted = (0..values.len())
                .map(|i| if i < k { 0.0 } else { values[i - k] })
                .collect();
            Ok(Value::series(shifted))
        }
        _ => fail(position, format!("unknown function '{name}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::parser::parse;

    fn run(source: &str) -> Environment {
        let mut env = Environment::new();
        execute(&parse(source).unwrap(), &mut env).unwrap();
        env
    }

    fn run_err(source: &str) -> RuntimeError {
        let mut env = Environment::new();
        execute(&parse(source).unwrap(), &mut env).unwrap_err()
    }

    fn series(env: &Environment, name: &str) -> Vec<f64> {
        env.get(name)
            .and_then(Value::as_series)
            .map(|h| h.borrow().clone())
            .unwrap_or_else(|| panic!("{name} is not a series"))
    }

    #[test]
    fn integer_arithmetic_stays_int() {
        let env = run("a = 2 + 3 * 4\nb = 2 ** 10\nc = 7 - 10");
        assert_eq!(env.get("a"), Some(&Value::Int(14)));
        assert_eq!(env.get("b"), Some(&Value::Int(1024)));
        assert_eq!(env.get("c"), Some(&Value::Int(-3)));
    }

    #[test]
    fn division_yields_f64() {
        let env = run("a = 7 / 2");
        assert_eq!(env.get("a"), Some(&Value::Num(3.5)));
    }

    #[test]
    fn integer_division_by_zero_fails() {
        let err = run_err("a = 1 / 0");
        assert_eq!(err.message, "division by zero");
        assert_eq!(err.position, 6);
    }

    #[test]
    fn integer_overflow_fails() {
        let err = run_err("a = 9223372036854775807 + 1");
        assert!(err.message.contains("overflow"));
    }

    #[test]
    fn negative_exponent_falls_back_to_f64() {
        let env = run("a = 2 ** -1");
        assert_eq!(env.get("a"), Some(&Value::Num(0.5)));
    }

    #[test]
    fn scalar_series_broadcast() {
        let env = run("s = [1, 2, 3]\na = s * 2\nb = 10 - s\nc = -s");
        assert_eq!(series(&env, "a"), vec![2.0, 4.0, 6.0]);
        assert_eq!(series(&env, "b"), vec![9.0, 8.0, 7.0]);
        assert_eq!(series(&env, "c"), vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn series_series_requires_equal_lengths() {
        let env = run("a = [1, 2] + [10, 20]");
        assert_eq!(series(&env, "a"), vec![11.0, 22.0]);
        let err = run_err("a = [1, 2] + [1, 2, 3]");
        assert!(err.message.contains("length mismatch"));
    }

    #[test]
    fn assignment_aliases_series() {
        let env = run("a = [1, 2]\nb = a\nb[0] = 5");
        assert_eq!(series(&env, "a"), vec![5.0, 2.0]);
    }

    #[test]
    fn compound_assignment_rebinds() {
        let env = run("a = [1, 2]\nb = a\nb += 1\nn = 3\nn *= 2");
        assert_eq!(series(&env, "a"), vec![1.0, 2.0]);
        assert_eq!(series(&env, "b"), vec![2.0, 3.0]);
        assert_eq!(env.get("n"), Some(&Value::Int(6)));
    }

    #[test]
    fn element_assignment_and_negative_indexes() {
        let env = run("a = zeros(3)\na[0] = 1\na[-1] = 7\na[1] += 2\nlast = a[-1]");
        assert_eq!(series(&env, "a"), vec![1.0, 2.0, 7.0]);
        assert_eq!(env.get("last"), Some(&Value::Num(7.0)));
    }

    #[test]
    fn element_assignment_reads_same_series() {
        let env = run("a = [1, 2, 3]\na[0] = a[1] + a[2]");
        assert_eq!(series(&env, "a"), vec![5.0, 2.0, 3.0]);
    }

    #[test]
    fn index_errors() {
        assert!(run_err("a = [1]\nb = a[1]").message.contains("out of bounds"));
        assert!(run_err("a = [1]\nb = a[-2]").message.contains("out of bounds"));
        assert!(run_err("a = [1]\nb = a[0.5]").message.contains("index must be an int"));
        assert!(run_err("n = 3\nn[0] = 1").message.contains("cannot index"));
        assert!(run_err("a = [1]\na[0] = [2]").message.contains("cannot store"));
    }

    #[test]
    fn loops_exclusive_and_inclusive() {
        let env = run("a = zeros(4)\nfor (t in 0..<4) { a[t] = t * t }\ns = 0\nfor i in 1..3 { s += i }");
        assert_eq!(series(&env, "a"), vec![0.0, 1.0, 4.0, 9.0]);
        assert_eq!(env.get("s"), Some(&Value::Int(6)));
    }

    #[test]
    fn loop_variable_does_not_outlive_loop() {
        let env = run("for (period in 0..<2) { }");
        assert!(!env.contains("period"));
        let env = run("i = [1]\nfor (i in 0..<2) { }");
        assert_eq!(series(&env, "i"), vec![1.0]);
    }

    #[test]
    fn empty_range_runs_nothing() {
        let env = run("s = 0\nfor (t in 3..<1) { s += 1 }");
        assert_eq!(env.get("s"), Some(&Value::Int(0)));
    }

    #[test]
    fn range_bounds_must_be_int() {
        assert!(run_err("for (t in 0..<2.5) { }").message.contains("range end"));
    }

    #[test]
    fn undefined_variable() {
        let err = run_err("a = b + 1");
        assert_eq!(err.message, "undefined variable 'b'");
        assert_eq!(err.position, 4);
        assert!(run_err("c += 1").message.contains("undefined"));
    }

    #[test]
    fn failure_keeps_earlier_effects() {
        let mut env = Environment::new();
        let program = parse("a = 1\nb = missing\nc = 3").unwrap();
        assert!(execute(&program, &mut env).is_err());
        assert!(env.contains("a"));
        assert!(!env.contains("c"));
    }

    #[test]
    fn builtins() {
        let env = run(
            "s = [1, -2, 3]\n\
             n = len(s)\n\
             total = sum(s)\n\
             avg = mean(s)\n\
             f = fill(2, 0.5)\n\
             c = cumsum(s)\n\
             m = abs(s)\n\
             lo = min(s, 0)\n\
             hi = max(2, 5)\n\
             l = lag(s, 1)",
        );
        assert_eq!(env.get("n"), Some(&Value::Int(3)));
        assert_eq!(env.get("total"), Some(&Value::Num(2.0)));
        assert!(matches!(env.get("avg"), Some(Value::Num(v)) if (v - 2.0 / 3.0).abs() < 1e-12));
        assert_eq!(series(&env, "f"), vec![0.5, 0.5]);
        assert_eq!(series(&env, "c"), vec![1.0, -1.0, 2.0]);
        assert_eq!(series(&env, "m"), vec![1.0, 2.0, 3.0]);
        assert_eq!(series(&env, "lo"), vec![0.0, -2.0, 0.0]);
        assert_eq!(env.get("hi"), Some(&Value::Int(5)));
        assert_eq!(series(&env, "l"), vec![0.0, 1.0, -2.0]);
    }

    #[test]
    fn builtin_errors() {
        assert!(run_err("a = len(3)").message.contains("expects a series"));
        assert!(run_err("a = zeros(-1)").message.contains("non-negative"));
        assert!(run_err("a = sum(1, 2)").message.contains("takes 1 argument"));
        assert!(run_err("a = mean([])").message.contains("empty"));
        assert!(run_err("a = nope(1)").message.contains("unknown function"));
    }

    #[test]
    fn oversized_counts_are_rejected() {
        let err = run_err("big = zeros(9223372036854775807)");
        assert!(err.message.contains("exceeds the limit"));
        assert!(run_err("f = fill(1000001, 1.5)").message.contains("exceeds the limit"));

        let env = run("a = zeros(1000000)");
        assert_eq!(series(&env, "a").len(), MAX_SERIES_LEN);
    }
}
