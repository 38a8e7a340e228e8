//! Script AST data structures.
//!
//! - `Expr`: values, names, array literals, indexing, arithmetic, calls
//! - `Stmt`: assignments, element assignments, range loops, bare expressions
//! - `Program`: the statement list of one script
//!
//! Every node that can fail at runtime carries the byte offset it was parsed
//! at, so runtime errors can point back into the source.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
        }
    }
}

/// `=` or one of the compound forms `+= -= *= /=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Compound(BinaryOp),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Num(f64),
    Var {
        name: String,
        position: usize,
    },
    Array {
        items: Vec<Expr>,
        position: usize,
    },
    Index {
        target: Box<Expr>,
        index: Box<Expr>,
        position: usize,
    },
    Neg {
        operand: Box<Expr>,
        position: usize,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        position: usize,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        position: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign {
        name: String,
        op: AssignOp,
        value: Expr,
        position: usize,
    },
    AssignIndex {
        name: String,
        index: Expr,
        op: AssignOp,
        value: Expr,
        position: usize,
    },
    For {
        var: String,
        start: Expr,
        end: Expr,
        inclusive: bool,
        body: Vec<Stmt>,
        position: usize,
    },
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    /// Names assigned at top level or inside loops, in first-assignment order.
    /// Loop variables are scoped to their loop and not listed.
    pub fn assigned_names(&self) -> Vec<&str> {
        fn walk<'p>(stmts: &'p [Stmt], out: &mut Vec<&'p str>) {
            for stmt in stmts {
                let name = match stmt {
                    Stmt::Assign { name, .. } => name.as_str(),
                    Stmt::For { body, .. } => {
                        walk(body, out);
                        continue;
                    }
                    Stmt::AssignIndex { .. } | Stmt::Expr(_) => continue,
                };
                if !out.contains(&name) {
                    out.push(name);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.statements, &mut out);
        out
    }
}
