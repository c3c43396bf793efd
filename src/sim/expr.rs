use super::{DRIVEN, VAL};

use std::collections::BTreeSet;
use std::sync::Arc;

/// A boolean formula over named operands.
///
/// Operand names are local to one primitive: a name that matches one of the
/// primitive's inputs reads that input's net; a name that matches one of its
/// own outputs reads the output's staged cell (the previous tick's value),
/// which is how latch feedback is expressed without a drawn loop.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Value of the named operand. An undriven operand reads low.
    Input(String),
    /// True while the named operand is actively driven.
    Driven(String),
    /// True on the tick where the named input goes low to high.
    Rising(String),
    /// True on the tick where the named input goes high to low.
    Falling(String),
    Const(bool),
    Not(Arc<Expr>),
    And(Arc<Expr>, Arc<Expr>),
    Or(Arc<Expr>, Arc<Expr>),
    Xor(Arc<Expr>, Arc<Expr>),
}

impl Expr {
    pub fn input(name: &str) -> Arc<Expr> {
        Arc::new(Expr::Input(name.to_string()))
    }

    pub fn driven(name: &str) -> Arc<Expr> {
        Arc::new(Expr::Driven(name.to_string()))
    }

    pub fn rising(name: &str) -> Arc<Expr> {
        Arc::new(Expr::Rising(name.to_string()))
    }

    pub fn falling(name: &str) -> Arc<Expr> {
        Arc::new(Expr::Falling(name.to_string()))
    }

    pub fn constant(value: bool) -> Arc<Expr> {
        Arc::new(Expr::Const(value))
    }

    pub fn not(e: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Not(e))
    }

    pub fn and(e1: Arc<Expr>, e2: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::And(e1, e2))
    }

    pub fn or(e1: Arc<Expr>, e2: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Or(e1, e2))
    }

    pub fn xor(e1: Arc<Expr>, e2: Arc<Expr>) -> Arc<Expr> {
        Arc::new(Expr::Xor(e1, e2))
    }

    /// Every operand name the formula mentions.
    pub fn operands(&self) -> BTreeSet<&str> {
        let mut results = BTreeSet::new();
        self.operands_rec(&mut results, false);
        results
    }

    /// Operand names mentioned under a rising or falling edge.
    pub fn edge_operands(&self) -> BTreeSet<&str> {
        let mut results = BTreeSet::new();
        self.operands_rec(&mut results, true);
        results
    }

    fn operands_rec<'a>(&'a self, results: &mut BTreeSet<&'a str>, edges_only: bool) {
        match self {
            Expr::Input(name) | Expr::Driven(name) => {
                if !edges_only {
                    results.insert(name);
                }
            }
            Expr::Rising(name) | Expr::Falling(name) => {
                results.insert(name);
            }
            Expr::Const(_) => (),
            Expr::Not(e) => e.operands_rec(results, edges_only),
            Expr::And(e1, e2) | Expr::Or(e1, e2) | Expr::Xor(e1, e2) => {
                e1.operands_rec(results, edges_only);
                e2.operands_rec(results, edges_only);
            }
        }
    }

    /// Stack depth of the lowered program.
    pub fn depth(&self) -> usize {
        match self {
            Expr::Input(_)
            | Expr::Driven(_)
            | Expr::Rising(_)
            | Expr::Falling(_)
            | Expr::Const(_) => 1,
            Expr::Not(e) => e.depth(),
            Expr::And(e1, e2) | Expr::Or(e1, e2) | Expr::Xor(e1, e2) => {
                e1.depth().max(e2.depth() + 1)
            }
        }
    }

    /// Lower to a postfix program. `slot` maps each operand name to its
    /// cells; unknown names must have been rejected at declaration.
    pub(crate) fn lower<F>(&self, ops: &mut Vec<BoolOp>, slot: &F)
    where
        F: Fn(&str) -> OperandSlot,
    {
        match self {
            Expr::Input(name) => match slot(name).cell {
                Some(cell) => ops.push(BoolOp::PushValue(cell)),
                None => ops.push(BoolOp::PushConst(false)),
            },
            Expr::Driven(name) => match slot(name).cell {
                Some(cell) => ops.push(BoolOp::PushDriven(cell)),
                None => ops.push(BoolOp::PushConst(false)),
            },
            Expr::Rising(name) => {
                let s = slot(name);
                match (s.cell, s.prev) {
                    (Some(cell), Some(prev)) => ops.push(BoolOp::PushRising { cell, prev }),
                    _ => ops.push(BoolOp::PushConst(false)),
                }
            }
            Expr::Falling(name) => {
                let s = slot(name);
                match (s.cell, s.prev) {
                    (Some(cell), Some(prev)) => ops.push(BoolOp::PushFalling { cell, prev }),
                    _ => ops.push(BoolOp::PushConst(false)),
                }
            }
            Expr::Const(value) => ops.push(BoolOp::PushConst(*value)),
            Expr::Not(e) => {
                e.lower(ops, slot);
                ops.push(BoolOp::Not);
            }
            Expr::And(e1, e2) => {
                e1.lower(ops, slot);
                e2.lower(ops, slot);
                ops.push(BoolOp::And);
            }
            Expr::Or(e1, e2) => {
                e1.lower(ops, slot);
                e2.lower(ops, slot);
                ops.push(BoolOp::Or);
            }
            Expr::Xor(e1, e2) => {
                e1.lower(ops, slot);
                e2.lower(ops, slot);
                ops.push(BoolOp::Xor);
            }
        }
    }

    pub(crate) fn hash_into<H: std::hash::Hasher>(&self, state: &mut H) {
        use std::hash::Hash;
        match self {
            Expr::Input(name) => (0u8, name).hash(state),
            Expr::Driven(name) => (1u8, name).hash(state),
            Expr::Rising(name) => (2u8, name).hash(state),
            Expr::Falling(name) => (3u8, name).hash(state),
            Expr::Const(value) => (4u8, value).hash(state),
            Expr::Not(e) => {
                5u8.hash(state);
                e.hash_into(state);
            }
            Expr::And(e1, e2) => {
                6u8.hash(state);
                e1.hash_into(state);
                e2.hash_into(state);
            }
            Expr::Or(e1, e2) => {
                7u8.hash(state);
                e1.hash_into(state);
                e2.hash_into(state);
            }
            Expr::Xor(e1, e2) => {
                8u8.hash(state);
                e1.hash_into(state);
                e2.hash_into(state);
            }
        }
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Input(name) => write!(f, "{name}"),
            Expr::Driven(name) => write!(f, "driven({name})"),
            Expr::Rising(name) => write!(f, "rise({name})"),
            Expr::Falling(name) => write!(f, "fall({name})"),
            Expr::Const(value) => write!(f, "{}", *value as u8),
            Expr::Not(e) => write!(f, "!{e}"),
            Expr::And(e1, e2) => write!(f, "({e1} & {e2})"),
            Expr::Or(e1, e2) => write!(f, "({e1} | {e2})"),
            Expr::Xor(e1, e2) => write!(f, "({e1} ^ {e2})"),
        }
    }
}

/// Where an operand reads from. `cell` is the operand's net or staged cell
/// (None for an unwired input); `prev` is the previous-tick snapshot cell,
/// present only for edge-referenced inputs.
pub(crate) struct OperandSlot {
    pub cell: Option<usize>,
    pub prev: Option<usize>,
}

/// One step of a lowered formula program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoolOp {
    PushValue(usize),
    PushDriven(usize),
    PushRising { cell: usize, prev: usize },
    PushFalling { cell: usize, prev: usize },
    PushConst(bool),
    Not,
    And,
    Or,
    Xor,
}

/// Evaluation stack bound; formulas deeper than this are rejected at
/// declaration.
pub(crate) const MAX_STACK: usize = 32;

pub(crate) fn run(ops: &[BoolOp], memory: &[u64]) -> bool {
    let mut stack = [false; MAX_STACK];
    let mut sp = 0usize;
    for op in ops {
        match *op {
            BoolOp::PushValue(cell) => {
                stack[sp] = memory[cell] & VAL != 0;
                sp += 1;
            }
            BoolOp::PushDriven(cell) => {
                stack[sp] = memory[cell] & DRIVEN != 0;
                sp += 1;
            }
            BoolOp::PushRising { cell, prev } => {
                stack[sp] = memory[cell] & VAL != 0 && memory[prev] & VAL == 0;
                sp += 1;
            }
            BoolOp::PushFalling { cell, prev } => {
                stack[sp] = memory[cell] & VAL == 0 && memory[prev] & VAL != 0;
                sp += 1;
            }
            BoolOp::PushConst(value) => {
                stack[sp] = value;
                sp += 1;
            }
            BoolOp::Not => stack[sp - 1] = !stack[sp - 1],
            BoolOp::And => {
                sp -= 1;
                stack[sp - 1] = stack[sp - 1] && stack[sp];
            }
            BoolOp::Or => {
                sp -= 1;
                stack[sp - 1] = stack[sp - 1] || stack[sp];
            }
            BoolOp::Xor => {
                sp -= 1;
                stack[sp - 1] = stack[sp - 1] ^ stack[sp];
            }
        }
    }
    stack[0]
}
