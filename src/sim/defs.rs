use super::expr::Expr;

use lazy_static::lazy_static;

use std::sync::Arc;

/// Gate shapes with fixed boolean templates. Gate outputs are always driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateOp {
    And,
    Or,
    Xor,
    Nand,
    Nor,
    Xnor,
    Not,
    Buffer,
}

impl GateOp {
    pub(crate) fn arity_ok(&self, inputs: usize) -> bool {
        match self {
            GateOp::Not | GateOp::Buffer => inputs == 1,
            _ => (1..=16).contains(&inputs),
        }
    }

    /// Fold the named inputs into the gate's output formula.
    pub(crate) fn formula(&self, inputs: &[&str]) -> Arc<Expr> {
        let mut acc = Expr::input(inputs[0]);
        for name in &inputs[1..] {
            acc = match self {
                GateOp::And | GateOp::Nand => Expr::and(acc, Expr::input(name)),
                GateOp::Or | GateOp::Nor => Expr::or(acc, Expr::input(name)),
                GateOp::Xor | GateOp::Xnor => Expr::xor(acc, Expr::input(name)),
                GateOp::Not | GateOp::Buffer => unreachable!(),
            };
        }
        if self.inverted() {
            acc = Expr::not(acc);
        }
        acc
    }

    fn inverted(&self) -> bool {
        matches!(self, GateOp::Nand | GateOp::Nor | GateOp::Xnor | GateOp::Not)
    }
}

impl std::fmt::Display for GateOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GateOp::And => "and",
            GateOp::Or => "or",
            GateOp::Xor => "xor",
            GateOp::Nand => "nand",
            GateOp::Nor => "nor",
            GateOp::Xnor => "xnor",
            GateOp::Not => "not",
            GateOp::Buffer => "buffer",
        };
        write!(f, "{name}")
    }
}

/// The declared shape of a builtin: named inputs and formula-driven outputs.
#[derive(Debug, Clone)]
pub struct BuiltinSpec {
    pub name: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<OutputSpec>,
}

#[derive(Debug, Clone)]
pub struct OutputSpec {
    pub name: String,
    pub formula: Arc<Expr>,
    /// None means always driven.
    pub driven: Option<Arc<Expr>>,
}

impl BuiltinSpec {
    pub fn new(name: &str, inputs: &[&str]) -> BuiltinSpec {
        BuiltinSpec {
            name: name.to_string(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: vec![],
        }
    }

    pub fn output(mut self, name: &str, formula: Arc<Expr>) -> BuiltinSpec {
        self.outputs.push(OutputSpec {
            name: name.to_string(),
            formula,
            driven: None,
        });
        self
    }

    pub fn tri_state_output(
        mut self,
        name: &str,
        formula: Arc<Expr>,
        driven: Arc<Expr>,
    ) -> BuiltinSpec {
        self.outputs.push(OutputSpec {
            name: name.to_string(),
            formula,
            driven: Some(driven),
        });
        self
    }
}

fn d_latch() -> BuiltinSpec {
    // q follows d while load is high, holds otherwise
    let q = Expr::or(
        Expr::and(Expr::input("load"), Expr::input("d")),
        Expr::and(Expr::not(Expr::input("load")), Expr::input("q")),
    );
    BuiltinSpec::new("d_latch", &["load", "d"]).output("q", q)
}

fn d_flip_flop() -> BuiltinSpec {
    let take = Expr::rising("clk");
    let q = Expr::or(
        Expr::and(take.clone(), Expr::input("d")),
        Expr::and(Expr::not(take), Expr::input("q")),
    );
    BuiltinSpec::new("d_flip_flop", &["clk", "d"]).output("q", q)
}

fn d_flip_flop_en() -> BuiltinSpec {
    let take = Expr::and(Expr::rising("clk"), Expr::input("en"));
    let q = Expr::or(
        Expr::and(take.clone(), Expr::input("d")),
        Expr::and(Expr::not(take), Expr::input("q")),
    );
    BuiltinSpec::new("d_flip_flop_en", &["clk", "en", "d"]).output("q", q)
}

fn sr_flip_flop() -> BuiltinSpec {
    let take = Expr::rising("clk");
    let next = Expr::or(
        Expr::input("s"),
        Expr::and(Expr::not(Expr::input("r")), Expr::input("q")),
    );
    let q = Expr::or(
        Expr::and(take.clone(), next),
        Expr::and(Expr::not(take), Expr::input("q")),
    );
    BuiltinSpec::new("sr_flip_flop", &["clk", "s", "r"]).output("q", q)
}

fn tri_buffer() -> BuiltinSpec {
    BuiltinSpec::new("tri_buffer", &["en", "a"]).tri_state_output(
        "q",
        Expr::input("a"),
        Expr::input("en"),
    )
}

fn tri_inverter() -> BuiltinSpec {
    BuiltinSpec::new("tri_inverter", &["en", "a"]).tri_state_output(
        "q",
        Expr::not(Expr::input("a")),
        Expr::input("en"),
    )
}

fn mux2() -> BuiltinSpec {
    let q = Expr::or(
        Expr::and(Expr::not(Expr::input("sel")), Expr::input("a")),
        Expr::and(Expr::input("sel"), Expr::input("b")),
    );
    BuiltinSpec::new("mux2", &["sel", "a", "b"]).output("q", q)
}

fn demux2() -> BuiltinSpec {
    BuiltinSpec::new("demux2", &["sel", "a"])
        .tri_state_output("q0", Expr::input("a"), Expr::not(Expr::input("sel")))
        .tri_state_output("q1", Expr::input("a"), Expr::input("sel"))
}

fn full_adder() -> BuiltinSpec {
    let half = Expr::xor(Expr::input("a"), Expr::input("b"));
    let sum = Expr::xor(half.clone(), Expr::input("cin"));
    let cout = Expr::or(
        Expr::and(Expr::input("a"), Expr::input("b")),
        Expr::and(Expr::input("cin"), half),
    );
    BuiltinSpec::new("full_adder", &["a", "b", "cin"])
        .output("sum", sum)
        .output("cout", cout)
}

lazy_static! {
    /// The stock builtin library.
    pub static ref BUILTINS: Vec<BuiltinSpec> = vec![
        d_latch(),
        d_flip_flop(),
        d_flip_flop_en(),
        sr_flip_flop(),
        tri_buffer(),
        tri_inverter(),
        mux2(),
        demux2(),
        full_adder(),
    ];
}

/// Look up a stock builtin by name.
pub fn builtin(name: &str) -> Option<&'static BuiltinSpec> {
    BUILTINS.iter().find(|spec| spec.name == name)
}
