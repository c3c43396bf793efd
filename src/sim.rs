use super::*;

pub mod defs;
pub mod expr;


use defs::{BuiltinSpec, GateOp};
use expr::{BoolOp, Expr, OperandSlot};

use log::*;

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub type GateId = usize;
pub type BuiltinId = usize;
pub type ClockId = usize;
pub type ConstId = usize;
pub type PullId = usize;

pub(crate) const VAL: u64 = 0b001;
pub(crate) const DRIVEN: u64 = 0b010;
pub(crate) const CONFLICT: u64 = 0b100;

/// Read-back state of a net or const.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Low,
    High,
    Floating,
    Conflict,
}

impl Signal {
    pub(crate) fn encode(self) -> u64 {
        match self {
            Signal::Low => DRIVEN,
            Signal::High => DRIVEN | VAL,
            Signal::Floating => 0,
            Signal::Conflict => CONFLICT,
        }
    }

    pub(crate) fn decode(cell: u64) -> Signal {
        if cell & CONFLICT != 0 {
            Signal::Conflict
        } else if cell & DRIVEN == 0 {
            Signal::Floating
        } else if cell & VAL != 0 {
            Signal::High
        } else {
            Signal::Low
        }
    }
}

impl From<bool> for Signal {
    fn from(value: bool) -> Signal {
        if value {
            Signal::High
        } else {
            Signal::Low
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signal::Low => write!(f, "0"),
            Signal::High => write!(f, "1"),
            Signal::Floating => write!(f, "z"),
            Signal::Conflict => write!(f, "!"),
        }
    }
}

/// Compiler configuration, supplied by the editor.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// When set, nets driven to differing values in one tick read back as
    /// [`Signal::Conflict`] instead of resolving silently.
    pub check_net_conflicts: bool,
    /// The global tick rate clock periods are derived from.
    pub target_ticks_per_second: u64,
    /// Retain per-step labels for [`Simulation::disassemble`].
    pub verbose_comments: bool,
}

impl Default for SimConfig {
    fn default() -> SimConfig {
        SimConfig {
            check_net_conflicts: false,
            target_ticks_per_second: 1_000_000,
            verbose_comments: false,
        }
    }
}

#[derive(Debug, Clone)]
struct IoDecl {
    direction: Direction,
    /// 1 for staged outputs, 0 for inputs and host-set cells.
    delay: u8,
    pull: Option<bool>,
}

#[derive(Debug, Clone)]
struct NetDecl {
    ios: Vec<IoId>,
}

#[derive(Debug)]
struct GateDecl {
    op: GateOp,
    inputs: Vec<(String, IoId)>,
    output: (String, IoId),
    formula: Arc<Expr>,
}

#[derive(Debug)]
struct BuiltinDecl {
    spec: BuiltinSpec,
    /// Local name to suffixed id, for inputs and outputs both.
    io: BTreeMap<String, IoId>,
}

#[derive(Debug)]
struct ClockDecl {
    frequency: u64,
    enable: Option<IoId>,
    output: IoId,
}

#[derive(Debug)]
struct ConstDecl {
    output: IoId,
    initial: Signal,
}

#[derive(Debug)]
struct PullDecl {
    io: IoId,
    value: bool,
}

/// Builds the declaration set for one compiled simulation.
///
/// Handles are monotonically increasing and never reused within one
/// compiled instance's lifetime. Every `declare_` call validates its
/// arguments and fails fast; a failure indicates an editor-level bug.
#[derive(Debug)]
pub struct Compiler {
    config: SimConfig,
    ios: BTreeMap<IoId, IoDecl>,
    io_order: Vec<IoId>,
    io_net: BTreeMap<IoId, NetId>,
    nets: Vec<NetDecl>,
    gates: Vec<GateDecl>,
    builtins: Vec<BuiltinDecl>,
    clocks: Vec<ClockDecl>,
    consts: Vec<ConstDecl>,
    pulls: Vec<PullDecl>,
}

impl Compiler {
    pub fn new(config: SimConfig) -> Compiler {
        Compiler {
            config,
            ios: BTreeMap::new(),
            io_order: vec![],
            io_net: BTreeMap::new(),
            nets: vec![],
            gates: vec![],
            builtins: vec![],
            clocks: vec![],
            consts: vec![],
            pulls: vec![],
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    fn add_io(
        &mut self,
        name: &str,
        suffix: Suffix,
        direction: Direction,
        delay: u8,
        pull: Option<bool>,
    ) -> Result<IoId, SimError> {
        if name.is_empty() {
            return Err(SimError::BadName(name.to_string()));
        }
        let id = IoId::new(name, suffix);
        if self.ios.contains_key(&id) {
            return Err(SimError::DuplicateIo(id));
        }
        self.io_order.push(id.clone());
        self.ios.insert(
            id.clone(),
            IoDecl {
                direction,
                delay,
                pull,
            },
        );
        Ok(id)
    }

    /// Declare a final one-bit net attaching the given IOs.
    pub fn declare_net(&mut self, ios: &[IoId]) -> Result<NetId, SimError> {
        let id = self.nets.len();
        for io in ios {
            if !self.ios.contains_key(io) {
                return Err(SimError::UnknownIo(io.clone()));
            }
            if self.io_net.contains_key(io) {
                return Err(SimError::IoOnTwoNets(io.clone()));
            }
            self.io_net.insert(io.clone(), id);
        }
        self.nets.push(NetDecl { ios: ios.to_vec() });
        Ok(id)
    }

    /// Declare a gate with a fixed boolean template over 1 to 16 inputs.
    pub fn declare_gate(
        &mut self,
        op: GateOp,
        inputs: &[&str],
        output: &str,
        suffix: Suffix,
    ) -> Result<GateId, SimError> {
        if !op.arity_ok(inputs.len()) {
            return Err(SimError::GateArity(op, inputs.len()));
        }
        let mut input_ids = vec![];
        for name in inputs {
            let id = self.add_io(name, suffix, Direction::In, 0, None)?;
            input_ids.push((name.to_string(), id));
        }
        let output_id = self.add_io(output, suffix, Direction::Out, 1, None)?;
        let formula = op.formula(inputs);
        debug!("declare gate {op} {output}@{suffix}");
        self.gates.push(GateDecl {
            op,
            inputs: input_ids,
            output: (output.to_string(), output_id),
            formula,
        });
        Ok(self.gates.len() - 1)
    }

    /// Declare a builtin from its spec: one formula per output, plus an
    /// optional driven formula for tri-state outputs.
    pub fn declare_builtin(
        &mut self,
        spec: &BuiltinSpec,
        suffix: Suffix,
    ) -> Result<BuiltinId, SimError> {
        let mut locals: Vec<&str> = vec![];
        for input in &spec.inputs {
            if locals.contains(&input.as_str()) {
                return Err(SimError::DuplicateName(input.clone()));
            }
            locals.push(input);
        }
        for output in &spec.outputs {
            if locals.contains(&output.name.as_str()) {
                return Err(SimError::DuplicateName(output.name.clone()));
            }
            locals.push(&output.name);
        }
        for output in &spec.outputs {
            let formulas = [Some(&output.formula), output.driven.as_ref()];
            for formula in formulas.into_iter().flatten() {
                for operand in formula.operands() {
                    if !locals.contains(&operand) {
                        return Err(SimError::UnknownOperand(
                            output.name.clone(),
                            operand.to_string(),
                        ));
                    }
                }
                for operand in formula.edge_operands() {
                    if !spec.inputs.iter().any(|input| input == operand) {
                        return Err(SimError::UnknownOperand(
                            output.name.clone(),
                            operand.to_string(),
                        ));
                    }
                }
                let depth = formula.depth();
                if depth > expr::MAX_STACK {
                    return Err(SimError::FormulaTooDeep(output.name.clone(), depth));
                }
            }
        }

        let mut io = BTreeMap::new();
        for input in &spec.inputs {
            let id = self.add_io(input, suffix, Direction::In, 0, None)?;
            io.insert(input.clone(), id);
        }
        for output in &spec.outputs {
            let id = self.add_io(&output.name, suffix, Direction::Out, 1, None)?;
            io.insert(output.name.clone(), id);
        }
        debug!("declare builtin {} @{suffix}", spec.name);
        self.builtins.push(BuiltinDecl {
            spec: spec.clone(),
            io,
        });
        Ok(self.builtins.len() - 1)
    }

    /// Declare a free-running clock. An absent or unwired enable input
    /// counts as asserted.
    pub fn declare_clock(
        &mut self,
        frequency: u64,
        enable: Option<&str>,
        output: &str,
        suffix: Suffix,
    ) -> Result<ClockId, SimError> {
        if frequency == 0 {
            return Err(SimError::ZeroFrequency);
        }
        let enable = match enable {
            Some(name) => Some(self.add_io(name, suffix, Direction::In, 0, None)?),
            None => None,
        };
        let output = self.add_io(output, suffix, Direction::Out, 1, None)?;
        debug!("declare clock {frequency}Hz @{suffix}");
        self.clocks.push(ClockDecl {
            frequency,
            enable,
            output,
        });
        Ok(self.clocks.len() - 1)
    }

    /// Declare a constant whose value and drivenness the host sets directly.
    pub fn declare_const(
        &mut self,
        output: &str,
        initial: Signal,
        suffix: Suffix,
    ) -> Result<ConstId, SimError> {
        if initial == Signal::Conflict {
            return Err(SimError::InvalidSignal(initial));
        }
        let output = self.add_io(output, suffix, Direction::Out, 0, None)?;
        self.consts.push(ConstDecl { output, initial });
        Ok(self.consts.len() - 1)
    }

    /// Declare a pull resistor asserting `value` onto its net whenever no
    /// declared output drives it.
    pub fn declare_pull(
        &mut self,
        port: &str,
        value: bool,
        suffix: Suffix,
    ) -> Result<PullId, SimError> {
        let io = self.add_io(port, suffix, Direction::Inout, 0, Some(value))?;
        self.pulls.push(PullDecl { io, value });
        Ok(self.pulls.len() - 1)
    }

    /// Content hash of the declaration set. Two compilers with equal digests
    /// produce layout-identical simulations, so memory may be carried from
    /// one to the other.
    pub fn declaration_digest(&self) -> u64 {
        let mut state = DefaultHasher::new();
        for io in &self.io_order {
            let decl = &self.ios[io];
            (&**io, decl.direction, decl.delay, decl.pull).hash(&mut state);
        }
        for net in &self.nets {
            for io in &net.ios {
                (&**io).hash(&mut state);
            }
            "|".hash(&mut state);
        }
        for gate in &self.gates {
            gate.op.hash(&mut state);
            for (_, io) in &gate.inputs {
                (&**io).hash(&mut state);
            }
            (&*gate.output.1).hash(&mut state);
        }
        for builtin in &self.builtins {
            builtin.spec.name.hash(&mut state);
            for (local, io) in &builtin.io {
                (local, &**io).hash(&mut state);
            }
            for output in &builtin.spec.outputs {
                output.formula.hash_into(&mut state);
                if let Some(driven) = &output.driven {
                    driven.hash_into(&mut state);
                }
            }
        }
        // Clock frequencies and const values mutate memory in place, so
        // they stay out of the digest; only the wiring shape counts.
        for clock in &self.clocks {
            if let Some(enable) = &clock.enable {
                (&**enable).hash(&mut state);
            }
            (&*clock.output).hash(&mut state);
        }
        for konst in &self.consts {
            (&*konst.output).hash(&mut state);
        }
        for pull in &self.pulls {
            (&*pull.io, pull.value).hash(&mut state);
        }
        state.finish()
    }

    /// Finalize the layout, generate the tick body, and allocate (or adopt)
    /// the memory array.
    ///
    /// `previous_memory` must come from a compilation of a structurally
    /// identical declaration set, verified by the caller through
    /// [`Compiler::declaration_digest`]; it is adopted byte-for-byte so
    /// shape-preserving edits do not reset running state.
    pub fn compile(self, previous_memory: Option<Vec<u64>>) -> Result<Simulation, SimError> {
        if self.config.target_ticks_per_second == 0 {
            return Err(SimError::ZeroTickRate);
        }
        let digest = self.declaration_digest();
        let verbose = self.config.verbose_comments;

        // Layout: net cells first, then driver cells in declaration order,
        // then edge snapshots, then clock counters and periods.
        let mut cells = self.nets.len();
        let net_cells: Vec<usize> = (0..self.nets.len()).collect();

        let mut out_cells: BTreeMap<IoId, usize> = BTreeMap::new();
        for gate in &self.gates {
            out_cells.insert(gate.output.1.clone(), cells);
            cells += 1;
        }
        for builtin in &self.builtins {
            for output in &builtin.spec.outputs {
                out_cells.insert(builtin.io[&output.name].clone(), cells);
                cells += 1;
            }
        }
        for clock in &self.clocks {
            out_cells.insert(clock.output.clone(), cells);
            cells += 1;
        }
        let mut const_cells = vec![];
        for konst in &self.consts {
            out_cells.insert(konst.output.clone(), cells);
            const_cells.push(cells);
            cells += 1;
        }

        let mut prev_cells: BTreeMap<NetId, usize> = BTreeMap::new();
        for builtin in &self.builtins {
            for output in &builtin.spec.outputs {
                let formulas = [Some(&output.formula), output.driven.as_ref()];
                for formula in formulas.into_iter().flatten() {
                    for operand in formula.edge_operands() {
                        let io = &builtin.io[operand];
                        if let Some(&net) = self.io_net.get(io) {
                            prev_cells.entry(net).or_insert_with(|| {
                                let cell = cells;
                                cells += 1;
                                cell
                            });
                        }
                    }
                }
            }
        }

        let mut clocks = vec![];
        for clock in &self.clocks {
            clocks.push(ClockRuntime {
                frequency: clock.frequency,
                counter: cells,
                period: cells + 1,
            });
            cells += 2;
        }

        // Tick body: resolve every net, then compute every staged output,
        // then snapshot edge-watched nets.
        let mut steps = vec![];
        let mut labels = vec![];
        for (net_id, net) in self.nets.iter().enumerate() {
            let mut drivers: Vec<usize> = net
                .ios
                .iter()
                .filter_map(|io| out_cells.get(io).copied())
                .collect();
            drivers.sort();
            let mut pull = None;
            for p in &self.pulls {
                if self.io_net.get(&p.io) == Some(&net_id) {
                    pull = Some(p.value);
                }
            }
            if verbose {
                labels.push(format!(
                    "net {net_id}: {}",
                    net.ios
                        .iter()
                        .map(|io| io.to_string())
                        .collect::<Vec<_>>()
                        .join(" ")
                ));
            }
            steps.push(Step::Resolve {
                net: net_cells[net_id],
                drivers: drivers.into_boxed_slice(),
                pull,
            });
        }

        for gate in &self.gates {
            let slot = |name: &str| -> OperandSlot {
                let io = &gate
                    .inputs
                    .iter()
                    .find(|(local, _)| local == name)
                    .expect("validated at declaration")
                    .1;
                io_slot(io, &self.io_net, &net_cells, &prev_cells)
            };
            let mut ops = vec![];
            gate.formula.lower(&mut ops, &slot);
            if verbose {
                labels.push(format!("{}: {} {}", gate.output.1, gate.op, gate.formula));
            }
            steps.push(Step::Formula {
                out: out_cells[&gate.output.1],
                value: ops.into_boxed_slice(),
                driven: None,
            });
        }

        for builtin in &self.builtins {
            for output in &builtin.spec.outputs {
                let slot = |name: &str| -> OperandSlot {
                    let io = &builtin.io[name];
                    if builtin.spec.inputs.iter().any(|input| input == name) {
                        io_slot(io, &self.io_net, &net_cells, &prev_cells)
                    } else {
                        // own output: read the staged cell directly
                        OperandSlot {
                            cell: Some(out_cells[io]),
                            prev: None,
                        }
                    }
                };
                let mut value = vec![];
                output.formula.lower(&mut value, &slot);
                let driven = output.driven.as_ref().map(|formula| {
                    let mut ops = vec![];
                    formula.lower(&mut ops, &slot);
                    ops.into_boxed_slice()
                });
                if verbose {
                    labels.push(format!(
                        "{}: {} = {}",
                        builtin.io[&output.name], output.name, output.formula
                    ));
                }
                steps.push(Step::Formula {
                    out: out_cells[&builtin.io[&output.name]],
                    value: value.into_boxed_slice(),
                    driven,
                });
            }
        }

        for (clock, runtime) in self.clocks.iter().zip(&clocks) {
            let enable = clock
                .enable
                .as_ref()
                .and_then(|io| self.io_net.get(io))
                .map(|&net| net_cells[net]);
            if verbose {
                labels.push(format!("{}: clock {}Hz", clock.output, clock.frequency));
            }
            steps.push(Step::Clock {
                out: out_cells[&clock.output],
                counter: runtime.counter,
                period: runtime.period,
                enable,
            });
        }

        for (&net, &prev) in &prev_cells {
            if verbose {
                labels.push(format!("net {net}: edge snapshot"));
            }
            steps.push(Step::Prev {
                net: net_cells[net],
                prev,
            });
        }

        let memory = match previous_memory {
            Some(memory) => {
                if memory.len() != cells {
                    return Err(SimError::MemorySize {
                        expected: cells,
                        got: memory.len(),
                    });
                }
                memory
            }
            None => {
                let mut memory = vec![0u64; cells];
                for (konst, &cell) in self.consts.iter().zip(&const_cells) {
                    memory[cell] = konst.initial.encode();
                }
                for (clock, runtime) in self.clocks.iter().zip(&clocks) {
                    let period =
                        derive_period(self.config.target_ticks_per_second, clock.frequency);
                    memory[runtime.period] = period;
                    memory[runtime.counter] = period;
                    memory[out_cells[&clock.output]] = DRIVEN;
                }
                memory
            }
        };

        info!(
            "compile: {} nets, {} steps, {} cells",
            self.nets.len(),
            steps.len(),
            cells
        );

        Ok(Simulation {
            config: self.config,
            memory,
            steps,
            labels,
            net_cells,
            const_cells,
            clocks,
            digest,
        })
    }
}

fn io_slot(
    io: &IoId,
    io_net: &BTreeMap<IoId, NetId>,
    net_cells: &[usize],
    prev_cells: &BTreeMap<NetId, usize>,
) -> OperandSlot {
    match io_net.get(io) {
        Some(&net) => OperandSlot {
            cell: Some(net_cells[net]),
            prev: prev_cells.get(&net).copied(),
        },
        None => OperandSlot {
            cell: None,
            prev: None,
        },
    }
}

fn derive_period(ticks_per_second: u64, frequency: u64) -> u64 {
    (ticks_per_second / (2 * frequency)).max(1)
}

#[derive(Debug)]
enum Step {
    /// Fold the staged driver cells into the net cell; apply the pull
    /// default if nothing drives.
    Resolve {
        net: usize,
        drivers: Box<[usize]>,
        pull: Option<bool>,
    },
    /// Evaluate a lowered formula and write the staged output cell.
    Formula {
        out: usize,
        value: Box<[BoolOp]>,
        driven: Option<Box<[BoolOp]>>,
    },
    /// Count down; toggle the staged output when the counter hits zero.
    Clock {
        out: usize,
        counter: usize,
        period: usize,
        enable: Option<usize>,
    },
    /// Snapshot a net value for next tick's edge detection.
    Prev { net: usize, prev: usize },
}

#[derive(Debug, Clone)]
struct ClockRuntime {
    frequency: u64,
    counter: usize,
    period: usize,
}

/// A compiled simulation: one flat memory array plus one straight-line tick
/// body. The memory array is the only externally meaningful persisted state.
#[derive(Debug)]
pub struct Simulation {
    config: SimConfig,
    memory: Vec<u64>,
    steps: Vec<Step>,
    labels: Vec<String>,
    net_cells: Vec<usize>,
    const_cells: Vec<usize>,
    clocks: Vec<ClockRuntime>,
    digest: u64,
}

impl Simulation {
    /// Advance by exactly `ticks` discrete steps.
    pub fn simulate(&mut self, ticks: u64) {
        let check = self.config.check_net_conflicts;
        let memory = &mut self.memory;
        for _ in 0..ticks {
            for step in &self.steps {
                match step {
                    Step::Resolve { net, drivers, pull } => {
                        let mut acc = 0u64;
                        for &driver in drivers.iter() {
                            let cell = memory[driver];
                            if cell & DRIVEN == 0 {
                                continue;
                            }
                            if check && acc & DRIVEN != 0 && (acc ^ cell) & VAL != 0 {
                                acc = CONFLICT;
                                break;
                            }
                            acc = cell & (VAL | DRIVEN);
                        }
                        if acc & (DRIVEN | CONFLICT) == 0 {
                            if let Some(value) = pull {
                                acc = DRIVEN | *value as u64;
                            }
                        }
                        memory[*net] = acc;
                    }
                    Step::Formula { out, value, driven } => {
                        let v = expr::run(value, memory);
                        let d = match driven {
                            None => true,
                            Some(ops) => expr::run(ops, memory),
                        };
                        memory[*out] = if d { DRIVEN | v as u64 } else { 0 };
                    }
                    Step::Clock {
                        out,
                        counter,
                        period,
                        enable,
                    } => {
                        let enabled = match enable {
                            Some(cell) => memory[*cell] & (VAL | DRIVEN) == (VAL | DRIVEN),
                            None => true,
                        };
                        if enabled {
                            let mut remaining = memory[*counter].saturating_sub(1);
                            if remaining == 0 {
                                memory[*out] = DRIVEN | (memory[*out] & VAL ^ VAL);
                                remaining = memory[*period];
                            }
                            memory[*counter] = remaining;
                        }
                    }
                    Step::Prev { net, prev } => {
                        memory[*prev] = memory[*net];
                    }
                }
            }
        }
    }

    pub fn get_net(&self, net: NetId) -> Result<Signal, SimError> {
        let cell = self
            .net_cells
            .get(net)
            .ok_or(SimError::BadHandle("net", net))?;
        Ok(Signal::decode(self.memory[*cell]))
    }

    /// Force a net's state until the next resolve step overwrites it.
    pub fn set_net(&mut self, net: NetId, signal: Signal) -> Result<(), SimError> {
        if signal == Signal::Conflict {
            return Err(SimError::InvalidSignal(signal));
        }
        let cell = self
            .net_cells
            .get(net)
            .ok_or(SimError::BadHandle("net", net))?;
        self.memory[*cell] = signal.encode();
        Ok(())
    }

    pub fn get_const(&self, konst: ConstId) -> Result<Signal, SimError> {
        let cell = self
            .const_cells
            .get(konst)
            .ok_or(SimError::BadHandle("const", konst))?;
        Ok(Signal::decode(self.memory[*cell]))
    }

    /// Set a constant's output in place; no recompilation.
    pub fn set_const(&mut self, konst: ConstId, signal: Signal) -> Result<(), SimError> {
        if signal == Signal::Conflict {
            return Err(SimError::InvalidSignal(signal));
        }
        let cell = self
            .const_cells
            .get(konst)
            .ok_or(SimError::BadHandle("const", konst))?;
        self.memory[*cell] = signal.encode();
        Ok(())
    }

    /// Re-derive one clock's period in place; no recompilation.
    pub fn set_clock_frequency(&mut self, clock: ClockId, frequency: u64) -> Result<(), SimError> {
        if frequency == 0 {
            return Err(SimError::ZeroFrequency);
        }
        let ticks_per_second = self.config.target_ticks_per_second;
        let runtime = self
            .clocks
            .get_mut(clock)
            .ok_or(SimError::BadHandle("clock", clock))?;
        runtime.frequency = frequency;
        let period = derive_period(ticks_per_second, frequency);
        self.memory[runtime.period] = period;
        if self.memory[runtime.counter] > period {
            self.memory[runtime.counter] = period;
        }
        Ok(())
    }

    /// Change the global tick rate, re-deriving every clock's period.
    pub fn update_clocks(&mut self, target_ticks_per_second: u64) -> Result<(), SimError> {
        if target_ticks_per_second == 0 {
            return Err(SimError::ZeroTickRate);
        }
        self.config.target_ticks_per_second = target_ticks_per_second;
        for runtime in &self.clocks {
            let period = derive_period(target_ticks_per_second, runtime.frequency);
            self.memory[runtime.period] = period;
            if self.memory[runtime.counter] > period {
                self.memory[runtime.counter] = period;
            }
        }
        Ok(())
    }

    /// The flat memory array, for carrying across structurally identical
    /// recompilations.
    pub fn memory(&self) -> &[u64] {
        &self.memory
    }

    pub fn into_memory(self) -> Vec<u64> {
        self.memory
    }

    /// The digest of the declaration set this simulation was compiled from.
    pub fn digest(&self) -> u64 {
        self.digest
    }

    /// Render the tick body, one line per step. Labels are present only
    /// when the simulation was compiled with `verbose_comments`.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            let line = match step {
                Step::Resolve { net, drivers, pull } => {
                    let mut line = format!("resolve [{net}] <- {drivers:?}");
                    if let Some(value) = pull {
                        line.push_str(&format!(" pull {}", *value as u8));
                    }
                    line
                }
                Step::Formula { out, value, driven } => match driven {
                    Some(driven) => format!(
                        "formula [{out}] ({} ops, {} driven ops)",
                        value.len(),
                        driven.len()
                    ),
                    None => format!("formula [{out}] ({} ops)", value.len()),
                },
                Step::Clock {
                    out,
                    counter,
                    period,
                    enable,
                } => match enable {
                    Some(enable) => {
                        format!("clock [{out}] ctr [{counter}] per [{period}] en [{enable}]")
                    }
                    None => format!("clock [{out}] ctr [{counter}] per [{period}]"),
                },
                Step::Prev { net, prev } => format!("prev [{prev}] <- [{net}]"),
            };
            match self.labels.get(i) {
                Some(label) => out.push_str(&format!("{i:4}  {line}  ; {label}\n")),
                None => out.push_str(&format!("{i:4}  {line}\n")),
            }
        }
        out
    }
}

impl std::fmt::Display for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        for (net, &cell) in self.net_cells.iter().enumerate() {
            writeln!(f, "net {net}: {}", Signal::decode(self.memory[cell]))?;
        }
        Ok(())
    }
}
