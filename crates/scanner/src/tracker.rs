//! Intra-procedural value tracking: a forward, linear pass over one
//! method's decoded instructions that propagates string-literal constants
//! through the operand stack and local variable slots.
//!
//! This follows the slot-based vocabulary of the teacher's `crates/machine`
//! (`OperandStack`/`LocalVariables`) but replaces the fixed `u32` word with
//! the `Const(String) | Top` lattice value: any value whose origin isn't a
//! direct string-constant load collapses to `Top` the moment it's produced,
//! rather than being carried as a real word value. Branches are not
//! resolved into a control flow graph — the pass walks instructions in
//! program order, which is a deliberately conservative approximation of
//! full merge-on-branch dataflow, sufficient for recovering the
//! overwhelming majority of real call sites where the algorithm/provider
//! argument is a local literal or a `final` field read straight into the
//! call.
//!
//! `Lattice` is this pass's own internal value — distinct from
//! `model::ArgumentValue`, which is the finished, positional record
//! attached to a `Finding` once the call-site matcher assigns each argument
//! its index. Keeping the two separate means the dataflow state (transient,
//! per-instruction) never leaks into the reported shape (stable, per-finding).
use std::collections::HashMap;

use classfile::{Instruction, InvokeKind};

/// The tracker's internal abstract value: either a known string constant or
/// "anything else" (`Top`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lattice {
    Const(String),
    Top,
}

impl Lattice {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Lattice::Const(s) => Some(s.as_str()),
            Lattice::Top => None,
        }
    }
}

/// One invocation found during the linear pass, with its statically
/// recovered argument values in left-to-right parameter order (the
/// implicit receiver, if any, is not included).
pub struct TrackedInvoke {
    pub pc: usize,
    pub kind: InvokeKind,
    pub class: String,
    pub method: String,
    pub descriptor: String,
    pub args: Vec<Lattice>,
}

pub struct Tracker {
    stack: Vec<Lattice>,
    locals: HashMap<u16, Lattice>,
}

impl Tracker {
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            locals: HashMap::new(),
        }
    }

    fn pop(&mut self) -> Lattice {
        self.stack.pop().unwrap_or(Lattice::Top)
    }

    /// Runs the pass over a method's instruction stream, returning every
    /// invocation encountered along with its recovered argument values.
    pub fn run(
        &mut self,
        instructions: &[Instruction],
        parameter_count: impl Fn(&str) -> usize,
    ) -> Vec<TrackedInvoke> {
        let mut invokes = Vec::new();

        for instr in instructions {
            match instr {
                Instruction::LoadConstantString { value, .. } => {
                    self.stack.push(Lattice::Const(value.clone()));
                }
                Instruction::LoadLocal { slot, .. } => {
                    let value = self.locals.get(slot).cloned().unwrap_or(Lattice::Top);
                    self.stack.push(value);
                }
                Instruction::StoreLocal { slot, .. } => {
                    let value = self.pop();
                    self.locals.insert(*slot, value);
                }
                Instruction::Invoke {
                    pc,
                    kind,
                    class,
                    method,
                    descriptor,
                } => {
                    let param_count = parameter_count(descriptor);
                    let has_receiver = *kind != InvokeKind::Static;

                    let mut args: Vec<Lattice> = (0..param_count).map(|_| self.pop()).collect();
                    args.reverse();
                    if has_receiver {
                        self.pop();
                    }

                    if !is_void(descriptor) {
                        self.stack.push(Lattice::Top);
                    }

                    invokes.push(TrackedInvoke {
                        pc: *pc,
                        kind: *kind,
                        class: class.clone(),
                        method: method.clone(),
                        descriptor: descriptor.clone(),
                        args,
                    });
                }
                Instruction::Other { stack_delta, .. } => {
                    let (pops, pushes) = stack_delta;
                    for _ in 0..*pops {
                        self.pop();
                    }
                    for _ in 0..*pushes {
                        self.stack.push(Lattice::Top);
                    }
                }
            }
        }

        invokes
    }
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

fn is_void(descriptor: &str) -> bool {
    descriptor.ends_with(")V")
}
