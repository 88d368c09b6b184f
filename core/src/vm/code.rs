use std::{fmt, rc::Rc};

use hashbrown::{HashMap, HashSet};

use crate::{
    ast::{Constant, Term},
    builtins::DefaultFunction,
    vm::instruction_set::{Addr, Instruction, Operand, OperandRange, RETURN_ADDR, SnippetId},
};

/// A leaf term evaluated in place.
#[derive(Clone)]
pub enum Snippet {
    Var(usize),
    Constant(Rc<Constant>),
    Builtin(DefaultFunction),
    /// Holds the lambda's body.
    Lambda(Rc<Term>),
    /// Holds the delayed body.
    Delay(Rc<Term>),
    Error,
}

/// A compiled program.
pub struct Code {
    pub instructions: Vec<Instruction>,
    pub snippets: Vec<Snippet>,
    /// Operand pool for `Construct` fields and `Case` branches.
    pub operands: Vec<Operand>,
    /// Address of the unit computing the whole program.
    pub entry: Addr,
    /// Deepest static nesting of unit operands below any entry point.
    /// Calls are not counted.
    pub max_depth: usize,
    /// Entry address of every lambda and delay body, keyed by term address.
    entries: HashMap<usize, Addr>,
    /// Keeps the keys of `entries` from being reused by other terms.
    _root: Rc<Term>,
}

impl Code {
    pub(crate) fn new(
        instructions: Vec<Instruction>,
        snippets: Vec<Snippet>,
        operands: Vec<Operand>,
        entry: Addr,
        max_depth: usize,
        entries: HashMap<usize, Addr>,
        root: Rc<Term>,
    ) -> Self {
        debug_assert_eq!(instructions.first(), Some(&Instruction::Return));
        Code {
            instructions,
            snippets,
            operands,
            entry,
            max_depth,
            entries,
            _root: root,
        }
    }

    /// Entry address of a lambda or delay body reachable from the program.
    #[inline]
    pub fn entry_of(&self, body: &Rc<Term>) -> Option<Addr> {
        self.entries.get(&(Rc::as_ptr(body) as usize)).copied()
    }

    #[inline]
    pub fn operands(&self, range: OperandRange) -> &[Operand] {
        let start = range.start as usize;
        &self.operands[start..start + range.len()]
    }

    #[inline]
    pub fn snippet(&self, id: SnippetId) -> &Snippet {
        &self.snippets[id as usize]
    }

    /// True when resuming at `addr` would only return again.
    #[inline]
    pub fn returns_at(&self, addr: Addr) -> bool {
        self.instructions[addr as usize] == Instruction::Return
    }
}

impl fmt::Debug for Snippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Snippet::Var(index) => write!(f, "var {index}"),
            Snippet::Constant(constant) => write!(f, "con {} {constant}", constant.type_of()),
            Snippet::Builtin(fun) => write!(f, "builtin {fun}"),
            Snippet::Lambda(body) => write!(f, "lam {:#x}", Rc::as_ptr(body) as usize),
            Snippet::Delay(body) => write!(f, "delay {:#x}", Rc::as_ptr(body) as usize),
            Snippet::Error => write!(f, "error"),
        }
    }
}

fn unit_targets(instr: &Instruction) -> impl Iterator<Item = Addr> {
    let operands = match *instr {
        Instruction::Apply { fun, arg } => [Some(fun), Some(arg)],
        Instruction::Case { scrutinee, .. } => [Some(scrutinee), None],
        _ => [None, None],
    };
    operands.into_iter().flatten().filter_map(|operand| match operand {
        Operand::Unit(addr) => Some(addr),
        Operand::Snippet(_) => None,
    })
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Code {{")?;
        writeln!(f, "  entry: {}", self.entry)?;
        writeln!(f, "  max_depth: {}", self.max_depth)?;

        if self.snippets.is_empty() {
            writeln!(f, "  snippets: []")?;
        } else {
            writeln!(f, "  snippets: [")?;
            for (i, snippet) in self.snippets.iter().enumerate() {
                writeln!(f, "    s{i} = {snippet:?}")?;
            }
            writeln!(f, "  ]")?;
        }

        // Every unit start gets a label: the program entry, body entries,
        // and anything referenced as an operand.
        let mut targets: HashSet<Addr> = self.entries.values().copied().collect();
        targets.insert(self.entry);
        for instr in &self.instructions {
            targets.extend(unit_targets(instr));
        }
        for operand in &self.operands {
            if let Operand::Unit(addr) = operand {
                targets.insert(*addr);
            }
        }
        targets.remove(&RETURN_ADDR);
        let mut sorted: Vec<Addr> = targets.into_iter().collect();
        sorted.sort_unstable();
        let labels: HashMap<Addr, usize> = sorted
            .into_iter()
            .enumerate()
            .map(|(i, addr)| (addr, i))
            .collect();

        if !self.operands.is_empty() {
            writeln!(f, "  operands: [")?;
            for (i, operand) in self.operands.iter().enumerate() {
                match operand {
                    Operand::Unit(addr) => match labels.get(addr) {
                        Some(label) => writeln!(f, "    [{i}] = L{label}")?,
                        None => writeln!(f, "    [{i}] = {operand:?}")?,
                    },
                    Operand::Snippet(_) => writeln!(f, "    [{i}] = {operand:?}")?,
                }
            }
            writeln!(f, "  ]")?;
        }

        writeln!(f, "  instructions:")?;
        for (addr, instr) in self.instructions.iter().enumerate() {
            let addr = addr as Addr;
            let label = labels
                .get(&addr)
                .map(|label| format!("L{label}:"))
                .unwrap_or_default();
            let calls: Vec<String> = unit_targets(instr)
                .map(|target| match labels.get(&target) {
                    Some(label) => format!("L{label}"),
                    None => format!("@{target}"),
                })
                .collect();
            if calls.is_empty() {
                writeln!(f, "    {addr:4} {label:>4}  {instr:?}")?;
            } else {
                writeln!(
                    f,
                    "    {addr:4} {label:>4}  {instr:?} (calls {})",
                    calls.join(", ")
                )?;
            }
        }

        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use num_bigint::BigInt;

    use super::*;

    #[test]
    fn test_snippet_debug_is_compact() {
        let constant = Snippet::Constant(Rc::new(Constant::Integer(BigInt::from(5))));
        assert_eq!(format!("{constant:?}"), "con integer 5");
        assert_eq!(format!("{:?}", Snippet::Var(2)), "var 2");
        assert_eq!(
            format!("{:?}", Snippet::Builtin(DefaultFunction::AddInteger)),
            "builtin addInteger"
        );
        assert_eq!(format!("{:?}", Snippet::Error), "error");
    }
}
