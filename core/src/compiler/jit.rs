//! Term to VM code compiler.

use std::rc::Rc;

use hashbrown::HashMap;
use tracing::debug;

use crate::{
    ast::Term,
    compiler::CompileError,
    vm::{Addr, Code, Instruction, Operand, OperandRange, RETURN_ADDR, Snippet, SnippetId},
};

/// How a term compiles.
enum Shape<'t> {
    Leaf(Snippet),
    Force(&'t Rc<Term>),
    Apply(&'t Rc<Term>, &'t Rc<Term>),
    Constr(u64, &'t [Rc<Term>]),
    Case(&'t Rc<Term>, &'t [Rc<Term>]),
}

fn shape(term: &Rc<Term>) -> Shape<'_> {
    match &**term {
        Term::Var(index) => Shape::Leaf(Snippet::Var(*index)),
        Term::Constant(constant) => Shape::Leaf(Snippet::Constant(constant.clone())),
        Term::Builtin(fun) => Shape::Leaf(Snippet::Builtin(*fun)),
        Term::Lambda(body) => Shape::Leaf(Snippet::Lambda(body.clone())),
        Term::Delay(body) => Shape::Leaf(Snippet::Delay(body.clone())),
        Term::Error => Shape::Leaf(Snippet::Error),
        Term::Force(inner) => Shape::Force(inner),
        Term::Apply { function, argument } => Shape::Apply(function, argument),
        Term::Constr { tag, fields } => Shape::Constr(*tag, fields),
        Term::Case {
            scrutinee,
            branches,
        } => Shape::Case(scrutinee, branches),
    }
}

fn key(term: &Rc<Term>) -> usize {
    Rc::as_ptr(term) as usize
}

struct Pending {
    term: Rc<Term>,
    unit: usize,
    depth: usize,
}

/// Compiles a closed term into [`Code`].
///
/// While compiling, `Operand::Unit` holds a unit id; `finalize` rewrites
/// ids into start addresses.
pub struct JitCompiler {
    instructions: Vec<Instruction>,
    snippets: Vec<Snippet>,
    snippet_ids: HashMap<usize, SnippetId>,
    operands: Vec<Operand>,
    /// Unit id by term address.
    units: HashMap<usize, usize>,
    /// Start address of each unit; `RETURN_ADDR` until emitted.
    starts: Vec<Addr>,
    pending: Vec<Pending>,
    max_depth: usize,
}

impl JitCompiler {
    fn new() -> Self {
        Self {
            // Address 0 is the shared Return.
            instructions: vec![Instruction::Return],
            snippets: Vec::new(),
            snippet_ids: HashMap::new(),
            operands: Vec::new(),
            units: HashMap::new(),
            starts: Vec::new(),
            pending: Vec::new(),
            max_depth: 0,
        }
    }

    pub fn compile(term: &Rc<Term>) -> Result<Code, CompileError> {
        let mut compiler = Self::new();
        let root = compiler.unit(term, 0);
        while let Some(Pending { term, unit, depth }) = compiler.pending.pop() {
            compiler.starts[unit] = compiler.next_addr()?;
            compiler.emit_unit(&term, depth)?;
        }
        Ok(compiler.finalize(root, term.clone()))
    }

    fn finalize(mut self, root: usize, term: Rc<Term>) -> Code {
        let starts = &self.starts;
        let patch = |operand: &mut Operand| {
            if let Operand::Unit(unit) = operand {
                *unit = starts[*unit as usize];
            }
        };
        for instr in &mut self.instructions {
            match instr {
                Instruction::Apply { fun, arg } => {
                    patch(fun);
                    patch(arg);
                }
                Instruction::Case { scrutinee, .. } => patch(scrutinee),
                _ => {}
            }
        }
        self.operands.iter_mut().for_each(patch);

        let entries: HashMap<usize, Addr> = self
            .units
            .iter()
            .map(|(key, unit)| (*key, starts[*unit]))
            .collect();

        debug!(
            instructions = self.instructions.len(),
            snippets = self.snippets.len(),
            units = self.starts.len(),
            max_depth = self.max_depth,
            "Compiled program"
        );

        Code::new(
            self.instructions,
            self.snippets,
            self.operands,
            starts[root],
            self.max_depth,
            entries,
            term,
        )
    }

    /// Emits a unit: the head instruction, one `ForceUnwrap` per peeled
    /// force, then `Return`.
    fn emit_unit(&mut self, term: &Rc<Term>, depth: usize) -> Result<(), CompileError> {
        let mut forces = 0;
        let mut current = term;
        let head = loop {
            match shape(current) {
                Shape::Force(inner) => {
                    forces += 1;
                    current = inner;
                }
                Shape::Leaf(snippet) => {
                    break Instruction::ExecSnippet(self.intern(current, snippet)?);
                }
                Shape::Apply(function, argument) => {
                    let fun = self.operand(function, depth)?;
                    let arg = self.operand(argument, depth)?;
                    break Instruction::Apply { fun, arg };
                }
                Shape::Constr(tag, fields) => {
                    let fields = self.operand_range(fields, depth)?;
                    break Instruction::Construct { tag, fields };
                }
                Shape::Case(scrutinee, branches) => {
                    let scrutinee = self.operand(scrutinee, depth)?;
                    let branches = self.operand_range(branches, depth)?;
                    break Instruction::Case {
                        scrutinee,
                        branches,
                    };
                }
            }
        };
        self.instructions.push(head);
        self.instructions
            .extend(std::iter::repeat_n(Instruction::ForceUnwrap, forces));
        self.instructions.push(Instruction::Return);
        Ok(())
    }

    fn operand(&mut self, term: &Rc<Term>, depth: usize) -> Result<Operand, CompileError> {
        match shape(term) {
            Shape::Leaf(snippet) => self.intern(term, snippet).map(Operand::Snippet),
            _ => {
                let unit = self.unit(term, depth + 1);
                let unit = Addr::try_from(unit).map_err(|_| CompileError::TooManyInstructions)?;
                Ok(Operand::Unit(unit))
            }
        }
    }

    fn operand_range(
        &mut self,
        terms: &[Rc<Term>],
        depth: usize,
    ) -> Result<OperandRange, CompileError> {
        let start = u32::try_from(self.operands.len()).map_err(|_| CompileError::TooManyOperands)?;
        let len = u32::try_from(terms.len()).map_err(|_| CompileError::TooManyOperands)?;
        for term in terms {
            let operand = self.operand(term, depth)?;
            self.operands.push(operand);
        }
        Ok(OperandRange { start, len })
    }

    /// Returns the snippet id for a leaf, scheduling lambda and delay
    /// bodies as entry points.
    fn intern(&mut self, term: &Rc<Term>, snippet: Snippet) -> Result<SnippetId, CompileError> {
        if let Some(id) = self.snippet_ids.get(&key(term)) {
            return Ok(*id);
        }
        if let Snippet::Lambda(body) | Snippet::Delay(body) = &snippet {
            self.unit(body, 0);
        }
        let id =
            SnippetId::try_from(self.snippets.len()).map_err(|_| CompileError::TooManySnippets)?;
        self.snippets.push(snippet);
        self.snippet_ids.insert(key(term), id);
        Ok(id)
    }

    /// Returns the unit id for `term`, scheduling it if new.
    fn unit(&mut self, term: &Rc<Term>, depth: usize) -> usize {
        if let Some(unit) = self.units.get(&key(term)) {
            return *unit;
        }
        let unit = self.starts.len();
        self.starts.push(RETURN_ADDR);
        self.units.insert(key(term), unit);
        self.pending.push(Pending {
            term: term.clone(),
            unit,
            depth,
        });
        self.max_depth = self.max_depth.max(depth);
        unit
    }

    fn next_addr(&self) -> Result<Addr, CompileError> {
        Addr::try_from(self.instructions.len()).map_err(|_| CompileError::TooManyInstructions)
    }
}
