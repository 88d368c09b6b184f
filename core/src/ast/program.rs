use std::{fmt, rc::Rc};

use crate::ast::{PlutusData, Term};

/// Plutus Core language version carried by a program, e.g. `1.1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const V1_0_0: Version = Version::new(1, 0, 0);
    /// First version that admits `constr` and `case`.
    pub const V1_1_0: Version = Version::new(1, 1, 0);

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A versioned, closed term ready for evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub version: Version,
    pub term: Rc<Term>,
}

impl Program {
    pub fn new(version: Version, term: Term) -> Self {
        Self {
            version,
            term: Rc::new(term),
        }
    }

    /// Applies the program's term to `argument`, as done when passing
    /// datum, redeemer, and context to a validator.
    pub fn apply(&self, argument: Term) -> Program {
        Program {
            version: self.version,
            term: Rc::new(Term::Apply {
                function: self.term.clone(),
                argument: Rc::new(argument),
            }),
        }
    }

    pub fn apply_data(&self, data: PlutusData) -> Program {
        self.apply(Term::data(data))
    }
}
