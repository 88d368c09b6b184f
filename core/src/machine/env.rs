use std::{fmt, rc::Rc};

use crate::machine::{Value, value::release};

/// A persistent environment: extending shares the tail with the parent.
#[derive(Clone, Default)]
pub struct Env(Option<Rc<EnvNode>>);

struct EnvNode {
    value: Value,
    next: Env,
}

impl Env {
    pub fn new() -> Self {
        Env(None)
    }

    pub fn extend(&self, value: Value) -> Env {
        Env(Some(Rc::new(EnvNode {
            value,
            next: self.clone(),
        })))
    }

    /// Looks up a 1-based de Bruijn index.
    pub fn lookup(&self, index: usize) -> Option<&Value> {
        if index == 0 {
            return None;
        }
        let mut node = self.0.as_deref()?;
        for _ in 1..index {
            node = node.next.0.as_deref()?;
        }
        Some(&node.value)
    }

    pub fn len(&self) -> usize {
        let mut len = 0;
        let mut node = self.0.as_deref();
        while let Some(current) = node {
            len += 1;
            node = current.next.0.as_deref();
        }
        len
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl Env {
    /// Detaches uniquely owned nodes, moving their values onto `pending`.
    pub(crate) fn unlink(&mut self, pending: &mut Vec<Value>) {
        let mut next = self.0.take();
        while let Some(node) = next {
            match Rc::try_unwrap(node) {
                Ok(mut node) => {
                    next = node.next.0.take();
                    if !matches!(node.value, Value::Con(_)) {
                        pending.push(node.value);
                    }
                }
                Err(_) => break,
            }
        }
    }
}

// Long environments, and closures nested through them, are released
// without recursion.
impl Drop for Env {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.unlink(&mut pending);
        release(pending);
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Env(len={})", self.len())
    }
}
