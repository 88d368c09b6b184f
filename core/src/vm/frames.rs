use std::{cell::RefCell, mem};

use smallvec::SmallVec;

use crate::{
    machine::{Env, Value},
    vm::{
        Code, Stack,
        instruction_set::{Addr, Operand, OperandRange},
    },
};

/// A pending continuation. Every frame records the address to resume at
/// once it receives its value.
pub enum Frame {
    /// The function of an `Apply` is running; the argument is next.
    AwaitFun { arg: Operand, env: Env, resume: Addr },
    /// The argument of an `Apply` is running.
    AwaitArg { fun: Value, env: Env, resume: Addr },
    /// Apply the incoming function to a constructor field.
    ApplyField { arg: Value, env: Env, resume: Addr },
    /// Continue at `resume` under `env` with the incoming value.
    Resume { env: Env, resume: Addr },
    /// A constructor field is running; `done` holds the fields before it.
    AwaitField {
        tag: u64,
        fields: OperandRange,
        done: Vec<Value>,
        env: Env,
        resume: Addr,
    },
    /// A `Case` scrutinee is running.
    AwaitScrutinee {
        branches: OperandRange,
        env: Env,
        resume: Addr,
    },
}

/// Storage for the VM's continuation frames.
pub trait FrameStack {
    fn push(&mut self, frame: Frame);
    fn pop(&mut self) -> Option<Frame>;
    fn depth(&self) -> usize;
}

const INITIAL_SLOTS: usize = 64;

/// Pooled stacks larger than this are freed instead of kept.
const MAX_POOLED_SLOTS: usize = 1 << 16;

const POOL_LIMIT: usize = 4;

thread_local! {
    static SLOT_POOL: RefCell<Vec<Stack<Frame>>> = const { RefCell::new(Vec::new()) };
}

/// Frames stored by value in a contiguous buffer, reused across
/// evaluations on the same thread.
pub struct SlotFrames {
    stack: Stack<Frame>,
}

impl SlotFrames {
    pub fn acquire() -> Self {
        let stack = SLOT_POOL
            .try_with(|pool| pool.try_borrow_mut().ok().and_then(|mut pool| pool.pop()))
            .ok()
            .flatten()
            .unwrap_or_else(|| Stack::with_capacity(INITIAL_SLOTS));
        debug_assert!(stack.is_empty());
        SlotFrames { stack }
    }
}

impl FrameStack for SlotFrames {
    #[inline]
    fn push(&mut self, frame: Frame) {
        self.stack.push(frame);
    }

    #[inline]
    fn pop(&mut self) -> Option<Frame> {
        self.stack.pop()
    }

    #[inline]
    fn depth(&self) -> usize {
        self.stack.len()
    }
}

// Frames left behind by a failed evaluation are dropped before the buffer
// goes back to the pool.
impl Drop for SlotFrames {
    fn drop(&mut self) {
        let mut stack = mem::replace(&mut self.stack, Stack::with_capacity(0));
        stack.clear();
        if stack.capacity() > MAX_POOLED_SLOTS {
            return;
        }
        let _ = SLOT_POOL.try_with(|pool| {
            if let Ok(mut pool) = pool.try_borrow_mut()
                && pool.len() < POOL_LIMIT
            {
                pool.push(stack);
            }
        });
    }
}

struct Node {
    frame: Frame,
    next: Option<Box<Node>>,
}

/// Frames as individually allocated nodes of a linked list.
#[derive(Default)]
pub struct BoxedFrames {
    top: Option<Box<Node>>,
    depth: usize,
}

impl BoxedFrames {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameStack for BoxedFrames {
    #[inline]
    fn push(&mut self, frame: Frame) {
        let next = self.top.take();
        self.top = Some(Box::new(Node { frame, next }));
        self.depth += 1;
    }

    #[inline]
    fn pop(&mut self) -> Option<Frame> {
        let node = self.top.take()?;
        let Node { frame, next } = *node;
        self.top = next;
        self.depth -= 1;
        Some(frame)
    }

    #[inline]
    fn depth(&self) -> usize {
        self.depth
    }
}

impl Drop for BoxedFrames {
    fn drop(&mut self) {
        let mut next = self.top.take();
        while let Some(mut node) = next {
            next = node.next.take();
        }
    }
}

/// Frames a program with shallow static shape needs before any call.
pub const INLINE_FRAMES: usize = 16;

/// Inline storage for programs whose static nesting fits, pooled slots
/// otherwise. Inline storage still spills to the heap if calls go deeper.
pub enum HybridFrames {
    Inline(SmallVec<[Frame; INLINE_FRAMES]>),
    Pooled(SlotFrames),
}

impl HybridFrames {
    pub fn for_code(code: &Code) -> Self {
        if code.max_depth < INLINE_FRAMES {
            HybridFrames::Inline(SmallVec::new())
        } else {
            HybridFrames::Pooled(SlotFrames::acquire())
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, HybridFrames::Inline(_))
    }
}

impl FrameStack for HybridFrames {
    #[inline]
    fn push(&mut self, frame: Frame) {
        match self {
            HybridFrames::Inline(frames) => frames.push(frame),
            HybridFrames::Pooled(frames) => frames.push(frame),
        }
    }

    #[inline]
    fn pop(&mut self) -> Option<Frame> {
        match self {
            HybridFrames::Inline(frames) => frames.pop(),
            HybridFrames::Pooled(frames) => frames.pop(),
        }
    }

    #[inline]
    fn depth(&self) -> usize {
        match self {
            HybridFrames::Inline(frames) => frames.len(),
            HybridFrames::Pooled(frames) => frames.depth(),
        }
    }
}
