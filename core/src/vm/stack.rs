/// Growable LIFO storage that keeps its allocation across uses.
///
/// The VM holds continuation frames here. A stack that has been cleared
/// keeps its buffer, so a pooled stack can be handed to the next
/// evaluation without reallocating.
///
/// # Examples
///
/// ```ignore
/// use uplc_core::vm::Stack;
///
/// let mut stack = Stack::with_capacity(16);
/// stack.push('a');
/// stack.push('b');
/// assert_eq!(stack.pop(), Some('b'));
/// assert_eq!(stack.len(), 1);
/// ```
pub struct Stack<T> {
    items: Vec<T>,
}

impl<T> Stack<T> {
    /// Creates an empty stack with room for `capacity` elements.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use uplc_core::vm::Stack;
    ///
    /// let stack: Stack<u32> = Stack::with_capacity(64);
    /// assert!(stack.is_empty());
    /// assert!(stack.capacity() >= 64);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Pushes a value onto the stack.
    #[inline]
    pub fn push(&mut self, value: T) {
        self.items.push(value);
    }

    /// Removes and returns the top value, or `None` when empty.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use uplc_core::vm::Stack;
    ///
    /// let mut stack = Stack::with_capacity(4);
    /// stack.push(7);
    /// assert_eq!(stack.pop(), Some(7));
    /// assert_eq!(stack.pop(), None);
    /// ```
    #[inline]
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of elements the stack can hold without reallocating.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Removes every element, keeping the allocation.
    ///
    /// Elements are dropped from the top down.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// use uplc_core::vm::Stack;
    ///
    /// let mut stack = Stack::with_capacity(8);
    /// stack.push(1);
    /// stack.push(2);
    /// stack.clear();
    /// assert!(stack.is_empty());
    /// assert!(stack.capacity() >= 8);
    /// ```
    pub fn clear(&mut self) {
        while self.items.pop().is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;

    #[test]
    fn test_push_pop() {
        let mut stack = Stack::with_capacity(4);
        stack.push(1);
        stack.push(2);
        stack.push(3);

        assert_eq!(stack.len(), 3);
        assert_eq!(stack.pop(), Some(3));
        assert_eq!(stack.pop(), Some(2));
        assert_eq!(stack.pop(), Some(1));
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_clear_keeps_allocation() {
        let mut stack = Stack::with_capacity(2);
        for i in 0..100 {
            stack.push(i);
        }
        let capacity = stack.capacity();

        stack.clear();
        assert!(stack.is_empty());
        assert_eq!(stack.capacity(), capacity);
    }

    #[test]
    fn test_clear_drops_top_first() {
        struct Noisy(u32, Rc<RefCell<Vec<u32>>>);
        impl Drop for Noisy {
            fn drop(&mut self) {
                self.1.borrow_mut().push(self.0);
            }
        }

        let dropped = Rc::new(RefCell::new(Vec::new()));
        let mut stack = Stack::with_capacity(4);
        for i in 1..=3 {
            stack.push(Noisy(i, dropped.clone()));
        }
        stack.clear();
        assert_eq!(*dropped.borrow(), vec![3, 2, 1]);
    }
}
