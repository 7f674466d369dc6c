use bumpalo::Bump;

/// Execution context for a single operator invocation.
/// Owns scratch buffers; everything allocated here is released when the
/// context is dropped.
pub struct ExecutionContext {
    /// Arena allocator for temporary values
    arena: Bump,
    /// Number of scratch buffers handed out since creation
    scratch_buffers: usize,
}

impl ExecutionContext {
    /// Create a new execution context
    pub fn new() -> Self {
        Self {
            arena: Bump::new(),
            scratch_buffers: 0,
        }
    }

    /// Allocate a temporary slice filled from an exact-size iterator
    pub fn alloc_from_iter<T, I>(&mut self, iter: I) -> &[T]
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        self.scratch_buffers += 1;
        self.arena.alloc_slice_fill_iter(iter)
    }

    /// Scratch buffers handed out so far
    pub fn scratch_buffers(&self) -> usize {
        self.scratch_buffers
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}
