/// A contiguous range of another process's virtual address space.
///
/// A region is a snapshot of one line of the target's memory map at the
/// moment it was read. Its addresses are only trustworthy for a later write
/// if the target has been stopped in the meantime and not resumed since.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRegion {
    /// Start address (in the target's virtual address space) of the region
    start: usize,
    /// Size of the region in bytes
    length: usize,
}

impl MemoryRegion {
    /// Creates a new region with the given start address and byte length.
    ///
    /// # Examples
    ///
    /// ```
    /// use memscram::MemoryRegion;
    ///
    /// let region = MemoryRegion::new(0x1000, 4096);
    /// assert_eq!(region.end(), 0x2000);
    /// ```
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Returns the start address of the region.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns the size of the region in bytes.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns true for zero-length regions.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the first address past the end of the region.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Checks whether an address falls inside the region.
    pub fn contains(&self, address: usize) -> bool {
        address >= self.start && address < self.end()
    }
}
