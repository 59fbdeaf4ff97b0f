//! Physical adjacency between blocks, by pointer arithmetic alone.

use crate::block::Block;
use crate::config::{MIN_BLOCK_SIZE, WORD_SIZE};

/// Returns the block physically following `block`.
///
/// `block` must not be the epilogue: a zero-size block has no successor.
pub fn next(block: Block) -> Block {
    debug_assert_ne!(block.size(), 0, "epilogue has no successor");
    unsafe { Block::from_header_addr((block.addr() + block.size() as usize) as *mut u8) }
}

/// Returns the block physically preceding `block`, or `None` when `block`
/// is the first real block on the heap (its predecessor is the prologue
/// sentinel, which is not a navigable block).
pub fn prev(block: Block, first_block_addr: usize) -> Option<Block> {
    if block.addr() == first_block_addr {
        return None;
    }
    let addr = block.addr();
    if block.prev_min() {
        Some(unsafe { Block::from_header_addr((addr - MIN_BLOCK_SIZE) as *mut u8) })
    } else {
        let footer = unsafe { ((addr - WORD_SIZE) as *const u64).read() };
        let prev_size = crate::block::extract_size(footer);
        Some(unsafe { Block::from_header_addr((addr - prev_size as usize) as *mut u8) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::pack;

    /// Builds prologue + one 32-byte free block + epilogue in a plain byte
    /// buffer and checks next()/prev() walk it correctly both ways.
    #[test]
    fn walks_forward_and_backward() {
        let mut buf = [0u8; 8 + 32 + 8];
        unsafe {
            let base = buf.as_mut_ptr();
            (base as *mut u64).write(pack(0, true, true, false));
            let first = base.add(8);
            (first as *mut u64).write(pack(32, false, true, false));
            ((first.add(24)) as *mut u64).write(pack(32, false, true, false));
            let epilogue = first.add(32);
            (epilogue as *mut u64).write(pack(0, true, false, false));

            let first_block = Block::from_header_addr(first);
            let first_addr = first_block.addr();

            assert_eq!(prev(first_block, first_addr), None);

            let epilogue_block = next(first_block);
            assert_eq!(epilogue_block.addr(), epilogue as usize);
            assert_eq!(epilogue_block.size(), 0);

            let back = prev(epilogue_block, first_addr).unwrap();
            assert_eq!(back, first_block);
        }
    }
}
