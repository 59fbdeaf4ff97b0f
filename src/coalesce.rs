//! Boundary-tag coalescing: merging a newly-freed block with whichever of
//! its physical neighbors are also free.

use crate::block::Block;
use crate::freelist::FreeLists;
use crate::navigate;

/// Merges `block` — already marked free, with its footer written — with any
/// free physical neighbors, inserts the result into `lists`, and returns a
/// handle to the (possibly merged) block.
pub fn free_and_coalesce(block: Block, first_block_addr: usize, lists: &mut FreeLists) -> Block {
    let prev_alloc = block.prev_alloc();
    let prev_min = block.prev_min();
    let next = navigate::next(block);
    let next_alloc = next.is_alloc();

    let merged = match (prev_alloc, next_alloc) {
        (true, true) => block,
        (true, false) => {
            lists.remove(next);
            let size = block.size() + next.size();
            block.set_header(size, false, prev_alloc, prev_min);
            block.write_footer();
            block
        }
        (false, true) => {
            let prev = navigate::prev(block, first_block_addr)
                .expect("prev_alloc false implies a real predecessor");
            lists.remove(prev);
            let size = prev.size() + block.size();
            prev.set_header(size, false, prev.prev_alloc(), prev.prev_min());
            prev.write_footer();
            prev
        }
        (false, false) => {
            let prev = navigate::prev(block, first_block_addr)
                .expect("prev_alloc false implies a real predecessor");
            lists.remove(prev);
            lists.remove(next);
            let size = prev.size() + block.size() + next.size();
            prev.set_header(size, false, prev.prev_alloc(), prev.prev_min());
            prev.write_footer();
            prev
        }
    };

    let successor = navigate::next(merged);
    successor.set_header(successor.size(), successor.is_alloc(), false, merged.is_min());
    if !successor.is_alloc() && !successor.is_min() {
        successor.write_footer();
    }

    lists.insert(merged);
    merged
}
