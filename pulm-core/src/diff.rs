//! Block-level change detection between two versions of a note body.

use std::collections::{HashMap, HashSet};

use pulm_types::{BlockChange, BlockId};

use crate::models::Block;

/// Changes that turn `old` into `new`, matched by block id.
///
/// Removals come first in old order, then insertions, moves and updates in
/// new order. A block is reported as moved when it falls outside the longest
/// run of surviving blocks that kept their relative order.
pub fn diff_blocks(old: &[Block], new: &[Block]) -> Vec<BlockChange> {
    let old_pos: HashMap<&BlockId, usize> = old.iter().enumerate().map(|(i, b)| (&b.id, i)).collect();
    let new_ids: HashSet<&BlockId> = new.iter().map(|b| &b.id).collect();

    let mut changes = Vec::new();

    for (old_index, block) in old.iter().enumerate() {
        if !new_ids.contains(&block.id) {
            changes.push(BlockChange::Removed {
                block_id: block.id.clone(),
                old_index,
            });
        }
    }

    let survivors_old: Vec<&BlockId> = old.iter().map(|b| &b.id).filter(|id| new_ids.contains(id)).collect();
    let survivors_new: Vec<&BlockId> = new.iter().map(|b| &b.id).filter(|id| old_pos.contains_key(id)).collect();
    let stable = longest_common_run(&survivors_old, &survivors_new);

    for (index, block) in new.iter().enumerate() {
        let Some(&old_index) = old_pos.get(&block.id) else {
            changes.push(BlockChange::Inserted {
                block_id: block.id.clone(),
                index,
            });
            continue;
        };

        if !stable.contains(&block.id) {
            changes.push(BlockChange::Moved {
                block_id: block.id.clone(),
                old_index,
                new_index: index,
            });
        }
        if old[old_index] != *block {
            changes.push(BlockChange::Updated {
                block_id: block.id.clone(),
                index,
            });
        }
    }

    changes
}

/// Ids on the longest common subsequence of two id orders
fn longest_common_run<'a>(a: &[&'a BlockId], b: &[&'a BlockId]) -> HashSet<&'a BlockId> {
    let (n, m) = (a.len(), b.len());
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if a[i] == b[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut stable = HashSet::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            stable.insert(a[i]);
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    stable
}
