use crate::eth::BlockHeader;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// Events grouped by originating block. Iterates blocks by ascending height and keeps the
/// push order inside a block, which is the log order.
#[derive(Clone, Debug)]
pub struct BlockMap<T> {
    blocks: BTreeMap<u64, (BlockHeader, Vec<T>)>,
    len: usize,
}

impl<T> Default for BlockMap<T> {
    fn default() -> Self {
        BlockMap {
            blocks: BTreeMap::new(),
            len: 0,
        }
    }
}

impl<T> BlockMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, block: &BlockHeader, item: T) {
        self.blocks
            .entry(block.height)
            .or_insert_with(|| (block.clone(), vec![]))
            .1
            .push(item);
        self.len += 1;
    }

    /// Number of events, all blocks included.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn headers(&self) -> impl Iterator<Item = &BlockHeader> {
        self.blocks.values().map(|(header, _)| header)
    }

    pub fn last_header(&self) -> Option<&BlockHeader> {
        self.blocks.values().next_back().map(|(header, _)| header)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.blocks.values(),
        }
    }

    pub fn events(&self) -> impl Iterator<Item = &T> {
        self.blocks.values().flat_map(|(_, items)| items.iter())
    }
}

pub struct Iter<'a, T> {
    inner: btree_map::Values<'a, u64, (BlockHeader, Vec<T>)>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (&'a BlockHeader, &'a [T]);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .next()
            .map(|(header, items)| (header, items.as_slice()))
    }
}

impl<'a, T> IntoIterator for &'a BlockMap<T> {
    type Item = (&'a BlockHeader, &'a [T]);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
