//! Huffman trees serialized as node tables or as pre-order bit descriptions.
//!
//! The tree has a fixed capacity of 512 node ids. Ids below 256 are leaves
//! whose id is the byte they stand for; ids `256..512` are internal nodes with
//! two children stored in parallel tables.
//!
//! A tree can be loaded from a raw table (`nodes[0]`, `nodes[1]` and the root,
//! all little-endian `u16`) or built from a bit stream: a `0` bit opens an
//! internal node whose two subtrees follow, a `1` bit is a leaf followed by
//! its 8-bit symbol.
//!
//! Decoding is strict: running out of bits before the requested size is an
//! error, unlike LZSS.

use std::borrow::BorrowMut;

use vnarc_core::bitstream::BitStream;
use vnarc_core::error::{Result, VnArcError};
use vnarc_core::ringbuffer::output_capacity;
use vnarc_core::stream::ByteStream;

/// Number of node ids a tree can hold.
pub const NODE_CAPACITY: usize = 512;

/// First internal node id.
pub const FIRST_INTERNAL: u16 = 256;

/// Size of a serialized raw table in bytes.
pub const RAW_TABLE_SIZE: usize = NODE_CAPACITY * 2 * 2 + 2;

/// A decode tree with up to 256 internal nodes.
#[derive(Clone)]
pub struct HuffmanTree {
    nodes: Box<[[u16; NODE_CAPACITY]; 2]>,
    root: u16,
    internal_nodes: usize,
}

impl std::fmt::Debug for HuffmanTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuffmanTree")
            .field("root", &self.root)
            .field("internal_nodes", &self.internal_nodes)
            .finish_non_exhaustive()
    }
}

/// Where the next decoded subtree gets attached.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Root,
    Child { parent: u16, side: usize },
}

impl HuffmanTree {
    fn empty() -> Self {
        Self {
            nodes: Box::new([[0; NODE_CAPACITY]; 2]),
            root: 0,
            internal_nodes: 0,
        }
    }

    /// Build a tree from its pre-order bit description.
    pub fn read<S: BorrowMut<ByteStream>>(bits: &mut BitStream<S>) -> Result<Self> {
        let mut tree = Self::empty();
        let mut next_id = FIRST_INTERNAL;
        let mut pending = vec![Slot::Root];

        while let Some(slot) = pending.pop() {
            let id = if bits.read_bit()? {
                bits.read(8)? as u16
            } else {
                if usize::from(next_id) >= NODE_CAPACITY {
                    return Err(VnArcError::corrupted(
                        bits.bits_read() / 8,
                        "Huffman tree exceeds 512 nodes",
                    ));
                }
                let id = next_id;
                next_id += 1;
                // Child 0 is described first, so it is popped first.
                pending.push(Slot::Child { parent: id, side: 1 });
                pending.push(Slot::Child { parent: id, side: 0 });
                id
            };

            match slot {
                Slot::Root => tree.root = id,
                Slot::Child { parent, side } => tree.nodes[side][usize::from(parent)] = id,
            }
        }

        tree.internal_nodes = usize::from(next_id - FIRST_INTERNAL);
        Ok(tree)
    }

    /// Load a tree from a raw table at the stream cursor.
    pub fn read_table(input: &mut ByteStream) -> Result<Self> {
        let start = input.tell();
        let mut tree = Self::empty();
        for side in 0..2 {
            for slot in tree.nodes[side].iter_mut() {
                *slot = input.read_u16_le()?;
            }
        }
        tree.root = input.read_u16_le()?;
        tree.internal_nodes = tree.validate().map_err(|message| {
            VnArcError::corrupted(start, format!("invalid Huffman table: {message}"))
        })?;
        Ok(tree)
    }

    /// Load a tree from a raw table held in memory.
    pub fn from_table(table: &[u8]) -> Result<Self> {
        if table.len() < RAW_TABLE_SIZE {
            return Err(VnArcError::unexpected_eof(
                0,
                RAW_TABLE_SIZE as u64,
                table.len() as u64,
            ));
        }
        Self::read_table(&mut ByteStream::from_bytes(&table[..RAW_TABLE_SIZE]))
    }

    /// Check ranges and cycles reachable from the root; count internal nodes.
    fn validate(&self) -> std::result::Result<usize, String> {
        const UNSEEN: u8 = 0;
        const OPEN: u8 = 1;
        const DONE: u8 = 2;

        if usize::from(self.root) >= NODE_CAPACITY {
            return Err(format!("root {} out of range", self.root));
        }
        if self.root < FIRST_INTERNAL {
            return Ok(0);
        }

        let mut state = [UNSEEN; NODE_CAPACITY];
        let mut stack: Vec<(u16, usize)> = vec![(self.root, 0)];
        state[usize::from(self.root)] = OPEN;
        let mut internal = 1;

        while let Some(&(node, side)) = stack.last() {
            if side == 2 {
                state[usize::from(node)] = DONE;
                stack.pop();
                continue;
            }
            let top = stack.len() - 1;
            stack[top].1 += 1;

            let child = self.nodes[side][usize::from(node)];
            if usize::from(child) >= NODE_CAPACITY {
                return Err(format!("node {node} has child {child} out of range"));
            }
            if child < FIRST_INTERNAL {
                continue;
            }
            match state[usize::from(child)] {
                OPEN => return Err(format!("cycle through node {child}")),
                DONE => {}
                _ => {
                    state[usize::from(child)] = OPEN;
                    internal += 1;
                    stack.push((child, 0));
                }
            }
        }

        Ok(internal)
    }

    /// Root node id.
    pub fn root(&self) -> u16 {
        self.root
    }

    /// Number of internal nodes.
    pub fn internal_nodes(&self) -> usize {
        self.internal_nodes
    }

    /// Child of an internal node on the given side.
    pub fn child(&self, node: u16, side: usize) -> u16 {
        self.nodes[side & 1][usize::from(node) % NODE_CAPACITY]
    }

    /// Decode one symbol.
    pub fn decode_symbol<S: BorrowMut<ByteStream>>(&self, bits: &mut BitStream<S>) -> Result<u8> {
        let mut node = self.root;
        while node >= FIRST_INTERNAL {
            let side = bits.read(1)? as usize;
            node = self.nodes[side][usize::from(node)];
        }
        Ok(node as u8)
    }

    /// Decode exactly `target_size` symbols.
    pub fn decode<S: BorrowMut<ByteStream>>(
        &self,
        bits: &mut BitStream<S>,
        target_size: usize,
    ) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(output_capacity(target_size));
        for _ in 0..target_size {
            output.push(self.decode_symbol(bits)?);
        }
        Ok(output)
    }
}

/// Read a tree description followed by its payload and decode `target_size`
/// bytes, MSB-first.
pub fn decompress(input: &[u8], target_size: usize) -> Result<Vec<u8>> {
    let mut bits = BitStream::msb(ByteStream::from_bytes(input.to_vec()));
    let tree = HuffmanTree::read(&mut bits)?;
    tree.decode(&mut bits, target_size)
}
