//! Adaptive Huffman decoder used for Diablo II wave sectors
//!
//! The tree is seeded from one of the static weight tables and reshaped after
//! every symbol, exactly as the encoder does, so both sides keep identical
//! trees without transmitting one. Nodes live in an arena and are also linked
//! into a list ordered by descending weight. A node's second child is always
//! the list entry just before its first child.

use crate::{Error, Result};

/// Symbol marking the end of the compressed stream
const END_OF_STREAM: u16 = 0x100;
/// Symbol announcing a byte that is not yet in the tree
const NEW_SYMBOL: u16 = 0x101;
/// Leaf slots: every byte value plus the two control symbols
const SYMBOL_COUNT: usize = 0x102;
/// Arena size of a fully seeded tree: 0x102 leaves and their parents
const INITIAL_NODE_CAPACITY: usize = 0x203;

// Static weight tables, one per stream type
const BYTE_TO_WEIGHT_00: [u8; 258] = [
    0x0A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02,
    0x00, 0x00,
];

const BYTE_TO_WEIGHT_01: [u8; 258] = [
    0x54, 0x16, 0x16, 0x0D, 0x0C, 0x08, 0x06, 0x05, 0x06, 0x05, 0x06, 0x03, 0x04, 0x04, 0x03, 0x05,
    0x0E, 0x0B, 0x14, 0x13, 0x13, 0x09, 0x0B, 0x06, 0x05, 0x04, 0x03, 0x02, 0x03, 0x02, 0x02, 0x02,
    0x0D, 0x07, 0x09, 0x06, 0x06, 0x04, 0x03, 0x02, 0x04, 0x03, 0x03, 0x03, 0x03, 0x03, 0x02, 0x02,
    0x09, 0x06, 0x04, 0x04, 0x04, 0x04, 0x03, 0x02, 0x03, 0x02, 0x02, 0x02, 0x02, 0x03, 0x02, 0x04,
    0x08, 0x03, 0x04, 0x07, 0x09, 0x05, 0x03, 0x03, 0x03, 0x03, 0x02, 0x02, 0x02, 0x03, 0x02, 0x02,
    0x03, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x02, 0x01, 0x01, 0x01, 0x02, 0x01, 0x02, 0x02,
    0x06, 0x0A, 0x08, 0x08, 0x06, 0x07, 0x04, 0x03, 0x04, 0x04, 0x02, 0x02, 0x04, 0x02, 0x03, 0x03,
    0x04, 0x03, 0x07, 0x07, 0x09, 0x06, 0x04, 0x03, 0x03, 0x02, 0x01, 0x02, 0x02, 0x02, 0x02, 0x02,
    0x0A, 0x02, 0x02, 0x03, 0x02, 0x02, 0x01, 0x01, 0x02, 0x02, 0x02, 0x06, 0x03, 0x05, 0x02, 0x03,
    0x02, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x02, 0x03, 0x01, 0x01, 0x01,
    0x02, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x02, 0x04, 0x04, 0x04, 0x07, 0x09, 0x08, 0x0C, 0x02,
    0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x02, 0x01, 0x01, 0x03,
    0x04, 0x01, 0x02, 0x04, 0x05, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x02, 0x01, 0x01, 0x01,
    0x04, 0x01, 0x01, 0x01, 0x01, 0x01, 0x02, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x02, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x03, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01,
    0x02, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x02, 0x02, 0x01, 0x01, 0x02, 0x02, 0x02, 0x06, 0x4B,
    0x00, 0x00,
];

const BYTE_TO_WEIGHT_02: [u8; 258] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0x27, 0x00, 0x00, 0x23, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x02, 0x02, 0x01, 0x01, 0x06, 0x0E, 0x10, 0x04,
    0x06, 0x08, 0x05, 0x04, 0x04, 0x03, 0x03, 0x02, 0x02, 0x03, 0x03, 0x01, 0x01, 0x02, 0x01, 0x01,
    0x01, 0x04, 0x02, 0x04, 0x02, 0x02, 0x02, 0x01, 0x01, 0x04, 0x01, 0x01, 0x02, 0x03, 0x03, 0x02,
    0x03, 0x01, 0x03, 0x06, 0x04, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x02, 0x01, 0x02, 0x01, 0x01,
    0x01, 0x29, 0x07, 0x16, 0x12, 0x40, 0x0A, 0x0A, 0x11, 0x25, 0x01, 0x03, 0x17, 0x10, 0x26, 0x2A,
    0x10, 0x01, 0x23, 0x23, 0x2F, 0x10, 0x06, 0x07, 0x02, 0x09, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00,
];

/// Weight tables indexed by the stream's first byte
const WEIGHT_TABLES: [&[u8; 258]; 3] = [&BYTE_TO_WEIGHT_00, &BYTE_TO_WEIGHT_01, &BYTE_TO_WEIGHT_02];

/// Least-significant-bit-first reader over the compressed payload
struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
    bit_buffer: u32,
    bit_count: u32,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            bit_buffer: 0,
            bit_count: 0,
        }
    }

    fn get_bit(&mut self) -> Result<u32> {
        if self.bit_count == 0 {
            let byte = self
                .data
                .get(self.position)
                .ok_or_else(|| Error::compression("Unexpected end of Huffman data"))?;
            self.bit_buffer = *byte as u32;
            self.position += 1;
            self.bit_count = 8;
        }

        let bit = self.bit_buffer & 1;
        self.bit_buffer >>= 1;
        self.bit_count -= 1;
        Ok(bit)
    }

    fn get_8_bits(&mut self) -> Result<u8> {
        let mut value = 0u8;
        for shift in 0..8 {
            value |= (self.get_bit()? as u8) << shift;
        }
        Ok(value)
    }
}

#[derive(Debug, Clone)]
struct Node {
    /// Symbol carried by a leaf, `None` for internal nodes
    value: Option<u16>,
    weight: u32,
    parent: Option<usize>,
    /// First child; the second child is `prev` of this one
    child0: Option<usize>,
    next: Option<usize>,
    prev: Option<usize>,
}

/// Adaptive Huffman tree shared by the decoder and the fixture encoder
struct HuffmanTree {
    nodes: Vec<Node>,
    /// Heaviest node in the weight list (always the root)
    first: Option<usize>,
    /// Lightest node in the weight list
    last: Option<usize>,
    leaves: [Option<usize>; SYMBOL_COUNT],
    root: usize,
}

impl HuffmanTree {
    fn new(weights: &[u8; 258]) -> Self {
        let mut tree = Self {
            nodes: Vec::with_capacity(INITIAL_NODE_CAPACITY),
            first: None,
            last: None,
            leaves: [None; SYMBOL_COUNT],
            root: 0,
        };

        for (value, &weight) in weights.iter().take(0x100).enumerate() {
            if weight != 0 {
                let node = tree.alloc(Some(value as u16), weight as u32);
                tree.leaves[value] = Some(node);
                tree.insert_by_weight(node);
            }
        }

        for symbol in [END_OF_STREAM, NEW_SYMBOL] {
            let node = tree.alloc(Some(symbol), 1);
            tree.leaves[symbol as usize] = Some(node);
            tree.link_after(tree.last, node);
        }

        // Pair the two lightest unpaired nodes until only the root remains
        let mut cursor = tree.last;
        while let Some(child_lo) = cursor {
            let Some(child_hi) = tree.nodes[child_lo].prev else {
                break;
            };

            let weight = tree.nodes[child_lo].weight + tree.nodes[child_hi].weight;
            let parent = tree.alloc(None, weight);
            tree.nodes[parent].child0 = Some(child_lo);
            tree.nodes[child_lo].parent = Some(parent);
            tree.nodes[child_hi].parent = Some(parent);
            tree.insert_by_weight(parent);

            cursor = tree.nodes[child_hi].prev;
        }

        tree.root = tree.first.unwrap_or_default();
        tree
    }

    fn alloc(&mut self, value: Option<u16>, weight: u32) -> usize {
        self.nodes.push(Node {
            value,
            weight,
            parent: None,
            child0: None,
            next: None,
            prev: None,
        });
        self.nodes.len() - 1
    }

    /// Link `node` right after `anchor`, or at the front when there is none
    fn link_after(&mut self, anchor: Option<usize>, node: usize) {
        let following = match anchor {
            Some(anchor) => {
                let following = self.nodes[anchor].next;
                self.nodes[anchor].next = Some(node);
                following
            }
            None => {
                let following = self.first;
                self.first = Some(node);
                following
            }
        };

        self.nodes[node].prev = anchor;
        self.nodes[node].next = following;
        match following {
            Some(following) => self.nodes[following].prev = Some(node),
            None => self.last = Some(node),
        }
    }

    fn unlink(&mut self, node: usize) {
        let prev = self.nodes[node].prev.take();
        let next = self.nodes[node].next.take();

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.first = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.last = prev,
        }
    }

    /// Walk toward the front from `start` to the first node at least `weight` heavy
    fn higher_or_equal(&self, start: Option<usize>, weight: u32) -> Option<usize> {
        let mut cursor = start;
        while let Some(node) = cursor {
            if self.nodes[node].weight >= weight {
                return Some(node);
            }
            cursor = self.nodes[node].prev;
        }
        None
    }

    fn insert_by_weight(&mut self, node: usize) {
        let anchor = self.higher_or_equal(self.last, self.nodes[node].weight);
        self.link_after(anchor, node);
    }

    fn child1(&self, node: usize) -> Option<usize> {
        self.nodes[node].child0.and_then(|child| self.nodes[child].prev)
    }

    /// Bump the weight of `node` and every ancestor, swapping nodes forward
    /// so the list stays sorted
    fn increment(&mut self, node: usize) {
        let mut current = Some(node);

        while let Some(item) = current {
            self.nodes[item].weight += 1;
            let weight = self.nodes[item].weight;

            let higher = self.higher_or_equal(self.nodes[item].prev, weight);
            let swap_with = match higher {
                Some(higher) => self.nodes[higher].next,
                None => self.first,
            };

            if let Some(other) = swap_with
                && other != item
            {
                self.unlink(other);
                self.link_after(Some(item), other);
                self.unlink(item);
                self.link_after(higher, item);

                let item_parent = self.nodes[item].parent;
                let other_parent = self.nodes[other].parent;

                if let Some(parent) = item_parent
                    && self.nodes[parent].child0 == Some(item)
                {
                    self.nodes[parent].child0 = Some(other);
                }
                if let Some(parent) = other_parent
                    && item_parent != other_parent
                    && self.nodes[parent].child0 == Some(other)
                {
                    self.nodes[parent].child0 = Some(item);
                }

                self.nodes[item].parent = other_parent;
                self.nodes[other].parent = item_parent;
            }

            current = self.nodes[item].parent;
        }
    }

    /// Split the lightest leaf into a copy of itself and a new leaf for `value`
    fn add_symbol(&mut self, value: u8) -> Result<usize> {
        let old = self
            .last
            .ok_or_else(|| Error::compression("Huffman tree is empty"))?;
        let old_value = self.nodes[old].value;
        let old_weight = self.nodes[old].weight;

        let copy = self.alloc(old_value, old_weight);
        let added = self.alloc(Some(value as u16), 0);
        self.nodes[copy].parent = Some(old);
        self.nodes[added].parent = Some(old);
        self.nodes[old].child0 = Some(added);
        self.nodes[old].value = None;

        self.link_after(self.last, copy);
        self.link_after(self.last, added);

        if let Some(old_value) = old_value {
            self.leaves[old_value as usize] = Some(copy);
        }
        self.leaves[value as usize] = Some(added);

        self.increment(added);
        Ok(added)
    }

    fn decode_symbol(&self, bits: &mut BitReader<'_>) -> Result<(usize, u16)> {
        let mut node = self.root;
        while self.nodes[node].child0.is_some() {
            let next = if bits.get_bit()? == 0 {
                self.nodes[node].child0
            } else {
                self.child1(node)
            };
            node = next.ok_or_else(|| Error::compression("Malformed Huffman tree"))?;
        }

        let symbol = self.nodes[node]
            .value
            .ok_or_else(|| Error::compression("Huffman leaf without a symbol"))?;
        Ok((node, symbol))
    }
}

/// Decompress an adaptive Huffman stream
///
/// The first byte selects the weight table. Decoding stops at the
/// end-of-stream symbol; running out of input before it is an error.
pub(crate) fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let (&table_index, payload) = data
        .split_first()
        .ok_or_else(|| Error::compression("Empty Huffman data"))?;

    let weights = WEIGHT_TABLES.get(table_index as usize).ok_or_else(|| {
        Error::compression(format!("Unsupported Huffman weight table {table_index}"))
    })?;
    let adapt_on_every_byte = table_index == 0;

    let mut tree = HuffmanTree::new(weights);
    let mut bits = BitReader::new(payload);
    let mut output = Vec::with_capacity(payload.len() * 2);

    loop {
        let (node, symbol) = tree.decode_symbol(&mut bits)?;
        match symbol {
            END_OF_STREAM => break,
            NEW_SYMBOL => {
                let value = bits.get_8_bits()?;
                let added = tree.add_symbol(value)?;
                output.push(value);
                tree.increment(added);
            }
            value => {
                output.push(value as u8);
                if adapt_on_every_byte {
                    tree.increment(node);
                }
            }
        }
    }

    log::trace!(
        "Huffman table {table_index}: {} -> {} bytes",
        data.len(),
        output.len()
    );

    Ok(output)
}

/// Encoder counterpart used to build audio fixtures
#[cfg(any(test, feature = "test-utils"))]
pub(crate) mod encode {
    use super::*;

    struct BitWriter {
        bytes: Vec<u8>,
        bit_count: usize,
    }

    impl BitWriter {
        fn put_bit(&mut self, bit: u8) {
            if self.bit_count % 8 == 0 {
                self.bytes.push(0);
            }
            if let Some(last) = self.bytes.last_mut() {
                *last |= (bit & 1) << (self.bit_count % 8);
            }
            self.bit_count += 1;
        }
    }

    fn emit(tree: &HuffmanTree, node: usize, out: &mut BitWriter) {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(parent) = tree.nodes[current].parent {
            path.push(u8::from(tree.nodes[parent].child0 != Some(current)));
            current = parent;
        }
        for &bit in path.iter().rev() {
            out.put_bit(bit);
        }
    }

    /// Compress `data` with the given weight table
    pub(crate) fn compress(data: &[u8], table_index: u8) -> Result<Vec<u8>> {
        let weights = WEIGHT_TABLES.get(table_index as usize).ok_or_else(|| {
            Error::compression(format!("Unsupported Huffman weight table {table_index}"))
        })?;
        let adapt_on_every_byte = table_index == 0;

        let mut tree = HuffmanTree::new(weights);
        let mut out = BitWriter {
            bytes: vec![table_index],
            bit_count: 8,
        };

        for &byte in data {
            match tree.leaves[byte as usize] {
                Some(leaf) => {
                    emit(&tree, leaf, &mut out);
                    if adapt_on_every_byte {
                        tree.increment(leaf);
                    }
                }
                None => {
                    if let Some(new_symbol) = tree.leaves[NEW_SYMBOL as usize] {
                        emit(&tree, new_symbol, &mut out);
                    }
                    for shift in 0..8 {
                        out.put_bit(byte >> shift);
                    }
                    let added = tree.add_symbol(byte)?;
                    tree.increment(added);
                }
            }
        }

        if let Some(end) = tree.leaves[END_OF_STREAM as usize] {
            emit(&tree, end, &mut out);
        }

        Ok(out.bytes)
    }
}
