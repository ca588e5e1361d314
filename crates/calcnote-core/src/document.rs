//! Document type - the ordered sequence of blocks
//!
//! Block order is evaluation order: later blocks may reference names defined by
//! earlier ones, never the reverse.

use crate::block::{Block, FormulaBlock};
use crate::error::{Error, Result};

/// A calculation notebook
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from existing blocks
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Get the number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Append a block, returning its index
    pub fn add_block(&mut self, block: Block) -> usize {
        self.blocks.push(block);
        self.blocks.len() - 1
    }

    /// Append a text block
    pub fn add_text(&mut self, content: impl Into<String>) -> usize {
        self.add_block(Block::text(content))
    }

    /// Append a formula block
    pub fn add_formula(&mut self, source: impl Into<String>) -> usize {
        self.add_block(Block::formula(source))
    }

    /// Insert a block at a specific index
    pub fn insert_block(&mut self, index: usize, block: Block) -> Result<()> {
        if index > self.blocks.len() {
            return Err(Error::BlockOutOfBounds(index, self.blocks.len()));
        }
        self.blocks.insert(index, block);
        Ok(())
    }

    /// Remove a block by index
    pub fn remove_block(&mut self, index: usize) -> Result<Block> {
        if index >= self.blocks.len() {
            return Err(Error::BlockOutOfBounds(index, self.blocks.len()));
        }
        Ok(self.blocks.remove(index))
    }

    /// Move a block to a new position
    pub fn move_block(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.blocks.len();
        if from >= len {
            return Err(Error::BlockOutOfBounds(from, len));
        }
        if to >= len {
            return Err(Error::BlockOutOfBounds(to, len));
        }
        let block = self.blocks.remove(from);
        self.blocks.insert(to, block);
        Ok(())
    }

    /// Get a block by index
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Get a mutable block by index
    pub fn block_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    /// Get the formula block at `index`, if it is one
    pub fn formula(&self, index: usize) -> Option<&FormulaBlock> {
        self.blocks.get(index).and_then(Block::as_formula)
    }

    /// Iterate over all blocks
    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Iterate over all blocks mutably
    pub fn blocks_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.iter_mut()
    }

    /// Iterate over formula blocks together with their document index
    pub fn formula_blocks(&self) -> impl Iterator<Item = (usize, &FormulaBlock)> {
        self.blocks
            .iter()
            .enumerate()
            .filter_map(|(i, b)| b.as_formula().map(|f| (i, f)))
    }

    /// Find the formula block that assigns `name` in the last pass
    pub fn find_target(&self, name: &str) -> Option<&FormulaBlock> {
        self.formula_blocks()
            .map(|(_, f)| f)
            .filter(|f| f.target() == Some(name))
            .last()
    }

    /// Return every formula block to the pending state
    pub fn reset_results(&mut self) {
        for block in self.blocks.iter_mut().filter_map(Block::as_formula_mut) {
            block.reset();
        }
    }
}
