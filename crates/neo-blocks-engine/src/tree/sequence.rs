use crate::models::Block;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StructureError {
    #[error("block {index} is at level {level} directly after level {previous_level}")]
    LevelJump {
        index: usize,
        level: u32,
        previous_level: u32,
    },
    #[error("block {index} has level 0")]
    InvalidLevel { index: usize },
}

/// Neighbours of one block in submission order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Link {
    pub prev: Option<usize>,
    pub next: Option<usize>,
}

/// A block and the blocks nested directly under it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineNode {
    /// Position in the sequence
    pub index: usize,
    pub children: Vec<OutlineNode>,
}

/// Parent position of every entry of `levels`, derived with an ancestor stack.
///
/// A block's parent is the nearest earlier block one level up. Fails when a
/// level skips more than one step down from its predecessor, including a first
/// block below level 1.
pub fn parent_indices(levels: &[u32]) -> Result<Vec<Option<usize>>, StructureError> {
    let mut parents = Vec::with_capacity(levels.len());
    let mut ancestors: Vec<usize> = Vec::new();

    for (index, &level) in levels.iter().enumerate() {
        if level == 0 {
            return Err(StructureError::InvalidLevel { index });
        }

        let previous_level = index.checked_sub(1).map_or(0, |prev| levels[prev]);
        if level > previous_level + 1 {
            return Err(StructureError::LevelJump {
                index,
                level,
                previous_level,
            });
        }

        while ancestors.last().is_some_and(|&top| levels[top] >= level) {
            ancestors.pop();
        }
        parents.push(ancestors.last().copied());
        ancestors.push(index);
    }

    Ok(parents)
}

/// An ordered block sequence with its prev/next chain.
///
/// Positions double as sort orders. Nesting comes from levels alone; the chain
/// runs across the whole sequence regardless of depth.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockSequence {
    blocks: Vec<Block>,
    links: Vec<Link>,
}

impl BlockSequence {
    pub fn new(mut blocks: Vec<Block>) -> Self {
        let len = blocks.len();
        for (i, block) in blocks.iter_mut().enumerate() {
            block.sort_order = i as u32;
        }
        let links = (0..len)
            .map(|i| Link {
                prev: i.checked_sub(1),
                next: Some(i + 1).filter(|&next| next < len),
            })
            .collect();

        Self { blocks, links }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn link(&self, index: usize) -> Option<Link> {
        self.links.get(index).copied()
    }

    pub fn prev(&self, index: usize) -> Option<&Block> {
        self.link(index)?.prev.and_then(|i| self.get(i))
    }

    pub fn next(&self, index: usize) -> Option<&Block> {
        self.link(index)?.next.and_then(|i| self.get(i))
    }

    /// Position of the nearest earlier block with a lower level
    pub fn parent_index(&self, index: usize) -> Option<usize> {
        let level = self.get(index)?.level;
        self.blocks[..index]
            .iter()
            .rposition(|block| block.level < level)
    }

    pub fn parent(&self, index: usize) -> Option<&Block> {
        self.parent_index(index).and_then(|i| self.get(i))
    }

    /// Blocks nested directly under the block at `index`
    pub fn children(&self, index: usize) -> Vec<&Block> {
        let Some(block) = self.get(index) else {
            return Vec::new();
        };
        self.blocks[index + 1..]
            .iter()
            .take_while(|child| child.level > block.level)
            .filter(|child| child.level == block.level + 1)
            .collect()
    }

    pub fn levels(&self) -> Vec<u32> {
        self.blocks.iter().map(|block| block.level).collect()
    }

    /// The nested structure, rebuilt from levels
    pub fn outline(&self) -> Result<Vec<OutlineNode>, StructureError> {
        let parents = parent_indices(&self.levels())?;

        let mut children: Vec<Vec<usize>> = vec![Vec::new(); parents.len()];
        let mut roots = Vec::new();
        for (index, parent) in parents.iter().enumerate() {
            match parent {
                Some(parent) => children[*parent].push(index),
                None => roots.push(index),
            }
        }

        Ok(roots
            .into_iter()
            .map(|index| build_node(index, &children))
            .collect())
    }
}

fn build_node(index: usize, children: &[Vec<usize>]) -> OutlineNode {
    OutlineNode {
        index,
        children: children[index]
            .iter()
            .map(|&child| build_node(child, children))
            .collect(),
    }
}
