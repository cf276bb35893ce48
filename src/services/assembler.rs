//! Rendering a [`DiskChain`] into the single string handed to consumers.

use super::error::{ChainError, ChainResult};
use crate::models::{ChainOrder, DiskChain};

/// Joins chain entries with single spaces inside a fixed byte budget.
///
/// The budget counts the separators and a trailing NUL, so a capacity of
/// 1024 admits at most 1023 bytes of text. Exceeding it is an error; output
/// is never truncated.
#[derive(Debug, Clone, Copy)]
pub struct ChainOutputAssembler {
    capacity: usize,
    order: ChainOrder,
}

impl ChainOutputAssembler {
    pub fn new(capacity: usize, order: ChainOrder) -> Self {
        Self { capacity, order }
    }

    /// Bytes needed to render `chain`, terminator included.
    pub fn required_len(chain: &DiskChain) -> usize {
        let names: usize = chain.newest_first().map(str::len).sum();
        names + chain.len().saturating_sub(1) + 1
    }

    pub fn render(&self, chain: &DiskChain) -> ChainResult<String> {
        let required = Self::required_len(chain);
        if required > self.capacity {
            tracing::warn!(
                "Rendered chain needs {} bytes, capacity is {}",
                required,
                self.capacity
            );
            return Err(ChainError::ResourceExceeded {
                what: "bytes in rendered chain",
                limit: self.capacity,
            });
        }

        let names: Vec<&str> = match self.order {
            ChainOrder::OldestFirst => chain.oldest_first().collect(),
            ChainOrder::NewestFirst => chain.newest_first().collect(),
        };
        Ok(names.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::error::ChainErrorKind;

    fn chain() -> DiskChain {
        let mut chain = DiskChain::new("c.vmdk");
        chain.push_ancestor("a.vmdk");
        chain.push_ancestor("b.vmdk");
        chain
    }

    #[test]
    fn test_oldest_first() {
        let assembler = ChainOutputAssembler::new(1024, ChainOrder::OldestFirst);
        assert_eq!(assembler.render(&chain()).unwrap(), "b.vmdk a.vmdk c.vmdk");
    }

    #[test]
    fn test_newest_first() {
        let assembler = ChainOutputAssembler::new(1024, ChainOrder::NewestFirst);
        assert_eq!(assembler.render(&chain()).unwrap(), "c.vmdk a.vmdk b.vmdk");
    }

    #[test]
    fn test_capacity_is_exact() {
        // 3 * 6 bytes + 2 separators + NUL
        assert_eq!(ChainOutputAssembler::required_len(&chain()), 21);

        let fits = ChainOutputAssembler::new(21, ChainOrder::OldestFirst);
        assert!(fits.render(&chain()).is_ok());

        let too_small = ChainOutputAssembler::new(20, ChainOrder::OldestFirst);
        let err = too_small.render(&chain()).unwrap_err();
        assert_eq!(err.kind(), ChainErrorKind::ResourceExceeded);
    }

    #[test]
    fn test_single_disk() {
        let assembler = ChainOutputAssembler::new(1024, ChainOrder::OldestFirst);
        assert_eq!(assembler.render(&DiskChain::new("only.vmdk")).unwrap(), "only.vmdk");
    }
}
