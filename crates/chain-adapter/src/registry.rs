//! Per-chain adapter lookup

use std::collections::HashMap;
use std::sync::Arc;

use swap_core::{Blockchain, ChainError};

use crate::{ChainReadAdapter, ChainWriteAdapter, Result};

/// Read and write adapters keyed by chain
#[derive(Clone, Default)]
pub struct ChainAdapters {
    readers: HashMap<Blockchain, Arc<dyn ChainReadAdapter>>,
    writers: HashMap<Blockchain, Arc<dyn ChainWriteAdapter>>,
}

impl ChainAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reader(mut self, reader: Arc<dyn ChainReadAdapter>) -> Self {
        self.readers.insert(reader.blockchain(), reader);
        self
    }

    pub fn with_writer(mut self, writer: Arc<dyn ChainWriteAdapter>) -> Self {
        self.writers.insert(writer.blockchain(), writer);
        self
    }

    pub fn read(&self, chain: Blockchain) -> Result<Arc<dyn ChainReadAdapter>> {
        self.readers
            .get(&chain)
            .cloned()
            .ok_or(ChainError::UnsupportedChain { chain })
    }

    pub fn write(&self, chain: Blockchain) -> Result<Arc<dyn ChainWriteAdapter>> {
        self.writers
            .get(&chain)
            .cloned()
            .ok_or(ChainError::WalletNotConnected { chain })
    }

    /// Chains with a read adapter, in declaration order
    pub fn readable_chains(&self) -> Vec<Blockchain> {
        let mut chains: Vec<_> = self.readers.keys().copied().collect();
        chains.sort();
        chains
    }
}

impl std::fmt::Debug for ChainAdapters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainAdapters")
            .field("readers", &self.readable_chains())
            .field("writers", &self.writers.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InMemoryChain;

    #[test]
    fn test_lookup() {
        let eth = Arc::new(InMemoryChain::new(Blockchain::Ethereum));
        let adapters = ChainAdapters::new()
            .with_reader(eth.clone())
            .with_writer(eth);

        assert!(adapters.read(Blockchain::Ethereum).is_ok());
        assert!(adapters.write(Blockchain::Ethereum).is_ok());
        assert!(matches!(
            adapters.read(Blockchain::Polygon),
            Err(ChainError::UnsupportedChain { chain: Blockchain::Polygon })
        ));
        assert!(matches!(
            adapters.write(Blockchain::BinanceSmartChain),
            Err(ChainError::WalletNotConnected { .. })
        ));
    }
}
