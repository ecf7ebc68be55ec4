use seisgate_core::ExecutionOutput;

/// A computed product: serialized metadata plus zero or more binary blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub metadata: Vec<u8>,
    pub data: Vec<Vec<u8>>,
}

impl CacheEntry {
    pub fn new(metadata: Vec<u8>, data: Vec<Vec<u8>>) -> Self {
        Self { metadata, data }
    }

    /// Bytes charged against the cache budget.
    pub fn size_in_bytes(&self) -> usize {
        self.metadata.len() + self.data.iter().map(Vec::len).sum::<usize>()
    }

    /// Weight as seen by the eviction policy. Saturates for entries over 4 GiB.
    pub(crate) fn weight(&self) -> u32 {
        u32::try_from(self.size_in_bytes()).unwrap_or(u32::MAX)
    }
}

impl From<ExecutionOutput> for CacheEntry {
    fn from(output: ExecutionOutput) -> Self {
        Self::new(output.metadata, output.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_counts_metadata_and_blocks() {
        let entry = CacheEntry::new(b"{}".to_vec(), vec![vec![0; 16], vec![0; 8]]);
        assert_eq!(entry.size_in_bytes(), 26);
        assert_eq!(entry.weight(), 26);
    }

    #[test]
    fn test_from_execution_output() {
        let entry = CacheEntry::from(ExecutionOutput {
            metadata: b"{\"shape\":[1]}".to_vec(),
            data: vec![1f32.to_le_bytes().to_vec()],
        });
        assert_eq!(entry.data.len(), 1);
        assert_eq!(entry.data[0], 1f32.to_le_bytes());
    }
}
