use crc32fast::Hasher;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static GENERATORS: AtomicU32 = AtomicU32::new(0);

/// Build a process-unique seed: `block-<unix millis>-<crc32 hex>-<generator>`
pub fn session_seed() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let generator = GENERATORS.fetch_add(1, Ordering::Relaxed);

    let mut hasher = Hasher::new();
    hasher.update(&now.as_nanos().to_le_bytes());
    hasher.update(&std::process::id().to_le_bytes());
    hasher.update(&generator.to_le_bytes());

    format!("block-{}-{:08x}-{}", now.as_millis(), hasher.finalize(), generator)
}

/// Sequential ID generator for placeholder nodes.
///
/// Not `Clone`: two copies would hand out the same ids.
#[derive(Debug)]
pub struct IDGenerator {
    seed: String,
    count: u32,
}

impl IDGenerator {
    pub fn new() -> Self {
        Self::from_seed(session_seed())
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

impl Default for IDGenerator {
    fn default() -> Self {
        Self::new()
    }
}
