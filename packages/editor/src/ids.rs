use crate::block::BlockId;

/// Sequential id generator for blocks within a builder session.
///
/// Ids have the form `{seed}-{n}`. The seed defaults to the session start
/// time so ids minted by different sessions do not collide in a shared
/// store.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u64,
}

impl IdGenerator {
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Seed from the current wall clock (milliseconds, hex)
    pub fn from_clock() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        Self::new(format!("blk{:x}", millis))
    }

    /// Generate the next sequential id
    pub fn new_id(&mut self) -> BlockId {
        self.count += 1;
        BlockId::new(format!("{}-{}", self.seed, self.count))
    }

    /// Generate the next id for which `taken` is false
    pub fn new_unique_id(&mut self, taken: impl Fn(&BlockId) -> bool) -> BlockId {
        loop {
            let id = self.new_id();
            if !taken(&id) {
                return id;
            }
        }
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::from_clock()
    }
}
