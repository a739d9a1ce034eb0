use crate::ids::{BlockId, LessonId};
use crc32fast::Hasher;

/// Seed for a lesson's block ids (CRC32 of the lesson URI)
pub fn get_lesson_seed(lesson_id: &LessonId) -> String {
    let mut hasher = Hasher::new();
    hasher.update(format!("lesson://{}", lesson_id).as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential block id generator for one lesson
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String, // Lesson seed (CRC32)
    count: u32,   // Sequential counter
}

impl IdGenerator {
    pub fn new(lesson_id: &LessonId) -> Self {
        Self {
            seed: get_lesson_seed(lesson_id),
            count: 0,
        }
    }

    /// Continue numbering after the highest `<seed>-N` among `existing`.
    ///
    /// Called on hydrate so a block deleted later never has its id handed
    /// out again in the same session.
    pub fn resume_after<'a>(&mut self, existing: impl IntoIterator<Item = &'a BlockId>) {
        let prefix = format!("{}-", self.seed);
        let highest = existing
            .into_iter()
            .filter_map(|id| id.as_str().strip_prefix(&prefix)?.parse::<u32>().ok())
            .max();

        if let Some(highest) = highest {
            self.count = self.count.max(highest);
        }
    }

    /// Generate the next id that `taken` does not claim
    ///
    /// Hydrated lessons already contain ids from earlier sessions, so the
    /// counter skips over any of them.
    pub fn new_id(&mut self, taken: impl Fn(&BlockId) -> bool) -> BlockId {
        loop {
            self.count += 1;
            let id = BlockId::new(format!("{}-{}", self.seed, self.count));
            if !taken(&id) {
                return id;
            }
        }
    }

    /// Get lesson seed
    pub fn seed(&self) -> &str {
        &self.seed
    }
}
