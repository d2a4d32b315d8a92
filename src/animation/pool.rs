// PixelPal — Shuffled Emote Pool

use rand::Rng;

/// Draws clips from a fixed set without replacement. Once every clip has been
/// drawn the pool refills, so no emote repeats until the whole set has played.
pub struct ShufflePool {
    clips: &'static [&'static str],
    remaining: Vec<usize>,
}

impl ShufflePool {
    pub fn new(clips: &'static [&'static str]) -> Self {
        Self {
            clips,
            remaining: (0..clips.len()).collect(),
        }
    }

    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> &'static str {
        if self.remaining.is_empty() {
            self.remaining = (0..self.clips.len()).collect();
        }
        let pick = rng.gen_range(0..self.remaining.len());
        let index = self.remaining.swap_remove(pick);
        self.clips[index]
    }
}
