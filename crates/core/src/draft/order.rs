//! Snake pick order.
//!
//! Round `r = index / N` runs forward when `r` is even and backward when odd,
//! so every participant picks exactly once per round and the participant who
//! closes one round opens the next.

/// Maps a global pick index to the participant who owns it.
#[derive(Debug, Clone, Copy)]
pub struct SnakeOrder<'a> {
    participants: &'a [String],
}

impl<'a> SnakeOrder<'a> {
    pub fn new(participants: &'a [String]) -> Self {
        Self { participants }
    }

    /// Number of picks in one round.
    pub fn round_len(&self) -> u32 {
        self.participants.len() as u32
    }

    /// Zero-based round containing `pick_index`.
    pub fn round_of(&self, pick_index: u32) -> Option<u32> {
        let n = self.round_len();
        (n > 0).then(|| pick_index / n)
    }

    /// Participant who picks at `pick_index`. `None` only when there are no participants.
    pub fn picker_at(&self, pick_index: u32) -> Option<&'a str> {
        let n = self.round_len();
        if n == 0 {
            return None;
        }
        let round = pick_index / n;
        let offset = pick_index % n;
        let slot = if round % 2 == 0 { offset } else { n - 1 - offset };
        self.participants.get(slot as usize).map(String::as_str)
    }

    /// Whether `participant_id` owns `pick_index`. A mismatch is a rejection, never a reassignment.
    pub fn is_turn_of(&self, pick_index: u32, participant_id: &str) -> bool {
        self.picker_at(pick_index) == Some(participant_id)
    }
}
