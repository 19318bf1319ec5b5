/// Index of the exercise card on screen. Moves wrap around both ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    index: usize,
    len: usize,
}

impl Cursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn next(&mut self) {
        if self.len == 0 {
            return;
        }
        self.index = if self.index + 1 < self.len { self.index + 1 } else { 0 };
    }

    pub fn previous(&mut self) {
        if self.len == 0 {
            return;
        }
        self.index = if self.index > 0 { self.index - 1 } else { self.len - 1 };
    }

    /// Group count changed; keep the index in range.
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if self.index >= len {
            self.index = len.saturating_sub(1);
        }
    }
}
