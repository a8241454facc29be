/// One verse's slot on the video timeline, in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub start: f64,
    pub duration: f64,
}

impl Slot {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Back-to-back verse slots built from audio durations
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    slots: Vec<Slot>,
}

impl Timeline {
    pub fn from_durations<I>(durations: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut start = 0.0;
        let slots = durations
            .into_iter()
            .map(|duration| {
                let slot = Slot { start, duration };
                start += duration;
                slot
            })
            .collect();

        Self { slots }
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.slots.last().map(Slot::end).unwrap_or(0.0)
    }
}
