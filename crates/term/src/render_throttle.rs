/// Decides when the main loop should redraw.
///
/// A frame is drawn immediately when the snapshot fingerprint changes and at
/// most once per `min_interval_ms` otherwise, so an idle menu or paused board
/// does not keep repainting at the tick rate.
#[derive(Debug, Clone)]
pub struct RenderThrottle {
    min_interval_ms: u64,
    last_render_ms: u64,
    last_fingerprint: Option<u64>,
}

impl RenderThrottle {
    pub fn new(min_interval_ms: u64) -> Self {
        Self {
            min_interval_ms,
            last_render_ms: 0,
            last_fingerprint: None,
        }
    }

    /// Forget the last frame; the next call renders.
    pub fn invalidate(&mut self) {
        self.last_fingerprint = None;
    }

    pub fn should_render(&mut self, now_ms: u64, fingerprint: u64) -> bool {
        let due = match self.last_fingerprint {
            None => true,
            Some(last) if last != fingerprint => true,
            Some(_) => now_ms.saturating_sub(self.last_render_ms) >= self.min_interval_ms,
        };
        if due {
            self.last_render_ms = now_ms;
            self.last_fingerprint = Some(fingerprint);
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_and_changes_render_immediately() {
        let mut t = RenderThrottle::new(250);
        assert!(t.should_render(0, 1));
        assert!(!t.should_render(10, 1));
        assert!(t.should_render(20, 2));
    }

    #[test]
    fn unchanged_frames_are_rate_limited() {
        let mut t = RenderThrottle::new(250);
        assert!(t.should_render(1_000, 7));
        assert!(!t.should_render(1_249, 7));
        assert!(t.should_render(1_250, 7));
        assert!(!t.should_render(1_300, 7));
    }

    #[test]
    fn invalidate_forces_render() {
        let mut t = RenderThrottle::new(250);
        assert!(t.should_render(0, 3));
        t.invalidate();
        assert!(t.should_render(1, 3));
    }
}
