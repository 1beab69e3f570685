//! Frame observers: the render feed and the cancellation point
//!
//! The engine calls its observer once after every completed frame. Returning
//! [`Flow::Stop`] ends the generation there; nothing is ever interrupted
//! mid-frame.

use flapsim_logic::snapshot::FrameSnapshot;

/// Whether the engine should keep stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub trait FrameObserver {
    fn on_frame(&mut self, snapshot: &FrameSnapshot) -> Flow;

    /// Observers that never look at frames return false so the engine can
    /// skip building snapshots.
    fn wants_frames(&self) -> bool {
        true
    }
}

impl<F> FrameObserver for F
where
    F: FnMut(&FrameSnapshot) -> Flow,
{
    fn on_frame(&mut self, snapshot: &FrameSnapshot) -> Flow {
        self(snapshot)
    }
}

/// Sees nothing, never stops. For headless training.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl FrameObserver for NullObserver {
    fn on_frame(&mut self, _snapshot: &FrameSnapshot) -> Flow {
        Flow::Continue
    }

    fn wants_frames(&self) -> bool {
        false
    }
}

/// Keeps every `every`-th frame, for replays and JSON dumps.
#[derive(Debug, Clone)]
pub struct SnapshotRecorder {
    every: u64,
    pub frames: Vec<FrameSnapshot>,
}

impl SnapshotRecorder {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            frames: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.frames)
    }
}

impl FrameObserver for SnapshotRecorder {
    fn on_frame(&mut self, snapshot: &FrameSnapshot) -> Flow {
        if snapshot.frame % self.every == 0 {
            self.frames.push(snapshot.clone());
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(frame: u64) -> FrameSnapshot {
        FrameSnapshot {
            generation: 0,
            frame,
            score: 0,
            alive: 1,
            birds: Vec::new(),
            obstacles: Vec::new(),
            floor_x: 0.0,
            floor_y: 734.0,
        }
    }

    #[test]
    fn closures_are_observers() {
        let mut seen = 0;
        let mut stop_at_three = |s: &FrameSnapshot| {
            seen += 1;
            if s.frame >= 3 {
                Flow::Stop
            } else {
                Flow::Continue
            }
        };
        assert_eq!(stop_at_three.on_frame(&snap(1)), Flow::Continue);
        assert_eq!(stop_at_three.on_frame(&snap(3)), Flow::Stop);
        assert!(stop_at_three.wants_frames());
        assert_eq!(seen, 2);
    }

    #[test]
    fn null_observer_opts_out() {
        let mut null = NullObserver;
        assert!(!null.wants_frames());
        assert_eq!(null.on_frame(&snap(1)), Flow::Continue);
    }

    #[test]
    fn recorder_samples_frames() {
        let mut rec = SnapshotRecorder::new(5);
        for f in 1..=12 {
            rec.on_frame(&snap(f));
        }
        let frames: Vec<u64> = rec.frames.iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![5, 10]);

        let json = rec.to_json().unwrap();
        let back: Vec<FrameSnapshot> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec.frames);
    }
}
