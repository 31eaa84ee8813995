use quadsim_shared::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    Human,
    Headless,
}

/// Presentation hook. The simulation only hands out snapshots; drawing is
/// entirely the implementor's business.
pub trait Renderer: Send {
    fn render(&mut self, frame: &ReplayFrame, mode: RenderMode);
}

/// Used when no presentation surface is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _frame: &ReplayFrame, _mode: RenderMode) {}
}

/// Keeps every `interval`-th rendered frame for replays.
#[derive(Debug, Clone)]
pub struct FrameRecorder {
    interval: u32,
    frames: Vec<ReplayFrame>,
}

impl FrameRecorder {
    pub fn new(interval: u32) -> Self {
        Self {
            interval: interval.max(1),
            frames: Vec::new(),
        }
    }

    pub fn frames(&self) -> &[ReplayFrame] {
        &self.frames
    }

    pub fn push(&mut self, frame: ReplayFrame) {
        self.frames.push(frame);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn into_frames(self) -> Vec<ReplayFrame> {
        self.frames
    }
}

impl Renderer for FrameRecorder {
    fn render(&mut self, frame: &ReplayFrame, _mode: RenderMode) {
        if frame.tick % self.interval == 0 {
            self.frames.push(*frame);
        }
    }
}
