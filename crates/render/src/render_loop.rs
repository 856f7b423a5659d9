use std::time::Duration;

use glyphrain_scene::SceneGraph;

use crate::{CullStats, PerspectiveCamera, Renderer, VisibilityCuller};

/// Result of one host callback.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome<O> {
    /// Too soon after the previous frame; nothing ran.
    Skipped,
    Rendered { output: O, cull: CullStats },
}

impl<O> FrameOutcome<O> {
    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered { .. })
    }

    pub fn output(self) -> Option<O> {
        match self {
            Self::Rendered { output, .. } => Some(output),
            Self::Skipped => None,
        }
    }
}

/// Throttles host frame callbacks to at most one executed frame per
/// `min_interval`, culling then drawing on each executed frame.
#[derive(Debug)]
pub struct RenderLoop {
    min_interval: Duration,
    last_executed: Option<Duration>,
    culler: VisibilityCuller,
    timer: FrameTimer,
    rendered: u64,
    skipped: u64,
}

impl RenderLoop {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_executed: None,
            culler: VisibilityCuller::new(),
            timer: FrameTimer::new(120),
            rendered: 0,
            skipped: 0,
        }
    }

    /// Handle one host callback at `now`. The first call always executes.
    pub fn step<R: Renderer>(
        &mut self,
        now: Duration,
        camera: &PerspectiveCamera,
        scene: &mut SceneGraph,
        renderer: &mut R,
    ) -> FrameOutcome<R::Output> {
        if let Some(last) = self.last_executed {
            let elapsed = now.saturating_sub(last);
            if elapsed < self.min_interval {
                self.skipped += 1;
                return FrameOutcome::Skipped;
            }
            self.timer.record(elapsed);
        }

        let _span = tracing::info_span!("frame", n = self.rendered).entered();
        let cull = self.culler.cull(camera, scene);
        let output = renderer.render(scene, camera);
        self.last_executed = Some(now);
        self.rendered += 1;
        tracing::trace!(visible = cull.visible, hidden = cull.hidden, "frame rendered");

        FrameOutcome::Rendered { output, cull }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn last_executed(&self) -> Option<Duration> {
        self.last_executed
    }

    pub fn rendered(&self) -> u64 {
        self.rendered
    }

    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    pub fn last_cull(&self) -> CullStats {
        self.culler.last()
    }
}

/// Ring buffer of recent executed-frame intervals for instrumentation.
#[derive(Debug)]
pub struct FrameTimer {
    history: Vec<Duration>,
    capacity: usize,
    index: usize,
    filled: bool,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: vec![Duration::ZERO; capacity],
            capacity,
            index: 0,
            filled: false,
        }
    }

    pub fn record(&mut self, dt: Duration) {
        self.history[self.index] = dt;
        self.index = (self.index + 1) % self.capacity;
        if self.index == 0 {
            self.filled = true;
        }
    }

    fn recorded(&self) -> &[Duration] {
        &self.history[..self.count()]
    }

    pub fn average(&self) -> Duration {
        let samples = self.recorded();
        if samples.is_empty() {
            return Duration::ZERO;
        }
        samples.iter().sum::<Duration>() / samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.recorded().iter().copied().max().unwrap_or(Duration::ZERO)
    }

    pub fn min(&self) -> Duration {
        self.recorded().iter().copied().min().unwrap_or(Duration::ZERO)
    }

    pub fn count(&self) -> usize {
        if self.filled { self.capacity } else { self.index }
    }
}
