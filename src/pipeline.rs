use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::glyphs::GlyphTable;
use crate::noise::Perlin3;
use crate::render::{blank_frame, render_frame};

/// Time advance between consecutive frames. Constant, so the displayed time
/// axis is monotonic and evenly spaced no matter how workers jitter.
pub const TIME_STEP: f64 = 0.05;

/// Everything a renderer needs to produce frames for one run.
#[derive(Clone)]
pub struct Scene {
    pub width: usize,
    pub height: usize,
    pub scale: f64,
    pub seed: u64,
    pub table: Arc<GlyphTable>,
}

/// One unit of work for a render worker. Consumed, never retained.
struct FrameRequest {
    width: usize,
    height: usize,
    t: f64,
}

struct Job {
    req: FrameRequest,
    reply: Sender<String>,
}

/// Produces the frame sequence, either inline or ahead-of-need on a pool.
pub enum Scheduler {
    Serial(SerialScheduler),
    Pool(PoolScheduler),
}

impl Scheduler {
    pub fn serial(scene: Scene) -> Self {
        Scheduler::Serial(SerialScheduler::new(scene))
    }

    pub fn pool(scene: Scene, workers: usize, wait_cap: Duration) -> Self {
        Scheduler::Pool(PoolScheduler::new(scene, workers, wait_cap))
    }

    /// The next frame in time order. In pool mode this is the display loop's
    /// one blocking point, bounded by the pool's wait cap.
    pub fn next_frame(&mut self) -> String {
        match self {
            Scheduler::Serial(s) => s.next_frame(),
            Scheduler::Pool(p) => p.next_frame(),
        }
    }
}

/// Renders inline in the display loop; no concurrency, no look-ahead.
pub struct SerialScheduler {
    scene: Scene,
    noise: Perlin3,
    next_t: f64,
}

impl SerialScheduler {
    fn new(scene: Scene) -> Self {
        let noise = Perlin3::new(scene.seed);
        Self {
            scene,
            noise,
            next_t: 0.0,
        }
    }

    fn next_frame(&mut self) -> String {
        let frame = render_frame(
            self.scene.width,
            self.scene.height,
            self.scene.scale,
            self.next_t,
            &self.noise,
            &self.scene.table,
        );
        self.next_t += TIME_STEP;
        frame
    }
}

/// Keeps a fixed-depth window of frames in flight on a worker pool.
///
/// Warm-up submits one request per worker before the first frame is
/// consumed; from then on every consumed frame triggers exactly one new
/// submission, so the look-ahead depth stays constant. Display order is the
/// submission order: the scheduler always waits on the oldest slot of its
/// own FIFO, never on "whichever worker finishes first".
pub struct PoolScheduler {
    width: usize,
    height: usize,
    wait_cap: Duration,
    next_t: f64,
    jobs: Option<Sender<Job>>,
    pending: VecDeque<(f64, Receiver<String>)>,
    workers: Vec<JoinHandle<()>>,
}

impl PoolScheduler {
    fn new(scene: Scene, workers: usize, wait_cap: Duration) -> Self {
        let workers = workers.max(1);
        let (jobs_tx, jobs_rx) = mpsc::channel::<Job>();
        let jobs_rx = Arc::new(Mutex::new(jobs_rx));

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let queue = Arc::clone(&jobs_rx);
            let table = Arc::clone(&scene.table);
            let seed = scene.seed;
            let scale = scene.scale;
            handles.push(thread::spawn(move || worker_loop(queue, seed, scale, table)));
        }

        let mut pool = Self {
            width: scene.width,
            height: scene.height,
            wait_cap,
            next_t: 0.0,
            jobs: Some(jobs_tx),
            pending: VecDeque::with_capacity(workers),
            workers: handles,
        };
        for _ in 0..workers {
            pool.submit_next();
        }
        pool
    }

    fn next_frame(&mut self) -> String {
        let frame = match self.pending.pop_front() {
            Some((t, slot)) => match slot.recv_timeout(self.wait_cap) {
                Ok(frame) => frame,
                Err(err) => {
                    log::warn!("frame t={t:.2} not delivered ({err}); showing a blank frame");
                    blank_frame(self.width, self.height)
                }
            },
            None => blank_frame(self.width, self.height),
        };
        self.submit_next();
        frame
    }

    fn submit_next(&mut self) {
        let (reply, slot) = mpsc::channel();
        let req = FrameRequest {
            width: self.width,
            height: self.height,
            t: self.next_t,
        };
        if let Some(jobs) = &self.jobs {
            // A failed send drops the reply sender, so the slot below reads
            // as disconnected and gets the blank-frame treatment.
            let _ = jobs.send(Job { req, reply });
        }
        self.pending.push_back((self.next_t, slot));
        self.next_t += TIME_STEP;
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

impl Drop for PoolScheduler {
    fn drop(&mut self) {
        // Closing the job channel lets idle workers exit; busy ones finish
        // their current frame and find nobody listening for the result.
        self.pending.clear();
        self.jobs.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(queue: Arc<Mutex<Receiver<Job>>>, seed: u64, scale: f64, table: Arc<GlyphTable>) {
    // Each worker owns an independently constructed noise field keyed by the
    // shared seed; duplicating is cheaper than synchronizing, and identical
    // seeds make the workers interchangeable.
    let noise = Perlin3::new(seed);
    loop {
        let job = match queue.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => break,
        };
        let Ok(Job { req, reply }) = job else { break };
        let frame = render_frame(req.width, req.height, scale, req.t, &noise, &table);
        // The consumer may have shut down or given up on this slot.
        let _ = reply.send(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_scene(width: usize, height: usize, seed: u64) -> Scene {
        Scene {
            width,
            height,
            scale: 0.1,
            seed,
            table: Arc::new(GlyphTable::new(" .:-=+*#%@", None)),
        }
    }

    #[test]
    fn pool_output_matches_serial_output_in_order() {
        // Ordering must survive worker completion jitter: the pool's frame
        // sequence has to equal the single-threaded sequence exactly.
        let scene = test_scene(24, 8, 7);
        let mut serial = Scheduler::serial(scene.clone());
        let mut pool = Scheduler::pool(scene, 4, Duration::from_secs(5));
        for i in 0..32 {
            assert_eq!(serial.next_frame(), pool.next_frame(), "frame {i}");
        }
    }

    #[test]
    fn look_ahead_depth_stays_constant() {
        let scene = test_scene(10, 4, 1);
        let Scheduler::Pool(mut pool) =
            Scheduler::pool(scene, 3, Duration::from_secs(5))
        else {
            unreachable!()
        };
        assert_eq!(pool.in_flight(), 3);
        for _ in 0..10 {
            pool.next_frame();
            assert_eq!(pool.in_flight(), 3);
        }
    }

    #[test]
    fn overdue_frame_is_replaced_by_a_blank() {
        // A zero wait cap with a deliberately heavy colored frame: the slot
        // cannot be ready by the time we ask for it.
        let start = crate::glyphs::Rgb::new(255, 17, 17);
        let end = crate::glyphs::Rgb::new(17, 255, 255);
        let scene = Scene {
            width: 600,
            height: 200,
            scale: 0.01,
            seed: 5,
            table: Arc::new(GlyphTable::new(" .:-=+*#%@", Some((start, end)))),
        };
        let mut pool = Scheduler::pool(scene, 1, Duration::ZERO);
        assert_eq!(pool.next_frame(), blank_frame(600, 200));
    }

    #[test]
    fn serial_scheduler_advances_the_time_axis() {
        let mut serial = Scheduler::serial(test_scene(24, 8, 7));
        let first = serial.next_frame();
        let frames: Vec<String> = (0..10).map(|_| serial.next_frame()).collect();
        assert!(frames.iter().any(|f| *f != first));
    }

    #[test]
    fn shutdown_does_not_hang_with_frames_in_flight() {
        let scene = test_scene(80, 24, 9);
        let pool = Scheduler::pool(scene, 4, Duration::from_secs(5));
        // Dropping with a full look-ahead window must return promptly.
        drop(pool);
    }
}
