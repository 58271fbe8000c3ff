//! Recording pipeline from the audio graph to storage.
//!
//! ## Components
//!
//! | Type | Side | Description |
//! |------|------|-------------|
//! | [`RecordQueue`] | producer + consumer | Interleaves channel blocks into a lock-free ring |
//! | [`WavRecorder`] | consumer | Drains the queue into a WAV file, owns the stream |
//!
//! ## Utilities
//!
//! - [`interleave`]: Per-channel blocks to interleaved frames
//! - [`ring`]: Lock-free single-producer single-consumer frame ring
//!
//! ## Contexts
//!
//! [`RecordQueue::update`] runs in the audio update task, once per block
//! tick, and never blocks or fails. [`WavRecorder::process`] runs wherever
//! storage I/O is allowed to take its time. The two only share the queue.

pub mod interleave;
pub mod ring;
pub mod record_queue;
pub mod record_wav;

pub use record_queue::{BlockCounters, RecordQueue, RecordQueueMono, RecordQueueStereo};
pub use record_wav::WavRecorder;
pub use ring::FrameRing;
