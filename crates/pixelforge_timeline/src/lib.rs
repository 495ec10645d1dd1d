// SPDX-License-Identifier: MIT OR Apache-2.0
//! Animation timeline engine for PixelForge.
//!
//! This crate provides frame-based animation for pixel-art documents:
//! - Layer keyframes with pixel snapshots held in a shared store
//! - Stage (camera) keyframes with eased interpolation
//! - Tile animation reels and their binary file format
//! - Sub-routines that embed a reel inside a canvas timeline
//! - Reference audio tracks synchronised to the frame clock
//! - Playback scheduling with loop and ping-pong policies
//! - Keyframe copy and paste
//!
//! ## Architecture
//!
//! The timeline is built on:
//! - Sorted per-layer tracks with hold semantics
//! - A document seam ([`DocumentModel`]) the host implements
//! - An audio seam ([`AudioBackend`]) the host implements
//! - A clock seam ([`Clock`]) so playback is testable

pub mod error;
pub mod pixels;
pub mod store;
pub mod interpolation;
pub mod effect;
pub mod document;
pub mod events;
pub mod keyframe;
pub mod stage;
pub mod track;
pub mod reel;
pub mod reel_io;
pub mod subroutine;
pub mod audio;
pub mod scheduler;
pub mod clipboard;
pub mod onion;
pub mod config;
pub mod canvas;
pub mod player;

pub use error::{TimelineError, TimelineResult};
pub use pixels::PixelBuffer;
pub use store::{KeyframeStore, PixelDataId};
pub use interpolation::{Easing, Lerp};
pub use effect::{EffectKeyframe, EffectKind, LayerEffect, PropertyValue};
pub use document::{BlendMode, DocumentModel, Layer, LayerId, LayerKind, MemoryDocument, TileSource};
pub use events::{EventEmitter, SubscriptionId};
pub use keyframe::{LayerKeyframe, StageKeyframe};
pub use stage::{StageSettings, StageState};
pub use track::{LayerTrack, StageTrack, TrackId};
pub use reel::{ReelFrame, ReelId, TileAnimationReel, TileAnimationState};
pub use reel_io::{load_reel, save_reel};
pub use subroutine::{AnimationSubRoutineState, SubRoutine, SubRoutineEvent, SubRoutineId, SubRoutineTransform};
pub use audio::{
    AudioBackend, AudioEvent, AudioPlayback, AudioTrack, AudioTrackCollection, AudioTrackId,
    NullAudioBackend, WaveformPoint,
};
pub use scheduler::{
    Clock, Direction, FrameSource, ManualClock, PlaybackScheduler, PlaybackState, SchedulerEvent,
    SystemClock,
};
pub use clipboard::KeyframeClipboard;
pub use onion::{OnionFrame, OnionSkinSettings};
pub use config::TimelineSettings;
pub use canvas::{ApplyReport, CanvasAnimation, TrackEvent};
pub use player::{AnimationPlayer, FrameUpdate};
