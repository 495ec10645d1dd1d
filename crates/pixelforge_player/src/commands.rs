// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player subcommands.
//!
//! Each command loads a reel (`.pxpr`) or a canvas animation (`.ron` with its
//! `.pxstore` sidecar) and works on it headlessly:
//! - `inspect` prints a JSON summary
//! - `simulate` runs the scheduler on a manual clock and reports frame changes
//! - `export-frames` writes frames as PNG files

use crate::error::{PlayerError, PlayerResult};
use pixelforge_timeline::audio::NullAudioBackend;
use pixelforge_timeline::reel_io::{self, REEL_EXTENSION};
use pixelforge_timeline::scheduler::FrameSource;
use pixelforge_timeline::stage::render_stage_frame;
use pixelforge_timeline::{
    AnimationPlayer, AudioTrackCollection, CanvasAnimation, Layer, ManualClock, MemoryDocument,
    PixelBuffer, PlaybackScheduler, TileAnimationReel, TimelineSettings,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A loaded input file
pub enum Input {
    /// Tile animation reel
    Reel(TileAnimationReel),
    /// Canvas animation with its pixel store
    Animation(CanvasAnimation),
}

impl Input {
    /// Load by file extension
    pub fn load(path: &Path) -> PlayerResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(REEL_EXTENSION) => Ok(Self::Reel(reel_io::load_reel(path)?)),
            Some("ron") => Ok(Self::Animation(CanvasAnimation::load(path)?)),
            _ => Err(PlayerError::UnsupportedInput(path.to_path_buf())),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Reel(reel) => &reel.name,
            Self::Animation(animation) => &animation.name,
        }
    }
}

#[derive(Serialize)]
struct ReelSummary<'a> {
    kind: &'static str,
    name: &'a str,
    frame_width: u32,
    frame_height: u32,
    looping: bool,
    ping_pong: bool,
    frame_count: usize,
    total_duration_ms: i64,
    self_contained: bool,
    frames: Vec<ReelFrameSummary>,
}

#[derive(Serialize)]
struct ReelFrameSummary {
    tile: [i32; 2],
    duration_ms: i32,
    embedded: bool,
}

#[derive(Serialize)]
struct AnimationSummary<'a> {
    kind: &'static str,
    name: &'a str,
    frame_count: usize,
    fps: u32,
    looping: bool,
    ping_pong: bool,
    snapshots: usize,
    layers: Vec<LayerSummary<'a>>,
    stage_enabled: bool,
    stage_keyframes: Vec<usize>,
}

#[derive(Serialize)]
struct LayerSummary<'a> {
    name: &'a str,
    keyframes: Vec<usize>,
}

/// Print a JSON description of the input
pub fn inspect(input: &Input) -> PlayerResult<String> {
    let json = match input {
        Input::Reel(reel) => serde_json::to_string_pretty(&ReelSummary {
            kind: "reel",
            name: &reel.name,
            frame_width: reel.frame_width,
            frame_height: reel.frame_height,
            looping: reel.looping,
            ping_pong: reel.ping_pong,
            frame_count: reel.frame_count(),
            total_duration_ms: reel.total_duration_ms(),
            self_contained: reel.is_self_contained(),
            frames: reel
                .frames
                .iter()
                .enumerate()
                .map(|(i, f)| ReelFrameSummary {
                    tile: [f.tile_x, f.tile_y],
                    duration_ms: reel.frame_duration_ms(i),
                    embedded: f.embedded_pixels.is_some(),
                })
                .collect(),
        })?,
        Input::Animation(animation) => serde_json::to_string_pretty(&AnimationSummary {
            kind: "animation",
            name: &animation.name,
            frame_count: animation.frame_count(),
            fps: animation.fps(),
            looping: animation.looping,
            ping_pong: animation.ping_pong,
            snapshots: animation.store().len(),
            layers: animation
                .tracks()
                .iter()
                .map(|t| LayerSummary {
                    name: &t.layer_name,
                    keyframes: t.keyframe_frames(),
                })
                .collect(),
            stage_enabled: animation.stage.enabled,
            stage_keyframes: animation.stage_track.keyframes().iter().map(|k| k.frame_index).collect(),
        })?,
    };
    Ok(json)
}

/// One frame change seen during simulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulatedFrame {
    /// Clock time of the tick
    pub time_ms: f64,
    /// Frame shown after the tick
    pub frame: usize,
}

/// Simulation knobs
#[derive(Debug, Clone, Copy)]
pub struct SimulateOptions {
    /// How long to run
    pub duration_ms: f64,
    /// Clock step between ticks
    pub tick_ms: f64,
    /// Force ping-pong on or off
    pub ping_pong: Option<bool>,
    /// Force looping on or off
    pub looping: Option<bool>,
}

/// Play the input on a manual clock and record every frame change.
///
/// Animations are played through [`AnimationPlayer`] onto a document rebuilt
/// from their tracks; reels drive the scheduler directly.
pub fn simulate(input: Input, options: SimulateOptions, settings: &TimelineSettings) -> PlayerResult<Vec<SimulatedFrame>> {
    let tick_ms = options.tick_ms.max(1.0);
    let clock = ManualClock::new();
    let scheduler = PlaybackScheduler::with_clock(Box::new(clock.clone()));
    let mut frames = vec![SimulatedFrame { time_ms: 0.0, frame: 0 }];

    match input {
        Input::Reel(mut reel) => {
            reel.ping_pong = options.ping_pong.unwrap_or(reel.ping_pong);
            reel.looping = options.looping.unwrap_or(reel.looping);
            let mut scheduler = scheduler;
            if !scheduler.play(&reel) {
                return Ok(Vec::new());
            }
            let mut elapsed = 0.0;
            while elapsed < options.duration_ms {
                clock.advance(tick_ms);
                elapsed += tick_ms;
                let outcome = scheduler.tick(&reel);
                if outcome.changed() {
                    frames.push(SimulatedFrame {
                        time_ms: elapsed,
                        frame: scheduler.current_frame(),
                    });
                }
                if outcome.stopped {
                    break;
                }
            }
        }
        Input::Animation(mut animation) => {
            animation.ping_pong = options.ping_pong.unwrap_or(animation.ping_pong);
            animation.looping = options.looping.unwrap_or(animation.looping);
            let mut doc = document_for(&animation);
            let audio = AudioTrackCollection::new(Arc::new(NullAudioBackend));
            let mut player = AnimationPlayer::new(animation, scheduler, audio);
            player.apply_settings(settings);
            player.seek(0, &mut doc);
            if !player.play() {
                return Ok(Vec::new());
            }
            let mut elapsed = 0.0;
            while elapsed < options.duration_ms {
                clock.advance(tick_ms);
                elapsed += tick_ms;
                if let Some(update) = player.tick(&mut doc) {
                    if update.apply.has_skips() {
                        tracing::warn!("Frame {} skipped parts of its state: {:?}", update.frame, update.apply);
                    }
                    frames.push(SimulatedFrame {
                        time_ms: elapsed,
                        frame: update.frame,
                    });
                }
                if !player.scheduler.is_playing() {
                    break;
                }
            }
        }
    }
    Ok(frames)
}

/// Default simulation length: one pass over every frame
pub fn one_cycle_ms(input: &Input) -> f64 {
    let source: &dyn FrameSource = match input {
        Input::Reel(reel) => reel,
        Input::Animation(animation) => animation,
    };
    (0..source.frame_count()).map(|f| source.frame_duration_ms(f)).sum()
}

/// Rebuild a canvas-sized document whose layers match the animation's tracks, bottom layer first
pub fn document_for(animation: &CanvasAnimation) -> MemoryDocument {
    let (width, height) = animation.canvas_size();
    let mut doc = MemoryDocument::new(width, height);
    for track in animation.tracks().iter().rev() {
        let mut layer = Layer::raster(track.layer_name.clone(), width, height);
        layer.id = track.layer_id;
        doc.push_layer(layer);
    }
    doc
}

fn write_png(path: &Path, buffer: &PixelBuffer) -> PlayerResult<()> {
    image::save_buffer_with_format(
        path,
        buffer.as_bytes(),
        buffer.width,
        buffer.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )?;
    tracing::debug!("Wrote {:?}", path);
    Ok(())
}

/// Write frames as `<name>_<frame>.png` into `out_dir`.
///
/// Reels export their embedded pixels. Animations are applied frame by frame
/// to a rebuilt document; with the stage enabled the camera view is exported
/// instead of the full canvas. `only` restricts the export to one frame.
pub fn export_frames(input: &Input, out_dir: &Path, only: Option<usize>, settings: &TimelineSettings) -> PlayerResult<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)?;
    let stem = input.name().replace(|c: char| !c.is_alphanumeric() && c != '-', "_");
    let count = match input {
        Input::Reel(reel) => reel.frame_count(),
        Input::Animation(animation) => animation.frame_count(),
    };
    let range = match only {
        Some(frame) if frame >= count => return Err(PlayerError::FrameOutOfRange { frame, count }),
        Some(frame) => frame..frame + 1,
        None => 0..count,
    };

    let mut written = Vec::new();
    match input {
        Input::Reel(reel) => {
            for index in range {
                let Some(pixels) = reel.frames[index].embedded_pixels.as_ref() else {
                    tracing::debug!("Reel frame {} has no embedded pixels; skipped", index);
                    continue;
                };
                let path = out_dir.join(format!("{stem}_{index:03}.png"));
                write_png(&path, pixels)?;
                written.push(path);
            }
        }
        Input::Animation(animation) => {
            let mut doc = document_for(animation);
            for frame in range {
                let report = animation.apply_frame_to_document(&mut doc, frame);
                let canvas = doc.composite().clone();
                let image = if animation.stage.enabled {
                    let state = report.stage.unwrap_or(animation.stage.current);
                    render_stage_frame(&canvas, &animation.stage, &state)
                } else {
                    canvas
                };
                let path = out_dir.join(format!("{stem}_{frame:03}.png"));
                write_png(&path, &image)?;
                written.push(path);
            }
            if settings.onion_skin.enabled {
                tracing::debug!("Onion skin is an editor overlay and is not exported");
            }
        }
    }

    if written.is_empty() {
        return Err(PlayerError::NothingToExport(input.name().to_string()));
    }
    tracing::info!("Exported {} frames of '{}' to {:?}", written.len(), input.name(), out_dir);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pixelforge_timeline::{DocumentModel, ReelFrame};

    fn reel(ping_pong: bool) -> TileAnimationReel {
        let mut reel = TileAnimationReel::new("Blink", 2, 2);
        for x in 0..4 {
            reel.add_frame(ReelFrame::new(x, 0).with_duration(100));
        }
        reel.ping_pong = ping_pong;
        reel
    }

    fn options(duration_ms: f64) -> SimulateOptions {
        SimulateOptions {
            duration_ms,
            tick_ms: 16.0,
            ping_pong: None,
            looping: None,
        }
    }

    #[test]
    fn test_simulate_reel_ping_pong() {
        let frames = simulate(Input::Reel(reel(true)), options(700.0), &TimelineSettings::default()).unwrap();
        let order: Vec<usize> = frames.iter().map(|f| f.frame).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 2, 1, 0, 1]);
    }

    #[test]
    fn test_simulate_stops_without_loop() {
        let mut opts = options(10_000.0);
        opts.looping = Some(false);
        let frames = simulate(Input::Reel(reel(false)), opts, &TimelineSettings::default()).unwrap();
        let order: Vec<usize> = frames.iter().map(|f| f.frame).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 0]);
    }

    #[test]
    fn test_one_cycle_covers_all_frames() {
        assert!((one_cycle_ms(&Input::Reel(reel(false))) - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_inspect_reel_json() {
        let json = inspect(&Input::Reel(reel(false))).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["kind"], "reel");
        assert_eq!(value["frame_count"], 4);
        assert_eq!(value["total_duration_ms"], 400);
    }

    #[test]
    fn test_export_reel_needs_pixels() {
        let dir = std::env::temp_dir().join(format!("pixelforge-export-{}", std::process::id()));
        let settings = TimelineSettings::default();
        let mut input = reel(false);
        assert!(matches!(
            export_frames(&Input::Reel(input.clone()), &dir, None, &settings),
            Err(PlayerError::NothingToExport(_))
        ));

        input.frames[1].embedded_pixels = Some(PixelBuffer::filled(2, 2, [255, 0, 0, 255]));
        let written = export_frames(&Input::Reel(input), &dir, None, &settings).unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("Blink_001.png"));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_document_matches_tracks() {
        let mut source = MemoryDocument::new(4, 4);
        let bottom = source.push_layer(Layer::raster("Paper", 4, 4));
        let top = source.push_layer(Layer::raster("Ink", 4, 4));
        let mut animation = CanvasAnimation::new("Doc", 2, 12);
        animation.sync_layers(&source);

        let doc = document_for(&animation);
        let ids: Vec<_> = doc.layers.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![bottom, top]);
        assert_eq!((doc.width, doc.height), (4, 4));
    }

    #[test]
    fn test_cropped_stage_still_applies_canvas_pixels() {
        let mut source = MemoryDocument::new(8, 8);
        let ink = source.push_layer(Layer::raster("Ink", 8, 8));
        source.layer_mut(ink).unwrap().pixels = PixelBuffer::filled(8, 8, [255, 0, 0, 255]);
        let mut animation = CanvasAnimation::for_document("Crop", &source, &TimelineSettings::default());
        animation.stage.viewport_width = 4;
        animation.stage.viewport_height = 4;
        animation.capture_keyframe(&source, ink, 0).unwrap();

        let mut doc = document_for(&animation);
        let report = animation.apply_frame_to_document(&mut doc, 0);
        assert_eq!(report.size_mismatches, 0);
        assert_eq!(doc.layer(ink).unwrap().pixels.pixel(0, 0), Some([255, 0, 0, 255]));
    }
}
