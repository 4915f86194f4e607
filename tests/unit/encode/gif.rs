use std::io::Cursor;

use image::AnimationDecoder;
use image::codecs::gif::GifDecoder;

use super::*;

fn solid(w: u32, h: u32, px: [u8; 4]) -> FrameRGBA {
    FrameRGBA {
        width: w,
        height: h,
        data: px.repeat((w * h) as usize),
        premultiplied: true,
    }
}

fn cfg(frames: usize, fps: f64) -> SinkConfig {
    SinkConfig {
        width: 4,
        height: 3,
        fps,
        frame_count: frames,
    }
}

#[test]
fn writes_looping_animation_with_fps_delay() {
    let mut out = Vec::new();
    {
        let mut sink = GifSink::new(&mut out, GifOpts::default());
        sink.begin(cfg(3, 10.0)).unwrap();
        sink.push_frame(0, &solid(4, 3, [255, 0, 0, 255])).unwrap();
        sink.push_frame(1, &solid(4, 3, [0, 255, 0, 255])).unwrap();
        sink.push_frame(2, &solid(4, 3, [0, 0, 255, 255])).unwrap();
        sink.end().unwrap();
    }

    assert!(out.starts_with(b"GIF89a"));
    assert_eq!(out.last(), Some(&0x3b));
    assert!(out.windows(11).any(|w| w == b"NETSCAPE2.0"));

    let decoder = GifDecoder::new(Cursor::new(&out)).unwrap();
    let frames = decoder.into_frames().collect_frames().unwrap();
    assert_eq!(frames.len(), 3);
    for f in &frames {
        let (num, den) = f.delay().numer_denom_ms();
        assert_eq!(num / den, 100);
        assert_eq!(f.buffer().dimensions(), (4, 3));
    }
    let first = frames[0].buffer().get_pixel(1, 1).0;
    assert!(first[0] > 200 && first[1] < 50 && first[2] < 50);
}

#[test]
fn frame_delay_rounds_to_whole_milliseconds() {
    assert_eq!(cfg(1, 12.0).frame_delay_ms(), 83);
    assert_eq!(cfg(1, 10.0).frame_delay_ms(), 100);
    assert_eq!(cfg(1, 60.0).frame_delay_ms(), 17);
}

#[test]
fn single_play_omits_loop_extension() {
    let mut out = Vec::new();
    {
        let opts = GifOpts {
            infinite_loop: false,
            ..GifOpts::default()
        };
        let mut sink = GifSink::new(&mut out, opts);
        sink.begin(cfg(1, 12.0)).unwrap();
        sink.push_frame(0, &solid(4, 3, [0, 0, 0, 255])).unwrap();
        sink.end().unwrap();
    }
    assert!(!out.windows(11).any(|w| w == b"NETSCAPE2.0"));
}

#[test]
fn rejects_misuse() {
    let mut out = Vec::new();
    let mut sink = GifSink::new(&mut out, GifOpts::default());
    assert!(sink.push_frame(0, &solid(4, 3, [0; 4])).is_err());
    assert!(sink.begin(cfg(1, 0.0)).is_err());
    sink.begin(cfg(2, 12.0)).unwrap();
    assert!(sink.begin(cfg(2, 12.0)).is_err());
    assert!(sink.push_frame(0, &solid(2, 2, [0; 4])).is_err());
    sink.push_frame(0, &solid(4, 3, [0; 4])).unwrap();
    assert!(sink.push_frame(0, &solid(4, 3, [0; 4])).is_err());
    sink.end().unwrap();
    assert!(sink.end().is_err());
}
