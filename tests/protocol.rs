mod tests {
    use embassy_time::Instant;
    use myrtio_pixel_bridge::calibration::ExtractWhite;
    use myrtio_pixel_bridge::color::Pixel;
    use myrtio_pixel_bridge::error::Error;
    use myrtio_pixel_bridge::output::RenderOutcome;
    use myrtio_pixel_bridge::protocol::{
        DecodeEvent, FrameDecoder, MAX_LED_COUNT, PixelSink, ProtocolState, header_crc,
    };
    use myrtio_pixel_bridge::stats::{LinkHealth, LinkReport, Statistics};

    #[derive(Default)]
    struct RecordingSink {
        led_count: usize,
        max_leds: Option<usize>,
        configured: Vec<usize>,
        pixels: Vec<(usize, Pixel)>,
        renders: usize,
    }

    impl PixelSink for RecordingSink {
        fn led_count(&self) -> usize {
            self.led_count
        }

        fn configure(&mut self, led_count: usize) -> myrtio_pixel_bridge::Result<()> {
            if let Some(max) = self.max_leds.filter(|&max| led_count > max) {
                return Err(Error::TooManyLeds {
                    requested: led_count,
                    max,
                });
            }
            self.configured.push(led_count);
            self.led_count = led_count;
            Ok(())
        }

        fn set_pixel(&mut self, index: usize, pixel: Pixel) -> bool {
            self.pixels.push((index, pixel));
            index + 1 < self.led_count
        }

        fn request_render(&mut self, _now: Instant) -> RenderOutcome {
            self.renders += 1;
            RenderOutcome::Started
        }
    }

    fn frame(pixels: &[[u8; 3]]) -> Vec<u8> {
        let count = u16::try_from(pixels.len() - 1).unwrap();
        let [hi, lo] = count.to_be_bytes();
        let mut bytes = b"Ada".to_vec();
        bytes.extend([hi, lo, header_crc(hi, lo)]);
        for pixel in pixels {
            bytes.extend_from_slice(pixel);
        }
        bytes
    }

    fn header(led_count: usize) -> Vec<u8> {
        let count = u16::try_from(led_count - 1).unwrap();
        let [hi, lo] = count.to_be_bytes();
        vec![b'A', b'd', b'a', hi, lo, header_crc(hi, lo)]
    }

    struct Harness {
        decoder: FrameDecoder,
        sink: RecordingSink,
        stats: Statistics,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                decoder: FrameDecoder::new(),
                sink: RecordingSink::default(),
                stats: Statistics::new(Instant::from_millis(0)),
            }
        }

        fn feed(&mut self, bytes: &[u8]) -> Vec<DecodeEvent> {
            bytes
                .iter()
                .map(|&byte| {
                    self.decoder
                        .feed(byte, &mut self.sink, &mut self.stats, Instant::from_millis(1))
                })
                .collect()
        }
    }

    fn completed(events: &[DecodeEvent]) -> usize {
        events
            .iter()
            .filter(|event| matches!(event, DecodeEvent::FrameComplete { .. }))
            .count()
    }

    #[test]
    fn test_single_frame() {
        let mut harness = Harness::new();
        let events = harness.feed(&frame(&[[1, 2, 3], [4, 5, 6]]));

        assert_eq!(completed(&events), 1);
        assert_eq!(
            events.last(),
            Some(&DecodeEvent::FrameComplete {
                render: RenderOutcome::Started,
                report: None
            })
        );
        assert_eq!(harness.sink.configured, vec![2]);
        assert_eq!(
            harness.sink.pixels,
            vec![(0, Pixel::new(1, 2, 3)), (1, Pixel::new(4, 5, 6))]
        );
        assert_eq!(harness.sink.renders, 1);
        assert_eq!(harness.decoder.state(), ProtocolState::HeaderA);
        assert_eq!(harness.stats.total_frames(), 1);
        assert_eq!(harness.stats.good_frames(), 1);
        assert_eq!(harness.stats.last_frame_start(), Instant::from_millis(1));
    }

    #[test]
    fn test_resync_after_noise() {
        let noise: [&[u8]; 5] = [
            &[0x00, 0xFF, 0x13, 0x37],
            &[b'A', b'A', b'A'],
            &[b'A', b'd'],
            &[b'A', b'd', b'x', b'a', b'd'],
            &[0x41, 0x64, 0x41, 0x00, b'd', b'a'],
        ];

        for prefix in noise {
            let mut harness = Harness::new();
            let mut bytes = prefix.to_vec();
            bytes.extend(frame(&[[9, 8, 7], [6, 5, 4], [3, 2, 1]]));

            let events = harness.feed(&bytes);
            assert_eq!(completed(&events), 1, "noise {:?}", prefix);
            assert_eq!(harness.sink.pixels.len(), 3, "noise {:?}", prefix);
            assert_eq!(harness.sink.pixels[2], (2, Pixel::new(3, 2, 1)));
        }
    }

    #[test]
    fn test_sync_lost_is_reported() {
        let mut harness = Harness::new();
        let events = harness.feed(b"Adx");
        assert_eq!(events[2], DecodeEvent::SyncLost);
        assert_eq!(harness.decoder.state(), ProtocolState::HeaderA);
        assert_eq!(harness.stats.total_frames(), 0);
    }

    #[test]
    fn test_back_to_back_frames_with_trailer() {
        let mut harness = Harness::new();
        let mut bytes = Vec::new();
        for round in 0..4u8 {
            bytes.extend(frame(&[[round, 0, 0], [0, round, 0]]));
            // host-side checksum bytes after the payload
            bytes.extend([0x12, 0x34, 0x41]);
        }

        let events = harness.feed(&bytes);
        assert_eq!(completed(&events), 4);
        assert_eq!(harness.sink.renders, 4);
        assert_eq!(harness.sink.configured, vec![2]);
        assert_eq!(harness.stats.good_frames(), 4);
    }

    #[test]
    fn test_trailer_reading_as_magic() {
        let mut harness = Harness::new();
        let mut bytes = frame(&[[1, 1, 1]]);
        bytes.extend(b"Ada");
        bytes.extend(frame(&[[2, 2, 2]]));

        let events = harness.feed(&bytes);
        assert_eq!(completed(&events), 2);
        assert_eq!(harness.sink.pixels[1], (0, Pixel::new(2, 2, 2)));
        assert_eq!(harness.stats.total_frames(), 2);
        assert_eq!(harness.stats.good_frames(), 2);
    }

    #[test]
    fn test_header_crc_gate() {
        let mut harness = Harness::new();
        let mut bytes = frame(&[[1, 2, 3]]);
        bytes[5] ^= 0x01;

        let events = harness.feed(&bytes[..6]);
        assert_eq!(events[5], DecodeEvent::HeaderRejected);
        assert_eq!(harness.decoder.state(), ProtocolState::HeaderA);

        harness.feed(&bytes[6..]);
        assert!(harness.sink.pixels.is_empty());
        assert!(harness.sink.configured.is_empty());
        assert_eq!(harness.sink.renders, 0);
        assert_eq!(harness.stats.total_frames(), 1);
        assert_eq!(harness.stats.good_frames(), 0);
    }

    #[test]
    fn test_oversized_frame_rejected() {
        for led_count in [MAX_LED_COUNT + 1, 0x10000] {
            let mut harness = Harness::new();
            let events = harness.feed(&header(led_count));
            assert_eq!(events[5], DecodeEvent::Oversized { led_count });
            assert_eq!(harness.decoder.state(), ProtocolState::HeaderA);

            harness.feed(&[1, 2, 3, 4, 5, 6]);
            assert!(harness.sink.pixels.is_empty());
            assert!(harness.sink.configured.is_empty());
        }
    }

    #[test]
    fn test_output_rejection_reported() {
        let mut harness = Harness::new();
        harness.sink.max_leds = Some(2);

        let events = harness.feed(&header(3));
        assert_eq!(
            events[5],
            DecodeEvent::OutputRejected {
                led_count: 3,
                error: Error::TooManyLeds {
                    requested: 3,
                    max: 2
                }
            }
        );
        assert_eq!(harness.decoder.state(), ProtocolState::HeaderA);

        harness.feed(&[1, 2, 3, 4, 5, 6, 7, 8, 9]);
        assert!(harness.sink.pixels.is_empty());
        assert_eq!(harness.sink.renders, 0);
    }

    #[test]
    fn test_frame_closes_statistics_window() {
        let mut decoder = FrameDecoder::new();
        let mut sink = RecordingSink::default();
        let mut stats = Statistics::new(Instant::from_millis(0));
        let mut feed = |millis: u64| {
            frame(&[[1, 2, 3]])
                .into_iter()
                .map(|byte| decoder.feed(byte, &mut sink, &mut stats, Instant::from_millis(millis)))
                .last()
        };

        for millis in [0, 100, 200] {
            assert_eq!(
                feed(millis),
                Some(DecodeEvent::FrameComplete {
                    render: RenderOutcome::Started,
                    report: None
                })
            );
        }

        let report = LinkReport {
            good_frames: 4,
            total_frames: 4,
            shows: 4,
            health: LinkHealth::Stable,
        };
        assert_eq!(
            feed(1000),
            Some(DecodeEvent::FrameComplete {
                render: RenderOutcome::Started,
                report: Some(report)
            })
        );
        assert_eq!(stats.good_frames(), 0);
        assert_eq!(stats.last_report(), Some(report));
    }

    #[test]
    fn test_largest_frame_accepted() {
        let mut harness = Harness::new();
        let events = harness.feed(&header(MAX_LED_COUNT));
        assert_eq!(events[5], DecodeEvent::Pending);
        assert_eq!(harness.decoder.state(), ProtocolState::Red);
        assert_eq!(harness.sink.configured, vec![MAX_LED_COUNT]);
    }

    #[test]
    fn test_reconfigures_only_on_count_change() {
        let mut harness = Harness::new();
        harness.feed(&frame(&[[1, 1, 1], [2, 2, 2]]));
        harness.feed(&frame(&[[1, 1, 1], [2, 2, 2]]));
        harness.feed(&frame(&[[1, 1, 1]]));
        harness.feed(&frame(&[[1, 1, 1]]));
        assert_eq!(harness.sink.configured, vec![2, 1]);
        assert_eq!(harness.sink.renders, 4);
    }

    #[test]
    fn test_partial_frame_then_resync() {
        let mut harness = Harness::new();
        harness.feed(&header(3));
        harness.feed(&[1, 2, 3, 4]);
        assert_eq!(harness.decoder.current_led(), 1);
        assert_eq!(harness.decoder.state(), ProtocolState::Green);

        harness.decoder.resync();
        let events = harness.feed(&frame(&[[7, 7, 7], [8, 8, 8], [9, 9, 9]]));
        assert_eq!(completed(&events), 1);
        assert_eq!(harness.sink.pixels.last(), Some(&(2, Pixel::new(9, 9, 9))));
    }

    #[test]
    fn test_payload_checksum_kept() {
        let mut harness = Harness::new();
        assert_eq!(harness.decoder.payload_checksum(), None);

        harness.feed(&frame(&[[1, 2, 3]]));
        let checksum = harness.decoder.payload_checksum().unwrap();
        assert_eq!(checksum.fletcher1, 6);
        assert_eq!(checksum.fletcher2, 10);
        assert_eq!(checksum.fletcher_ext, 5);
    }

    #[test]
    fn test_white_extraction() {
        let mut decoder = FrameDecoder::with_white_extraction(ExtractWhite::default());
        let mut sink = RecordingSink::default();
        let mut stats = Statistics::new(Instant::from_millis(0));

        for byte in frame(&[[10, 20, 30]]) {
            decoder.feed(byte, &mut sink, &mut stats, Instant::from_millis(0));
        }
        assert_eq!(sink.pixels, vec![(0, Pixel::with_white(0, 10, 20, 10))]);
    }
}
