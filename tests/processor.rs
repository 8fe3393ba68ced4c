mod tests {
    use embassy_time::Instant;
    use myrtio_pixel_bridge::Transmitter;
    use myrtio_pixel_bridge::output::{
        LedFamily, LedOutput, NeopixelBus, RenderOutcome, SegmentSplit, TransmitCompletion,
    };
    use myrtio_pixel_bridge::processor::FrameProcessor;
    use myrtio_pixel_bridge::protocol::header_crc;
    use myrtio_pixel_bridge::queue::FrameQueue;

    #[derive(Default)]
    struct Recorder {
        frames: Vec<Vec<u8>>,
    }

    impl Transmitter for Recorder {
        fn start(&mut self, frame: &[u8]) {
            self.frames.push(frame.to_vec());
        }
    }

    type Bus<'a> = NeopixelBus<'a, Recorder, 64>;

    fn frame(greens: &[u8]) -> Vec<u8> {
        let count = u16::try_from(greens.len() - 1).unwrap();
        let [hi, lo] = count.to_be_bytes();
        let mut bytes = b"Ada".to_vec();
        bytes.extend([hi, lo, header_crc(hi, lo)]);
        for &green in greens {
            bytes.extend([0, green, 0]);
        }
        bytes
    }

    fn at(micros: u64) -> Instant {
        Instant::from_micros(micros)
    }

    #[test]
    fn test_frame_through_queue() {
        let completion = TransmitCompletion::new();
        let output =
            LedOutput::single(Bus::new(LedFamily::Ws2812, Recorder::default(), &completion), 16);
        let mut processor = FrameProcessor::new(output, at(0));
        let mut queue = FrameQueue::<128>::new();
        let (mut producer, mut consumer) = queue.split();

        producer.push_slice(&frame(&[1, 2]));
        let summary = processor.process(&mut consumer, at(10));
        assert_eq!(summary.bytes, 12);
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.render, RenderOutcome::Started);
        assert_eq!(summary.report, None);

        assert_eq!(processor.output().led_count(), 2);
        assert_eq!(
            processor.output().primary().transmitter().frames,
            vec![vec![0, 0, 0, 1, 0, 0, 0, 2]]
        );
        assert_eq!(processor.stats().good_frames(), 1);
        assert_eq!(processor.stats().shows(), 1);
    }

    #[test]
    fn test_deferred_render_retried_without_data() {
        let completion = TransmitCompletion::new();
        let output =
            LedOutput::single(Bus::new(LedFamily::Ws2812, Recorder::default(), &completion), 16);
        let mut processor = FrameProcessor::new(output, at(0));
        let mut queue = FrameQueue::<128>::new();
        let (mut producer, mut consumer) = queue.split();

        producer.push_slice(&frame(&[1]));
        producer.push_slice(&frame(&[2]));
        producer.push_slice(&frame(&[3]));
        let summary = processor.process(&mut consumer, at(0));
        assert_eq!(summary.frames, 3);
        assert_eq!(summary.render, RenderOutcome::Busy);
        assert!(processor.has_pending_render());

        completion.complete(at(40));
        let summary = processor.process(&mut consumer, at(100));
        assert_eq!(summary.bytes, 0);
        assert_eq!(
            summary.render,
            RenderOutcome::Settling {
                ready_at: at(40 + 650)
            }
        );

        let summary = processor.process(&mut consumer, at(700));
        assert_eq!(summary.render, RenderOutcome::Started);
        assert!(!processor.has_pending_render());

        let frames = &processor.output().primary().transmitter().frames;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1], vec![0, 0, 0, 3]);
        assert_eq!(processor.stats().good_frames(), 3);
        assert_eq!(processor.stats().shows(), 2);
    }

    #[test]
    fn test_split_strip_through_decoder() {
        let first = TransmitCompletion::new();
        let second = TransmitCompletion::new();
        let output = LedOutput::split(
            Bus::new(LedFamily::Ws2812, Recorder::default(), &first),
            Bus::new(LedFamily::Ws2812, Recorder::default(), &second),
            16,
            SegmentSplit {
                start_index: 2,
                reversed: true,
            },
        );
        let mut processor = FrameProcessor::new(output, at(0));

        for byte in frame(&[10, 20, 30, 40, 50]) {
            processor.process_byte(byte, at(0));
        }

        let output = processor.output();
        assert_eq!(
            output.primary().transmitter().frames[0],
            vec![0, 0, 0, 10, 0, 0, 0, 20]
        );
        assert_eq!(
            output.secondary().unwrap().transmitter().frames[0],
            vec![0, 0, 0, 50, 0, 0, 0, 40, 0, 0, 0, 30]
        );
    }

    #[test]
    fn test_reports_link_statistics() {
        let completion = TransmitCompletion::new();
        let output =
            LedOutput::single(Bus::new(LedFamily::Ws2812, Recorder::default(), &completion), 16);
        let mut processor = FrameProcessor::new(output, at(0));
        let mut queue = FrameQueue::<128>::new();
        let (mut producer, mut consumer) = queue.split();

        for step in 0..5u64 {
            producer.push_slice(&frame(&[1]));
            processor.process(&mut consumer, at(step * 100_000));
            completion.complete(at(step * 100_000 + 50));
        }

        producer.push_slice(&frame(&[2]));
        let summary = processor.process(&mut consumer, at(1_005_000));
        let report = summary.report.unwrap();
        assert_eq!(report.good_frames, 5);
        assert_eq!(report.total_frames, 5);
        assert_eq!(report.shows, 5);
        assert_eq!(processor.stats().good_frames(), 1);
    }

    #[test]
    fn test_window_closed_by_frame_in_same_pass() {
        let completion = TransmitCompletion::new();
        let output =
            LedOutput::single(Bus::new(LedFamily::Ws2812, Recorder::default(), &completion), 16);
        let mut processor = FrameProcessor::new(output, at(0));
        let mut queue = FrameQueue::<128>::new();
        let (mut producer, mut consumer) = queue.split();

        for step in 0..3u64 {
            producer.push_slice(&frame(&[1]));
            let summary = processor.process(&mut consumer, at(step * 100_000));
            assert_eq!(summary.report, None);
            completion.complete(at(step * 100_000 + 50));
        }

        // three frames are too few for a report when the pass starts
        producer.push_slice(&frame(&[2]));
        let summary = processor.process(&mut consumer, at(1_000_000));
        assert_eq!(summary.render, RenderOutcome::Started);
        let report = summary.report.unwrap();
        assert_eq!(report.good_frames, 4);
        assert_eq!(report.total_frames, 4);
        assert_eq!(report.shows, 4);
        assert_eq!(processor.stats().window_start(), at(1_000_000));
    }
}
