mod tests {
    use embassy_time::Instant;
    use myrtio_pixel_bridge::stats::{LinkHealth, LinkReport, Statistics};

    fn count(stats: &mut Statistics, total: u32, good: u32, shows: u32) {
        for _ in 0..total {
            stats.increase_total();
        }
        for _ in 0..good {
            stats.increase_good();
        }
        for _ in 0..shows {
            stats.increase_show();
        }
    }

    #[test]
    fn test_report_after_one_second() {
        let mut stats = Statistics::new(Instant::from_millis(0));
        count(&mut stats, 5, 5, 4);

        assert_eq!(stats.update(Instant::from_millis(500), true), None);
        let report = stats.update(Instant::from_millis(1010), true);
        assert_eq!(
            report,
            Some(LinkReport {
                good_frames: 5,
                total_frames: 5,
                shows: 4,
                health: LinkHealth::Stable,
            })
        );
        assert_eq!(stats.last_report(), report);
        assert_eq!(stats.good_frames(), 0);
        assert_eq!(stats.window_start(), Instant::from_millis(1010));
    }

    #[test]
    fn test_rejected_frames_mark_link_lossy() {
        let mut stats = Statistics::new(Instant::from_millis(0));
        count(&mut stats, 10, 6, 6);

        let report = stats.update(Instant::from_millis(1000), true).unwrap();
        assert_eq!(report.health, LinkHealth::Lossy);
    }

    #[test]
    fn test_few_frames_not_reported() {
        let mut stats = Statistics::new(Instant::from_millis(0));
        count(&mut stats, 3, 3, 3);

        assert_eq!(stats.update(Instant::from_millis(1010), true), None);
        assert_eq!(stats.good_frames(), 3);

        // the window overran, counters start over
        assert_eq!(stats.update(Instant::from_millis(1030), true), None);
        assert_eq!(stats.good_frames(), 0);
        assert_eq!(stats.window_start(), Instant::from_millis(1030));
        assert_eq!(stats.last_report(), None);
    }

    #[test]
    fn test_stalled_window_is_dropped() {
        let mut stats = Statistics::new(Instant::from_millis(0));
        count(&mut stats, 20, 20, 20);

        assert_eq!(stats.update(Instant::from_millis(1500), true), None);
        assert_eq!(stats.total_frames(), 0);
    }

    #[test]
    fn test_idle_link() {
        let mut stats = Statistics::new(Instant::from_millis(0));
        count(&mut stats, 5, 5, 5);

        assert_eq!(stats.update(Instant::from_millis(1010), false), None);
        assert_eq!(stats.update(Instant::from_millis(1100), false), None);
        assert_eq!(
            stats.last_report().map(|report| report.health),
            Some(LinkHealth::Idle)
        );
    }

    #[test]
    fn test_frame_start() {
        let mut stats = Statistics::new(Instant::from_millis(3));
        assert_eq!(stats.last_frame_start(), Instant::from_millis(3));
        stats.record_frame_start(Instant::from_millis(7));
        assert_eq!(stats.last_frame_start(), Instant::from_millis(7));
    }
}
