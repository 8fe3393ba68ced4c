mod tests {
    use myrtio_pixel_bridge::calibration::{ExtractWhite, RgbOnly, WhiteExtraction};
    use myrtio_pixel_bridge::color::{ColorLayout, Pixel, Rgb};

    #[test]
    fn test_rgb_only() {
        assert_eq!(RgbOnly.expand(Rgb::new(1, 2, 3)), Pixel::new(1, 2, 3));
    }

    #[test]
    fn test_extract_white() {
        let white = ExtractWhite::default();
        assert_eq!(
            white.expand(Rgb::new(255, 255, 255)),
            Pixel::with_white(0, 0, 0, 255)
        );
        assert_eq!(
            white.expand(Rgb::new(200, 50, 100)),
            Pixel::with_white(150, 0, 50, 50)
        );
        assert_eq!(white.expand(Rgb::new(0, 10, 20)), Pixel::new(0, 10, 20));
    }

    #[test]
    fn test_extract_white_scaled() {
        let white = ExtractWhite::new(127);
        assert_eq!(
            white.expand(Rgb::new(200, 200, 200)),
            Pixel::with_white(0, 0, 0, 100)
        );
    }

    #[test]
    fn test_wire_bytes() {
        let pixel = Pixel::with_white(1, 2, 3, 4);
        assert_eq!(ColorLayout::Grb.wire_bytes(pixel).as_slice(), &[2, 1, 3]);
        assert_eq!(ColorLayout::Grbw.wire_bytes(pixel).as_slice(), &[2, 1, 3, 4]);
        assert_eq!(
            ColorLayout::DotstarBgr.wire_bytes(pixel).as_slice(),
            &[0xFF, 3, 2, 1]
        );
        assert!(ColorLayout::Grbw.has_white());
        assert!(!ColorLayout::DotstarBgr.has_white());
    }
}
