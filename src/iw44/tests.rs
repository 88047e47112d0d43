#[cfg(test)]
mod tests {
    use crate::iw44::transform::{rgb_to_ycbcr_planes, ycbcr_to_rgb};

    fn convert(rgb: [u8; 3]) -> (i8, i8, i8) {
        let (mut y, mut cb, mut cr) = ([0i8; 1], [0i8; 1], [0i8; 1]);
        rgb_to_ycbcr_planes(&[rgb], &mut y, &mut cb, &mut cr);
        (y[0], cb[0], cr[0])
    }

    #[test]
    fn test_rgb_to_ycbcr_primaries() {
        assert_eq!(convert([255, 0, 0]), (-50, -44, 118), "pure red");
        assert_eq!(convert([0, 255, 0]), (27, -89, -103), "pure green");
        assert_eq!(convert([0, 0, 255]), (-106, 127, -15), "pure blue");
    }

    #[test]
    fn test_rgb_to_ycbcr_white() {
        let (y, cb, cr) = convert([255, 255, 255]);
        assert_eq!(y, 127);
        assert!(cb.abs() <= 1 && cr.abs() <= 1);
    }

    #[test]
    fn test_ycbcr_to_rgb_neutral() {
        assert_eq!(ycbcr_to_rgb(0, 0, 0), [128, 128, 128]);
        assert_eq!(ycbcr_to_rgb(-128, 0, 0), [0, 0, 0]);
        assert_eq!(ycbcr_to_rgb(127, 0, 0), [255, 255, 255]);
    }
}

#[cfg(test)]
mod integration_tests {
    use crate::iw44::{ChunkLimits, CrcbMode, EncoderParams, IWDecoder, IWEncoder};
    use crate::utils::error::Iw44Error;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn checker(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| Luma([if (x / 4 + y / 4) % 2 == 0 { 40 } else { 210 }]))
    }

    #[test]
    fn first_chunk_carries_full_header() {
        let mut enc = IWEncoder::from_gray(&checker(300, 20), None, EncoderParams::default()).unwrap();
        let (chunk, more) = enc.encode_chunk(&ChunkLimits::slices(5)).unwrap();
        assert!(more);
        assert_eq!(&chunk[..9], &[0, 5, 0x81, 2, 0x01, 0x2c, 0, 20, 0x80]);

        let (chunk, _) = enc.encode_chunk(&ChunkLimits::slices(12)).unwrap();
        assert_eq!(&chunk[..2], &[1, 7]);
    }

    #[test]
    fn chroma_delay_byte_follows_mode() {
        let img = RgbImage::from_pixel(8, 8, Rgb([200, 10, 90]));
        let expected = [
            (CrcbMode::Half, 1u8, 0x0a),
            (CrcbMode::Normal, 1, 0x8a),
            (CrcbMode::Full, 1, 0x80),
            (CrcbMode::None, 0x81, 0x80),
        ];
        for (mode, major, delay) in expected {
            let params = EncoderParams {
                crcb_mode: mode,
                ..EncoderParams::default()
            };
            let mut enc = IWEncoder::from_rgb(&img, None, params).unwrap();
            let (chunk, _) = enc.encode_chunk(&ChunkLimits::slices(1)).unwrap();
            assert_eq!((chunk[2], chunk[8]), (major, delay), "{mode:?}");
        }
    }

    #[test]
    fn unbounded_chunk_is_a_logic_error() {
        let mut enc = IWEncoder::from_gray(&checker(16, 16), None, EncoderParams::default()).unwrap();
        assert!(matches!(
            enc.encode_chunk(&ChunkLimits::default()),
            Err(Iw44Error::Logic(_))
        ));
        assert_eq!(enc.slices(), 0);
    }

    #[test]
    fn decoder_counts_slices_and_survives_close() {
        let img = checker(40, 24);
        let mut enc = IWEncoder::from_gray(&img, None, EncoderParams::default()).unwrap();
        let mut dec = IWDecoder::new();
        let (c1, _) = enc.encode_chunk(&ChunkLimits::slices(30)).unwrap();
        let (c2, _) = enc.encode_chunk(&ChunkLimits::slices(50)).unwrap();
        assert_eq!(dec.decode_chunk(&c1).unwrap(), 30);
        assert_eq!(dec.decode_chunk(&c2).unwrap(), 50);
        assert_eq!((dec.width(), dec.height(), dec.is_color()), (40, 24, false));

        let before = dec.get_gray().unwrap();
        dec.close_codec();
        assert_eq!(dec.get_gray().unwrap(), before);
        let (c3, _) = enc.encode_chunk(&ChunkLimits::slices(60)).unwrap();
        assert!(matches!(dec.decode_chunk(&c3), Err(Iw44Error::Logic(_))));

        dec.reset();
        assert_eq!(dec.width(), 0);
        assert!(dec.get_gray().is_err());
    }

    #[test]
    fn encoder_reset_replays_identical_chunks() {
        let mut enc = IWEncoder::from_gray(&checker(33, 33), None, EncoderParams::default()).unwrap();
        let (first, _) = enc.encode_chunk(&ChunkLimits::slices(20)).unwrap();
        enc.encode_chunk(&ChunkLimits::slices(40)).unwrap();
        enc.reset();
        let (again, _) = enc.encode_chunk(&ChunkLimits::slices(20)).unwrap();
        assert_eq!(first, again);
        assert!(enc.memory_usage() > 0);
    }
}
