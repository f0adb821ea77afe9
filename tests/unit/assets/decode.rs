use std::io::Cursor;

use super::*;

#[test]
fn decode_png_dimensions_and_premul() {
    let src = vec![100u8, 50, 200, 128, 10, 20, 30, 255];
    let img = image::RgbaImage::from_raw(2, 1, src).unwrap();

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let prepared = decode_image(&buf).unwrap();
    assert_eq!((prepared.width, prepared.height), (2, 1));
    assert_eq!(
        prepared.rgba8_premul.as_slice(),
        &[
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128,
            10,
            20,
            30,
            255
        ]
    );
}

#[test]
fn decode_garbage_fails() {
    assert!(decode_image(b"definitely not a png").is_err());
}

#[test]
fn svg_rasterizes_at_intrinsic_size() {
    let svg = br##"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2">
        <rect width="4" height="2" fill="#ff0000"/>
    </svg>"##;
    let img = rasterize_svg(svg).unwrap();
    assert_eq!((img.width, img.height), (4, 2));
    assert_eq!(img.rgba8_premul.len(), 4 * 2 * 4);
    assert_eq!(&img.rgba8_premul[0..4], &[255, 0, 0, 255]);
}

#[test]
fn svg_parse_error_is_reported() {
    assert!(rasterize_svg(b"<svg").is_err());
}
