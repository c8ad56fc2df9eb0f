use neswitch::font::*;
use neswitch::pixel::{color, Pixel};

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |h, &b| (h ^ b as u64).wrapping_mul(0x0100_0000_01b3))
}

#[test]
fn sheet_matches_golden_bitmap() {
    let sheet = build_sheet();
    assert_eq!((sheet.width(), sheet.height()), (SHEET_WIDTH, SHEET_HEIGHT));
    assert_eq!(fnv1a(sheet.as_bytes()), 0x62c4_061a_c353_1815);
}

#[test]
fn sheet_is_black_and_white() {
    let sheet = build_sheet();
    let lit = sheet.pixels().iter().filter(|&&p| p == color::WHITE).count();
    assert_eq!(lit, 2004);
    assert!(sheet.pixels().iter().all(|&p| p == color::WHITE || p == color::BLANK));
}

#[test]
fn probe_pixels() {
    let sheet = build_sheet();
    assert_eq!(sheet.pixel(0, 0), Pixel::from_u32(0));
    assert_eq!(sheet.pixel(9, 17), Pixel::from_u32(0xFFFF_FFFF));
    assert_eq!(sheet.pixel(10, 17), Pixel::from_u32(0xFFFF_FFFF));
    assert_eq!(sheet.pixel(12, 16), Pixel::from_u32(0xFFFF_FFFF));
    assert_eq!(sheet.pixel(8, 16), Pixel::from_u32(0));
}

#[test]
fn letter_a_glyph() {
    let sheet = build_sheet();
    let (ox, oy) = glyph_origin('A').unwrap();
    assert_eq!((ox, oy), (8, 16));
    let rows: Vec<String> = (0..GLYPH_SIZE)
        .map(|y| {
            (0..GLYPH_SIZE)
                .map(|x| if sheet.pixel(ox + x, oy + y).a() > 0 { '#' } else { '.' })
                .collect()
        })
        .collect();
    assert_eq!(
        rows,
        [
            "..###...", ".##.##..", "##...##.", "##...##.",
            "#######.", "##...##.", "##...##.", "........",
        ]
    );
}

#[test]
fn decode_is_deterministic() {
    assert_eq!(build_sheet(), build_sheet());
    assert_eq!(sheet(), &build_sheet());
    assert!(std::ptr::eq(sheet(), sheet()));
}

#[test]
fn glyph_origins_cover_printable_ascii() {
    assert_eq!(glyph_origin(' '), Some((0, 0)));
    assert_eq!(glyph_origin('/'), Some((15 * GLYPH_SIZE, 0)));
    assert_eq!(glyph_origin('0'), Some((0, GLYPH_SIZE)));
    assert_eq!(glyph_origin('\x7f'), Some((15 * GLYPH_SIZE, 5 * GLYPH_SIZE)));
    assert_eq!(glyph_origin('\n'), None);
    assert_eq!(glyph_origin('é'), None);
}
