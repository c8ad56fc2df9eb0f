//! Built-in 8×8 bitmap font.
//!
//! The glyphs are stored as a 1024-character string: every 4 characters
//! (each offset by `'0'`) encode 24 bits which fill the 128×48 sheet column
//! by column, 48 rows per column, left to right, lowest bit first.
//! Set bits become opaque white, clear bits transparent black.

use std::sync::OnceLock;

use crate::pixel::Pixel;
use crate::sprite::Sprite;

pub const SHEET_WIDTH: i32 = 128;
pub const SHEET_HEIGHT: i32 = 48;
/// Glyph cell edge in pixels.
pub const GLYPH_SIZE: i32 = 8;
/// Glyphs per sheet row.
pub const GLYPHS_PER_ROW: i32 = 16;
/// First character in the sheet (space).
pub const FIRST_CHAR: char = ' ';
/// Last character in the sheet.
pub const LAST_CHAR: char = '\x7f';

const FONT_DATA: [&str; 16] = [
    "?Q`0001oOch0o01o@F40o0<AGD4090LAGD<090@A7ch0?00O7Q`0600>00000000",
    "O000000nOT0063Qo4d8>?7a14Gno94AA4gno94AaOT0>o3`oO400o7QN00000400",
    "Of80001oOg<7O7moBGT7O7lABET024@aBEd714AiOdl717a_=TH013Q>00000000",
    "720D000V?V5oB3Q_HdUoE7a9@DdDE4A9@DmoE4A;Hg]oM4Aj8S4D84@`00000000",
    "OaPT1000Oa`^13P1@AI[?g`1@A=[OdAoHgljA4Ao?WlBA7l1710007l100000000",
    "ObM6000oOfMV?3QoBDD`O7a0BDDH@5A0BDD<@5A0BGeVO5ao@CQR?5Po00000000",
    "Oc``000?Ogij70PO2D]??0Ph2DUM@7i`2DTg@7lh2GUj?0TO0C1870T?00000000",
    "70<4001o?P<7?1QoHg43O;`h@GT0@:@LB@d0>:@hN@L0@?aoN@<0O7ao0000?000",
    "OcH0001SOglLA7mg24TnK7ln24US>0PL24U140PnOgl0>7QgOcH0K71S0000A000",
    "00H00000@Dm1S007@DUSg00?OdTnH7YhOfTL<7Yh@Cl0700?@Ah0300700000000",
    "<008001QL00ZA41a@6HnI<1i@FHLM81M@@0LG81?O`0nC?Y7?`0ZA7Y300080000",
    "O`082000Oh0827mo6>Hn?Wmo?6HnMb11MP08@C11H`08@FP0@@0004@000000000",
    "00P00001Oab00003OcKP0006@6=PMgl<@440MglH@000000`@000001P00000000",
    "Ob@8@@00Ob@8@Ga13R@8Mga172@8?PAo3R@827QoOb@820@0O`0007`0000007P0",
    "O`000P08Od400g`<3V=P0G`673IP0`@3>1`00P@6O`P00g`<O`000GP800000000",
    "?P9PL020O`<`N3R0@E4HC7b0@ET<ATB0@@l6C4B0O`H3N7b0?P01L3R000000020",
];

/// Decode the embedded font into a fresh 128×48 sprite.
pub fn build_sheet() -> Sprite {
    let mut sheet = Sprite::new(SHEET_WIDTH, SHEET_HEIGHT);
    let (mut px, mut py) = (0, 0);

    for chunk in FONT_DATA.iter().flat_map(|line| line.as_bytes().chunks_exact(4)) {
        let bits = chunk
            .iter()
            .fold(0u32, |acc, &sym| acc << 6 | (sym as u32).wrapping_sub(48));

        for i in 0..24 {
            let k = if bits & (1 << i) != 0 { 255 } else { 0 };
            sheet.set_pixel(px, py, Pixel::rgba(k, k, k, k));
            py += 1;
            if py == SHEET_HEIGHT {
                px += 1;
                py = 0;
            }
        }
    }
    sheet
}

/// The process-wide font sheet, decoded on first use.
pub fn sheet() -> &'static Sprite {
    static SHEET: OnceLock<Sprite> = OnceLock::new();
    SHEET.get_or_init(|| {
        log::info!("Building fontsheet...");
        build_sheet()
    })
}

/// Top-left corner of `ch`'s glyph cell on the sheet, or `None` if the
/// character has no glyph.
pub fn glyph_origin(ch: char) -> Option<(i32, i32)> {
    if !(FIRST_CHAR..=LAST_CHAR).contains(&ch) {
        return None;
    }
    let index = ch as i32 - FIRST_CHAR as i32;
    Some((
        (index % GLYPHS_PER_ROW) * GLYPH_SIZE,
        (index / GLYPHS_PER_ROW) * GLYPH_SIZE,
    ))
}
