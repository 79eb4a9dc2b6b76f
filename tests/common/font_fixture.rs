// A tiny TrueType font built in memory: five glyphs, short loca offsets.
//
//   0  .notdef  square
//   1  'A'      triangle
//   2  'B'      square
//   3  ' '      empty
//   4  'C'      composite of 1 and 2

#[allow(dead_code)]
fn fixture_simple_glyph(points: &[(i16, i16)]) -> Vec<u8> {
    let mut g = Vec::new();
    let xs: Vec<i16> = points.iter().map(|p| p.0).collect();
    let ys: Vec<i16> = points.iter().map(|p| p.1).collect();
    g.extend_from_slice(&1i16.to_be_bytes());
    g.extend_from_slice(&xs.iter().min().copied().unwrap_or(0).to_be_bytes());
    g.extend_from_slice(&ys.iter().min().copied().unwrap_or(0).to_be_bytes());
    g.extend_from_slice(&xs.iter().max().copied().unwrap_or(0).to_be_bytes());
    g.extend_from_slice(&ys.iter().max().copied().unwrap_or(0).to_be_bytes());
    g.extend_from_slice(&(points.len() as u16 - 1).to_be_bytes());
    g.extend_from_slice(&0u16.to_be_bytes());
    g.extend(std::iter::repeat(0x01u8).take(points.len()));
    let mut last = (0i16, 0i16);
    let mut dx = Vec::new();
    let mut dy = Vec::new();
    for p in points {
        dx.extend_from_slice(&(p.0 - last.0).to_be_bytes());
        dy.extend_from_slice(&(p.1 - last.1).to_be_bytes());
        last = *p;
    }
    g.extend(dx);
    g.extend(dy);
    while g.len() % 4 != 0 {
        g.push(0);
    }
    g
}

#[allow(dead_code)]
fn fixture_composite_glyph(parts: &[u16]) -> Vec<u8> {
    let mut g = Vec::new();
    for v in [-1i16, 0, 0, 500, 700] {
        g.extend_from_slice(&v.to_be_bytes());
    }
    for (i, gid) in parts.iter().enumerate() {
        // words for args, args are x/y offsets
        let mut flags: u16 = 0x0001 | 0x0002;
        if i + 1 < parts.len() {
            flags |= 0x0020;
        }
        g.extend_from_slice(&flags.to_be_bytes());
        g.extend_from_slice(&gid.to_be_bytes());
        g.extend_from_slice(&0i16.to_be_bytes());
        g.extend_from_slice(&0i16.to_be_bytes());
    }
    while g.len() % 4 != 0 {
        g.push(0);
    }
    g
}

#[allow(dead_code)]
fn fixture_sfnt(mut tables: Vec<([u8; 4], Vec<u8>)>) -> Vec<u8> {
    tables.sort_by(|a, b| a.0.cmp(&b.0));
    let count = tables.len() as u16;
    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    out.extend_from_slice(&count.to_be_bytes());
    out.extend_from_slice(&128u16.to_be_bytes());
    out.extend_from_slice(&3u16.to_be_bytes());
    out.extend_from_slice(&(count * 16 - 128).to_be_bytes());
    let mut offset = 12 + 16 * tables.len();
    for (tag, data) in tables.iter() {
        out.extend_from_slice(tag);
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += (data.len() + 3) & !3;
    }
    for (_, data) in tables.iter() {
        out.extend_from_slice(data);
        while out.len() % 4 != 0 {
            out.push(0);
        }
    }
    out
}

#[allow(dead_code)]
fn test_font() -> Vec<u8> {
    let square = [(0, 0), (0, 700), (500, 700), (500, 0)];
    let glyphs: Vec<Vec<u8>> = vec![
        fixture_simple_glyph(&square),
        fixture_simple_glyph(&[(0, 0), (250, 700), (500, 0)]),
        fixture_simple_glyph(&square),
        Vec::new(),
        fixture_composite_glyph(&[1, 2]),
    ];

    let mut glyf = Vec::new();
    let mut loca = Vec::new();
    for glyph in glyphs.iter() {
        loca.extend_from_slice(&((glyf.len() / 2) as u16).to_be_bytes());
        glyf.extend_from_slice(glyph);
    }
    loca.extend_from_slice(&((glyf.len() / 2) as u16).to_be_bytes());

    let mut head = Vec::new();
    head.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    head.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    head.extend_from_slice(&0u32.to_be_bytes());
    head.extend_from_slice(&0x5F0F_3CF5u32.to_be_bytes());
    head.extend_from_slice(&0u16.to_be_bytes());
    head.extend_from_slice(&1000u16.to_be_bytes());
    head.extend_from_slice(&[0u8; 16]);
    for v in [0i16, 0, 500, 700] {
        head.extend_from_slice(&v.to_be_bytes());
    }
    head.extend_from_slice(&0u16.to_be_bytes());
    head.extend_from_slice(&8u16.to_be_bytes());
    head.extend_from_slice(&2i16.to_be_bytes());
    head.extend_from_slice(&0i16.to_be_bytes());
    head.extend_from_slice(&0i16.to_be_bytes());

    let mut hhea = Vec::new();
    hhea.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    for v in [800i16, -200, 0] {
        hhea.extend_from_slice(&v.to_be_bytes());
    }
    hhea.extend_from_slice(&600u16.to_be_bytes());
    for v in [0i16, 0, 500, 1, 0, 0, 0, 0, 0, 0, 0] {
        hhea.extend_from_slice(&v.to_be_bytes());
    }
    hhea.extend_from_slice(&5u16.to_be_bytes());

    let mut maxp = Vec::new();
    maxp.extend_from_slice(&0x0000_5000u32.to_be_bytes());
    maxp.extend_from_slice(&5u16.to_be_bytes());

    let mut hmtx = Vec::new();
    for advance in [600u16, 600, 600, 250, 600] {
        hmtx.extend_from_slice(&advance.to_be_bytes());
        hmtx.extend_from_slice(&0i16.to_be_bytes());
    }

    // format 4: ' ' -> 3, 'A'..'B' -> 1..2, 'C' -> 4
    let segments: [(u16, u16, i16); 4] = [
        (0x20, 0x20, 3 - 0x20),
        (0x41, 0x42, 1 - 0x41),
        (0x43, 0x43, 4 - 0x43),
        (0xFFFF, 0xFFFF, 1),
    ];
    let mut sub = Vec::new();
    for v in [4u16, 48, 0, 8, 8, 2, 0] {
        sub.extend_from_slice(&v.to_be_bytes());
    }
    for s in segments.iter() {
        sub.extend_from_slice(&s.1.to_be_bytes());
    }
    sub.extend_from_slice(&0u16.to_be_bytes());
    for s in segments.iter() {
        sub.extend_from_slice(&s.0.to_be_bytes());
    }
    for s in segments.iter() {
        sub.extend_from_slice(&s.2.to_be_bytes());
    }
    for _ in segments.iter() {
        sub.extend_from_slice(&0u16.to_be_bytes());
    }
    let mut cmap = Vec::new();
    for v in [0u16, 1, 3, 1] {
        cmap.extend_from_slice(&v.to_be_bytes());
    }
    cmap.extend_from_slice(&12u32.to_be_bytes());
    cmap.extend(sub);

    fixture_sfnt(vec![
        (*b"head", head),
        (*b"hhea", hhea),
        (*b"maxp", maxp),
        (*b"hmtx", hmtx),
        (*b"cmap", cmap),
        (*b"loca", loca),
        (*b"glyf", glyf),
    ])
}
