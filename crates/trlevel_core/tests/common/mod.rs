//! Synthetic level writer shared by the integration tests and benches.
//!
//! Builds small but complete files for every generation: each room has
//! four vertices, a quad, a triangle, a portal and a static mesh; the object
//! data holds one two-joint moveable with a single animation, one static
//! mesh, one sprite sequence and `entities` placed items.

#![allow(dead_code)]

use std::io::Write as _;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use trlevel_core::version::{TAG_TR1, TAG_TR2, TAG_TR3, TAG_TR4};
use trlevel_core::GameVersion;

/// Object id of the only moveable.
pub const MOVEABLE_ID: u32 = 0;
/// Object id of the only static mesh.
pub const STATIC_ID: u32 = 10;
/// Object id of the only sprite sequence.
pub const SPRITE_ID: i32 = 20;
/// Palette slot holding pure green; the mesh's coloured face uses it.
pub const GREEN_SLOT: u8 = 2;
/// TR3/TR4 room vertex colour, pure red in RGB555.
pub const RED_555: u16 = 0x7C00;

const TEXTILE_PIXELS: usize = 256 * 256;
const FILL32: u32 = 0xCDCD_CDCD;

/// Little-endian byte sink.
#[derive(Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn len(&self) -> usize {
        self.buf.len()
    }
    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }
    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }
    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }
    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }
    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }
    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }
    pub fn bytes(&mut self, v: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(v);
        self
    }
    pub fn zeros(&mut self, n: usize) -> &mut Self {
        self.buf.resize(self.buf.len() + n, 0);
        self
    }
    pub fn i16s(&mut self, values: &[i16]) -> &mut Self {
        for &v in values {
            self.i16(v);
        }
        self
    }
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

fn count(n: usize) -> u32 {
    u32::try_from(n).expect("count fits in u32")
}

/// What to put in the synthetic level.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub version: GameVersion,
    pub rooms: u16,
    pub object_textures: u16,
    pub entities: u16,
    /// Object texture used by every room quad
    pub face_texture: u16,
    /// Portal target of the last room; room `i` otherwise opens into `i + 1`
    pub last_portal: Option<u16>,
    pub entity_room: i16,
    pub entity_object: i16,
    /// Declared size of the TR4 geometry region, when it should lie
    pub geometry_size_override: Option<u32>,
    /// Write the demo chunk order (TR1, TR2)
    pub demo_layout: bool,
}

impl Fixture {
    pub fn new(version: GameVersion) -> Self {
        Self {
            version,
            rooms: 3,
            object_textures: 2,
            entities: 2,
            face_texture: 1,
            last_portal: None,
            entity_room: 0,
            entity_object: 0,
            geometry_size_override: None,
            demo_layout: false,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        match self.version {
            GameVersion::Tr1 => self.tr1(),
            GameVersion::Tr2 => self.tr2(),
            GameVersion::Tr3 => self.tr3(),
            GameVersion::Tr4 => self.tr4(),
            GameVersion::Tr5 => self.tr5(),
        }
    }

    fn portal_target(&self, room: u16) -> u16 {
        if room + 1 == self.rooms {
            self.last_portal.unwrap_or(0)
        } else {
            room + 1
        }
    }

    // ---------------------------------------------------------------------
    // shared chunks
    // ---------------------------------------------------------------------

    fn palette8(w: &mut Writer) {
        w.bytes(&[0, 0, 0, 63, 0, 0, 0, 63, 0, 0, 0, 63]);
        w.zeros((256 - 4) * 3);
    }

    fn palette16(w: &mut Writer) {
        w.bytes(&[0, 0, 0, 0, 255, 0, 0, 0, 0, 255, 0, 0, 0, 0, 255, 0]);
        w.zeros((256 - 4) * 4);
    }

    fn portal(w: &mut Writer, target: u16) {
        w.u16(target);
        w.i16s(&[0, 0, 1]);
        w.i16s(&[0, 0, 0, 1024, 0, 0, 1024, -1024, 0, 0, -1024, 0]);
    }

    fn sector(w: &mut Writer) {
        w.u16(0).u16(0xFFFF).u8(0xFF).u8(0xF8).u8(0xFF).u8(0x08);
    }

    fn classic_room(&self, w: &mut Writer, index: u16) {
        let v = self.version;
        w.i32(i32::from(index) * 4096).i32(0).i32(0).i32(-1024);

        let mut data = Writer::new();
        data.u16(4);
        for (x, z) in [(0, 0), (1024, 0), (1024, 1024), (0, 1024)] {
            data.i16s(&[x, 0, z]);
            match v {
                GameVersion::Tr1 => {
                    data.i16(4096);
                }
                GameVersion::Tr2 => {
                    data.i16(4096).u16(0).i16(4096);
                }
                _ => {
                    data.i16(4096).u16(0).u16(RED_555);
                }
            }
        }
        data.u16(1).u16(0).u16(1).u16(2).u16(3).u16(self.face_texture);
        data.u16(1).u16(0).u16(1).u16(2).u16(0);
        data.u16(1).i16(0).i16(0);
        w.u32(count(data.len() / 2));
        w.bytes(&data.into_bytes());

        w.u16(1);
        Self::portal(w, self.portal_target(index));
        w.u16(1).u16(1);
        Self::sector(w);

        match v {
            GameVersion::Tr1 => {
                w.i16(0);
            }
            GameVersion::Tr2 => {
                w.i16(0).i16(0).i16(0);
            }
            _ => {
                w.i16(0x7FFF).i16(0);
            }
        }
        w.u16(0);
        w.u16(1);
        w.i32(512).i32(0).i32(512).u16(0x4000).i16(0);
        if v != GameVersion::Tr1 {
            w.i16(0);
        }
        w.u16(u16::try_from(STATIC_ID).expect("static id fits"));
        w.i16(-1).u16(if index == 0 { 1 } else { 0 });
        if matches!(v, GameVersion::Tr3 | GameVersion::Tr4) {
            w.u8(0).u8(0).u8(0xFF);
        }
    }

    fn mesh(&self) -> Writer {
        let modern = matches!(self.version, GameVersion::Tr4 | GameVersion::Tr5);
        let mut m = Writer::new();
        m.i16s(&[0, 0, 0]).i32(256);
        m.i16(3).i16s(&[0, 0, 0, 256, 0, 0, 0, 256, 0]);
        m.i16(3).i16s(&[0, -1, 0, 0, -1, 0, 0, -1, 0]);
        m.i16(0);
        m.i16(1).u16(0).u16(1).u16(2).u16(0);
        if modern {
            m.u16(0);
        } else {
            m.i16(0);
            m.i16(1).u16(0).u16(1).u16(2).u16(u16::from_le_bytes([GREEN_SLOT, GREEN_SLOT]));
        }
        m
    }

    fn keyframe(&self, w: &mut Writer) {
        w.i16s(&[-128, -256, -128, 128, 0, 128]).i16s(&[0, -512, 0]);
        if self.version == GameVersion::Tr1 {
            w.u16(2);
        }
        w.zeros(2 * 2 * 2);
    }

    fn frame_size(&self) -> u8 {
        match self.version {
            GameVersion::Tr1 => 0,
            _ => 9 + 2 * 2,
        }
    }

    fn objects(&self, w: &mut Writer) {
        let modern = matches!(self.version, GameVersion::Tr4 | GameVersion::Tr5);

        w.u32(1).u16(0);

        let mesh = self.mesh().into_bytes();
        w.u32(count(mesh.len() / 2)).bytes(&mesh);
        w.u32(2).u32(0).u32(0);

        w.u32(1);
        w.u32(0).u8(1).u8(self.frame_size()).u16(0).i32(0x0001_0000).i32(0);
        if modern {
            w.i32(0).i32(0);
        }
        w.u16(0).u16(0).u16(0).u16(0);
        w.u16(1).u16(0).u16(1).u16(0);

        w.u32(1).u16(1).u16(1).u16(0);
        w.u32(1).u16(0).u16(1).u16(0).u16(0);
        w.u32(2).i16(0).i16(0);
        w.u32(4).u32(0).i32(0).i32(-256).i32(0);

        let mut frames = Writer::new();
        self.keyframe(&mut frames);
        w.u32(count(frames.len() / 2)).bytes(&frames.into_bytes());

        w.u32(1).u32(MOVEABLE_ID).u16(2).u16(0).u32(0).u32(0).u16(0);
        if self.version == GameVersion::Tr5 {
            w.u16(0xFFEF);
        }

        w.u32(1).u32(STATIC_ID).u16(0);
        w.i16s(&[-256, 256, -256, 0, -256, 256]).i16s(&[-256, 256, -256, 0, -256, 256]).u16(0);
    }

    fn object_textures(&self, w: &mut Writer) {
        w.u32(u32::from(self.object_textures));
        for _ in 0..self.object_textures {
            w.u16(0).u8(0).u8(0);
            if matches!(self.version, GameVersion::Tr4 | GameVersion::Tr5) {
                w.u16(0);
            }
            w.bytes(&[0, 0, 0, 0, 1, 63, 0, 0, 1, 63, 1, 63, 0, 0, 1, 63]);
            if matches!(self.version, GameVersion::Tr4 | GameVersion::Tr5) {
                w.zeros(8).u32(64).u32(64);
            }
            if self.version == GameVersion::Tr5 {
                w.u16(0);
            }
        }
    }

    fn sprites(w: &mut Writer) {
        w.u32(1).u16(0).u8(0).u8(0).u16(0x3F00).u16(0x3F00).i16s(&[-128, -256, 128, 0]);
        w.u32(1).i32(SPRITE_ID).i16(-1).i16(0);
    }

    fn entities(&self, w: &mut Writer) {
        w.u32(u32::from(self.entities));
        for i in 0..self.entities {
            w.i16(self.entity_object).i16(self.entity_room);
            w.i32(512 + i32::from(i) * 1024).i32(0).i32(512).u16(0x8000).i16(-1);
            match self.version {
                GameVersion::Tr1 => {}
                GameVersion::Tr2 | GameVersion::Tr3 => {
                    w.i16(-1);
                }
                GameVersion::Tr4 | GameVersion::Tr5 => {
                    w.i16(0);
                }
            }
            w.u16(0x3E00);
        }
    }

    /// Cameras, sound sources, boxes, overlaps and animated textures, all
    /// empty.
    fn empty_world_chunks(w: &mut Writer, flyby: bool) {
        w.u32(0);
        if flyby {
            w.u32(0);
        }
        w.u32(0).u32(0).u32(0).u32(0);
    }

    fn textile8(w: &mut Writer) {
        let mut pixels = vec![1u8; TEXTILE_PIXELS];
        pixels[0] = 0;
        w.bytes(&pixels);
    }

    fn textile16(w: &mut Writer) {
        for _ in 0..TEXTILE_PIXELS {
            w.u16(0xFC00);
        }
    }

    // ---------------------------------------------------------------------
    // per-generation files
    // ---------------------------------------------------------------------

    fn tr1(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.bytes(&TAG_TR1).u32(1);
        Self::textile8(&mut w);
        w.u32(0);
        w.u16(self.rooms);
        for i in 0..self.rooms {
            self.classic_room(&mut w, i);
        }
        self.objects(&mut w);
        self.object_textures(&mut w);
        Self::sprites(&mut w);
        if self.demo_layout {
            Self::palette8(&mut w);
        }
        Self::empty_world_chunks(&mut w, false);
        self.entities(&mut w);
        w.zeros(8192);
        if !self.demo_layout {
            Self::palette8(&mut w);
        }
        w.u16(0).u16(0).zeros(256 * 2).u32(0).u32(0).u32(0);
        w.into_bytes()
    }

    fn tr2_header(w: &mut Writer, tag: [u8; 4]) {
        w.bytes(&tag);
        Self::palette8(w);
        Self::palette16(w);
        w.u32(1);
        Self::textile8(w);
        Self::textile16(w);
        w.u32(0);
    }

    fn tr2(&self) -> Vec<u8> {
        let mut w = Writer::new();
        Self::tr2_header(&mut w, TAG_TR2);
        w.u16(self.rooms);
        for i in 0..self.rooms {
            self.classic_room(&mut w, i);
        }
        self.objects(&mut w);
        self.object_textures(&mut w);
        Self::sprites(&mut w);
        if self.demo_layout {
            w.zeros(8192);
        }
        Self::empty_world_chunks(&mut w, false);
        self.entities(&mut w);
        if !self.demo_layout {
            w.zeros(8192);
        }
        w.u16(0).u16(0).zeros(370 * 2).u32(0).u32(0);
        w.into_bytes()
    }

    fn tr3(&self) -> Vec<u8> {
        let mut w = Writer::new();
        Self::tr2_header(&mut w, TAG_TR3);
        w.u16(self.rooms);
        for i in 0..self.rooms {
            self.classic_room(&mut w, i);
        }
        self.objects(&mut w);
        Self::sprites(&mut w);
        Self::empty_world_chunks(&mut w, false);
        self.object_textures(&mut w);
        self.entities(&mut w);
        w.zeros(8192);
        w.u16(0).u16(0).zeros(370 * 2).u32(0).u32(0);
        w.into_bytes()
    }

    fn zlib_region(w: &mut Writer, data: &[u8], declared: Option<u32>) {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(data).expect("write to memory");
        let packed = encoder.finish().expect("finish zlib stream");
        w.u32(declared.unwrap_or_else(|| count(data.len()))).u32(count(packed.len()));
        w.bytes(&packed);
    }

    fn packed_textiles(w: &mut Writer) {
        w.bytes(&TAG_TR4).u16(1).u16(0).u16(0);
        let mut page = Vec::with_capacity(TEXTILE_PIXELS * 4);
        for _ in 0..TEXTILE_PIXELS {
            page.extend_from_slice(&[0x00, 0x00, 0xFF, 0xFF]);
        }
        Self::zlib_region(w, &page, None);
        let mut page16 = Writer::new();
        Self::textile16(&mut page16);
        Self::zlib_region(w, &page16.into_bytes(), None);
        Self::zlib_region(w, &vec![0x80; TEXTILE_PIXELS * 4], None);
    }

    fn tr4(&self) -> Vec<u8> {
        let mut w = Writer::new();
        Self::packed_textiles(&mut w);

        let mut g = Writer::new();
        g.u32(0).u16(self.rooms);
        for i in 0..self.rooms {
            self.classic_room(&mut g, i);
        }
        self.objects(&mut g);
        g.bytes(b"SPR");
        Self::sprites(&mut g);
        Self::empty_world_chunks(&mut g, true);
        g.u8(0).bytes(b"TEX");
        self.object_textures(&mut g);
        self.entities(&mut g);
        g.u32(0).u16(0).zeros(370 * 2).u32(0).u32(0);
        g.u16(0xCDCD).u16(0xCDCD).u16(0xCDCD);

        Self::zlib_region(&mut w, &g.into_bytes(), self.geometry_size_override);
        // sound samples
        w.u32(0);
        w.into_bytes()
    }

    fn tr5_room(&self, w: &mut Writer, index: u16) {
        let mut sectors = Writer::new();
        Self::sector(&mut sectors);
        sectors.u16(1);
        Self::portal(&mut sectors, self.portal_target(index));

        let mut statics = Writer::new();
        statics.i32(512).i32(0).i32(512).u16(0).i16(0x1000).i16(0);
        statics.u16(u16::try_from(STATIC_ID).expect("static id fits"));

        let mut layer = Writer::new();
        layer.u16(4).u16(0).u16(0).u16(1).u16(1).u16(0).u16(0).u16(0);
        for v in [0.0, -1024.0, 0.0, 1024.0, 0.0, 1024.0] {
            layer.f32(v);
        }
        layer.u32(0).zeros(12);

        let mut polys = Writer::new();
        polys.u16(0).u16(1).u16(2).u16(3).u16(self.face_texture).u16(0);
        polys.u16(0).u16(1).u16(2).u16(0x8000).u16(1);

        let mut vertices = Writer::new();
        for (x, z) in [(0.0, 0.0), (1024.0, 0.0), (1024.0, 1024.0), (0.0, 1024.0)] {
            vertices.f32(x).f32(0.0).f32(z).f32(0.0).f32(-1.0).f32(0.0).bytes(&[0x00, 0x00, 0xFF, 0xFF]);
        }

        let sectors_at = 0u32;
        let statics_at = count(sectors.len());
        let layers_at = statics_at + count(statics.len());
        let polys_at = layers_at + count(layer.len());
        let vertices_at = polys_at + count(polys.len());

        let mut h = Writer::new();
        h.u32(FILL32).u32(statics_at).u32(sectors_at).u32(0).u32(statics_at);
        h.i32(i32::from(index) * 4096).i32(0).i32(0).i32(0).i32(-1024);
        h.u16(1).u16(1).bytes(&[0x40, 0x40, 0x40, 0xFF]);
        h.u16(0).u16(1).u16(0).u16(0);
        h.u32(0x7FFF).u32(0x7FFF).u32(FILL32).u32(FILL32).u32(0xFFFF_FFFF);
        h.i16(-1).u16(0);
        h.zeros(12).u32(0);
        h.zeros(16);
        h.u32(FILL32).u32(FILL32).u32(FILL32).u32(FILL32).u32(FILL32).u32(FILL32);
        h.u32(1).u32(1);
        h.u32(0).u32(0).u32(0);
        h.zeros(12);
        h.u32(1).u32(layers_at).u32(vertices_at).u32(polys_at).u32(polys_at).u32(count(vertices.len()));
        h.u32(FILL32).u32(FILL32).u32(FILL32).u32(FILL32);
        assert_eq!(h.len(), 208);

        let mut block = h;
        for part in [sectors, statics, layer, polys, vertices] {
            block.bytes(&part.into_bytes());
        }
        w.bytes(b"XELA").u32(count(block.len())).bytes(&block.into_bytes());
    }

    fn tr5(&self) -> Vec<u8> {
        let mut w = Writer::new();
        Self::packed_textiles(&mut w);
        w.u16(0).u16(0).zeros(28);

        let mut rest = Writer::new();
        rest.u32(0).u32(u32::from(self.rooms));
        for i in 0..self.rooms {
            self.tr5_room(&mut rest, i);
        }
        self.objects(&mut rest);
        rest.bytes(b"SPR\0");
        Self::sprites(&mut rest);
        Self::empty_world_chunks(&mut rest, true);
        rest.u8(0).bytes(b"TEX\0");
        self.object_textures(&mut rest);
        self.entities(&mut rest);
        rest.u32(0).u16(0).zeros(450 * 2).u32(0).u32(0);

        let size = count(rest.len());
        w.u32(size).u32(size).bytes(&rest.into_bytes());
        w.into_bytes()
    }
}

/// Every generation with the default fixture.
pub fn all_levels() -> Vec<(GameVersion, Vec<u8>)> {
    GameVersion::ALL.iter().map(|&v| (v, Fixture::new(v).build())).collect()
}
