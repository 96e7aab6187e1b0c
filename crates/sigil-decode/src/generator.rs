//! Particle generator resources
//!
//! Layout: an eight-word header followed by four sections, each closed by a
//! terminator: generator updaters (generator table), then initializers,
//! updaters and expiration handlers (all from the particle table).

use crate::cursor::ByteCursor;
use crate::dispatch::{decode_section, Parser, SectionEnd};
use crate::header::{HeaderFormat, InstructionHeader, WORD};
use crate::particle_ops::{
    particle_table, ExpirationHandler, Initializer, ParticleFamily, ParticleInstruction,
    ParticleOp, Updater,
};
use glam::Vec3;
use serde::Serialize;
use sigil_core::{ResourceId, ResourcePath, Result, SigilError};

/// Header size in words
pub const GENERATOR_HEADER_WORDS: usize = 8;

/// How a generator's anchor is derived from its binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttachType {
    None,
    Source,
    Target,
    SourceJoint,
    TargetJoint,
    /// Beam between source and target joints
    SourceToTarget,
    Sun,
    Moon,
    ZoneObject,
}

impl AttachType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(AttachType::None),
            1 => Some(AttachType::Source),
            2 => Some(AttachType::Target),
            3 => Some(AttachType::SourceJoint),
            4 => Some(AttachType::TargetJoint),
            5 => Some(AttachType::SourceToTarget),
            6 => Some(AttachType::Sun),
            7 => Some(AttachType::Moon),
            8 => Some(AttachType::ZoneObject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GeneratorFlags {
    /// Emit only while no particle is alive
    pub continuous_singleton: bool,
    pub auto_run: bool,
    /// One carrier particle holding `batch_slots` sub-particles per emission
    pub batched: bool,
    /// Particles stay where they were emitted instead of following the anchor
    pub world_space: bool,
}

impl GeneratorFlags {
    pub fn from_bits(bits: u8) -> Self {
        Self {
            continuous_singleton: bits & 0x01 != 0,
            auto_run: bits & 0x02 != 0,
            batched: bits & 0x04 != 0,
            world_space: bits & 0x08 != 0,
        }
    }

    pub fn bits(&self) -> u8 {
        (self.continuous_singleton as u8)
            | (self.auto_run as u8) << 1
            | (self.batched as u8) << 2
            | (self.world_space as u8) << 3
    }
}

/// Generator-level per-frame updaters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op")]
pub enum GeneratorUpdater {
    /// Move the emission interval towards `target_interval` over `frames`
    EmissionRamp { target_interval: f32, frames: f32 },
    BaseOffset { offset: Vec3 },
    BaseVelocity { velocity: Vec3 },
    BaseSpin { rate: Vec3 },
    /// Stop emitting while the observer is further than `max_distance`
    DistanceCull { max_distance: f32 },
    /// Freeze the anchor at its first resolved position
    SnapshotAnchor,
    BaseJitter { radius: f32 },
}

/// Immutable, shareable generator definition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticleGeneratorDefinition {
    pub id: ResourceId,
    pub origin: ResourcePath,
    pub attach: AttachType,
    pub joints: [u8; 2],
    pub flags: GeneratorFlags,
    /// Frames between emissions
    pub interval: u16,
    pub interval_variance: u16,
    pub per_emission: u16,
    pub batch_slots: u16,
    pub max_age: u16,
    pub max_age_variance: u16,
    pub provider: ResourceId,
    pub zone_link: ResourceId,
    pub base_scale: f32,
    pub generator_updaters: Vec<GeneratorUpdater>,
    pub initializers: Vec<ParticleInstruction<Initializer>>,
    pub updaters: Vec<ParticleInstruction<Updater>>,
    pub expiration: Vec<ParticleInstruction<ExpirationHandler>>,
}

impl ParticleGeneratorDefinition {
    /// A definition with default header values and no instructions.
    pub fn new(id: ResourceId, origin: ResourcePath) -> Self {
        Self {
            id,
            origin,
            attach: AttachType::None,
            joints: [0, 0],
            flags: GeneratorFlags::default(),
            interval: 1,
            interval_variance: 0,
            per_emission: 1,
            batch_slots: 0,
            max_age: 30,
            max_age_variance: 0,
            provider: ResourceId::NONE,
            zone_link: ResourceId::NONE,
            base_scale: 1.0,
            generator_updaters: Vec::new(),
            initializers: Vec::new(),
            updaters: Vec::new(),
            expiration: Vec::new(),
        }
    }
}

/// Decode a generator resource.
pub fn decode_particle_generator(
    id: ResourceId,
    origin: ResourcePath,
    bytes: &[u8],
) -> Result<ParticleGeneratorDefinition> {
    if bytes.len() < GENERATOR_HEADER_WORDS * WORD {
        return Err(SigilError::InvalidHeader(format!(
            "generator {id} needs {} header bytes, found {}",
            GENERATOR_HEADER_WORDS * WORD,
            bytes.len()
        )));
    }

    let mut cursor = ByteCursor::new(bytes);
    let mut def = ParticleGeneratorDefinition::new(id, origin);

    let attach_code = cursor.read_u8()?;
    def.attach = AttachType::from_code(attach_code).unwrap_or_else(|| {
        tracing::warn!(generator = %id, attach = attach_code, "unknown attach type, using none");
        AttachType::None
    });
    def.joints = [cursor.read_u8()?, cursor.read_u8()?];
    def.flags = GeneratorFlags::from_bits(cursor.read_u8()?);
    def.interval = cursor.read_u16()?;
    def.interval_variance = cursor.read_u16()?;
    def.per_emission = cursor.read_u16()?;
    def.batch_slots = cursor.read_u16()?;
    def.max_age = cursor.read_u16()?;
    def.max_age_variance = cursor.read_u16()?;
    def.provider = cursor.read_id()?;
    def.zone_link = cursor.read_id()?;
    def.base_scale = cursor.read_f32()?;
    let _reserved = cursor.read_u32()?;

    let end = decode_section(
        &mut cursor,
        HeaderFormat::Particle,
        "generator",
        generator_table,
        |_, updater| def.generator_updaters.push(updater),
    )?;

    if end == SectionEnd::Terminated {
        let sections = [
            ParticleFamily::Initializer,
            ParticleFamily::Updater,
            ParticleFamily::Expiration,
        ];
        for family in sections {
            let end = decode_section(
                &mut cursor,
                HeaderFormat::Particle,
                "particle",
                particle_table,
                |header, op| place_particle_op(&mut def, family, header, op),
            )?;
            if end == SectionEnd::Exhausted {
                break;
            }
        }
    }

    tracing::debug!(
        generator = %def.id,
        attach = ?def.attach,
        initializers = def.initializers.len(),
        updaters = def.updaters.len(),
        expiration = def.expiration.len(),
        "decoded particle generator"
    );
    Ok(def)
}

/// File a particle op under its section, dropping ops from the wrong family.
fn place_particle_op(
    def: &mut ParticleGeneratorDefinition,
    section: ParticleFamily,
    header: InstructionHeader,
    op: ParticleOp,
) {
    let (opcode, alloc_offset) = (header.opcode, header.alloc_offset);
    match (section, op) {
        (ParticleFamily::Initializer, ParticleOp::Init(op)) => {
            def.initializers.push(ParticleInstruction {
                opcode,
                alloc_offset,
                op,
            })
        }
        (ParticleFamily::Updater, ParticleOp::Update(op)) => def.updaters.push(ParticleInstruction {
            opcode,
            alloc_offset,
            op,
        }),
        (ParticleFamily::Expiration, ParticleOp::Expire(op)) => {
            def.expiration.push(ParticleInstruction {
                opcode,
                alloc_offset,
                op,
            })
        }
        (section, op) => tracing::warn!(
            generator = %def.id,
            opcode,
            section = ?section,
            found = ?op.family(),
            "particle opcode in the wrong section, skipping"
        ),
    }
}

/// The generator opcode table.
pub fn generator_table(opcode: u8) -> Option<Parser<GeneratorUpdater>> {
    let parser: Parser<GeneratorUpdater> = match opcode {
        0x01 => emission_ramp,
        0x02 => base_offset,
        0x03 => base_velocity,
        0x04 => base_spin,
        0x05 => distance_cull,
        0x06 => snapshot_anchor,
        0x07 => base_jitter,
        _ => return None,
    };
    Some(parser)
}

fn emission_ramp(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<GeneratorUpdater> {
    let target_interval = c.read_f32()?;
    let frames = c.read_f32()?;
    Ok(GeneratorUpdater::EmissionRamp {
        target_interval,
        frames,
    })
}

fn base_offset(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<GeneratorUpdater> {
    Ok(GeneratorUpdater::BaseOffset {
        offset: c.read_vec3()?,
    })
}

fn base_velocity(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<GeneratorUpdater> {
    Ok(GeneratorUpdater::BaseVelocity {
        velocity: c.read_vec3()?,
    })
}

fn base_spin(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<GeneratorUpdater> {
    Ok(GeneratorUpdater::BaseSpin {
        rate: c.read_vec3()?,
    })
}

fn distance_cull(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<GeneratorUpdater> {
    Ok(GeneratorUpdater::DistanceCull {
        max_distance: c.read_f32()?,
    })
}

fn snapshot_anchor(_: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<GeneratorUpdater> {
    Ok(GeneratorUpdater::SnapshotAnchor)
}

fn base_jitter(c: &mut ByteCursor<'_>, _: &InstructionHeader) -> Result<GeneratorUpdater> {
    Ok(GeneratorUpdater::BaseJitter {
        radius: c.read_f32()?,
    })
}

/// Encode a generator header, the inverse of the header half of
/// [`decode_particle_generator`]. Used by tests and tooling.
pub fn encode_generator_header(def: &ParticleGeneratorDefinition) -> [u32; GENERATOR_HEADER_WORDS] {
    let attach = match def.attach {
        AttachType::None => 0u32,
        AttachType::Source => 1,
        AttachType::Target => 2,
        AttachType::SourceJoint => 3,
        AttachType::TargetJoint => 4,
        AttachType::SourceToTarget => 5,
        AttachType::Sun => 6,
        AttachType::Moon => 7,
        AttachType::ZoneObject => 8,
    };
    [
        attach
            | (def.joints[0] as u32) << 8
            | (def.joints[1] as u32) << 16
            | (def.flags.bits() as u32) << 24,
        def.interval as u32 | (def.interval_variance as u32) << 16,
        def.per_emission as u32 | (def.batch_slots as u32) << 16,
        def.max_age as u32 | (def.max_age_variance as u32) << 16,
        def.provider.to_word(),
        def.zone_link.to_word(),
        def.base_scale.to_bits(),
        0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::{f32_word, id_word, InstructionWriter};

    fn header_for(def: &ParticleGeneratorDefinition, w: &mut InstructionWriter) {
        for word in encode_generator_header(def) {
            w.word(word);
        }
    }

    fn sample_stream() -> Vec<u8> {
        let mut template = ParticleGeneratorDefinition::new(ResourceId::NONE, ResourcePath::root());
        template.attach = AttachType::SourceJoint;
        template.joints = [0x12, 0];
        template.flags.batched = true;
        template.interval = 2;
        template.batch_slots = 4;
        template.max_age = 45;
        template.base_scale = 0.5;

        let mut w = InstructionWriter::new();
        header_for(&template, &mut w);
        w.particle(0x05, 0, &[f32_word(300.0)]);
        w.terminator_particle();
        w.particle(0x03, 0x10, &[f32_word(0.0), f32_word(1.0), f32_word(0.0)]);
        w.particle(0x0A, 0, &[0xFF00_00FF]);
        w.terminator_particle();
        w.particle(0x40, 0x10, &[]);
        w.terminator_particle();
        w.particle(0x82, 0, &[2]);
        w.terminator_particle();
        w.finish()
    }

    #[test]
    fn decodes_header_and_sections() {
        let def =
            decode_particle_generator(ResourceId::from_name("gen"), ResourcePath::root(), &sample_stream())
                .unwrap();

        assert_eq!(def.attach, AttachType::SourceJoint);
        assert_eq!(def.joints, [0x12, 0]);
        assert!(def.flags.batched);
        assert!(!def.flags.auto_run);
        assert_eq!(def.interval, 2);
        assert_eq!(def.batch_slots, 4);
        assert_eq!(def.max_age, 45);
        assert!((def.base_scale - 0.5).abs() < 1e-6);

        assert_eq!(
            def.generator_updaters,
            vec![GeneratorUpdater::DistanceCull {
                max_distance: 300.0
            }]
        );
        assert_eq!(def.initializers.len(), 2);
        assert_eq!(def.initializers[0].alloc_offset, 0x10);
        assert_eq!(def.updaters[0].op, Updater::ApplyVelocity);
        assert_eq!(def.updaters[0].alloc_offset, 0x10);
        assert_eq!(def.expiration[0].op, ExpirationHandler::Restart { times: 2 });
    }

    #[test]
    fn decoding_is_idempotent() {
        let bytes = sample_stream();
        let id = ResourceId::from_name("gen");
        let a = decode_particle_generator(id, ResourcePath::root(), &bytes).unwrap();
        let b = decode_particle_generator(id, ResourcePath::root(), &bytes).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_family_is_skipped() {
        let template = ParticleGeneratorDefinition::new(ResourceId::NONE, ResourcePath::root());
        let mut w = InstructionWriter::new();
        header_for(&template, &mut w);
        w.terminator_particle();
        // An updater inside the initializer section
        w.particle(0x40, 0, &[]);
        w.particle(0x0E, 0, &[id_word("mesh")]);
        w.terminator_particle();

        let def =
            decode_particle_generator(ResourceId::from_name("mix"), ResourcePath::root(), &w.finish())
                .unwrap();
        assert_eq!(def.initializers.len(), 1);
        assert!(def.updaters.is_empty());
    }

    #[test]
    fn short_header_is_rejected() {
        let err = decode_particle_generator(ResourceId::from_name("tiny"), ResourcePath::root(), &[0; 12])
            .unwrap_err();
        assert!(matches!(err, SigilError::InvalidHeader(_)));
    }

    #[test]
    fn header_only_generator_has_no_instructions() {
        let template = ParticleGeneratorDefinition::new(ResourceId::NONE, ResourcePath::root());
        let mut w = InstructionWriter::new();
        header_for(&template, &mut w);
        let def =
            decode_particle_generator(ResourceId::from_name("bare"), ResourcePath::root(), &w.finish())
                .unwrap();
        assert!(def.generator_updaters.is_empty());
        assert!(def.initializers.is_empty());
        assert_eq!(def.per_emission, 1);
    }
}
