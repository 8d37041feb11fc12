use glam::Vec3;
use smallvec::SmallVec;

/// Force law selector. Each mode has exactly one entry in the force table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum AttractorMode {
    Center = 0,
    Levitate = 1,
    Singularity = 2,
    Vortex = 3,
    Freeze = 4,
    Beam = 5,
    Orb = 6,
    TwinOrb = 7,
    Tornado = 8,
    Fountain = 9,
    Paint = 10,
}

impl AttractorMode {
    pub const ALL: [AttractorMode; 11] = [
        AttractorMode::Center,
        AttractorMode::Levitate,
        AttractorMode::Singularity,
        AttractorMode::Vortex,
        AttractorMode::Freeze,
        AttractorMode::Beam,
        AttractorMode::Orb,
        AttractorMode::TwinOrb,
        AttractorMode::Tornado,
        AttractorMode::Fountain,
        AttractorMode::Paint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::Levitate => "levitate",
            Self::Singularity => "singularity",
            Self::Vortex => "vortex",
            Self::Freeze => "freeze",
            Self::Beam => "beam",
            Self::Orb => "orb",
            Self::TwinOrb => "twin-orb",
            Self::Tornado => "tornado",
            Self::Fountain => "fountain",
            Self::Paint => "paint",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }

    /// Orb-class modes suspend containment for particles close to them.
    pub fn is_strong_pull(&self) -> bool {
        matches!(self, Self::Singularity | Self::Orb | Self::TwinOrb)
    }
}

/// Where an attractor came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttractorSource {
    Left,
    Right,
    Center,
    Both,
    External,
}

/// A force source for one frame. Rebuilt every frame by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Attractor {
    pub position: Vec3,
    /// Positive attracts, negative repels.
    pub strength: f32,
    pub radius: f32,
    pub mode: AttractorMode,
    pub source: AttractorSource,
    /// Unit vector; beams carry one.
    pub direction: Option<Vec3>,
    /// Second anchor of a twin orb.
    pub partner: Option<Vec3>,
    /// Orb growth in 0..=1.
    pub orb_size: f32,
    pub partner_orb_size: f32,
}

impl Attractor {
    pub fn new(mode: AttractorMode, position: Vec3, (strength, radius): (f32, f32)) -> Self {
        Self {
            position,
            strength,
            radius,
            mode,
            source: AttractorSource::External,
            direction: None,
            partner: None,
            orb_size: 0.0,
            partner_orb_size: 0.0,
        }
    }

    pub fn from_source(mut self, source: AttractorSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_direction(mut self, direction: Vec3) -> Self {
        self.direction = Some(direction.normalize_or_zero());
        self
    }

    pub fn with_orb(mut self, orb_size: f32) -> Self {
        self.orb_size = orb_size;
        self
    }

    pub fn with_partner(mut self, partner: Vec3, partner_orb_size: f32) -> Self {
        self.partner = Some(partner);
        self.partner_orb_size = partner_orb_size;
        self
    }

    /// Anchor positions this attractor pulls toward.
    pub fn anchors(&self) -> impl Iterator<Item = Vec3> {
        std::iter::once(self.position).chain(self.partner)
    }
}

/// Typical frame: at most one attractor per hand plus a shared one.
pub type AttractorSet = SmallVec<[Attractor; 4]>;
