//! Object-type and cut-kind tags.

use std::fmt;

/// Physics object type a variation or a variation group refers to.
///
/// The discriminants match the numeric codes written to output metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum SelectionObject {
    Other = 0,
    Jet = 2,
    TrackParticle = 4,
    Electron = 6,
    Photon = 7,
    Muon = 8,
    Tau = 9,
    BTag = 102,
    TruthParticle = 201,
    MissingEt = 301,
    EventWeight = 302,
    RecoParticle = 960,
    DiTau = 980,
}

impl SelectionObject {
    /// Objects that receive the nominal variation when the catalog is fixed.
    pub const CALIBRATED: [SelectionObject; 8] = [
        SelectionObject::Electron,
        SelectionObject::Muon,
        SelectionObject::Photon,
        SelectionObject::Tau,
        SelectionObject::Jet,
        SelectionObject::TruthParticle,
        SelectionObject::MissingEt,
        SelectionObject::TrackParticle,
    ];

    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn name(self) -> &'static str {
        match self {
            SelectionObject::Other => "Other",
            SelectionObject::Jet => "Jet",
            SelectionObject::TrackParticle => "TrackParticle",
            SelectionObject::Electron => "Electron",
            SelectionObject::Photon => "Photon",
            SelectionObject::Muon => "Muon",
            SelectionObject::Tau => "Tau",
            SelectionObject::BTag => "BTag",
            SelectionObject::TruthParticle => "TruthParticle",
            SelectionObject::MissingEt => "MissingET",
            SelectionObject::EventWeight => "EventWeight",
            SelectionObject::RecoParticle => "RecoParticle",
            SelectionObject::DiTau => "DiTau",
        }
    }
}

impl fmt::Display for SelectionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value kind a cut compares against.
///
/// The `Part*` kinds read one field of one element of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum CutKind {
    Int,
    Float,
    Char,
    PartInt,
    PartFloat,
    PartChar,
}

impl CutKind {
    /// Whether the cut reads a container element rather than a scalar variable.
    pub fn is_element(self) -> bool {
        matches!(self, CutKind::PartInt | CutKind::PartFloat | CutKind::PartChar)
    }

    /// Whether thresholds are integral (`Int`, `Char` and their element forms).
    pub fn is_integral(self) -> bool {
        !matches!(self, CutKind::Float | CutKind::PartFloat)
    }

    /// The scalar value kind the bound value must carry.
    pub fn value_kind(self) -> crate::ValueKind {
        match self {
            CutKind::Int | CutKind::PartInt => crate::ValueKind::Int,
            CutKind::Float | CutKind::PartFloat => crate::ValueKind::Float,
            CutKind::Char | CutKind::PartChar => crate::ValueKind::Char,
        }
    }
}

impl fmt::Display for CutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CutKind::Int => "int",
            CutKind::Float => "float",
            CutKind::Char => "char",
            CutKind::PartInt => "part_int",
            CutKind::PartFloat => "part_float",
            CutKind::PartChar => "part_char",
        };
        f.write_str(name)
    }
}
