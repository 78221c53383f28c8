//! Persona registry
//!
//! A fixed catalog of coaching styles. Each persona owns the instruction
//! text sent to the cold-path backend and the voice policy used when its
//! advice is spoken.

use crate::backend::VoiceDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonaId {
    Tony,
    Rachel,
    Aj,
    Garmin,
    #[default]
    SuperAj,
}

impl PersonaId {
    pub const ALL: [PersonaId; 5] = [
        PersonaId::Tony,
        PersonaId::Rachel,
        PersonaId::Aj,
        PersonaId::Garmin,
        PersonaId::SuperAj,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaId::Tony => "TONY",
            PersonaId::Rachel => "RACHEL",
            PersonaId::Aj => "AJ",
            PersonaId::Garmin => "GARMIN",
            PersonaId::SuperAj => "SUPER_AJ",
        }
    }

    pub fn persona(&self) -> &'static Persona {
        match self {
            PersonaId::Tony => &TONY,
            PersonaId::Rachel => &RACHEL,
            PersonaId::Aj => &AJ,
            PersonaId::Garmin => &GARMIN,
            PersonaId::SuperAj => &SUPER_AJ,
        }
    }
}

impl fmt::Display for PersonaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown persona: {0}")]
pub struct UnknownPersona(pub String);

impl FromStr for PersonaId {
    type Err = UnknownPersona;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase().replace('-', "_");
        PersonaId::ALL
            .into_iter()
            .find(|id| id.as_str() == wanted)
            .ok_or_else(|| UnknownPersona(s.to_string()))
    }
}

/// One acceptable voice: the name must contain `name_contains`, and the
/// language tag must contain `lang_contains` when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceMatch {
    pub name_contains: &'static str,
    pub lang_contains: Option<&'static str>,
}

impl VoiceMatch {
    const fn name(name_contains: &'static str) -> Self {
        Self {
            name_contains,
            lang_contains: None,
        }
    }

    const fn name_and_lang(name_contains: &'static str, lang_contains: &'static str) -> Self {
        Self {
            name_contains,
            lang_contains: Some(lang_contains),
        }
    }

    pub fn matches(&self, voice: &VoiceDescriptor) -> bool {
        voice.name.contains(self.name_contains)
            && self
                .lang_contains
                .map(|lang| voice.lang.contains(lang))
                .unwrap_or(true)
    }
}

/// How an utterance picks its voice and delivery
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoicePolicy {
    /// Tried in order; the first candidate with a matching voice wins
    pub candidates: &'static [VoiceMatch],
    pub rate: f32,
    pub pitch: f32,
}

impl VoicePolicy {
    /// Returns None when no available voice matches; the engine default is
    /// used in that case.
    pub fn select<'a>(&self, voices: &'a [VoiceDescriptor]) -> Option<&'a VoiceDescriptor> {
        self.candidates
            .iter()
            .find_map(|candidate| voices.iter().find(|v| candidate.matches(v)))
    }
}

/// Voice used for urgent hot-path callouts regardless of persona
pub const URGENT_VOICE: VoicePolicy = VoicePolicy {
    candidates: &[
        VoiceMatch::name("Google UK English Female"),
        VoiceMatch::name("Microsoft Zira"),
        VoiceMatch::name("Samantha"),
    ],
    rate: 1.3,
    pitch: 1.2,
};

#[derive(Debug)]
pub struct Persona {
    pub id: PersonaId,
    pub display_name: &'static str,
    pub prompt_template: &'static str,
    pub voice: VoicePolicy,
}

impl Persona {
    pub fn get(id: PersonaId) -> &'static Persona {
        id.persona()
    }

    pub fn all() -> impl Iterator<Item = &'static Persona> {
        PersonaId::ALL.into_iter().map(|id| id.persona())
    }
}

pub static TONY: Persona = Persona {
    id: PersonaId::Tony,
    display_name: "Coach Tony",
    prompt_template: "\
ROLE: You are Tony Rodriguez, a high-performance racing coach.
TONE: Colloquial, encouraging, \"feel-based\".
KEY PHRASES: \"Scoot out\", \"Good hustle\", \"Commit\", \"Pop it in\", \"Don't be a wuss\".
PHILOSOPHY:
1. MENTAL CAPACITY: Focus on flow once braking is done.
2. COMMITMENT: Delay throttle, then 100%.
3. CONFIDENCE: Trust the car.
INSTRUCTION:
Analyze telemetry. Give punchy, encouraging advice.
CONSTRAINT: Max 5 words.
Example: \"Good hustle, scoot out.\"
",
    voice: VoicePolicy {
        candidates: &[VoiceMatch::name_and_lang("Male", "US")],
        rate: 1.0,
        pitch: 0.9,
    },
};

pub static RACHEL: Persona = Persona {
    id: PersonaId::Rachel,
    display_name: "Coach Rachel",
    prompt_template: "\
ROLE: Rachel, Technical Physics Coach.
TONE: Calm, analytical, precise.
KEY PHRASES: \"End-of-Braking\", \"Vision\", \"Smooth inputs\", \"Balance platform\".
PHILOSOPHY:
1. VISION: Look through the corner.
2. BRAKING: Focus on smooth release (EoB).
3. SMOOTHNESS: Unsettled platform = slow.
INSTRUCTION:
Analyze telemetry. Focus on vehicle dynamics.
CONSTRAINT: Max 5 words.
Example: \"Smooth release, balance platform.\"
",
    voice: VoicePolicy {
        candidates: &[VoiceMatch::name_and_lang("Female", "US")],
        rate: 1.0,
        pitch: 1.1,
    },
};

pub static AJ: Persona = Persona {
    id: PersonaId::Aj,
    display_name: "Coach AJ",
    prompt_template: "\
ROLE: Coach AJ, Hybrid Race Engineer.
TONE: Direct, descriptive, actionable.
GOAL: Connect feeling to action.
INSTRUCTION:
Link a vehicle state (Grip, Rotation) to an input (Throttle, Brake).
CONSTRAINT: Max 6 words.
Example: \"Lat G settling, hammer throttle.\"
",
    voice: VoicePolicy {
        candidates: &[VoiceMatch::name("UK English Male")],
        rate: 1.15,
        pitch: 1.0,
    },
};

pub static GARMIN: Persona = Persona {
    id: PersonaId::Garmin,
    display_name: "Delta Optimizer",
    prompt_template: "\
ROLE: Garmin Catalyst \"Delta\" Optimizer.
TONE: Robotic, neutral, factual.
KEY PHRASES: \"Brake earlier\", \"Apex later\", \"Track out\", \"Keep pushing\", \"New optimal\".
PHILOSOPHY:
1. SEGMENTS: Analyze the track in sectors.
2. OPPORTUNITY: Only speak if time can be gained (>0.1s).
3. POSITIVE REINFORCEMENT: \"Keep pushing\" on good sectors.
INSTRUCTION:
Identify the biggest opportunity for time gain.
CONSTRAINT: Max 3 words. Standard phrases only.
Example: \"Brake harder.\"
",
    voice: VoicePolicy {
        candidates: &[VoiceMatch::name("Google US English")],
        rate: 1.05,
        pitch: 1.0,
    },
};

/// The sub-style selection described here happens inside the backend; it is
/// never computed locally.
pub static SUPER_AJ: Persona = Persona {
    id: PersonaId::SuperAj,
    display_name: "Super Coach AJ",
    prompt_template: "\
ROLE: You are SUPER COACH AJ, the ultimate racing intelligence.
You dynamically switch personas based on the driver's specific error type.

LOGIC MATRIX:
1. SAFETY/CRITICAL -> Use HOT PATH STYLE (Imperative). \"STABILIZE!\"
2. TECHNIQUE ERROR (Rough inputs) -> Use RACHEL STYLE (Physics). \"Smooth release.\"
3. CONFIDENCE ERROR (Hesitation) -> Use TONY STYLE (Motivational). \"Commit now!\"
4. OPTIMIZATION (Good lap, slow sector) -> Use GARMIN STYLE (Delta). \"Brake later.\"

INSTRUCTION:
Analyze the telemetry. Determine the primary issue using the Logic Matrix.
Select the best persona voice.
Output the advice in that persona's style.
CONSTRAINT: Maximum 6 words. Descriptive and Actionable.
",
    voice: VoicePolicy {
        candidates: &[VoiceMatch::name("UK English Male")],
        rate: 1.15,
        pitch: 1.0,
    },
};
