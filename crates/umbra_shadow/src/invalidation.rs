//! Staleness detection
//!
//! A bake is stale as soon as anything in the light or prop lists carries
//! a stamp newer than the bake. There is no per-light dirty tracking: one
//! change anywhere rebakes every map.

use umbra_core::TimeStamp;

use crate::classify::casts_shadow;
use crate::scene::{LightCollection, Prop, PropCollection, Scene};

/// Has anything changed since `last_bake`?
pub fn needs_rebuild(last_bake: TimeStamp, lights: &LightCollection, props: &PropCollection) -> bool {
    lights.modified_time().is_newer_than(last_bake)
        || lights.iter().any(|l| l.modified_time().is_newer_than(last_bake))
        || props.modified_time().is_newer_than(last_bake)
        || props.latest_prop_time().is_newer_than(last_bake)
}

/// Why a frame has no shadows
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoShadowReason {
    /// No enabled shadow-casting light
    NoLight,
    /// No visible prop tagged receiver
    NoReceiver,
    /// No visible prop tagged occluder
    NoOccluder,
}

impl core::fmt::Display for NoShadowReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoLight => write!(f, "no shadow-casting light"),
            Self::NoReceiver => write!(f, "no receiver"),
            Self::NoOccluder => write!(f, "no occluder"),
        }
    }
}

/// Per-frame qualification scan
#[derive(Debug)]
pub struct SceneScan<'a> {
    pub has_light: bool,
    pub has_receiver: bool,
    /// Visible props tagged occluder, in scene order
    pub occluders: Vec<&'a Prop>,
}

impl<'a> SceneScan<'a> {
    pub fn scan(scene: &'a Scene) -> Self {
        let has_light = scene.lights.iter().any(casts_shadow);
        let visible = || scene.props.iter().filter(|p| p.is_visible());
        let has_receiver = visible().any(Prop::is_receiver);
        let occluders = visible().filter(|p| p.is_occluder()).collect();
        Self {
            has_light,
            has_receiver,
            occluders,
        }
    }

    #[inline]
    pub fn has_occluder(&self) -> bool {
        !self.occluders.is_empty()
    }

    /// First missing ingredient, checked light, then receiver, then occluder
    pub fn missing(&self) -> Option<NoShadowReason> {
        if !self.has_light {
            Some(NoShadowReason::NoLight)
        } else if !self.has_receiver {
            Some(NoShadowReason::NoReceiver)
        } else if !self.has_occluder() {
            Some(NoShadowReason::NoOccluder)
        } else {
            None
        }
    }

    #[inline]
    pub fn qualifies(&self) -> bool {
        self.missing().is_none()
    }
}
