//! Autoscaling bound maintenance.

use crate::model::Autoscaling;

pub const DEFAULT_MIN_NODE_COUNT: u32 = 1;
pub const DEFAULT_MAX_NODE_COUNT: u32 = 3;

/// Apply the enable defaults, overwriting stale bounds.
///
/// Returns true if either bound changed.
pub fn apply_enabled_defaults(autoscaling: &mut Autoscaling) -> bool {
    let before = (autoscaling.min_node_count, autoscaling.max_node_count);
    autoscaling.min_node_count = Some(DEFAULT_MIN_NODE_COUNT);
    autoscaling.max_node_count = Some(DEFAULT_MAX_NODE_COUNT);
    before != (autoscaling.min_node_count, autoscaling.max_node_count)
}

/// Which bounds a clear would touch. Only non-null bounds are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearedBounds {
    pub min: bool,
    pub max: bool,
}

impl ClearedBounds {
    pub fn any(&self) -> bool {
        self.min || self.max
    }
}

/// Clear both bounds if autoscaling is (still) disabled.
pub fn clear_disabled_bounds(autoscaling: &mut Autoscaling) -> ClearedBounds {
    if autoscaling.enabled {
        return ClearedBounds::default();
    }

    ClearedBounds {
        min: autoscaling.min_node_count.take().is_some(),
        max: autoscaling.max_node_count.take().is_some(),
    }
}

/// Bring a freshly loaded pool in line with the bounds invariant.
///
/// Enabled pools keep their bounds and get defaults only where one is missing.
pub fn normalize(autoscaling: &mut Autoscaling) -> bool {
    if autoscaling.enabled {
        let mut changed = false;
        if autoscaling.min_node_count.is_none() {
            autoscaling.min_node_count = Some(DEFAULT_MIN_NODE_COUNT);
            changed = true;
        }
        if autoscaling.max_node_count.is_none() {
            autoscaling.max_node_count = Some(DEFAULT_MAX_NODE_COUNT);
            changed = true;
        }
        changed
    } else {
        clear_disabled_bounds(autoscaling).any()
    }
}
