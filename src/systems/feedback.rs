use std::collections::BTreeSet;

use anyhow::Result;

use crate::{
    engine::{System, SystemContext},
    rng::SystemRng,
    world::World,
};

/// Ages floating texts in real time and drops the expired ones. An undrained
/// yield event goes with its text.
pub struct FeedbackSystem;

impl FeedbackSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FeedbackSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for FeedbackSystem {
    fn name(&self) -> &str {
        "feedback"
    }

    fn run(
        &mut self,
        ctx: &SystemContext,
        world: &mut World,
        _rng: &mut SystemRng<'_>,
    ) -> Result<()> {
        for text in &mut world.floating_texts {
            text.ttl -= ctx.real_dt;
        }
        world.floating_texts.retain(|text| text.ttl > 0.0);

        let live: BTreeSet<u64> = world.floating_texts.iter().map(|text| text.id).collect();
        world.yield_events.retain(|event| live.contains(&event.id));
        Ok(())
    }
}
