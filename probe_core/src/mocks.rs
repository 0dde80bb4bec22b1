//! Test and helper probes for probe_core

use std::collections::VecDeque;

/// A probe that always errors on read; useful for exercising the
/// insufficient-samples and insufficient-changes paths.
pub struct DeadProbe;

impl probe_traits::Probe for DeadProbe {
    fn read_bytes(&mut self) -> Result<[u8; 2], Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("no ack from probe")))
    }
}

/// Plays back a fixed script of raw words; `None` entries fail the read.
/// Once the script runs out the last entry repeats.
pub struct ScriptedProbe {
    script: VecDeque<Option<u16>>,
    last: Option<u16>,
}

impl ScriptedProbe {
    pub fn new(script: impl IntoIterator<Item = Option<u16>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: None,
        }
    }
}

impl probe_traits::Probe for ScriptedProbe {
    fn read_bytes(&mut self) -> Result<[u8; 2], Box<dyn std::error::Error + Send + Sync>> {
        let next = match self.script.pop_front() {
            Some(entry) => {
                self.last = entry;
                entry
            }
            None => self.last,
        };
        next.map(u16::to_be_bytes)
            .ok_or_else(|| "scripted read failure".into())
    }
}
