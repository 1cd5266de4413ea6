//! # Fault log
//!
//! Collects the faults raised by each module. A fault is logged once when it first appears and
//! again when it clears, rather than every cycle it persists for.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::collections::HashMap;
use std::fmt::Display;

use log::{info, warn};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A fault which can be recorded in the log.
pub trait Fault: Display {
    /// Identifies the kind of fault, independently of any values it carries.
    ///
    /// Reports of the same kind from the same source are treated as one fault.
    fn kind(&self) -> &'static str;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FaultLog {
    /// Active faults by source
    active: HashMap<&'static str, ActiveFault>,

    /// Number of distinct faults raised
    num_faults: u64,
}

#[derive(Debug)]
struct ActiveFault {
    kind: &'static str,

    /// Description from the most recent report
    description: String,

    /// True if the fault was reported since the last update
    reported: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl FaultLog {
    /// Report a fault from the given source.
    ///
    /// A source can only have one active fault, reporting a different kind replaces it.
    pub fn report<F: Fault>(&mut self, source: &'static str, fault: F) {
        let kind = fault.kind();
        let description = fault.to_string();

        match self.active.get_mut(source) {
            Some(f) if f.kind == kind => {
                f.description = description;
                f.reported = true;
            }
            _ => {
                warn!("Fault raised by {}: {}", source, description);
                self.num_faults += 1;
                self.active.insert(
                    source,
                    ActiveFault {
                        kind,
                        description,
                        reported: true,
                    },
                );
            }
        }
    }

    /// Clear any faults which have not been reported since the last update.
    pub fn update(&mut self) {
        self.active.retain(|source, f| {
            if !f.reported {
                info!("Fault cleared on {}: {}", source, f.description);
            }
            f.reported
        });

        for f in self.active.values_mut() {
            f.reported = false;
        }
    }

    pub fn is_active(&self, source: &str) -> bool {
        self.active.contains_key(source)
    }

    pub fn num_active(&self) -> usize {
        self.active.len()
    }

    pub fn num_faults(&self) -> u64 {
        self.num_faults
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::wrist_ctrl::SensFault;

    #[test]
    fn test_fault_lifecycle() {
        let mut log = FaultLog::default();

        log.report("wrist_ctrl", SensFault::Missing);
        log.report("wrist_ctrl", SensFault::Missing);
        assert!(log.is_active("wrist_ctrl"));
        assert_eq!(log.num_faults(), 1);

        // Still reported in the next period
        log.update();
        log.report("wrist_ctrl", SensFault::Missing);
        log.update();
        assert!(log.is_active("wrist_ctrl"));

        // Not reported for a whole period
        log.update();
        assert!(!log.is_active("wrist_ctrl"));
        assert_eq!(log.num_active(), 0);
        assert_eq!(log.num_faults(), 1);
    }

    #[test]
    fn test_changing_values_are_one_fault() {
        let mut log = FaultLog::default();

        for i in 0..5 {
            log.report(
                "wrist_ctrl",
                SensFault::Stale {
                    age_s: 0.2 + 0.02 * i as f64,
                },
            );
        }
        assert_eq!(log.num_faults(), 1);
        assert_eq!(log.num_active(), 1);
    }

    #[test]
    fn test_replace() {
        let mut log = FaultLog::default();

        log.report("wrist_ctrl", SensFault::Missing);
        log.report("wrist_ctrl", SensFault::Stale { age_s: 0.2 });
        log.report("sim", SensFault::NonFinite);
        assert_eq!(log.num_active(), 2);
        assert_eq!(log.num_faults(), 3);
    }
}
