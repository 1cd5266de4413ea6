//! Setpoint catalog implementation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use std::collections::HashMap;

// Internal
use super::{CatalogError, CatalogParams, SetpointSpec};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Index of a setpoint within a [`SetpointCatalog`].
///
/// Ids are only meaningful for the catalog which issued them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetpointId(usize);

/// A named (height, angle) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Setpoint {
    pub name: String,

    /// Units: meters
    pub height_m: f64,

    /// Units: radians
    pub angle_rad: f64,

    pub kind: SetpointKind,
}

/// The immutable catalog of setpoints and the transition table between them.
#[derive(Debug, Default, Clone)]
pub struct SetpointCatalog {
    /// All setpoints, goals first, then intermediates, each in configuration order.
    setpoints: Vec<Setpoint>,

    /// Intermediates in configuration order.
    intermediates: Vec<SetpointId>,

    names: HashMap<String, SetpointId>,

    /// Maps (origin, destination) to the preferred intermediate
    transitions: HashMap<(SetpointId, SetpointId), SetpointId>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetpointKind {
    /// Operator selectable
    Goal,

    /// Only used for routing
    Intermediate,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SetpointCatalog {
    /// Build and validate the catalog.
    pub fn new(params: &CatalogParams) -> Result<Self, CatalogError> {
        if params.goals.is_empty() {
            return Err(CatalogError::NoGoals);
        }
        if params.intermediates.is_empty() {
            return Err(CatalogError::NoIntermediates);
        }

        let mut catalog = Self {
            setpoints: Vec::with_capacity(params.goals.len() + params.intermediates.len()),
            intermediates: Vec::with_capacity(params.intermediates.len()),
            names: HashMap::new(),
            transitions: HashMap::new(),
        };

        for spec in params.goals.iter() {
            catalog.insert(spec, SetpointKind::Goal)?;
        }
        for spec in params.intermediates.iter() {
            let id = catalog.insert(spec, SetpointKind::Intermediate)?;
            catalog.intermediates.push(id);
        }

        for row in params.transitions.iter() {
            let origin = catalog.require(&row.origin)?;
            let destination = catalog.require(&row.destination)?;
            let intermediate = catalog.require(&row.intermediate)?;

            if catalog.get(intermediate).kind != SetpointKind::Intermediate {
                return Err(CatalogError::NotAnIntermediate(row.intermediate.clone()));
            }
            if origin == destination {
                return Err(CatalogError::SelfTransition(row.origin.clone()));
            }

            catalog.insert_transition(origin, destination, intermediate)?;

            if row.symmetric {
                catalog.insert_transition(destination, origin, intermediate)?;
            }
        }

        debug!(
            "Setpoint catalog built: {} goals, {} intermediates, {} transitions",
            params.goals.len(),
            catalog.intermediates.len(),
            catalog.transitions.len()
        );

        Ok(catalog)
    }

    /// Find a setpoint by name.
    pub fn lookup(&self, name: &str) -> Option<SetpointId> {
        self.names.get(name).copied()
    }

    /// Find a goal setpoint by name, rejecting intermediates.
    pub fn lookup_goal(&self, name: &str) -> Result<SetpointId, CatalogError> {
        let id = self.require(name)?;

        match self.get(id).kind {
            SetpointKind::Goal => Ok(id),
            SetpointKind::Intermediate => Err(CatalogError::NotAGoal(name.to_string())),
        }
    }

    /// Get the setpoint with the given id.
    pub fn get(&self, id: SetpointId) -> &Setpoint {
        &self.setpoints[id.0]
    }

    /// The preferred intermediate between `origin` and `goal`, or `None` if direct travel between
    /// them is safe.
    pub fn lookup_intermediate(&self, origin: SetpointId, goal: SetpointId) -> Option<SetpointId> {
        self.transitions.get(&(origin, goal)).copied()
    }

    /// All intermediates in catalog order.
    pub fn all_intermediates(&self) -> &[SetpointId] {
        &self.intermediates
    }

    /// Check that every name in `names` is a goal in this catalog.
    pub fn validate_goals<S: AsRef<str>>(&self, names: &[S]) -> Result<(), CatalogError> {
        for name in names.iter() {
            self.lookup_goal(name.as_ref())?;
        }

        Ok(())
    }

    fn require(&self, name: &str) -> Result<SetpointId, CatalogError> {
        self.lookup(name)
            .ok_or_else(|| CatalogError::UnknownSetpoint(name.to_string()))
    }

    fn insert(
        &mut self,
        spec: &SetpointSpec,
        kind: SetpointKind,
    ) -> Result<SetpointId, CatalogError> {
        if !spec.height.is_finite() || !spec.angle.is_finite() {
            return Err(CatalogError::NonFinite(spec.name.clone()));
        }
        if self.names.contains_key(&spec.name) {
            return Err(CatalogError::DuplicateName(spec.name.clone()));
        }

        let id = SetpointId(self.setpoints.len());

        self.setpoints.push(Setpoint {
            name: spec.name.clone(),
            height_m: spec.height,
            angle_rad: spec.angle,
            kind,
        });
        self.names.insert(spec.name.clone(), id);

        Ok(id)
    }

    fn insert_transition(
        &mut self,
        origin: SetpointId,
        destination: SetpointId,
        intermediate: SetpointId,
    ) -> Result<(), CatalogError> {
        if self.get(destination).kind != SetpointKind::Goal {
            return Err(CatalogError::NotAGoal(self.get(destination).name.clone()));
        }

        if self
            .transitions
            .insert((origin, destination), intermediate)
            .is_some()
        {
            return Err(CatalogError::DuplicateTransition(
                self.get(origin).name.clone(),
                self.get(destination).name.clone(),
            ));
        }

        Ok(())
    }
}

impl Setpoint {
    /// The setpoint as a `[height, angle]` pair.
    pub fn position(&self) -> [f64; 2] {
        [self.height_m, self.angle_rad]
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::setpoints::TransitionSpec;

    fn spec(name: &str, height: f64, angle: f64) -> SetpointSpec {
        SetpointSpec {
            name: name.to_string(),
            height,
            angle,
        }
    }

    fn row(origin: &str, destination: &str, intermediate: &str, symmetric: bool) -> TransitionSpec {
        TransitionSpec {
            origin: origin.to_string(),
            destination: destination.to_string(),
            intermediate: intermediate.to_string(),
            symmetric,
        }
    }

    fn params() -> CatalogParams {
        CatalogParams {
            goals: vec![spec("HOME", 0.0, 0.0), spec("L4", 1.6, 1.2), spec("L1", 0.3, 0.5)],
            intermediates: vec![spec("CLEAR", 0.5, 0.0), spec("HIGH_CLEAR", 1.3, 0.0)],
            transitions: vec![
                row("HOME", "L4", "CLEAR", true),
                row("L1", "L4", "HIGH_CLEAR", false),
            ],
        }
    }

    #[test]
    fn test_lookup() {
        let catalog = SetpointCatalog::new(&params()).unwrap();

        let home = catalog.lookup("HOME").unwrap();
        let l4 = catalog.lookup("L4").unwrap();
        let l1 = catalog.lookup("L1").unwrap();
        let clear = catalog.lookup("CLEAR").unwrap();
        let high_clear = catalog.lookup("HIGH_CLEAR").unwrap();

        assert_eq!(catalog.get(clear).kind, SetpointKind::Intermediate);
        assert_eq!(catalog.get(l4).position(), [1.6, 1.2]);

        // Symmetric row applies both ways, ordered row only one way
        assert_eq!(catalog.lookup_intermediate(home, l4), Some(clear));
        assert_eq!(catalog.lookup_intermediate(l4, home), Some(clear));
        assert_eq!(catalog.lookup_intermediate(l1, l4), Some(high_clear));
        assert_eq!(catalog.lookup_intermediate(l4, l1), None);
        assert_eq!(catalog.lookup_intermediate(home, l1), None);

        assert_eq!(catalog.all_intermediates(), &[clear, high_clear]);
        assert_eq!(catalog.lookup("NOPE"), None);
    }

    #[test]
    fn test_goal_validation() {
        let catalog = SetpointCatalog::new(&params()).unwrap();

        assert!(catalog.validate_goals(&["HOME", "L4"]).is_ok());
        assert!(matches!(
            catalog.validate_goals(&["HOME", "L9"]),
            Err(CatalogError::UnknownSetpoint(_))
        ));
        assert!(matches!(
            catalog.validate_goals(&["CLEAR"]),
            Err(CatalogError::NotAGoal(_))
        ));
    }

    #[test]
    fn test_invalid_catalogs() {
        let mut p = params();
        p.intermediates.push(spec("HOME", 0.1, 0.1));
        assert!(matches!(
            SetpointCatalog::new(&p),
            Err(CatalogError::DuplicateName(_))
        ));

        let mut p = params();
        p.transitions.push(row("HOME", "L4", "HIGH_CLEAR", false));
        assert!(matches!(
            SetpointCatalog::new(&p),
            Err(CatalogError::DuplicateTransition(_, _))
        ));

        let mut p = params();
        p.transitions.push(row("HOME", "L1", "L4", false));
        assert!(matches!(
            SetpointCatalog::new(&p),
            Err(CatalogError::NotAnIntermediate(_))
        ));

        let mut p = params();
        p.transitions.push(row("HOME", "CLEAR", "HIGH_CLEAR", false));
        assert!(matches!(
            SetpointCatalog::new(&p),
            Err(CatalogError::NotAGoal(_))
        ));

        let mut p = params();
        p.transitions.push(row("HOME", "L2", "CLEAR", false));
        assert!(matches!(
            SetpointCatalog::new(&p),
            Err(CatalogError::UnknownSetpoint(_))
        ));

        let mut p = params();
        p.goals[1].height = std::f64::NAN;
        assert!(matches!(
            SetpointCatalog::new(&p),
            Err(CatalogError::NonFinite(_))
        ));

        let mut p = params();
        p.intermediates.clear();
        assert!(matches!(
            SetpointCatalog::new(&p),
            Err(CatalogError::NoIntermediates)
        ));
    }
}
