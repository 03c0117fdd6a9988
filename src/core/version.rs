//! Version constraint handling
//!
//! npm-style constraints (`^6.0.0`, `~1.2`, `>=18.0.0`) are parsed with the
//! `semver` crate. A declared dependency constraint is accepted for a native
//! dependency when the lowest version it admits is at least the lowest
//! version the registry minimum admits.

use semver::{Comparator, Op, Version, VersionReq};
use thiserror::Error;

/// Errors related to version parsing
#[derive(Error, Debug, PartialEq)]
pub enum VersionError {
    /// Invalid version constraint format
    #[error("Invalid version constraint '{constraint}': {reason}")]
    InvalidConstraint { constraint: String, reason: String },
}

/// Parse and validate a semver version constraint
///
/// # Examples
/// ```
/// use distforge::core::version::parse_constraint;
///
/// assert!(parse_constraint("^6.0.0").is_ok());
/// assert!(parse_constraint("latest").is_err());
/// ```
pub fn parse_constraint(constraint: &str) -> Result<VersionReq, VersionError> {
    VersionReq::parse(constraint.trim()).map_err(|e| VersionError::InvalidConstraint {
        constraint: constraint.to_string(),
        reason: e.to_string(),
    })
}

/// Lower bound admitted by a single comparator (0.0.0 when it has none)
///
/// `None` when the bound past a `>` comparator does not fit in a version
/// component.
fn comparator_floor(cmp: &Comparator) -> Option<Version> {
    let minor = cmp.minor.unwrap_or(0);
    let patch = cmp.patch.unwrap_or(0);
    let base = Version {
        major: cmp.major,
        minor,
        patch,
        pre: cmp.pre.clone(),
        build: semver::BuildMetadata::EMPTY,
    };

    match cmp.op {
        Op::Exact | Op::GreaterEq | Op::Tilde | Op::Caret | Op::Wildcard => Some(base),
        Op::Greater => match (cmp.minor, cmp.patch) {
            (Some(_), Some(_)) => patch.checked_add(1).map(|p| Version::new(cmp.major, minor, p)),
            (Some(_), None) => minor.checked_add(1).map(|m| Version::new(cmp.major, m, 0)),
            _ => cmp.major.checked_add(1).map(|m| Version::new(m, 0, 0)),
        },
        _ => Some(Version::new(0, 0, 0)),
    }
}

/// Lowest version a constraint admits (0.0.0 when it has no lower bound)
///
/// Returns `None` when no representable version satisfies the lower bound,
/// as with `>1.2.18446744073709551615`.
pub fn constraint_floor(req: &VersionReq) -> Option<Version> {
    req.comparators
        .iter()
        .try_fold(Version::new(0, 0, 0), |floor, cmp| Some(floor.max(comparator_floor(cmp)?)))
}

/// Whether a declared constraint is acceptable for a required minimum
///
/// # Examples
/// ```
/// use distforge::core::version::constraint_meets_minimum;
///
/// assert!(constraint_meets_minimum("^6.1.0", "^6.0.0").unwrap());
/// assert!(constraint_meets_minimum("^7.0.0", "^6.0.0").unwrap());
/// assert!(!constraint_meets_minimum("^5.1.1", "^6.0.0").unwrap());
/// ```
pub fn constraint_meets_minimum(declared: &str, minimum: &str) -> Result<bool, VersionError> {
    let declared = parse_constraint(declared)?;
    let minimum = parse_constraint(minimum)?;
    match (constraint_floor(&declared), constraint_floor(&minimum)) {
        (Some(declared), Some(minimum)) => Ok(declared >= minimum),
        _ => Ok(false),
    }
}
