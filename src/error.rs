//! Controller-command rejections (spec.md §7, "user-command rejection"):
//! the only category of error that crosses an API boundary as a `Result`
//! rather than a logged soft failure. Each variant's `Display` impl *is*
//! the readback string handed back to the caller.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CommandRejection {
    #[error("unable, heading {heading} is out of range")]
    HeadingOutOfRange { heading: f64 },

    #[error("unable, {altitude} is above the aircraft's ceiling of {ceiling}")]
    AltitudeAboveCeiling { altitude: f64, ceiling: f64 },

    #[error("unable, {speed} is below landing speed {landing}")]
    SpeedBelowLanding { speed: f64, landing: f64 },

    #[error("unable, {speed} is above maximum speed {max}")]
    SpeedAboveMax { speed: f64, max: f64 },

    #[error("unable, {fix} is not in the route")]
    FixNotInRoute { fix: String },

    #[error("unable, approach {approach_id} is not recognized")]
    UnknownApproach { approach_id: String },

    #[error("unable, no heading assigned to intercept from")]
    InterceptWithoutAssignedHeading,

    #[error("unable, {approach_id} is not an ILS")]
    InterceptRequiresIls { approach_id: String },

    #[error("unable, no approach attached")]
    NoApproachAttached,
}
