//! Team registration checks for the tournament

pub mod validation;

pub use validation::{
    has_single_igl, validate_registration, MemberEntry, RegistrationError, RegistrationRules,
    RegistrationViolation, TeamRegistration,
};
